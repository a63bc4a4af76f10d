//! FFI bindings for zcgraph
//!
//! This module provides a C-compatible interface to zcgraph's memory-mapped
//! graph reader and its traversals. All functions are panic-safe and use
//! thread-local error reporting.
//!
//! # Safety Guarantees
//!
//! - No panic may cross the FFI boundary (enforced by `ffi_guard`)
//! - Strict UTF-8 validation for path arguments
//! - Null pointer checks on all pointer arguments
//! - ABI stability via `#[repr(C)]` and `extern "C"`
//!
//! # Error Handling
//!
//! Errors are reported through:
//! - Return values: NULL for open, `UINT32_MAX` for counts and degrees,
//!   `UINT64_MAX` for BFS, `SIZE_MAX` for buffer-filling calls
//! - Thread-local error message: `zcgraph_last_error_message()`
//!
//! # Identifiers
//!
//! Every node argument and every node written to an output buffer is a
//! node *id* as stored in the file, never a table position.
//!
//! # Thread Safety
//!
//! An open graph is read-only. Any number of threads may query the same
//! handle concurrently; only `zcgraph_close` needs exclusive access.

use libc::{c_char, c_int, size_t};
use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::ptr;
use std::slice;
use zcgraph_core::{ComponentMode, Error, GraphFile, Neighborhood, TraversalOptions};

/// Internal state holder (not exposed to C)
struct ZcGraphState {
    inner: GraphFile,
}

/// Opaque handle to an open graph file (C-compatible)
///
/// C code only sees pointers to this type. The real data is stored in
/// `ZcGraphState`.
#[repr(C)]
pub struct ZcGraph {
    _private: [u8; 0],
}

/// `mode` value for `zcgraph_component_count`: weakly connected components
pub const ZCGRAPH_COMPONENTS_WEAK: c_int = 0;

/// `mode` value for `zcgraph_component_count`: one count per sweep of
/// forward reachability from the lowest unvisited node
pub const ZCGRAPH_COMPONENTS_REACHABILITY: c_int = 1;

thread_local! {
    /// Per-thread error message, overwritten by the next failing call
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message for the current thread
///
/// Interior NULs are escaped so reporting itself can never fail.
fn set_last_error(err: impl std::fmt::Display) {
    LAST_ERROR.with(|cell| {
        let safe_msg = err.to_string().replace('\0', "\\0");
        let c_str = CString::new(safe_msg).unwrap_or_default();
        *cell.borrow_mut() = Some(c_str);
    });
}

/// Clear the last error message for the current thread
fn clear_last_error() {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

/// Panic barrier that catches all panics at the FFI boundary
///
/// Returns `None` on panic after recording the panic message, so callers
/// can fall back to their sentinel value.
fn ffi_guard<F, R>(f: F) -> Option<R>
where
    F: FnOnce() -> R,
{
    // The operation is abandoned on panic, nothing is resumed.
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(result) => Some(result),
        Err(e) => {
            let msg = if let Some(s) = e.downcast_ref::<&str>() {
                format!("Panic: {s}")
            } else if let Some(s) = e.downcast_ref::<String>() {
                format!("Panic: {s}")
            } else {
                "Unknown panic".to_string()
            };
            set_last_error(msg);
            None
        }
    }
}

/// Borrows the graph behind a handle, recording an error for NULL
///
/// # Safety
///
/// `ptr` must be NULL or a live pointer returned by `zcgraph_open`.
unsafe fn graph<'a>(ptr: *const ZcGraph) -> Option<&'a GraphFile> {
    // SAFETY: Caller guarantees ptr is NULL or came from zcgraph_open
    let state = unsafe { (ptr as *const ZcGraphState).as_ref() };
    match state {
        Some(s) => Some(&s.inner),
        None => {
            set_last_error("Null graph pointer");
            None
        }
    }
}

/// Records `err` and yields `sentinel`, or clears the error on success
fn report<T>(result: Result<T, Error>, sentinel: T) -> T {
    match result {
        Ok(value) => {
            clear_last_error();
            value
        }
        Err(e) => {
            set_last_error(e);
            sentinel
        }
    }
}

//
// === LIFECYCLE MANAGEMENT ===
//

/// Open and validate a zcgraph file
///
/// The file is mapped read-only and checked in full (checksum and
/// structure) before the handle is returned.
///
/// # Arguments
///
/// - `path`: UTF-8 encoded path to the graph file (must not be NULL)
///
/// # Returns
///
/// - Non-NULL pointer on success
/// - NULL on failure (check `zcgraph_last_error_message()`)
///
/// # Example (C)
///
/// ```c
/// ZcGraph* graph = zcgraph_open("social.zcg");
/// if (graph == NULL) {
///     fprintf(stderr, "Error: %s\n", zcgraph_last_error_message());
///     exit(1);
/// }
/// ```
///
/// # Safety
///
/// - `path` must be a valid, NULL-terminated UTF-8 string
/// - `path` must remain valid for the duration of this call
/// - Caller must release the returned pointer with `zcgraph_close()`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zcgraph_open(path: *const c_char) -> *mut ZcGraph {
    ffi_guard(|| {
        if path.is_null() {
            set_last_error("Null path pointer");
            return ptr::null_mut();
        }

        // SAFETY: Caller guarantees path is a valid NUL-terminated string
        let c_str = unsafe { CStr::from_ptr(path) };
        let Ok(path_str) = c_str.to_str() else {
            set_last_error("Invalid UTF-8 in path");
            return ptr::null_mut();
        };

        match GraphFile::open(path_str) {
            Ok(inner) => {
                clear_last_error();
                Box::into_raw(Box::new(ZcGraphState { inner })) as *mut ZcGraph
            }
            Err(e) => {
                set_last_error(e);
                ptr::null_mut()
            }
        }
    })
    .unwrap_or(ptr::null_mut())
}

/// Close a graph and unmap its file
///
/// Passing NULL is a no-op.
///
/// # Safety
///
/// - `ptr` must be NULL or a pointer returned by `zcgraph_open()`
/// - `ptr` must not be used after this call
/// - No other thread may access `ptr` during this call
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zcgraph_close(ptr: *mut ZcGraph) {
    if !ptr.is_null() {
        ffi_guard(|| {
            // SAFETY: Caller guarantees ptr is valid (from zcgraph_open)
            let _ = unsafe { Box::from_raw(ptr as *mut ZcGraphState) };
        });
    }
}

//
// === INTROSPECTION ===
//

/// Number of nodes in the graph, or 0 if `ptr` is NULL
///
/// # Safety
///
/// - `ptr` must be NULL or a live pointer from `zcgraph_open()`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zcgraph_node_count(ptr: *const ZcGraph) -> u32 {
    ffi_guard(|| {
        // SAFETY: forwarded caller guarantee
        let Some(graph) = (unsafe { graph(ptr) }) else {
            return 0;
        };
        clear_last_error();
        graph.header().node_count()
    })
    .unwrap_or(0)
}

/// Number of edges in the graph, or 0 if `ptr` is NULL
///
/// # Safety
///
/// - `ptr` must be NULL or a live pointer from `zcgraph_open()`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zcgraph_edge_count(ptr: *const ZcGraph) -> u32 {
    ffi_guard(|| {
        // SAFETY: forwarded caller guarantee
        let Some(graph) = (unsafe { graph(ptr) }) else {
            return 0;
        };
        clear_last_error();
        graph.header().edge_count()
    })
    .unwrap_or(0)
}

//
// === NEIGHBORHOOD ===
//

/// Out-degree of the node with id `id`
///
/// # Returns
///
/// - Number of outgoing edges on success
/// - `UINT32_MAX` if `ptr` is NULL or no node has that id
///
/// # Safety
///
/// - `ptr` must be NULL or a live pointer from `zcgraph_open()`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zcgraph_degree(ptr: *const ZcGraph, id: u64) -> u32 {
    ffi_guard(|| {
        // SAFETY: forwarded caller guarantee
        let Some(graph) = (unsafe { graph(ptr) }) else {
            return u32::MAX;
        };
        report(graph.degree(id), u32::MAX)
    })
    .unwrap_or(u32::MAX)
}

/// Copy the target ids of a node's outgoing edges into `out_ids`
///
/// Targets are written in edge insertion order. At most `cap` ids are
/// written; the return value is the full out-degree, so a result larger
/// than `cap` means the buffer was too small and the list is truncated.
///
/// # Arguments
///
/// - `ptr`: Non-NULL pointer to graph
/// - `id`: Source node id
/// - `out_ids`: Output buffer for target ids (may be NULL when `cap` is 0)
/// - `cap`: Capacity of `out_ids` in elements
///
/// # Returns
///
/// - Out-degree of the node on success
/// - `SIZE_MAX` on failure (check `zcgraph_last_error_message()`)
///
/// # Example (C)
///
/// ```c
/// uint64_t targets[16];
/// size_t n = zcgraph_neighbors(graph, 42, targets, 16);
/// for (size_t i = 0; i < n && i < 16; i++) {
///     printf("42 -> %llu\n", (unsigned long long)targets[i]);
/// }
/// ```
///
/// # Safety
///
/// - `ptr` must be NULL or a live pointer from `zcgraph_open()`
/// - `out_ids` must point to `cap` writable u64 values when `cap > 0`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zcgraph_neighbors(
    ptr: *const ZcGraph,
    id: u64,
    out_ids: *mut u64,
    cap: size_t,
) -> size_t {
    ffi_guard(|| {
        // SAFETY: forwarded caller guarantee
        let Some(graph) = (unsafe { graph(ptr) }) else {
            return usize::MAX;
        };
        if out_ids.is_null() && cap > 0 {
            set_last_error("Null output buffer");
            return usize::MAX;
        }

        let neighbors = match graph.neighbors(id) {
            Ok(neighbors) => neighbors,
            Err(e) => {
                set_last_error(e);
                return usize::MAX;
            }
        };

        let out: &mut [u64] = if cap == 0 {
            &mut []
        } else {
            // SAFETY: Caller guarantees out_ids points to cap writable u64 values
            unsafe { slice::from_raw_parts_mut(out_ids, cap) }
        };

        let mut degree = 0;
        for target in neighbors {
            if let Some(slot) = out.get_mut(degree) {
                *slot = target;
            }
            degree += 1;
        }
        clear_last_error();
        degree
    })
    .unwrap_or(usize::MAX)
}

//
// === TRAVERSALS ===
//

/// Number of nodes reachable from `start_id`, the start included
///
/// # Returns
///
/// - Reached node count on success
/// - `UINT64_MAX` on failure (check `zcgraph_last_error_message()`)
///
/// # Safety
///
/// - `ptr` must be NULL or a live pointer from `zcgraph_open()`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zcgraph_bfs_count(ptr: *const ZcGraph, start_id: u64) -> u64 {
    ffi_guard(|| {
        // SAFETY: forwarded caller guarantee
        let Some(graph) = (unsafe { graph(ptr) }) else {
            return u64::MAX;
        };
        let view = graph.view();
        let result = view
            .position_of(start_id)
            .and_then(|start| view.bfs(start, &TraversalOptions::default()))
            .map(|bfs| u64::from(bfs.reached));
        report(result, u64::MAX)
    })
    .unwrap_or(u64::MAX)
}

/// Write a shortest (fewest edges) path from `source_id` to `target_id`
///
/// The path is written as node ids, both endpoints included.
///
/// # Arguments
///
/// - `ptr`: Non-NULL pointer to graph
/// - `source_id`, `target_id`: Endpoint node ids
/// - `out_ids`: Output buffer for the path
/// - `cap`: Capacity of `out_ids` in elements
///
/// # Returns
///
/// - Number of nodes on the path on success
/// - 0 if `target_id` is unreachable from `source_id`
/// - `SIZE_MAX` on failure, including a buffer shorter than the path
///
/// # Example (C)
///
/// ```c
/// uint64_t path[64];
/// size_t len = zcgraph_shortest_path(graph, 1, 99, path, 64);
/// if (len == SIZE_MAX) {
///     fprintf(stderr, "Error: %s\n", zcgraph_last_error_message());
/// } else if (len == 0) {
///     puts("no path");
/// }
/// ```
///
/// # Safety
///
/// - `ptr` must be NULL or a live pointer from `zcgraph_open()`
/// - `out_ids` must point to `cap` writable u64 values
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zcgraph_shortest_path(
    ptr: *const ZcGraph,
    source_id: u64,
    target_id: u64,
    out_ids: *mut u64,
    cap: size_t,
) -> size_t {
    ffi_guard(|| {
        // SAFETY: forwarded caller guarantee
        let Some(graph) = (unsafe { graph(ptr) }) else {
            return usize::MAX;
        };
        if out_ids.is_null() {
            set_last_error("Null output buffer");
            return usize::MAX;
        }

        let view = graph.view();
        let found = view
            .position_of(source_id)
            .and_then(|source| view.position_of(target_id).map(|target| (source, target)))
            .and_then(|(source, target)| view.shortest_path(source, target));
        let path = match found {
            Ok(Some(path)) => path,
            Ok(None) => {
                clear_last_error();
                return 0;
            }
            Err(e) => {
                set_last_error(e);
                return usize::MAX;
            }
        };

        if path.nodes.len() > cap {
            let len = path.nodes.len();
            set_last_error(format!("Output buffer holds {cap} ids, path has {len}"));
            return usize::MAX;
        }

        // SAFETY: Caller guarantees out_ids points to cap writable u64 values
        let out = unsafe { slice::from_raw_parts_mut(out_ids, cap) };
        for (slot, &position) in out.iter_mut().zip(&path.nodes) {
            match view.id_of(position) {
                Ok(id) => *slot = id,
                Err(e) => {
                    set_last_error(e);
                    return usize::MAX;
                }
            }
        }
        clear_last_error();
        path.nodes.len()
    })
    .unwrap_or(usize::MAX)
}

/// Count connected components
///
/// # Arguments
///
/// - `ptr`: Non-NULL pointer to graph
/// - `mode`: `ZCGRAPH_COMPONENTS_WEAK` or `ZCGRAPH_COMPONENTS_REACHABILITY`
///
/// # Returns
///
/// - Component count on success
/// - `UINT32_MAX` on failure (check `zcgraph_last_error_message()`)
///
/// # Safety
///
/// - `ptr` must be NULL or a live pointer from `zcgraph_open()`
#[unsafe(no_mangle)]
pub unsafe extern "C" fn zcgraph_component_count(ptr: *const ZcGraph, mode: c_int) -> u32 {
    ffi_guard(|| {
        // SAFETY: forwarded caller guarantee
        let Some(graph) = (unsafe { graph(ptr) }) else {
            return u32::MAX;
        };
        let mode = match mode {
            ZCGRAPH_COMPONENTS_WEAK => ComponentMode::Weak,
            ZCGRAPH_COMPONENTS_REACHABILITY => ComponentMode::Reachability,
            other => {
                set_last_error(format!("Unknown component mode {other}"));
                return u32::MAX;
            }
        };
        report(graph.view().connected_components(mode), u32::MAX)
    })
    .unwrap_or(u32::MAX)
}

//
// === ERROR HANDLING ===
//

/// Get the last error message for the current thread
///
/// # Returns
///
/// - Pointer to NULL-terminated error string
/// - NULL if the last call on this thread succeeded
///
/// # Lifetime
///
/// The returned pointer is valid until the next FFI call on this thread.
/// **Do NOT** free the returned pointer.
#[unsafe(no_mangle)]
pub extern "C" fn zcgraph_last_error_message() -> *const c_char {
    LAST_ERROR.with(|cell| cell.borrow().as_ref().map_or(ptr::null(), |s| s.as_ptr()))
}

//
// === VERSIONING ===
//

/// Get the zcgraph library version
///
/// The returned string is static. **Do NOT** free it.
///
/// # Example (C)
///
/// ```c
/// printf("zcgraph version: %s\n", zcgraph_version());
/// ```
#[unsafe(no_mangle)]
pub extern "C" fn zcgraph_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

    VERSION.as_ptr() as *const c_char
}

//
// === TESTS ===
//
