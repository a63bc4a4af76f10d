//! Payload slices point into the mapping and cannot outlive it.
//!
//! If this code compiles, there is a bug in the API design.

use zcgraph_core::GraphFile;

fn first_payload(path: &str) -> &[u8] {
    let file = GraphFile::open(path).unwrap();

    // ERROR: returns a value referencing data owned by the current function
    file.node_payload(0).unwrap().unwrap_or_default()
}

fn main() {
    println!("{:?}", first_payload("/tmp/ui.zcg"));
}
