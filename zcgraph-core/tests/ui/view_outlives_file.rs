//! A traversal view borrows the mapping, so it cannot leave the block that
//! owns the file.
//!
//! If this code compiles, there is a bug in the API design.

use zcgraph_core::GraphFile;

fn main() {
    let view = {
        let file = GraphFile::open("/tmp/ui.zcg").unwrap();

        // ERROR: `file` is dropped at the end of this block
        file.view()
    };

    println!("{}", view.node_count());
}
