//! `close` consumes the file, so records borrowed from it must be dead by
//! then.
//!
//! If this code compiles, there is a bug in the API design.

use zcgraph_core::GraphFile;

fn main() {
    let file = GraphFile::open("/tmp/ui.zcg").unwrap();
    let record = file.node(0).unwrap();

    // ERROR: cannot move out of `file` while `record` borrows it
    file.close();

    println!("{}", record.id());
}
