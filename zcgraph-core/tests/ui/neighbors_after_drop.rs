//! Neighbor iterators are lazy walks over the mapping; dropping the file
//! while one is alive is rejected.
//!
//! If this code compiles, there is a bug in the API design.

use zcgraph_core::{GraphFile, Neighborhood};

fn main() {
    let file = GraphFile::open("/tmp/ui.zcg").unwrap();
    let neighbors = file.neighbors(0).unwrap();

    // ERROR: cannot move out of `file` because it is borrowed
    drop(file);

    println!("{}", neighbors.count());
}
