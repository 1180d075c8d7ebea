//! Music library: the `Track` record and the directory scanner that
//! produces the catalog handed to the play queue.

mod display;
mod model;
mod scan;

pub use model::*;
pub use scan::scan;
