//! Export functionality for lab observations and user snapshots.

mod observations;
mod snapshot;

pub use observations::*;
pub use snapshot::*;
