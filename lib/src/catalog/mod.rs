//! The static guide and resource catalogs and the pure views over them.
//!
//! Every view here is a function of the full list plus the current
//! selection; nothing is cached or updated incrementally.

mod model;
mod filter;
mod hierarchy;

pub use model::*;
pub use filter::*;
pub use hierarchy::*;
