//! Reading inputs, writing outputs, and parsing structured data files.

mod source;
mod sink;
mod format;

pub use source::*;
pub use sink::*;
pub use format::*;
