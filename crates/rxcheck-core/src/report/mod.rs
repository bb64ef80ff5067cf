//! Human-facing renderings of engine output.

mod advisory;
mod warnings;

pub use advisory::*;
pub use warnings::*;
