//! Domain models for rxcheck.

mod condition;
mod drug;
mod medication;
mod warning;

pub use condition::*;
pub use drug::*;
pub use medication::*;
pub use warning::*;
