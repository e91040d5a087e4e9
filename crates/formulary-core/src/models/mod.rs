//! Domain models for the formulary system.

mod catalog;
mod drug;
mod recommendation;

pub use catalog::*;
pub use drug::*;
pub use recommendation::*;
