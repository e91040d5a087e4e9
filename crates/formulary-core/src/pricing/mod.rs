//! Cost handling for drug records.
//!
//! - [`parse_cost`]: raw cost text → finite cost or the invalid sentinel
//! - [`extract_alternatives`]: valid (substitute, cost) pairs of one record, cheapest first
//! - [`lookup`]: real-time cheapest-option view of a single record
//! - [`impact`]: formulary impact analysis over a selection of drugs

mod alternatives;
mod cost;
pub mod impact;
pub mod lookup;

pub use alternatives::*;
pub use cost::*;
