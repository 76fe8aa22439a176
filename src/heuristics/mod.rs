//! Heuristics module for the delivery problem.
//!
//! This module exports the construction heuristics and the improvement
//! heuristics run inside the time budget.

pub mod construction;
pub mod improvement;

pub use construction::*;
pub use improvement::*;
