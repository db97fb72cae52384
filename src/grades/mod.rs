//! Division-relative percentile grading
//!
//! Builds compressed, bucketed sorted-sample lookup tables over every team
//! in a division and answers "what fraction of the population is at or below
//! this value" in O(log bucket-size).

mod lut;
mod percentile;

pub use lut::{DivisionStatistics, MetricLut, VALUE_EPS};
pub use percentile::{binary_chop, OrdF64, Percentile, QueryCache};
