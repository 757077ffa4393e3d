//! Homework queries and what is derived from them
//!
//! - `queries`: submit a question, list a learner's queries, record feedback
//! - `statistics`: summary metrics and the tutor-written performance analysis
//! - `recommendations`: study advice bundled with suggested materials

pub mod queries;
pub mod recommendations;
pub mod statistics;

pub use queries::{FeedbackInput, NewQuery, QueryPage};
pub use recommendations::Recommendation;
pub use statistics::{Analysis, Statistics};

/// Round to two decimal places
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
