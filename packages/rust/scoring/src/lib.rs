//! Lead scoring and qualification.
//!
//! - [`ScoringEngine`] scores one candidate across six weighted criteria.
//! - [`QualificationPipeline`] scores a batch, keeps Warm/Hot leads and ranks them.

pub mod engine;
pub mod qualify;
mod rules;

pub use engine::{LeadScorer, ScoringEngine, ScoringWeights};
pub use qualify::QualificationPipeline;
