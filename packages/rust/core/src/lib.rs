//! Campaign orchestration for the lead generator.
//!
//! This crate ties prospect research, qualification, outreach, CRM sync and
//! metrics aggregation into the per-cycle campaign workflow driven by
//! [`CampaignOrchestrator`].

pub mod demo;
pub mod orchestrator;
mod report;

pub use demo::{CatalogProspects, InMemoryCrm, SimulatedOutreach, sample_catalog};
pub use orchestrator::{CampaignOrchestrator, CycleReport, ProgressReporter, SilentProgress};
pub use report::StatusReport;
