//! Shared types, error model, provider traits and configuration for the
//! lead generator.
//!
//! This crate is the foundation depended on by all other workspace crates.
//! It provides:
//! - [`LeadGenError`] — the unified error type
//! - Domain types ([`Candidate`], [`LeadScore`], [`QualifiedLead`], [`CampaignState`])
//! - Provider traits ([`ProspectProvider`], [`PersistenceStore`], ...)
//! - Configuration ([`AppConfig`], [`CampaignConfig`], config loading)

pub mod config;
pub mod error;
pub mod providers;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CampaignConfig, CampaignSection, CriteriaSection, StorageSection, config_dir,
    config_file_path, database_path, init_config, load_config, load_config_from,
};
pub use error::{LeadGenError, Result};
pub use providers::{
    CrmProvider, CrmSyncSummary, OutreachProvider, OutreachSummary, PersistenceStore,
    ProspectProvider,
};
pub use types::{
    COOL_THRESHOLD, CampaignId, CampaignMetrics, CampaignState, CampaignStatus, Candidate,
    ComponentBreakdown, ComponentScores, Contact, Counters, Criterion, CycleStage, DailyBucket,
    FinalReport, Grade, HOT_THRESHOLD, LeadScore, QualificationCriteria, QualificationLevel,
    QualifiedLead, Rates, SizeRange, WARM_THRESHOLD, ratio,
};
