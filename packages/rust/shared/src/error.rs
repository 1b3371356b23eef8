//! Error types for the lead-generation workspace.
//!
//! Library crates use [`LeadGenError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use crate::types::{CampaignStatus, CycleStage};

/// Top-level error type for all lead-generation operations.
#[derive(Debug, thiserror::Error)]
pub enum LeadGenError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Unknown campaign/lead id or malformed input.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A research, outreach or CRM call failed or timed out.
    #[error("provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    /// State could not be durably written or read.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Operation is not legal in the current lifecycle state.
    #[error("cannot {operation} while campaign is {status}")]
    InvalidState {
        operation: String,
        status: CampaignStatus,
    },

    /// `start` was called while a campaign is already active.
    #[error("campaign {campaign_id} is already running")]
    AlreadyRunning { campaign_id: String },

    /// A stage of `run_cycle` failed. Earlier stages' metrics were kept
    /// unless `unsaved` holds the error that stopped them being written.
    #[error("cycle failed during {stage}: {source}{}", unsaved_note(.unsaved))]
    Cycle {
        stage: CycleStage,
        #[source]
        source: Box<LeadGenError>,
        unsaved: Option<Box<LeadGenError>>,
    },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn unsaved_note(unsaved: &Option<Box<LeadGenError>>) -> String {
    unsaved
        .as_ref()
        .map(|e| format!(" (partial progress not saved: {e})"))
        .unwrap_or_default()
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LeadGenError>;

impl LeadGenError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a provider error tagged with the provider's name.
    pub fn provider(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: msg.into(),
        }
    }

    /// Create a persistence error from any displayable message.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    pub fn invalid_state(operation: impl Into<String>, status: CampaignStatus) -> Self {
        Self::InvalidState {
            operation: operation.into(),
            status,
        }
    }

    /// Wrap a stage failure raised inside `run_cycle`.
    pub fn cycle(stage: CycleStage, source: LeadGenError) -> Self {
        Self::Cycle {
            stage,
            source: Box::new(source),
            unsaved: None,
        }
    }

    /// A stage failure whose partial progress could not be persisted either.
    pub fn cycle_unsaved(stage: CycleStage, source: LeadGenError, write: LeadGenError) -> Self {
        Self::Cycle {
            stage,
            source: Box::new(source),
            unsaved: Some(Box::new(write)),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Taxonomy name of this error, used in CLI output and assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "ConfigError",
            Self::Validation { .. } => "ValidationError",
            Self::Provider { .. } => "ProviderError",
            Self::Persistence(_) => "PersistenceError",
            Self::InvalidState { .. } => "InvalidStateError",
            Self::AlreadyRunning { .. } => "AlreadyRunningError",
            Self::Cycle { .. } => "CycleError",
            Self::Io { .. } => "IoError",
        }
    }
}
