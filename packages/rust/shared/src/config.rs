//! Application configuration for the lead generator.
//!
//! User config lives at `~/.leadgen/leadgen.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LeadGenError, Result};
use crate::types::{QualificationCriteria, SizeRange};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "leadgen.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".leadgen";

/// Default database file name inside the config directory.
const DATABASE_FILE_NAME: &str = "leadgen.db";

// ---------------------------------------------------------------------------
// Config structs (matching leadgen.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Cycle behaviour.
    #[serde(default)]
    pub campaign: CampaignSection,

    /// Qualification criteria.
    #[serde(default)]
    pub criteria: CriteriaSection,

    /// Persistence settings.
    #[serde(default)]
    pub storage: StorageSection,
}

/// `[campaign]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSection {
    /// Number of prospects requested from research per cycle.
    #[serde(default = "default_daily_lead_target")]
    pub daily_lead_target: u32,

    /// Run the outreach stage.
    #[serde(default = "default_true")]
    pub email_sequence_enabled: bool,

    /// Run the CRM sync stage.
    #[serde(default)]
    pub crm_integration: bool,

    /// Trailing window for trend prediction, in days.
    #[serde(default = "default_trend_window")]
    pub trend_window_days: u32,
}

impl Default for CampaignSection {
    fn default() -> Self {
        Self {
            daily_lead_target: default_daily_lead_target(),
            email_sequence_enabled: true,
            crm_integration: false,
            trend_window_days: default_trend_window(),
        }
    }
}

fn default_daily_lead_target() -> u32 {
    25
}
fn default_true() -> bool {
    true
}
fn default_trend_window() -> u32 {
    7
}

/// `[criteria]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriteriaSection {
    #[serde(default = "default_industry")]
    pub target_industry: String,

    #[serde(default = "default_size_min")]
    pub company_size_min: u32,

    #[serde(default = "default_size_max")]
    pub company_size_max: u32,

    /// Minimum deal budget in dollars.
    #[serde(default = "default_budget_minimum")]
    pub budget_minimum: u64,

    /// Regions matched against candidate locations (case-insensitive substring).
    #[serde(default = "default_geographic_focus")]
    pub geographic_focus: Vec<String>,
}

impl Default for CriteriaSection {
    fn default() -> Self {
        Self {
            target_industry: default_industry(),
            company_size_min: default_size_min(),
            company_size_max: default_size_max(),
            budget_minimum: default_budget_minimum(),
            geographic_focus: default_geographic_focus(),
        }
    }
}

fn default_industry() -> String {
    "technology".into()
}
fn default_size_min() -> u32 {
    50
}
fn default_size_max() -> u32 {
    1000
}
fn default_budget_minimum() -> u64 {
    50_000
}
fn default_geographic_focus() -> Vec<String> {
    vec!["United States".into()]
}

/// `[storage]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSection {
    /// Database file. Defaults to `~/.leadgen/leadgen.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Campaign config (runtime, validated)
// ---------------------------------------------------------------------------

/// Runtime campaign configuration, validated from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    pub criteria: QualificationCriteria,
    pub daily_lead_target: u32,
    pub email_sequence_enabled: bool,
    pub crm_integration: bool,
    pub trend_window_days: u32,
}

impl TryFrom<&AppConfig> for CampaignConfig {
    type Error = LeadGenError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let c = &config.criteria;
        let range = SizeRange::new(c.company_size_min, c.company_size_max)
            .map_err(|e| LeadGenError::config(format!("[criteria] {e}")))?;
        let criteria = QualificationCriteria::new(
            c.target_industry.clone(),
            range,
            c.budget_minimum,
            c.geographic_focus.iter().cloned(),
        )
        .map_err(|e| LeadGenError::config(format!("[criteria] {e}")))?;

        if config.campaign.daily_lead_target == 0 {
            return Err(LeadGenError::config(
                "[campaign] daily_lead_target must be at least 1",
            ));
        }
        if config.campaign.trend_window_days == 0 {
            return Err(LeadGenError::config(
                "[campaign] trend_window_days must be at least 1",
            ));
        }

        Ok(Self {
            criteria,
            daily_lead_target: config.campaign.daily_lead_target,
            email_sequence_enabled: config.campaign.email_sequence_enabled,
            crm_integration: config.campaign.crm_integration,
            trend_window_days: config.campaign.trend_window_days,
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.leadgen/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LeadGenError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.leadgen/leadgen.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolve the database path: explicit setting, else `~/.leadgen/leadgen.db`.
pub fn database_path(config: &AppConfig) -> Result<PathBuf> {
    match &config.storage.database_path {
        Some(p) => Ok(PathBuf::from(p)),
        None => Ok(config_dir()?.join(DATABASE_FILE_NAME)),
    }
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LeadGenError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| LeadGenError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LeadGenError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LeadGenError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LeadGenError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("daily_lead_target"));
        assert!(toml_str.contains("United States"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.campaign.daily_lead_target, 25);
        assert_eq!(parsed.criteria.company_size_max, 1000);
        assert!(parsed.storage.database_path.is_none());
    }

    #[test]
    fn partial_config_uses_defaults() {
        let toml_str = r#"
[criteria]
target_industry = "healthcare"
geographic_focus = ["Canada", "Texas"]

[storage]
database_path = "/tmp/leadgen-test.db"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.criteria.target_industry, "healthcare");
        assert_eq!(config.criteria.company_size_min, 50);
        assert_eq!(config.campaign.trend_window_days, 7);
        assert_eq!(
            database_path(&config).expect("db path"),
            PathBuf::from("/tmp/leadgen-test.db")
        );
    }

    #[test]
    fn campaign_config_from_app_config() {
        let app = AppConfig::default();
        let campaign = CampaignConfig::try_from(&app).expect("valid defaults");
        assert_eq!(campaign.daily_lead_target, 25);
        assert_eq!(campaign.criteria.company_size_range.min(), 50);
        assert!(campaign.criteria.geographic_focus.contains("United States"));
        assert!(campaign.email_sequence_enabled);
        assert!(!campaign.crm_integration);
    }

    #[test]
    fn inverted_size_range_is_rejected() {
        let mut app = AppConfig::default();
        app.criteria.company_size_min = 800;
        app.criteria.company_size_max = 100;
        let err = CampaignConfig::try_from(&app).unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
        assert!(err.to_string().contains("exceeds max"));
    }

    #[test]
    fn zero_lead_target_is_rejected() {
        let mut app = AppConfig::default();
        app.campaign.daily_lead_target = 0;
        assert!(CampaignConfig::try_from(&app).is_err());
    }
}
