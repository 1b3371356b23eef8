//! SQL migration definitions for the lead-generation database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: campaigns, daily_buckets, final_reports",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per campaign; the authoritative CampaignState
CREATE TABLE IF NOT EXISTS campaigns (
    id                   TEXT PRIMARY KEY,
    status               TEXT NOT NULL,
    started_at           TEXT NOT NULL,
    last_updated         TEXT NOT NULL,
    prospects_researched INTEGER NOT NULL DEFAULT 0,
    leads_qualified      INTEGER NOT NULL DEFAULT 0,
    emails_sent          INTEGER NOT NULL DEFAULT 0,
    responses_received   INTEGER NOT NULL DEFAULT 0,
    meetings_booked      INTEGER NOT NULL DEFAULT 0,
    conversion_rate      REAL NOT NULL DEFAULT 0,
    total_pipeline_value REAL NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_campaigns_started_at ON campaigns(started_at);

-- Per-day counters for trend analysis
CREATE TABLE IF NOT EXISTS daily_buckets (
    campaign_id          TEXT NOT NULL REFERENCES campaigns(id) ON DELETE CASCADE,
    day                  TEXT NOT NULL,
    prospects_researched INTEGER NOT NULL DEFAULT 0,
    leads_qualified      INTEGER NOT NULL DEFAULT 0,
    emails_sent          INTEGER NOT NULL DEFAULT 0,
    responses_received   INTEGER NOT NULL DEFAULT 0,
    meetings_booked      INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (campaign_id, day)
);

-- Report written once when a campaign stops
CREATE TABLE IF NOT EXISTS final_reports (
    campaign_id  TEXT PRIMARY KEY REFERENCES campaigns(id) ON DELETE CASCADE,
    report_json  TEXT NOT NULL,
    generated_at TEXT NOT NULL
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
