//! libSQL-backed campaign persistence (local, offline mode).
//!
//! [`Storage`] implements [`PersistenceStore`] over a single database file
//! holding campaign state, daily buckets and final reports.
//! [`MemoryStore`] is an in-process implementation for tests and dry runs.
//!
//! **Access rules:**
//! - Lifecycle commands: read-write via [`Storage::open`]
//! - Read-only commands (`status`, `list`, `report`): [`Storage::open_readonly`]

mod memory;
mod migrations;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use leadgen_shared::{
    CampaignId, CampaignMetrics, CampaignState, CampaignStatus, Counters, DailyBucket,
    FinalReport, LeadGenError, PersistenceStore, Result,
};
use libsql::{Connection, Database, params};
use tracing::debug;

pub use memory::MemoryStore;

/// Column list shared by every campaign query, in `row_to_state` order.
const CAMPAIGN_COLUMNS: &str = "id, status, started_at, last_updated, prospects_researched, \
     leads_qualified, emails_sent, responses_received, meetings_booked, conversion_rate, \
     total_pipeline_value";

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LeadGenError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| LeadGenError::persistence(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| LeadGenError::persistence(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LeadGenError::persistence(format!(
                "no database at {}; start a campaign first",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| LeadGenError::persistence(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| LeadGenError::persistence(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        LeadGenError::persistence(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(LeadGenError::persistence(
                "database is opened in read-only mode",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PersistenceStore
// ---------------------------------------------------------------------------

#[async_trait]
impl PersistenceStore for Storage {
    async fn save(&self, state: &CampaignState) -> Result<()> {
        self.check_writable()?;
        let m = &state.metrics;
        self.conn
            .execute(
                "INSERT INTO campaigns (id, status, started_at, last_updated,
                    prospects_researched, leads_qualified, emails_sent, responses_received,
                    meetings_booked, conversion_rate, total_pipeline_value)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(id) DO UPDATE SET
                   status = excluded.status,
                   started_at = excluded.started_at,
                   last_updated = excluded.last_updated,
                   prospects_researched = excluded.prospects_researched,
                   leads_qualified = excluded.leads_qualified,
                   emails_sent = excluded.emails_sent,
                   responses_received = excluded.responses_received,
                   meetings_booked = excluded.meetings_booked,
                   conversion_rate = excluded.conversion_rate,
                   total_pipeline_value = excluded.total_pipeline_value",
                params![
                    state.campaign_id.as_str(),
                    state.status.as_str(),
                    timestamp(&state.started_at),
                    timestamp(&state.last_updated),
                    m.prospects_researched as i64,
                    m.leads_qualified as i64,
                    m.emails_sent as i64,
                    m.responses_received as i64,
                    m.meetings_booked as i64,
                    m.conversion_rate,
                    m.total_pipeline_value,
                ],
            )
            .await
            .map_err(|e| LeadGenError::persistence(e.to_string()))?;

        debug!(campaign_id = %state.campaign_id, status = %state.status, "campaign state saved");
        Ok(())
    }

    async fn load(&self, campaign_id: &CampaignId) -> Result<Option<CampaignState>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = ?1"),
                params![campaign_id.as_str()],
            )
            .await
            .map_err(|e| LeadGenError::persistence(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_state(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(LeadGenError::persistence(e.to_string())),
        }
    }

    async fn list(&self) -> Result<Vec<CampaignState>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns ORDER BY started_at DESC, id"),
                params![],
            )
            .await
            .map_err(|e| LeadGenError::persistence(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| LeadGenError::persistence(e.to_string()))?
        {
            results.push(row_to_state(&row)?);
        }
        Ok(results)
    }

    async fn save_daily_bucket(
        &self,
        campaign_id: &CampaignId,
        bucket: &DailyBucket,
    ) -> Result<()> {
        self.check_writable()?;
        let c = &bucket.counters;
        self.conn
            .execute(
                "INSERT INTO daily_buckets (campaign_id, day, prospects_researched,
                    leads_qualified, emails_sent, responses_received, meetings_booked)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(campaign_id, day) DO UPDATE SET
                   prospects_researched = excluded.prospects_researched,
                   leads_qualified = excluded.leads_qualified,
                   emails_sent = excluded.emails_sent,
                   responses_received = excluded.responses_received,
                   meetings_booked = excluded.meetings_booked",
                params![
                    campaign_id.as_str(),
                    bucket.day.to_string(),
                    c.prospects_researched as i64,
                    c.leads_qualified as i64,
                    c.emails_sent as i64,
                    c.responses_received as i64,
                    c.meetings_booked as i64,
                ],
            )
            .await
            .map_err(|e| LeadGenError::persistence(e.to_string()))?;
        Ok(())
    }

    async fn load_daily_buckets(&self, campaign_id: &CampaignId) -> Result<Vec<DailyBucket>> {
        let mut rows = self
            .conn
            .query(
                "SELECT day, prospects_researched, leads_qualified, emails_sent,
                        responses_received, meetings_booked
                 FROM daily_buckets WHERE campaign_id = ?1 ORDER BY day",
                params![campaign_id.as_str()],
            )
            .await
            .map_err(|e| LeadGenError::persistence(e.to_string()))?;

        let mut results = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| LeadGenError::persistence(e.to_string()))?
        {
            let day = get_text(&row, 0)?;
            let day = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                .map_err(|e| LeadGenError::persistence(format!("invalid day '{day}': {e}")))?;
            results.push(DailyBucket {
                day,
                counters: Counters {
                    prospects_researched: get_count(&row, 1)?,
                    leads_qualified: get_count(&row, 2)?,
                    emails_sent: get_count(&row, 3)?,
                    responses_received: get_count(&row, 4)?,
                    meetings_booked: get_count(&row, 5)?,
                },
            });
        }
        Ok(results)
    }

    async fn save_report(&self, report: &FinalReport) -> Result<()> {
        self.check_writable()?;
        let json = serde_json::to_string(report)
            .map_err(|e| LeadGenError::persistence(format!("encode report: {e}")))?;
        self.conn
            .execute(
                "INSERT INTO final_reports (campaign_id, report_json, generated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(campaign_id) DO UPDATE SET
                   report_json = excluded.report_json,
                   generated_at = excluded.generated_at",
                params![
                    report.campaign_id.as_str(),
                    json,
                    timestamp(&report.generated_at),
                ],
            )
            .await
            .map_err(|e| LeadGenError::persistence(e.to_string()))?;
        Ok(())
    }

    async fn load_report(&self, campaign_id: &CampaignId) -> Result<Option<FinalReport>> {
        let mut rows = self
            .conn
            .query(
                "SELECT report_json FROM final_reports WHERE campaign_id = ?1",
                params![campaign_id.as_str()],
            )
            .await
            .map_err(|e| LeadGenError::persistence(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let json = get_text(&row, 0)?;
                let report = serde_json::from_str(&json)
                    .map_err(|e| LeadGenError::persistence(format!("decode report: {e}")))?;
                Ok(Some(report))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(LeadGenError::persistence(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

/// Fixed-width RFC 3339 with nanoseconds, so text order matches time order.
fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| LeadGenError::persistence(format!("invalid timestamp '{s}': {e}")))
}

fn get_text(row: &libsql::Row, idx: i32) -> Result<String> {
    row.get::<String>(idx)
        .map_err(|e| LeadGenError::persistence(e.to_string()))
}

fn get_real(row: &libsql::Row, idx: i32) -> Result<f64> {
    row.get::<f64>(idx)
        .map_err(|e| LeadGenError::persistence(e.to_string()))
}

fn get_count(row: &libsql::Row, idx: i32) -> Result<u64> {
    let v = row
        .get::<i64>(idx)
        .map_err(|e| LeadGenError::persistence(e.to_string()))?;
    u64::try_from(v).map_err(|_| LeadGenError::persistence(format!("negative counter {v}")))
}

/// Convert a `campaigns` row (selected with [`CAMPAIGN_COLUMNS`]) to a [`CampaignState`].
fn row_to_state(row: &libsql::Row) -> Result<CampaignState> {
    let id = get_text(row, 0)?;
    let status = get_text(row, 1)?;
    let started_at = get_text(row, 2)?;
    let last_updated = get_text(row, 3)?;

    Ok(CampaignState {
        campaign_id: CampaignId::parse(&id)?,
        status: status.parse::<CampaignStatus>()?,
        started_at: parse_timestamp(&started_at)?,
        last_updated: parse_timestamp(&last_updated)?,
        metrics: CampaignMetrics {
            prospects_researched: get_count(row, 4)?,
            leads_qualified: get_count(row, 5)?,
            emails_sent: get_count(row, 6)?,
            responses_received: get_count(row, 7)?,
            meetings_booked: get_count(row, 8)?,
            conversion_rate: get_real(row, 9)?,
            total_pipeline_value: get_real(row, 10)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadgen_shared::{Grade, Rates};
    use uuid::Uuid;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("leadgen_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn sample_state(id: &str) -> CampaignState {
        let mut state = CampaignState::started(CampaignId::parse(id).unwrap(), Utc::now());
        state.metrics = CampaignMetrics {
            prospects_researched: 25,
            leads_qualified: 7,
            emails_sent: 7,
            responses_received: 2,
            meetings_booked: 1,
            conversion_rate: 7.0 / 25.0,
            total_pipeline_value: 123_456.789,
        };
        state
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        let version = storage.get_schema_version().await;
        assert_eq!(version, 1);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("leadgen_test_{}.db", Uuid::now_v7()));
        let _s1 = Storage::open(&tmp).await.expect("first open");
        drop(_s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn state_roundtrip_is_lossless() {
        let storage = test_storage().await;
        let state = sample_state("c1");

        storage.save(&state).await.expect("save");
        let loaded = storage
            .load(&state.campaign_id)
            .await
            .expect("load")
            .expect("present");

        assert_eq!(loaded, state);
        assert_eq!(loaded.metrics, state.metrics);
    }

    #[tokio::test]
    async fn save_overwrites_existing_row() {
        let storage = test_storage().await;
        let mut state = sample_state("c1");
        storage.save(&state).await.unwrap();

        state.status = CampaignStatus::Paused;
        state.metrics.meetings_booked = 3;
        storage.save(&state).await.unwrap();

        let loaded = storage.load(&state.campaign_id).await.unwrap().unwrap();
        assert_eq!(loaded.status, CampaignStatus::Paused);
        assert_eq!(loaded.metrics.meetings_booked, 3);
        assert_eq!(storage.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn load_unknown_is_none() {
        let storage = test_storage().await;
        let missing = storage
            .load(&CampaignId::parse("nope").unwrap())
            .await
            .expect("load");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn list_most_recent_first() {
        let storage = test_storage().await;
        let mut older = sample_state("older");
        older.started_at = Utc::now() - chrono::Duration::days(2);
        let newer = sample_state("newer");
        storage.save(&older).await.unwrap();
        storage.save(&newer).await.unwrap();

        let ids: Vec<String> = storage
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.campaign_id.to_string())
            .collect();
        assert_eq!(ids, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn daily_buckets_upsert_and_order() {
        let storage = test_storage().await;
        let state = sample_state("c1");
        storage.save(&state).await.unwrap();

        let d1 = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
        let d0 = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let mut bucket = DailyBucket::empty(d1);
        bucket.counters.prospects_researched = 10;
        storage.save_daily_bucket(&state.campaign_id, &bucket).await.unwrap();
        bucket.counters.prospects_researched = 20;
        storage.save_daily_bucket(&state.campaign_id, &bucket).await.unwrap();
        storage
            .save_daily_bucket(&state.campaign_id, &DailyBucket::empty(d0))
            .await
            .unwrap();

        let buckets = storage.load_daily_buckets(&state.campaign_id).await.unwrap();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].day, d0);
        assert_eq!(buckets[1].counters.prospects_researched, 20);
    }

    #[tokio::test]
    async fn final_report_roundtrip() {
        let storage = test_storage().await;
        let state = sample_state("c1");
        storage.save(&state).await.unwrap();

        let now = Utc::now();
        let report = FinalReport {
            campaign_id: state.campaign_id.clone(),
            started_at: state.started_at,
            ended_at: now,
            duration_days: 1,
            duration_secs: 42,
            final_metrics: state.metrics.clone(),
            rates: Rates {
                qualification_rate: 0.28,
                response_rate: 2.0 / 7.0,
                conversion_rate: 1.0 / 7.0,
            },
            daily_average_prospects: 25.0,
            target_achievement: 1.0,
            grade: Grade::B,
            generated_at: now,
        };

        assert!(storage.load_report(&state.campaign_id).await.unwrap().is_none());
        storage.save_report(&report).await.expect("save report");
        let loaded = storage.load_report(&state.campaign_id).await.unwrap();
        assert_eq!(loaded, Some(report));
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = std::env::temp_dir().join(format!("leadgen_test_{}.db", Uuid::now_v7()));
        let rw = Storage::open(&tmp).await.unwrap();
        rw.save(&sample_state("c1")).await.unwrap();
        drop(rw);

        let ro = Storage::open_readonly(&tmp).await.unwrap();
        assert_eq!(ro.list().await.unwrap().len(), 1);
        let result = ro.save(&sample_state("c2")).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("read-only"));
    }

    #[tokio::test]
    async fn readonly_requires_existing_file() {
        let tmp = std::env::temp_dir().join(format!("leadgen_missing_{}.db", Uuid::now_v7()));
        let err = Storage::open_readonly(&tmp).await.err().expect("missing db");
        assert_eq!(err.kind(), "PersistenceError");
    }
}
