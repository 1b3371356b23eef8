//! In-process [`PersistenceStore`] for tests and dry runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use leadgen_shared::{
    CampaignId, CampaignState, Counters, DailyBucket, FinalReport, LeadGenError,
    PersistenceStore, Result,
};

#[derive(Default)]
struct Tables {
    campaigns: HashMap<CampaignId, CampaignState>,
    buckets: HashMap<CampaignId, BTreeMap<NaiveDate, Counters>>,
    reports: HashMap<CampaignId, FinalReport>,
}

/// Map-backed store. Writes can be switched off to simulate an outage.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While `true`, every write returns a `PersistenceError`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LeadGenError::persistence("store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn save(&self, state: &CampaignState) -> Result<()> {
        self.check_writable()?;
        self.tables
            .write()
            .await
            .campaigns
            .insert(state.campaign_id.clone(), state.clone());
        Ok(())
    }

    async fn load(&self, campaign_id: &CampaignId) -> Result<Option<CampaignState>> {
        Ok(self.tables.read().await.campaigns.get(campaign_id).cloned())
    }

    async fn list(&self) -> Result<Vec<CampaignState>> {
        let mut all: Vec<CampaignState> =
            self.tables.read().await.campaigns.values().cloned().collect();
        all.sort_by(|a, b| {
            b.started_at
                .cmp(&a.started_at)
                .then_with(|| a.campaign_id.cmp(&b.campaign_id))
        });
        Ok(all)
    }

    async fn save_daily_bucket(
        &self,
        campaign_id: &CampaignId,
        bucket: &DailyBucket,
    ) -> Result<()> {
        self.check_writable()?;
        self.tables
            .write()
            .await
            .buckets
            .entry(campaign_id.clone())
            .or_default()
            .insert(bucket.day, bucket.counters);
        Ok(())
    }

    async fn load_daily_buckets(&self, campaign_id: &CampaignId) -> Result<Vec<DailyBucket>> {
        let tables = self.tables.read().await;
        Ok(tables
            .buckets
            .get(campaign_id)
            .map(|days| {
                days.iter()
                    .map(|(day, counters)| DailyBucket {
                        day: *day,
                        counters: *counters,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn save_report(&self, report: &FinalReport) -> Result<()> {
        self.check_writable()?;
        self.tables
            .write()
            .await
            .reports
            .insert(report.campaign_id.clone(), report.clone());
        Ok(())
    }

    async fn load_report(&self, campaign_id: &CampaignId) -> Result<Option<FinalReport>> {
        Ok(self.tables.read().await.reports.get(campaign_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn roundtrip_and_outage() {
        let store = MemoryStore::new();
        let state = CampaignState::started(CampaignId::parse("m1").unwrap(), Utc::now());

        store.save(&state).await.expect("save");
        assert_eq!(store.load(&state.campaign_id).await.unwrap(), Some(state.clone()));

        store.set_fail_writes(true);
        let err = store.save(&state).await.unwrap_err();
        assert_eq!(err.kind(), "PersistenceError");
        // Reads keep working during a write outage.
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn buckets_replace_by_day() {
        let store = MemoryStore::new();
        let id = CampaignId::parse("m1").unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let mut bucket = DailyBucket::empty(day);
        store.save_daily_bucket(&id, &bucket).await.unwrap();
        bucket.counters.emails_sent = 4;
        store.save_daily_bucket(&id, &bucket).await.unwrap();

        let buckets = store.load_daily_buckets(&id).await.unwrap();
        assert_eq!(buckets, vec![bucket]);
    }
}
