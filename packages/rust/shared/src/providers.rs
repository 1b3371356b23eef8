//! Capability traits for the external collaborators a campaign drives.
//!
//! The orchestrator only sees these traits. Real network clients, file
//! stores and the deterministic demo doubles all plug in here.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{CampaignId, CampaignState, Candidate, DailyBucket, FinalReport, QualifiedLead};

/// Outcome of one outreach batch. Per-lead failures are counted here, not raised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachSummary {
    pub sent: u64,
    pub failed: u64,
    pub responses: u64,
    #[serde(default)]
    pub meetings_booked: u64,
}

/// Outcome of one CRM sync batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmSyncSummary {
    pub successful_syncs: u64,
    pub failed_syncs: u64,
    pub duplicates_found: u64,
}

/// Discovers and enriches candidate companies.
#[async_trait]
pub trait ProspectProvider: Send + Sync {
    /// Provider name used in logs and `ProviderError`s.
    fn name(&self) -> &str;

    /// Return up to `target_count` candidates.
    async fn research(&self, target_count: u32) -> Result<Vec<Candidate>>;
}

/// Sends email sequences to qualified leads. Best-effort.
#[async_trait]
pub trait OutreachProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn send_sequences(&self, leads: &[QualifiedLead]) -> Result<OutreachSummary>;
}

/// Pushes qualified leads into a CRM.
#[async_trait]
pub trait CrmProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn sync_leads(&self, leads: &[QualifiedLead]) -> Result<CrmSyncSummary>;
}

/// Durable system of record for campaign state.
///
/// Implementations must round-trip [`CampaignState`] losslessly.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn save(&self, state: &CampaignState) -> Result<()>;

    async fn load(&self, campaign_id: &CampaignId) -> Result<Option<CampaignState>>;

    /// All known campaigns, most recently started first.
    async fn list(&self) -> Result<Vec<CampaignState>>;

    /// Insert or replace the bucket for `bucket.day`.
    async fn save_daily_bucket(&self, campaign_id: &CampaignId, bucket: &DailyBucket)
    -> Result<()>;

    /// Buckets for a campaign, ordered by day ascending.
    async fn load_daily_buckets(&self, campaign_id: &CampaignId) -> Result<Vec<DailyBucket>>;

    async fn save_report(&self, report: &FinalReport) -> Result<()>;

    async fn load_report(&self, campaign_id: &CampaignId) -> Result<Option<FinalReport>>;
}

// ---------------------------------------------------------------------------
// Arc<P> blankets — let callers share one provider between owners
// ---------------------------------------------------------------------------

#[async_trait]
impl<P: ProspectProvider + ?Sized> ProspectProvider for Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn research(&self, target_count: u32) -> Result<Vec<Candidate>> {
        (**self).research(target_count).await
    }
}

#[async_trait]
impl<P: PersistenceStore + ?Sized> PersistenceStore for Arc<P> {
    async fn save(&self, state: &CampaignState) -> Result<()> {
        (**self).save(state).await
    }

    async fn load(&self, campaign_id: &CampaignId) -> Result<Option<CampaignState>> {
        (**self).load(campaign_id).await
    }

    async fn list(&self) -> Result<Vec<CampaignState>> {
        (**self).list().await
    }

    async fn save_daily_bucket(
        &self,
        campaign_id: &CampaignId,
        bucket: &DailyBucket,
    ) -> Result<()> {
        (**self).save_daily_bucket(campaign_id, bucket).await
    }

    async fn load_daily_buckets(&self, campaign_id: &CampaignId) -> Result<Vec<DailyBucket>> {
        (**self).load_daily_buckets(campaign_id).await
    }

    async fn save_report(&self, report: &FinalReport) -> Result<()> {
        (**self).save_report(report).await
    }

    async fn load_report(&self, campaign_id: &CampaignId) -> Result<Option<FinalReport>> {
        (**self).load_report(campaign_id).await
    }
}

