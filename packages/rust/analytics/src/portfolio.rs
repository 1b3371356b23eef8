//! Totals across every stored campaign.

use serde::{Deserialize, Serialize};

use leadgen_shared::{CampaignState, CampaignStatus, ratio};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignsSummary {
    pub total_campaigns: usize,
    /// Running or paused.
    pub active_campaigns: usize,
    pub total_prospects: u64,
    pub total_qualified_leads: u64,
    pub overall_qualification_rate: f64,
    pub total_emails_sent: u64,
    pub average_emails_per_campaign: f64,
    pub total_meetings_booked: u64,
    pub total_pipeline_value: f64,
    pub average_pipeline_value_per_campaign: f64,
}

/// Summarize `campaigns` as returned by `PersistenceStore::list`.
/// An empty slice gives an all-zero summary.
pub fn summarize_campaigns(campaigns: &[CampaignState]) -> CampaignsSummary {
    let mut summary = CampaignsSummary {
        total_campaigns: campaigns.len(),
        ..CampaignsSummary::default()
    };

    for state in campaigns {
        let m = &state.metrics;
        if matches!(state.status, CampaignStatus::Running | CampaignStatus::Paused) {
            summary.active_campaigns += 1;
        }
        summary.total_prospects += m.prospects_researched;
        summary.total_qualified_leads += m.leads_qualified;
        summary.total_emails_sent += m.emails_sent;
        summary.total_meetings_booked += m.meetings_booked;
        summary.total_pipeline_value += m.total_pipeline_value;
    }

    let count = campaigns.len() as u64;
    summary.overall_qualification_rate =
        ratio(summary.total_qualified_leads, summary.total_prospects);
    summary.average_emails_per_campaign = ratio(summary.total_emails_sent, count);
    if count > 0 {
        summary.average_pipeline_value_per_campaign =
            summary.total_pipeline_value / count as f64;
    }
    summary
}
