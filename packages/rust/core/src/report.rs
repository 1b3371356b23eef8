//! Final and in-flight campaign summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use leadgen_analytics::performance_grade;
use leadgen_shared::{CampaignState, FinalReport, Rates, ratio};

/// Whole days elapsed plus one, so a same-day campaign lasted 1 day.
pub(crate) fn duration_days(started_at: DateTime<Utc>, until: DateTime<Utc>) -> u32 {
    let days = (until - started_at).num_days().max(0);
    u32::try_from(days).unwrap_or(u32::MAX - 1) + 1
}

/// Build the report emitted when `state` is stopped at `ended_at`.
pub(crate) fn final_report(
    state: &CampaignState,
    ended_at: DateTime<Utc>,
    daily_lead_target: u32,
) -> FinalReport {
    let metrics = state.metrics.clone();
    let counters = metrics.counters();
    let days = duration_days(state.started_at, ended_at);
    let daily_average = ratio(metrics.prospects_researched, u64::from(days));

    FinalReport {
        campaign_id: state.campaign_id.clone(),
        started_at: state.started_at,
        ended_at,
        duration_days: days,
        duration_secs: (ended_at - state.started_at).num_seconds().max(0),
        rates: counters.rates(),
        daily_average_prospects: daily_average,
        target_achievement: daily_average / f64::from(daily_lead_target.max(1)),
        grade: performance_grade(&counters),
        final_metrics: metrics,
        generated_at: Utc::now(),
    }
}

/// Point-in-time view of a campaign for `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub state: CampaignState,
    pub days_running: u32,
    pub daily_average_prospects: f64,
    /// Daily average over the configured daily target.
    pub target_achievement: f64,
    pub rates: Rates,
}

impl StatusReport {
    pub(crate) fn new(state: CampaignState, now: DateTime<Utc>, daily_lead_target: u32) -> Self {
        // A stopped campaign's clock stops at its last update.
        let until = if state.status.is_terminal() {
            state.last_updated
        } else {
            now
        };
        let days = duration_days(state.started_at, until);
        let daily_average = ratio(state.metrics.prospects_researched, u64::from(days));

        Self {
            days_running: days,
            daily_average_prospects: daily_average,
            target_achievement: daily_average / f64::from(daily_lead_target.max(1)),
            rates: state.metrics.counters().rates(),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use leadgen_shared::{CampaignId, CampaignMetrics, Grade};

    fn state(started_at: DateTime<Utc>) -> CampaignState {
        let mut state = CampaignState::started(CampaignId::parse("r1").unwrap(), started_at);
        state.metrics = CampaignMetrics {
            prospects_researched: 60,
            leads_qualified: 15,
            emails_sent: 15,
            responses_received: 1,
            meetings_booked: 1,
            conversion_rate: 0.25,
            total_pipeline_value: 0.0,
        };
        state
    }

    #[test]
    fn same_day_campaign_lasts_one_day() {
        let now = Utc::now();
        assert_eq!(duration_days(now, now), 1);
        assert_eq!(duration_days(now, now + Duration::hours(23)), 1);
        assert_eq!(duration_days(now, now + Duration::days(2)), 3);
    }

    #[test]
    fn final_report_fields() {
        let started = Utc::now() - Duration::days(2);
        let report = final_report(&state(started), started + Duration::days(2), 25);

        assert_eq!(report.duration_days, 3);
        assert_eq!(report.duration_secs, 2 * 24 * 3600);
        assert_eq!(report.daily_average_prospects, 20.0);
        assert!((report.target_achievement - 0.8).abs() < 1e-12);
        assert_eq!(report.rates.qualification_rate, 0.25);
        assert!((report.rates.conversion_rate - 1.0 / 15.0).abs() < 1e-12);
        // qualification 40 + response 1/15 ≈ 0.067 → 30 + volume 60 → 30
        assert_eq!(report.grade, Grade::A);
    }

    #[test]
    fn status_of_running_campaign() {
        let now = Utc::now();
        let status = StatusReport::new(state(now), now, 30);
        assert_eq!(status.days_running, 1);
        assert_eq!(status.daily_average_prospects, 60.0);
        assert_eq!(status.target_achievement, 2.0);
    }
}
