//! Campaign metrics aggregation and reporting.
//!
//! [`MetricsAggregator`] owns a campaign's cumulative [`CampaignMetrics`] and
//! its per-day [`DailyBucket`]s. Everything else here derives from those:
//! rates, trend prediction, letter grades and daily/period reports.
//! [`summarize_campaigns`] totals metrics across stored campaigns.

mod grade;
mod portfolio;
mod report;
mod trend;

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use tracing::debug;

use leadgen_shared::{CampaignMetrics, Counters, DailyBucket, Rates};

pub use grade::{grade_points, performance_grade};
pub use portfolio::{CampaignsSummary, summarize_campaigns};
pub use report::{DailyReport, DayBreakdown, DayChange, Period, PeriodSummary};
pub use trend::{TrendDirection, TrendPrediction};

/// Default trailing window for [`MetricsAggregator::predict_trend`].
pub const DEFAULT_TREND_WINDOW_DAYS: u32 = 7;

/// Cumulative and per-day counters for one campaign.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsAggregator {
    metrics: CampaignMetrics,
    buckets: BTreeMap<NaiveDate, Counters>,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted metrics and buckets.
    pub fn from_parts(
        metrics: CampaignMetrics,
        buckets: impl IntoIterator<Item = DailyBucket>,
    ) -> Self {
        Self {
            metrics,
            buckets: buckets.into_iter().map(|b| (b.day, b.counters)).collect(),
        }
    }

    // -----------------------------------------------------------------------
    // Recording
    // -----------------------------------------------------------------------

    /// Fold counters into the cumulative totals and today's (UTC) bucket.
    pub fn record(&mut self, delta: &Counters) {
        self.record_at(Utc::now().date_naive(), delta);
    }

    /// Fold counters into the cumulative totals and the bucket for `day`.
    pub fn record_at(&mut self, day: NaiveDate, delta: &Counters) {
        if delta.is_empty() {
            return;
        }
        self.metrics.apply(delta);
        self.buckets.entry(day).or_default().add(delta);
        debug!(%day, ?delta, "metrics recorded");
    }

    /// Add estimated deal value from newly qualified leads.
    pub fn add_pipeline_value(&mut self, value: f64) {
        if value.is_finite() && value > 0.0 {
            self.metrics.total_pipeline_value += value;
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn metrics(&self) -> &CampaignMetrics {
        &self.metrics
    }

    /// Cumulative rates. Each is 0 when its denominator is 0.
    pub fn rates(&self) -> Rates {
        self.metrics.counters().rates()
    }

    pub fn bucket(&self, day: NaiveDate) -> Option<DailyBucket> {
        self.buckets.get(&day).map(|counters| DailyBucket {
            day,
            counters: *counters,
        })
    }

    /// All buckets, day ascending.
    pub fn buckets(&self) -> Vec<DailyBucket> {
        self.buckets
            .iter()
            .map(|(day, counters)| DailyBucket {
                day: *day,
                counters: *counters,
            })
            .collect()
    }

    /// Trend over the last `window_days` days that have data.
    pub fn predict_trend(&self, window_days: u32) -> TrendPrediction {
        let metrics = &self.metrics;
        trend::predict(
            &self.buckets(),
            window_days as usize,
            self.rates(),
            metrics.prospects_researched,
            metrics.emails_sent,
        )
    }

    /// Report for one calendar day. Days without activity report zeros.
    pub fn daily_report(&self, day: NaiveDate) -> DailyReport {
        let counters = self.buckets.get(&day).copied().unwrap_or_default();
        let previous = day
            .pred_opt()
            .and_then(|d| self.buckets.get(&d).copied())
            .unwrap_or_default();

        DailyReport {
            day,
            counters,
            rates: counters.rates(),
            change_from_previous_day: DayChange::between(&counters, &previous),
            grade: performance_grade(&counters),
            insights: report::daily_insights(&counters),
        }
    }

    /// Weekly or monthly summary for the period ending on `day`.
    pub fn period_summary(&self, period: Period, day: NaiveDate) -> PeriodSummary {
        let (start, end) = period.range_ending(day);
        report::summarize(
            period,
            start,
            end,
            self.buckets.range(start..=end).map(|(d, c)| (*d, c)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadgen_shared::Grade;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn researched(prospects: u64, qualified: u64) -> Counters {
        Counters {
            prospects_researched: prospects,
            leads_qualified: qualified,
            ..Counters::default()
        }
    }

    #[test]
    fn rates_are_zero_when_nothing_recorded() {
        let agg = MetricsAggregator::new();
        assert_eq!(agg.rates(), Rates::default());
        assert_eq!(agg.metrics().conversion_rate, 0.0);
    }

    #[test]
    fn record_updates_totals_and_bucket() {
        let mut agg = MetricsAggregator::new();
        agg.record_at(day(1), &researched(10, 2));
        agg.record_at(day(1), &researched(5, 1));
        agg.record_at(day(2), &researched(4, 0));

        assert_eq!(agg.metrics().prospects_researched, 19);
        assert_eq!(agg.metrics().leads_qualified, 3);
        assert_eq!(agg.bucket(day(1)).unwrap().counters.prospects_researched, 15);
        assert_eq!(agg.buckets().len(), 2);
        assert!((agg.metrics().conversion_rate - 3.0 / 19.0).abs() < 1e-12);
    }

    #[test]
    fn record_lands_in_todays_bucket() {
        let mut agg = MetricsAggregator::new();
        agg.record(&researched(3, 1));
        let today = Utc::now().date_naive();
        assert_eq!(agg.bucket(today).map(|b| b.counters.leads_qualified), Some(1));
    }

    #[test]
    fn empty_delta_creates_no_bucket() {
        let mut agg = MetricsAggregator::new();
        agg.record_at(day(1), &Counters::default());
        assert!(agg.buckets().is_empty());
    }

    #[test]
    fn pipeline_value_accumulates() {
        let mut agg = MetricsAggregator::new();
        agg.add_pipeline_value(1_500.0);
        agg.add_pipeline_value(f64::NAN);
        agg.add_pipeline_value(500.0);
        assert_eq!(agg.metrics().total_pipeline_value, 2_000.0);
    }

    #[test]
    fn restore_from_parts() {
        let mut original = MetricsAggregator::new();
        original.record_at(day(3), &researched(8, 2));
        let restored =
            MetricsAggregator::from_parts(original.metrics().clone(), original.buckets());
        assert_eq!(restored, original);
    }

    #[test]
    fn daily_report_compares_with_previous_day() {
        let mut agg = MetricsAggregator::new();
        agg.record_at(day(1), &researched(10, 1));
        agg.record_at(day(2), &researched(60, 15));

        let report = agg.daily_report(day(2));
        assert_eq!(report.change_from_previous_day.prospects, 50);
        assert!((report.change_from_previous_day.qualification_rate - 0.15).abs() < 1e-12);
        // 0.25 qualification (40) + no emails (0) + 60 prospects (30)
        assert_eq!(report.grade, Grade::B);
        assert!(report.insights.iter().any(|i| i.contains("Excellent")));
    }

    #[test]
    fn period_summary_only_counts_days_in_range() {
        let mut agg = MetricsAggregator::new();
        agg.record_at(day(1), &researched(100, 50));
        agg.record_at(day(9), &researched(10, 2));
        agg.record_at(day(10), &researched(20, 4));

        let week = agg.period_summary(Period::Weekly, day(10));
        assert_eq!(week.start, day(4));
        assert_eq!(week.totals.prospects_researched, 30);
        assert_eq!(week.days.len(), 2);
        assert_eq!(week.average_daily_prospects, 15.0);
        assert!((week.qualification_rate - 0.2).abs() < 1e-12);

        let month = agg.period_summary(Period::Monthly, day(10));
        assert_eq!(month.totals.prospects_researched, 130);
    }

    #[test]
    fn predict_trend_uses_buckets() {
        let mut agg = MetricsAggregator::new();
        for (d, n) in [(1, 10), (2, 20), (3, 30)] {
            agg.record_at(day(d), &researched(n, n / 2));
        }
        let p = agg.predict_trend(DEFAULT_TREND_WINDOW_DAYS);
        assert_eq!(p.direction, TrendDirection::Up);
        assert_eq!(p.next_day_prospects, 20);
    }
}
