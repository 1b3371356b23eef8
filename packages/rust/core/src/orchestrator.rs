//! Campaign lifecycle and the per-cycle pipeline:
//! research → qualify → outreach → CRM sync → metrics → persist.
//!
//! One [`CampaignOrchestrator`] drives one campaign. State transitions:
//!
//! ```text
//! Idle ──start──▶ Running ◀──resume── Paused
//!                   │  └────pause────▶  │
//!                   └──stop──▶ Stopped ◀┘
//! ```
//!
//! Only one cycle runs at a time; a second concurrent `run_cycle` is
//! rejected. `pause` and `stop` wait for an in-flight cycle to finish.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, instrument, warn};

use leadgen_analytics::{DailyReport, MetricsAggregator, Period, PeriodSummary, TrendPrediction};
use leadgen_scoring::QualificationPipeline;
use leadgen_shared::{
    CampaignConfig, CampaignId, CampaignMetrics, CampaignState, CampaignStatus, Candidate,
    Counters, CrmProvider, CrmSyncSummary, CycleStage, FinalReport, LeadGenError,
    OutreachProvider, OutreachSummary, PersistenceStore, ProspectProvider, QualifiedLead, Result,
};

use crate::report::{self, StatusReport};

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting cycle status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new stage.
    fn phase(&self, stage: CycleStage);
    /// Called when the cycle completes successfully.
    fn done(&self, report: &CycleReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _stage: CycleStage) {}
    fn done(&self, _report: &CycleReport) {}
}

/// Result of one successful cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub campaign_id: CampaignId,
    /// Counters contributed by this cycle alone.
    pub cycle: Counters,
    pub outreach: Option<OutreachSummary>,
    pub crm: Option<CrmSyncSummary>,
    /// This cycle's qualified leads, ranked.
    pub leads: Vec<QualifiedLead>,
    /// Cumulative metrics after the cycle.
    pub metrics: CampaignMetrics,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Mutable campaign state. `state` is `None` until a campaign is started or
/// restored.
#[derive(Default, Clone)]
struct Inner {
    state: Option<CampaignState>,
    aggregator: MetricsAggregator,
    leads: Vec<QualifiedLead>,
    final_report: Option<FinalReport>,
}

impl Inner {
    fn status(&self) -> CampaignStatus {
        self.state
            .as_ref()
            .map_or(CampaignStatus::Idle, |s| s.status)
    }

    /// Fold stage counters into the aggregator and mirror them onto the state.
    fn fold(&mut self, day: NaiveDate, delta: &Counters) {
        self.aggregator.record_at(day, delta);
        if let Some(state) = self.state.as_mut() {
            state.metrics = self.aggregator.metrics().clone();
        }
    }
}

/// Drives one lead-generation campaign against injected providers.
pub struct CampaignOrchestrator {
    config: CampaignConfig,
    pipeline: QualificationPipeline,
    prospects: Box<dyn ProspectProvider>,
    outreach: Option<Box<dyn OutreachProvider>>,
    crm: Option<Box<dyn CrmProvider>>,
    store: Box<dyn PersistenceStore>,
    /// Held for the duration of a cycle.
    cycle: Mutex<()>,
    inner: Mutex<Inner>,
}

impl CampaignOrchestrator {
    pub fn new(
        config: CampaignConfig,
        prospects: impl ProspectProvider + 'static,
        store: impl PersistenceStore + 'static,
    ) -> Self {
        Self {
            config,
            pipeline: QualificationPipeline::new(),
            prospects: Box::new(prospects),
            outreach: None,
            crm: None,
            store: Box::new(store),
            cycle: Mutex::new(()),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn with_outreach(mut self, outreach: impl OutreachProvider + 'static) -> Self {
        self.outreach = Some(Box::new(outreach));
        self
    }

    pub fn with_crm(mut self, crm: impl CrmProvider + 'static) -> Self {
        self.crm = Some(Box::new(crm));
        self
    }

    pub fn with_pipeline(mut self, pipeline: QualificationPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn config(&self) -> &CampaignConfig {
        &self.config
    }

    /// Current lifecycle status (`Idle` before `start`/`restore`).
    pub async fn current_status(&self) -> CampaignStatus {
        self.inner.lock().await.status()
    }

    pub async fn campaign_id(&self) -> Option<CampaignId> {
        self.inner
            .lock()
            .await
            .state
            .as_ref()
            .map(|s| s.campaign_id.clone())
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Start a new campaign, generating an id if none is given.
    #[instrument(skip_all, fields(campaign_id))]
    pub async fn start(&self, campaign_id: Option<CampaignId>) -> Result<CampaignState> {
        let mut inner = self.inner.lock().await;
        match &inner.state {
            None => {}
            Some(state) if state.status.is_terminal() => {
                return Err(LeadGenError::invalid_state("start", state.status));
            }
            Some(state) => {
                return Err(LeadGenError::AlreadyRunning {
                    campaign_id: state.campaign_id.to_string(),
                });
            }
        }

        let campaign_id = campaign_id.unwrap_or_else(CampaignId::generate);
        tracing::Span::current().record("campaign_id", campaign_id.as_str());

        if self.store.load(&campaign_id).await?.is_some() {
            return Err(LeadGenError::validation(format!(
                "campaign '{campaign_id}' already exists"
            )));
        }

        let state = CampaignState::started(campaign_id, Utc::now());
        self.store.save(&state).await?;

        *inner = Inner {
            state: Some(state.clone()),
            ..Inner::default()
        };
        info!(campaign_id = %state.campaign_id, "campaign started");
        Ok(state)
    }

    /// Load an existing campaign from the store into this orchestrator.
    #[instrument(skip_all, fields(campaign_id = %campaign_id))]
    pub async fn restore(&self, campaign_id: &CampaignId) -> Result<CampaignState> {
        let mut inner = self.inner.lock().await;
        if let Some(state) = &inner.state {
            return Err(LeadGenError::invalid_state(
                format!("restore '{campaign_id}'"),
                state.status,
            ));
        }

        let state = self
            .store
            .load(campaign_id)
            .await?
            .ok_or_else(|| LeadGenError::validation(format!("unknown campaign '{campaign_id}'")))?;
        let buckets = self.store.load_daily_buckets(campaign_id).await?;
        let final_report = if state.status.is_terminal() {
            self.store.load_report(campaign_id).await?
        } else {
            None
        };

        *inner = Inner {
            aggregator: MetricsAggregator::from_parts(state.metrics.clone(), buckets),
            state: Some(state.clone()),
            leads: Vec::new(),
            final_report,
        };
        info!(status = %state.status, "campaign restored");
        Ok(state)
    }

    /// Pause a running campaign. No-op if already paused.
    #[instrument(skip_all)]
    pub async fn pause(&self) -> Result<CampaignState> {
        self.transition("pause", CampaignStatus::Running, CampaignStatus::Paused)
            .await
    }

    /// Resume a paused campaign. No-op if already running.
    #[instrument(skip_all)]
    pub async fn resume(&self) -> Result<CampaignState> {
        self.transition("resume", CampaignStatus::Paused, CampaignStatus::Running)
            .await
    }

    async fn transition(
        &self,
        operation: &str,
        from: CampaignStatus,
        to: CampaignStatus,
    ) -> Result<CampaignState> {
        let _cycle = self.cycle.lock().await;
        let mut inner = self.inner.lock().await;
        let current = inner
            .state
            .clone()
            .ok_or_else(|| LeadGenError::invalid_state(operation, CampaignStatus::Idle))?;

        if current.status == to {
            return Ok(current);
        }
        if current.status != from {
            return Err(LeadGenError::invalid_state(operation, current.status));
        }

        let mut next = current;
        next.status = to;
        next.last_updated = Utc::now();
        self.store.save(&next).await?;

        info!(campaign_id = %next.campaign_id, %from, %to, "campaign status changed");
        inner.state = Some(next.clone());
        Ok(next)
    }

    /// Stop the campaign and emit its final report.
    ///
    /// Returns `None` (and does nothing) unless the campaign is running or
    /// paused. Waits for an in-flight cycle to finish first.
    #[instrument(skip_all)]
    pub async fn stop(&self) -> Result<Option<FinalReport>> {
        let _cycle = self.cycle.lock().await;
        let mut inner = self.inner.lock().await;

        let Some(current) = inner.state.clone() else {
            return Ok(None);
        };
        if !matches!(
            current.status,
            CampaignStatus::Running | CampaignStatus::Paused
        ) {
            return Ok(None);
        }

        let now = Utc::now();
        let mut stopped = current;
        stopped.status = CampaignStatus::Stopped;
        stopped.last_updated = now;
        let report = report::final_report(&stopped, now, self.config.daily_lead_target);

        self.store.save_report(&report).await?;
        self.store.save(&stopped).await?;

        info!(
            campaign_id = %stopped.campaign_id,
            days = report.duration_days,
            prospects = report.final_metrics.prospects_researched,
            qualified = report.final_metrics.leads_qualified,
            grade = %report.grade,
            "campaign stopped"
        );
        inner.state = Some(stopped);
        inner.leads.clear();
        inner.final_report = Some(report.clone());
        Ok(Some(report))
    }

    // -----------------------------------------------------------------------
    // Cycle
    // -----------------------------------------------------------------------

    pub async fn run_cycle(&self) -> Result<CycleReport> {
        self.run_cycle_with(&SilentProgress).await
    }

    /// Run one cycle, reporting each stage to `progress`.
    ///
    /// Each stage's counters are folded into the campaign metrics as soon as
    /// the stage completes. If a later stage fails, those metrics are kept
    /// and written to the store before the `CycleError` is returned. If that
    /// write fails, or the final persist fails, the cache is rolled back to
    /// what the store last accepted.
    #[instrument(skip_all, fields(campaign_id))]
    pub async fn run_cycle_with(&self, progress: &dyn ProgressReporter) -> Result<CycleReport> {
        let Ok(_cycle) = self.cycle.try_lock() else {
            let status = self.inner.try_lock().map_or(CampaignStatus::Running, |i| i.status());
            return Err(LeadGenError::invalid_state(
                "run a cycle (another cycle is in progress)",
                status,
            ));
        };

        let mut inner = self.inner.lock().await;
        let campaign_id = match &inner.state {
            Some(state) if state.status == CampaignStatus::Running => state.campaign_id.clone(),
            _ => return Err(LeadGenError::invalid_state("run a cycle", inner.status())),
        };
        tracing::Span::current().record("campaign_id", campaign_id.as_str());

        let started = Instant::now();
        let day = Utc::now().date_naive();
        let mut cycle = Counters::default();
        let committed = inner.clone();

        // --- Stage 1: Research ---
        progress.phase(CycleStage::Research);
        let candidates: Vec<Candidate> =
            match self.prospects.research(self.config.daily_lead_target).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    return Err(self.abort(&mut inner, committed, day, CycleStage::Research, e).await);
                }
            };
        let researched = Counters {
            prospects_researched: candidates.len() as u64,
            ..Counters::default()
        };
        inner.fold(day, &researched);
        cycle.add(&researched);
        info!(provider = self.prospects.name(), count = candidates.len(), "research complete");

        // --- Stage 2: Qualify ---
        progress.phase(CycleStage::Qualify);
        let leads = self.pipeline.qualify(&candidates, &self.config.criteria);
        let qualified = Counters {
            leads_qualified: leads.len() as u64,
            ..Counters::default()
        };
        inner
            .aggregator
            .add_pipeline_value(leads.iter().map(|l| l.estimated_value).sum());
        inner.fold(day, &qualified);
        cycle.add(&qualified);
        inner.leads = leads.clone();

        // --- Stage 3: Outreach (optional) ---
        let mut outreach_summary = None;
        if let Some(outreach) = self.outreach.as_ref().filter(|_| {
            self.config.email_sequence_enabled && !leads.is_empty()
        }) {
            progress.phase(CycleStage::Outreach);
            let summary = match outreach.send_sequences(&leads).await {
                Ok(summary) => summary,
                Err(e) => {
                    return Err(self.abort(&mut inner, committed, day, CycleStage::Outreach, e).await);
                }
            };
            let contacted = Counters {
                emails_sent: summary.sent,
                responses_received: summary.responses,
                meetings_booked: summary.meetings_booked,
                ..Counters::default()
            };
            inner.fold(day, &contacted);
            cycle.add(&contacted);
            info!(
                provider = outreach.name(),
                sent = summary.sent,
                failed = summary.failed,
                responses = summary.responses,
                "outreach complete"
            );
            outreach_summary = Some(summary);
        }

        // --- Stage 4: CRM sync (optional) ---
        let mut crm_summary = None;
        if let Some(crm) = self
            .crm
            .as_ref()
            .filter(|_| self.config.crm_integration && !leads.is_empty())
        {
            progress.phase(CycleStage::CrmSync);
            let summary = match crm.sync_leads(&leads).await {
                Ok(summary) => summary,
                Err(e) => {
                    return Err(self.abort(&mut inner, committed, day, CycleStage::CrmSync, e).await);
                }
            };
            info!(
                provider = crm.name(),
                synced = summary.successful_syncs,
                failed = summary.failed_syncs,
                duplicates = summary.duplicates_found,
                "crm sync complete"
            );
            crm_summary = Some(summary);
        }

        // --- Stage 5: Metrics ---
        progress.phase(CycleStage::Metrics);
        let metrics = inner.aggregator.metrics().clone();
        if let Some(state) = inner.state.as_mut() {
            state.metrics = metrics.clone();
            state.last_updated = Utc::now();
        }

        // --- Stage 6: Persist ---
        progress.phase(CycleStage::Persist);
        if let Err(e) = self.persist(&inner, day).await {
            warn!(error = %e, "cycle not persisted; discarding its metrics");
            *inner = committed;
            return Err(LeadGenError::cycle(CycleStage::Persist, e));
        }

        let report = CycleReport {
            campaign_id,
            cycle,
            outreach: outreach_summary,
            crm: crm_summary,
            leads,
            metrics,
            elapsed: started.elapsed(),
        };
        info!(
            prospects = cycle.prospects_researched,
            qualified = cycle.leads_qualified,
            emails = cycle.emails_sent,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "cycle complete"
        );
        progress.done(&report);
        Ok(report)
    }

    /// Write the day's bucket, then the campaign state.
    async fn persist(&self, inner: &Inner, day: NaiveDate) -> Result<()> {
        let Some(state) = inner.state.as_ref() else {
            return Ok(());
        };
        if let Some(bucket) = inner.aggregator.bucket(day) {
            self.store
                .save_daily_bucket(&state.campaign_id, &bucket)
                .await?;
        }
        self.store.save(state).await
    }

    /// Persist partial progress after a stage failure and wrap the cause.
    ///
    /// If the write fails the cache is reset to `committed` and the write
    /// error travels in the returned `CycleError`.
    async fn abort(
        &self,
        inner: &mut Inner,
        committed: Inner,
        day: NaiveDate,
        stage: CycleStage,
        cause: LeadGenError,
    ) -> LeadGenError {
        warn!(%stage, error = %cause, "cycle stage failed");
        if let Some(state) = inner.state.as_mut() {
            state.last_updated = Utc::now();
        }
        match self.persist(inner, day).await {
            Ok(()) => LeadGenError::cycle(stage, cause),
            Err(write_err) => {
                warn!(%stage, error = %write_err, "could not persist partial cycle metrics");
                *inner = committed;
                LeadGenError::cycle_unsaved(stage, cause, write_err)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Status, duration and rates of the current campaign.
    pub async fn status(&self) -> Result<StatusReport> {
        let inner = self.inner.lock().await;
        let state = inner
            .state
            .clone()
            .ok_or_else(|| LeadGenError::invalid_state("report status", CampaignStatus::Idle))?;
        Ok(StatusReport::new(
            state,
            Utc::now(),
            self.config.daily_lead_target,
        ))
    }

    /// Trend prediction over the configured trailing window.
    pub async fn insights(&self) -> Result<TrendPrediction> {
        let inner = self.require_campaign("generate insights").await?;
        Ok(inner.aggregator.predict_trend(self.config.trend_window_days))
    }

    pub async fn daily_report(&self, day: NaiveDate) -> Result<DailyReport> {
        let inner = self.require_campaign("generate a daily report").await?;
        Ok(inner.aggregator.daily_report(day))
    }

    pub async fn period_summary(&self, period: Period, day: NaiveDate) -> Result<PeriodSummary> {
        let inner = self.require_campaign("generate a period summary").await?;
        Ok(inner.aggregator.period_summary(period, day))
    }

    /// The report written when the campaign stopped, if it has.
    pub async fn final_report(&self) -> Option<FinalReport> {
        self.inner.lock().await.final_report.clone()
    }

    /// Ranked leads from the most recent cycle.
    pub async fn leads(&self) -> Vec<QualifiedLead> {
        self.inner.lock().await.leads.clone()
    }

    /// Re-score the most recent cycle's leads against refreshed candidate data.
    #[instrument(skip_all, fields(refreshed = refreshed.len()))]
    pub async fn rescore_leads(
        &self,
        refreshed: &HashMap<String, Candidate>,
    ) -> Result<Vec<QualifiedLead>> {
        let mut inner = self.require_campaign("rescore leads").await?;
        let rescored = self
            .pipeline
            .rescore(&inner.leads, refreshed, &self.config.criteria)?;
        inner.leads = rescored.clone();
        Ok(rescored)
    }

    async fn require_campaign(&self, operation: &str) -> Result<MutexGuard<'_, Inner>> {
        let inner = self.inner.lock().await;
        if inner.state.is_none() {
            return Err(LeadGenError::invalid_state(operation, CampaignStatus::Idle));
        }
        Ok(inner)
    }
}
