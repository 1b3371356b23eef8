//! Core domain types for lead-generation campaigns.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LeadGenError, Result};

// ---------------------------------------------------------------------------
// CampaignId
// ---------------------------------------------------------------------------

/// Campaign identifier. Caller-supplied or generated from a UUID v7.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(String);

impl CampaignId {
    /// Generate a new time-sortable campaign identifier.
    pub fn generate() -> Self {
        Self(format!("campaign_{}", Uuid::now_v7().simple()))
    }

    /// Wrap a caller-supplied identifier. Rejects blank ids.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LeadGenError::validation("campaign id must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CampaignId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Campaign lifecycle status. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Idle,
    Running,
    Paused,
    Stopped,
}

impl CampaignStatus {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = LeadGenError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "idle" => Ok(Self::Idle),
            "running" => Ok(Self::Running),
            "paused" => Ok(Self::Paused),
            "stopped" => Ok(Self::Stopped),
            other => Err(LeadGenError::validation(format!(
                "unknown campaign status '{other}'"
            ))),
        }
    }
}

/// The stages of one campaign cycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStage {
    Research,
    Qualify,
    Outreach,
    CrmSync,
    Metrics,
    Persist,
}

impl CycleStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Qualify => "qualify",
            Self::Outreach => "outreach",
            Self::CrmSync => "crm_sync",
            Self::Metrics => "metrics",
            Self::Persist => "persist",
        }
    }
}

impl std::fmt::Display for CycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A named contact at a candidate company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A prospective lead as returned by a prospect provider, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Stable identifier assigned by the provider.
    pub id: String,
    pub company_name: String,
    pub industry: String,
    pub company_size: u32,
    /// Free-text bracket such as `$10M-$25M` or `$100M+`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_range: Option<String>,
    pub location: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    /// Recent news or other buying signals, as free text.
    #[serde(default)]
    pub recent_signals: Vec<String>,
    #[serde(default)]
    pub technologies: BTreeSet<String>,
    /// Network name → profile URL.
    #[serde(default)]
    pub social_profiles: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// QualificationCriteria
// ---------------------------------------------------------------------------

/// Inclusive employee-count range. Invariant: `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSizeRange")]
pub struct SizeRange {
    min: u32,
    max: u32,
}

impl SizeRange {
    pub fn new(min: u32, max: u32) -> Result<Self> {
        if min > max {
            return Err(LeadGenError::validation(format!(
                "company size range min ({min}) exceeds max ({max})"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn contains(&self, size: u32) -> bool {
        (self.min..=self.max).contains(&size)
    }
}

#[derive(Deserialize)]
struct RawSizeRange {
    min: u32,
    max: u32,
}

impl TryFrom<RawSizeRange> for SizeRange {
    type Error = LeadGenError;

    fn try_from(raw: RawSizeRange) -> Result<Self> {
        Self::new(raw.min, raw.max)
    }
}

/// Per-campaign qualification criteria, validated at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCriteria")]
pub struct QualificationCriteria {
    pub budget_minimum: u64,
    pub company_size_range: SizeRange,
    pub target_industry: String,
    pub geographic_focus: BTreeSet<String>,
}

impl QualificationCriteria {
    pub fn new(
        target_industry: impl Into<String>,
        company_size_range: SizeRange,
        budget_minimum: u64,
        geographic_focus: impl IntoIterator<Item = String>,
    ) -> Result<Self> {
        let target_industry = target_industry.into();
        if target_industry.trim().is_empty() {
            return Err(LeadGenError::validation("target industry must not be empty"));
        }
        Ok(Self {
            budget_minimum,
            company_size_range,
            target_industry,
            geographic_focus: geographic_focus
                .into_iter()
                .filter(|r| !r.trim().is_empty())
                .collect(),
        })
    }
}

#[derive(Deserialize)]
struct RawCriteria {
    budget_minimum: u64,
    company_size_range: SizeRange,
    target_industry: String,
    #[serde(default)]
    geographic_focus: BTreeSet<String>,
}

impl TryFrom<RawCriteria> for QualificationCriteria {
    type Error = LeadGenError;

    fn try_from(raw: RawCriteria) -> Result<Self> {
        Self::new(
            raw.target_industry,
            raw.company_size_range,
            raw.budget_minimum,
            raw.geographic_focus,
        )
    }
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Lower bounds (inclusive) of each qualification tier, evaluated top-down.
pub const HOT_THRESHOLD: f64 = 0.85;
pub const WARM_THRESHOLD: f64 = 0.70;
pub const COOL_THRESHOLD: f64 = 0.55;

/// Qualification tier derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationLevel {
    Cold,
    Cool,
    Warm,
    Hot,
}

impl QualificationLevel {
    /// Classify an overall score. Monotonic non-decreasing in `score`.
    pub fn from_score(score: f64) -> Self {
        if score >= HOT_THRESHOLD {
            Self::Hot
        } else if score >= WARM_THRESHOLD {
            Self::Warm
        } else if score >= COOL_THRESHOLD {
            Self::Cool
        } else {
            Self::Cold
        }
    }

    /// Whether leads of this tier survive qualification.
    pub fn is_qualified(&self) -> bool {
        matches!(self, Self::Hot | Self::Warm)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Warm => "warm",
            Self::Cool => "cool",
            Self::Cold => "cold",
        }
    }
}

impl std::fmt::Display for QualificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six scoring criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    CompanyFit,
    BudgetAlignment,
    AuthorityLevel,
    NeedIntensity,
    TimingUrgency,
    EngagementPotential,
}

impl Criterion {
    pub const ALL: [Criterion; 6] = [
        Self::CompanyFit,
        Self::BudgetAlignment,
        Self::AuthorityLevel,
        Self::NeedIntensity,
        Self::TimingUrgency,
        Self::EngagementPotential,
    ];

    /// Human-readable label ("budget alignment").
    pub fn label(&self) -> &'static str {
        match self {
            Self::CompanyFit => "company fit",
            Self::BudgetAlignment => "budget alignment",
            Self::AuthorityLevel => "authority level",
            Self::NeedIntensity => "need intensity",
            Self::TimingUrgency => "timing urgency",
            Self::EngagementPotential => "engagement potential",
        }
    }
}

/// One score in [0, 1] per criterion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub company_fit: f64,
    pub budget_alignment: f64,
    pub authority_level: f64,
    pub need_intensity: f64,
    pub timing_urgency: f64,
    pub engagement_potential: f64,
}

impl ComponentScores {
    /// All six components set to the same value.
    pub fn uniform(value: f64) -> Self {
        Self {
            company_fit: value,
            budget_alignment: value,
            authority_level: value,
            need_intensity: value,
            timing_urgency: value,
            engagement_potential: value,
        }
    }

    pub fn get(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::CompanyFit => self.company_fit,
            Criterion::BudgetAlignment => self.budget_alignment,
            Criterion::AuthorityLevel => self.authority_level,
            Criterion::NeedIntensity => self.need_intensity,
            Criterion::TimingUrgency => self.timing_urgency,
            Criterion::EngagementPotential => self.engagement_potential,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Criterion, f64)> + '_ {
        Criterion::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    /// True when every component lies in [0, 1].
    pub fn is_valid(&self) -> bool {
        self.iter().all(|(_, v)| (0.0..=1.0).contains(&v))
    }
}

/// Per-criterion explanation of the overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentBreakdown {
    pub criterion: Criterion,
    pub raw: f64,
    pub weighted: f64,
    pub interpretation: String,
}

/// Result of scoring one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadScore {
    /// Weighted sum of the component scores, in [0, 1].
    pub overall_score: f64,
    pub qualification_level: QualificationLevel,
    pub component_scores: ComponentScores,
    #[serde(default)]
    pub breakdown: Vec<ComponentBreakdown>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub disqualifying_factors: Vec<String>,
    pub scored_at: DateTime<Utc>,
}

/// A candidate that scored Warm or Hot, with its rank in the batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifiedLead {
    pub candidate: Candidate,
    pub score: LeadScore,
    /// 1-based, contiguous within one qualification batch.
    pub priority_rank: u32,
    pub estimated_value: f64,
    /// In [0, 1].
    pub conversion_probability: f64,
    pub recommended_approach: String,
    pub qualified_at: DateTime<Utc>,
}

impl QualifiedLead {
    pub fn id(&self) -> &str {
        &self.candidate.id
    }

    pub fn overall_score(&self) -> f64 {
        self.score.overall_score
    }
}

// ---------------------------------------------------------------------------
// Counters & metrics
// ---------------------------------------------------------------------------

/// `numerator / denominator`, or 0 when the denominator is 0.
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Raw activity counters. Used for cycle totals and daily buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub prospects_researched: u64,
    pub leads_qualified: u64,
    pub emails_sent: u64,
    pub responses_received: u64,
    pub meetings_booked: u64,
}

impl Counters {
    pub fn add(&mut self, other: &Counters) {
        self.prospects_researched += other.prospects_researched;
        self.leads_qualified += other.leads_qualified;
        self.emails_sent += other.emails_sent;
        self.responses_received += other.responses_received;
        self.meetings_booked += other.meetings_booked;
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn rates(&self) -> Rates {
        Rates {
            qualification_rate: ratio(self.leads_qualified, self.prospects_researched),
            response_rate: ratio(self.responses_received, self.emails_sent),
            conversion_rate: ratio(self.meetings_booked, self.leads_qualified),
        }
    }
}

/// Derived rates. Each is 0 when its denominator is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    /// leads qualified / prospects researched
    pub qualification_rate: f64,
    /// responses / emails sent
    pub response_rate: f64,
    /// meetings booked / leads qualified
    pub conversion_rate: f64,
}

/// Cumulative campaign counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetrics {
    pub prospects_researched: u64,
    pub leads_qualified: u64,
    pub emails_sent: u64,
    pub responses_received: u64,
    pub meetings_booked: u64,
    /// leads qualified / prospects researched (0 when nothing was researched).
    pub conversion_rate: f64,
    /// Sum of estimated value over all qualified leads.
    #[serde(default)]
    pub total_pipeline_value: f64,
}

impl CampaignMetrics {
    pub fn counters(&self) -> Counters {
        Counters {
            prospects_researched: self.prospects_researched,
            leads_qualified: self.leads_qualified,
            emails_sent: self.emails_sent,
            responses_received: self.responses_received,
            meetings_booked: self.meetings_booked,
        }
    }

    /// Fold a set of counters in and refresh the derived conversion rate.
    pub fn apply(&mut self, delta: &Counters) {
        self.prospects_researched += delta.prospects_researched;
        self.leads_qualified += delta.leads_qualified;
        self.emails_sent += delta.emails_sent;
        self.responses_received += delta.responses_received;
        self.meetings_booked += delta.meetings_booked;
        self.update_conversion_rate();
    }

    pub fn update_conversion_rate(&mut self) {
        self.conversion_rate = ratio(self.leads_qualified, self.prospects_researched);
    }
}

/// Per-calendar-day (UTC) counter snapshot used for trend analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBucket {
    pub day: NaiveDate,
    pub counters: Counters,
}

impl DailyBucket {
    pub fn empty(day: NaiveDate) -> Self {
        Self {
            day,
            counters: Counters::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Campaign state & reports
// ---------------------------------------------------------------------------

/// The persisted campaign record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignState {
    pub campaign_id: CampaignId,
    pub status: CampaignStatus,
    pub started_at: DateTime<Utc>,
    pub metrics: CampaignMetrics,
    pub last_updated: DateTime<Utc>,
}

impl CampaignState {
    /// A freshly started campaign.
    pub fn started(campaign_id: CampaignId, now: DateTime<Utc>) -> Self {
        Self {
            campaign_id,
            status: CampaignStatus::Running,
            started_at: now,
            metrics: CampaignMetrics::default(),
            last_updated: now,
        }
    }
}

/// Letter grade for a counter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        f.write_str(s)
    }
}

/// Summary emitted once when a campaign is stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub campaign_id: CampaignId,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Whole days elapsed, plus one (a same-day campaign lasted 1 day).
    pub duration_days: u32,
    pub duration_secs: i64,
    pub final_metrics: CampaignMetrics,
    pub rates: Rates,
    pub daily_average_prospects: f64,
    pub target_achievement: f64,
    pub grade: Grade,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_id_rejects_blank() {
        assert!(CampaignId::parse("   ").is_err());
        let id = CampaignId::parse(" c1 ").expect("parse");
        assert_eq!(id.as_str(), "c1");
        assert!(CampaignId::generate().as_str().starts_with("campaign_"));
    }

    #[test]
    fn status_roundtrip() {
        for status in [
            CampaignStatus::Idle,
            CampaignStatus::Running,
            CampaignStatus::Paused,
            CampaignStatus::Stopped,
        ] {
            let parsed: CampaignStatus = status.as_str().parse().expect("parse");
            assert_eq!(parsed, status);
        }
        assert!("archived".parse::<CampaignStatus>().is_err());
    }

    #[test]
    fn size_range_invariant() {
        assert!(SizeRange::new(500, 50).is_err());
        let range = SizeRange::new(50, 500).expect("range");
        assert!(range.contains(50));
        assert!(range.contains(500));
        assert!(!range.contains(501));
    }

    #[test]
    fn deserialization_validates_criteria() {
        let range: SizeRange = serde_json::from_str(r#"{"min":50,"max":500}"#).expect("range");
        assert_eq!(range, SizeRange::new(50, 500).expect("range"));
        assert!(serde_json::from_str::<SizeRange>(r#"{"min":500,"max":50}"#).is_err());

        let criteria: QualificationCriteria = serde_json::from_str(
            r#"{"budget_minimum":10000,"company_size_range":{"min":50,"max":500},
                "target_industry":"technology","geographic_focus":["United States",""]}"#,
        )
        .expect("criteria");
        assert_eq!(criteria.geographic_focus.len(), 1);

        let blank = r#"{"budget_minimum":0,"company_size_range":{"min":1,"max":2},
                        "target_industry":"  "}"#;
        assert!(serde_json::from_str::<QualificationCriteria>(blank).is_err());
        let inverted = r#"{"budget_minimum":0,"company_size_range":{"min":9,"max":2},
                           "target_industry":"technology"}"#;
        assert!(serde_json::from_str::<QualificationCriteria>(inverted).is_err());
    }

    #[test]
    fn qualification_level_thresholds() {
        assert_eq!(QualificationLevel::from_score(0.30), QualificationLevel::Cold);
        assert_eq!(QualificationLevel::from_score(0.60), QualificationLevel::Cool);
        assert_eq!(QualificationLevel::from_score(0.75), QualificationLevel::Warm);
        assert_eq!(QualificationLevel::from_score(0.90), QualificationLevel::Hot);
        assert_eq!(QualificationLevel::from_score(0.85), QualificationLevel::Hot);
        assert_eq!(QualificationLevel::from_score(0.70), QualificationLevel::Warm);
    }

    #[test]
    fn qualification_level_is_monotonic() {
        let mut previous = QualificationLevel::Cold;
        for step in 0..=1000 {
            let level = QualificationLevel::from_score(step as f64 / 1000.0);
            assert!(level >= previous, "tier dropped at {step}");
            previous = level;
        }
    }

    #[test]
    fn rates_are_zero_without_denominator() {
        let rates = Counters::default().rates();
        assert_eq!(rates.qualification_rate, 0.0);
        assert_eq!(rates.response_rate, 0.0);
        assert_eq!(rates.conversion_rate, 0.0);
    }

    #[test]
    fn metrics_apply_updates_conversion_rate() {
        let mut metrics = CampaignMetrics::default();
        metrics.apply(&Counters {
            prospects_researched: 8,
            leads_qualified: 2,
            ..Counters::default()
        });
        assert_eq!(metrics.conversion_rate, 0.25);
        assert_eq!(metrics.counters().leads_qualified, 2);
    }

    #[test]
    fn campaign_state_serialization() {
        let state = CampaignState::started(CampaignId::parse("c1").unwrap(), Utc::now());
        let json = serde_json::to_string(&state).expect("serialize");
        assert!(json.contains(r#""status":"running""#));
        let parsed: CampaignState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, state);
    }
}
