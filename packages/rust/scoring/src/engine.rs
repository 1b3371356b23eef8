//! Weighted multi-criteria lead scoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use leadgen_shared::{
    Candidate, ComponentBreakdown, ComponentScores, Criterion, LeadGenError, LeadScore,
    QualificationCriteria, QualificationLevel, Result,
};

use crate::rules;

/// Allowed drift between the weight sum and 1.0.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Hard floors below which a component disqualifies a lead.
const BUDGET_FLOOR: f64 = 0.3;
const FIT_FLOOR: f64 = 0.3;
const AUTHORITY_FLOOR: f64 = 0.2;

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// Per-criterion weights. Every weight is in [0, 1] and they sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub company_fit: f64,
    pub budget_alignment: f64,
    pub authority_level: f64,
    pub need_intensity: f64,
    pub timing_urgency: f64,
    pub engagement_potential: f64,
}

impl ScoringWeights {
    pub const DEFAULT: Self = Self {
        company_fit: 0.20,
        budget_alignment: 0.25,
        authority_level: 0.15,
        need_intensity: 0.20,
        timing_urgency: 0.10,
        engagement_potential: 0.10,
    };

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

    pub fn sum(&self) -> f64 {
        Criterion::ALL.iter().map(|c| self.get(*c)).sum()
    }

    fn validate(&self) -> Result<()> {
        for criterion in Criterion::ALL {
            let w = self.get(criterion);
            if !(0.0..=1.0).contains(&w) {
                return Err(LeadGenError::validation(format!(
                    "weight for {} must be in [0, 1], got {w}",
                    criterion.label()
                )));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(LeadGenError::validation(format!(
                "scoring weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ---------------------------------------------------------------------------
// Scorer seam
// ---------------------------------------------------------------------------

/// Anything that can turn a candidate into a [`LeadScore`].
///
/// [`QualificationPipeline`](crate::QualificationPipeline) is generic over
/// this so tests can substitute fixed component scores.
pub trait LeadScorer: Send + Sync {
    fn score(&self, candidate: &Candidate, criteria: &QualificationCriteria) -> LeadScore;
}

// ---------------------------------------------------------------------------
// ScoringEngine
// ---------------------------------------------------------------------------

/// Deterministic scoring engine. The same inputs always give the same score.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    weights: ScoringWeights,
}

impl ScoringEngine {
    /// Engine with the default weights.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with custom weights. Fails if a weight is out of range or the
    /// weights do not sum to 1.0.
    pub fn with_weights(weights: ScoringWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Compute the six raw component scores.
    pub fn component_scores(
        &self,
        candidate: &Candidate,
        criteria: &QualificationCriteria,
    ) -> ComponentScores {
        rules::component_scores(candidate, criteria)
    }

    /// Weighted sum of `components`, in [0, 1].
    pub fn overall_score(&self, components: &ComponentScores) -> f64 {
        let raw: f64 = components
            .iter()
            .map(|(criterion, value)| value * self.weights.get(criterion))
            .sum();
        // Trim float noise so tier boundaries compare exactly.
        ((raw * 1e9).round() / 1e9).clamp(0.0, 1.0)
    }

    /// Score a candidate, stamping the result with the current time.
    pub fn score_candidate(
        &self,
        candidate: &Candidate,
        criteria: &QualificationCriteria,
    ) -> LeadScore {
        let components = self.component_scores(candidate, criteria);
        self.evaluate(components, candidate, criteria, Utc::now())
    }

    /// Build a full [`LeadScore`] from already-computed component scores.
    pub fn evaluate(
        &self,
        components: ComponentScores,
        candidate: &Candidate,
        criteria: &QualificationCriteria,
        scored_at: DateTime<Utc>,
    ) -> LeadScore {
        let overall_score = self.overall_score(&components);
        let (recommendations, next_steps) = recommendations(&components);

        LeadScore {
            overall_score,
            qualification_level: QualificationLevel::from_score(overall_score),
            component_scores: components,
            breakdown: self.breakdown(&components),
            recommendations,
            next_steps,
            disqualifying_factors: disqualifying_factors(&components, candidate, criteria),
            scored_at,
        }
    }

    fn breakdown(&self, components: &ComponentScores) -> Vec<ComponentBreakdown> {
        components
            .iter()
            .map(|(criterion, raw)| ComponentBreakdown {
                criterion,
                raw,
                weighted: raw * self.weights.get(criterion),
                interpretation: interpret(criterion, raw),
            })
            .collect()
    }
}

impl LeadScorer for ScoringEngine {
    fn score(&self, candidate: &Candidate, criteria: &QualificationCriteria) -> LeadScore {
        self.score_candidate(candidate, criteria)
    }
}

fn interpret(criterion: Criterion, raw: f64) -> String {
    let band = if raw >= 0.8 {
        "Excellent"
    } else if raw >= 0.6 {
        "Good"
    } else if raw >= 0.4 {
        "Fair"
    } else {
        "Poor"
    };
    format!("{band} {}", criterion.label())
}

/// Recommendations and matching next steps, in a fixed order.
fn recommendations(c: &ComponentScores) -> (Vec<String>, Vec<String>) {
    let rules: [(bool, &str, &str); 7] = [
        (
            c.budget_alignment < 0.6,
            "Focus on cost-effective solutions and ROI demonstrations",
            "Prepare detailed pricing proposals and ROI calculations",
        ),
        (
            c.authority_level < 0.5,
            "Identify and connect with key decision-makers",
            "Research executive contacts and LinkedIn connections",
        ),
        (
            c.company_fit < 0.5,
            "Validate fit against the target profile before investing sales time",
            "Confirm industry, headcount and region with the account owner",
        ),
        (
            c.need_intensity > 0.7,
            "Emphasize problem-solution fit in communications",
            "Prepare case studies addressing similar challenges",
        ),
        (
            c.timing_urgency > 0.7,
            "Accelerate sales process with immediate value props",
            "Schedule discovery calls within 48 hours",
        ),
        (
            c.engagement_potential < 0.6,
            "Warm the account up through social and content touchpoints",
            "Follow the company's public profiles and share relevant content",
        ),
        (
            c.iter().all(|(_, v)| v > 0.7),
            "High-potential lead - prioritize immediate outreach",
            "Send personalized introduction email today",
        ),
    ];

    rules
        .into_iter()
        .filter(|(hit, _, _)| *hit)
        .map(|(_, rec, step)| (rec.to_string(), step.to_string()))
        .unzip()
}

fn disqualifying_factors(
    c: &ComponentScores,
    candidate: &Candidate,
    criteria: &QualificationCriteria,
) -> Vec<String> {
    let mut factors = Vec::new();
    if c.budget_alignment < BUDGET_FLOOR {
        factors.push("Insufficient budget capacity for our solutions".to_string());
    }
    if c.company_fit < FIT_FLOOR {
        factors.push("Company profile doesn't match target criteria".to_string());
    }
    if c.authority_level < AUTHORITY_FLOOR {
        factors.push("Unable to identify decision-making contacts".to_string());
    }
    let minimum = criteria.company_size_range.min();
    if candidate.company_size < minimum {
        factors.push(format!(
            "Company size ({}) below minimum threshold ({minimum})",
            candidate.company_size
        ));
    }
    factors
}
