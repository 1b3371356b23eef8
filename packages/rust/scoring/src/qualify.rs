//! Batch qualification: score, filter to Warm/Hot, rank.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info, instrument};

use leadgen_shared::{
    Candidate, HOT_THRESHOLD, LeadGenError, LeadScore, QualificationCriteria, QualifiedLead,
    Result, WARM_THRESHOLD,
};

use crate::engine::{LeadScorer, ScoringEngine};

/// Scores candidates and keeps the Warm and Hot ones, ranked by score.
#[derive(Debug, Clone, Default)]
pub struct QualificationPipeline<S = ScoringEngine> {
    scorer: S,
}

impl QualificationPipeline<ScoringEngine> {
    /// Pipeline backed by the default [`ScoringEngine`].
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: LeadScorer> QualificationPipeline<S> {
    pub fn with_scorer(scorer: S) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Score every candidate and return the qualified ones ranked 1..N.
    ///
    /// Cool and Cold candidates are dropped silently. Equal scores keep
    /// their input order.
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub fn qualify(
        &self,
        candidates: &[Candidate],
        criteria: &QualificationCriteria,
    ) -> Vec<QualifiedLead> {
        let scored = candidates
            .iter()
            .map(|candidate| (candidate.clone(), self.scorer.score(candidate, criteria)));
        let leads = rank(scored);

        info!(
            candidates = candidates.len(),
            qualified = leads.len(),
            "qualification complete"
        );
        leads
    }

    /// Re-score previously qualified leads.
    ///
    /// `refreshed` maps lead ids to updated candidate data; leads without an
    /// entry are re-scored against their current snapshot. Leads that fall
    /// below Warm are dropped and the rest are re-ranked.
    #[instrument(skip_all, fields(leads = leads.len(), refreshed = refreshed.len()))]
    pub fn rescore(
        &self,
        leads: &[QualifiedLead],
        refreshed: &HashMap<String, Candidate>,
        criteria: &QualificationCriteria,
    ) -> Result<Vec<QualifiedLead>> {
        if let Some(unknown) = refreshed
            .keys()
            .find(|id| !leads.iter().any(|lead| lead.id() == id.as_str()))
        {
            return Err(LeadGenError::validation(format!(
                "no qualified lead with id '{unknown}'"
            )));
        }

        let scored = leads.iter().map(|lead| {
            let candidate = refreshed
                .get(lead.id())
                .cloned()
                .unwrap_or_else(|| lead.candidate.clone());
            let score = self.scorer.score(&candidate, criteria);
            (candidate, score)
        });

        let before = leads.len();
        let ranked = rank(scored);
        if ranked.len() < before {
            info!(
                dropped = before - ranked.len(),
                "leads fell below qualification threshold on rescore"
            );
        }
        Ok(ranked)
    }
}

/// Filter to qualified tiers, stable-sort by score descending, assign ranks.
fn rank(scored: impl Iterator<Item = (Candidate, LeadScore)>) -> Vec<QualifiedLead> {
    let now = Utc::now();
    let mut survivors: Vec<(Candidate, LeadScore)> = scored
        .filter(|(candidate, score)| {
            let keep = score.qualification_level.is_qualified();
            if !keep {
                debug!(
                    lead = %candidate.id,
                    score = score.overall_score,
                    level = %score.qualification_level,
                    "candidate not qualified"
                );
            }
            keep
        })
        .collect();

    survivors.sort_by(|a, b| b.1.overall_score.total_cmp(&a.1.overall_score));

    survivors
        .into_iter()
        .enumerate()
        .map(|(i, (candidate, score))| {
            let overall = score.overall_score;
            QualifiedLead {
                estimated_value: f64::from(candidate.company_size) * 100.0 * (0.5 + 0.5 * overall),
                conversion_probability: 0.1 + 0.8 * overall,
                recommended_approach: recommended_approach(overall).to_string(),
                priority_rank: i as u32 + 1,
                qualified_at: now,
                candidate,
                score,
            }
        })
        .collect()
}

fn recommended_approach(overall: f64) -> &'static str {
    if overall >= HOT_THRESHOLD {
        "Direct executive outreach with value proposition"
    } else if overall >= WARM_THRESHOLD {
        "Multi-touch campaign with educational content"
    } else {
        "Nurture campaign with case studies and webinars"
    }
}
