//! Component scoring rules.
//!
//! Each rule maps a candidate (and, where relevant, the campaign criteria)
//! to a value in [0, 1].

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use leadgen_shared::{Candidate, ComponentScores, QualificationCriteria};

/// Keywords in recent signals that indicate an active need.
const NEED_KEYWORDS: &[&str] = &[
    "expansion",
    "growth",
    "scaling",
    "challenge",
    "problem",
    "solution",
    "funding",
    "hiring",
];

/// Keywords in recent signals that indicate a near-term decision.
const URGENCY_KEYWORDS: &[&str] = &[
    "urgent",
    "immediate",
    "deadline",
    "crisis",
    "problem",
    "launch",
];

/// Compute all six component scores for one candidate.
pub(crate) fn component_scores(
    candidate: &Candidate,
    criteria: &QualificationCriteria,
) -> ComponentScores {
    ComponentScores {
        company_fit: company_fit(candidate, criteria),
        budget_alignment: budget_alignment(candidate, criteria),
        authority_level: authority_level(candidate),
        need_intensity: need_intensity(candidate),
        timing_urgency: timing_urgency(candidate),
        engagement_potential: engagement_potential(candidate),
    }
}

// ---------------------------------------------------------------------------
// Rule 1: Company fit
// ---------------------------------------------------------------------------

/// Mean of industry, size and geography checks.
fn company_fit(candidate: &Candidate, criteria: &QualificationCriteria) -> f64 {
    let industry = if candidate
        .industry
        .trim()
        .eq_ignore_ascii_case(criteria.target_industry.trim())
    {
        1.0
    } else {
        0.0
    };

    let range = criteria.company_size_range;
    let size = if range.contains(candidate.company_size) {
        1.0
    } else if candidate.company_size < range.min() {
        0.3
    } else {
        0.0
    };

    let location = candidate.location.to_lowercase();
    let geography = if criteria.geographic_focus.is_empty()
        || criteria
            .geographic_focus
            .iter()
            .any(|region| location.contains(&region.to_lowercase()))
    {
        1.0
    } else {
        0.0
    };

    (industry + size + geography) / 3.0
}

// ---------------------------------------------------------------------------
// Rule 2: Budget alignment
// ---------------------------------------------------------------------------

/// Annual revenue bounds in dollars. `upper` is `None` for open brackets (`$100M+`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RevenueBracket {
    pub lower: f64,
    pub upper: Option<f64>,
}

/// Parse a free-text revenue bracket such as `$10M-$25M`, `$100M+` or `$500K-$1M`.
///
/// Returns `None` when no dollar amount can be found.
pub(crate) fn parse_revenue_range(raw: &str) -> Option<RevenueBracket> {
    static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)\$?\s*(\d+(?:\.\d+)?)\s*([kmb])?").expect("valid regex")
    });

    // Thousands separators.
    let cleaned = raw.replace(',', "");
    let amounts: Vec<f64> = AMOUNT_RE
        .captures_iter(&cleaned)
        .filter_map(|caps| {
            let value: f64 = caps[1].parse().ok()?;
            let multiplier = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
                Some(s) if s == "k" => 1e3,
                Some(s) if s == "m" => 1e6,
                Some(s) if s == "b" => 1e9,
                _ => 1.0,
            };
            Some(value * multiplier)
        })
        .collect();

    match amounts.as_slice() {
        [] => None,
        [single] if cleaned.contains('+') => Some(RevenueBracket {
            lower: *single,
            upper: None,
        }),
        [single] => Some(RevenueBracket {
            lower: *single,
            upper: Some(*single),
        }),
        [first, second, ..] => Some(RevenueBracket {
            lower: first.min(*second),
            upper: Some(first.max(*second)),
        }),
    }
}

fn budget_alignment(candidate: &Candidate, criteria: &QualificationCriteria) -> f64 {
    let Some(bracket) = candidate
        .revenue_range
        .as_deref()
        .and_then(parse_revenue_range)
    else {
        return 0.5;
    };

    if let Some(upper) = bracket.upper {
        if upper < criteria.budget_minimum as f64 {
            return 0.1;
        }
    }

    match bracket.lower {
        l if l >= 50e6 => 1.0,
        l if l >= 10e6 => 0.8,
        l if l >= 5e6 => 0.6,
        l if l >= 1e6 => 0.3,
        _ => 0.1,
    }
}

// ---------------------------------------------------------------------------
// Rule 3: Authority level
// ---------------------------------------------------------------------------

/// Score one job title on the decision-making ladder.
pub(crate) fn title_authority(title: &str) -> f64 {
    let lower = title.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let has_word = |w: &str| words.contains(&w);
    let is_vice = lower.contains("vice president");

    if !is_vice
        && ["chief", "ceo", "cto", "cfo", "coo", "founder", "cofounder", "owner", "president"]
            .iter()
            .any(|w| has_word(w))
    {
        1.0
    } else if is_vice || ["vp", "svp", "evp", "director", "head"].iter().any(|w| has_word(w)) {
        0.8
    } else if ["manager", "senior", "lead"].iter().any(|w| has_word(w)) {
        0.6
    } else if ["specialist", "analyst", "associate", "coordinator"]
        .iter()
        .any(|w| has_word(w))
    {
        0.3
    } else {
        0.4
    }
}

fn authority_level(candidate: &Candidate) -> f64 {
    if candidate.contacts.is_empty() {
        return 0.2;
    }
    let total: f64 = candidate
        .contacts
        .iter()
        .map(|c| title_authority(&c.title))
        .sum();
    total / candidate.contacts.len() as f64
}

// ---------------------------------------------------------------------------
// Rules 4 & 5: Need intensity and timing urgency
// ---------------------------------------------------------------------------

fn signals_mention(candidate: &Candidate, keywords: &[&str]) -> bool {
    candidate.recent_signals.iter().any(|signal| {
        let lower = signal.to_lowercase();
        keywords.iter().any(|k| lower.contains(k))
    })
}

fn need_intensity(candidate: &Candidate) -> f64 {
    let mut score: f64 = 0.5;
    if signals_mention(candidate, NEED_KEYWORDS) {
        score += 0.3;
    }
    if candidate.company_size > 200 {
        score += 0.2;
    }
    if candidate.technologies.len() > 5 {
        score += 0.1;
    }
    score.min(1.0)
}

fn timing_urgency(candidate: &Candidate) -> f64 {
    let mut score: f64 = 0.5;
    if candidate.company_size > 500 {
        score += 0.2;
    } else if candidate.company_size < 100 {
        score += 0.1;
    }
    if signals_mention(candidate, URGENCY_KEYWORDS) {
        score += 0.2;
    }
    score.min(1.0)
}

// ---------------------------------------------------------------------------
// Rule 6: Engagement potential
// ---------------------------------------------------------------------------

fn engagement_potential(candidate: &Candidate) -> f64 {
    let mut score: f64 = 0.5;

    if !candidate.social_profiles.is_empty() {
        score += 0.2;
        if candidate.social_profiles.len() > 2 {
            score += 0.1;
        }
    }

    let secure_site = Url::parse(candidate.website.trim())
        .map(|u| u.scheme() == "https")
        .unwrap_or(false);
    if secure_site {
        score += 0.1;
    }

    if candidate.description.chars().count() > 100 {
        score += 0.1;
    }

    score.min(1.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use leadgen_shared::{Contact, SizeRange};

    fn criteria() -> QualificationCriteria {
        QualificationCriteria::new(
            "technology",
            SizeRange::new(50, 500).unwrap(),
            50_000,
            ["United States".to_string(), "CA".to_string()],
        )
        .unwrap()
    }

    fn candidate() -> Candidate {
        Candidate {
            id: "acme".into(),
            company_name: "Acme".into(),
            industry: "Technology".into(),
            company_size: 120,
            revenue_range: Some("$10M-$25M".into()),
            location: "San Francisco, CA".into(),
            website: "https://acme.example".into(),
            description: String::new(),
            contacts: vec![],
            recent_signals: vec![],
            technologies: Default::default(),
            social_profiles: Default::default(),
        }
    }

    #[test]
    fn parse_closed_bracket() {
        let b = parse_revenue_range("$10M-$25M").unwrap();
        assert_eq!(b.lower, 10e6);
        assert_eq!(b.upper, Some(25e6));
    }

    #[test]
    fn parse_open_bracket() {
        let b = parse_revenue_range("$100M+").unwrap();
        assert_eq!(b.lower, 100e6);
        assert_eq!(b.upper, None);
    }

    #[test]
    fn parse_mixed_units() {
        let b = parse_revenue_range("$500K - $1.5M").unwrap();
        assert_eq!(b.lower, 500e3);
        assert_eq!(b.upper, Some(1.5e6));
    }

    #[test]
    fn parse_thousands_separators() {
        let b = parse_revenue_range("$1,000,000-$5,000,000").unwrap();
        assert_eq!(b.lower, 1e6);
        assert_eq!(b.upper, Some(5e6));

        let b = parse_revenue_range("$2,500,000+").unwrap();
        assert_eq!(b.lower, 2.5e6);
        assert_eq!(b.upper, None);
    }

    #[test]
    fn parse_unknown_revenue() {
        assert!(parse_revenue_range("undisclosed").is_none());
    }

    #[test]
    fn budget_ladder() {
        let c = criteria();
        let mut cand = candidate();
        for (raw, expected) in [
            ("$100M-$250M", 1.0),
            ("$50M-$100M", 1.0),
            ("$10M-$25M", 0.8),
            ("$5M-$10M", 0.6),
            ("$1M-$5M", 0.3),
            ("$500K-$1M", 0.1),
            ("private", 0.5),
        ] {
            cand.revenue_range = Some(raw.into());
            assert_eq!(budget_alignment(&cand, &c), expected, "bracket {raw}");
        }
        cand.revenue_range = None;
        assert_eq!(budget_alignment(&cand, &c), 0.5);
    }

    #[test]
    fn budget_below_minimum_is_floored() {
        let mut c = criteria();
        c.budget_minimum = 2_000_000;
        let mut cand = candidate();
        cand.revenue_range = Some("$500K-$1M".into());
        assert_eq!(budget_alignment(&cand, &c), 0.1);
    }

    #[test]
    fn title_ladder() {
        assert_eq!(title_authority("Chief Technology Officer"), 1.0);
        assert_eq!(title_authority("CEO & Co-Founder"), 1.0);
        assert_eq!(title_authority("Vice President, Sales"), 0.8);
        assert_eq!(title_authority("VP of Engineering"), 0.8);
        assert_eq!(title_authority("Director of Operations"), 0.8);
        assert_eq!(title_authority("Senior Engineer"), 0.6);
        assert_eq!(title_authority("Data Analyst"), 0.3);
        assert_eq!(title_authority("Receptionist"), 0.4);
    }

    #[test]
    fn authority_is_mean_of_contacts() {
        let mut cand = candidate();
        assert_eq!(authority_level(&cand), 0.2);
        cand.contacts = vec![
            Contact {
                name: "A".into(),
                title: "CEO".into(),
                email: None,
            },
            Contact {
                name: "B".into(),
                title: "Data Analyst".into(),
                email: None,
            },
        ];
        assert!((authority_level(&cand) - 0.65).abs() < 1e-9);
    }

    #[test]
    fn company_fit_partial_credit_for_small_company() {
        let mut cand = candidate();
        cand.company_size = 20;
        let fit = company_fit(&cand, &criteria());
        assert!((fit - (1.0 + 0.3 + 1.0) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn company_fit_without_geographic_focus() {
        let mut c = criteria();
        c.geographic_focus.clear();
        let mut cand = candidate();
        cand.location = "Berlin, Germany".into();
        assert_eq!(company_fit(&cand, &c), 1.0);
    }

    #[test]
    fn need_and_timing_from_signals() {
        let mut cand = candidate();
        cand.company_size = 650;
        cand.recent_signals = vec!["Acme announces urgent expansion into EMEA".into()];
        assert_eq!(need_intensity(&cand), 1.0);
        assert!((timing_urgency(&cand) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn engagement_requires_https_site() {
        let mut cand = candidate();
        assert!((engagement_potential(&cand) - 0.6).abs() < 1e-9);
        cand.website = "http://acme.example".into();
        assert_eq!(engagement_potential(&cand), 0.5);
        cand.social_profiles = [
            ("linkedin", "https://linkedin.com/company/acme"),
            ("twitter", "https://twitter.com/acme"),
            ("facebook", "https://facebook.com/acme"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert!((engagement_potential(&cand) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn all_components_in_unit_interval() {
        let scores = component_scores(&candidate(), &criteria());
        assert!(scores.is_valid());
    }
}
