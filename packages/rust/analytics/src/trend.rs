//! Trailing-window trend prediction over daily prospect counts.

use serde::{Deserialize, Serialize};

use leadgen_shared::{DailyBucket, Rates};

/// Slope (prospects per day) beyond which a trend counts as up or down.
const SLOPE_THRESHOLD: f64 = 2.0;

/// Minimum number of data points for a regression.
const MIN_POINTS: usize = 3;

const CONFIDENT: f64 = 0.75;
const TENTATIVE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Stable,
    Down,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Stable => "stable",
            Self::Down => "down",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPrediction {
    pub direction: TrendDirection,
    /// Least-squares slope in prospects per day (0 with fewer than 3 points).
    pub slope: f64,
    /// Mean daily prospects over the window.
    pub mean_prospects: f64,
    pub next_day_prospects: u64,
    pub confidence: f64,
    pub data_points: usize,
    pub recommended_actions: Vec<String>,
    pub risk_factors: Vec<String>,
}

/// Predict from the last `window` buckets (sorted by day ascending).
///
/// `rates` are the cumulative campaign rates; `emails_sent` gates the
/// response-rate risk so campaigns without outreach are not flagged.
pub(crate) fn predict(
    buckets: &[DailyBucket],
    window: usize,
    rates: Rates,
    prospects_researched: u64,
    emails_sent: u64,
) -> TrendPrediction {
    let start = buckets.len().saturating_sub(window.max(1));
    let recent = &buckets[start..];

    if recent.is_empty() {
        return TrendPrediction {
            direction: TrendDirection::Stable,
            slope: 0.0,
            mean_prospects: 0.0,
            next_day_prospects: 0,
            confidence: TENTATIVE,
            data_points: 0,
            recommended_actions: vec!["Continue current strategy".into()],
            risk_factors: vec!["Insufficient historical data".into()],
        };
    }

    let first_day = recent[0].day;
    let points: Vec<(f64, f64)> = recent
        .iter()
        .map(|b| {
            let x = (b.day - first_day).num_days() as f64;
            (x, b.counters.prospects_researched as f64)
        })
        .collect();
    let mean = points.iter().map(|(_, y)| y).sum::<f64>() / points.len() as f64;

    let (slope, confidence) = if points.len() >= MIN_POINTS {
        (linear_slope(&points), CONFIDENT)
    } else {
        (0.0, TENTATIVE)
    };

    let direction = if slope > SLOPE_THRESHOLD {
        TrendDirection::Up
    } else if slope < -SLOPE_THRESHOLD {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };

    let mut actions = Vec::new();
    let mut risks = Vec::new();

    match direction {
        TrendDirection::Up => {
            actions.push("Increase daily prospect targets".to_string());
            actions.push("Scale email sequences".to_string());
        }
        TrendDirection::Down => {
            actions.push("Review qualification criteria".to_string());
            actions.push("Optimize prospect sources".to_string());
            risks.push("Declining prospect volume".to_string());
        }
        TrendDirection::Stable => {}
    }

    if prospects_researched > 0 && rates.qualification_rate < 0.10 {
        risks.push("Low qualification rate".to_string());
        actions.push("Refine lead scoring algorithm".to_string());
    }
    if emails_sent > 0 && rates.response_rate < 0.03 {
        risks.push("Low email response rate".to_string());
        actions.push("Review email templates and timing".to_string());
    }
    if points.len() < MIN_POINTS {
        risks.push("Insufficient historical data".to_string());
    }

    TrendPrediction {
        direction,
        slope,
        mean_prospects: mean,
        next_day_prospects: mean.round() as u64,
        confidence,
        data_points: points.len(),
        recommended_actions: actions,
        risk_factors: risks,
    }
}

/// Ordinary least-squares slope. Returns 0 when all x are equal.
fn linear_slope(points: &[(f64, f64)]) -> f64 {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (num, den) = points.iter().fold((0.0, 0.0), |(num, den), (x, y)| {
        let dx = x - mean_x;
        (num + dx * (y - mean_y), den + dx * dx)
    });

    if den == 0.0 { 0.0 } else { num / den }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use leadgen_shared::Counters;

    fn series(values: &[u64]) -> Vec<DailyBucket> {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| DailyBucket {
                day: start + chrono::Days::new(i as u64),
                counters: Counters {
                    prospects_researched: *v,
                    ..Counters::default()
                },
            })
            .collect()
    }

    fn healthy_rates() -> Rates {
        Rates {
            qualification_rate: 0.3,
            response_rate: 0.1,
            conversion_rate: 0.2,
        }
    }

    #[test]
    fn slope_of_a_line() {
        let pts = [(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)];
        assert!((linear_slope(&pts) - 2.0).abs() < 1e-12);
        assert_eq!(linear_slope(&[(1.0, 4.0), (1.0, 9.0)]), 0.0);
    }

    #[test]
    fn rising_volume_is_up() {
        let p = predict(&series(&[10, 15, 20, 25]), 7, healthy_rates(), 70, 10);
        assert_eq!(p.direction, TrendDirection::Up);
        assert_eq!(p.confidence, 0.75);
        assert_eq!(p.next_day_prospects, 18);
        assert!(p.risk_factors.is_empty());
    }

    #[test]
    fn falling_volume_is_down() {
        let p = predict(&series(&[30, 24, 18, 12]), 7, healthy_rates(), 84, 10);
        assert_eq!(p.direction, TrendDirection::Down);
        assert!(p.risk_factors.iter().any(|r| r.contains("Declining")));
    }

    #[test]
    fn gentle_slope_is_stable() {
        let p = predict(&series(&[20, 21, 22, 23]), 7, healthy_rates(), 86, 10);
        assert_eq!(p.direction, TrendDirection::Stable);
    }

    #[test]
    fn fewer_than_three_points_is_stable_and_tentative() {
        let p = predict(&series(&[5, 50]), 7, healthy_rates(), 55, 10);
        assert_eq!(p.direction, TrendDirection::Stable);
        assert_eq!(p.confidence, 0.5);
        assert_eq!(p.data_points, 2);
    }

    #[test]
    fn empty_history_does_not_fail() {
        let p = predict(&[], 7, Rates::default(), 0, 0);
        assert_eq!(p.direction, TrendDirection::Stable);
        assert_eq!(p.next_day_prospects, 0);
        assert_eq!(p.risk_factors, vec!["Insufficient historical data"]);
    }

    #[test]
    fn window_keeps_only_trailing_days() {
        // Early growth, then flat for the last three days.
        let p = predict(&series(&[1, 10, 40, 40, 40, 40]), 3, healthy_rates(), 171, 10);
        assert_eq!(p.data_points, 3);
        assert_eq!(p.direction, TrendDirection::Stable);
        assert_eq!(p.mean_prospects, 40.0);
    }

    #[test]
    fn response_risk_only_with_emails() {
        let rates = Rates {
            qualification_rate: 0.3,
            response_rate: 0.0,
            conversion_rate: 0.0,
        };
        let quiet = predict(&series(&[10, 10, 10]), 7, rates, 30, 0);
        assert!(quiet.risk_factors.is_empty());
        let sent = predict(&series(&[10, 10, 10]), 7, rates, 30, 40);
        assert!(sent.risk_factors.iter().any(|r| r.contains("response")));
    }
}
