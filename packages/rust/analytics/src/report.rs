//! Daily reports and weekly/monthly period summaries.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use leadgen_shared::{Counters, Grade, LeadGenError, Rates, ratio};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub day: NaiveDate,
    pub counters: Counters,
    pub rates: Rates,
    pub change_from_previous_day: DayChange,
    pub grade: Grade,
    pub insights: Vec<String>,
}

/// Difference between a day and the calendar day before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DayChange {
    pub prospects: i64,
    pub qualification_rate: f64,
    pub emails_sent: i64,
}

impl DayChange {
    pub(crate) fn between(today: &Counters, yesterday: &Counters) -> Self {
        Self {
            prospects: today.prospects_researched as i64 - yesterday.prospects_researched as i64,
            qualification_rate: today.rates().qualification_rate
                - yesterday.rates().qualification_rate,
            emails_sent: today.emails_sent as i64 - yesterday.emails_sent as i64,
        }
    }
}

pub(crate) fn daily_insights(counters: &Counters) -> Vec<String> {
    let rates = counters.rates();
    let mut insights = Vec::new();

    if rates.qualification_rate > 0.2 {
        insights.push("Excellent qualification rate - continue current strategy".to_string());
    } else if counters.prospects_researched > 0 && rates.qualification_rate < 0.1 {
        insights.push("Low qualification rate - review lead scoring criteria".to_string());
    }

    if rates.response_rate > 0.05 {
        insights.push("Strong email response rate - templates are effective".to_string());
    } else if counters.emails_sent > 0 && rates.response_rate < 0.02 {
        insights.push("Low response rate - consider A/B testing email templates".to_string());
    }

    if counters.prospects_researched > 30 {
        insights.push("High prospect volume - monitor for quality dilution".to_string());
    }

    insights
}

// ---------------------------------------------------------------------------
// Period summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// The seven days ending on the reference day.
    Weekly,
    /// From the first of the reference day's month up to the reference day.
    Monthly,
}

impl Period {
    /// Inclusive date range ending on `day`.
    pub fn range_ending(&self, day: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = match self {
            Self::Weekly => day.checked_sub_days(Days::new(6)).unwrap_or(day),
            Self::Monthly => day.with_day(1).unwrap_or(day),
        };
        (start, day)
    }
}

impl std::str::FromStr for Period {
    type Err = LeadGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(LeadGenError::validation(format!(
                "unknown report period '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub period: Period,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub totals: Counters,
    pub qualification_rate: f64,
    /// Mean prospects over days that have data.
    pub average_daily_prospects: f64,
    pub days: Vec<DayBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBreakdown {
    pub day: NaiveDate,
    pub prospects: u64,
    pub qualified: u64,
    pub qualification_rate: f64,
}

pub(crate) fn summarize<'a>(
    period: Period,
    start: NaiveDate,
    end: NaiveDate,
    days: impl Iterator<Item = (NaiveDate, &'a Counters)>,
) -> PeriodSummary {
    let mut totals = Counters::default();
    let mut breakdown = Vec::new();

    for (day, counters) in days {
        totals.add(counters);
        breakdown.push(DayBreakdown {
            day,
            prospects: counters.prospects_researched,
            qualified: counters.leads_qualified,
            qualification_rate: counters.rates().qualification_rate,
        });
    }

    PeriodSummary {
        period,
        start,
        end,
        qualification_rate: ratio(totals.leads_qualified, totals.prospects_researched),
        average_daily_prospects: ratio(totals.prospects_researched, breakdown.len() as u64),
        totals,
        days: breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekly_range_is_seven_days() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let (start, end) = Period::Weekly.range_ending(day);
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
        assert_eq!(end, day);
    }

    #[test]
    fn monthly_range_starts_on_the_first() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let (start, _) = Period::Monthly.range_ending(day);
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }

    #[test]
    fn period_parse() {
        assert_eq!("weekly".parse::<Period>().unwrap(), Period::Weekly);
        assert!("yearly".parse::<Period>().is_err());
    }

    #[test]
    fn change_can_be_negative() {
        let today = Counters {
            prospects_researched: 5,
            ..Counters::default()
        };
        let yesterday = Counters {
            prospects_researched: 12,
            emails_sent: 3,
            ..Counters::default()
        };
        let change = DayChange::between(&today, &yesterday);
        assert_eq!(change.prospects, -7);
        assert_eq!(change.emails_sent, -3);
    }

    #[test]
    fn quiet_day_has_no_low_rate_insights() {
        assert!(daily_insights(&Counters::default()).is_empty());
    }
}
