//! Letter grading of a counter set.
//!
//! Points table (max 100):
//!
//! | Component          | Thresholds → points                     |
//! |--------------------|-----------------------------------------|
//! | qualification rate | ≥0.20 → 40, ≥0.15 → 30, ≥0.10 → 20, ≥0.05 → 10 |
//! | response rate      | ≥0.05 → 30, ≥0.03 → 20, ≥0.02 → 10      |
//! | prospect volume    | ≥50 → 30, ≥25 → 20, ≥10 → 10            |
//!
//! Grades: A ≥ 80, B ≥ 60, C ≥ 40, D ≥ 20, else F.

use leadgen_shared::{Counters, Grade};

/// Points earned by `counters` on the table above.
pub fn grade_points(counters: &Counters) -> u32 {
    let rates = counters.rates();

    let qualification = match rates.qualification_rate {
        r if r >= 0.20 => 40,
        r if r >= 0.15 => 30,
        r if r >= 0.10 => 20,
        r if r >= 0.05 => 10,
        _ => 0,
    };
    let response = match rates.response_rate {
        r if r >= 0.05 => 30,
        r if r >= 0.03 => 20,
        r if r >= 0.02 => 10,
        _ => 0,
    };
    let volume = match counters.prospects_researched {
        n if n >= 50 => 30,
        n if n >= 25 => 20,
        n if n >= 10 => 10,
        _ => 0,
    };

    qualification + response + volume
}

pub fn performance_grade(counters: &Counters) -> Grade {
    match grade_points(counters) {
        p if p >= 80 => Grade::A,
        p if p >= 60 => Grade::B,
        p if p >= 40 => Grade::C,
        p if p >= 20 => Grade::D,
        _ => Grade::F,
    }
}
