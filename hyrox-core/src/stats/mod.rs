//! Training statistics computed locally, without the LLM: summary metrics,
//! workout streaks, race split breakdowns, and duration parsing for the CLI.

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use crate::db::models::{HyroxRaceResult, WorkoutResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingSummary {
    pub total_workouts: usize,
    pub total_duration_seconds: i64,
    pub avg_rpe: f64,
    pub streak_days: u32,
}

impl TrainingSummary {
    pub fn build(results: &[WorkoutResult], today: NaiveDate) -> Self {
        let total_duration_seconds = results
            .iter()
            .filter_map(|r| r.total_duration_seconds)
            .map(i64::from)
            .sum();

        let rpe_values: Vec<i32> = results.iter().filter_map(|r| r.perceived_effort).collect();
        let avg_rpe = if rpe_values.is_empty() {
            0.0
        } else {
            rpe_values.iter().sum::<i32>() as f64 / rpe_values.len() as f64
        };

        let dates: BTreeSet<NaiveDate> = results.iter().map(|r| r.completed_at.date()).collect();
        let streak_days = calculate_streak(&dates.into_iter().collect::<Vec<_>>(), today);

        Self {
            total_workouts: results.len(),
            total_duration_seconds,
            avg_rpe,
            streak_days,
        }
    }
}

impl fmt::Display for TrainingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} workouts | {:.1} hrs | avg RPE {:.1}/10 | {} day streak",
            self.total_workouts,
            self.total_duration_seconds as f64 / 3600.0,
            self.avg_rpe,
            self.streak_days
        )
    }
}

/// Consecutive training days counted backwards from the most recent workout.
/// A streak is alive only if the last workout was today or yesterday.
/// `dates` must be sorted ascending and deduplicated.
pub fn calculate_streak(dates: &[NaiveDate], today: NaiveDate) -> u32 {
    let Some(&last) = dates.last() else {
        return 0;
    };
    let yesterday = today.pred_opt().unwrap_or(today);
    if last != today && last != yesterday {
        return 0;
    }

    let mut streak = 1;
    for pair in dates.windows(2).rev() {
        if (pair[1] - pair[0]).num_days() == 1 {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

/// The eight functional stations of a Hyrox race, in course order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Station {
    SkiErg,
    SledPush,
    SledPull,
    BurpeeBroadJump,
    Rowing,
    FarmersCarry,
    SandbagLunges,
    WallBalls,
}

impl Station {
    pub const ALL: [Station; 8] = [
        Station::SkiErg,
        Station::SledPush,
        Station::SledPull,
        Station::BurpeeBroadJump,
        Station::Rowing,
        Station::FarmersCarry,
        Station::SandbagLunges,
        Station::WallBalls,
    ];

    pub fn split(&self, race: &HyroxRaceResult) -> Option<i32> {
        match self {
            Station::SkiErg => race.skierg_time,
            Station::SledPush => race.sled_push_time,
            Station::SledPull => race.sled_pull_time,
            Station::BurpeeBroadJump => race.burpee_broad_jump_time,
            Station::Rowing => race.rowing_time,
            Station::FarmersCarry => race.farmers_carry_time,
            Station::SandbagLunges => race.sandbag_lunges_time,
            Station::WallBalls => race.wall_balls_time,
        }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Station::SkiErg => "SkiErg",
            Station::SledPush => "Sled Push",
            Station::SledPull => "Sled Pull",
            Station::BurpeeBroadJump => "Burpee Broad Jump",
            Station::Rowing => "Rowing",
            Station::FarmersCarry => "Farmers Carry",
            Station::SandbagLunges => "Sandbag Lunges",
            Station::WallBalls => "Wall Balls",
        };
        write!(f, "{}", name)
    }
}

/// Recorded splits in course order; stations without a time are skipped.
pub fn station_splits(race: &HyroxRaceResult) -> Vec<(Station, i32)> {
    Station::ALL
        .iter()
        .filter_map(|s| s.split(race).map(|t| (*s, t)))
        .collect()
}

pub fn fastest_station(race: &HyroxRaceResult) -> Option<(Station, i32)> {
    station_splits(race).into_iter().min_by_key(|(_, t)| *t)
}

pub fn slowest_station(race: &HyroxRaceResult) -> Option<(Station, i32)> {
    station_splits(race).into_iter().max_by_key(|(_, t)| *t)
}

pub fn format_duration(total_seconds: i32) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?::([0-5]?\d))?(?::([0-5]?\d))?$").expect("duration pattern compiles")
});

/// Accepts plain seconds ("225"), minutes:seconds ("3:45"), or
/// hours:minutes:seconds ("1:03:20").
pub fn parse_duration(input: &str) -> Result<i32> {
    let caps = DURATION_RE
        .captures(input.trim())
        .ok_or_else(|| anyhow!("cannot parse duration: {:?}", input))?;

    let first: i32 = caps[1].parse()?;
    let second: Option<i32> = caps.get(2).map(|m| m.as_str().parse()).transpose()?;
    let third: Option<i32> = caps.get(3).map(|m| m.as_str().parse()).transpose()?;

    Ok(match (second, third) {
        (None, _) => first,
        (Some(secs), None) => first * 60 + secs,
        (Some(mins), Some(secs)) => first * 3600 + mins * 60 + secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn streak_requires_recent_workout() {
        let today = date(2026, 8, 23);
        let dates = vec![date(2026, 8, 18), date(2026, 8, 19), date(2026, 8, 20)];
        assert_eq!(calculate_streak(&dates, today), 0);
    }

    #[test]
    fn streak_counts_consecutive_days() {
        let today = date(2026, 8, 23);
        let dates = vec![
            date(2026, 8, 18),
            date(2026, 8, 21),
            date(2026, 8, 22),
            date(2026, 8, 23),
        ];
        assert_eq!(calculate_streak(&dates, today), 3);
    }

    #[test]
    fn streak_survives_a_rest_day_today() {
        let today = date(2026, 8, 23);
        let dates = vec![date(2026, 8, 21), date(2026, 8, 22)];
        assert_eq!(calculate_streak(&dates, today), 2);
    }

    #[test]
    fn empty_log_has_no_streak() {
        assert_eq!(calculate_streak(&[], date(2026, 8, 23)), 0);
    }

    fn race() -> HyroxRaceResult {
        let ts = date(2026, 8, 1).and_hms_opt(10, 0, 0).unwrap();
        HyroxRaceResult {
            id: "race".into(),
            race_date: date(2026, 8, 1),
            race_location: Some("London Excel".into()),
            division: Some("open".into()),
            total_time_seconds: 4980,
            skierg_time: Some(260),
            sled_push_time: Some(210),
            sled_pull_time: Some(305),
            burpee_broad_jump_time: None,
            rowing_time: Some(275),
            farmers_carry_time: Some(120),
            sandbag_lunges_time: None,
            wall_balls_time: Some(330),
            run_1_time: Some(250),
            run_2_time: None,
            run_3_time: None,
            run_4_time: None,
            run_5_time: None,
            run_6_time: None,
            run_7_time: None,
            run_8_time: None,
            transitions_total_time: Some(240),
            notes: None,
            created_at: ts,
        }
    }

    #[test]
    fn splits_skip_missing_stations() {
        let splits = station_splits(&race());
        assert_eq!(splits.len(), 6);
        assert_eq!(splits[0], (Station::SkiErg, 260));
    }

    #[test]
    fn fastest_and_slowest_station() {
        let r = race();
        assert_eq!(fastest_station(&r), Some((Station::FarmersCarry, 120)));
        assert_eq!(slowest_station(&r), Some((Station::WallBalls, 330)));
    }

    #[test]
    fn duration_formats_and_parses() {
        assert_eq!(format_duration(225), "3:45");
        assert_eq!(parse_duration("3:45").unwrap(), 225);
        assert_eq!(parse_duration("225").unwrap(), 225);
        assert_eq!(parse_duration("1:03:20").unwrap(), 3800);
        assert!(parse_duration("3:75").is_err());
        assert!(parse_duration("abc").is_err());
    }

    #[test]
    fn summary_totals() {
        let ts = date(2026, 8, 22).and_hms_opt(7, 0, 0).unwrap();
        let result = WorkoutResult {
            id: "r".into(),
            workout_id: "w".into(),
            completed_at: ts,
            total_duration_seconds: Some(3600),
            perceived_effort: Some(7),
            heart_rate_avg: None,
            heart_rate_max: None,
            feeling: None,
            notes: None,
            created_at: ts,
        };
        let summary = TrainingSummary::build(&[result], date(2026, 8, 23));
        assert_eq!(summary.total_workouts, 1);
        assert_eq!(summary.total_duration_seconds, 3600);
        assert!((summary.avg_rpe - 7.0).abs() < f64::EPSILON);
        assert_eq!(summary.streak_days, 1);
    }
}
