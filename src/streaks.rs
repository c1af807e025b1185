//! Consecutive-day streaks and day-bucketed activity counts.
//!
//! Every day comparison in the crate goes through an epoch-day integer:
//! whole calendar days since 1970-01-01, taken after converting the
//! instant to the local calendar date. Composite encodings such as
//! year * 1000 + day-of-year break across year boundaries and are not
//! used anywhere.

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Number of days shown by the activity heat map (15 whole weeks).
pub const HEAT_WINDOW_DAYS: i64 = 105;

/// Epoch-day of an instant: whole days between 1970-01-01 and the
/// local calendar date the instant falls on.
pub fn epoch_day(ms: i64) -> i64 {
    let utc = DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    days_since_epoch(utc.with_timezone(&Local).date_naive())
}

fn days_since_epoch(date: NaiveDate) -> i64 {
    date.signed_duration_since(DateTime::<Utc>::UNIX_EPOCH.date_naive())
        .num_days()
}

/// Epoch-day of the current local date.
pub fn today() -> i64 {
    epoch_day(Utc::now().timestamp_millis())
}

/// Weekday of an epoch-day, as an index with 0 = Monday .. 6 = Sunday.
/// Day 0 (1970-01-01) was a Thursday.
pub fn weekday_index(day: i64) -> u8 {
    ((day + 3).rem_euclid(7)) as u8
}

/// Local ISO week (year, week number) of an instant. Used for the
/// completed-this-week statistic so week boundaries match the Monday
/// columns of the heat map.
pub fn iso_week(ms: i64) -> (i32, u32) {
    let utc = DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let week = utc.with_timezone(&Local).date_naive().iso_week();
    (week.year(), week.week())
}

/// Collect the distinct epoch-days of a set of completion instants.
pub fn day_set<I: IntoIterator<Item = i64>>(instants: I) -> BTreeSet<i64> {
    instants.into_iter().map(epoch_day).collect()
}

/// Current consecutive-day streak ending today or yesterday.
///
/// The walk anchors on today when today qualifies, otherwise on
/// yesterday (today is still winnable), otherwise the streak is 0.
pub fn current_streak(days: &BTreeSet<i64>, today: i64) -> u32 {
    if days.is_empty() {
        return 0;
    }
    let start = if days.contains(&today) {
        today
    } else if days.contains(&(today - 1)) {
        today - 1
    } else {
        return 0;
    };

    let mut streak = 0;
    let mut day = start;
    while days.contains(&day) {
        streak += 1;
        day -= 1;
    }
    streak
}

/// Longest consecutive run anywhere in the history.
pub fn best_streak(days: &BTreeSet<i64>) -> u32 {
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<i64> = None;
    for &day in days {
        run = match prev {
            Some(p) if day - p == 1 => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(day);
    }
    best
}

/// Whether `day` already has a qualifying completion.
pub fn completed_on(days: &BTreeSet<i64>, day: i64) -> bool {
    days.contains(&day)
}

/// Count completions per epoch-day for heat-map rendering.
pub fn activity_counts<I: IntoIterator<Item = i64>>(days: I) -> BTreeMap<i64, u32> {
    let mut counts = BTreeMap::new();
    for day in days {
        *counts.entry(day).or_insert(0) += 1;
    }
    counts
}

/// Heat-map intensity bucket for a per-day completion count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLevel {
    None,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ActivityLevel {
    pub fn for_count(count: u32) -> Self {
        match count {
            0 => ActivityLevel::None,
            1 => ActivityLevel::Low,
            2 => ActivityLevel::Medium,
            3..=4 => ActivityLevel::High,
            _ => ActivityLevel::VeryHigh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days(values: &[i64]) -> BTreeSet<i64> {
        values.iter().copied().collect()
    }

    #[test]
    fn streak_counts_back_from_today() {
        let set = days(&[100, 101, 102]);
        assert_eq!(current_streak(&set, 102), 3);
    }

    #[test]
    fn streak_anchors_on_yesterday_when_today_is_open() {
        // Today (103) has no completion yet, but 102 does, so the run
        // is still alive.
        let set = days(&[100, 101, 102]);
        assert_eq!(current_streak(&set, 103), 3);
    }

    #[test]
    fn streak_dies_after_a_full_missed_day() {
        let set = days(&[100, 101, 102]);
        assert_eq!(current_streak(&set, 104), 0);
    }

    #[test]
    fn streak_of_empty_history_is_zero() {
        assert_eq!(current_streak(&BTreeSet::new(), 100), 0);
    }

    #[test]
    fn streak_ignores_runs_before_a_gap() {
        let set = days(&[90, 91, 100, 101, 102]);
        assert_eq!(current_streak(&set, 102), 3);
    }

    #[test]
    fn streak_is_pure() {
        let set = days(&[100, 101, 102]);
        assert_eq!(current_streak(&set, 102), current_streak(&set, 102));
    }

    #[test]
    fn best_streak_finds_the_longest_run() {
        let set = days(&[1, 2, 3, 5, 6, 7, 8]);
        assert_eq!(best_streak(&set), 4);
        // From day 9 the run is still alive through yesterday; one full
        // missed day later it is dead, but the best run remains.
        assert_eq!(current_streak(&set, 9), 4);
        assert_eq!(current_streak(&set, 10), 0);
        assert_eq!(best_streak(&set), 4);
    }

    #[test]
    fn best_streak_of_single_day_is_one() {
        assert_eq!(best_streak(&days(&[42])), 1);
        assert_eq!(best_streak(&BTreeSet::new()), 0);
    }

    #[test]
    fn completed_on_is_membership() {
        let set = days(&[100]);
        assert!(completed_on(&set, 100));
        assert!(!completed_on(&set, 101));
    }

    #[test]
    fn activity_counts_group_by_day() {
        let counts = activity_counts([100, 100, 100, 101]);
        assert_eq!(counts.get(&100), Some(&3));
        assert_eq!(counts.get(&101), Some(&1));
        assert_eq!(counts.get(&102), None);
    }

    #[test]
    fn activity_levels_bucket_counts() {
        assert_eq!(ActivityLevel::for_count(0), ActivityLevel::None);
        assert_eq!(ActivityLevel::for_count(1), ActivityLevel::Low);
        assert_eq!(ActivityLevel::for_count(2), ActivityLevel::Medium);
        assert_eq!(ActivityLevel::for_count(3), ActivityLevel::High);
        assert_eq!(ActivityLevel::for_count(4), ActivityLevel::High);
        assert_eq!(ActivityLevel::for_count(5), ActivityLevel::VeryHigh);
        assert_eq!(ActivityLevel::for_count(12), ActivityLevel::VeryHigh);
    }

    #[test]
    fn weekday_index_is_monday_based() {
        // 1970-01-01 was a Thursday, 1970-01-05 a Monday.
        assert_eq!(weekday_index(0), 3);
        assert_eq!(weekday_index(4), 0);
        assert_eq!(weekday_index(10), 6);
        assert_eq!(weekday_index(-4), 6); // 1969-12-28, a Sunday
    }

    #[test]
    fn same_instant_maps_to_one_day() {
        let ms = 1_736_935_200_000; // 2025-01-15 10:00:00 UTC
        assert_eq!(epoch_day(ms), epoch_day(ms));
        let set = day_set([ms, ms, ms]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn consecutive_utc_noons_map_to_consecutive_days() {
        // Mid-January noons sit far from any DST transition, so they
        // land on adjacent local days in every time zone.
        let noon = 1_736_942_400_000; // 2025-01-15 12:00:00 UTC
        let day = epoch_day(noon);
        assert_eq!(epoch_day(noon - 86_400_000), day - 1);
        assert_eq!(epoch_day(noon + 86_400_000), day + 1);
    }
}
