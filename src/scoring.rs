//! Task priority scoring, next-task selection and quick statistics.
//!
//! Scoring is pure arithmetic over a task snapshot and a reference
//! instant. Callers pass materialized collections; nothing here touches
//! the database or mutates shared state.

use std::collections::HashSet;

use crate::models::Task;
use crate::streaks;
use crate::utils;

/// Sentinel score for completed tasks. Strictly below the minimum
/// achievable open-task score (3.75: no deadline, easy, low priority,
/// not started, not quick).
pub const COMPLETED_SCORE: f64 = -1.0;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Urgency step function over hours remaining until the deadline.
/// Tasks without a deadline idle at 0.5; anything at or past its
/// deadline maxes out at 15.
pub fn urgency(task: &Task, now: i64) -> f64 {
    let Some(deadline) = task.deadline else {
        return 0.5;
    };
    let hours_remaining = (deadline - now) as f64 / MS_PER_HOUR;
    if hours_remaining <= 0.0 {
        15.0
    } else if hours_remaining <= 2.0 {
        12.0
    } else if hours_remaining <= 6.0 {
        10.0
    } else if hours_remaining <= 24.0 {
        8.0
    } else if hours_remaining <= 48.0 {
        6.0
    } else if hours_remaining <= 72.0 {
        4.0
    } else if hours_remaining <= 168.0 {
        2.0
    } else {
        1.0
    }
}

/// Weighted priority score of a task at a reference instant.
///
/// urgency * 2 + difficulty * 1.5 + priority * 2.5, plus a flat +3 for
/// started tasks and +5 for quick wins. The quick bonus stacks with the
/// other terms rather than overriding them.
pub fn score(task: &Task, now: i64) -> f64 {
    if task.completed {
        return COMPLETED_SCORE;
    }
    let mut total =
        urgency(task, now) * 2.0 + task.difficulty.weight() * 1.5 + task.priority.weight() * 2.5;
    if task.started {
        total += 3.0;
    }
    if task.quick {
        total += 5.0;
    }
    total
}

/// The single suggested task plus the rest of the open tasks in
/// descending score order.
#[derive(Debug, Clone, Default)]
pub struct Ranking {
    pub suggested: Option<Task>,
    pub remaining: Vec<Task>,
}

/// Rank the open tasks in a snapshot.
///
/// Ties break by creation instant then id, so the ordering is stable
/// across runs. The suggestion passes over ids in `skipped` (a
/// session-scoped set owned by the caller, never persisted), but
/// skipped tasks still appear in the remaining list.
pub fn rank(tasks: &[Task], now: i64, skipped: &HashSet<i64>) -> Ranking {
    let mut open: Vec<(f64, &Task)> = tasks
        .iter()
        .filter(|t| !t.completed)
        .map(|t| (score(t, now), t))
        .collect();
    open.sort_by(|(score_a, a), (score_b, b)| {
        score_b
            .total_cmp(score_a)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });

    let suggested_idx = open
        .iter()
        .position(|(_, t)| !t.id.is_some_and(|id| skipped.contains(&id)));
    let suggested = suggested_idx.map(|idx| open[idx].1.clone());
    let remaining = open
        .iter()
        .enumerate()
        .filter(|(idx, _)| Some(*idx) != suggested_idx)
        .map(|(_, (_, t))| (*t).clone())
        .collect();

    Ranking {
        suggested,
        remaining,
    }
}

/// Snapshot counters for the dashboard and reminder passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub pending: usize,
    pub overdue: usize,
    pub completed_today: usize,
    pub time_worked_today_ms: i64,
    pub completed_this_week: usize,
    pub completed_total: usize,
    pub total: usize,
}

impl TaskStats {
    pub fn has_overdue(&self) -> bool {
        self.overdue > 0
    }

    /// Completed share of every task ever created, 0.0 when empty.
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed_total as f64 / self.total as f64
        }
    }
}

/// Compute dashboard statistics over a full task snapshot.
/// "Today" is the local epoch-day of `now`; "this week" its local ISO
/// week.
pub fn quick_stats(tasks: &[Task], now: i64) -> TaskStats {
    let today = streaks::epoch_day(now);
    let this_week = streaks::iso_week(now);
    let mut stats = TaskStats {
        total: tasks.len(),
        ..TaskStats::default()
    };
    for task in tasks {
        if task.completed {
            stats.completed_total += 1;
            if let Some(done_at) = task.completed_at {
                if streaks::epoch_day(done_at) == today {
                    stats.completed_today += 1;
                    stats.time_worked_today_ms += task.time_worked_ms;
                }
                if streaks::iso_week(done_at) == this_week {
                    stats.completed_this_week += 1;
                }
            }
        } else {
            stats.pending += 1;
            if task.is_overdue(now) {
                stats.overdue += 1;
            }
        }
    }
    stats
}

/// Short human label for a deadline relative to `now`, for list output.
/// Same-day deadlines carry their time, except the 23:59 a date-only
/// deadline defaults to; further out the label buckets by calendar day.
pub fn deadline_label(deadline: i64, now: i64) -> String {
    if deadline <= now {
        return "overdue!".to_string();
    }
    let minutes = (deadline - now) / 60_000;
    if minutes < 60 {
        return format!("{} min", minutes.max(1));
    }
    let day_gap = streaks::epoch_day(deadline) - streaks::epoch_day(now);
    match day_gap {
        0 => match utils::format_time(deadline).as_str() {
            "23:59" => "today".to_string(),
            time => format!("today at {}", time),
        },
        1 => "tomorrow".to_string(),
        2..=3 => format!("in {} days", day_gap),
        4..=7 => "this week".to_string(),
        _ => utils::format_instant(deadline),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, Priority};

    const NOW: i64 = 1_736_942_400_000; // 2025-01-15 12:00:00 UTC
    const HOUR: i64 = 3_600_000;

    fn make_task(id: i64, name: &str) -> Task {
        let mut task = Task::new(name.to_string());
        task.id = Some(id);
        task.created_at = id * 1_000;
        task.last_modified = task.created_at;
        task
    }

    #[test]
    fn urgency_without_deadline_is_half() {
        let task = make_task(1, "someday");
        assert_eq!(urgency(&task, NOW), 0.5);
        assert_eq!(urgency(&task, NOW + 1_000 * HOUR), 0.5);
    }

    #[test]
    fn urgency_steps_follow_hours_remaining() {
        let cases = [
            (-1, 15.0),          // past deadline
            (0, 15.0),           // due right now
            (HOUR, 12.0),        // 1h left
            (2 * HOUR, 12.0),    // boundary is inclusive
            (3 * HOUR, 10.0),    // 3h
            (24 * HOUR, 8.0),    // one day
            (40 * HOUR, 6.0),    // two days
            (60 * HOUR, 4.0),    // three days
            (100 * HOUR, 2.0),   // one week
            (200 * HOUR, 1.0),   // far out
        ];
        for (offset, expected) in cases {
            let mut task = make_task(1, "t");
            task.deadline = Some(NOW + offset);
            assert_eq!(urgency(&task, NOW), expected, "offset {} ms", offset);
        }
    }

    #[test]
    fn started_bonus_is_exactly_three() {
        let base = make_task(1, "t");
        let mut started = base.clone();
        started.started = true;
        assert_eq!(score(&started, NOW) - score(&base, NOW), 3.0);
    }

    #[test]
    fn quick_bonus_is_exactly_five() {
        let base = make_task(1, "t");
        let mut quick = base.clone();
        quick.quick = true;
        assert_eq!(score(&quick, NOW) - score(&base, NOW), 5.0);
    }

    #[test]
    fn completed_sentinel_sorts_below_any_open_task() {
        let mut done = make_task(1, "done");
        done.completed = true;
        assert_eq!(score(&done, NOW), COMPLETED_SCORE);

        // Weakest possible open task: no deadline, easy, low priority,
        // untouched.
        let mut weakest = make_task(2, "weakest");
        weakest.difficulty = Difficulty::Easy;
        weakest.priority = Priority::Low;
        assert_eq!(score(&weakest, NOW), 3.75);
        assert!(score(&weakest, NOW) > COMPLETED_SCORE);
    }

    #[test]
    fn rank_suggests_the_highest_scorer() {
        let mut urgent = make_task(1, "urgent");
        urgent.deadline = Some(NOW + HOUR);
        let calm = make_task(2, "calm");
        let mut done = make_task(3, "done");
        done.completed = true;

        let ranking = rank(&[calm.clone(), urgent.clone(), done], NOW, &HashSet::new());
        assert_eq!(ranking.suggested.as_ref().and_then(|t| t.id), Some(1));
        assert_eq!(ranking.remaining.len(), 1);
        assert_eq!(ranking.remaining[0].id, Some(2));
    }

    #[test]
    fn skipped_ids_are_passed_over_but_stay_listed() {
        let mut urgent = make_task(1, "urgent");
        urgent.deadline = Some(NOW + HOUR);
        let calm = make_task(2, "calm");

        let skipped: HashSet<i64> = [1].into_iter().collect();
        let ranking = rank(&[urgent, calm], NOW, &skipped);
        assert_eq!(ranking.suggested.as_ref().and_then(|t| t.id), Some(2));
        // The skipped task is not suggested but still shows up ranked.
        assert_eq!(ranking.remaining.len(), 1);
        assert_eq!(ranking.remaining[0].id, Some(1));
    }

    #[test]
    fn everything_skipped_leaves_no_suggestion() {
        let a = make_task(1, "a");
        let b = make_task(2, "b");
        let skipped: HashSet<i64> = [1, 2].into_iter().collect();
        let ranking = rank(&[a, b], NOW, &skipped);
        assert!(ranking.suggested.is_none());
        assert_eq!(ranking.remaining.len(), 2);
    }

    #[test]
    fn completed_tasks_never_appear() {
        let mut done = make_task(1, "done");
        done.completed = true;
        let ranking = rank(&[done], NOW, &HashSet::new());
        assert!(ranking.suggested.is_none());
        assert!(ranking.remaining.is_empty());
    }

    #[test]
    fn ties_break_by_creation_then_id() {
        // Identical attributes, so identical scores.
        let mut older = make_task(5, "older");
        older.created_at = 1_000;
        let mut newer = make_task(3, "newer");
        newer.created_at = 2_000;

        let ranking = rank(&[newer.clone(), older.clone()], NOW, &HashSet::new());
        assert_eq!(ranking.suggested.as_ref().and_then(|t| t.id), Some(5));

        let mut twin_a = make_task(7, "twin");
        twin_a.created_at = 1_000;
        let mut twin_b = make_task(8, "twin");
        twin_b.created_at = 1_000;
        let ranking = rank(&[twin_b, twin_a], NOW, &HashSet::new());
        assert_eq!(ranking.suggested.as_ref().and_then(|t| t.id), Some(7));
    }

    #[test]
    fn quick_stats_count_the_snapshot() {
        let pending = make_task(1, "pending");

        let mut overdue = make_task(2, "late");
        overdue.deadline = Some(NOW - HOUR);

        let mut done_today = make_task(3, "today");
        done_today.completed = true;
        done_today.completed_at = Some(NOW);
        done_today.time_worked_ms = 30 * 60_000;

        let mut done_last_month = make_task(4, "old");
        done_last_month.completed = true;
        done_last_month.completed_at = Some(NOW - 30 * 24 * HOUR);
        done_last_month.time_worked_ms = 10 * 60_000;

        let stats = quick_stats(&[pending, overdue, done_today, done_last_month], NOW);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.overdue, 1);
        assert!(stats.has_overdue());
        assert_eq!(stats.completed_today, 1);
        assert_eq!(stats.time_worked_today_ms, 30 * 60_000);
        assert_eq!(stats.completed_this_week, 1);
        assert_eq!(stats.completed_total, 2);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completion_rate(), 0.5);
    }

    #[test]
    fn completion_rate_of_empty_snapshot_is_zero() {
        assert_eq!(quick_stats(&[], NOW).completion_rate(), 0.0);
    }

    /// Epoch ms of a local wall-clock moment, so the label tests hold
    /// in every time zone.
    fn local(day: u32, hour: u32, minute: u32) -> i64 {
        use chrono::TimeZone;
        chrono::Local
            .with_ymd_and_hms(2025, 1, day, hour, minute, 0)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn deadline_labels_bucket_by_calendar_distance() {
        let now = local(15, 10, 0);
        assert_eq!(deadline_label(now - 1, now), "overdue!");
        assert_eq!(deadline_label(now + 30 * 60_000, now), "30 min");
        assert_eq!(deadline_label(local(15, 17, 0), now), "today at 17:00");
        // A date-only deadline lands on 23:59 and drops the time.
        assert_eq!(deadline_label(local(15, 23, 59), now), "today");
        assert_eq!(deadline_label(local(16, 9, 0), now), "tomorrow");
        assert_eq!(deadline_label(local(17, 9, 0), now), "in 2 days");
        assert_eq!(deadline_label(local(20, 9, 0), now), "this week");
        // Far-out deadlines fall back to a full timestamp.
        assert!(deadline_label(local(31, 9, 0), now).starts_with("2025-01-31"));
    }
}
