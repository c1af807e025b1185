//! Focus session timer: IDLE -> RUNNING -> {COMPLETED, STOPPED}.
//!
//! The state machine is pure over instants; `run` drives it with a
//! fixed tick and a cooperative stop flag so Ctrl-C handling stays
//! outside this module.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::utils;

/// Default focus session length in minutes.
pub const DEFAULT_SESSION_MINUTES: u32 = 25;
/// Session lengths are clamped to this range.
pub const SESSION_MINUTES_RANGE: (u32, u32) = (5, 90);
/// Partial sessions shorter than this earn no work credit.
pub const DEFAULT_MIN_CREDIT_MS: i64 = 60_000;
/// Interval between ticks.
pub const TICK: Duration = Duration::from_secs(1);

/// A focus session bound to one task.
#[derive(Debug, Clone)]
pub struct FocusSession {
    pub task_id: i64,
    pub task_name: String,
    pub started_at: i64,
    pub total_ms: i64,
}

impl FocusSession {
    pub fn new(task_id: i64, task_name: String, started_at: i64, minutes: u32) -> Self {
        let minutes = minutes.clamp(SESSION_MINUTES_RANGE.0, SESSION_MINUTES_RANGE.1);
        Self {
            task_id,
            task_name,
            started_at,
            total_ms: i64::from(minutes) * 60_000,
        }
    }

    /// Advance the machine to `now`: still running, or completed once
    /// the full duration has elapsed.
    pub fn tick(&self, now: i64) -> TimerState {
        let remaining = self.total_ms - (now - self.started_at);
        if remaining <= 0 {
            TimerState::Completed {
                total_ms: self.total_ms,
            }
        } else {
            TimerState::Running(Snapshot {
                remaining_ms: remaining,
                total_ms: self.total_ms,
            })
        }
    }

    /// Stop early at `now`. Pure, so stopping an already-stopped
    /// session yields the same terminal state again.
    pub fn stop(&self, now: i64) -> TimerState {
        TimerState::Stopped {
            elapsed_ms: self.elapsed_at(now),
        }
    }

    /// Elapsed time at `now`, clamped to the session bounds.
    pub fn elapsed_at(&self, now: i64) -> i64 {
        (now - self.started_at).clamp(0, self.total_ms)
    }
}

/// Observable timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running(Snapshot),
    Completed { total_ms: i64 },
    Stopped { elapsed_ms: i64 },
}

/// Point-in-time view of a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub remaining_ms: i64,
    pub total_ms: i64,
}

impl Snapshot {
    pub fn minutes(self) -> i64 {
        self.remaining_ms / 60_000
    }

    pub fn seconds(self) -> i64 {
        (self.remaining_ms / 1_000) % 60
    }

    /// Remaining time as "MM:SS".
    pub fn formatted(self) -> String {
        format!("{:02}:{:02}", self.minutes(), self.seconds())
    }

    /// Completed fraction in 0.0..=1.0.
    pub fn progress(self) -> f64 {
        if self.total_ms <= 0 {
            return 1.0;
        }
        1.0 - self.remaining_ms as f64 / self.total_ms as f64
    }
}

/// Work credit earned by a terminal state. Completion credits the full
/// session; an early stop credits elapsed time only once it reaches
/// `min_credit_ms`.
pub fn credit_for(state: &TimerState, min_credit_ms: i64) -> Option<i64> {
    match state {
        TimerState::Completed { total_ms } => Some(*total_ms),
        TimerState::Stopped { elapsed_ms } if *elapsed_ms >= min_credit_ms => Some(*elapsed_ms),
        _ => None,
    }
}

/// How a driven session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Completed { credited_ms: i64 },
    Stopped { elapsed_ms: i64, credited_ms: Option<i64> },
}

/// Drive a session to a terminal state, emitting every state change to
/// `observe`. The stop flag is checked each tick; setting it after the
/// session already ended has no effect.
pub fn run(
    session: &FocusSession,
    stop: &AtomicBool,
    min_credit_ms: i64,
    tick: Duration,
    mut observe: impl FnMut(&TimerState),
) -> SessionEnd {
    loop {
        if stop.load(Ordering::SeqCst) {
            let elapsed_ms = session.elapsed_at(utils::now_ms());
            let state = TimerState::Stopped { elapsed_ms };
            observe(&state);
            return SessionEnd::Stopped {
                elapsed_ms,
                credited_ms: credit_for(&state, min_credit_ms),
            };
        }

        let state = session.tick(utils::now_ms());
        observe(&state);
        if let TimerState::Completed { total_ms } = state {
            return SessionEnd::Completed {
                credited_ms: total_ms,
            };
        }
        thread::sleep(tick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(total_ms: i64) -> FocusSession {
        FocusSession {
            task_id: 1,
            task_name: "deep work".to_string(),
            started_at: 0,
            total_ms,
        }
    }

    #[test]
    fn session_length_is_clamped() {
        assert_eq!(FocusSession::new(1, "t".into(), 0, 25).total_ms, 25 * 60_000);
        assert_eq!(FocusSession::new(1, "t".into(), 0, 1).total_ms, 5 * 60_000);
        assert_eq!(FocusSession::new(1, "t".into(), 0, 300).total_ms, 90 * 60_000);
    }

    #[test]
    fn tick_counts_down_then_completes() {
        let s = session(10_000);
        assert_eq!(
            s.tick(4_000),
            TimerState::Running(Snapshot {
                remaining_ms: 6_000,
                total_ms: 10_000
            })
        );
        assert_eq!(s.tick(10_000), TimerState::Completed { total_ms: 10_000 });
        assert_eq!(s.tick(99_000), TimerState::Completed { total_ms: 10_000 });
    }

    #[test]
    fn stop_reports_clamped_elapsed_time() {
        let s = session(10_000);
        assert_eq!(s.stop(4_000), TimerState::Stopped { elapsed_ms: 4_000 });
        // Stopping twice at the same instant is the same no-op result.
        assert_eq!(s.stop(4_000), TimerState::Stopped { elapsed_ms: 4_000 });
        assert_eq!(s.stop(99_000), TimerState::Stopped { elapsed_ms: 10_000 });
        assert_eq!(s.stop(-5), TimerState::Stopped { elapsed_ms: 0 });
    }

    #[test]
    fn credit_rules() {
        let full = TimerState::Completed { total_ms: 25 * 60_000 };
        assert_eq!(credit_for(&full, DEFAULT_MIN_CREDIT_MS), Some(25 * 60_000));

        let short = TimerState::Stopped { elapsed_ms: 30_000 };
        assert_eq!(credit_for(&short, DEFAULT_MIN_CREDIT_MS), None);

        let at_threshold = TimerState::Stopped { elapsed_ms: 60_000 };
        assert_eq!(credit_for(&at_threshold, DEFAULT_MIN_CREDIT_MS), Some(60_000));

        let long = TimerState::Stopped { elapsed_ms: 600_000 };
        assert_eq!(credit_for(&long, DEFAULT_MIN_CREDIT_MS), Some(600_000));

        assert_eq!(credit_for(&TimerState::Idle, DEFAULT_MIN_CREDIT_MS), None);
    }

    #[test]
    fn snapshot_formats_remaining_time() {
        let snap = Snapshot {
            remaining_ms: 24 * 60_000 + 59_000,
            total_ms: 25 * 60_000,
        };
        assert_eq!(snap.minutes(), 24);
        assert_eq!(snap.seconds(), 59);
        assert_eq!(snap.formatted(), "24:59");

        let done = Snapshot {
            remaining_ms: 0,
            total_ms: 25 * 60_000,
        };
        assert_eq!(done.formatted(), "00:00");
        assert_eq!(done.progress(), 1.0);
    }

    #[test]
    fn progress_moves_from_zero_to_one() {
        let snap = Snapshot {
            remaining_ms: 15_000,
            total_ms: 60_000,
        };
        assert!((snap.progress() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn run_completes_a_short_session() {
        let s = FocusSession {
            task_id: 1,
            task_name: "t".to_string(),
            started_at: utils::now_ms(),
            total_ms: 40,
        };
        let stop = AtomicBool::new(false);
        let mut states = 0;
        let end = run(&s, &stop, DEFAULT_MIN_CREDIT_MS, Duration::from_millis(5), |_| {
            states += 1;
        });
        assert_eq!(end, SessionEnd::Completed { credited_ms: 40 });
        assert!(states >= 1);
    }

    #[test]
    fn run_honors_the_stop_flag() {
        let s = FocusSession {
            task_id: 1,
            task_name: "t".to_string(),
            started_at: utils::now_ms(),
            total_ms: 60_000,
        };
        let stop = AtomicBool::new(true);
        let end = run(&s, &stop, DEFAULT_MIN_CREDIT_MS, Duration::from_millis(5), |_| {});
        match end {
            SessionEnd::Stopped {
                elapsed_ms,
                credited_ms,
            } => {
                assert!(elapsed_ms < 60_000);
                assert_eq!(credited_ms, None);
            }
            other => panic!("expected stopped, got {:?}", other),
        }
    }
}
