//! Notification planning and delivery.
//!
//! Planning functions are pure over a task snapshot and a reference
//! instant, so every rule is testable without a clock or a screen.
//! Delivery goes through the `NotificationSink` seam and is
//! best-effort: a failing sink is logged and ignored.

use std::collections::HashSet;
use std::io::{self, Write};

use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::warn;

use crate::models::Task;
use crate::scoring;
use crate::streaks;

/// Deadline countdown scans look this far ahead.
pub const COUNTDOWN_WINDOW_MS: i64 = 2 * 60 * 60 * 1000;

/// Pre-deadline one-shots fire this long before the deadline.
pub const PRE_DEADLINE_LEAD_MS: i64 = 60 * 60 * 1000;

/// The gap-hour fallback only fires when a deadline is this close.
const URGENT_WINDOW_MS: i64 = 4 * 60 * 60 * 1000;

/// Presentation tier. How insistently the sink should surface the
/// notification is up to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Gentle,
    Active,
    Nagging,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Stable key; re-delivery under the same key replaces, and
    /// cancellation happens by key.
    pub key: String,
    pub title: String,
    pub body: String,
    pub urgency: Urgency,
}

pub fn countdown_key(task_id: i64) -> String {
    format!("countdown-{task_id}")
}

pub fn nag_key(task_id: i64) -> String {
    format!("nag-{task_id}")
}

pub fn deadline_key(task_id: i64) -> String {
    format!("deadline-{task_id}")
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub trait NotificationSink {
    fn deliver(&mut self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Prints notifications to stdout. Used by the reminder daemon and the
/// one-shot reminder pass.
pub struct TerminalSink;

impl NotificationSink for TerminalSink {
    fn deliver(&mut self, notification: &Notification) -> Result<(), NotifyError> {
        let tag = match notification.urgency {
            Urgency::Gentle => "reminder",
            Urgency::Active => "alert",
            Urgency::Nagging => "urgent",
        };
        let mut out = io::stdout().lock();
        writeln!(out, "[{tag}] {}", notification.title)?;
        writeln!(out, "        {}", notification.body)?;
        Ok(())
    }
}

/// Best-effort delivery: failures are logged and swallowed.
pub fn dispatch(sink: &mut dyn NotificationSink, notification: &Notification) {
    if let Err(err) = sink.deliver(notification) {
        warn!(key = %notification.key, "notification delivery failed: {err}");
    }
}

pub fn dispatch_all(sink: &mut dyn NotificationSink, notifications: &[Notification]) {
    for notification in notifications {
        dispatch(sink, notification);
    }
}

/// Preference inputs for the hourly smart pass.
#[derive(Debug, Clone, Copy)]
pub struct SmartContext {
    /// Local hour of day, 0..=23.
    pub hour: u32,
    pub nagging_enabled: bool,
    pub quiet_start_hour: u32,
    pub quiet_end_hour: u32,
}

/// Whether `hour` falls inside the quiet window. A window whose start
/// is later than its end wraps past midnight.
pub fn in_quiet_hours(hour: u32, start: u32, end: u32) -> bool {
    if start <= end {
        hour >= start && hour < end
    } else {
        hour >= start || hour < end
    }
}

/// Hourly contextual reminder. At most one notification per pass:
/// streak protection first, then a time-of-day message, then an
/// urgent-deadline fallback in the gap hours, otherwise nothing.
pub fn plan_smart(tasks: &[Task], now: i64, ctx: &SmartContext) -> Option<Notification> {
    if in_quiet_hours(ctx.hour, ctx.quiet_start_hour, ctx.quiet_end_hour) {
        return None;
    }
    let pending: Vec<&Task> = tasks.iter().filter(|t| !t.completed).collect();
    if pending.is_empty() {
        return None;
    }

    let today = streaks::epoch_day(now);
    let completed_today = tasks
        .iter()
        .filter(|t| t.completed)
        .filter(|t| t.completed_at.is_some_and(|at| streaks::epoch_day(at) == today))
        .count();
    let completion_days = streaks::day_set(
        tasks
            .iter()
            .filter(|t| t.completed)
            .filter_map(|t| t.completed_at),
    );
    let streak = streaks::current_streak(&completion_days, today);
    let quick_count = pending.iter().filter(|t| t.quick).count();
    let top_name = scoring::rank(tasks, now, &HashSet::new())
        .suggested
        .map(|t| t.name)
        .unwrap_or_else(|| "your most important task".to_string());

    let streak_at_risk =
        ctx.nagging_enabled && completed_today == 0 && streak >= 2 && ctx.hour >= 18;

    let (title, body, urgency) = if streak_at_risk {
        (
            "🔥 Your streak is in danger!".to_string(),
            streak_risk_body(streak),
            Urgency::Nagging,
        )
    } else if (8..=10).contains(&ctx.hour) {
        (
            "🌅 Your plan for today".to_string(),
            morning_body(&top_name, pending.len()),
            Urgency::Gentle,
        )
    } else if (12..=14).contains(&ctx.hour) {
        (
            "⚡ Perfect moment".to_string(),
            midday_body(&top_name, quick_count),
            Urgency::Gentle,
        )
    } else if (16..=18).contains(&ctx.hour) {
        (
            "📊 Today's progress".to_string(),
            afternoon_body(&top_name, completed_today, pending.len()),
            Urgency::Gentle,
        )
    } else if (20..=22).contains(&ctx.hour) {
        (
            "🌙 Evening wrap-up".to_string(),
            evening_body(completed_today, pending.len()),
            Urgency::Gentle,
        )
    } else {
        let urgent = pending
            .iter()
            .any(|t| t.deadline.is_some_and(|d| d - now < URGENT_WINDOW_MS));
        if !urgent {
            return None;
        }
        (
            "🎯 Urgent task".to_string(),
            format!("\"{top_name}\" needs your attention soon."),
            Urgency::Active,
        )
    };

    Some(Notification {
        key: "smart".to_string(),
        title,
        body,
        urgency,
    })
}

/// One alert per pending task whose deadline falls within the next two
/// hours, keyed per task so repeated scans replace instead of piling up.
pub fn plan_deadline_countdowns(tasks: &[Task], now: i64) -> Vec<Notification> {
    let cutoff = now + COUNTDOWN_WINDOW_MS;
    let mut out = Vec::new();
    for task in tasks {
        if task.completed {
            continue;
        }
        let (Some(id), Some(deadline)) = (task.id, task.deadline) else {
            continue;
        };
        if deadline < now || deadline > cutoff {
            continue;
        }
        let minutes_left = (deadline - now) / 60_000;
        let time_text = match minutes_left {
            m if m < 10 => "Less than 10 minutes left!".to_string(),
            m if m < 15 => "Less than 15 minutes left!".to_string(),
            m if m < 30 => format!("Only {m} minutes left!"),
            m if m < 60 => "Less than an hour left!".to_string(),
            _ => "Less than two hours left!".to_string(),
        };
        out.push(Notification {
            key: countdown_key(id),
            title: format!("⏰ Time is running out: {}", task.name),
            body: format!("{time_text} {}", pick(COUNTDOWN_SUBTEXT)),
            urgency: Urgency::Active,
        });
    }
    out
}

/// One nagging alert per overdue task nobody has started. Callers gate
/// this on the nagging preference.
pub fn plan_overdue_nags(tasks: &[Task], now: i64) -> Vec<Notification> {
    let mut out = Vec::new();
    for task in tasks {
        if task.completed || task.started {
            continue;
        }
        let (Some(id), Some(deadline)) = (task.id, task.deadline) else {
            continue;
        };
        if deadline >= now {
            continue;
        }
        out.push(Notification {
            key: nag_key(id),
            title: "⚠️ Action required!".to_string(),
            body: nag_body(&task.name),
            urgency: Urgency::Nagging,
        });
    }
    out
}

/// Periodic "start with this" reminder built on the current ranking.
pub fn plan_kickoff(tasks: &[Task], now: i64) -> Option<Notification> {
    let top = scoring::rank(tasks, now, &HashSet::new()).suggested?;
    Some(Notification {
        key: "kickoff".to_string(),
        title: "🎯 Time to act".to_string(),
        body: format!("Your next task: {}. Start with this one.", top.name),
        urgency: Urgency::Active,
    })
}

/// One-shot reminder an hour before a task's deadline. Returns the
/// instant it should fire at plus the notification, or None when the
/// task has no future deadline worth reminding about.
pub fn plan_pre_deadline(task: &Task, now: i64) -> Option<(i64, Notification)> {
    if task.completed {
        return None;
    }
    let id = task.id?;
    let deadline = task.deadline?;
    let fire_at = deadline - PRE_DEADLINE_LEAD_MS;
    if fire_at <= now {
        return None;
    }
    Some((
        fire_at,
        Notification {
            key: deadline_key(id),
            title: "🎯 Deadline approaching".to_string(),
            body: format!(
                "\"{}\" is due in about an hour. Start now to land it on time.",
                task.name
            ),
            urgency: Urgency::Active,
        },
    ))
}

const COUNTDOWN_SUBTEXT: &[&str] = &[
    "Start now and finish on time.",
    "Two minutes to start is all you need.",
    "Your future self will thank you.",
    "Don't lose your productivity streak.",
    "Small steps beat big plans.",
];

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

fn pick(pool: &[&str]) -> String {
    let mut rng = rand::thread_rng();
    pool.choose(&mut rng).copied().unwrap_or("").to_string()
}

fn pick_owned(options: &[String]) -> String {
    let mut rng = rand::thread_rng();
    options.choose(&mut rng).cloned().unwrap_or_default()
}

fn morning_body(top: &str, pending: usize) -> String {
    let options = [
        format!("Morning focus is at its peak. Start with: {top}"),
        format!("Eat the biggest frog first. Today's frog: {top}"),
        format!(
            "{pending} task{} waiting. The strongest opening move: {top}",
            plural(pending)
        ),
        format!("Willpower runs highest early in the day. Spend it on: {top}"),
    ];
    pick_owned(&options)
}

fn midday_body(top: &str, quick_count: usize) -> String {
    let options = [
        format!("The post-lunch dip is real. Keep momentum with something small: {top}"),
        if quick_count > 0 {
            format!(
                "{quick_count} quick task{} waiting. Knock one out now.",
                plural(quick_count)
            )
        } else {
            format!("Your next step: {top}")
        },
        format!("Two-minute rule: if it's short, do it now. Can you move \"{top}\" forward?"),
    ];
    pick_owned(&options)
}

fn afternoon_body(top: &str, completed_today: usize, pending: usize) -> String {
    let options = [
        format!("{completed_today} done today, {pending} to go. Next up: {top}"),
        format!("Second energy peak of the day. Use it on: {top}"),
        format!("Unfinished work keeps taking up headspace. Close something out: {top}"),
    ];
    pick_owned(&options)
}

fn evening_body(completed_today: usize, pending: usize) -> String {
    let options = [
        format!(
            "You completed {completed_today} task{} today. {pending} remain for tomorrow.",
            plural(completed_today)
        ),
        format!(
            "Five minutes of planning tonight saves thirty tomorrow. {pending} task{} waiting.",
            plural(pending)
        ),
        format!("Write tomorrow's plan down and sleep easy. Pending: {pending}"),
    ];
    pick_owned(&options)
}

fn streak_risk_body(streak: u32) -> String {
    let options = [
        format!("A {streak}-day streak ends tonight unless you complete one task. Just one."),
        format!("{streak} straight days. Don't let today become day zero."),
        format!("Your {streak}-day chain breaks at midnight. A single task keeps it alive."),
    ];
    pick_owned(&options)
}

fn nag_body(name: &str) -> String {
    let options = [
        format!("\"{name}\" is overdue and nobody has started it. Five minutes, right now."),
        format!("\"{name}\" slipped past its deadline. Starting is the whole battle."),
        format!("Still putting off \"{name}\"? It only grows heavier. Open it now."),
    ];
    pick_owned(&options)
}
