//! Contextual motivational phrases, grouped by mood and picked at
//! random within a pool.

use rand::seq::SliceRandom;

use crate::models::{Difficulty, Task};

/// Focus sessions. Calm, present tense, no fireworks.
const FOCUS_MODE: &[&str] = &[
    "You're doing great work. Stay with it.",
    "One step at a time. This moment is all that matters.",
    "Your brain is building momentum. Don't stop now.",
    "Discipline is choosing between what you want now and what you want most.",
    "Every focused minute is a win against procrastination.",
    "You don't need motivation. You're already here, and that's enough.",
    "Flow starts when you stop resisting. Let go.",
    "Think about how it will feel to finish this.",
    "The hardest part is over: you started.",
    "Your future self is thanking you for this.",
    "Breathe. Focus. Move forward.",
    "You don't have to be perfect, just consistent.",
];

/// The suggested task is rated hard. Eat-that-frog energy.
const HARD_TASK: &[&str] = &[
    "💪 Hard tasks first. That's how it gets done.",
    "🐸 Eat that frog. Everything after will feel easy.",
    "⚡ Your brain wants to dodge this one. Show it who's in charge.",
    "🏋️ Hard today is easy tomorrow. Train your discipline.",
    "🔥 If it were easy you'd have done it already. Do it anyway.",
];

/// Overdue work exists. Urgency without guilt.
const OVERDUE: &[&str] = &[
    "⏰ You have overdue tasks. Five minutes is all it takes to start.",
    "📍 Don't blame yourself for the past. Act now.",
    "🎯 The best time to start was earlier. The second best is now.",
    "⚠️ Every postponed minute feeds the anxiety. Break the cycle.",
    "💡 You don't have to finish it. You just have to start it.",
];

/// The suggested task is flagged quick.
const QUICK_TASK: &[&str] = &[
    "⚡ Under two minutes! Do it NOW and get it off your plate.",
    "🏃 Quick task spotted. Why put it off?",
    "✨ If it takes less than two minutes, do it now.",
    "🎯 Two minutes. No excuses, no planning. Just act.",
];

/// Nothing pending. Earned rest.
const NO_TASKS: &[&str] = &[
    "🎉 Inbox zero! Enjoy the moment.",
    "✅ All caught up. Your past self did great work.",
    "🧘 Nothing pending. Breathe and recharge.",
    "🌟 Perfect moment to plan something new.",
];

fn pick(pool: &[&str]) -> String {
    let mut rng = rand::thread_rng();
    pool.choose(&mut rng).copied().unwrap_or("Keep going.").to_string()
}

/// Streak phrases take the day count so the number lands in the text.
pub fn streak_phrase(days: u32) -> String {
    let options = [
        format!("🔥 {days} days in a row. Don't break the chain!"),
        format!("⚡ A {days}-day streak. Your past self would be impressed."),
        format!("🏆 {days} days of discipline. That's character, not luck."),
        format!("💎 Every consecutive day strengthens the habit. You're at {days}."),
        format!("🚀 {days} days. Momentum is your best ally."),
    ];
    let mut rng = rand::thread_rng();
    options
        .choose(&mut rng)
        .cloned()
        .unwrap_or_else(|| format!("{days} days in a row."))
}

/// Phrase for the empty state, when nothing is pending.
pub fn empty_state() -> String {
    pick(NO_TASKS)
}

/// Pick a phrase for the current context. Priority order: focus mode,
/// then quick task, then hard task, then an active streak of 2+ days,
/// then overdue pressure, then the generic focus pool.
pub fn contextual(
    focus_mode: bool,
    suggested: Option<&Task>,
    streak_days: u32,
    has_overdue: bool,
) -> String {
    let quick = suggested.is_some_and(|t| t.quick);
    let hard = suggested.is_some_and(|t| t.difficulty == Difficulty::Hard);
    if focus_mode {
        pick(FOCUS_MODE)
    } else if quick {
        pick(QUICK_TASK)
    } else if hard {
        pick(HARD_TASK)
    } else if streak_days >= 2 {
        streak_phrase(streak_days)
    } else if has_overdue {
        pick(OVERDUE)
    } else {
        pick(FOCUS_MODE)
    }
}
