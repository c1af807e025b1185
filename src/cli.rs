use clap::{Parser, Subcommand};
use chrono::Timelike;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::config::{Config, ReminderConfig};
use crate::database::Database;
use crate::database::DatabaseError;
use crate::models::{normalized_name, Difficulty, Habit, Priority, Subtask, Task};
use crate::notify::{self, SmartContext, TerminalSink};
use crate::phrases;
use crate::scheduler::Scheduler;
use crate::scoring;
use crate::streaks::{self, ActivityLevel};
use crate::sync::{JsonDirMirror, SyncEngine, SyncError};
use crate::timer::{self, FocusSession, SessionEnd, TimerState};
use crate::utils;

/// How often the hourly contextual reminder runs
const SMART_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// How often the countdown, nag, and deadline scans run
const SCAN_INTERVAL: Duration = Duration::from_secs(15 * 60);
/// How often the kickoff reminder surfaces the top task
const KICKOFF_INTERVAL: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Parser)]
#[command(name = "nextup")]
#[command(about = "What should I do right now? A task list that answers")]
#[command(version)]
pub struct Cli {
    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Suggest the next task to work on (default if no subcommand)
    Next {
        /// Task IDs to pass over for this suggestion
        #[arg(long, value_delimiter = ',')]
        skip: Vec<i64>,
    },
    /// Add a new task
    Add {
        /// Task name
        name: String,
        /// Deadline ("2h", "3d", "2025-03-01", "2025-03-01 17:00")
        #[arg(long)]
        due: Option<String>,
        /// How hard the task feels
        #[arg(long, value_enum, default_value_t = Difficulty::Easy)]
        difficulty: Difficulty,
        /// How important the task is
        #[arg(long, value_enum, default_value_t = Priority::Normal)]
        priority: Priority,
        /// Mark as a quick task (minutes, not hours)
        #[arg(long)]
        quick: bool,
        /// Checklist item, repeatable
        #[arg(long = "subtask")]
        subtasks: Vec<String>,
    },
    /// List open tasks in priority order
    List {
        /// Include completed tasks
        #[arg(long)]
        all: bool,
    },
    /// Mark a task as started
    Start {
        /// Task ID
        id: i64,
    },
    /// Mark a task as completed
    Done {
        /// Task ID
        id: i64,
    },
    /// Put a completed task back among the pending ones
    Undo {
        /// Task ID
        id: i64,
    },
    /// Edit a task
    Edit {
        /// Task ID
        id: i64,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New deadline, or "none" to clear it
        #[arg(long)]
        due: Option<String>,
        /// New difficulty
        #[arg(long, value_enum)]
        difficulty: Option<Difficulty>,
        /// New priority
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Set or clear the quick-task flag
        #[arg(long)]
        quick: Option<bool>,
        /// Replacement checklist item, repeatable; replaces the whole set
        #[arg(long = "subtask")]
        subtasks: Vec<String>,
    },
    /// Delete a task
    Rm {
        /// Task ID
        id: i64,
    },
    /// Delete every completed task
    ClearDone,
    /// Check or uncheck checklist items
    #[command(subcommand)]
    Subtask(SubtaskCommands),
    /// Track daily habits
    #[command(subcommand)]
    Habit(HabitCommands),
    /// Show progress statistics and the activity heat map
    Stats,
    /// Run a focus session on a task
    Focus {
        /// Task ID
        id: i64,
        /// Session length in minutes
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// Deliver due reminders, once or on a schedule
    Remind {
        /// Run one pass and exit
        #[arg(long)]
        once: bool,
    },
    /// Push local tasks to the mirror directory and pull changes back
    Sync {
        /// Mirror directory, overrides the configured one
        #[arg(long)]
        mirror: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SubtaskCommands {
    /// Check off a checklist item
    Check {
        /// Subtask ID
        id: i64,
    },
    /// Uncheck a checklist item
    Uncheck {
        /// Subtask ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum HabitCommands {
    /// Add a habit
    Add {
        /// Habit name
        name: String,
        /// Emoji label
        #[arg(long)]
        emoji: Option<String>,
    },
    /// List habits with their streaks
    List,
    /// Toggle today's check-in for a habit
    Toggle {
        /// Habit ID
        id: i64,
    },
    /// Archive a habit, keeping its history
    Archive {
        /// Habit ID
        id: i64,
    },
    /// Delete a habit and its history
    Rm {
        /// Habit ID
        id: i64,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("Failed to parse deadline: {0}")]
    DeadlineParseError(String),
    #[error("Sync error: {0}")]
    SyncError(#[from] SyncError),
    #[error("No mirror directory configured (set mirror_dir in config.toml or pass --mirror)")]
    MirrorNotConfiguredError,
    #[error("Failed to install signal handler: {0}")]
    SignalError(String),
}

/// Handle the next command
pub fn handle_next(skip: Vec<i64>, db: &Database) -> Result<(), CliError> {
    let tasks = db.get_all_tasks()?;
    let now = utils::now_ms();
    let skipped: HashSet<i64> = skip.into_iter().collect();
    let ranking = scoring::rank(&tasks, now, &skipped);

    let Some(task) = ranking.suggested else {
        println!("{}", phrases::empty_state());
        return Ok(());
    };

    let stats = scoring::quick_stats(&tasks, now);
    let streak = streaks::current_streak(&completion_days(&tasks), streaks::epoch_day(now));
    println!(
        "{}",
        phrases::contextual(false, Some(&task), streak, stats.has_overdue())
    );
    println!();

    let id = task.id.unwrap_or_default();
    println!("Next up: [{}] {}", id, describe_task(&task, now));
    let (done, total) = db.subtask_progress(id)?;
    if total > 0 {
        println!("  Checklist: {}/{} done", done, total);
    }
    println!("  Start with: nextup start {}", id);

    if !ranking.remaining.is_empty() {
        println!();
        println!("Also waiting:");
        for task in ranking.remaining.iter().take(3) {
            println!("  [{}] {}", task.id.unwrap_or_default(), describe_task(task, now));
        }
    }

    Ok(())
}

/// Handle the add command
pub fn handle_add(
    name: String,
    due: Option<String>,
    difficulty: Difficulty,
    priority: Priority,
    quick: bool,
    subtasks: Vec<String>,
    db: &Database,
    mirror: Option<&SyncEngine>,
) -> Result<(), CliError> {
    // A blank name is dropped without comment
    let Some(name) = normalized_name(&name) else {
        return Ok(());
    };

    // Parse deadline if provided
    let now = utils::now_ms();
    let deadline = match due {
        Some(due_str) => Some(utils::parse_deadline(&due_str, now).map_err(|e| {
            CliError::DeadlineParseError(format!("Invalid deadline '{}': {}", due_str, e))
        })?),
        None => None,
    };

    // Create task
    let mut task = Task::new(name);
    task.deadline = deadline;
    task.difficulty = difficulty;
    task.priority = priority;
    task.quick = quick;

    // Insert into database together with its checklist
    let steps: Vec<String> = subtasks.iter().filter_map(|s| normalized_name(s)).collect();
    let id = db.create_task_with_subtasks(&task, &steps)?;
    println!("Task created successfully (ID: {})", id);

    push_quietly(mirror, id);
    Ok(())
}

/// Handle the list command
pub fn handle_list(all: bool, db: &Database) -> Result<(), CliError> {
    let tasks = db.get_all_tasks()?;
    let now = utils::now_ms();
    let ranking = scoring::rank(&tasks, now, &HashSet::new());

    let mut open: Vec<&Task> = Vec::new();
    open.extend(ranking.suggested.iter());
    open.extend(ranking.remaining.iter());

    if open.is_empty() && !all {
        println!("{}", phrases::empty_state());
        return Ok(());
    }

    for task in &open {
        println!("  [{}] {}", task.id.unwrap_or_default(), describe_task(task, now));
    }

    if all {
        let completed = db.get_completed_tasks()?;
        if !completed.is_empty() {
            println!();
            println!("Completed:");
            for task in &completed {
                let when = task
                    .completed_at
                    .map(utils::format_instant)
                    .unwrap_or_default();
                println!("  [{}] ✔ {} ({})", task.id.unwrap_or_default(), task.name, when);
            }
        }
    }

    let stats = scoring::quick_stats(&tasks, now);
    println!();
    println!("{} pending, {} done today", stats.pending, stats.completed_today);
    Ok(())
}

/// Handle the start command
pub fn handle_start(id: i64, db: &Database, mirror: Option<&SyncEngine>) -> Result<(), CliError> {
    if db.mark_started(id, utils::now_ms())? {
        println!("Task marked as started (ID: {})", id);
        push_quietly(mirror, id);
    } else {
        println!("No pending task found with ID {}", id);
    }
    Ok(())
}

/// Handle the done command
pub fn handle_done(id: i64, db: &Database, mirror: Option<&SyncEngine>) -> Result<(), CliError> {
    let now = utils::now_ms();
    if !db.mark_completed(id, now)? {
        println!("No pending task found with ID {}", id);
        return Ok(());
    }
    println!("Task marked as completed (ID: {})", id);

    let tasks = db.get_all_tasks()?;
    let streak = streaks::current_streak(&completion_days(&tasks), streaks::epoch_day(now));
    if streak >= 2 {
        println!("{}", phrases::streak_phrase(streak));
    }
    println!("Undo with: nextup undo {}", id);

    push_quietly(mirror, id);
    Ok(())
}

/// Handle the undo command
pub fn handle_undo(id: i64, db: &Database, mirror: Option<&SyncEngine>) -> Result<(), CliError> {
    if db.undo_complete(id, utils::now_ms())? {
        println!("Task reopened (ID: {})", id);
        push_quietly(mirror, id);
    } else {
        println!("No completed task found with ID {}", id);
    }
    Ok(())
}

/// Handle the edit command
#[allow(clippy::too_many_arguments)]
pub fn handle_edit(
    id: i64,
    name: Option<String>,
    due: Option<String>,
    difficulty: Option<Difficulty>,
    priority: Option<Priority>,
    quick: Option<bool>,
    subtasks: Vec<String>,
    db: &Database,
    mirror: Option<&SyncEngine>,
) -> Result<(), CliError> {
    let Some(mut task) = db.get_task(id)? else {
        println!("No task found with ID {}", id);
        return Ok(());
    };

    let now = utils::now_ms();
    if let Some(new_name) = name.as_deref().and_then(normalized_name) {
        task.name = new_name;
    }
    if let Some(due_str) = due {
        task.deadline = parse_deadline_update(&due_str, now)?;
    }
    if let Some(difficulty) = difficulty {
        task.difficulty = difficulty;
    }
    if let Some(priority) = priority {
        task.priority = priority;
    }
    if let Some(quick) = quick {
        task.quick = quick;
    }
    task.last_modified = now;
    db.update_task(&task)?;

    // Any --subtask replaces the whole checklist
    if !subtasks.is_empty() {
        let steps: Vec<Subtask> = subtasks
            .iter()
            .filter_map(|s| normalized_name(s))
            .enumerate()
            .map(|(idx, name)| Subtask::new(id, name, idx as i64))
            .collect();
        db.replace_subtasks(id, &steps)?;
    }

    println!("Task updated (ID: {})", id);
    push_quietly(mirror, id);
    Ok(())
}

/// Handle the rm command
pub fn handle_rm(id: i64, db: &Database, mirror: Option<&SyncEngine>) -> Result<(), CliError> {
    let Some(task) = db.get_task(id)? else {
        println!("No task found with ID {}", id);
        return Ok(());
    };

    // Remove the mirror document before the local row
    if let Some(engine) = mirror {
        engine.delete_remote_quietly(task.remote_id.as_deref());
    }
    db.delete_task(id)?;
    println!("Task deleted (ID: {})", id);
    Ok(())
}

/// Handle the clear-done command
pub fn handle_clear_done(db: &Database, mirror: Option<&SyncEngine>) -> Result<(), CliError> {
    let completed = db.get_completed_tasks()?;
    if let Some(engine) = mirror {
        for task in &completed {
            engine.delete_remote_quietly(task.remote_id.as_deref());
        }
    }
    let removed = db.delete_completed_tasks()?;
    println!("Removed {} completed task(s)", removed);
    Ok(())
}

/// Handle subtask check/uncheck
pub fn handle_subtask_set(
    id: i64,
    completed: bool,
    db: &Database,
    mirror: Option<&SyncEngine>,
) -> Result<(), CliError> {
    let Some(subtask) = db.get_subtask(id)? else {
        println!("No subtask found with ID {}", id);
        return Ok(());
    };

    db.set_subtask_completed(id, completed)?;
    db.touch_task_last_modified(subtask.task_id, utils::now_ms())?;

    let (done, total) = db.subtask_progress(subtask.task_id)?;
    let verb = if completed { "checked" } else { "unchecked" };
    println!("Subtask {} (ID: {}); checklist {}/{} done", verb, id, done, total);

    push_quietly(mirror, subtask.task_id);
    Ok(())
}

/// Handle the habit add command
pub fn handle_habit_add(name: String, emoji: Option<String>, db: &Database) -> Result<(), CliError> {
    let Some(name) = normalized_name(&name) else {
        return Ok(());
    };

    let mut habit = Habit::new(name);
    if let Some(emoji) = emoji.as_deref().and_then(normalized_name) {
        habit.emoji = emoji;
    }
    let id = db.insert_habit(&habit)?;
    println!("Habit created successfully (ID: {})", id);
    Ok(())
}

/// Handle the habit list command
pub fn handle_habit_list(db: &Database) -> Result<(), CliError> {
    let habits = db.get_active_habits()?;
    if habits.is_empty() {
        println!("No habits yet. Add one with: nextup habit add <name>");
        return Ok(());
    }

    let today = streaks::today();
    for habit in &habits {
        println!("  {}", describe_habit(habit, db, today)?);
    }
    Ok(())
}

/// Handle the habit toggle command
pub fn handle_habit_toggle(id: i64, db: &Database) -> Result<(), CliError> {
    let Some(habit) = db.get_habit(id)? else {
        println!("No habit found with ID {}", id);
        return Ok(());
    };

    let now = utils::now_ms();
    let today = streaks::epoch_day(now);
    let checked = db.toggle_habit_log(id, today, now)?;

    if checked {
        println!("Checked in: {} {}", habit.emoji, habit.name);
        let days: BTreeSet<i64> = db.logs_for_habit(id)?.into_iter().map(|log| log.day).collect();
        let streak = streaks::current_streak(&days, today);
        if streak >= 2 {
            println!("{}", phrases::streak_phrase(streak));
        }
    } else {
        println!("Check-in removed: {} {}", habit.emoji, habit.name);
    }
    Ok(())
}

/// Handle the habit archive command
pub fn handle_habit_archive(id: i64, db: &Database) -> Result<(), CliError> {
    if db.archive_habit(id, utils::now_ms())? {
        println!("Habit archived (ID: {})", id);
    } else {
        println!("No habit found with ID {}", id);
    }
    Ok(())
}

/// Handle the habit rm command
pub fn handle_habit_rm(id: i64, db: &Database) -> Result<(), CliError> {
    if db.delete_habit(id)? {
        println!("Habit deleted (ID: {})", id);
    } else {
        println!("No habit found with ID {}", id);
    }
    Ok(())
}

/// Handle the stats command
pub fn handle_stats(db: &Database) -> Result<(), CliError> {
    let tasks = db.get_all_tasks()?;
    let now = utils::now_ms();
    let today = streaks::epoch_day(now);
    let stats = scoring::quick_stats(&tasks, now);
    let days = completion_days(&tasks);

    println!("Tasks");
    println!("  Pending: {} ({} overdue)", stats.pending, stats.overdue);
    println!(
        "  Completed today: {} ({} worked)",
        stats.completed_today,
        utils::format_duration(stats.time_worked_today_ms)
    );
    println!(
        "  This week: {}, total {}",
        stats.completed_this_week, stats.completed_total
    );
    println!("  Completion rate: {:.0}%", stats.completion_rate() * 100.0);
    println!(
        "  Streak: {} (best {})",
        streaks::current_streak(&days, today),
        streaks::best_streak(&days)
    );

    let habits = db.get_active_habits()?;
    if !habits.is_empty() {
        println!();
        println!("Habits");
        for habit in &habits {
            println!("  {}", describe_habit(habit, db, today)?);
        }
    }

    println!();
    println!("Activity (last {} days)", streaks::HEAT_WINDOW_DAYS);
    let counts = streaks::activity_counts(
        tasks
            .iter()
            .filter(|t| t.completed)
            .filter_map(|t| t.completed_at)
            .map(streaks::epoch_day),
    );
    print!("{}", render_heat_map(&counts, today));
    Ok(())
}

/// Handle the focus command
pub fn handle_focus(
    id: i64,
    minutes: Option<u32>,
    config: &Config,
    db: &Database,
    mirror: Option<&SyncEngine>,
) -> Result<(), CliError> {
    let Some(task) = db.get_task(id)? else {
        println!("No task found with ID {}", id);
        return Ok(());
    };
    if task.completed {
        println!("Task {} is already completed", id);
        return Ok(());
    }

    let (min_minutes, max_minutes) = timer::SESSION_MINUTES_RANGE;
    let minutes = minutes
        .unwrap_or(config.focus.session_minutes)
        .clamp(min_minutes, max_minutes);

    let now = utils::now_ms();
    db.mark_started(id, now)?;

    println!("{}", phrases::contextual(true, Some(&task), 0, false));
    println!(
        "Focusing on [{}] {} for {} min (Ctrl-C stops the session)",
        id, task.name, minutes
    );

    let stop = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop))
        .map_err(|e| CliError::SignalError(e.to_string()))?;

    let session = FocusSession::new(id, task.name.clone(), now, minutes);
    let end = timer::run(
        &session,
        &stop,
        config.focus.min_credit_ms(),
        timer::TICK,
        |state| {
            if let TimerState::Running(snapshot) = state {
                print!("\r  {} remaining ", snapshot.formatted());
                let _ = std::io::stdout().flush();
            }
        },
    );
    println!();

    let now = utils::now_ms();
    match end {
        SessionEnd::Completed { credited_ms } => {
            db.add_time_worked(id, credited_ms, now)?;
            println!(
                "Session complete: {} logged on [{}] {}",
                utils::format_duration(credited_ms),
                id,
                task.name
            );
        }
        SessionEnd::Stopped {
            elapsed_ms,
            credited_ms: Some(credited_ms),
        } => {
            db.add_time_worked(id, credited_ms, now)?;
            println!(
                "Session stopped after {}; time logged",
                utils::format_duration(elapsed_ms)
            );
        }
        SessionEnd::Stopped {
            elapsed_ms,
            credited_ms: None,
        } => {
            println!(
                "Session stopped after {}; too short to log",
                utils::format_duration(elapsed_ms)
            );
        }
    }

    push_quietly(mirror, id);
    Ok(())
}

/// Handle the remind command
pub fn handle_remind(once: bool, config: &Config, db: Database) -> Result<(), CliError> {
    if once {
        let delivered = run_reminder_pass(&db, &config.reminders)?;
        if delivered == 0 {
            println!("Nothing to report right now");
        }
        return Ok(());
    }
    run_reminder_daemon(config, db)
}

/// Handle the sync command
pub fn handle_sync(
    mirror_arg: Option<String>,
    config: &Config,
    db: &Database,
) -> Result<(), CliError> {
    let dir = mirror_arg
        .map(|dir| utils::expand_path(&dir))
        .or_else(|| config.get_mirror_dir())
        .ok_or(CliError::MirrorNotConfiguredError)?;

    let mirror = JsonDirMirror::new(dir)?;
    let engine = SyncEngine::new(db, &mirror);
    let report = engine.sync_all();
    println!("{}", report.message);
    Ok(())
}

/// One synchronous reminder sweep; returns how many were delivered
fn run_reminder_pass(db: &Database, reminders: &ReminderConfig) -> Result<usize, CliError> {
    let tasks = db.get_all_tasks()?;
    let now = utils::now_ms();
    let ctx = SmartContext {
        hour: chrono::Local::now().hour(),
        nagging_enabled: reminders.nagging_enabled,
        quiet_start_hour: reminders.quiet_start_hour,
        quiet_end_hour: reminders.quiet_end_hour,
    };

    let mut notifications = Vec::new();
    notifications.extend(notify::plan_smart(&tasks, now, &ctx));
    notifications.extend(notify::plan_deadline_countdowns(&tasks, now));
    if reminders.nagging_enabled {
        notifications.extend(notify::plan_overdue_nags(&tasks, now));
    }

    notify::dispatch_all(&mut TerminalSink, &notifications);
    Ok(notifications.len())
}

/// Keep running and deliver reminders on their schedules until Ctrl-C
fn run_reminder_daemon(config: &Config, db: Database) -> Result<(), CliError> {
    let reminders = config.reminders.clone();

    // Immediate sweep so the daemon says something useful on startup
    let delivered = run_reminder_pass(&db, &reminders)?;
    if delivered == 0 {
        println!("Nothing due right now");
    }

    let db = Arc::new(Mutex::new(db));
    let scheduler = Scheduler::new();

    {
        let db = Arc::clone(&db);
        let reminders = reminders.clone();
        scheduler.every("smart", SMART_INTERVAL, move || {
            let Some(tasks) = snapshot(&db) else { return };
            let ctx = SmartContext {
                hour: chrono::Local::now().hour(),
                nagging_enabled: reminders.nagging_enabled,
                quiet_start_hour: reminders.quiet_start_hour,
                quiet_end_hour: reminders.quiet_end_hour,
            };
            if let Some(notification) = notify::plan_smart(&tasks, utils::now_ms(), &ctx) {
                notify::dispatch(&mut TerminalSink, &notification);
            }
        });
    }

    {
        let db = Arc::clone(&db);
        scheduler.every("countdown", SCAN_INTERVAL, move || {
            let Some(tasks) = snapshot(&db) else { return };
            let due_soon = notify::plan_deadline_countdowns(&tasks, utils::now_ms());
            notify::dispatch_all(&mut TerminalSink, &due_soon);
        });
    }

    if reminders.nagging_enabled {
        let db = Arc::clone(&db);
        scheduler.every("nag", SCAN_INTERVAL, move || {
            let Some(tasks) = snapshot(&db) else { return };
            let nags = notify::plan_overdue_nags(&tasks, utils::now_ms());
            notify::dispatch_all(&mut TerminalSink, &nags);
        });
    }

    {
        let db = Arc::clone(&db);
        scheduler.every("kickoff", KICKOFF_INTERVAL, move || {
            let Some(tasks) = snapshot(&db) else { return };
            if let Some(notification) = notify::plan_kickoff(&tasks, utils::now_ms()) {
                notify::dispatch(&mut TerminalSink, &notification);
            }
        });
    }

    if reminders.deadline_reminders_enabled {
        let db = Arc::clone(&db);
        let handle = scheduler.handle();
        let mut watched: HashSet<i64> = HashSet::new();
        scheduler.every("deadline-reconcile", SCAN_INTERVAL, move || {
            let Some(tasks) = snapshot(&db) else { return };
            let now = utils::now_ms();

            // Drop one-shots whose task started, completed, or disappeared
            watched.retain(|task_id| {
                let still_waiting = tasks.iter().any(|t| {
                    t.id == Some(*task_id) && !t.completed && !t.started && t.deadline.is_some()
                });
                if !still_waiting {
                    handle.cancel(&notify::deadline_key(*task_id));
                }
                still_waiting
            });

            // Schedule missing ones; an already-scheduled key is kept as is
            for task in &tasks {
                let Some(task_id) = task.id else { continue };
                let key = notify::deadline_key(task_id);
                if handle.contains(&key) {
                    continue;
                }
                if let Some((fire_at, notification)) = notify::plan_pre_deadline(task, now) {
                    let delay = Duration::from_millis((fire_at - now).max(0) as u64);
                    handle.once(&key, delay, move || {
                        notify::dispatch(&mut TerminalSink, &notification);
                    });
                    watched.insert(task_id);
                }
            }
        });
    }

    let stop = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop))
        .map_err(|e| CliError::SignalError(e.to_string()))?;

    println!("Reminder daemon running (Ctrl-C to stop)");
    while !stop.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(500));
    }
    scheduler.shutdown();
    println!("Reminder daemon stopped");
    Ok(())
}

/// Read a task snapshot for a scheduled job, logging instead of failing
fn snapshot(db: &Mutex<Database>) -> Option<Vec<Task>> {
    let db = db.lock().unwrap_or_else(|e| e.into_inner());
    match db.get_all_tasks() {
        Ok(tasks) => Some(tasks),
        Err(e) => {
            warn!(error = %e, "could not read tasks for reminders");
            None
        }
    }
}

fn push_quietly(mirror: Option<&SyncEngine>, task_id: i64) {
    if let Some(engine) = mirror {
        engine.push_task_quietly(task_id);
    }
}

/// One list line for a task: name, flags, deadline, score
fn describe_task(task: &Task, now: i64) -> String {
    let mut line = task.name.clone();
    if task.quick {
        line.push_str(" ⚡");
    }
    if task.started {
        line.push_str(" (started)");
    }
    if let Some(deadline) = task.deadline {
        let label = scoring::deadline_label(deadline, now);
        if task.is_overdue(now) {
            line.push_str(&format!(" - {}", label));
        } else {
            line.push_str(&format!(" - due {}", label));
        }
    }
    format!("{} (score {:.1})", line, scoring::score(task, now))
}

/// One list line for a habit: emoji, name, streaks, today's check mark
fn describe_habit(habit: &Habit, db: &Database, today: i64) -> Result<String, CliError> {
    let id = habit.id.unwrap_or_default();
    let days: BTreeSet<i64> = db.logs_for_habit(id)?.into_iter().map(|log| log.day).collect();
    let current = streaks::current_streak(&days, today);
    let best = streaks::best_streak(&days);
    let mark = if streaks::completed_on(&days, today) {
        " ✓ today"
    } else {
        ""
    };
    Ok(format!(
        "[{}] {} {} - streak {} (best {}){}",
        id, habit.emoji, habit.name, current, best, mark
    ))
}

fn parse_deadline_update(input: &str, now: i64) -> Result<Option<i64>, CliError> {
    if input.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    utils::parse_deadline(input, now).map(Some).map_err(|e| {
        CliError::DeadlineParseError(format!("Invalid deadline '{}': {}", input, e))
    })
}

/// GitHub-style heat map: 7 weekday rows, one column per week, oldest
/// on the left. Days outside the window render as blanks.
fn render_heat_map(counts: &BTreeMap<i64, u32>, today: i64) -> String {
    let start = today - (streaks::HEAT_WINDOW_DAYS - 1);
    // Pull the first column back to its Monday so the rows line up
    let first = start - i64::from(streaks::weekday_index(start));
    let weeks = (today - first) / 7 + 1;

    const LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    let mut out = String::new();
    for (row, label) in LABELS.iter().enumerate() {
        out.push_str("  ");
        out.push_str(label);
        out.push(' ');
        for week in 0..weeks {
            let day = first + week * 7 + row as i64;
            if day < start || day > today {
                out.push(' ');
            } else {
                let count = counts.get(&day).copied().unwrap_or(0);
                out.push(heat_glyph(ActivityLevel::for_count(count)));
            }
        }
        out.push('\n');
    }
    out
}

fn heat_glyph(level: ActivityLevel) -> char {
    match level {
        ActivityLevel::None => '·',
        ActivityLevel::Low => '░',
        ActivityLevel::Medium => '▒',
        ActivityLevel::High => '▓',
        ActivityLevel::VeryHigh => '█',
    }
}

/// Epoch-days on which at least one task was completed
fn completion_days(tasks: &[Task]) -> BTreeSet<i64> {
    streaks::day_set(
        tasks
            .iter()
            .filter(|t| t.completed)
            .filter_map(|t| t.completed_at),
    )
}
