use clap::Parser;
use color_eyre::Result;
use nextup::cli::{self, Cli, Commands};
use nextup::sync::{JsonDirMirror, SyncEngine};
use nextup::{Config, Database, Profile};
use tracing::warn;

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev {
        Profile::Dev
    } else {
        Profile::Prod
    };

    // Load configuration with the determined profile
    let config = Config::load_with_profile(profile)?;

    // Initialize database
    let db_path = config.get_database_path();
    let db = Database::new(
        db_path.to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?
    )?;

    // Running without a subcommand asks for the next suggestion
    let command = cli.command.unwrap_or(Commands::Next { skip: Vec::new() });

    // Open the mirror when one is configured; commands push through it
    // after every mutation so the mirror never falls far behind
    let mirror = config.get_mirror_dir().and_then(|dir| match JsonDirMirror::new(dir) {
        Ok(mirror) => Some(mirror),
        Err(e) => {
            warn!(error = %e, "mirror directory unavailable, continuing without sync");
            None
        }
    });
    let engine = mirror.as_ref().map(|mirror| SyncEngine::new(&db, mirror));

    // Dispatch to appropriate command handler
    match command {
        Commands::Next { skip } => {
            cli::handle_next(skip, &db)?;
        }
        Commands::Add { name, due, difficulty, priority, quick, subtasks } => {
            cli::handle_add(name, due, difficulty, priority, quick, subtasks, &db, engine.as_ref())?;
        }
        Commands::List { all } => {
            cli::handle_list(all, &db)?;
        }
        Commands::Start { id } => {
            cli::handle_start(id, &db, engine.as_ref())?;
        }
        Commands::Done { id } => {
            cli::handle_done(id, &db, engine.as_ref())?;
        }
        Commands::Undo { id } => {
            cli::handle_undo(id, &db, engine.as_ref())?;
        }
        Commands::Edit { id, name, due, difficulty, priority, quick, subtasks } => {
            cli::handle_edit(id, name, due, difficulty, priority, quick, subtasks, &db, engine.as_ref())?;
        }
        Commands::Rm { id } => {
            cli::handle_rm(id, &db, engine.as_ref())?;
        }
        Commands::ClearDone => {
            cli::handle_clear_done(&db, engine.as_ref())?;
        }
        Commands::Subtask(subtask_command) => match subtask_command {
            cli::SubtaskCommands::Check { id } => {
                cli::handle_subtask_set(id, true, &db, engine.as_ref())?;
            }
            cli::SubtaskCommands::Uncheck { id } => {
                cli::handle_subtask_set(id, false, &db, engine.as_ref())?;
            }
        },
        Commands::Habit(habit_command) => match habit_command {
            cli::HabitCommands::Add { name, emoji } => {
                cli::handle_habit_add(name, emoji, &db)?;
            }
            cli::HabitCommands::List => {
                cli::handle_habit_list(&db)?;
            }
            cli::HabitCommands::Toggle { id } => {
                cli::handle_habit_toggle(id, &db)?;
            }
            cli::HabitCommands::Archive { id } => {
                cli::handle_habit_archive(id, &db)?;
            }
            cli::HabitCommands::Rm { id } => {
                cli::handle_habit_rm(id, &db)?;
            }
        },
        Commands::Stats => {
            cli::handle_stats(&db)?;
        }
        Commands::Focus { id, minutes } => {
            cli::handle_focus(id, minutes, &config, &db, engine.as_ref())?;
        }
        Commands::Remind { once } => {
            // The daemon takes the database with it
            drop(engine);
            cli::handle_remind(once, &config, db)?;
        }
        Commands::Sync { mirror: mirror_arg } => {
            cli::handle_sync(mirror_arg, &config, &db)?;
        }
    }

    Ok(())
}
