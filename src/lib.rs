pub mod config;
pub mod database;
pub mod models;
pub mod utils;
pub mod scoring;
pub mod streaks;
pub mod phrases;
pub mod timer;
pub mod scheduler;
pub mod notify;
pub mod sync;
pub mod cli;

pub use config::Config;
pub use database::Database;
pub use models::{Habit, HabitLog, Subtask, Task};
pub use utils::Profile;
