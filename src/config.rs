//! Storage keys, defaults and the command line.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::dashboard::Toggles;
use crate::filter::{Criteria, DateBucket, ProjectFilter, SortMode, StatusClass};

/// Store key holding the JSON task list.
pub const TASKS_KEY: &str = "roof_tasks_web_v2";
/// Store key holding `light` or `dark`.
pub const THEME_KEY: &str = "task_manager_theme";

pub const APP_DIR_NAME: &str = "task-manager";
pub const LOG_FILE_NAME: &str = "task-manager.log";
pub const DEFAULT_LOG_FILTER: &str = "task_manager=info";

/// Currency suffix used when printing amounts.
pub const CURRENCY: &str = "₾";

#[derive(Parser, Debug)]
#[command(name = "task-manager", version, about = "Track small work items from the terminal")]
pub struct Cli {
    /// Directory holding the task store
    #[arg(long, env = "TASK_MANAGER_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log file (the terminal belongs to the UI)
    #[arg(long, env = "TASK_MANAGER_LOG", global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Print the filtered task list
    List(ListArgs),
    /// Print dashboard counts and totals
    Summary(SummaryArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    #[arg(long, value_enum, default_value_t = StatusClass::All)]
    pub status: StatusClass,
    /// Hide completed tasks
    #[arg(long)]
    pub only_active: bool,
    /// Exact project name, or `all`
    #[arg(long)]
    pub project: Option<String>,
    /// Case-insensitive text to look for in title, description and project
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long, value_enum, default_value_t = DateBucket::All)]
    pub due: DateBucket,
    #[arg(long, value_enum, default_value_t = SortMode::Created)]
    pub sort: SortMode,
}

#[derive(Debug, Clone, Args)]
pub struct SummaryArgs {
    /// Count completed tasks in the total amount
    #[arg(long)]
    pub include_done: bool,
    /// Count trashed tasks in the amounts
    #[arg(long)]
    pub include_deleted: bool,
}

impl ListArgs {
    pub fn criteria(&self) -> Criteria {
        Criteria {
            status: self.status,
            only_active: self.only_active,
            project: ProjectFilter::from_arg(self.project.as_deref()),
            query: self.search.clone().unwrap_or_default(),
            date: self.due,
            sort: self.sort,
        }
    }
}

impl SummaryArgs {
    pub fn toggles(&self) -> Toggles {
        Toggles {
            include_done: self.include_done,
            include_deleted: self.include_deleted,
        }
    }
}

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
        let log_file = cli
            .log_file
            .clone()
            .unwrap_or_else(|| data_dir.join(LOG_FILE_NAME));
        Self { data_dir, log_file }
    }
}

/// The platform data directory, or the working directory if there is none.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}
