use std::{fs, io, sync::Mutex};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use task_manager::{
    app::App,
    clock::{Clock, SystemClock},
    config::{Cli, Commands, Config, ListArgs, SummaryArgs, DEFAULT_LOG_FILTER},
    dashboard::Summary,
    filter,
    store::FileStore,
    ui::{self, format_amount},
    TaskRepository,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli);

    // The store creates the data dir, which also holds the default log file
    let store = FileStore::open(&config.data_dir)
        .with_context(|| format!("cannot open data directory {:?}", config.data_dir))?;
    init_logging(&config)?;
    tracing::info!("Starting task-manager with data in {:?}", config.data_dir);

    let repo = TaskRepository::load(store, SystemClock);
    match &cli.command {
        Some(Commands::List(args)) => print_list(&repo, args),
        Some(Commands::Summary(args)) => print_summary(&repo, args),
        None => run_tui(repo)?,
    }
    Ok(())
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("cannot open log file {:?}", config.log_file))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn run_tui(repo: TaskRepository<FileStore, SystemClock>) -> anyhow::Result<()> {
    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(repo);
    let result = ui::run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        tracing::error!("UI loop failed: {}", err);
    }
    tracing::info!("Exiting");
    result.context("terminal UI failed")
}

fn print_list(repo: &TaskRepository<FileStore, SystemClock>, args: &ListArgs) {
    let today = repo.clock().today();
    let view = filter::apply(repo.tasks(), &args.criteria(), today);
    for t in &view {
        let due = t.due_date.map_or("-".to_string(), |d| d.to_string());
        let amount = t.amount.map_or(String::new(), |a| format!("  {}", format_amount(a)));
        println!(
            "[#{}] {:<8} {:<7} due {:<10} {}{}",
            t.id,
            t.state_label(),
            t.priority,
            due,
            t.title,
            amount
        );
    }
    println!("{} task(s)", view.len());
}

fn print_summary(repo: &TaskRepository<FileStore, SystemClock>, args: &SummaryArgs) {
    let s = Summary::compute(repo.tasks(), args.toggles(), repo.clock().today());
    println!("Total: {} (open {}, done {})", s.total, s.active, s.done);
    println!("Overdue open: {}", s.overdue);
    println!("Due today: {}", s.due_today);
    println!("Due this week: {}", s.due_this_week);
    println!("Open by priority: high {}, normal {}, low {}", s.high, s.normal, s.low);
    println!("Open amount: {}", format_amount(s.active_amount));
    println!("Total amount: {}", format_amount(s.total_amount));
}
