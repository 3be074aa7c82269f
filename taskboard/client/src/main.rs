use std::io::Write;

use clap::{Parser, Subcommand};
use taskboard_client::api::{Filter, HttpTaskApi, Priority};
use taskboard_client::cli::{self, ShellCommand};
use taskboard_client::state::{TaskBoard, TaskRef};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Manage tasks on a taskboard server.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// Base URL of the task API.
    #[arg(
        long,
        env = "TASKBOARD_API_URL",
        default_value = "http://localhost:5000/api"
    )]
    api_url: String,

    /// Which tasks to show.
    #[arg(long, global = true, value_enum, default_value_t = Filter::All)]
    filter: Filter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
enum Commands {
    /// Show tasks.
    List,
    /// Add a task.
    Add {
        text: String,
        #[arg(short, long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
    },
    /// Flip a task between open and done.
    Toggle { task: TaskRef },
    /// Replace a task's text.
    Edit { task: TaskRef, text: String },
    /// Delete a task.
    Delete {
        task: TaskRef,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete every completed task.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Show totals.
    Stats,
    /// Start an interactive session.
    Shell,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let args = Cli::parse();

    let mut board = TaskBoard::new(HttpTaskApi::new(args.api_url));
    let mut out = std::io::stdout();
    let stdin = BufReader::new(tokio::io::stdin());

    let (command, skip_confirmation) = match args.command {
        Commands::Shell => {
            board.set_filter(args.filter).await?;
            return cli::run_shell(&mut board, stdin, &mut out).await;
        }
        Commands::List => (ShellCommand::List, false),
        Commands::Add { text, priority } => {
            board.set_priority(priority);
            (ShellCommand::Add(text), false)
        }
        Commands::Toggle { task } => (ShellCommand::Toggle(task), false),
        Commands::Edit { task, text } => (ShellCommand::Edit(task, text), false),
        Commands::Delete { task, yes } => (ShellCommand::Delete(task), yes),
        Commands::Clear { yes } => (ShellCommand::Clear, yes),
        Commands::Stats => (ShellCommand::Stats, false),
    };

    cli::preload(&mut board, args.filter, &command).await?;

    if command.needs_confirmation() && !skip_confirmation {
        let question = match &command {
            ShellCommand::Delete(task) => format!("Delete task {}?", describe_ref(task)),
            _ => "Delete all completed tasks?".to_string(),
        };
        let mut lines = stdin.lines();
        if !cli::confirm(&question, &mut lines, &mut out).await? {
            writeln!(out, "Cancelled")?;
            return Ok(());
        }
    }

    cli::execute(&mut board, command, &mut out).await
}

fn describe_ref(task: &TaskRef) -> String {
    match task {
        TaskRef::Position(row) => format!("at row {}", row),
        TaskRef::Id(id) => id.clone(),
    }
}
