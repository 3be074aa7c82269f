//! Terminal front end: command execution and the interactive shell.

use std::io::Write;

use clap::ValueEnum;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::ClientError;
use crate::api::{Filter, Priority, TaskApi};
use crate::render::{render_list, render_summary};
use crate::state::{TaskBoard, TaskRef};

pub const SHELL_HELP: &str = "\
Commands:
  list                    show the current list
  add <text>              add a task with the selected priority
  priority <p>            select low, medium or high for new tasks
  filter <f>              show all, active or completed tasks
  toggle <row|id>         flip a task between open and done
  edit <row|id> <text>    replace a task's text
  delete <row|id>         delete a task
  clear                   delete every completed task
  stats                   show totals
  help                    show this text
  quit                    leave the shell";

/// One user action against the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List,
    Add(String),
    Priority(Priority),
    Filter(Filter),
    Toggle(TaskRef),
    Edit(TaskRef, String),
    Delete(TaskRef),
    Clear,
    Stats,
    Help,
    Quit,
}

impl ShellCommand {
    /// Parses a shell line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "list" | "ls" => ShellCommand::List,
            "add" => ShellCommand::Add(required(rest, "add <text>")?.to_string()),
            "priority" => ShellCommand::Priority(Priority::from_str(
                required(rest, "priority <low|medium|high>")?,
                true,
            )?),
            "filter" => ShellCommand::Filter(Filter::from_str(
                required(rest, "filter <all|active|completed>")?,
                true,
            )?),
            "toggle" => ShellCommand::Toggle(task_ref(rest, "toggle <row|id>")?),
            "edit" => {
                let usage = "edit <row|id> <text>";
                let (target, text) = required(rest, usage)?
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| format!("usage: {}", usage))?;
                ShellCommand::Edit(task_ref(target, usage)?, text.trim().to_string())
            }
            "delete" | "rm" => ShellCommand::Delete(task_ref(rest, "delete <row|id>")?),
            "clear" => ShellCommand::Clear,
            "stats" => ShellCommand::Stats,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            other => return Err(format!("unknown command '{}', try 'help'", other)),
        };
        Ok(Some(command))
    }

    /// Whether the command destroys data and should be confirmed first.
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, ShellCommand::Delete(_) | ShellCommand::Clear)
    }
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("usage: {}", usage))
    } else {
        Ok(rest)
    }
}

fn task_ref(rest: &str, usage: &str) -> Result<TaskRef, String> {
    let Ok(task) = required(rest, usage)?.parse::<TaskRef>();
    Ok(task)
}

/// Prints the current list followed by the summary line.
pub async fn redraw<A: TaskApi>(board: &TaskBoard<A>, out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "{}", render_list(board.tasks(), board.filter()))?;
    writeln!(out, "{}", render_summary(&board.summary().await))?;
    Ok(())
}

/// Loads the board with `filter` before a one-shot `command`. `stats` still
/// runs when the list cannot be fetched, so it can show local counts.
pub async fn preload<A: TaskApi>(
    board: &mut TaskBoard<A>,
    filter: Filter,
    command: &ShellCommand,
) -> Result<(), ClientError> {
    match board.set_filter(filter).await {
        Err(err) if *command == ShellCommand::Stats => {
            tracing::warn!("Could not load tasks: {}", err);
            Ok(())
        }
        result => result,
    }
}

/// Runs one command against the board and prints the outcome.
pub async fn execute<A: TaskApi>(
    board: &mut TaskBoard<A>,
    command: ShellCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        ShellCommand::List => board.load().await?,
        ShellCommand::Add(text) => {
            let task = board.add(&text).await?;
            writeln!(out, "Added: {}", task.text)?;
        }
        ShellCommand::Priority(priority) => {
            board.set_priority(priority);
            writeln!(out, "New tasks will have {} priority", priority)?;
            return Ok(());
        }
        ShellCommand::Filter(filter) => board.set_filter(filter).await?,
        ShellCommand::Toggle(task) => board.toggle(&task).await?,
        ShellCommand::Edit(task, text) => {
            if !board.edit(&task, &text).await? {
                writeln!(out, "Nothing changed: text is empty")?;
                return Ok(());
            }
        }
        ShellCommand::Delete(task) => {
            let removed = board.delete(&task).await?;
            writeln!(out, "Deleted: {}", removed.text)?;
        }
        ShellCommand::Clear => {
            let removed = board.clear_completed().await?;
            writeln!(out, "Cleared {} completed tasks", removed)?;
        }
        ShellCommand::Stats => {
            writeln!(out, "{}", render_summary(&board.summary().await))?;
            return Ok(());
        }
        ShellCommand::Help => {
            writeln!(out, "{}", SHELL_HELP)?;
            return Ok(());
        }
        ShellCommand::Quit => return Ok(()),
    }
    redraw(board, out).await
}

/// Asks `question` and reads the answer from `lines`. Only `y`/`yes` confirm;
/// end of input counts as no.
pub async fn confirm<R: AsyncBufRead + Unpin>(
    question: &str,
    lines: &mut Lines<R>,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    write!(out, "{} [y/N] ", question)?;
    out.flush()?;
    let answer = lines.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn confirmation_question<A: TaskApi>(board: &TaskBoard<A>, command: &ShellCommand) -> String {
    match command {
        ShellCommand::Delete(task) => match board.resolve(task) {
            Ok(held) => format!("Delete '{}'?", held.text),
            Err(_) => "Delete this task?".to_string(),
        },
        _ => "Delete all completed tasks?".to_string(),
    }
}

/// Reads commands from `input` until `quit` or end of input. Failed commands
/// are reported and the shell keeps going.
pub async fn run_shell<A, R>(
    board: &mut TaskBoard<A>,
    input: R,
    out: &mut impl Write,
) -> anyhow::Result<()>
where
    A: TaskApi,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    redraw(board, out).await?;
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match ShellCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                writeln!(out, "error: {}", message)?;
                continue;
            }
        };
        if command == ShellCommand::Quit {
            break;
        }
        if command.needs_confirmation() {
            let question = confirmation_question(board, &command);
            if !confirm(&question, &mut lines, out).await? {
                writeln!(out, "Cancelled")?;
                continue;
            }
        }

        if let Err(err) = execute(board, command, out).await {
            tracing::debug!("Command failed: {:?}", err);
            writeln!(out, "error: {}", describe(&err))?;
        }
    }
    Ok(())
}

/// User-facing text for a failed command.
pub fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ClientError>() {
        Some(client_error) => client_error.to_string(),
        None => format!("{:#}", err),
    }
}
