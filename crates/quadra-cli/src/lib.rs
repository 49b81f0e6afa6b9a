// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod controller;
mod render;
mod transport;

pub use controller::{Session, SessionError};
pub use transport::{
    BackoffPolicy, FakeTransport, HttpTransport, RetryPolicy, TaskTransport, TransportError,
};

use chrono::{DateTime, NaiveDate, Utc};
use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::process::ExitCode as ProcessExitCode;
use tracing_subscriber::EnvFilter;

use quadra_api::{task_to_dto, TaskPatch};
use quadra_model::{Quadrant, TaskId, TaskText};

pub const CRATE_NAME: &str = "quadra-cli";

const QUADRA_HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
Usage: {usage}

Options:
{options}

Commands:
{subcommands}
{after-help}";

#[derive(Parser)]
#[command(name = "quadra")]
#[command(version)]
#[command(about = "Eisenhower-matrix task board CLI")]
#[command(help_template = QUADRA_HELP_TEMPLATE)]
#[command(
    after_help = "Environment:\n  QUADRA_SERVER_URL   Server base URL (default http://127.0.0.1:8080)\n  RUST_LOG            Log verbosity override"
)]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[arg(long, global = true, action = ArgAction::Count)]
    verbose: u8,
    /// Server base URL; overrides QUADRA_SERVER_URL.
    #[arg(long, global = true)]
    server: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum QuadrantCli {
    Inbox,
    UrgentImportant,
    NotUrgentImportant,
    UrgentNotImportant,
    NotUrgentNotImportant,
}

impl From<QuadrantCli> for Quadrant {
    fn from(value: QuadrantCli) -> Self {
        match value {
            QuadrantCli::Inbox => Self::Inbox,
            QuadrantCli::UrgentImportant => Self::UrgentImportant,
            QuadrantCli::NotUrgentImportant => Self::NotUrgentImportant,
            QuadrantCli::UrgentNotImportant => Self::UrgentNotImportant,
            QuadrantCli::NotUrgentNotImportant => Self::NotUrgentNotImportant,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render the board: quadrants plus the finished list.
    Board,
    /// Create a task.
    Add {
        text: String,
        #[arg(long, value_enum, default_value_t = QuadrantCli::Inbox)]
        quadrant: QuadrantCli,
        /// Due date, RFC 3339 or YYYY-MM-DD.
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Update text, note, due date, or the waiting flag.
    Edit {
        id: String,
        #[arg(long)]
        text: Option<String>,
        /// New note; an empty string clears it.
        #[arg(long)]
        note: Option<String>,
        /// New due date; `none` clears it.
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        waiting: Option<bool>,
    },
    /// Move a task to another quadrant.
    Move {
        id: String,
        #[arg(value_enum)]
        quadrant: QuadrantCli,
    },
    /// Reorder one quadrant; supply every active task id in the desired
    /// order.
    Reorder {
        #[arg(value_enum)]
        quadrant: QuadrantCli,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Mark a task finished.
    Done { id: String },
    /// Return a finished task to its quadrant.
    Restore { id: String },
    /// Delete a task permanently.
    Rm { id: String },
    /// Show one task in full.
    Show { id: String },
    /// Emit shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_due(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("invalid due date: {raw} (expected RFC 3339 or YYYY-MM-DD)"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("invalid due date: {raw}"))?;
    Ok(DateTime::from_naive_utc_and_offset(midnight, Utc))
}

fn parse_id(raw: &str) -> Result<TaskId, String> {
    TaskId::parse(raw).map_err(|e| e.to_string())
}

fn print_task<T: TaskTransport>(session: &Session<T>, id: &TaskId, json: bool) {
    if let Some(task) = session.get(id) {
        if json {
            match serde_json::to_string_pretty(&task_to_dto(task)) {
                Ok(rendered) => println!("{rendered}"),
                Err(e) => eprintln!("could not render task: {e}"),
            }
        } else {
            print!("{}", render::render_task(task));
        }
    }
}

fn report_skipped<T: TaskTransport>(session: &Session<T>, quiet: bool) {
    if quiet {
        return;
    }
    for (id, err) in session.skipped_rows() {
        eprintln!("warning: skipped stored task {id}: {err}");
    }
}

fn dispatch<T: TaskTransport>(
    session: &mut Session<T>,
    command: &Commands,
    json: bool,
    quiet: bool,
) -> Result<(), String> {
    match command {
        Commands::Board => {
            if json {
                let dtos: Vec<_> = session.tasks().iter().map(task_to_dto).collect();
                let rendered =
                    serde_json::to_string_pretty(&dtos).map_err(|e| e.to_string())?;
                println!("{rendered}");
            } else {
                print!("{}", render::render_board(&session.board()));
            }
            Ok(())
        }
        Commands::Add { text, quadrant, due, note } => {
            let text = TaskText::parse(text).map_err(|e| e.to_string())?;
            let due_date = due.as_deref().map(parse_due).transpose()?;
            let id = session
                .add(text, (*quadrant).into(), due_date, note.clone())
                .map_err(|e| e.to_string())?;
            if !quiet {
                println!("created {id}");
            }
            print_task(session, &id, json);
            Ok(())
        }
        Commands::Edit { id, text, note, due, waiting } => {
            let id = parse_id(id)?;
            let mut patch = TaskPatch {
                is_waiting: *waiting,
                ..TaskPatch::default()
            };
            if let Some(raw) = text {
                patch.text = Some(TaskText::parse(raw).map_err(|e| e.to_string())?);
            }
            if let Some(raw) = note {
                patch.note = Some(if raw.trim().is_empty() {
                    None
                } else {
                    Some(raw.trim().to_string())
                });
            }
            if let Some(raw) = due {
                patch.due_date = Some(if raw == "none" {
                    None
                } else {
                    Some(parse_due(raw)?)
                });
            }
            session.edit(&id, &patch).map_err(|e| e.to_string())?;
            print_task(session, &id, json);
            Ok(())
        }
        Commands::Move { id, quadrant } => {
            let id = parse_id(id)?;
            session
                .move_task(&id, (*quadrant).into())
                .map_err(|e| e.to_string())?;
            if !quiet {
                println!("moved {id} to {}", Quadrant::from(*quadrant).as_str());
            }
            Ok(())
        }
        Commands::Reorder { quadrant, ids } => {
            let desired = ids
                .iter()
                .map(|raw| parse_id(raw))
                .collect::<Result<Vec<_>, _>>()?;
            session
                .reorder((*quadrant).into(), &desired)
                .map_err(|e| e.to_string())?;
            if !quiet {
                println!("reordered {}", Quadrant::from(*quadrant).as_str());
            }
            Ok(())
        }
        Commands::Done { id } => {
            let id = parse_id(id)?;
            session.complete(&id).map_err(|e| e.to_string())?;
            if !quiet {
                println!("finished {id}");
            }
            Ok(())
        }
        Commands::Restore { id } => {
            let id = parse_id(id)?;
            session.restore(&id).map_err(|e| e.to_string())?;
            if !quiet {
                println!("restored {id}");
            }
            Ok(())
        }
        Commands::Rm { id } => {
            let id = parse_id(id)?;
            session.delete(&id).map_err(|e| e.to_string())?;
            if !quiet {
                println!("deleted {id}");
            }
            Ok(())
        }
        Commands::Show { id } => {
            let id = parse_id(id)?;
            if session.get(&id).is_none() {
                return Err(format!("no task with id {id}"));
            }
            print_task(session, &id, json);
            Ok(())
        }
        Commands::Completions { .. } => unreachable!("handled before session setup"),
    }
}

#[must_use]
pub fn run() -> ProcessExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Commands::Completions { shell } = &cli.command {
        let mut command = Cli::command();
        generate(*shell, &mut command, "quadra", &mut std::io::stdout());
        return ProcessExitCode::SUCCESS;
    }

    let base_url = cli
        .server
        .clone()
        .or_else(|| std::env::var("QUADRA_SERVER_URL").ok())
        .unwrap_or_else(|| "http://127.0.0.1:8080".to_string());
    let transport = match HttpTransport::new(base_url, RetryPolicy::default()) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("error: {e}");
            return ProcessExitCode::FAILURE;
        }
    };
    let mut session = match Session::load(transport) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("error: {e}");
            return ProcessExitCode::FAILURE;
        }
    };
    report_skipped(&session, cli.quiet);

    match dispatch(&mut session, &cli.command, cli.json, cli.quiet) {
        Ok(()) => ProcessExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ProcessExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod controller_tests;
