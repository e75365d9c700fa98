//! nestctl: command-line access to NestNote routine completion and sessions.
//!
//! Operates on the same files as the app (`~/.nestnote/` by default).
//!
//! ## Subcommands
//!
//! - `routine`: check, set, toggle, progress and reset action completion
//! - `session`: list buckets, change status, check nest access, archive, delete

mod logging;
mod routine;
mod session;

use clap::{Parser, Subcommand};
use nest_core::{NestEngine, SessionStatus, StorageConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nestctl")]
#[command(about = "NestNote routine and session tool")]
#[command(version)]
struct Cli {
    /// Storage root (defaults to ~/.nestnote)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Expire completions after N minutes instead of at local midnight
    #[arg(long, global = true, value_name = "N")]
    testing_minutes: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Routine action completion
    #[command(subcommand)]
    Routine(RoutineCommand),

    /// Session lifecycle
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Subcommand)]
enum RoutineCommand {
    /// Print whether an action is currently completed
    Check {
        #[arg(value_name = "ROUTINE_ID")]
        routine_id: String,
        #[arg(value_name = "INDEX")]
        index: usize,
    },

    /// Mark an action completed or not
    Set {
        #[arg(value_name = "ROUTINE_ID")]
        routine_id: String,
        #[arg(value_name = "INDEX")]
        index: usize,
        #[arg(value_name = "COMPLETED", action = clap::ArgAction::Set)]
        completed: bool,
    },

    /// Flip an action and print the new state
    Toggle {
        #[arg(value_name = "ROUTINE_ID")]
        routine_id: String,
        #[arg(value_name = "INDEX")]
        index: usize,
    },

    /// Print completion progress as JSON
    Progress {
        #[arg(value_name = "ROUTINE_ID")]
        routine_id: String,
        /// Number of actions in the routine
        #[arg(long)]
        actions: usize,
    },

    /// Clear every action of a routine
    Reset {
        #[arg(value_name = "ROUTINE_ID")]
        routine_id: String,
        /// Number of actions in the routine
        #[arg(long)]
        actions: usize,
    },
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Print sessions grouped into past, in progress and upcoming
    List {
        /// Only sessions of this nest
        #[arg(long, value_name = "NEST_ID")]
        nest: Option<String>,
    },

    /// Change a session's status
    Status {
        #[arg(value_name = "ID")]
        id: String,
        #[arg(value_name = "STATUS", value_parser = session::parse_status)]
        status: SessionStatus,
        /// Confirm completing the session (revokes sitter access)
        #[arg(long)]
        confirm: bool,
    },

    /// Print whether the assigned sitter can access the nest right now
    Access {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Move a session to history as completed
    Archive {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Permanently delete a session
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

fn run(engine: &NestEngine, command: Commands) -> nest_core::Result<()> {
    match command {
        Commands::Routine(cmd) => match cmd {
            RoutineCommand::Check { routine_id, index } => {
                println!("{}", routine::check(engine, &routine_id, index));
            }
            RoutineCommand::Set {
                routine_id,
                index,
                completed,
            } => routine::set(engine, &routine_id, index, completed)?,
            RoutineCommand::Toggle { routine_id, index } => {
                println!("{}", routine::toggle(engine, &routine_id, index)?);
            }
            RoutineCommand::Progress {
                routine_id,
                actions,
            } => {
                println!("{}", routine::progress(engine, &routine_id, actions));
            }
            RoutineCommand::Reset {
                routine_id,
                actions,
            } => routine::reset(engine, &routine_id, actions)?,
        },
        Commands::Session(cmd) => match cmd {
            SessionCommand::List { nest } => {
                let listing = session::list(engine, nest.as_deref());
                match serde_json::to_string_pretty(&listing) {
                    Ok(text) => println!("{}", text),
                    Err(_) => println!("{}", listing),
                }
            }
            SessionCommand::Status {
                id,
                status,
                confirm,
            } => {
                println!("{}", session::set_status(engine, &id, status, confirm)?);
            }
            SessionCommand::Access { id } => {
                println!("{}", session::access(engine, &id)?);
            }
            SessionCommand::Archive { id } => session::archive(engine, &id)?,
            SessionCommand::Delete { id } => session::delete(engine, &id)?,
        },
    }
    Ok(())
}

/// Runs the CLI and returns the exit code. The logging guard drops here so
/// buffered file output is flushed before the process exits.
fn try_main(cli: Cli) -> i32 {
    let storage = cli.root.map(StorageConfig::with_root).unwrap_or_default();
    let _logging_guard = logging::init(&storage.logs_dir());

    let engine = match NestEngine::with_storage(storage) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!(error = %e, "nestctl failed to open storage");
            return 1;
        }
    };
    if let Some(minutes) = cli.testing_minutes {
        engine.set_testing_mode(minutes);
    }

    match run(&engine, cli.command) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "nestctl failed");
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    std::process::exit(try_main(cli));
}
