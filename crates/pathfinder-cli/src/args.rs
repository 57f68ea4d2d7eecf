//! Command-line argument definitions using clap.
//!
//! Each subcommand has its own clap argument struct that converts into the
//! matching core parameter type, so clap attributes never leak into
//! `pathfinder-core`.
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Engine
//! ```

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use pathfinder_core::{
    ExportFormat, SessionStatus,
    params::{DeleteSession, ExportSession, Id, ListSessions, StartSession},
};

/// Pathfinder runs a business idea through market research, competitor
/// analysis, trend analysis and business planning, keeping every session on
/// disk so it can be inspected, exported or cancelled later.
#[derive(Parser)]
#[command(version, about, name = "pf")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/pathfinder/pathfinder.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start, inspect and manage sessions
    #[command(alias = "s")]
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Show aggregate session statistics
    Stats,
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Analyze a business idea and wait for the result
    #[command(alias = "new")]
    Start(StartArgs),
    /// Show the current state of a session
    Show(IdArgs),
    /// List sessions, newest first
    #[command(alias = "ls")]
    List(ListArgs),
    /// Cancel an active session at its next stage boundary
    Cancel(IdArgs),
    /// Export the results of a completed session
    Export(ExportArgs),
    /// Delete a session permanently
    #[command(alias = "rm")]
    Delete(DeleteArgs),
}

/// Start a new session
#[derive(ClapArgs)]
pub struct StartArgs {
    /// The business idea to analyze
    pub idea: String,

    /// Let the analyzers spotlight a related idea of their choosing
    #[arg(long)]
    pub lucky: bool,

    /// Simulated latency of each analysis stage, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub stage_delay_ms: u64,

    /// How often to check on the running session, in milliseconds
    #[arg(long, default_value_t = 250)]
    pub poll_interval_ms: u64,
}

impl From<&StartArgs> for StartSession {
    fn from(val: &StartArgs) -> Self {
        StartSession {
            idea: val.idea.clone(),
            lucky: val.lucky,
        }
    }
}

#[derive(ClapArgs)]
pub struct IdArgs {
    /// Session identifier, as printed by `start` and `list`
    pub id: String,
}

impl From<IdArgs> for Id {
    fn from(val: IdArgs) -> Self {
        Id { id: val.id }
    }
}

/// Command-line representation of session statuses for filtering
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Active,
    Completed,
    Failed,
    Cancelled,
}

impl From<StatusArg> for SessionStatus {
    fn from(val: StatusArg) -> Self {
        match val {
            StatusArg::Active => SessionStatus::Active,
            StatusArg::Completed => SessionStatus::Completed,
            StatusArg::Failed => SessionStatus::Failed,
            StatusArg::Cancelled => SessionStatus::Cancelled,
        }
    }
}

#[derive(ClapArgs)]
pub struct ListArgs {
    /// Only show sessions with this status
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,

    /// Maximum number of sessions to show
    #[arg(long, default_value_t = 20)]
    pub limit: u32,

    /// Number of sessions to skip
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
}

impl From<ListArgs> for ListSessions {
    fn from(val: ListArgs) -> Self {
        ListSessions {
            status: val
                .status
                .map(|s| SessionStatus::from(s).as_str().to_string()),
            limit: val.limit,
            offset: val.offset,
        }
    }
}

/// Command-line representation of export formats
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Txt,
    Md,
}

impl From<FormatArg> for ExportFormat {
    fn from(val: FormatArg) -> Self {
        match val {
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Txt => ExportFormat::Txt,
            FormatArg::Md => ExportFormat::Md,
        }
    }
}

#[derive(ClapArgs)]
pub struct ExportArgs {
    /// Session identifier
    pub id: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "md")]
    pub format: FormatArg,

    /// Write to this file instead of standard output
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl From<&ExportArgs> for ExportSession {
    fn from(val: &ExportArgs) -> Self {
        ExportSession {
            id: val.id.clone(),
            format: ExportFormat::from(val.format).as_str().to_string(),
        }
    }
}

#[derive(ClapArgs)]
pub struct DeleteArgs {
    /// Session identifier
    pub id: String,

    /// Confirm the deletion (required to prevent accidental deletion)
    #[arg(long)]
    pub confirm: bool,
}

impl From<DeleteArgs> for DeleteSession {
    fn from(val: DeleteArgs) -> Self {
        DeleteSession {
            id: val.id,
            confirmed: val.confirm,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_start() {
        let args = Args::parse_from(["pf", "session", "start", "vegan snacks", "--lucky"]);
        let Some(Commands::Session {
            command: SessionCommands::Start(start),
        }) = args.command
        else {
            panic!("expected session start");
        };
        let params = StartSession::from(&start);
        assert_eq!(params.idea, "vegan snacks");
        assert!(params.lucky);
        assert_eq!(start.poll_interval_ms, 250);
    }

    #[test]
    fn test_list_args_convert_status() {
        let params = ListSessions::from(ListArgs {
            status: Some(StatusArg::Cancelled),
            limit: 5,
            offset: 0,
        });
        assert_eq!(params.status.as_deref(), Some("cancelled"));
        assert_eq!(params.limit, 5);
    }
}
