//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Star-wager tournament scoreboard.
#[derive(Debug, Parser)]
#[command(name = "tourney", about = "Star-wager tournament scoreboard", version)]
pub struct Cli {
    /// The command to run.
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file.
    #[arg(long, global = true, default_value = "tourney-config.yaml")]
    pub config: PathBuf,

    /// Data directory, overriding configuration and `TOURNEY_DATA_DIR`.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output format for listings.
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

/// How listings are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// One JSON document.
    Json,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a match result such as "Ana > Bea"
    Record(RecordArgs),
    /// Register a new participant
    Register(RegisterArgs),
    /// Remove a participant
    Remove(RemoveArgs),
    /// Show the ranking
    Standings,
    /// Show the podium and the latest match
    Podium,
    /// Show match statistics
    Stats(StatsArgs),
    /// List the game types matches can be recorded for
    Games,
    /// Write the CSV export
    Export(ExportArgs),
    /// Erase every participant and match
    Reset(ResetArgs),
    /// Follow the standings as other views record matches
    Watch(WatchArgs),
}

/// Arguments for `record`.
#[derive(Debug, Args)]
pub struct RecordArgs {
    /// Game type id, e.g. M001.
    pub game_type: String,
    /// Result text, winner first: "Winner > Loser".
    pub result: String,
}

/// Arguments for `register`.
#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// First name.
    #[arg(long)]
    pub first_name: String,
    /// Last name.
    #[arg(long)]
    pub last_name: String,
    /// Birth date as YYYY-MM-DD.
    #[arg(long)]
    pub birth_date: String,
}

/// Arguments for `remove`.
#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Participant id, e.g. P004.
    pub id: String,
    /// Confirm the removal.
    #[arg(long)]
    pub yes: bool,
}

/// Arguments for `stats`.
#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Which statistics to show.
    #[arg(value_enum, default_value = "games")]
    pub view: StatsView,
}

/// Statistics views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatsView {
    /// Matches per game type.
    Games,
    /// Win/loss record per participant.
    Players,
}

/// Arguments for `export`.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Output file. Defaults to `campeonato_<unix-millis>.csv`.
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

/// Arguments for `reset`.
#[derive(Debug, Args)]
pub struct ResetArgs {
    /// Confirm the reset. It cannot be undone.
    #[arg(long)]
    pub yes: bool,
}

/// Arguments for `watch`.
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// How often to check for writes, in milliseconds.
    #[arg(long, default_value = "1000")]
    pub interval_ms: u64,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn record_takes_game_type_and_result() {
        let cli = Cli::try_parse_from(["tourney", "record", "M001", "Ana > Bea"]);
        assert!(cli.is_ok());
        if let Ok(Cli {
            command: Command::Record(args),
            ..
        }) = cli
        {
            assert_eq!(args.game_type, "M001");
            assert_eq!(args.result, "Ana > Bea");
        }
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["tourney", "standings", "--format", "json"]);
        assert_eq!(cli.ok().map(|c| c.format), Some(OutputFormat::Json));
    }

    #[test]
    fn destructive_commands_default_to_unconfirmed() {
        let cli = Cli::try_parse_from(["tourney", "reset"]);
        assert!(matches!(
            cli.ok().map(|c| c.command),
            Some(Command::Reset(ResetArgs { yes: false }))
        ));
    }
}
