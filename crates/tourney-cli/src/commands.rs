//! Command handlers.
//!
//! Every handler opens a [`LedgerEngine`] over the configured data
//! directory, performs one operation, and prints the result.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use tourney_core::engine::{EngineSettings, LedgerEngine};
use tourney_core::export::export_file_name;
use tourney_core::{JsonFileStore, TourneyConfig};
use tourney_types::{GameTypeId, Participant, ParticipantId};

use crate::cli::{
    Cli, Command, ExportArgs, OutputFormat, RecordArgs, RegisterArgs, RemoveArgs, ResetArgs,
    StatsArgs, StatsView, WatchArgs,
};
use crate::error::CliError;

type Engine = LedgerEngine<JsonFileStore>;

/// Dispatch a parsed command line.
pub async fn run_command(cli: Cli, config: &TourneyConfig) -> Result<(), CliError> {
    let store = JsonFileStore::new(&config.storage.data_dir);
    let mut engine = LedgerEngine::open(store, EngineSettings::from(config))?;
    let format = cli.format;

    match cli.command {
        Command::Record(args) => cmd_record(&mut engine, &args, format),
        Command::Register(args) => cmd_register(&mut engine, &args, format),
        Command::Remove(args) => cmd_remove(&mut engine, &args),
        Command::Standings => cmd_standings(&engine, format),
        Command::Podium => cmd_podium(&engine, format),
        Command::Stats(args) => cmd_stats(&engine, &args, format),
        Command::Games => cmd_games(&engine, format),
        Command::Export(args) => cmd_export(&engine, args),
        Command::Reset(args) => cmd_reset(&mut engine, &args),
        Command::Watch(args) => cmd_watch(engine, &args, format).await,
    }
}

/// Print `value` as JSON, or run `text` for the human-readable form.
fn emit<T: Serialize + ?Sized>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce(),
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(),
    }
    Ok(())
}

fn cmd_record(
    engine: &mut Engine,
    args: &RecordArgs,
    format: OutputFormat,
) -> Result<(), CliError> {
    let game_type = GameTypeId::from(args.game_type.trim().to_uppercase());
    let entry = engine.record_match(&game_type, &args.result)?;

    let balance = |name: &str| engine.find_participant(name).map_or(0, |p| p.stars);
    emit(format, &entry, || {
        println!(
            "{} {} ({}): {} ({} ★) beat {} ({} ★)",
            entry.id,
            entry.game_type,
            entry.game_category,
            entry.winner,
            balance(&entry.winner),
            entry.loser,
            balance(&entry.loser),
        );
    })
}

fn cmd_register(
    engine: &mut Engine,
    args: &RegisterArgs,
    format: OutputFormat,
) -> Result<(), CliError> {
    let participant = engine.register(&args.first_name, &args.last_name, &args.birth_date)?;
    emit(format, &participant, || {
        println!(
            "Registered {} {} with {} ★",
            participant.id, participant.name, participant.stars
        );
    })
}

fn cmd_remove(engine: &mut Engine, args: &RemoveArgs) -> Result<(), CliError> {
    if !args.yes {
        return Err(CliError::Unconfirmed {
            action: "removing a participant",
        });
    }
    let removed = engine.remove(&ParticipantId::from(args.id.trim().to_uppercase()))?;
    println!("Removed {} {}", removed.id, removed.name);
    Ok(())
}

fn print_ranking(participants: &[&Participant]) {
    if participants.is_empty() {
        println!("No participants yet.");
        return;
    }
    for (rank, p) in (1_usize..).zip(participants) {
        println!("{rank:>3}. {:<28} {:>4} ★  {}", p.name, p.stars, p.id);
    }
}

fn cmd_standings(engine: &Engine, format: OutputFormat) -> Result<(), CliError> {
    let standings = engine.standings();
    emit(format, &standings, || print_ranking(&standings))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PodiumView<'a> {
    podium: Vec<&'a Participant>,
    latest_match: Option<&'a tourney_types::Match>,
}

fn cmd_podium(engine: &Engine, format: OutputFormat) -> Result<(), CliError> {
    let view = PodiumView {
        podium: engine.podium(),
        latest_match: engine.latest_match(),
    };
    emit(format, &view, || {
        print_ranking(&view.podium);
        if let Some(m) = view.latest_match {
            println!();
            println!(
                "Latest: {} {} ({}) {} > {} at {}",
                m.id, m.game_type, m.game_category, m.winner, m.loser, m.timestamp
            );
        }
    })
}

fn cmd_stats(engine: &Engine, args: &StatsArgs, format: OutputFormat) -> Result<(), CliError> {
    match args.view {
        StatsView::Games => {
            let stats = engine.game_statistics();
            emit(format, &stats, || {
                if stats.is_empty() {
                    println!("No matches recorded.");
                }
                for s in &stats {
                    println!(
                        "{:<18} {:<10} {:>4}  {:>6}%",
                        s.game_type, s.category, s.count, s.percentage.round_dp(1)
                    );
                }
            })
        }
        StatsView::Players => {
            let stats = engine.player_statistics();
            emit(format, &stats, || {
                for s in &stats {
                    println!(
                        "{:<28} {:>4} ★  {:>3}W {:>3}L  {:>6}%",
                        s.name, s.stars, s.wins, s.losses, s.win_rate.round_dp(1)
                    );
                }
            })
        }
    }
}

fn cmd_games(engine: &Engine, format: OutputFormat) -> Result<(), CliError> {
    let catalog = engine.ledger().catalog();
    emit(format, catalog, || {
        for g in catalog {
            println!("{}  {:<18} {}", g.id, g.name, g.category);
        }
    })
}

fn cmd_export(engine: &Engine, args: ExportArgs) -> Result<(), CliError> {
    let csv = engine.export_csv()?;
    let path = args
        .out
        .unwrap_or_else(|| PathBuf::from(export_file_name(Utc::now().timestamp_millis())));
    std::fs::write(&path, csv).map_err(|source| CliError::Output {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "Export written");
    println!("Exported to {}", path.display());
    Ok(())
}

fn cmd_reset(engine: &mut Engine, args: &ResetArgs) -> Result<(), CliError> {
    if !args.yes {
        return Err(CliError::Unconfirmed {
            action: "resetting the tournament",
        });
    }
    engine.reset()?;
    println!("Tournament reset.");
    Ok(())
}

/// Poll the data directory and reprint the podium whenever another view
/// writes, until interrupted.
async fn cmd_watch(
    mut engine: Engine,
    args: &WatchArgs,
    format: OutputFormat,
) -> Result<(), CliError> {
    let mut events = engine.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => debug!(?event, "Ledger event"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event listener lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    cmd_podium(&engine, format)?;
    let mut seen = engine.store().last_modified().map_err(tourney_core::EngineError::from)?;
    let mut ticker = tokio::time::interval(Duration::from_millis(args.interval_ms.max(1)));
    info!(
        data_dir = %engine.store().dir().display(),
        interval_ms = args.interval_ms,
        "Watching for changes"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Watch stopped");
                return Ok(());
            }
        }

        let modified = engine.store().last_modified().map_err(tourney_core::EngineError::from)?;
        if modified == seen {
            continue;
        }
        seen = modified;
        if engine.reload()? {
            println!();
            cmd_podium(&engine, format)?;
        }
    }
}
