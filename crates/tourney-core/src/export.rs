//! CSV export of the whole tournament.
//!
//! The export is one text document with three labeled sections, separated
//! by a blank line:
//!
//! ```text
//! PARTICIPANTES
//! ID,Nome,Sobrenome,Data_Nascimento,Estrelas
//! ...
//!
//! JOGOS
//! ID_Jogo,Modalidade,Categoria,Vencedor,Perdedor,Data_Hora
//! ...
//!
//! MODALIDADES
//! ID_Modalidade,Nome,Categoria
//! ...
//! ```
//!
//! Fields containing commas or quotes are quoted by the `csv` writer.

use tourney_ledger::StarLedger;

/// Header row of the participant section.
pub const PARTICIPANT_HEADER: [&str; 5] =
    ["ID", "Nome", "Sobrenome", "Data_Nascimento", "Estrelas"];

/// Header row of the match section.
pub const MATCH_HEADER: [&str; 6] = [
    "ID_Jogo",
    "Modalidade",
    "Categoria",
    "Vencedor",
    "Perdedor",
    "Data_Hora",
];

/// Header row of the game type section.
pub const GAME_TYPE_HEADER: [&str; 3] = ["ID_Modalidade", "Nome", "Categoria"];

/// Errors that can occur while building the export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// A record could not be written.
    #[error("failed to write CSV record: {source}")]
    Csv {
        /// The underlying CSV error.
        #[from]
        source: csv::Error,
    },

    /// The writer could not be flushed into its buffer.
    #[error("failed to flush CSV section: {message}")]
    Flush {
        /// Description of the failure.
        message: String,
    },

    /// The output was not valid UTF-8.
    #[error("CSV output is not UTF-8: {source}")]
    Utf8 {
        /// The underlying conversion error.
        #[from]
        source: std::string::FromUtf8Error,
    },
}

/// Suggested file name for an export taken at `unix_millis`.
pub fn export_file_name(unix_millis: i64) -> String {
    format!("campeonato_{unix_millis}.csv")
}

/// Render the full export. The bank is not exported.
///
/// # Errors
///
/// Returns [`ExportError`] if the CSV writer fails.
pub fn export_csv(ledger: &StarLedger) -> Result<String, ExportError> {
    let participants = section(
        "PARTICIPANTES",
        &PARTICIPANT_HEADER,
        ledger
            .registry()
            .participants()
            .iter()
            .filter(|p| !p.is_bank())
            .map(|p| {
                vec![
                    p.id.to_string(),
                    p.first_name.clone(),
                    p.last_name.clone(),
                    p.birth_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
                    p.stars.to_string(),
                ]
            }),
    )?;

    let matches = section(
        "JOGOS",
        &MATCH_HEADER,
        ledger.log().matches().iter().map(|m| {
            vec![
                m.id.to_string(),
                m.game_type.clone(),
                m.game_category.clone(),
                m.winner.clone(),
                m.loser.clone(),
                m.timestamp.clone(),
            ]
        }),
    )?;

    let game_types = section(
        "MODALIDADES",
        &GAME_TYPE_HEADER,
        ledger
            .catalog()
            .iter()
            .map(|g| vec![g.id.to_string(), g.name.clone(), g.category.clone()]),
    )?;

    Ok([participants, matches, game_types].join("\n\n"))
}

/// Render one labeled section without a trailing newline.
fn section(
    label: &str,
    header: &[&str],
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }

    let bytes = writer.into_inner().map_err(|e| ExportError::Flush {
        message: e.to_string(),
    })?;
    let body = String::from_utf8(bytes)?;
    Ok(format!("{label}\n{}", body.trim_end_matches('\n')))
}
