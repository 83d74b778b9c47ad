//! Command-line entry point for the enrichment core.
//!
//! # Responsibility
//! - Wire config, logging, storage and the notes service the way an embedding
//!   application does.
//! - Print the enriched snapshot, or a search over it, as JSON lines.

use clap::Parser;
use featnote_core::{
    core_version, init_from_config, open_db, CoreConfig, FeatureRegistry, NotesService,
    SearchQuery, SqliteNoteRepository, SqlitePreferencesRepository, SqlitePropertyRepository,
};
use log::info;
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "featnote",
    version,
    about = "Print enriched notes as JSON lines, optionally filtered"
)]
struct Cli {
    /// Case-insensitive text matched against title and content
    text: Vec<String>,

    /// Exact attribute filter, repeatable
    #[arg(long = "filter", value_name = "FEATURE=VALUE", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    let (feature_id, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("malformed filter `{raw}`; expected FEATURE=VALUE"))?;
    if feature_id.trim().is_empty() {
        return Err(format!("malformed filter `{raw}`; feature id is empty"));
    }
    Ok((feature_id.trim().to_string(), value.to_string()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("featnote: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env()?;
    init_from_config(&config)?;
    info!(
        "event=cli_start module=cli status=ok version={}",
        core_version()
    );

    let conn = open_db(&config.db_path)?;
    let registry = Arc::new(FeatureRegistry::with_builtin_features());
    let mut service = NotesService::new(
        Arc::clone(&registry),
        SqliteNoteRepository::new(&conn),
        SqlitePropertyRepository::new(&conn),
        SqlitePreferencesRepository::new(&conn),
        config.preferences_debounce,
    );
    service.load_notes()?;

    let mut query = SearchQuery::new(cli.text.join(" "));
    for (feature_id, raw) in cli.filters {
        let definition = registry
            .get(&feature_id)
            .ok_or_else(|| format!("unknown feature `{feature_id}`"))?;
        let value = definition.filter_value(&raw)?;
        query = query.with_filter(feature_id, value);
    }

    let notes = service.search(&query);
    for enriched in &notes {
        println!("{}", serde_json::to_string(enriched)?);
    }
    info!(
        "event=cli_done module=cli status=ok printed={}",
        notes.len()
    );
    Ok(())
}
