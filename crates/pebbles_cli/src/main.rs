//! CLI health probe.
//!
//! # Responsibility
//! - Load `PEBBLES_*` configuration and start file logging when configured.
//! - Open (and migrate) the configured database, then report its state.
//!
//! Exits non-zero when configuration, logging or the database fails.

use log::info;
use pebbles_core::db::migrations::current_user_version;
use pebbles_core::db::open_db;
use pebbles_core::{
    init_logging, Collection, DocumentStore, Filter, PebblesConfig, SqliteDocumentStore,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("pebbles_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = PebblesConfig::from_env()?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let conn = open_db(&config.db_path)?;
    let store = SqliteDocumentStore::try_new(&conn)?;
    let documents = [Collection::Pebbles, Collection::Folders]
        .into_iter()
        .map(|collection| {
            store
                .count(collection, &Filter::new())
                .map(|count| (collection, count))
        })
        .collect::<Result<Vec<_>, _>>()?;

    println!("pebbles_core ping={}", pebbles_core::ping());
    println!("pebbles_core version={}", pebbles_core::core_version());
    println!("db path={}", config.db_path.display());
    println!("db schema_version={}", current_user_version(&conn)?);
    for (collection, count) in documents {
        println!("db documents.{}={count}", collection.as_str());
    }
    info!("event=cli_probe module=cli status=ok");
    Ok(())
}
