//! AegisCare ingest
//!
//! Ingests one patient CSV file into the database.
//! Usage: aegiscare <file.csv> [user_id]

use std::path::Path;

use tracing_subscriber::EnvFilter;

use aegiscare::config::{self, IngestConfig};
use aegiscare::db::{self, Database};
use aegiscare::ingest;
use aegiscare::models::{Observation, Patient};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("aegiscare=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    aegiscare::build_info::print_startup_banner();

    let args: Vec<String> = std::env::args().collect();
    let Some(csv_path) = args.get(1) else {
        eprintln!("Usage: {} <file.csv> [user_id]", args[0]);
        std::process::exit(2);
    };
    let user_id: i64 = match args.get(2) {
        Some(s) => s.parse()?,
        None => 0,
    };

    let config = IngestConfig::from_env()?;
    let db_path = config::database_path();
    eprintln!("Database path: {}", db_path.display());

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = Database::new(&db_path)?;
    database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    let bytes = std::fs::read(csv_path)?;
    let filename = Path::new(csv_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| csv_path.clone());

    let summary = ingest::ingest_csv(&database, user_id, &filename, &bytes, &config)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    let (patients, observations) = database.with_conn(|conn| {
        Ok((Patient::count(conn)?, Observation::count(conn)?))
    })?;
    eprintln!("Totals: {} patients, {} observations", patients, observations);

    Ok(())
}
