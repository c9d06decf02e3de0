//! Operator CLI for the school cup tournament engine.
//!
//! Connects to PostgreSQL, runs one engine operation and prints its result
//! as JSON on stdout. Logs go to stderr.

mod commands;
mod config;
mod logging;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Error;
use commands::Command;
use config::AdminConfig;
use cup_engine::{
    db::{Database, PgTournamentRepository},
    tournament::{TournamentError, TournamentManager},
};
use pico_args::Arguments;

const MIGRATION: &str = include_str!("../../migrations/001_initial_schema.sql");

const HELP: &str = "\
Schedule group stages, record results and seed brackets for a school cup

USAGE:
  cup_admin [OPTIONS] <COMMAND> [ARGS]

COMMANDS:
  migrate                                           Create the database schema
  fixtures  --group ID                              Preview a group's ordered round-robin
  schedule  --group ID                              Save the schedule of one group
  schedule  --tournament ID --modality ID --gender G
                                                    Save the schedules of a category, interleaved
  standings --scope tournament=ID[,modality=ID,gender=G,group=ID,teams=ID;ID]
                                                    Print a ranked table
  start     --match ID                              Mark a match as in progress
  result    --match ID --score H-A [--penalties H-A]
                                                    Finalize a match
  forfeit   --match ID --team ID                    Forfeit a match and the team's pending matches
  bracket   --tournament ID --modality ID --gender G [--phase PHASE]
                                                    Seed an elimination phase (replaces previous seeding)

OPTIONS:
  --db-url        URL   Database connection string  [default: env DATABASE_URL]
  --slot-minutes  N     Minutes between match slots [default: env SLOT_INTERVAL_MINUTES or 60]

FLAGS:
  -h, --help            Print help information

ENVIRONMENT:
  DATABASE_URL          PostgreSQL connection string
  POINTS_WIN, POINTS_DRAW, POINTS_LOSS
  RETRY_MAX_ATTEMPTS, RETRY_BASE_DELAY_MS, RETRY_MAX_DELAY_MS
  RUST_LOG              Log filter [default: info,sqlx=warn]
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;
    let slot_minutes: Option<i64> = pargs.opt_value_from_str("--slot-minutes")?;
    let command = Command::parse(pargs)?;

    logging::init();

    let config = AdminConfig::from_env(database_url, slot_minutes)?;
    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
    tracing::debug!("Database connected");

    if command == Command::Migrate {
        sqlx::raw_sql(MIGRATION).execute(db.pool()).await?;
        tracing::info!("Schema applied");
        db.close().await;
        return Ok(());
    }

    let repo = Arc::new(PgTournamentRepository::new(db.pool().clone()));
    let manager = TournamentManager::new(repo.clone(), config.engine);

    let name = command.name();
    let started = Instant::now();
    let outcome = commands::run(command, &manager, repo.as_ref()).await;
    logging::log_command(name, started.elapsed().as_millis() as u64, outcome.is_ok());
    db.close().await;

    match outcome {
        Ok(json) => {
            println!("{json}");
            Ok(())
        }
        Err(e) => match e.downcast_ref::<TournamentError>() {
            Some(engine_err) => {
                tracing::error!(kind = ?engine_err.kind(), "{engine_err}");
                Err(anyhow::anyhow!(engine_err.client_message()))
            }
            None => Err(e),
        },
    }
}
