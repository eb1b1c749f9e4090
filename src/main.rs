mod api;
mod config;
mod db;
mod import;
mod menu;
mod models;
mod telemetry;

use anyhow::{anyhow, Result};
use api::HhClient;
use clap::{Parser, Subcommand};
use config::Config;
use db::Database;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "hh-vacancies")]
#[command(about = "Import employers and vacancies from hh.ru and query salary statistics")]
struct Cli {
    /// Database file (overrides HH_DB_PATH / HH_DB_NAME)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database tables
    Init,

    /// Import employers and all of their vacancies
    Import {
        /// Comma-separated hh.ru employer IDs, e.g. 1740,3529
        ids: String,
    },

    /// Vacancy count per employer
    Counts,

    /// List all stored vacancies
    List,

    /// Average salary across vacancies with salary data
    Average,

    /// Vacancies paying more than the average
    AboveAverage,

    /// Interactive menu (default when no command is given)
    Menu,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init()?;

    let mut config = Config::from_env()?;
    if let Some(path) = cli.db {
        config.db_path = path;
    }

    let db = match Database::open(&config.db_path) {
        Ok(db) => db,
        Err(err) => {
            error!(path = %config.db_path.display(), "could not open database: {:#}", err);
            return Ok(());
        }
    };

    let mut out = io::stdout().lock();

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Init => {
            db.init()?;
            writeln!(out, "Database initialized at {}", config.db_path.display())?;
        }

        Commands::Import { ids } => {
            db.init()?;
            let ids = import::parse_employer_ids(&ids);
            if ids.is_empty() {
                return Err(anyhow!("No valid employer IDs given"));
            }
            let client = HhClient::connect(&config.api_base, &config.user_agent)?;
            let report = import::import_employers(&client, &db, &ids, config.per_page)?;
            menu::write_import_report(&mut out, &report)?;
            writeln!(
                out,
                "Database now holds {} employers and {} vacancies.",
                db.employer_count()?,
                db.vacancy_count()?
            )?;
        }

        Commands::Counts => {
            db.ensure_initialized()?;
            menu::write_counts(&mut out, &db)?;
        }

        Commands::List => {
            db.ensure_initialized()?;
            menu::write_vacancies(&mut out, &db.list_all_vacancies()?)?;
        }

        Commands::Average => {
            db.ensure_initialized()?;
            menu::write_average(&mut out, &db)?;
        }

        Commands::AboveAverage => {
            db.ensure_initialized()?;
            menu::write_above_average(&mut out, &db)?;
        }

        Commands::Menu => {
            db.init()?;
            info!(path = %config.db_path.display(), "database ready");
            let client = HhClient::connect(&config.api_base, &config.user_agent)?;
            let mut input = io::stdin().lock();
            menu::run(&mut input, &mut out, &client, &db, config.per_page)?;
        }
    }

    Ok(())
}
