use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::api::{DEFAULT_API_BASE, DEFAULT_USER_AGENT, MAX_PAGE_SIZE};

pub const DEFAULT_DB_NAME: &str = "hh_database";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub api_base: String,
    pub user_agent: String,
    pub per_page: u32,
}

impl Config {
    /// Reads configuration from the process environment, after loading `.env`
    /// if one is present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = match lookup("HH_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => {
                let name = lookup("HH_DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string());
                default_data_dir().join(format!("{}.db", name))
            }
        };

        let per_page = match lookup("HH_PER_PAGE") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("HH_PER_PAGE must be a positive integer, got '{}'", raw))?
                .clamp(1, MAX_PAGE_SIZE),
            None => MAX_PAGE_SIZE,
        };

        Ok(Self {
            db_path,
            api_base: lookup("HH_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            user_agent: lookup("HH_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            per_page,
        })
    }
}

fn default_data_dir() -> PathBuf {
    // XDG data directory, or the current directory as a fallback
    match directories::ProjectDirs::from("", "", "hh-vacancies") {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => PathBuf::from("."),
    }
}
