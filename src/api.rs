use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{EmployerData, SalaryData, VacancyData, VacancyPage};

pub const DEFAULT_API_BASE: &str = "https://api.hh.ru";
pub const DEFAULT_USER_AGENT: &str = "hh-vacancies/0.1 (vacancy import tool)";
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered with status {0}")]
    Status(u16),
    #[error("could not decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Outcome of a single API request. Callers decide what a non-`Found` result
/// means; the import path treats both as "no data".
#[derive(Debug)]
pub enum Fetch<T> {
    Found(T),
    NotFound,
    Failed(ApiError),
}

impl<T> Fetch<T> {
    fn and_then<U>(self, f: impl FnOnce(T) -> Fetch<U>) -> Fetch<U> {
        match self {
            Fetch::Found(value) => f(value),
            Fetch::NotFound => Fetch::NotFound,
            Fetch::Failed(err) => Fetch::Failed(err),
        }
    }
}

// --- Transport trait ---

pub trait Transport {
    /// Issues a GET for `path` (relative to the API base) and returns the body.
    fn get(&self, path: &str, query: &[(&str, String)]) -> Fetch<String>;
}

pub struct HttpTransport {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str, query: &[(&str, String)]) -> Fetch<String> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?query, "GET");

        let response = match self.client.get(&url).query(query).send() {
            Ok(response) => response,
            Err(err) => return Fetch::Failed(ApiError::Transport(err)),
        };

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Fetch::NotFound;
        }
        if !status.is_success() {
            return Fetch::Failed(ApiError::Status(status.as_u16()));
        }

        match response.text() {
            Ok(body) => Fetch::Found(body),
            Err(err) => Fetch::Failed(ApiError::Transport(err)),
        }
    }
}

// --- Client ---

pub struct HhClient<T: Transport> {
    transport: T,
}

impl HhClient<HttpTransport> {
    pub fn connect(base_url: &str, user_agent: &str) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(base_url, user_agent)?))
    }
}

impl<T: Transport> HhClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    fn get_json<D: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Fetch<D> {
        self.transport
            .get(path, query)
            .and_then(|body| match serde_json::from_str(&body) {
                Ok(value) => Fetch::Found(value),
                Err(err) => Fetch::Failed(ApiError::Decode(err)),
            })
    }

    pub fn fetch_employer(&self, id: &str) -> Fetch<EmployerData> {
        self.get_json(&format!("/employers/{}", id), &[])
    }

    /// Looks up each ID in turn. IDs that are unknown or fail are skipped.
    pub fn fetch_employers(&self, ids: &[String]) -> Vec<EmployerData> {
        let mut employers = Vec::new();
        for id in ids {
            match self.fetch_employer(id) {
                Fetch::Found(employer) => employers.push(employer),
                Fetch::NotFound => warn!(employer_id = %id, "employer not found, skipping"),
                Fetch::Failed(err) => warn!(employer_id = %id, error = %err, "employer lookup failed, skipping"),
            }
        }
        employers
    }

    /// Collects every vacancy page for an employer, starting at page 0.
    ///
    /// Stops after the last page the server reports, or at the first page that
    /// does not come back successfully. Items keep page order, then the
    /// server's order within each page.
    pub fn fetch_vacancies(&self, employer_id: &str, page_size: u32) -> Vec<VacancyData> {
        let per_page = page_size.clamp(1, MAX_PAGE_SIZE);
        let mut vacancies = Vec::new();
        let mut page: i64 = 0;

        loop {
            let query = [
                ("employer_id", employer_id.to_string()),
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ];
            let data: VacancyPage = match self.get_json("/vacancies", &query) {
                Fetch::Found(data) => data,
                Fetch::NotFound => {
                    warn!(%employer_id, page, "vacancy page not found, stopping");
                    break;
                }
                Fetch::Failed(err) => {
                    warn!(%employer_id, page, error = %err, "vacancy page failed, stopping");
                    break;
                }
            };

            debug!(%employer_id, page, items = data.items.len(), pages = data.pages, "fetched vacancy page");
            vacancies.extend(data.items);

            if page + 1 >= data.pages {
                break;
            }
            page += 1;
        }

        vacancies
    }
}

/// Splits a salary object into (from, to, currency).
pub fn parse_salary(salary: Option<&SalaryData>) -> (Option<i64>, Option<i64>, Option<String>) {
    match salary {
        None => (None, None, None),
        Some(s) => (s.from, s.to, s.currency.clone()),
    }
}
