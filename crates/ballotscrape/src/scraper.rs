use crate::parser::{ParseError, ParsedTable, RowSkip, parse_candidates, parse_party_summary};
use crate::types::{CandidateRecord, PartySummary};
use crate::utils::resolve_url;

use reqwest::Client;
use std::time::Duration;

/// The results site turns away clients that don't look like a browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    FetchError(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Relative detail links are resolved against this.
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: crate::BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome of fetching one party's detail page. Only the summary fetch is allowed to
/// fail a run, so this never surfaces as an `Err`.
#[derive(Debug)]
pub enum CandidateFetch {
    Found {
        records: Vec<CandidateRecord>,
        skipped: Vec<RowSkip>,
    },
    /// The table was there but yielded no usable rows.
    Empty { skipped: Vec<RowSkip> },
    Failed { url: String, error: ScraperError },
}

impl CandidateFetch {
    fn from_table(table: ParsedTable<CandidateRecord>) -> Self {
        if table.records.is_empty() {
            CandidateFetch::Empty {
                skipped: table.skipped,
            }
        } else {
            CandidateFetch::Found {
                records: table.records,
                skipped: table.skipped,
            }
        }
    }

    pub fn records(&self) -> &[CandidateRecord] {
        match self {
            CandidateFetch::Found { records, .. } => records,
            CandidateFetch::Empty { .. } | CandidateFetch::Failed { .. } => &[],
        }
    }

    /// Rows dropped from the detail table. A failed fetch never got that far.
    pub fn skipped(&self) -> &[RowSkip] {
        match self {
            CandidateFetch::Found { skipped, .. } | CandidateFetch::Empty { skipped } => skipped,
            CandidateFetch::Failed { .. } => &[],
        }
    }

    pub fn into_records(self) -> Vec<CandidateRecord> {
        match self {
            CandidateFetch::Found { records, .. } => records,
            CandidateFetch::Empty { .. } | CandidateFetch::Failed { .. } => Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CandidateFetch::Failed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    base_url: String,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        Self::with_config(ScraperConfig::default())
    }

    pub fn with_config(config: ScraperConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    pub fn resolve(&self, url_or_path: &str) -> String {
        resolve_url(&self.base_url, url_or_path)
    }

    /// Fetches and parses the summary table. Rows that failed to parse are returned
    /// alongside the parties in `skipped`.
    pub async fn fetch_party_summary(
        &self,
        url_or_path: &str,
    ) -> Result<ParsedTable<PartySummary>, ScraperError> {
        let url = self.resolve(url_or_path);
        log::info!("Fetching party summary from {}...", url);

        let html = self.get_html(&url).await?;
        let parsed = parse_party_summary(&html)?;
        log_skipped(&url, &parsed);

        log::info!("Parsed {} parties", parsed.records.len());
        Ok(parsed)
    }

    pub async fn fetch_candidates(&self, url_or_path: &str, party_name: &str) -> CandidateFetch {
        let url = self.resolve(url_or_path);
        log::info!("Fetching candidates for party {} from {}", party_name, url);

        match self.try_fetch_candidates(&url, party_name).await {
            Ok(parsed) => {
                if parsed.records.is_empty() {
                    log::warn!("No data found in the table for URL: {}", url);
                }
                CandidateFetch::from_table(parsed)
            }
            Err(error) => {
                log::warn!("Failed to fetch candidates from {}: {}", url, error);
                CandidateFetch::Failed { url, error }
            }
        }
    }

    async fn try_fetch_candidates(
        &self,
        url: &str,
        party_name: &str,
    ) -> Result<ParsedTable<CandidateRecord>, ScraperError> {
        let html = self.get_html(url).await?;
        let parsed = parse_candidates(&html, party_name)?;
        log_skipped(url, &parsed);
        Ok(parsed)
    }

    async fn get_html(&self, url: &str) -> Result<String, ScraperError> {
        Ok(self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?)
    }
}

fn log_skipped<T>(url: &str, parsed: &ParsedTable<T>) {
    if !parsed.skipped.is_empty() {
        log::warn!("Skipped {} malformed row(s) on {}", parsed.skipped.len(), url);
    }
}
