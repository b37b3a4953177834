use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::insights::InsightReport;
use crate::parser::RowSkip;
use crate::scraper::{CandidateFetch, ScraperError, WebScraper};
use crate::types::Dataset;

/// A party whose detail page could not be fetched or parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyFailure {
    pub party_name: String,
    pub url: String,
    pub reason: String,
}

/// Rows dropped from one party's detail table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartySkips {
    pub party_name: String,
    pub skipped: Vec<RowSkip>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub fetched_at: DateTime<Utc>,
    pub dataset: Dataset,
    /// Rows of the summary table that did not parse into a party.
    pub summary_skipped: Vec<RowSkip>,
    /// Only parties with at least one dropped row are listed.
    pub candidate_skipped: Vec<PartySkips>,
    pub failures: Vec<PartyFailure>,
    /// Parties whose detail table came back without any usable rows.
    pub empty_parties: Vec<String>,
    pub report: InsightReport,
    /// Set when the run stopped before visiting every party.
    pub cancelled: bool,
}

impl PipelineOutput {
    /// Rows dropped across the summary and every detail table.
    pub fn skipped_rows(&self) -> usize {
        self.summary_skipped.len()
            + self
                .candidate_skipped
                .iter()
                .map(|p| p.skipped.len())
                .sum::<usize>()
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    scraper: WebScraper,
    summary_path: String,
}

impl Pipeline {
    pub fn new(scraper: WebScraper) -> Self {
        Self {
            scraper,
            summary_path: crate::RESULTS_INDEX.to_string(),
        }
    }

    /// Overrides the page holding the party summary table.
    pub fn with_summary_path(mut self, url_or_path: &str) -> Self {
        self.summary_path = url_or_path.to_string();
        self
    }

    /// Fetches the summary, then each party's candidates in order, then computes every
    /// insight. Only a failed summary fetch is returned as an error.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<PipelineOutput, ScraperError> {
        let fetched_at = Utc::now();
        let summary = self.scraper.fetch_party_summary(&self.summary_path).await?;
        let parties = summary.records;

        let mut candidates = Vec::new();
        let mut candidate_skipped = Vec::new();
        let mut failures = Vec::new();
        let mut empty_parties = Vec::new();
        let mut cancelled = false;

        for party in &parties {
            if cancel.is_cancelled() {
                log::warn!(
                    "Run cancelled, skipping remaining parties from {}",
                    party.party_name
                );
                cancelled = true;
                break;
            }

            let fetch = self
                .scraper
                .fetch_candidates(&party.detail_link, &party.party_name)
                .await;

            if !fetch.skipped().is_empty() {
                candidate_skipped.push(PartySkips {
                    party_name: party.party_name.clone(),
                    skipped: fetch.skipped().to_vec(),
                });
            }

            match fetch {
                CandidateFetch::Found { records, .. } => candidates.extend(records),
                CandidateFetch::Empty { .. } => empty_parties.push(party.party_name.clone()),
                CandidateFetch::Failed { url, error } => failures.push(PartyFailure {
                    party_name: party.party_name.clone(),
                    url,
                    reason: error.to_string(),
                }),
            }
        }

        if candidates.is_empty() {
            log::warn!(
                "No candidate data could be scraped. Please check the website structure and URLs."
            );
        }

        let dataset = Dataset::new(parties, candidates);
        let report = InsightReport::compute(&dataset);

        Ok(PipelineOutput {
            fetched_at,
            dataset,
            summary_skipped: summary.skipped,
            candidate_skipped,
            failures,
            empty_parties,
            report,
            cancelled,
        })
    }
}
