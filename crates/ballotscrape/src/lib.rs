pub mod insights;
pub mod legacy;
mod parser;
pub mod pipeline;
pub mod scraper;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use parser::{
    CANDIDATE_TABLE_SELECTOR, Cell, PARTY_TABLE_SELECTOR, ParseError, ParsedTable, Row, RowSkip,
    SkipReason, extract_table, parse_candidates, parse_party_summary,
};
pub use pipeline::{Pipeline, PipelineOutput};
pub use scraper::{CandidateFetch, ScraperConfig, ScraperError, WebScraper};

pub(crate) const BASE_URL: &str = "https://results.eci.gov.in/PcResultGenJune2024";
pub(crate) const RESULTS_INDEX: &str = "index.htm";
