use std::fmt::Display;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::types::{CandidateRecord, PartySummary};
use crate::utils::{normalize_whitespace, parse_seat_count, parse_vote_count};

pub const PARTY_TABLE_SELECTOR: &str = "table.table";
pub const CANDIDATE_TABLE_SELECTOR: &str = "table.table-striped";

const CANDIDATE_MIN_ROW_WIDTH: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("No table matching '{0}' found on the page")]
    TableNotFound(String),
    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),
}

static ROW_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("invalid selector: tr"));

static CELL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("invalid selector: td"));

static LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("invalid selector: a[href]"));

/// A single `<td>`: its trimmed text and the first anchor href inside it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub link: Option<String>,
}

impl Cell {
    fn from_element(element: ElementRef) -> Self {
        let text = normalize_whitespace(&element.text().collect::<String>());
        let link = element
            .select(&LINK_SEL)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| href.trim().to_string());
        Self { text, link }
    }
}

pub type Row = Vec<Cell>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    CellCount { found: usize },
    InvalidNumber { column: &'static str, value: String },
    MissingLink,
    SeatsInconsistent { won: u32, total: u32 },
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::CellCount { found } => write!(f, "unexpected cell count {}", found),
            SkipReason::InvalidNumber { column, value } => {
                write!(f, "invalid number in '{}': {:?}", column, value)
            }
            SkipReason::MissingLink => write!(f, "no detail link in the 'won' cell"),
            SkipReason::SeatsInconsistent { won, total } => {
                write!(f, "total seats {} below seats won {}", total, won)
            }
        }
    }
}

/// A data row that was dropped while parsing. `row` is the index among data rows,
/// header excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowSkip {
    pub row: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedTable<T> {
    pub records: Vec<T>,
    pub skipped: Vec<RowSkip>,
}

impl<T> ParsedTable<T> {
    fn from_rows<F>(rows: Vec<Row>, mut parse_row: F) -> Self
    where
        F: FnMut(&[Cell]) -> Result<T, SkipReason>,
    {
        let mut records = Vec::new();
        let mut skipped = Vec::new();

        for (row, cells) in rows.iter().enumerate() {
            match parse_row(cells) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    log::debug!("Skipping row {}: {}", row, reason);
                    skipped.push(RowSkip { row, reason });
                }
            }
        }

        Self { records, skipped }
    }
}

/// Yields every row of the first table matching `selector`, header row excluded.
pub fn extract_table(html: &str, selector: &str) -> Result<Vec<Row>, ParseError> {
    let table_sel = Selector::parse(selector)
        .map_err(|e| ParseError::InvalidSelector(format!("{selector}: {e}")))?;

    let document = Html::parse_document(html);
    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| ParseError::TableNotFound(selector.to_string()))?;

    let rows = table
        .select(&ROW_SEL)
        .skip(1)
        .map(|tr| tr.select(&CELL_SEL).map(Cell::from_element).collect())
        .collect();

    Ok(rows)
}

fn seat_cell(cell: &Cell, column: &'static str) -> Result<u32, SkipReason> {
    parse_seat_count(&cell.text).map_err(|_| SkipReason::InvalidNumber {
        column,
        value: cell.text.clone(),
    })
}

fn vote_cell(cell: &Cell, column: &'static str) -> Result<u64, SkipReason> {
    parse_vote_count(&cell.text).map_err(|_| SkipReason::InvalidNumber {
        column,
        value: cell.text.clone(),
    })
}

fn parse_party_row(cells: &[Cell]) -> Result<PartySummary, SkipReason> {
    let [name, won, leading, total] = cells else {
        return Err(SkipReason::CellCount { found: cells.len() });
    };

    let seats_won = seat_cell(won, "won")?;
    let seats_leading = seat_cell(leading, "leading")?;
    let seats_total = seat_cell(total, "total")?;
    let detail_link = won.link.clone().ok_or(SkipReason::MissingLink)?;

    if seats_total < seats_won {
        return Err(SkipReason::SeatsInconsistent {
            won: seats_won,
            total: seats_total,
        });
    }

    Ok(PartySummary {
        party_name: name.text.clone(),
        seats_won,
        seats_leading,
        seats_total,
        detail_link,
    })
}

pub fn parse_party_summary(html: &str) -> Result<ParsedTable<PartySummary>, ParseError> {
    let rows = extract_table(html, PARTY_TABLE_SELECTOR)?;
    Ok(ParsedTable::from_rows(rows, parse_party_row))
}

pub fn parse_candidates(
    html: &str,
    party_name: &str,
) -> Result<ParsedTable<CandidateRecord>, ParseError> {
    let rows = extract_table(html, CANDIDATE_TABLE_SELECTOR)?;
    Ok(ParsedTable::from_rows(rows, |cells| {
        if cells.len() < CANDIDATE_MIN_ROW_WIDTH {
            return Err(SkipReason::CellCount { found: cells.len() });
        }

        Ok(CandidateRecord {
            serial: cells[0].text.clone(),
            constituency: cells[1].text.clone(),
            candidate_name: cells[2].text.clone(),
            total_votes: vote_cell(&cells[3], "total votes")?,
            margin: vote_cell(&cells[4], "margin")?,
            party_name: party_name.to_string(),
        })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_extract_table_missing() {
        let html = "<html><body><p>Results will be published soon</p></body></html>";
        let err = extract_table(html, PARTY_TABLE_SELECTOR).unwrap_err();
        assert!(matches!(err, ParseError::TableNotFound(ref s) if s == "table.table"));
    }

    #[test]
    fn test_extract_table_invalid_selector() {
        let err = extract_table("<table></table>", "table[").unwrap_err();
        assert!(matches!(err, ParseError::InvalidSelector(_)));
    }

    #[test]
    fn test_extract_table_skips_header_and_trims() {
        let html = r#"
            <table class="results">
              <tr><th>Name</th><th>Seats</th></tr>
              <tr><td>  Alpha
                 Party </td><td><a href=" alpha.htm ">3</a></td></tr>
              <tr><td>Beta</td><td>1</td></tr>
            </table>"#;

        let rows = extract_table(html, "table.results").expect("table should be found");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0].text, "Alpha Party");
        assert_eq!(rows[0][1].text, "3");
        assert_eq!(rows[0][1].link.as_deref(), Some("alpha.htm"));
        assert_eq!(rows[1][1].link, None);
    }

    #[test]
    fn test_parse_party_summary_from_fixture() {
        let html = fs::read_to_string("fixtures/party_summary.html")
            .expect("Failed to read fixture");

        let parsed = parse_party_summary(&html).expect("Failed to parse party summary");

        assert_eq!(parsed.records.len(), 5);
        let bjp = &parsed.records[0];
        assert_eq!(bjp.party_name, "Bharatiya Janata Party - BJP");
        assert_eq!(bjp.seats_won, 240);
        assert_eq!(bjp.seats_leading, 0);
        assert_eq!(bjp.seats_total, 240);
        assert_eq!(bjp.detail_link, "partywisewinresult-369S.htm");

        assert!(
            parsed
                .records
                .iter()
                .all(|p| p.seats_total >= p.seats_won),
            "Parsed rows must never report fewer total seats than won seats"
        );

        let names: Vec<_> = parsed.records.iter().map(|p| p.party_name.as_str()).collect();
        assert!(names.contains(&"Independent - IND"));
        assert!(!names.contains(&"Total"), "Totals row has no link and is skipped");
    }

    #[test]
    fn test_parse_party_summary_counts_skipped_rows() {
        let html = fs::read_to_string("fixtures/party_summary.html")
            .expect("Failed to read fixture");

        let parsed = parse_party_summary(&html).expect("Failed to parse party summary");

        assert_eq!(parsed.skipped.len(), 4);
        assert!(parsed.skipped.iter().any(|s| s.reason == SkipReason::MissingLink));
        assert!(
            parsed
                .skipped
                .iter()
                .any(|s| s.reason == SkipReason::CellCount { found: 3 })
        );
        assert!(parsed.skipped.iter().any(|s| matches!(
            s.reason,
            SkipReason::InvalidNumber { column: "won", .. }
        )));
        assert!(
            parsed
                .skipped
                .iter()
                .any(|s| s.reason == SkipReason::SeatsInconsistent { won: 5, total: 4 })
        );
    }

    #[test]
    fn test_parse_party_summary_missing_table() {
        let err = parse_party_summary("<html><body></body></html>").unwrap_err();
        assert!(matches!(err, ParseError::TableNotFound(_)));
    }

    #[test]
    fn test_parse_candidates_from_fixture() {
        let html = fs::read_to_string("fixtures/party_candidates.html")
            .expect("Failed to read fixture");

        let parsed = parse_candidates(&html, "Bharatiya Janata Party - BJP")
            .expect("Failed to parse candidates");

        assert_eq!(parsed.records.len(), 4);
        let first = &parsed.records[0];
        assert_eq!(first.serial, "1");
        assert_eq!(first.constituency, "Gandhinagar(6)");
        assert_eq!(first.candidate_name, "AMIT SHAH");
        assert_eq!(first.total_votes, 1010972);
        assert_eq!(first.margin, 744716);
        assert!(
            parsed
                .records
                .iter()
                .all(|c| c.party_name == "Bharatiya Janata Party - BJP")
        );
    }

    #[test]
    fn test_parse_candidates_placeholder_maps_to_zero() {
        let html = r#"
            <table class="table table-striped table-bordered">
              <thead><tr><th>S.No</th><th>Constituency</th><th>Winning Candidate</th><th>Total Votes</th><th>Margin</th></tr></thead>
              <tbody><tr><td>7</td><td>Surat(24)</td><td>MUKESH KUMAR CHANDRAKAANT DALAL</td><td>-</td><td>-</td></tr></tbody>
            </table>"#;

        let parsed = parse_candidates(html, "Bharatiya Janata Party - BJP").unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert!(parsed.skipped.is_empty());
        assert_eq!(parsed.records[0].total_votes, 0);
        assert_eq!(parsed.records[0].margin, 0);
    }

    #[test]
    fn test_parse_candidates_skips_bad_rows_only() {
        let html = fs::read_to_string("fixtures/party_candidates.html")
            .expect("Failed to read fixture");

        let parsed = parse_candidates(&html, "Bharatiya Janata Party - BJP").unwrap();

        assert_eq!(parsed.skipped.len(), 2);
        assert!(parsed.skipped.iter().any(|s| matches!(
            s.reason,
            SkipReason::InvalidNumber { column: "total votes", .. }
        )));
        assert!(
            parsed
                .skipped
                .iter()
                .any(|s| s.reason == SkipReason::CellCount { found: 1 })
        );
    }

    #[test]
    fn test_parse_candidates_empty_table() {
        let html = r#"<table class="table-striped"><tr><th>S.No</th></tr></table>"#;
        let parsed = parse_candidates(html, "Nobody").unwrap();
        assert!(parsed.records.is_empty());
        assert!(parsed.skipped.is_empty());
    }
}
