use std::num::ParseIntError;

/// Rendered by the site in place of a number when a count is unavailable.
pub const PLACEHOLDER: &str = "-";

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses a plain seat count. Thousands separators are not accepted here since seat
/// tables never render them.
pub fn parse_seat_count(cell: &str) -> Result<u32, ParseIntError> {
    cell.trim().parse::<u32>()
}

/// Parses a vote count or margin: separators are stripped and the placeholder maps to 0.
pub fn parse_vote_count(cell: &str) -> Result<u64, ParseIntError> {
    let cleaned = cell.trim().replace(',', "");
    if cleaned == PLACEHOLDER {
        return Ok(0);
    }
    cleaned.parse::<u64>()
}

/// Resolves a possibly relative href against `base_url`.
pub fn resolve_url(base_url: &str, url_or_path: &str) -> String {
    if url_or_path.starts_with("http://") || url_or_path.starts_with("https://") {
        url_or_path.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            url_or_path.trim_start_matches('/')
        )
    }
}
