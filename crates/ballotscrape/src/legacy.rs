//! Analysis over a flat table of per-candidate constituency results.
//!
//! Rows must already be sorted by constituency and then by descending votes. Nothing
//! here re-sorts them: the vote margin of a row is measured against the row right
//! after it, so an unsorted table yields margins between unrelated candidates.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::num::ParseIntError;

use serde::{Deserialize, Serialize};

use crate::insights::InsightError;

/// Margins above this count as a comfortable win.
pub const WIDE_MARGIN: i64 = 10_000;

const TOP_PARTY_LIMIT: usize = 5;

#[derive(Debug, thiserror::Error)]
#[error("Invalid vote count '{raw}' for {candidate}")]
pub struct VoteParseError {
    pub candidate: String,
    pub raw: String,
    #[source]
    pub source: ParseIntError,
}

/// A row as exported, with the vote count still formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConstituencyResult {
    pub constituency: String,
    pub candidate: String,
    pub party: String,
    pub votes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstituencyResult {
    pub constituency: String,
    pub candidate: String,
    pub party: String,
    pub votes: u64,
}

impl TryFrom<RawConstituencyResult> for ConstituencyResult {
    type Error = VoteParseError;

    fn try_from(raw: RawConstituencyResult) -> Result<Self, Self::Error> {
        let votes = clean_votes(&raw.votes).map_err(|source| VoteParseError {
            candidate: raw.candidate.clone(),
            raw: raw.votes.clone(),
            source,
        })?;

        Ok(Self {
            constituency: raw.constituency,
            candidate: raw.candidate,
            party: raw.party,
            votes,
        })
    }
}

/// Strips thousands separators. Unlike the detail pages, this table has no placeholder.
pub fn clean_votes(raw: &str) -> Result<u64, ParseIntError> {
    raw.trim().replace(',', "").parse::<u64>()
}

pub fn clean_rows(
    rows: Vec<RawConstituencyResult>,
) -> Result<Vec<ConstituencyResult>, VoteParseError> {
    rows.into_iter().map(ConstituencyResult::try_from).collect()
}

/// `votes[i] - votes[i + 1]` for each row. `None` for the last row, which has no
/// successor, and for counts whose difference does not fit an `i64`.
pub fn vote_margins(rows: &[ConstituencyResult]) -> Vec<Option<i64>> {
    (0..rows.len())
        .map(|i| {
            rows.get(i + 1)
                .and_then(|next| signed_difference(rows[i].votes, next.votes))
        })
        .collect()
}

fn signed_difference(a: u64, b: u64) -> Option<i64> {
    i64::try_from(a).ok()?.checked_sub(i64::try_from(b).ok()?)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyVotes {
    pub party: String,
    pub votes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyInsights {
    /// Distinct constituencies.
    pub seats: usize,
    pub total_votes: u64,
    /// Rows per party.
    pub seats_by_party: BTreeMap<String, usize>,
    pub top_candidate: String,
    pub mean_votes_per_constituency: f64,
    pub wide_margin_constituencies: usize,
    pub party_with_highest_mean_votes: String,
    pub candidate_count: usize,
    pub top_parties_by_votes: Vec<PartyVotes>,
    /// Mean share of its constituency's votes held by each constituency's first row.
    /// `None` when no constituency recorded any votes.
    pub mean_winner_vote_share: Option<f64>,
}

impl Display for LegacyInsights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Seats contested: {}", self.seats)?;
        writeln!(f, "Total votes: {}", self.total_votes)?;
        writeln!(f, "Seats by party:")?;
        for (party, seats) in &self.seats_by_party {
            writeln!(f, "  {}: {}", party, seats)?;
        }
        writeln!(f, "Top candidate by votes: {}", self.top_candidate)?;
        writeln!(
            f,
            "Average votes per constituency: {:.2}",
            self.mean_votes_per_constituency
        )?;
        writeln!(
            f,
            "Constituencies won by more than {} votes: {}",
            WIDE_MARGIN, self.wide_margin_constituencies
        )?;
        writeln!(
            f,
            "Party with highest average votes: {}",
            self.party_with_highest_mean_votes
        )?;
        writeln!(f, "Total candidates: {}", self.candidate_count)?;
        writeln!(f, "Top {} parties by votes:", TOP_PARTY_LIMIT)?;
        for entry in &self.top_parties_by_votes {
            writeln!(f, "  {}: {}", entry.party, entry.votes)?;
        }
        match self.mean_winner_vote_share {
            Some(share) => write!(f, "Average winning vote share: {:.2}%", share),
            None => write!(f, "Average winning vote share: n/a"),
        }
    }
}

fn mean(sum: u64, count: usize) -> f64 {
    sum as f64 / count as f64
}

pub fn analyze(rows: &[ConstituencyResult]) -> Result<LegacyInsights, InsightError> {
    let top_candidate = rows
        .iter()
        .reduce(|best, row| if row.votes > best.votes { row } else { best })
        .map(|row| row.candidate.clone())
        .ok_or_else(|| InsightError::InsufficientData("no constituency rows".to_string()))?;

    let mut by_constituency: BTreeMap<&str, Vec<&ConstituencyResult>> = BTreeMap::new();
    let mut party_totals: BTreeMap<&str, (u64, usize)> = BTreeMap::new();
    for row in rows {
        by_constituency
            .entry(row.constituency.as_str())
            .or_default()
            .push(row);
        let entry = party_totals.entry(row.party.as_str()).or_default();
        entry.0 += row.votes;
        entry.1 += 1;
    }

    let mean_votes_per_constituency = by_constituency
        .values()
        .map(|group| mean(group.iter().map(|r| r.votes).sum(), group.len()))
        .sum::<f64>()
        / by_constituency.len() as f64;

    let wide_margin_constituencies = rows
        .iter()
        .zip(vote_margins(rows))
        .filter(|(_, margin)| margin.is_some_and(|m| m > WIDE_MARGIN))
        .map(|(row, _)| row.constituency.as_str())
        .collect::<BTreeSet<_>>()
        .len();

    let party_with_highest_mean_votes = party_totals
        .iter()
        .map(|(party, &(sum, count))| (*party, mean(sum, count)))
        .reduce(|best, entry| if entry.1 > best.1 { entry } else { best })
        .map(|(party, _)| party.to_string())
        .unwrap_or_default();

    let mut top_parties_by_votes: Vec<PartyVotes> = party_totals
        .iter()
        .map(|(party, &(votes, _))| PartyVotes {
            party: party.to_string(),
            votes,
        })
        .collect();
    top_parties_by_votes.sort_by(|a, b| b.votes.cmp(&a.votes));
    top_parties_by_votes.truncate(TOP_PARTY_LIMIT);

    let shares: Vec<f64> = by_constituency
        .values()
        .filter_map(|group| {
            let total: u64 = group.iter().map(|r| r.votes).sum();
            (total > 0).then(|| group[0].votes as f64 / total as f64 * 100.0)
        })
        .collect();
    let mean_winner_vote_share =
        (!shares.is_empty()).then(|| shares.iter().sum::<f64>() / shares.len() as f64);

    Ok(LegacyInsights {
        seats: by_constituency.len(),
        total_votes: rows.iter().map(|r| r.votes).sum(),
        seats_by_party: party_totals
            .iter()
            .map(|(party, &(_, count))| (party.to_string(), count))
            .collect(),
        top_candidate,
        mean_votes_per_constituency,
        wide_margin_constituencies,
        party_with_highest_mean_votes,
        candidate_count: rows
            .iter()
            .map(|r| r.candidate.as_str())
            .collect::<BTreeSet<_>>()
            .len(),
        top_parties_by_votes,
        mean_winner_vote_share,
    })
}
