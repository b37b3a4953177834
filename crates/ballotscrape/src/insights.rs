//! Seat and vote insights derived from a scraped [`Dataset`].
//!
//! Every function here is pure: it only reads the record slices it is given. Rankings
//! use stable sorts, so records with equal keys keep the order they were scraped in,
//! and "the largest party" is always the first party holding the maximum.

use std::fmt::Display;
use std::io::{self, Write};

use serde::Serialize;

use crate::types::{CandidateRecord, Dataset, PartySummary};

/// Name under which the site aggregates independents in the party table.
pub const INDEPENDENT_PARTY: &str = "Independent - IND";

/// Number of candidates shown per ranking.
pub const RANKING_SIZE: usize = 5;
/// Number of largest parties broken down per party.
pub const TOP_PARTY_COUNT: usize = 10;
/// Kingmaker lists are cut to this many parties.
pub const KINGMAKER_LIMIT: usize = 5;

/// `(label, inclusive lower bound, exclusive upper bound)`. The first bucket also
/// takes parties with zero seats.
const SIZE_BUCKETS: [(&str, u32, Option<u32>); 6] = [
    ("1", 0, Some(2)),
    ("2-5", 2, Some(6)),
    ("6-10", 6, Some(11)),
    ("11-50", 11, Some(51)),
    ("51-100", 51, Some(101)),
    ("100+", 101, None),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InsightError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatCount {
    pub party_name: String,
    pub seats: u32,
}

impl From<&PartySummary> for SeatCount {
    fn from(party: &PartySummary) -> Self {
        Self {
            party_name: party.party_name.clone(),
            seats: party.seats_total,
        }
    }
}

pub fn total_seats(parties: &[PartySummary]) -> u32 {
    parties.iter().map(|p| p.seats_total).sum()
}

pub fn majority_threshold(parties: &[PartySummary]) -> u32 {
    total_seats(parties) / 2 + 1
}

/// First party holding the highest seat total.
pub fn leading_party(parties: &[PartySummary]) -> Option<&PartySummary> {
    parties.iter().reduce(|best, party| {
        if party.seats_total > best.seats_total {
            party
        } else {
            best
        }
    })
}

/// Parties by descending seat total, ties in scraped order.
pub fn rank_parties(parties: &[PartySummary]) -> Vec<&PartySummary> {
    let mut ranked: Vec<&PartySummary> = parties.iter().collect();
    ranked.sort_by(|a, b| b.seats_total.cmp(&a.seats_total));
    ranked
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GovernmentFormation {
    pub leader: SeatCount,
    pub total_seats: u32,
    pub majority: u32,
    pub forms_government: bool,
}

impl Display for GovernmentFormation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.forms_government {
            write!(
                f,
                "{} is likely to form the government with {} seats (Majority: {})",
                self.leader.party_name, self.leader.seats, self.majority
            )
        } else {
            write!(
                f,
                "No single party has a majority. Coalition government likely. (Majority required: {})",
                self.majority
            )
        }
    }
}

pub fn forming_government(parties: &[PartySummary]) -> Result<GovernmentFormation, InsightError> {
    let leader = leading_party(parties).ok_or_else(|| {
        InsightError::InsufficientData("no parties to form a government".to_string())
    })?;
    let majority = majority_threshold(parties);

    Ok(GovernmentFormation {
        leader: leader.into(),
        total_seats: total_seats(parties),
        majority,
        forms_government: leader.seats_total >= majority,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Closeness {
    pub leader: SeatCount,
    pub runner_up: SeatCount,
    pub difference: u32,
    /// `difference` as a percentage of all seats.
    pub percentage: f64,
}

impl Display for Closeness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "The election was decided by a margin of {} seats ({:.2}% of total seats)",
            self.difference, self.percentage
        )
    }
}

pub fn election_closeness(parties: &[PartySummary]) -> Result<Closeness, InsightError> {
    let ranked = rank_parties(parties);
    let [leader, runner_up, ..] = ranked.as_slice() else {
        return Err(InsightError::InsufficientData(format!(
            "closeness needs at least two parties, got {}",
            ranked.len()
        )));
    };

    let total = total_seats(parties);
    if total == 0 {
        return Err(InsightError::InsufficientData(
            "no seats have been declared".to_string(),
        ));
    }

    let difference = leader.seats_total - runner_up.seats_total;
    Ok(Closeness {
        leader: (*leader).into(),
        runner_up: (*runner_up).into(),
        difference,
        percentage: f64::from(difference) / f64::from(total) * 100.0,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallStatistics {
    pub total_seats: u32,
    pub total_parties: usize,
    pub average_seats: f64,
}

impl Display for OverallStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Overall Election Statistics:\nTotal Seats: {}\nTotal Parties: {}\nAverage Seats per Party: {:.2}",
            self.total_seats, self.total_parties, self.average_seats
        )
    }
}

pub fn overall_statistics(parties: &[PartySummary]) -> Result<OverallStatistics, InsightError> {
    if parties.is_empty() {
        return Err(InsightError::InsufficientData(
            "no parties to summarise".to_string(),
        ));
    }

    let total_seats = total_seats(parties);
    Ok(OverallStatistics {
        total_seats,
        total_parties: parties.len(),
        average_seats: f64::from(total_seats) / parties.len() as f64,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeBucket {
    pub label: &'static str,
    pub parties: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeDistribution {
    pub buckets: Vec<SizeBucket>,
}

impl SizeDistribution {
    pub fn count(&self, label: &str) -> Option<usize> {
        self.buckets
            .iter()
            .find(|b| b.label == label)
            .map(|b| b.parties)
    }
}

impl Display for SizeDistribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Party size distribution:")?;
        for bucket in &self.buckets {
            write!(f, "\n{:<8}{}", bucket.label, bucket.parties)?;
        }
        Ok(())
    }
}

/// Buckets every party except the independents' aggregate row by seat total.
pub fn party_size_distribution(parties: &[PartySummary]) -> SizeDistribution {
    let buckets = SIZE_BUCKETS
        .iter()
        .map(|&(label, lower, upper)| SizeBucket {
            label,
            parties: parties
                .iter()
                .filter(|p| p.party_name != INDEPENDENT_PARTY)
                .filter(|p| p.seats_total >= lower && upper.is_none_or(|u| p.seats_total < u))
                .count(),
        })
        .collect();

    SizeDistribution { buckets }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Kingmakers {
    pub majority: u32,
    pub leading_seats: u32,
    pub parties: Vec<SeatCount>,
}

impl Display for Kingmakers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.parties.is_empty() {
            return write!(f, "Potential kingmakers: none");
        }
        write!(f, "Potential kingmakers:")?;
        for party in &self.parties {
            write!(f, "\n{} — {} seats", party.party_name, party.seats)?;
        }
        Ok(())
    }
}

/// Parties with `0 < seats < majority - leading seats`, largest first. The upper bound
/// is negative whenever the leader already holds a majority, which leaves the list empty.
pub fn potential_kingmakers(parties: &[PartySummary]) -> Kingmakers {
    let majority = majority_threshold(parties);
    let leading_seats = leading_party(parties).map_or(0, |p| p.seats_total);
    let upper = i64::from(majority) - i64::from(leading_seats);

    let mut candidates: Vec<&PartySummary> = parties
        .iter()
        .filter(|p| p.seats_total > 0 && i64::from(p.seats_total) < upper)
        .collect();
    candidates.sort_by(|a, b| b.seats_total.cmp(&a.seats_total));

    Kingmakers {
        majority,
        leading_seats,
        parties: candidates
            .into_iter()
            .take(KINGMAKER_LIMIT)
            .map(SeatCount::from)
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndependentSeats {
    pub seats: u32,
}

impl Display for IndependentSeats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Number of independent candidates who won: {}", self.seats)
    }
}

pub fn independent_seats(parties: &[PartySummary]) -> IndependentSeats {
    IndependentSeats {
        seats: parties
            .iter()
            .filter(|p| p.is_independent())
            .map(|p| p.seats_total)
            .sum(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankOrder {
    Top,
    Bottom,
}

impl Display for RankOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankOrder::Top => write!(f, "Top"),
            RankOrder::Bottom => write!(f, "Bottom"),
        }
    }
}

/// The first `limit` candidates by total votes in `order`, ties in insertion order.
pub fn rank_candidates<'a, I>(candidates: I, order: RankOrder, limit: usize) -> Vec<CandidateRecord>
where
    I: IntoIterator<Item = &'a CandidateRecord>,
{
    let mut ranked: Vec<&CandidateRecord> = candidates.into_iter().collect();
    match order {
        RankOrder::Top => ranked.sort_by(|a, b| b.total_votes.cmp(&a.total_votes)),
        RankOrder::Bottom => ranked.sort_by(|a, b| a.total_votes.cmp(&b.total_votes)),
    }
    ranked.into_iter().take(limit).cloned().collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateRanking {
    pub order: RankOrder,
    pub limit: usize,
    pub candidates: Vec<CandidateRecord>,
}

impl Display for CandidateRanking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} candidates by total votes:",
            self.order, self.limit
        )?;
        for c in &self.candidates {
            write!(
                f,
                "\n{} | {} | {} | {}",
                c.candidate_name, c.party_name, c.constituency, c.total_votes
            )?;
        }
        Ok(())
    }
}

pub fn candidates_by_votes(candidates: &[CandidateRecord], order: RankOrder) -> CandidateRanking {
    CandidateRanking {
        order,
        limit: RANKING_SIZE,
        candidates: rank_candidates(candidates, order, RANKING_SIZE),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyCandidates {
    pub party_name: String,
    pub candidates: Vec<CandidateRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyRankings {
    pub order: RankOrder,
    pub limit: usize,
    pub parties: Vec<PartyCandidates>,
}

impl Display for PartyRankings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} candidates by total votes for each of the {} largest parties:",
            self.order,
            self.limit,
            self.parties.len()
        )?;
        for party in &self.parties {
            write!(f, "\n{}:", party.party_name)?;
            if party.candidates.is_empty() {
                write!(f, "\n  (no candidates)")?;
            }
            for c in &party.candidates {
                write!(
                    f,
                    "\n  {} | {} | {}",
                    c.candidate_name, c.constituency, c.total_votes
                )?;
            }
        }
        Ok(())
    }
}

/// Applies the candidate ranking within each of the ten largest parties.
pub fn candidates_by_votes_per_top_party(
    parties: &[PartySummary],
    candidates: &[CandidateRecord],
    order: RankOrder,
) -> PartyRankings {
    let parties = rank_parties(parties)
        .into_iter()
        .take(TOP_PARTY_COUNT)
        .map(|party| PartyCandidates {
            party_name: party.party_name.clone(),
            candidates: rank_candidates(
                candidates
                    .iter()
                    .filter(|c| c.party_name == party.party_name),
                order,
                RANKING_SIZE,
            ),
        })
        .collect();

    PartyRankings {
        order,
        limit: RANKING_SIZE,
        parties,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "insight", rename_all = "snake_case")]
pub enum Insight {
    Closeness(Closeness),
    GovernmentFormation(GovernmentFormation),
    OverallStatistics(OverallStatistics),
    PartySizeDistribution(SizeDistribution),
    Kingmakers(Kingmakers),
    IndependentSeats(IndependentSeats),
    CandidatesByVotes(CandidateRanking),
    CandidatesByVotesPerParty(PartyRankings),
}

impl Display for Insight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Insight::Closeness(i) => i.fmt(f),
            Insight::GovernmentFormation(i) => i.fmt(f),
            Insight::OverallStatistics(i) => i.fmt(f),
            Insight::PartySizeDistribution(i) => i.fmt(f),
            Insight::Kingmakers(i) => i.fmt(f),
            Insight::IndependentSeats(i) => i.fmt(f),
            Insight::CandidatesByVotes(i) => i.fmt(f),
            Insight::CandidatesByVotesPerParty(i) => i.fmt(f),
        }
    }
}

/// Every insight the dataset supports, in computation order, plus a note for each one
/// that had to be left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InsightReport {
    pub insights: Vec<Insight>,
    pub diagnostics: Vec<String>,
}

impl InsightReport {
    pub fn compute(dataset: &Dataset) -> Self {
        let parties = &dataset.parties;
        let candidates = &dataset.candidates;
        let mut report = Self::default();

        report.push("election closeness", election_closeness(parties).map(Insight::Closeness));
        report.push(
            "government formation",
            forming_government(parties).map(Insight::GovernmentFormation),
        );
        report.push(
            "overall statistics",
            overall_statistics(parties).map(Insight::OverallStatistics),
        );
        report
            .insights
            .push(Insight::PartySizeDistribution(party_size_distribution(parties)));
        report
            .insights
            .push(Insight::Kingmakers(potential_kingmakers(parties)));
        report
            .insights
            .push(Insight::IndependentSeats(independent_seats(parties)));

        if candidates.is_empty() {
            log::warn!("No candidate-specific insights could be generated due to lack of data.");
            report.diagnostics.push(
                "No candidate-specific insights could be generated due to lack of data."
                    .to_string(),
            );
            return report;
        }

        for order in [RankOrder::Top, RankOrder::Bottom] {
            report
                .insights
                .push(Insight::CandidatesByVotes(candidates_by_votes(candidates, order)));
            report
                .insights
                .push(Insight::CandidatesByVotesPerParty(
                    candidates_by_votes_per_top_party(parties, candidates, order),
                ));
        }

        report
    }

    fn push(&mut self, name: &str, result: Result<Insight, InsightError>) {
        match result {
            Ok(insight) => self.insights.push(insight),
            Err(e) => {
                log::warn!("Skipping {}: {}", name, e);
                self.diagnostics.push(format!("Skipped {}: {}", name, e));
            }
        }
    }

    /// One block per insight, each followed by a blank line.
    pub fn write_text<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for insight in &self.insights {
            write!(writer, "{}\n\n", insight)?;
        }
        Ok(())
    }

    pub fn to_text(&self) -> String {
        self.insights
            .iter()
            .map(|insight| format!("{}\n\n", insight))
            .collect()
    }
}
