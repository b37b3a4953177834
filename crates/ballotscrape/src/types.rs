use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// One row of the top-level results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySummary {
    pub party_name: String,
    pub seats_won: u32,
    pub seats_leading: u32,
    pub seats_total: u32,
    pub detail_link: String,
}

impl PartySummary {
    /// Matches the aggregate "Independent" rows, which the site lists as if they were a party.
    pub fn is_independent(&self) -> bool {
        self.party_name.to_lowercase().contains("independent")
    }
}

impl Display for PartySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} — won {}, leading {}, total {}",
            self.party_name, self.seats_won, self.seats_leading, self.seats_total
        )
    }
}

/// A winning candidate scraped from a party's detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub serial: String,
    pub constituency: String,
    pub candidate_name: String,
    pub total_votes: u64,
    pub margin: u64,
    pub party_name: String,
}

impl Display for CandidateRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) — {}: {} votes, margin {}",
            self.candidate_name, self.party_name, self.constituency, self.total_votes, self.margin
        )
    }
}

/// Both record sets of a single run. `candidates` only holds rows from parties whose
/// detail page was fetched and parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub parties: Vec<PartySummary>,
    pub candidates: Vec<CandidateRecord>,
}

impl Dataset {
    pub fn new(parties: Vec<PartySummary>, candidates: Vec<CandidateRecord>) -> Self {
        Self {
            parties,
            candidates,
        }
    }

    pub fn candidates_for<'a>(
        &'a self,
        party_name: &'a str,
    ) -> impl Iterator<Item = &'a CandidateRecord> + 'a {
        self.candidates
            .iter()
            .filter(move |c| c.party_name == party_name)
    }
}

#[derive(Debug)]
pub struct DatasetStats {
    pub parties: usize,
    pub parties_with_candidates: usize,
    pub candidates: usize,
}

impl DatasetStats {
    pub fn from_dataset(dataset: &Dataset) -> DatasetStats {
        DatasetStats {
            parties: dataset.parties.len(),
            parties_with_candidates: dataset
                .parties
                .iter()
                .filter(|p| dataset.candidates_for(&p.party_name).next().is_some())
                .count(),
            candidates: dataset.candidates.len(),
        }
    }
}

impl Display for DatasetStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(f, "  Parties:                 {}", self.parties)?;
        writeln!(
            f,
            "  Parties with candidates: {}",
            self.parties_with_candidates
        )?;
        writeln!(f, "  Candidates:              {}", self.candidates)
    }
}
