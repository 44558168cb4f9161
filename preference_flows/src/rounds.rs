//! Round by round view of the distribution of preferences in one electorate.

use crate::config::*;
use crate::Dataset;
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// Preferences moving from the excluded candidate to a remaining candidate.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TransferEdge {
    pub from_candidate: String,
    pub to_candidate: String,
    pub preferences: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CandidateTotal {
    pub candidate: String,
    pub party: String,
    pub running_total: u64,
    pub ballot_order: u32,
}

/// One exclusion round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundView {
    pub exclusion: u32,
    pub from_candidate: String,
    pub from_party: String,
    pub votes_distributed: u64,
    /// In the order of the input table.
    pub transfers: Vec<TransferEdge>,
    /// Lowest total first.
    pub totals: Vec<CandidateTotal>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectorateRounds {
    pub electorate: String,
    pub rounds: Vec<RoundView>,
    /// The largest running total over all the rounds, to draw all the rounds on the same scale.
    pub max_running_total: u64,
}

/// Partitions the distribution rows of one electorate by exclusion round.
///
/// An electorate won on first preferences has no rounds.
pub fn walk_rounds(rows: &[DistributionRow], electorate: &str) -> ElectorateRounds {
    let mut by_round: BTreeMap<u32, Vec<&DistributionRow>> = BTreeMap::new();
    for r in rows.iter().filter(|r| r.electorate == electorate) {
        by_round.entry(r.exclusion).or_default().push(r);
    }

    let mut rounds: Vec<RoundView> = Vec::new();
    let mut max_running_total = 0;
    for (exclusion, round_rows) in by_round.iter() {
        // Not empty by construction.
        let first = round_rows[0];
        let transfers: Vec<TransferEdge> = round_rows
            .iter()
            .map(|r| TransferEdge {
                from_candidate: r.from_candidate.clone(),
                to_candidate: r.to_candidate.clone(),
                preferences: r.preferences,
            })
            .collect();
        let mut totals: Vec<CandidateTotal> = round_rows
            .iter()
            .map(|r| CandidateTotal {
                candidate: r.to_candidate.clone(),
                party: r.to_party.clone(),
                running_total: r.to_running_total,
                ballot_order: r.ballot_order,
            })
            .collect();
        totals.sort_by_key(|t| t.running_total);
        if let Some(t) = totals.last() {
            max_running_total = max_running_total.max(t.running_total);
        }
        rounds.push(RoundView {
            exclusion: *exclusion,
            from_candidate: first.from_candidate.clone(),
            from_party: first.from_party.clone(),
            votes_distributed: first.votes_distributed,
            transfers,
            totals,
        });
    }
    debug!(
        "walk_rounds: {}: {} rounds, max running total {}",
        electorate,
        rounds.len(),
        max_running_total
    );
    ElectorateRounds {
        electorate: electorate.to_string(),
        rounds,
        max_running_total,
    }
}

/// The first preferences of an electorate, in ballot order.
pub fn first_preferences<'a>(rows: &'a [FirstPrefRow], electorate: &str) -> Vec<&'a FirstPrefRow> {
    let mut res: Vec<&FirstPrefRow> = rows.iter().filter(|r| r.electorate == electorate).collect();
    res.sort_by_key(|r| r.ballot_order);
    res
}

/// The display colour of every candidate.
pub fn candidate_colours(rows: &[FirstPrefRow]) -> HashMap<String, String> {
    rows.iter()
        .map(|r| (r.candidate.clone(), r.colour.clone()))
        .collect()
}

impl Dataset {
    /// The rounds of a declared electorate.
    pub fn electorate_rounds(&self, stub: &str) -> Result<ElectorateRounds, ExplorerErrors> {
        let e = self
            .electorate(stub)
            .ok_or_else(|| ExplorerErrors::UnknownElectorate(stub.to_string()))?;
        Ok(walk_rounds(self.distribution(), &e.stub))
    }

    pub fn electorate_first_preferences(
        &self,
        stub: &str,
    ) -> Result<Vec<&FirstPrefRow>, ExplorerErrors> {
        let e = self
            .electorate(stub)
            .ok_or_else(|| ExplorerErrors::UnknownElectorate(stub.to_string()))?;
        Ok(first_preferences(self.first_prefs(), &e.stub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;

    fn row(exclusion: u32, from: &str, to: &str, prefs: u64, total: u64) -> DistributionRow {
        DistributionRow {
            electorate: "cook".to_string(),
            exclusion,
            from_party: format!("{} party", from),
            from_candidate: from.to_string(),
            to_party: format!("{} party", to),
            to_candidate: to.to_string(),
            preferences: prefs,
            votes_distributed: 300,
            to_running_total: total,
            ballot_order: 0,
        }
    }

    fn dataset() -> Dataset {
        let mut b = Builder::new()
            .electorates(&[
                ("cook".to_string(), "Cook".to_string()),
                ("mirani".to_string(), "Mirani".to_string()),
            ])
            .unwrap();
        b.add_distribution_row(row(2, "C", "A", 100, 5100));
        b.add_distribution_row(row(2, "C", "B", 200, 4200));
        b.add_distribution_row(row(1, "D", "A", 50, 5000));
        b.add_distribution_row(row(1, "D", "B", 30, 4000));
        b.add_distribution_row(row(1, "D", "C", 20, 300));
        for (name, order) in [("B", 2), ("A", 1), ("C", 3)] {
            b.add_first_pref_row(FirstPrefRow {
                electorate: "cook".to_string(),
                candidate: name.to_string(),
                party: format!("{} party", name),
                count: 1000,
                colour: format!("#00000{}", order),
                ballot_order: order,
            });
        }
        b.build().unwrap()
    }

    #[test]
    fn rounds_in_ascending_order() {
        let ds = dataset();
        let er = ds.electorate_rounds("cook").unwrap();
        assert_eq!(er.rounds.len(), 2);
        assert_eq!(er.rounds[0].exclusion, 1);
        assert_eq!(er.rounds[0].from_candidate, "D");
        assert_eq!(er.rounds[0].transfers.len(), 3);
        assert_eq!(er.rounds[1].exclusion, 2);
        assert_eq!(er.max_running_total, 5100);
    }

    #[test]
    fn totals_are_sorted() {
        let er = walk_rounds(dataset().distribution(), "cook");
        let names: Vec<&str> = er.rounds[0]
            .totals
            .iter()
            .map(|t| t.candidate.as_str())
            .collect();
        assert_eq!(names, vec!["C", "B", "A"]);
        assert_eq!(er.rounds[1].transfers[1].to_candidate, "B");
        assert_eq!(er.rounds[1].transfers[1].preferences, 200);
    }

    #[test]
    fn electorate_without_rounds() {
        let ds = dataset();
        let er = ds.electorate_rounds("mirani").unwrap();
        assert!(er.rounds.is_empty());
        assert_eq!(er.max_running_total, 0);
    }

    #[test]
    fn unknown_electorate() {
        let ds = dataset();
        assert_eq!(
            ds.electorate_rounds("nowhere"),
            Err(ExplorerErrors::UnknownElectorate("nowhere".to_string()))
        );
    }

    #[test]
    fn first_preferences_in_ballot_order() {
        let ds = dataset();
        let fp = ds.electorate_first_preferences("cook").unwrap();
        let names: Vec<&str> = fp.iter().map(|r| r.candidate.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        let colours = candidate_colours(ds.first_prefs());
        assert_eq!(colours["B"], "#000002");
    }

    #[test]
    fn lookup_by_name() {
        let ds = dataset();
        assert_eq!(ds.find_electorate("MIRANI").unwrap().stub, "mirani");
        assert_eq!(ds.find_electorate("cook").unwrap().name, "Cook");
        assert!(ds.find_electorate("Brisbane").is_err());
    }
}
