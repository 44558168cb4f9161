mod config;
use log::{debug, info, warn};

use std::collections::BTreeMap;

pub mod builder;
pub mod flows;
pub mod manual;
pub mod rounds;
pub mod session;

pub use crate::builder::actual_party_tally;
pub use crate::config::*;

/// The tables of an election, as loaded from the input files.
///
/// A dataset is immutable once built (see `builder::Builder`) and can be shared between
/// sessions.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Dataset {
    pub(crate) electorates: Vec<ElectorateRecord>,
    pub(crate) distribution: Vec<DistributionRow>,
    pub(crate) first_prefs: Vec<FirstPrefRow>,
    pub(crate) final_tally: Vec<FinalTallyRow>,
    pub(crate) baseline: PartyTally,
}

impl Dataset {
    pub fn electorates(&self) -> &[ElectorateRecord] {
        &self.electorates
    }

    pub fn distribution(&self) -> &[DistributionRow] {
        &self.distribution
    }

    pub fn first_prefs(&self) -> &[FirstPrefRow] {
        &self.first_prefs
    }

    pub fn final_tally(&self) -> &[FinalTallyRow] {
        &self.final_tally
    }

    /// The seats actually won by each party.
    pub fn baseline_tally(&self) -> &PartyTally {
        &self.baseline
    }

    pub fn electorate(&self, stub: &str) -> Option<&ElectorateRecord> {
        self.electorates.iter().find(|e| e.stub == stub)
    }

    /// The display name of an electorate, or the stub itself if it is not declared.
    pub fn electorate_name<'a>(&'a self, stub: &'a str) -> &'a str {
        self.electorate(stub).map(|e| e.name.as_str()).unwrap_or(stub)
    }

    /// Looks up an electorate by stub first, then by display name (ignoring case).
    pub fn find_electorate(&self, key: &str) -> Result<&ElectorateRecord, ExplorerErrors> {
        self.electorate(key)
            .or_else(|| {
                self.electorates
                    .iter()
                    .find(|e| e.name.eq_ignore_ascii_case(key))
            })
            .ok_or_else(|| ExplorerErrors::UnknownElectorate(key.to_string()))
    }
}

// ******** What-if explorer *********

/// A row of the working copy used by the what-if explorer.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct WorkingRow {
    pub to_party: String,
    pub to_candidate: String,
    pub preferences: u64,
    pub to_running_total: u64,
    pub votes_distributed: u64,
    /// The total of the candidate before the round.
    pub original_total: u64,
}

impl WorkingRow {
    fn new(row: &DistributionRow) -> WorkingRow {
        WorkingRow {
            to_party: row.to_party.clone(),
            to_candidate: row.to_candidate.clone(),
            preferences: row.preferences,
            to_running_total: row.to_running_total,
            votes_distributed: row.votes_distributed,
            original_total: row.to_running_total.saturating_sub(row.preferences),
        }
    }
}

/// The last round of an electorate in which the source party was excluded and its votes were
/// split between the two remaining candidates.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FinalRound {
    pub electorate: String,
    pub exclusion: u32,
    /// In the order of the input table.
    pub rows: [WorkingRow; 2],
    designated: usize,
    original_winner: usize,
}

impl FinalRound {
    pub fn designated(&self) -> &WorkingRow {
        &self.rows[self.designated]
    }

    pub fn other(&self) -> &WorkingRow {
        &self.rows[1 - self.designated]
    }

    /// The row with the largest running total. The first row wins a tie.
    pub fn winner(&self) -> &WorkingRow {
        &self.rows[winner_index(&self.rows)]
    }

    /// The winner in the input data.
    pub fn original_winner(&self) -> &WorkingRow {
        &self.rows[self.original_winner]
    }

    pub fn winner_changed(&self) -> bool {
        winner_index(&self.rows) != self.original_winner
    }

    // Rounds half up, which keeps both shares summing to the distributed votes.
    fn apply_percentage(&mut self, percentage: u32) {
        let distributed = self.rows[self.designated].votes_distributed;
        let designated_prefs = ((distributed as u128 * percentage as u128 + 50) / 100) as u64;
        for (idx, row) in self.rows.iter_mut().enumerate() {
            row.preferences = if idx == self.designated {
                designated_prefs
            } else {
                row.votes_distributed.saturating_sub(designated_prefs)
            };
            row.to_running_total = row.preferences.saturating_add(row.original_total);
        }
    }
}

fn winner_index(rows: &[WorkingRow; 2]) -> usize {
    if rows[1].to_running_total > rows[0].to_running_total {
        1
    } else {
        0
    }
}

/// Checks that the transfer of a final round decides the outcome: the votes distributed
/// are at least the margin between the two remaining candidates before the round.
///
/// Only defined for exactly two rows; any other shape is not decisive.
pub fn is_decisive_transfer(rows: &[&DistributionRow]) -> bool {
    match rows {
        [a, b] => {
            let x = a.to_running_total.saturating_sub(a.preferences);
            let y = b.to_running_total.saturating_sub(b.preferences);
            a.votes_distributed >= x.abs_diff(y)
        }
        _ => false,
    }
}

fn eligible_final_round(
    electorate: &str,
    exclusion: u32,
    rows: &[&DistributionRow],
    rules: &ExplorerRules,
) -> Option<FinalRound> {
    let from_party = rows.first().map(|r| r.from_party.as_str());
    if from_party != Some(rules.source_party.as_str()) {
        debug!(
            "eligible_final_round: {}: last exclusion is from {:?}, skipping",
            electorate, from_party
        );
        return None;
    }
    if rows.len() != 2 {
        debug!(
            "eligible_final_round: {}: {} candidates receive the last distribution, skipping",
            electorate,
            rows.len()
        );
        return None;
    }
    let designated: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.to_party == rules.designated_party)
        .map(|(idx, _)| idx)
        .collect();
    if designated.len() != 1 {
        debug!(
            "eligible_final_round: {}: {} rows for {}, skipping",
            electorate,
            designated.len(),
            rules.designated_party
        );
        return None;
    }
    if !is_decisive_transfer(rows) {
        debug!(
            "eligible_final_round: {}: the transfer does not decide the outcome, skipping",
            electorate
        );
        return None;
    }
    let working = [WorkingRow::new(rows[0]), WorkingRow::new(rows[1])];
    let original_winner = winner_index(&working);
    Some(FinalRound {
        electorate: electorate.to_string(),
        exclusion,
        rows: working,
        designated: designated[0],
        original_winner,
    })
}

/// Recomputes the election outcome if the source party had split its last distribution
/// differently between the designated party and the other remaining candidate.
///
/// The explorer owns a working copy of the relevant rows; the input tables are never modified.
///
/// Until the first call to `set_percentage`, the working copy holds the observed rows and the new
/// tally is the baseline, even when the eligible electorates had different observed splits.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct WhatIfExplorer {
    baseline: PartyTally,
    rounds: Vec<FinalRound>,
    original_winners: PartyTally,
    default_percentage: u32,
    percentage: u32,
    observed: bool,
    new_tally: PartyTally,
}

impl WhatIfExplorer {
    pub fn new(
        distribution: &[DistributionRow],
        baseline: &PartyTally,
        rules: &ExplorerRules,
    ) -> WhatIfExplorer {
        let mut last_exclusion: BTreeMap<&str, u32> = BTreeMap::new();
        for r in distribution.iter() {
            let e = last_exclusion.entry(r.electorate.as_str()).or_insert(r.exclusion);
            *e = (*e).max(r.exclusion);
        }

        let mut rounds: Vec<FinalRound> = Vec::new();
        for (&electorate, &exclusion) in last_exclusion.iter() {
            let rows: Vec<&DistributionRow> = distribution
                .iter()
                .filter(|r| r.electorate == electorate && r.exclusion == exclusion)
                .collect();
            if let Some(fr) = eligible_final_round(electorate, exclusion, &rows, rules) {
                rounds.push(fr);
            }
        }
        info!(
            "WhatIfExplorer: {} electorates where {} is distributed last to {}: {:?}",
            rounds.len(),
            rules.source_party,
            rules.designated_party,
            rounds.iter().map(|fr| fr.electorate.as_str()).collect::<Vec<&str>>()
        );

        let transferred: u128 = rounds
            .iter()
            .map(|fr| fr.designated().votes_distributed as u128)
            .sum();
        let received: u128 = rounds
            .iter()
            .map(|fr| fr.designated().preferences as u128)
            .sum();
        let default_percentage = if transferred == 0 {
            0
        } else {
            ((200 * received + transferred) / (2 * transferred)).min(100) as u32
        };
        debug!(
            "WhatIfExplorer: {} of {} votes went to {}, default percentage {}",
            received, transferred, rules.designated_party, default_percentage
        );

        let original_winners =
            PartyTally::from_winners(rounds.iter().map(|fr| fr.original_winner().to_party.as_str()));

        WhatIfExplorer {
            baseline: baseline.clone(),
            rounds,
            original_winners,
            default_percentage,
            percentage: default_percentage,
            observed: true,
            new_tally: baseline.clone(),
        }
    }

    pub fn from_dataset(dataset: &Dataset, rules: &ExplorerRules) -> WhatIfExplorer {
        WhatIfExplorer::new(dataset.distribution(), dataset.baseline_tally(), rules)
    }

    /// Sets the share (in percent) of the distributed votes going to the designated party.
    pub fn set_percentage(&mut self, percentage: u32) -> Result<(), ExplorerErrors> {
        if percentage > 100 {
            return Err(ExplorerErrors::PercentageOutOfBounds(percentage));
        }
        self.percentage = percentage;
        self.observed = false;
        self.recompute();
        Ok(())
    }

    pub fn percentage(&self) -> u32 {
        self.percentage
    }

    /// True while the working copy still holds the observed rows.
    pub fn is_observed(&self) -> bool {
        self.observed
    }

    /// The share observed in the data, over all the eligible electorates.
    pub fn default_percentage(&self) -> u32 {
        self.default_percentage
    }

    pub fn rounds(&self) -> &[FinalRound] {
        &self.rounds
    }

    /// All the rows of the working copy, with their electorate.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &WorkingRow)> {
        self.rounds
            .iter()
            .flat_map(|fr| fr.rows.iter().map(move |r| (fr.electorate.as_str(), r)))
    }

    pub fn baseline(&self) -> &PartyTally {
        &self.baseline
    }

    /// The winners of the eligible electorates in the input data.
    pub fn original_winners(&self) -> &PartyTally {
        &self.original_winners
    }

    /// The winners of the eligible electorates with the current percentage.
    pub fn new_winners(&self) -> PartyTally {
        PartyTally::from_winners(self.rounds.iter().map(|fr| fr.winner().to_party.as_str()))
    }

    pub fn new_tally(&self) -> &PartyTally {
        &self.new_tally
    }

    pub fn changed_electorates(&self) -> Vec<&str> {
        self.rounds
            .iter()
            .filter(|fr| fr.winner_changed())
            .map(|fr| fr.electorate.as_str())
            .collect()
    }

    fn recompute(&mut self) {
        for fr in self.rounds.iter_mut() {
            fr.apply_percentage(self.percentage);
        }
        let new_winners = self.new_winners();

        let mut tally = PartyTally::new();
        for (party, seats) in self.baseline.iter() {
            let delta = new_winners.get(party) as i64 - self.original_winners.get(party) as i64;
            let count = seats as i64 + delta;
            if count < 0 {
                warn!(
                    "recompute: {} would have {} seats, the baseline tally is inconsistent with the distribution",
                    party, count
                );
            }
            tally.insert(party, count.max(0) as u64);
        }
        for (party, seats) in new_winners.iter() {
            if !self.baseline.contains(party) && seats > self.original_winners.get(party) {
                warn!(
                    "recompute: {} gains seats but is not in the baseline tally, dropping it",
                    party
                );
            }
        }
        info!(
            "recompute: percentage {}: new tally {:?}",
            self.percentage, tally
        );
        self.new_tally = tally;
    }
}
