pub use crate::config::*;
use crate::Dataset;

use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// A builder for assembling and validating a dataset.
///
/// All the tables are checked against the declared electorates when calling `build`.
///
/// ```
/// pub use preference_flows::builder::Builder;
/// # use preference_flows::ExplorerErrors;
///
/// let mut builder = Builder::new()
///     .electorates(&[("bris".to_string(), "Brisbane".to_string())])?;
///
/// builder.add_final_tally("bris", "ALP", 16000);
/// builder.add_final_tally("bris", "LNP", 15000);
///
/// let dataset = builder.build()?;
/// assert_eq!(dataset.baseline_tally().get("ALP"), 1);
///
/// # Ok::<(), ExplorerErrors>(())
/// ```
pub struct Builder {
    pub(crate) _electorates: Vec<ElectorateRecord>,
    pub(crate) _distribution: Vec<DistributionRow>,
    pub(crate) _first_prefs: Vec<FirstPrefRow>,
    pub(crate) _final_tally: Vec<FinalTallyRow>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            _electorates: Vec::new(),
            _distribution: Vec::new(),
            _first_prefs: Vec::new(),
            _final_tally: Vec::new(),
        }
    }

    /// Declares the electorates as (stub, display name) pairs.
    pub fn electorates(self, electorates: &[(String, String)]) -> Result<Builder, ExplorerErrors> {
        let mut seen: HashSet<&String> = HashSet::new();
        for (stub, _) in electorates.iter() {
            if !seen.insert(stub) {
                return Err(ExplorerErrors::DuplicateElectorate(stub.clone()));
            }
        }
        Ok(Builder {
            _electorates: electorates
                .iter()
                .map(|(stub, name)| ElectorateRecord {
                    stub: stub.clone(),
                    name: name.clone(),
                })
                .collect(),
            ..self
        })
    }

    pub fn add_distribution_row(&mut self, row: DistributionRow) {
        self._distribution.push(row);
    }

    pub fn add_first_pref_row(&mut self, row: FirstPrefRow) {
        self._first_prefs.push(row);
    }

    pub fn add_final_tally_row(&mut self, row: FinalTallyRow) {
        self._final_tally.push(row);
    }

    /// Shorthand for `add_final_tally_row`.
    pub fn add_final_tally(&mut self, electorate: &str, party: &str, count: u64) {
        self.add_final_tally_row(FinalTallyRow {
            electorate: electorate.to_string(),
            party: party.to_string(),
            count,
        });
    }

    pub fn build(self) -> Result<Dataset, ExplorerErrors> {
        let declared: HashSet<&str> = self._electorates.iter().map(|e| e.stub.as_str()).collect();
        check_declared("distribution", self._distribution.iter().map(|r| &r.electorate), &declared)?;
        check_declared("first_prefs", self._first_prefs.iter().map(|r| &r.electorate), &declared)?;
        check_declared("final_tally", self._final_tally.iter().map(|r| &r.electorate), &declared)?;
        check_distribution(&self._distribution)?;

        let baseline = actual_party_tally(&self._final_tally);
        info!(
            "Built dataset: {} electorates, {} distribution rows, {} first preference rows, baseline tally {:?}",
            self._electorates.len(),
            self._distribution.len(),
            self._first_prefs.len(),
            baseline
        );
        Ok(Dataset {
            electorates: self._electorates,
            distribution: self._distribution,
            first_prefs: self._first_prefs,
            final_tally: self._final_tally,
            baseline,
        })
    }
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}

fn check_declared<'a, I>(
    table: &'static str,
    stubs: I,
    declared: &HashSet<&str>,
) -> Result<(), ExplorerErrors>
where
    I: Iterator<Item = &'a String>,
{
    for stub in stubs {
        if !declared.contains(stub.as_str()) {
            return Err(ExplorerErrors::UndeclaredElectorate {
                table,
                stub: stub.clone(),
            });
        }
    }
    Ok(())
}

fn check_distribution(rows: &[DistributionRow]) -> Result<(), ExplorerErrors> {
    let mut rounds: BTreeMap<&str, BTreeSet<u32>> = BTreeMap::new();
    let mut distributed: HashMap<(&str, u32), u64> = HashMap::new();
    for r in rows.iter() {
        if r.preferences > r.to_running_total {
            return Err(ExplorerErrors::PreferencesAboveTotal {
                electorate: r.electorate.clone(),
                candidate: r.to_candidate.clone(),
                exclusion: r.exclusion,
            });
        }
        let expected = *distributed
            .entry((r.electorate.as_str(), r.exclusion))
            .or_insert(r.votes_distributed);
        if expected != r.votes_distributed {
            return Err(ExplorerErrors::InconsistentVotesDistributed {
                electorate: r.electorate.clone(),
                exclusion: r.exclusion,
                expected,
                found: r.votes_distributed,
            });
        }
        rounds.entry(r.electorate.as_str()).or_default().insert(r.exclusion);
    }

    for (electorate, exclusions) in rounds.iter() {
        let mut previous: Option<u32> = None;
        for &exclusion in exclusions.iter() {
            if let Some(after) = previous {
                if exclusion != after + 1 {
                    return Err(ExplorerErrors::NonConsecutiveRounds {
                        electorate: electorate.to_string(),
                        after,
                        found: exclusion,
                    });
                }
            }
            previous = Some(exclusion);
        }
        debug!("check_distribution: {}: rounds {:?}", electorate, exclusions);
    }

    // Running totals, visited in round order.
    let mut sorted: Vec<&DistributionRow> = rows.iter().collect();
    sorted.sort_by_key(|r| r.exclusion);
    let mut last_totals: HashMap<(&str, &str), u64> = HashMap::new();
    for r in sorted {
        let key = (r.electorate.as_str(), r.to_candidate.as_str());
        if let Some(&previous_total) = last_totals.get(&key) {
            if r.to_running_total < previous_total {
                return Err(ExplorerErrors::DecreasingRunningTotal {
                    electorate: r.electorate.clone(),
                    candidate: r.to_candidate.clone(),
                    exclusion: r.exclusion,
                });
            }
        }
        last_totals.insert(key, r.to_running_total);
    }
    Ok(())
}

/// The seats won by each party: in every electorate the party with the highest final count wins.
///
/// If several parties share the highest count, the first one in the table wins.
pub fn actual_party_tally(final_tally: &[FinalTallyRow]) -> PartyTally {
    // Electorates are visited in the order of the table.
    let mut order: Vec<&str> = Vec::new();
    let mut best: HashMap<&str, &FinalTallyRow> = HashMap::new();
    for row in final_tally.iter() {
        match best.get(row.electorate.as_str()) {
            None => {
                order.push(row.electorate.as_str());
                best.insert(row.electorate.as_str(), row);
            }
            Some(current) if row.count > current.count => {
                best.insert(row.electorate.as_str(), row);
            }
            _ => {}
        }
    }
    let tally = PartyTally::from_winners(
        order
            .iter()
            .filter_map(|e| best.get(e))
            .map(|row| row.party.as_str()),
    );
    debug!("actual_party_tally: {:?}", tally);
    tally
}
