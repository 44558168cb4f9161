// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

/// A single-member electorate.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct ElectorateRecord {
    /// The short identifier used by all the other tables.
    pub stub: String,
    /// The display name.
    pub name: String,
}

/// One transfer of preferences from an excluded candidate to a remaining candidate.
///
/// There is one row per (electorate, exclusion round, from candidate, to candidate).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DistributionRow {
    pub electorate: String,
    /// The exclusion round. Consecutive for a given electorate.
    pub exclusion: u32,
    pub from_party: String,
    pub from_candidate: String,
    pub to_party: String,
    pub to_candidate: String,
    /// The number of preferences received by the `to` candidate in this round.
    pub preferences: u64,
    /// The number of votes of the excluded candidate that were distributed in this round.
    pub votes_distributed: u64,
    /// The total of the `to` candidate after this round.
    pub to_running_total: u64,
    pub ballot_order: u32,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FirstPrefRow {
    pub electorate: String,
    pub candidate: String,
    pub party: String,
    pub count: u64,
    /// A display colour, usually in the `#rrggbb` form.
    pub colour: String,
    pub ballot_order: u32,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FinalTallyRow {
    pub electorate: String,
    pub party: String,
    pub count: u64,
}

// ******** Output data structures *********

/// The number of seats won by each party.
///
/// Parties are kept in name order.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct PartyTally {
    seats: BTreeMap<String, u64>,
}

impl PartyTally {
    pub fn new() -> PartyTally {
        PartyTally::default()
    }

    /// Counts the winners, one entry per electorate.
    pub fn from_winners<'a, I>(winners: I) -> PartyTally
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut tally = PartyTally::new();
        for party in winners {
            tally.add(party, 1);
        }
        tally
    }

    pub fn add(&mut self, party: &str, seats: u64) {
        *self.seats.entry(party.to_string()).or_insert(0) += seats;
    }

    pub fn insert(&mut self, party: &str, seats: u64) {
        self.seats.insert(party.to_string(), seats);
    }

    /// The seats of a party, 0 if the party is not in the tally.
    pub fn get(&self, party: &str) -> u64 {
        self.seats.get(party).cloned().unwrap_or(0)
    }

    pub fn contains(&self, party: &str) -> bool {
        self.seats.contains_key(party)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.seats.iter().map(|(p, c)| (p.as_str(), *c))
    }

    pub fn parties(&self) -> impl Iterator<Item = &str> {
        self.seats.keys().map(|p| p.as_str())
    }

    /// Largest tally first, ties in name order.
    pub fn sorted_desc(&self) -> Vec<(String, u64)> {
        let mut res: Vec<(String, u64)> = self.seats.iter().map(|(p, c)| (p.clone(), *c)).collect();
        res.sort_by(|(p1, c1), (p2, c2)| c2.cmp(c1).then_with(|| p1.cmp(p2)));
        res
    }

    pub fn total(&self) -> u64 {
        self.seats.values().sum()
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }
}

/// Errors returned by the library.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ExplorerErrors {
    /// The percentage given to the what-if explorer is not in [0, 100].
    PercentageOutOfBounds(u32),
    UnknownElectorate(String),
    DuplicateElectorate(String),
    /// A row in the given table refers to an electorate that was not declared.
    UndeclaredElectorate { table: &'static str, stub: String },
    /// The exclusion rounds of an electorate have a gap.
    NonConsecutiveRounds { electorate: String, after: u32, found: u32 },
    /// The running total of a candidate decreased from one round to the next.
    DecreasingRunningTotal {
        electorate: String,
        candidate: String,
        exclusion: u32,
    },
    /// A row received more preferences than its running total.
    PreferencesAboveTotal {
        electorate: String,
        candidate: String,
        exclusion: u32,
    },
    /// The rows of one exclusion round disagree on the number of votes distributed.
    InconsistentVotesDistributed {
        electorate: String,
        exclusion: u32,
        expected: u64,
        found: u64,
    },
}

impl Error for ExplorerErrors {}

impl Display for ExplorerErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExplorerErrors::PercentageOutOfBounds(p) => {
                write!(f, "percentage {} is outside of [0, 100]", p)
            }
            ExplorerErrors::UnknownElectorate(e) => write!(f, "unknown electorate {:?}", e),
            ExplorerErrors::DuplicateElectorate(e) => {
                write!(f, "electorate {:?} is declared twice", e)
            }
            ExplorerErrors::UndeclaredElectorate { table, stub } => write!(
                f,
                "table {} refers to electorate {:?} which is not declared",
                table, stub
            ),
            ExplorerErrors::NonConsecutiveRounds {
                electorate,
                after,
                found,
            } => write!(
                f,
                "electorate {:?}: exclusion round {} follows round {}",
                electorate, found, after
            ),
            ExplorerErrors::DecreasingRunningTotal {
                electorate,
                candidate,
                exclusion,
            } => write!(
                f,
                "electorate {:?}: running total of {:?} decreases at round {}",
                electorate, candidate, exclusion
            ),
            ExplorerErrors::PreferencesAboveTotal {
                electorate,
                candidate,
                exclusion,
            } => write!(
                f,
                "electorate {:?}: {:?} receives more preferences than its running total at round {}",
                electorate, candidate, exclusion
            ),
            ExplorerErrors::InconsistentVotesDistributed {
                electorate,
                exclusion,
                expected,
                found,
            } => write!(
                f,
                "electorate {:?}: round {} distributes {} votes in one row and {} in another",
                electorate, exclusion, expected, found
            ),
        }
    }
}

// ********* Configuration **********

/// The parties that drive the analysis.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ExplorerRules {
    /// The party whose preferences are distributed last in the what-if explorer.
    pub source_party: String,
    /// The party whose share of the distributed preferences is adjusted.
    pub designated_party: String,
    /// The pseudo-party of independent candidates, left out of the party flows.
    pub independent_party: String,
}

impl ExplorerRules {
    pub const DEFAULT_SOURCE_PARTY: &'static str = "The Greens";
    pub const DEFAULT_DESIGNATED_PARTY: &'static str = "ALP";
    pub const DEFAULT_INDEPENDENT_PARTY: &'static str = "IND";
}

impl Default for ExplorerRules {
    fn default() -> Self {
        ExplorerRules {
            source_party: ExplorerRules::DEFAULT_SOURCE_PARTY.to_string(),
            designated_party: ExplorerRules::DEFAULT_DESIGNATED_PARTY.to_string(),
            independent_party: ExplorerRules::DEFAULT_INDEPENDENT_PARTY.to_string(),
        }
    }
}
