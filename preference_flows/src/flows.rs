//! Party to party preference flows, aggregated over all the electorates.

use crate::config::*;
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// The preferences transferred from one party to another.
#[derive(PartialEq, Debug, Clone)]
pub struct PartyFlow {
    pub from_party: String,
    pub to_party: String,
    pub preferences: u64,
    /// The share of all the preferences leaving `from_party`, in percent.
    pub from_pct: f64,
    /// The share of all the preferences received by `to_party`, in percent.
    pub to_pct: f64,
}

/// Sums the preferences for each (from party, to party) pair.
///
/// Rows involving the independent pseudo-party on either side are left out. Pairs that never
/// occur are not reported. The result is sorted by party names.
pub fn aggregate_flows(rows: &[DistributionRow], independent_party: &str) -> Vec<PartyFlow> {
    let mut sums: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    for r in rows
        .iter()
        .filter(|r| r.from_party != independent_party && r.to_party != independent_party)
    {
        *sums
            .entry((r.from_party.as_str(), r.to_party.as_str()))
            .or_insert(0) += r.preferences;
    }

    let mut outflows: HashMap<&str, u64> = HashMap::new();
    let mut inflows: HashMap<&str, u64> = HashMap::new();
    for (&(from, to), &prefs) in sums.iter() {
        *outflows.entry(from).or_insert(0) += prefs;
        *inflows.entry(to).or_insert(0) += prefs;
    }

    let res: Vec<PartyFlow> = sums
        .iter()
        .map(|(&(from, to), &preferences)| PartyFlow {
            from_party: from.to_string(),
            to_party: to.to_string(),
            preferences,
            from_pct: percent(preferences, outflows[from]),
            to_pct: percent(preferences, inflows[to]),
        })
        .collect();
    debug!("aggregate_flows: {} party pairs", res.len());
    res
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// The flows as a table: one row per source party, one column per receiving party, with
/// totals on the margins.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FlowMatrix {
    pub from_parties: Vec<String>,
    pub to_parties: Vec<String>,
    /// `cells[i][j]` is the flow from `from_parties[i]` to `to_parties[j]`.
    pub cells: Vec<Vec<u64>>,
    pub row_totals: Vec<u64>,
    pub column_totals: Vec<u64>,
    pub total: u64,
}

impl FlowMatrix {
    pub const MARGIN_NAME: &'static str = "Total";

    pub fn new(flows: &[PartyFlow]) -> FlowMatrix {
        let from_parties: Vec<String> = flows
            .iter()
            .map(|f| f.from_party.clone())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();
        let to_parties: Vec<String> = flows
            .iter()
            .map(|f| f.to_party.clone())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();
        let from_idx: HashMap<&str, usize> = from_parties
            .iter()
            .enumerate()
            .map(|(i, p)| (p.as_str(), i))
            .collect();
        let to_idx: HashMap<&str, usize> = to_parties
            .iter()
            .enumerate()
            .map(|(i, p)| (p.as_str(), i))
            .collect();

        let mut cells = vec![vec![0u64; to_parties.len()]; from_parties.len()];
        for f in flows.iter() {
            cells[from_idx[f.from_party.as_str()]][to_idx[f.to_party.as_str()]] += f.preferences;
        }
        let row_totals: Vec<u64> = cells.iter().map(|row| row.iter().sum()).collect();
        let column_totals: Vec<u64> = (0..to_parties.len())
            .map(|j| cells.iter().map(|row| row[j]).sum())
            .collect();
        let total = row_totals.iter().sum();
        FlowMatrix {
            from_parties,
            to_parties,
            cells,
            row_totals,
            column_totals,
            total,
        }
    }

    pub fn get(&self, from_party: &str, to_party: &str) -> Option<u64> {
        let i = self.from_parties.iter().position(|p| p == from_party)?;
        let j = self.to_parties.iter().position(|p| p == to_party)?;
        Some(self.cells[i][j])
    }
}

/// Which side of the flow a node stands for.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum FlowSide {
    From,
    To,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FlowNode {
    pub index: usize,
    pub party: String,
    pub side: FlowSide,
}

#[derive(PartialEq, Debug, Clone)]
pub struct FlowEdge {
    pub from: usize,
    pub to: usize,
    pub flow: PartyFlow,
}

/// The flows as a two-layer graph.
///
/// A party that both gives and receives preferences has one node on each side, so that the
/// graph never has cycles. The source nodes come first.
#[derive(PartialEq, Debug, Clone)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

impl FlowGraph {
    pub fn new(flows: &[PartyFlow]) -> FlowGraph {
        let matrix = FlowMatrix::new(flows);
        let mut nodes: Vec<FlowNode> = Vec::new();
        for party in matrix.from_parties.iter() {
            nodes.push(FlowNode {
                index: nodes.len(),
                party: party.clone(),
                side: FlowSide::From,
            });
        }
        for party in matrix.to_parties.iter() {
            nodes.push(FlowNode {
                index: nodes.len(),
                party: party.clone(),
                side: FlowSide::To,
            });
        }
        let lookup: HashMap<(&str, FlowSide), usize> = nodes
            .iter()
            .map(|n| ((n.party.as_str(), n.side), n.index))
            .collect();
        let edges: Vec<FlowEdge> = flows
            .iter()
            .map(|f| FlowEdge {
                from: lookup[&(f.from_party.as_str(), FlowSide::From)],
                to: lookup[&(f.to_party.as_str(), FlowSide::To)],
                flow: f.clone(),
            })
            .collect();
        FlowGraph { nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(from: &str, to: &str, prefs: u64) -> DistributionRow {
        DistributionRow {
            electorate: "e".to_string(),
            exclusion: 1,
            from_party: from.to_string(),
            from_candidate: format!("{} candidate", from),
            to_party: to.to_string(),
            to_candidate: format!("{} candidate", to),
            preferences: prefs,
            votes_distributed: prefs,
            to_running_total: prefs,
            ballot_order: 0,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn percentages_of_the_outflow() {
        let flows = aggregate_flows(&[row("P1", "P2", 100), row("P1", "P3", 50)], "IND");
        assert_eq!(flows.len(), 2);
        assert_eq!(flows[0].to_party, "P2");
        assert!(close(flows[0].from_pct, 100.0 / 150.0 * 100.0));
        assert!(close(flows[0].to_pct, 100.0));
        assert!(close(flows[1].from_pct, 50.0 / 150.0 * 100.0));
    }

    #[test]
    fn independents_are_left_out() {
        let flows = aggregate_flows(
            &[
                row("P1", "P2", 100),
                row("IND", "P2", 30),
                row("P1", "IND", 70),
            ],
            "IND",
        );
        assert_eq!(flows.len(), 1);
        assert!(close(flows[0].from_pct, 100.0));
        assert!(close(flows[0].to_pct, 100.0));
    }

    #[test]
    fn pairs_are_summed_regardless_of_order() {
        let a = aggregate_flows(
            &[
                row("P1", "P2", 10),
                row("P3", "P2", 30),
                row("P1", "P2", 20),
            ],
            "IND",
        );
        let b = aggregate_flows(
            &[
                row("P1", "P2", 20),
                row("P1", "P2", 10),
                row("P3", "P2", 30),
            ],
            "IND",
        );
        assert_eq!(a, b);
        assert_eq!(a[0].preferences, 30);
        assert!(close(a[0].to_pct, 50.0));
    }

    #[test]
    fn zero_preferences_do_not_divide_by_zero() {
        let flows = aggregate_flows(&[row("P1", "P2", 0)], "IND");
        assert_eq!(flows[0].from_pct, 0.0);
        assert_eq!(flows[0].to_pct, 0.0);
    }

    #[test]
    fn matrix_with_margins() {
        let flows = aggregate_flows(
            &[
                row("P1", "P2", 100),
                row("P1", "P3", 50),
                row("P3", "P2", 25),
            ],
            "IND",
        );
        let m = FlowMatrix::new(&flows);
        assert_eq!(m.from_parties, vec!["P1", "P3"]);
        assert_eq!(m.to_parties, vec!["P2", "P3"]);
        assert_eq!(m.get("P3", "P3"), Some(0));
        assert_eq!(m.get("P1", "P2"), Some(100));
        assert_eq!(m.get("P2", "P1"), None);
        assert_eq!(m.row_totals, vec![150, 25]);
        assert_eq!(m.column_totals, vec![125, 50]);
        assert_eq!(m.total, 175);
    }

    #[test]
    fn graph_separates_both_sides() {
        let flows = aggregate_flows(&[row("P1", "P2", 100), row("P2", "P1", 40)], "IND");
        let g = FlowGraph::new(&flows);
        assert_eq!(g.nodes.len(), 4);
        assert_eq!(g.nodes[0].party, "P1");
        assert_eq!(g.nodes[0].side, FlowSide::From);
        assert_eq!(g.nodes[2].party, "P1");
        assert_eq!(g.nodes[2].side, FlowSide::To);
        // P1 -> P2 and P2 -> P1
        assert_eq!((g.edges[0].from, g.edges[0].to), (0, 3));
        assert_eq!((g.edges[1].from, g.edges[1].to), (1, 2));
    }
}
