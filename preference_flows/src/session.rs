//! The state of one user of the dashboard.
//!
//! A session shares the immutable dataset with the other sessions and owns its own what-if
//! working copy. Changing a parameter recomputes the derived tables and then notifies the
//! subscribers, in order of subscription, before returning.

use crate::config::*;
use crate::flows::{aggregate_flows, FlowGraph, FlowMatrix, PartyFlow};
use crate::rounds::ElectorateRounds;
use crate::{Dataset, WhatIfExplorer};
use log::{debug, info};
use std::sync::Arc;

/// What changed in a session.
#[derive(Debug, Clone, Copy)]
pub enum SessionEvent<'a> {
    PercentageChanged {
        percentage: u32,
        explorer: &'a WhatIfExplorer,
    },
    ElectorateSelected {
        electorate: &'a ElectorateRecord,
    },
}

/// Receives the events of a session.
pub trait SessionSubscriber {
    fn on_event(&mut self, event: &SessionEvent<'_>);
}

impl<F> SessionSubscriber for F
where
    F: FnMut(&SessionEvent<'_>),
{
    fn on_event(&mut self, event: &SessionEvent<'_>) {
        self(event)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct SubscriptionId(u64);

struct SubscriberEntry {
    id: SubscriptionId,
    subscriber: Box<dyn SessionSubscriber>,
}

pub struct ExplorerSession {
    dataset: Arc<Dataset>,
    rules: ExplorerRules,
    flows: Vec<PartyFlow>,
    explorer: WhatIfExplorer,
    selected: usize,
    subscribers: Vec<SubscriberEntry>,
    next_id: u64,
}

impl ExplorerSession {
    pub fn new(dataset: Arc<Dataset>, rules: &ExplorerRules) -> ExplorerSession {
        let flows = aggregate_flows(dataset.distribution(), &rules.independent_party);
        let explorer = WhatIfExplorer::from_dataset(&dataset, rules);
        info!(
            "New session: {} party flows, what-if percentage {}",
            flows.len(),
            explorer.percentage()
        );
        ExplorerSession {
            dataset,
            rules: rules.clone(),
            flows,
            explorer,
            selected: 0,
            subscribers: Vec::new(),
            next_id: 1,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn rules(&self) -> &ExplorerRules {
        &self.rules
    }

    pub fn baseline_tally(&self) -> &PartyTally {
        self.dataset.baseline_tally()
    }

    pub fn flows(&self) -> &[PartyFlow] {
        &self.flows
    }

    pub fn flow_matrix(&self) -> FlowMatrix {
        FlowMatrix::new(&self.flows)
    }

    pub fn flow_graph(&self) -> FlowGraph {
        FlowGraph::new(&self.flows)
    }

    pub fn explorer(&self) -> &WhatIfExplorer {
        &self.explorer
    }

    pub fn percentage(&self) -> u32 {
        self.explorer.percentage()
    }

    pub fn new_tally(&self) -> &PartyTally {
        self.explorer.new_tally()
    }

    /// Changes the what-if percentage.
    ///
    /// Returns false (and notifies nobody) if the percentage did not change.
    pub fn set_percentage(&mut self, percentage: u32) -> Result<bool, ExplorerErrors> {
        if percentage == self.explorer.percentage() {
            return Ok(false);
        }
        self.explorer.set_percentage(percentage)?;
        let event = SessionEvent::PercentageChanged {
            percentage,
            explorer: &self.explorer,
        };
        for entry in self.subscribers.iter_mut() {
            entry.subscriber.on_event(&event);
        }
        Ok(true)
    }

    /// The electorate of the round by round view. The first declared electorate by default.
    pub fn selected_electorate(&self) -> Option<&ElectorateRecord> {
        self.dataset.electorates().get(self.selected)
    }

    /// Selects an electorate by stub or by name.
    pub fn select_electorate(&mut self, key: &str) -> Result<bool, ExplorerErrors> {
        let e = self.dataset.find_electorate(key)?;
        let idx = self
            .dataset
            .electorates()
            .iter()
            .position(|x| x.stub == e.stub)
            .ok_or_else(|| ExplorerErrors::UnknownElectorate(key.to_string()))?;
        if idx == self.selected {
            return Ok(false);
        }
        self.selected = idx;
        let event = SessionEvent::ElectorateSelected {
            electorate: &self.dataset.electorates()[idx],
        };
        for entry in self.subscribers.iter_mut() {
            entry.subscriber.on_event(&event);
        }
        Ok(true)
    }

    pub fn selected_rounds(&self) -> Result<ElectorateRounds, ExplorerErrors> {
        match self.selected_electorate() {
            Some(e) => self.dataset.electorate_rounds(&e.stub),
            None => Err(ExplorerErrors::UnknownElectorate(String::new())),
        }
    }

    pub fn subscribe<S>(&mut self, subscriber: S) -> SubscriptionId
    where
        S: SessionSubscriber + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(SubscriberEntry {
            id,
            subscriber: Box::new(subscriber),
        });
        debug!("subscribe: {:?}", id);
        id
    }

    /// Returns false if the subscription was not found.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        if let Some(position) = self.subscribers.iter().position(|e| e.id == id) {
            self.subscribers.remove(position);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn dist(electorate: &str, to_party: &str, to: &str, prefs: u64, total: u64) -> DistributionRow {
        DistributionRow {
            electorate: electorate.to_string(),
            exclusion: 1,
            from_party: "The Greens".to_string(),
            from_candidate: "G".to_string(),
            to_party: to_party.to_string(),
            to_candidate: to.to_string(),
            preferences: prefs,
            votes_distributed: 1000,
            to_running_total: total,
            ballot_order: 0,
        }
    }

    fn dataset() -> Arc<Dataset> {
        let mut b = Builder::new()
            .electorates(&[
                ("e1".to_string(), "First".to_string()),
                ("e2".to_string(), "Second".to_string()),
                ("e3".to_string(), "Third".to_string()),
            ])
            .unwrap();
        b.add_distribution_row(dist("e1", "ALP", "X", 700, 4700));
        b.add_distribution_row(dist("e1", "LNP", "Y", 300, 3800));
        b.add_distribution_row(dist("e2", "IND", "I", 500, 9000));
        b.add_distribution_row(dist("e2", "LNP", "Z", 500, 4000));
        b.add_final_tally("e1", "ALP", 4700);
        b.add_final_tally("e1", "LNP", 3800);
        b.add_final_tally("e2", "IND", 9000);
        b.add_final_tally("e2", "LNP", 4000);
        b.add_final_tally("e3", "LNP", 5000);
        Arc::new(b.build().unwrap())
    }

    #[test]
    fn subscribers_see_recomputed_tallies() {
        let mut session = ExplorerSession::new(dataset(), &ExplorerRules::default());
        assert_eq!(session.percentage(), 70);
        let seen: Rc<RefCell<Vec<(u32, u64)>>> = Rc::new(RefCell::new(Vec::new()));
        let seen2 = seen.clone();
        session.subscribe(move |event: &SessionEvent<'_>| {
            if let SessionEvent::PercentageChanged {
                percentage,
                explorer,
            } = event
            {
                seen2
                    .borrow_mut()
                    .push((*percentage, explorer.new_tally().get("LNP")));
            }
        });
        assert_eq!(session.set_percentage(20), Ok(true));
        assert_eq!(session.set_percentage(20), Ok(false));
        assert_eq!(session.set_percentage(80), Ok(true));
        assert_eq!(*seen.borrow(), vec![(20, 2), (80, 1)]);
        assert_eq!(session.new_tally().get("IND"), 1);
    }

    #[test]
    fn invalid_percentage_is_not_published() {
        let mut session = ExplorerSession::new(dataset(), &ExplorerRules::default());
        let count = Rc::new(RefCell::new(0));
        let count2 = count.clone();
        session.subscribe(move |_: &SessionEvent<'_>| *count2.borrow_mut() += 1);
        assert!(session.set_percentage(150).is_err());
        assert_eq!(*count.borrow(), 0);
        assert_eq!(session.percentage(), 70);
    }

    #[test]
    fn unsubscribe_stops_events() {
        let mut session = ExplorerSession::new(dataset(), &ExplorerRules::default());
        let count = Rc::new(RefCell::new(0));
        let count2 = count.clone();
        let id = session.subscribe(move |_: &SessionEvent<'_>| *count2.borrow_mut() += 1);
        session.set_percentage(10).unwrap();
        assert!(session.unsubscribe(id));
        assert!(!session.unsubscribe(id));
        session.set_percentage(90).unwrap();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn electorate_selection() {
        let mut session = ExplorerSession::new(dataset(), &ExplorerRules::default());
        assert_eq!(session.selected_electorate().unwrap().stub, "e1");
        let names = Rc::new(RefCell::new(Vec::new()));
        let names2 = names.clone();
        session.subscribe(move |event: &SessionEvent<'_>| {
            if let SessionEvent::ElectorateSelected { electorate } = event {
                names2.borrow_mut().push(electorate.name.clone());
            }
        });
        assert_eq!(session.select_electorate("Second"), Ok(true));
        assert_eq!(session.select_electorate("e2"), Ok(false));
        assert!(session.select_electorate("Fourth").is_err());
        assert_eq!(*names.borrow(), vec!["Second".to_string()]);
        assert_eq!(session.selected_rounds().unwrap().electorate, "e2");
    }

    #[test]
    fn sessions_are_independent() {
        let ds = dataset();
        let mut s1 = ExplorerSession::new(ds.clone(), &ExplorerRules::default());
        let s2 = ExplorerSession::new(ds, &ExplorerRules::default());
        s1.set_percentage(0).unwrap();
        assert_eq!(s1.explorer().rounds()[0].designated().preferences, 0);
        assert_eq!(s2.explorer().rounds()[0].designated().preferences, 700);
        assert_eq!(s2.new_tally(), s2.baseline_tally());
    }

    #[test]
    fn flows_leave_out_independents() {
        let session = ExplorerSession::new(dataset(), &ExplorerRules::default());
        let to: Vec<&str> = session.flows().iter().map(|f| f.to_party.as_str()).collect();
        assert_eq!(to, vec!["ALP", "LNP"]);
        assert_eq!(session.flow_matrix().get("The Greens", "LNP"), Some(800));
    }
}
