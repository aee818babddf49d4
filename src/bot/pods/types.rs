use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use crate::bot::action::UnitId;
use crate::bot::grid::Cell;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PodId(pub u32);

/// Task currently assigned to a pod.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Order {
    Mine,
    Build,
    Rocket,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pod {
    pub id: PodId,
    /// Ascending id order; this order decides tie-breaks.
    pub members: BTreeSet<UnitId>,
    pub order: Order,
    pub mining_target: Option<Cell>,
    pub build_target: Option<UnitId>,
    /// Turns spent in BUILD without progress.
    pub idle_turns: u32,
}

impl Pod {
    pub fn new(id: PodId, members: BTreeSet<UnitId>, order: Order) -> Self {
        Self { id, members, order, mining_target: None, build_target: None, idle_turns: 0 }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Pods by stable id, plus the reverse unit → pod index.
///
/// Pods are never removed; one that loses all members stays registered
/// and is skipped by the turn logic.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PodRegistry {
    pods: BTreeMap<PodId, Pod>,
    unit_to_pod: FxHashMap<UnitId, PodId>,
    next_id: u32,
}

impl PodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, members: BTreeSet<UnitId>, order: Order) -> PodId {
        let id = PodId(self.next_id);
        self.next_id += 1;
        for unit in &members {
            self.unit_to_pod.insert(*unit, id);
        }
        self.pods.insert(id, Pod::new(id, members, order));
        id
    }

    pub fn get(&self, id: PodId) -> Option<&Pod> {
        self.pods.get(&id)
    }

    pub fn get_mut(&mut self, id: PodId) -> Option<&mut Pod> {
        self.pods.get_mut(&id)
    }

    pub fn pod_of(&self, unit: UnitId) -> Option<PodId> {
        self.unit_to_pod.get(&unit).copied()
    }

    /// Pods in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Pod> {
        self.pods.values()
    }

    pub fn ids(&self) -> Vec<PodId> {
        self.pods.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.pods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pods.is_empty()
    }

    pub fn add_member(&mut self, id: PodId, unit: UnitId) {
        if let Some(pod) = self.pods.get_mut(&id) {
            pod.members.insert(unit);
            self.unit_to_pod.insert(unit, id);
        }
    }

    /// Drop members for which `alive` is false. Returns how many were removed.
    pub fn prune(&mut self, mut alive: impl FnMut(UnitId) -> bool) -> usize {
        let mut removed = 0;
        for pod in self.pods.values_mut() {
            let before = pod.members.len();
            pod.members.retain(|unit| alive(*unit));
            removed += before - pod.members.len();
        }
        if removed > 0 {
            self.unit_to_pod.retain(|unit, _| alive(*unit));
        }
        removed
    }

    pub fn any_with(&self, order: Order) -> bool {
        self.pods.values().any(|pod| pod.order == order)
    }

    /// Move every pod in `from` to `to`. Returns how many changed.
    pub fn reassign(&mut self, from: Order, to: Order) -> usize {
        let mut changed = 0;
        for pod in self.pods.values_mut().filter(|pod| pod.order == from) {
            pod.order = to;
            changed += 1;
        }
        changed
    }

    /// Non-empty pods per order as (mine, build, rocket).
    pub fn order_counts(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for pod in self.pods.values().filter(|pod| !pod.is_empty()) {
            match pod.order {
                Order::Mine => counts.0 += 1,
                Order::Build => counts.1 += 1,
                Order::Rocket => counts.2 += 1,
            }
        }
        counts
    }
}
