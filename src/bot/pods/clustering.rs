use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use crate::bot::action::{ActionInterface, Team, UnitId, UnitKind};

/// Partition the friendly on-grid workers into pods.
///
/// Two workers share a pod when a chain of workers, each within
/// `radius_sq` of the next, connects them. Seeds are taken in ascending
/// unit id order, so the resulting pods are ordered by their lowest member.
pub fn cluster_workers<A>(api: &A, radius_sq: i64) -> Vec<BTreeSet<UnitId>>
where
    A: ActionInterface + ?Sized,
{
    let mut processed: FxHashSet<UnitId> = FxHashSet::default();
    let mut pods = Vec::new();

    for seed in api.my_units() {
        if seed.kind != UnitKind::Worker || processed.contains(&seed.id) {
            continue;
        }
        let Some(seed_cell) = seed.cell() else {
            continue;
        };

        let mut pod = BTreeSet::new();
        let mut stack = vec![(seed.id, seed_cell)];
        processed.insert(seed.id);

        while let Some((unit, cell)) = stack.pop() {
            pod.insert(unit);
            for neighbour in api.nearby_units(cell, radius_sq, Team::Friendly, Some(UnitKind::Worker)) {
                let Some(n_cell) = neighbour.cell() else {
                    continue;
                };
                if processed.insert(neighbour.id) {
                    stack.push((neighbour.id, n_cell));
                }
            }
        }

        pods.push(pod);
    }

    pods
}
