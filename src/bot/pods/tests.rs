use super::*;
use crate::bot::action::{ActionInterface, Placement, Team, UnitId, UnitKind};
use crate::bot::config::{BotConfig, SimConfig};
use crate::bot::grid::{Cell, Grid};
use crate::bot::pathfinding::Navigator;
use crate::bot::sim::SimWorld;
use crate::bot::time_budget::TimeBudget;
use std::collections::BTreeSet;

struct Harness {
    sim: SimWorld,
    config: BotConfig,
    navigator: Navigator,
    budget: TimeBudget,
    resources: ResourceMap,
}

impl Harness {
    fn new(grid: Grid) -> Self {
        let config = BotConfig::default();
        let navigator = Navigator::new(grid.clone(), &config);
        let resources = ResourceMap::new(grid.clone());
        Self {
            sim: SimWorld::new(grid, SimConfig::default()),
            budget: TimeBudget::new(config.initial_budget_ms, config.budget_increment_ms),
            config,
            navigator,
            resources,
        }
    }

    fn worker(&mut self, x: i32, y: i32) -> UnitId {
        self.sim
            .spawn_unit(UnitKind::Worker, Team::Friendly, Cell::new(x, y))
            .expect("cell should be free")
    }

    fn step(&mut self, pods: &mut PodManager) -> PodTurn {
        self.budget.begin_turn();
        self.resources.refresh(&self.sim);
        pods.prune(&self.sim);
        let turn = pods
            .take_turn(&mut self.sim, &self.config, &mut self.navigator, &self.budget, &self.resources)
            .expect("legal actions only");
        self.sim.end_turn();
        turn
    }
}

fn single_pod(members: &[UnitId], order: Order) -> PodManager {
    let mut registry = PodRegistry::new();
    registry.insert(members.iter().copied().collect(), order);
    PodManager::from_registry(registry)
}

#[test]
fn test_clustering_matches_chain_reachability() {
    let mut rng = fastrand::Rng::with_seed(5);
    for trial in 0..20 {
        let mut h = Harness::new(Grid::open(20, 20));
        let mut placed: Vec<(UnitId, Cell)> = Vec::new();
        while placed.len() < 12 {
            let cell = Cell::new(rng.i32(0..20), rng.i32(0..20));
            if let Some(id) = h.sim.spawn_unit(UnitKind::Worker, Team::Friendly, cell) {
                placed.push((id, cell));
            }
        }

        // Reference components by repeated relaxation of a label per unit.
        let mut label: Vec<usize> = (0..placed.len()).collect();
        let mut changed = true;
        while changed {
            changed = false;
            for i in 0..placed.len() {
                for j in 0..placed.len() {
                    if placed[i].1.distance_squared_to(placed[j].1) <= 16 && label[j] < label[i] {
                        label[i] = label[j];
                        changed = true;
                    }
                }
            }
        }

        let pods = cluster_workers(&h.sim, 16);
        let pod_of = |id: UnitId| pods.iter().position(|p| p.contains(&id)).expect("every worker is in a pod");
        for i in 0..placed.len() {
            for j in 0..placed.len() {
                assert_eq!(
                    pod_of(placed[i].0) == pod_of(placed[j].0),
                    label[i] == label[j],
                    "trial {}: units {:?} and {:?}",
                    trial,
                    placed[i],
                    placed[j]
                );
            }
        }
        let total: usize = pods.iter().map(BTreeSet::len).sum();
        assert_eq!(total, placed.len(), "Pods must partition the workers");
    }
}

#[test]
fn test_near_units_share_a_pod_far_units_do_not() {
    let mut h = Harness::new(Grid::open(30, 30));
    let a = h.worker(2, 2);
    let b = h.worker(5, 2);
    let c = h.worker(2, 22);

    let pods = cluster_workers(&h.sim, h.config.sensor_radius_sq);
    assert_eq!(pods.len(), 2);
    assert_eq!(pods[0], BTreeSet::from([a, b]));
    assert_eq!(pods[1], BTreeSet::from([c]));
}

#[test]
fn test_exactly_one_builder_after_initialization() {
    let mut rng = fastrand::Rng::with_seed(21);
    for pods_wanted in 1..=5 {
        let mut rows = vec![String::new(); 12];
        for row in rows.iter_mut() {
            for _ in 0..60 {
                row.push(if rng.u8(0..4) == 0 { '3' } else { '.' });
            }
        }
        let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let mut h = Harness::new(Grid::from_ascii(&row_refs));
        for i in 0..pods_wanted {
            h.worker(2 + 12 * i as i32, 5);
        }

        let pods = PodManager::initialize(&h.sim, &h.resources, &h.config);
        let (mine, build, rocket) = pods.registry().order_counts();
        println!("{} pods -> mine {} build {} rocket {}", pods_wanted, mine, build, rocket);
        assert_eq!(pods.registry().len(), pods_wanted);
        assert_eq!(build, 1, "Exactly one pod builds");
        assert_eq!(mine, pods_wanted - 1);
        assert_eq!(rocket, 0);
    }
}

#[test]
fn test_poorest_pod_builds() {
    let grid = Grid::from_ascii(&[
        "99.............",
        "99.............",
        "99.............",
    ]);
    let mut h = Harness::new(grid);
    let rich = h.worker(1, 1);
    let poor = h.worker(14, 1);

    let pods = PodManager::initialize(&h.sim, &h.resources, &h.config);
    let order_of = |unit| {
        let id = pods.registry().pod_of(unit).unwrap();
        pods.registry().get(id).unwrap().order
    };
    assert_eq!(order_of(rich), Order::Mine);
    assert_eq!(order_of(poor), Order::Build);
}

#[test]
fn test_idle_build_pod_switches_to_successor() {
    for successor in [Order::Rocket, Order::Mine] {
        let mut h = Harness::new(Grid::open(6, 6));
        h.config.build_idle_successor = successor;
        // Nothing affordable: the pod can never lay or build anything.
        h.sim.set_stockpile(0);
        let worker = h.worker(0, 0);
        let mut pods = single_pod(&[worker], Order::Build);
        let id = pods.registry().pod_of(worker).unwrap();

        for turn in 1..=h.config.build_idle_threshold + 1 {
            h.step(&mut pods);
            let pod = pods.registry().get(id).unwrap();
            assert_eq!(pod.order, Order::Build, "turn {}: still building", turn);
            assert_eq!(pod.idle_turns, turn);
        }

        h.step(&mut pods);
        assert_eq!(pods.registry().get(id).unwrap().order, successor);
    }
}

#[test]
fn test_blocked_builder_keeps_build_order() {
    use crate::bot::pathfinding::Direction;

    let mut h = Harness::new(Grid::open(8, 8));
    let helper = h.worker(5, 5);
    let factory = h.sim.blueprint(helper, UnitKind::Factory, Direction::North).expect("foundation laid");
    h.sim.destroy_unit(helper);

    // Boxed into the corner by enemy units, so no step toward the foundation is legal.
    let builder = h.worker(0, 0);
    for (x, y) in [(1, 0), (0, 1), (1, 1)] {
        h.sim.spawn_unit(UnitKind::Worker, Team::Enemy, Cell::new(x, y)).unwrap();
    }
    let mut pods = single_pod(&[builder], Order::Build);
    let id = pods.registry().pod_of(builder).unwrap();
    pods.registry_mut().get_mut(id).unwrap().build_target = Some(factory);

    for turn in 1..=h.config.build_idle_threshold + 3 {
        let activity = h.step(&mut pods);
        let pod = pods.registry().get(id).unwrap();
        println!("turn {} order {:?} idle {}", turn, pod.order, pod.idle_turns);
        assert_eq!(activity.moves, 0, "turn {}: the builder cannot move", turn);
        assert_eq!(pod.order, Order::Build, "turn {}: a member still heads for the target", turn);
        assert_eq!(pod.idle_turns, 0);
    }
    assert_eq!(h.sim.unit(builder).unwrap().cell(), Some(Cell::new(0, 0)));
    assert!(!h.sim.unit(factory).unwrap().complete);
}

#[test]
fn test_build_pod_lays_and_finishes_a_factory() {
    let mut h = Harness::new(Grid::open(8, 8));
    let a = h.worker(3, 3);
    let b = h.worker(4, 3);
    let mut pods = single_pod(&[a, b], Order::Build);

    let first = h.step(&mut pods);
    assert_eq!(first.foundations, 1);
    let base = pods.base().expect("first foundation sets the base");
    let factory = h.sim.unit_at(base).expect("foundation on the grid");
    assert!(base.is_adjacent_to(Cell::new(3, 3)), "Foundation next to the sample member");
    assert!(!h.sim.unit(factory).unwrap().complete);

    let mut turns = 1;
    while !h.sim.unit(factory).unwrap().complete {
        h.step(&mut pods);
        turns += 1;
        assert!(turns < 40, "factory should complete");
    }
    println!("Factory completed after {} turns", turns);

    let id = pods.registry().pod_of(a).unwrap();
    let pod = pods.registry().get(id).unwrap();
    assert!(pod.len() >= 2);
    assert!(pod.len() <= h.config.build_pod_cap, "Spawning respects the pod cap");
}

#[test]
fn test_spawned_units_join_their_pod() {
    let mut h = Harness::new(Grid::open(8, 8));
    let a = h.worker(3, 3);
    let mut pods = single_pod(&[a], Order::Build);

    h.step(&mut pods);
    h.step(&mut pods);

    let id = pods.registry().pod_of(a).unwrap();
    let members = pods.registry().get(id).unwrap().members.clone();
    assert!(members.len() > 1, "Lone builder should have spawned");
    for unit in members {
        assert_eq!(pods.registry().pod_of(unit), Some(id));
        assert!(h.sim.unit(unit).is_some());
    }
}

#[test]
fn test_mine_pod_walks_to_deposit_and_harvests() {
    let mut h = Harness::new(Grid::from_ascii(&["......5"]));
    let worker = h.worker(0, 0);
    let mut pods = single_pod(&[worker], Order::Mine);

    let mut harvested = 0;
    for _ in 0..10 {
        harvested += h.step(&mut pods).harvests;
    }
    let id = pods.registry().pod_of(worker).unwrap();
    assert_eq!(pods.registry().get(id).unwrap().mining_target, Some(Cell::new(6, 0)));
    assert!(harvested > 0);
    assert!(h.sim.total_harvested() > 0);
    assert_eq!(h.sim.unit(worker).unwrap().cell(), Some(Cell::new(5, 0)));
}

#[test]
fn test_mine_pod_without_deposits_does_nothing() {
    let mut h = Harness::new(Grid::open(5, 5));
    let worker = h.worker(2, 2);
    let mut pods = single_pod(&[worker], Order::Mine);

    let turn = h.step(&mut pods);
    assert_eq!(turn, PodTurn::default());
    let id = pods.registry().pod_of(worker).unwrap();
    assert_eq!(pods.registry().get(id).unwrap().mining_target, None);
}

#[test]
fn test_nearest_deposit_respects_walls() {
    let grid = Grid::from_ascii(&[
        ".......",
        ".#####.",
        ".#.9.#.",
        ".#####.",
        ".......",
        "......2",
    ]);
    let resources = ResourceMap::new(grid);
    // The 9 is closer as the crow flies but walled in.
    assert_eq!(resources.nearest_deposit(Cell::new(0, 1)), Some(Cell::new(6, 0)));
    assert_eq!(resources.nearest_deposit(Cell::new(2, 3)), Some(Cell::new(3, 3)));
}

#[test]
fn test_resource_refresh_only_lowers_sensed_cells() {
    let grid = Grid::from_ascii(&["5.........................5"]);
    let mut sim = SimWorld::new(grid.clone(), SimConfig::default());
    sim.spawn_unit(UnitKind::Worker, Team::Friendly, Cell::new(1, 0)).unwrap();
    sim.set_resource(Cell::new(0, 0), 20);
    sim.set_resource(Cell::new(26, 0), 0);

    let mut resources = ResourceMap::new(grid);
    let changed = resources.refresh(&sim);

    assert_eq!(changed, 1);
    assert_eq!(resources.stock(Cell::new(0, 0)), 20);
    assert_eq!(resources.stock(Cell::new(26, 0)), 50, "Out of sight keeps the old belief");
}

#[test]
fn test_rocket_pod_lays_builds_and_boards() {
    let mut h = Harness::new(Grid::open(5, 5));
    let worker = h.worker(2, 2);
    let mut pods = single_pod(&[worker], Order::Rocket);

    let first = h.step(&mut pods);
    assert_eq!(first.foundations, 1);
    let rocket = h
        .sim
        .units()
        .find(|u| u.kind == UnitKind::Rocket)
        .map(|u| u.id)
        .expect("rocket foundation laid");

    let mut turns = 1;
    while h.sim.unit(worker).unwrap().placement != Placement::Garrisoned(rocket) {
        h.step(&mut pods);
        turns += 1;
        assert!(turns < 40, "worker should board the finished rocket");
    }
    assert!(h.sim.unit(rocket).unwrap().complete);
    assert_eq!(h.sim.count(Team::Friendly, UnitKind::Rocket), 1, "Only one rocket is laid");
}

#[test]
fn test_full_rocket_is_not_a_boarding_target() {
    let mut h = Harness::new(Grid::open(6, 6));
    h.sim = SimWorld::new(Grid::open(6, 6), SimConfig { garrison_capacity: 1, ..Default::default() });
    let rocket = h.sim.spawn_unit(UnitKind::Rocket, Team::Friendly, Cell::new(1, 1)).unwrap();
    let passenger = h.worker(1, 2);
    h.sim.load(rocket, passenger).expect("room for one");
    assert!(!h.sim.unit(rocket).unwrap().has_room());

    let worker = h.worker(4, 4);
    let mut pods = single_pod(&[worker], Order::Rocket);
    let turn = h.step(&mut pods);

    assert_eq!(turn.moves, 0, "No point walking to a full rocket");
    assert_eq!(turn.foundations, 1, "A new rocket is laid instead");
    assert_eq!(h.sim.count(Team::Friendly, UnitKind::Rocket), 2);
}

#[test]
fn test_two_rocket_pods_share_one_foundation() {
    let mut h = Harness::new(Grid::open(12, 3));
    let left = h.worker(0, 1);
    let right = h.worker(11, 1);
    let mut registry = PodRegistry::new();
    registry.insert(BTreeSet::from([left]), Order::Rocket);
    registry.insert(BTreeSet::from([right]), Order::Rocket);
    let mut pods = PodManager::from_registry(registry);

    let turn = h.step(&mut pods);

    assert_eq!(turn.foundations, 1, "The second pod sees the first pod's foundation");
    assert_eq!(h.sim.count(Team::Friendly, UnitKind::Rocket), 1);
    assert_eq!(turn.moves, 1, "The second pod heads for it");
}

#[test]
fn test_pruned_pod_is_kept_and_skipped() {
    let mut h = Harness::new(Grid::from_ascii(&["..5"]));
    let worker = h.worker(0, 0);
    let mut pods = single_pod(&[worker], Order::Mine);
    let id = pods.registry().pod_of(worker).unwrap();

    h.sim.destroy_unit(worker);
    let turn = h.step(&mut pods);

    assert_eq!(turn, PodTurn::default());
    assert_eq!(pods.registry().len(), 1, "Empty pods stay registered");
    assert!(pods.registry().get(id).unwrap().is_empty());
    assert_eq!(pods.registry().pod_of(worker), None);
}

#[test]
fn test_launch_sends_rocket_pods_back_to_mining() {
    let mut registry = PodRegistry::new();
    let a = registry.insert(BTreeSet::from([1]), Order::Rocket);
    let b = registry.insert(BTreeSet::from([2]), Order::Build);
    let mut pods = PodManager::from_registry(registry);

    pods.on_launch();

    assert_eq!(pods.registry().get(a).unwrap().order, Order::Mine);
    assert_eq!(pods.registry().get(b).unwrap().order, Order::Build);
}
