use lodestar::bot::config::SimConfig;
use lodestar::bot::sim::{generate_map, SimWorld};
use lodestar::bot::{Bot, BotConfig, Cell, Grid, Team, TurnReport, UnitKind};
use std::time::Instant;

fn play(world: &mut SimWorld, bot: &mut Bot, turns: u32) -> Vec<TurnReport> {
    let mut reports = Vec::with_capacity(turns as usize);
    for _ in 0..turns {
        let report = bot.take_turn(world).expect("the bot only commits legal actions");
        reports.push(report);
        world.end_turn();
    }
    reports
}

#[test]
fn test_generated_match_makes_progress() {
    let sim_config = SimConfig { turns: 150, ..Default::default() };
    let map = generate_map(&sim_config);
    let mut world = SimWorld::from_map(&map, sim_config.clone());
    let mut bot = Bot::new(&world, BotConfig::default());

    let (_, building, _) = bot.pods().registry().order_counts();
    assert_eq!(building, 1, "Exactly one pod starts on BUILD");

    let start = Instant::now();
    let reports = play(&mut world, &mut bot, sim_config.turns);
    println!("150 turns in {:?}", start.elapsed());

    let last = reports.last().expect("at least one turn");
    println!("Final report: {:?}", last);
    println!(
        "workers {}, factories {}, rangers {}, harvested {}, launched {}",
        world.count(Team::Friendly, UnitKind::Worker),
        world.count(Team::Friendly, UnitKind::Factory),
        world.count(Team::Friendly, UnitKind::Ranger),
        world.total_harvested(),
        world.launched_units()
    );

    assert!(world.count(Team::Friendly, UnitKind::Factory) >= 1, "A factory should have been laid");
    assert!(bot.pods().base().is_some(), "The first factory sets the base");
    let total_moves: usize = reports.iter().map(|r| r.moves).sum();
    assert!(total_moves > 0, "Units should have moved at some point");
}

#[test]
fn test_mining_pod_harvests_while_builder_builds() {
    // Two groups 16 cells apart; deposits only near the right-hand group.
    let grid = Grid::from_ascii(&[
        "....................",
        "....................",
        "...............99...",
        "....................",
        "....................",
        "....................",
        "....................",
        "....................",
    ]);
    let mut world = SimWorld::new(grid, SimConfig::default());
    let left = [
        world.spawn_unit(UnitKind::Worker, Team::Friendly, Cell::new(1, 1)).unwrap(),
        world.spawn_unit(UnitKind::Worker, Team::Friendly, Cell::new(2, 1)).unwrap(),
    ];
    let right = [
        world.spawn_unit(UnitKind::Worker, Team::Friendly, Cell::new(17, 1)).unwrap(),
        world.spawn_unit(UnitKind::Worker, Team::Friendly, Cell::new(18, 1)).unwrap(),
    ];
    let mut bot = Bot::new(&world, BotConfig::default());

    let registry = bot.pods().registry();
    assert_eq!(registry.len(), 2);
    let left_pod = registry.pod_of(left[0]).expect("left group has a pod");
    let right_pod = registry.pod_of(right[0]).expect("right group has a pod");
    assert_eq!(registry.pod_of(left[1]), Some(left_pod));
    assert_eq!(registry.pod_of(right[1]), Some(right_pod));
    assert_eq!(registry.get(left_pod).unwrap().order, lodestar::bot::pods::Order::Build, "Poorer pod builds");
    assert_eq!(registry.get(right_pod).unwrap().order, lodestar::bot::pods::Order::Mine);

    play(&mut world, &mut bot, 30);

    assert!(world.total_harvested() > 0, "The MINE pod should have reached its deposit");
    assert!(world.count(Team::Friendly, UnitKind::Factory) >= 1);
    assert!(bot.pods().base().is_some_and(|b| b.chebyshev_to(Cell::new(1, 1)) <= 2));
}

#[test]
fn test_removed_workers_leave_their_pods() {
    let mut world = SimWorld::new(Grid::open(12, 12), SimConfig::default());
    let a = world.spawn_unit(UnitKind::Worker, Team::Friendly, Cell::new(1, 1)).unwrap();
    let b = world.spawn_unit(UnitKind::Worker, Team::Friendly, Cell::new(2, 1)).unwrap();
    let mut bot = Bot::new(&world, BotConfig::default());
    let pod = bot.pods().registry().pod_of(a).expect("pod formed");

    world.destroy_unit(a);
    world.destroy_unit(b);
    let report = bot.take_turn(&mut world).expect("turn with an empty pod");

    let registry = bot.pods().registry();
    assert!(registry.get(pod).is_some_and(|p| p.is_empty()), "Emptied pods stay registered");
    assert_eq!(registry.pod_of(a), None);
    assert_eq!(report.moves, 0);
    assert_eq!(report.builds, 0);
}
