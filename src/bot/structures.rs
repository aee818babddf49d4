use tracing::{debug, info};
use crate::bot::action::{ActionError, ActionInterface, UnitKind};
use crate::bot::config::BotConfig;
use crate::bot::pathfinding::Direction;
use crate::bot::pods::{Order, PodManager};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StructureTurn {
    pub launched: usize,
    pub produced: usize,
    pub unloaded: usize,
}

/// Launch loaded rockets, then let every finished factory produce and empty
/// its garrison.
///
/// While no rocket exists and some pod is saving for one, production stops
/// once the stockpile drops to `rocket_reserve`.
pub fn run_structures<A>(api: &mut A, pods: &mut PodManager, config: &BotConfig) -> Result<StructureTurn, ActionError>
where
    A: ActionInterface + ?Sized,
{
    let mut turn = StructureTurn::default();

    let rockets: Vec<_> = api
        .my_units()
        .into_iter()
        .filter(|u| u.kind == UnitKind::Rocket && u.complete && u.is_on_grid() && u.garrison > 0)
        .collect();
    for rocket in rockets {
        if api.can_launch(rocket.id) {
            api.launch(rocket.id)?;
            info!("[PODS] Rocket {} launched with {} aboard", rocket.id, rocket.garrison);
            turn.launched += 1;
            pods.on_launch();
        }
    }

    let units = api.my_units();
    let no_rocket = !units.iter().any(|u| u.kind == UnitKind::Rocket);
    let saving = no_rocket && pods.registry().any_with(Order::Rocket) && api.stockpile() <= config.rocket_reserve;

    for factory in units.iter().filter(|u| u.kind == UnitKind::Factory && u.complete) {
        if !saving && api.can_produce(factory.id, UnitKind::Ranger) {
            api.produce(factory.id, UnitKind::Ranger)?;
            debug!("[PODS] Factory {} producing", factory.id);
            turn.produced += 1;
        }
        for dir in Direction::COMPASS {
            if api.can_unload(factory.id, dir) {
                api.unload(factory.id, dir)?;
                turn.unloaded += 1;
            }
        }
    }

    Ok(turn)
}
