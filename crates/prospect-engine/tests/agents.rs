//! Integration test: miners and caravans working a small uniform map.
//!
//! Every scenario starts from an empty 5x5 grass grid with only the center
//! at (2, 2), then places mines and agents through commands so the layout
//! does not depend on the seed. Miners spawn on the center, which may also
//! hold a mine.

use prospect_engine::{
    CaravanState, Command, CommandError, MinerState, Simulation, SimulationConfig, TerrainSource,
};
use prospect_grid::{Coordinate, Terrain};

// ── Helpers ──────────────────────────────────────────────────────────

fn empty_config() -> SimulationConfig {
    let mut cfg = SimulationConfig::default();
    cfg.map.width = 5;
    cfg.map.height = 5;
    cfg.map.terrain = TerrainSource::Uniform(Terrain::Grass);
    cfg.mines.count = 0;
    cfg.miner.count = 0;
    cfg.caravan.count = 0;
    cfg.dt = 0.5;
    cfg.max_workers = Some(2);
    cfg
}

fn mine_at(sim: &Simulation, at: Coordinate, gold: f32, food: u32) {
    sim.submit(Command::CreateMine {
        at,
        gold,
        food,
        max_food: None,
    })
    .unwrap();
}

fn miner_state(sim: &Simulation) -> MinerState {
    let registry = sim.world().context().registry();
    let miner = registry.miners().next().expect("one miner");
    let state = miner.lock().unwrap().state();
    state
}

fn miner_gold(sim: &Simulation) -> f32 {
    let registry = sim.world().context().registry();
    let miner = registry.miners().next().expect("one miner");
    let gold = miner.lock().unwrap().gold();
    gold
}

fn caravan_state(sim: &Simulation) -> CaravanState {
    let registry = sim.world().context().registry();
    let caravan = registry.caravans().next().expect("one caravan");
    let state = caravan.lock().unwrap().state();
    state
}

fn mine_food(sim: &Simulation) -> u32 {
    let registry = sim.world().context().registry();
    let mine = registry.mines().next().expect("one mine");
    let food = mine.food().contained();
    food
}

// ── Miner ────────────────────────────────────────────────────────────

#[test]
fn miner_walks_to_mine_and_digs() {
    let mut sim = Simulation::new(empty_config()).unwrap();
    mine_at(&sim, Coordinate::new(0, 0), 50.0, 100);
    sim.submit(Command::SpawnMiner { at: None }).unwrap();

    let mut states = vec![MinerState::Idle];
    let mut last_gold: Option<f32> = None;
    for _ in 0..40 {
        sim.step();
        let state = miner_state(&sim);
        if states.last() != Some(&state) {
            states.push(state);
        }
        if state == MinerState::Mine {
            let gold = miner_gold(&sim);
            // The arrival step enters Mine without digging yet.
            if let Some(last) = last_gold {
                assert!(gold > last, "gold did not rise: {last} -> {gold}");
            }
            last_gold = Some(gold);
        }
    }

    assert!(
        states.starts_with(&[
            MinerState::Idle,
            MinerState::FindMine,
            MinerState::Move,
            MinerState::Mine,
        ]),
        "unexpected state sequence {states:?}"
    );
    assert!(last_gold.is_some_and(|g| g > 0.0));
}

#[test]
fn mine_on_the_center_cell_is_worked() {
    let mut cfg = empty_config();
    cfg.miner.max_gold = 2.0;
    cfg.miner.mine_speed = 4.0;
    let mut sim = Simulation::new(cfg).unwrap();
    let home = Coordinate::new(2, 2);
    mine_at(&sim, home, 50.0, 100);
    sim.submit(Command::SpawnMiner { at: None }).unwrap();

    let mut states = vec![MinerState::Idle];
    for _ in 0..40 {
        sim.step();
        let state = miner_state(&sim);
        if states.last() != Some(&state) {
            states.push(state);
        }
    }

    assert!(states.contains(&MinerState::Mine), "never entered Mine: {states:?}");
    let center = sim.world().center().unwrap();
    assert_eq!(center.coordinate(), home);
    assert!(center.gold().contained() >= 2.0);
    let mine = sim.world().mine_on(home).unwrap();
    assert!(mine.gold().contained() < 50.0);
}

#[test]
fn mine_out_of_food_stops_digging_with_budget_left() {
    let mut cfg = empty_config();
    cfg.miner.gold_per_food = 100.0;
    cfg.miner.max_gold = 1000.0;
    let mut sim = Simulation::new(cfg).unwrap();
    let at = Coordinate::new(1, 2);
    mine_at(&sim, at, 500.0, 1);
    sim.submit(Command::SpawnMiner { at: None }).unwrap();

    let mut starving_mine_ticks = 0;
    let mut went_idle = false;
    let mut entered_mine = false;
    for _ in 0..60 {
        sim.step();
        let state = miner_state(&sim);
        if state == MinerState::Mine {
            entered_mine = true;
            if mine_food(&sim) == 0 {
                starving_mine_ticks += 1;
            }
        } else if entered_mine && state == MinerState::Idle {
            went_idle = true;
        }
    }

    assert!(entered_mine);
    // The step that eats the last unit ends in Mine; the next one leaves.
    assert!(starving_mine_ticks <= 1, "kept mining on an empty mine for {starving_mine_ticks} steps");
    assert!(went_idle, "miner never stopped for food");
    assert_eq!(miner_state(&sim), MinerState::Idle);
    assert!(sim.world().context().food_requests().contains(at));
    assert!(miner_gold(&sim) < 100.0);
}

#[test]
fn full_miner_deposits_at_center() {
    let mut cfg = empty_config();
    cfg.miner.max_gold = 2.0;
    cfg.miner.mine_speed = 4.0;
    let mut sim = Simulation::new(cfg).unwrap();
    mine_at(&sim, Coordinate::new(1, 2), 50.0, 100);
    sim.submit(Command::SpawnMiner { at: None }).unwrap();

    for _ in 0..60 {
        sim.step();
    }
    let center = sim.world().center().unwrap();
    assert!(center.gold().contained() >= 2.0);
    let mine = sim.world().mine_on(Coordinate::new(1, 2)).unwrap();
    assert!(mine.gold().contained() < 50.0);
}

#[test]
fn depleted_mine_is_removed() {
    let mut cfg = empty_config();
    cfg.miner.mine_speed = 10.0;
    let mut sim = Simulation::new(cfg).unwrap();
    mine_at(&sim, Coordinate::new(2, 1), 3.0, 100);
    sim.submit(Command::SpawnMiner { at: None }).unwrap();

    for _ in 0..30 {
        sim.step();
    }
    let world = sim.world();
    assert_eq!(world.context().registry().mines().count(), 0);
    assert!(world.mine_on(Coordinate::new(2, 1)).is_none());
    assert_eq!(world.closest_mine(Coordinate::new(2, 2)), None);
}

// ── Caravan ──────────────────────────────────────────────────────────

#[test]
fn caravan_feeds_starving_mine() {
    let mut sim = Simulation::new(empty_config()).unwrap();
    let at = Coordinate::new(0, 0);
    mine_at(&sim, at, 50.0, 0);
    sim.submit(Command::SpawnMiner { at: Some(at) }).unwrap();
    sim.submit(Command::SpawnCaravan { at: None }).unwrap();

    let mut requested = false;
    let mut delivered = false;
    for _ in 0..80 {
        sim.step();
        requested |= sim.world().context().food_requests().contains(at);
        if mine_food(&sim) > 0 {
            delivered = true;
            break;
        }
    }
    assert!(requested, "starving mine never asked for food");
    assert!(delivered, "caravan never delivered");

    for _ in 0..5 {
        sim.step();
    }
    let requests = sim.world().context().food_requests();
    assert_eq!(requests.pending(), 0);
    assert_eq!(requests.claimed(), 0);
}

// ── Alarm ────────────────────────────────────────────────────────────

#[test]
fn alarm_sends_everyone_into_hiding() {
    let mut sim = Simulation::new(empty_config()).unwrap();
    mine_at(&sim, Coordinate::new(0, 0), 50.0, 100);
    sim.submit(Command::SpawnMiner { at: None }).unwrap();
    sim.submit(Command::SpawnCaravan { at: None }).unwrap();
    for _ in 0..6 {
        sim.step();
    }

    sim.submit(Command::SetAlarm { raised: true }).unwrap();
    for _ in 0..30 {
        sim.step();
    }
    assert!(sim.world().context().alarm().is_raised());
    assert_eq!(miner_state(&sim), MinerState::Hide);
    assert_eq!(caravan_state(&sim), CaravanState::Hide);
    let center = sim.world().center().unwrap().coordinate();
    let registry = sim.world().context().registry();
    for miner in registry.miners() {
        assert_eq!(miner.lock().unwrap().coordinate(), center);
    }

    sim.submit(Command::SetAlarm { raised: false }).unwrap();
    let metrics = sim.step();
    assert!(metrics.transitions > 0);
    assert_ne!(miner_state(&sim), MinerState::Hide);
    assert_ne!(caravan_state(&sim), CaravanState::Hide);
}

#[test]
fn repeated_alarm_is_a_no_op() {
    let mut sim = Simulation::new(empty_config()).unwrap();
    sim.submit(Command::SpawnMiner { at: None }).unwrap();
    sim.step();
    sim.submit(Command::SetAlarm { raised: false }).unwrap();
    let metrics = sim.step();
    assert_eq!(metrics.commands_applied, 1);
    assert!(!sim.world().context().alarm().is_raised());
}

// ── Commands ─────────────────────────────────────────────────────────

#[test]
fn unknown_removal_is_rejected() {
    let mut sim = Simulation::new(empty_config()).unwrap();
    let id = prospect_core::ContainableId::new(prospect_core::ContainableKind::Mine, 3);
    sim.submit(Command::Remove { id }).unwrap();
    let metrics = sim.step();
    assert_eq!(metrics.commands_rejected, 1);
    let receipt = &sim.receipts()[0];
    assert!(!receipt.accepted);
    assert_eq!(receipt.applied_tick_id, None);
    assert_eq!(receipt.reason, Some(CommandError::UnknownContainable { id }));
}

#[test]
fn spawn_without_center_is_rejected() {
    let mut sim = Simulation::new(empty_config()).unwrap();
    let center = sim.world().center().unwrap().id();
    sim.remove(center).unwrap();
    sim.submit(Command::SpawnCaravan { at: None }).unwrap();
    sim.step();
    assert_eq!(sim.receipts()[0].reason, Some(CommandError::NoCenter));
}
