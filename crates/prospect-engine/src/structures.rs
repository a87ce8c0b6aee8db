//! Static containables: gold mines and the town center.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use prospect_core::{ContainableId, ContainableKind};
use prospect_grid::{Coordinate, NodeContainable, Placement};

use crate::lock;
use crate::resources::{FoodContainer, GoldContainer};

/// A gold deposit with a food stock for the miners working it.
#[derive(Debug)]
pub struct Mine {
    placement: Placement,
    gold: Mutex<GoldContainer>,
    food: Mutex<FoodContainer>,
    removed: AtomicBool,
}

impl Mine {
    /// A mine at `at` holding `gold`, with `food` of `max_food` stocked.
    pub fn new(slot: u32, at: Coordinate, gold: f32, food: u32, max_food: u32) -> Self {
        Self {
            placement: Placement::new(ContainableId::new(ContainableKind::Mine, slot), at),
            gold: Mutex::new(GoldContainer::new(gold, gold)),
            food: Mutex::new(FoodContainer::new(food, max_food)),
            removed: AtomicBool::new(false),
        }
    }

    /// This mine's id.
    pub fn id(&self) -> ContainableId {
        self.placement.containable_id()
    }

    /// Cell the mine stands on.
    pub fn coordinate(&self) -> Coordinate {
        self.placement.node_coordinate()
    }

    /// Lock the gold deposit.
    pub fn gold(&self) -> MutexGuard<'_, GoldContainer> {
        lock(&self.gold)
    }

    /// Lock the food stock.
    pub fn food(&self) -> MutexGuard<'_, FoodContainer> {
        lock(&self.food)
    }

    /// `true` once the mine has been taken off the map. Agents still
    /// holding it treat it as gone.
    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    pub(crate) fn mark_removed(&self) {
        self.removed.store(true, Ordering::Release);
    }

    /// `true` if the mine is on the map and has gold left.
    pub fn is_workable(&self) -> bool {
        !self.is_removed() && !self.gold().is_empty()
    }
}

impl NodeContainable for Mine {
    fn containable_id(&self) -> ContainableId {
        self.placement.containable_id()
    }

    fn node_coordinate(&self) -> Coordinate {
        self.placement.node_coordinate()
    }

    fn set_node_coordinate(&self, coordinate: Coordinate) {
        self.placement.set_node_coordinate(coordinate);
    }
}

/// Where miners deposit gold and caravans load food.
#[derive(Debug)]
pub struct Center {
    placement: Placement,
    gold: Mutex<GoldContainer>,
    food: Mutex<FoodContainer>,
}

impl Center {
    /// A center at `at` with an empty treasury and `food` in stock.
    pub fn new(slot: u32, at: Coordinate, food: u32) -> Self {
        Self {
            placement: Placement::new(ContainableId::new(ContainableKind::Center, slot), at),
            gold: Mutex::new(GoldContainer::unbounded(0.0)),
            food: Mutex::new(FoodContainer::unbounded(food)),
        }
    }

    /// This center's id.
    pub fn id(&self) -> ContainableId {
        self.placement.containable_id()
    }

    /// Cell the center stands on.
    pub fn coordinate(&self) -> Coordinate {
        self.placement.node_coordinate()
    }

    /// Lock the treasury.
    pub fn gold(&self) -> MutexGuard<'_, GoldContainer> {
        lock(&self.gold)
    }

    /// Lock the food stock.
    pub fn food(&self) -> MutexGuard<'_, FoodContainer> {
        lock(&self.food)
    }
}

impl NodeContainable for Center {
    fn containable_id(&self) -> ContainableId {
        self.placement.containable_id()
    }

    fn node_coordinate(&self) -> Coordinate {
        self.placement.node_coordinate()
    }

    fn set_node_coordinate(&self, coordinate: Coordinate) {
        self.placement.set_node_coordinate(coordinate);
    }
}
