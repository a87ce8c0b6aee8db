//! Live containables, owned by kind and slot.

use std::fmt;
use std::sync::{Arc, Mutex};

use prospect_core::{ContainableId, ContainableKind};

use crate::caravan::Caravan;
use crate::miner::Miner;
use crate::structures::{Center, Mine};

/// Dense slot storage that reuses the lowest free slot.
///
/// ```
/// use prospect_engine::registry::Slots;
///
/// let mut slots = Slots::new();
/// assert_eq!(slots.insert("a"), 0);
/// assert_eq!(slots.insert("b"), 1);
/// slots.remove(0);
/// assert_eq!(slots.next_free(), 0);
/// assert_eq!(slots.insert("c"), 0);
/// ```
#[derive(Debug)]
pub struct Slots<T> {
    items: Vec<Option<T>>,
    len: usize,
}

impl<T> Slots<T> {
    /// No slots in use.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            len: 0,
        }
    }

    /// The slot the next [`insert`](Self::insert) will use.
    pub fn next_free(&self) -> u32 {
        let slot = self
            .items
            .iter()
            .position(Option::is_none)
            .unwrap_or(self.items.len());
        slot as u32
    }

    /// Store `item` in the lowest free slot and return that slot.
    pub fn insert(&mut self, item: T) -> u32 {
        let slot = self.next_free();
        match self.items.get_mut(slot as usize) {
            Some(free) => *free = Some(item),
            None => self.items.push(Some(item)),
        }
        self.len += 1;
        slot
    }

    /// The item in `slot`.
    pub fn get(&self, slot: u32) -> Option<&T> {
        self.items.get(slot as usize).and_then(Option::as_ref)
    }

    /// Free `slot`, returning its item.
    pub fn remove(&mut self, slot: u32) -> Option<T> {
        let item = self.items.get_mut(slot as usize)?.take()?;
        self.len -= 1;
        while matches!(self.items.last(), Some(None)) {
            self.items.pop();
        }
        Some(item)
    }

    /// Occupied slots in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> + '_ {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| item.as_ref().map(|t| (i as u32, t)))
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Free every slot.
    pub fn clear(&mut self) {
        self.items.clear();
        self.len = 0;
    }
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A containable taken out of the registry.
#[derive(Debug)]
pub enum Removed {
    /// A mine.
    Mine(Arc<Mine>),
    /// A center.
    Center(Arc<Center>),
    /// A miner.
    Miner(Arc<Mutex<Miner>>),
    /// A caravan.
    Caravan(Arc<Mutex<Caravan>>),
}

/// Owner of every live mine, center, miner and caravan.
///
/// Nodes refer to containables by [`ContainableId`]; the id's slot
/// indexes the per-kind storage here.
#[derive(Default)]
pub struct ContainableRegistry {
    mines: Slots<Arc<Mine>>,
    centers: Slots<Arc<Center>>,
    miners: Slots<Arc<Mutex<Miner>>>,
    caravans: Slots<Arc<Mutex<Caravan>>>,
}

impl ContainableRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The slot the next containable of `kind` will get.
    pub fn next_slot(&self, kind: ContainableKind) -> u32 {
        match kind {
            ContainableKind::Mine => self.mines.next_free(),
            ContainableKind::Center => self.centers.next_free(),
            ContainableKind::Miner => self.miners.next_free(),
            ContainableKind::Caravan => self.caravans.next_free(),
        }
    }

    pub(crate) fn insert_mine(&mut self, mine: Arc<Mine>) -> ContainableId {
        let slot = self.mines.insert(mine);
        ContainableId::new(ContainableKind::Mine, slot)
    }

    pub(crate) fn insert_center(&mut self, center: Arc<Center>) -> ContainableId {
        let slot = self.centers.insert(center);
        ContainableId::new(ContainableKind::Center, slot)
    }

    pub(crate) fn insert_miner(&mut self, miner: Arc<Mutex<Miner>>) -> ContainableId {
        let slot = self.miners.insert(miner);
        ContainableId::new(ContainableKind::Miner, slot)
    }

    pub(crate) fn insert_caravan(&mut self, caravan: Arc<Mutex<Caravan>>) -> ContainableId {
        let slot = self.caravans.insert(caravan);
        ContainableId::new(ContainableKind::Caravan, slot)
    }

    /// The mine with `id`.
    pub fn mine(&self, id: ContainableId) -> Option<&Arc<Mine>> {
        (id.kind == ContainableKind::Mine)
            .then(|| self.mines.get(id.slot))
            .flatten()
    }

    /// The center with `id`.
    pub fn center(&self, id: ContainableId) -> Option<&Arc<Center>> {
        (id.kind == ContainableKind::Center)
            .then(|| self.centers.get(id.slot))
            .flatten()
    }

    /// The miner with `id`.
    pub fn miner(&self, id: ContainableId) -> Option<&Arc<Mutex<Miner>>> {
        (id.kind == ContainableKind::Miner)
            .then(|| self.miners.get(id.slot))
            .flatten()
    }

    /// The caravan with `id`.
    pub fn caravan(&self, id: ContainableId) -> Option<&Arc<Mutex<Caravan>>> {
        (id.kind == ContainableKind::Caravan)
            .then(|| self.caravans.get(id.slot))
            .flatten()
    }

    /// Whether `id` names a live containable.
    pub fn contains(&self, id: ContainableId) -> bool {
        match id.kind {
            ContainableKind::Mine => self.mines.get(id.slot).is_some(),
            ContainableKind::Center => self.centers.get(id.slot).is_some(),
            ContainableKind::Miner => self.miners.get(id.slot).is_some(),
            ContainableKind::Caravan => self.caravans.get(id.slot).is_some(),
        }
    }

    pub(crate) fn remove(&mut self, id: ContainableId) -> Option<Removed> {
        match id.kind {
            ContainableKind::Mine => self.mines.remove(id.slot).map(Removed::Mine),
            ContainableKind::Center => self.centers.remove(id.slot).map(Removed::Center),
            ContainableKind::Miner => self.miners.remove(id.slot).map(Removed::Miner),
            ContainableKind::Caravan => self.caravans.remove(id.slot).map(Removed::Caravan),
        }
    }

    /// Live mines in slot order.
    pub fn mines(&self) -> impl Iterator<Item = &Arc<Mine>> + '_ {
        self.mines.iter().map(|(_, m)| m)
    }

    /// Live centers in slot order.
    pub fn centers(&self) -> impl Iterator<Item = &Arc<Center>> + '_ {
        self.centers.iter().map(|(_, c)| c)
    }

    /// Live miners in slot order.
    pub fn miners(&self) -> impl Iterator<Item = &Arc<Mutex<Miner>>> + '_ {
        self.miners.iter().map(|(_, m)| m)
    }

    /// Live caravans in slot order.
    pub fn caravans(&self) -> impl Iterator<Item = &Arc<Mutex<Caravan>>> + '_ {
        self.caravans.iter().map(|(_, c)| c)
    }

    /// Number of live containables of `kind`.
    pub fn count(&self, kind: ContainableKind) -> usize {
        match kind {
            ContainableKind::Mine => self.mines.len(),
            ContainableKind::Center => self.centers.len(),
            ContainableKind::Miner => self.miners.len(),
            ContainableKind::Caravan => self.caravans.len(),
        }
    }

    /// Number of miners and caravans.
    pub fn agent_count(&self) -> usize {
        self.miners.len() + self.caravans.len()
    }

    pub(crate) fn clear(&mut self) {
        self.mines.clear();
        self.centers.clear();
        self.miners.clear();
        self.caravans.clear();
    }
}

impl fmt::Debug for ContainableRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainableRegistry")
            .field("mines", &self.mines.len())
            .field("centers", &self.centers.len())
            .field("miners", &self.miners.len())
            .field("caravans", &self.caravans.len())
            .finish()
    }
}
