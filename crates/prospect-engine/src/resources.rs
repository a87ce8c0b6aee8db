//! Bounded resource containers with fill and depletion listeners.
//!
//! [`GoldContainer`] holds fractional gold, [`FoodContainer`] whole food
//! units. Both clamp: [`add`](Container::add) returns what did not fit and
//! [`take`](Container::take) returns what was actually removed.

use std::fmt;
use std::ops::{Add, Sub};

use prospect_core::SubscriptionId;

/// A quantity a [`Container`] can hold.
pub trait Quantity:
    Copy + PartialOrd + Add<Output = Self> + Sub<Output = Self> + fmt::Debug + Send + Sync + 'static
{
    /// The empty amount.
    const ZERO: Self;
    /// Capacity of a container with no practical limit.
    const UNBOUNDED: Self;
}

impl Quantity for f32 {
    const ZERO: Self = 0.0;
    const UNBOUNDED: Self = f32::INFINITY;
}

impl Quantity for u32 {
    const ZERO: Self = 0;
    const UNBOUNDED: Self = u32::MAX;
}

type Listener = Box<dyn Fn() + Send + Sync>;

/// A clamped store of `Q` between zero and `max`.
///
/// Listeners run synchronously inside the mutating call and must not
/// touch the container they are registered on.
pub struct Container<Q: Quantity> {
    contained: Q,
    max: Q,
    filled: Vec<(SubscriptionId, Listener)>,
    depleted: Vec<(SubscriptionId, Listener)>,
}

/// Gold, in fractional units.
pub type GoldContainer = Container<f32>;

/// Food, in whole units.
pub type FoodContainer = Container<u32>;

impl<Q: Quantity> Container<Q> {
    /// A container holding `contained`, clamped to `[0, max]`.
    pub fn new(contained: Q, max: Q) -> Self {
        let contained = if contained > max { max } else { contained };
        let contained = if contained < Q::ZERO { Q::ZERO } else { contained };
        Self {
            contained,
            max,
            filled: Vec::new(),
            depleted: Vec::new(),
        }
    }

    /// A container with no practical capacity.
    pub fn unbounded(contained: Q) -> Self {
        Self::new(contained, Q::UNBOUNDED)
    }

    /// Current amount.
    pub fn contained(&self) -> Q {
        self.contained
    }

    /// Capacity.
    pub fn max(&self) -> Q {
        self.max
    }

    /// Room left before the container is full.
    pub fn space_available(&self) -> Q {
        self.max - self.contained
    }

    /// `true` when nothing is held.
    pub fn is_empty(&self) -> bool {
        self.contained <= Q::ZERO
    }

    /// `true` at capacity.
    pub fn is_full(&self) -> bool {
        self.contained >= self.max
    }

    /// Add up to `qty`. Returns the overflow that did not fit.
    ///
    /// Fires the fill listeners when this call makes the container full.
    pub fn add(&mut self, qty: Q) -> Q {
        if qty <= Q::ZERO {
            return Q::ZERO;
        }
        let was_full = self.is_full();
        let space = self.space_available();
        let overflow = if qty > space {
            self.contained = self.max;
            qty - space
        } else {
            self.contained = self.contained + qty;
            Q::ZERO
        };
        if !was_full && self.is_full() {
            self.filled.iter().for_each(|(_, l)| l());
        }
        overflow
    }

    /// Remove up to `qty`. Returns the amount actually removed.
    ///
    /// Fires the depletion listeners when this call empties the container.
    pub fn take(&mut self, qty: Q) -> Q {
        if qty <= Q::ZERO || self.is_empty() {
            return Q::ZERO;
        }
        let taken = if qty >= self.contained { self.contained } else { qty };
        self.contained = self.contained - taken;
        if self.is_empty() {
            self.depleted.iter().for_each(|(_, l)| l());
        }
        taken
    }

    /// Remove everything. Returns the amount removed.
    pub fn take_all(&mut self) -> Q {
        self.take(self.contained)
    }

    /// Call `listener` whenever the container becomes full.
    pub fn on_filled(&mut self, listener: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.filled.push((id, Box::new(listener)));
        id
    }

    /// Call `listener` whenever the container becomes empty.
    pub fn on_depleted(&mut self, listener: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.depleted.push((id, Box::new(listener)));
        id
    }

    /// Drop a fill or depletion listener. Returns `false` if unknown.
    pub fn remove_listener(&mut self, id: SubscriptionId) -> bool {
        let before = self.filled.len() + self.depleted.len();
        self.filled.retain(|(l, _)| *l != id);
        self.depleted.retain(|(l, _)| *l != id);
        before != self.filled.len() + self.depleted.len()
    }

    /// Drop every listener.
    pub fn clear_listeners(&mut self) {
        self.filled.clear();
        self.depleted.clear();
    }
}

impl<Q: Quantity> fmt::Debug for Container<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("contained", &self.contained)
            .field("max", &self.max)
            .field("listeners", &(self.filled.len() + self.depleted.len()))
            .finish()
    }
}
