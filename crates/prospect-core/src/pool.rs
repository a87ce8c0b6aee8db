//! Thread-safe object pool for transient buffers.
//!
//! A [`Pool`] keeps a bounded free list of reset objects. Items come back
//! either explicitly through [`Pool::release`] or automatically when a
//! [`Pooled`] guard drops.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// Objects that can be returned to a neutral state for reuse.
pub trait Resettable {
    /// Clear all contents while keeping allocated capacity.
    fn reset(&mut self);
}

impl<T> Resettable for Vec<T> {
    fn reset(&mut self) {
        self.clear();
    }
}

impl<T> Resettable for VecDeque<T> {
    fn reset(&mut self) {
        self.clear();
    }
}

/// Allocation counters for a [`Pool`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Items built because the free list was empty.
    pub created: u64,
    /// Items served from the free list.
    pub reused: u64,
}

/// Bounded free list of reusable objects.
///
/// # Examples
///
/// ```
/// use prospect_core::Pool;
///
/// let pool: Pool<Vec<u32>> = Pool::new();
/// let mut buf = pool.get();
/// buf.push(7);
/// pool.release(buf);
///
/// let again = pool.get();
/// assert!(again.is_empty());
/// assert!(again.capacity() >= 1);
/// assert_eq!(pool.stats().reused, 1);
/// ```
pub struct Pool<T> {
    free: Mutex<Vec<T>>,
    retain: usize,
    created: AtomicU64,
    reused: AtomicU64,
}

impl<T: Resettable> Pool<T> {
    /// Free-list cap used by [`Pool::new`].
    pub const DEFAULT_RETAIN: usize = 64;

    /// Create a pool retaining at most [`DEFAULT_RETAIN`](Self::DEFAULT_RETAIN) idle items.
    pub fn new() -> Self {
        Self::with_retention(Self::DEFAULT_RETAIN)
    }

    /// Create a pool retaining at most `retain` idle items.
    pub fn with_retention(retain: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            retain,
            created: AtomicU64::new(0),
            reused: AtomicU64::new(0),
        }
    }

    /// Pop an idle item, or build one with `make`.
    pub fn get_or_else(&self, make: impl FnOnce() -> T) -> T {
        let popped = self.free.lock().unwrap_or_else(PoisonError::into_inner).pop();
        match popped {
            Some(item) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                item
            }
            None => {
                self.created.fetch_add(1, Ordering::Relaxed);
                make()
            }
        }
    }

    /// Pop an idle item, or build a default one.
    pub fn get(&self) -> T
    where
        T: Default,
    {
        self.get_or_else(T::default)
    }

    /// Borrow an item that returns itself to the pool on drop.
    pub fn take(&self) -> Pooled<'_, T>
    where
        T: Default,
    {
        Pooled {
            pool: self,
            item: Some(self.get()),
        }
    }

    /// Reset `item` and keep it for reuse, unless the free list is full.
    pub fn release(&self, mut item: T) {
        item.reset();
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.retain {
            free.push(item);
        }
    }

    /// Number of idle items currently held.
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Snapshot of the allocation counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.created.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
        }
    }
}

impl<T: Resettable> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("retain", &self.retain)
            .field("created", &self.created.load(Ordering::Relaxed))
            .field("reused", &self.reused.load(Ordering::Relaxed))
            .finish()
    }
}

/// RAII guard from [`Pool::take`].
pub struct Pooled<'p, T: Resettable> {
    pool: &'p Pool<T>,
    item: Option<T>,
}

impl<T: Resettable> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Only `drop` empties the slot.
        self.item.as_ref().expect("pooled item present until drop")
    }
}

impl<T: Resettable> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().expect("pooled item present until drop")
    }
}

impl<T: Resettable> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.release(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn fresh_pool_creates() {
        let pool: Pool<Vec<u8>> = Pool::new();
        let _a = pool.get();
        let _b = pool.get();
        assert_eq!(pool.stats(), PoolStats { created: 2, reused: 0 });
    }

    #[test]
    fn released_items_are_reset_and_reused() {
        let pool: Pool<Vec<u8>> = Pool::new();
        let mut v = pool.get();
        v.extend_from_slice(&[1, 2, 3]);
        pool.release(v);
        assert_eq!(pool.idle(), 1);

        let v = pool.get();
        assert!(v.is_empty());
        assert!(v.capacity() >= 3);
        assert_eq!(pool.stats().reused, 1);
    }

    #[test]
    fn retention_cap_discards_extras() {
        let pool: Pool<Vec<u8>> = Pool::with_retention(1);
        pool.release(Vec::new());
        pool.release(Vec::new());
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn guard_returns_on_drop() {
        let pool: Pool<VecDeque<u8>> = Pool::new();
        {
            let mut g = pool.take();
            g.push_back(9);
            assert_eq!(g.len(), 1);
        }
        assert_eq!(pool.idle(), 1);
        assert!(pool.get().is_empty());
    }

    #[test]
    fn concurrent_get_release() {
        let pool: Arc<Pool<Vec<u32>>> = Arc::new(Pool::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let mut v = pool.get();
                        v.push(i);
                        pool.release(v);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let stats = pool.stats();
        assert_eq!(stats.created + stats.reused, 800);
        assert!(pool.idle() <= 8);
    }

    // ── Property tests ──────────────────────────────────────────

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn counters_follow_free_list(
                retain in 0usize..4,
                ops in prop::collection::vec(any::<bool>(), 0..64),
            ) {
                let pool: Pool<Vec<u8>> = Pool::with_retention(retain);
                let mut out = Vec::new();
                let (mut idle, mut created, mut reused) = (0usize, 0u64, 0u64);
                for get in ops {
                    if get {
                        if idle > 0 {
                            idle -= 1;
                            reused += 1;
                        } else {
                            created += 1;
                        }
                        out.push(pool.get());
                    } else if let Some(item) = out.pop() {
                        pool.release(item);
                        if idle < retain {
                            idle += 1;
                        }
                    }
                }
                prop_assert_eq!(pool.idle(), idle);
                prop_assert_eq!(pool.stats(), PoolStats { created, reused });
            }
        }
    }
}
