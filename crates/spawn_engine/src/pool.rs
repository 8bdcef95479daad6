//! Growable object pool with generation-checked handles
//!
//! Every platform and item in a session is constructed once, up front, and
//! then lent out and returned for the rest of the run. A pool entry carries
//! the lent value together with the scene state the scheduler needs: whether
//! it is active, which platform it is parented to, and its position.
//!
//! # Architecture
//!
//! ```text
//! ObjectPool<T>
//!     ├── entries: [PoolEntry<T>; capacity]   (value + active + generation + parent + position)
//!     ├── cursor                              (round-robin scan start)
//!     └── factory: Box<dyn EntityFactory<T>>  (only called on growth)
//!                 ↓
//!           PoolHandle { pool, index, generation }
//! ```
//!
//! Acquisition scans from a rotating cursor rather than always from entry 0,
//! so wear is spread across entries. When nothing is free the pool grows by a
//! fixed increment. Growth is unbounded: a host that never releases will keep
//! growing the pool. A factory failure skips the entry and blocks further
//! growth until [`ObjectPool::begin_tick`] is called.

use crate::error::{report_violation, FactoryError, SpawnError, SpawnResult, Violation};
use crate::foundation::math::Vec2;

/// Identifier of a pool, carried by every handle it hands out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(pub u16);

/// Handle to a pooled entity with generation counter for safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    /// Pool that owns the entry
    pub pool: PoolId,
    /// Index in the pool
    pub index: u32,
    /// Generation counter to detect reuse
    pub generation: u32,
}

impl PoolHandle {
    /// Create a new handle
    pub const fn new(pool: PoolId, index: u32, generation: u32) -> Self {
        Self {
            pool,
            index,
            generation,
        }
    }
}

impl std::fmt::Display for PoolHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}:{}@{}", self.pool.0, self.index, self.generation)
    }
}

/// Builds the entities a pool lends out
///
/// Only called while a pool is being created or is growing.
pub trait EntityFactory<T> {
    /// Construct one entity
    fn instantiate(&mut self) -> Result<T, FactoryError>;
}

/// Plain closures work as factories
impl<T, F> EntityFactory<T> for F
where
    F: FnMut() -> Result<T, FactoryError>,
{
    fn instantiate(&mut self) -> Result<T, FactoryError> {
        self()
    }
}

/// Entities that carry transient state to clear when returned to a pool
pub trait Poolable {
    /// Reset per-activation state. Called on every release.
    fn reset(&mut self) {}
}

/// A single pool slot
#[derive(Debug, Clone)]
pub struct PoolEntry<T> {
    value: T,
    active: bool,
    generation: u32,
    parent: Option<PoolHandle>,
    position: Vec2,
}

impl<T> PoolEntry<T> {
    /// The pooled value
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Whether the entry is lent out
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current generation
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Parent the entry is attached to, if any
    pub fn parent(&self) -> Option<PoolHandle> {
        self.parent
    }

    /// Position; local to the parent when attached, world space otherwise
    pub fn position(&self) -> Vec2 {
        self.position
    }
}

/// Statistics for pool usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Successful acquisitions
    pub acquires: u64,
    /// Successful releases
    pub releases: u64,
    /// Number of times the pool had to grow
    pub growth_events: u64,
    /// Entity constructions that failed
    pub factory_failures: u64,
    /// Maximum number of entries active simultaneously
    pub peak_active: usize,
}

/// Pool of pre-constructed entities
pub struct ObjectPool<T> {
    id: PoolId,
    name: String,
    entries: Vec<PoolEntry<T>>,
    cursor: usize,
    grow_by: usize,
    pool_position: Vec2,
    active_count: usize,
    factory: Box<dyn EntityFactory<T>>,
    growth_blocked: bool,
    stats: PoolStats,
}

impl<T: Poolable> ObjectPool<T> {
    /// Create a pool and pre-instantiate `initial` entries
    ///
    /// Construction failures are logged and leave the pool smaller than
    /// requested; the pool will try again the first time it runs dry.
    pub fn new(
        id: PoolId,
        name: impl Into<String>,
        initial: usize,
        grow_by: usize,
        pool_position: Vec2,
        factory: Box<dyn EntityFactory<T>>,
    ) -> Self {
        let mut pool = Self {
            id,
            name: name.into(),
            entries: Vec::with_capacity(initial),
            cursor: 0,
            grow_by: grow_by.max(1),
            pool_position,
            active_count: 0,
            factory,
            growth_blocked: false,
            stats: PoolStats::default(),
        };

        let created = pool.grow(initial);
        log::info!(
            "Created pool '{}' with {}/{} entries (grow by {})",
            pool.name,
            created,
            initial,
            pool.grow_by
        );
        pool
    }

    /// Acquire the next free entry, growing the pool if necessary
    pub fn acquire(&mut self) -> Option<PoolHandle> {
        match self.try_acquire() {
            Ok(handle) => Some(handle),
            Err(error) => {
                log::warn!("{error}");
                None
            }
        }
    }

    /// Acquire the next free entry, reporting why nothing was available
    pub fn try_acquire(&mut self) -> SpawnResult<PoolHandle> {
        let len = self.entries.len();
        for step in 0..len {
            let index = (self.cursor + step) % len;
            if !self.entries[index].active {
                return Ok(self.lend(index));
            }
        }

        // A factory failure blocks growth until the next tick
        let first_new = len;
        let added = if self.growth_blocked {
            0
        } else {
            self.grow(self.grow_by)
        };
        if added == 0 {
            return Err(SpawnError::PoolExhausted {
                pool: self.name.clone(),
                in_use: self.active_count,
            });
        }

        self.stats.growth_events += 1;
        log::debug!(
            "Pool '{}' grew by {} to {} entries",
            self.name,
            added,
            self.entries.len()
        );
        Ok(self.lend(first_new))
    }

    /// Return an entry to the pool
    ///
    /// Returns `true` if the entry was released. Releasing an inactive, stale
    /// or foreign handle is reported as an invariant violation and otherwise
    /// ignored.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        if let Err(violation) = self.check(handle) {
            report_violation(violation);
            return false;
        }

        let pool_position = self.pool_position;
        let entry = &mut self.entries[handle.index as usize];
        entry.active = false;
        entry.parent = None;
        entry.position = pool_position;
        entry.value.reset();

        self.active_count -= 1;
        self.stats.releases += 1;
        true
    }

    /// Force every entry back to the inactive, unparented, parked state
    ///
    /// Returns how many entries were active.
    pub fn release_all(&mut self) -> usize {
        let was_active = self.active_count;
        for entry in &mut self.entries {
            entry.active = false;
            entry.parent = None;
            entry.position = self.pool_position;
            entry.value.reset();
        }
        self.active_count = 0;
        self.cursor = 0;
        self.stats.releases += was_active as u64;
        was_active
    }
}

impl<T> ObjectPool<T> {
    /// Start a new tick, allowing growth again after a factory failure
    pub fn begin_tick(&mut self) {
        self.growth_blocked = false;
    }

    /// Whether growth is blocked for the rest of the tick
    pub fn is_growth_blocked(&self) -> bool {
        self.growth_blocked
    }

    fn grow(&mut self, count: usize) -> usize {
        self.entries.reserve(count);
        let mut added = 0;
        for _ in 0..count {
            match self.factory.instantiate() {
                Ok(value) => {
                    self.entries.push(PoolEntry {
                        value,
                        active: false,
                        generation: 0,
                        parent: None,
                        position: self.pool_position,
                    });
                    added += 1;
                }
                Err(source) => {
                    self.growth_blocked = true;
                    self.stats.factory_failures += 1;
                    log::error!(
                        "{}",
                        SpawnError::FactoryFailure {
                            pool: self.name.clone(),
                            source,
                        }
                    );
                    break;
                }
            }
        }
        added
    }

    fn lend(&mut self, index: usize) -> PoolHandle {
        let entry = &mut self.entries[index];
        entry.active = true;
        entry.generation = entry.generation.wrapping_add(1);
        let generation = entry.generation;

        self.cursor = (index + 1) % self.entries.len();
        self.active_count += 1;
        self.stats.acquires += 1;
        self.stats.peak_active = self.stats.peak_active.max(self.active_count);

        #[allow(clippy::cast_possible_truncation)]
        PoolHandle::new(self.id, index as u32, generation)
    }

    fn check(&self, handle: PoolHandle) -> Result<(), Violation> {
        let index = handle.index as usize;
        if handle.pool != self.id || index >= self.entries.len() {
            return Err(Violation::ForeignHandle {
                handle,
                pool: self.id,
            });
        }
        let entry = &self.entries[index];
        if entry.generation != handle.generation {
            return Err(Violation::StaleHandle(handle));
        }
        if !entry.active {
            return Err(Violation::DoubleRelease(handle));
        }
        Ok(())
    }

    fn live_entry(&self, handle: PoolHandle) -> Option<&PoolEntry<T>> {
        self.check(handle).ok()?;
        self.entries.get(handle.index as usize)
    }

    fn live_entry_mut(&mut self, handle: PoolHandle) -> Option<&mut PoolEntry<T>> {
        self.check(handle).ok()?;
        self.entries.get_mut(handle.index as usize)
    }

    /// Whether the handle refers to a currently lent entry
    pub fn is_live(&self, handle: PoolHandle) -> bool {
        self.check(handle).is_ok()
    }

    /// Validate handle and get the value
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.live_entry(handle).map(|entry| &entry.value)
    }

    /// Validate handle and get the value mutably
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.live_entry_mut(handle).map(|entry| &mut entry.value)
    }

    /// Validate handle and get the whole entry
    pub fn entry(&self, handle: PoolHandle) -> Option<&PoolEntry<T>> {
        self.live_entry(handle)
    }

    /// Position of a live entry
    pub fn position(&self, handle: PoolHandle) -> Option<Vec2> {
        self.live_entry(handle).map(|entry| entry.position)
    }

    /// Move a live entry. Returns `false` for dead handles.
    pub fn set_position(&mut self, handle: PoolHandle, position: Vec2) -> bool {
        match self.live_entry_mut(handle) {
            Some(entry) => {
                entry.position = position;
                true
            }
            None => false,
        }
    }

    /// Parent of a live entry
    pub fn parent(&self, handle: PoolHandle) -> Option<PoolHandle> {
        self.live_entry(handle).and_then(|entry| entry.parent)
    }

    /// Parent a live entry and give it a position local to that parent
    pub fn attach(&mut self, handle: PoolHandle, parent: PoolHandle, local_position: Vec2) -> bool {
        match self.live_entry_mut(handle) {
            Some(entry) => {
                entry.parent = Some(parent);
                entry.position = local_position;
                true
            }
            None => false,
        }
    }

    /// Unparent a live entry, leaving it at `world_position`
    pub fn detach(&mut self, handle: PoolHandle, world_position: Vec2) -> bool {
        match self.live_entry_mut(handle) {
            Some(entry) => {
                entry.parent = None;
                entry.position = world_position;
                true
            }
            None => false,
        }
    }

    /// Iterate over all lent entries
    pub fn iter_live(&self) -> impl Iterator<Item = (PoolHandle, &PoolEntry<T>)> {
        let id = self.id;
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.active)
            .map(move |(index, entry)| {
                #[allow(clippy::cast_possible_truncation)]
                let handle = PoolHandle::new(id, index as u32, entry.generation);
                (handle, entry)
            })
    }

    /// Pool identifier
    pub fn id(&self) -> PoolId {
        self.id
    }

    /// Pool name used in logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total number of entries, lent or not
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Number of lent entries
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Number of entries that can be lent without growing
    pub fn available_count(&self) -> usize {
        self.entries.len() - self.active_count
    }

    /// Position entries are parked at while pooled
    pub fn pool_position(&self) -> Vec2 {
        self.pool_position
    }

    /// Usage statistics
    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}

impl<T> std::fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectPool")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("capacity", &self.entries.len())
            .field("active", &self.active_count)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::random::{RandomSource, StdRandom};
    use std::collections::HashSet;

    #[derive(Debug, Default)]
    struct Token {
        touched: bool,
    }

    impl Poolable for Token {
        fn reset(&mut self) {
            self.touched = false;
        }
    }

    fn token_factory() -> Box<dyn EntityFactory<Token>> {
        Box::new(|| Ok(Token::default()))
    }

    fn token_pool(initial: usize, grow_by: usize) -> ObjectPool<Token> {
        ObjectPool::new(
            PoolId(0),
            "tokens",
            initial,
            grow_by,
            Vec2::new(0.0, 25.0),
            token_factory(),
        )
    }

    #[test]
    fn test_empty_pool_growth() {
        let mut pool = token_pool(3, 2);
        for _ in 0..3 {
            assert!(pool.acquire().is_some());
        }
        assert_eq!(pool.capacity(), 3);

        let fourth = pool.acquire();
        assert!(fourth.is_some());
        assert_eq!(pool.capacity(), 5);
        assert_eq!(pool.active_count(), 4);
        assert_eq!(pool.stats().growth_events, 1);
    }

    #[test]
    fn test_round_robin_cursor() {
        let mut pool = token_pool(4, 1);
        let first = pool.acquire().unwrap();
        assert_eq!(first.index, 0);
        assert!(pool.release(first));

        // The cursor moved past entry 0, so it is not reused immediately
        let second = pool.acquire().unwrap();
        assert_eq!(second.index, 1);

        let third = pool.acquire().unwrap();
        let fourth = pool.acquire().unwrap();
        assert_eq!((third.index, fourth.index), (2, 3));

        // Wraps around to the free entry 0 before growing
        let fifth = pool.acquire().unwrap();
        assert_eq!(fifth.index, 0);
        assert_eq!(pool.capacity(), 4);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut pool = token_pool(2, 1);
        let handle = pool.acquire().unwrap();
        assert!(pool.release(handle));
        assert!(!pool.release(handle));
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.stats().releases, 1);
    }

    #[test]
    fn test_stale_handle_rejected() {
        let mut pool = token_pool(1, 1);
        let old = pool.acquire().unwrap();
        pool.release(old);
        let new = pool.acquire().unwrap();
        assert_eq!(old.index, new.index);
        assert_ne!(old.generation, new.generation);

        assert!(pool.get(old).is_none());
        assert!(!pool.release(old));
        assert!(pool.is_live(new));
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut pool = token_pool(1, 1);
        let foreign = PoolHandle::new(PoolId(9), 0, 1);
        assert!(!pool.release(foreign));
        let out_of_range = PoolHandle::new(PoolId(0), 50, 1);
        assert!(!pool.release(out_of_range));
    }

    #[test]
    fn test_release_resets_entry_state() {
        let mut pool = token_pool(2, 1);
        let parent = PoolHandle::new(PoolId(7), 0, 1);
        let handle = pool.acquire().unwrap();
        pool.get_mut(handle).unwrap().touched = true;
        assert!(pool.attach(handle, parent, Vec2::new(1.0, 2.0)));
        assert_eq!(pool.parent(handle), Some(parent));

        pool.release(handle);
        let entry = &pool.entries[handle.index as usize];
        assert!(!entry.is_active());
        assert_eq!(entry.parent(), None);
        assert_eq!(entry.position(), Vec2::new(0.0, 25.0));
        assert!(!entry.value().touched);
    }

    #[test]
    fn test_pool_exclusivity_under_random_sequences() {
        let mut rng = StdRandom::seeded(0x5eed);
        let mut pool = token_pool(3, 2);
        let mut live: Vec<PoolHandle> = Vec::new();

        for _ in 0..2000 {
            if live.is_empty() || rng.chance(0.55) {
                let handle = pool.acquire().unwrap();
                live.push(handle);
            } else {
                let victim = live.swap_remove(rng.index(live.len()));
                assert!(pool.release(victim));
            }

            let indices: HashSet<u32> = live.iter().map(|handle| handle.index).collect();
            assert_eq!(indices.len(), live.len(), "two live handles share an entry");
            assert_eq!(pool.active_count(), live.len());
        }
    }

    #[test]
    fn test_factory_failure_is_skipped_and_retried() {
        let mut remaining_ok = 2;
        let mut fail_once = true;
        let factory = move || {
            if remaining_ok > 0 {
                remaining_ok -= 1;
                return Ok(Token::default());
            }
            if fail_once {
                fail_once = false;
                return Err(FactoryError::MissingTemplate("token".to_string()));
            }
            Ok(Token::default())
        };
        let mut pool: ObjectPool<Token> =
            ObjectPool::new(PoolId(1), "flaky", 2, 2, Vec2::zeros(), Box::new(factory));

        assert!(pool.acquire().is_some());
        assert!(pool.acquire().is_some());

        // Growth hits the failing construction and gives up
        assert_eq!(
            pool.try_acquire(),
            Err(SpawnError::PoolExhausted {
                pool: "flaky".to_string(),
                in_use: 2,
            })
        );
        assert_eq!(pool.stats().factory_failures, 1);
        assert!(pool.is_growth_blocked());

        // A platform's worth of further requests in the same tick never
        // reaches the factory
        for _ in 0..5 {
            assert!(pool.acquire().is_none());
        }
        assert_eq!(pool.stats().factory_failures, 1);
        assert_eq!(pool.capacity(), 2);

        // The next tick retries growth
        pool.begin_tick();
        assert!(pool.acquire().is_some());
        assert_eq!(pool.capacity(), 4);
        assert!(!pool.is_growth_blocked());
    }

    #[test]
    fn test_release_all() {
        let mut pool = token_pool(4, 1);
        let handles: Vec<_> = (0..3).filter_map(|_| pool.acquire()).collect();
        assert_eq!(pool.release_all(), 3);
        assert_eq!(pool.active_count(), 0);
        assert!(handles.iter().all(|handle| !pool.is_live(*handle)));
        assert_eq!(pool.iter_live().count(), 0);
    }
}
