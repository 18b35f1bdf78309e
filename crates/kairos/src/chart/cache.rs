use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use crate::chart::birth::BirthData;
use crate::chart::natal::{self, NatalChart};
use crate::ephemeris::EphemerisProvider;
use crate::error::ProviderError;

pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// One key's chart. Empty until a build succeeds; builders hold the lock
/// while computing so concurrent requests for the same key wait instead of
/// computing again.
type Slot = Mutex<Option<Arc<NatalChart>>>;

#[derive(Default)]
struct CacheState {
    slots: HashMap<String, Arc<Slot>>,
    /// Keys of filled slots, oldest first.
    order: VecDeque<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub builds: u64,
    pub evictions: u64,
}

/// Bounded memo of natal charts keyed by [`BirthData::cache_key`].
///
/// Guarantees at most one successful build per key while the entry is
/// resident, never stores failures, and evicts oldest-first past capacity.
/// Readers receive an `Arc`, so eviction never invalidates a chart in use.
pub struct ChartCache {
    capacity: usize,
    state: Mutex<CacheState>,
    hits: AtomicU64,
    misses: AtomicU64,
    builds: AtomicU64,
    evictions: AtomicU64,
}

impl ChartCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(CacheState::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            builds: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Return the cached chart for `birth`, building it on first request.
    pub fn get_or_build(
        &self,
        provider: &dyn EphemerisProvider,
        birth: &BirthData,
    ) -> Result<Arc<NatalChart>, ProviderError> {
        let key = birth.cache_key();
        let slot = {
            let mut state = self.lock_state();
            state.slots.entry(key.clone()).or_default().clone()
        };

        let mut guard = lock(&slot);
        if let Some(chart) = guard.as_ref() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::debug!("Chart cache hit for {key}");
            return Ok(chart.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        log::debug!("Chart cache miss for {key}");
        let chart = match natal::build(provider, birth) {
            Ok(chart) => Arc::new(chart),
            Err(e) => {
                drop(guard);
                self.forget_empty(&key, &slot);
                return Err(e);
            }
        };
        *guard = Some(chart.clone());
        self.builds.fetch_add(1, Ordering::Relaxed);

        self.register(key, &slot);
        Ok(chart)
    }

    /// Cached chart for `birth`, without building. A build in flight is a miss.
    pub fn get(&self, birth: &BirthData) -> Option<Arc<NatalChart>> {
        let slot = self.lock_state().slots.get(&birth.cache_key())?.clone();
        let chart = match slot.try_lock() {
            Ok(guard) => guard.clone(),
            Err(TryLockError::Poisoned(e)) => e.into_inner().clone(),
            Err(TryLockError::WouldBlock) => None,
        };
        chart
    }

    /// Number of resident charts.
    pub fn len(&self) -> usize {
        self.lock_state().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut state = self.lock_state();
        state.slots.clear();
        state.order.clear();
        log::debug!("Chart cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Record a freshly filled slot and evict past capacity.
    fn register(&self, key: String, slot: &Arc<Slot>) {
        let mut state = self.lock_state();
        let resident = state.slots.entry(key.clone()).or_insert_with(|| slot.clone());
        if !Arc::ptr_eq(resident, slot) {
            // cleared and re-requested while we were building
            return;
        }
        state.order.push_back(key);
        while state.order.len() > self.capacity {
            if let Some(oldest) = state.order.pop_front() {
                state.slots.remove(&oldest);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                log::debug!("Chart cache evicted {oldest}");
            }
        }
    }

    /// Drop a slot left empty by a failed build. A slot someone else is
    /// building into is left alone.
    fn forget_empty(&self, key: &str, slot: &Arc<Slot>) {
        let mut state = self.lock_state();
        let resident = state.slots.get(key).is_some_and(|s| Arc::ptr_eq(s, slot));
        let empty = matches!(slot.try_lock(), Ok(guard) if guard.is_none());
        if resident && empty {
            state.slots.remove(key);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        lock(&self.state)
    }
}

impl Default for ChartCache {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // entries are only ever written whole, so a poisoned lock still holds valid data
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
