//! Bounded pool of OCR engines.
//!
//! Engines are checked out as [`Lease`] guards and go back to the pool when
//! the guard drops, whatever the caller did with them. At most `capacity`
//! engines are leased at once.
//!
//! [`EnginePool::restart`] replaces every engine with a fresh one. Each engine
//! carries the generation it was created in; leases from an older generation
//! are disposed when they come back instead of rejoining the idle set.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::engine::{EngineFactory, OcrEngine};
use crate::error::PoolError;

/// Waiters re-check cancellation at least this often.
const WAIT_SLICE: Duration = Duration::from_millis(25);

/// Shared stop flag for a scan session.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct Slot {
    id: u64,
    generation: u64,
    engine: Box<dyn OcrEngine>,
}

struct PoolState {
    generation: u64,
    next_id: u64,
    idle: Vec<Slot>,
    /// Leased engine count per generation.
    leased: HashMap<u64, usize>,
    closed: bool,
}

impl PoolState {
    fn leased_total(&self) -> usize {
        self.leased.values().sum()
    }

    fn build(&mut self, factory: &dyn EngineFactory, count: usize) -> Result<Vec<Slot>, PoolError> {
        let mut slots = Vec::with_capacity(count);
        for _ in 0..count {
            slots.push(Slot {
                id: self.next_id,
                generation: self.generation,
                engine: factory.create()?,
            });
            self.next_id += 1;
        }
        Ok(slots)
    }
}

/// Point-in-time view of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub generation: u64,
    pub idle: usize,
    pub leased: usize,
    /// Leased engines from an older generation, disposed on return.
    pub draining: usize,
}

pub struct EnginePool {
    capacity: usize,
    factory: Arc<dyn EngineFactory>,
    state: Mutex<PoolState>,
    available: Condvar,
}

impl EnginePool {
    /// Builds `capacity` engines up front. Fails if any of them cannot be created.
    pub fn new(capacity: usize, factory: Arc<dyn EngineFactory>) -> Result<Self, PoolError> {
        let capacity = capacity.max(1);
        let mut state = PoolState {
            generation: 0,
            next_id: 0,
            idle: Vec::new(),
            leased: HashMap::new(),
            closed: false,
        };
        state.idle = state.build(factory.as_ref(), capacity)?;
        tracing::info!("OCR engine pool ready with {} engines", capacity);

        Ok(Self {
            capacity,
            factory,
            state: Mutex::new(state),
            available: Condvar::new(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn factory(&self) -> &dyn EngineFactory {
        self.factory.as_ref()
    }

    /// Blocks until an engine is free.
    pub fn checkout(&self) -> Result<Lease<'_>, PoolError> {
        self.checkout_with(None, &Cancellation::new())
    }

    /// Blocks until an engine is free, the timeout elapses, or `cancel` fires.
    pub fn checkout_with(
        &self,
        timeout: Option<Duration>,
        cancel: &Cancellation,
    ) -> Result<Lease<'_>, PoolError> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.state.lock();

        loop {
            if state.closed {
                return Err(PoolError::Closed);
            }
            if cancel.is_cancelled() {
                return Err(PoolError::Cancelled);
            }
            if state.leased_total() < self.capacity {
                if let Some(slot) = state.idle.pop() {
                    *state.leased.entry(slot.generation).or_default() += 1;
                    tracing::trace!("Leased engine {} (generation {})", slot.id, slot.generation);
                    return Ok(Lease {
                        pool: self,
                        slot: Some(slot),
                    });
                }
            }

            let mut wait = WAIT_SLICE;
            if let (Some(deadline), Some(timeout)) = (deadline, timeout) {
                let now = Instant::now();
                if now >= deadline {
                    return Err(PoolError::Timeout(timeout.as_millis() as u64));
                }
                wait = wait.min(deadline - now);
            }
            self.available.wait_for(&mut state, wait);
        }
    }

    fn give_back(&self, slot: Slot) {
        let mut state = self.state.lock();
        if let Some(count) = state.leased.get_mut(&slot.generation) {
            *count -= 1;
            if *count == 0 {
                state.leased.remove(&slot.generation);
            }
        }

        let stale = if slot.generation == state.generation && !state.closed {
            state.idle.push(slot);
            None
        } else {
            tracing::debug!(
                "Disposing engine {} from generation {}",
                slot.id,
                slot.generation
            );
            Some(slot)
        };
        drop(state);
        drop(stale);
        self.available.notify_one();
    }

    /// Replaces every engine. Idle engines are disposed now, leased ones when
    /// they come back. New checkouts still count the outstanding leases
    /// against the capacity.
    ///
    /// On failure the pool is left as it was.
    pub fn restart(&self) -> Result<(), PoolError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(PoolError::Closed);
        }

        state.generation += 1;
        let fresh = match state.build(self.factory.as_ref(), self.capacity) {
            Ok(fresh) => fresh,
            Err(e) => {
                state.generation -= 1;
                return Err(e);
            }
        };
        let old = std::mem::replace(&mut state.idle, fresh);
        let generation = state.generation;
        let draining = state.leased_total();
        drop(state);

        drop(old);
        tracing::info!(
            "Engine pool restarted (generation {}, {} leases draining)",
            generation,
            draining
        );
        self.available.notify_all();
        Ok(())
    }

    /// Disposes idle engines and fails every current and future checkout.
    pub fn close(&self) {
        let idle = {
            let mut state = self.state.lock();
            state.closed = true;
            std::mem::take(&mut state.idle)
        };
        drop(idle);
        self.available.notify_all();
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        let leased = state.leased_total();
        let current = state.leased.get(&state.generation).copied().unwrap_or(0);
        PoolStats {
            generation: state.generation,
            idle: state.idle.len(),
            leased,
            draining: leased - current,
        }
    }
}

/// Exclusive use of one pooled engine.
pub struct Lease<'a> {
    pool: &'a EnginePool,
    slot: Option<Slot>,
}

impl Lease<'_> {
    /// Identifier unique across the pool's lifetime.
    pub fn id(&self) -> u64 {
        self.slot.as_ref().map_or(0, |s| s.id)
    }

    pub fn generation(&self) -> u64 {
        self.slot.as_ref().map_or(0, |s| s.generation)
    }
}

impl Deref for Lease<'_> {
    type Target = dyn OcrEngine;

    fn deref(&self) -> &Self::Target {
        // The slot is only taken in drop.
        match &self.slot {
            Some(slot) => slot.engine.as_ref(),
            None => unreachable!("lease used after release"),
        }
    }
}

impl DerefMut for Lease<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.slot {
            Some(slot) => slot.engine.as_mut(),
            None => unreachable!("lease used after release"),
        }
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            self.pool.give_back(slot);
        }
    }
}
