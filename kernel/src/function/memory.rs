//! `MemoryPool`: per-handle state bookkeeping for stateful kernels.
//!
//! Stateless kernels never touch this module; the default lifecycle methods
//! on [`KernelFunction`](crate::function::contract::KernelFunction) are
//! no-ops. A kernel that caches data or owns an external handle keeps one
//! `M` per memory handle here and forwards its lifecycle methods to the pool.
//!
//! # Semantics
//!
//! - `alloc` creates a slot (reusing freed indices first) up to `capacity`.
//! - `init` resets a slot's state to `M::default()`.
//! - `checkout` pops the most recently released handle, or allocates and
//!   initialises a new one. At capacity with nothing released it fails with
//!   [`MemoryError::Exhausted`].
//! - `release` pushes a checked-out handle back onto the unused stack.
//! - `incref`/`decref` count kernel owners; when the count drops from one
//!   to zero every slot is freed. A `decref` at zero changes nothing.
//!
//! All operations take `&self`; the pool is guarded by one `Mutex`, so
//! `with_mem` serialises access to state across handles.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::function::contract::MemId;

/// Typed failure for memory-handle operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// Every slot is allocated and none is released.
    Exhausted { capacity: usize },
    /// The handle does not name an allocated slot.
    UnknownHandle { mem: MemId },
    /// `release` on a handle that is not checked out.
    NotCheckedOut { mem: MemId },
    /// A previous holder of the pool lock panicked.
    Poisoned,
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted { capacity } => {
                write!(f, "memory pool exhausted ({capacity} handles in use)")
            }
            Self::UnknownHandle { mem } => write!(f, "unknown memory handle {mem}"),
            Self::NotCheckedOut { mem } => write!(f, "memory handle {mem} is not checked out"),
            Self::Poisoned => write!(f, "memory pool lock poisoned"),
        }
    }
}

impl std::error::Error for MemoryError {}

#[derive(Debug)]
struct SlotEntry<M> {
    state: M,
    checked_out: bool,
}

#[derive(Debug)]
struct PoolState<M> {
    slots: Vec<Option<SlotEntry<M>>>,
    unused: Vec<MemId>,
}

impl<M> PoolState<M> {
    fn entry_mut(&mut self, mem: MemId) -> Result<&mut SlotEntry<M>, MemoryError> {
        self.slots
            .get_mut(mem.index())
            .and_then(Option::as_mut)
            .ok_or(MemoryError::UnknownHandle { mem })
    }

    fn live(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// Fixed-capacity pool of per-handle kernel state.
#[derive(Debug)]
pub struct MemoryPool<M> {
    capacity: usize,
    state: Mutex<PoolState<M>>,
    refcount: AtomicUsize,
}

impl<M: Default> MemoryPool<M> {
    /// An empty pool holding at most `capacity` handles.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(PoolState {
                slots: Vec::new(),
                unused: Vec::new(),
            }),
            refcount: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, PoolState<M>>, MemoryError> {
        self.state.lock().map_err(|_| MemoryError::Poisoned)
    }

    /// Allocate one slot.
    ///
    /// # Errors
    ///
    /// [`MemoryError::Exhausted`] at capacity, [`MemoryError::Poisoned`] if
    /// the lock is poisoned.
    pub fn alloc(&self) -> Result<MemId, MemoryError> {
        let mut pool = self.lock()?;
        Self::alloc_locked(&mut pool, self.capacity)
    }

    fn alloc_locked(pool: &mut PoolState<M>, capacity: usize) -> Result<MemId, MemoryError> {
        if pool.live() >= capacity {
            return Err(MemoryError::Exhausted { capacity });
        }
        let entry = SlotEntry {
            state: M::default(),
            checked_out: false,
        };
        if let Some(index) = pool.slots.iter().position(Option::is_none) {
            pool.slots[index] = Some(entry);
            Ok(MemId::new(index))
        } else {
            pool.slots.push(Some(entry));
            Ok(MemId::new(pool.slots.len() - 1))
        }
    }

    /// Reset a slot's state to `M::default()`.
    ///
    /// # Errors
    ///
    /// [`MemoryError::UnknownHandle`] for a handle that is not allocated.
    pub fn init(&self, mem: MemId) -> Result<(), MemoryError> {
        let mut pool = self.lock()?;
        pool.entry_mut(mem)?.state = M::default();
        Ok(())
    }

    /// Free a slot. Unknown handles are ignored.
    pub fn free(&self, mem: MemId) {
        if let Ok(mut pool) = self.lock() {
            if let Some(slot) = pool.slots.get_mut(mem.index()) {
                *slot = None;
            }
            pool.unused.retain(|&m| m != mem);
        }
    }

    /// Check out a handle, reusing the most recently released one.
    ///
    /// # Errors
    ///
    /// [`MemoryError::Exhausted`] when every slot is checked out and the
    /// pool is at capacity.
    pub fn checkout(&self) -> Result<MemId, MemoryError> {
        let mut pool = self.lock()?;
        let mem = match pool.unused.pop() {
            Some(mem) => mem,
            None => {
                let mem = Self::alloc_locked(&mut pool, self.capacity)?;
                pool.entry_mut(mem)?.state = M::default();
                mem
            }
        };
        pool.entry_mut(mem)?.checked_out = true;
        Ok(mem)
    }

    /// Return a checked-out handle to the unused stack.
    ///
    /// # Errors
    ///
    /// [`MemoryError::UnknownHandle`] or [`MemoryError::NotCheckedOut`].
    pub fn release(&self, mem: MemId) -> Result<(), MemoryError> {
        let mut pool = self.lock()?;
        let entry = pool.entry_mut(mem)?;
        if !entry.checked_out {
            return Err(MemoryError::NotCheckedOut { mem });
        }
        entry.checked_out = false;
        pool.unused.push(mem);
        Ok(())
    }

    /// Run `f` on the state behind `mem`.
    ///
    /// # Errors
    ///
    /// [`MemoryError::UnknownHandle`] for a handle that is not allocated.
    pub fn with_mem<R>(&self, mem: MemId, f: impl FnOnce(&mut M) -> R) -> Result<R, MemoryError> {
        let mut pool = self.lock()?;
        Ok(f(&mut pool.entry_mut(mem)?.state))
    }

    /// Register one owner. Returns the new count.
    pub fn incref(&self) -> usize {
        self.refcount.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Drop one owner; the last owner frees every slot. Returns the new count.
    pub fn decref(&self) -> usize {
        let previous = self
            .refcount
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
            .unwrap_or(0);
        if previous == 1 {
            if let Ok(mut pool) = self.lock() {
                pool.slots.clear();
                pool.unused.clear();
            }
        }
        previous.saturating_sub(1)
    }

    /// Current owner count.
    #[must_use]
    pub fn refcount(&self) -> usize {
        self.refcount.load(Ordering::SeqCst)
    }

    /// Number of allocated slots (0 if the lock is poisoned).
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.lock().map_or(0, |pool| pool.live())
    }

    /// Number of checked-out slots (0 if the lock is poisoned).
    #[must_use]
    pub fn checked_out(&self) -> usize {
        self.lock().map_or(0, |pool| {
            pool.slots
                .iter()
                .flatten()
                .filter(|entry| entry.checked_out)
                .count()
        })
    }

    /// Maximum number of slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
