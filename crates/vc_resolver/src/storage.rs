use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, ThreadId};

use foldhash::fast::FixedState;
use hashbrown::HashMap;

use crate::contract::Contract;
use crate::error::ContractError;
use crate::ty::TypeKey;

/// The hash state of every table keyed by [`TypeKey`].
///
/// Seeded with a fixed value, so iteration order is stable between runs.
pub const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x95EE04C4F326B271);

// -----------------------------------------------------------------------------
// Slot

enum SlotState {
    Empty,
    Building(ThreadId),
    Ready(Arc<Contract>),
}

/// One key of the storage, built at most once at a time.
struct Slot {
    id: u64,
    state: Mutex<SlotState>,
    ready: Condvar,
}

static NEXT_SLOT_ID: AtomicU64 = AtomicU64::new(0);

impl Slot {
    fn new() -> Self {
        Self {
            id: NEXT_SLOT_ID.fetch_add(1, Ordering::Relaxed),
            state: Mutex::new(SlotState::Empty),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Leaves the building state and wakes the waiters.
    fn release(&self, next: SlotState) {
        let mut state = self.lock();
        *state = next;
        forget_waits(self.id);
        drop(state);
        self.ready.notify_all();
    }
}

/// Resets an unfinished build so that waiters can retry.
///
/// Covers both a failed builder and a panicking one.
struct BuildGuard<'a> {
    slot: &'a Slot,
    finished: bool,
}

impl BuildGuard<'_> {
    fn finish(mut self, contract: Arc<Contract>) {
        self.finished = true;
        self.slot.release(SlotState::Ready(contract));
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.slot.release(SlotState::Empty);
        }
    }
}

// -----------------------------------------------------------------------------
// Wait graph

/// A thread blocked on a slot built by another thread.
struct Wait {
    waiter: ThreadId,
    owner: ThreadId,
    slot: u64,
}

/// Every blocked thread of the process.
///
/// Shared by all storages, builds of one storage may wait on another.
/// Lock order is slot state first, then this list.
static WAITS: Mutex<Vec<Wait>> = Mutex::new(Vec::new());

fn waits() -> MutexGuard<'static, Vec<Wait>> {
    WAITS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Records that `waiter` blocks on `slot` until `owner` releases it.
///
/// Returns `false` without recording anything if the owners, followed
/// through their own waits, lead back to `waiter`.
fn register_wait(waiter: ThreadId, owner: ThreadId, slot: u64) -> bool {
    let mut waits = waits();

    let mut next = owner;
    for _ in 0..=waits.len() {
        if next == waiter {
            return false;
        }
        match waits.iter().find(|wait| wait.waiter == next) {
            Some(wait) => next = wait.owner,
            None => break,
        }
    }

    waits.retain(|wait| wait.waiter != waiter);
    waits.push(Wait {
        waiter,
        owner,
        slot,
    });
    true
}

/// Drops the waits on `slot`, called with the slot state locked.
fn forget_waits(slot: u64) {
    waits().retain(|wait| wait.slot != slot);
}

// -----------------------------------------------------------------------------
// ContractStorage

/// A memoizing store from [`TypeKey`] to published contracts.
///
/// [`get_or_create`](ContractStorage::get_or_create) runs the builder of a key
/// at most once at a time: concurrent callers of an uncached key wait for the
/// in-flight build and observe the same [`Arc<Contract>`].
///
/// A failed build is not committed. The slot is reset and the next caller
/// (possibly a waiter) runs its own builder.
///
/// Waiting never closes a cycle: a caller whose wait would, possibly through
/// builds of other threads, end up waiting on itself fails with
/// [`ContractError::Recursive`] instead.
///
/// Entries are never evicted.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vc_resolver::{Contract, ContractStorage, TypeKey};
///
/// let storage = ContractStorage::new();
/// let key = TypeKey::of::<u32>();
///
/// let a = storage.get_or_create(key, |_| Ok(Arc::new(Contract::serde::<u32>()))).unwrap();
/// let b = storage.get_or_create(key, |_| unreachable!()).unwrap();
///
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
pub struct ContractStorage {
    slots: RwLock<HashMap<TypeKey, Arc<Slot>, FixedState>>,
}

impl Default for ContractStorage {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ContractStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::with_hasher(FIXED_HASH_STATE)),
        }
    }

    fn slot(&self, ty: TypeKey) -> Arc<Slot> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get(&ty) {
            return slot.clone();
        }
        drop(slots);

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.entry(ty).or_insert_with(|| Arc::new(Slot::new())).clone()
    }

    /// Returns the cached contract of `ty`, building it with `build` if needed.
    ///
    /// # Errors
    ///
    /// - Any error of `build`, the entry stays uncached.
    /// - [`ContractError::Recursive`] if `build` requests `ty` again, directly or
    ///   through builds of other threads waiting on this one.
    pub fn get_or_create<F>(&self, ty: TypeKey, build: F) -> Result<Arc<Contract>, ContractError>
    where
        F: FnOnce(TypeKey) -> Result<Arc<Contract>, ContractError>,
    {
        let slot = self.slot(ty);
        let current = thread::current().id();

        let mut state = slot.lock();
        loop {
            match &*state {
                SlotState::Ready(contract) => return Ok(contract.clone()),
                SlotState::Building(owner) => {
                    if !register_wait(current, *owner, slot.id) {
                        return Err(ContractError::Recursive(ty));
                    }
                }
                SlotState::Empty => break,
            }
            log::trace!("waiting for the contract of `{ty}`");
            state = slot.ready.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        *state = SlotState::Building(current);
        drop(state);

        let guard = BuildGuard {
            slot: &slot,
            finished: false,
        };
        let contract = build(ty)?;
        guard.finish(contract.clone());
        Ok(contract)
    }

    /// Returns the cached contract of `ty` without building it.
    pub fn get(&self, ty: TypeKey) -> Option<Arc<Contract>> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        let state = slots.get(&ty)?.lock();
        match &*state {
            SlotState::Ready(contract) => Some(contract.clone()),
            _ => None,
        }
    }

    /// Returns `true` if a contract of `ty` is cached.
    #[inline]
    pub fn contains(&self, ty: TypeKey) -> bool {
        self.get(ty).is_some()
    }

    /// Returns the number of cached contracts.
    pub fn len(&self) -> usize {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots
            .values()
            .filter(|slot| matches!(*slot.lock(), SlotState::Ready(_)))
            .count()
    }

    /// Returns `true` if no contract is cached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// -----------------------------------------------------------------------------
// Tests
