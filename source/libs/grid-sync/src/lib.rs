// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

//! CONTEXT: Tile-local synchronisation state: valued lock slots and data memory
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests + tests/handoff.rs
//!
//! PUBLIC API:
//!   - LockSlot trait: acquire/release with an expected value
//!   - BlockingLock: parked waiters (emulated backend)
//!   - PolledLock: spinning waiters on one atomic word (polled backend)
//!   - LockUnit: the fixed set of slots owned by one tile
//!   - TileMemory: bounds-checked tile data memory
//!
//! A lock slot is not a mutex: it carries a boolean value, and `acquire`
//! waits for a specific value. Who may acquire next is decided purely by the
//! value the previous owner released with. Calling acquire/release out of the
//! agreed alternation blocks forever; this is a caller contract and is not
//! detected at runtime.

mod blocking;
mod memory;
mod polled;
mod unit;

pub use blocking::BlockingLock;
pub use memory::{MemoryError, TileMemory};
pub use polled::PolledLock;
pub use unit::{LockError, LockUnit};

/// A valued semaphore slot.
pub trait LockSlot: Default + Send + Sync {
    /// Blocks until the slot is free and holds `expected`, then takes it.
    fn acquire_with_value(&self, expected: bool);

    /// Takes the slot if it is free and holds `expected`; never blocks.
    fn try_acquire_with_value(&self, expected: bool) -> bool;

    /// Stores `value`, frees the slot and wakes waiters.
    fn release_with_value(&self, value: bool);

    /// Current value; only meaningful as a snapshot.
    fn value(&self) -> bool;

    /// Whether some side currently holds the slot.
    fn is_held(&self) -> bool;
}
