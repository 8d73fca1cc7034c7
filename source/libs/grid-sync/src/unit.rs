// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

use grid_abi::layout::LOCKS_PER_TILE;
use grid_abi::LockId;

use crate::LockSlot;

/// Errors raised when a program asks for a lock slot it may not use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LockError {
    /// The slot belongs to the RPC handshake.
    #[error("{0} is reserved for the host handshake")]
    Reserved(LockId),
}

/// The lock slots owned by one tile.
pub struct LockUnit<L> {
    slots: [L; LOCKS_PER_TILE],
}

impl<L: LockSlot> Default for LockUnit<L> {
    fn default() -> Self {
        Self { slots: core::array::from_fn(|_| L::default()) }
    }
}

impl<L: LockSlot> LockUnit<L> {
    /// Creates a unit with every slot free and holding `false`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Any slot, including the handshake pair.
    pub fn slot(&self, id: LockId) -> &L {
        &self.slots[id.index()]
    }

    /// A slot a tile program is allowed to drive.
    pub fn program_slot(&self, id: LockId) -> Result<&L, LockError> {
        if id.is_reserved() {
            return Err(LockError::Reserved(id));
        }
        Ok(self.slot(id))
    }

    /// Returns `true` when every slot is free and holds `false`.
    pub fn is_idle(&self) -> bool {
        self.slots.iter().all(|slot| !slot.is_held() && !slot.value())
    }
}
