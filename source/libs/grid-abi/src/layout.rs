// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Tile memory map and lock slot assignment shared by tile programs and the host.
//!
//! Both sides compute record addresses from these constants, so any change
//! here is a protocol change.

use core::fmt;

/// Size of the data memory owned by one tile, in bytes.
pub const TILE_MEMORY_SIZE: usize = 0x8000;

/// Start of the area tile programs use to stage log text.
pub const LOG_BUFFER_OFFSET: usize = 0x7000;
/// Capacity of the log staging area.
pub const LOG_BUFFER_LEN: usize = 0x0f00;

/// Start of the shared RPC record inside tile memory.
pub const RPC_RECORD_OFFSET: usize = 0x7f00;
/// Expected size of the RPC record data part.
pub const RPC_RECORD_SIZE: usize = 32;

/// Lock slots per tile.
pub const LOCKS_PER_TILE: usize = 16;
/// Lock slot signalling a pending request from the tile.
pub const RPC_ARRIVE_LOCK: LockId = LockId(0);
/// Lock slot signalling that the host answered the pending request.
pub const RPC_COMPLETE_LOCK: LockId = LockId(1);
/// Lock slot used by the horizontal barrier unless told otherwise.
pub const DEFAULT_HORIZONTAL_LOCK: LockId = LockId(14);
/// Lock slot used by the vertical barrier unless told otherwise.
pub const DEFAULT_VERTICAL_LOCK: LockId = LockId(15);

const _: () = assert!(LOG_BUFFER_OFFSET + LOG_BUFFER_LEN <= RPC_RECORD_OFFSET);
const _: () = assert!(RPC_RECORD_OFFSET + RPC_RECORD_SIZE <= TILE_MEMORY_SIZE);

/// Index of a lock slot inside one tile's lock unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LockId(u8);

impl LockId {
    /// Returns the slot index when it exists in a lock unit.
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < LOCKS_PER_TILE {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Raw slot index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Slots owned by the RPC handshake; programs must not drive them.
    pub const fn is_reserved(self) -> bool {
        self.0 == RPC_ARRIVE_LOCK.0 || self.0 == RPC_COMPLETE_LOCK.0
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lock#{}", self.0)
    }
}
