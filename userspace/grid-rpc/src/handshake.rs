// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Two-phase arrive/complete handshake between one tile and the host.
//!
//! The handshake uses the two reserved slots of the tile's lock unit, both
//! starting free with value `false`:
//!
//! - arrive: the tile releases it with `true` once its record holds a request;
//!   the host consumes that `true` and puts the slot back to `false`.
//! - complete: the host releases it with `true` once the response is written;
//!   the tile consumes that `true` and puts the slot back to `false`.

use grid_abi::layout::{RPC_ARRIVE_LOCK, RPC_COMPLETE_LOCK};
use grid_sync::{LockSlot, LockUnit};

/// Tile side of the handshake.
pub struct DeviceBarrier<'a, L> {
    arrive: &'a L,
    complete: &'a L,
}

impl<'a, L: LockSlot> DeviceBarrier<'a, L> {
    /// Binds the handshake slots of `locks`.
    pub fn new(locks: &'a LockUnit<L>) -> Self {
        Self { arrive: locks.slot(RPC_ARRIVE_LOCK), complete: locks.slot(RPC_COMPLETE_LOCK) }
    }

    /// Publishes that the record holds a request.
    pub fn arrive(&self) {
        self.arrive.release_with_value(true);
    }

    /// Blocks until the host completed the pending request.
    pub fn wait_complete(&self) {
        self.complete.acquire_with_value(true);
        self.complete.release_with_value(false);
    }
}

/// Host side of the handshake.
pub struct HostBarrier<'a, L> {
    arrive: &'a L,
    complete: &'a L,
}

impl<'a, L: LockSlot> HostBarrier<'a, L> {
    /// Binds the handshake slots of `locks`.
    pub fn new(locks: &'a LockUnit<L>) -> Self {
        Self { arrive: locks.slot(RPC_ARRIVE_LOCK), complete: locks.slot(RPC_COMPLETE_LOCK) }
    }

    /// Consumes a pending arrival, if any. Never blocks.
    pub fn try_arrive(&self) -> bool {
        if !self.arrive.try_acquire_with_value(true) {
            return false;
        }
        self.arrive.release_with_value(false);
        true
    }

    /// Hands completion to the tile.
    ///
    /// Blocks only while the tile is still returning the previous completion
    /// to idle.
    pub fn wait(&self) {
        self.complete.acquire_with_value(false);
        self.complete.release_with_value(true);
    }
}
