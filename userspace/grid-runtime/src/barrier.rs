// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Token barrier along a line of tiles, built from one lock slot per tile.
//!
//! The token starts at the first tile and walks to the last one; the
//! acknowledgements walk back. A tile leaves only after its predecessor
//! arrived and its successor acknowledged, which means every tile of the
//! line arrived. Every slot is left free and `false`, so the barrier can be
//! entered again straight away.
//!
//! A slot is driven by exactly two tiles: its owner (waiting for `true`) and
//! its predecessor (arming it, then waiting for the acknowledgement). The
//! predecessor closes its own hold on the slot, so the owner's next round
//! cannot observe a stale value.

use grid_sync::LockSlot;

/// Runs one tile's part of the barrier.
///
/// `own` is this tile's slot, `successor` the same slot of the next tile in
/// propagation order.
pub(crate) fn propagate<L: LockSlot>(own: &L, is_first: bool, successor: Option<&L>) {
    if !is_first {
        own.acquire_with_value(true);
    }
    if let Some(next) = successor {
        next.acquire_with_value(false);
        next.release_with_value(true);
        next.acquire_with_value(false);
        next.release_with_value(false);
    }
    // Acknowledges the predecessor; on the first tile it only resets the slot.
    own.release_with_value(false);
}
