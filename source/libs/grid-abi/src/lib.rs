// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

//! CONTEXT: Shared tile-grid definitions used by the device and host sides
//! OWNERS: @runtime
//! PUBLIC API: TileCoord, Dir, RowDirection, Geometry, LockId, layout constants
//! DEPENDS_ON: thiserror
//! INVARIANTS: RPC record is RPC_RECORD_SIZE bytes LE at RPC_RECORD_OFFSET; lock slots 0/1 belong
//!             to the RPC handshake

pub mod geometry;
pub mod layout;

pub use geometry::{Dir, Geometry, GeometryError, RowDirection, TileCoord, MAX_DIM};
pub use layout::LockId;
