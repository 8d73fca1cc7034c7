// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Tile → host remote calls over a shared per-tile record
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Stable
//! TEST_COVERAGE: Unit tests per module + tests/dispatch.rs
//!
//! PUBLIC API:
//!   - DeviceChannel: tile side (`perform`, `finish`)
//!   - Dispatcher / TileSet: host side scan loop (`wait_all`, `poll_once`)
//!   - HandlerRegistry / Handler / TileView / LogPrinter: host handlers
//!   - wire: record layout and the closed set of request kinds
//!   - DeviceBarrier / HostBarrier: the two-phase handshake
//!
//! DEPENDENCIES:
//!   - grid-sync: lock slots and tile memory
//!   - log: dispatch diagnostics
//!   - thiserror: error types
//!
//! Each tile has one request in flight at most. Every protocol failure the
//! host can detect is fatal for the run: a half-completed handshake leaves the
//! record unusable for any later request from that tile.

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

use grid_abi::TileCoord;
use grid_sync::MemoryError;

mod channel;
mod dispatch;
mod handshake;
mod registry;
pub mod wire;

pub use channel::DeviceChannel;
pub use dispatch::{DispatchConfig, DispatchStats, Dispatcher, Progress, TileSet};
pub use handshake::{DeviceBarrier, HostBarrier};
pub use registry::{
    Handler, HandlerRegistry, LogPrinter, RegistryError, TileView, LOG_STATUS_BAD_RANGE,
    LOG_STATUS_OK, LOG_STATUS_SINK_FAILED,
};
pub use wire::{Call, ImageUpdateData, LogData, Request, RequestKind, WireError};

/// Result type returned by RPC operations.
pub type Result<T> = core::result::Result<T, RpcError>;

/// Errors produced by the RPC layer.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The record could not be decoded; host and tiles disagree on the protocol.
    #[error("tile {coord}: protocol desynchronised: {source}")]
    Protocol {
        /// Tile whose record was read.
        coord: TileCoord,
        /// Decoding failure.
        #[source]
        source: WireError,
    },
    /// No handler was registered for a kind that occurred.
    #[error("tile {coord}: no handler registered for {kind}")]
    MissingHandler {
        /// Requesting tile.
        coord: TileCoord,
        /// Kind without a handler.
        kind: RequestKind,
    },
    /// A kind that is handled by the loop itself reached the registry.
    #[error("tile {coord}: {kind} cannot be dispatched to a handler")]
    NotDispatchable {
        /// Requesting tile.
        coord: TileCoord,
        /// Offending kind.
        kind: RequestKind,
    },
    /// A tile signalled "done" after already having done so.
    #[error("tile {0}: signalled done twice")]
    DuplicateDone(TileCoord),
    /// The record lies outside tile memory.
    #[error("tile memory access failed: {0}")]
    Memory(#[from] MemoryError),
}
