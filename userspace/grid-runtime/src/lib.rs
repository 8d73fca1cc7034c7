// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

//! CONTEXT: Host-side emulation of a tile grid running one program per tile
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests + tests/barriers.rs + tests/launch.rs
//!
//! PUBLIC API:
//!   - Grid<B>: tile state and the launcher (`run`, `run_with`, `run_fn`)
//!   - Tile<B>: per-tile context (requests, logging, grid barriers)
//!   - TileProgram<B>: prerun/run/postrun hooks
//!   - Backend / Emulated / Polled / BackendKind: lock slot selection
//!   - GridConfig: TOML configuration
//!
//! DEPENDENCIES:
//!   - grid-rpc: tile → host requests and the host dispatcher
//!   - serde + toml: configuration
//!   - log: run diagnostics

use grid_abi::{GeometryError, LockId, TileCoord};
use grid_rpc::{RegistryError, RpcError};
use grid_sync::{LockError, MemoryError};
use thiserror::Error;

mod backend;
mod barrier;
pub mod config;
mod grid;
mod program;
mod tile;

pub use backend::{Backend, BackendKind, Emulated, Polled};
pub use config::{ConfigError, GridConfig};
pub use grid::{Grid, RunReport, TileFailure};
pub use program::TileProgram;
pub use tile::Tile;

pub use grid_abi::Geometry;

/// Errors surfaced by the runtime and by tile programs.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Request or dispatch failure.
    #[error(transparent)]
    Rpc(#[from] RpcError),
    /// A handler slot was filled twice.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A program addressed a lock slot it may not use.
    #[error(transparent)]
    Lock(#[from] LockError),
    /// Tile memory access outside the tile.
    #[error(transparent)]
    Memory(#[from] MemoryError),
    /// Coordinates outside the grid.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Horizontal and vertical barrier asked for the same slot.
    #[error("horizontal and vertical barrier cannot share {0}")]
    BarrierLocksOverlap(LockId),
    /// The log handler refused a chunk of text.
    #[error("tile {coord}: log request answered with status {status}")]
    LogRejected {
        /// Logging tile.
        coord: TileCoord,
        /// Response word of the handler.
        status: u32,
    },
    /// A tile thread could not be started.
    #[error("tile {coord}: thread spawn failed: {source}")]
    Spawn {
        /// Tile that was being started.
        coord: TileCoord,
        /// Reason reported by the thread builder.
        source: std::io::Error,
    },
    /// The tile program panicked.
    #[error("tile {0}: program panicked")]
    TilePanicked(TileCoord),
    /// Failure reported by a tile program itself.
    #[error("{0}")]
    Program(String),
}
