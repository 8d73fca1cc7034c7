// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Grid launcher: one thread per tile plus the host dispatcher
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: tests/barriers.rs, tests/launch.rs, grid-e2e
//!
//! The dispatcher runs on the calling thread. Tile threads are named
//! `tile-<x>-<y>`. When the dispatcher fails the tiles are not joined: their
//! handshake state is no longer consistent and some of them may never return.

use core::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use grid_abi::{Geometry, TileCoord};
use grid_rpc::{DispatchConfig, DispatchStats, Dispatcher, HandlerRegistry, TileSet};
use grid_sync::{LockUnit, TileMemory};
use log::{error, info};

use crate::backend::Backend;
use crate::program::TileProgram;
use crate::tile::Tile;
use crate::RuntimeError;

struct TileState<L> {
    memory: TileMemory,
    locks: LockUnit<L>,
}

/// Memory and lock slots of every tile of a grid.
pub struct Grid<B: Backend> {
    geometry: Geometry,
    tiles: Vec<TileState<B::Lock>>,
}

/// A tile whose program did not complete cleanly.
#[derive(Debug)]
pub struct TileFailure {
    /// Failing tile.
    pub coord: TileCoord,
    /// What went wrong.
    pub error: RuntimeError,
}

/// Outcome of a completed run.
pub struct RunReport {
    /// Host loop counters.
    pub stats: DispatchStats,
    /// Tiles whose program returned an error or panicked, row-major.
    pub failures: Vec<TileFailure>,
    /// Handlers, with whatever they collected.
    pub registry: HandlerRegistry,
}

impl RunReport {
    /// Whether every tile program succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Debug for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunReport")
            .field("stats", &self.stats)
            .field("failures", &self.failures)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Grid<B> {
    /// Allocates fresh tile state for `geometry`.
    pub fn new(geometry: Geometry) -> Self {
        let tiles = (0..geometry.tile_count())
            .map(|_| TileState { memory: TileMemory::new(), locks: LockUnit::new() })
            .collect();
        Self { geometry, tiles }
    }

    /// Shape of the grid.
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Memory of the tile at row-major `index`.
    pub fn tile_memory(&self, index: usize) -> &TileMemory {
        &self.tiles[index].memory
    }

    /// Lock unit of the tile at row-major `index`.
    ///
    /// The handshake slots belong to the tile's own request channel; opening
    /// another channel on them while the tile runs breaks its requests.
    pub fn tile_locks(&self, index: usize) -> &LockUnit<B::Lock> {
        &self.tiles[index].locks
    }

    /// Whether no lock slot of any tile is held or armed.
    pub fn is_idle(&self) -> bool {
        self.tiles.iter().all(|tile| tile.locks.is_idle())
    }

    /// Runs `program` on every tile with default host tuning.
    pub fn run<P>(self: &Arc<Self>, program: P, registry: HandlerRegistry) -> Result<RunReport, RuntimeError>
    where
        P: TileProgram<B> + 'static,
    {
        self.run_with(DispatchConfig::default(), program, registry)
    }

    /// Runs a closure on every tile.
    pub fn run_fn<F>(self: &Arc<Self>, program: F, registry: HandlerRegistry) -> Result<RunReport, RuntimeError>
    where
        F: Fn(&mut Tile<'_, B>) -> Result<(), RuntimeError> + Send + Sync + 'static,
    {
        self.run(program, registry)
    }

    /// Runs `program` on every tile and services their requests until all
    /// of them are done.
    pub fn run_with<P>(
        self: &Arc<Self>,
        config: DispatchConfig,
        program: P,
        registry: HandlerRegistry,
    ) -> Result<RunReport, RuntimeError>
    where
        P: TileProgram<B> + 'static,
    {
        info!(
            "starting {}x{} grid on the {} backend",
            self.geometry.width(),
            self.geometry.height(),
            B::NAME
        );
        let program = Arc::new(program);
        let mut handles = Vec::with_capacity(self.tiles.len());
        for coord in self.geometry.tiles() {
            let grid = Arc::clone(self);
            let program = Arc::clone(&program);
            let handle = thread::Builder::new()
                .name(format!("tile-{}-{}", coord.x, coord.y))
                .spawn(move || execute(&grid, coord, program.as_ref()))
                .map_err(|source| {
                    error!("tile {coord}: spawn failed: {source}");
                    RuntimeError::Spawn { coord, source }
                })?;
            handles.push((coord, handle));
        }

        let mut dispatcher = Dispatcher::new(self.as_ref(), registry).with_config(config);
        let stats = dispatcher.wait_all()?;

        let mut failures = Vec::new();
        for (coord, handle) in handles {
            let error = match handle.join() {
                Ok(Ok(())) => continue,
                Ok(Err(error)) => error,
                Err(_) => RuntimeError::TilePanicked(coord),
            };
            error!("tile {coord}: {error}");
            failures.push(TileFailure { coord, error });
        }
        Ok(RunReport { stats, failures, registry: dispatcher.into_registry() })
    }
}

// Signals "done" even when the program fails or panics, so the host loop
// always terminates.
fn execute<B, P>(grid: &Grid<B>, coord: TileCoord, program: &P) -> Result<(), RuntimeError>
where
    B: Backend,
    P: TileProgram<B> + ?Sized,
{
    let mut tile = Tile::new(grid, coord)?;
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let result = if program.prerun(&mut tile) { program.run(&mut tile) } else { Ok(()) };
        program.postrun(&mut tile);
        result
    }));
    tile.finish()?;
    match outcome {
        Ok(result) => result,
        Err(_) => Err(RuntimeError::TilePanicked(coord)),
    }
}

impl<B: Backend> TileSet for Grid<B> {
    type Lock = B::Lock;

    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn memory(&self, index: usize) -> &TileMemory {
        self.tile_memory(index)
    }

    fn locks(&self, index: usize) -> &LockUnit<B::Lock> {
        self.tile_locks(index)
    }
}
