// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CONTEXT: Host dispatch loop servicing the RPC records of every tile.
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests (host) + tests/dispatch.rs
//!
//! The loop is a busy round-robin scan in row-major order. Each tile is polled
//! with a non-blocking `try_arrive`, so a slow or silent tile never delays the
//! others. It returns once every tile has signalled "done" exactly once.
//!
//! ERROR CONDITIONS (all fatal, never retried):
//!   - RpcError::Protocol: unknown tag in a record
//!   - RpcError::MissingHandler: no handler for the request kind
//!   - RpcError::DuplicateDone: a tile signalled "done" twice
//!   - RpcError::Memory: record outside tile memory

use grid_abi::layout::RPC_RECORD_OFFSET;
use grid_abi::{Geometry, TileCoord};
use grid_sync::{LockSlot, LockUnit, TileMemory};
use log::{debug, error, info};

use crate::handshake::HostBarrier;
use crate::registry::{HandlerRegistry, TileView};
use crate::wire::{decode_request, Request, RECORD_LEN, RESPONSE_OFFSET};
use crate::{Result, RpcError};

/// Shared state of every tile, as seen from the host.
pub trait TileSet: Sync {
    /// Lock slot implementation of the tiles.
    type Lock: LockSlot;

    /// Grid the tiles are laid out on.
    fn geometry(&self) -> Geometry;

    /// Memory of the tile with row-major index `index`.
    fn memory(&self, index: usize) -> &TileMemory;

    /// Lock unit of the tile with row-major index `index`.
    fn locks(&self, index: usize) -> &LockUnit<Self::Lock>;
}

/// Tuning of the scan loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Empty passes between two yields of the host thread.
    pub idle_spins: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { idle_spins: 64 }
    }
}

/// Counters reported by [`Dispatcher::wait_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Requests forwarded to a handler.
    pub handled: u64,
    /// Tiles that signalled "done".
    pub done: usize,
    /// Scan passes over the grid.
    pub passes: u64,
}

/// Completion tracking for one `wait_all` run.
#[derive(Debug, Clone)]
pub struct Progress {
    finished: Vec<bool>,
    stats: DispatchStats,
}

impl Progress {
    /// Nothing finished yet on `geometry`.
    pub fn new(geometry: Geometry) -> Self {
        Self { finished: vec![false; geometry.tile_count()], stats: DispatchStats::default() }
    }

    /// Whether every tile signalled "done".
    pub fn is_complete(&self) -> bool {
        self.stats.done == self.finished.len()
    }

    /// Whether the tile at `index` already signalled "done".
    pub fn is_finished(&self, index: usize) -> bool {
        self.finished.get(index).copied().unwrap_or(false)
    }

    /// Counters so far.
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    fn mark_done(&mut self, index: usize, coord: TileCoord) -> Result<()> {
        match self.finished.get_mut(index) {
            Some(slot) if !*slot => {
                *slot = true;
                self.stats.done += 1;
                Ok(())
            }
            _ => Err(RpcError::DuplicateDone(coord)),
        }
    }
}

/// Host side of the RPC protocol for a whole grid.
pub struct Dispatcher<'g, T> {
    tiles: &'g T,
    registry: HandlerRegistry,
    config: DispatchConfig,
}

impl<'g, T: TileSet> Dispatcher<'g, T> {
    /// Dispatcher over `tiles` forwarding to the handlers in `registry`.
    pub fn new(tiles: &'g T, registry: HandlerRegistry) -> Self {
        Self { tiles, registry, config: DispatchConfig::default() }
    }

    /// Replaces the scan tuning.
    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Handlers used by this dispatcher.
    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    /// Gives the handlers back, e.g. to inspect what they collected.
    pub fn into_registry(self) -> HandlerRegistry {
        self.registry
    }

    /// Services requests until every tile signalled "done".
    ///
    /// A tile that never signals keeps this looping forever; there is no
    /// timeout.
    pub fn wait_all(&mut self) -> Result<DispatchStats> {
        let geometry = self.tiles.geometry();
        info!("dispatching rpc for {}x{} tiles", geometry.width(), geometry.height());
        let mut progress = Progress::new(geometry);
        let idle_spins = self.config.idle_spins.max(1);
        let mut idle: u32 = 0;
        while !progress.is_complete() {
            if self.poll_once(&mut progress)? == 0 {
                idle = idle.wrapping_add(1);
                if idle % idle_spins == 0 {
                    std::thread::yield_now();
                } else {
                    core::hint::spin_loop();
                }
            }
        }
        let stats = progress.stats();
        info!("all tiles done: {} requests over {} passes", stats.handled, stats.passes);
        Ok(stats)
    }

    /// Runs one scan pass and returns how many arrivals it serviced.
    pub fn poll_once(&mut self, progress: &mut Progress) -> Result<usize> {
        let geometry = self.tiles.geometry();
        let mut serviced = 0;
        for (index, coord) in geometry.tiles().enumerate() {
            if self.service(index, coord, progress)? {
                serviced += 1;
            }
        }
        progress.stats.passes += 1;
        Ok(serviced)
    }

    fn service(&mut self, index: usize, coord: TileCoord, progress: &mut Progress) -> Result<bool> {
        let locks = self.tiles.locks(index);
        let barrier = HostBarrier::new(locks);
        if !barrier.try_arrive() {
            return Ok(false);
        }
        let memory = self.tiles.memory(index);
        let mut record = [0u8; RECORD_LEN];
        memory.read(RPC_RECORD_OFFSET, &mut record)?;
        let request = decode_request(&record).map_err(|source| {
            error!("tile {coord}: undecodable rpc record: {source}");
            RpcError::Protocol { coord, source }
        })?;
        match request {
            Request::Done => {
                progress.mark_done(index, coord).inspect_err(|err| error!("{err}"))?;
                debug!("tile {coord} done ({}/{})", progress.stats.done, progress.finished.len());
            }
            Request::ImageUpdate(_) | Request::Log(_) => {
                let view = TileView::new(coord, memory);
                let response = self.registry.dispatch(&view, request).inspect_err(|err| error!("{err}"))?;
                memory.write_u32(RPC_RECORD_OFFSET + RESPONSE_OFFSET, response)?;
                debug!("tile {coord}: {} -> {response}", request.kind());
                progress.stats.handled += 1;
                barrier.wait();
            }
        }
        Ok(true)
    }
}
