// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Per-tile execution context handed to tile programs
//! OWNERS: @runtime
//! STATUS: Functional
//! TEST_COVERAGE: tests/barriers.rs, grid-e2e
//!
//! A [`Tile`] owns the tile's request channel, so requests from one tile are
//! strictly sequential. Memory and lock slots of the tile and of its four
//! neighbours are reachable; the two handshake slots are not.

use grid_abi::layout::{DEFAULT_HORIZONTAL_LOCK, DEFAULT_VERTICAL_LOCK, LOG_BUFFER_LEN, LOG_BUFFER_OFFSET};
use grid_abi::{Dir, Geometry, LockId, TileCoord};
use grid_rpc::{Call, DeviceChannel, ImageUpdateData, LogData, LOG_STATUS_OK};
use grid_sync::{LockError, TileMemory};
use log::trace;

use crate::backend::Backend;
use crate::barrier::propagate;
use crate::grid::Grid;
use crate::RuntimeError;

/// Execution context of one tile.
pub struct Tile<'g, B: Backend> {
    grid: &'g Grid<B>,
    coord: TileCoord,
    channel: DeviceChannel<'g, B::Lock>,
}

impl<'g, B: Backend> Tile<'g, B> {
    pub(crate) fn new(grid: &'g Grid<B>, coord: TileCoord) -> Result<Self, RuntimeError> {
        let index = grid.geometry().linear_id(coord)?;
        let channel = DeviceChannel::new(grid.tile_memory(index), grid.tile_locks(index));
        Ok(Self { grid, coord, channel })
    }

    /// Position of this tile.
    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    /// Column of this tile.
    pub fn x(&self) -> u32 {
        self.coord.x
    }

    /// Row of this tile.
    pub fn y(&self) -> u32 {
        self.coord.y
    }

    /// Shape of the grid.
    pub fn geometry(&self) -> Geometry {
        self.grid.geometry()
    }

    /// Row-major index of this tile.
    pub fn linear_id(&self) -> usize {
        (self.coord.y * self.geometry().width() + self.coord.x) as usize
    }

    /// In the West-most column.
    pub fn is_west_column(&self) -> bool {
        self.geometry().is_west_column(self.coord.x)
    }

    /// In the East-most column.
    pub fn is_east_column(&self) -> bool {
        self.geometry().is_east_column(self.coord.x)
    }

    /// In the bottom row.
    pub fn is_south_row(&self) -> bool {
        self.geometry().is_south_row(self.coord.y)
    }

    /// In the top row.
    pub fn is_north_row(&self) -> bool {
        self.geometry().is_north_row(self.coord.y)
    }

    /// Data memory of this tile.
    pub fn memory(&self) -> &'g TileMemory {
        self.grid.tile_memory(self.linear_id())
    }

    /// Data memory of the neighbour in `dir`, or `None` on the grid border.
    ///
    /// Accesses are not ordered with the neighbour's program; pair them with
    /// a barrier or a lock slot handoff.
    pub fn neighbor_memory(&self, dir: Dir) -> Option<&'g TileMemory> {
        let grid = self.grid;
        let next = grid.geometry().neighbor(self.coord, dir)?;
        grid.geometry().linear_id(next).ok().map(|index| grid.tile_memory(index))
    }

    /// One of this tile's program lock slots.
    pub fn self_lock(&self, id: LockId) -> Result<&'g B::Lock, LockError> {
        self.grid.tile_locks(self.linear_id()).program_slot(id)
    }

    /// Slot `id` of the neighbour in `dir`, or `None` on the grid border.
    pub fn neighbor_lock(&self, dir: Dir, id: LockId) -> Result<Option<&'g B::Lock>, LockError> {
        let grid = self.grid;
        let Some(next) = grid.geometry().neighbor(self.coord, dir) else {
            // Reserved ids are refused on the border too.
            return self.self_lock(id).map(|_| None);
        };
        let index = (next.y * grid.geometry().width() + next.x) as usize;
        grid.tile_locks(index).program_slot(id).map(Some)
    }

    /// Sends `call` to the host and returns the response word.
    pub fn send_request(&mut self, call: Call) -> Result<u32, RuntimeError> {
        trace!("tile {}: {}", self.coord, grid_rpc::Request::from(call).kind());
        Ok(self.channel.perform(call)?)
    }

    /// Prints `text` through the host log handler.
    ///
    /// Text longer than the staging buffer is sent in several requests, in
    /// order. Empty text sends nothing.
    pub fn log(&mut self, text: &str) -> Result<(), RuntimeError> {
        for chunk in text.as_bytes().chunks(LOG_BUFFER_LEN) {
            self.memory().write(LOG_BUFFER_OFFSET, chunk)?;
            let data = LogData { addr: LOG_BUFFER_OFFSET as u32, len: chunk.len() as u32 };
            let status = self.send_request(Call::Log(data))?;
            if status != LOG_STATUS_OK {
                return Err(RuntimeError::LogRejected { coord: self.coord, status });
            }
        }
        Ok(())
    }

    /// Announces a new frame of the image stored at `data.addr`.
    pub fn image_update(&mut self, data: ImageUpdateData) -> Result<u32, RuntimeError> {
        self.send_request(Call::ImageUpdate(data))
    }

    /// Waits until every tile of this row reached the same barrier.
    ///
    /// Even rows pass the token West to East, odd rows East to West.
    pub fn horizontal_barrier(&self, id: LockId) -> Result<(), RuntimeError> {
        let forward = self.geometry().row_direction(self.coord.y).forward();
        self.line_barrier(forward, id)
    }

    /// Waits until every tile of this column reached the same barrier.
    pub fn vertical_barrier(&self, id: LockId) -> Result<(), RuntimeError> {
        self.line_barrier(Dir::North, id)
    }

    /// Waits until every tile of the grid reached the same barrier.
    pub fn barrier(&self) -> Result<(), RuntimeError> {
        self.barrier_with(DEFAULT_HORIZONTAL_LOCK, DEFAULT_VERTICAL_LOCK)
    }

    /// [`Tile::barrier`] on explicit slots.
    pub fn barrier_with(&self, horizontal: LockId, vertical: LockId) -> Result<(), RuntimeError> {
        if horizontal == vertical {
            return Err(RuntimeError::BarrierLocksOverlap(horizontal));
        }
        self.horizontal_barrier(horizontal)?;
        self.vertical_barrier(vertical)
    }

    fn line_barrier(&self, forward: Dir, id: LockId) -> Result<(), RuntimeError> {
        let own = self.self_lock(id)?;
        let is_first = self.grid.geometry().neighbor(self.coord, forward.opposite()).is_none();
        let successor = self.neighbor_lock(forward, id)?;
        propagate(own, is_first, successor);
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<(), RuntimeError> {
        Ok(self.channel.finish()?)
    }
}
