// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Code executed by every tile of a grid.

use crate::backend::Backend;
use crate::tile::Tile;
use crate::RuntimeError;

/// A program run by each tile on its own thread.
///
/// The same instance is shared by every tile; per-tile state lives in the
/// [`Tile`] context. The launcher signals "done" after `postrun` whatever the
/// outcome of `run`, so a failing program never stalls the host.
pub trait TileProgram<B: Backend>: Send + Sync {
    /// Decides whether `run` is called on this tile.
    fn prerun(&self, _tile: &mut Tile<'_, B>) -> bool {
        true
    }

    /// Tile body.
    fn run(&self, tile: &mut Tile<'_, B>) -> Result<(), RuntimeError>;

    /// Called after `run`, or instead of it when `prerun` declined.
    fn postrun(&self, _tile: &mut Tile<'_, B>) {}
}

impl<B, F> TileProgram<B> for F
where
    B: Backend,
    F: Fn(&mut Tile<'_, B>) -> Result<(), RuntimeError> + Send + Sync,
{
    fn run(&self, tile: &mut Tile<'_, B>) -> Result<(), RuntimeError> {
        self(tile)
    }
}
