// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Host handlers for the request kinds, one slot per kind.
//!
//! The registry is owned by the dispatcher that uses it; nothing here is
//! process-wide. Each slot can be filled once.

use std::io::Write;

use grid_abi::TileCoord;
use grid_sync::{MemoryError, TileMemory};
use log::warn;

use crate::wire::{ImageUpdateData, LogData, Request, RequestKind};
use crate::{Result, RpcError};

/// Response returned by [`LogPrinter`] when the text was printed.
pub const LOG_STATUS_OK: u32 = 0;
/// Response returned by [`LogPrinter`] when the text range is invalid.
pub const LOG_STATUS_BAD_RANGE: u32 = 1;
/// Response returned by [`LogPrinter`] when the sink failed.
pub const LOG_STATUS_SINK_FAILED: u32 = 2;

/// Errors raised while filling the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The slot for this kind is already taken.
    #[error("a handler for {0} is already registered")]
    AlreadyRegistered(RequestKind),
}

/// Host view of the tile whose request is being handled.
pub struct TileView<'a> {
    coord: TileCoord,
    memory: &'a TileMemory,
}

impl<'a> TileView<'a> {
    /// Wraps the memory of the tile at `coord`.
    pub fn new(coord: TileCoord, memory: &'a TileMemory) -> Self {
        Self { coord, memory }
    }

    /// Position of the requesting tile.
    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    /// Column of the requesting tile.
    pub fn x(&self) -> u32 {
        self.coord.x
    }

    /// Row of the requesting tile.
    pub fn y(&self) -> u32 {
        self.coord.y
    }

    /// Copies `len` bytes out of tile memory.
    pub fn memcpy_d2h(&self, addr: u32, len: usize) -> core::result::Result<Vec<u8>, MemoryError> {
        self.memory.read_vec(addr as usize, len)
    }

    /// Copies `data` into tile memory.
    pub fn memcpy_h2d(&self, addr: u32, data: &[u8]) -> core::result::Result<(), MemoryError> {
        self.memory.write(addr as usize, data)
    }
}

/// Host handler for one request kind.
pub trait Handler<P>: Send {
    /// Acts on `payload` sent by `tile` and returns the response word.
    fn handle(&mut self, tile: &TileView<'_>, payload: P) -> u32;
}

impl<P, F> Handler<P> for F
where
    F: FnMut(&TileView<'_>, P) -> u32 + Send,
{
    fn handle(&mut self, tile: &TileView<'_>, payload: P) -> u32 {
        self(tile, payload)
    }
}

/// Prints log text pulled from tile memory to a writer.
pub struct LogPrinter<W> {
    sink: W,
}

impl LogPrinter<std::io::Stdout> {
    /// Printer writing to standard output.
    pub fn stdout() -> Self {
        Self { sink: std::io::stdout() }
    }
}

impl<W: Write + Send> LogPrinter<W> {
    /// Printer writing to `sink`.
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Returns the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write + Send> Handler<LogData> for LogPrinter<W> {
    fn handle(&mut self, tile: &TileView<'_>, payload: LogData) -> u32 {
        let text = match tile.memcpy_d2h(payload.addr, payload.len as usize) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("log request from tile {} rejected: {err}", tile.coord());
                return LOG_STATUS_BAD_RANGE;
            }
        };
        let written = self.sink.write_all(&text).and_then(|()| self.sink.flush());
        match written {
            Ok(()) => LOG_STATUS_OK,
            Err(err) => {
                warn!("log sink failed for tile {}: {err}", tile.coord());
                LOG_STATUS_SINK_FAILED
            }
        }
    }
}

/// Handler slots for every kind the dispatcher forwards.
#[derive(Default)]
pub struct HandlerRegistry {
    image_update: Option<Box<dyn Handler<ImageUpdateData>>>,
    log: Option<Box<dyn Handler<LogData>>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the log printer writing to standard output.
    pub fn with_stdout_log() -> Self {
        let mut registry = Self::new();
        registry.log = Some(Box::new(LogPrinter::stdout()));
        registry
    }

    /// Fills the image update slot.
    pub fn on_image_update(
        &mut self,
        handler: impl Handler<ImageUpdateData> + 'static,
    ) -> core::result::Result<&mut Self, RegistryError> {
        if self.image_update.is_some() {
            return Err(RegistryError::AlreadyRegistered(RequestKind::ImageUpdate));
        }
        self.image_update = Some(Box::new(handler));
        Ok(self)
    }

    /// Fills the log slot.
    pub fn on_log(
        &mut self,
        handler: impl Handler<LogData> + 'static,
    ) -> core::result::Result<&mut Self, RegistryError> {
        if self.log.is_some() {
            return Err(RegistryError::AlreadyRegistered(RequestKind::Log));
        }
        self.log = Some(Box::new(handler));
        Ok(self)
    }

    /// Whether a request of `kind` can be dispatched.
    pub fn is_registered(&self, kind: RequestKind) -> bool {
        match kind {
            RequestKind::Done => false,
            RequestKind::ImageUpdate => self.image_update.is_some(),
            RequestKind::Log => self.log.is_some(),
        }
    }

    /// Runs the handler matching `request`.
    ///
    /// "done" is the dispatcher's business and never reaches a handler.
    pub(crate) fn dispatch(&mut self, tile: &TileView<'_>, request: Request) -> Result<u32> {
        let missing = |kind| RpcError::MissingHandler { coord: tile.coord(), kind };
        match request {
            Request::Done => Err(RpcError::NotDispatchable { coord: tile.coord(), kind: RequestKind::Done }),
            Request::ImageUpdate(data) => {
                let handler = self.image_update.as_mut().ok_or_else(|| missing(RequestKind::ImageUpdate))?;
                Ok(handler.handle(tile, data))
            }
            Request::Log(data) => {
                let handler = self.log.as_mut().ok_or_else(|| missing(RequestKind::Log))?;
                Ok(handler.handle(tile, data))
            }
        }
    }
}
