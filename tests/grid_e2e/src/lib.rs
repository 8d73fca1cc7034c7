// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Tile grid end-to-end test harness library
//! INTENT: Whole-grid runs with host handlers that record what they saw
//! DEPS: grid-runtime (launcher), grid-rpc (handlers)
//! READINESS: Both lock backends covered
//! TESTS: Logging fan-in, log splitting, image updates, dispatch failures

#![forbid(unsafe_code)]

use std::io::{self, Write};
use std::sync::Arc;

use grid_abi::{Geometry, TileCoord};
use grid_rpc::{HandlerRegistry, LogData, LogPrinter, TileView, LOG_STATUS_BAD_RANGE, LOG_STATUS_OK};
use grid_runtime::{Backend, Grid};
use parking_lot::Mutex;

/// A fresh grid of the given shape.
pub fn grid<B: Backend>(width: u32, height: u32) -> Arc<Grid<B>> {
    let geometry = Geometry::new(width, height).expect("test grid shape is valid");
    Arc::new(Grid::new(geometry))
}

/// Byte sink shared between the host handler and the test body.
#[derive(Clone, Default)]
pub struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    /// Everything written so far.
    pub fn bytes(&self) -> Vec<u8> {
        self.0.lock().clone()
    }

    /// Everything written so far, as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Registry whose log slot prints into a [`SharedSink`].
pub fn printing_registry() -> (HandlerRegistry, SharedSink) {
    let sink = SharedSink::default();
    let mut registry = HandlerRegistry::new();
    registry.on_log(LogPrinter::new(sink.clone())).expect("empty registry");
    (registry, sink)
}

/// One log request as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Requesting tile.
    pub coord: TileCoord,
    /// Text of the request.
    pub text: Vec<u8>,
}

/// Registry whose log slot records each request separately.
pub fn recording_registry() -> (HandlerRegistry, Arc<Mutex<Vec<LogEntry>>>) {
    let entries: Arc<Mutex<Vec<LogEntry>>> = Arc::default();
    let sink = Arc::clone(&entries);
    let mut registry = HandlerRegistry::new();
    registry
        .on_log(move |tile: &TileView<'_>, data: LogData| {
            match tile.memcpy_d2h(data.addr, data.len as usize) {
                Ok(text) => {
                    sink.lock().push(LogEntry { coord: tile.coord(), text });
                    LOG_STATUS_OK
                }
                Err(_) => LOG_STATUS_BAD_RANGE,
            }
        })
        .expect("empty registry");
    (registry, entries)
}
