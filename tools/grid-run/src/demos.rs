// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Demo tile programs and the host handlers they need.

use std::sync::atomic::{AtomicUsize, Ordering};

use grid_rpc::{ImageUpdateData, TileView};
use grid_runtime::{Backend, RuntimeError, Tile, TileProgram};
use log::{info, warn};

/// Start of the frame buffer in tile memory.
pub const IMAGE_OFFSET: usize = 0;
/// Frame size in bytes, one byte per pixel.
pub const IMAGE_LEN: usize = 256;

/// Every tile greets once.
pub struct Hello;

impl<B: Backend> TileProgram<B> for Hello {
    fn run(&self, tile: &mut Tile<'_, B>) -> Result<(), RuntimeError> {
        tile.log(&format!("hello from tile {}\n", tile.coord()))
    }
}

/// Repeated full-grid barriers; tile 0 reports each passed round.
pub struct BarrierRounds {
    rounds: u32,
    entered: AtomicUsize,
}

impl BarrierRounds {
    pub fn new(rounds: u32) -> Self {
        Self { rounds, entered: AtomicUsize::new(0) }
    }
}

impl<B: Backend> TileProgram<B> for BarrierRounds {
    fn run(&self, tile: &mut Tile<'_, B>) -> Result<(), RuntimeError> {
        let tiles = tile.geometry().tile_count();
        for round in 1..=self.rounds as usize {
            self.entered.fetch_add(1, Ordering::SeqCst);
            tile.barrier()?;
            let seen = self.entered.load(Ordering::SeqCst);
            if seen < round * tiles {
                return Err(RuntimeError::Program(format!(
                    "tile {} passed round {round} with only {seen} arrivals",
                    tile.coord()
                )));
            }
            if tile.linear_id() == 0 {
                tile.log(&format!("barrier round {round} passed\n"))?;
            }
        }
        Ok(())
    }
}

/// Each tile renders frames into its memory and announces them.
pub struct ImageFrames {
    frames: u32,
}

impl ImageFrames {
    pub fn new(frames: u32) -> Self {
        Self { frames }
    }
}

impl<B: Backend> TileProgram<B> for ImageFrames {
    fn run(&self, tile: &mut Tile<'_, B>) -> Result<(), RuntimeError> {
        for frame in 0..self.frames {
            let pixels = render(tile.x(), tile.y(), frame);
            tile.memory().write(IMAGE_OFFSET, &pixels)?;
            let min_value = pixels.iter().copied().min().unwrap_or(0);
            let max_value = pixels.iter().copied().max().unwrap_or(0);
            let data = ImageUpdateData {
                addr: IMAGE_OFFSET as u32,
                counter: frame,
                min_value: min_value.into(),
                max_value: max_value.into(),
            };
            let host_sum = tile.image_update(data)?;
            if host_sum != checksum(&pixels) {
                return Err(RuntimeError::Program(format!(
                    "tile {}: host read frame {frame} as {host_sum:#x}",
                    tile.coord()
                )));
            }
        }
        Ok(())
    }

    fn postrun(&self, tile: &mut Tile<'_, B>) {
        if tile.linear_id() == 0 {
            if let Err(err) = tile.log(&format!("{} frames per tile sent\n", self.frames)) {
                warn!("tile {}: summary line lost: {err}", tile.coord());
            }
        }
    }
}

/// Host side of the image demo: sums the announced frame.
pub fn image_checksum(tile: &TileView<'_>, data: ImageUpdateData) -> u32 {
    match tile.memcpy_d2h(data.addr, IMAGE_LEN) {
        Ok(pixels) => {
            info!(
                "tile {} frame {} range [{}, {}]",
                tile.coord(),
                data.counter,
                data.min_value,
                data.max_value
            );
            checksum(&pixels)
        }
        Err(err) => {
            warn!("tile {}: frame {} unreadable: {err}", tile.coord(), data.counter);
            u32::MAX
        }
    }
}

fn render(x: u32, y: u32, frame: u32) -> Vec<u8> {
    (0..IMAGE_LEN as u32).map(|i| ((x * 31 + y * 17 + i + frame) % 256) as u8).collect()
}

fn checksum(pixels: &[u8]) -> u32 {
    pixels.iter().map(|&p| u32::from(p)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_abi::TileCoord;
    use grid_abi::Geometry;
    use grid_rpc::{HandlerRegistry, LogData, LOG_STATUS_SINK_FAILED};
    use grid_runtime::{Emulated, Grid};
    use grid_sync::TileMemory;
    use std::sync::Arc;

    #[test]
    fn frames_differ_per_tile_and_frame() {
        assert_ne!(render(0, 0, 0), render(1, 0, 0));
        assert_ne!(render(0, 0, 0), render(0, 0, 1));
        assert_eq!(render(2, 3, 4).len(), IMAGE_LEN);
    }

    #[test]
    fn host_checksum_matches_tile_checksum() {
        let memory = TileMemory::new();
        let pixels = render(1, 2, 3);
        memory.write(IMAGE_OFFSET, &pixels).unwrap();
        let view = TileView::new(TileCoord::new(1, 2), &memory);
        let data = ImageUpdateData { addr: IMAGE_OFFSET as u32, counter: 3, min_value: 0, max_value: 255 };
        assert_eq!(image_checksum(&view, data), checksum(&pixels));
        let outside = ImageUpdateData { addr: u32::MAX, ..data };
        assert_eq!(image_checksum(&view, outside), u32::MAX);
    }

    #[test]
    fn refused_summary_line_does_not_fail_the_tile() {
        let mut registry = HandlerRegistry::new();
        registry.on_log(|_: &TileView<'_>, _: LogData| LOG_STATUS_SINK_FAILED).unwrap();
        registry.on_image_update(image_checksum).unwrap();
        let grid: Arc<Grid<Emulated>> = Arc::new(Grid::new(Geometry::new(1, 1).unwrap()));
        let report = grid.run(ImageFrames::new(2), registry).unwrap();
        assert!(report.is_clean(), "{:?}", report.failures);
        assert_eq!(report.stats.handled, 3);
    }
}
