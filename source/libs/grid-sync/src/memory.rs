// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

use grid_abi::layout::TILE_MEMORY_SIZE;
use parking_lot::Mutex;

/// Errors raised by tile memory accesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    /// The access does not fit in tile memory.
    #[error("access of {len} bytes at {offset:#x} exceeds tile memory")]
    OutOfBounds {
        /// First byte of the access.
        offset: usize,
        /// Number of bytes requested.
        len: usize,
    },
}

/// Data memory of one tile, shared between its program and the host.
pub struct TileMemory {
    bytes: Mutex<Box<[u8]>>,
}

impl Default for TileMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl TileMemory {
    /// Allocates zeroed tile memory.
    pub fn new() -> Self {
        Self { bytes: Mutex::new(vec![0u8; TILE_MEMORY_SIZE].into_boxed_slice()) }
    }

    fn range(offset: usize, len: usize) -> Result<core::ops::Range<usize>, MemoryError> {
        match offset.checked_add(len) {
            Some(end) if end <= TILE_MEMORY_SIZE => Ok(offset..end),
            _ => Err(MemoryError::OutOfBounds { offset, len }),
        }
    }

    /// Copies `out.len()` bytes starting at `offset` into `out`.
    pub fn read(&self, offset: usize, out: &mut [u8]) -> Result<(), MemoryError> {
        let range = Self::range(offset, out.len())?;
        out.copy_from_slice(&self.bytes.lock()[range]);
        Ok(())
    }

    /// Copies `len` bytes starting at `offset` into a new buffer.
    pub fn read_vec(&self, offset: usize, len: usize) -> Result<Vec<u8>, MemoryError> {
        let range = Self::range(offset, len)?;
        Ok(self.bytes.lock()[range].to_vec())
    }

    /// Copies `data` into memory at `offset`.
    pub fn write(&self, offset: usize, data: &[u8]) -> Result<(), MemoryError> {
        let range = Self::range(offset, data.len())?;
        self.bytes.lock()[range].copy_from_slice(data);
        Ok(())
    }

    /// Reads a little-endian word.
    pub fn read_u32(&self, offset: usize) -> Result<u32, MemoryError> {
        let mut word = [0u8; 4];
        self.read(offset, &mut word)?;
        Ok(u32::from_le_bytes(word))
    }

    /// Writes a little-endian word.
    pub fn write_u32(&self, offset: usize, value: u32) -> Result<(), MemoryError> {
        self.write(offset, &value.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_little_endian() {
        let mem = TileMemory::new();
        mem.write_u32(0x10, 0x0403_0201).unwrap();
        assert_eq!(mem.read_vec(0x10, 4).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(mem.read_u32(0x10).unwrap(), 0x0403_0201);
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let mem = TileMemory::new();
        let err = mem.write(TILE_MEMORY_SIZE - 2, &[0; 4]).unwrap_err();
        assert_eq!(err, MemoryError::OutOfBounds { offset: TILE_MEMORY_SIZE - 2, len: 4 });
        assert!(mem.read_vec(usize::MAX, 2).is_err());
        assert!(mem.read_vec(TILE_MEMORY_SIZE, 0).is_ok());
    }
}
