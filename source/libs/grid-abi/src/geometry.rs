// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Grid geometry: tile coordinates, neighbourhood and linearisation.
//!
//! `x` grows towards the East and `y` towards the North. Every tile has up to
//! four neighbours; tiles on the border simply lack the corresponding one.

use core::fmt;

/// Largest accepted grid dimension on either axis.
pub const MAX_DIM: u32 = 64;

/// Errors produced while describing a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// One of the dimensions is zero or larger than [`MAX_DIM`].
    #[error("grid dimension {width}x{height} out of range (1..={MAX_DIM})")]
    BadDimensions {
        /// Requested number of columns.
        width: u32,
        /// Requested number of rows.
        height: u32,
    },
    /// A coordinate lies outside the grid.
    #[error("tile {0} is outside the grid")]
    OutOfGrid(TileCoord),
}

/// Position of a tile in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileCoord {
    /// Column, starting at 0 on the West edge.
    pub x: u32,
    /// Row, starting at 0 on the South edge.
    pub y: u32,
}

impl TileCoord {
    /// Builds a coordinate pair.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Returns the neighbouring position in `dir`, or `None` when it would underflow.
    ///
    /// The result is not checked against any grid; see [`Geometry::neighbor`].
    pub fn moved(self, dir: Dir) -> Option<Self> {
        let (dx, dy) = dir.offset();
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(Self { x, y })
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal direction towards a neighbouring tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dir {
    /// Towards smaller `x`.
    West,
    /// Towards larger `x`.
    East,
    /// Towards smaller `y`.
    South,
    /// Towards larger `y`.
    North,
}

impl Dir {
    /// Displacement `(dx, dy)` of a single step in this direction.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::West => (-1, 0),
            Self::East => (1, 0),
            Self::South => (0, -1),
            Self::North => (0, 1),
        }
    }

    /// The direction pointing back.
    pub const fn opposite(self) -> Self {
        match self {
            Self::West => Self::East,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::North => Self::South,
        }
    }
}

/// Token propagation order used by the horizontal barrier of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowDirection {
    /// The West-most tile starts; the token travels East.
    WestToEast,
    /// The East-most tile starts; the token travels West.
    EastToWest,
}

impl RowDirection {
    /// Direction in which a tile finds its successor.
    pub const fn forward(self) -> Dir {
        match self {
            Self::WestToEast => Dir::East,
            Self::EastToWest => Dir::West,
        }
    }
}

/// Dimensions of a grid together with its addressing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    width: u32,
    height: u32,
}

impl Geometry {
    /// Describes a `width` x `height` grid.
    pub fn new(width: u32, height: u32) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 || width > MAX_DIM || height > MAX_DIM {
            return Err(GeometryError::BadDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Number of columns.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of tiles.
    pub const fn tile_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    /// Returns `true` when `coord` belongs to the grid.
    pub const fn contains(&self, coord: TileCoord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    /// Row-major index of `coord`.
    pub fn linear_id(&self, coord: TileCoord) -> Result<usize, GeometryError> {
        if !self.contains(coord) {
            return Err(GeometryError::OutOfGrid(coord));
        }
        Ok((coord.y * self.width + coord.x) as usize)
    }

    /// Inverse of [`Geometry::linear_id`].
    pub fn coord_of(&self, index: usize) -> Option<TileCoord> {
        if index >= self.tile_count() {
            return None;
        }
        let width = self.width as usize;
        Some(TileCoord::new((index % width) as u32, (index / width) as u32))
    }

    /// Every tile position in row-major order (`y` outer, `x` inner).
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| TileCoord::new(x, y)))
    }

    /// Tile in the West-most column.
    pub const fn is_west_column(&self, x: u32) -> bool {
        x == 0
    }

    /// Tile in the East-most column.
    pub const fn is_east_column(&self, x: u32) -> bool {
        x + 1 == self.width
    }

    /// Tile in the bottom row.
    pub const fn is_south_row(&self, y: u32) -> bool {
        y == 0
    }

    /// Tile in the top row.
    pub const fn is_north_row(&self, y: u32) -> bool {
        y + 1 == self.height
    }

    /// The neighbour of `coord` in `dir`, if it exists in this grid.
    pub fn neighbor(&self, coord: TileCoord, dir: Dir) -> Option<TileCoord> {
        coord.moved(dir).filter(|next| self.contains(*next))
    }

    /// Horizontal barrier propagation order for row `y`.
    ///
    /// Neighbouring rows run in opposite directions so two tiles sharing a
    /// memory module at a row boundary never drive the same lock in the same role.
    pub const fn row_direction(&self, y: u32) -> RowDirection {
        if y % 2 == 0 {
            RowDirection::WestToEast
        } else {
            RowDirection::EastToWest
        }
    }
}
