// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use core::fmt;

use thiserror::Error;

use crate::types::cell::CellId;
use crate::types::vec2::Vec2;

/// Largest supported mesh edge. Keeps every row-major cell number within `u32`.
pub const MAX_EDGE_SIZE: u32 = 65_535;

/// Errors raised when constructing or quantizing grid positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeomError {
    /// Mesh edge is zero or larger than [`MAX_EDGE_SIZE`].
    #[error("edge size {edge_size} outside 1..=65535")]
    InvalidEdgeSize {
        /// Rejected edge size.
        edge_size: u32,
    },
    /// Coordinates fall outside the `edge_size × edge_size` mesh.
    #[error("point ({x}, {y}) outside a mesh of edge {edge_size}")]
    PointOutOfBounds {
        /// Column.
        x: u32,
        /// Row.
        y: u32,
        /// Mesh edge.
        edge_size: u32,
    },
    /// Quantization was requested with a zero grid size.
    #[error("grid size must be non-zero")]
    InvalidGridSize,
}

/// Exact identity of a mesh position: `(y << 32) | x`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PointId(u64);

impl PointId {
    /// Packs grid coordinates into an id.
    #[must_use]
    pub const fn from_coords(x: u32, y: u32) -> Self {
        Self(((y as u64) << 32) | x as u64)
    }

    /// Returns the packed value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "point#{:#x}", self.0)
    }
}

/// A peer position on a square mesh.
///
/// Invariants:
/// - `1 <= edge_size <= MAX_EDGE_SIZE`.
/// - `x < edge_size` and `y < edge_size`.
///
/// `edge_size` travels with the point because distance scores are normalized
/// by the mesh diagonal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GridPoint {
    x: u32,
    y: u32,
    edge_size: u32,
}

impl GridPoint {
    /// Creates a point on a mesh of `edge_size × edge_size` peers.
    pub fn new(x: u32, y: u32, edge_size: u32) -> Result<Self, GeomError> {
        if edge_size == 0 || edge_size > MAX_EDGE_SIZE {
            return Err(GeomError::InvalidEdgeSize { edge_size });
        }
        if x >= edge_size || y >= edge_size {
            return Err(GeomError::PointOutOfBounds { x, y, edge_size });
        }
        Ok(Self { x, y, edge_size })
    }

    /// Column.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Row.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Characteristic edge of the mesh this point lives on.
    #[must_use]
    pub const fn edge_size(&self) -> u32 {
        self.edge_size
    }

    /// Exact identity of this position.
    #[must_use]
    pub const fn id(&self) -> PointId {
        PointId::from_coords(self.x, self.y)
    }

    /// Row-major slot of this position within its mesh.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.y as usize * self.edge_size as usize + self.x as usize
    }

    /// Vector from `self` to `other`.
    #[must_use]
    pub fn vector_to(&self, other: &Self) -> Vec2 {
        Vec2::new(
            f64::from(other.x) - f64::from(self.x),
            f64::from(other.y) - f64::from(self.y),
        )
    }

    /// Squared Euclidean distance to `other`.
    #[must_use]
    pub fn distance_squared(&self, other: &Self) -> f64 {
        self.vector_to(other).length_squared()
    }

    /// Canonical representative of the cell containing this point: each
    /// coordinate floored to a multiple of `grid_size`.
    pub fn quantize(&self, grid_size: u32) -> Result<Self, GeomError> {
        if grid_size == 0 {
            return Err(GeomError::InvalidGridSize);
        }
        Ok(Self {
            x: self.x - self.x % grid_size,
            y: self.y - self.y % grid_size,
            edge_size: self.edge_size,
        })
    }

    /// Identifier of the cell containing this point at `grid_size`.
    pub fn cell_id(&self, grid_size: u32) -> Result<CellId, GeomError> {
        if grid_size == 0 {
            return Err(GeomError::InvalidGridSize);
        }
        let per_edge = self.edge_size.div_ceil(grid_size);
        Ok(CellId::new(
            (self.y / grid_size) * per_edge + self.x / grid_size,
        ))
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
