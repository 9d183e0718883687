// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![doc = r"Geometry primitives for Ripple.

This crate provides:
- Mesh positions with exact identity (`GridPoint`, `PointId`).
- Planar vectors with squared distances and angles (`Vec2`).
- Coarse cell quantization (`GridPoint::quantize`, `CellId`).

Design notes:
- Deterministic: quantization is integer-only; angles are computed with
  `atan2(|cross|, dot)`, exact for collinear headings.
- `PointId` and `CellId` are distinct newtypes. A cell id is never a point id
  even though both are integers.
"]

/// Foundational geometric types.
pub mod types;

pub use types::cell::CellId;
pub use types::point::{GeomError, GridPoint, PointId, MAX_EDGE_SIZE};
pub use types::vec2::Vec2;
