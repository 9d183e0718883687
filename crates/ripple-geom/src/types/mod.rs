// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Core geometry types used by the broadcast strategy (points, vectors, cells).
//!
//! Determinism notes:
//! - Positions are integer grid coordinates; only derived quantities
//!   (vectors, distances, angles) are floating point.
//! - Cell quantization floors each coordinate to a multiple of the grid size,
//!   so a point always lands in exactly one cell.

#[doc = "Coarse cell identifiers."]
pub mod cell;
#[doc = "Mesh grid positions and their exact identities."]
pub mod point;
#[doc = "Planar vectors (`f64`)."]
pub mod vec2;
