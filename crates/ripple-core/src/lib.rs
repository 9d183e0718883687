// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! ripple-core: spatial greedy broadcast for point-to-point meshes.
//!
//! A relaying node builds a [`SpatialIndex`] of its neighbors once per
//! message and then pulls forwarding candidates from a [`RippleBroadcast`]
//! one at a time, resolving acknowledged points between pulls. The
//! [`RelaySession`] harness drives one broadcast per peer across a [`Mesh`].
//!
//! The strategy is a local heuristic: it does not promise minimum hop counts
//! or loop freedom, and relies on the controller's retry queue to converge.
#![forbid(unsafe_code)]

/// Per-node resolved/rejected bookkeeping.
pub mod controller;
/// Two-level ranked spatial index.
pub mod index;
/// Peer mesh description.
pub mod mesh;
/// Skip notifications.
pub mod notify;
/// Stepping harness over a mesh.
pub mod relay;

mod broadcast;
mod error;

pub use broadcast::{
    BroadcastOptions, Level, RippleBroadcast, DEFAULT_GRID_SIZE, DEFAULT_MAX_PASSES,
};
pub use controller::{BroadcastController, BroadcastLedger};
pub use error::RippleError;
pub use index::{compare_scores, CellDetail, PointDetail, RankedCell, SpatialIndex};
pub use mesh::{Mesh, MeshSpec};
pub use notify::SkipNotifier;
pub use relay::{RelaySession, RelayStats, StepReport};
pub use ripple_geom::{CellId, GeomError, GridPoint, PointId};
