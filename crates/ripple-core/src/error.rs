// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error type shared by the index, the broadcast generator and the relay session.

use ripple_geom::{GeomError, PointId};
use thiserror::Error;

/// Errors surfaced by ripple-core.
#[derive(Debug, Error)]
pub enum RippleError {
    /// Invalid grid position or quantization request.
    #[error(transparent)]
    Geometry(#[from] GeomError),
    /// The outer retry loop (or the relay step loop) hit its bound while work
    /// was still pending.
    #[error("broadcast did not converge after {passes} passes")]
    NotConverged {
        /// Passes (or relay steps) completed before giving up.
        passes: u32,
    },
    /// A point that is not part of the mesh.
    #[error("unknown peer {0}")]
    UnknownPeer(PointId),
    /// A mesh description that could not be parsed or written.
    #[error("mesh format error: {0}")]
    MeshFormat(#[from] serde_json::Error),
}
