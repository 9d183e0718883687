// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-node broadcast bookkeeping: which points already hold the message and
//! which were rejected and must be retried.
//!
//! The broadcast strategy only talks to the [`BroadcastController`] trait. It
//! reads controller state at decision points and delegates resolution to it;
//! it never adds rejections itself. [`BroadcastLedger`] is the in-memory
//! implementation used by the relay session.

use std::collections::BTreeSet;

use ripple_geom::{GridPoint, PointId};
use rustc_hash::FxHashSet;

/// Bookkeeping seam between a broadcast strategy and its node.
pub trait BroadcastController {
    /// Position of the node relaying the message.
    fn current_point(&self) -> GridPoint;
    /// Position the message is converging on.
    fn end_point(&self) -> GridPoint;
    /// Returns `true` if `point` is known to hold the message already.
    fn has_resolved_point(&self, point: &GridPoint) -> bool;
    /// Records that `point` holds the message. Returns `true` if this changed
    /// the bookkeeping.
    fn resolve_point(&mut self, point: &GridPoint) -> bool;
    /// Returns `true` while rejected points are waiting for a retry.
    fn has_pending_retries(&self) -> bool;
}

/// In-memory [`BroadcastController`].
///
/// Rejections are kept in an ordered set so iteration is deterministic.
#[derive(Debug, Clone)]
pub struct BroadcastLedger {
    current: GridPoint,
    end: GridPoint,
    resolved: FxHashSet<PointId>,
    rejected: BTreeSet<PointId>,
}

impl BroadcastLedger {
    /// Creates an empty ledger for a node at `current` relaying toward `end`.
    #[must_use]
    pub fn new(current: GridPoint, end: GridPoint) -> Self {
        Self {
            current,
            end,
            resolved: FxHashSet::default(),
            rejected: BTreeSet::new(),
        }
    }

    /// Queues `point` for retry. Points that already hold the message are
    /// never queued; returns `true` if the point was newly queued.
    pub fn reject_point(&mut self, point: &GridPoint) -> bool {
        let id = point.id();
        if self.resolved.contains(&id) {
            return false;
        }
        self.rejected.insert(id)
    }

    /// Drops a pending rejection after a retry got through, without marking
    /// the point resolved. Returns `true` if a rejection was pending.
    pub fn acknowledge(&mut self, point: &GridPoint) -> bool {
        self.rejected.remove(&point.id())
    }

    /// Pending rejections in ascending id order.
    pub fn rejected_points(&self) -> impl Iterator<Item = PointId> + '_ {
        self.rejected.iter().copied()
    }

    /// Number of points known to hold the message.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }
}

impl BroadcastController for BroadcastLedger {
    fn current_point(&self) -> GridPoint {
        self.current
    }

    fn end_point(&self) -> GridPoint {
        self.end
    }

    fn has_resolved_point(&self, point: &GridPoint) -> bool {
        self.resolved.contains(&point.id())
    }

    fn resolve_point(&mut self, point: &GridPoint) -> bool {
        let id = point.id();
        self.rejected.remove(&id);
        self.resolved.insert(id)
    }

    fn has_pending_retries(&self) -> bool {
        !self.rejected.is_empty()
    }
}
