// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resumable forwarding-candidate generator.
//!
//! [`RippleBroadcast::pull_next`] hands out one neighbor per call. Each call
//! runs the traversal until the next candidate is found and then returns,
//! leaving the cursor where the next call resumes.
//!
//! # Passes
//!
//! - **Level 1**: walk the ranked cells and offer only the best member of
//!   each. A cell already resolved is skipped and becomes the skip reference;
//!   later cells the reference dominates are skipped without looking at their
//!   members.
//! - **Level 2**: offer every member not consumed in this pass and not
//!   resolved by the controller. No pruning.
//!
//! After both levels the pass repeats while the controller still has
//! rejected points queued, up to [`BroadcastOptions::max_passes`].
//!
//! # Invariants
//!
//! - Level 1 yields at most one member per cell per pass.
//! - Dominance skips never mark a cell resolved; only
//!   [`RippleBroadcast::resolve_point`] does.
//! - The index is never mutated after construction.

use ripple_geom::{CellId, GridPoint, PointId};
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::controller::BroadcastController;
use crate::error::RippleError;
use crate::index::SpatialIndex;
use crate::notify::SkipNotifier;

/// Default cell size in grid units.
pub const DEFAULT_GRID_SIZE: u32 = 4;
/// Default bound on retry passes.
pub const DEFAULT_MAX_PASSES: u32 = 64;

/// Tuning for one broadcast instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastOptions {
    /// Cell size used to quantize neighbor positions.
    pub grid_size: u32,
    /// Passes allowed before giving up with [`RippleError::NotConverged`].
    pub max_passes: u32,
}

impl Default for BroadcastOptions {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

/// Traversal phase reported by [`RippleBroadcast::current_level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Best member per cell, with pruning.
    One,
    /// Flood of the remaining members.
    Two,
}

impl Level {
    /// Numeric level (`1` or `2`).
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Level1 {
        cursor: usize,
        skip_reference: Option<usize>,
    },
    Level2 {
        cell: usize,
        member: usize,
    },
    Done,
}

impl Phase {
    const START: Self = Self::Level1 {
        cursor: 0,
        skip_reference: None,
    };
}

/// Spatial greedy broadcast for one node relaying one message toward one
/// target.
///
/// Owns its index, its controller and the resolved-cell set; instances share
/// nothing and can be driven independently.
#[derive(Debug)]
pub struct RippleBroadcast<C> {
    index: SpatialIndex,
    controller: C,
    options: BroadcastOptions,
    resolved_cells: FxHashSet<CellId>,
    notifier: SkipNotifier,
    phase: Phase,
    consumed: FxHashSet<PointId>,
    passes: u32,
}

impl<C: BroadcastController> RippleBroadcast<C> {
    /// Indexes `neighbors` around the controller's current point and prepares
    /// the first pass.
    pub fn new<I>(controller: C, neighbors: I, options: BroadcastOptions) -> Result<Self, RippleError>
    where
        I: IntoIterator<Item = GridPoint>,
    {
        let index = SpatialIndex::build(
            controller.current_point(),
            controller.end_point(),
            neighbors,
            options.grid_size,
        )?;
        Ok(Self {
            index,
            controller,
            options,
            resolved_cells: FxHashSet::default(),
            notifier: SkipNotifier::new(),
            phase: Phase::START,
            consumed: FxHashSet::default(),
            passes: 0,
        })
    }

    /// Returns the next neighbor to forward to.
    ///
    /// `Ok(None)` marks the end of the sequence and is returned by every later
    /// call. `Err(NotConverged)` means retries were still pending after
    /// `max_passes`; the generator is finished afterwards.
    pub fn pull_next(&mut self) -> Result<Option<GridPoint>, RippleError> {
        loop {
            match self.phase {
                Phase::Level1 {
                    cursor,
                    skip_reference,
                } => {
                    let cells = self.index.ranked_cells();
                    let Some(ranked) = cells.get(cursor) else {
                        self.phase = Phase::Level2 { cell: 0, member: 0 };
                        continue;
                    };
                    let cell = ranked.detail;
                    let top = ranked.members.first().copied();
                    let reference = skip_reference.and_then(|slot| cells.get(slot));

                    if reference.is_some_and(|r| r.detail.dominates(&cell)) {
                        self.notifier.emit(cell.id);
                        self.phase = Phase::Level1 {
                            cursor: cursor + 1,
                            skip_reference,
                        };
                        continue;
                    }
                    let Some(top) = top else {
                        self.phase = Phase::Level1 {
                            cursor: cursor + 1,
                            skip_reference,
                        };
                        continue;
                    };
                    if self.resolved_cells.contains(&top.cell) {
                        self.notifier.emit(cell.id);
                        self.phase = Phase::Level1 {
                            cursor: cursor + 1,
                            skip_reference: Some(cursor),
                        };
                        continue;
                    }
                    self.consumed.insert(top.id);
                    self.phase = Phase::Level1 {
                        cursor: cursor + 1,
                        skip_reference,
                    };
                    return Ok(Some(top.point));
                }
                Phase::Level2 { cell, member } => {
                    let next = self
                        .index
                        .ranked_cells()
                        .get(cell)
                        .map(|ranked| ranked.members.get(member).copied());
                    match next {
                        None => self.finish_pass()?,
                        Some(None) => {
                            self.phase = Phase::Level2 {
                                cell: cell + 1,
                                member: 0,
                            };
                        }
                        Some(Some(detail)) => {
                            self.phase = Phase::Level2 {
                                cell,
                                member: member + 1,
                            };
                            if !self.consumed.contains(&detail.id)
                                && !self.controller.has_resolved_point(&detail.point)
                            {
                                self.consumed.insert(detail.id);
                                return Ok(Some(detail.point));
                            }
                        }
                    }
                }
                Phase::Done => return Ok(None),
            }
        }
    }

    fn finish_pass(&mut self) -> Result<(), RippleError> {
        self.passes += 1;
        if !self.controller.has_pending_retries() {
            debug!(passes = self.passes, "broadcast exhausted");
            self.phase = Phase::Done;
            return Ok(());
        }
        if self.passes >= self.options.max_passes {
            warn!(
                node = %self.controller.current_point(),
                passes = self.passes,
                "retry queue never drained"
            );
            self.phase = Phase::Done;
            return Err(RippleError::NotConverged {
                passes: self.passes,
            });
        }
        debug!(pass = self.passes + 1, "retries pending, starting another pass");
        self.consumed.clear();
        self.phase = Phase::START;
        Ok(())
    }

    /// Marks `point` as holding the message.
    ///
    /// Points outside this node's neighbor set are ignored and return
    /// `false`. Otherwise the point's cell becomes resolved and the controller
    /// decides the return value.
    pub fn resolve_point(&mut self, point: &GridPoint) -> bool {
        let Some(detail) = self.index.point(point.id()) else {
            return false;
        };
        self.resolved_cells.insert(detail.cell);
        self.controller.resolve_point(point)
    }

    /// Returns `true` if some member of cell `cell` has been resolved.
    #[must_use]
    pub fn has_resolved_min_point_id(&self, cell: CellId) -> bool {
        self.resolved_cells.contains(&cell)
    }

    /// Alias of [`Self::has_resolved_min_point_id`].
    #[must_use]
    pub fn has_resolved_cell(&self, cell: CellId) -> bool {
        self.has_resolved_min_point_id(cell)
    }

    /// Subscribes to skip notifications.
    pub fn on_skip<F>(&mut self, callback: F)
    where
        F: FnMut(CellId) + Send + 'static,
    {
        self.notifier.subscribe(callback);
    }

    /// Phase the generator is in (`Two` once the sequence has ended).
    #[must_use]
    pub fn current_level(&self) -> Level {
        match self.phase {
            Phase::Level1 { .. } => Level::One,
            Phase::Level2 { .. } | Phase::Done => Level::Two,
        }
    }

    /// Returns `true` once the sequence has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Passes completed so far.
    #[must_use]
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// The index built at construction.
    #[must_use]
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Options the instance was built with.
    #[must_use]
    pub fn options(&self) -> BroadcastOptions {
        self.options
    }

    /// Read access to the controller.
    #[must_use]
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Write access to the controller, e.g. to queue rejections.
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }
}
