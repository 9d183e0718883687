// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Two-level ranked spatial index over a node's neighbors.
//!
//! Level 2 is the per-neighbor detail: every neighbor gets a distance score
//! and an angle score relative to the straight line from the current node to
//! the target. Level 1 groups neighbors into coarse cells and ranks the cells
//! with the same heuristic applied to each cell's representative.
//!
//! Scoring:
//! - distance: `sqrt(d²(p, current) + d²(p, target)) / (edge_size * √2)`
//! - angle: angle between `current → p` and `current → target`, over π
//!
//! For cells the angle is measured from the quantized current position toward
//! the quantized target; the distance still uses the real endpoints. Scores
//! are not clamped.
//!
//! Ordering uses [`compare_scores`], a weighted linear combination rather
//! than a lexicographic angle-then-distance order. Sorting is stable, so
//! equal scores keep first-encountered order.

use core::cmp::Ordering;
use core::f64::consts::SQRT_2;

use ripple_geom::{CellId, GridPoint, PointId};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::RippleError;

/// Weight of the angle delta in [`compare_scores`].
pub const ANGLE_WEIGHT: f64 = 6.0;
/// Weight of the distance delta in [`compare_scores`].
pub const DISTANCE_WEIGHT: f64 = 4.0;

/// Orders two `(angle, distance)` score pairs by
/// `(a.angle - b.angle) * 6 + (a.distance - b.distance) * 4`.
///
/// Negative sorts `a` first. A NaN combination compares equal.
pub fn compare_scores(a_angle: f64, a_distance: f64, b_angle: f64, b_distance: f64) -> Ordering {
    let delta = (a_angle - b_angle) * ANGLE_WEIGHT + (a_distance - b_distance) * DISTANCE_WEIGHT;
    delta.partial_cmp(&0.0).unwrap_or(Ordering::Equal)
}

/// Scores for one neighbor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointDetail {
    /// Neighbor position.
    pub point: GridPoint,
    /// Exact identity of `point`.
    pub id: PointId,
    /// Normalized distance score.
    pub distance: f64,
    /// Normalized angle score.
    pub angle: f64,
    /// Cell the neighbor quantizes into.
    pub cell: CellId,
}

impl PointDetail {
    fn compare(&self, other: &Self) -> Ordering {
        compare_scores(self.angle, self.distance, other.angle, other.distance)
    }
}

/// Scores for one occupied cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellDetail {
    /// Canonical quantized point of the cell.
    pub representative: GridPoint,
    /// Cell identity.
    pub id: CellId,
    /// Normalized cell-level distance score.
    pub distance: f64,
    /// Normalized cell-level angle score.
    pub angle: f64,
}

impl CellDetail {
    fn compare(&self, other: &Self) -> Ordering {
        compare_scores(self.angle, self.distance, other.angle, other.distance)
    }

    /// Returns `true` if `self`, used as a skip reference, prunes `candidate`:
    /// the candidate is no farther and no better aligned.
    #[must_use]
    pub fn dominates(&self, candidate: &Self) -> bool {
        candidate.distance <= self.distance && candidate.angle >= self.angle
    }
}

/// A cell together with its ranked members.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCell {
    /// Cell-level scores.
    pub detail: CellDetail,
    /// Members, best first.
    pub members: Vec<PointDetail>,
}

/// Immutable two-level index built once per (node, message, target).
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    grid_size: u32,
    points: FxHashMap<PointId, PointDetail>,
    ranked: Vec<RankedCell>,
    slots: FxHashMap<CellId, usize>,
}

impl SpatialIndex {
    /// Builds the index for a node at `current` relaying toward `target`.
    ///
    /// Neighbors are taken in iteration order; a repeated position keeps its
    /// first occurrence. Every point must share `current`'s mesh edge, else
    /// the first stranger is reported as [`RippleError::UnknownPeer`].
    pub fn build<I>(
        current: GridPoint,
        target: GridPoint,
        neighbors: I,
        grid_size: u32,
    ) -> Result<Self, RippleError>
    where
        I: IntoIterator<Item = GridPoint>,
    {
        let edge_size = current.edge_size();
        if target.edge_size() != edge_size {
            return Err(RippleError::UnknownPeer(target.id()));
        }
        let direction = current.vector_to(&target);
        let max_distance = f64::from(edge_size) * SQRT_2;

        let mut points: FxHashMap<PointId, PointDetail> = FxHashMap::default();
        let mut groups: Vec<(GridPoint, CellId, Vec<PointDetail>)> = Vec::new();
        let mut slots: FxHashMap<CellId, usize> = FxHashMap::default();

        for point in neighbors {
            let id = point.id();
            if point.edge_size() != edge_size {
                return Err(RippleError::UnknownPeer(id));
            }
            if points.contains_key(&id) {
                continue;
            }
            let distance =
                (point.distance_squared(&current) + point.distance_squared(&target)).sqrt();
            let angle = current
                .vector_to(&point)
                .normalized_angle_between(&direction);
            let cell = point.cell_id(grid_size)?;
            let detail = PointDetail {
                point,
                id,
                distance: distance / max_distance,
                angle,
                cell,
            };
            points.insert(id, detail);

            let slot = match slots.get(&cell) {
                Some(&slot) => slot,
                None => {
                    groups.push((point.quantize(grid_size)?, cell, Vec::new()));
                    slots.insert(cell, groups.len() - 1);
                    groups.len() - 1
                }
            };
            groups[slot].2.push(detail);
        }

        let start_rep = current.quantize(grid_size)?;
        let end_rep = target.quantize(grid_size)?;
        let cell_direction = start_rep.vector_to(&end_rep);

        let mut ranked: Vec<RankedCell> = groups
            .into_iter()
            .map(|(representative, id, mut members)| {
                members.sort_by(PointDetail::compare);
                let distance = (representative.distance_squared(&current)
                    + representative.distance_squared(&target))
                .sqrt();
                let angle = start_rep
                    .vector_to(&representative)
                    .normalized_angle_between(&cell_direction);
                RankedCell {
                    detail: CellDetail {
                        representative,
                        id,
                        distance: distance / max_distance,
                        angle,
                    },
                    members,
                }
            })
            .collect();
        ranked.sort_by(|a, b| a.detail.compare(&b.detail));

        let slots = ranked
            .iter()
            .enumerate()
            .map(|(slot, cell)| (cell.detail.id, slot))
            .collect();

        debug!(
            %current,
            %target,
            grid_size,
            neighbors = points.len(),
            cells = ranked.len(),
            "built spatial index"
        );

        Ok(Self {
            grid_size,
            points,
            ranked,
            slots,
        })
    }

    /// Grid size the index was quantized at.
    #[must_use]
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    /// Number of indexed neighbors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` when the node has no neighbors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.ranked.len()
    }

    /// Detail for the neighbor with identity `id`.
    #[must_use]
    pub fn point(&self, id: PointId) -> Option<&PointDetail> {
        self.points.get(&id)
    }

    /// Detail for the occupied cell `id`.
    #[must_use]
    pub fn cell(&self, id: CellId) -> Option<&CellDetail> {
        self.slots.get(&id).map(|&slot| &self.ranked[slot].detail)
    }

    /// Ranked members of cell `id`, best first.
    #[must_use]
    pub fn members(&self, id: CellId) -> Option<&[PointDetail]> {
        self.slots
            .get(&id)
            .map(|&slot| self.ranked[slot].members.as_slice())
    }

    /// All occupied cells, best first.
    #[must_use]
    pub fn ranked_cells(&self) -> &[RankedCell] {
        &self.ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_combination_is_not_lexicographic() {
        // Better angle but much worse distance loses under 6:4 weighting.
        assert_eq!(compare_scores(0.10, 0.90, 0.15, 0.10), Ordering::Greater);
        assert_eq!(compare_scores(0.10, 0.10, 0.15, 0.10), Ordering::Less);
        assert_eq!(compare_scores(0.2, 0.3, 0.2, 0.3), Ordering::Equal);
    }

    #[test]
    fn nan_scores_compare_equal() {
        assert_eq!(compare_scores(f64::NAN, 0.0, 0.0, 0.0), Ordering::Equal);
    }

    #[test]
    fn dominance_requires_both_conditions() -> Result<(), ripple_geom::GeomError> {
        let reference = CellDetail {
            representative: GridPoint::new(0, 0, 4)?,
            id: CellId::new(0),
            distance: 0.5,
            angle: 0.2,
        };
        let cell = |distance, angle| CellDetail {
            distance,
            angle,
            ..reference
        };
        assert!(reference.dominates(&cell(0.5, 0.2)));
        assert!(reference.dominates(&cell(0.4, 0.3)));
        assert!(!reference.dominates(&cell(0.6, 0.3)));
        assert!(!reference.dominates(&cell(0.4, 0.1)));
        Ok(())
    }
}
