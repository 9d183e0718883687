// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(missing_docs)]
//! Spatial index invariants: partition, ordering, determinism.

mod common;

use std::cmp::Ordering;
use std::collections::HashSet;

use proptest::prelude::*;
use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestRng, TestRunner};

use common::{corridor_current, corridor_neighbors, corridor_target, drain, p, CELL_A, CELL_B};
use ripple_core::{
    compare_scores, BroadcastLedger, BroadcastOptions, GridPoint, RippleBroadcast, RippleError,
    SpatialIndex,
};

// Re-run with another seed locally via PROPTEST_SEED, or edit SEED_BYTES.
const SEED_BYTES: [u8; 32] = [
    0x52, 0x49, 0x50, 0x4c, 0x45, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0,
];

fn pinned_runner() -> TestRunner {
    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED_BYTES);
    TestRunner::new_with_rng(PropConfig::default(), rng)
}

/// (edge, current, target, neighbors, grid) with every point inside the mesh.
fn scenario() -> impl Strategy<Value = (GridPoint, GridPoint, Vec<GridPoint>, u32)> {
    (2u32..40)
        .prop_flat_map(|edge| {
            let coord = (0..edge, 0..edge);
            (
                Just(edge),
                coord.clone(),
                coord.clone(),
                prop::collection::vec(coord, 0..24),
                1u32..12,
            )
        })
        .prop_map(|(edge, (cx, cy), (tx, ty), raw, grid)| {
            let at = |x, y| GridPoint::new(x, y, edge).expect("strategy stays in range");
            let neighbors = raw.into_iter().map(|(x, y)| at(x, y)).collect();
            (at(cx, cy), at(tx, ty), neighbors, grid)
        })
}

/// `a` may precede `b`, up to rounding in the weighted delta.
fn in_order(a: (f64, f64), b: (f64, f64)) -> bool {
    compare_scores(a.0, a.1, b.0, b.1) != Ordering::Greater
        || (a.0 - b.0).mul_add(6.0, (a.1 - b.1) * 4.0) < 1e-9
}

#[test]
fn index_partitions_neighbors_into_sorted_cells() {
    let mut runner = pinned_runner();
    runner
        .run(&scenario(), |(current, target, neighbors, grid)| {
            let index = SpatialIndex::build(current, target, neighbors.clone(), grid)
                .expect("valid grid");
            let distinct: HashSet<_> = neighbors.iter().map(GridPoint::id).collect();
            prop_assert_eq!(index.len(), distinct.len());

            let mut seen = HashSet::new();
            for ranked in index.ranked_cells() {
                prop_assert!(!ranked.members.is_empty());
                for member in &ranked.members {
                    prop_assert_eq!(member.cell, ranked.detail.id);
                    prop_assert_eq!(member.point.cell_id(grid).ok(), Some(ranked.detail.id));
                    prop_assert!(seen.insert(member.id), "{} indexed twice", member.point);
                }
                for pair in ranked.members.windows(2) {
                    prop_assert!(in_order(
                        (pair[0].angle, pair[0].distance),
                        (pair[1].angle, pair[1].distance)
                    ));
                }
                prop_assert_eq!(
                    Some(ranked.detail.representative),
                    ranked.members[0].point.quantize(grid).ok()
                );
            }
            prop_assert_eq!(seen.len(), distinct.len());

            for pair in index.ranked_cells().windows(2) {
                let (a, b) = (&pair[0].detail, &pair[1].detail);
                prop_assert!(in_order((a.angle, a.distance), (b.angle, b.distance)));
            }
            Ok(())
        })
        .expect("index partition property");
}

#[test]
fn unresolved_broadcast_offers_every_neighbor_once() {
    let mut runner = pinned_runner();
    runner
        .run(&scenario(), |(current, target, neighbors, grid)| {
            let options = BroadcastOptions {
                grid_size: grid,
                ..BroadcastOptions::default()
            };
            let ledger = BroadcastLedger::new(current, target);
            let mut broadcast =
                RippleBroadcast::new(ledger, neighbors.clone(), options).expect("valid grid");
            let pulled = drain(&mut broadcast).expect("ledger without rejections");

            let distinct: HashSet<_> = neighbors.iter().map(GridPoint::id).collect();
            let offered: HashSet<_> = pulled.iter().map(GridPoint::id).collect();
            prop_assert_eq!(pulled.len(), offered.len(), "a neighbor was offered twice");
            prop_assert_eq!(offered, distinct);
            prop_assert_eq!(broadcast.passes(), 1);
            Ok(())
        })
        .expect("single pass coverage property");
}

#[test]
fn rebuilding_gives_the_same_index() {
    let build = || {
        SpatialIndex::build(corridor_current(), corridor_target(), corridor_neighbors(), 4)
            .expect("corridor index")
    };
    let (a, b) = (build(), build());
    assert_eq!(a.grid_size(), 4);
    assert_eq!(a.ranked_cells(), b.ranked_cells());
}

#[test]
fn scores_use_the_mesh_diagonal() {
    let index = SpatialIndex::build(corridor_current(), corridor_target(), corridor_neighbors(), 4)
        .expect("corridor index");
    let diagonal = 16.0 * std::f64::consts::SQRT_2;

    let ahead = index.point(p(9, 5).id()).expect("indexed");
    assert!(ahead.angle.abs() < f64::EPSILON);
    assert!((ahead.distance - 32f64.sqrt() / diagonal).abs() < 1e-12);

    // Straight behind the node scores the worst angle exactly.
    let behind = index.point(p(2, 5).id()).expect("indexed");
    assert_eq!(behind.angle.to_bits(), 1.0_f64.to_bits());

    let side = index.point(p(5, 9).id()).expect("indexed");
    assert!((side.angle - 0.5).abs() < 1e-12);
}

#[test]
fn members_are_ranked_best_first() {
    let index = SpatialIndex::build(corridor_current(), corridor_target(), corridor_neighbors(), 4)
        .expect("corridor index");
    let a: Vec<_> = index
        .members(CELL_A)
        .expect("cell A")
        .iter()
        .map(|m| m.point)
        .collect();
    assert_eq!(a, vec![p(9, 5), p(8, 6)]);
    let b: Vec<_> = index
        .members(CELL_B)
        .expect("cell B")
        .iter()
        .map(|m| m.point)
        .collect();
    assert_eq!(b, vec![p(6, 5), p(5, 6)]);
    assert_eq!(index.cell(CELL_B).expect("cell B").representative, p(4, 4));
}

#[test]
fn duplicate_neighbors_keep_the_first_occurrence() {
    let mut neighbors = corridor_neighbors();
    neighbors.extend(corridor_neighbors());
    let index = SpatialIndex::build(corridor_current(), corridor_target(), neighbors, 4)
        .expect("corridor index");
    assert_eq!(index.len(), corridor_neighbors().len());
    assert_eq!(index.members(CELL_A).expect("cell A").len(), 2);
}

#[test]
fn node_on_its_target_scores_angle_zero() {
    let here = p(7, 7);
    let index = SpatialIndex::build(here, here, [p(7, 8), p(0, 0)], 4).expect("index");
    for ranked in index.ranked_cells() {
        assert!(ranked.detail.angle.abs() < f64::EPSILON);
        for member in &ranked.members {
            assert!(member.angle.abs() < f64::EPSILON);
        }
    }
}

#[test]
fn points_from_another_mesh_are_rejected() {
    let stranger = GridPoint::new(1, 1, 8).expect("point");
    let mut neighbors = corridor_neighbors();
    neighbors.push(stranger);
    let err = SpatialIndex::build(corridor_current(), corridor_target(), neighbors, 4)
        .expect_err("foreign neighbor");
    assert!(matches!(err, RippleError::UnknownPeer(id) if id == stranger.id()));

    let far_target = GridPoint::new(13, 5, 32).expect("point");
    let err = SpatialIndex::build(corridor_current(), far_target, corridor_neighbors(), 4)
        .expect_err("foreign target");
    assert!(matches!(err, RippleError::UnknownPeer(id) if id == far_target.id()));
}
