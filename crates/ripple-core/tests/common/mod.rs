// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use ripple_core::{
    BroadcastController, BroadcastLedger, BroadcastOptions, CellId, GridPoint, RippleBroadcast,
    RippleError,
};

/// Mesh edge used by the corridor fixture.
pub const EDGE: u32 = 16;

/// Point on the 16×16 fixture mesh.
pub fn p(x: u32, y: u32) -> GridPoint {
    GridPoint::new(x, y, EDGE).expect("fixture point in range")
}

/// Corridor fixture: node at (5,5) relaying toward (13,5) with grid size 4.
///
/// Cells (row-major id, representative) ranked best first:
/// - A `6`  (8,4): angle 0,    distance √36/16√2
/// - B `5`  (4,4): angle 0,    distance √84/16√2  (the node's own cell)
/// - D `10` (8,8): angle 0.25, distance √52/16√2
/// - G `2`  (8,0): angle 0.25, distance √84/16√2
/// - C `9`  (4,8): angle 0.5,  distance √100/16√2
/// - F `1`  (4,0): angle 0.5,  distance √132/16√2
/// - E `4`  (0,4): angle 1,    distance √196/16√2
pub fn corridor_current() -> GridPoint {
    p(5, 5)
}

/// Target of the corridor fixture.
pub fn corridor_target() -> GridPoint {
    p(13, 5)
}

/// Neighbors of the corridor fixture, two in cells A and B, one elsewhere.
pub fn corridor_neighbors() -> Vec<GridPoint> {
    vec![
        p(2, 5),
        p(5, 2),
        p(8, 6),
        p(9, 5),
        p(6, 5),
        p(5, 6),
        p(9, 9),
        p(9, 2),
        p(5, 9),
    ]
}

pub const CELL_A: CellId = CellId::new(6);
pub const CELL_B: CellId = CellId::new(5);
pub const CELL_D: CellId = CellId::new(10);
pub const CELL_G: CellId = CellId::new(2);
pub const CELL_C: CellId = CellId::new(9);
pub const CELL_F: CellId = CellId::new(1);
pub const CELL_E: CellId = CellId::new(4);

pub fn corridor_options() -> BroadcastOptions {
    BroadcastOptions {
        grid_size: 4,
        ..BroadcastOptions::default()
    }
}

pub fn corridor() -> RippleBroadcast<BroadcastLedger> {
    let ledger = BroadcastLedger::new(corridor_current(), corridor_target());
    RippleBroadcast::new(ledger, corridor_neighbors(), corridor_options())
        .expect("corridor fixture builds")
}

/// Subscribes a recorder to skip notifications.
pub fn record_skips<C: BroadcastController>(
    broadcast: &mut RippleBroadcast<C>,
) -> Arc<Mutex<Vec<CellId>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    broadcast.on_skip(move |cell| sink.lock().expect("skip log lock").push(cell));
    log
}

pub fn skips(log: &Arc<Mutex<Vec<CellId>>>) -> Vec<CellId> {
    log.lock().expect("skip log lock").clone()
}

/// Pulls until the sequence ends.
pub fn drain<C: BroadcastController>(
    broadcast: &mut RippleBroadcast<C>,
) -> Result<Vec<GridPoint>, RippleError> {
    let mut out = Vec::new();
    while let Some(point) = broadcast.pull_next()? {
        out.push(point);
    }
    Ok(out)
}

/// Controller whose retry queue never drains.
#[derive(Debug)]
pub struct StuckController {
    pub current: GridPoint,
    pub end: GridPoint,
}

impl BroadcastController for StuckController {
    fn current_point(&self) -> GridPoint {
        self.current
    }

    fn end_point(&self) -> GridPoint {
        self.end
    }

    fn has_resolved_point(&self, _point: &GridPoint) -> bool {
        false
    }

    fn resolve_point(&mut self, _point: &GridPoint) -> bool {
        true
    }

    fn has_pending_retries(&self) -> bool {
        true
    }
}
