// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stepping harness: one [`RippleBroadcast`] per peer holding the message.
//!
//! Each [`RelaySession::step`] lets every relay that existed when the step
//! began pull one candidate:
//! - an exhausted relay is marked finished;
//! - an offline candidate rejects the delivery, which queues it on the
//!   sender's ledger for a retry pass;
//! - otherwise the candidate receives the message, gets a relay of its own if
//!   it had none, and resolves the sender on that relay.
//!
//! The session is done once every peer holds the message or a step moved
//! nothing.

use ripple_geom::{GridPoint, PointId};
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::broadcast::{BroadcastOptions, RippleBroadcast};
use crate::controller::BroadcastLedger;
use crate::error::RippleError;
use crate::mesh::Mesh;

/// Running totals for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelayStats {
    /// Peers in the mesh.
    pub peers: usize,
    /// Peers holding the message.
    pub reached: usize,
    /// Transmissions, counting the origin's own receipt.
    pub transmissions: u64,
    /// Deliveries to peers that already held the message.
    pub redundant: u64,
    /// Deliveries refused by offline peers.
    pub rejected: u64,
    /// Relays that gave up with a non-draining retry queue.
    pub stalled: usize,
}

impl RelayStats {
    /// Fraction of peers reached.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage(&self) -> f64 {
        if self.peers == 0 {
            return 0.0;
        }
        self.reached as f64 / self.peers as f64
    }

    /// Peers reached per transmission.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn efficiency(&self) -> f64 {
        if self.transmissions == 0 {
            return 0.0;
        }
        self.reached as f64 / self.transmissions as f64
    }
}

/// Outcome of one [`RelaySession::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// 1-based step number.
    pub step: u32,
    /// Messages delivered this step (new and redundant).
    pub deliveries: usize,
    /// Deliveries refused this step.
    pub rejections: usize,
    /// Totals after this step.
    pub stats: RelayStats,
    /// Whether the session has finished.
    pub done: bool,
}

#[derive(Debug)]
struct Relay {
    point: GridPoint,
    broadcast: RippleBroadcast<BroadcastLedger>,
    finished: bool,
}

/// Drives a message from `start` toward `end` across a mesh.
#[derive(Debug)]
pub struct RelaySession {
    mesh: Mesh,
    end: GridPoint,
    options: BroadcastOptions,
    relays: Vec<Relay>,
    slots: FxHashMap<PointId, usize>,
    step: u32,
    transmissions: u64,
    redundant: u64,
    rejected: u64,
    stalled: usize,
    done: bool,
}

impl RelaySession {
    /// Hands the message to `start` and prepares its relay.
    #[instrument(skip_all, fields(%start, %end))]
    pub fn start(
        mesh: Mesh,
        start: GridPoint,
        end: GridPoint,
        options: BroadcastOptions,
    ) -> Result<Self, RippleError> {
        for p in [start, end] {
            if !mesh.contains(&p) {
                return Err(RippleError::UnknownPeer(p.id()));
            }
        }
        let mut session = Self {
            mesh,
            end,
            options,
            relays: Vec::new(),
            slots: FxHashMap::default(),
            step: 0,
            transmissions: 1,
            redundant: 0,
            rejected: 0,
            stalled: 0,
            done: false,
        };
        session.spawn_relay(start)?;
        info!(peers = session.mesh.peer_count(), "relay session started");
        Ok(session)
    }

    fn spawn_relay(&mut self, point: GridPoint) -> Result<usize, RippleError> {
        let neighbors = self.mesh.neighbors(&point)?.to_vec();
        let ledger = BroadcastLedger::new(point, self.end);
        let broadcast = RippleBroadcast::new(ledger, neighbors, self.options)?;
        debug!(
            %point,
            neighbors = broadcast.index().len(),
            cells = broadcast.index().cell_count(),
            "relay spawned"
        );
        let slot = self.relays.len();
        self.relays.push(Relay {
            point,
            broadcast,
            finished: false,
        });
        self.slots.insert(point.id(), slot);
        Ok(slot)
    }

    /// Advances every relay by one pull.
    pub fn step(&mut self) -> Result<StepReport, RippleError> {
        if self.done {
            return Ok(self.report(0, 0));
        }
        self.step += 1;
        let active = self.relays.len();
        let mut deliveries = 0;
        let mut rejections = 0;

        for slot in 0..active {
            if self.relays[slot].finished {
                continue;
            }
            let from = self.relays[slot].point;
            let next = match self.relays[slot].broadcast.pull_next() {
                Ok(next) => next,
                Err(RippleError::NotConverged { passes }) => {
                    warn!(%from, passes, "relay stalled");
                    self.relays[slot].finished = true;
                    self.stalled += 1;
                    continue;
                }
                Err(err) => return Err(err),
            };
            let Some(to) = next else {
                self.relays[slot].finished = true;
                continue;
            };

            self.transmissions += 1;
            if !self.mesh.is_online(&to) {
                self.relays[slot]
                    .broadcast
                    .controller_mut()
                    .reject_point(&to);
                self.rejected += 1;
                rejections += 1;
                continue;
            }
            self.relays[slot].broadcast.controller_mut().acknowledge(&to);
            deliveries += 1;

            let target = match self.slots.get(&to.id()) {
                Some(&target) => {
                    self.redundant += 1;
                    target
                }
                None => self.spawn_relay(to)?,
            };
            self.relays[target].broadcast.resolve_point(&from);
        }

        let reached = self.relays.len();
        self.done = reached == self.mesh.peer_count() || (deliveries == 0 && rejections == 0);
        let report = self.report(deliveries, rejections);
        info!(
            step = report.step,
            deliveries,
            rejections,
            coverage = report.stats.coverage(),
            efficiency = report.stats.efficiency(),
            done = report.done,
            "relay step"
        );
        Ok(report)
    }

    /// Steps until done. Fails with [`RippleError::NotConverged`] if the
    /// session is still running after `max_steps`.
    pub fn run(&mut self, max_steps: u32) -> Result<RelayStats, RippleError> {
        while !self.done {
            if self.step >= max_steps {
                warn!(max_steps, "relay session did not finish");
                return Err(RippleError::NotConverged { passes: self.step });
            }
            self.step()?;
        }
        Ok(self.stats())
    }

    fn report(&self, deliveries: usize, rejections: usize) -> StepReport {
        StepReport {
            step: self.step,
            deliveries,
            rejections,
            stats: self.stats(),
            done: self.done,
        }
    }

    /// Current totals.
    #[must_use]
    pub fn stats(&self) -> RelayStats {
        RelayStats {
            peers: self.mesh.peer_count(),
            reached: self.relays.len(),
            transmissions: self.transmissions,
            redundant: self.redundant,
            rejected: self.rejected,
            stalled: self.stalled,
        }
    }

    /// Returns `true` once the session has finished.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Returns `true` if `point` holds the message.
    #[must_use]
    pub fn has_reached(&self, point: &GridPoint) -> bool {
        self.slots.contains_key(&point.id())
    }

    /// The relay running on `point`, if it holds the message.
    #[must_use]
    pub fn relay(&self, point: &GridPoint) -> Option<&RippleBroadcast<BroadcastLedger>> {
        self.slots
            .get(&point.id())
            .map(|&slot| &self.relays[slot].broadcast)
    }

    /// The mesh being walked.
    #[must_use]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Mutable mesh access, e.g. to bring a peer back online mid-session.
    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }
}
