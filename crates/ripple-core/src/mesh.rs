// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Square peer mesh with explicit undirected links.
//!
//! The mesh is the read-only neighbor graph a relay session walks. It is
//! described on disk as JSON:
//!
//! ```json
//! { "edge_size": 3, "links": [[[0, 0], [1, 0]], [[1, 0], [2, 1]]], "offline": [[2, 2]] }
//! ```
//!
//! Neighbor lists keep link insertion order, which is the iteration order the
//! spatial index sees.

use ripple_geom::{GridPoint, PointId};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::RippleError;

/// On-disk mesh description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshSpec {
    /// Peers per row (and per column).
    pub edge_size: u32,
    /// Undirected links as pairs of `[x, y]` coordinates.
    #[serde(default)]
    pub links: Vec<[[u32; 2]; 2]>,
    /// Peers that reject every delivery.
    #[serde(default)]
    pub offline: Vec<[u32; 2]>,
}

/// An `edge_size × edge_size` mesh of peers.
#[derive(Debug, Clone)]
pub struct Mesh {
    edge_size: u32,
    adjacency: FxHashMap<PointId, Vec<GridPoint>>,
    offline: FxHashSet<PointId>,
    links: usize,
}

impl Mesh {
    /// Creates a mesh with no links.
    pub fn new(edge_size: u32) -> Result<Self, RippleError> {
        GridPoint::new(0, 0, edge_size)?;
        Ok(Self {
            edge_size,
            adjacency: FxHashMap::default(),
            offline: FxHashSet::default(),
            links: 0,
        })
    }

    /// Peers per row.
    #[must_use]
    pub fn edge_size(&self) -> u32 {
        self.edge_size
    }

    /// Total number of peers.
    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.edge_size as usize * self.edge_size as usize
    }

    /// Number of undirected links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links
    }

    /// The peer at `(x, y)`.
    pub fn point(&self, x: u32, y: u32) -> Result<GridPoint, RippleError> {
        Ok(GridPoint::new(x, y, self.edge_size)?)
    }

    /// Returns `true` if `point` belongs to this mesh.
    #[must_use]
    pub fn contains(&self, point: &GridPoint) -> bool {
        point.edge_size() == self.edge_size
    }

    fn check(&self, point: &GridPoint) -> Result<(), RippleError> {
        if self.contains(point) {
            Ok(())
        } else {
            Err(RippleError::UnknownPeer(point.id()))
        }
    }

    /// Links `a` and `b` in both directions. Returns `false` for self-links
    /// and links that already exist.
    pub fn connect(&mut self, a: GridPoint, b: GridPoint) -> Result<bool, RippleError> {
        self.check(&a)?;
        self.check(&b)?;
        if a == b || self.neighbors(&a)?.contains(&b) {
            return Ok(false);
        }
        self.adjacency.entry(a.id()).or_default().push(b);
        self.adjacency.entry(b.id()).or_default().push(a);
        self.links += 1;
        Ok(true)
    }

    /// Direct neighbors of `point`, in link order.
    pub fn neighbors(&self, point: &GridPoint) -> Result<&[GridPoint], RippleError> {
        self.check(point)?;
        Ok(self
            .adjacency
            .get(&point.id())
            .map_or(&[][..], Vec::as_slice))
    }

    /// Returns `true` unless `point` was taken offline.
    #[must_use]
    pub fn is_online(&self, point: &GridPoint) -> bool {
        !self.offline.contains(&point.id())
    }

    /// Takes `point` offline (deliveries to it are rejected) or back online.
    pub fn set_online(&mut self, point: &GridPoint, online: bool) -> Result<(), RippleError> {
        self.check(point)?;
        if online {
            self.offline.remove(&point.id());
        } else {
            self.offline.insert(point.id());
        }
        Ok(())
    }

    /// All peers in row-major order.
    pub fn peers(&self) -> impl Iterator<Item = GridPoint> + '_ {
        let edge = self.edge_size;
        (0..edge)
            .flat_map(move |y| (0..edge).map(move |x| (x, y)))
            .filter_map(move |(x, y)| GridPoint::new(x, y, edge).ok())
    }

    /// Builds a mesh from its on-disk description.
    pub fn from_spec(spec: &MeshSpec) -> Result<Self, RippleError> {
        let mut mesh = Self::new(spec.edge_size)?;
        for [[ax, ay], [bx, by]] in &spec.links {
            let a = mesh.point(*ax, *ay)?;
            let b = mesh.point(*bx, *by)?;
            mesh.connect(a, b)?;
        }
        for [x, y] in &spec.offline {
            let p = mesh.point(*x, *y)?;
            mesh.set_online(&p, false)?;
        }
        Ok(mesh)
    }

    /// On-disk description of this mesh. Links are listed once, from the
    /// lower-index endpoint, in row-major order.
    #[must_use]
    pub fn to_spec(&self) -> MeshSpec {
        let mut links = Vec::with_capacity(self.links);
        let mut offline = Vec::new();
        for a in self.peers() {
            if let Some(neighbors) = self.adjacency.get(&a.id()) {
                for b in neighbors.iter().filter(|b| b.index() > a.index()) {
                    links.push([[a.x(), a.y()], [b.x(), b.y()]]);
                }
            }
            if !self.is_online(&a) {
                offline.push([a.x(), a.y()]);
            }
        }
        MeshSpec {
            edge_size: self.edge_size,
            links,
            offline,
        }
    }

    /// Parses a JSON mesh description.
    pub fn from_json(json: &str) -> Result<Self, RippleError> {
        let spec: MeshSpec = serde_json::from_str(json)?;
        Self::from_spec(&spec)
    }

    /// Serializes the mesh as pretty JSON.
    pub fn to_json(&self) -> Result<String, RippleError> {
        Ok(serde_json::to_string_pretty(&self.to_spec())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_are_undirected_and_deduplicated() -> Result<(), RippleError> {
        let mut mesh = Mesh::new(3)?;
        let a = mesh.point(0, 0)?;
        let b = mesh.point(2, 1)?;
        assert!(mesh.connect(a, b)?);
        assert!(!mesh.connect(b, a)?);
        assert!(!mesh.connect(a, a)?);
        assert_eq!(mesh.neighbors(&a)?, &[b]);
        assert_eq!(mesh.neighbors(&b)?, &[a]);
        assert_eq!(mesh.link_count(), 1);
        Ok(())
    }

    #[test]
    fn foreign_points_are_unknown_peers() -> Result<(), RippleError> {
        let mesh = Mesh::new(3)?;
        let foreign = GridPoint::new(1, 1, 5)?;
        assert!(matches!(
            mesh.neighbors(&foreign),
            Err(RippleError::UnknownPeer(id)) if id == foreign.id()
        ));
        Ok(())
    }

    #[test]
    fn json_description_survives_reload() -> Result<(), RippleError> {
        let json = r#"{ "edge_size": 3, "links": [[[0, 0], [1, 0]], [[1, 0], [2, 1]]], "offline": [[2, 2]] }"#;
        let mesh = Mesh::from_json(json)?;
        assert_eq!(mesh.link_count(), 2);
        assert!(!mesh.is_online(&mesh.point(2, 2)?));
        let reloaded = Mesh::from_json(&mesh.to_json()?)?;
        assert_eq!(reloaded.to_spec(), mesh.to_spec());
        Ok(())
    }

    #[test]
    fn out_of_range_link_is_rejected() {
        let json = r#"{ "edge_size": 2, "links": [[[0, 0], [5, 0]]] }"#;
        assert!(matches!(
            Mesh::from_json(json),
            Err(RippleError::Geometry(_))
        ));
    }
}
