// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use core::f64::consts::PI;

/// Length at or below which a vector is treated as degenerate.
pub const EPSILON: f64 = 1e-12;

/// Planar vector in mesh coordinates.
///
/// Components are `f64` grid units. A `Vec2` is always the difference of two
/// [`crate::GridPoint`]s, so components are integral in practice.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vec2 {
    data: [f64; 2],
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Creates a vector from components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { data: [x, y] }
    }

    /// X component.
    pub fn x(&self) -> f64 {
        self.data[0]
    }

    /// Y component.
    pub fn y(&self) -> f64 {
        self.data[1]
    }

    /// Z component of the 3D cross product with `other`.
    pub fn perp_dot(&self, other: &Self) -> f64 {
        self.x() * other.y() - self.y() * other.x()
    }

    /// Dot product with another vector.
    pub fn dot(&self, other: &Self) -> f64 {
        self.x() * other.x() + self.y() * other.y()
    }

    /// Squared magnitude of the vector.
    pub fn length_squared(&self) -> f64 {
        self.dot(self)
    }

    /// Vector length (magnitude).
    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Returns `true` when the length is at or below [`EPSILON`].
    pub fn is_degenerate(&self) -> bool {
        self.length() <= EPSILON
    }

    /// Unsigned angle to `other` in radians, in `[0, π]`.
    ///
    /// If either vector is degenerate the angle is `0`: a zero-length
    /// direction carries no heading to deviate from. Collinear integral
    /// vectors give exactly `0` or `π`.
    pub fn angle_between(&self, other: &Self) -> f64 {
        if self.is_degenerate() || other.is_degenerate() {
            return 0.0;
        }
        self.perp_dot(other).abs().atan2(self.dot(other))
    }

    /// [`Self::angle_between`] divided by π, in `[0, 1]`.
    pub fn normalized_angle_between(&self, other: &Self) -> f64 {
        self.angle_between(other) / PI
    }
}
