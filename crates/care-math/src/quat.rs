// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::{Vec3, EPSILON};

/// Quaternion stored as `(x, y, z, w)`.
///
/// * All angles are expressed in radians.
/// * Rotation vectors (axis × angle) are the exchange format for angular
///   velocities: `rotation_vector / dt` is a rate in rad/s.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "[f32; 4]", into = "[f32; 4]"))]
pub struct Quat {
    data: [f32; 4],
}

impl Default for Quat {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quat {
    /// Creates a quaternion from components.
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { data: [x, y, z, w] }
    }

    /// Returns the identity quaternion.
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Returns the quaternion as an array.
    pub fn to_array(self) -> [f32; 4] {
        self.data
    }

    fn vector_part(&self) -> Vec3 {
        Vec3::new(self.data[0], self.data[1], self.data[2])
    }

    /// Constructs a quaternion from a rotation axis and angle in radians.
    ///
    /// Returns identity when the axis length is ≤ `EPSILON`.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let len_sq = axis.length_squared();
        if len_sq <= EPSILON * EPSILON {
            return Self::identity();
        }
        let norm_axis = axis.scale(1.0 / len_sq.sqrt());
        let (sin_half, cos_half) = (angle * 0.5).sin_cos();
        let [x, y, z] = norm_axis.scale(sin_half).to_array();
        Self::new(x, y, z, cos_half)
    }

    /// Constructs a quaternion from a rotation vector (axis scaled by angle).
    pub fn from_rotation_vector(rotation: Vec3) -> Self {
        Self::from_axis_angle(rotation, rotation.length())
    }

    /// Hamilton product (`self * other`): applies `other` first, then `self`.
    pub fn multiply(&self, other: &Self) -> Self {
        let [ax, ay, az, aw] = self.data;
        let [bx, by, bz, bw] = other.data;
        Self::new(
            aw * bx + ax * bw + ay * bz - az * by,
            aw * by - ax * bz + ay * bw + az * bx,
            aw * bz + ax * by - ay * bx + az * bw,
            aw * bw - ax * bx - ay * by - az * bz,
        )
    }

    /// Conjugate; the inverse for unit quaternions.
    pub fn conjugate(&self) -> Self {
        let [x, y, z, w] = self.data;
        Self::new(-x, -y, -z, w)
    }

    /// Four-component dot product.
    pub fn dot(&self, other: &Self) -> f32 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Normalises the quaternion; returns identity when norm is ~0.
    pub fn normalize(&self) -> Self {
        let len = self.dot(self).sqrt();
        if len <= EPSILON {
            return Self::identity();
        }
        let inv = 1.0 / len;
        let [x, y, z, w] = self.data;
        Self::new(x * inv, y * inv, z * inv, w * inv)
    }

    /// Shortest-arc rotation vector (axis × angle, angle in `[0, π]`).
    pub fn to_rotation_vector(&self) -> Vec3 {
        let mut q = self.normalize();
        if q.data[3] < 0.0 {
            q = Self::new(-q.data[0], -q.data[1], -q.data[2], -q.data[3]);
        }
        let v = q.vector_part();
        let sin_half = v.length();
        if sin_half <= EPSILON {
            // Small-angle limit of 2·atan2(|v|, w)·v/|v|.
            return v.scale(2.0);
        }
        let angle = 2.0 * sin_half.atan2(q.data[3]);
        v.scale(angle / sin_half)
    }

    /// World-frame rotation taking `from` to `self` (`self * from⁻¹`).
    pub fn delta_from(&self, from: &Self) -> Self {
        self.multiply(&from.conjugate())
    }

    /// Shortest-arc angle in radians between two orientations.
    pub fn angle_to(&self, other: &Self) -> f32 {
        other.delta_from(self).to_rotation_vector().length()
    }

    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|c| c.is_finite())
    }
}

impl From<[f32; 4]> for Quat {
    fn from(value: [f32; 4]) -> Self {
        Self { data: value }
    }
}

impl From<Quat> for [f32; 4] {
    fn from(value: Quat) -> Self {
        value.data
    }
}
