// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Float32 math helpers for EchoCare: vectors, quaternions, and a
//! timeline-friendly pseudo-random number generator.
//!
//! All operations round to `f32` so pose history fitted on one host produces
//! the same release velocity on another.
#![forbid(unsafe_code)]

mod prng;
mod quat;
mod vec3;

pub use prng::Prng;
pub use quat::Quat;
pub use vec3::Vec3;

/// Global epsilon used by math routines when detecting degenerate values.
pub const EPSILON: f32 = 1e-6;

/// Clamps `value` to the inclusive `[min, max]` range.
///
/// NaN inputs collapse to `min` so downstream consumers never see a NaN
/// amplitude or duration.
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    debug_assert!(min <= max, "invalid clamp range: {min} > {max}");
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max)
}

/// Clamps `value` to the unit interval `[0, 1]`.
pub fn saturate(value: f32) -> f32 {
    clamp(value, 0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds_and_nan() {
        assert_eq!(clamp(1.5, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-3.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.25, 0.0, 1.0), 0.25);
        assert_eq!(clamp(f32::NAN, 0.0, 1.0), 0.0);
        assert_eq!(saturate(f32::INFINITY), 1.0);
    }
}
