// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Outlier-robust velocity fitting over a short pose history.
//!
//! Each channel (position, orientation) is fitted independently:
//! 1. every candidate subset is a pair of samples, which fixes a constant-rate
//!    model anchored at the earlier sample;
//! 2. samples whose residual against that model is within the channel
//!    threshold are its inliers; the model with the most inliers wins, ties
//!    broken by the smaller summed residual;
//! 3. the winner is refined with a least-squares slope over its inliers.
//!
//! Short histories skip straight to least squares over everything.

use care_math::{Prng, Quat, Vec3};

use super::pose::{PoseSample, VelocityEstimate};
use crate::config::EstimatorConfig;

/// Fewest samples from which any velocity is reported.
pub const MIN_FIT_SAMPLES: usize = 2;

/// Constant-rate model over one pose channel.
trait RateModel {
    /// Rate implied by moving from `a` to `b`; `None` when `b` is not later.
    fn rate(a: &PoseSample, b: &PoseSample) -> Option<Vec3> {
        let dt = b.time - a.time;
        if dt <= 0.0 {
            return None;
        }
        Some(Self::series(a, b).scale(1.0 / dt))
    }

    /// Displacement of `sample` relative to `reference` in rate units × seconds.
    fn series(reference: &PoseSample, sample: &PoseSample) -> Vec3;

    /// Distance between `sample` and the model anchored at `anchor`.
    fn residual(anchor: &PoseSample, rate: Vec3, sample: &PoseSample) -> f32;
}

struct Linear;

impl RateModel for Linear {
    fn series(reference: &PoseSample, sample: &PoseSample) -> Vec3 {
        sample.pose.position.sub(&reference.pose.position)
    }

    fn residual(anchor: &PoseSample, rate: Vec3, sample: &PoseSample) -> f32 {
        let predicted = anchor
            .pose
            .position
            .add(&rate.scale(sample.time - anchor.time));
        predicted.distance(&sample.pose.position)
    }
}

struct Angular;

impl RateModel for Angular {
    fn series(reference: &PoseSample, sample: &PoseSample) -> Vec3 {
        sample
            .pose
            .orientation
            .delta_from(&reference.pose.orientation)
            .to_rotation_vector()
    }

    fn residual(anchor: &PoseSample, rate: Vec3, sample: &PoseSample) -> f32 {
        let step = Quat::from_rotation_vector(rate.scale(sample.time - anchor.time));
        let predicted = step.multiply(&anchor.pose.orientation);
        predicted.angle_to(&sample.pose.orientation)
    }
}

struct ChannelFit {
    rate: Vec3,
    inliers: usize,
}

/// Fits release velocities from pose history.
#[derive(Debug, Clone)]
pub struct VelocityFitter {
    config: EstimatorConfig,
}

impl VelocityFitter {
    /// Fitter using a sanitized copy of `config`.
    pub fn new(config: &EstimatorConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimates linear and angular velocity from `samples` (oldest first).
    ///
    /// Returns `None` with fewer than [`MIN_FIT_SAMPLES`] usable samples.
    pub fn fit(&self, samples: &[PoseSample]) -> Option<VelocityEstimate> {
        let usable = self.usable(samples);
        if usable.len() < MIN_FIT_SAMPLES {
            return None;
        }

        if usable.len() < self.config.min_ransac_samples {
            let all: Vec<&PoseSample> = usable.iter().collect();
            return Some(VelocityEstimate {
                linear: least_squares::<Linear>(&all)?,
                angular: least_squares::<Angular>(&all)?,
                samples: usable.len(),
                linear_inliers: usable.len(),
                angular_inliers: usable.len(),
                robust: false,
            });
        }

        let pairs = self.candidate_pairs(usable.len());
        let linear = ransac::<Linear>(&usable, &pairs, self.config.linear_inlier_threshold)?;
        let angular = ransac::<Angular>(&usable, &pairs, self.config.angular_inlier_threshold)?;
        Some(VelocityEstimate {
            linear: linear.rate,
            angular: angular.rate,
            samples: usable.len(),
            linear_inliers: linear.inliers,
            angular_inliers: angular.inliers,
            robust: true,
        })
    }

    fn usable(&self, samples: &[PoseSample]) -> Vec<PoseSample> {
        if self.config.exclude_low_confidence {
            let trusted: Vec<PoseSample> = samples
                .iter()
                .filter(|s| s.high_confidence)
                .copied()
                .collect();
            if trusted.len() >= MIN_FIT_SAMPLES {
                return trusted;
            }
        }
        samples.to_vec()
    }

    fn candidate_pairs(&self, len: usize) -> Vec<(usize, usize)> {
        let total = len * (len - 1) / 2;
        if self.config.iterations >= total {
            return (0..len)
                .flat_map(|i| (i + 1..len).map(move |j| (i, j)))
                .collect();
        }
        let mut prng = Prng::from_seed_u64(self.config.seed);
        (0..self.config.iterations)
            .filter_map(|_| prng.next_pair(len))
            .collect()
    }
}

fn ransac<M: RateModel>(
    samples: &[PoseSample],
    pairs: &[(usize, usize)],
    threshold: f32,
) -> Option<ChannelFit> {
    let mut best: Option<(Vec3, Vec<usize>, f32)> = None;
    for &(i, j) in pairs {
        let Some(rate) = M::rate(&samples[i], &samples[j]) else {
            continue;
        };
        if !rate.is_finite() {
            continue;
        }
        let mut inliers = Vec::with_capacity(samples.len());
        let mut total = 0.0;
        for (k, sample) in samples.iter().enumerate() {
            let residual = M::residual(&samples[i], rate, sample);
            if residual <= threshold {
                inliers.push(k);
                total += residual;
            }
        }
        let better = best.as_ref().is_none_or(|(_, best_inliers, best_total)| {
            inliers.len() > best_inliers.len()
                || (inliers.len() == best_inliers.len() && total < *best_total)
        });
        if better {
            best = Some((rate, inliers, total));
        }
    }

    let (candidate, inliers, _) = best?;
    let members: Vec<&PoseSample> = inliers.iter().map(|&k| &samples[k]).collect();
    let rate = least_squares::<M>(&members).unwrap_or(candidate);
    Some(ChannelFit {
        rate,
        inliers: inliers.len(),
    })
}

/// Least-squares slope of the channel series against time.
fn least_squares<M: RateModel>(samples: &[&PoseSample]) -> Option<Vec3> {
    let first = samples.first()?;
    let series: Vec<(f32, Vec3)> = samples
        .iter()
        .map(|s| (s.time - first.time, M::series(first, s)))
        .collect();
    #[allow(clippy::cast_precision_loss)]
    let n = series.len() as f32;
    let mean_t = series.iter().map(|(t, _)| t).sum::<f32>() / n;
    let mean_v = series
        .iter()
        .fold(Vec3::ZERO, |acc, (_, v)| acc.add(v))
        .scale(1.0 / n);

    let mut num = Vec3::ZERO;
    let mut den = 0.0;
    for (t, v) in &series {
        let dt = t - mean_t;
        num = num.add(&v.sub(&mean_v).scale(dt));
        den += dt * dt;
    }
    if den <= f32::MIN_POSITIVE {
        return None;
    }
    let slope = num.scale(1.0 / den);
    slope.is_finite().then_some(slope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::throw::pose::Pose;

    const DT: f32 = 1.0 / 90.0;

    fn line(count: usize, velocity: Vec3) -> Vec<PoseSample> {
        (0..count)
            .map(|k| {
                let t = k as f32 * DT;
                PoseSample {
                    time: t,
                    pose: Pose::at(velocity.scale(t)),
                    high_confidence: true,
                }
            })
            .collect()
    }

    fn close(a: Vec3, b: Vec3, tol: f32) -> bool {
        a.distance(&b) <= tol
    }

    #[test]
    fn single_sample_has_no_estimate() {
        let fitter = VelocityFitter::new(&EstimatorConfig::default());
        assert!(fitter.fit(&line(1, Vec3::UNIT_X)).is_none());
        assert!(fitter.fit(&[]).is_none());
    }

    #[test]
    fn short_history_uses_least_squares() {
        let fitter = VelocityFitter::new(&EstimatorConfig::default());
        let est = fitter.fit(&line(3, Vec3::new(1.0, 2.0, 0.0))).unwrap();
        assert!(!est.robust);
        assert!(close(est.linear, Vec3::new(1.0, 2.0, 0.0), 1e-3), "{est:?}");
    }

    #[test]
    fn ransac_rejects_two_outliers() {
        let velocity = Vec3::new(2.0, 0.5, -1.0);
        let mut samples = line(10, velocity);
        samples[3].pose.position = samples[3].pose.position.add(&Vec3::new(0.4, 0.0, 0.0));
        samples[7].pose.position = samples[7].pose.position.add(&Vec3::new(0.0, -0.3, 0.2));

        let fitter = VelocityFitter::new(&EstimatorConfig::default());
        let est = fitter.fit(&samples).unwrap();
        assert!(est.robust);
        assert_eq!(est.linear_inliers, 8);
        assert!(close(est.linear, velocity, 1e-2), "{est:?}");
    }

    #[test]
    fn angular_rate_follows_constant_spin() {
        let spin = Vec3::new(0.0, 3.0, 0.0);
        let samples: Vec<PoseSample> = (0..8)
            .map(|k| {
                let t = k as f32 * DT;
                PoseSample {
                    time: t,
                    pose: Pose::new(Vec3::ZERO, Quat::from_rotation_vector(spin.scale(t))),
                    high_confidence: true,
                }
            })
            .collect();
        let est = VelocityFitter::new(&EstimatorConfig::default())
            .fit(&samples)
            .unwrap();
        assert!(close(est.angular, spin, 1e-2), "{est:?}");
        assert!(close(est.linear, Vec3::ZERO, 1e-4));
    }

    #[test]
    fn low_confidence_samples_are_left_out() {
        let velocity = Vec3::new(1.0, 0.0, 0.0);
        let mut samples = line(3, velocity);
        samples.push(PoseSample {
            time: 3.0 * DT,
            pose: Pose::at(Vec3::new(5.0, 5.0, 5.0)),
            high_confidence: false,
        });
        let est = VelocityFitter::new(&EstimatorConfig::default())
            .fit(&samples)
            .unwrap();
        assert_eq!(est.samples, 3);
        assert!(close(est.linear, velocity, 1e-3), "{est:?}");
    }

    #[test]
    fn sampled_pairs_are_deterministic() {
        let cfg = EstimatorConfig {
            iterations: 5,
            ..EstimatorConfig::default()
        };
        let fitter = VelocityFitter::new(&cfg);
        assert_eq!(fitter.candidate_pairs(10), fitter.candidate_pairs(10));
        assert_eq!(fitter.candidate_pairs(10).len(), 5);
        assert_eq!(
            VelocityFitter::new(&EstimatorConfig::default())
                .candidate_pairs(4)
                .len(),
            6
        );
    }
}
