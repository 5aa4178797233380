// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use super::pose::PoseSample;

/// Fixed-capacity pose history kept oldest first in one `Vec`; pushing into
/// a full ring evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct SampleRing {
    samples: Vec<PoseSample>,
    capacity: usize,
}

impl SampleRing {
    /// Ring holding at most `capacity` samples (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `sample`, evicting the oldest entry when full.
    pub fn push(&mut self, sample: PoseSample) {
        if self.samples.len() >= self.capacity {
            let excess = self.samples.len() + 1 - self.capacity;
            self.samples.drain(..excess);
        }
        self.samples.push(sample);
    }

    /// Most recent sample.
    pub fn last(&self) -> Option<&PoseSample> {
        self.samples.last()
    }

    /// Samples oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &PoseSample> {
        self.samples.iter()
    }

    /// Samples oldest first.
    pub fn as_slice(&self) -> &[PoseSample] {
        &self.samples
    }

    /// Number of stored samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when no sample is stored.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every sample, keeping the allocation; optionally resizes.
    pub fn reset(&mut self, capacity: usize) {
        self.samples.clear();
        self.capacity = capacity.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::throw::pose::Pose;
    use care_math::Vec3;

    fn sample(time: f32) -> PoseSample {
        PoseSample {
            time,
            pose: Pose::at(Vec3::new(time, 0.0, 0.0)),
            high_confidence: true,
        }
    }

    #[test]
    fn oldest_sample_is_evicted_first() {
        let mut ring = SampleRing::with_capacity(3);
        for t in 0..5 {
            ring.push(sample(t as f32));
        }
        let times: Vec<f32> = ring.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![2.0, 3.0, 4.0]);
        assert_eq!(ring.last().map(|s| s.time), Some(4.0));
        let slice: Vec<f32> = ring.as_slice().iter().map(|s| s.time).collect();
        assert_eq!(slice, times);
    }

    #[test]
    fn reset_clears_and_resizes() {
        let mut ring = SampleRing::with_capacity(2);
        ring.push(sample(0.0));
        ring.reset(0);
        assert!(ring.is_empty());
        assert_eq!(ring.capacity(), 1);
    }
}
