// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
/// Stateful `xoroshiro128+` generator used to draw RANSAC subsets.
///
/// * Not cryptographically secure.
/// * Matching seeds yield identical sequences on every platform, so a given
///   pose history always produces the same release velocity.
#[derive(Debug, Clone, Copy)]
pub struct Prng {
    state: [u64; 2],
}

impl Prng {
    /// Constructs a PRNG from a single 64-bit seed via SplitMix64 expansion.
    pub fn from_seed_u64(seed: u64) -> Self {
        fn splitmix64(state: &mut u64) -> u64 {
            *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
            let mut z = *state;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
            z ^ (z >> 31)
        }

        let mut sm_state = seed;
        let mut state = [splitmix64(&mut sm_state), splitmix64(&mut sm_state)];
        if state[0] == 0 && state[1] == 0 {
            state[0] = 0x9e37_79b9_7f4a_7c15;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(55) ^ s1 ^ (s1 << 14);
        self.state[1] = s1.rotate_left(36);

        result
    }

    /// Returns the next float in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        let raw = self.next_u64();
        #[allow(clippy::cast_possible_truncation)]
        let bits = ((raw >> 41) as u32) | 0x3f80_0000;
        f32::from_bits(bits) - 1.0
    }

    /// Returns a uniformly distributed index in `0..len`.
    ///
    /// Uses rejection sampling to avoid modulo bias. Returns `0` when `len`
    /// is zero.
    pub fn next_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        let span = len as u64;
        let bound = u64::MAX - u64::MAX % span;
        loop {
            let candidate = self.next_u64();
            if candidate < bound {
                #[allow(clippy::cast_possible_truncation)]
                return (candidate % span) as usize;
            }
        }
    }

    /// Draws two distinct indices in `0..len`, ordered ascending.
    ///
    /// Returns `None` when fewer than two indices exist.
    pub fn next_pair(&mut self, len: usize) -> Option<(usize, usize)> {
        if len < 2 {
            return None;
        }
        let a = self.next_index(len);
        let mut b = self.next_index(len - 1);
        if b >= a {
            b += 1;
        }
        Some((a.min(b), a.max(b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Prng::from_seed_u64(7);
        let mut b = Prng::from_seed_u64(7);
        for _ in 0..16 {
            assert_eq!(a.next_index(10), b.next_index(10));
        }
    }

    #[test]
    fn next_pair_is_distinct_and_in_range() {
        let mut prng = Prng::from_seed_u64(0xC0FFEE);
        for _ in 0..512 {
            let (i, j) = prng.next_pair(5).unwrap();
            assert!(i < j && j < 5);
        }
        assert!(prng.next_pair(1).is_none());
    }

    #[test]
    fn next_f32_in_unit_interval() {
        let mut prng = Prng::from_seed_u64(1);
        for _ in 0..256 {
            let v = prng.next_f32();
            assert!((0.0..1.0).contains(&v));
        }
    }
}
