//! Seedable random number generator for reproducible shuffles.
//!
//! A concrete in-repo xoshiro256++ generator (seeded through SplitMix64)
//! rather than [`rand::rngs::StdRng`], so that a given seed produces the
//! same byte stream across `rand` upgrades. The shuffle output contract
//! depends on that stability. The generator still implements
//! [`rand::RngCore`] and [`rand::SeedableRng`] so it plugs into the
//! wider ecosystem.

use rand::{RngCore, SeedableRng};

/// xoshiro256++ generator state.
#[derive(Debug, Clone)]
pub struct SweepRng {
    s: [u64; 4],
}

#[inline]
const fn rotl(x: u64, k: u32) -> u64 {
    x.rotate_left(k)
}

#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

impl SweepRng {
    /// Seed the generator from a single integer, expanding it to the
    /// full 256-bit state with SplitMix64.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        let mut sm = seed;
        let s = [
            splitmix64(&mut sm),
            splitmix64(&mut sm),
            splitmix64(&mut sm),
            splitmix64(&mut sm),
        ];
        Self { s }
    }

    /// Draw a value in `0..n`.
    ///
    /// Uses a plain modulo reduction; all shuffle algorithms draw through
    /// this single method in a fixed order, which is what makes runs with
    /// the same seed byte-identical.
    #[inline]
    pub fn bounded(&mut self, n: u64) -> u64 {
        debug_assert!(n > 0);
        self.next_u64() % n
    }
}

impl RngCore for SweepRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        let s = &mut self.s;
        let result = rotl(s[0].wrapping_add(s[3]), 23).wrapping_add(s[0]);
        let t = s[1] << 17;
        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];
        s[2] ^= t;
        s[3] = rotl(s[3], 45);
        result
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for SweepRng {
    type Seed = [u8; 32];

    fn from_seed(seed: Self::Seed) -> Self {
        let mut s = [0u64; 4];
        for (i, chunk) in seed.chunks_exact(8).enumerate() {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            s[i] = u64::from_le_bytes(bytes);
        }
        // All-zero state is the one fixed point of xoshiro; nudge it.
        if s == [0; 4] {
            return Self::with_seed(0);
        }
        Self { s }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_answer_seed_zero() {
        let mut rng = SweepRng::with_seed(0);
        let expected: [u64; 6] = [
            0x5317_5d61_490b_23df,
            0x61da_6f3d_c380_d507,
            0x5c0f_df91_ec9a_7bfc,
            0x02ee_bf8c_3bbe_5e1a,
            0x7eca_04eb_af4a_5eea,
            0x0543_c377_57f0_8d9a,
        ];
        for e in expected {
            assert_eq!(rng.next_u64(), e);
        }
    }

    #[test]
    fn known_answer_default_shuffler_seed() {
        let mut rng = SweepRng::with_seed(4);
        let expected: [u64; 6] = [
            0xadf8_7734_96a9_b731,
            0x9b2e_50dc_9809_3f34,
            0x4053_b17d_8ad3_7100,
            0xb9c0_7d98_0598_8784,
            0x281c_f871_26c2_ba84,
            0xc322_9ebd_7911_0458,
        ];
        for e in expected {
            assert_eq!(rng.next_u64(), e);
        }
    }

    #[test]
    fn bounded_draws_follow_the_raw_stream() {
        let mut rng = SweepRng::with_seed(4);
        let draws: Vec<u64> = (0..12).map(|_| rng.bounded(10)).collect();
        assert_eq!(draws, vec![3, 2, 6, 8, 4, 6, 0, 3, 8, 0, 3, 6]);
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = SweepRng::with_seed(1234);
        let mut b = SweepRng::with_seed(1234);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn reseeding_restarts_the_stream() {
        let mut rng = SweepRng::with_seed(7);
        let first = rng.next_u64();
        rng = SweepRng::with_seed(7);
        assert_eq!(rng.next_u64(), first);
    }

    #[test]
    fn fill_bytes_handles_partial_chunks() {
        let mut rng = SweepRng::with_seed(1);
        let mut buf = [0u8; 13];
        rng.fill_bytes(&mut buf);
        let mut rng2 = SweepRng::with_seed(1);
        let first = rng2.next_u64().to_le_bytes();
        assert_eq!(&buf[..8], &first);
    }

    #[test]
    fn from_seed_zero_state_is_nudged() {
        let rng = SweepRng::from_seed([0u8; 32]);
        let mut rng = rng;
        assert_ne!(rng.next_u64(), 0);
    }
}
