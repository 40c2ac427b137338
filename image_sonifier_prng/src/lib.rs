// Deterministic, portable pseudo-random number generator.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding.
// The sonifier's only stochastic step is the rhythmic displacement drawn
// after every note; routing that draw through a seedable generator makes a
// whole image-to-MIDI run reproducible from a single `u64`.
//
// **Critical constraint: determinism.** Every method on `SonifierRng` must
// produce identical output given the same prior state, on every platform.
// Only integer arithmetic is used, so no float rounding can creep in.

/// Xoshiro256++ PRNG.
///
/// Two instances created with the same seed yield identical streams, so a
/// sonification run can be replayed exactly by logging its seed.
#[derive(Clone, Debug)]
pub struct SonifierRng {
    s: [u64; 4],
}

impl SonifierRng {
    /// Create a new PRNG seeded from a `u64`, expanded to 256 bits of state
    /// with SplitMix64.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Uniform integer in `[0, bound)`, rejection-sampled to avoid modulo bias.
    ///
    /// Panics if `bound == 0`.
    pub fn below(&mut self, bound: u64) -> u64 {
        assert!(bound > 0, "below: bound must be positive");
        if bound.is_power_of_two() {
            return self.next_u64() & (bound - 1);
        }
        let threshold = bound.wrapping_neg() % bound;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return r % bound;
            }
        }
    }

    /// Uniform index in `[0, len)`.
    ///
    /// Panics if `len == 0`.
    pub fn index(&mut self, len: usize) -> usize {
        self.below(len as u64) as usize
    }
}

/// SplitMix64, used only to expand a seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
