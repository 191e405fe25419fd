//! # Coherent Noise
//!
//! Seeded 2D simplex noise used to classify terrain materials.
//!
//! ## Determinism Guarantee
//!
//! Given the same [`WorldSeed`], every sample is bit-identical on any
//! platform, any run, in any query order. Nothing here keeps mutable state
//! after construction.

use serde::{Deserialize, Serialize};

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose (e.g. per-tile rolls).
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }

    /// Mixes a tile position into the seed.
    ///
    /// Used to seed per-tile RNG streams so a tile's rolls do not depend on
    /// which tiles were generated before it.
    #[inline]
    #[must_use]
    pub const fn for_tile(self, x: i64, y: i64) -> u64 {
        // splitmix64 finalizer over the combined key
        let mut z = self.0 ^ (x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ (y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(12345)
    }
}

impl From<u64> for WorldSeed {
    fn from(seed: u64) -> Self {
        Self(seed)
    }
}

/// Pre-computed permutation table, built once from the seed.
struct PermutationTable {
    /// 256 entries, doubled so corner hashing never wraps.
    perm: [u8; 512],
}

impl PermutationTable {
    /// 12 gradient directions for 2D simplex.
    const GRADIENTS: [[i8; 2]; 12] = [
        [1, 0], [1, 1], [0, 1], [-1, 1],
        [-1, 0], [-1, -1], [0, -1], [1, -1],
        [1, 0], [0, 1], [-1, 0], [0, -1],
    ];

    fn new(seed: WorldSeed) -> Self {
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().take(256).enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates with xorshift64; a zero state would never advance
        let mut state = seed.value() | 1;
        for i in (1..256).rev() {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let j = (state % (i as u64 + 1)) as usize;
            perm.swap(i, j);
        }

        let (low, high) = perm.split_at_mut(256);
        high.copy_from_slice(low);

        Self { perm }
    }

    #[inline]
    fn get(&self, index: usize) -> usize {
        self.perm[index & 511] as usize
    }

    #[inline]
    fn gradient(hash: usize) -> [i8; 2] {
        Self::GRADIENTS[hash % 12]
    }
}

/// 2D simplex noise generator.
///
/// [`sample`](Self::sample) returns values in `[-1, 1]`;
/// [`sample01`](Self::sample01) and [`fbm01`](Self::fbm01) remap into
/// `[0, 1)` for material classification.
pub struct SimplexNoise {
    perm_table: PermutationTable,
}

impl SimplexNoise {
    /// Skewing factor for 2D simplex grid: (sqrt(3) - 1) / 2.
    const F2: f64 = 0.366_025_403_784_439;
    /// Unskewing factor for 2D simplex grid: (3 - sqrt(3)) / 6.
    const G2: f64 = 0.211_324_865_405_187;
    /// Largest value strictly below 1.0.
    const BELOW_ONE: f64 = 1.0 - f64::EPSILON;

    /// Creates a new simplex noise generator from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Samples raw simplex noise, in `[-1, 1]`.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let skew = (x + y) * Self::F2;
        let i = (x + skew).floor() as i64;
        let j = (y + skew).floor() as i64;

        let unskew = (i + j) as f64 * Self::G2;
        let x0 = x - (i as f64 - unskew);
        let y0 = y - (j as f64 - unskew);

        // Upper or lower triangle of the skewed cell
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f64 + Self::G2;
        let y1 = y0 - j1 as f64 + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let ii = (i & 255) as usize;
        let jj = (j & 255) as usize;
        let table = &self.perm_table;

        let gi0 = table.get(ii + table.get(jj));
        let gi1 = table.get(ii + i1 + table.get(jj + j1));
        let gi2 = table.get(ii + 1 + table.get(jj + 1));

        let n = Self::contribution(x0, y0, gi0)
            + Self::contribution(x1, y1, gi1)
            + Self::contribution(x2, y2, gi2);

        (70.0 * n).clamp(-1.0, 1.0)
    }

    #[inline]
    fn contribution(x: f64, y: f64, hash: usize) -> f64 {
        let t = 0.5 - x * x - y * y;
        if t < 0.0 {
            0.0
        } else {
            let grad = PermutationTable::gradient(hash);
            let t2 = t * t;
            t2 * t2 * (x * f64::from(grad[0]) + y * f64::from(grad[1]))
        }
    }

    /// Samples noise remapped to `[0, 1)`.
    #[must_use]
    pub fn sample01(&self, x: f64, y: f64) -> f64 {
        Self::to_unit(self.sample(x, y))
    }

    /// Octaved (fractal) noise, roughly in `[-1, 1]`.
    ///
    /// * `octaves` - number of layers (typically 3-6)
    /// * `persistence` - amplitude decay per octave (typically 0.5)
    /// * `lacunarity` - frequency growth per octave (typically 2.0)
    #[must_use]
    pub fn octaved(&self, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves.max(1) {
            total += self.sample(x * frequency, y * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        total / max_amplitude
    }

    /// Octaved noise remapped to `[0, 1)`.
    #[must_use]
    pub fn fbm01(&self, x: f64, y: f64, octaves: u32) -> f64 {
        Self::to_unit(self.octaved(x, y, octaves, 0.5, 2.0))
    }

    #[inline]
    fn to_unit(value: f64) -> f64 {
        ((value + 1.0) * 0.5).clamp(0.0, Self::BELOW_ONE)
    }
}
