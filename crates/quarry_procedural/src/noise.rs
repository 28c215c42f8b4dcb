//! # Value Noise Implementation
//!
//! Seeded lattice hash plus smoothed 2D/3D value noise and fBm on top of it.
//!
//! ## Determinism Guarantee
//!
//! Given the same `WorldSeed`, this implementation will produce
//! **exactly** the same values on any platform, any time. The lattice hash is
//! plain wrapping 32-bit integer math and the interpolation uses no
//! platform-dependent float intrinsics.

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
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

    /// Derives a sub-seed for a specific purpose (e.g., chunk scatter).
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        // FNV-1a hash mixing
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }

    /// Seed whose lattice key is `key`. Negative keys sign-extend.
    #[inline]
    #[must_use]
    pub const fn from_lattice_key(key: i32) -> Self {
        Self(key as i64 as u64)
    }

    /// The 32-bit key fed into the lattice hash: the low 32 bits.
    #[inline]
    #[must_use]
    pub const fn lattice_key(self) -> i32 {
        self.0 as u32 as i32
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(12345)
    }
}

/// Normalization for the 31-bit lattice hash: `1 - h / 2^30` lands in (-1, 1].
const HASH_HALF_RANGE: f64 = 1_073_741_824.0;

/// Integer bit mixer. Result is masked to 31 bits.
#[inline]
const fn mix(n: i32) -> i32 {
    let n = (n << 13) ^ n;
    n.wrapping_mul(n.wrapping_mul(n).wrapping_mul(15731).wrapping_add(789_221))
        .wrapping_add(1_376_312_589)
        & 0x7fff_ffff
}

/// Smoothstep easing, `3t² - 2t³`.
#[inline]
fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Seeded value noise field.
///
/// Produces smooth, continuous values in (-1, 1].
///
/// # Performance
///
/// - O(1) per sample, O(octaves) per fBm sample
/// - No allocations
/// - No tables: the lattice is hashed on the fly
///
/// # Example
///
/// ```rust,ignore
/// let noise = NoiseField::new(WorldSeed::new(12345));
///
/// let height = noise.fbm_2d(x * 0.05, z * 0.05, 6, 2.0, 0.5);
/// let cave = noise.fbm_3d(x * 0.1, y * 0.1, z * 0.1, 4, 2.0, 0.5);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct NoiseField {
    seed: i32,
}

impl NoiseField {
    /// Creates a new noise field from a seed.
    #[must_use]
    pub const fn new(seed: WorldSeed) -> Self {
        Self {
            seed: seed.lattice_key(),
        }
    }

    /// Seeded 31-bit integer hash of `n`.
    #[inline]
    fn scramble(&self, n: i32) -> i32 {
        mix(n.wrapping_add(self.seed) ^ self.seed)
    }

    /// Hashes an integer to a float in (-1, 1].
    #[inline]
    #[must_use]
    pub fn hash(&self, n: i32) -> f64 {
        1.0 - f64::from(self.scramble(n)) / HASH_HALF_RANGE
    }

    #[inline]
    fn lattice_2d(&self, ix: i32, iz: i32) -> f64 {
        self.hash(ix.wrapping_add(self.scramble(iz)))
    }

    #[inline]
    fn lattice_3d(&self, ix: i32, iy: i32, iz: i32) -> f64 {
        let inner = iy.wrapping_add(self.scramble(iz));
        self.hash(ix.wrapping_add(self.scramble(inner)))
    }

    /// Samples 2D value noise.
    ///
    /// Bilinear blend of the four surrounding lattice values, eased with
    /// smoothstep. Equals the lattice value exactly at integer coordinates.
    #[must_use]
    pub fn value_noise_2d(&self, x: f64, z: f64) -> f64 {
        let ix = fast_floor(x);
        let iz = fast_floor(z);
        let u = smoothstep(x - f64::from(ix));
        let v = smoothstep(z - f64::from(iz));

        let x1 = ix.wrapping_add(1);
        let z1 = iz.wrapping_add(1);
        let r = self.lattice_2d(ix, iz);
        let s = self.lattice_2d(x1, iz);
        let t = self.lattice_2d(ix, z1);
        let q = self.lattice_2d(x1, z1);

        r + (s - r) * u + (t - r) * v + (q - s - t + r) * u * v
    }

    /// Samples 3D value noise.
    ///
    /// Trilinear blend of the eight surrounding lattice values.
    #[must_use]
    pub fn value_noise_3d(&self, x: f64, y: f64, z: f64) -> f64 {
        let ix = fast_floor(x);
        let iy = fast_floor(y);
        let iz = fast_floor(z);
        let u = smoothstep(x - f64::from(ix));
        let v = smoothstep(y - f64::from(iy));
        let w = smoothstep(z - f64::from(iz));

        let x1 = ix.wrapping_add(1);
        let y1 = iy.wrapping_add(1);
        let z1 = iz.wrapping_add(1);

        let a = lerp(self.lattice_3d(ix, iy, iz), self.lattice_3d(x1, iy, iz), u);
        let b = lerp(self.lattice_3d(ix, y1, iz), self.lattice_3d(x1, y1, iz), u);
        let c = lerp(self.lattice_3d(ix, iy, z1), self.lattice_3d(x1, iy, z1), u);
        let d = lerp(self.lattice_3d(ix, y1, z1), self.lattice_3d(x1, y1, z1), u);

        lerp(lerp(a, b, v), lerp(c, d, v), w)
    }

    /// Generates fractal (fBm) 2D noise.
    ///
    /// # Arguments
    ///
    /// * `x`, `z` - Coordinates
    /// * `octaves` - Number of noise layers
    /// * `lacunarity` - Frequency increase per octave (typically 2.0)
    /// * `gain` - Amplitude decay per octave (typically 0.5)
    ///
    /// # Returns
    ///
    /// The layer sum normalized by total amplitude, in [-1, 1].
    #[must_use]
    pub fn fbm_2d(&self, x: f64, z: f64, octaves: u32, lacunarity: f64, gain: f64) -> f64 {
        self.fractal(octaves, lacunarity, gain, |f| {
            self.value_noise_2d(x * f, z * f)
        })
    }

    /// Generates fractal (fBm) 3D noise. Same layering as [`Self::fbm_2d`].
    #[must_use]
    pub fn fbm_3d(
        &self,
        x: f64,
        y: f64,
        z: f64,
        octaves: u32,
        lacunarity: f64,
        gain: f64,
    ) -> f64 {
        self.fractal(octaves, lacunarity, gain, |f| {
            self.value_noise_3d(x * f, y * f, z * f)
        })
    }

    #[inline]
    fn fractal(
        &self,
        octaves: u32,
        lacunarity: f64,
        gain: f64,
        mut sample: impl FnMut(f64) -> f64,
    ) -> f64 {
        let mut total = 0.0;
        let mut frequency = 1.0;
        let mut amplitude = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..octaves {
            total += amplitude * sample(frequency);
            max_amplitude += amplitude;
            frequency *= lacunarity;
            amplitude *= gain;
        }

        if max_amplitude > 0.0 {
            total / max_amplitude
        } else {
            0.0
        }
    }
}

/// Fast floor function.
///
/// Faster than `f64::floor()` for our use case.
#[inline]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < f64::from(xi) { xi - 1 } else { xi }
}
