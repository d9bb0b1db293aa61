//! Procedural terrain height field (seeded Perlin noise)

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Horizontal scale of the noise lattice
const TERRAIN_SCALE: f32 = 100.0;
/// Vertical scale applied to the raw noise value
const TERRAIN_AMPLITUDE: f32 = 20.0;
/// Gradients are unnormalised (1..=8 per axis), so raw noise stays within ±16
const NOISE_BOUND: f32 = 16.0;
/// Hard bound on |height|. Sampled terrain stays well inside it (about ±115).
pub const MAX_TERRAIN_HEIGHT: f32 = NOISE_BOUND * TERRAIN_AMPLITUDE;

/// Anything that can answer "how high is the ground here"
pub trait HeightField {
    fn height_at(&self, x: f32, z: f32) -> f32;
}

/// Seeded Perlin terrain shared by every client using the same seed
#[derive(Clone)]
pub struct Terrain {
    seed: u64,
    perm: [u8; 512],
}

impl Terrain {
    pub fn new(seed: u64) -> Self {
        let mut table: Vec<u8> = (0..=255).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        table.shuffle(&mut rng);

        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = table[i & 255];
        }

        Self { seed, perm }
    }

    fn noise(&self, x: f32, z: f32) -> f32 {
        let xf = x.floor();
        let zf = z.floor();
        let xi = (xf as i32 & 255) as usize;
        let zi = (zf as i32 & 255) as usize;
        let x = x - xf;
        let z = z - zf;

        let u = fade(x);
        let v = fade(z);

        let a = self.perm[xi] as usize + zi;
        let b = self.perm[xi + 1] as usize + zi;

        lerp(
            v,
            lerp(
                u,
                grad(self.perm[a], x, z),
                grad(self.perm[b], x - 1.0, z),
            ),
            lerp(
                u,
                grad(self.perm[a + 1], x, z - 1.0),
                grad(self.perm[b + 1], x - 1.0, z - 1.0),
            ),
        )
    }
}

impl std::fmt::Debug for Terrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terrain").field("seed", &self.seed).finish()
    }
}

impl HeightField for Terrain {
    fn height_at(&self, x: f32, z: f32) -> f32 {
        self.noise(x / TERRAIN_SCALE, z / TERRAIN_SCALE) * TERRAIN_AMPLITUDE
    }
}

/// Constant-height ground
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTerrain(pub f32);

impl HeightField for FlatTerrain {
    fn height_at(&self, _x: f32, _z: f32) -> f32 {
        self.0
    }
}

fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: f32, a: f32, b: f32) -> f32 {
    a + t * (b - a)
}

fn grad(hash: u8, x: f32, z: f32) -> f32 {
    let h = hash & 15;
    let g = (1 + (h & 7)) as f32;
    let gx = if h & 8 != 0 { -g } else { g };
    let gz = if h & 4 != 0 { -g } else { g };
    gx * x + gz * z
}
