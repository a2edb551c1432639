// src/clouds/noise.rs
//! Coherent 2D noise that drives when clouds appear and fade.

use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Deterministic smooth 2D field in [0, 1].
pub trait NoiseSampler: Send + Sync + 'static {
    fn sample(&self, x: f32, y: f32) -> f32;
}

/// Classic gradient (Perlin) noise, remapped from [-1, 1] to [0, 1].
#[derive(Clone)]
pub struct PerlinNoise {
    /// Shuffled 0..256, repeated once so lookups never wrap.
    perm: [u8; 512],
}

impl PerlinNoise {
    pub fn new(seed: u64) -> Self {
        let mut table: Vec<u8> = (0..=255u8).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0x5EED_C10D_0000_0001);
        table.shuffle(&mut rng);

        let mut perm = [0u8; 512];
        for (i, p) in perm.iter_mut().enumerate() {
            *p = table[i & 255];
        }
        Self { perm }
    }

    #[inline]
    fn hash(&self, xi: usize, yi: usize) -> u8 {
        self.perm[self.perm[xi] as usize + yi]
    }

    /// Raw gradient noise, roughly [-1, 1] after scaling.
    fn raw(&self, x: f32, y: f32) -> f32 {
        let xf = x.floor();
        let yf = y.floor();
        let xi = (xf as i32 & 255) as usize;
        let yi = (yf as i32 & 255) as usize;
        let dx = x - xf;
        let dy = y - yf;

        let u = fade(dx);
        let v = fade(dy);

        let n00 = grad(self.hash(xi, yi), dx, dy);
        let n10 = grad(self.hash(xi + 1, yi), dx - 1.0, dy);
        let n01 = grad(self.hash(xi, yi + 1), dx, dy - 1.0);
        let n11 = grad(self.hash(xi + 1, yi + 1), dx - 1.0, dy - 1.0);

        let a = lerp(n00, n10, u);
        let b = lerp(n01, n11, u);
        // Eight unit-ish gradients peak near +-0.5*sqrt(2); stretch to +-1.
        lerp(a, b, v) * std::f32::consts::SQRT_2
    }
}

impl NoiseSampler for PerlinNoise {
    fn sample(&self, x: f32, y: f32) -> f32 {
        ((self.raw(x, y) + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
fn grad(hash: u8, x: f32, y: f32) -> f32 {
    match hash & 7 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x,
        5 => -x,
        6 => y,
        _ => -y,
    }
}

/// Sampler resource used by the frame driver system.
#[derive(Resource)]
pub struct CloudNoise(pub Box<dyn NoiseSampler>);

impl CloudNoise {
    pub fn perlin(seed: u64) -> Self {
        Self(Box::new(PerlinNoise::new(seed)))
    }
}
