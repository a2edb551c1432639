// src/clouds/config.rs
//! Tunables for the cloud field, loaded from `.ron` at startup.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Most instanced-draw backends cap a single call at this many instances.
pub const INSTANCE_CAP_PER_DRAW: usize = 1024;

/// Side length of a square batch: `floor(sqrt(INSTANCE_CAP_PER_DRAW))`.
pub const BATCH_SIDE: usize = isqrt(INSTANCE_CAP_PER_DRAW);

/// Instances per batch.
pub const BATCH_LEN: usize = BATCH_SIDE * BATCH_SIDE;

/// A shrinking instance at or below this scale snaps to zero and goes dormant.
pub const SNAP_TO_ZERO_SCALE: f32 = 0.1;

const fn isqrt(n: usize) -> usize {
    let mut r = 0;
    while (r + 1) * (r + 1) <= n {
        r += 1;
    }
    r
}

/// Where the config lives and which seed drives the noise field.
#[derive(Resource, Clone, Debug)]
pub struct CloudSettings {
    pub config_path: String,
    pub noise_seed: u64,
}
impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            config_path: "assets/clouds.ron".to_string(),
            noise_seed: 1337,
        }
    }
}

/// Process-wide cloud tunables. Set once before the field is built.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// World-space spacing between adjacent grid cells.
    pub cloud_size: f32,
    /// Upper bound on instance scale.
    pub max_scale: f32,
    /// Multiplier on the noise-offset advance rate.
    pub time_scale: f32,
    /// Grid coordinate -> noise-space multiplier.
    pub tex_scale: f32,
    /// Noise value an instance must exceed to be shown.
    pub min_noise_size: f32,
    /// Linear grow/shrink rate, scale units per second.
    pub size_scale: f32,
    /// Activation radius for batch visibility.
    pub max_dist: f32,
    /// Grid side length in batches.
    pub batches_to_create: usize,
    /// World position of grid cell (0, 0).
    pub origin: Vec3,
    /// Starting value of both noise offsets.
    pub initial_offset: f32,
    /// Observer moves at or under this distance don't rebuild the active set.
    /// 0.0 means exact equality.
    pub movement_epsilon: f32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            cloud_size: 5.0,
            max_scale: 1.0,
            time_scale: 1.0,
            tex_scale: 1.0,
            min_noise_size: 0.5,
            size_scale: 0.25,
            max_dist: 300.0,
            batches_to_create: 4,
            origin: Vec3::ZERO,
            initial_offset: 1.0,
            movement_epsilon: 0.0,
        }
    }
}

impl CloudConfig {
    pub fn from_ron_str(s: &str) -> Result<Self, CloudConfigError> {
        ron::de::from_str(s).map_err(|e| CloudConfigError::Ron(e.to_string()))
    }

    /// Read a config file. `Ok(None)` when the file doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>, CloudConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Self::from_ron_str(&text).map(Some)
    }

    /// Check the preconditions the field relies on. Violations only produce
    /// visual artifacts, so callers fail fast at startup instead of limping on.
    pub fn validate(&self) -> Result<(), CloudConfigError> {
        if !(self.max_scale > 0.0) {
            return Err(CloudConfigError::NonPositive { field: "max_scale", value: self.max_scale });
        }
        if !(self.size_scale > 0.0) {
            return Err(CloudConfigError::NonPositive { field: "size_scale", value: self.size_scale });
        }
        if !(self.cloud_size > 0.0) {
            return Err(CloudConfigError::NonPositive { field: "cloud_size", value: self.cloud_size });
        }
        if !(self.max_dist > 0.0) {
            return Err(CloudConfigError::NonPositive { field: "max_dist", value: self.max_dist });
        }
        if self.batches_to_create == 0 {
            return Err(CloudConfigError::EmptyGrid);
        }
        if !self.movement_epsilon.is_finite() || self.movement_epsilon < 0.0 {
            return Err(CloudConfigError::BadEpsilon(self.movement_epsilon));
        }
        if BATCH_LEN > INSTANCE_CAP_PER_DRAW {
            return Err(CloudConfigError::BatchOverCap { len: BATCH_LEN, cap: INSTANCE_CAP_PER_DRAW });
        }
        Ok(())
    }

    /// Grid side length in instances.
    #[inline]
    pub fn grid_side(&self) -> usize {
        self.batches_to_create * BATCH_SIDE
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CloudConfigError {
    #[error("I/O while reading cloud config: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(String),
    #[error("'{field}' must be > 0 (got {value})")]
    NonPositive { field: &'static str, value: f32 },
    #[error("batches_to_create must be at least 1")]
    EmptyGrid,
    #[error("movement_epsilon must be finite and >= 0 (got {0})")]
    BadEpsilon(f32),
    #[error("batch of {len} instances exceeds the per-draw cap of {cap}")]
    BatchOverCap { len: usize, cap: usize },
}
