// src/clouds/animation.rs
//! Per-instance fade in/out driven by the noise field.
//!
//! Each frame every instance in an active batch samples the noise at its grid
//! cell (shifted by the shared offsets). Above the threshold it grows linearly
//! toward `max_scale`; at or below it shrinks linearly and, once small enough,
//! snaps to zero and goes dormant.

use bevy::prelude::*;

use super::batch::CloudBatch;
use super::config::{CloudConfig, SNAP_TO_ZERO_SCALE};
use super::instance::CloudInstance;
use super::noise::NoiseSampler;
use super::visibility::ActiveBatches;

/// Noise-space scroll shared by every instance; advances every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseOffset {
    pub x: f32,
    pub y: f32,
}

impl NoiseOffset {
    pub fn splat(v: f32) -> Self {
        Self { x: v, y: v }
    }

    pub fn advance(&mut self, dt: f32, time_scale: f32) {
        self.x += dt * time_scale;
        self.y += dt * time_scale;
    }
}

/// Noise value for one instance at the current offset.
#[inline]
pub fn sample_for(cloud: &CloudInstance, offset: NoiseOffset, cfg: &CloudConfig, noise: &dyn NoiseSampler) -> f32 {
    noise.sample(
        cloud.grid_x as f32 * cfg.tex_scale + offset.x,
        cloud.grid_y as f32 * cfg.tex_scale + offset.y,
    )
}

/// Float drift allowed when landing on `max_scale`, as a fraction of one step.
/// Summing an inexact step (0.025, 1/60 * 0.25, ...) undershoots the cap by a
/// few ulps; without this the ramp takes one extra frame.
const GROW_SNAP_FRACTION: f32 = 0.01;

/// Step one instance given an already-sampled noise value.
pub fn step_instance(cloud: &mut CloudInstance, value: f32, dt: f32, cfg: &CloudConfig) {
    let step = cfg.size_scale * dt;

    if value > cfg.min_noise_size {
        if !cloud.is_active() {
            // restart the grow ramp from nothing
            cloud.set_active(true);
            cloud.set_scale(0.0);
        }
        if cloud.scale() < cfg.max_scale {
            let next = cloud.scale() + step;
            if next >= cfg.max_scale - step * GROW_SNAP_FRACTION {
                cloud.set_scale(cfg.max_scale);
            } else {
                cloud.set_scale(next);
            }
        }
    } else {
        let before = cloud.scale();
        let next = before - step;
        if before <= SNAP_TO_ZERO_SCALE || next <= 0.0 {
            cloud.set_active(false);
            cloud.set_scale(0.0);
        } else {
            cloud.set_scale(next);
        }
    }
}

/// Animate every instance of one batch.
pub fn animate_batch(
    batch: &mut CloudBatch,
    offset: NoiseOffset,
    dt: f32,
    cfg: &CloudConfig,
    noise: &dyn NoiseSampler,
) {
    for cloud in batch.instances_mut() {
        let value = sample_for(cloud, offset, cfg, noise);
        step_instance(cloud, value, dt, cfg);
    }
}

/// Animate all active batches, leaving the rest untouched.
pub fn animate_active(
    batches: &mut [CloudBatch],
    active: &ActiveBatches,
    offset: NoiseOffset,
    dt: f32,
    cfg: &CloudConfig,
    noise: &dyn NoiseSampler,
) {
    for &i in active.indices() {
        animate_batch(&mut batches[i], offset, dt, cfg, noise);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(max_scale: f32, size_scale: f32) -> CloudConfig {
        CloudConfig { max_scale, size_scale, min_noise_size: 0.5, ..Default::default() }
    }

    fn cloud_at(scale: f32, active: bool) -> CloudInstance {
        let mut c = CloudInstance::new(Vec3::ZERO, Quat::IDENTITY, 0, 0, 0.0);
        c.set_scale(scale);
        c.set_active(active);
        c
    }

    fn assert_invariants(c: &CloudInstance, cfg: &CloudConfig) {
        let s = c.scale_vec();
        assert!(s.x == s.y && s.y == s.z);
        assert!(s.x >= 0.0 && s.x <= cfg.max_scale);
    }

    #[test]
    fn reaches_max_after_ceil_frames() {
        // step = 1/32, exactly representable
        let cfg = cfg(1.0, 0.25);
        let dt = 0.125;
        let mut c = cloud_at(0.0, true);
        let expected = (cfg.max_scale / (cfg.size_scale * dt)).ceil() as usize;
        assert_eq!(expected, 32);

        for frame in 1..=expected {
            assert!(c.scale() < cfg.max_scale, "hit max early at frame {frame}");
            step_instance(&mut c, 0.9, dt, &cfg);
            assert_invariants(&c, &cfg);
        }
        assert_eq!(c.scale(), cfg.max_scale);
    }

    #[test]
    fn reaches_max_on_time_with_inexact_steps() {
        let cfg = cfg(1.0, 0.25);
        for dt in [0.1_f32, 1.0 / 60.0, 1.0 / 30.0] {
            let expected = (cfg.max_scale / (cfg.size_scale * dt)).ceil() as usize;
            let mut c = cloud_at(0.0, true);
            for _ in 1..expected {
                step_instance(&mut c, 0.9, dt, &cfg);
                assert!(c.scale() < cfg.max_scale, "dt={dt}: hit max before frame {expected}");
            }
            step_instance(&mut c, 0.9, dt, &cfg);
            assert_eq!(c.scale(), cfg.max_scale, "dt={dt}: not at max after {expected} frames");
            assert_invariants(&c, &cfg);
        }
    }

    #[test]
    fn overshoot_clamps_to_max() {
        // step = 0.375 -> 0.375, 0.75, then clamp instead of 1.125
        let cfg = cfg(1.0, 3.0);
        let mut c = cloud_at(0.0, true);
        for _ in 0..2 {
            step_instance(&mut c, 0.9, 0.125, &cfg);
        }
        assert_eq!(c.scale(), 0.75);
        step_instance(&mut c, 0.9, 0.125, &cfg);
        assert_eq!(c.scale(), 1.0);
        step_instance(&mut c, 0.9, 0.125, &cfg);
        assert_eq!(c.scale(), 1.0);
    }

    #[test]
    fn dormant_instance_restarts_from_zero() {
        let cfg = cfg(1.0, 0.25);
        let mut c = cloud_at(0.0, false);
        step_instance(&mut c, 0.9, 0.1, &cfg);
        assert!(c.is_active());
        assert!((c.scale() - 0.025).abs() < 1e-6);
    }

    #[test]
    fn snap_uses_pre_shrink_scale() {
        let cfg = cfg(1.0, 0.25);
        let dt = 0.1;
        // Above the band before the step: shrinks but stays live.
        let mut c = cloud_at(0.1 + cfg.size_scale * dt, true);
        step_instance(&mut c, 0.1, dt, &cfg);
        assert!(c.is_active());
        assert!(c.scale() <= 0.1 + 1e-6);

        let mut c = cloud_at(0.1, true);
        step_instance(&mut c, 0.1, dt, &cfg);
        assert!(!c.is_active());
        assert_eq!(c.scale(), 0.0);
    }

    #[test]
    fn threshold_value_counts_as_below() {
        let cfg = cfg(1.0, 0.25);
        let mut c = cloud_at(0.5, true);
        step_instance(&mut c, cfg.min_noise_size, 0.1, &cfg);
        assert!(c.scale() < 0.5);
    }

    #[test]
    fn large_step_to_zero_goes_dormant() {
        let cfg = cfg(1.0, 10.0);
        let mut c = cloud_at(0.3, true);
        step_instance(&mut c, 0.0, 0.1, &cfg);
        assert_eq!(c.scale(), 0.0);
        assert!(!c.is_active());
        assert_invariants(&c, &cfg);
    }

    #[test]
    fn dormant_instance_stays_dormant_below_threshold() {
        let cfg = cfg(1.0, 0.25);
        let mut c = cloud_at(0.0, false);
        for _ in 0..10 {
            step_instance(&mut c, 0.2, 0.016, &cfg);
        }
        assert!(!c.is_active());
        assert_eq!(c.scale(), 0.0);
    }

    #[test]
    fn offset_advances_by_scaled_dt() {
        let mut o = NoiseOffset::splat(1.0);
        o.advance(0.5, 2.0);
        assert_eq!(o, NoiseOffset { x: 2.0, y: 2.0 });
    }
}
