// src/clouds/field.rs
//! The cloud field and its per-frame driver.

use bevy::prelude::*;

use super::animation::{animate_active, NoiseOffset};
use super::batch::{build_field_batches, CloudBatch};
use super::config::CloudConfig;
use super::noise::NoiseSampler;
use super::render::{CloudRenderAssets, InstancedDrawSink};
use super::visibility::ActiveBatches;

/// Counters refreshed every tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldStats {
    pub active_batches: usize,
    /// Instances in active batches with a visible (non-zero) scale.
    pub live_instances: usize,
    pub rebuilds: u64,
}

/// All batches, the active subset, the noise scroll, and the observer position
/// the active subset was last computed for.
#[derive(Resource)]
pub struct CloudField {
    cfg: CloudConfig,
    batches: Vec<CloudBatch>,
    active: ActiveBatches,
    offset: NoiseOffset,
    prev_observer: Vec3,
    stats: FieldStats,
}

impl CloudField {
    /// Build every batch once. `observer` is also recorded as the previous
    /// position, so the first tick only rebuilds if it moved since.
    pub fn build(cfg: CloudConfig, observer: Vec3) -> Self {
        let (batches, active) = build_field_batches(&cfg, observer);
        let offset = NoiseOffset::splat(cfg.initial_offset);
        let active = ActiveBatches::from_indices(active);
        let stats = FieldStats { active_batches: active.len(), ..Default::default() };
        Self { cfg, batches, active, offset, prev_observer: observer, stats }
    }

    #[inline]
    pub fn batches(&self) -> &[CloudBatch] { &self.batches }

    #[inline]
    pub fn active(&self) -> &ActiveBatches { &self.active }

    #[inline]
    pub fn offset(&self) -> NoiseOffset { self.offset }

    #[inline]
    pub fn stats(&self) -> FieldStats { self.stats }

    pub fn instance_count(&self) -> usize {
        self.batches.iter().map(CloudBatch::len).sum()
    }

    /// Exact equality unless `movement_epsilon` is set.
    fn observer_moved(&self, observer: Vec3) -> bool {
        let eps = self.cfg.movement_epsilon;
        if eps > 0.0 {
            observer.distance(self.prev_observer) > eps
        } else {
            observer != self.prev_observer
        }
    }

    /// One frame: maybe refresh the active set, animate it, submit it, then
    /// scroll the noise.
    pub fn tick(
        &mut self,
        observer: Vec3,
        dt: f32,
        noise: &dyn NoiseSampler,
        assets: &CloudRenderAssets,
        sink: &mut impl InstancedDrawSink,
    ) {
        if self.observer_moved(observer) {
            self.active.refresh(&mut self.batches, observer, self.cfg.max_dist);
            self.prev_observer = observer;
            self.stats.rebuilds += 1;
            debug!(
                "Clouds: observer moved to {:?}; {} active batches",
                observer,
                self.active.len()
            );
        }

        animate_active(&mut self.batches, &self.active, self.offset, dt, &self.cfg, noise);

        let mut live = 0;
        for &i in self.active.indices() {
            let batch = &self.batches[i];
            live += batch.instances().iter().filter(|c| c.scale() > 0.0).count();
            sink.draw_instanced(i, &assets.mesh, &assets.material, batch.transforms());
        }
        self.stats.active_batches = self.active.len();
        self.stats.live_instances = live;

        self.offset.advance(dt, self.cfg.time_scale);
    }
}
