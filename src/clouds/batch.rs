// src/clouds/batch.rs
//! Startup partition of the cloud grid into fixed-size square batches.

use bevy::prelude::*;

use super::config::{CloudConfig, BATCH_LEN, BATCH_SIDE};
use super::instance::CloudInstance;
use super::visibility::is_batch_active;

/// Position of a batch in the batch grid (its creation loop indices).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BatchCoord {
    pub x: usize,
    pub y: usize,
}

/// A `BATCH_SIDE` x `BATCH_SIDE` block of instances, drawn with one instanced call.
#[derive(Clone, Debug)]
pub struct CloudBatch {
    pub coord: BatchCoord,
    instances: Vec<CloudInstance>,
}

impl CloudBatch {
    #[inline]
    pub fn instances(&self) -> &[CloudInstance] { &self.instances }

    /// Mutable access to the instances; the vector itself is never resized.
    #[inline]
    pub fn instances_mut(&mut self) -> &mut [CloudInstance] { &mut self.instances }

    #[inline]
    pub fn len(&self) -> usize { self.instances.len() }

    /// Ordered transforms for the draw sink.
    pub fn transforms(&self) -> Vec<Mat4> {
        self.instances.iter().map(CloudInstance::transform).collect()
    }
}

/// Build one batch covering grid cells
/// `[bx*BATCH_SIDE, (bx+1)*BATCH_SIDE) x [by*BATCH_SIDE, (by+1)*BATCH_SIDE)`.
pub fn build_batch(coord: BatchCoord, cfg: &CloudConfig, observer: Vec3) -> CloudBatch {
    let mut instances = Vec::with_capacity(BATCH_LEN);
    for x in 0..BATCH_SIDE {
        for y in 0..BATCH_SIDE {
            let gx = (x + coord.x * BATCH_SIDE) as i32;
            let gy = (y + coord.y * BATCH_SIDE) as i32;
            instances.push(make_cloud(gx, gy, cfg, observer));
        }
    }
    CloudBatch { coord, instances }
}

fn make_cloud(gx: i32, gy: i32, cfg: &CloudConfig, observer: Vec3) -> CloudInstance {
    let position = cfg.origin + Vec3::new(gx as f32 * cfg.cloud_size, 0.0, gy as f32 * cfg.cloud_size);

    // NOTE: measured from the raw grid coordinates, not `position`. Meaningless in
    // world space; the visibility check overwrites it before anything reads it.
    let grid_proxy = Vec3::new(gx as f32, cfg.origin.y, gy as f32);
    let dist = grid_proxy.distance(observer);

    CloudInstance::new(position, Quat::IDENTITY, gx, gy, dist)
}

/// Every batch of the field in creation order, plus the indices of the ones
/// in range of `observer` at build time.
pub fn build_field_batches(cfg: &CloudConfig, observer: Vec3) -> (Vec<CloudBatch>, Vec<usize>) {
    let n = cfg.batches_to_create;
    let mut batches = Vec::with_capacity(n * n);
    let mut active = Vec::new();

    for bx in 0..n {
        for by in 0..n {
            let mut batch = build_batch(BatchCoord { x: bx, y: by }, cfg, observer);
            let mark = is_batch_active(&mut batch, observer, cfg.max_dist);
            batches.push(batch);
            if mark {
                active.push(batches.len() - 1);
            }
        }
    }
    (batches, active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn batches_cover_grid_exactly_once() {
        let cfg = CloudConfig { batches_to_create: 3, ..Default::default() };
        let (batches, _) = build_field_batches(&cfg, Vec3::ZERO);
        assert_eq!(batches.len(), 9);

        let side = cfg.grid_side() as i32;
        let mut seen = HashSet::new();
        for b in &batches {
            assert_eq!(b.len(), BATCH_LEN);
            for c in b.instances() {
                assert!(seen.insert((c.grid_x, c.grid_y)), "duplicate cell {:?}", (c.grid_x, c.grid_y));
            }
        }
        assert_eq!(seen.len(), (side * side) as usize);
        for x in 0..side {
            for y in 0..side {
                assert!(seen.contains(&(x, y)));
            }
        }
    }

    #[test]
    fn world_position_follows_grid_spacing() {
        let cfg = CloudConfig {
            origin: Vec3::new(10.0, 50.0, -20.0),
            cloud_size: 5.0,
            ..Default::default()
        };
        let batch = build_batch(BatchCoord { x: 1, y: 2 }, &cfg, Vec3::ZERO);
        let first = &batch.instances()[0];
        assert_eq!((first.grid_x, first.grid_y), (31, 62));
        assert_eq!(first.position(), Vec3::new(10.0 + 155.0, 50.0, -20.0 + 310.0));
        assert_eq!(first.rotation(), Quat::IDENTITY);
    }

    #[test]
    fn build_time_distance_uses_grid_coordinates() {
        let cfg = CloudConfig { cloud_size: 5.0, ..Default::default() };
        let batch = build_batch(BatchCoord { x: 0, y: 0 }, &cfg, Vec3::ZERO);
        // cell (0, 3): grid proxy (0, 0, 3), world (0, 0, 15)
        let c = &batch.instances()[3];
        assert_eq!((c.grid_x, c.grid_y), (0, 3));
        assert_eq!(c.dist_to_observer, 3.0);
    }

    #[test]
    fn far_batches_are_not_marked() {
        let cfg = CloudConfig {
            batches_to_create: 2,
            cloud_size: 10.0,
            max_dist: 100.0,
            ..Default::default()
        };
        // Only batch (0,0) has a cell within 100 of the origin.
        let (batches, active) = build_field_batches(&cfg, Vec3::ZERO);
        assert_eq!(batches.len(), 4);
        assert_eq!(active, vec![0]);
        assert_eq!(batches[0].coord, BatchCoord { x: 0, y: 0 });
        assert_eq!(batches[1].coord, BatchCoord { x: 0, y: 1 });
    }
}
