// src/clouds/visibility.rs
//! Which batches are close enough to the observer to animate and draw.

use bevy::prelude::*;

use super::batch::CloudBatch;

/// True if any instance of `batch` is strictly closer than `max_dist` to `observer`.
///
/// Rewrites each visited instance's cached distance on the way, and stops at
/// the first hit, so instances after it keep their previous value.
pub fn is_batch_active(batch: &mut CloudBatch, observer: Vec3, max_dist: f32) -> bool {
    for cloud in batch.instances_mut() {
        cloud.dist_to_observer = cloud.position().distance(observer);
        if cloud.dist_to_observer < max_dist {
            return true;
        }
    }
    false
}

/// Ordered indices into the field's batch list. Rebuilt wholesale on
/// observer movement, untouched otherwise.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveBatches {
    indices: Vec<usize>,
}

impl ActiveBatches {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    #[inline]
    pub fn indices(&self) -> &[usize] { &self.indices }

    #[inline]
    pub fn len(&self) -> usize { self.indices.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.indices.is_empty() }

    /// Clear and re-scan every batch.
    pub fn refresh(&mut self, batches: &mut [CloudBatch], observer: Vec3, max_dist: f32) {
        self.indices.clear();
        for (i, batch) in batches.iter_mut().enumerate() {
            if is_batch_active(batch, observer, max_dist) {
                self.indices.push(i);
            }
        }
    }
}
