// src/clouds/instance.rs
use bevy::prelude::*;

/// One cloud billboard. Owned by exactly one `CloudBatch` for the life of the field.
///
/// Scale is kept as a single float so the three axes can never disagree;
/// `scale_vec()` expands it for the renderer.
#[derive(Clone, Debug)]
pub struct CloudInstance {
    position: Vec3,
    rotation: Quat,
    scale: f32,
    active: bool,
    /// Integer grid coordinates; the noise sampling key.
    pub grid_x: i32,
    pub grid_y: i32,
    /// Last distance to the observer written by a visibility check.
    pub dist_to_observer: f32,
}

impl CloudInstance {
    /// New instances start active with zero scale: present but invisible until grown.
    pub fn new(position: Vec3, rotation: Quat, grid_x: i32, grid_y: i32, dist_to_observer: f32) -> Self {
        let mut cloud = Self {
            position,
            rotation,
            scale: 0.0,
            active: false,
            grid_x,
            grid_y,
            dist_to_observer,
        };
        cloud.set_active(true);
        cloud
    }

    #[inline]
    pub fn position(&self) -> Vec3 { self.position }

    #[inline]
    pub fn rotation(&self) -> Quat { self.rotation }

    #[inline]
    pub fn scale(&self) -> f32 { self.scale }

    #[inline]
    pub fn scale_vec(&self) -> Vec3 { Vec3::splat(self.scale) }

    #[inline]
    pub fn is_active(&self) -> bool { self.active }

    /// TRS matrix handed to the draw sink. Never cached.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale_vec(), self.rotation, self.position)
    }

    // Animation-only writers.

    pub(in crate::clouds) fn set_active(&mut self, state: bool) {
        self.active = state;
    }

    pub(in crate::clouds) fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }
}
