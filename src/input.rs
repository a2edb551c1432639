use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::input::{keyboard::KeyCode, ButtonInput};

use crate::actions::{PlayerAction, ActionState};
use crate::setup::MainCamera;

pub const MOVE_SPEED: f32 = 40.0;
pub const ROTATE_SPEED: f32 = 0.2;
pub const MAX_CAMERA_DT: f32 = 0.05; // never use a dt larger than 50ms

#[derive(Component)]
pub struct FlyCamera {
    pub yaw: f32,
    pub pitch: f32,
}

impl FlyCamera {
    /// Horizontal forward (XZ) for the current yaw.
    pub fn forward_xz(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin())
    }
}

pub fn input_mapping_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut action_state: ResMut<ActionState>,
) {
    action_state.set(PlayerAction::MoveForward, keys.pressed(KeyCode::KeyW));
    action_state.set(PlayerAction::MoveBackward, keys.pressed(KeyCode::KeyS));
    action_state.set(PlayerAction::MoveLeft, keys.pressed(KeyCode::KeyA));
    action_state.set(PlayerAction::MoveRight, keys.pressed(KeyCode::KeyD));
    action_state.set(PlayerAction::Ascend, keys.pressed(KeyCode::Space));
    action_state.set(PlayerAction::Descend, keys.pressed(KeyCode::ShiftLeft));
}

pub fn camera_controller(
    time: Res<Time>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mut motion_evr: EventReader<MouseMotion>,
    action_state: Res<ActionState>,
    mut query: Query<(&mut Transform, &mut FlyCamera), With<MainCamera>>,
) {
    // 0) Clamp delta
    let dt = time.delta_secs().min(MAX_CAMERA_DT);

    let Ok((mut tf, mut fly)) = query.single_mut() else { return; };

    // 1) Look (right mouse held)
    if mouse_buttons.pressed(MouseButton::Right) {
        for ev in motion_evr.read() {
            fly.yaw += ev.delta.x * ROTATE_SPEED * dt;
            fly.pitch -= ev.delta.y * ROTATE_SPEED * dt;
        }
    } else {
        motion_evr.clear();
    }
    fly.pitch = fly.pitch.clamp(
        -std::f32::consts::FRAC_PI_2 + 0.01,
        std::f32::consts::FRAC_PI_2 - 0.01,
    );

    // 2) Camera-relative movement
    let forward = fly.forward_xz();
    let right = Vec3::new(-forward.z, 0.0, forward.x);

    let mut dir = Vec3::ZERO;
    if action_state.pressed(PlayerAction::MoveForward) { dir += forward; }
    if action_state.pressed(PlayerAction::MoveBackward) { dir -= forward; }
    if action_state.pressed(PlayerAction::MoveLeft) { dir -= right; }
    if action_state.pressed(PlayerAction::MoveRight) { dir += right; }
    if action_state.pressed(PlayerAction::Ascend) { dir += Vec3::Y; }
    if action_state.pressed(PlayerAction::Descend) { dir -= Vec3::Y; }

    // Only touch the translation when actually moving; the cloud field
    // rebuilds its active set on any change.
    if dir != Vec3::ZERO {
        tf.translation += dir.normalize() * MOVE_SPEED * dt;
        tf.translation.y = tf.translation.y.max(2.0);
    }

    // 3) Orient
    let look = Vec3::new(
        fly.pitch.cos() * fly.yaw.cos(),
        fly.pitch.sin(),
        fly.pitch.cos() * fly.yaw.sin(),
    );
    let eye = tf.translation;
    tf.look_at(eye + look, Vec3::Y);
}
