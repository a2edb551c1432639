use bevy::prelude::*;
use crate::clouds::CloudObserver;
use crate::input::FlyCamera;

#[derive(Component)]
pub struct MainCamera;

pub fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // 1) Sun
    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            ..default()
        },
        Transform::from_xyz(0.0, 100.0, 0.0).looking_at(Vec3::new(0.3, 0.0, 0.2), Vec3::Y),
    ));

    // 2) Ground, so movement under the clouds reads
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(2_000.0, 2_000.0))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.30, 0.45, 0.25),
            perceptual_roughness: 1.0,
            ..default()
        })),
        Transform::default(),
    ));

    // 3) Camera; it is also the cloud observer
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 20.0, 0.0).looking_at(Vec3::new(50.0, 40.0, 50.0), Vec3::Y),
        MainCamera,
        CloudObserver,
        FlyCamera {
            yaw: std::f32::consts::FRAC_PI_4,
            pitch: 0.2,
        },
    ));
}
