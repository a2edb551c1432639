//! Clouds plugin wiring (glue).
//! - Config + noise resources
//! - Startup: billboard assets, field build, one render view per batch
//! - Update: frame driver, then presentation

use bevy::prelude::*;

use super::config::{CloudConfig, CloudSettings, BATCH_LEN};
use super::field::CloudField;
use super::noise::CloudNoise;
use super::render::{present_cloud_batches, spawn_batch_views, CloudDrawQueue, CloudRenderAssets};

/// Marks the entity whose translation is the observer position.
#[derive(Component, Default)]
pub struct CloudObserver;

/// Startup ordering so the field is built after the observer exists.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum CloudStartupSet {
    Build,
}

/// Per-frame ordering: observer movers should run before `Drive`.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum CloudSet {
    Drive,
    Present,
}

pub struct CloudsPlugin;
impl Plugin for CloudsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CloudSettings>()
            .init_resource::<CloudDrawQueue>()
            .configure_sets(Update, (CloudSet::Drive, CloudSet::Present.after(CloudSet::Drive)))
            .add_systems(
                Startup,
                (load_cloud_config, init_cloud_assets, build_cloud_field, spawn_batch_views)
                    .chain()
                    .in_set(CloudStartupSet::Build),
            )
            .add_systems(
                Update,
                drive_cloud_field
                    .in_set(CloudSet::Drive)
                    .run_if(resource_exists::<CloudField>),
            )
            .add_systems(Update, present_cloud_batches.in_set(CloudSet::Present));
    }
}

/// Startup: use an inserted `CloudConfig`, else the RON file, else defaults.
/// Precondition violations abort startup.
fn load_cloud_config(
    mut commands: Commands,
    settings: Res<CloudSettings>,
    inserted: Option<Res<CloudConfig>>,
) -> bevy::ecs::error::Result {
    let cfg = match inserted {
        Some(cfg) => {
            info!("Clouds: using config inserted by the app");
            CloudConfig::clone(&cfg)
        }
        None => match CloudConfig::load(&settings.config_path)? {
            Some(cfg) => {
                info!("Clouds: loaded config from '{}'", settings.config_path);
                cfg
            }
            None => {
                warn!("Clouds: no config at '{}'; using defaults", settings.config_path);
                CloudConfig::default()
            }
        },
    };
    cfg.validate()?;

    info!(
        "Clouds: {}x{} batches, cloud_size={}, max_dist={}, noise_seed={}",
        cfg.batches_to_create, cfg.batches_to_create, cfg.cloud_size, cfg.max_dist, settings.noise_seed
    );
    commands.insert_resource(cfg);
    commands.insert_resource(CloudNoise::perlin(settings.noise_seed));
    Ok(())
}

/// Startup: the shared billboard (a horizontal quad one cell wide) + material.
fn init_cloud_assets(
    mut commands: Commands,
    cfg: Res<CloudConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mesh = meshes.add(Plane3d::default().mesh().size(cfg.cloud_size, cfg.cloud_size));

    // Cheap: unlit, blended, double-sided, no shadows.
    let material = materials.add(StandardMaterial {
        base_color: Color::srgba(1.0, 1.0, 1.0, 0.85),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        cull_mode: None,
        double_sided: true,
        perceptual_roughness: 1.0,
        metallic: 0.0,
        ..default()
    });

    commands.insert_resource(CloudRenderAssets { mesh, material });
}

/// Startup: generate every batch around the observer's starting position.
fn build_cloud_field(
    mut commands: Commands,
    cfg: Res<CloudConfig>,
    observer_q: Query<&Transform, With<CloudObserver>>,
) {
    let observer = match observer_q.single() {
        Ok(tf) => tf.translation,
        Err(_) => {
            warn!("Clouds: no single CloudObserver at startup; building around the origin");
            Vec3::ZERO
        }
    };

    let field = CloudField::build(CloudConfig::clone(&cfg), observer);
    info!(
        "Clouds: built {} batches ({} instances, {} per batch), {} active",
        field.batches().len(),
        field.instance_count(),
        BATCH_LEN,
        field.active().len()
    );
    commands.insert_resource(field);
}

/// Update: the per-frame entry point.
fn drive_cloud_field(
    time: Res<Time>,
    observer_q: Query<&Transform, With<CloudObserver>>,
    mut field: ResMut<CloudField>,
    noise: Res<CloudNoise>,
    assets: Res<CloudRenderAssets>,
    mut queue: ResMut<CloudDrawQueue>,
) {
    let Ok(observer) = observer_q.single() else { return; };

    queue.calls.clear();
    field.tick(observer.translation, time.delta_secs(), noise.0.as_ref(), &assets, &mut *queue);
}
