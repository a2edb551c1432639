// src/clouds/render.rs
//! Draw-call sink + Bevy presentation.
//!
//! The frame driver submits one instanced draw per active batch. Bevy has no
//! immediate-mode instanced draw, so `CloudDrawQueue` records the calls and
//! `present_cloud_batches` bakes each into that batch's own merged mesh
//! (CPU merge of the shared billboard) and toggles visibility.

use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology, VertexAttributeValues};

/// Consumer of per-batch instance transforms.
pub trait InstancedDrawSink {
    fn draw_instanced(
        &mut self,
        batch: usize,
        mesh: &Handle<Mesh>,
        material: &Handle<StandardMaterial>,
        transforms: Vec<Mat4>,
    );
}

/// Shared billboard mesh + material for every cloud.
#[derive(Resource, Clone, Default)]
pub struct CloudRenderAssets {
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}

#[derive(Clone, Debug)]
pub struct DrawCall {
    pub batch: usize,
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
    pub transforms: Vec<Mat4>,
}

/// This frame's draw calls, refilled by the frame driver.
#[derive(Resource, Default)]
pub struct CloudDrawQueue {
    pub calls: Vec<DrawCall>,
}

impl InstancedDrawSink for CloudDrawQueue {
    fn draw_instanced(
        &mut self,
        batch: usize,
        mesh: &Handle<Mesh>,
        material: &Handle<StandardMaterial>,
        transforms: Vec<Mat4>,
    ) {
        self.calls.push(DrawCall {
            batch,
            mesh: mesh.clone(),
            material: material.clone(),
            transforms,
        });
    }
}

/// Render entity for one batch; owns the merged mesh it redraws into.
#[derive(Component)]
pub struct CloudBatchView {
    pub batch: usize,
    pub merged: Handle<Mesh>,
}

/// Startup: one hidden view per batch, each with its own merged mesh asset
/// seeded from the batch's current (zero-scale) transforms.
pub fn spawn_batch_views(
    mut commands: Commands,
    field: Res<super::field::CloudField>,
    assets: Res<CloudRenderAssets>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    let src = meshes.get(&assets.mesh).cloned();
    for (i, batch) in field.batches().iter().enumerate() {
        let seed = src
            .as_ref()
            .and_then(|m| merge_mesh_instances(m, &batch.transforms()))
            .unwrap_or_else(empty_mesh);
        let merged = meshes.add(seed);
        commands.spawn((
            CloudBatchView { batch: i, merged: merged.clone() },
            Mesh3d(merged),
            MeshMaterial3d(assets.material.clone()),
            Name::new(format!("Clouds {:?}", batch.coord)),
            Transform::default(),
            Visibility::Hidden,
        ));
    }
    info!("Clouds: spawned {} batch views", field.batches().len());
}

/// Update: bake queued draws into their batch meshes; hide the rest.
pub fn present_cloud_batches(
    mut queue: ResMut<CloudDrawQueue>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut q_views: Query<(&CloudBatchView, &mut MeshMaterial3d<StandardMaterial>, &mut Visibility)>,
) {
    let mut drawn = std::collections::HashMap::with_capacity(queue.calls.len());
    for call in queue.calls.drain(..) {
        drawn.insert(call.batch, call);
    }

    for (view, mut material, mut vis) in q_views.iter_mut() {
        let Some(call) = drawn.remove(&view.batch) else {
            vis.set_if_neq(Visibility::Hidden);
            continue;
        };
        let Some(src) = meshes.get(&call.mesh).cloned() else {
            // base mesh not ready yet
            continue;
        };
        let Some(merged) = merge_mesh_instances(&src, &call.transforms) else {
            warn!("Clouds: billboard mesh has no Float32x3 positions; batch {} skipped", view.batch);
            continue;
        };
        if let Some(dst) = meshes.get_mut(&view.merged) {
            *dst = merged;
        }
        if material.0 != call.material {
            material.0 = call.material;
        }
        vis.set_if_neq(Visibility::Visible);
    }
}

fn empty_mesh() -> Mesh {
    Mesh::new(PrimitiveTopology::TriangleList, Default::default())
}

/// Bake `src` once per transform into a single mesh. Positions and UVs only;
/// the cloud material is unlit so normals are dropped.
pub fn merge_mesh_instances(src: &Mesh, transforms: &[Mat4]) -> Option<Mesh> {
    let positions: &Vec<[f32; 3]> = match src.attribute(Mesh::ATTRIBUTE_POSITION)? {
        VertexAttributeValues::Float32x3(v) => v,
        _ => return None,
    };

    let uvs: Option<&Vec<[f32; 2]>> = src
        .attribute(Mesh::ATTRIBUTE_UV_0)
        .and_then(|vals| match vals {
            VertexAttributeValues::Float32x2(v) => Some(v),
            _ => None,
        });

    let src_indices: Option<Vec<u32>> = match src.indices() {
        Some(Indices::U32(v)) => Some(v.clone()),
        Some(Indices::U16(v)) => Some(v.iter().map(|&x| x as u32).collect()),
        None => None,
    };

    let src_vtx = positions.len();
    let inst_n = transforms.len();

    let mut out_positions = Vec::with_capacity(src_vtx * inst_n);
    let mut out_uvs: Option<Vec<[f32; 2]>> = uvs.map(|_| Vec::with_capacity(src_vtx * inst_n));
    let mut out_indices: Vec<u32> =
        Vec::with_capacity(src_indices.as_ref().map_or(0, |ix| ix.len()) * inst_n);

    for (inst_id, trs) in transforms.iter().enumerate() {
        for (i, p) in positions.iter().enumerate() {
            let wp = trs.transform_point3(Vec3::from_array(*p));
            out_positions.push(wp.to_array());

            if let (Some(src_uv), Some(dst_uv)) = (uvs, out_uvs.as_mut()) {
                dst_uv.push(src_uv[i]);
            }
        }

        if let Some(ix) = &src_indices {
            let base = (inst_id * src_vtx) as u32;
            out_indices.extend(ix.iter().map(|&i| i + base));
        }
    }

    let mut mesh = empty_mesh();
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, out_positions);
    if let Some(uv) = out_uvs {
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uv);
    }
    if src_indices.is_some() {
        mesh.insert_indices(Indices::U32(out_indices));
    }
    Some(mesh)
}
