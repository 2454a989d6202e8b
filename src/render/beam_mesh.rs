//! Control tower and the line mesh carrying the beam segments.
//!
//! The line mesh always holds `capacity * 2` vertices. Unused segments are
//! collapsed onto the tower top, so only the live prefix is visible.

use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::view::NoFrustumCulling;

use super::city_mesh::CityMesh;
use super::{CityAssets, CityRenderSet};
use crate::procgen::CityGenerated;
use crate::scene::CityRoot;
use crate::simulation::beams::BeamSet;

pub struct BeamMeshPlugin;

impl Plugin for BeamMeshPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, spawn_beam_mesh.in_set(CityRenderSet::Spawn))
            .add_systems(Update, update_beam_mesh.in_set(CityRenderSet::Sync));
    }
}

#[derive(Component)]
pub struct BeamMesh;

#[derive(Component)]
pub struct ControlTower;

const TOWER_RADIUS: f32 = 0.25;

fn spawn_beam_mesh(
    mut commands: Commands,
    mut events: EventReader<CityGenerated>,
    beams: Res<BeamSet>,
    assets: Res<CityAssets>,
    mut meshes: ResMut<Assets<Mesh>>,
    roots: Query<Entity, With<CityRoot>>,
) {
    if events.read().last().is_none() {
        return;
    }
    let Ok(root) = roots.get_single() else {
        return;
    };

    let origin = beams.config().origin;
    let tower_height = origin.y.max(0.1);
    let tower_mesh = meshes.add(Cylinder::new(TOWER_RADIUS, tower_height));
    let line_mesh = meshes.add(beam_line_mesh(&beams));

    commands.entity(root).with_children(|city| {
        city.spawn((
            Mesh3d(tower_mesh),
            MeshMaterial3d(assets.tower.clone()),
            Transform::from_xyz(origin.x, tower_height * 0.5, origin.z),
            ControlTower,
            CityMesh,
        ));

        city.spawn((
            Mesh3d(line_mesh),
            MeshMaterial3d(assets.beam.clone()),
            Transform::IDENTITY,
            // Vertices move every frame, the spawn-time bounds are meaningless.
            NoFrustumCulling,
            BeamMesh,
            CityMesh,
        ));
    });
}

fn update_beam_mesh(
    beams: Res<BeamSet>,
    query: Query<&Mesh3d, With<BeamMesh>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    if !beams.is_changed() {
        return;
    }

    for mesh3d in &query {
        let Some(mesh) = meshes.get_mut(&mesh3d.0) else {
            continue;
        };
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, beams.buffer_positions().to_vec());
    }
}

/// Line-list mesh sized to the full segment buffer.
fn beam_line_mesh(beams: &BeamSet) -> Mesh {
    let positions = beams.buffer_positions().to_vec();
    let normals = vec![[0.0, 1.0, 0.0]; positions.len()];

    Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::beams::BeamConfig;

    #[test]
    fn line_mesh_covers_whole_buffer() {
        let beams = BeamSet::new(BeamConfig {
            max_beams: 4,
            ..default()
        });
        let mesh = beam_line_mesh(&beams);
        assert_eq!(mesh.count_vertices(), 8);
        assert_eq!(mesh.primitive_topology(), PrimitiveTopology::LineList);
    }
}
