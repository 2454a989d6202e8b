//! Vehicle meshes, one per agent in the pool.

use bevy::prelude::*;

use super::city_mesh::CityMesh;
use super::{CityAssets, CityRenderSet};
use crate::procgen::CityGenerated;
use crate::scene::CityRoot;
use crate::simulation::vehicles::VehiclePool;

pub struct VehicleMeshesPlugin;

impl Plugin for VehicleMeshesPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, spawn_vehicle_meshes.in_set(CityRenderSet::Spawn))
            .add_systems(Update, sync_vehicle_transforms.in_set(CityRenderSet::Sync));
    }
}

/// Links a mesh entity to its slot in the [`VehiclePool`].
#[derive(Component)]
pub struct VehicleMesh {
    pub index: usize,
}

fn spawn_vehicle_meshes(
    mut commands: Commands,
    mut events: EventReader<CityGenerated>,
    pool: Res<VehiclePool>,
    assets: Res<CityAssets>,
    roots: Query<Entity, With<CityRoot>>,
) {
    if events.read().last().is_none() {
        return;
    }
    let Ok(root) = roots.get_single() else {
        return;
    };

    commands.entity(root).with_children(|city| {
        for (index, (agent, pose)) in pool.agents().iter().zip(pool.poses()).enumerate() {
            city.spawn((
                Mesh3d(assets.vehicle_body.clone()),
                MeshMaterial3d(assets.vehicle_material(agent.kind)),
                pose.transform(),
                VehicleMesh { index },
                CityMesh,
            ));
        }
    });
}

fn sync_vehicle_transforms(
    pool: Res<VehiclePool>,
    mut vehicles: Query<(&VehicleMesh, &mut Transform)>,
) {
    for (vehicle, mut transform) in &mut vehicles {
        let Some(pose) = pool.pose(vehicle.index) else {
            continue;
        };
        *transform = pose.transform();
    }
}
