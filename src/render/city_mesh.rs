//! Road and building instances spawned from the derived city layout.

use bevy::prelude::*;

use super::{CityAssets, CityRenderSet};
use crate::procgen::city_graph::CityGraph;
use crate::procgen::layout::{derive_buildings, derive_roads, BuildingStyle, RoadStyle};
use crate::procgen::CityGenerated;
use crate::scene::CityRoot;

pub struct CityMeshPlugin;

impl Plugin for CityMeshPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, despawn_city_meshes.in_set(CityRenderSet::Teardown))
            .add_systems(Update, spawn_city_meshes.in_set(CityRenderSet::Spawn));
    }
}

/// Anything tied to one generated city; torn down on regeneration.
#[derive(Component)]
pub struct CityMesh;

#[derive(Component)]
pub struct RoadInstance;

#[derive(Component)]
pub struct BuildingInstance {
    pub node: usize,
}

fn despawn_city_meshes(
    mut commands: Commands,
    mut events: EventReader<CityGenerated>,
    existing: Query<Entity, With<CityMesh>>,
) {
    if events.read().last().is_none() {
        return;
    }

    for entity in &existing {
        commands.entity(entity).despawn_recursive();
    }
}

fn spawn_city_meshes(
    mut commands: Commands,
    mut events: EventReader<CityGenerated>,
    graph: Res<CityGraph>,
    road_style: Res<RoadStyle>,
    building_style: Res<BuildingStyle>,
    assets: Res<CityAssets>,
    roots: Query<Entity, With<CityRoot>>,
) {
    if events.read().last().is_none() {
        return;
    }
    let Ok(root) = roots.get_single() else {
        warn!("No city root to attach meshes to");
        return;
    };

    let roads = derive_roads(&graph, &road_style);
    let buildings = derive_buildings(&graph, &building_style);

    commands.entity(root).with_children(|city| {
        for road in &roads {
            city.spawn((
                Mesh3d(assets.unit_cube.clone()),
                MeshMaterial3d(assets.road.clone()),
                road.transform(&road_style),
                RoadInstance,
                CityMesh,
            ));
        }

        for building in &buildings {
            city.spawn((
                Mesh3d(assets.unit_cube.clone()),
                MeshMaterial3d(assets.building.clone()),
                building.transform(),
                BuildingInstance {
                    node: building.node,
                },
                CityMesh,
            ));
        }
    });

    info!(
        "Spawned city meshes: {} roads, {} buildings",
        roads.len(),
        buildings.len()
    );
}
