//! Rendering of the city, vehicles, control beams and globe icon.
//!
//! Meshes and materials are created once and shared so Bevy can batch the
//! many identical road, building and vehicle instances.

use bevy::prelude::*;

use crate::scene::SceneSet;
use crate::simulation::beams::BeamConfig;
use crate::simulation::vehicles::VehicleKind;

pub mod beam_mesh;
pub mod city_mesh;
pub mod globe;
pub mod vehicle_meshes;

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (
                CityRenderSet::Teardown,
                CityRenderSet::Spawn,
                CityRenderSet::Sync,
            )
                .chain()
                .in_set(SceneSet::Present),
        )
        .add_systems(Startup, setup_city_assets)
        .add_plugins(city_mesh::CityMeshPlugin)
        .add_plugins(vehicle_meshes::VehicleMeshesPlugin)
        .add_plugins(beam_mesh::BeamMeshPlugin)
        .add_plugins(globe::GlobePlugin);
    }
}

/// Ordering of city rendering work within a frame.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CityRenderSet {
    /// Remove meshes of a replaced city.
    Teardown,
    /// Spawn meshes for a freshly generated city.
    Spawn,
    /// Copy per-frame simulation state onto meshes.
    Sync,
}

/// Shared handles for instanced city geometry.
#[derive(Resource)]
pub struct CityAssets {
    /// 1x1x1 cube scaled per instance.
    pub unit_cube: Handle<Mesh>,
    pub vehicle_body: Handle<Mesh>,
    pub road: Handle<StandardMaterial>,
    pub building: Handle<StandardMaterial>,
    pub human_vehicle: Handle<StandardMaterial>,
    pub connected_vehicle: Handle<StandardMaterial>,
    pub beam: Handle<StandardMaterial>,
    pub tower: Handle<StandardMaterial>,
}

impl CityAssets {
    pub fn vehicle_material(&self, kind: VehicleKind) -> Handle<StandardMaterial> {
        match kind {
            VehicleKind::Human => self.human_vehicle.clone(),
            VehicleKind::Connected => self.connected_vehicle.clone(),
        }
    }
}

fn setup_city_assets(
    mut commands: Commands,
    beam_config: Res<BeamConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let unit_cube = meshes.add(Cuboid::new(1.0, 1.0, 1.0));
    // Long axis on X, matching the vehicle forward axis.
    let vehicle_body = meshes.add(Cuboid::new(0.45, 0.2, 0.25));

    let road = materials.add(StandardMaterial {
        base_color: Color::srgb(0.22, 0.24, 0.3),
        perceptual_roughness: 0.9,
        ..default()
    });
    let building = materials.add(StandardMaterial {
        base_color: Color::srgb(0.78, 0.8, 0.86),
        perceptual_roughness: 0.6,
        ..default()
    });
    let human_vehicle = materials.add(StandardMaterial {
        base_color: VehicleKind::Human.color(),
        perceptual_roughness: 0.4,
        metallic: 0.3,
        ..default()
    });
    let connected_vehicle = materials.add(StandardMaterial {
        base_color: VehicleKind::Connected.color(),
        emissive: VehicleKind::Connected.color().to_linear() * 2.0,
        perceptual_roughness: 0.3,
        ..default()
    });
    let beam = materials.add(StandardMaterial {
        base_color: beam_config.color,
        emissive: beam_config.color.to_linear() * 4.0,
        unlit: true,
        ..default()
    });
    let tower = materials.add(StandardMaterial {
        base_color: Color::srgb(0.35, 0.4, 0.5),
        metallic: 0.6,
        perceptual_roughness: 0.3,
        ..default()
    });

    commands.insert_resource(CityAssets {
        unit_cube,
        vehicle_body,
        road,
        building,
        human_vehicle,
        connected_vehicle,
        beam,
        tower,
    });
}
