//! Rotating globe icon floating above the control tower.

use bevy::prelude::*;

use crate::scene::SceneSet;

pub struct GlobePlugin;

impl Plugin for GlobePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_globe)
            .add_systems(Update, spin_globe.in_set(SceneSet::Present));
    }
}

/// Globe placement. Absent for scenes without the icon.
#[derive(Resource, Clone, Debug)]
pub struct GlobeSettings {
    pub position: Vec3,
    pub radius: f32,
    /// Radians per second around the (tilted) axis.
    pub spin_speed: f32,
    /// Axial tilt in radians.
    pub tilt: f32,
}

impl Default for GlobeSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 8.0, 0.0),
            radius: 1.2,
            spin_speed: 0.6,
            tilt: 23.4_f32.to_radians(),
        }
    }
}

#[derive(Component)]
pub struct Globe {
    pub spin_speed: f32,
}

fn spawn_globe(
    mut commands: Commands,
    settings: Option<Res<GlobeSettings>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(settings) = settings else {
        return;
    };

    let shell = materials.add(StandardMaterial {
        base_color: Color::srgba(0.2, 0.55, 1.0, 0.35),
        emissive: LinearRgba::rgb(0.1, 0.4, 1.2),
        alpha_mode: AlphaMode::Blend,
        ..default()
    });
    let ring = materials.add(StandardMaterial {
        base_color: Color::srgb(0.6, 0.9, 1.0),
        emissive: LinearRgba::rgb(0.6, 1.6, 2.4),
        unlit: true,
        ..default()
    });

    let r = settings.radius;
    commands
        .spawn((
            Transform::from_translation(settings.position)
                .with_rotation(Quat::from_rotation_z(settings.tilt)),
            Visibility::default(),
        ))
        .with_children(|axis| {
            axis.spawn((
                Mesh3d(meshes.add(Sphere::new(r))),
                MeshMaterial3d(shell),
                Transform::IDENTITY,
                Globe {
                    spin_speed: settings.spin_speed,
                },
            ))
            .with_children(|globe| {
                // Equator and one meridian.
                let band = meshes.add(Torus::new(r * 1.02, r * 1.06));
                globe.spawn((
                    Mesh3d(band.clone()),
                    MeshMaterial3d(ring.clone()),
                    Transform::IDENTITY,
                ));
                globe.spawn((
                    Mesh3d(band),
                    MeshMaterial3d(ring),
                    Transform::from_rotation(Quat::from_rotation_x(std::f32::consts::FRAC_PI_2)),
                ));
            });
        });
}

fn spin_globe(time: Res<Time>, mut globes: Query<(&Globe, &mut Transform)>) {
    for (globe, mut transform) in &mut globes {
        transform.rotate_y(globe.spin_speed * time.delta_secs());
    }
}
