//! Scene composition for the two presentation contexts.
//!
//! [`hero_scene`] is the interactive foreground banner; [`background_scene`]
//! is a passive, tilted decoration. Both share the same generation and
//! animation pipeline and differ only in their [`SceneProfile`].

use bevy::{core_pipeline::bloom::Bloom, prelude::*};

use crate::camera::{CameraPlugin, OrbitCamera, OrbitSettings};
use crate::procgen::city_graph::CityGraphConfig;
use crate::procgen::layout::{BuildingStyle, RoadStyle};
use crate::procgen::{ProcgenPlugin, RegenerateCity};
use crate::render::globe::GlobeSettings;
use crate::render::RenderPlugin;
use crate::simulation::beams::BeamConfig;
use crate::simulation::vehicles::VehicleConfig;
use crate::simulation::SimulationPlugin;

/// Per-frame ordering shared by every scene plugin.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneSet {
    /// Rebuild the graph when its parameters change.
    Generate,
    /// Respawn traffic for a new graph.
    Populate,
    /// Advance vehicles, then beams.
    Simulate,
    /// Push state to meshes and the camera.
    Present,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SceneVariant {
    #[default]
    Hero,
    Background,
}

impl SceneVariant {
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg.to_ascii_lowercase().as_str() {
            "hero" => Some(Self::Hero),
            "background" | "bg" => Some(Self::Background),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Hero => "Hero",
            Self::Background => "Background",
        }
    }

    pub fn profile(self) -> SceneProfile {
        match self {
            Self::Hero => hero_scene(),
            Self::Background => background_scene(),
        }
    }
}

/// Lights and backdrop of a scene.
#[derive(Clone, Debug)]
pub struct SceneLighting {
    pub clear_color: Color,
    pub ambient_brightness: f32,
    pub sun_illuminance: f32,
    pub sun_position: Vec3,
    pub shadows: bool,
}

/// Everything needed to build one scene.
#[derive(Resource, Clone, Debug)]
pub struct SceneProfile {
    pub variant: SceneVariant,
    pub graph: CityGraphConfig,
    pub roads: RoadStyle,
    pub buildings: BuildingStyle,
    pub vehicles: VehicleConfig,
    pub beams: BeamConfig,
    pub camera: OrbitSettings,
    pub lighting: SceneLighting,
    /// Rotation of the whole city about the X axis (radians).
    pub tilt: f32,
    pub globe: Option<GlobeSettings>,
}

/// Interactive foreground banner.
pub fn hero_scene() -> SceneProfile {
    SceneProfile {
        variant: SceneVariant::Hero,
        graph: CityGraphConfig::default(),
        roads: RoadStyle::default(),
        buildings: BuildingStyle::default(),
        vehicles: VehicleConfig::default(),
        beams: BeamConfig::default(),
        camera: OrbitSettings::default(),
        lighting: SceneLighting {
            clear_color: Color::srgb(0.03, 0.05, 0.1),
            ambient_brightness: 250.0,
            sun_illuminance: 8_000.0,
            sun_position: Vec3::new(20.0, 30.0, 10.0),
            shadows: true,
        },
        tilt: 0.0,
        globe: Some(GlobeSettings::default()),
    }
}

/// Passive background decoration: larger, tilted and slower.
pub fn background_scene() -> SceneProfile {
    SceneProfile {
        variant: SceneVariant::Background,
        graph: CityGraphConfig {
            node_count: 120,
            range: 40.0,
            seed: 77,
            ..default()
        },
        roads: RoadStyle::default(),
        buildings: BuildingStyle {
            max_height: 3.0,
            ..default()
        },
        vehicles: VehicleConfig {
            pool_size: 40,
            ..default()
        },
        beams: BeamConfig {
            max_beams: 3,
            ..default()
        },
        camera: OrbitSettings {
            radius: 45.0,
            pitch: 55_f32.to_radians(),
            fov: 35_f32.to_radians(),
            auto_rotate_speed: 0.03,
            interactive: false,
            ..default()
        },
        lighting: SceneLighting {
            clear_color: Color::srgb(0.02, 0.03, 0.06),
            ambient_brightness: 150.0,
            sun_illuminance: 4_000.0,
            sun_position: Vec3::new(-15.0, 25.0, 20.0),
            shadows: false,
        },
        tilt: -12_f32.to_radians(),
        globe: None,
    }
}

/// Order the per-frame scene sets: generate, populate, simulate, present.
pub fn configure_scene_sets(app: &mut App) {
    app.configure_sets(
        Update,
        (
            SceneSet::Generate,
            SceneSet::Populate,
            SceneSet::Simulate,
            SceneSet::Present,
        )
            .chain(),
    );
}

/// Builds one scene from a profile.
pub struct ScenePlugin {
    profile: SceneProfile,
}

impl ScenePlugin {
    pub fn new(variant: SceneVariant) -> Self {
        Self::from_profile(variant.profile())
    }

    pub fn from_profile(profile: SceneProfile) -> Self {
        Self { profile }
    }
}

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        let profile = self.profile.clone();

        // Sub-plugins only init these when absent, so insert ours first.
        app.insert_resource(profile.graph.clone())
            .insert_resource(profile.roads.clone())
            .insert_resource(profile.buildings.clone())
            .insert_resource(profile.vehicles.clone())
            .insert_resource(profile.beams.clone())
            .insert_resource(ClearColor(profile.lighting.clear_color))
            .insert_resource(AmbientLight {
                color: Color::WHITE,
                brightness: profile.lighting.ambient_brightness,
            });
        if let Some(globe) = &profile.globe {
            app.insert_resource(globe.clone());
        }
        app.insert_resource(profile);

        configure_scene_sets(app);
        app.add_plugins(ProcgenPlugin)
            .add_plugins(SimulationPlugin)
            .add_plugins(RenderPlugin)
            .add_plugins(CameraPlugin)
            .add_systems(Startup, setup_scene)
            .add_systems(Update, scene_controls.before(SceneSet::Generate));
    }
}

/// Parent of every generated city entity; carries the scene tilt.
#[derive(Component)]
pub struct CityRoot;

fn setup_scene(
    mut commands: Commands,
    profile: Res<SceneProfile>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    info!("Setting up {} scene", profile.variant.title());

    let cam = &profile.camera;
    let orbit = OrbitCamera::new(cam.clone());
    commands.spawn((
        Camera3d::default(),
        Camera {
            hdr: true,
            ..default()
        },
        Projection::Perspective(PerspectiveProjection {
            fov: cam.fov,
            ..default()
        }),
        // Lets the connected vehicles, beams and globe glow.
        Bloom::NATURAL,
        orbit.transform(),
        orbit,
    ));

    let lighting = &profile.lighting;
    commands.spawn((
        DirectionalLight {
            illuminance: lighting.sun_illuminance,
            shadows_enabled: lighting.shadows,
            ..default()
        },
        Transform::from_translation(lighting.sun_position).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let ground_size = profile.graph.range.abs() * 1.6 + 4.0;
    let ground_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.07, 0.09, 0.14),
        perceptual_roughness: 1.0,
        ..default()
    });

    commands
        .spawn((
            Transform::from_rotation(Quat::from_rotation_x(profile.tilt)),
            Visibility::default(),
            CityRoot,
        ))
        .with_children(|city| {
            city.spawn((
                Mesh3d(meshes.add(Plane3d::default().mesh().size(ground_size, ground_size))),
                MeshMaterial3d(ground_material),
                Transform::IDENTITY,
            ));
        });
}

/// `R` regenerates the city, `Space` pauses the animation.
fn scene_controls(
    keys: Res<ButtonInput<KeyCode>>,
    mut regenerate: EventWriter<RegenerateCity>,
    mut time: ResMut<Time<Virtual>>,
) {
    if keys.just_pressed(KeyCode::KeyR) {
        regenerate.send(RegenerateCity);
    }

    if keys.just_pressed(KeyCode::Space) {
        if time.is_paused() {
            time.unpause();
        } else {
            time.pause();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_parse_from_arguments() {
        assert_eq!(SceneVariant::from_arg("hero"), Some(SceneVariant::Hero));
        assert_eq!(SceneVariant::from_arg("Background"), Some(SceneVariant::Background));
        assert_eq!(SceneVariant::from_arg("bg"), Some(SceneVariant::Background));
        assert_eq!(SceneVariant::from_arg("menu"), None);
    }

    #[test]
    fn hero_is_interactive_and_background_is_passive() {
        let hero = hero_scene();
        assert!(hero.camera.interactive);
        assert!(hero.globe.is_some());
        assert_eq!(hero.graph.node_count, 80);
        assert_eq!(hero.graph.range, 25.0);

        let background = background_scene();
        assert!(!background.camera.interactive);
        assert!(background.globe.is_none());
        assert_ne!(background.tilt, 0.0);
    }

    #[test]
    fn setup_spawns_tilted_city_with_ground() {
        let profile = background_scene();
        let mut app = App::new();
        app.init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<StandardMaterial>>()
            .insert_resource(profile.clone())
            .add_systems(Startup, setup_scene);
        app.update();

        let world = app.world_mut();
        let mut roots = world.query_filtered::<(Entity, &Transform), With<CityRoot>>();
        let (root, transform) = roots.single(world);
        assert!(transform
            .rotation
            .abs_diff_eq(Quat::from_rotation_x(profile.tilt), 1e-6));

        let children = world.get::<Children>(root).unwrap();
        assert_eq!(children.len(), 1);
        assert!(world.get::<Mesh3d>(children[0]).is_some());
    }

    #[test]
    fn profiles_match_their_variant() {
        for variant in [SceneVariant::Hero, SceneVariant::Background] {
            assert_eq!(variant.profile().variant, variant);
        }
    }
}
