//! Orbit camera for the scenes.
//!
//! The hero scene accepts left-drag orbiting and wheel zoom; both scenes
//! drift slowly around the city when left alone.

use bevy::{
    input::mouse::{MouseMotion, MouseWheel},
    prelude::*,
};

use crate::scene::SceneSet;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (orbit_input, orbit_auto_rotate, apply_orbit)
                .chain()
                .in_set(SceneSet::Present),
        );
    }
}

/// Orbit rig parameters for a scene.
#[derive(Clone, Debug)]
pub struct OrbitSettings {
    pub target: Vec3,
    pub radius: f32,
    /// Initial azimuth (radians).
    pub yaw: f32,
    /// Initial elevation above the ground plane (radians).
    pub pitch: f32,
    pub fov: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    pub min_pitch: f32,
    pub max_pitch: f32,
    /// Radians per second while idle. Zero disables drift.
    pub auto_rotate_speed: f32,
    /// Whether pointer input moves the camera.
    pub interactive: bool,
    pub drag_sensitivity: f32,
    pub zoom_sensitivity: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            radius: 32.0,
            yaw: 45_f32.to_radians(),
            pitch: 35_f32.to_radians(),
            fov: 45_f32.to_radians(),
            min_radius: 12.0,
            max_radius: 60.0,
            min_pitch: 10_f32.to_radians(),
            max_pitch: 80_f32.to_radians(),
            auto_rotate_speed: 0.08,
            interactive: true,
            drag_sensitivity: 0.005,
            zoom_sensitivity: 1.5,
        }
    }
}

/// Live orbit state on the camera entity.
#[derive(Component, Clone, Debug)]
pub struct OrbitCamera {
    pub settings: OrbitSettings,
    pub yaw: f32,
    pub pitch: f32,
    pub radius: f32,
    /// Seconds since the last pointer input; drift resumes after a pause.
    pub idle_time: f32,
}

/// Seconds of inactivity before auto-rotation resumes.
const RESUME_DRIFT_AFTER: f32 = 2.0;

impl OrbitCamera {
    pub fn new(settings: OrbitSettings) -> Self {
        Self {
            yaw: settings.yaw,
            pitch: settings.pitch,
            radius: settings.radius,
            idle_time: RESUME_DRIFT_AFTER,
            settings,
        }
    }

    /// Apply a drag delta (in pixels) and zoom steps, clamping to limits.
    pub fn orbit(&mut self, drag: Vec2, zoom: f32) {
        let s = &self.settings;
        self.yaw -= drag.x * s.drag_sensitivity;
        self.pitch = (self.pitch + drag.y * s.drag_sensitivity).clamp(s.min_pitch, s.max_pitch);
        self.radius = (self.radius - zoom * s.zoom_sensitivity).clamp(s.min_radius, s.max_radius);
    }

    pub fn transform(&self) -> Transform {
        let eye = orbit_eye(self.settings.target, self.yaw, self.pitch, self.radius);
        Transform::from_translation(eye).looking_at(self.settings.target, Vec3::Y)
    }
}

/// Eye position on a sphere around `target`.
pub fn orbit_eye(target: Vec3, yaw: f32, pitch: f32, radius: f32) -> Vec3 {
    let horizontal = radius * pitch.cos();
    target
        + Vec3::new(
            horizontal * yaw.cos(),
            radius * pitch.sin(),
            horizontal * yaw.sin(),
        )
}

fn orbit_input(
    mut query: Query<&mut OrbitCamera>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    time: Res<Time<Real>>,
) {
    let scroll: f32 = scroll_events.read().map(|e| e.y).sum();

    let mut drag = Vec2::ZERO;
    if mouse_buttons.pressed(MouseButton::Left) {
        for event in mouse_motion.read() {
            drag += event.delta;
        }
    } else {
        mouse_motion.clear();
    }

    for mut cam in &mut query {
        if !cam.settings.interactive {
            continue;
        }
        if drag == Vec2::ZERO && scroll == 0.0 {
            cam.idle_time += time.delta_secs();
            continue;
        }
        cam.orbit(drag, scroll);
        cam.idle_time = 0.0;
    }
}

fn orbit_auto_rotate(mut query: Query<&mut OrbitCamera>, time: Res<Time<Real>>) {
    for mut cam in &mut query {
        if cam.settings.interactive && cam.idle_time < RESUME_DRIFT_AFTER {
            continue;
        }
        cam.yaw += cam.settings.auto_rotate_speed * time.delta_secs();
    }
}

fn apply_orbit(mut query: Query<(&OrbitCamera, &mut Transform), Changed<OrbitCamera>>) {
    for (cam, mut transform) in &mut query {
        *transform = cam.transform();
    }
}
