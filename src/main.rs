//! URB Scene viewer.
//!
//! Usage: `urb-scene [hero|background]`

use bevy::prelude::*;

use urb_scene::scene::{ScenePlugin, SceneVariant};

fn main() {
    let variant = std::env::args()
        .nth(1)
        .and_then(|arg| SceneVariant::from_arg(&arg))
        .unwrap_or_default();

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: format!("URB | {}", variant.title()),
                resolution: (1280., 720.).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(ScenePlugin::new(variant))
        .run();
}
