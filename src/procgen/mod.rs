//! Procedural generation of the miniature city.
//!
//! - Jittered-grid intersections with nearest-neighbour roads
//! - Road and building geometry derived from the graph

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::scene::SceneSet;

pub mod city_graph;
pub mod layout;

use city_graph::{generate_city_graph, CityGraph, CityGraphConfig};
use layout::{BuildingStyle, RoadStyle};

pub struct ProcgenPlugin;

impl Plugin for ProcgenPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CityGraphConfig>()
            .init_resource::<RoadStyle>()
            .init_resource::<BuildingStyle>()
            .init_resource::<CityGraph>()
            .add_event::<CityGenerated>()
            .add_event::<RegenerateCity>()
            .add_systems(Update, regenerate_city.in_set(SceneSet::Generate));
    }
}

/// Sent after the city graph has been (re)built.
#[derive(Event, Debug, Clone, Copy)]
pub struct CityGenerated {
    pub node_count: usize,
    pub edge_count: usize,
}

/// Request a new city with the next seed.
#[derive(Event, Debug, Clone, Copy)]
pub struct RegenerateCity;

/// Rebuild the graph on request or whenever its parameters change
/// (including the first run).
fn regenerate_city(
    mut requests: EventReader<RegenerateCity>,
    mut config: ResMut<CityGraphConfig>,
    mut graph: ResMut<CityGraph>,
    mut events: EventWriter<CityGenerated>,
) {
    if requests.read().last().is_some() {
        config.seed = config.seed.wrapping_add(1);
        info!("Regenerating city with seed {}", config.seed);
    }
    if !config.is_changed() {
        return;
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    *graph = generate_city_graph(&config, &mut rng);

    if graph.edge_count() == 0 {
        warn!("City graph has no roads; vehicles will stay parked");
    }

    events.send(CityGenerated {
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::configure_scene_sets;

    #[derive(Resource, Default)]
    struct GeneratedCount(usize);

    fn count_generated(mut events: EventReader<CityGenerated>, mut count: ResMut<GeneratedCount>) {
        count.0 += events.read().count();
    }

    fn procgen_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        configure_scene_sets(&mut app);
        app.add_plugins(ProcgenPlugin)
            .init_resource::<GeneratedCount>()
            .add_systems(Update, count_generated.in_set(SceneSet::Populate));
        app
    }

    #[test]
    fn first_frame_builds_city_once() {
        let mut app = procgen_app();
        app.update();
        app.update();
        app.update();

        assert!(!app.world().resource::<CityGraph>().is_empty());
        assert_eq!(app.world().resource::<GeneratedCount>().0, 1);
    }

    #[test]
    fn regenerate_request_advances_seed() {
        let mut app = procgen_app();
        app.update();
        let seed = app.world().resource::<CityGraphConfig>().seed;
        let first = app.world().resource::<CityGraph>().position(0);

        app.world_mut().send_event(RegenerateCity);
        app.update();

        assert_eq!(
            app.world().resource::<CityGraphConfig>().seed,
            seed.wrapping_add(1)
        );
        assert_ne!(app.world().resource::<CityGraph>().position(0), first);
        assert_eq!(app.world().resource::<GeneratedCount>().0, 2);
    }
}
