//! Per-frame traffic animation: the vehicle pool and control beams.
//!
//! Vehicles are advanced before beams each frame, since beam segments read
//! the vehicle poses computed in the same frame.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::procgen::city_graph::CityGraph;
use crate::procgen::CityGenerated;
use crate::scene::SceneSet;

pub mod beams;
pub mod vehicles;

use beams::{BeamConfig, BeamSet};
use vehicles::{VehicleConfig, VehicleKind, VehiclePool};

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<VehicleConfig>()
            .init_resource::<BeamConfig>()
            .init_resource::<VehiclePool>()
            .init_resource::<BeamSet>()
            .insert_resource(TrafficRng(StdRng::seed_from_u64(0)))
            .add_systems(Update, reset_traffic.in_set(SceneSet::Populate))
            .add_systems(
                Update,
                (advance_vehicles, update_beams)
                    .chain()
                    .in_set(SceneSet::Simulate),
            );
    }
}

/// Random source for path choice and beam targeting.
#[derive(Resource)]
pub struct TrafficRng(pub StdRng);

/// Respawn the pool and clear beams whenever the city is rebuilt.
fn reset_traffic(
    mut events: EventReader<CityGenerated>,
    graph: Res<CityGraph>,
    vehicle_config: Res<VehicleConfig>,
    beam_config: Res<BeamConfig>,
    mut pool: ResMut<VehiclePool>,
    mut beams: ResMut<BeamSet>,
    mut rng: ResMut<TrafficRng>,
) {
    let Some(generated) = events.read().last() else {
        return;
    };

    rng.0 = StdRng::seed_from_u64(vehicle_config.seed);
    *pool = VehiclePool::spawn(&graph, &vehicle_config, &mut rng.0);
    *beams = BeamSet::new((*beam_config).clone());

    info!(
        "Traffic reset: {} vehicles ({} connected) on {} roads",
        pool.len(),
        pool.count_of(VehicleKind::Connected),
        generated.edge_count
    );
}

fn advance_vehicles(
    time: Res<Time>,
    graph: Res<CityGraph>,
    mut pool: ResMut<VehiclePool>,
    mut rng: ResMut<TrafficRng>,
) {
    pool.advance(&graph, time.delta_secs(), &mut rng.0);
}

fn update_beams(
    time: Res<Time>,
    pool: Res<VehiclePool>,
    mut beams: ResMut<BeamSet>,
    mut rng: ResMut<TrafficRng>,
) {
    beams.update(time.elapsed_secs_f64(), &pool, &mut rng.0);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bevy::time::TimeUpdateStrategy;

    use super::*;
    use crate::procgen::city_graph::CityGraphConfig;
    use crate::procgen::ProcgenPlugin;
    use crate::scene::configure_scene_sets;

    fn traffic_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(16)))
            .insert_resource(VehicleConfig {
                connected_ratio: 1.0,
                ..default()
            })
            .insert_resource(BeamConfig {
                draw_attempts: 10,
                ..default()
            });
        configure_scene_sets(&mut app);
        app.add_plugins((ProcgenPlugin, SimulationPlugin));
        app
    }

    fn assert_beams_track_poses(app: &App) {
        let pool = app.world().resource::<VehiclePool>();
        let beams = app.world().resource::<BeamSet>();
        let targets: Vec<usize> = beams.targets().collect();
        assert_eq!(targets.len(), beams.visible_len());

        for (segment, target) in beams.visible_segments().iter().zip(targets) {
            let pose = pool.pose(target).unwrap();
            assert_eq!(segment.end, pose.translation.to_array());
        }
    }

    #[test]
    fn beams_read_poses_from_the_same_frame() {
        let mut app = traffic_app();

        for _ in 0..30 {
            app.update();
            assert_beams_track_poses(&app);
        }
        assert!(app.world().resource::<BeamSet>().active_count() > 0);
    }

    #[test]
    fn new_city_respawns_pool_and_clears_beams() {
        let mut app = traffic_app();
        for _ in 0..10 {
            app.update();
        }
        assert!(app.world().resource::<BeamSet>().active_count() > 0);
        let first_node = app.world().resource::<CityGraph>().position(0);

        app.world_mut().resource_mut::<CityGraphConfig>().seed += 7;
        // Every agent is connected, so nothing can be re-beamed this frame.
        app.world_mut().resource_mut::<BeamConfig>().eligible = VehicleKind::Human;
        app.update();

        let graph = app.world().resource::<CityGraph>();
        let pool = app.world().resource::<VehiclePool>();
        let beams = app.world().resource::<BeamSet>();

        assert_ne!(graph.position(0), first_node);
        assert_eq!(beams.active_count(), 0);
        assert_eq!(beams.visible_len(), 0);
        assert_eq!(pool.len(), VehicleConfig::default().pool_size);
        for agent in pool.agents() {
            assert!(agent.current < graph.node_count());
            assert!(agent.is_frozen() || graph.is_connected(agent.current, agent.next));
        }
    }
}
