//! Vehicle pool and per-frame movement along the city graph.
//!
//! Each agent travels from `current` to `next` by linear interpolation. On
//! arrival it adopts `next` as its new position and picks a random neighbour.
//! Agents at isolated intersections have `current == next` and stay frozen.

use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::procgen::city_graph::CityGraph;

/// Axis the vehicle mesh faces along before rotation.
pub const VEHICLE_FORWARD_AXIS: Vec3 = Vec3::X;

/// Cosmetic vehicle classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VehicleKind {
    /// Human-driven vehicle.
    Human,
    /// Connected automated vehicle, eligible for control beams.
    Connected,
}

impl VehicleKind {
    pub fn color(self) -> Color {
        match self {
            VehicleKind::Human => Color::srgb(0.86, 0.86, 0.9),
            VehicleKind::Connected => Color::srgb(0.15, 0.7, 1.0),
        }
    }
}

/// Configuration for the vehicle pool.
#[derive(Resource, Clone, Debug)]
pub struct VehicleConfig {
    /// Fixed number of agents, set when the city is built.
    pub pool_size: usize,
    /// Probability that an agent is [`VehicleKind::Connected`].
    pub connected_ratio: f64,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Global multiplier applied to `speed * dt`.
    pub speed_scale: f32,
    /// Lateral distance from the road centre line.
    pub lane_offset: f32,
    /// Height of the vehicle centre above the ground.
    pub ride_height: f32,
    pub seed: u64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            pool_size: 60,
            connected_ratio: 0.3,
            min_speed: 0.5,
            max_speed: 1.5,
            speed_scale: 0.1,
            lane_offset: 0.2,
            ride_height: 0.15,
            seed: 4242,
        }
    }
}

/// A single animated vehicle.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleAgent {
    pub current: usize,
    pub next: usize,
    /// Fraction of the current edge travelled, in `[0, 1)`.
    pub progress: f32,
    pub speed: f32,
    pub kind: VehicleKind,
    pub lane_offset: f32,
}

impl VehicleAgent {
    pub fn is_frozen(&self) -> bool {
        self.current == self.next
    }
}

/// Where an agent is drawn this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VehiclePose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for VehiclePose {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl VehiclePose {
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.translation).with_rotation(self.rotation)
    }
}

/// The fixed-size set of agents plus their poses for the current frame.
#[derive(Resource, Default)]
pub struct VehiclePool {
    agents: Vec<VehicleAgent>,
    poses: Vec<VehiclePose>,
    speed_scale: f32,
    ride_height: f32,
}

impl VehiclePool {
    /// Place `pool_size` agents on random edges of the graph.
    pub fn spawn(graph: &CityGraph, config: &VehicleConfig, rng: &mut impl Rng) -> Self {
        let mut pool = Self {
            agents: Vec::with_capacity(config.pool_size),
            poses: Vec::with_capacity(config.pool_size),
            speed_scale: config.speed_scale,
            ride_height: config.ride_height,
        };

        if graph.is_empty() {
            return pool;
        }

        let ratio = config.connected_ratio.clamp(0.0, 1.0);
        for _ in 0..config.pool_size {
            let current = rng.gen_range(0..graph.node_count());
            let next = pick_next(graph, current, rng);
            let speed = if config.max_speed > config.min_speed {
                rng.gen_range(config.min_speed..config.max_speed)
            } else {
                config.min_speed
            };
            let kind = if rng.gen_bool(ratio) {
                VehicleKind::Connected
            } else {
                VehicleKind::Human
            };

            let agent = VehicleAgent {
                current,
                next,
                progress: if current == next { 0.0 } else { rng.gen::<f32>() },
                speed,
                kind,
                lane_offset: config.lane_offset,
            };
            pool.poses
                .push(pose_for(graph, &agent, pool.ride_height).unwrap_or_default());
            pool.agents.push(agent);
        }

        debug!(
            "Spawned {} vehicles ({} connected)",
            pool.len(),
            pool.count_of(VehicleKind::Connected)
        );

        pool
    }

    /// Advance every agent by `dt` seconds and refresh its pose.
    pub fn advance(&mut self, graph: &CityGraph, dt: f32, rng: &mut impl Rng) {
        let step_scale = dt.max(0.0) * self.speed_scale;

        for (agent, pose) in self.agents.iter_mut().zip(self.poses.iter_mut()) {
            if agent.is_frozen() {
                continue;
            }

            agent.progress += agent.speed * step_scale;
            if agent.progress >= 1.0 {
                agent.progress = 0.0;
                agent.current = agent.next;
                agent.next = pick_next(graph, agent.current, rng);
            }

            if let Some(new_pose) = pose_for(graph, agent, self.ride_height) {
                *pose = new_pose;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agent(&self, idx: usize) -> Option<&VehicleAgent> {
        self.agents.get(idx)
    }

    pub fn agents(&self) -> &[VehicleAgent] {
        &self.agents
    }

    pub fn pose(&self, idx: usize) -> Option<&VehiclePose> {
        self.poses.get(idx)
    }

    pub fn poses(&self) -> &[VehiclePose] {
        &self.poses
    }

    pub fn count_of(&self, kind: VehicleKind) -> usize {
        self.agents.iter().filter(|a| a.kind == kind).count()
    }
}

/// Random neighbour of `node`, or `node` itself when it has none.
fn pick_next(graph: &CityGraph, node: usize, rng: &mut impl Rng) -> usize {
    graph.neighbors(node).choose(rng).copied().unwrap_or(node)
}

/// Interpolated, lane-offset pose of an agent.
fn pose_for(graph: &CityGraph, agent: &VehicleAgent, ride_height: f32) -> Option<VehiclePose> {
    let from = graph.position(agent.current)?;
    let to = graph.position(agent.next)?;

    let from3 = Vec3::new(from.x, ride_height, from.y);
    let to3 = Vec3::new(to.x, ride_height, to.y);
    let along = from3.lerp(to3, agent.progress);

    let Some(direction) = (to3 - from3).try_normalize() else {
        return Some(VehiclePose {
            translation: along,
            rotation: Quat::IDENTITY,
        });
    };

    let lateral = direction.cross(Vec3::Y).normalize_or_zero() * agent.lane_offset;

    Some(VehiclePose {
        translation: along + lateral,
        rotation: Quat::from_rotation_arc(VEHICLE_FORWARD_AXIS, direction),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procgen::city_graph::{generate_city_graph, CityGraphConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn city() -> CityGraph {
        let mut rng = StdRng::seed_from_u64(9);
        generate_city_graph(&CityGraphConfig::default(), &mut rng)
    }

    fn line_graph() -> CityGraph {
        let mut graph = CityGraph::default();
        let a = graph.add_node(Vec2::ZERO);
        let b = graph.add_node(Vec2::new(10.0, 0.0));
        graph.add_road(a, b);
        graph
    }

    #[test]
    fn progress_stays_in_unit_interval() {
        let graph = city();
        let config = VehicleConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut pool = VehiclePool::spawn(&graph, &config, &mut rng);
        assert_eq!(pool.len(), config.pool_size);

        for frame in 0..600 {
            // Mix ordinary frames with a few long hitches.
            let dt = if frame % 97 == 0 { 3.0 } else { 1.0 / 60.0 };
            pool.advance(&graph, dt, &mut rng);
            for agent in pool.agents() {
                assert!(agent.progress >= 0.0 && agent.progress < 1.0);
                assert!(agent.is_frozen() || graph.is_connected(agent.current, agent.next));
            }
        }
    }

    #[test]
    fn pose_lies_on_edge_offset_by_lane() {
        let graph = city();
        let config = VehicleConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut pool = VehiclePool::spawn(&graph, &config, &mut rng);

        for _ in 0..120 {
            pool.advance(&graph, 1.0 / 30.0, &mut rng);
        }

        for (agent, pose) in pool.agents().iter().zip(pool.poses()) {
            if agent.is_frozen() {
                continue;
            }
            let from = graph.position(agent.current).unwrap();
            let to = graph.position(agent.next).unwrap();
            let p = Vec2::new(pose.translation.x, pose.translation.z);

            let edge = to - from;
            let t = (p - from).dot(edge) / edge.length_squared();
            assert!((-1e-4..=1.0 + 1e-4).contains(&t));
            assert!((t - agent.progress).abs() < 1e-3);

            let on_line = from + edge * t;
            assert!((on_line.distance(p) - config.lane_offset).abs() < 1e-3);
            assert_eq!(pose.translation.y, config.ride_height);
        }
    }

    #[test]
    fn arrival_adopts_previous_target() {
        let graph = line_graph();
        let config = VehicleConfig {
            pool_size: 1,
            min_speed: 1.0,
            max_speed: 1.0,
            speed_scale: 1.0,
            ..default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let mut pool = VehiclePool::spawn(&graph, &config, &mut rng);

        let before = pool.agent(0).unwrap().clone();
        assert!(!before.is_frozen());

        // Enough to finish any edge in one step.
        pool.advance(&graph, 1.0, &mut rng);
        let after = pool.agent(0).unwrap();
        assert_eq!(after.current, before.next);
        assert_eq!(after.next, before.current);
        assert_eq!(after.progress, 0.0);
    }

    #[test]
    fn long_frame_arrives_once() {
        let graph = line_graph();
        let config = VehicleConfig {
            pool_size: 1,
            min_speed: 1.0,
            max_speed: 1.0,
            speed_scale: 1.0,
            ..default()
        };
        let mut rng = StdRng::seed_from_u64(8);
        let mut pool = VehiclePool::spawn(&graph, &config, &mut rng);
        let before = pool.agent(0).unwrap().clone();

        // Several edges' worth of travel in a single hitch.
        pool.advance(&graph, 3.5, &mut rng);
        let after = pool.agent(0).unwrap();
        assert_eq!(after.current, before.next);
        assert_eq!(after.progress, 0.0);
    }

    #[test]
    fn heading_faces_travel_direction() {
        let graph = line_graph();
        let config = VehicleConfig {
            pool_size: 8,
            ..default()
        };
        let mut rng = StdRng::seed_from_u64(4);
        let pool = VehiclePool::spawn(&graph, &config, &mut rng);

        for (agent, pose) in pool.agents().iter().zip(pool.poses()) {
            let expected = if agent.next == 1 { Vec3::X } else { Vec3::NEG_X };
            let facing = pose.rotation * VEHICLE_FORWARD_AXIS;
            assert!(facing.distance(expected) < 1e-4);
        }
    }

    #[test]
    fn isolated_nodes_freeze_agents() {
        let mut graph = CityGraph::default();
        graph.add_node(Vec2::ZERO);
        graph.add_node(Vec2::new(50.0, 50.0));

        let mut rng = StdRng::seed_from_u64(5);
        let mut pool = VehiclePool::spawn(&graph, &VehicleConfig::default(), &mut rng);
        let before = pool.agents().to_vec();

        pool.advance(&graph, 10.0, &mut rng);
        assert_eq!(pool.agents(), before.as_slice());
        assert!(pool.agents().iter().all(VehicleAgent::is_frozen));
    }

    #[test]
    fn empty_graph_spawns_nothing() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut pool = VehiclePool::spawn(&CityGraph::default(), &VehicleConfig::default(), &mut rng);
        assert!(pool.is_empty());
        pool.advance(&CityGraph::default(), 1.0, &mut rng);
        assert!(pool.pose(0).is_none());
    }

    #[test]
    fn connected_ratio_extremes() {
        let graph = city();
        let mut rng = StdRng::seed_from_u64(7);

        let all_human = VehicleConfig {
            connected_ratio: 0.0,
            ..default()
        };
        let pool = VehiclePool::spawn(&graph, &all_human, &mut rng);
        assert_eq!(pool.count_of(VehicleKind::Connected), 0);

        let all_connected = VehicleConfig {
            connected_ratio: 1.0,
            ..default()
        };
        let pool = VehiclePool::spawn(&graph, &all_connected, &mut rng);
        assert_eq!(pool.count_of(VehicleKind::Connected), pool.len());
    }
}
