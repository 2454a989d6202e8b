//! Static city geometry derived from the road graph.
//!
//! Roads become oriented unit-cuboid instances and every intersection gets a
//! building. Both are pure functions of the graph: height variation comes
//! from Perlin noise sampled at the node position rather than from an RNG.

use bevy::prelude::*;
use noise::{NoiseFn, Perlin};

use super::city_graph::CityGraph;

/// Axis a unit road primitive is modelled along.
pub const ROAD_REFERENCE_AXIS: Vec3 = Vec3::X;

#[derive(Resource, Clone, Debug)]
pub struct RoadStyle {
    pub width: f32,
    pub thickness: f32,
    /// Height of the road surface above the ground plane.
    pub elevation: f32,
}

impl Default for RoadStyle {
    fn default() -> Self {
        Self {
            width: 0.8,
            thickness: 0.05,
            elevation: 0.02,
        }
    }
}

#[derive(Resource, Clone, Debug)]
pub struct BuildingStyle {
    pub min_height: f32,
    pub max_height: f32,
    pub min_footprint: f32,
    pub max_footprint: f32,
    /// Offset from the intersection so buildings sit beside the roads.
    pub corner_offset: f32,
    /// Frequency of the height noise.
    pub noise_scale: f64,
    pub noise_seed: u32,
}

impl Default for BuildingStyle {
    fn default() -> Self {
        Self {
            min_height: 0.6,
            max_height: 4.5,
            min_footprint: 0.9,
            max_footprint: 1.6,
            corner_offset: 1.3,
            noise_scale: 0.17,
            noise_seed: 7,
        }
    }
}

/// A road segment ready to be drawn as a scaled unit cuboid.
#[derive(Clone, Debug, PartialEq)]
pub struct RoadSegment {
    pub start: usize,
    pub end: usize,
    pub midpoint: Vec3,
    /// Unit direction from start to end.
    pub direction: Vec3,
    pub length: f32,
    /// Shortest-arc rotation from [`ROAD_REFERENCE_AXIS`] to `direction`.
    pub rotation: Quat,
}

impl RoadSegment {
    pub fn transform(&self, style: &RoadStyle) -> Transform {
        Transform::from_translation(self.midpoint)
            .with_rotation(self.rotation)
            .with_scale(Vec3::new(self.length, style.thickness, style.width))
    }
}

/// A building box standing next to an intersection.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildingFootprint {
    pub node: usize,
    /// Centre of the box (half the height above ground).
    pub center: Vec3,
    pub size: Vec3,
}

impl BuildingFootprint {
    pub fn height(&self) -> f32 {
        self.size.y
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.center).with_scale(self.size)
    }
}

/// Derive one segment per road. Degenerate roads are skipped.
pub fn derive_roads(graph: &CityGraph, style: &RoadStyle) -> Vec<RoadSegment> {
    graph
        .roads()
        .filter_map(|(a, b, road)| {
            let start = graph.position(a)?;
            let end = graph.position(b)?;
            let start3 = Vec3::new(start.x, style.elevation, start.y);
            let end3 = Vec3::new(end.x, style.elevation, end.y);
            let direction = (end3 - start3).try_normalize()?;

            Some(RoadSegment {
                start: a,
                end: b,
                midpoint: (start3 + end3) * 0.5,
                direction,
                length: road.length,
                rotation: Quat::from_rotation_arc(ROAD_REFERENCE_AXIS, direction),
            })
        })
        .collect()
}

/// Derive one building per intersection.
pub fn derive_buildings(graph: &CityGraph, style: &BuildingStyle) -> Vec<BuildingFootprint> {
    let perlin = Perlin::new(style.noise_seed);
    let sample = |p: Vec2, offset: f64| -> f32 {
        let value = perlin.get([
            p.x as f64 * style.noise_scale + offset,
            p.y as f64 * style.noise_scale - offset,
        ]);
        // Perlin output is roughly [-1, 1].
        ((value as f32 + 1.0) * 0.5).clamp(0.0, 1.0)
    };

    graph
        .nodes()
        .map(|(idx, node)| {
            let height = lerp(style.min_height, style.max_height, sample(node.position, 0.0));
            let width = lerp(
                style.min_footprint,
                style.max_footprint,
                sample(node.position, 31.7),
            );
            let depth = lerp(
                style.min_footprint,
                style.max_footprint,
                sample(node.position, 63.1),
            );
            let corner = node.position + Vec2::splat(style.corner_offset);

            BuildingFootprint {
                node: idx,
                center: Vec3::new(corner.x, height * 0.5, corner.y),
                size: Vec3::new(width, height, depth),
            }
        })
        .collect()
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
