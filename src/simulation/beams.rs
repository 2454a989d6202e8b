//! Control beams linking the control tower to connected vehicles.
//!
//! At most `max_beams` beams live at once, each with a randomised lifetime.
//! Segments are written into a fixed-capacity buffer every frame; only the
//! first `visible_len` entries are live and the tail collapses onto the
//! origin so the line mesh never changes size.

use std::collections::BTreeMap;

use bevy::prelude::*;
use bytemuck::{Pod, Zeroable};
use rand::Rng;

use super::vehicles::{VehicleKind, VehiclePool};

/// Configuration for the beam effect.
#[derive(Resource, Clone, Debug)]
pub struct BeamConfig {
    pub max_beams: usize,
    /// Random draws per frame when looking for a new target.
    pub draw_attempts: usize,
    pub min_duration: f32,
    pub max_duration: f32,
    /// Fixed end of every beam (top of the control tower).
    pub origin: Vec3,
    /// Only vehicles of this kind can be beamed.
    pub eligible: VehicleKind,
    pub color: Color,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            max_beams: 5,
            draw_attempts: 3,
            min_duration: 0.5,
            max_duration: 1.5,
            origin: Vec3::new(0.0, 6.0, 0.0),
            eligible: VehicleKind::Connected,
            color: Color::srgb(0.3, 0.85, 1.0),
        }
    }
}

/// One origin-to-vehicle line, laid out as two vertex positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BeamSegment {
    pub start: [f32; 3],
    pub end: [f32; 3],
}

impl BeamSegment {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self {
            start: start.to_array(),
            end: end.to_array(),
        }
    }

    /// Zero-length segment sitting on `point`.
    pub fn collapsed(point: Vec3) -> Self {
        Self::new(point, point)
    }
}

/// Active beams keyed by vehicle index, plus the segment buffer.
#[derive(Resource)]
pub struct BeamSet {
    config: BeamConfig,
    /// Vehicle index -> expiry time in seconds since startup.
    expiries: BTreeMap<usize, f64>,
    segments: Box<[BeamSegment]>,
    visible_len: usize,
}

impl Default for BeamSet {
    fn default() -> Self {
        Self::new(BeamConfig::default())
    }
}

impl BeamSet {
    pub fn new(config: BeamConfig) -> Self {
        let segments = vec![BeamSegment::collapsed(config.origin); config.max_beams];
        Self {
            config,
            expiries: BTreeMap::new(),
            segments: segments.into_boxed_slice(),
            visible_len: 0,
        }
    }

    /// Run one frame: purge, maybe add a beam, rewrite the buffer.
    pub fn update(&mut self, now: f64, pool: &VehiclePool, rng: &mut impl Rng) {
        self.purge_expired(now);
        self.try_spawn(now, pool, rng);
        self.write_segments(pool);
    }

    /// Drop beams whose expiry is at or before `now`.
    pub fn purge_expired(&mut self, now: f64) {
        self.expiries.retain(|_, expiry| now < *expiry);
    }

    /// Try a few random draws for an eligible, unbeamed vehicle.
    ///
    /// Returns the vehicle index if a beam was registered.
    pub fn try_spawn(&mut self, now: f64, pool: &VehiclePool, rng: &mut impl Rng) -> Option<usize> {
        if self.expiries.len() >= self.config.max_beams || pool.is_empty() {
            return None;
        }

        for _ in 0..self.config.draw_attempts {
            let idx = rng.gen_range(0..pool.len());
            let Some(agent) = pool.agent(idx) else {
                continue;
            };
            if agent.kind != self.config.eligible || self.expiries.contains_key(&idx) {
                continue;
            }

            let duration = if self.config.max_duration > self.config.min_duration {
                rng.gen_range(self.config.min_duration..self.config.max_duration)
            } else {
                self.config.min_duration
            };
            self.expiries.insert(idx, now + f64::from(duration));
            return Some(idx);
        }

        None
    }

    /// Write one segment per active beam and collapse the unused tail.
    pub fn write_segments(&mut self, pool: &VehiclePool) {
        let origin = self.config.origin;
        let mut used = 0;

        for &idx in self.expiries.keys() {
            if used >= self.segments.len() {
                break;
            }
            let Some(pose) = pool.pose(idx) else {
                continue;
            };
            self.segments[used] = BeamSegment::new(origin, pose.translation);
            used += 1;
        }

        for segment in &mut self.segments[used..] {
            *segment = BeamSegment::collapsed(origin);
        }
        self.visible_len = used;
    }

    pub fn config(&self) -> &BeamConfig {
        &self.config
    }

    pub fn active_count(&self) -> usize {
        self.expiries.len()
    }

    pub fn is_active(&self, vehicle: usize) -> bool {
        self.expiries.contains_key(&vehicle)
    }

    pub fn expiry(&self, vehicle: usize) -> Option<f64> {
        self.expiries.get(&vehicle).copied()
    }

    /// Vehicle indices with a live beam, ascending.
    pub fn targets(&self) -> impl Iterator<Item = usize> + '_ {
        self.expiries.keys().copied()
    }

    pub fn capacity(&self) -> usize {
        self.segments.len()
    }

    pub fn visible_len(&self) -> usize {
        self.visible_len
    }

    pub fn visible_segments(&self) -> &[BeamSegment] {
        &self.segments[..self.visible_len]
    }

    /// Vertex positions of the visible prefix.
    pub fn visible_positions(&self) -> &[[f32; 3]] {
        bytemuck::cast_slice(self.visible_segments())
    }

    /// Vertex positions of the whole buffer, for a fixed-size line mesh.
    pub fn buffer_positions(&self) -> &[[f32; 3]] {
        bytemuck::cast_slice(&self.segments)
    }
}
