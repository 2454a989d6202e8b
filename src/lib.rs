//! URB Scene - animated city scenes for the URB benchmark landing page.
//!
//! A procedurally generated road graph carries a fixed pool of vehicles;
//! connected vehicles are briefly linked to a control tower by beams.

pub mod camera;
pub mod procgen;
pub mod render;
pub mod scene;
pub mod simulation;
