//! Foundation data for flapsim
//!
//! This crate provides the types every other flapsim crate builds on:
//! - Simulation configuration and its validation (SimConfig, ConfigError)
//! - Pixel collision bitmasks (CollisionMask)
//! - Procedural sprite shapes for agents and obstacles
//! - Seeded random sources for reproducible obstacle courses

mod config;
mod error;
mod mask;
mod rng;
pub mod shapes;

pub use config::SimConfig;
pub use error::ConfigError;
pub use mask::CollisionMask;
pub use rng::{SimRng, generation_rng};
