//! Flapsim headless driver
//!
//! Loads layered configuration, evaluates generations of sampled
//! feed-forward policies with `flapsim-core` and checkpoints the best one.

pub mod config;
pub mod headless;

pub use config::AppConfig;
