//! Application configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `flapsim.ron` file, or the file given with `--config`
//! 3. Environment variables prefixed with `FLAPSIM_`
//! 4. Command line flags (applied by the caller)
//!
//! Example environment variable: `FLAPSIM_SIM__GRAVITY=0.6`

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use flapsim_simulation::SimConfig;

use crate::headless::TrainingConfig;

/// Top-level driver configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sim: SimConfig,

    #[serde(default)]
    pub training: TrainingConfig,
}

impl AppConfig {
    /// Load with layered priority; `path` replaces the default `flapsim.ron`
    /// lookup and must exist when given
    ///
    /// The result is not validated, since command line flags still apply on
    /// top of it. Call [`Self::validate`] once every layer is in.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix("FLAPSIM")
            .prefix_separator("_")
            .separator("__")
    }

    fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let defaults =
            Config::try_from(&AppConfig::default()).context("Failed to encode default configuration")?;

        // Layer 1: compiled defaults
        let mut builder = Config::builder().add_source(defaults);

        // Layer 2: config file (the implicit one may be missing)
        builder = match path {
            Some(path) => builder.add_source(File::from(path).format(FileFormat::Ron).required(true)),
            None => builder.add_source(
                File::with_name("flapsim")
                    .format(FileFormat::Ron)
                    .required(false),
            ),
        };

        // Layer 3: environment variables (FLAPSIM_TRAINING__GENERATIONS, etc.)
        let config = builder
            .add_source(env)
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn validate(&self) -> Result<()> {
        self.sim
            .validate()
            .context("Invalid simulation configuration")?;
        self.training.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env() -> Environment {
        AppConfig::environment().source(Some(config::Map::new()))
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.sim.gravity, 0.5);
        assert_eq!(config.sim.score_ceiling, Some(100));
        assert_eq!(config.training.generations, 100);
        assert_eq!(config.training.population_size, 50);
    }

    #[test]
    fn test_load_config_with_defaults() {
        // Should load defaults when no config file exists
        let config = AppConfig::load_with_env(None, no_env()).expect("Failed to load config");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".ron").tempfile().unwrap();
        writeln!(
            file,
            "(sim: (gravity: 0.8, seed: Some(42)), training: (generations: 3))"
        )
        .unwrap();

        let config = AppConfig::load_with_env(Some(file.path()), no_env()).unwrap();
        assert_eq!(config.sim.gravity, 0.8);
        assert_eq!(config.sim.seed, Some(42));
        assert_eq!(config.sim.jump_velocity, -7.0);
        assert_eq!(config.training.generations, 3);
        assert_eq!(config.training.population_size, 50);
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".ron").tempfile().unwrap();
        writeln!(file, "(training: (generations: 3))").unwrap();

        let mut vars = config::Map::new();
        vars.insert("FLAPSIM_TRAINING__GENERATIONS".to_string(), "7".to_string());
        vars.insert("FLAPSIM_SIM__GAP_HEIGHT".to_string(), "180".to_string());
        let env = AppConfig::environment().source(Some(vars));

        let config = AppConfig::load_with_env(Some(file.path()), env).unwrap();
        assert_eq!(config.training.generations, 7);
        assert_eq!(config.sim.gap_height, 180.0);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.ron");
        assert!(AppConfig::load_with_env(Some(&missing), no_env()).is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = tempfile::Builder::new().suffix(".ron").tempfile().unwrap();
        writeln!(file, "(sim: (gap_height: -5.0))").unwrap();
        let config = AppConfig::load_with_env(Some(file.path()), no_env()).unwrap();
        let err = config.validate().unwrap_err();
        assert!(format!("{err:#}").contains("gap_height"));
    }

    #[test]
    fn test_later_override_fixes_file_value() {
        let mut file = tempfile::Builder::new().suffix(".ron").tempfile().unwrap();
        writeln!(file, "(training: (population_size: 0))").unwrap();

        let mut config = AppConfig::load_with_env(Some(file.path()), no_env()).unwrap();
        assert_eq!(config.training.population_size, 0);
        assert!(config.validate().is_err());

        config.training.population_size = 10;
        assert!(config.validate().is_ok());
    }
}
