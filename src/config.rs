/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub dispatch: DispatchConfig,
    pub elevator: ElevatorConfig,
    pub hardware: HardwareConfig,
    pub floor: FloorConfig,
    #[serde(default)]
    pub faults: Vec<FaultConfig>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DispatchConfig {
    pub n_elevators: usize,
    pub queue_capacity: usize,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Actuation {
    Simulated,
    Hardware,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ElevatorConfig {
    pub n_floors: u8,
    #[serde(default)]
    pub start_floor: u8,
    pub door_open_time: u64,
    pub travel_time: u64,
    pub actuation: Actuation,
}

#[derive(Deserialize, Clone, Debug)]
pub struct HardwareConfig {
    pub driver_address: String,
    pub hw_thread_sleep_time: u64,
    pub motor_timeout: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct FloorConfig {
    pub request_log: String,
    pub time_scale: f64,
}

/// A fault injected into the simulated actuation of one car.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct FaultConfig {
    pub elevator: usize,
    pub after_moves: u32,
    pub repair_time: u64,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {error}")]
    Read { path: String, error: std::io::Error },

    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/***************************************/
/*             Public API              */
/***************************************/
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config_str = fs::read_to_string(path).map_err(|error| ConfigError::Read {
        path: path.display().to_string(),
        error,
    })?;
    parse_config(&config_str)
}

pub fn parse_config(config_str: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(config_str)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.n_elevators == 0 {
            return Err(ConfigError::Invalid("n_elevators must be at least 1".into()));
        }
        if self.dispatch.queue_capacity == 0 {
            return Err(ConfigError::Invalid("queue_capacity must be at least 1".into()));
        }
        if self.elevator.n_floors < 2 {
            return Err(ConfigError::Invalid("n_floors must be at least 2".into()));
        }
        if self.elevator.start_floor >= self.elevator.n_floors {
            return Err(ConfigError::Invalid(format!(
                "start_floor {} is outside 0..{}",
                self.elevator.start_floor, self.elevator.n_floors
            )));
        }
        if !self.floor.time_scale.is_finite() || self.floor.time_scale < 0.0 {
            return Err(ConfigError::Invalid(
                "time_scale must be finite and non-negative".into(),
            ));
        }
        if self.elevator.actuation == Actuation::Hardware && self.dispatch.n_elevators != 1 {
            return Err(ConfigError::Invalid(
                "hardware actuation drives a single elevator server, n_elevators must be 1".into(),
            ));
        }
        if let Some(fault) = self
            .faults
            .iter()
            .find(|f| f.elevator >= self.dispatch.n_elevators)
        {
            return Err(ConfigError::Invalid(format!(
                "fault configured for unknown elevator {}",
                fault.elevator
            )));
        }
        Ok(())
    }
}
