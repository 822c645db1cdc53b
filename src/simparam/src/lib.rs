//! Runtime parameters of the distributed training network simulator.
//!
//! A [`RunConfig`] is normally built explicitly with `RunConfig::default()`
//! followed by [`RunConfig::parse`]. Components that cannot be handed the
//! configuration directly reach it through the process-wide store
//! returned by [`instance`].
use std::sync::{Mutex, MutexGuard, PoisonError};

use lazy_static::lazy_static;
use serde::Serialize;
use thiserror::Error;

pub mod argument;
pub mod busbw;
pub mod network;
pub mod topology;

pub use argument::{ArgError, Opts};
pub use busbw::{BusBandwidth, Collective, Group, GroupBandwidth, ProfileError};
pub use network::{GpuType, NetworkParams};
pub use topology::TopologyError;

lazy_static! {
    static ref RUN_CONFIG: Mutex<RunConfig> = Mutex::new(RunConfig::default());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeType {
    None,
    FullSim,
    MockCollective,
    Analytical,
}

impl std::default::Default for ModeType {
    fn default() -> Self {
        Self::MockCollective
    }
}

#[derive(Debug, Clone, Error)]
#[error("unknown simulation mode: {0}, expect one of none, full_sim, mock_collective, analytical")]
pub struct ParseModeError(String);

impl std::str::FromStr for ModeType {
    type Err = ParseModeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(ModeType::None),
            "full_sim" => Ok(ModeType::FullSim),
            "mock_collective" => Ok(ModeType::MockCollective),
            "analytical" => Ok(ModeType::Analytical),
            _ => Err(ParseModeError(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    /// Number of simulation threads
    pub thread: usize,
    /// Requested GPU counts, the first one drives the derived topology
    pub gpus: Vec<u32>,
    /// Workload names or paths
    pub workload: Vec<String>,
    /// Result output paths
    pub result: Vec<String>,
    /// Communication size multiplier
    pub comm_scale: u32,
    pub mode: ModeType,
    // keep the nested table last, toml refuses values after tables
    pub network: NetworkParams,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            thread: 1,
            gpus: Vec::new(),
            workload: Vec::new(),
            result: Vec::new(),
            comm_scale: 1,
            mode: ModeType::default(),
            network: NetworkParams::default(),
        }
    }
}

impl RunConfig {
    /// Render the configuration as TOML, the format the `simparam` binary prints.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// The process-wide configuration store, created on first access.
pub fn instance() -> &'static Mutex<RunConfig> {
    &*RUN_CONFIG
}

/// Lock the process-wide configuration.
pub fn config() -> MutexGuard<'static, RunConfig> {
    RUN_CONFIG.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Replace the process-wide configuration, typically right after parsing.
pub fn install(run_config: RunConfig) {
    *config() = run_config;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.thread, 1);
        assert_eq!(cfg.comm_scale, 1);
        assert_eq!(cfg.mode, ModeType::MockCollective);
        assert!(cfg.gpus.is_empty() && cfg.workload.is_empty() && cfg.result.is_empty());
    }

    #[test]
    fn parse_mode() {
        assert_eq!("analytical".parse::<ModeType>().unwrap(), ModeType::Analytical);
        assert_eq!("FULL_SIM".parse::<ModeType>().unwrap(), ModeType::FullSim);
        assert!("ns3".parse::<ModeType>().is_err());
    }
}
