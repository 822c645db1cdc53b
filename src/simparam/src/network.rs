use serde::Serialize;
use thiserror::Error;

use crate::busbw::BusBandwidth;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GpuType {
    A100,
    A800,
    H100,
    H800,
    H20,
    None,
}

impl std::default::Default for GpuType {
    fn default() -> Self {
        Self::None
    }
}

#[derive(Debug, Clone, Error)]
#[error("unknown gpu type: {0}, expect one of A100, A800, H100, H800, H20")]
pub struct ParseGpuTypeError(String);

impl std::str::FromStr for GpuType {
    type Err = ParseGpuTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A100" => Ok(GpuType::A100),
            "A800" => Ok(GpuType::A800),
            "H100" => Ok(GpuType::H100),
            "H800" => Ok(GpuType::H800),
            "H20" => Ok(GpuType::H20),
            "NONE" => Ok(GpuType::None),
            _ => Err(ParseGpuTypeError(s.to_owned())),
        }
    }
}

/// Network description handed to the simulation engine.
///
/// All counters default to zero, which means unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkParams {
    pub node_num: u32,
    pub switch_num: u32,
    pub link_num: u32,
    pub trace_num: u32,
    pub nvswitch_num: u32,
    pub gpus_per_server: u32,
    pub nics_per_server: u32,
    pub nvlink_bw: u32,
    pub nic_bw: u32,
    pub gpu_type: GpuType,
    /// Switch ids, filled when the topology is built.
    pub nvswitches: Vec<usize>,
    /// GPU ids grouped by server, filled when the topology is built.
    pub all_gpus: Vec<Vec<usize>>,
    pub bus_bw: BusBandwidth,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_gpu_type() {
        assert_eq!("h100".parse::<GpuType>().unwrap(), GpuType::H100);
        assert_eq!("A800".parse::<GpuType>().unwrap(), GpuType::A800);
        assert!("V100".parse::<GpuType>().is_err());
    }
}
