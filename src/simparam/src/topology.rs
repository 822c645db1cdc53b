use thiserror::Error;

use crate::network::NetworkParams;

/// Fixed part of the derived switch count, `gpus_per_server` is added on top.
pub const BASE_SWITCH_NUM: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("gpus per server is not set, cannot place {0} GPUs")]
    ZeroGpusPerServer(u32),
    #[error("{gpus} GPUs with {gpus_per_server} GPUs per server overflow the node count")]
    Overflow { gpus: u32, gpus_per_server: u32 },
}

/// Derive the switch and node counts of a cluster with `gpus` GPUs.
///
/// ```text
/// nvswitch_num = gpus / gpus_per_server
/// switch_num   = 120 + gpus_per_server
/// node_num     = nvswitch_num + switch_num + gpus
/// ```
pub fn derive_topology(params: &mut NetworkParams, gpus: u32) -> Result<(), TopologyError> {
    let gpus_per_server = params.gpus_per_server;
    let overflow = TopologyError::Overflow {
        gpus,
        gpus_per_server,
    };

    let nvswitch_num = gpus
        .checked_div(gpus_per_server)
        .ok_or(TopologyError::ZeroGpusPerServer(gpus))?;
    let switch_num = BASE_SWITCH_NUM
        .checked_add(gpus_per_server)
        .ok_or(overflow)?;
    let node_num = nvswitch_num
        .checked_add(switch_num)
        .and_then(|n| n.checked_add(gpus))
        .ok_or(overflow)?;

    params.nvswitch_num = nvswitch_num;
    params.switch_num = switch_num;
    params.node_num = node_num;
    log::debug!(
        "derived topology: nvswitch_num = {}, switch_num = {}, node_num = {}",
        nvswitch_num,
        switch_num,
        node_num
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive(gpus: u32, gpus_per_server: u32) -> Result<NetworkParams, TopologyError> {
        let mut params = NetworkParams {
            gpus_per_server,
            ..Default::default()
        };
        derive_topology(&mut params, gpus)?;
        Ok(params)
    }

    #[test]
    fn eight_gpus() {
        let params = derive(8, 4).unwrap();
        assert_eq!(params.nvswitch_num, 2);
        assert_eq!(params.switch_num, 124);
        assert_eq!(params.node_num, 134);
    }

    #[test]
    fn integer_division() {
        for &(g, p) in &[(1, 8), (10, 8), (128, 8), (4096, 16), (7, 3)] {
            let params = derive(g, p).unwrap();
            assert_eq!(params.nvswitch_num, g / p);
            assert_eq!(params.switch_num, 120 + p);
            assert_eq!(params.node_num, g / p + 120 + p + g);
        }
    }

    #[test]
    fn zero_gpus_per_server() {
        let mut params = NetworkParams::default();
        assert_eq!(
            derive_topology(&mut params, 8),
            Err(TopologyError::ZeroGpusPerServer(8))
        );
        assert_eq!(params, NetworkParams::default());
    }

    #[test]
    fn overflow() {
        assert!(matches!(
            derive(u32::MAX, 1),
            Err(TopologyError::Overflow { .. })
        ));
        assert!(matches!(
            derive(1, u32::MAX),
            Err(TopologyError::Overflow { .. })
        ));
    }
}
