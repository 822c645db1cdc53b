use std::path::PathBuf;

use log::info;
use structopt::clap::ErrorKind;
use structopt::StructOpt;
use thiserror::Error;

use crate::busbw::{self, ProfileError};
use crate::network::GpuType;
use crate::topology::{self, TopologyError};
use crate::{ModeType, RunConfig};

#[derive(Debug, Clone, StructOpt)]
#[structopt(name = "simparam", about = "Network simulator runtime parameters")]
pub struct Opts {
    /// Workloads, default none
    #[structopt(short = "w", long = "workload", number_of_values = 1)]
    pub workload: Vec<String>,

    /// Number of GPUs, the first one is used to derive the topology
    #[structopt(short = "g", long = "gpus", number_of_values = 1)]
    pub gpus: Vec<u32>,

    /// GPUs per server, also accepted as -g_p_s
    #[structopt(long = "gpus-per-server")]
    pub gpus_per_server: Option<u32>,

    /// NICs per server, also accepted as -n_p_s
    #[structopt(long = "nics-per-server")]
    pub nics_per_server: Option<u32>,

    /// NVLink bandwidth, also accepted as -nv
    #[structopt(long = "nvlink-bandwidth")]
    pub nvlink_bw: Option<u32>,

    /// NIC bandwidth, also accepted as -nic
    #[structopt(long = "nic-bandwidth")]
    pub nic_bw: Option<u32>,

    /// GPU type (A100, A800, H100, H800, H20), also accepted as -g_type
    #[structopt(long = "gpu-type")]
    pub gpu_type: Option<GpuType>,

    /// Output results path
    #[structopt(short = "r", long = "result", number_of_values = 1)]
    pub result: Vec<String>,

    /// Bus bandwidth file, also accepted as -busbw
    #[structopt(long = "bus-bandwidth", number_of_values = 1, parse(from_os_str))]
    pub bus_bandwidth: Vec<PathBuf>,

    /// Number of simulation threads, default 1
    #[structopt(short = "t", long = "thread")]
    pub thread: Option<usize>,

    /// Communication scale, default 1
    #[structopt(short = "c", long = "comm-scale")]
    pub comm_scale: Option<u32>,

    /// Simulation mode (none, full_sim, mock_collective, analytical), default mock_collective
    #[structopt(short = "m", long = "mode")]
    pub mode: Option<ModeType>,
}

#[derive(Debug, Error)]
pub enum ArgError {
    #[error("{0}")]
    Help(String),
    #[error("unrecognized flag: {0}")]
    UnknownFlag(String),
    #[error("{0}")]
    InvalidValue(String),
    #[error("bus bandwidth profile: {0}")]
    Profile(#[from] ProfileError),
    #[error("topology: {0}")]
    Topology(#[from] TopologyError),
}

impl ArgError {
    /// Help and unrecognized flags share exit code 1, like the legacy tool.
    pub fn exit_code(&self) -> i32 {
        match self {
            ArgError::Help(_) | ArgError::UnknownFlag(_) => 1,
            _ => 2,
        }
    }
}

struct Flag {
    long: &'static str,
    aliases: &'static [&'static str],
    repeated: bool,
}

const HELP_FLAGS: [&str; 2] = ["--help", "-h"];

#[rustfmt::skip]
const FLAGS: &[Flag] = &[
    Flag { long: "--workload", aliases: &["-w"], repeated: true },
    Flag { long: "--gpus", aliases: &["-g"], repeated: true },
    Flag { long: "--result", aliases: &["-r"], repeated: true },
    Flag { long: "--gpus-per-server", aliases: &["-g_p_s"], repeated: false },
    Flag { long: "--bus-bandwidth", aliases: &["-busbw"], repeated: true },
    Flag { long: "--nics-per-server", aliases: &["-n_p_s"], repeated: false },
    Flag { long: "--nvlink-bandwidth", aliases: &["-nv"], repeated: false },
    Flag { long: "--nic-bandwidth", aliases: &["-nic"], repeated: false },
    Flag { long: "--gpu-type", aliases: &["-g_type"], repeated: false },
    Flag { long: "--thread", aliases: &["-t"], repeated: false },
    Flag { long: "--comm-scale", aliases: &["-c"], repeated: false },
    Flag { long: "--mode", aliases: &["-m"], repeated: false },
];

#[derive(Debug, PartialEq)]
enum Scan {
    Help,
    Args(Vec<String>),
}

/// Rewrite legacy flags into `--long=value` tokens structopt understands.
///
/// Every flag takes the next token as its value, whatever it looks like.
/// A flag left without a value at the end is dropped, and for single
/// valued flags the last occurrence wins.
fn scan<I, S>(args: I) -> Result<Scan, ArgError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out = vec![env!("CARGO_PKG_NAME").to_owned()];
    let mut tokens = args.into_iter().map(Into::into);

    while let Some(tok) = tokens.next() {
        if HELP_FLAGS.contains(&tok.as_str()) {
            return Ok(Scan::Help);
        }
        let flag = FLAGS
            .iter()
            .find(|f| f.long == tok || f.aliases.contains(&tok.as_str()))
            .ok_or_else(|| ArgError::UnknownFlag(tok.clone()))?;
        let value = match tokens.next() {
            Some(v) => v,
            None => break,
        };
        if !flag.repeated {
            let prefix = format!("{}=", flag.long);
            out.retain(|t| !t.starts_with(&prefix));
        }
        out.push(format!("{}={}", flag.long, value));
    }

    Ok(Scan::Args(out))
}

/// The text printed for `--help`.
pub fn usage() -> String {
    match Opts::from_iter_safe(vec![env!("CARGO_PKG_NAME"), "--help"]) {
        Err(e) => e.message,
        Ok(_) => String::new(),
    }
}

impl Opts {
    /// Parse arguments, not including the program name.
    pub fn from_args_legacy<I, S>(args: I) -> Result<Opts, ArgError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv = match scan(args)? {
            Scan::Help => return Err(ArgError::Help(usage())),
            Scan::Args(argv) => argv,
        };
        Opts::from_iter_safe(argv).map_err(|e| match e.kind {
            ErrorKind::HelpDisplayed => ArgError::Help(e.message),
            _ => ArgError::InvalidValue(e.message),
        })
    }

    /// Merge the options into `cfg`, load the profiles and derive the topology.
    pub fn apply(self, cfg: &mut RunConfig) -> Result<(), ArgError> {
        cfg.workload.extend(self.workload);
        cfg.gpus.extend(self.gpus);
        cfg.result.extend(self.result);
        if let Some(thread) = self.thread {
            cfg.thread = thread;
        }
        if let Some(comm_scale) = self.comm_scale {
            cfg.comm_scale = comm_scale;
        }
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }

        let net = &mut cfg.network;
        if let Some(n) = self.gpus_per_server {
            net.gpus_per_server = n;
        }
        if let Some(n) = self.nics_per_server {
            net.nics_per_server = n;
        }
        if let Some(bw) = self.nvlink_bw {
            net.nvlink_bw = bw;
        }
        if let Some(bw) = self.nic_bw {
            net.nic_bw = bw;
        }
        if let Some(gpu_type) = self.gpu_type {
            net.gpu_type = gpu_type;
        }

        for path in &self.bus_bandwidth {
            info!("loading bus bandwidth profile {}", path.display());
            busbw::load_profile(&mut net.bus_bw, path)?;
        }

        if let Some(&gpus) = cfg.gpus.first() {
            topology::derive_topology(&mut cfg.network, gpus)?;
        }

        Ok(())
    }
}

impl RunConfig {
    /// Parse command line arguments, not including the program name.
    ///
    /// On error `self` is left as it was.
    pub fn parse<I, S>(&mut self, args: I) -> Result<(), ArgError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let opts = Opts::from_args_legacy(args)?;
        let mut next = self.clone();
        opts.apply(&mut next)?;
        *self = next;
        Ok(())
    }
}
