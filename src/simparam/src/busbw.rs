//! Bus bandwidth profiles.
//!
//! A profile records the bandwidth each collective achieves inside the
//! tensor, data and expert parallel groups. The file looks like YAML but
//! only this subset is understood:
//!
//! ```text
//! <header, always skipped>
//! TP:
//!   allreduce: 12.5
//!   allgather: null
//! DP:
//!   alltoall: 4.2  # anything after the value is ignored
//! ```
use std::io::BufRead;
use std::path::Path;

use log::{debug, error};
use serde::Serialize;
use thiserror::Error;

/// How consumers that predate `Option` encode a missing bandwidth.
pub const UNSET_BANDWIDTH: f32 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Tp,
    Dp,
    Ep,
}

impl Group {
    pub fn from_section(name: &str) -> Option<Self> {
        match name {
            "TP" => Some(Group::Tp),
            "DP" => Some(Group::Dp),
            "EP" => Some(Group::Ep),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collective {
    AllReduce,
    AllGather,
    ReduceScatter,
    AllToAll,
}

impl Collective {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "allreduce" => Some(Collective::AllReduce),
            "allgather" => Some(Collective::AllGather),
            "reducescatter" => Some(Collective::ReduceScatter),
            "alltoall" => Some(Collective::AllToAll),
            _ => None,
        }
    }
}

/// Bandwidths of one parallel group. `None` means the profile did not provide it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GroupBandwidth {
    pub allreduce: Option<f32>,
    pub allgather: Option<f32>,
    pub reducescatter: Option<f32>,
    pub alltoall: Option<f32>,
}

impl GroupBandwidth {
    #[inline]
    pub fn get(&self, op: Collective) -> Option<f32> {
        match op {
            Collective::AllReduce => self.allreduce,
            Collective::AllGather => self.allgather,
            Collective::ReduceScatter => self.reducescatter,
            Collective::AllToAll => self.alltoall,
        }
    }

    #[inline]
    pub fn slot_mut(&mut self, op: Collective) -> &mut Option<f32> {
        match op {
            Collective::AllReduce => &mut self.allreduce,
            Collective::AllGather => &mut self.allgather,
            Collective::ReduceScatter => &mut self.reducescatter,
            Collective::AllToAll => &mut self.alltoall,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BusBandwidth {
    pub tp: GroupBandwidth,
    pub dp: GroupBandwidth,
    pub ep: GroupBandwidth,
}

impl BusBandwidth {
    #[inline]
    pub fn group(&self, group: Group) -> &GroupBandwidth {
        match group {
            Group::Tp => &self.tp,
            Group::Dp => &self.dp,
            Group::Ep => &self.ep,
        }
    }

    #[inline]
    pub fn get(&self, group: Group, op: Collective) -> Option<f32> {
        self.group(group).get(op)
    }

    /// Same as `get` but returns [`UNSET_BANDWIDTH`] for a missing value.
    #[inline]
    pub fn get_or_unset(&self, group: Group, op: Collective) -> f32 {
        self.get(group, op).unwrap_or(UNSET_BANDWIDTH)
    }

    pub fn slot_mut(&mut self, group: Group, op: Collective) -> &mut Option<f32> {
        let g = match group {
            Group::Tp => &mut self.tp,
            Group::Dp => &mut self.dp,
            Group::Ep => &mut self.ep,
        };
        g.slot_mut(op)
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("invalid bandwidth {value:?} for key {key:?} at line {line}")]
    InvalidValue {
        line: usize,
        key: String,
        value: String,
    },
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Comment,
    Section(&'a str),
    Entry { key: &'a str, value: &'a str },
    Malformed,
}

impl<'a> Line<'a> {
    fn classify(raw: &'a str) -> Self {
        // a tab after the colon does not turn a key into a section
        let line = raw.trim_end_matches(|c| c == ' ' || c == '\r').trim_start();
        if line.is_empty() {
            return Line::Blank;
        }
        if line.starts_with('#') {
            return Line::Comment;
        }
        if let Some(name) = line.strip_suffix(':') {
            return Line::Section(name.trim());
        }

        let (key, rest) = match line.split_once(':') {
            Some(kv) => kv,
            None => return Line::Malformed,
        };
        let value = match rest.split_whitespace().next() {
            Some(v) => v,
            None => return Line::Malformed,
        };
        // "allreduce, 8 ranks: 12.5" keeps only "allreduce"
        let key = key.split_once(',').map_or(key, |(k, _)| k).trim();
        Line::Entry { key, value }
    }
}

/// Parse a profile value. Out of range numbers such as `1e50` are
/// rejected, only a literal `inf` or `nan` gives a non-finite bandwidth.
fn parse_bandwidth(token: &str) -> Option<f32> {
    let bw: f32 = token.parse().ok()?;
    if bw.is_finite() {
        return Some(bw);
    }
    let word = token.trim_start_matches(|c| c == '+' || c == '-').to_ascii_lowercase();
    if word.starts_with("inf") || word == "nan" {
        Some(bw)
    } else {
        None
    }
}

/// Fill `bus_bw` from a profile. The first line is a header and is skipped.
///
/// Unknown sections, unknown keys and malformed lines are skipped, but a
/// value that is neither `null` nor a number aborts the whole parse.
pub fn parse_profile<R: BufRead>(
    bus_bw: &mut BusBandwidth,
    reader: R,
) -> Result<(), ProfileError> {
    let mut section = String::new();

    for (i, bytes) in reader.split(b'\n').enumerate().skip(1) {
        let bytes = bytes?;
        let line = String::from_utf8_lossy(&bytes);
        let lineno = i + 1;
        match Line::classify(&line) {
            Line::Blank | Line::Comment => {}
            Line::Section(name) => {
                if Group::from_section(name).is_none() {
                    debug!("unknown section {:?} at line {}", name, lineno);
                }
                section = name.to_owned();
            }
            Line::Entry { value: "null", .. } => {}
            Line::Entry { key, value } => {
                let bw = parse_bandwidth(value).ok_or_else(|| ProfileError::InvalidValue {
                    line: lineno,
                    key: key.to_owned(),
                    value: value.to_owned(),
                })?;
                match Group::from_section(&section).zip(Collective::from_key(key)) {
                    Some((group, op)) => *bus_bw.slot_mut(group, op) = Some(bw),
                    None => debug!("ignoring {}.{} at line {}", section, key, lineno),
                }
            }
            Line::Malformed => debug!("skipping malformed line {}: {:?}", lineno, line),
        }
    }

    Ok(())
}

/// Load a profile file into `bus_bw`.
///
/// A file that cannot be opened is logged and leaves `bus_bw` untouched.
pub fn load_profile<P: AsRef<Path>>(
    bus_bw: &mut BusBandwidth,
    path: P,
) -> Result<(), ProfileError> {
    let path = path.as_ref();
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            error!("unable to open bus bandwidth file {}: {}", path.display(), e);
            return Ok(());
        }
    };
    parse_profile(bus_bw, std::io::BufReader::new(file))
}
