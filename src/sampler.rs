//! Collection of kernel CPU and virtual-memory counters into in-memory time series.
//!
//! The [`Sampler`] owns every series and the collection state. A background
//! task reads the [`CounterSource`] once per interval and appends one sample to
//! every series; the foreground reads snapshots, exports, and imports.

use std::{fmt, str::FromStr};

pub mod engine;
pub mod error;
pub mod series;
pub mod source;

pub use engine::{CollectionState, ErrorPolicy, ExportMode, ImportedFiles, Sampler, SamplerSettings, SamplerStatus};
pub use error::CollectError;
pub use series::{SeriesStore, SeriesTable};
pub use source::{CPU_KEYS, CounterSource, CpuCounters, ProcFs, VmCounters};

/// The two counter namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Cpu,
    Vmstat,
}

impl Family {
    pub const ALL: [Family; 2] = [Family::Cpu, Family::Vmstat];

    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Cpu => "cpu",
            Family::Vmstat => "vmstat",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = CollectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(Family::Cpu),
            "vmstat" => Ok(Family::Vmstat),
            other => Err(CollectError::UnknownFamily(other.to_string())),
        }
    }
}
