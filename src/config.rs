//! Provides a ConfigManager to read and refresh config from files.
//!

use color_eyre::Result;
use log::*;
use notify::{RecommendedWatcher, Watcher};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    event::{AppEvent, Event},
    sampler::{ErrorPolicy, ProcFs, SamplerSettings, source},
};

pub const DEFAULT_FILE: &str = "memprof.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemprofConfig {
    /// Milliseconds between the end of one sample and the start of the next
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default)]
    pub on_error: ErrorPolicy,
    #[serde(default = "default_stat_path")]
    pub stat_path: PathBuf,
    #[serde(default = "default_vmstat_path")]
    pub vmstat_path: PathBuf,
    #[serde(default = "default_plot_dir")]
    pub plot_dir: PathBuf,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    /// `family.key` items shown live on the dashboard
    #[serde(default = "default_watch")]
    pub watch: Vec<String>,
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_stat_path() -> PathBuf {
    source::DEFAULT_STAT_PATH.into()
}

fn default_vmstat_path() -> PathBuf {
    source::DEFAULT_VMSTAT_PATH.into()
}

fn default_plot_dir() -> PathBuf {
    "plot".into()
}

fn default_data_dir() -> PathBuf {
    "data".into()
}

fn default_watch() -> Vec<String> {
    ["cpu.user", "cpu.system", "cpu.iowait", "vmstat.pgfault"]
        .map(String::from)
        .to_vec()
}

fn default_log_file() -> String {
    "memprof.log".to_string()
}

impl Default for MemprofConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            on_error: ErrorPolicy::default(),
            stat_path: default_stat_path(),
            vmstat_path: default_vmstat_path(),
            plot_dir: default_plot_dir(),
            data_dir: default_data_dir(),
            font_path: None,
            watch: default_watch(),
            log_file: default_log_file(),
        }
    }
}

impl MemprofConfig {
    pub fn sampler_settings(&self) -> SamplerSettings {
        SamplerSettings {
            interval: Duration::from_millis(self.interval_ms),
            on_error: self.on_error,
        }
    }

    pub fn source(&self) -> ProcFs {
        ProcFs::new(&self.stat_path, &self.vmstat_path)
    }
}

#[derive(Debug)]
pub struct ConfigManager {
    pub file_path: PathBuf,
    config: MemprofConfig,
    _watcher: Option<RecommendedWatcher>,
}

impl ConfigManager {
    /// Load the config and, if the file exists, reload on every change to it.
    pub fn new(file_path: PathBuf, sender: UnboundedSender<Event>) -> Result<ConfigManager> {
        let config = Self::load_from_file(&file_path)?;
        let watcher = if file_path.exists() {
            let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
                if matches!(res, Ok(event) if event.kind.is_modify() || event.kind.is_create()) {
                    let _ = sender.send(Event::App(AppEvent::Reload));
                }
            })?;
            info!(target: "Config", "Watching file {:?}", file_path);
            watcher.watch(&file_path, notify::RecursiveMode::NonRecursive)?;
            Some(watcher)
        } else {
            info!(target: "Config", "No file at {:?}, using defaults", file_path);
            None
        };
        Ok(ConfigManager {
            file_path,
            config,
            _watcher: watcher,
        })
    }

    pub fn current(&self) -> MemprofConfig {
        self.config.clone()
    }

    pub fn reload(&mut self) -> Result<MemprofConfig> {
        self.config = Self::load_from_file(&self.file_path)?;
        Ok(self.current())
    }

    /// The file is optional; `MEMPROF_*` environment variables override it.
    pub fn load_from_file(file_path: &Path) -> Result<MemprofConfig> {
        let raw = config::Config::builder()
            .add_source(config::File::from(file_path).required(false))
            .add_source(
                config::Environment::with_prefix("MEMPROF")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("watch"),
            )
            .build()?;
        Ok(raw.try_deserialize()?)
    }
}
