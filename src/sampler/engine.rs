use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use chrono::{DateTime, Local};
use log::*;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::{select, sync::oneshot, task, time::sleep};
use uuid::Uuid;

use crate::{
    codec,
    sampler::{CollectError, CounterSource, Family, SeriesStore, series::deltas},
};

/// What the sampling loop does when a tick cannot read its sources.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// End the run, keeping everything collected so far.
    #[default]
    Stop,
    /// Log the failure and try again next interval, leaving a gap.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerSettings {
    /// Delay between the end of one tick and the start of the next.
    pub interval: Duration,
    pub on_error: ErrorPolicy,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            on_error: ErrorPolicy::Stop,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    Absolute,
    Delta,
}

impl ExportMode {
    /// Short name used as the exported file prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            ExportMode::Absolute => "abs",
            ExportMode::Delta => "diff",
        }
    }
}

impl FromStr for ExportMode {
    type Err = CollectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abs" | "absolute" => Ok(ExportMode::Absolute),
            "diff" | "delta" => Ok(ExportMode::Delta),
            other => Err(CollectError::UnknownMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionState {
    Idle,
    Collecting { run: Uuid, started: DateTime<Local> },
}

impl CollectionState {
    fn is_run(&self, id: Uuid) -> bool {
        matches!(self, CollectionState::Collecting { run, .. } if *run == id)
    }
}

/// The pair of files most recently imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedFiles {
    pub cpu: PathBuf,
    pub vm: PathBuf,
}

impl fmt::Display for ImportedFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.cpu.display(), self.vm.display())
    }
}

/// Point-in-time view of the sampler for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerStatus {
    pub state: CollectionState,
    pub imported: Option<ImportedFiles>,
    pub samples: usize,
    pub vm_keys: usize,
}

/// Rows of one export file. Raw counters stay unsigned; differences are signed.
enum ExportRows<'a> {
    Absolute(Vec<(&'a str, u64)>),
    Delta(Vec<(&'a str, i64)>),
}

#[derive(Debug)]
struct Shared {
    store: SeriesStore,
    state: CollectionState,
    imported: Option<ImportedFiles>,
    /// Dropping this tells the running loop to finish.
    closer: Option<oneshot::Receiver<()>>,
}

/// Owns every counter series and the background sampling loop.
///
/// All series and the collection state sit behind one lock. A tick reads its
/// sources without the lock and appends under a single acquisition, so readers
/// see all of a tick or none of it.
pub struct Sampler {
    shared: Arc<Mutex<Shared>>,
    source: Arc<dyn CounterSource>,
    settings: Mutex<SamplerSettings>,
}

impl fmt::Debug for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sampler")
            .field("shared", &self.shared)
            .field("settings", &self.settings)
            .finish()
    }
}

impl Sampler {
    pub fn new(source: Arc<dyn CounterSource>, settings: SamplerSettings) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                store: SeriesStore::default(),
                state: CollectionState::Idle,
                imported: None,
                closer: None,
            })),
            source,
            settings: Mutex::new(settings),
        }
    }

    /// Replace the settings used by the next [`start`](Self::start).
    pub fn configure(&self, settings: SamplerSettings) {
        *self.settings.lock() = settings;
    }

    /// Begin a collection run on a background task.
    ///
    /// Returns `false` without doing anything if a run is already active.
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut shared = self.shared.lock();
        if let CollectionState::Collecting { run, .. } = &shared.state {
            debug!(target: "Sampler", "Run {} already collecting", run);
            return false;
        }
        let settings = *self.settings.lock();
        let run = Uuid::new_v4();
        let (closed, closer) = oneshot::channel();
        shared.state = CollectionState::Collecting {
            run,
            started: Local::now(),
        };
        shared.closer = Some(closer);
        info!(target: "Sampler", "Starting run {} every {:?}", run, settings.interval);
        tokio::spawn(sampling_loop(
            run,
            self.shared.clone(),
            self.source.clone(),
            settings,
            closed,
        ));
        true
    }

    /// Ask the loop to finish after its current tick and go idle.
    ///
    /// No sample from the stopped run is appended once this returns.
    pub fn stop(&self) -> bool {
        let mut shared = self.shared.lock();
        drop(shared.closer.take());
        match std::mem::replace(&mut shared.state, CollectionState::Idle) {
            CollectionState::Collecting { run, .. } => {
                info!(target: "Sampler", "Stopping run {}", run);
                true
            }
            CollectionState::Idle => false,
        }
    }

    pub fn is_collecting(&self) -> bool {
        matches!(self.shared.lock().state, CollectionState::Collecting { .. })
    }

    pub fn status(&self) -> SamplerStatus {
        let shared = self.shared.lock();
        SamplerStatus {
            state: shared.state.clone(),
            imported: shared.imported.clone(),
            samples: shared.store.samples(),
            vm_keys: shared.store.table(Family::Vmstat).len(),
        }
    }

    /// Copy of every series.
    pub fn snapshot(&self) -> SeriesStore {
        self.shared.lock().store.clone()
    }

    pub fn list_keys(&self, family: Family) -> Vec<String> {
        self.shared
            .lock()
            .store
            .table(family)
            .keys()
            .map(str::to_string)
            .collect()
    }

    pub fn get_series(&self, family: Family, key: &str) -> Result<Vec<u64>, CollectError> {
        self.shared
            .lock()
            .store
            .get(family, key)
            .map(<[u64]>::to_vec)
    }

    /// Write both families to two `category,value` files.
    ///
    /// Delta mode rewrites each series relative to its first sample on the way
    /// out; the stored series are untouched.
    pub fn export(&self, mode: ExportMode, cpu_path: &Path, vm_path: &Path) -> Result<(), CollectError> {
        let store = self.snapshot();
        let mut outputs = Vec::with_capacity(2);
        for (family, path) in [(Family::Cpu, cpu_path), (Family::Vmstat, vm_path)] {
            let table = store.table(family);
            let rows = match mode {
                ExportMode::Absolute => ExportRows::Absolute(
                    table
                        .iter()
                        .flat_map(|(key, values)| values.iter().map(move |v| (key, *v)))
                        .collect(),
                ),
                ExportMode::Delta => {
                    let mut rows = Vec::new();
                    for (key, values) in table.iter() {
                        rows.extend(deltas(family, key, values)?.into_iter().map(|v| (key, v)));
                    }
                    ExportRows::Delta(rows)
                }
            };
            outputs.push((path, rows));
        }
        for (path, rows) in outputs {
            match rows {
                ExportRows::Absolute(rows) => codec::write_rows(path, rows)?,
                ExportRows::Delta(rows) => codec::write_rows(path, rows)?,
            }
            info!(target: "Sampler", "Exported {:?} data to {}", mode, path.display());
        }
        Ok(())
    }

    /// Append every row of two exported files onto the stored series.
    ///
    /// The CPU file is applied before the VM file is read, so a failure on the
    /// second file leaves the first one imported.
    pub fn import(&self, cpu_path: &Path, vm_path: &Path) -> Result<(), CollectError> {
        for (family, path) in [(Family::Cpu, cpu_path), (Family::Vmstat, vm_path)] {
            let rows = codec::read_rows::<u64>(path)?;
            self.shared.lock().store.append_rows(family, &rows)?;
            debug!(target: "Sampler", "Imported {} {} rows from {}", rows.len(), family, path.display());
        }
        self.shared.lock().imported = Some(ImportedFiles {
            cpu: cpu_path.to_path_buf(),
            vm: vm_path.to_path_buf(),
        });
        Ok(())
    }
}

/// Read both sources and append them, provided `run` is still the active run.
///
/// Returns `Ok(false)` when the run has been stopped in the meantime.
/// The file reads run on the blocking pool.
async fn tick(run: Uuid, shared: &Mutex<Shared>, source: &Arc<dyn CounterSource>) -> Result<bool, CollectError> {
    let source = source.clone();
    let (cpu, vm) = task::spawn_blocking(move || -> Result<_, CollectError> {
        Ok((source.read_cpu()?, source.read_vm()?))
    })
    .await
    .map_err(|e| CollectError::Interrupted(e.to_string()))??;
    let mut shared = shared.lock();
    if !shared.state.is_run(run) {
        return Ok(false);
    }
    shared.store.append_tick(&cpu, &vm);
    Ok(true)
}

async fn sampling_loop(
    run: Uuid,
    shared: Arc<Mutex<Shared>>,
    source: Arc<dyn CounterSource>,
    settings: SamplerSettings,
    mut closed: oneshot::Sender<()>,
) {
    loop {
        match tick(run, &shared, &source).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => match settings.on_error {
                ErrorPolicy::Stop => {
                    let mut shared = shared.lock();
                    if shared.state.is_run(run) {
                        shared.state = CollectionState::Idle;
                        shared.closer = None;
                        error!(target: "Sampler", "Run {} stopped: {}", run, err);
                    }
                    break;
                }
                ErrorPolicy::Skip => warn!(target: "Sampler", "Skipped a sample: {}", err),
            },
        }
        select! {
            _ = sleep(settings.interval) => {}
            _ = closed.closed() => break,
        }
    }
    debug!(target: "Sampler", "Sampling loop for run {} exiting", run);
}
