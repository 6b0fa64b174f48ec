use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use crate::sampler::CollectError;

pub const DEFAULT_STAT_PATH: &str = "/proc/stat";
pub const DEFAULT_VMSTAT_PATH: &str = "/proc/vmstat";

/// Fields of the aggregate `cpu` line, in kernel column order.
pub const CPU_KEYS: [&str; 10] = [
    "user",
    "nice",
    "system",
    "idle",
    "iowait",
    "irq",
    "softirq",
    "steal",
    "guest",
    "guest_nice",
];

/// One reading of the aggregate CPU line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuCounters {
    values: [u64; 10],
}

impl CpuCounters {
    pub fn new(values: [u64; 10]) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        CPU_KEYS
            .iter()
            .position(|k| *k == key)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        CPU_KEYS.iter().copied().zip(self.values.iter().copied())
    }
}

/// One reading of the vmstat file, in file order.
pub type VmCounters = Vec<(String, u64)>;

/// Somewhere the two counter families can be read from.
///
/// Implementations must be cheap to call once per tick and must not retry:
/// the sampler decides what a failed read means for the run.
pub trait CounterSource: Send + Sync {
    fn read_cpu(&self) -> Result<CpuCounters, CollectError>;
    fn read_vm(&self) -> Result<VmCounters, CollectError>;
}

/// Reads the kernel's procfs counter files.
#[derive(Debug, Clone)]
pub struct ProcFs {
    stat_path: PathBuf,
    vmstat_path: PathBuf,
}

impl ProcFs {
    pub fn new(stat_path: impl Into<PathBuf>, vmstat_path: impl Into<PathBuf>) -> Self {
        Self {
            stat_path: stat_path.into(),
            vmstat_path: vmstat_path.into(),
        }
    }
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new(DEFAULT_STAT_PATH, DEFAULT_VMSTAT_PATH)
    }
}

impl CounterSource for ProcFs {
    fn read_cpu(&self) -> Result<CpuCounters, CollectError> {
        let content = read(&self.stat_path)?;
        parse_stat(&content, &self.stat_path.display().to_string())
    }

    fn read_vm(&self) -> Result<VmCounters, CollectError> {
        let content = read(&self.vmstat_path)?;
        parse_vmstat(&content, &self.vmstat_path.display().to_string())
    }
}

fn read(path: &Path) -> Result<String, CollectError> {
    fs::read_to_string(path).map_err(|e| CollectError::io(path, e))
}

/// Parse the first line of `/proc/stat`.
///
/// The leading `cpu` label is skipped and the next ten columns are mapped onto
/// [`CPU_KEYS`]. Extra columns from newer kernels are ignored.
pub fn parse_stat(content: &str, origin: &str) -> Result<CpuCounters, CollectError> {
    let line = content
        .lines()
        .next()
        .ok_or_else(|| CollectError::parse(origin, "empty file"))?;
    let fields: Vec<&str> = line.split_whitespace().skip(1).collect();
    if fields.len() < CPU_KEYS.len() {
        return Err(CollectError::parse(
            origin,
            format!(
                "expected {} counters on the first line, found {}",
                CPU_KEYS.len(),
                fields.len()
            ),
        ));
    }
    let mut values = [0u64; 10];
    for (i, field) in fields.iter().take(CPU_KEYS.len()).enumerate() {
        values[i] = field.parse().map_err(|_| {
            CollectError::parse(origin, format!("{} is not a counter: {:?}", CPU_KEYS[i], field))
        })?;
    }
    Ok(CpuCounters::new(values))
}

/// Parse every `key value` line of `/proc/vmstat`.
pub fn parse_vmstat(content: &str, origin: &str) -> Result<VmCounters, CollectError> {
    let mut seen = HashSet::new();
    let mut counters = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CollectError::parse(
                origin,
                format!("line {} is not a key/value pair: {:?}", number + 1, line),
            ));
        };
        let value = value.parse().map_err(|_| {
            CollectError::parse(origin, format!("line {}: {} is not a counter", number + 1, key))
        })?;
        if !seen.insert(key) {
            return Err(CollectError::parse(
                origin,
                format!("line {}: duplicate key {}", number + 1, key),
            ));
        }
        counters.push((key.to_string(), value));
    }
    Ok(counters)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT: &str = "cpu  4705 356 584 3699 23 0 14 0 0 0\n\
                        cpu0 1393280 32966 572056 13343292 6130 0 17875 0 23933 0\n\
                        intr 114930548 113199788 3 0 5 263 0 4 [... lots more numbers ...]\n";

    #[test]
    fn cpu_line_maps_positionally() {
        let cpu = parse_stat(STAT, "stat").unwrap();
        assert_eq!(cpu.get("user"), Some(4705));
        assert_eq!(cpu.get("nice"), Some(356));
        assert_eq!(cpu.get("idle"), Some(3699));
        assert_eq!(cpu.get("softirq"), Some(14));
        assert_eq!(cpu.get("guest_nice"), Some(0));
        assert_eq!(cpu.get("bogus"), None);
        let keys: Vec<&str> = cpu.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, CPU_KEYS.to_vec());
    }

    #[test]
    fn vmstat_keeps_file_order() {
        let vm = parse_vmstat("nr_free_pages 1000\npgfault 42\nnr_zspages 0\n", "vmstat").unwrap();
        assert_eq!(
            vm,
            vec![
                ("nr_free_pages".to_string(), 1000),
                ("pgfault".to_string(), 42),
                ("nr_zspages".to_string(), 0),
            ]
        );
    }

    macro_rules! parse_stat_failures {
        ($($name:ident: $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let input: &str = $value;
                    match parse_stat(input, "stat") {
                        Err(CollectError::Parse { origin, .. }) => assert_eq!(origin, "stat"),
                        other => panic!("{}: expected a parse error, got {:?}", stringify!($name), other),
                    }
                }
            )*
        }
    }

    parse_stat_failures! {
        stat_empty: "",
        stat_too_few_fields: "cpu 1 2 3 4 5 6 7 8 9\n",
        stat_label_only: "cpu\n",
        stat_non_numeric_field: "cpu 1 2 three 4 5 6 7 8 9 10\n",
        stat_negative_field: "cpu 1 2 3 -4 5 6 7 8 9 10\n",
    }

    macro_rules! parse_vmstat_failures {
        ($($name:ident: $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let input: &str = $value;
                    assert!(
                        matches!(parse_vmstat(input, "vmstat"), Err(CollectError::Parse { .. })),
                        "{}: expected a parse error",
                        stringify!($name)
                    );
                }
            )*
        }
    }

    parse_vmstat_failures! {
        vmstat_missing_value: "nr_free_pages 1\npgfault\n",
        vmstat_extra_column: "nr_free_pages 1 2\n",
        vmstat_non_numeric: "nr_free_pages lots\n",
        vmstat_blank_line: "nr_free_pages 1\n\npgfault 2\n",
        vmstat_duplicate_key: "pgfault 1\npgfault 2\n",
    }

    #[test]
    fn stat_ignores_extra_columns() {
        let cpu = parse_stat("cpu 1 2 3 4 5 6 7 8 9 10 11 12\n", "stat").unwrap();
        assert_eq!(cpu.get("guest_nice"), Some(10));
    }

    #[test]
    fn procfs_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let stat = dir.path().join("stat");
        let vmstat = dir.path().join("vmstat");
        fs::write(&stat, STAT).unwrap();
        fs::write(&vmstat, "pgfault 7\n").unwrap();
        let source = ProcFs::new(&stat, &vmstat);
        assert_eq!(source.read_cpu().unwrap().get("system"), Some(584));
        assert_eq!(source.read_vm().unwrap(), vec![("pgfault".to_string(), 7)]);
    }

    #[test]
    fn procfs_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = ProcFs::new(dir.path().join("nope"), dir.path().join("nope"));
        assert!(matches!(source.read_cpu(), Err(CollectError::Io { .. })));
        assert!(matches!(source.read_vm(), Err(CollectError::Io { .. })));
    }
}
