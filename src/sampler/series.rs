use std::collections::HashMap;

use crate::sampler::{CPU_KEYS, CollectError, CpuCounters, Family, VmCounters};

/// Append-only series keyed by name, iterated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesTable {
    order: Vec<String>,
    values: HashMap<String, Vec<u64>>,
}

impl SeriesTable {
    /// A table with empty series for each of `keys`.
    pub fn with_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut table = Self::default();
        for key in keys {
            table.series_mut(key);
        }
        table
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&[u64]> {
        self.values.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u64])> {
        self.order
            .iter()
            .map(|k| (k.as_str(), self.values.get(k).map(Vec::as_slice).unwrap_or_default()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The series for `key`, created empty on first use.
    fn series_mut(&mut self, key: &str) -> &mut Vec<u64> {
        if !self.values.contains_key(key) {
            self.order.push(key.to_string());
        }
        self.values.entry(key.to_string()).or_default()
    }

    fn push(&mut self, key: &str, value: u64) {
        self.series_mut(key).push(value);
    }
}

/// Every series of both families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesStore {
    cpu: SeriesTable,
    vm: SeriesTable,
}

impl Default for SeriesStore {
    fn default() -> Self {
        Self {
            cpu: SeriesTable::with_keys(CPU_KEYS),
            vm: SeriesTable::default(),
        }
    }
}

impl SeriesStore {
    pub fn table(&self, family: Family) -> &SeriesTable {
        match family {
            Family::Cpu => &self.cpu,
            Family::Vmstat => &self.vm,
        }
    }

    pub fn get(&self, family: Family, key: &str) -> Result<&[u64], CollectError> {
        self.table(family)
            .get(key)
            .ok_or_else(|| CollectError::unknown_key(family, key))
    }

    /// Number of completed samples, as seen on the fixed CPU series.
    pub fn samples(&self) -> usize {
        self.cpu.get(CPU_KEYS[0]).map(<[u64]>::len).unwrap_or(0)
    }

    /// Append one tick's readings.
    pub fn append_tick(&mut self, cpu: &CpuCounters, vm: &VmCounters) {
        for (key, value) in cpu.iter() {
            self.cpu.push(key, value);
        }
        for (key, value) in vm {
            self.vm.push(key, *value);
        }
    }

    /// Append `(key, value)` rows in order.
    ///
    /// CPU keys outside the fixed set are rejected before anything is
    /// appended; vmstat keys are created as needed.
    pub fn append_rows(&mut self, family: Family, rows: &[(String, u64)]) -> Result<(), CollectError> {
        if family == Family::Cpu
            && let Some((key, _)) = rows.iter().find(|(k, _)| !self.cpu.contains(k))
        {
            return Err(CollectError::unknown_key(family, key));
        }
        let table = match family {
            Family::Cpu => &mut self.cpu,
            Family::Vmstat => &mut self.vm,
        };
        for (key, value) in rows {
            table.push(key, *value);
        }
        Ok(())
    }
}

/// Each value of `family.key` minus the first one.
///
/// Fails on an empty series, and when a difference does not fit in an `i64`.
pub fn deltas(family: Family, key: &str, values: &[u64]) -> Result<Vec<i64>, CollectError> {
    let base = *values.first().ok_or_else(|| CollectError::EmptySeries {
        family,
        key: key.to_string(),
    })?;
    values
        .iter()
        .map(|v| {
            i64::try_from(i128::from(*v) - i128::from(base)).map_err(|_| CollectError::DeltaOverflow {
                family,
                key: key.to_string(),
            })
        })
        .collect()
}

/// Increase between consecutive samples, one shorter than the input.
pub fn increments(values: &[u64]) -> Vec<u64> {
    values.windows(2).map(|w| w[1].saturating_sub(w[0])).collect()
}
