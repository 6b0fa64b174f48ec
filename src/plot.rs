//! Line charts of stored or exported series.
//!
//! [`Plotter`] builds a [`Figure`] from a series and hands it to a
//! [`ChartSink`], which owns the actual rendering.

use std::path::{Path, PathBuf};

use log::*;

use crate::{
    codec,
    sampler::{CollectError, Family, Sampler, series::deltas},
};

pub mod png;

pub use png::PngSink;

/// One labelled line on a chart. X values start at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub label: Option<String>,
    pub points: Vec<(u64, i64)>,
}

impl Trace {
    fn numbered(label: Option<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self {
            label,
            points: (1u64..).zip(values).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub traces: Vec<Trace>,
}

impl Figure {
    /// Largest x value across every trace.
    pub fn x_max(&self) -> u64 {
        self.traces
            .iter()
            .filter_map(|t| t.points.last().map(|(x, _)| *x))
            .max()
            .unwrap_or(0)
    }

    pub fn y_bounds(&self) -> (i64, i64) {
        let ys = self.traces.iter().flat_map(|t| t.points.iter().map(|(_, y)| *y));
        ys.fold(None, |acc: Option<(i64, i64)>, y| match acc {
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
            None => Some((y, y)),
        })
        .unwrap_or((0, 0))
    }
}

/// Persists a figure as an image.
pub trait ChartSink {
    fn render(&self, figure: &Figure, path: &Path) -> Result<(), CollectError>;
}

#[derive(Debug)]
pub struct Plotter<S> {
    sink: S,
    dir: PathBuf,
}

impl<S: ChartSink> Plotter<S> {
    pub fn new(sink: S, dir: impl Into<PathBuf>) -> Self {
        Self {
            sink,
            dir: dir.into(),
        }
    }

    pub fn set_dir(&mut self, dir: impl Into<PathBuf>) {
        self.dir = dir.into();
    }

    /// `{dir}/{family}_{key}{suffix}.png`
    pub fn output_path(&self, family: Family, key: &str, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}_{}{}.png", family, key, suffix))
    }

    /// Plot a stored series against its sample number.
    pub fn plot(&self, sampler: &Sampler, family: Family, key: &str) -> Result<PathBuf, CollectError> {
        let values = stored(sampler, family, key)?;
        let figure = Figure {
            title: format!("{} {} over time", family, key),
            x_label: "Timestamp".to_string(),
            y_label: key.to_string(),
            traces: vec![Trace::numbered(
                None,
                values.iter().map(|v| i64::try_from(*v).unwrap_or(i64::MAX)),
            )],
        };
        self.draw(&figure, self.output_path(family, key, ""))
    }

    /// Plot a stored series relative to its first sample.
    pub fn plot_delta(&self, sampler: &Sampler, family: Family, key: &str) -> Result<PathBuf, CollectError> {
        let values = stored(sampler, family, key)?;
        let diffs = deltas(family, key, &values)?;
        let figure = Figure {
            title: format!("{} {} over time (difference from first value)", family, key),
            x_label: "Timestamp".to_string(),
            y_label: format!("{} (difference from first value)", key),
            traces: vec![Trace::numbered(None, diffs)],
        };
        self.draw(&figure, self.output_path(family, key, "_diff"))
    }

    /// Plot `key` as read back from two exported files, one line per file.
    ///
    /// Each line stops at its own length; the shorter one is not padded.
    pub fn plot_comparison(
        &self,
        path_a: &Path,
        path_b: &Path,
        family: Family,
        key: &str,
    ) -> Result<PathBuf, CollectError> {
        let mut traces = Vec::with_capacity(2);
        for path in [path_a, path_b] {
            let values = codec::read_key(path, key)?;
            if values.is_empty() {
                warn!(target: "Plot", "{} has no rows for {}", path.display(), key);
                return Err(CollectError::unknown_key(family, key));
            }
            let label = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            traces.push(Trace::numbered(Some(label), values));
        }
        let figure = Figure {
            title: format!("{} {} over time", family, key),
            x_label: "Timestamp".to_string(),
            y_label: key.to_string(),
            traces,
        };
        self.draw(&figure, self.output_path(family, key, "_comparison"))
    }

    fn draw(&self, figure: &Figure, path: PathBuf) -> Result<PathBuf, CollectError> {
        self.sink.render(figure, &path)?;
        debug!(target: "Plot", "Rendered {:?} to {}", figure.title, path.display());
        Ok(path)
    }
}

fn stored(sampler: &Sampler, family: Family, key: &str) -> Result<Vec<u64>, CollectError> {
    let values = sampler.get_series(family, key)?;
    if values.is_empty() {
        return Err(CollectError::EmptySeries {
            family,
            key: key.to_string(),
        });
    }
    Ok(values)
}
