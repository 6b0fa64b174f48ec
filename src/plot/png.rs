use std::{
    fs,
    path::{Path, PathBuf},
};

use log::*;
use parking_lot::Mutex;
use plotters::{prelude::*, style::FontStyle};

use crate::{
    plot::{ChartSink, Figure},
    sampler::CollectError,
};

const FONT_FAMILY: &str = "sans-serif";

/// Common locations of a sans-serif TrueType font.
const FONT_CANDIDATES: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
];

/// The configured font path last tried, and whether any font was registered.
static FONT: Mutex<Option<(Option<PathBuf>, bool)>> = parking_lot::const_mutex(None);

/// Renders figures to PNG files.
///
/// Text needs a font registered with the renderer. Without one the chart is
/// still drawn, minus the title, axis descriptions, tick labels and legend.
#[derive(Debug, Clone)]
pub struct PngSink {
    size: (u32, u32),
    labels: bool,
}

impl PngSink {
    pub fn new(font_path: Option<&Path>) -> Self {
        Self {
            size: (1024, 768),
            labels: load_font(font_path),
        }
    }
}

impl ChartSink for PngSink {
    fn render(&self, figure: &Figure, path: &Path) -> Result<(), CollectError> {
        let root = BitMapBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        let x_max = figure.x_max().max(2);
        let (mut y_min, mut y_max) = figure.y_bounds();
        if y_min == y_max {
            y_min -= 1;
            y_max += 1;
        }

        let mut builder = ChartBuilder::on(&root);
        builder.margin(20);
        if self.labels {
            builder
                .caption(&figure.title, (FONT_FAMILY, 24))
                .x_label_area_size(40)
                .y_label_area_size(80);
        }
        let mut chart = builder
            .build_cartesian_2d(1u64..x_max, y_min..y_max)
            .map_err(render_error)?;

        if self.labels {
            chart
                .configure_mesh()
                .x_desc(figure.x_label.as_str())
                .y_desc(figure.y_label.as_str())
                .draw()
                .map_err(render_error)?;
        }

        for (index, trace) in figure.traces.iter().enumerate() {
            let color = Palette99::pick(index).to_rgba();
            let series = chart
                .draw_series(LineSeries::new(trace.points.iter().copied(), color.stroke_width(2)))
                .map_err(render_error)?;
            if let Some(label) = &trace.label {
                series
                    .label(label.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
            }
        }

        if self.labels && figure.traces.iter().any(|t| t.label.is_some()) {
            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(render_error)?;
        }

        root.present().map_err(render_error)?;
        Ok(())
    }
}

fn render_error<E: std::fmt::Display>(err: E) -> CollectError {
    CollectError::Render(err.to_string())
}

/// Register a font for chart text, again whenever the configured path changes.
fn load_font(font_path: Option<&Path>) -> bool {
    let mut current = FONT.lock();
    if let Some(loaded) = reuse(current.as_ref(), font_path) {
        return loaded;
    }
    let candidates = font_path
        .map(Path::to_path_buf)
        .into_iter()
        .chain(FONT_CANDIDATES.iter().map(PathBuf::from));
    let mut loaded = false;
    for candidate in candidates {
        let Ok(bytes) = fs::read(&candidate) else {
            continue;
        };
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
            Ok(()) => {
                info!(target: "Plot", "Chart font {}", candidate.display());
                loaded = true;
                break;
            }
            Err(_) => warn!(target: "Plot", "Not a usable font: {}", candidate.display()),
        }
    }
    if !loaded {
        warn!(target: "Plot", "No chart font found, charts are drawn without text");
    }
    *current = Some((font_path.map(Path::to_path_buf), loaded));
    loaded
}

/// The earlier outcome, when the same path was tried last.
fn reuse(last: Option<&(Option<PathBuf>, bool)>, font_path: Option<&Path>) -> Option<bool> {
    match last {
        Some((path, loaded)) if path.as_deref() == font_path => Some(*loaded),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::Trace;

    #[test]
    fn writes_a_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cpu_user.png");
        let figure = Figure {
            title: "cpu user over time".to_string(),
            x_label: "Timestamp".to_string(),
            y_label: "user".to_string(),
            traces: vec![Trace {
                label: None,
                points: vec![(1, 10), (2, 12), (3, 15)],
            }],
        };
        PngSink::new(None).render(&figure, &path).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn font_is_tried_again_for_a_new_path() {
        let a = PathBuf::from("/fonts/a.ttf");
        let b = PathBuf::from("/fonts/b.ttf");
        assert_eq!(reuse(None, Some(a.as_path())), None, "nothing tried yet");
        let last = (Some(a.clone()), true);
        assert_eq!(reuse(Some(&last), Some(a.as_path())), Some(true));
        assert_eq!(reuse(Some(&last), Some(b.as_path())), None);
        assert_eq!(reuse(Some(&last), None), None);
        assert_eq!(reuse(Some(&(None, false)), None), Some(false));
    }

    #[test]
    fn unreadable_font_path_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let junk = dir.path().join("junk.ttf");
        fs::write(&junk, b"not a font").unwrap();
        let with_junk = PngSink::new(Some(junk.as_path()));
        let path = dir.path().join("out.png");
        let figure = Figure {
            title: "t".to_string(),
            x_label: "x".to_string(),
            y_label: "y".to_string(),
            traces: vec![Trace {
                label: None,
                points: vec![(1, 1), (2, 3)],
            }],
        };
        with_junk.render(&figure, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn single_flat_sample_still_renders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.png");
        let figure = Figure {
            title: "flat".to_string(),
            x_label: "Timestamp".to_string(),
            y_label: "v".to_string(),
            traces: vec![Trace {
                label: Some("only".to_string()),
                points: vec![(1, 0)],
            }],
        };
        PngSink::new(None).render(&figure, &path).unwrap();
        assert!(path.exists());
    }
}
