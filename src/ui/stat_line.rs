use crate::{
    sampler::{Family, series::increments},
    ui::state::UiState,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    macros::*,
    prelude::*,
    style::Stylize,
    widgets::*,
};

/// Samples shown per sparkline, newest last.
const WINDOW: usize = 120;

/// One watched counter: its name, a sparkline of per-tick increments and
/// the latest raw value.
///
/// ```"not rust"
/// cpu.user      ______▁▁▂▁▃▂▁▁▅▂▁        1843211
/// ```
#[derive(Debug)]
pub struct SeriesLine<'a> {
    pub family: Family,
    pub key: &'a str,
    pub values: &'a [u64],
    pub color: Color,
    pub ui: &'a UiState,
}

impl SeriesLine<'_> {
    fn label(&self) -> String {
        format!("{}.{}", self.family, self.key)
    }
}

impl Widget for &SeriesLine<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [_, label, history, _, current, _] =
            horizontal![==1, ==20, *=1, ==1, ==14, ==1].areas(area);
        Text::from(self.label())
            .fg(self.ui.theme.foreground)
            .render(label, buf);
        let last = match self.values.last() {
            Some(v) => span![self.ui.theme.foreground; "{}", v],
            None => span![self.ui.theme.muted; "-"],
        };
        ratatui::macros::line![last]
            .alignment(Alignment::Right)
            .render(current, buf);

        let resampled =
            crate::resample::resample(&increments(self.values), WINDOW, history.width as usize);
        Sparkline::default()
            .data(&resampled)
            .absent_value_symbol("_")
            .absent_value_style(Style::default().fg(self.ui.theme.fade(self.color, 0.6)))
            .fg(self.color)
            .render(history, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(values: &[u64], width: u16) -> String {
        let ui = UiState::default();
        let line = SeriesLine {
            family: Family::Vmstat,
            key: "pgfault",
            values,
            color: ui.theme.primary,
            ui: &ui,
        };
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        (&line).render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn shows_label_and_latest_value() {
        let row = rendered(&[10, 12, 20], 60);
        assert!(row.contains("vmstat.pgfault"), "{row:?}");
        assert!(row.trim_end().ends_with("20"), "{row:?}");
    }

    #[test]
    fn empty_series_shows_a_dash() {
        let row = rendered(&[], 60);
        assert!(row.trim_end().ends_with('-'), "{row:?}");
    }
}
