use crate::{
    sampler::{CollectionState, Family, SamplerStatus},
    ui::{stat_line::SeriesLine, state::UiState},
};
use ratatui::{
    buffer::Buffer, layout::Rect, macros::line as rline, macros::*, prelude::*, style::Stylize,
    widgets::*,
};
use tui_logger::*;

/// A counter the dashboard follows live.
#[derive(Debug, Clone)]
pub struct Watched {
    pub family: Family,
    pub key: String,
    pub values: Vec<u64>,
}

/// The text in front of the command line.
pub fn prompt_for(status: &SamplerStatus) -> String {
    let lead = match (&status.imported, &status.state) {
        (Some(files), _) => format!("Data imported {}", files),
        (None, CollectionState::Collecting { started, .. }) => {
            format!("Collecting started at {}", started.format("%a %b %e %H:%M:%S %Y"))
        }
        (None, CollectionState::Idle) => "(h for help)".to_string(),
    };
    format!("{} > ", lead)
}

/// Whole-screen layout.
///
/// ```"not rust"
/// ╭ memprof ─ ◑ ───────────────────────────────────────────────────╮
/// │ State: Collecting  Run: 6f1c…  Samples: 42  vmstat keys: 180   │
/// ╰────────────────────────────────────────────────────────────────╯
/// ╭ Watching ──────────────────────────────────────────────────────╮
/// │ cpu.user      ______▁▁▂▁▃▂▁▁▅▂▁                       1843211 │
/// ╰────────────────────────────────────────────────────────────────╯
/// ╭ Output ────────────────────────────────────────────────────────╮
/// │ 12:00:01:I:memprof:Collecting started                          │
/// ╰────────────────────────────────────────────────────────────────╯
/// Collecting started at Sun Oct 18 12:00:01 2026 > p cpu.user
/// ```
pub struct DashboardWidget<'a> {
    pub ui: &'a UiState,
    pub status: &'a SamplerStatus,
    pub watched: &'a [Watched],
}

impl DashboardWidget<'_> {
    fn areas(&self, area: Rect) -> [Rect; 4] {
        let watch_rows = self.watched.len().max(1) as u16 + 2;
        Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(watch_rows),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .areas(area)
    }

    /// Where the terminal cursor belongs while typing.
    pub fn cursor_position(&self, area: Rect) -> Position {
        let [_, _, _, input] = self.areas(area);
        let offset = prompt_for(self.status).chars().count() + self.ui.input.cursor();
        Position::new(
            (input.x + offset as u16).min(input.right().saturating_sub(1)),
            input.y,
        )
    }

    fn field_line<'a, T: Into<Span<'a>>>(&self, label: &'a str, value: T) -> Vec<Span<'a>> {
        let mut s: Span = value.into();
        if s.style.fg.is_none() {
            s = s.fg(self.ui.theme.foreground);
        }
        vec![label.fg(self.ui.theme.primary), s, span!("  ")]
    }

    fn collecting_throbber(&self) -> &'static str {
        const FRAMES: [&str; 4] = ["◑", "◒", "◐", "◓"];
        FRAMES[self.ui.step_of_4_in_1_second()]
    }

    fn render_status(&self, area: Rect, buf: &mut Buffer) {
        let mut border = Block::bordered()
            .title_top(rline![" memprof ".fg(self.ui.theme.primary)])
            .border_style(
                Style::default()
                    .bg(self.ui.theme.surface)
                    .fg(self.ui.theme.fade(self.ui.theme.primary, 0.5)),
            )
            .bg(self.ui.theme.surface)
            .border_type(BorderType::Rounded);

        let mut spans = Vec::new();
        match &self.status.state {
            CollectionState::Collecting { run, started } => {
                border = border.title_top(
                    span!(" {} ", self.collecting_throbber()).fg(self.ui.theme.success),
                );
                spans.extend(self.field_line("State: ", span!(self.ui.theme.success; "Collecting")));
                spans.extend(self.field_line("Run: ", run.simple().to_string()[..8].to_string()));
                spans.extend(self.field_line("Since: ", started.format("%H:%M:%S").to_string()));
            }
            CollectionState::Idle => {
                spans.extend(self.field_line("State: ", span!(self.ui.theme.muted; "Idle")));
            }
        }
        spans.extend(self.field_line("Samples: ", self.status.samples.to_string()));
        spans.extend(self.field_line("vmstat keys: ", self.status.vm_keys.to_string()));
        if let Some(files) = &self.status.imported {
            spans.extend(self.field_line("Imported: ", files.to_string()));
        }

        let inner = border.inner(area);
        border.render(area, buf);
        Line::from(spans).render(inner.inner(Margin::new(1, 0)), buf);
    }

    fn render_watched(&self, area: Rect, buf: &mut Buffer) {
        let border = Block::bordered()
            .title_top(rline![" Watching ".fg(self.ui.theme.primary)])
            .border_style(
                Style::default()
                    .bg(self.ui.theme.surface)
                    .fg(self.ui.theme.fade(self.ui.theme.primary, 0.5)),
            )
            .bg(self.ui.theme.surface)
            .border_type(BorderType::Rounded);
        let inner = border.inner(area);
        border.render(area, buf);

        if self.watched.is_empty() {
            Text::from("Nothing watched")
                .fg(self.ui.theme.muted)
                .render(inner.inner(Margin::new(1, 0)), buf);
            return;
        }
        let rows = Layout::vertical(self.watched.iter().map(|_| Constraint::Length(1))).split(inner);
        for (index, (watched, row)) in self.watched.iter().zip(rows.iter()).enumerate() {
            let line = SeriesLine {
                family: watched.family,
                key: &watched.key,
                values: &watched.values,
                color: self.ui.theme.series(index),
                ui: self.ui,
            };
            (&line).render(*row, buf);
        }
    }

    fn render_output(&self, area: Rect, buf: &mut Buffer) {
        let panel_style = Style::default()
            .bg(self.ui.theme.surface)
            .fg(self.ui.theme.foreground);
        TuiLoggerWidget::default()
            .block(
                Block::bordered()
                    .title_top(rline![" Output ".fg(self.ui.theme.primary)])
                    .border_style(panel_style.fg(self.ui.theme.fade(self.ui.theme.primary, 0.5)))
                    .border_type(BorderType::Rounded),
            )
            .style_error(panel_style.fg(self.ui.theme.error))
            .style_debug(panel_style.fg(self.ui.theme.muted))
            .style_warn(panel_style.fg(self.ui.theme.warning))
            .style_trace(panel_style.fg(self.ui.theme.muted))
            .style_info(panel_style)
            .style(panel_style)
            .output_separator(':')
            .output_timestamp(Some("%H:%M:%S".to_string()))
            .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
            .output_target(true)
            .output_file(false)
            .output_line(false)
            .state(&self.ui.logger_state)
            .render(area, buf);
    }

    fn render_input(&self, area: Rect, buf: &mut Buffer) {
        rline![
            prompt_for(self.status).fg(self.ui.theme.accent),
            self.ui.input.text().fg(self.ui.theme.foreground)
        ]
        .bg(self.ui.theme.background)
        .render(area, buf);
    }
}

impl Widget for &mut DashboardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        Block::new()
            .style(
                Style::default()
                    .bg(self.ui.theme.background)
                    .fg(self.ui.theme.foreground),
            )
            .render(area, buf);
        let [status, watched, output, input] = self.areas(area);
        self.render_status(status, buf);
        self.render_watched(watched, buf);
        self.render_output(output, buf);
        self.render_input(input, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::ImportedFiles;
    use chrono::{Local, TimeZone};
    use uuid::Uuid;

    fn status(state: CollectionState, imported: Option<ImportedFiles>) -> SamplerStatus {
        SamplerStatus {
            state,
            imported,
            samples: 0,
            vm_keys: 0,
        }
    }

    #[test]
    fn prompt_reflects_the_sampler() {
        assert_eq!(prompt_for(&status(CollectionState::Idle, None)), "(h for help) > ");

        let files = ImportedFiles {
            cpu: "data/cpu_stats.csv".into(),
            vm: "data/vm_stats.csv".into(),
        };
        assert_eq!(
            prompt_for(&status(CollectionState::Idle, Some(files.clone()))),
            "Data imported data/cpu_stats.csv, data/vm_stats.csv > "
        );

        let started = Local.with_ymd_and_hms(2026, 10, 18, 9, 30, 5).unwrap();
        let collecting = CollectionState::Collecting {
            run: Uuid::new_v4(),
            started,
        };
        assert_eq!(
            prompt_for(&status(collecting.clone(), None)),
            "Collecting started at Sun Oct 18 09:30:05 2026 > "
        );
        assert_eq!(
            prompt_for(&status(collecting, Some(files))),
            "Data imported data/cpu_stats.csv, data/vm_stats.csv > ",
            "an import is named even while collecting"
        );
    }

    #[test]
    fn cursor_follows_the_prompt() {
        let mut ui = UiState::default();
        for c in "ls cpu".chars() {
            ui.input.insert(c);
        }
        let status = status(CollectionState::Idle, None);
        let dashboard = DashboardWidget {
            ui: &ui,
            status: &status,
            watched: &[],
        };
        let area = Rect::new(0, 0, 80, 24);
        let pos = dashboard.cursor_position(area);
        assert_eq!(pos, Position::new(("(h for help) > ".len() + 6) as u16, 23));
    }

    #[test]
    fn renders_watched_series() {
        let ui = UiState::default();
        let status = status(CollectionState::Idle, None);
        let watched = vec![Watched {
            family: Family::Cpu,
            key: "user".to_string(),
            values: vec![1, 2, 3],
        }];
        let mut dashboard = DashboardWidget {
            ui: &ui,
            status: &status,
            watched: &watched,
        };
        let area = Rect::new(0, 0, 80, 24);
        let mut buf = Buffer::empty(area);
        (&mut dashboard).render(area, &mut buf);
        let screen: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("cpu.user"));
        assert!(screen.contains("Idle"));
        assert!(screen.contains("(h for help) >"));
    }
}
