use std::time::SystemTime;

use crate::{
    ui::state::UiState,
    watch::{
        Thresholds, WarnEntry, WatchEntry,
        entry::distance,
        format::{display_cpu, format_bytes, to_minutes},
    },
};
use ratatui::{buffer::Buffer, layout::Rect, prelude::*, style::Stylize, widgets::*};

fn ago(ui: &UiState, then: SystemTime) -> String {
    format!("{}m", to_minutes(distance(ui.now, then)))
}

fn panel<'a>(ui: &UiState, title: &'a str, count: usize, focussed: bool) -> Block<'a> {
    let border_color = match focussed {
        true => ui.theme.focus,
        false => ui.theme.border,
    };
    Block::bordered()
        .title(Line::from(vec![
            format!(" {} ", title).fg(ui.theme.title),
            format!("{} ", count).fg(ui.theme.muted),
        ]))
        .border_style(Style::default().bg(ui.theme.surface).fg(border_color))
        .bg(ui.theme.surface)
        .border_type(BorderType::Rounded)
}

fn empty(ui: &UiState, area: Rect, buf: &mut Buffer, text: &'static str) {
    let text = Text::from(text).fg(ui.theme.muted);
    let area = area.centered(
        Constraint::Length(text.width() as u16),
        Constraint::Length(1),
    );
    text.render(area, buf);
}

fn header<'a>(ui: &UiState, titles: &[&'a str]) -> Row<'a> {
    Row::new(titles.iter().map(|t| Cell::from(*t)))
        .style(Style::default().fg(ui.theme.label).add_modifier(Modifier::BOLD))
}

/// First stage suspects.
///
/// ```"not rust"
/// ╭ Watching 2 ──────────────────────────────╮
/// │ PID     Name            CPU%   Seen      │
/// │ 4120    cargo           97     0.12m     │
/// ╰──────────────────────────────────────────╯
/// ```
pub struct WatchTable<'a> {
    pub entries: Option<&'a [WatchEntry]>,
    pub thresholds: &'a Thresholds,
    pub focussed: bool,
    pub ui: &'a UiState,
}

impl Widget for WatchTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let entries = self.entries.unwrap_or_default();
        let block = panel(self.ui, "Watching", entries.len(), self.focussed);
        let inner = block.inner(area);
        block.render(area, buf);
        if entries.is_empty() {
            empty(self.ui, inner, buf, "Nothing above threshold");
            return;
        }
        let rows = entries.iter().enumerate().map(|(i, e)| {
            Row::new(vec![
                Cell::from(e.pid.to_string()),
                Cell::from(e.name.clone()),
                Cell::from(display_cpu(e.cpu)).fg(self.ui.theme.cpu(e.cpu, self.thresholds)),
                Cell::from(ago(self.ui, e.last_detect)),
            ])
            .bg(self.ui.theme.stripe(i))
            .fg(self.ui.theme.text)
        });
        let widths = [
            Constraint::Length(8),
            Constraint::Fill(1),
            Constraint::Length(7),
            Constraint::Length(10),
        ];
        let table = Table::new(rows, widths)
            .header(header(self.ui, &["PID", "Name", "CPU%", "Seen"]))
            .column_spacing(1);
        Widget::render(table, inner, buf);
    }
}

/// Repeat offenders with their alert state.
pub struct WarnTable<'a> {
    pub entries: &'a [WarnEntry],
    pub thresholds: &'a Thresholds,
    pub focussed: bool,
    pub ui: &'a UiState,
}

impl WarnTable<'_> {
    fn alert_state(&self, entry: &WarnEntry) -> Span<'static> {
        match (entry.report, entry.report_time) {
            (true, _) => "due".fg(self.ui.theme.hot),
            (false, Some(t)) => Span::from(ago(self.ui, t)).fg(self.ui.theme.text),
            (false, None) => "grace".fg(self.ui.theme.muted),
        }
    }
}

impl Widget for WarnTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = panel(self.ui, "Warning", self.entries.len(), self.focussed);
        let inner = block.inner(area);
        block.render(area, buf);
        if self.entries.is_empty() {
            empty(self.ui, inner, buf, "No repeat offenders");
            return;
        }
        let rows = self.entries.iter().enumerate().map(|(i, e)| {
            let memory = e.memory.map(format_bytes).unwrap_or_else(|| "-".to_string());
            let uptime = e
                .elapsed
                .map(|d| format!("{}m", to_minutes(d)))
                .unwrap_or_else(|| "-".to_string());
            Row::new(vec![
                Cell::from(e.pid.to_string()),
                Cell::from(e.name.clone()),
                Cell::from(display_cpu(e.cpu)).fg(self.ui.theme.cpu(e.cpu, self.thresholds)),
                Cell::from(memory),
                Cell::from(uptime),
                Cell::from(ago(self.ui, e.first_detect)),
                Cell::from(ago(self.ui, e.last_detect)),
                Cell::from(self.alert_state(e)),
            ])
            .bg(self.ui.theme.stripe(i))
            .fg(self.ui.theme.text)
        });
        let widths = [
            Constraint::Length(8),
            Constraint::Fill(1),
            Constraint::Length(7),
            Constraint::Length(11),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
        ];
        let table = Table::new(rows, widths)
            .header(header(
                self.ui,
                &["PID", "Name", "CPU%", "Memory", "Up", "First", "Last", "Alerted"],
            ))
            .column_spacing(1);
        Widget::render(table, inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::watch::source::testing::sample;

    fn rendered(area: Rect, widget: impl Widget) -> Vec<String> {
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        (0..area.height)
            .map(|y| (0..area.width).map(|x| buf[(x, y)].symbol()).collect())
            .collect()
    }

    fn ui_at(now: SystemTime) -> UiState {
        UiState {
            now,
            ..UiState::default()
        }
    }

    #[test]
    fn empty_watch_table() {
        let ui = ui_at(SystemTime::UNIX_EPOCH);
        let thresholds = Thresholds::new(50.0, 25.0);
        let lines = rendered(
            Rect::new(0, 0, 40, 5),
            WatchTable {
                entries: None,
                thresholds: &thresholds,
                focussed: false,
                ui: &ui,
            },
        );
        assert!(lines[0].contains(" Watching 0 "), "{:?}", lines);
        assert!(lines[2].contains("Nothing above threshold"), "{:?}", lines);
    }

    #[test]
    fn watch_table_row() {
        let detected = SystemTime::UNIX_EPOCH + Duration::from_secs(600);
        let ui = ui_at(detected + Duration::from_secs(90));
        let thresholds = Thresholds::new(50.0, 25.0);
        let entries = [WatchEntry::new(&sample(4120, "cargo", 97.0), detected)];
        let lines = rendered(
            Rect::new(0, 0, 50, 4),
            WatchTable {
                entries: Some(&entries),
                thresholds: &thresholds,
                focussed: true,
                ui: &ui,
            },
        );
        assert!(lines[0].contains(" Watching 1 "), "{:?}", lines);
        assert!(lines[1].contains("PID"), "{:?}", lines);
        assert!(lines[1].contains("CPU%"), "{:?}", lines);
        for cell in ["4120", "cargo", "97", "1.30m"] {
            assert!(lines[2].contains(cell), "{} missing from {:?}", cell, lines[2]);
        }
    }

    #[test]
    fn empty_warn_table() {
        let ui = ui_at(SystemTime::UNIX_EPOCH);
        let thresholds = Thresholds::new(50.0, 25.0);
        let lines = rendered(
            Rect::new(0, 0, 40, 5),
            WarnTable {
                entries: &[],
                thresholds: &thresholds,
                focussed: false,
                ui: &ui,
            },
        );
        assert!(lines[0].contains(" Warning 0 "), "{:?}", lines);
        assert!(lines[2].contains("No repeat offenders"), "{:?}", lines);
    }

    #[test]
    fn warn_table_row() {
        let first = SystemTime::UNIX_EPOCH + Duration::from_secs(600);
        let ui = ui_at(first + Duration::from_secs(120));
        let thresholds = Thresholds::new(50.0, 25.0);
        let mut entry = WarnEntry::new(&sample(77, "encoder", 88.0), first);
        entry.memory = Some(1_048_576);
        let lines = rendered(
            Rect::new(0, 0, 100, 4),
            WarnTable {
                entries: &[entry],
                thresholds: &thresholds,
                focussed: false,
                ui: &ui,
            },
        );
        assert!(lines[0].contains(" Warning 1 "), "{:?}", lines);
        assert!(lines[1].contains("Alerted"), "{:?}", lines);
        for cell in ["77", "encoder", "88", "1 MB", "2.00m", "grace"] {
            assert!(lines[2].contains(cell), "{} missing from {:?}", cell, lines[2]);
        }
    }
}
