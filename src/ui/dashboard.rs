use std::time::SystemTime;

use crate::{
    ui::{
        debug::DebugWidget,
        lists::{WarnTable, WatchTable},
        state::{Focussable, UiState},
    },
    watch::{Watcher, entry::distance, format::to_minutes},
};
use ratatui::{
    buffer::Buffer, layout::Rect, macros::line as rline, macros::*, prelude::*, style::Stylize,
    widgets::*,
};
use tui_logger::*;

pub struct DashboardWidget<'a> {
    pub ui: &'a UiState,
    pub watcher: &'a Watcher,
}

impl DashboardWidget<'_> {
    fn ago(&self, then: SystemTime) -> String {
        format!("{}m ago", to_minutes(distance(self.ui.now, then)))
    }

    fn throbber(&self) -> &'static str {
        const FRAMES: [&str; 4] = ["ᔐ", "ᯇ", "ᔑ", "ᯇ"];
        FRAMES[self.ui.step_of_4_in_1_second()]
    }

    /// ```"not rust"
    ///  procwatch ᔐ  add ≥ 50  remove ≤ 25 │ cycle 0.04m ago: 312 sampled, 2 hot, 1 escalated, 0 evicted │ report: issues exist
    /// ```
    fn status_line(&self) -> Line<'_> {
        let theme = &self.ui.theme;
        let levels = self.watcher.thresholds();
        let unit = match levels.is_calibrated() {
            true => "",
            false => " (uncalibrated)",
        };
        let cycle = match &self.ui.last_cycle {
            Some((at, s)) => format!(
                "cycle {}: {} sampled, {} hot, {} escalated, {} evicted",
                self.ago(*at),
                s.sampled,
                s.hot,
                s.escalated,
                s.evicted
            ),
            None if self.watcher.is_initialized() => "waiting for first cycle".to_string(),
            None => "not initialized".to_string(),
        };
        let report = match &self.ui.last_report {
            Some((at, headline)) => format!("report {}: {}", self.ago(*at), headline),
            None => "no report yet".to_string(),
        };
        rline![
            " procwatch ".fg(theme.title).bold(),
            self.throbber().fg(theme.label),
            format!("  add ≥ {}  remove ≤ {}{}", levels.add_level, levels.remove_level, unit)
                .fg(theme.text),
            " │ ".fg(theme.muted),
            cycle.fg(theme.text),
            " │ ".fg(theme.muted),
            report.fg(theme.text),
        ]
    }
}

impl Widget for &mut DashboardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let [status_rect, window_rect, log_rect] = vertical![==1, >=5, ==10].areas(area);

        let panel_style = Style::default()
            .bg(self.ui.theme.surface)
            .fg(self.ui.theme.text);
        let main_style = Style::default()
            .bg(self.ui.theme.background)
            .fg(self.ui.theme.text);

        Block::new().style(main_style).render(status_rect, buf);
        self.status_line().render(status_rect, buf);

        let main_rect = if self.ui.debug {
            let [main_rect, panel_rect] = horizontal![>=5, >=40].areas(window_rect);
            DebugWidget {
                ui: self.ui,
                watcher: self.watcher,
            }
            .render(panel_rect, buf);
            main_rect
        } else {
            window_rect
        };

        Block::new().style(main_style).render(main_rect, buf);
        let [watch_rect, warn_rect] = horizontal![==2/5, ==3/5].areas(main_rect.inner(Margin::new(1, 0)));
        let thresholds = self.watcher.thresholds();
        WatchTable {
            entries: self.watcher.watch_list(),
            thresholds,
            focussed: self.ui.is_focussed(Focussable::Watch),
            ui: self.ui,
        }
        .render(watch_rect, buf);
        WarnTable {
            entries: self.watcher.warn_list(),
            thresholds,
            focussed: self.ui.is_focussed(Focussable::Warn),
            ui: self.ui,
        }
        .render(warn_rect, buf);

        let border_color = match self.ui.is_focussed(Focussable::Logs) {
            true => self.ui.theme.focus,
            false => self.ui.theme.text,
        };
        TuiLoggerSmartWidget::default()
            .style_error(panel_style.fg(self.ui.theme.error))
            .style_debug(panel_style)
            .style_warn(panel_style.fg(self.ui.theme.hot))
            .style_trace(panel_style)
            .style_info(panel_style)
            .style(panel_style)
            .border_style(panel_style.fg(border_color))
            .output_separator(':')
            .output_timestamp(Some("%H:%M:%S".to_string()))
            .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
            .output_target(true)
            .output_file(false)
            .output_line(false)
            .state(&self.ui.logger_state)
            .render(log_rect, buf);
    }
}
