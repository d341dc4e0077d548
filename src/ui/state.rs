use std::{fmt::Debug, time::SystemTime};

use crate::{event::TICK_FPS, ui::theme::Theme, watch::CycleSummary};
use tui_logger::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focussable {
    Watch,
    Warn,
    Logs,
    Debug,
}

pub struct UiState {
    pub tick: f64,
    /// Wall clock for the "ago" columns, refreshed every couple of seconds.
    pub now: SystemTime,
    pub theme: Theme,
    pub focus: Option<Focussable>,
    pub debug: bool,
    pub last_cycle: Option<(SystemTime, CycleSummary)>,
    pub last_report: Option<(SystemTime, String)>,
    pub logger_state: TuiWidgetState,
}

impl Debug for UiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiState")
            .field("tick", &self.tick)
            .field("focus", &self.focus)
            .field("last_cycle", &self.last_cycle)
            .field("last_report", &self.last_report)
            .finish()
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            logger_state: TuiWidgetState::new(),
            tick: Default::default(),
            now: SystemTime::now(),
            theme: Theme::dark(),
            focus: None,
            debug: false,
            last_cycle: None,
            last_report: None,
        }
    }
}

impl UiState {
    pub fn tick(&mut self) {
        self.tick += 1.0;
        if self.tick > 2.0 * TICK_FPS {
            self.tick = 0.0;
            self.now = SystemTime::now();
        }
    }

    pub fn step_of_4_in_1_second(&self) -> usize {
        (self.tick * 4.0 / TICK_FPS) as usize % 4
    }

    pub fn is_focussed(&self, panel: Focussable) -> bool {
        self.focus == Some(panel)
    }

    pub fn toggle_debug(&mut self) {
        self.debug = !self.debug;
        if !self.debug && self.is_focussed(Focussable::Debug) {
            self.focus = Some(Focussable::Watch);
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = Some(match self.focus {
            None | Some(Focussable::Debug) => Focussable::Watch,
            Some(Focussable::Watch) => Focussable::Warn,
            Some(Focussable::Warn) => Focussable::Logs,
            Some(Focussable::Logs) if self.debug => Focussable::Debug,
            Some(Focussable::Logs) => Focussable::Watch,
        });
    }

    pub fn focus_prev(&mut self) {
        self.focus = Some(match self.focus {
            None | Some(Focussable::Warn) => Focussable::Watch,
            Some(Focussable::Watch) if self.debug => Focussable::Debug,
            Some(Focussable::Watch) => Focussable::Logs,
            Some(Focussable::Logs) => Focussable::Warn,
            Some(Focussable::Debug) => Focussable::Logs,
        });
    }
}
