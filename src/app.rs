use std::{sync::Arc, time::SystemTime};

use crate::{
    config::WatchConfig,
    event::{AppEvent, Event, EventHandler, every},
    ui::{dashboard::DashboardWidget, state::UiState},
    watch::{LogSink, SysinfoLookup, SysinfoSource, Watcher, source::configured_sink},
};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::*;
use ratatui::DefaultTerminal;

pub struct App {
    pub running: bool,
    pub events: EventHandler,
    pub watcher: Watcher,
    pub ui_state: UiState,
}

impl App {
    pub fn new(config: WatchConfig) -> Result<Self> {
        let events = EventHandler::new();
        let mut watcher = Watcher::new(&config);
        watcher.init(
            Box::new(SysinfoSource::new()),
            Arc::new(SysinfoLookup::new()),
            configured_sink(&config.reporting, Box::new(LogSink))?,
        );
        every(
            events.clone_sender(),
            config.schedule.sample_interval(),
            AppEvent::Sample,
        );
        every(
            events.clone_sender(),
            config.schedule.report_every(),
            AppEvent::Report,
        );
        Ok(Self {
            running: true,
            events,
            watcher,
            ui_state: UiState::default(),
        })
    }

    /// Run the application's main loop.
    ///
    /// Cycles and report passes are handled here, one event at a time, so
    /// the watcher never sees two of them at once.
    pub async fn run(&mut self, mut terminal: DefaultTerminal) -> Result<()> {
        self.events.send(AppEvent::Sample);
        while self.running {
            terminal.draw(|frame| {
                let mut dashboard = DashboardWidget {
                    ui: &self.ui_state,
                    watcher: &self.watcher,
                };
                frame.render_widget(&mut dashboard, frame.area());
            })?;
            match self.events.next().await? {
                Event::Tick => self.tick(),
                Event::Crossterm(event) => match event {
                    crossterm::event::Event::Key(key_event)
                        if key_event.kind == KeyEventKind::Press =>
                    {
                        self.handle_key_events(key_event)?
                    }
                    _ => {}
                },
                Event::App(app_event) => match app_event {
                    AppEvent::Sample => self.sample().await,
                    AppEvent::Report => self.report(),
                    AppEvent::Quit => self.quit(),
                },
            }
        }
        Ok(())
    }

    /// Handles the key events and updates the state of [`App`].
    pub fn handle_key_events(&mut self, key_event: KeyEvent) -> Result<()> {
        match key_event.code {
            KeyCode::Esc | KeyCode::Char('q') => self.events.send(AppEvent::Quit),
            KeyCode::Char('c' | 'C') if key_event.modifiers == KeyModifiers::CONTROL => {
                self.events.send(AppEvent::Quit)
            }
            KeyCode::Char('s') => self.events.send(AppEvent::Sample),
            KeyCode::Char('a') => self.events.send(AppEvent::Report),
            KeyCode::Char('d') => self.ui_state.toggle_debug(),
            KeyCode::Tab => self.ui_state.focus_next(),
            KeyCode::BackTab => self.ui_state.focus_prev(),
            _ => {}
        }
        Ok(())
    }

    fn tick(&mut self) {
        self.ui_state.tick();
        self.watcher.apply_enrichments();
    }

    async fn sample(&mut self) {
        match self.watcher.check_processes(None).await {
            Ok(Some(summary)) => self.ui_state.last_cycle = Some((SystemTime::now(), summary)),
            Ok(None) => {}
            Err(e) => error!(target: "App", "Detection cycle failed: {}", e),
        }
    }

    fn report(&mut self) {
        let outcome = self.watcher.report(None);
        let headline = outcome.headline();
        debug!(target: "App", "Report: {}", headline);
        self.ui_state.last_report = Some((SystemTime::now(), headline));
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }
}
