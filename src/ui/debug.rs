use ratatui::{prelude::*, widgets::*};

use crate::{
    ui::state::{Focussable, UiState},
    watch::Watcher,
};

pub struct DebugWidget<'a> {
    pub ui: &'a UiState,
    pub watcher: &'a Watcher,
}

impl Widget for DebugWidget<'_> {
    fn render(self, area: ratatui::layout::Rect, buf: &mut ratatui::buffer::Buffer) {
        let border_color = match self.ui.is_focussed(Focussable::Debug) {
            true => self.ui.theme.focus,
            false => self.ui.theme.text,
        };
        let panel_style = Style::default()
            .bg(self.ui.theme.surface)
            .fg(self.ui.theme.text);
        let paragraph = Paragraph::new(format!("{:#?}\n{:#?}", self.ui, self.watcher))
            .block(
                Block::bordered()
                    .title("Debug")
                    .title_alignment(Alignment::Left)
                    .border_style(Style::default().fg(border_color))
                    .border_type(BorderType::Rounded),
            )
            .alignment(HorizontalAlignment::Left)
            .wrap(Wrap { trim: false })
            .style(panel_style);
        paragraph.render(area, buf);
    }
}
