use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::tui::theme;

/// Key hints, or the feedback for the last action when there is one.
pub fn render(frame: &mut Frame, area: Rect, message: Option<&str>) {
    let line = match message {
        Some(msg) => Line::from(Span::styled(msg, theme::amber())),
        None => {
            let hints = [
                ("[m]", " mark  "),
                ("[u]", " unmark  "),
                ("[n]", " reminders  "),
                ("[r]", " reload  "),
                ("[?]", " help  "),
                ("[Esc]", " quit"),
            ];
            let mut spans = Vec::new();
            for (key, label) in hints {
                spans.push(Span::styled(key, theme::gold()));
                spans.push(Span::styled(label, theme::dim()));
            }
            Line::from(spans)
        }
    };

    let paragraph = Paragraph::new(line).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}
