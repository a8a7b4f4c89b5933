use chrono::NaiveDateTime;
use ratatui::{
    layout::{Alignment, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::tui::theme;

pub fn render(frame: &mut Frame, area: Rect, hijri_str: &str, location: &str, now: NaiveDateTime) {
    let gregorian_str = now.format("%A, %b %d, %Y").to_string();
    let clock_str = now.format("%H:%M:%S").to_string();

    let title_line = Line::from(vec![
        Span::styled("  وقت  ", theme::gold().add_modifier(Modifier::BOLD)),
        Span::styled("waqt", theme::gold()),
        Span::styled("  ·  ", theme::dim()),
        Span::styled(location, theme::dim()),
    ]);

    let mut date_spans = Vec::new();
    if !hijri_str.is_empty() {
        date_spans.push(Span::styled(hijri_str, theme::amber()));
        date_spans.push(Span::styled("  ·  ", theme::dim()));
    }
    date_spans.push(Span::styled(gregorian_str, theme::dim()));
    date_spans.push(Span::styled("  ·  ", theme::dim()));
    date_spans.push(Span::styled(clock_str, theme::bold()));

    let text = vec![title_line, Line::from(""), Line::from(date_spans)];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::gold().add_modifier(Modifier::BOLD))
        .style(theme::base());

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}
