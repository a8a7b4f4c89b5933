use ratatui::{
    layout::{Alignment, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};

use crate::prayer_times::resolver::Countdown;
use crate::tui::theme;

pub fn render(frame: &mut Frame, area: Rect, next: Option<&Countdown>) {
    let block = Block::default()
        .title(Span::styled(" Next Prayer ", theme::gold()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border())
        .style(theme::surface());

    let content: Vec<Line> = match next {
        None => vec![
            Line::from(""),
            Line::from(Span::styled("  No prayer times loaded", theme::dim())),
        ],
        Some(row) => {
            let name = row.prayer.display_name().to_uppercase();
            vec![
                Line::from(""),
                Line::from(vec![
                    Span::styled(format!("  {}", name), theme::gold().add_modifier(Modifier::BOLD)),
                    Span::styled(format!("  at {}", row.time), theme::dim()),
                ]),
                Line::from(""),
                Line::from(vec![
                    Span::styled("  in  ", theme::dim()),
                    Span::styled(
                        row.remaining.as_str(),
                        theme::amber().add_modifier(Modifier::BOLD),
                    ),
                ]),
            ]
        }
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}
