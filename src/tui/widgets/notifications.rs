use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

use crate::notify::{Permission, ScheduledNotification};
use crate::tui::theme;

pub struct ReminderState<'a> {
    pub enabled: bool,
    pub permission: Permission,
    pub armed: usize,
    pub next: Option<ScheduledNotification>,
    pub banner: Option<&'a str>,
}

pub fn render(frame: &mut Frame, area: Rect, state: &ReminderState<'_>) {
    let block = Block::default()
        .title(Span::styled(" Reminders ", theme::gold()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border())
        .style(theme::surface());

    let (switch, switch_style) = if state.enabled {
        ("on", theme::green())
    } else {
        ("off", theme::dim())
    };
    let permission_style = match state.permission {
        Permission::Granted => theme::green(),
        Permission::Denied => theme::red(),
        Permission::Prompt => theme::amber(),
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Reminders   ", theme::dim()),
            Span::styled(switch, switch_style),
        ]),
        Line::from(vec![
            Span::styled("  Permission  ", theme::dim()),
            Span::styled(state.permission.as_str(), permission_style),
        ]),
    ];

    lines.push(Line::from(vec![
        Span::styled("  Scheduled   ", theme::dim()),
        Span::styled(format!("{}/5", state.armed), theme::bold()),
    ]));

    if let Some(next) = state.next {
        lines.push(Line::from(vec![
            Span::styled("  Next        ", theme::dim()),
            Span::styled(
                format!("{} {}", next.prayer.display_name(), next.fire_at.format("%a %H:%M")),
                theme::bold(),
            ),
        ]));
    }

    if let Some(banner) = state.banner {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  🔔 {}", banner),
            theme::gold().add_modifier(Modifier::BOLD),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}
