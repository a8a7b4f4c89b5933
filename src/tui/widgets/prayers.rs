use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem},
    Frame,
};

use crate::models::{PrayerType, TrackedPrayerLog};
use crate::notify::NotificationScheduler;
use crate::prayer_times::resolver::Countdown;
use crate::tui::theme;
use crate::utils::format::{format_time_or_placeholder, COUNTDOWN_PLACEHOLDER};

/// One line per prayer in canonical order. Without a table every time and
/// countdown shows a placeholder.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    rows: &[Countdown],
    tracked: &TrackedPrayerLog,
    reminders: &NotificationScheduler,
    focused_idx: usize,
) {
    let block = Block::default()
        .title(Span::styled(" Prayers ", theme::gold()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::gold())
        .style(theme::surface());

    let items: Vec<ListItem> = PrayerType::ALL
        .iter()
        .enumerate()
        .map(|(i, prayer)| {
            let row = rows.iter().find(|r| r.prayer == *prayer);
            let is_focused = i == focused_idx;

            let time_str = row
                .map(|r| r.time.clone())
                .unwrap_or_else(|| format_time_or_placeholder(None));
            let remaining = row
                .map(|r| r.remaining.clone())
                .unwrap_or_else(|| COUNTDOWN_PLACEHOLDER.to_string());

            let name_style = if is_focused {
                theme::gold().add_modifier(Modifier::BOLD)
            } else {
                theme::bold()
            };

            let remaining_style = match row {
                Some(r) if r.is_next => theme::amber().add_modifier(Modifier::BOLD),
                _ => theme::dim(),
            };

            let (icon, icon_style) = if tracked.is_marked(*prayer) {
                ("●", theme::green())
            } else if row.is_some_and(|r| r.trackable) {
                ("○", theme::amber())
            } else {
                ("○", theme::dim())
            };

            let bell = if reminders.get(*prayer).is_some() { " 🔔" } else { "  " };

            let day = match row {
                Some(r) if r.occurrence.is_tomorrow() => " tomorrow",
                _ => "",
            };

            let line = Line::from(vec![
                Span::styled(format!("  {:<8}", prayer.display_name()), name_style),
                Span::styled(format!("{:<7}", time_str), theme::dim()),
                Span::styled(icon, icon_style),
                Span::styled(bell, theme::gold()),
                Span::styled(" in ", theme::dim()),
                Span::styled(format!("{:<8}", remaining), remaining_style),
                Span::styled(day, theme::dim()),
            ]);

            ListItem::new(line)
        })
        .collect();

    let list = List::new(items).block(block);
    frame.render_widget(list, area);
}
