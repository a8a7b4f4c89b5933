use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveDateTime, Utc};
use crossterm::event::{KeyCode, KeyEventKind};
use log::{debug, info, warn};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::db::repository::TrackedRepo;
use crate::error::ScheduleError;
use crate::models::{PrayerType, TrackedPrayerLog};
use crate::notify::{InboxNotifier, NotificationScheduler, NotificationSignal, PermissionSource};
use crate::prayer_times::calculator::load_store;
use crate::prayer_times::resolver::{countdowns, is_trackable, Countdown};
use crate::prayer_times::PrayerTimeStore;
use crate::tui::events::{Event, EventHandler};
use crate::tui::theme;
use crate::tui::widgets::{header, next_prayer, notifications, prayers, statusbar};
use crate::utils::hijri::hijri_string;

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Dashboard,
    Help,
}

pub struct App {
    pub view: View,
    pub config: AppConfig,
    pub focus_idx: usize,
    pub should_quit: bool,

    // Cached state (refreshed on tick/action)
    pub now: NaiveDateTime,
    pub today: NaiveDate,
    pub hijri_str: String,
    pub store: PrayerTimeStore,
    pub rows: Vec<Countdown>,
    pub tracked: TrackedPrayerLog,
    pub scheduler: NotificationScheduler,
    pub inbox: InboxNotifier,
    /// Last delivered reminder, shown until the next one.
    pub banner: Option<String>,
    /// One-line feedback for the last key press.
    pub status: Option<String>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let now = Local::now().naive_local();
        App {
            view: View::Dashboard,
            config,
            focus_idx: 0,
            should_quit: false,
            now,
            today: now.date(),
            hijri_str: String::new(),
            store: PrayerTimeStore::new(),
            rows: Vec::new(),
            tracked: TrackedPrayerLog::new(),
            scheduler: NotificationScheduler::new(),
            inbox: InboxNotifier::new(),
            banner: None,
            status: None,
        }
    }

    pub fn load(&mut self, conn: &Connection) -> Result<()> {
        self.load_at(conn, Local::now().naive_local())
    }

    /// Reload today's table and tracked marks, then re-arm reminders.
    pub fn load_at(&mut self, conn: &Connection, now: NaiveDateTime) -> Result<()> {
        self.now = now;
        self.today = now.date();
        self.hijri_str =
            hijri_string(self.today, self.config.salah.hijri_offset).unwrap_or_default();

        match load_store(conn, &self.config.salah, self.today) {
            Ok(store) => self.store = store,
            // Keep whatever table we had; the dashboard shows placeholders
            // when there is none.
            Err(e) => warn!("Could not load prayer times: {:#}", e),
        }
        self.tracked = TrackedRepo::load(conn)?;
        if !self.store.is_set() {
            self.status = Some("No prayer times for today".to_string());
        }
        self.refresh_rows();
        self.rearm();
        Ok(())
    }

    pub fn tick(&mut self, conn: &Connection) {
        self.tick_at(conn, Local::now().naive_local());
    }

    pub fn tick_at(&mut self, conn: &Connection, now: NaiveDateTime) {
        if now.date() != self.today {
            if let Err(e) = self.load_at(conn, now) {
                warn!("Reload on new day failed: {:#}", e);
            }
        }
        self.now = now;

        let fired = self.scheduler.tick(now, &self.inbox);
        if fired > 0 {
            debug!("{} reminder(s) fired, {} waiting", fired, self.inbox.len());
            if let Some(last) = self.inbox.drain().pop() {
                self.banner = Some(format!("{} · {}", last.title, last.body));
            }
        }
        self.refresh_rows();
    }

    fn refresh_rows(&mut self) {
        self.rows = match self.store.get() {
            Some(table) => countdowns(table, self.now),
            None => Vec::new(),
        };
    }

    fn notification_signal(&self) -> NotificationSignal {
        if self.config.notifications.enabled {
            NotificationSignal::Enabled
        } else {
            NotificationSignal::Disabled
        }
    }

    fn rearm(&mut self) {
        let result = self.scheduler.on_signal(
            self.notification_signal(),
            self.store.get(),
            self.now,
            self.config.notifications.permission(),
        );
        match result {
            Ok(n) => info!("{} prayer reminders scheduled", n),
            Err(ScheduleError::NotPermitted(p)) => {
                self.status = Some(format!(
                    "Reminders need permission ({}): run `waqt notifications grant`",
                    p
                ));
            }
            Err(e) => warn!("Scheduler error: {}", e),
        }
    }

    pub fn handle_key(&mut self, key: crossterm::event::KeyEvent, conn: &Connection) {
        // Some terminals also report release and repeat events
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.status = None;
        match self.view {
            View::Dashboard => self.handle_dashboard_key(key.code, conn),
            View::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                    self.view = View::Dashboard;
                }
            }
        }
    }

    fn handle_dashboard_key(&mut self, code: KeyCode, conn: &Connection) {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Char('?') => {
                self.view = View::Help;
            }
            KeyCode::Up => {
                self.focus_idx = self.focus_idx.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.focus_idx < PrayerType::ALL.len() - 1 {
                    self.focus_idx += 1;
                }
            }
            KeyCode::Char('m') | KeyCode::Enter => self.mark_focused(conn),
            KeyCode::Char('u') => self.unmark_focused(conn),
            KeyCode::Char('n') => self.toggle_notifications(),
            KeyCode::Char('r') => {
                if let Err(e) = self.load(conn) {
                    self.status = Some(format!("Reload failed: {}", e));
                } else {
                    self.status = Some("Reloaded".to_string());
                }
            }
            _ => {}
        }
    }

    fn focused_prayer(&self) -> PrayerType {
        PrayerType::ALL[self.focus_idx.min(PrayerType::ALL.len() - 1)]
    }

    pub fn mark_focused(&mut self, conn: &Connection) {
        let prayer = self.focused_prayer();
        let Some(table) = self.store.get() else {
            self.status = Some("No prayer times loaded".to_string());
            return;
        };
        if !is_trackable(prayer, table, self.now) {
            self.status = Some(format!("{} hasn't started yet", prayer.display_name()));
            return;
        }

        let at = Utc::now();
        match TrackedRepo::mark(conn, prayer, at) {
            Ok(()) => {
                self.tracked.mark(prayer, at);
                self.status = Some(format!("✓ {} marked as prayed", prayer.display_name()));
            }
            Err(e) => self.status = Some(format!("Could not save: {}", e)),
        }
    }

    fn unmark_focused(&mut self, conn: &Connection) {
        let prayer = self.focused_prayer();
        match TrackedRepo::clear(conn, prayer) {
            Ok(_) => {
                self.tracked.clear(prayer);
                self.status = Some(format!("{} unmarked", prayer.display_name()));
            }
            Err(e) => self.status = Some(format!("Could not save: {}", e)),
        }
    }

    fn toggle_notifications(&mut self) {
        self.config.notifications.enabled = !self.config.notifications.enabled;
        if let Err(e) = self.config.save() {
            warn!("Could not save config: {:#}", e);
        }
        self.status = Some(if self.config.notifications.enabled {
            "Reminders on".to_string()
        } else {
            "Reminders off".to_string()
        });
        self.rearm();
    }

    pub fn draw(&self, frame: &mut Frame) {
        self.draw_dashboard(frame);
        if self.view == View::Help {
            self.draw_help_overlay(frame);
        }
    }

    fn draw_dashboard(&self, frame: &mut Frame) {
        let area = frame.area();

        // Clear background
        frame.render_widget(Block::default().style(theme::base()), area);

        let outer_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5), // header
                Constraint::Min(0),    // body
                Constraint::Length(1), // status bar
            ])
            .split(area);

        header::render(
            frame,
            outer_chunks[0],
            &self.hijri_str,
            self.store.location().unwrap_or("No location"),
            self.now,
        );
        statusbar::render(frame, outer_chunks[2], self.status.as_deref());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(outer_chunks[1]);

        prayers::render(
            frame,
            columns[0],
            &self.rows,
            &self.tracked,
            &self.scheduler,
            self.focus_idx,
        );

        let right_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(7), // next prayer
                Constraint::Min(0),    // reminders
            ])
            .split(columns[1]);

        next_prayer::render(frame, right_chunks[0], self.rows.iter().find(|r| r.is_next));
        notifications::render(
            frame,
            right_chunks[1],
            &notifications::ReminderState {
                enabled: self.config.notifications.enabled,
                permission: self.config.notifications.permission(),
                armed: self.scheduler.len(),
                next: self.scheduler.next_due().copied(),
                banner: self.banner.as_deref(),
            },
        );
    }

    fn draw_help_overlay(&self, frame: &mut Frame) {
        let area = frame.area();

        let popup_area = Rect {
            x: area.width / 4,
            y: area.height / 4,
            width: area.width / 2,
            height: area.height / 2,
        };

        frame.render_widget(Clear, popup_area);

        let keys = [
            ("  [m] / Enter  ", "Mark prayer as prayed"),
            ("  [u]          ", "Clear the mark"),
            ("  [n]          ", "Toggle prayer reminders"),
            ("  [r]          ", "Reload prayer times"),
            ("  [↑ ↓]        ", "Navigate prayers"),
            ("  [?]          ", "Toggle help"),
            ("  [Esc] / [q]  ", "Quit"),
        ];

        let mut help_text = vec![
            Line::from(Span::styled(
                "  Keybindings",
                theme::gold().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        help_text.extend(keys.iter().map(|(key, label)| {
            Line::from(vec![
                Span::styled(*key, theme::gold()),
                Span::styled(*label, theme::dim()),
            ])
        }));

        let block = Block::default()
            .title(Span::styled(" Help ", theme::gold()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::gold())
            .style(theme::surface());

        let paragraph = Paragraph::new(help_text).block(block);
        frame.render_widget(paragraph, popup_area);
    }
}

/// Run the TUI event loop.
pub fn run(conn: Connection, config: AppConfig) -> Result<()> {
    let tick_ms = config.display.refresh_ms.max(100);
    let mut app = App::new(config);
    app.load(&conn)?;

    let mut terminal = ratatui::init();
    let events = EventHandler::new(tick_ms);

    let result = loop {
        if let Err(e) = terminal.draw(|frame| app.draw(frame)) {
            break Err(e.into());
        }

        match events.next() {
            Ok(Event::Key(key)) => {
                app.handle_key(key, &conn);
                if app.should_quit {
                    break Ok(());
                }
            }
            Ok(Event::Tick) => app.tick(&conn),
            Err(e) => break Err(e.into()),
        }
    };

    ratatui::restore();
    result
}
