use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CEvent, KeyEvent};
use log::debug;

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    /// Countdown refresh; also drives the reminder scheduler.
    Tick,
}

/// Terminal input and the refresh tick, merged onto one channel by a
/// reader thread.
pub struct EventHandler {
    rx: mpsc::Receiver<Event>,
}

impl EventHandler {
    pub fn new(tick_ms: u64) -> Self {
        let (tx, rx) = mpsc::channel();
        let tick_rate = Duration::from_millis(tick_ms);

        thread::spawn(move || {
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate.saturating_sub(last_tick.elapsed());

                if event::poll(timeout).unwrap_or(false) {
                    let forwarded = match event::read() {
                        Ok(CEvent::Key(key)) => tx.send(Event::Key(key)).is_ok(),
                        // Redraw right away so the layout follows the new size.
                        Ok(CEvent::Resize(..)) => tx.send(Event::Tick).is_ok(),
                        Ok(_) => true,
                        Err(e) => {
                            debug!("Terminal input closed: {}", e);
                            false
                        }
                    };
                    if !forwarded {
                        break;
                    }
                }

                if last_tick.elapsed() >= tick_rate {
                    if tx.send(Event::Tick).is_err() {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Self { rx }
    }

    pub fn next(&self) -> Result<Event, mpsc::RecvError> {
        self.rx.recv()
    }
}
