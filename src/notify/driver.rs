use chrono::{Local, NaiveDateTime};
use log::{debug, warn};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::ScheduleError;
use crate::models::PrayerTable;
use crate::notify::{
    NotificationScheduler, NotificationSignal, Notifier, Permission, ScheduledNotification,
};

/// Wall clock used by the driver thread.
pub trait Clock: Send {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

enum Command {
    Table(PrayerTable),
    Signal(NotificationSignal),
    Permission(Permission),
    Snapshot,
    Shutdown,
}

enum Reply {
    Armed(Result<usize, ScheduleError>),
    Snapshot(Vec<ScheduledNotification>),
}

struct Request {
    command: Command,
    reply: mpsc::Sender<Reply>,
}

/// Current inputs of the scheduler kept by the worker thread.
struct WorkerState {
    scheduler: NotificationScheduler,
    table: Option<PrayerTable>,
    permission: Permission,
    enabled: bool,
}

impl WorkerState {
    fn rearm(&mut self, now: NaiveDateTime) -> Result<usize, ScheduleError> {
        let signal = if self.enabled {
            NotificationSignal::Enabled
        } else {
            NotificationSignal::Disabled
        };
        self.scheduler
            .on_signal(signal, self.table.as_ref(), now, self.permission)
    }
}

/// Hosts a `NotificationScheduler` on a background thread.
///
/// Every operation goes through one command channel and is acknowledged
/// before the call returns, so the scheduler only ever sees serialized
/// calls and a disable takes effect before the caller moves on.
pub struct SchedulerDriver {
    tx: mpsc::Sender<Request>,
    worker: Option<JoinHandle<()>>,
}

impl SchedulerDriver {
    pub fn spawn<N, C>(
        notifier: N,
        clock: C,
        permission: Permission,
        enabled: bool,
        tick_rate: Duration,
    ) -> Self
    where
        N: Notifier + Send + 'static,
        C: Clock + 'static,
    {
        let (tx, rx) = mpsc::channel::<Request>();

        let worker = thread::spawn(move || {
            let mut state = WorkerState {
                scheduler: NotificationScheduler::new(),
                table: None,
                permission,
                enabled,
            };

            loop {
                match rx.recv_timeout(tick_rate) {
                    Ok(Request { command, reply }) => {
                        let now = clock.now();
                        let response = match command {
                            Command::Table(table) => {
                                state.table = Some(table);
                                Reply::Armed(state.rearm(now))
                            }
                            Command::Signal(signal) => {
                                state.enabled = signal == NotificationSignal::Enabled;
                                Reply::Armed(state.rearm(now))
                            }
                            Command::Permission(permission) => {
                                state.permission = permission;
                                Reply::Armed(state.rearm(now))
                            }
                            Command::Snapshot => {
                                Reply::Snapshot(state.scheduler.pending().copied().collect())
                            }
                            Command::Shutdown => {
                                state.scheduler.cancel_all();
                                let _ = reply.send(Reply::Armed(Ok(0)));
                                break;
                            }
                        };
                        if reply.send(response).is_err() {
                            debug!("Scheduler caller went away before the reply");
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }

                state.scheduler.tick(clock.now(), &notifier);
            }
            debug!("Scheduler worker stopped");
        });

        Self {
            tx,
            worker: Some(worker),
        }
    }

    fn request(&self, command: Command) -> Result<Reply, ScheduleError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(Request {
                command,
                reply: reply_tx,
            })
            .map_err(|_| ScheduleError::Stopped)?;
        reply_rx.recv().map_err(|_| ScheduleError::Stopped)
    }

    fn armed(&self, command: Command) -> Result<usize, ScheduleError> {
        match self.request(command)? {
            Reply::Armed(result) => result,
            Reply::Snapshot(_) => Err(ScheduleError::Stopped),
        }
    }

    /// A new table replaces the schedule (re-armed when enabled).
    pub fn set_table(&self, table: PrayerTable) -> Result<usize, ScheduleError> {
        self.armed(Command::Table(table))
    }

    pub fn signal(&self, signal: NotificationSignal) -> Result<usize, ScheduleError> {
        self.armed(Command::Signal(signal))
    }

    pub fn set_permission(&self, permission: Permission) -> Result<usize, ScheduleError> {
        self.armed(Command::Permission(permission))
    }

    pub fn snapshot(&self) -> Vec<ScheduledNotification> {
        match self.request(Command::Snapshot) {
            Ok(Reply::Snapshot(entries)) => entries,
            _ => Vec::new(),
        }
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.request(Command::Shutdown);
            if worker.join().is_err() {
                warn!("Scheduler worker panicked");
            }
        }
    }
}

impl Drop for SchedulerDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PrayerType;
    use crate::notify::InboxNotifier;
    use chrono::{NaiveDate, NaiveTime};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    #[derive(Clone)]
    struct ManualClock(Arc<Mutex<NaiveDateTime>>);

    impl ManualClock {
        fn set(&self, t: NaiveDateTime) {
            *self.0.lock().unwrap() = t;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> NaiveDateTime {
            *self.0.lock().unwrap()
        }
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap().and_time(hm(h, m))
    }

    fn table() -> PrayerTable {
        PrayerTable {
            fajr: hm(5, 0),
            dhuhr: hm(12, 30),
            asr: hm(16, 0),
            maghrib: hm(19, 45),
            isha: hm(21, 15),
        }
    }

    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    fn start(permission: Permission) -> (SchedulerDriver, ManualClock, Arc<InboxNotifier>) {
        let clock = ManualClock(Arc::new(Mutex::new(at(18, 0))));
        let inbox = Arc::new(InboxNotifier::new());
        let driver = SchedulerDriver::spawn(
            inbox.clone(),
            clock.clone(),
            permission,
            true,
            Duration::from_millis(5),
        );
        (driver, clock, inbox)
    }

    #[test]
    fn delivers_when_clock_reaches_fire_time() {
        let (driver, clock, inbox) = start(Permission::Granted);
        assert_eq!(driver.set_table(table()), Ok(5));

        clock.set(at(19, 45));
        assert!(wait_for(|| inbox.len() == 1));
        assert_eq!(inbox.drain()[0].prayer, PrayerType::Maghrib);

        let maghrib = driver
            .snapshot()
            .into_iter()
            .find(|e| e.prayer == PrayerType::Maghrib)
            .unwrap();
        assert_eq!(maghrib.fire_at, at(19, 45) + chrono::Duration::hours(24));
        drop(driver);
    }

    #[test]
    fn disable_is_synchronous() {
        let (driver, clock, inbox) = start(Permission::Granted);
        driver.set_table(table()).unwrap();
        assert_eq!(driver.signal(NotificationSignal::Disabled), Ok(0));
        assert!(driver.snapshot().is_empty());

        clock.set(at(23, 0));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(inbox.len(), 0);
    }

    #[test]
    fn granting_permission_arms_existing_table() {
        let (driver, _clock, _inbox) = start(Permission::Denied);
        assert_eq!(
            driver.set_table(table()),
            Err(ScheduleError::NotPermitted(Permission::Denied))
        );
        assert!(driver.snapshot().is_empty());

        assert_eq!(driver.set_permission(Permission::Granted), Ok(5));
        assert_eq!(driver.snapshot().len(), 5);
    }
}
