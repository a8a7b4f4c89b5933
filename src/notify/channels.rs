use log::{debug, warn};
use std::collections::VecDeque;
use std::io::Write;
use std::process::Command;
use std::sync::Mutex;

use crate::error::DeliveryError;
use crate::notify::{Notifier, PrayerNotification};

/// Prints notifications to stdout, optionally ringing the terminal bell.
pub struct ConsoleNotifier {
    pub bell: bool,
}

impl Notifier for ConsoleNotifier {
    fn name(&self) -> &'static str {
        "console"
    }

    fn show(&self, n: &PrayerNotification) -> Result<(), DeliveryError> {
        let mut out = std::io::stdout().lock();
        let bell = if self.bell { "\x07" } else { "" };
        let now = chrono::Local::now().format("%H:%M");
        writeln!(out, "{}[{}] {} · {}", bell, now, n.title, n.body)
            .and_then(|_| out.flush())
            .map_err(|source| DeliveryError::Io {
                channel: "console",
                source,
            })
    }
}

/// Runs a desktop notification command (e.g. `notify-send`) with the title
/// and body appended as the last two arguments.
pub struct CommandNotifier {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandNotifier {
    /// Split a configured command line on whitespace.
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl Notifier for CommandNotifier {
    fn name(&self) -> &'static str {
        "command"
    }

    fn show(&self, n: &PrayerNotification) -> Result<(), DeliveryError> {
        debug!("Running {} for {}", self.program, n.tag);
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&n.title)
            .arg(&n.body)
            .status()
            .map_err(|source| DeliveryError::Io {
                channel: "command",
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(DeliveryError::Exit {
                channel: "command",
                status: status.to_string(),
            })
        }
    }
}

/// Tries `primary` first and falls back to `secondary` when it fails.
pub struct FallbackNotifier<P, S> {
    pub primary: P,
    pub secondary: S,
}

impl<P: Notifier, S: Notifier> Notifier for FallbackNotifier<P, S> {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    fn show(&self, n: &PrayerNotification) -> Result<(), DeliveryError> {
        match self.primary.show(n) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(
                    "{} channel failed ({}), falling back to {}",
                    self.primary.name(),
                    e,
                    self.secondary.name()
                );
                self.secondary.show(n)
            }
        }
    }
}

/// Queues notifications for a host that renders them itself (the dashboard
/// banner).
#[derive(Default)]
pub struct InboxNotifier {
    queue: Mutex<VecDeque<PrayerNotification>>,
}

impl InboxNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<PrayerNotification> {
        match self.queue.lock() {
            Ok(mut q) => q.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }
}

impl Notifier for InboxNotifier {
    fn name(&self) -> &'static str {
        "inbox"
    }

    fn show(&self, n: &PrayerNotification) -> Result<(), DeliveryError> {
        let mut q = self.queue.lock().map_err(|_| DeliveryError::Closed("inbox"))?;
        q.push_back(n.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PrayerType;

    struct Broken;

    impl Notifier for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn show(&self, _: &PrayerNotification) -> Result<(), DeliveryError> {
            Err(DeliveryError::Closed("broken"))
        }
    }

    #[test]
    fn fallback_uses_secondary_on_failure() {
        let chain = FallbackNotifier {
            primary: Broken,
            secondary: InboxNotifier::new(),
        };
        chain
            .show(&PrayerNotification::for_prayer(PrayerType::Isha))
            .unwrap();
        assert_eq!(chain.secondary.drain()[0].prayer, PrayerType::Isha);
    }

    #[test]
    fn fallback_skips_secondary_when_primary_works() {
        let chain = FallbackNotifier {
            primary: InboxNotifier::new(),
            secondary: InboxNotifier::new(),
        };
        chain
            .show(&PrayerNotification::for_prayer(PrayerType::Fajr))
            .unwrap();
        assert_eq!(chain.primary.len(), 1);
        assert_eq!(chain.secondary.len(), 0);
    }

    #[test]
    fn command_line_parsing() {
        let cmd = CommandNotifier::parse("notify-send -u critical").unwrap();
        assert_eq!(cmd.program, "notify-send");
        assert_eq!(cmd.args, vec!["-u", "critical"]);
        assert!(CommandNotifier::parse("   ").is_none());
    }

    #[test]
    fn missing_command_is_a_delivery_error() {
        let cmd = CommandNotifier::parse("waqt-test-no-such-program").unwrap();
        let err = cmd
            .show(&PrayerNotification::for_prayer(PrayerType::Asr))
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Io { channel: "command", .. }));
    }
}
