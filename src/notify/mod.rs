pub mod channels;
pub mod driver;
pub mod scheduler;

use serde::{Deserialize, Serialize};

use crate::error::DeliveryError;
use crate::models::PrayerType;

pub use channels::{CommandNotifier, ConsoleNotifier, FallbackNotifier, InboxNotifier};
pub use driver::SchedulerDriver;
pub use scheduler::{NotificationScheduler, ScheduledNotification};

/// Platform notification permission, mirroring the browser's tri-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    #[default]
    Prompt,
}

impl Permission {
    pub fn is_granted(&self) -> bool {
        matches!(self, Permission::Granted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Granted => "granted",
            Permission::Denied => "denied",
            Permission::Prompt => "prompt",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of the current notification permission.
pub trait PermissionSource {
    fn permission(&self) -> Permission;
}

/// External enable/disable event raised by the settings surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSignal {
    Enabled,
    Disabled,
}

/// What a channel is asked to show when a prayer comes in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrayerNotification {
    pub prayer: PrayerType,
    pub title: String,
    pub body: String,
    pub tag: String,
}

impl PrayerNotification {
    pub fn for_prayer(prayer: PrayerType) -> Self {
        let name = prayer.display_name();
        Self {
            prayer,
            title: format!("Hey, it’s time to pray {} ❤️", name),
            body: format!("It's prayer time for {}.", name),
            tag: format!("prayer-{}", name),
        }
    }
}

/// A channel that can put a notification in front of the user.
pub trait Notifier {
    fn name(&self) -> &'static str;

    fn show(&self, notification: &PrayerNotification) -> Result<(), DeliveryError>;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn show(&self, notification: &PrayerNotification) -> Result<(), DeliveryError> {
        (**self).show(notification)
    }
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn show(&self, notification: &PrayerNotification) -> Result<(), DeliveryError> {
        (**self).show(notification)
    }
}
