use std::fmt;

use tracing::{error, info};

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NotificationLevel::Error, message: message.into() }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            NotificationLevel::Info => write!(f, "{}", self.message),
            NotificationLevel::Error => write!(f, "[error] {}", self.message),
        }
    }
}

/// Where panels report outcomes to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Prints notifications to the terminal
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => {
                info!("{}", notification.message);
                println!("{}", notification);
            }
            NotificationLevel::Error => {
                error!("{}", notification.message);
                eprintln!("{}", notification);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every notification for later assertions
    #[derive(Default)]
    pub struct RecordingNotifier {
        notifications: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        pub fn messages(&self) -> Vec<String> {
            self.notifications.lock().unwrap().iter().map(|n| n.message.clone()).collect()
        }

        pub fn errors(&self) -> Vec<String> {
            self.notifications
                .lock()
                .unwrap()
                .iter()
                .filter(|n| n.level == NotificationLevel::Error)
                .map(|n| n.message.clone())
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            self.notifications.lock().unwrap().push(notification);
        }
    }
}
