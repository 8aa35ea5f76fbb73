pub mod admin_panel;
pub mod funding_panel;
pub mod notifier;
pub mod voting_panel;

pub use admin_panel::{AdminPanel, AdminView, LifecycleAction};
pub use funding_panel::{FundingPanel, FundingView};
pub use notifier::{ConsoleNotifier, Notification, NotificationLevel, Notifier};
pub use voting_panel::{VotingPanel, VotingView};
