//! Notification settings, written once at bootstrap.

use serde::{Deserialize, Serialize};

use super::SettingsDocument;

/// Notification defaults stored at `settings/notifications`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotificationSettings {
    pub email_enabled: bool,
    /// Days before the due date at which members are reminded.
    pub due_date_reminder_days: u32,
    /// Days between repeated overdue notices.
    pub overdue_notice_interval_days: u32,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_enabled: true,
            due_date_reminder_days: 2,
            overdue_notice_interval_days: 7,
        }
    }
}

impl SettingsDocument for NotificationSettings {
    const DOCUMENT_ID: &'static str = "notifications";
}
