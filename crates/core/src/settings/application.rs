//! Application-wide settings.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::SettingsDocument;

/// Default loan duration in days.
pub const DEFAULT_LOAN_DURATION_DAYS: u32 = 14;

/// The application settings aggregate stored at `settings/application`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicationSettings {
    #[serde(default = "default_app_version")]
    pub app_version: String,
    /// Loan duration in days.
    #[serde(default = "default_loan_duration")]
    #[validate(range(min = 1, max = 365, message = "Must be between 1 and 365 days"))]
    pub default_loan_duration: u32,
    #[serde(default)]
    #[validate(nested)]
    pub global_limits: GlobalLimits,
    #[serde(default)]
    pub maintenance_mode: bool,
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_owned()
}

const fn default_loan_duration() -> u32 {
    DEFAULT_LOAN_DURATION_DAYS
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            app_version: default_app_version(),
            default_loan_duration: DEFAULT_LOAN_DURATION_DAYS,
            global_limits: GlobalLimits::default(),
            maintenance_mode: false,
        }
    }
}

impl SettingsDocument for ApplicationSettings {
    const DOCUMENT_ID: &'static str = "application";
}

/// Per-member limits applied across the whole library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct GlobalLimits {
    #[serde(default)]
    #[validate(range(min = 1, max = 100))]
    pub max_loans_per_user: u32,
    #[serde(default)]
    #[validate(range(max = 100))]
    pub max_reservations_per_user: u32,
    #[serde(default)]
    #[validate(range(max = 20))]
    pub max_renewals: u32,
}

impl Default for GlobalLimits {
    fn default() -> Self {
        Self {
            max_loans_per_user: 5,
            max_reservations_per_user: 3,
            max_renewals: 2,
        }
    }
}

/// A partial update to [`ApplicationSettings`]; see
/// [`OrganizationSettingsPatch`](super::OrganizationSettingsPatch) for the
/// replacement semantics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApplicationSettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_loan_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_limits: Option<GlobalLimits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_mode: Option<bool>,
}
