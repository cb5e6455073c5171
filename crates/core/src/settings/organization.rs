//! Organization profile settings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

use super::SettingsDocument;
use super::hours::{OpeningHours, validate_opening_hours};
use crate::theme;

/// Default number of loans a member may hold at once.
pub const DEFAULT_MAXIMUM_SIMULTANEOUS_LOANS: u32 = 3;
/// Default primary theme colour.
pub const DEFAULT_PRIMARY_COLOR: &str = "#1E40AF";
/// Default secondary theme colour.
pub const DEFAULT_SECONDARY_COLOR: &str = "#F59E0B";

/// The organization profile aggregate stored at `settings/organization`.
///
/// Every field has a serde default so that partially written documents
/// still load; a nested object that was overwritten without some of its
/// fields reads those fields back as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct OrganizationSettings {
    #[serde(default)]
    #[validate(length(min = 1, max = 120, message = "Organization name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 300, message = "Address is too long"))]
    pub address: String,
    #[serde(default)]
    #[validate(nested)]
    pub contact: Contact,
    #[serde(default = "default_maximum_simultaneous_loans")]
    #[validate(range(min = 1, max = 50, message = "Must be between 1 and 50"))]
    pub maximum_simultaneous_loans: u32,
    #[serde(default)]
    #[validate(nested)]
    pub theme: Theme,
    #[serde(default)]
    #[validate(custom(function = "validate_opening_hours"))]
    pub opening_hours: OpeningHours,
    #[serde(default)]
    pub late_return_penalties: Vec<String>,
    #[serde(default)]
    pub specific_borrowing_rules: Vec<String>,
    /// URL of the uploaded logo, or an inline `data:` URL.
    #[serde(default)]
    pub logo: String,
}

const fn default_maximum_simultaneous_loans() -> u32 {
    DEFAULT_MAXIMUM_SIMULTANEOUS_LOANS
}

impl Default for OrganizationSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            address: String::new(),
            contact: Contact::default(),
            maximum_simultaneous_loans: DEFAULT_MAXIMUM_SIMULTANEOUS_LOANS,
            theme: Theme::default(),
            opening_hours: OpeningHours::default(),
            late_return_penalties: Vec::new(),
            specific_borrowing_rules: Vec::new(),
            logo: String::new(),
        }
    }
}

impl OrganizationSettings {
    /// An organization counts as configured once it has a name and a
    /// contact email. This gates the exit from the configuration phase.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.name.is_empty() && !self.contact.email.is_empty()
    }
}

impl SettingsDocument for OrganizationSettings {
    const DOCUMENT_ID: &'static str = "organization";

    /// Opening hours are always stored day by day in the string encoding,
    /// whatever shape the update carried.
    fn encode_stored_keys(&self, document: &mut Map<String, Value>) -> serde_json::Result<()> {
        document.insert(
            OPENING_HOURS_KEY.to_owned(),
            serde_json::to_value(&self.opening_hours)?,
        );
        Ok(())
    }
}

/// Top-level key of the opening hours.
const OPENING_HOURS_KEY: &str = "OpeningHours";

/// Public contact channels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct Contact {
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 40))]
    pub phone: String,
    #[serde(default, rename = "WhatsApp")]
    #[validate(length(max = 40))]
    pub whatsapp: String,
    #[serde(default)]
    pub facebook: String,
    #[serde(default)]
    pub instagram: String,
}

/// Stored theme colours as hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "PascalCase")]
pub struct Theme {
    #[serde(default)]
    #[validate(custom(function = "validate_hex_color"))]
    pub primary: String,
    #[serde(default)]
    #[validate(custom(function = "validate_hex_color"))]
    pub secondary: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: DEFAULT_PRIMARY_COLOR.to_owned(),
            secondary: DEFAULT_SECONDARY_COLOR.to_owned(),
        }
    }
}

fn validate_hex_color(value: &str) -> Result<(), ValidationError> {
    theme::parse_hex(value).map(|_| ()).map_err(|e| {
        let mut error = ValidationError::new("hex_color");
        error.message = Some(e.to_string().into());
        error
    })
}

/// A partial update to [`OrganizationSettings`].
///
/// Only the fields that are `Some` are serialized, and each one replaces the
/// stored top-level key wholesale. Nested objects such as `Contact` must be
/// sent complete.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrganizationSettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_simultaneous_loans: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<OpeningHours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late_return_penalties: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific_borrowing_rules: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}
