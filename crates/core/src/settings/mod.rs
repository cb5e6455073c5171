//! Settings aggregates.
//!
//! Each aggregate is a singleton document in the `settings` collection with a
//! compiled-in default. Updates are *shallow*: every top-level key present in
//! a partial update replaces the stored key wholesale, nested objects
//! included. See [`shallow_merge`].

pub mod application;
pub mod hours;
pub mod notification;
pub mod organization;

pub use application::{ApplicationSettings, ApplicationSettingsPatch, GlobalLimits};
pub use hours::{DayHours, HoursError, OpeningHours};
pub use notification::NotificationSettings;
pub use organization::{Contact, OrganizationSettings, OrganizationSettingsPatch, Theme};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::documents::DocumentPath;

/// A singleton settings document.
pub trait SettingsDocument:
    Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static
{
    /// Document id within the `settings` collection.
    const DOCUMENT_ID: &'static str;

    /// Where this aggregate is stored.
    #[must_use]
    fn path() -> DocumentPath {
        DocumentPath::settings(Self::DOCUMENT_ID)
    }

    /// Rewrite keys of a merged `document` whose stored form differs from
    /// the form clients may send. Called with the aggregate the document
    /// deserialized into; other keys are left as merged.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if a field cannot be re-encoded.
    fn encode_stored_keys(&self, _document: &mut Map<String, Value>) -> serde_json::Result<()> {
        Ok(())
    }
}

/// Overlay the top-level keys of `partial` onto `current`.
///
/// Nested objects are **not** merged: `{"Theme": {"Primary": "#F00"}}`
/// replaces the whole stored `Theme`, dropping its other fields.
pub fn shallow_merge(current: &mut Map<String, Value>, partial: Map<String, Value>) {
    for (key, value) in partial {
        current.insert(key, value);
    }
}

/// Serialize a typed patch into the top-level keys it sets.
///
/// # Errors
///
/// Returns an error if `patch` does not serialize to a JSON object.
pub fn to_partial<P: Serialize>(patch: &P) -> Result<Map<String, Value>, serde_json::Error> {
    match serde_json::to_value(patch)? {
        Value::Object(map) => Ok(map),
        other => Err(serde::ser::Error::custom(format!(
            "settings patch must be an object, got {other}"
        ))),
    }
}
