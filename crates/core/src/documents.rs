//! Stored document addresses and bootstrap records.
//!
//! Every record lives in a schemaless document store addressed by a
//! `(collection, id)` pair. The layout is fixed:
//!
//! ```text
//! system/initialization        InitializationMarker
//! admins/<normalized email>    AdminAccount
//! settings/organization        OrganizationSettings
//! settings/application         ApplicationSettings
//! settings/notifications       NotificationSettings
//! <business>/_placeholder      PlaceholderDocument (books, users, theses, departments, courses)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AdminRole, Email};

/// Collection holding the initialization marker.
pub const SYSTEM_COLLECTION: &str = "system";
/// Id of the initialization marker document.
pub const INITIALIZATION_DOCUMENT: &str = "initialization";
/// Collection holding admin accounts.
pub const ADMINS_COLLECTION: &str = "admins";
/// Collection holding the settings aggregates.
pub const SETTINGS_COLLECTION: &str = "settings";
/// Id used for placeholder documents.
pub const PLACEHOLDER_DOCUMENT: &str = "_placeholder";

/// Business collections that are forced into existence at bootstrap.
pub const BUSINESS_COLLECTIONS: [&str; 5] = ["books", "users", "theses", "departments", "courses"];

/// Schema version written into the initialization marker.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Address of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    collection: String,
    id: String,
}

impl DocumentPath {
    /// Create a path from a collection and a document id.
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// The collection name.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The document id within the collection.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Path of the initialization marker.
    #[must_use]
    pub fn initialization_marker() -> Self {
        Self::new(SYSTEM_COLLECTION, INITIALIZATION_DOCUMENT)
    }

    /// Path of a settings aggregate.
    #[must_use]
    pub fn settings(id: &str) -> Self {
        Self::new(SETTINGS_COLLECTION, id)
    }

    /// Path of an admin account, keyed by normalized email.
    #[must_use]
    pub fn admin(email: &Email) -> Self {
        Self::new(ADMINS_COLLECTION, email.as_str())
    }

    /// Path of a business collection's placeholder document.
    #[must_use]
    pub fn placeholder(collection: &str) -> Self {
        Self::new(collection, PLACEHOLDER_DOCUMENT)
    }
}

impl std::fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Singleton flag whose existence means the store has been bootstrapped.
///
/// Written once, in the same batch as the default settings, and never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializationMarker {
    pub initialized: bool,
    pub initialized_at: DateTime<Utc>,
    /// Email of the root administrator that ran the bootstrap.
    pub initialized_by: String,
    pub version: String,
}

/// An administrator account document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccount {
    /// Auth-provider user id when known, otherwise the normalized email.
    pub id: String,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Content-free document that makes a collection exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderDocument {
    pub placeholder: bool,
    pub created_at: DateTime<Utc>,
}
