//! Integration tests for the bootstrap lifecycle.
//!
//! Drive the prober, initializer and settings store against the in-memory
//! document store.

#![allow(clippy::unwrap_used)]

use serde_json::{Map, Value, json};

use libris_admin::db::{AdminAccountRepository, AdminProfile, SettingsStore};
use libris_admin::lifecycle::{Initializer, LifecycleError, StateProber};
use libris_admin::store::{DocumentStore, MemoryDocumentStore, get_typed, set_typed};
use libris_core::{
    AdminRole, BUSINESS_COLLECTIONS, DayHours, DocumentPath, Email, InitializationMarker,
    OrganizationSettings, Phase, SettingsDocument,
};

fn root() -> AdminProfile {
    AdminProfile {
        name: "A".to_owned(),
        email: Email::parse("a@b.com").unwrap(),
        uid: None,
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

async fn probe(store: &MemoryDocumentStore, signed_in: bool) -> Phase {
    StateProber::new(store).probe_signed_in(signed_in).await
}

// ============================================================================
// Phase scenarios
// ============================================================================

#[tokio::test]
async fn test_empty_store_needs_initialization() {
    let store = MemoryDocumentStore::new();
    assert_eq!(probe(&store, false).await, Phase::NeedsInitialization);
    assert_eq!(probe(&store, true).await, Phase::NeedsInitialization);
}

#[tokio::test]
async fn test_marker_without_session_needs_authentication() {
    let store = MemoryDocumentStore::new();
    Initializer::new(&store).initialize(&root()).await.unwrap();

    assert_eq!(probe(&store, false).await, Phase::NeedsAuthentication);
}

#[tokio::test]
async fn test_absent_organization_reads_default_and_needs_configuration() {
    let store = MemoryDocumentStore::new();
    set_typed(
        &store,
        &DocumentPath::initialization_marker(),
        &json!({ "initialized": true }),
    )
    .await
    .unwrap();

    let organization = SettingsStore::<OrganizationSettings>::new(&store)
        .get()
        .await
        .unwrap();
    assert_eq!(organization.name, "");
    assert_eq!(probe(&store, true).await, Phase::NeedsConfiguration);
}

#[tokio::test]
async fn test_configured_organization_is_ready() {
    let store = MemoryDocumentStore::new();
    Initializer::new(&store).initialize(&root()).await.unwrap();
    assert_eq!(probe(&store, true).await, Phase::NeedsConfiguration);

    SettingsStore::<OrganizationSettings>::new(&store)
        .update(object(json!({
            "Name": "Central Library",
            "Contact": {
                "Email": "x@y.com",
                "Phone": "1",
                "WhatsApp": "",
                "Facebook": "",
                "Instagram": ""
            }
        })))
        .await
        .unwrap();

    assert_eq!(probe(&store, true).await, Phase::Ready);
}

#[tokio::test]
async fn test_initialize_writes_marker() {
    let store = MemoryDocumentStore::new();
    Initializer::new(&store).initialize(&root()).await.unwrap();

    let marker = store
        .get(&DocumentPath::initialization_marker())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(marker["initialized"], json!(true));
    assert_eq!(marker["initializedBy"], json!("a@b.com"));
    assert!(marker["initializedAt"].is_string());
}

#[tokio::test]
async fn test_probe_reports_unreachable_store() {
    let store = MemoryDocumentStore::new();
    store.set_unavailable(true);

    let phase = probe(&store, true).await;
    assert!(matches!(phase, Phase::Error { .. }));

    store.set_unavailable(false);
    assert_eq!(probe(&store, true).await, Phase::NeedsInitialization);
}

// ============================================================================
// Initializer
// ============================================================================

#[tokio::test]
async fn test_initialize_seeds_every_document() {
    let store = MemoryDocumentStore::new();
    Initializer::new(&store).initialize(&root()).await.unwrap();

    for collection in BUSINESS_COLLECTIONS {
        let placeholder = store
            .get(&DocumentPath::placeholder(collection))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(placeholder["placeholder"], json!(true), "{collection}");
    }
    for id in ["application", "organization", "notifications"] {
        assert!(
            store.get(&DocumentPath::settings(id)).await.unwrap().is_some(),
            "settings/{id}"
        );
    }

    let admins = AdminAccountRepository::new(&store).list().await.unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].role, AdminRole::SuperAdmin);
    assert_eq!(admins[0].id, "a@b.com");
}

#[tokio::test]
async fn test_failed_batch_writes_nothing() {
    let store = MemoryDocumentStore::new();
    store.set_reject_commits(true);

    let err = Initializer::new(&store).initialize(&root()).await.unwrap_err();
    assert!(matches!(err, LifecycleError::InitializationFailed(_)));
    assert!(store.is_empty().await);
    assert_eq!(probe(&store, false).await, Phase::NeedsInitialization);
}

#[tokio::test]
async fn test_retry_after_failure_keeps_one_admin() {
    let store = MemoryDocumentStore::new();
    let initializer = Initializer::new(&store);

    store.set_reject_commits(true);
    initializer.initialize(&root()).await.unwrap_err();

    store.set_reject_commits(false);
    initializer.initialize(&root()).await.unwrap();

    let err = initializer.initialize(&root()).await.unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyInitialized));

    let admins = AdminAccountRepository::new(&store).list().await.unwrap();
    assert_eq!(admins.len(), 1);

    let marker: InitializationMarker = get_typed(&store, &DocumentPath::initialization_marker())
        .await
        .unwrap()
        .unwrap();
    assert!(marker.initialized);
}

// ============================================================================
// Settings store
// ============================================================================

#[tokio::test]
async fn test_partial_nested_update_replaces_whole_key() {
    let store = MemoryDocumentStore::new();
    let settings = SettingsStore::<OrganizationSettings>::new(&store);

    settings
        .update(object(json!({
            "Theme": { "Primary": "#000000", "Secondary": "#FFFFFF" }
        })))
        .await
        .unwrap();
    let updated = settings
        .update(object(json!({ "Theme": { "Primary": "#FF0000" } })))
        .await
        .unwrap();

    assert_eq!(updated.theme.primary, "#FF0000");
    assert_eq!(updated.theme.secondary, "");

    let stored = store
        .get(&OrganizationSettings::path())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["Theme"], json!({ "Primary": "#FF0000" }));
}

#[tokio::test]
async fn test_update_then_get_merges_top_level_keys() {
    let store = MemoryDocumentStore::new();
    let settings = SettingsStore::<OrganizationSettings>::new(&store);

    settings
        .update(object(json!({ "Name": "Central Library", "Address": "1 Main St" })))
        .await
        .unwrap();
    settings
        .update(object(json!({ "Address": "2 High St" })))
        .await
        .unwrap();

    let current = settings.get().await.unwrap();
    assert_eq!(current.name, "Central Library");
    assert_eq!(current.address, "2 High St");
    assert_eq!(current.maximum_simultaneous_loans, 3);
}

#[tokio::test]
async fn test_opening_hours_keep_legacy_encoding() {
    let store = MemoryDocumentStore::new();
    let settings = SettingsStore::<OrganizationSettings>::new(&store);

    settings
        .update(object(json!({
            "OpeningHours": {
                "Monday": "{\"open\":\"09:30\",\"close\":\"17:00\"}",
                "Tuesday": "{\"open\":\"09:30\",\"close\":\"17:00\"}",
                "Wednesday": "{\"open\":\"09:30\",\"close\":\"17:00\"}",
                "Thursday": "{\"open\":\"09:30\",\"close\":\"17:00\"}",
                "Friday": "{\"open\":\"09:30\",\"close\":\"17:00\"}",
                "Saturday": "{\"open\":\"closed\",\"close\":\"closed\"}",
                "Sunday": "{\"open\":\"closed\",\"close\":\"closed\"}"
            }
        })))
        .await
        .unwrap();

    let current = settings.get().await.unwrap();
    assert_eq!(
        current.opening_hours.monday,
        DayHours::open_between((9, 30), (17, 0)).unwrap()
    );
    assert_eq!(current.opening_hours.saturday, DayHours::Closed);

    let stored = store
        .get(&OrganizationSettings::path())
        .await
        .unwrap()
        .unwrap();
    let monday = stored["OpeningHours"]["Monday"].as_str().unwrap();
    let inner: Value = serde_json::from_str(monday).unwrap();
    assert_eq!(inner, json!({ "open": "09:30", "close": "17:00" }));
}

#[tokio::test]
async fn test_stored_hours_missing_a_day_still_load() {
    let store = MemoryDocumentStore::new();
    Initializer::new(&store).initialize(&root()).await.unwrap();

    let document = object(json!({
        "Name": "Central Library",
        "Contact": { "Email": "desk@central.org" },
        "OpeningHours": {
            "Monday": "{\"open\":\"09:00\",\"close\":\"17:00\"}"
        }
    }));
    store
        .set(&OrganizationSettings::path(), document)
        .await
        .unwrap();

    let current = SettingsStore::<OrganizationSettings>::new(&store)
        .get()
        .await
        .unwrap();
    assert_eq!(current.opening_hours.sunday, DayHours::Closed);
    assert_eq!(
        current.opening_hours.monday,
        DayHours::open_between((9, 0), (17, 0)).unwrap()
    );
    assert_eq!(probe(&store, true).await, Phase::Ready);
}

#[tokio::test]
async fn test_malformed_partial_is_rejected_before_write() {
    let store = MemoryDocumentStore::new();
    let settings = SettingsStore::<OrganizationSettings>::new(&store);

    settings
        .update(object(json!({ "MaximumSimultaneousLoans": "many" })))
        .await
        .unwrap_err();
    assert!(store.is_empty().await);
}
