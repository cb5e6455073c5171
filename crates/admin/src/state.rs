//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::{BackendConfig, Diagnostic};
use crate::services::auth::{AuthProvider, IdentityToolkitProvider, LocalAuthProvider};
use crate::services::media::{HostedUploader, InlineUploader, MediaUploader};
use crate::store::DocumentStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Clone)]
struct AppStateInner {
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
    uploader: Arc<dyn MediaUploader>,
    upload_folder: String,
    diagnostics: Vec<Diagnostic>,
}

impl AppState {
    /// Assemble state from already-built adapters.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        uploader: Arc<dyn MediaUploader>,
        upload_folder: String,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                auth,
                uploader,
                upload_folder,
                diagnostics: Vec::new(),
            }),
        }
    }

    /// Build the auth and media adapters the configuration asks for,
    /// falling back to local ones for anything unset.
    #[must_use]
    pub fn from_backend(store: Arc<dyn DocumentStore>, backend: &BackendConfig) -> Self {
        Self::new(
            store,
            auth_provider(backend),
            media_uploader(backend),
            backend.upload_folder.clone(),
        )
    }

    /// Attach the configuration report served by the diagnostics endpoint.
    #[must_use]
    pub fn with_diagnostics(self, diagnostics: Vec<Diagnostic>) -> Self {
        let mut inner = Arc::unwrap_or_clone(self.inner);
        inner.diagnostics = diagnostics;
        Self {
            inner: Arc::new(inner),
        }
    }

    /// The document store.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    #[must_use]
    pub fn auth(&self) -> &dyn AuthProvider {
        self.inner.auth.as_ref()
    }

    #[must_use]
    pub fn uploader(&self) -> &dyn MediaUploader {
        self.inner.uploader.as_ref()
    }

    #[must_use]
    pub fn upload_folder(&self) -> &str {
        &self.inner.upload_folder
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.inner.diagnostics
    }
}

/// Select the auth provider for `backend`.
#[must_use]
pub fn auth_provider(backend: &BackendConfig) -> Arc<dyn AuthProvider> {
    if let Some(config) = &backend.auth {
        tracing::info!(project_id = %config.project_id, "Using Identity Toolkit accounts");
        Arc::new(IdentityToolkitProvider::new(config))
    } else {
        tracing::warn!("Auth not configured; using local in-memory accounts");
        Arc::new(LocalAuthProvider::new())
    }
}

/// Select the media uploader for `backend`.
#[must_use]
pub fn media_uploader(backend: &BackendConfig) -> Arc<dyn MediaUploader> {
    if let Some(config) = &backend.upload {
        tracing::info!(cloud_name = %config.cloud_name, "Using hosted media uploads");
        Arc::new(HostedUploader::new(config))
    } else {
        tracing::warn!("Uploads not configured; logos will be stored inline");
        Arc::new(InlineUploader)
    }
}
