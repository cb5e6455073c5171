//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LIBRIS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `LIBRIS_BASE_URL` - Public URL for the settings API
//!
//! ## Optional
//! - `LIBRIS_HOST` - Bind address (default: 127.0.0.1)
//! - `LIBRIS_PORT` - Listen port (default: 3000)
//! - `LIBRIS_LOG_FORMAT` - `json` for JSON logs (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 1.0)
//!
//! ## Optional (hosted auth - local in-memory accounts when unset)
//! - `LIBRIS_PROJECT_ID` - Identity Toolkit project id
//! - `LIBRIS_AUTH_API_KEY` - Identity Toolkit web API key
//!
//! ## Optional (hosted media - inline `data:` URLs when unset)
//! - `LIBRIS_UPLOAD_CLOUD_NAME` - Media service cloud name
//! - `LIBRIS_UPLOAD_PRESET` - Unsigned upload preset
//! - `LIBRIS_UPLOAD_FOLDER` - Destination folder (default: libris)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use serde::Serialize;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_UPLOAD_FOLDER: &str = "libris";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Admin server configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the settings API
    pub base_url: String,
    /// External services
    pub backend: BackendConfig,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// External service configuration shared by the server and the CLI.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Hosted auth provider (local accounts when `None`)
    pub auth: Option<AuthConfig>,
    /// Hosted media service (inline uploads when `None`)
    pub upload: Option<UploadConfig>,
    /// Folder uploads are stored under
    pub upload_folder: String,
}

/// Identity Toolkit configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct AuthConfig {
    /// Project the accounts belong to
    pub project_id: String,
    /// Web API key
    pub api_key: SecretString,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("project_id", &self.project_id)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Hosted media service configuration.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Account ("cloud") name, part of the upload URL
    pub cloud_name: String,
    /// Unsigned upload preset
    pub upload_preset: String,
    /// Destination folder
    pub folder: String,
}

/// One line of the configuration report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// What is being reported on (e.g. "database", "auth")
    pub component: &'static str,
    /// Whether the component is fully configured
    pub configured: bool,
    /// What the system does with the current configuration
    pub detail: String,
    /// Variables that would need to be set
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<&'static str>,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(&env_lookup)
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let database_url = env.database_url()?;

        let host = env
            .or_default("LIBRIS_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("LIBRIS_HOST".to_string(), e.to_string()))?;

        let port = env
            .or_default("LIBRIS_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("LIBRIS_PORT".to_string(), e.to_string()))?;

        let base_url = env.required("LIBRIS_BASE_URL")?;

        let log_format = match env.optional("LIBRIS_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            Some("text") | None => LogFormat::Text,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "LIBRIS_LOG_FORMAT".to_string(),
                    format!("expected 'json' or 'text', got '{other}'"),
                ));
            }
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            backend: BackendConfig::from_lookup(lookup)?,
            log_format,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.rate("SENTRY_SAMPLE_RATE"),
            sentry_traces_sample_rate: env.rate("SENTRY_TRACES_SAMPLE_RATE"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    /// Load external service configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable pair is half set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(&env_lookup)
    }

    /// Load external service configuration through a variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable pair is half set.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);
        let upload_folder = env.or_default("LIBRIS_UPLOAD_FOLDER", DEFAULT_UPLOAD_FOLDER);

        Ok(Self {
            auth: AuthConfig::from_env(&env)?,
            upload: UploadConfig::from_env(&env, &upload_folder)?,
            upload_folder,
        })
    }

    /// A configuration with no hosted services.
    #[must_use]
    pub fn local() -> Self {
        Self {
            auth: None,
            upload: None,
            upload_folder: DEFAULT_UPLOAD_FOLDER.to_owned(),
        }
    }
}

impl AuthConfig {
    fn from_env(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let project_id = env.optional("LIBRIS_PROJECT_ID");
        let api_key = env.optional("LIBRIS_AUTH_API_KEY");

        match (project_id, api_key) {
            (Some(project_id), Some(key)) => {
                if let Err(e) = validate_secret_strength(&key, "LIBRIS_AUTH_API_KEY") {
                    tracing::warn!("LIBRIS_AUTH_API_KEY validation warning: {e}");
                }
                Ok(Some(Self {
                    project_id,
                    api_key: SecretString::from(key),
                }))
            }
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "LIBRIS_PROJECT_ID/LIBRIS_AUTH_API_KEY".to_string(),
                "Both LIBRIS_PROJECT_ID and LIBRIS_AUTH_API_KEY must be set together".to_string(),
            )),
        }
    }
}

impl UploadConfig {
    fn from_env(env: &Env<'_>, folder: &str) -> Result<Option<Self>, ConfigError> {
        let cloud_name = env.optional("LIBRIS_UPLOAD_CLOUD_NAME");
        let upload_preset = env.optional("LIBRIS_UPLOAD_PRESET");

        match (cloud_name, upload_preset) {
            (Some(cloud_name), Some(upload_preset)) => Ok(Some(Self {
                cloud_name,
                upload_preset,
                folder: folder.to_owned(),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "LIBRIS_UPLOAD_*".to_string(),
                "Both LIBRIS_UPLOAD_CLOUD_NAME and LIBRIS_UPLOAD_PRESET must be set together"
                    .to_string(),
            )),
        }
    }
}

/// Report what is and is not configured, without failing on anything.
#[must_use]
pub fn diagnose(lookup: &dyn Fn(&str) -> Option<String>) -> Vec<Diagnostic> {
    let env = Env(lookup);
    let mut report = Vec::with_capacity(5);

    let has_database =
        env.optional("LIBRIS_DATABASE_URL").is_some() || env.optional("DATABASE_URL").is_some();
    report.push(Diagnostic {
        component: "database",
        configured: has_database,
        detail: if has_database {
            "PostgreSQL document store".to_owned()
        } else {
            "no database configured; the server and most CLI commands cannot start".to_owned()
        },
        missing: if has_database {
            Vec::new()
        } else {
            vec!["LIBRIS_DATABASE_URL"]
        },
    });

    report.push(pair_diagnostic(
        &env,
        "auth",
        ["LIBRIS_PROJECT_ID", "LIBRIS_AUTH_API_KEY"],
        "hosted Identity Toolkit accounts",
        "local in-memory accounts; sign-ups are lost on restart",
    ));

    report.push(pair_diagnostic(
        &env,
        "upload",
        ["LIBRIS_UPLOAD_CLOUD_NAME", "LIBRIS_UPLOAD_PRESET"],
        "hosted media uploads",
        "logos are stored inline as data: URLs",
    ));

    let has_base_url = env.optional("LIBRIS_BASE_URL").is_some();
    report.push(Diagnostic {
        component: "server",
        configured: has_base_url,
        detail: env.optional("LIBRIS_BASE_URL").unwrap_or_else(|| {
            "LIBRIS_BASE_URL is required to run the server".to_owned()
        }),
        missing: if has_base_url {
            Vec::new()
        } else {
            vec!["LIBRIS_BASE_URL"]
        },
    });

    let has_sentry = env.optional("SENTRY_DSN").is_some();
    report.push(Diagnostic {
        component: "error_tracking",
        configured: has_sentry,
        detail: if has_sentry {
            "Sentry enabled".to_owned()
        } else {
            "Sentry disabled".to_owned()
        },
        missing: Vec::new(),
    });

    report
}

fn pair_diagnostic(
    env: &Env<'_>,
    component: &'static str,
    vars: [&'static str; 2],
    configured_detail: &str,
    fallback_detail: &str,
) -> Diagnostic {
    let missing: Vec<&'static str> = vars
        .into_iter()
        .filter(|var| env.optional(var).is_none())
        .collect();

    let detail = match missing.len() {
        0 => configured_detail.to_owned(),
        2 => fallback_detail.to_owned(),
        _ => format!("half configured, set both {} and {}", vars[0], vars[1]),
    };

    Diagnostic {
        component,
        configured: missing.is_empty(),
        detail,
        missing,
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Read from the process environment.
#[must_use]
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Variable access over a lookup function.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable; empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Sample rate in `0.0..=1.0`, defaulting to 1.0.
    fn rate(&self, key: &str) -> f32 {
        self.optional(key)
            .and_then(|s| s.parse::<f32>().ok())
            .map_or(1.0, |rate| rate.clamp(0.0, 1.0))
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self) -> Result<SecretString, ConfigError> {
        self.optional("LIBRIS_DATABASE_URL")
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("LIBRIS_DATABASE_URL".to_string()))
    }
}

/// Load only the database URL (for CLI commands that need nothing else).
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither variable is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    Env(&env_lookup).database_url()
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("LIBRIS_DATABASE_URL", "postgres://localhost/libris"),
        ("LIBRIS_BASE_URL", "http://localhost:3000"),
    ];

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AdminConfig::from_lookup(&lookup(MINIMAL)).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.backend.auth.is_none());
        assert!(config.backend.upload.is_none());
        assert_eq!(config.backend.upload_folder, "libris");
        assert!(!config.is_secure());
        assert!((config.sentry_sample_rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_database_url_fallback() {
        let config = AdminConfig::from_lookup(&lookup(&[
            ("DATABASE_URL", "postgres://fallback/libris"),
            ("LIBRIS_BASE_URL", "https://libris.example.net"),
        ]))
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fallback/libris");
        assert!(config.is_secure());
    }

    #[test]
    fn test_missing_required_vars() {
        let err = AdminConfig::from_lookup(&lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(var) if var == "LIBRIS_DATABASE_URL"));

        let err = AdminConfig::from_lookup(&lookup(&[("DATABASE_URL", "postgres://x")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(var) if var == "LIBRIS_BASE_URL"));
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("LIBRIS_PORT", "not-a-port"));
        let err = AdminConfig::from_lookup(&lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(var, _) if var == "LIBRIS_PORT"));
    }

    #[test]
    fn test_half_configured_pairs_are_errors() {
        let err = BackendConfig::from_lookup(&lookup(&[("LIBRIS_PROJECT_ID", "central")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));

        let err = BackendConfig::from_lookup(&lookup(&[("LIBRIS_UPLOAD_PRESET", "unsigned")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_hosted_services() {
        let backend = BackendConfig::from_lookup(&lookup(&[
            ("LIBRIS_PROJECT_ID", "central"),
            ("LIBRIS_AUTH_API_KEY", "AIzaSyD3x9Q-k7LmN2pR5tV8wY1zB4cF6hJ0"),
            ("LIBRIS_UPLOAD_CLOUD_NAME", "central-library"),
            ("LIBRIS_UPLOAD_PRESET", "unsigned"),
            ("LIBRIS_UPLOAD_FOLDER", "logos"),
        ]))
        .unwrap();
        assert_eq!(backend.auth.unwrap().project_id, "central");
        assert_eq!(backend.upload.unwrap().folder, "logos");
    }

    #[test]
    fn test_auth_config_debug_redacts_key() {
        let config = AuthConfig {
            project_id: "central".to_owned(),
            api_key: SecretString::from("AIzaSyD3x9Q-k7LmN2pR5tV8wY1zB4cF6hJ0"),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("AIzaSy"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_diagnose_reports_missing_vars() {
        let report = diagnose(&lookup(&[("LIBRIS_PROJECT_ID", "central")]));
        let auth = report.iter().find(|d| d.component == "auth").unwrap();
        assert!(!auth.configured);
        assert_eq!(auth.missing, vec!["LIBRIS_AUTH_API_KEY"]);
        assert!(auth.detail.contains("half configured"));

        let upload = report.iter().find(|d| d.component == "upload").unwrap();
        assert_eq!(upload.missing.len(), 2);
        assert!(upload.detail.contains("data:"));

        let database = report.iter().find(|d| d.component == "database").unwrap();
        assert!(!database.configured);
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let backend = BackendConfig::from_lookup(&lookup(&[
            ("LIBRIS_PROJECT_ID", ""),
            ("LIBRIS_AUTH_API_KEY", "  "),
        ]))
        .unwrap();
        assert!(backend.auth.is_none());
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_high() {
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }
}
