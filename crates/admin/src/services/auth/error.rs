//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during sign-in and sign-up.
///
/// Provider failure codes are translated into this closed set once, in the
/// provider adapter; nothing above the adapter inspects raw codes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The password does not match.
    #[error("wrong password")]
    WrongPassword,

    /// An account already exists for this email.
    #[error("email already in use")]
    EmailAlreadyInUse,

    /// The provider rejected the password as too weak.
    #[error("weak password")]
    WeakPassword,

    /// The email is malformed.
    #[error("invalid email")]
    InvalidEmail,

    /// No account exists for this email.
    #[error("user not found")]
    UserNotFound,

    /// The provider is throttling this account or client.
    #[error("too many attempts")]
    TooManyAttempts,

    /// The account has been disabled.
    #[error("user disabled")]
    UserDisabled,

    /// The provider could not be reached.
    #[error("auth transport error: {0}")]
    Transport(String),

    /// Any other provider failure.
    #[error("auth provider error: {0}")]
    Provider(String),
}

impl AuthError {
    /// Translate an Identity Toolkit error message such as
    /// `WEAK_PASSWORD : Password should be at least 6 characters`.
    #[must_use]
    pub fn from_provider_code(message: &str) -> Self {
        let code = message
            .split([' ', ':'])
            .next()
            .unwrap_or_default()
            .trim();

        match code {
            "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => Self::WrongPassword,
            "EMAIL_EXISTS" => Self::EmailAlreadyInUse,
            "WEAK_PASSWORD" => Self::WeakPassword,
            "INVALID_EMAIL" => Self::InvalidEmail,
            "EMAIL_NOT_FOUND" => Self::UserNotFound,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            "USER_DISABLED" => Self::UserDisabled,
            _ => Self::Provider(message.to_owned()),
        }
    }

    /// Message safe to show to the person signing in.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::WrongPassword => "Incorrect email or password.",
            Self::EmailAlreadyInUse => "An account with this email already exists.",
            Self::WeakPassword => "Password is too weak. Use at least 8 characters.",
            Self::InvalidEmail => "Enter a valid email address.",
            Self::UserNotFound => "No account exists for this email.",
            Self::TooManyAttempts => "Too many attempts. Try again later.",
            Self::UserDisabled => "This account has been disabled.",
            Self::Transport(_) => "The sign-in service is unreachable. Try again.",
            Self::Provider(_) => "Sign-in failed. Try again.",
        }
    }

    /// Whether the failure is the caller's fault rather than the service's.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Transport(_) | Self::Provider(_))
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}
