use thiserror::Error;

/// Top-level error type for the `eirc-api` crate.
///
/// Covers every failure mode across the client: session bootstrap,
/// authentication and the 2FA sub-flow, the retrying request executor,
/// transport construction, and response parsing. The embedding integration
/// maps these into host-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Session & authentication ────────────────────────────────────
    /// The cookie-issuing endpoint returned no usable `session-cookie`,
    /// or an authenticated request was attempted without one.
    #[error("No session cookie available")]
    MissingSessionCookie,

    /// Login failed (wrong credentials, malformed login response, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The provider demands two-factor verification before issuing tokens.
    ///
    /// Surfaced as an error only when a 401-recovery re-login runs into the
    /// challenge mid-operation; the public [`login`](crate::EircClient::login)
    /// reports it as [`LoginOutcome::TwoFactorRequired`](crate::LoginOutcome).
    #[error("Two-factor verification required (transaction {transaction_id})")]
    TwoFactorRequired {
        transaction_id: String,
        methods: Vec<String>,
    },

    /// The provider only offers 2FA methods this client cannot drive
    /// (only EMAIL is supported).
    #[error("No supported two-factor method offered (available: {offered:?})")]
    UnsupportedTwoFactorMethod { offered: Vec<String> },

    /// Bad verification code or a malformed verification response.
    #[error("Two-factor verification failed: {message}")]
    TwoFactorVerificationFailed { message: String },

    /// The "send verification email" endpoint rejected the request.
    #[error("Failed to dispatch two-factor email (HTTP {status})")]
    TwoFactorDispatchFailed { status: u16 },

    // ── Request executor ────────────────────────────────────────────
    /// The transient-error retry budget was exhausted.
    #[error("Max retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded { attempts: u32 },

    /// Non-retryable HTTP status from the provider.
    #[error("API request failed (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Proxy URL carries a scheme the transport cannot drive.
    #[error("Unsupported proxy scheme: {scheme}")]
    UnsupportedProxyScheme { scheme: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates auth has expired or is
    /// otherwise invalid and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::MissingSessionCookie
        )
    }

    /// Returns `true` if this is a transient condition worth retrying
    /// from the outside (the executor has already spent its own budget).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::MaxRetriesExceeded { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the caller must complete the 2FA sub-flow
    /// before the operation can succeed.
    pub fn is_two_factor_required(&self) -> bool {
        matches!(self, Self::TwoFactorRequired { .. })
    }

    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::TwoFactorDispatchFailed { status } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
