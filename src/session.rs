// Session state owned by the client.
//
// The cookie and token fields are opaque strings as far as the embedding
// integration is concerned: it persists them after any change and hands
// them back at construction so restarts skip the cookie/login handshake.

use serde::{Deserialize, Serialize};

/// Persisted session state: cookie plus bearer/verification tokens.
///
/// All three start absent on a fresh client. The cookie is issued by an
/// unauthenticated bootstrap call, the auth token by login, and the verify
/// token only after email verification. Every mutation happens inside
/// [`EircClient`](crate::EircClient); callers only read and persist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionTokens {
    pub session_cookie: Option<String>,
    pub auth_token: Option<String>,
    pub verify_token: Option<String>,
}

impl SessionTokens {
    /// Whether both post-login tokens are present.
    ///
    /// Presence is trusted without re-validation; expiry is detected
    /// reactively via 401 handling in the request executor.
    pub fn is_authenticated(&self) -> bool {
        self.auth_token.is_some() && self.verify_token.is_some()
    }
}

/// An open two-factor verification transaction.
///
/// Created when login answers "verification required"; consumed by
/// [`send_two_factor_code`](crate::EircClient::send_two_factor_code).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoFactorChallenge {
    pub transaction_id: String,
    /// Verification methods the provider offers (e.g. `["EMAIL"]`).
    pub methods: Vec<String>,
}

/// Result of a login attempt.
///
/// "Verification required" is an expected branch of the login handshake,
/// not a failure, so it is a variant here rather than an error.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// Auth token stored; the client can issue authenticated calls.
    Success,
    /// The caller must drive the 2FA sub-flow
    /// (trigger email, collect code, verify) and then retry login.
    TwoFactorRequired(TwoFactorChallenge),
}
