// Session bootstrap, login handshake, and the 2FA sub-flow.
//
// The login endpoint answers in one of three ways: 2xx with an auth token,
// 424 with an open verification transaction, or a plain failure. The 424
// branch is an expected part of the handshake, so `login` reports it as
// `LoginOutcome::TwoFactorRequired` rather than an error; the caller drives
// the email verification and retries login afterwards.

use std::future::Future;
use std::pin::Pin;

use reqwest::Method;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::{debug, warn};

use crate::client::{EircClient, decode};
use crate::error::Error;
use crate::models::{AuthResponse, TwoFactorTokens, VerificationRequired};
use crate::session::{LoginOutcome, TwoFactorChallenge};

/// Name of the cookie issued by the bootstrap endpoint.
const SESSION_COOKIE_NAME: &str = "session-cookie";

/// The only two-factor method this client can drive.
const EMAIL_METHOD: &str = "EMAIL";

const COOKIE_PATH: &str = "v6/users/manual/existence";
const AUTH_PATH: &str = "v8/users/auth";

fn email_send_path(transaction_id: &str) -> String {
    format!("v7/users/{transaction_id}/email/check/confirmation/send")
}

fn email_verify_path(transaction_id: &str) -> String {
    format!("v7/users/{transaction_id}/email/check/verification")
}

impl EircClient {
    /// Fetch the session cookie if it is not already present.
    ///
    /// The bootstrap endpoint is the only call issued without crafted
    /// headers. A response without the named cookie is
    /// [`Error::MissingSessionCookie`] -- permanent at this layer, the
    /// caller decides whether to retry the whole operation.
    pub async fn ensure_session_cookie(&mut self) -> Result<(), Error> {
        if self.session.session_cookie.is_some() {
            return Ok(());
        }

        let url = self.api_url(COOKIE_PATH)?;
        debug!("fetching session cookie from {url}");

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let cookie = resp
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE_NAME)
            .map(|c| c.value().to_owned());

        match cookie {
            Some(value) => {
                debug!("session cookie stored");
                self.session.session_cookie = Some(value);
                Ok(())
            }
            None => Err(Error::MissingSessionCookie),
        }
    }

    /// Perform the login handshake.
    ///
    /// No-op when both the auth and verification tokens are already set;
    /// their validity is trusted until a 401 proves otherwise. Otherwise
    /// POSTs the credential payload through the executor, so transient
    /// provider failures during login are retried like any other call.
    pub async fn login(&mut self) -> Result<LoginOutcome, Error> {
        if self.session.is_authenticated() {
            debug!("existing auth and verification tokens, skipping login");
            return Ok(LoginOutcome::Success);
        }

        let url = self.api_url(AUTH_PATH)?;
        let payload = json!({
            "type": "PHONE",
            "login": self.username,
            "password": self.password.expose_secret(),
        });

        match self.execute(Method::POST, url, Some(&payload), true).await {
            Ok(body) => {
                let auth: AuthResponse = decode(body)?;
                self.session.auth_token = Some(auth.auth);
                debug!("authentication successful, auth token stored");
                Ok(LoginOutcome::Success)
            }
            Err(Error::TwoFactorRequired {
                transaction_id,
                methods,
            }) => Ok(LoginOutcome::TwoFactorRequired(TwoFactorChallenge {
                transaction_id,
                methods,
            })),
            Err(Error::Api { status, message }) => Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {message}"),
            }),
            Err(e) => Err(e),
        }
    }

    /// Trigger dispatch of the 2FA verification email.
    ///
    /// Single-shot: the provider re-sends on a fresh call, so retrying a
    /// failed dispatch automatically would just spam the mailbox.
    pub async fn trigger_two_factor_email(&self, transaction_id: &str) -> Result<(), Error> {
        let url = self.api_url(&email_send_path(transaction_id))?;
        let headers = self.craft_headers()?;

        let resp = self
            .http
            .post(url)
            .headers(headers)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::TwoFactorDispatchFailed {
                status: status.as_u16(),
            });
        }
        debug!("2FA verification email dispatched");
        Ok(())
    }

    /// Exchange the emailed code for the auth + verification token pair.
    ///
    /// Both tokens must be present in the response; otherwise the stored
    /// session state is left untouched and the caller should re-prompt.
    pub async fn send_two_factor_code(
        &mut self,
        transaction_id: &str,
        code: &str,
    ) -> Result<(), Error> {
        let url = self.api_url(&email_verify_path(transaction_id))?;
        let headers = self.craft_headers()?;

        let resp = self
            .http
            .post(url)
            .headers(headers)
            .json(&json!({ "code": code }))
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let raw = resp.text().await.unwrap_or_default();
            return Err(Error::TwoFactorVerificationFailed {
                message: format!("HTTP {}: {raw}", status.as_u16()),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let tokens: TwoFactorTokens =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            })?;

        let (Some(auth), Some(verified)) = (tokens.auth, tokens.verified) else {
            return Err(Error::TwoFactorVerificationFailed {
                message: "response missing auth or verification token".into(),
            });
        };

        // Both tokens land in one step; no await point splits the update.
        self.session.auth_token = Some(auth);
        self.session.verify_token = Some(verified);
        debug!("auth and verification tokens stored, 2FA transaction closed");
        Ok(())
    }

    /// Re-login during 401 recovery inside the executor.
    ///
    /// A verification demand at this point cannot be satisfied mid-call,
    /// so it surfaces as `Error::TwoFactorRequired` to the domain caller.
    /// Boxed because `login` itself requests through the executor.
    pub(crate) fn reauthenticate(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<(), Error>> + Send + '_>> {
        Box::pin(async move {
            match self.login().await? {
                LoginOutcome::Success => Ok(()),
                LoginOutcome::TwoFactorRequired(challenge) => Err(Error::TwoFactorRequired {
                    transaction_id: challenge.transaction_id,
                    methods: challenge.methods,
                }),
            }
        })
    }

    /// Headers for every authenticated request: session cookie (required),
    /// JSON content type, plus bearer and verification tokens when present.
    /// Token absence is valid only for the initial login call.
    pub(crate) fn craft_headers(&self) -> Result<HeaderMap, Error> {
        let cookie = self
            .session
            .session_cookie
            .as_deref()
            .ok_or(Error::MissingSessionCookie)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            header_value(&format!("{SESSION_COOKIE_NAME}={cookie}"), false)?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        if let Some(token) = self.session.auth_token.as_deref() {
            headers.insert(
                header::AUTHORIZATION,
                header_value(&format!("Bearer {token}"), true)?,
            );
        }
        if let Some(token) = self.session.verify_token.as_deref() {
            headers.insert(
                HeaderName::from_static("auth-verification"),
                header_value(token, true)?,
            );
        }

        Ok(headers)
    }
}

/// Map the body of a 424 login response onto the error taxonomy.
///
/// Missing `transactionId` means a handshake the client cannot continue;
/// a method list without EMAIL is fatal; otherwise the open transaction is
/// carried in `Error::TwoFactorRequired` for `login` to re-wrap.
pub(crate) fn verification_challenge(raw: &str) -> Error {
    let parsed: VerificationRequired = match serde_json::from_str(raw) {
        Ok(p) => p,
        Err(e) => {
            return Error::Deserialization {
                message: e.to_string(),
                body: raw.to_owned(),
            };
        }
    };

    let Some(transaction_id) = parsed.transaction_id else {
        return Error::Authentication {
            message: "verification required but response carries no transactionId".into(),
        };
    };

    if !parsed.types.iter().any(|t| t == EMAIL_METHOD) {
        return Error::UnsupportedTwoFactorMethod {
            offered: parsed.types,
        };
    }

    warn!(
        "two-factor verification required (transaction {transaction_id}, methods {:?})",
        parsed.types
    );
    Error::TwoFactorRequired {
        transaction_id,
        methods: parsed.types,
    }
}

fn header_value(raw: &str, sensitive: bool) -> Result<HeaderValue, Error> {
    let mut value = HeaderValue::from_str(raw).map_err(|e| Error::Authentication {
        message: format!("invalid header value: {e}"),
    })?;
    value.set_sensitive(sensitive);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_with_email_method_is_two_factor_required() {
        let err = verification_challenge(r#"{"transactionId":"tx-1","types":["EMAIL","SMS"]}"#);
        assert!(matches!(
            err,
            Error::TwoFactorRequired { ref transaction_id, ref methods }
                if transaction_id == "tx-1" && methods.len() == 2
        ));
    }

    #[test]
    fn challenge_without_email_method_is_unsupported() {
        let err = verification_challenge(r#"{"transactionId":"tx-1","types":["SMS"]}"#);
        assert!(matches!(
            err,
            Error::UnsupportedTwoFactorMethod { ref offered } if offered == &["SMS".to_owned()]
        ));
    }

    #[test]
    fn challenge_without_transaction_id_is_authentication_failure() {
        let err = verification_challenge(r#"{"types":["EMAIL"]}"#);
        assert!(matches!(err, Error::Authentication { .. }));
    }
}
