// EIRC API HTTP client
//
// Wraps `reqwest::Client` with the retrying request executor every domain
// call goes through: session-cookie bootstrap, header construction,
// status-code classification, automatic re-login on 401, and exponential
// backoff for the provider's intermittent transient failures. Endpoint
// groups (auth, accounts, meters) are implemented as inherent methods via
// separate files to keep this module focused on executor mechanics.

use std::time::Duration;

use reqwest::{Method, StatusCode, header};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::session::SessionTokens;
use crate::transport::TransportConfig;

/// Production base URL of the provider API.
pub const DEFAULT_BASE_URL: &str = "https://ikus.pesc.ru/api/";

/// Retry/backoff policy for the request executor.
///
/// Defaults match the provider's observed behavior under load: five
/// attempts, 4s initial delay, doubling after every transient failure.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(4),
            multiplier: 2,
        }
    }
}

/// Async client for the EIRC personal-account API.
///
/// Owns the session state (cookie, bearer token, verification token) and
/// the underlying connection pool. Domain methods take `&mut self`: token
/// mutation during 401 recovery and 2FA completion is only safe with one
/// in-flight operation per instance, and the exclusive borrow encodes that
/// instead of leaving it to a runtime convention.
pub struct EircClient {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: Url,
    pub(crate) username: String,
    pub(crate) password: SecretString,
    pub(crate) session: SessionTokens,
    pub(crate) retry: RetryPolicy,
}

/// Parsed response body handed back by the executor.
#[derive(Debug)]
pub(crate) enum Payload {
    Json(Value),
    Text(String),
    Empty,
}

impl EircClient {
    /// Create a client with a fresh (unauthenticated) session.
    pub fn new(
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url: normalize_base_url(base_url),
            username: username.into(),
            password,
            session: SessionTokens::default(),
            retry: RetryPolicy::default(),
        })
    }

    /// Restore a client from previously persisted session tokens.
    ///
    /// With a valid cookie and token pair the next domain call goes straight
    /// to its endpoint -- no cookie fetch and no login round-trip. Stale
    /// tokens are recovered reactively through the executor's 401 handling.
    pub fn from_saved_tokens(
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
        tokens: SessionTokens,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            session: tokens,
            ..Self::new(base_url, username, password, transport)?
        })
    }

    /// Override the retry/backoff policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Current session state, for persistence by the embedding integration.
    ///
    /// Save after any successful call that may have refreshed tokens.
    pub fn session_tokens(&self) -> &SessionTokens {
        &self.session
    }

    /// The configured API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a versioned endpoint path (e.g. `"v8/accounts"`) onto the base.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(Error::InvalidUrl)
    }

    // ── Resilient executor ───────────────────────────────────────────

    /// Issue a request with retry, re-auth, and backoff handling.
    ///
    /// Classification:
    /// - 2xx: parsed body returned, ending the loop (204 -> `Empty`).
    /// - 401 off the login endpoint: auth token cleared, one re-login,
    ///   retry. Consumes an attempt but never a backoff step -- token
    ///   expiry is not a transport problem, so waiting is pointless.
    /// - 400/429/500/503: transient; sleep the current backoff, multiply,
    ///   retry.
    /// - 424 on the login endpoint: the two-factor handshake, mapped by
    ///   the auth layer. Anywhere else 424 is a plain API error.
    /// - anything else, and all transport/parse failures: immediate,
    ///   never retried.
    pub(crate) async fn execute<B: Serialize + Sync + ?Sized>(
        &mut self,
        method: Method,
        url: Url,
        body: Option<&B>,
        login_endpoint: bool,
    ) -> Result<Payload, Error> {
        self.ensure_session_cookie().await?;

        let mut attempt: u32 = 0;
        let mut backoff = self.retry.initial_backoff;

        while attempt < self.retry.max_attempts {
            attempt += 1;
            debug!(
                "{} {} (attempt {}/{})",
                method, url, attempt, self.retry.max_attempts
            );

            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .headers(self.craft_headers()?);
            if let Some(json) = body {
                request = request.json(json);
            }
            let resp = request.send().await.map_err(Error::Transport)?;
            let status = resp.status();

            if status.is_success() {
                return parse_payload(resp).await;
            }

            match status {
                StatusCode::FAILED_DEPENDENCY if login_endpoint => {
                    let raw = resp.text().await.map_err(Error::Transport)?;
                    return Err(crate::auth::verification_challenge(&raw));
                }
                StatusCode::UNAUTHORIZED if login_endpoint => {
                    let raw = resp.text().await.unwrap_or_default();
                    return Err(Error::Authentication {
                        message: format!("login rejected (HTTP 401): {raw}"),
                    });
                }
                StatusCode::UNAUTHORIZED => {
                    warn!("HTTP 401 from {url}, regenerating auth token");
                    self.session.auth_token = None;
                    self.reauthenticate().await?;
                }
                StatusCode::BAD_REQUEST
                | StatusCode::TOO_MANY_REQUESTS
                | StatusCode::INTERNAL_SERVER_ERROR
                | StatusCode::SERVICE_UNAVAILABLE => {
                    warn!(
                        "HTTP {} from {url}, retrying in {:?} (attempt {}/{})",
                        status.as_u16(),
                        backoff,
                        attempt,
                        self.retry.max_attempts
                    );
                    sleep(backoff).await;
                    backoff *= self.retry.multiplier;
                }
                _ => return Err(api_error(status, resp).await),
            }
        }

        warn!("giving up on {url} after {attempt} attempts");
        Err(Error::MaxRetriesExceeded {
            attempts: self.retry.max_attempts,
        })
    }

    /// GET `url` through the executor and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&mut self, url: Url) -> Result<T, Error> {
        decode(
            self.execute(Method::GET, url, Option::<&Value>::None, false)
                .await?,
        )
    }
}

fn normalize_base_url(mut url: Url) -> Url {
    // `Url::join` drops the last path segment unless the base ends in '/'.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

async fn parse_payload(resp: reqwest::Response) -> Result<Payload, Error> {
    if resp.status() == StatusCode::NO_CONTENT {
        return Ok(Payload::Empty);
    }

    let is_json = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));

    let body = resp.text().await.map_err(Error::Transport)?;
    if body.is_empty() {
        return Ok(Payload::Empty);
    }
    if !is_json {
        return Ok(Payload::Text(body));
    }

    match serde_json::from_str(&body) {
        Ok(value) => Ok(Payload::Json(value)),
        Err(e) => Err(Error::Deserialization {
            message: e.to_string(),
            body,
        }),
    }
}

/// Decode an executor payload into a typed response.
pub(crate) fn decode<T: DeserializeOwned>(payload: Payload) -> Result<T, Error> {
    match payload {
        // Deserializing from a borrowed Value keeps the original around
        // for the error body without re-serializing on the happy path.
        Payload::Json(value) => T::deserialize(&value).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: value.to_string(),
        }),
        Payload::Text(body) => {
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            })
        }
        Payload::Empty => Err(Error::Deserialization {
            message: "empty response body".into(),
            body: String::new(),
        }),
    }
}

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Build a typed API error, harvesting `{message}` from the body when the
/// provider supplies one.
async fn api_error(status: StatusCode, resp: reqwest::Response) -> Error {
    let raw = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&raw)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| {
            if raw.is_empty() {
                status.to_string()
            } else {
                raw
            }
        });
    Error::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let url = normalize_base_url(Url::parse("https://ikus.pesc.ru/api").unwrap());
        assert_eq!(url.as_str(), "https://ikus.pesc.ru/api/");
        // join must keep the /api segment
        assert_eq!(
            url.join("v8/accounts").unwrap().path(),
            "/api/v8/accounts"
        );
    }

    #[test]
    fn decode_rejects_empty_payload() {
        let result: Result<Vec<i32>, Error> = decode(Payload::Empty);
        assert!(matches!(result, Err(Error::Deserialization { .. })));
    }

    #[test]
    fn decode_accepts_text_payload_with_json_content() {
        let result: Result<Vec<i32>, Error> = decode(Payload::Text("[1,2]".into()));
        assert_eq!(result.unwrap(), vec![1, 2]);
    }
}
