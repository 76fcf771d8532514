// eirc-api: Async Rust client for the EIRC personal-account API (ikus.pesc.ru)

pub mod error;
pub mod models;
pub mod session;
pub mod transport;

mod accounts;
mod auth;
mod client;
mod meters;

pub use client::{DEFAULT_BASE_URL, EircClient, RetryPolicy};
pub use error::Error;
pub use session::{LoginOutcome, SessionTokens, TwoFactorChallenge};
pub use transport::{ProxyConfig, ProxyScheme, TransportConfig};
