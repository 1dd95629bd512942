//! # nango-client
//!
//! Async Rust client for the [Nango](https://nango.dev) connections API.
//!
//! Nango vaults OAuth credentials for third-party integrations. This crate
//! fetches those credentials for a given connection, asking the vault to
//! refresh the token before returning it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() {
//!     let credentials = nango_client::fetch_credentials(
//!         "conn-123",
//!         "https://api.nango.dev",
//!         "nango-secret-key",
//!         "google-analytics",
//!     )
//!     .await;
//!
//!     if let Some(credentials) = credentials {
//!         println!("access token: {}", credentials.access_token);
//!     }
//! }
//! ```
//!
//! ## Reusable Client
//!
//! ```rust,no_run
//! use nango_client::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), nango_client::Error> {
//!     // Reads NANGO_SECRET_KEY and NANGO_BASE_URL.
//!     let client = Client::from_env()?;
//!
//!     let connection = client
//!         .get_connection("google-analytics", "conn-123", true)
//!         .await?;
//!     println!("token: {}", connection.credentials.access_token);
//!     Ok(())
//! }
//! ```
//!
//! [`fetch_credentials`] and [`Client::fetch_credentials`] never fail: every
//! error collapses to `None` and the cause is reported through [`tracing`]
//! events. Callers that need to distinguish failure kinds use
//! [`Client::get_connection`] instead.
//!
//! The crate emits `tracing` events but never installs a subscriber; the
//! embedding application owns that choice.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod client;
pub mod config;
pub mod types;

pub use client::{Client, ClientBuilder};
pub use config::{Config, DEFAULT_BASE_URL};
pub use types::{
    ConnectSessionRequest, ConnectSessionToken, Connection, Credentials, EndUser, OrganizationRef,
};

/// Error type for nango-client operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A required argument was empty. Detected before any I/O.
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    /// The vault has no connection for the given identifiers (HTTP 404).
    #[error("connection not found: {connection_id} (provider config: {provider_config_key})")]
    NotFound {
        provider_config_key: String,
        connection_id: String,
    },

    /// The vault answered 200 but the body carried no usable credentials.
    #[error("response missing usable credentials: {0}")]
    MalformedCredentials(String),

    /// The vault returned a non-success status.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Network connectivity or request failed.
    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Base URL could not be parsed.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Network(_)
                | Error::Api {
                    status: 500..=599,
                    ..
                }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// One-shot credential fetch for a single connection.
///
/// Builds a throwaway [`Client`] and delegates to
/// [`Client::fetch_credentials`], so the vault refreshes the credential
/// before returning it. All failure detail is reported through `tracing`;
/// the return value only distinguishes presence from absence, and no network
/// call is made when any argument is empty.
pub async fn fetch_credentials(
    connection_id: &str,
    base_url: &str,
    secret_key: &str,
    provider_config_key: &str,
) -> Option<Credentials> {
    if connection_id.is_empty()
        || base_url.is_empty()
        || secret_key.is_empty()
        || provider_config_key.is_empty()
    {
        tracing::error!("credential fetch missing required arguments");
        return None;
    }

    let client = match Client::builder()
        .base_url(base_url)
        .secret_key(secret_key)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "failed to build vault client");
            return None;
        }
    };

    client
        .fetch_credentials(provider_config_key, connection_id)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Api {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("bad gateway"));
    }

    #[test]
    fn test_error_is_retryable() {
        let server_error = Error::Api {
            status: 500,
            body: String::new(),
        };
        assert!(server_error.is_retryable());

        let not_found = Error::NotFound {
            provider_config_key: "google-analytics".into(),
            connection_id: "c1".into(),
        };
        assert!(!not_found.is_retryable());
        assert!(not_found.is_not_found());
        assert_eq!(not_found.status_code(), Some(404));
    }

    #[test]
    fn test_missing_argument_display() {
        let err = Error::MissingArgument("secret_key");
        assert_eq!(err.to_string(), "missing required argument: secret_key");
    }
}
