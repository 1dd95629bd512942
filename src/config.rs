//! Environment-backed configuration.
//!
//! Base URL and secret key are ordinarily resolved by the embedding
//! application; this module covers the common case where they live in the
//! process environment.

use secrecy::SecretString;

use crate::{Error, Result};

/// Hosted Nango endpoint, used when `NANGO_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://api.nango.dev";

const ENV_SECRET_KEY: &str = "NANGO_SECRET_KEY";
const ENV_BASE_URL: &str = "NANGO_BASE_URL";

/// Resolved connection settings for a [`Client`](crate::Client).
#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub secret_key: SecretString,
}

impl Config {
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        if base_url.is_empty() {
            return Err(Error::MissingArgument("base_url"));
        }
        let secret_key = secret_key.into();
        if secret_key.is_empty() {
            return Err(Error::MissingArgument("secret_key"));
        }
        Ok(Self {
            base_url,
            secret_key: SecretString::from(secret_key),
        })
    }

    /// Read settings from `NANGO_SECRET_KEY` and `NANGO_BASE_URL`.
    ///
    /// Self-hosted deployments point `NANGO_BASE_URL` at their own instance;
    /// without it the hosted endpoint is used.
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var(ENV_SECRET_KEY)
            .map_err(|_| Error::Config(format!("{ENV_SECRET_KEY} is not set")))?;
        let base_url =
            std::env::var(ENV_BASE_URL).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url, secret_key)
    }
}
