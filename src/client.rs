//! HTTP client for the Nango connections API.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::config::Config;
use crate::types::{ConnectSessionRequest, ConnectSessionToken, Connection, Credentials};
use crate::{Error, Result};

/// Async client for the connections API.
///
/// Cheap to clone; all clones share one connection pool. The client holds no
/// other state, so concurrent calls are fully independent.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    secret_key: SecretString,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl Client {
    pub fn new(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder().build().map_err(Error::Network)?;
        Ok(Self {
            http,
            base_url: Url::parse(&config.base_url)?,
            secret_key: config.secret_key,
        })
    }

    /// Build a client from `NANGO_SECRET_KEY` and `NANGO_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env()?)
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Fetch just the vaulted credentials for a connection, asking the vault
    /// to refresh the token before returning it.
    ///
    /// Every failure collapses to `None` and the cause is reported through
    /// `tracing` events only; nothing is propagated and nothing panics. Use
    /// [`Client::get_connection`] when the caller needs to distinguish
    /// failure kinds.
    pub async fn fetch_credentials(
        &self,
        provider_config_key: &str,
        connection_id: &str,
    ) -> Option<Credentials> {
        tracing::info!(
            connection_id,
            provider_config_key,
            base_url = %self.base_url,
            "fetching vaulted credentials"
        );

        match self.try_fetch_credentials(provider_config_key, connection_id).await {
            Ok(credentials) => {
                tracing::info!(connection_id, "fetched vaulted credentials");
                Some(credentials)
            }
            Err(Error::MissingArgument(name)) => {
                tracing::error!(name, "credential fetch missing required argument");
                None
            }
            Err(Error::NotFound { .. }) => {
                tracing::error!(connection_id, provider_config_key, "connection not found in vault");
                None
            }
            Err(Error::MalformedCredentials(detail)) => {
                tracing::error!(
                    connection_id,
                    detail = %detail,
                    "vault response missing usable credentials"
                );
                None
            }
            Err(Error::Api { status, body }) => {
                tracing::error!(
                    connection_id,
                    status,
                    body = %body,
                    "vault returned an error status"
                );
                None
            }
            Err(Error::Network(e)) => {
                tracing::error!(connection_id, error = %e, "network error fetching credentials");
                None
            }
            Err(e) => {
                tracing::error!(connection_id, error = %e, "unexpected error fetching credentials");
                None
            }
        }
    }

    async fn try_fetch_credentials(
        &self,
        provider_config_key: &str,
        connection_id: &str,
    ) -> Result<Credentials> {
        let body = self
            .fetch_connection_body(provider_config_key, connection_id, true)
            .await?;
        let raw = body
            .get("credentials")
            .cloned()
            .ok_or_else(|| Error::MalformedCredentials("response has no credentials object".into()))?;
        let credentials: Credentials = serde_json::from_value(raw)
            .map_err(|e| Error::MalformedCredentials(format!("credentials object does not parse: {e}")))?;
        if credentials.access_token.is_empty() {
            return Err(Error::MalformedCredentials("access_token is empty".into()));
        }
        Ok(credentials)
    }

    /// Fetch the full connection record.
    ///
    /// `force_refresh` asks the vault to refresh the credential before
    /// returning it. Unlike [`Client::fetch_credentials`], failures surface
    /// as typed errors.
    pub async fn get_connection(
        &self,
        provider_config_key: &str,
        connection_id: &str,
        force_refresh: bool,
    ) -> Result<Connection> {
        let body = self
            .fetch_connection_body(provider_config_key, connection_id, force_refresh)
            .await?;
        serde_json::from_value(body).map_err(Error::Json)
    }

    async fn fetch_connection_body(
        &self,
        provider_config_key: &str,
        connection_id: &str,
        force_refresh: bool,
    ) -> Result<serde_json::Value> {
        if provider_config_key.is_empty() {
            return Err(Error::MissingArgument("provider_config_key"));
        }
        if connection_id.is_empty() {
            return Err(Error::MissingArgument("connection_id"));
        }

        let url = self.endpoint_url(&["connection", provider_config_key, connection_id])?;
        let url = if force_refresh {
            let mut url = url;
            url.query_pairs_mut().append_pair("force_refresh", "true");
            url
        } else {
            url
        };

        let response = self
            .http
            .get(url)
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                provider_config_key: provider_config_key.to_string(),
                connection_id: connection_id.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(Error::Json)
    }

    /// Ask the vault for a short-lived connect session token that a frontend
    /// can hand to the provider-connect UI.
    pub async fn create_connect_session(
        &self,
        request: ConnectSessionRequest,
    ) -> Result<ConnectSessionToken> {
        if request.end_user.id.is_empty() {
            return Err(Error::MissingArgument("end_user.id"));
        }
        if request.allowed_integrations.is_empty() {
            return Err(Error::MissingArgument("allowed_integrations"));
        }

        tracing::debug!(
            end_user = %request.end_user.id,
            allowed_integrations = ?request.allowed_integrations,
            "creating connect session"
        );

        let url = self.endpoint_url(&["connect", "sessions"])?;
        let response = self
            .http
            .post(url)
            .bearer_auth(self.secret_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: ConnectSessionResponse = serde_json::from_str(&response.text().await?)?;
        Ok(envelope.data)
    }

    fn endpoint_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Session token envelope: `{"data": {"token": ..., "expires_at": ...}}`.
#[derive(serde::Deserialize)]
struct ConnectSessionResponse {
    data: ConnectSessionToken,
}

#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    secret_key: Option<String>,
    timeout: Option<Duration>,
    http: Option<reqwest::Client>,
}

impl ClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = Some(secret_key.into());
        self
    }

    /// Request timeout. None by default: the enclosing task's cancellation
    /// is the only deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a preconfigured `reqwest::Client` instead of building one.
    pub fn http(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<Client> {
        let base_url = self
            .base_url
            .filter(|s| !s.is_empty())
            .ok_or(Error::MissingArgument("base_url"))?;
        let secret_key = self
            .secret_key
            .filter(|s| !s.is_empty())
            .ok_or(Error::MissingArgument("secret_key"))?;

        let http = match self.http {
            Some(http) => http,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build().map_err(Error::Network)?
            }
        };

        Ok(Client {
            http,
            base_url: Url::parse(&base_url)?,
            secret_key: SecretString::from(secret_key),
        })
    }
}
