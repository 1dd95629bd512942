//! Wire types for the Nango connections API.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Vaulted credential set for a connection.
///
/// Only `access_token` is required. Every field the vault returns that this
/// struct does not model is preserved untouched in [`Credentials::raw`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credentials {
    /// Bearer token for the underlying third-party provider.
    pub access_token: String,
    /// Refresh token, when the provider issues one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry of the access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Credential kind tag reported by the vault (e.g. `OAUTH2`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub credential_type: Option<String>,
    /// Provider-specific fields passed through unexamined.
    #[serde(flatten)]
    pub raw: serde_json::Map<String, serde_json::Value>,
}

impl Credentials {
    /// Check if the access token is expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| Utc::now() >= exp)
            .unwrap_or(false)
    }

    /// Check if the token is within 5 minutes of expiry.
    pub fn needs_refresh(&self) -> bool {
        self.expires_at
            .map(|exp| Utc::now() >= exp - Duration::minutes(5))
            .unwrap_or(false)
    }

    /// Whether the vault tagged this credential set as OAuth2.
    pub fn is_oauth2(&self) -> bool {
        self.credential_type.as_deref() == Some("OAUTH2")
    }
}

/// Full connection record as returned by `GET /connection/{provider}/{id}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Connection {
    pub connection_id: String,
    pub provider_config_key: String,
    pub credentials: Credentials,
    /// Arbitrary metadata attached to the connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Fields not modeled here, passed through unexamined.
    #[serde(flatten)]
    pub raw: serde_json::Map<String, serde_json::Value>,
}

/// End user on whose behalf a connect session is opened.
#[derive(Clone, Debug, Serialize)]
pub struct EndUser {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl EndUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            display_name: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

/// Organization the end user belongs to.
#[derive(Clone, Debug, Serialize)]
pub struct OrganizationRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl OrganizationRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

/// Request body for `POST /connect/sessions`.
#[derive(Clone, Debug, Serialize)]
pub struct ConnectSessionRequest {
    pub end_user: EndUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<OrganizationRef>,
    /// Integration keys the session is allowed to connect.
    pub allowed_integrations: Vec<String>,
}

impl ConnectSessionRequest {
    pub fn new(
        end_user: EndUser,
        allowed_integrations: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            end_user,
            organization: None,
            allowed_integrations: allowed_integrations.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_organization(mut self, organization: OrganizationRef) -> Self {
        self.organization = Some(organization);
        self
    }
}

/// Short-lived token a frontend hands to the provider-connect UI.
#[derive(Clone, Debug, Deserialize)]
pub struct ConnectSessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credentials_minimal() {
        let credentials: Credentials =
            serde_json::from_value(json!({"access_token": "tok123"})).unwrap();
        assert_eq!(credentials.access_token, "tok123");
        assert!(credentials.refresh_token.is_none());
        assert!(!credentials.is_expired());
        assert!(!credentials.needs_refresh());
        assert!(credentials.raw.is_empty());
    }

    #[test]
    fn test_credentials_passthrough_fields() {
        let credentials: Credentials = serde_json::from_value(json!({
            "access_token": "tok123",
            "type": "OAUTH2",
            "scope": "analytics.readonly",
            "token_type": "bearer"
        }))
        .unwrap();
        assert!(credentials.is_oauth2());
        assert_eq!(credentials.raw["scope"], "analytics.readonly");
        assert_eq!(credentials.raw["token_type"], "bearer");

        // Round-trips without losing the unmodeled fields.
        let value = serde_json::to_value(&credentials).unwrap();
        assert_eq!(value["scope"], "analytics.readonly");
        assert_eq!(value["type"], "OAUTH2");
    }

    #[test]
    fn test_credentials_missing_token_rejected() {
        let result: std::result::Result<Credentials, _> = serde_json::from_value(json!({}));
        assert!(result.is_err());
    }

    #[test]
    fn test_credentials_expiry() {
        let expired: Credentials = serde_json::from_value(json!({
            "access_token": "tok",
            "expires_at": "2020-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(expired.is_expired());
        assert!(expired.needs_refresh());

        let valid: Credentials = serde_json::from_value(json!({
            "access_token": "tok",
            "expires_at": (Utc::now() + Duration::hours(2)).to_rfc3339()
        }))
        .unwrap();
        assert!(!valid.is_expired());
        assert!(!valid.needs_refresh());
    }

    #[test]
    fn test_connect_session_request_shape() {
        let request = ConnectSessionRequest::new(
            EndUser::new("client-42").with_email("ops@example.com"),
            ["google-analytics"],
        )
        .with_organization(OrganizationRef::new("agency-7"));

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["end_user"]["id"], "client-42");
        assert_eq!(value["end_user"]["email"], "ops@example.com");
        assert!(value["end_user"].get("display_name").is_none());
        assert_eq!(value["organization"]["id"], "agency-7");
        assert_eq!(value["allowed_integrations"], json!(["google-analytics"]));
    }

    #[test]
    fn test_connection_record() {
        let connection: Connection = serde_json::from_value(json!({
            "id": 991,
            "connection_id": "c1",
            "provider_config_key": "google-analytics",
            "credentials": {"access_token": "tok123", "type": "OAUTH2"},
            "metadata": {"property_id": "properties/12345"}
        }))
        .unwrap();
        assert_eq!(connection.connection_id, "c1");
        assert!(connection.credentials.is_oauth2());
        assert_eq!(connection.metadata.unwrap()["property_id"], "properties/12345");
        assert_eq!(connection.raw["id"], 991);
    }
}
