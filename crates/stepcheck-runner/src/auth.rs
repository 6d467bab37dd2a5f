//! OAuth client-credentials token fetch
//!
//! One POST to the token endpoint with a JSON grant request, one bearer
//! token back. Tokens cache until `expires_in` runs out.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use stepcheck_core::{AuthConfig, ConfigError};

/// Renew this long before the reported expiry to avoid using a token that
/// dies mid-request.
const EXPIRY_LEEWAY: Duration = Duration::from_secs(5);

/// JSON body sent to the token endpoint.
#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    audience: Option<&'a str>,
    grant_type: &'a str,
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// A cached bearer token.
#[derive(Debug, Clone)]
pub struct BearerToken {
    token: String,
    fetched_at: Instant,
    ttl: Option<Duration>,
}

impl BearerToken {
    #[must_use]
    pub fn new(token: impl Into<String>, expires_in_secs: Option<u64>) -> Self {
        Self {
            token: token.into(),
            fetched_at: Instant::now(),
            ttl: expires_in_secs.map(Duration::from_secs),
        }
    }

    /// `authorization` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Whether the token is past (or within leeway of) its lifetime.
    /// Tokens without a reported lifetime never expire.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.ttl
            .is_some_and(|ttl| self.fetched_at.elapsed() >= ttl.saturating_sub(EXPIRY_LEEWAY))
    }
}

/// Fetch a bearer token with the client-credentials grant.
///
/// # Errors
///
/// Returns error if credentials are missing, the request fails, the
/// endpoint rejects the grant, or the response body cannot be decoded.
pub fn fetch_token(
    client: &reqwest::blocking::Client,
    auth: &AuthConfig,
) -> Result<BearerToken, AuthError> {
    let client_id = auth.resolve_client_id()?;
    let client_secret = auth.resolve_client_secret()?;

    let request = TokenRequest {
        client_id: &client_id,
        client_secret: &client_secret,
        audience: auth.audience.as_deref(),
        grant_type: &auth.grant_type,
    };

    let response = client
        .post(&auth.token_url)
        .header("content-type", "application/json")
        .json(&request)
        .send()
        .map_err(|e| AuthError::Http(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    let token: TokenResponse = response.json().map_err(|e| AuthError::Decode(e.to_string()))?;
    Ok(BearerToken::new(token.access_token, token.expires_in))
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Token request failed: {0}")]
    Http(String),
    #[error("Token endpoint rejected the grant ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Cannot decode token response: {0}")]
    Decode(String),
}
