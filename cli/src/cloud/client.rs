//! HTTP client for the provider control plane

use std::time::Duration;

use chrono::Utc;
use cloud_api::models::ErrorResponse;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{header, Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error};

use crate::errors::SkyliftError;
use crate::utils::sha256_hash;

/// Lifetime of a request token in seconds
const TOKEN_TTL_SECS: i64 = 300;

/// Claims of a per-request token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestClaims {
    /// Subject (access key id)
    pub sub: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// SHA256 hex digest of the request body
    pub body_sha256: String,
}

/// HTTP client for provider communication.
///
/// Every request carries a short-lived HS256 token signed with the
/// account secret, binding the exact body bytes via a digest claim.
pub struct CloudClient {
    client: Client,
    base_url: String,
    access_key: String,
    secret: SecretString,
}

impl CloudClient {
    /// Create a new provider client
    pub fn new(endpoint: &str, access_key: &str, secret: &str) -> Result<Self, SkyliftError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
            access_key: access_key.to_string(),
            secret: SecretString::from(secret.to_string()),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sign a request token over the body digest
    pub fn sign_request(&self, body_sha256: &str) -> Result<String, SkyliftError> {
        let now = Utc::now().timestamp();
        let claims = RequestClaims {
            sub: self.access_key.clone(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
            body_sha256: body_sha256.to_string(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(|e| SkyliftError::CloudError(format!("request signing failed: {}", e)))
    }

    /// Make a GET request
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, SkyliftError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let token = self.sign_request(&sha256_hash(b""))?;
        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP GET failed: {} - {}", status, body);
            return Err(SkyliftError::CloudError(format!(
                "{}: {}",
                status,
                error_message(&body)
            )));
        }

        let body = response.json().await?;
        Ok(body)
    }

    /// Make a GET request where a 404 means "absent"
    pub(crate) async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, SkyliftError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let token = self.sign_request(&sha256_hash(b""))?;
        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP GET failed: {} - {}", status, body);
            return Err(SkyliftError::CloudError(format!(
                "{}: {}",
                status,
                error_message(&body)
            )));
        }

        let body = response.json().await?;
        Ok(Some(body))
    }

    /// Make a POST request
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, SkyliftError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let body_bytes = serde_json::to_vec(body)?;
        let token = self.sign_request(&sha256_hash(&body_bytes))?;
        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(body_bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP POST failed: {} - {}", status, body);
            return Err(SkyliftError::CloudError(format!(
                "{}: {}",
                status,
                error_message(&body)
            )));
        }

        let body = response.json().await?;
        Ok(body)
    }

    /// Make a PUT request
    pub(crate) async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, SkyliftError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("PUT {}", url);

        let body_bytes = serde_json::to_vec(body)?;
        let token = self.sign_request(&sha256_hash(&body_bytes))?;
        let response = self
            .client
            .put(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(body_bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP PUT failed: {} - {}", status, body);
            return Err(SkyliftError::CloudError(format!(
                "{}: {}",
                status,
                error_message(&body)
            )));
        }

        let body = response.json().await?;
        Ok(body)
    }

    /// PUT raw bytes with explicit headers, for object uploads
    pub(crate) async fn put_bytes(
        &self,
        path: &str,
        body: Vec<u8>,
        headers: &[(header::HeaderName, String)],
    ) -> Result<(), SkyliftError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("PUT {} ({} bytes)", url, body.len());

        let token = self.sign_request(&sha256_hash(&body))?;
        let mut request = self
            .client
            .put(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(body);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP PUT failed: {} - {}", status, body);
            return Err(SkyliftError::CloudError(format!(
                "{}: {}",
                status,
                error_message(&body)
            )));
        }

        Ok(())
    }

    /// Make a DELETE request, ignoring any response body
    pub(crate) async fn delete(&self, path: &str) -> Result<(), SkyliftError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("DELETE {}", url);

        let token = self.sign_request(&sha256_hash(b""))?;
        let response = self
            .client
            .delete(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP DELETE failed: {} - {}", status, body);
            return Err(SkyliftError::CloudError(format!(
                "{}: {}",
                status,
                error_message(&body)
            )));
        }

        Ok(())
    }
}

/// Pull the provider's message out of an error body, if it is one
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.to_string())
}
