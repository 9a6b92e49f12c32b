use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{AuthError, AuthGateway};
use crate::constants::{LOGIN_PATH, PROFILE_PATH, REGISTER_PATH};
use crate::models::{Credentials, Registration, User};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// `AuthGateway` speaking JSON over HTTP to the analysis API
pub struct HttpAuthGateway {
    client: Client,
    base_url: String,
}

impl HttpAuthGateway {
    /// Create a gateway for `base_url` with a per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Any 4xx on login is a rejection of the credentials
fn login_error(status: StatusCode) -> AuthError {
    if status.is_client_error() {
        AuthError::InvalidCredentials
    } else {
        AuthError::NetworkFailure(format!("login failed: {}", status))
    }
}

fn profile_error(status: StatusCode) -> AuthError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AuthError::Unauthorized,
        _ => AuthError::NetworkFailure(format!("profile request failed: {}", status)),
    }
}

fn register_error(status: StatusCode, body: String) -> AuthError {
    match status {
        StatusCode::CONFLICT => AuthError::Conflict,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            let message = if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            };
            AuthError::Validation(message)
        }
        _ => AuthError::NetworkFailure(format!("register failed: {}", status)),
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn login(&self, identifier: &str, secret: &str) -> Result<String, AuthError> {
        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .json(&Credentials { identifier, secret })
            .send()
            .await?;

        let status = response.status();
        debug!("POST {} -> {}", LOGIN_PATH, status);
        if !status.is_success() {
            return Err(login_error(status));
        }

        let body: TokenResponse = response.json().await?;
        Ok(body.token)
    }

    async fn fetch_profile(&self, token: &str) -> Result<User, AuthError> {
        let response = self
            .client
            .get(self.url(PROFILE_PATH))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        debug!("GET {} -> {}", PROFILE_PATH, status);
        if !status.is_success() {
            return Err(profile_error(status));
        }

        Ok(response.json::<User>().await?)
    }

    async fn register(
        &self,
        email: &str,
        secret: &str,
        full_name: &str,
    ) -> Result<(), AuthError> {
        let response = self
            .client
            .post(self.url(REGISTER_PATH))
            .json(&Registration {
                email,
                secret,
                full_name,
            })
            .send()
            .await?;

        let status = response.status();
        debug!("POST {} -> {}", REGISTER_PATH, status);
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(register_error(status, body))
    }
}
