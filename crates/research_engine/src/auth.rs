use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::endpoint::endpoint_url;

const LOGIN_PATH: &str = "api/auth/login";
const SIGNUP_PATH: &str = "api/auth/signup";

#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupCredentials {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Credential and identity returned by a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    Rejected(String),
    #[error("Network error during {action}: {message}")]
    Network {
        action: &'static str,
        message: String,
    },
    #[error("invalid auth url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Default, Deserialize)]
struct AuthResponseBody {
    token: Option<String>,
    message: Option<String>,
}

/// Request/response client for the login and signup endpoints.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    base: Url,
}

impl AuthClient {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AuthError::Network {
                action: "setup",
                message: err.to_string(),
            })?;
        Ok(Self { client, base })
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthSession, AuthError> {
        let token = self
            .exchange(LOGIN_PATH, credentials, "login", "Login failed")
            .await?;
        Ok(AuthSession {
            token,
            email: credentials.email.clone(),
            first_name: "User".to_string(),
            last_name: "Name".to_string(),
        })
    }

    pub async fn signup(&self, credentials: &SignupCredentials) -> Result<AuthSession, AuthError> {
        let token = self
            .exchange(SIGNUP_PATH, credentials, "signup", "Signup failed")
            .await?;
        Ok(AuthSession {
            token,
            email: credentials.email.clone(),
            first_name: credentials.first_name.clone(),
            last_name: credentials.last_name.clone(),
        })
    }

    async fn exchange<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        action: &'static str,
        fallback: &str,
    ) -> Result<String, AuthError> {
        let url =
            endpoint_url(&self.base, path).map_err(|err| AuthError::InvalidUrl(err.to_string()))?;
        let network = |err: reqwest::Error| AuthError::Network {
            action,
            message: err.to_string(),
        };

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(network)?;
        let status = response.status();
        let text = response.text().await.map_err(network)?;
        // Error bodies are not always JSON.
        let parsed: AuthResponseBody = serde_json::from_str(&text).unwrap_or_default();

        match parsed.token {
            Some(token) if status.is_success() && !token.is_empty() => {
                engine_info!("{} succeeded", action);
                Ok(token)
            }
            _ => {
                engine_warn!("{} rejected with status {}", action, status);
                Err(AuthError::Rejected(
                    parsed.message.unwrap_or_else(|| fallback.to_string()),
                ))
            }
        }
    }
}
