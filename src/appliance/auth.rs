//! Appliance Authentication
//!
//! Handles the login-session handshake and the EULA check that has to pass
//! before a freshly installed appliance accepts API calls.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::http::{ApplianceHttp, RequestOptions};
use crate::resource::resource_path;

/// Default login domain for local appliance accounts
pub const DEFAULT_LOGIN_DOMAIN: &str = "LOCAL";

/// Session expiry buffer - log in again this much before the session times out
const SESSION_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Appliance sessions expire after 24 hours of inactivity; stay well below that
const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

/// Login credentials, serialized as the login-sessions request body
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub user_name: String,
    pub password: String,
    pub auth_login_domain: String,
}

impl Credentials {
    pub fn new(user_name: &str, password: &str, domain: &str) -> Self {
        Self {
            user_name: user_name.to_string(),
            password: password.to_string(),
            auth_login_domain: domain.to_uppercase(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user_name", &self.user_name)
            .field("password", &"***")
            .field("auth_login_domain", &self.auth_login_domain)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(rename = "sessionID")]
    session_id: String,
}

/// Login session holder with session-id caching
#[derive(Clone)]
pub struct Session {
    credentials: Option<Credentials>,
    session_cache: Arc<RwLock<Option<CachedSession>>>,
}

#[derive(Clone)]
struct CachedSession {
    session_id: String,
    /// When this session should be renewed (with buffer applied)
    expires_at: Option<Instant>,
}

impl CachedSession {
    /// Check if this cached session is still valid
    fn is_valid(&self) -> bool {
        self.expires_at.map(|t| Instant::now() < t).unwrap_or(true)
    }
}

impl Session {
    /// Session that logs in with `credentials` on first use
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials: Some(credentials),
            session_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Session reusing an id obtained elsewhere; cannot renew itself
    pub fn with_session_id(session_id: &str) -> Self {
        Self {
            credentials: None,
            session_cache: Arc::new(RwLock::new(Some(CachedSession {
                session_id: session_id.to_string(),
                expires_at: None,
            }))),
        }
    }

    /// Session that never authenticates (EULA status, version)
    pub fn anonymous() -> Self {
        Self {
            credentials: None,
            session_cache: Arc::new(RwLock::new(None)),
        }
    }

    pub fn can_login(&self) -> bool {
        self.credentials.is_some()
    }

    /// Get a session id for API calls, logging in when needed
    pub async fn get_session_id(&self, http: &ApplianceHttp) -> Result<Option<String>> {
        {
            let cache = self.session_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(Some(cached.session_id.clone()));
                }
                tracing::debug!("Cached session expired, logging in again");
            }
        }

        let Some(ref credentials) = self.credentials else {
            return Ok(None);
        };

        let session_id = login(http, credentials).await?;
        let expires_at = Instant::now() + DEFAULT_SESSION_TTL - SESSION_EXPIRY_BUFFER;

        {
            let mut cache = self.session_cache.write().await;
            *cache = Some(CachedSession {
                session_id: session_id.clone(),
                expires_at: Some(expires_at),
            });
        }

        tracing::debug!(
            "New session cached, renewed in ~{} minutes",
            (DEFAULT_SESSION_TTL - SESSION_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(Some(session_id))
    }

    /// Force a new login
    pub async fn refresh(&self, http: &ApplianceHttp) -> Result<Option<String>> {
        if self.credentials.is_some() {
            let mut cache = self.session_cache.write().await;
            *cache = None;
        }
        self.get_session_id(http).await
    }

    /// Log out and forget the session id
    pub async fn logout(&self, http: &ApplianceHttp) -> Result<()> {
        let cached = self.session_cache.write().await.take();
        if let Some(cached) = cached {
            let path = resource_path("login-sessions")?;
            http.delete(path, Some(&cached.session_id), &RequestOptions::new())
                .await
                .context("Failed to log out")?;
            tracing::info!("Logged out of appliance");
        }
        Ok(())
    }
}

/// Create a login session and return its id
pub async fn login(http: &ApplianceHttp, credentials: &Credentials) -> Result<String> {
    tracing::info!(
        "Logging in to {} as {}@{}",
        http.base_url(),
        credentials.user_name,
        credentials.auth_login_domain
    );

    let path = resource_path("login-sessions")?;
    let body = serde_json::to_value(credentials)?;
    let response = http
        .post(path, None, Some(&body), &RequestOptions::new())
        .await
        .context("Login failed")?;

    let login: LoginResponse =
        serde_json::from_value(response.body).context("Login response has no sessionID")?;
    Ok(login.session_id)
}

/// Whether the appliance still waits for its EULA to be accepted
pub async fn get_eula_status(http: &ApplianceHttp) -> Result<bool> {
    let path = resource_path("eula-status")?;
    let response = http.get(path, None, &RequestOptions::new()).await?;
    match response.body {
        Value::Bool(b) => Ok(b),
        other => Err(anyhow::anyhow!("Unexpected EULA status: {}", other)),
    }
}

/// Accept the EULA, choosing whether HPE support may access the appliance
pub async fn accept_eula(http: &ApplianceHttp, support_access: bool) -> Result<Value> {
    let path = resource_path("eula-save")?;
    let body = json!({ "supportAccess": if support_access { "yes" } else { "no" } });
    let response = http
        .post(path, None, Some(&body), &RequestOptions::new())
        .await
        .context("Failed to accept EULA")?;
    Ok(response.body)
}
