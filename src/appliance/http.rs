//! HTTP utilities for OneView REST API calls

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Header carrying the REST API version every request is made against
pub const API_VERSION_HEADER: &str = "X-API-Version";

/// Header carrying the login session id
pub const AUTH_HEADER: &str = "Auth";

/// Sanitize response body for logging
/// Truncates long responses and masks potentially sensitive patterns
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut cut = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Connection settings for one appliance
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Hostname, IP address or base URL of the appliance
    pub host: String,
    pub api_version: u32,
    /// `host:port` of an HTTP proxy
    pub proxy: Option<String>,
    /// PEM bundle of trusted certificates
    pub ca_bundle: Option<PathBuf>,
    /// Accept self-signed appliance certificates
    pub insecure: bool,
}

impl HttpSettings {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            api_version: 200,
            proxy: None,
            ca_bundle: None,
            insecure: false,
        }
    }
}

/// Extra headers for a single request
///
/// The shared session headers are never modified; per-call overrides are
/// layered on top of them for the one request they are passed to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn to_header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("Invalid header name: {}", name))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("Invalid value for header {}", name))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

/// Error body the appliance sends with non-success statuses
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    recommended_actions: Vec<String>,
}

/// Non-success HTTP status from the appliance
#[derive(Error, Debug, Clone)]
#[error("API request failed: {status}{}", .message.as_deref().map(|m| format!(" - {}", m)).unwrap_or_default())]
pub struct ApiError {
    pub status: StatusCode,
    pub error_code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub recommended_actions: Vec<String>,
}

impl ApiError {
    fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        Self {
            status,
            error_code: parsed.error_code,
            message: parsed.message,
            details: parsed.details,
            recommended_actions: parsed.recommended_actions,
        }
    }
}

/// Decoded appliance response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// `Location` header, set on `202 Accepted` to point at the task
    pub location: Option<String>,
    /// `Value::Null` for an empty body
    pub body: Value,
}

/// HTTP client wrapper for appliance API calls
#[derive(Clone)]
pub struct ApplianceHttp {
    client: Client,
    base_url: Url,
    api_version: u32,
}

impl ApplianceHttp {
    /// Create a new HTTP client
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let base_url = parse_base_url(&settings.host)?;

        let mut builder = Client::builder().user_agent(concat!("oneview/", env!("CARGO_PKG_VERSION")));

        if let Some(ref proxy) = settings.proxy {
            let proxy_url = if proxy.contains("://") {
                proxy.clone()
            } else {
                format!("http://{}", proxy)
            };
            let proxy = reqwest::Proxy::all(&proxy_url)
                .with_context(|| format!("Invalid proxy: {}", proxy_url))?;
            builder = builder.proxy(proxy);
        }

        if let Some(ref path) = settings.ca_bundle {
            let pem = std::fs::read(path)
                .with_context(|| format!("Failed to read certificate bundle {}", path.display()))?;
            for cert in reqwest::Certificate::from_pem_bundle(&pem)
                .context("Failed to parse certificate bundle")?
            {
                builder = builder.add_root_certificate(cert);
            }
        }

        if settings.insecure {
            tracing::warn!("TLS certificate verification disabled for {}", base_url);
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            api_version: settings.api_version,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn api_version(&self) -> u32 {
        self.api_version
    }

    /// Resolve an appliance path (or an absolute URL) against the base URL
    ///
    /// Absolute URLs must point back at the appliance, since every request
    /// carries the session id.
    pub fn url(&self, path: &str) -> Result<Url> {
        let url = self
            .base_url
            .join(path)
            .with_context(|| format!("Invalid request path: {}", path))?;
        if url.origin() != self.base_url.origin() {
            anyhow::bail!(
                "Refusing to follow {} outside the appliance at {}",
                url,
                self.base_url
            );
        }
        Ok(url)
    }

    /// Make a GET request
    pub async fn get(
        &self,
        path: &str,
        session: Option<&str>,
        options: &RequestOptions,
    ) -> Result<ApiResponse> {
        self.execute(Method::GET, path, session, None, options).await
    }

    /// Make a POST request
    pub async fn post(
        &self,
        path: &str,
        session: Option<&str>,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<ApiResponse> {
        self.execute(Method::POST, path, session, body, options).await
    }

    /// Make a PUT request
    pub async fn put(
        &self,
        path: &str,
        session: Option<&str>,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<ApiResponse> {
        self.execute(Method::PUT, path, session, body, options).await
    }

    /// Make a DELETE request
    pub async fn delete(
        &self,
        path: &str,
        session: Option<&str>,
        options: &RequestOptions,
    ) -> Result<ApiResponse> {
        self.execute(Method::DELETE, path, session, None, options).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        session: Option<&str>,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<ApiResponse> {
        let url = self.url(path)?;
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, url)
            .header(API_VERSION_HEADER, self.api_version.to_string())
            .header(CONTENT_TYPE, "application/json");

        if let Some(session) = session {
            request = request.header(AUTH_HEADER, session);
        }

        // Per-call overrides are applied last so they win over the defaults
        request = request.headers(options.to_header_map()?);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let response_body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&response_body));
            return Err(ApiError::from_response(status, &response_body).into());
        }

        // Handle empty response
        let body = if response_body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&response_body).context("Failed to parse response JSON")?
        };

        Ok(ApiResponse {
            status,
            location,
            body,
        })
    }
}

fn parse_base_url(host: &str) -> Result<Url> {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() {
        anyhow::bail!("No appliance host configured");
    }
    let with_scheme = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    };
    Url::parse(&with_scheme).with_context(|| format!("Invalid appliance host: {}", host))
}

/// Status code of an appliance error, if the error chain holds one
pub fn api_status(error: &anyhow::Error) -> Option<StatusCode> {
    error
        .chain()
        .find_map(|e| e.downcast_ref::<ApiError>())
        .map(|e| e.status)
}

/// Format an appliance API error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_api_error(error: &anyhow::Error) -> String {
    if let Some(status) = api_status(error) {
        return match status.as_u16() {
            400 => "Invalid request. Check your parameters.".to_string(),
            401 => "Authentication failed. Check the user name, password and login domain.".to_string(),
            403 => "Permission denied. Check the user's OneView role.".to_string(),
            404 => "Resource not found.".to_string(),
            409 => "Resource conflict. The resource may already exist or be in use.".to_string(),
            412 => "Resource changed since it was read. Fetch it again and retry.".to_string(),
            500 | 503 => "Appliance temporarily unavailable. Please try again.".to_string(),
            _ => "Request failed. Check your network connection and try again.".to_string(),
        };
    }

    // Truncate long error messages and remove potential sensitive data
    let error_str = error.to_string();
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(80)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
