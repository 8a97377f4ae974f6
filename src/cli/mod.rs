mod auth;
mod config;
mod meeting;
mod notifications;
mod schedule;
mod suggest;

pub use auth::*;
pub use config::*;
pub use meeting::*;
pub use notifications::*;
pub use schedule::*;
pub use suggest::*;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn print<T: Serialize + std::fmt::Display>(&self, value: &T) {
        match self {
            OutputFormat::Human => print!("{}", value),
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
            }
        }
    }

    pub fn print_json<T: Serialize>(&self, value: &T) {
        match self {
            OutputFormat::Human => {
                println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(value).unwrap_or_default());
            }
        }
    }
}

/// Error body returned by the server
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Error: {}", self.error)
    }
}

/// Success response
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub message: String,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SuccessResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.message)
    }
}

/// Get the API client for making requests to the server
pub fn get_api_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("Failed to create HTTP client")
}

/// Get the server URL from config or default
pub fn get_server_url() -> String {
    crate::models::LocalConfig::load()
        .ok()
        .and_then(|c| c.server_url)
        .unwrap_or_else(|| crate::DEFAULT_SERVER_URL.to_string())
}

/// Get the API key from local config
pub fn get_api_key() -> Result<String> {
    let config = crate::models::LocalConfig::load()?;
    config
        .api_key
        .ok_or_else(|| anyhow::anyhow!("Not registered. Run 'meetgrid register' first."))
}

/// Authenticated connection to the meetgrid server
pub struct Api {
    client: reqwest::Client,
    server_url: String,
    api_key: String,
}

impl Api {
    /// Connect with the key and server stored in the local config
    pub fn from_config() -> Result<Self> {
        Ok(Self {
            client: get_api_client()?,
            server_url: get_server_url(),
            api_key: get_api_key()?,
        })
    }

    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.server_url.trim_end_matches('/'), path))
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::GET, path)
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::POST, path)
    }
}

/// Send a request and decode a successful JSON reply.
///
/// `action` completes "Failed to ..." in error messages.
pub async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    action: &str,
) -> Result<T> {
    let resp = request
        .send()
        .await
        .with_context(|| format!("Failed to {}", action))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        anyhow::bail!("Failed to {} ({}): {}", action, status, message);
    }

    resp.json()
        .await
        .with_context(|| format!("Failed to parse response to {}", action))
}

/// Validate a server URL and strip any trailing slash
pub fn normalize_server_url(raw: &str) -> Result<String> {
    let parsed = url::Url::parse(raw.trim()).with_context(|| format!("Invalid server URL: {}", raw))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("Server URL must use http or https");
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Parse a duration like "30m", "1h", "1h30m" or a bare number of minutes
pub fn parse_duration(s: &str) -> Result<i64> {
    let s = s.trim().to_lowercase();
    if s.is_empty() {
        anyhow::bail!("Duration is empty");
    }

    let minutes = if let Some((hours, rest)) = s.split_once('h') {
        let hours: i64 = hours.parse().context("Invalid hours value")?;
        let rest = rest.trim_end_matches('m');
        let mins: i64 = if rest.is_empty() {
            0
        } else {
            rest.parse().context("Invalid minutes value")?
        };
        hours * 60 + mins
    } else {
        s.trim_end_matches('m')
            .parse::<i64>()
            .context("Invalid duration value")?
    };

    if minutes <= 0 {
        anyhow::bail!("Duration must be positive");
    }
    Ok(minutes)
}

/// Split a comma separated email list
pub fn parse_emails(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}
