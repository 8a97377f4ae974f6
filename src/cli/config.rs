use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{normalize_server_url, send_json, Api, OutputFormat, SuccessResponse};
use crate::models::{LocalConfig, UserInfo};

/// Config show response
#[derive(Debug, Serialize)]
pub struct ConfigShowResponse {
    pub email: Option<String>,
    pub server_url: Option<String>,
    pub registered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<UserInfo>,
}

impl std::fmt::Display for ConfigShowResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Email: {}", self.email.as_deref().unwrap_or("not set"))?;
        writeln!(
            f,
            "Server: {}",
            self.server_url.as_deref().unwrap_or("not set")
        )?;
        match &self.account {
            Some(account) => {
                writeln!(f, "Name: {}", account.name)?;
                writeln!(f, "Team: {}", account.team.as_deref().unwrap_or("none"))
            }
            None if self.registered => writeln!(f, "Account: unreachable"),
            None => writeln!(f, "Account: not registered"),
        }
    }
}

/// Show local configuration and, when possible, the server's view of the account
pub async fn run_config_show(format: OutputFormat) -> Result<()> {
    let local_config = LocalConfig::load()?;
    let registered = local_config.api_key.is_some();

    let account = if registered {
        match Api::from_config() {
            Ok(api) => send_json::<UserInfo>(api.get("/v1/users/me"), "fetch account")
                .await
                .map_err(|e| tracing::debug!("{:#}", e))
                .ok(),
            Err(_) => None,
        }
    } else {
        None
    };

    let response = ConfigShowResponse {
        email: local_config.email,
        server_url: local_config.server_url,
        registered,
        account,
    };

    format.print(&response);
    Ok(())
}

/// Set server URL (local only)
pub fn run_config_server(url: &str, format: OutputFormat) -> Result<()> {
    let url = normalize_server_url(url)?;
    let mut config = LocalConfig::load().unwrap_or_default();
    config.server_url = Some(url.clone());
    config.save()?;

    format.print(&SuccessResponse::new(format!("Server URL set to: {}", url)));
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RotateKeyReply {
    api_key: String,
}

/// Issue a new API key and replace the stored one
pub async fn run_config_rotate_key(format: OutputFormat) -> Result<()> {
    let api = Api::from_config()?;
    let reply: RotateKeyReply = send_json(api.post("/auth/key/rotate"), "rotate API key").await?;

    let mut config = LocalConfig::load()?;
    config.api_key = Some(reply.api_key);
    config.save()?;

    format.print(&SuccessResponse::new("API key rotated"));
    Ok(())
}
