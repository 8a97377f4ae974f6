use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{get_api_client, normalize_server_url, send_json, OutputFormat};
use crate::models::LocalConfig;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterReply {
    user_id: String,
    api_key: String,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub email: String,
    pub user_id: String,
    pub server_url: String,
    pub config_path: String,
}

impl std::fmt::Display for RegisterResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Registered {} on {}", self.email, self.server_url)?;
        writeln!(f, "User ID: {}", self.user_id)?;
        writeln!(f, "API key saved to {}", self.config_path)
    }
}

/// Create an account on the server and store its API key locally
pub async fn run_register(
    server: &str,
    email: &str,
    name: &str,
    team: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let server_url = normalize_server_url(server)?;
    let client = get_api_client()?;

    let reply: RegisterReply = send_json(
        client
            .post(format!("{}/auth/register", server_url))
            .json(&serde_json::json!({
                "email": email,
                "name": name,
                "team": team,
            })),
        "register",
    )
    .await?;

    let mut config = LocalConfig::load().unwrap_or_default();
    config.api_key = Some(reply.api_key);
    config.server_url = Some(server_url.clone());
    config.email = Some(email.to_string());
    config.user_id = Some(reply.user_id.clone());
    config.save()?;

    let response = RegisterResponse {
        email: email.to_string(),
        user_id: reply.user_id,
        server_url,
        config_path: LocalConfig::config_path().display().to_string(),
    };
    format.print(&response);
    Ok(())
}
