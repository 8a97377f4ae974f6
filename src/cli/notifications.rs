use anyhow::Result;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use super::{send_json, Api, OutputFormat, SuccessResponse};
use crate::models::{Notification, Severity};

/// How often `watch` polls the server
const WATCH_INTERVAL: Duration = Duration::from_secs(5);

fn notification_line(n: &Notification) -> String {
    let marker = match n.severity {
        Severity::Info => "i",
        Severity::Success => "+",
        Severity::Warning => "!",
    };
    let when = DateTime::from_timestamp(n.created_at, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    format!(
        "[{}] {}{} {}: {}  ({})",
        marker,
        if n.read { " " } else { "*" },
        when,
        n.title,
        n.message,
        n.id
    )
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationList(pub Vec<Notification>);

impl std::fmt::Display for NotificationList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No notifications.");
        }
        for n in &self.0 {
            writeln!(f, "{}", notification_line(n))?;
        }
        Ok(())
    }
}

/// Your notifications, newest first
pub async fn run_notifications_list(unread_only: bool, format: OutputFormat) -> Result<()> {
    let api = Api::from_config()?;
    let mut notifications: Vec<Notification> =
        send_json(api.get("/v1/notifications"), "list notifications").await?;
    if unread_only {
        notifications.retain(|n| !n.read);
    }
    format.print(&NotificationList(notifications));
    Ok(())
}

pub async fn run_notifications_read(id: &str, format: OutputFormat) -> Result<()> {
    let api = Api::from_config()?;
    let reply: SuccessResponse = send_json(
        api.post(&format!("/v1/notifications/{}/read", id)),
        "mark notification read",
    )
    .await?;
    format.print(&reply);
    Ok(())
}

pub async fn run_notifications_read_all(format: OutputFormat) -> Result<()> {
    let api = Api::from_config()?;
    let reply: SuccessResponse = send_json(
        api.post("/v1/notifications/read-all"),
        "mark notifications read",
    )
    .await?;
    format.print(&reply);
    Ok(())
}

pub async fn run_notifications_clear(format: OutputFormat) -> Result<()> {
    let api = Api::from_config()?;
    let reply: SuccessResponse = send_json(
        api.request(reqwest::Method::DELETE, "/v1/notifications"),
        "clear notifications",
    )
    .await?;
    format.print(&reply);
    Ok(())
}

/// Print notifications as they arrive (polling mode)
pub async fn run_notifications_watch(format: OutputFormat) -> Result<()> {
    let api = Api::from_config()?;

    if format == OutputFormat::Human {
        println!("Watching for new notifications... (press Ctrl+C to stop)");
    }

    let initial: Vec<Notification> =
        send_json(api.get("/v1/notifications"), "list notifications").await?;
    let mut seen_ids: HashSet<String> = initial.into_iter().map(|n| n.id).collect();

    loop {
        tokio::time::sleep(WATCH_INTERVAL).await;

        let latest: Vec<Notification> =
            match send_json(api.get("/v1/notifications"), "list notifications").await {
                Ok(latest) => latest,
                Err(e) => {
                    tracing::warn!("{:#}", e);
                    continue;
                }
            };

        // newest first from the server; print oldest first
        for n in latest.into_iter().rev() {
            if !seen_ids.insert(n.id.clone()) {
                continue;
            }
            match format {
                OutputFormat::Json => format.print_json(&n),
                OutputFormat::Human => println!("{}", notification_line(&n)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_line() {
        let n = Notification {
            id: "n1".to_string(),
            recipient: "bob@example.com".to_string(),
            title: "Meeting Invitation".to_string(),
            message: "You have been added to a meeting: Sync".to_string(),
            severity: Severity::Success,
            meeting_id: None,
            read: false,
            created_at: 1_740_996_000,
        };
        let line = notification_line(&n);
        assert!(line.starts_with("[+] *2025-03-03 10:00"));
        assert!(line.contains("Meeting Invitation: You have been added"));
        assert!(line.ends_with("(n1)"));
    }
}
