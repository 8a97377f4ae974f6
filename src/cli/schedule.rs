use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{send_json, Api, OutputFormat};
use crate::models::{AvailabilityGrid, AvailabilityState, Day, LocalConfig};
use crate::scheduling::clock::SLOT_MENU;

/// A user's grid as the server returns it
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    pub user_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub schedule: AvailabilityGrid,
}

impl std::fmt::Display for ScheduleView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => writeln!(f, "Schedule for {} <{}> (UTC)", name, self.user_email)?,
            None => writeln!(f, "Schedule for {} (UTC)", self.user_email)?,
        }

        if self.schedule.is_empty() {
            return writeln!(f, "  No availability recorded.");
        }

        for day in Day::ALL {
            if !self.schedule.has_day(day) {
                continue;
            }
            writeln!(f, "  {}", day)?;
            for slot in SLOT_MENU {
                let entry = self.schedule.entry(day, slot);
                match &entry.event_source {
                    Some(source) => writeln!(f, "    {:>5}  {} ({})", slot, entry.status, source)?,
                    None => writeln!(f, "    {:>5}  {}", slot, entry.status)?,
                }
            }
        }
        Ok(())
    }
}

fn own_email() -> Result<String> {
    LocalConfig::load()?
        .email
        .ok_or_else(|| anyhow::anyhow!("No email configured. Run 'meetgrid register' first."))
}

async fn fetch_schedule(api: &Api, email: &str) -> Result<ScheduleView> {
    send_json(
        api.get(&format!("/v1/schedules/{}", urlencoding::encode(email))),
        "fetch schedule",
    )
    .await
}

async fn store_schedule(api: &Api, email: &str, grid: &AvailabilityGrid) -> Result<ScheduleView> {
    send_json(
        api.request(
            reqwest::Method::PUT,
            &format!("/v1/schedules/{}", urlencoding::encode(email)),
        )
        .json(&serde_json::json!({ "schedule": grid })),
        "update schedule",
    )
    .await
}

/// Show a user's weekly grid; defaults to your own
pub async fn run_schedule_show(email: Option<&str>, format: OutputFormat) -> Result<()> {
    let api = Api::from_config()?;
    let email = match email {
        Some(e) => e.to_string(),
        None => own_email()?,
    };

    let view = fetch_schedule(&api, &email).await?;
    format.print(&view);
    Ok(())
}

/// Replace your grid with the contents of a JSON file.
///
/// The file holds either the bare grid or `{"schedule": grid}`.
pub async fn run_schedule_set(path: &str, format: OutputFormat) -> Result<()> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    let grid = parse_grid_file(&content)?;

    let api = Api::from_config()?;
    let view = store_schedule(&api, &own_email()?, &grid).await?;
    format.print(&view);
    Ok(())
}

/// Change a single slot of your grid
pub async fn run_schedule_slot(
    day: &str,
    slot: &str,
    state: &str,
    format: OutputFormat,
) -> Result<()> {
    let day = Day::parse(day).ok_or_else(|| anyhow::anyhow!("Unknown day: {}", day))?;
    let state = AvailabilityState::parse(state).ok_or_else(|| {
        anyhow::anyhow!("Unknown state '{}'. Use: available, if-needed, unavailable", state)
    })?;
    let slot = normalize_slot(slot)?;

    let api = Api::from_config()?;
    let email = own_email()?;
    let mut grid = fetch_schedule(&api, &email).await?.schedule;
    grid.set_state(day, slot, state);

    let view = store_schedule(&api, &email, &grid).await?;
    format.print(&view);
    Ok(())
}

fn parse_grid_file(content: &str) -> Result<AvailabilityGrid> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum GridFile {
        Wrapped { schedule: AvailabilityGrid },
        Bare(AvailabilityGrid),
    }

    let file: GridFile = serde_json::from_str(content).context("Invalid schedule file")?;
    Ok(match file {
        GridFile::Wrapped { schedule } => schedule,
        GridFile::Bare(grid) => grid,
    })
}

/// Accept "9", "9:00" or "09:00" for a slot on the menu
fn normalize_slot(slot: &str) -> Result<&'static str> {
    let hour = slot
        .trim()
        .trim_end_matches(":00")
        .parse::<u32>()
        .ok()
        .map(|h| format!("{}:00", h));

    hour.as_deref()
        .and_then(|label| SLOT_MENU.iter().copied().find(|s| *s == label))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Slot must be a whole hour between {} and {}",
                SLOT_MENU[0],
                SLOT_MENU[SLOT_MENU.len() - 1]
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_slot() {
        assert_eq!(normalize_slot("9").unwrap(), "9:00");
        assert_eq!(normalize_slot("09:00").unwrap(), "9:00");
        assert_eq!(normalize_slot("17:00").unwrap(), "17:00");
        assert!(normalize_slot("18:00").is_err());
        assert!(normalize_slot("9:30").is_err());
        assert!(normalize_slot("noon").is_err());
    }

    #[test]
    fn test_parse_grid_file_accepts_both_shapes() {
        let bare = parse_grid_file(r#"{"monday": {"9:00": "available"}}"#).unwrap();
        let wrapped =
            parse_grid_file(r#"{"schedule": {"monday": {"9:00": "available"}}}"#).unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare.state(Day::Monday, "9:00"), AvailabilityState::Available);
        assert!(parse_grid_file("[1, 2]").is_err());
    }

    #[test]
    fn test_schedule_view_lists_locked_slots() {
        let mut grid = AvailabilityGrid::new();
        grid.set_state(Day::Monday, "9:00", AvailabilityState::Available);
        grid.lock_slot(Day::Monday, "9:00", "meeting-42");
        let view = ScheduleView {
            user_email: "a@example.com".to_string(),
            name: Some("Alice".to_string()),
            schedule: grid,
        };

        let text = view.to_string();
        assert!(text.contains("Alice <a@example.com>"));
        assert!(text.contains("monday"));
        assert!(text.contains("unavailable (meeting-42)"));
        assert!(!text.contains("tuesday"));
    }
}
