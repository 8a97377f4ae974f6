use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{parse_duration, parse_emails, send_json, Api, OutputFormat};
use crate::models::{LocalConfig, MeetingSuggestion, SuggestRequest};

/// Ranked suggestions, best first
#[derive(Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuggestionList(pub Vec<MeetingSuggestion>);

impl std::fmt::Display for SuggestionList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No suitable meeting times found.");
        }

        if let Some(first) = self.0.first() {
            writeln!(f, "Suggested times for {}:", first.date)?;
        }
        for (i, s) in self.0.iter().enumerate() {
            writeln!(
                f,
                "  {}. {} - {}  score {:.0}%",
                i + 1,
                s.start_time,
                s.end_time,
                s.score * 100.0
            )?;
            let groups = [
                ("available", &s.participants.available),
                ("if needed", &s.participants.if_needed),
                ("unavailable", &s.participants.unavailable),
            ];
            for (label, people) in groups {
                if people.is_empty() {
                    continue;
                }
                let names: Vec<&str> = people
                    .iter()
                    .map(|p| p.name.as_deref().unwrap_or(&p.email))
                    .collect();
                writeln!(f, "     {}: {}", label, names.join(", "))?;
            }
        }
        Ok(())
    }
}

/// Ask the server for the best times to meet on a day.
///
/// You are always counted as a participant.
pub async fn run_suggest(
    with: &str,
    date: &str,
    duration: &str,
    format: OutputFormat,
) -> Result<()> {
    let duration = parse_duration(duration)?;

    let mut participants = Vec::new();
    if let Some(email) = LocalConfig::load()?.email {
        participants.push(email);
    }
    participants.extend(parse_emails(with));

    let request = SuggestRequest {
        participants,
        meeting_date: date.to_string(),
        duration,
    };

    let api = Api::from_config()?;
    let suggestions: Vec<MeetingSuggestion> = send_json(
        api.post("/v1/meetings/suggest").json(&request),
        "fetch suggestions",
    )
    .await?;

    format.print(&SuggestionList(suggestions));
    Ok(())
}
