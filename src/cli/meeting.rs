use anyhow::Result;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{parse_duration, parse_emails, send_json, Api, OutputFormat, SuccessResponse};
use crate::models::{Meeting, MeetingDraft, MeetingResponse, ParticipantRef};
use crate::scheduling::clock::parse_meeting_date;

fn write_meeting(f: &mut std::fmt::Formatter<'_>, meeting: &Meeting) -> std::fmt::Result {
    writeln!(f, "{}  {}  [{}]", meeting.id, meeting.title, meeting.status)?;
    writeln!(
        f,
        "  When: {} - {} UTC ({} min)",
        meeting.start_time.format("%a %Y-%m-%d %H:%M"),
        meeting.end_time.format("%H:%M"),
        meeting.duration_minutes()
    )?;
    writeln!(f, "  Organizer: {}", meeting.organizer)?;
    if let Some(description) = &meeting.description {
        writeln!(f, "  Description: {}", description)?;
    }
    writeln!(f, "  Participants:")?;
    for p in &meeting.participants {
        writeln!(
            f,
            "    {} ({}, {})",
            p.display_name(),
            p.availability,
            p.status
        )?;
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeetingDetails(pub Meeting);

impl std::fmt::Display for MeetingDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_meeting(f, &self.0)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeetingList(pub Vec<Meeting>);

impl std::fmt::Display for MeetingList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No upcoming meetings.");
        }
        for meeting in &self.0 {
            write_meeting(f, meeting)?;
        }
        Ok(())
    }
}

/// Book a meeting; you are the organizer
pub async fn run_meeting_create(
    title: &str,
    start: &str,
    duration: &str,
    with: &str,
    description: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let start_time = parse_meeting_date(start)?;
    let end_time = start_time + Duration::minutes(parse_duration(duration)?);

    let draft = MeetingDraft {
        title: title.to_string(),
        description: description.map(str::to_string),
        start_time,
        end_time,
        participants: parse_emails(with).into_iter().map(ParticipantRef::new).collect(),
    };

    let api = Api::from_config()?;
    let meeting: Meeting =
        send_json(api.post("/v1/meetings").json(&draft), "create meeting").await?;

    format.print(&MeetingDetails(meeting));
    Ok(())
}

/// Meetings you organize or are invited to
pub async fn run_meeting_list(format: OutputFormat) -> Result<()> {
    let api = Api::from_config()?;
    let meetings: Vec<Meeting> = send_json(api.get("/v1/meetings"), "list meetings").await?;
    format.print(&MeetingList(meetings));
    Ok(())
}

pub async fn run_meeting_show(id: &str, format: OutputFormat) -> Result<()> {
    let api = Api::from_config()?;
    let meeting: Meeting =
        send_json(api.get(&format!("/v1/meetings/{}", id)), "fetch meeting").await?;
    format.print(&MeetingDetails(meeting));
    Ok(())
}

/// Accept or reject an invitation you were only if-needed for
pub async fn run_meeting_respond(id: &str, response: &str, format: OutputFormat) -> Result<()> {
    let response = MeetingResponse::parse(&response.trim().to_lowercase())
        .ok_or_else(|| anyhow::anyhow!("Response must be 'accept' or 'reject'"))?;

    let api = Api::from_config()?;
    let meeting: Meeting = send_json(
        api.post(&format!("/v1/meetings/{}/respond", id))
            .json(&serde_json::json!({ "response": response })),
        "respond to meeting",
    )
    .await?;

    format.print(&MeetingDetails(meeting));
    Ok(())
}

/// Cancel a meeting you organize
pub async fn run_meeting_cancel(id: &str, format: OutputFormat) -> Result<()> {
    let api = Api::from_config()?;
    let reply: SuccessResponse = send_json(
        api.request(reqwest::Method::DELETE, &format!("/v1/meetings/{}", id)),
        "cancel meeting",
    )
    .await?;

    format.print(&reply);
    Ok(())
}
