use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AvailabilityState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    #[default]
    Scheduled,
    Confirmed,
    Cancelled,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Scheduled => "scheduled",
            MeetingStatus::Confirmed => "confirmed",
            MeetingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(MeetingStatus::Scheduled),
            "confirmed" => Some(MeetingStatus::Confirmed),
            // soft-deleted rows
            "cancelled" | "deleted" => Some(MeetingStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a participant stands on a meeting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Pending => "pending",
            ParticipantStatus::Accepted => "accepted",
            ParticipantStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ParticipantStatus::Pending),
            "accepted" => Some(ParticipantStatus::Accepted),
            "rejected" => Some(ParticipantStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ParticipantStatus::Accepted | ParticipantStatus::Rejected)
    }
}

impl std::fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Answer an if-needed participant gives to an invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingResponse {
    Accepted,
    Rejected,
}

impl MeetingResponse {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingResponse::Accepted => "accepted",
            MeetingResponse::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accepted" | "accept" => Some(MeetingResponse::Accepted),
            "rejected" | "reject" => Some(MeetingResponse::Rejected),
            _ => None,
        }
    }
}

impl From<MeetingResponse> for ParticipantStatus {
    fn from(response: MeetingResponse) -> Self {
        match response {
            MeetingResponse::Accepted => ParticipantStatus::Accepted,
            MeetingResponse::Rejected => ParticipantStatus::Rejected,
        }
    }
}

impl std::fmt::Display for MeetingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingParticipant {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Availability at the exact meeting start when the meeting was created
    pub availability: AvailabilityState,
    pub status: ParticipantStatus,
}

impl MeetingParticipant {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// A booked meeting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub organizer: String,
    pub participants: Vec<MeetingParticipant>,
    pub status: MeetingStatus,
    pub created_at: i64,
}

impl Meeting {
    /// Tag written into grid slots locked for this meeting
    pub fn event_source(&self) -> String {
        format!("meeting-{}", self.id)
    }

    pub fn participant(&self, email: &str) -> Option<&MeetingParticipant> {
        self.participants.iter().find(|p| p.email == email)
    }

    pub fn participant_mut(&mut self, email: &str) -> Option<&mut MeetingParticipant> {
        self.participants.iter_mut().find(|p| p.email == email)
    }

    /// Organizer or listed participant
    pub fn involves(&self, email: &str) -> bool {
        self.organizer == email || self.participant(email).is_some()
    }

    pub fn all_responded(&self) -> bool {
        self.participants.iter().all(|p| p.status.is_terminal())
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

/// Someone to invite, by email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRef {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ParticipantRef {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }
}

/// Request to create a meeting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub participants: Vec<ParticipantRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondRequest {
    pub response: MeetingResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn participant(email: &str, status: ParticipantStatus) -> MeetingParticipant {
        MeetingParticipant {
            email: email.to_string(),
            name: None,
            availability: AvailabilityState::Available,
            status,
        }
    }

    #[test]
    fn test_all_responded() {
        let start = Utc.with_ymd_and_hms(2025, 3, 3, 10, 0, 0).unwrap();
        let mut meeting = Meeting {
            id: "abc".to_string(),
            title: "Sync".to_string(),
            description: None,
            start_time: start,
            end_time: start + chrono::Duration::minutes(90),
            organizer: "alice@example.com".to_string(),
            participants: vec![
                participant("alice@example.com", ParticipantStatus::Accepted),
                participant("bob@example.com", ParticipantStatus::Pending),
            ],
            status: MeetingStatus::Scheduled,
            created_at: 0,
        };

        assert!(!meeting.all_responded());
        assert_eq!(meeting.duration_minutes(), 90);
        assert_eq!(meeting.event_source(), "meeting-abc");

        meeting.participant_mut("bob@example.com").unwrap().status = ParticipantStatus::Rejected;
        assert!(meeting.all_responded());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(MeetingStatus::parse("deleted"), Some(MeetingStatus::Cancelled));
        assert_eq!(ParticipantStatus::parse("accepted"), Some(ParticipantStatus::Accepted));
        assert_eq!(MeetingResponse::parse("reject"), Some(MeetingResponse::Rejected));
        assert!(serde_json::from_str::<RespondRequest>(r#"{"response":"maybe"}"#).is_err());
    }

    #[test]
    fn test_meeting_wire_format() {
        let json = r#"{
            "title": "Planning",
            "startTime": "2025-03-04T10:00:00Z",
            "endTime": "2025-03-04T11:00:00Z",
            "participants": [{"email": "bob@example.com", "name": "Bob"}]
        }"#;
        let draft: MeetingDraft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.participants[0].email, "bob@example.com");
        assert!(draft.description.is_none());
    }
}
