use serde::{Deserialize, Serialize};

use super::{AvailabilityState, Day};

/// How one participant fares over one candidate span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantAvailability {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: AvailabilityState,
}

/// Participants of a candidate grouped by their classification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotParticipants {
    pub available: Vec<ParticipantAvailability>,
    pub if_needed: Vec<ParticipantAvailability>,
    pub unavailable: Vec<ParticipantAvailability>,
}

impl SlotParticipants {
    pub fn push(&mut self, participant: ParticipantAvailability) {
        match participant.status {
            AvailabilityState::Available => self.available.push(participant),
            AvailabilityState::IfNeeded => self.if_needed.push(participant),
            AvailabilityState::Unavailable => self.unavailable.push(participant),
        }
    }

    pub fn total(&self) -> usize {
        self.available.len() + self.if_needed.len() + self.unavailable.len()
    }
}

/// A scored candidate meeting slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSuggestion {
    /// e.g. "Monday, March 3, 2025"
    pub date: String,
    pub day: Day,
    /// e.g. "9:00 UTC"
    pub start_time: String,
    pub end_time: String,
    /// e.g. "9:00"
    pub raw_start_time: String,
    pub raw_end_time: String,
    /// 0.0 to 1.0, higher is better
    pub score: f64,
    pub participants: SlotParticipants,
}

/// Request for meeting time suggestions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    pub participants: Vec<String>,
    /// A date ("2025-03-03") or full RFC 3339 timestamp
    pub meeting_date: String,
    /// Minutes
    pub duration: i64,
}
