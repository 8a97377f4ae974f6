use chrono::{DateTime, Utc};

use super::clock::{
    day_of, format_display_date, format_display_time, DAY_END_LABEL, SLOT_MENU,
};
use super::UserGrid;
use crate::models::{
    AvailabilityState, Day, MeetingSuggestion, ParticipantAvailability, SlotParticipants,
};

/// Average weight at or above which a participant counts as available
pub const AVAILABLE_THRESHOLD: f64 = 1.5;

/// Average weight at or above which a participant counts as if-needed
pub const IF_NEEDED_THRESHOLD: f64 = 0.5;

/// Number of menu slots a meeting of this length occupies
pub fn span_for(duration_minutes: i64) -> usize {
    if duration_minutes <= 0 {
        return 0;
    }
    ((duration_minutes + 59) / 60) as usize
}

pub fn classify(average_weight: f64) -> AvailabilityState {
    if average_weight >= AVAILABLE_THRESHOLD {
        AvailabilityState::Available
    } else if average_weight >= IF_NEEDED_THRESHOLD {
        AvailabilityState::IfNeeded
    } else {
        AvailabilityState::Unavailable
    }
}

/// Classify one participant over menu slots `[start, start + span)` of `day`
pub fn participant_status(grid: &UserGrid, day: Day, start: usize, span: usize) -> AvailabilityState {
    if span == 0 || !grid.grid.has_day(day) {
        return AvailabilityState::Unavailable;
    }

    let total: u32 = SLOT_MENU[start..start + span]
        .iter()
        .map(|slot| grid.grid.state(day, slot).weight())
        .sum();

    classify(f64::from(total) / span as f64)
}

/// `(2 * available + if_needed) / (2 * participants)`
pub fn slot_score(participants: &SlotParticipants) -> f64 {
    let total = participants.total();
    if total == 0 {
        return 0.0;
    }
    let points = 2 * participants.available.len() + participants.if_needed.len();
    points as f64 / (2 * total) as f64
}

/// Score every menu start on `date` that can hold the meeting.
///
/// Returns candidates in menu order; zero-score candidates are dropped.
pub fn score(grids: &[UserGrid], date: DateTime<Utc>, duration_minutes: i64) -> Vec<MeetingSuggestion> {
    let span = span_for(duration_minutes);
    if span == 0 || grids.is_empty() {
        return Vec::new();
    }

    let day = day_of(date);
    let display_date = format_display_date(date);
    let mut candidates = Vec::new();

    for start in 0..SLOT_MENU.len() {
        if start + span > SLOT_MENU.len() {
            break;
        }

        let raw_start = SLOT_MENU[start];
        let raw_end = SLOT_MENU.get(start + span).copied().unwrap_or(DAY_END_LABEL);

        let mut participants = SlotParticipants::default();
        for grid in grids {
            participants.push(ParticipantAvailability {
                email: grid.email.clone(),
                name: grid.name.clone(),
                status: participant_status(grid, day, start, span),
            });
        }

        let score = slot_score(&participants);
        tracing::debug!(
            day = %day,
            start = raw_start,
            end = raw_end,
            score,
            available = participants.available.len(),
            if_needed = participants.if_needed.len(),
            "Scored candidate slot"
        );

        if score > 0.0 {
            candidates.push(MeetingSuggestion {
                date: display_date.clone(),
                day,
                start_time: format_display_time(raw_start),
                end_time: format_display_time(raw_end),
                raw_start_time: raw_start.to_string(),
                raw_end_time: raw_end.to_string(),
                score,
                participants,
            });
        }
    }

    candidates
}
