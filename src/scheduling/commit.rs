use anyhow::Result as AnyResult;
use chrono::Utc;

use super::clock::{day_of, exact_slot_label, hour_label, hours_touched};
use super::{dedup_emails, Result, Scheduler, SchedulingError};
use crate::crypto::generate_id;
use crate::models::{
    AvailabilityState, Meeting, MeetingDraft, MeetingParticipant, MeetingResponse, MeetingStatus,
    NewNotification, ParticipantStatus, Severity,
};

/// Status a participant enters a new meeting with.
///
/// The organizer and anyone free at the start are in; everyone else has to
/// answer.
pub fn entry_status(is_organizer: bool, availability: AvailabilityState) -> ParticipantStatus {
    if is_organizer || availability == AvailabilityState::Available {
        ParticipantStatus::Accepted
    } else {
        ParticipantStatus::Pending
    }
}

fn invitation(meeting: &Meeting, participant: &MeetingParticipant) -> NewNotification {
    let title = &meeting.title;
    let (message, severity) = if participant.email == meeting.organizer {
        (format!("You have created a meeting: {}", title), Severity::Info)
    } else {
        match participant.availability {
            AvailabilityState::Available => (
                format!("You have been added to a meeting: {}", title),
                Severity::Success,
            ),
            AvailabilityState::IfNeeded => (
                format!(
                    "You have been invited to a meeting: {}. Please accept or reject.",
                    title
                ),
                Severity::Warning,
            ),
            AvailabilityState::Unavailable => (
                format!(
                    "You have been invited to a meeting: {}, but you appear to be unavailable at this time.",
                    title
                ),
                Severity::Warning,
            ),
        }
    };

    NewNotification::new(&participant.email, "Meeting Invitation", message, severity)
        .for_meeting(&meeting.id)
}

impl Scheduler {
    /// Book a meeting chosen by `organizer`.
    ///
    /// Each participant's status comes from their grid at the exact start
    /// minute. Accepted participants get the meeting's hours locked in their
    /// grid; a failed lock is logged and does not fail the booking.
    pub async fn commit_meeting(&self, organizer: &str, draft: MeetingDraft) -> Result<Meeting> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(SchedulingError::MissingTitle);
        }
        if draft.end_time <= draft.start_time {
            return Err(SchedulingError::InvalidTimeRange);
        }

        let emails = dedup_emails(
            std::iter::once(organizer).chain(draft.participants.iter().map(|p| p.email.as_str())),
        );

        let day = day_of(draft.start_time);
        let slot = exact_slot_label(draft.start_time);
        tracing::debug!("Checking availability for {} at {} UTC", day, slot);

        let mut participants = Vec::with_capacity(emails.len());
        for email in emails {
            let availability = self
                .schedules
                .get_grid(&email)
                .await?
                .map(|grid| grid.state(day, &slot))
                .unwrap_or_default();

            let name = draft
                .participants
                .iter()
                .find(|p| p.email.trim() == email)
                .and_then(|p| p.name.clone());

            participants.push(MeetingParticipant {
                status: entry_status(email == organizer, availability),
                email,
                name,
                availability,
            });
        }

        let meeting = Meeting {
            id: generate_id(),
            title: title.to_string(),
            description: draft.description.filter(|d| !d.trim().is_empty()),
            start_time: draft.start_time,
            end_time: draft.end_time,
            organizer: organizer.to_string(),
            participants,
            status: MeetingStatus::Scheduled,
            created_at: Utc::now().timestamp(),
        };

        self.meetings.create(&meeting).await?;
        tracing::info!(
            meeting_id = %meeting.id,
            participants = meeting.participants.len(),
            "Meeting '{}' scheduled by {}",
            meeting.title,
            organizer
        );

        for participant in &meeting.participants {
            self.send(invitation(&meeting, participant)).await;
        }

        for participant in &meeting.participants {
            if participant.status == ParticipantStatus::Accepted {
                self.lock_meeting_slots(&participant.email, &meeting).await;
            }
        }

        Ok(meeting)
    }

    /// Record an if-needed participant's answer.
    ///
    /// Accepting locks the meeting's hours in the responder's grid; rejecting
    /// after having accepted gives them back. Once everybody has answered the
    /// meeting is confirmed.
    pub async fn respond_to_meeting(
        &self,
        meeting_id: &str,
        responder: &str,
        response: MeetingResponse,
    ) -> Result<Meeting> {
        let _guard = self.meeting_locks.acquire(meeting_id).await;
        let mut meeting = self
            .meetings
            .get_by_id(meeting_id)
            .await?
            .ok_or(SchedulingError::MeetingNotFound)?;

        if meeting.status == MeetingStatus::Cancelled {
            return Err(SchedulingError::MeetingCancelled);
        }

        let participant = meeting
            .participant_mut(responder)
            .ok_or(SchedulingError::NotParticipant)?;

        if participant.availability != AvailabilityState::IfNeeded {
            return Err(SchedulingError::NotIfNeeded(participant.availability));
        }

        let was_accepted = participant.status == ParticipantStatus::Accepted;
        participant.status = response.into();
        let responder_name = participant.display_name().to_string();

        let newly_confirmed =
            meeting.status == MeetingStatus::Scheduled && meeting.all_responded();
        if newly_confirmed {
            meeting.status = MeetingStatus::Confirmed;
        }

        self.meetings.update(&meeting).await?;
        tracing::info!(meeting_id, "{} {} the meeting", responder, response);

        let severity = match response {
            MeetingResponse::Accepted => Severity::Success,
            MeetingResponse::Rejected => Severity::Info,
        };
        self.send(
            NewNotification::new(
                &meeting.organizer,
                "Meeting Response",
                format!(
                    "{} has {} your meeting: {}",
                    responder_name, response, meeting.title
                ),
                severity,
            )
            .for_meeting(&meeting.id),
        )
        .await;

        match response {
            MeetingResponse::Accepted => self.lock_meeting_slots(responder, &meeting).await,
            MeetingResponse::Rejected if was_accepted => {
                self.release_meeting_slots(responder, &meeting).await
            }
            MeetingResponse::Rejected => {}
        }

        if newly_confirmed {
            tracing::info!(meeting_id, "All participants responded, meeting confirmed");
            self.send(
                NewNotification::new(
                    &meeting.organizer,
                    "Meeting Confirmed",
                    format!(
                        "All participants have responded to your meeting: {}",
                        meeting.title
                    ),
                    Severity::Success,
                )
                .for_meeting(&meeting.id),
            )
            .await;
        }

        Ok(meeting)
    }

    /// Cancel a meeting on behalf of its organizer and free the locked hours
    pub async fn cancel_meeting(&self, meeting_id: &str, requester: &str) -> Result<Meeting> {
        let _guard = self.meeting_locks.acquire(meeting_id).await;
        let mut meeting = self
            .meetings
            .get_by_id(meeting_id)
            .await?
            .ok_or(SchedulingError::MeetingNotFound)?;

        if meeting.organizer != requester {
            return Err(SchedulingError::NotOrganizer);
        }
        if meeting.status == MeetingStatus::Cancelled {
            return Err(SchedulingError::MeetingCancelled);
        }

        self.meetings.delete(meeting_id).await?;
        meeting.status = MeetingStatus::Cancelled;
        tracing::info!(meeting_id, "Meeting cancelled by {}", requester);

        for participant in meeting.participants.iter().filter(|p| p.email != requester) {
            self.send(
                NewNotification::new(
                    &participant.email,
                    "Meeting Cancelled",
                    format!("Meeting cancelled: {}", meeting.title),
                    Severity::Warning,
                )
                .for_meeting(&meeting.id),
            )
            .await;
        }
        self.send(
            NewNotification::new(
                requester,
                "Meeting Deleted",
                format!("Meeting deleted: {}", meeting.title),
                Severity::Info,
            )
            .for_meeting(&meeting.id),
        )
        .await;

        for participant in &meeting.participants {
            if participant.status == ParticipantStatus::Accepted {
                self.release_meeting_slots(&participant.email, &meeting).await;
            }
        }

        Ok(meeting)
    }

    async fn lock_meeting_slots(&self, email: &str, meeting: &Meeting) {
        match self.try_lock_meeting_slots(email, meeting).await {
            Ok(0) => tracing::debug!("No schedule to lock for {}", email),
            Ok(count) => tracing::info!(
                meeting_id = %meeting.id,
                "Marked {} slot(s) unavailable for {}",
                count,
                email
            ),
            Err(e) => tracing::warn!(
                meeting_id = %meeting.id,
                "Failed to mark slots unavailable for {}: {}",
                email,
                e
            ),
        }
    }

    async fn try_lock_meeting_slots(&self, email: &str, meeting: &Meeting) -> AnyResult<usize> {
        let _guard = self.grid_locks.acquire(email).await;

        let Some(mut grid) = self.schedules.get_grid(email).await? else {
            return Ok(0);
        };

        let day = day_of(meeting.start_time);
        let source = meeting.event_source();
        let hours = hours_touched(meeting.start_time, meeting.end_time);
        let count = hours.len();
        for hour in hours {
            grid.lock_slot(day, &hour_label(hour), &source);
        }

        self.schedules.set_grid(email, &grid).await?;
        Ok(count)
    }

    async fn release_meeting_slots(&self, email: &str, meeting: &Meeting) {
        match self.try_release_meeting_slots(email, meeting).await {
            Ok(0) => {}
            Ok(count) => tracing::info!(
                meeting_id = %meeting.id,
                "Released {} slot(s) for {}",
                count,
                email
            ),
            Err(e) => tracing::warn!(
                meeting_id = %meeting.id,
                "Failed to release slots for {}: {}",
                email,
                e
            ),
        }
    }

    async fn try_release_meeting_slots(&self, email: &str, meeting: &Meeting) -> AnyResult<usize> {
        let _guard = self.grid_locks.acquire(email).await;

        let Some(mut grid) = self.schedules.get_grid(email).await? else {
            return Ok(0);
        };

        let count = grid.release_source(&meeting.event_source());
        if count > 0 {
            self.schedules.set_grid(email, &grid).await?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{AvailabilityGrid, Day, ParticipantRef, SlotEntry};
    use crate::scheduling::clock::SLOT_MENU;
    use chrono::{DateTime, Duration, TimeZone};
    use std::sync::Arc;

    const ALICE: &str = "alice@example.com";
    const BOB: &str = "bob@example.com";
    const CAROL: &str = "carol@example.com";

    fn scheduler(db: &Database) -> Scheduler {
        let db = Arc::new(db.clone());
        Scheduler::new(db.clone(), db.clone(), db)
    }

    fn tuesday_at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, hour, 0, 0).unwrap()
    }

    fn seed(db: &Database, email: &str, slots: &[(&str, AvailabilityState)]) {
        db.seed_user(email, email.split('@').next().unwrap_or(email));
        let mut grid = AvailabilityGrid::new();
        for (slot, state) in slots {
            grid.set_state(Day::Tuesday, *slot, *state);
        }
        db.save_grid(email, &grid).unwrap();
    }

    fn draft(start_hour: u32, hours: i64, invitees: &[&str]) -> MeetingDraft {
        MeetingDraft {
            title: "Planning".to_string(),
            description: None,
            start_time: tuesday_at(start_hour),
            end_time: tuesday_at(start_hour) + Duration::hours(hours),
            participants: invitees.iter().map(|e| ParticipantRef::new(*e)).collect(),
        }
    }

    fn status_of(meeting: &Meeting, email: &str) -> ParticipantStatus {
        meeting.participant(email).unwrap().status
    }

    #[test]
    fn test_entry_status() {
        assert_eq!(entry_status(true, AvailabilityState::Unavailable), ParticipantStatus::Accepted);
        assert_eq!(entry_status(false, AvailabilityState::Available), ParticipantStatus::Accepted);
        assert_eq!(entry_status(false, AvailabilityState::IfNeeded), ParticipantStatus::Pending);
        assert_eq!(entry_status(false, AvailabilityState::Unavailable), ParticipantStatus::Pending);
    }

    #[tokio::test]
    async fn test_commit_assigns_entry_statuses() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, ALICE, &[]);
        seed(&db, BOB, &[("10:00", AvailabilityState::Available)]);
        seed(&db, CAROL, &[("10:00", AvailabilityState::IfNeeded)]);

        let meeting = scheduler(&db)
            .commit_meeting(ALICE, draft(10, 1, &[BOB, CAROL, "dave@example.com"]))
            .await
            .unwrap();

        assert_eq!(meeting.status, MeetingStatus::Scheduled);
        assert_eq!(meeting.participants.len(), 4);
        assert_eq!(meeting.participants[0].email, ALICE);
        // organizer is in even though their grid is empty
        assert_eq!(status_of(&meeting, ALICE), ParticipantStatus::Accepted);
        assert_eq!(status_of(&meeting, BOB), ParticipantStatus::Accepted);
        assert_eq!(status_of(&meeting, CAROL), ParticipantStatus::Pending);
        assert_eq!(status_of(&meeting, "dave@example.com"), ParticipantStatus::Pending);
        assert_eq!(
            meeting.participant("dave@example.com").unwrap().availability,
            AvailabilityState::Unavailable
        );

        let stored = db.load_meeting(&meeting.id).unwrap().unwrap();
        assert_eq!(stored.participants, meeting.participants);
        assert_eq!(db.list_notifications(BOB).unwrap().len(), 1);
        assert_eq!(db.list_notifications(CAROL).unwrap()[0].severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_commit_locks_accepted_participants_only() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, ALICE, &[("10:00", AvailabilityState::Available)]);
        seed(
            &db,
            BOB,
            &[
                ("10:00", AvailabilityState::Available),
                ("11:00", AvailabilityState::Available),
                ("12:00", AvailabilityState::Available),
            ],
        );
        seed(&db, CAROL, &[("10:00", AvailabilityState::IfNeeded)]);

        let meeting = scheduler(&db)
            .commit_meeting(ALICE, draft(10, 2, &[BOB, CAROL]))
            .await
            .unwrap();
        let source = meeting.event_source();

        let bob = db.load_grid(BOB).unwrap().unwrap();
        for slot in ["10:00", "11:00"] {
            let entry = bob.entry(Day::Tuesday, slot);
            assert_eq!(entry.status, AvailabilityState::Unavailable);
            assert_eq!(entry.event_source.as_deref(), Some(source.as_str()));
        }
        // the hour the meeting ends on stays free
        assert_eq!(bob.state(Day::Tuesday, "12:00"), AvailabilityState::Available);

        let alice = db.load_grid(ALICE).unwrap().unwrap();
        assert!(alice.entry(Day::Tuesday, "10:00").is_locked());

        let carol = db.load_grid(CAROL).unwrap().unwrap();
        assert_eq!(carol.state(Day::Tuesday, "10:00"), AvailabilityState::IfNeeded);
    }

    #[tokio::test]
    async fn test_locked_slots_drop_out_of_suggestions() {
        let db = Database::open_in_memory().unwrap();
        let all_day: Vec<(&str, AvailabilityState)> = SLOT_MENU
            .iter()
            .map(|s| (*s, AvailabilityState::Available))
            .collect();
        seed(&db, ALICE, &all_day);
        let scheduler = scheduler(&db);

        scheduler
            .commit_meeting(ALICE, draft(9, 3, &[]))
            .await
            .unwrap();

        let suggestions = scheduler
            .suggest_times(&[ALICE.to_string()], tuesday_at(0), 60)
            .await
            .unwrap();
        let starts: Vec<&str> = suggestions.iter().map(|s| s.raw_start_time.as_str()).collect();
        assert_eq!(starts, vec!["12:00", "13:00", "14:00"]);
    }

    #[tokio::test]
    async fn test_if_needed_participant_accepts() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, ALICE, &[("10:00", AvailabilityState::Available)]);
        seed(
            &db,
            BOB,
            &[
                ("10:00", AvailabilityState::IfNeeded),
                ("11:00", AvailabilityState::IfNeeded),
            ],
        );
        seed(&db, CAROL, &[]);
        let scheduler = scheduler(&db);

        let meeting = scheduler
            .commit_meeting(ALICE, draft(10, 2, &[BOB, CAROL]))
            .await
            .unwrap();
        assert_eq!(status_of(&meeting, BOB), ParticipantStatus::Pending);

        let updated = scheduler
            .respond_to_meeting(&meeting.id, BOB, MeetingResponse::Accepted)
            .await
            .unwrap();
        assert_eq!(status_of(&updated, BOB), ParticipantStatus::Accepted);
        // carol is still pending
        assert_eq!(updated.status, MeetingStatus::Scheduled);

        let bob = db.load_grid(BOB).unwrap().unwrap();
        for slot in ["10:00", "11:00"] {
            let entry = bob.entry(Day::Tuesday, slot);
            assert_eq!(entry.status, AvailabilityState::Unavailable);
            assert_eq!(entry.event_source, Some(meeting.event_source()));
        }

        let err = scheduler
            .respond_to_meeting(&meeting.id, CAROL, MeetingResponse::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SchedulingError::NotIfNeeded(AvailabilityState::Unavailable)
        ));

        let err = scheduler
            .respond_to_meeting(&meeting.id, "mallory@example.com", MeetingResponse::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::NotParticipant));

        let organizer_notes = db.list_notifications(ALICE).unwrap();
        assert!(organizer_notes.iter().any(|n| n.title == "Meeting Response"));
    }

    #[tokio::test]
    async fn test_meeting_confirmed_when_everyone_answered() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, ALICE, &[]);
        seed(&db, BOB, &[("14:00", AvailabilityState::IfNeeded)]);
        seed(&db, CAROL, &[("14:00", AvailabilityState::IfNeeded)]);
        let scheduler = scheduler(&db);

        let meeting = scheduler
            .commit_meeting(ALICE, draft(14, 1, &[BOB, CAROL]))
            .await
            .unwrap();

        let after_bob = scheduler
            .respond_to_meeting(&meeting.id, BOB, MeetingResponse::Rejected)
            .await
            .unwrap();
        assert_eq!(after_bob.status, MeetingStatus::Scheduled);

        let after_carol = scheduler
            .respond_to_meeting(&meeting.id, CAROL, MeetingResponse::Accepted)
            .await
            .unwrap();
        assert_eq!(after_carol.status, MeetingStatus::Confirmed);
        assert_eq!(
            db.load_meeting(&meeting.id).unwrap().unwrap().status,
            MeetingStatus::Confirmed
        );

        let confirmations = db
            .list_notifications(ALICE)
            .unwrap()
            .into_iter()
            .filter(|n| n.title == "Meeting Confirmed")
            .count();
        assert_eq!(confirmations, 1);
    }

    #[tokio::test]
    async fn test_rejecting_after_accepting_releases_slots() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, ALICE, &[]);
        seed(&db, BOB, &[("9:00", AvailabilityState::IfNeeded)]);
        let scheduler = scheduler(&db);

        let meeting = scheduler
            .commit_meeting(ALICE, draft(9, 1, &[BOB]))
            .await
            .unwrap();

        scheduler
            .respond_to_meeting(&meeting.id, BOB, MeetingResponse::Accepted)
            .await
            .unwrap();
        assert!(db.load_grid(BOB).unwrap().unwrap().entry(Day::Tuesday, "9:00").is_locked());

        scheduler
            .respond_to_meeting(&meeting.id, BOB, MeetingResponse::Rejected)
            .await
            .unwrap();
        let bob = db.load_grid(BOB).unwrap().unwrap();
        assert_eq!(bob.entry(Day::Tuesday, "9:00").status, AvailabilityState::IfNeeded);
        assert!(!bob.entry(Day::Tuesday, "9:00").is_locked());
    }

    #[tokio::test]
    async fn test_cancel_releases_locks() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, ALICE, &[("15:00", AvailabilityState::Available)]);
        seed(&db, BOB, &[("15:00", AvailabilityState::Available)]);
        let scheduler = scheduler(&db);

        let meeting = scheduler
            .commit_meeting(ALICE, draft(15, 1, &[BOB]))
            .await
            .unwrap();
        assert!(db.load_grid(BOB).unwrap().unwrap().entry(Day::Tuesday, "15:00").is_locked());

        let err = scheduler.cancel_meeting(&meeting.id, BOB).await.unwrap_err();
        assert!(matches!(err, SchedulingError::NotOrganizer));

        let cancelled = scheduler.cancel_meeting(&meeting.id, ALICE).await.unwrap();
        assert_eq!(cancelled.status, MeetingStatus::Cancelled);

        for email in [ALICE, BOB] {
            let grid = db.load_grid(email).unwrap().unwrap();
            assert_eq!(grid.state(Day::Tuesday, "15:00"), AvailabilityState::Available);
        }

        assert!(db.list_meetings_for(BOB).unwrap().is_empty());
        assert!(db
            .list_notifications(BOB)
            .unwrap()
            .iter()
            .any(|n| n.title == "Meeting Cancelled"));

        let err = scheduler
            .respond_to_meeting(&meeting.id, BOB, MeetingResponse::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::MeetingCancelled));
    }

    #[tokio::test]
    async fn test_cancelling_overlapping_meeting_keeps_other_lock() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, ALICE, &[("10:00", AvailabilityState::Available)]);
        let scheduler = scheduler(&db);

        let first = scheduler
            .commit_meeting(ALICE, draft(10, 1, &[]))
            .await
            .unwrap();
        let second = scheduler
            .commit_meeting(ALICE, draft(10, 1, &[]))
            .await
            .unwrap();

        scheduler.cancel_meeting(&second.id, ALICE).await.unwrap();

        let entry = db.load_grid(ALICE).unwrap().unwrap().entry(Day::Tuesday, "10:00");
        assert_eq!(entry.status, AvailabilityState::Unavailable);
        assert_eq!(entry.event_source, Some(first.event_source()));

        let suggestions = scheduler
            .suggest_times(&[ALICE.to_string()], tuesday_at(0), 60)
            .await
            .unwrap();
        assert!(suggestions.iter().all(|s| s.raw_start_time != "10:00"));

        scheduler.cancel_meeting(&first.id, ALICE).await.unwrap();
        let entry = db.load_grid(ALICE).unwrap().unwrap().entry(Day::Tuesday, "10:00");
        assert_eq!(entry, SlotEntry::new(AvailabilityState::Available));
    }

    #[tokio::test]
    async fn test_response_queued_behind_cancel_sees_cancellation() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, ALICE, &[]);
        seed(&db, BOB, &[("11:00", AvailabilityState::IfNeeded)]);
        let scheduler = scheduler(&db);

        let meeting = scheduler
            .commit_meeting(ALICE, draft(11, 1, &[BOB]))
            .await
            .unwrap();

        let held = scheduler.meeting_locks.acquire(&meeting.id).await;

        let canceller = scheduler.clone();
        let id = meeting.id.clone();
        let cancel = tokio::spawn(async move { canceller.cancel_meeting(&id, ALICE).await });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let responder = scheduler.clone();
        let id = meeting.id.clone();
        let respond = tokio::spawn(async move {
            responder
                .respond_to_meeting(&id, BOB, MeetingResponse::Accepted)
                .await
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!cancel.is_finished());
        assert!(!respond.is_finished());

        drop(held);
        cancel.await.unwrap().unwrap();
        assert!(matches!(
            respond.await.unwrap().unwrap_err(),
            SchedulingError::MeetingCancelled
        ));

        let stored = db.load_meeting(&meeting.id).unwrap().unwrap();
        assert_eq!(stored.status, MeetingStatus::Cancelled);
        assert_eq!(status_of(&stored, BOB), ParticipantStatus::Pending);
        let bob = db.load_grid(BOB).unwrap().unwrap();
        assert!(!bob.entry(Day::Tuesday, "11:00").is_locked());
    }

    #[tokio::test]
    async fn test_concurrent_responses_are_both_recorded() {
        let db = Database::open_in_memory().unwrap();
        seed(&db, ALICE, &[]);
        seed(&db, BOB, &[("13:00", AvailabilityState::IfNeeded)]);
        seed(&db, CAROL, &[("13:00", AvailabilityState::IfNeeded)]);
        let scheduler = scheduler(&db);

        let meeting = scheduler
            .commit_meeting(ALICE, draft(13, 1, &[BOB, CAROL]))
            .await
            .unwrap();

        let tasks: Vec<_> = [BOB, CAROL]
            .into_iter()
            .map(|email| {
                let scheduler = scheduler.clone();
                let id = meeting.id.clone();
                tokio::spawn(async move {
                    scheduler
                        .respond_to_meeting(&id, email, MeetingResponse::Accepted)
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = db.load_meeting(&meeting.id).unwrap().unwrap();
        assert_eq!(status_of(&stored, BOB), ParticipantStatus::Accepted);
        assert_eq!(status_of(&stored, CAROL), ParticipantStatus::Accepted);
        assert_eq!(stored.status, MeetingStatus::Confirmed);
        assert!(scheduler.meeting_locks.is_empty());
    }

    #[tokio::test]
    async fn test_commit_rejects_bad_drafts() {
        let db = Database::open_in_memory().unwrap();
        let scheduler = scheduler(&db);

        let mut untitled = draft(10, 1, &[BOB]);
        untitled.title = "  ".to_string();
        assert!(matches!(
            scheduler.commit_meeting(ALICE, untitled).await.unwrap_err(),
            SchedulingError::MissingTitle
        ));

        let mut backwards = draft(10, 1, &[BOB]);
        backwards.end_time = backwards.start_time;
        assert!(matches!(
            scheduler.commit_meeting(ALICE, backwards).await.unwrap_err(),
            SchedulingError::InvalidTimeRange
        ));
    }

    #[tokio::test]
    async fn test_scoring_and_locking_agree_on_the_day() {
        let db = Database::open_in_memory().unwrap();
        let scheduler = scheduler(&db);
        let monday = Utc.with_ymd_and_hms(2025, 3, 3, 11, 0, 0).unwrap();

        for offset in 0..7 {
            let start = monday + Duration::days(offset);
            let day = day_of(start);
            let email = format!("user{}@example.com", offset);
            db.seed_user(&email, "User");
            let mut grid = AvailabilityGrid::new();
            grid.set_state(day, "11:00", AvailabilityState::Available);
            db.save_grid(&email, &grid).unwrap();

            let suggestions = scheduler
                .suggest_times(&[email.clone()], start, 60)
                .await
                .unwrap();
            assert_eq!(suggestions[0].day, day);
            assert_eq!(suggestions[0].raw_start_time, "11:00");

            let draft = MeetingDraft {
                title: "Check".to_string(),
                description: None,
                start_time: start,
                end_time: start + Duration::hours(1),
                participants: vec![],
            };
            scheduler.commit_meeting(&email, draft).await.unwrap();

            let grid = db.load_grid(&email).unwrap().unwrap();
            assert!(grid.entry(suggestions[0].day, "11:00").is_locked());
        }
    }
}
