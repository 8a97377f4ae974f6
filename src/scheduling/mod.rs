pub mod clock;
mod commit;
mod locks;
pub mod ranker;
pub mod scorer;

pub use commit::entry_status;
pub use locks::{KeyGuard, KeyedLocks};

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::models::{
    AvailabilityGrid, AvailabilityState, Meeting, MeetingSuggestion, NewNotification,
    Notification,
};

/// A user's grid together with who it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct UserGrid {
    pub email: String,
    pub name: Option<String>,
    pub grid: AvailabilityGrid,
}

impl UserGrid {
    pub fn new(email: impl Into<String>, grid: AvailabilityGrid) -> Self {
        Self {
            email: email.into(),
            name: None,
            grid,
        }
    }

    /// Stand-in for a participant with nothing stored
    pub fn empty(email: impl Into<String>) -> Self {
        Self::new(email, AvailabilityGrid::new())
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }
}

/// Source of availability grids
#[async_trait]
pub trait ScheduleProvider: Send + Sync {
    async fn get_grid(&self, email: &str) -> AnyResult<Option<AvailabilityGrid>>;

    /// Grids for every email that has one; unknown emails are left out
    async fn get_grids(&self, emails: &[String]) -> AnyResult<Vec<UserGrid>> {
        let mut grids = Vec::with_capacity(emails.len());
        for email in emails {
            if let Some(grid) = self.get_grid(email).await? {
                grids.push(UserGrid::new(email.clone(), grid));
            }
        }
        Ok(grids)
    }

    /// Replace the whole grid
    async fn set_grid(&self, email: &str, grid: &AvailabilityGrid) -> AnyResult<AvailabilityGrid>;
}

/// Persistence for meetings
#[async_trait]
pub trait MeetingStore: Send + Sync {
    async fn create(&self, meeting: &Meeting) -> AnyResult<()>;

    async fn get_by_id(&self, id: &str) -> AnyResult<Option<Meeting>>;

    /// Full replace, participants included
    async fn update(&self, meeting: &Meeting) -> AnyResult<()>;

    /// Soft delete; the meeting stays readable as cancelled
    async fn delete(&self, id: &str) -> AnyResult<()>;

    /// Meetings the user organizes or is invited to, cancelled ones excluded
    async fn list_for_participant(&self, email: &str) -> AnyResult<Vec<Meeting>>;
}

/// Where lifecycle notifications go
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: NewNotification) -> AnyResult<Notification>;
}

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("Participants array is required")]
    NoParticipants,

    #[error("Duration must be a positive number of minutes, got {0}")]
    InvalidDuration(i64),

    #[error("Meeting end time must be after its start time")]
    InvalidTimeRange,

    #[error("Meeting title is required")]
    MissingTitle,

    #[error("Meeting not found")]
    MeetingNotFound,

    #[error("You are not a participant in this meeting")]
    NotParticipant,

    #[error("Only the meeting organizer can delete a meeting")]
    NotOrganizer,

    #[error("Cannot update response: your availability is {0}, not 'if-needed'")]
    NotIfNeeded(AvailabilityState),

    #[error("Meeting has been cancelled")]
    MeetingCancelled,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SchedulingError>;

/// The suggestion engine and the meeting commit flow, wired to their collaborators
#[derive(Clone)]
pub struct Scheduler {
    schedules: Arc<dyn ScheduleProvider>,
    meetings: Arc<dyn MeetingStore>,
    notifications: Arc<dyn NotificationSink>,
    /// Per email, around grid read-modify-write
    grid_locks: KeyedLocks,
    /// Per meeting id, around response and cancellation
    meeting_locks: KeyedLocks,
}

impl Scheduler {
    pub fn new(
        schedules: Arc<dyn ScheduleProvider>,
        meetings: Arc<dyn MeetingStore>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            schedules,
            meetings,
            notifications,
            grid_locks: KeyedLocks::new(),
            meeting_locks: KeyedLocks::new(),
        }
    }

    pub fn meetings(&self) -> &dyn MeetingStore {
        self.meetings.as_ref()
    }

    pub fn schedules(&self) -> &dyn ScheduleProvider {
        self.schedules.as_ref()
    }

    /// Top suggestions for meeting `participants` on `date`.
    ///
    /// Participants without a stored grid are scored as fully unavailable.
    /// An empty result means no slot had anyone free.
    pub async fn suggest_times(
        &self,
        participants: &[String],
        date: DateTime<Utc>,
        duration_minutes: i64,
    ) -> Result<Vec<MeetingSuggestion>> {
        let participants = dedup_emails(participants.iter().map(String::as_str));
        if participants.is_empty() {
            return Err(SchedulingError::NoParticipants);
        }
        if duration_minutes <= 0 {
            return Err(SchedulingError::InvalidDuration(duration_minutes));
        }

        let mut found = self.schedules.get_grids(&participants).await?;
        tracing::info!(
            participants = participants.len(),
            with_grid = found.len(),
            duration_minutes,
            "Generating meeting suggestions for {}",
            date.format("%Y-%m-%d")
        );

        let grids: Vec<UserGrid> = participants
            .iter()
            .map(|email| match found.iter().position(|g| &g.email == email) {
                Some(idx) => found.swap_remove(idx),
                None => UserGrid::empty(email.clone()),
            })
            .collect();

        let candidates = scorer::score(&grids, date, duration_minutes);
        let total = candidates.len();
        let suggestions = ranker::rank(candidates);

        if suggestions.is_empty() {
            tracing::info!("No suitable meeting times found");
        } else {
            tracing::debug!("Returning {} of {} candidate slots", suggestions.len(), total);
        }

        Ok(suggestions)
    }

    /// Direct edit of a user's grid, serialized with meeting locks
    pub async fn replace_grid(&self, email: &str, grid: &AvailabilityGrid) -> Result<AvailabilityGrid> {
        let _guard = self.grid_locks.acquire(email).await;
        Ok(self.schedules.set_grid(email, grid).await?)
    }

    async fn send(&self, notification: NewNotification) {
        let recipient = notification.recipient.clone();
        if let Err(e) = self.notifications.notify(notification).await {
            tracing::warn!("Failed to store notification for {}: {}", recipient, e);
        }
    }
}

/// Trim, drop blanks and duplicates, keep first-seen order
pub fn dedup_emails<'a>(emails: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    emails
        .into_iter()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .filter(|e| seen.insert(e.to_string()))
        .map(str::to_string)
        .collect()
}
