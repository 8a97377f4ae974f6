use anyhow::{Context, Result};
use async_trait::async_trait;

use super::Database;
use crate::models::{AvailabilityGrid, Meeting, NewNotification, Notification};
use crate::scheduling::{MeetingStore, NotificationSink, ScheduleProvider, UserGrid};

#[async_trait]
impl ScheduleProvider for Database {
    async fn get_grid(&self, email: &str) -> Result<Option<AvailabilityGrid>> {
        self.load_grid(email)
    }

    async fn get_grids(&self, emails: &[String]) -> Result<Vec<UserGrid>> {
        let mut grids = Vec::with_capacity(emails.len());
        for email in emails {
            let Some(user) = self.get_user_by_email(email)? else {
                continue;
            };
            if let Some(grid) = self.load_grid(email)? {
                grids.push(UserGrid::new(email.clone(), grid).with_name(Some(user.name)));
            }
        }
        Ok(grids)
    }

    async fn set_grid(&self, email: &str, grid: &AvailabilityGrid) -> Result<AvailabilityGrid> {
        self.save_grid(email, grid)?;
        self.load_grid(email)?
            .with_context(|| format!("No schedule stored for {}", email))
    }
}

#[async_trait]
impl MeetingStore for Database {
    async fn create(&self, meeting: &Meeting) -> Result<()> {
        self.insert_meeting(meeting)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Meeting>> {
        self.load_meeting(id)
    }

    async fn update(&self, meeting: &Meeting) -> Result<()> {
        self.replace_meeting(meeting)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        if !self.cancel_meeting(id)? {
            anyhow::bail!("Meeting {} does not exist", id);
        }
        Ok(())
    }

    async fn list_for_participant(&self, email: &str) -> Result<Vec<Meeting>> {
        self.list_meetings_for(email)
    }
}

#[async_trait]
impl NotificationSink for Database {
    async fn notify(&self, notification: NewNotification) -> Result<Notification> {
        let stored = self.insert_notification(&notification)?;
        tracing::debug!(
            recipient = %stored.recipient,
            "Stored notification '{}'",
            stored.title
        );
        Ok(stored)
    }
}
