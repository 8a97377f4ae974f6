mod store;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::crypto::{generate_id, verify_api_key};
use crate::models::{
    AvailabilityGrid, AvailabilityState, Day, Meeting, MeetingParticipant, MeetingStatus,
    NewNotification, Notification, ParticipantStatus, Severity, SlotEntry, User,
};

const MIGRATION_001: &str = include_str!("migrations/001_initial.sql");

const USER_COLUMNS: &str = "id, email, name, team, api_key_hash, created_at";

const NOTIFICATION_COLUMNS: &str =
    "id, recipient, title, message, severity, meeting_id, read, created_at";

/// Database connection wrapper
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(MIGRATION_001)
            .context("Failed to run migration 001")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Database connection lock poisoned"))
    }

    // ==================== User Operations ====================

    /// Create a new user
    pub fn create_user(&self, user: &User) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO users (id, email, name, team, api_key_hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                user.id,
                user.email,
                user.name,
                user.team,
                user.api_key_hash,
                user.created_at,
            ],
        )
        .context("Failed to create user")?;
        Ok(())
    }

    /// Get a user by email
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
            params![email],
            row_to_user,
        )
        .optional()
        .context("Failed to get user by email")
    }

    /// All registered users, by name
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY name COLLATE NOCASE, email",
            USER_COLUMNS
        ))?;
        let users = stmt.query_map([], row_to_user)?;
        users
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list users")
    }

    /// Update user's API key hash
    pub fn update_user_api_key_hash(&self, user_id: &str, api_key_hash: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE users SET api_key_hash = ?1 WHERE id = ?2",
            params![api_key_hash, user_id],
        )?;
        Ok(())
    }

    /// Find user by validating API key against stored hashes
    pub fn find_user_by_api_key(&self, api_key: &str) -> Result<Option<User>> {
        let users = self.list_users()?;
        Ok(users
            .into_iter()
            .find(|user| verify_api_key(api_key, &user.api_key_hash)))
    }

    // ==================== Grid Operations ====================

    /// Load a user's grid; `None` when the user is unknown
    pub fn load_grid(&self, email: &str) -> Result<Option<AvailabilityGrid>> {
        let conn = self.conn()?;
        let known = conn
            .prepare("SELECT 1 FROM users WHERE email = ?1")?
            .exists(params![email])?;
        if !known {
            return Ok(None);
        }

        let mut stmt = conn.prepare(
            "SELECT day, slot, status, event_source, previous_entry
             FROM grid_slots WHERE email = ?1",
        )?;
        let rows = stmt.query_map(params![email], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut grid = AvailabilityGrid::new();
        for row in rows {
            let (day, slot, status, event_source, previous) = row?;
            let Some(day) = Day::parse(&day) else {
                tracing::warn!("Skipping slot with unknown day '{}' for {}", day, email);
                continue;
            };
            grid.set(
                day,
                slot,
                SlotEntry {
                    status: AvailabilityState::parse(&status).unwrap_or_default(),
                    event_source,
                    previous: previous.as_deref().and_then(parse_previous).map(Box::new),
                },
            );
        }
        Ok(Some(grid))
    }

    /// Replace a user's whole grid
    pub fn save_grid(&self, email: &str, grid: &AvailabilityGrid) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM grid_slots WHERE email = ?1", params![email])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO grid_slots (email, day, slot, status, event_source, previous_entry)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (day, slot, entry) in grid.iter() {
                insert.execute(params![
                    email,
                    day.as_str(),
                    slot,
                    entry.status.as_str(),
                    entry.event_source,
                    entry.previous.as_deref().map(format_previous).transpose()?,
                ])?;
            }
        }
        tx.commit().context("Failed to save grid")?;
        Ok(())
    }

    // ==================== Meeting Operations ====================

    /// Insert a meeting and its participants
    pub fn insert_meeting(&self, meeting: &Meeting) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO meetings (id, title, description, start_time, end_time,
                                  organizer, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                meeting.id,
                meeting.title,
                meeting.description,
                meeting.start_time.timestamp(),
                meeting.end_time.timestamp(),
                meeting.organizer,
                meeting.status.as_str(),
                meeting.created_at,
            ],
        )?;
        write_participants(&tx, meeting)?;
        tx.commit().context("Failed to create meeting")?;
        Ok(())
    }

    /// Get a meeting by ID, cancelled ones included
    pub fn load_meeting(&self, id: &str) -> Result<Option<Meeting>> {
        let conn = self.conn()?;
        read_meeting(&conn, id)
    }

    /// Overwrite a meeting and its participant list
    pub fn replace_meeting(&self, meeting: &Meeting) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let updated = tx.execute(
            r#"
            UPDATE meetings SET title = ?1, description = ?2, start_time = ?3, end_time = ?4,
                                organizer = ?5, status = ?6
            WHERE id = ?7
            "#,
            params![
                meeting.title,
                meeting.description,
                meeting.start_time.timestamp(),
                meeting.end_time.timestamp(),
                meeting.organizer,
                meeting.status.as_str(),
                meeting.id,
            ],
        )?;
        if updated == 0 {
            anyhow::bail!("Meeting {} does not exist", meeting.id);
        }
        tx.execute(
            "DELETE FROM meeting_participants WHERE meeting_id = ?1",
            params![meeting.id],
        )?;
        write_participants(&tx, meeting)?;
        tx.commit().context("Failed to update meeting")?;
        Ok(())
    }

    /// Mark a meeting cancelled
    pub fn cancel_meeting(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE meetings SET status = ?1 WHERE id = ?2",
            params![MeetingStatus::Cancelled.as_str(), id],
        )?;
        Ok(updated > 0)
    }

    /// Live meetings a user organizes or is invited to, soonest first
    pub fn list_meetings_for(&self, email: &str) -> Result<Vec<Meeting>> {
        let conn = self.conn()?;
        let ids: Vec<String> = {
            let mut stmt = conn.prepare(
                r#"
                SELECT DISTINCT m.id, m.start_time FROM meetings m
                LEFT JOIN meeting_participants p ON p.meeting_id = m.id
                WHERE (m.organizer = ?1 OR p.email = ?1) AND m.status != ?2
                ORDER BY m.start_time ASC
                "#,
            )?;
            let rows = stmt.query_map(
                params![email, MeetingStatus::Cancelled.as_str()],
                |row| row.get(0),
            )?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let mut meetings = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(meeting) = read_meeting(&conn, &id)? {
                meetings.push(meeting);
            }
        }
        Ok(meetings)
    }

    // ==================== Notification Operations ====================

    /// Store a notification
    pub fn insert_notification(&self, new: &NewNotification) -> Result<Notification> {
        let notification = Notification {
            id: generate_id(),
            recipient: new.recipient.clone(),
            title: new.title.clone(),
            message: new.message.clone(),
            severity: new.severity,
            meeting_id: new.meeting_id.clone(),
            read: false,
            created_at: Utc::now().timestamp(),
        };

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO notifications (id, recipient, title, message, severity, meeting_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                notification.id,
                notification.recipient,
                notification.title,
                notification.message,
                notification.severity.as_str(),
                notification.meeting_id,
                notification.created_at,
            ],
        )
        .context("Failed to store notification")?;
        Ok(notification)
    }

    /// A user's notifications, newest first
    pub fn list_notifications(&self, recipient: &str) -> Result<Vec<Notification>> {
        self.query_notifications(
            &format!(
                "SELECT {} FROM notifications WHERE recipient = ?1 AND deleted = 0
                 ORDER BY created_at DESC, rowid DESC",
                NOTIFICATION_COLUMNS
            ),
            recipient,
        )
    }

    /// A user's unread notifications, oldest first
    pub fn list_unread_notifications(&self, recipient: &str) -> Result<Vec<Notification>> {
        self.query_notifications(
            &format!(
                "SELECT {} FROM notifications WHERE recipient = ?1 AND deleted = 0 AND read = 0
                 ORDER BY created_at ASC, rowid ASC",
                NOTIFICATION_COLUMNS
            ),
            recipient,
        )
    }

    fn query_notifications(&self, sql: &str, recipient: &str) -> Result<Vec<Notification>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let notifications = stmt.query_map(params![recipient], row_to_notification)?;
        notifications
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list notifications")
    }

    /// Mark one notification read; false if it is not the user's
    pub fn mark_notification_read(&self, recipient: &str, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE notifications SET read = 1 WHERE id = ?1 AND recipient = ?2 AND deleted = 0",
            params![id, recipient],
        )?;
        Ok(updated > 0)
    }

    pub fn mark_all_notifications_read(&self, recipient: &str) -> Result<usize> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE notifications SET read = 1 WHERE recipient = ?1 AND deleted = 0 AND read = 0",
            params![recipient],
        )?;
        Ok(updated)
    }

    /// Soft-delete every notification of a user
    pub fn clear_notifications(&self, recipient: &str) -> Result<usize> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE notifications SET deleted = 1 WHERE recipient = ?1 AND deleted = 0",
            params![recipient],
        )?;
        Ok(updated)
    }

    #[cfg(test)]
    pub(crate) fn seed_user(&self, email: &str, name: &str) -> User {
        self.seed_user_with_key(email, name, "test_api_key")
    }

    #[cfg(test)]
    pub(crate) fn seed_user_with_key(&self, email: &str, name: &str, api_key: &str) -> User {
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: name.to_string(),
            team: None,
            api_key_hash: bcrypt::hash(api_key, 4).unwrap(),
            created_at: Utc::now().timestamp(),
        };
        self.create_user(&user).unwrap();
        user
    }
}


/// A plain state is stored bare, a lock chain as its JSON record
fn format_previous(entry: &SlotEntry) -> Result<String> {
    if entry.is_locked() || entry.previous.is_some() {
        serde_json::to_string(entry).context("Failed to encode previous slot entry")
    } else {
        Ok(entry.status.as_str().to_string())
    }
}

fn parse_previous(raw: &str) -> Option<SlotEntry> {
    AvailabilityState::parse(raw)
        .map(SlotEntry::new)
        .or_else(|| serde_json::from_str(raw).ok())
}
fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        team: row.get(3)?,
        api_key_hash: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn row_to_notification(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get(0)?,
        recipient: row.get(1)?,
        title: row.get(2)?,
        message: row.get(3)?,
        severity: Severity::parse(&row.get::<_, String>(4)?).unwrap_or_default(),
        meeting_id: row.get(5)?,
        read: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
}

fn write_participants(conn: &Connection, meeting: &Meeting) -> Result<()> {
    let mut insert = conn.prepare(
        "INSERT INTO meeting_participants (meeting_id, position, email, name, availability, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for (position, participant) in meeting.participants.iter().enumerate() {
        insert.execute(params![
            meeting.id,
            position as i64,
            participant.email,
            participant.name,
            participant.availability.as_str(),
            participant.status.as_str(),
        ])?;
    }
    Ok(())
}

fn read_meeting(conn: &Connection, id: &str) -> Result<Option<Meeting>> {
    let meeting = conn
        .query_row(
            "SELECT id, title, description, start_time, end_time, organizer, status, created_at
             FROM meetings WHERE id = ?1",
            params![id],
            |row| {
                Ok(Meeting {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    start_time: timestamp(row.get(3)?),
                    end_time: timestamp(row.get(4)?),
                    organizer: row.get(5)?,
                    participants: Vec::new(),
                    status: MeetingStatus::parse(&row.get::<_, String>(6)?).unwrap_or_default(),
                    created_at: row.get(7)?,
                })
            },
        )
        .optional()
        .context("Failed to get meeting")?;

    let Some(mut meeting) = meeting else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT email, name, availability, status FROM meeting_participants
         WHERE meeting_id = ?1 ORDER BY position ASC",
    )?;
    let participants = stmt.query_map(params![id], |row| {
        Ok(MeetingParticipant {
            email: row.get(0)?,
            name: row.get(1)?,
            availability: AvailabilityState::parse(&row.get::<_, String>(2)?).unwrap_or_default(),
            status: ParticipantStatus::parse(&row.get::<_, String>(3)?).unwrap_or_default(),
        })
    })?;
    meeting.participants = participants
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to get meeting participants")?;

    Ok(Some(meeting))
}
