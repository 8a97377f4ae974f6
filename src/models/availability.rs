use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How free a user is in a given slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AvailabilityState {
    Available,
    IfNeeded,
    #[default]
    Unavailable,
}

impl AvailabilityState {
    /// Weight used when averaging a participant over a multi-hour span
    pub fn weight(&self) -> u32 {
        match self {
            AvailabilityState::Available => 2,
            AvailabilityState::IfNeeded => 1,
            AvailabilityState::Unavailable => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityState::Available => "available",
            AvailabilityState::IfNeeded => "if-needed",
            AvailabilityState::Unavailable => "unavailable",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(AvailabilityState::Available),
            "if-needed" => Some(AvailabilityState::IfNeeded),
            "unavailable" => Some(AvailabilityState::Unavailable),
            _ => None,
        }
    }
}

impl std::fmt::Display for AvailabilityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Day of the week, Monday first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Monday => "monday",
            Day::Tuesday => "tuesday",
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
            Day::Saturday => "saturday",
            Day::Sunday => "sunday",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Day::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl std::fmt::Display for Day {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single grid cell after normalization.
///
/// `event_source` tags why a slot is locked (an internal meeting or an
/// external calendar event). `previous` is the entry the lock replaced,
/// which may itself be another meeting's lock; releasing a lock puts it
/// back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SlotValue", into = "SlotValue")]
pub struct SlotEntry {
    pub status: AvailabilityState,
    pub event_source: Option<String>,
    pub previous: Option<Box<SlotEntry>>,
}

impl SlotEntry {
    pub fn new(status: AvailabilityState) -> Self {
        Self {
            status,
            event_source: None,
            previous: None,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.event_source.is_some()
    }

    /// Whether `source` holds this slot, directly or underneath another lock
    pub fn held_by(&self, source: &str) -> bool {
        self.event_source.as_deref() == Some(source)
            || self.previous.as_ref().is_some_and(|p| p.held_by(source))
    }

    /// This entry with `source`'s lock taken out of the chain.
    ///
    /// A lock with nothing recorded underneath falls back to unavailable.
    fn without(self, source: &str) -> SlotEntry {
        if self.event_source.as_deref() == Some(source) {
            return match self.previous {
                Some(previous) => (*previous).without(source),
                None => SlotEntry::default(),
            };
        }
        SlotEntry {
            previous: self.previous.map(|p| Box::new((*p).without(source))),
            ..self
        }
    }
}

impl Default for SlotEntry {
    fn default() -> Self {
        Self::new(AvailabilityState::Unavailable)
    }
}

/// Wire form of a slot: either the legacy bare state or the record form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum SlotValue {
    Bare(AvailabilityState),
    Record {
        status: AvailabilityState,
        #[serde(
            rename = "eventSource",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        event_source: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous: Option<Box<SlotEntry>>,
    },
}

impl From<SlotValue> for SlotEntry {
    fn from(value: SlotValue) -> Self {
        match value {
            SlotValue::Bare(status) => SlotEntry::new(status),
            SlotValue::Record {
                status,
                event_source,
                previous,
            } => SlotEntry {
                status,
                // Rows written by older clients carry an empty source column
                event_source: event_source.filter(|s| !s.is_empty()),
                previous,
            },
        }
    }
}

impl From<SlotEntry> for SlotValue {
    fn from(entry: SlotEntry) -> Self {
        if entry.event_source.is_none() && entry.previous.is_none() {
            SlotValue::Bare(entry.status)
        } else {
            SlotValue::Record {
                status: entry.status,
                event_source: entry.event_source,
                previous: entry.previous,
            }
        }
    }
}

/// Weekly recurring availability of one user: day -> slot label -> entry.
///
/// Slots absent from the map are unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvailabilityGrid {
    days: BTreeMap<Day, BTreeMap<String, SlotEntry>>,
}

impl AvailabilityGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.days.values().all(|slots| slots.is_empty())
    }

    /// Whether the user has recorded anything at all for this day
    pub fn has_day(&self, day: Day) -> bool {
        self.days.contains_key(&day)
    }

    pub fn entry(&self, day: Day, slot: &str) -> SlotEntry {
        self.days
            .get(&day)
            .and_then(|slots| slots.get(slot))
            .cloned()
            .unwrap_or_default()
    }

    pub fn state(&self, day: Day, slot: &str) -> AvailabilityState {
        self.days
            .get(&day)
            .and_then(|slots| slots.get(slot))
            .map(|entry| entry.status)
            .unwrap_or_default()
    }

    pub fn set(&mut self, day: Day, slot: impl Into<String>, entry: SlotEntry) {
        self.days.entry(day).or_default().insert(slot.into(), entry);
    }

    pub fn set_state(&mut self, day: Day, slot: impl Into<String>, status: AvailabilityState) {
        self.set(day, slot, SlotEntry::new(status));
    }

    /// Mark a slot unavailable on behalf of `source`.
    ///
    /// Whatever the slot held before, another meeting's lock included, is
    /// kept underneath. Locking a slot `source` already holds is a no-op.
    pub fn lock_slot(&mut self, day: Day, slot: &str, source: &str) {
        let current = self.entry(day, slot);
        if current.held_by(source) {
            return;
        }
        self.set(
            day,
            slot,
            SlotEntry {
                status: AvailabilityState::Unavailable,
                event_source: Some(source.to_string()),
                previous: Some(Box::new(current)),
            },
        );
    }

    /// Undo every lock owned by `source`, returning how many slots changed.
    ///
    /// Locks placed by other sources stay in force.
    pub fn release_source(&mut self, source: &str) -> usize {
        let mut released = 0;
        for slots in self.days.values_mut() {
            for entry in slots.values_mut() {
                if entry.held_by(source) {
                    *entry = std::mem::take(entry).without(source);
                    released += 1;
                }
            }
        }
        released
    }

    /// Iterate `(day, slot, entry)` in day then label order
    pub fn iter(&self) -> impl Iterator<Item = (Day, &str, &SlotEntry)> {
        self.days.iter().flat_map(|(day, slots)| {
            slots
                .iter()
                .map(move |(slot, entry)| (*day, slot.as_str(), entry))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_slots_are_unavailable() {
        let mut grid = AvailabilityGrid::new();
        assert_eq!(grid.state(Day::Monday, "9:00"), AvailabilityState::Unavailable);

        grid.set_state(Day::Monday, "10:00", AvailabilityState::Available);
        assert!(grid.has_day(Day::Monday));
        assert!(!grid.has_day(Day::Tuesday));
        assert_eq!(grid.state(Day::Monday, "9:00"), AvailabilityState::Unavailable);
        assert_eq!(grid.state(Day::Monday, "10:00"), AvailabilityState::Available);
    }

    #[test]
    fn test_legacy_and_record_forms_normalize() {
        let json = r#"{
            "monday": {
                "9:00": "available",
                "10:00": {"status": "if-needed"},
                "11:00": {"status": "unavailable", "eventSource": "meeting-abc"},
                "12:00": {"status": "available", "eventSource": ""}
            }
        }"#;
        let grid: AvailabilityGrid = serde_json::from_str(json).unwrap();

        assert_eq!(grid.entry(Day::Monday, "9:00"), SlotEntry::new(AvailabilityState::Available));
        assert_eq!(grid.entry(Day::Monday, "10:00"), SlotEntry::new(AvailabilityState::IfNeeded));
        let locked = grid.entry(Day::Monday, "11:00");
        assert_eq!(locked.status, AvailabilityState::Unavailable);
        assert_eq!(locked.event_source.as_deref(), Some("meeting-abc"));
        assert!(!grid.entry(Day::Monday, "12:00").is_locked());
    }

    #[test]
    fn test_serializes_plain_slots_in_legacy_form() {
        let mut grid = AvailabilityGrid::new();
        grid.set_state(Day::Friday, "9:00", AvailabilityState::IfNeeded);
        grid.lock_slot(Day::Friday, "10:00", "meeting-1");

        let value = serde_json::to_value(&grid).unwrap();
        assert_eq!(value["friday"]["9:00"], "if-needed");
        assert_eq!(value["friday"]["10:00"]["status"], "unavailable");
        assert_eq!(value["friday"]["10:00"]["eventSource"], "meeting-1");
    }

    #[test]
    fn test_unknown_state_is_rejected() {
        let json = r#"{"monday": {"9:00": "maybe"}}"#;
        assert!(serde_json::from_str::<AvailabilityGrid>(json).is_err());
    }

    #[test]
    fn test_release_restores_previous_state() {
        let mut grid = AvailabilityGrid::new();
        grid.set_state(Day::Monday, "9:00", AvailabilityState::Available);
        grid.set_state(Day::Monday, "10:00", AvailabilityState::IfNeeded);

        grid.lock_slot(Day::Monday, "9:00", "meeting-a");
        grid.lock_slot(Day::Monday, "10:00", "meeting-a");
        grid.lock_slot(Day::Monday, "11:00", "meeting-a");
        assert_eq!(grid.state(Day::Monday, "9:00"), AvailabilityState::Unavailable);

        assert_eq!(grid.release_source("meeting-other"), 0);
        assert_eq!(grid.release_source("meeting-a"), 3);
        assert_eq!(grid.entry(Day::Monday, "9:00"), SlotEntry::new(AvailabilityState::Available));
        assert_eq!(grid.entry(Day::Monday, "10:00"), SlotEntry::new(AvailabilityState::IfNeeded));
        assert_eq!(grid.state(Day::Monday, "11:00"), AvailabilityState::Unavailable);
    }

    #[test]
    fn test_overlapping_locks_release_independently() {
        let mut grid = AvailabilityGrid::new();
        grid.set_state(Day::Monday, "9:00", AvailabilityState::Available);

        grid.lock_slot(Day::Monday, "9:00", "meeting-a");
        grid.lock_slot(Day::Monday, "9:00", "meeting-b");
        assert_eq!(
            grid.entry(Day::Monday, "9:00").event_source.as_deref(),
            Some("meeting-b")
        );

        // meeting-a still holds the slot once meeting-b lets go
        assert_eq!(grid.release_source("meeting-b"), 1);
        let entry = grid.entry(Day::Monday, "9:00");
        assert_eq!(entry.status, AvailabilityState::Unavailable);
        assert_eq!(entry.event_source.as_deref(), Some("meeting-a"));

        assert_eq!(grid.release_source("meeting-a"), 1);
        assert_eq!(grid.entry(Day::Monday, "9:00"), SlotEntry::new(AvailabilityState::Available));
    }

    #[test]
    fn test_releasing_buried_lock_keeps_top_lock() {
        let mut grid = AvailabilityGrid::new();
        grid.set_state(Day::Monday, "9:00", AvailabilityState::IfNeeded);
        grid.lock_slot(Day::Monday, "9:00", "meeting-a");
        grid.lock_slot(Day::Monday, "9:00", "meeting-b");

        assert_eq!(grid.release_source("meeting-a"), 1);
        let entry = grid.entry(Day::Monday, "9:00");
        assert_eq!(entry.event_source.as_deref(), Some("meeting-b"));
        assert_eq!(
            entry.previous.as_deref(),
            Some(&SlotEntry::new(AvailabilityState::IfNeeded))
        );

        assert_eq!(grid.release_source("meeting-b"), 1);
        assert_eq!(grid.state(Day::Monday, "9:00"), AvailabilityState::IfNeeded);
    }

    #[test]
    fn test_relocking_same_source_is_idempotent() {
        let mut grid = AvailabilityGrid::new();
        grid.set_state(Day::Monday, "9:00", AvailabilityState::Available);
        grid.lock_slot(Day::Monday, "9:00", "meeting-a");
        let once = grid.clone();

        grid.lock_slot(Day::Monday, "9:00", "meeting-a");
        assert_eq!(grid, once);
    }

    #[test]
    fn test_lock_chain_round_trips_through_json() {
        let json = r#"{"monday": {"9:00": {"status": "unavailable", "eventSource": "meeting-a", "previous": "available"}}}"#;
        let mut grid: AvailabilityGrid = serde_json::from_str(json).unwrap();
        grid.lock_slot(Day::Monday, "9:00", "meeting-b");

        let value = serde_json::to_value(&grid).unwrap();
        assert_eq!(value["monday"]["9:00"]["eventSource"], "meeting-b");
        assert_eq!(value["monday"]["9:00"]["previous"]["eventSource"], "meeting-a");
        assert_eq!(value["monday"]["9:00"]["previous"]["previous"], "available");

        let back: AvailabilityGrid = serde_json::from_value(value).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn test_day_parse() {
        assert_eq!(Day::parse("Monday"), Some(Day::Monday));
        assert_eq!(Day::parse("sunday"), Some(Day::Sunday));
        assert_eq!(Day::parse("funday"), None);
    }
}
