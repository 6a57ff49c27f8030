use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::engine::DATE_FORMAT;

/// Minutes since midnight.
pub type Minutes = u16;

/// A wall-clock time parsed from `H:MM` or `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(Minutes);

impl TimeOfDay {
    /// Accepts a one or two digit hour, a colon and a 2-digit minute. Anything
    /// else, including out-of-range fields and surrounding whitespace, is
    /// rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let (h, m) = s.split_once(':')?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return None;
        }
        if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }
        let hours: Minutes = h.parse().ok()?;
        let minutes: Minutes = m.parse().ok()?;
        if hours > 23 || minutes > 59 {
            return None;
        }
        Some(Self(hours * 60 + minutes))
    }

    pub fn minutes(self) -> Minutes {
        self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Half-open interval `[start, end)` within one day. Always non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeRange {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Option<Self> {
        Self::new(TimeOfDay::parse(start)?, TimeOfDay::parse(end)?)
    }

    pub fn is_valid(start: &str, end: &str) -> bool {
        Self::parse(start, end).is_some()
    }

    /// `max(start1, start2) < min(end1, end2)`. Adjacent ranges do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }
}

/// Two dates name the same day: compared as calendar dates when both
/// parse, so `2024-3-4` equals `2024-03-04`, and as trimmed text otherwise.
pub fn same_date(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    let parse = |s: &str| NaiveDate::parse_from_str(s, DATE_FORMAT).ok();
    match (parse(a), parse(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Like [`same_date`] for times of day: `9:00` equals `09:00`.
pub fn same_time(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    match (TimeOfDay::parse(a), TimeOfDay::parse(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// A bookable interval from the catalog.
pub type Slot = TimeRange;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    pub id: String,
    pub name: String,
}

impl Room {
    /// Rooms identified by name alone use the name as id.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
        }
    }
}

// ── Reservation rows ────────────────────────────────────────────

/// Column layout of a reservation row: `[id, date, room, start, end, reservedBy, note]`.
pub const COL_ID: usize = 0;
pub const COL_DATE: usize = 1;
pub const COL_ROOM: usize = 2;
pub const COL_START: usize = 3;
pub const COL_END: usize = 4;
pub const COL_RESERVED_BY: usize = 5;
pub const COL_NOTE: usize = 6;
pub const RESERVATION_COLUMNS: usize = 7;

pub const RESERVATION_HEADER: [&str; RESERVATION_COLUMNS] =
    ["id", "date", "room", "start", "end", "reservedBy", "note"];

/// One booking. Field values are kept as stored (trimmed); rows written
/// by older clients may hold unpadded dates and times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    /// `None` for rows whose id cell is missing or not numeric.
    pub id: Option<u64>,
    pub date: String,
    pub room: String,
    pub start: String,
    pub end: String,
    pub reserved_by: String,
    pub note: String,
}

impl Reservation {
    /// Parsed time range, or `None` if the stored times are malformed.
    pub fn time_range(&self) -> Option<TimeRange> {
        TimeRange::parse(&self.start, &self.end)
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.id.map(|id| id.to_string()).unwrap_or_default(),
            self.date.clone(),
            self.room.clone(),
            self.start.clone(),
            self.end.clone(),
            self.reserved_by.clone(),
            self.note.clone(),
        ]
    }

    /// Decode a positional row. Missing trailing cells read as empty;
    /// rows without date, room, start or end are not reservations.
    pub fn from_row(row: &[String]) -> Option<Self> {
        let cell = |i: usize| row.get(i).map(|s| s.trim()).unwrap_or_default();
        let required = [COL_DATE, COL_ROOM, COL_START, COL_END];
        if required.iter().any(|&i| cell(i).is_empty()) {
            return None;
        }
        Some(Self {
            id: cell(COL_ID).parse().ok(),
            date: cell(COL_DATE).to_string(),
            room: cell(COL_ROOM).to_string(),
            start: cell(COL_START).to_string(),
            end: cell(COL_END).to_string(),
            reserved_by: cell(COL_RESERVED_BY).to_string(),
            note: cell(COL_NOTE).to_string(),
        })
    }

    /// Match on all six descriptive fields; the id is not compared.
    /// Text fields are compared trimmed, the date and times by value.
    pub fn matches_fields(&self, criteria: &DeleteCriteria) -> bool {
        same_date(&self.date, &criteria.date)
            && self.room == criteria.room.trim()
            && same_time(&self.start, &criteria.start)
            && same_time(&self.end, &criteria.end)
            && self.reserved_by == criteria.reserved_by.trim()
            && self.note == criteria.note.trim()
    }
}

/// A reservation together with the 1-based sheet row it was read from.
/// Only valid until the next write to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReservation {
    pub row: usize,
    pub reservation: Reservation,
}

// ── Requests ────────────────────────────────────────────────────

/// Input to `create`. Missing fields deserialize as empty and are
/// rejected during validation rather than by the decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookingRequest {
    pub room: String,
    pub date: String,
    pub start: String,
    pub end: String,
    #[serde(alias = "by")]
    pub reserved_by: String,
    pub note: String,
    #[serde(alias = "pin")]
    pub secret: String,
}

/// Input to `delete`. `id` is preferred; the other fields are used for
/// exact matching when no id is given or the id matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeleteCriteria {
    #[serde(deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    pub room: String,
    pub date: String,
    pub start: String,
    pub end: String,
    #[serde(alias = "by")]
    pub reserved_by: String,
    pub note: String,
    #[serde(alias = "pin")]
    pub secret: String,
}

impl DeleteCriteria {
    pub fn requested_id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Ids arrive as JSON numbers from newer clients and as strings from forms.
fn deserialize_opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }
    Ok(Option::<RawId>::deserialize(d)?.map(|raw| match raw {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    }))
}
