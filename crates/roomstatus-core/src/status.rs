//! Room status evaluation and the records served to display devices.
//!
//! [`evaluate`] turns a [`MergedSchedule`] and a reference instant into a
//! free/busy [`Verdict`]. Nothing is remembered between calls; the verdict is
//! recomputed from the schedule every time.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use tracing::error;

use crate::schedule::MergedSchedule;
use crate::time::TimeInterval;

/// Maximum length, in characters, of the detail carried by an error record.
pub const ERROR_DETAIL_MAX_CHARS: usize = 30;

const UNKNOWN_ROOM_NAME: &str = "Unknown Room";
const NO_DATA_DETAIL: &str = "No data available";
const FREE_FOR_THE_DAY: &str = "free for the day";

/// Occupancy state of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomState {
    /// Nothing is booked right now.
    Free,
    /// A booking is in progress.
    Busy,
    /// The room's calendar could not be evaluated.
    Error,
}

impl RoomState {
    /// Returns the token sent to display devices.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Busy => "busy",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating a schedule at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Free or busy.
    pub state: RoomState,
    /// Human-readable explanation, e.g. `booked until 10:00`.
    pub detail: String,
}

impl Verdict {
    fn free(detail: impl Into<String>) -> Self {
        Self {
            state: RoomState::Free,
            detail: detail.into(),
        }
    }

    fn busy(detail: impl Into<String>) -> Self {
        Self {
            state: RoomState::Busy,
            detail: detail.into(),
        }
    }
}

/// Decides whether the room is free or busy at `now`.
///
/// Intervals are active over `[start, end)`, so a meeting ending exactly at
/// `now` no longer counts. Times in the detail are rendered as `%H:%M` in the
/// time zone of `now`.
///
/// The schedule is expected to be disjoint. If more than one interval is
/// active the violation is logged and the interval with the later end wins.
pub fn evaluate<Tz>(schedule: &MergedSchedule, now: &DateTime<Tz>) -> Verdict
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let now_utc = now.with_timezone(&Utc);
    let tz = now.timezone();
    let clock = |instant: DateTime<Utc>| instant.with_timezone(&tz).format("%H:%M").to_string();

    let active: Vec<&TimeInterval> = schedule
        .intervals()
        .iter()
        .filter(|interval| interval.contains(now_utc))
        .collect();

    match active.as_slice() {
        [] => {}
        [only] => return Verdict::busy(format!("booked until {}", clock(only.end))),
        many => {
            error!(
                kind = "internal_consistency",
                active = many.len(),
                now = %now_utc,
                "Merged schedule has overlapping active intervals"
            );
            let until = many
                .iter()
                .map(|interval| interval.end)
                .max()
                .unwrap_or(now_utc);
            return Verdict::busy(format!("booked until {}", clock(until)));
        }
    }

    match schedule
        .intervals()
        .iter()
        .map(|interval| interval.start)
        .find(|start| *start > now_utc)
    {
        Some(next) => Verdict::free(format!("free until {}", clock(next))),
        None => Verdict::free(FREE_FOR_THE_DAY),
    }
}

/// The latest known status of one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    /// Name shown on the device.
    pub display_name: String,
    /// Free, busy, or error.
    pub state: RoomState,
    /// Detail line shown under the state.
    pub detail: String,
}

impl StatusRecord {
    /// Creates a record from an evaluated verdict.
    pub fn from_verdict(display_name: impl Into<String>, verdict: Verdict) -> Self {
        Self {
            display_name: display_name.into(),
            state: verdict.state,
            detail: verdict.detail,
        }
    }

    /// Creates an error record, truncating the summary to
    /// [`ERROR_DETAIL_MAX_CHARS`] characters.
    pub fn error(display_name: impl Into<String>, summary: impl fmt::Display) -> Self {
        let detail: String = summary
            .to_string()
            .chars()
            .take(ERROR_DETAIL_MAX_CHARS)
            .collect();
        Self {
            display_name: display_name.into(),
            state: RoomState::Error,
            detail,
        }
    }

    /// The record returned for identifiers with no data.
    pub fn unknown_room() -> Self {
        Self {
            display_name: UNKNOWN_ROOM_NAME.to_string(),
            state: RoomState::Free,
            detail: NO_DATA_DETAIL.to_string(),
        }
    }

    /// Returns true if this is the unknown-room sentinel.
    pub fn is_unknown_room(&self) -> bool {
        *self == Self::unknown_room()
    }

    /// Renders the three newline-terminated lines sent to devices.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StatusRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.display_name)?;
        writeln!(f, "{}", self.state)?;
        writeln!(f, "{}", self.detail)
    }
}
