//! Room identity and configuration.

use std::borrow::Borrow;
use std::fmt;

/// Identifier a display device uses to ask for its room.
///
/// Identifiers are trimmed and uppercased on construction, so lookups are
/// case-insensitive (`aa:bb:cc` and `AA:BB:CC` are the same room).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    /// Creates a normalized room identifier.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_uppercase())
    }

    /// Returns the normalized identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RoomId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for RoomId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// A room whose availability is tracked.
///
/// Loaded once at startup and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomConfig {
    /// Device-facing identifier.
    pub id: RoomId,
    /// Name shown on the device.
    pub display_name: String,
    /// Location of the room's iCalendar feed.
    pub calendar_url: String,
}

impl RoomConfig {
    /// Creates a new room configuration.
    pub fn new(
        id: impl Into<RoomId>,
        display_name: impl Into<String>,
        calendar_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            calendar_url: calendar_url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_id_is_normalized() {
        let id = RoomId::new("  aa:bb:cc:dd:ee:ff ");
        assert_eq!(id.as_str(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(id, RoomId::from("AA:bb:CC:dd:EE:ff"));
        assert_eq!(id.to_string(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn room_config_creation() {
        let room = RoomConfig::new("ab:cd", "Board Room", "https://example.com/board.ics");
        assert_eq!(room.id.as_str(), "AB:CD");
        assert_eq!(room.display_name, "Board Room");
        assert_eq!(room.calendar_url, "https://example.com/board.ics");
    }
}
