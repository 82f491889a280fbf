//! One room's refresh: fetch, merge, evaluate.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use roomstatus_core::{MergedSchedule, RoomConfig, StatusRecord, TimeWindow, Verdict, evaluate};
use roomstatus_providers::{CalendarSource, ProviderError};
use thiserror::Error;
use tracing::{debug, warn};

/// Why a room could not be evaluated.
///
/// The display text is what ends up, truncated, on the room's display.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The calendar source reported a failure.
    #[error("{}", .0.message())]
    Fetch(#[from] ProviderError),

    /// The calendar source did not answer within the fetch timeout.
    #[error("no answer after {}s", .0.as_secs())]
    Timeout(Duration),
}

/// Computes the status record for a single room.
///
/// Every call yields a record. Failures become error records and are logged
/// with `kind = "fetch"`.
#[derive(Clone)]
pub struct RoomRefresher {
    source: Arc<dyn CalendarSource>,
    timezone: Tz,
    fetch_timeout: Duration,
}

impl RoomRefresher {
    /// Creates a refresher reading calendars from `source`.
    ///
    /// `timezone` decides where the day ends and how times are rendered.
    pub fn new(source: Arc<dyn CalendarSource>, timezone: Tz, fetch_timeout: Duration) -> Self {
        Self {
            source,
            timezone,
            fetch_timeout,
        }
    }

    /// Returns the zone rooms are evaluated in.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Refreshes `room` as of `now`.
    pub async fn refresh(&self, room: &RoomConfig, now: DateTime<Utc>) -> StatusRecord {
        match self.evaluate_room(room, now).await {
            Ok(verdict) => {
                debug!(
                    room = %room.id,
                    state = %verdict.state,
                    detail = %verdict.detail,
                    "Room evaluated"
                );
                StatusRecord::from_verdict(&room.display_name, verdict)
            }
            Err(e) => {
                warn!(
                    kind = "fetch",
                    room = %room.id,
                    url = %room.calendar_url,
                    error = ?e,
                    "Room refresh failed"
                );
                StatusRecord::error(&room.display_name, &e)
            }
        }
    }

    async fn evaluate_room(
        &self,
        room: &RoomConfig,
        now: DateTime<Utc>,
    ) -> Result<Verdict, RefreshError> {
        let window = TimeWindow::today_remaining(now, &self.timezone);
        let intervals = tokio::time::timeout(
            self.fetch_timeout,
            self.source.fetch(&room.calendar_url, window),
        )
        .await
        .map_err(|_| RefreshError::Timeout(self.fetch_timeout))??;

        let schedule = MergedSchedule::merge(intervals);
        debug!(room = %room.id, merged = schedule.len(), "Merged schedule");

        Ok(evaluate(&schedule, &now.with_timezone(&self.timezone)))
    }
}
