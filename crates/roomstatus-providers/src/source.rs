//! CalendarSource trait definition.
//!
//! A [`CalendarSource`] turns a calendar location into the busy intervals
//! that fall inside a time window. Sources know nothing about rooms, merging
//! or status evaluation.

use std::future::Future;
use std::pin::Pin;

use roomstatus_core::{TimeInterval, TimeWindow};

use crate::error::{ProviderError, ProviderResult};

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe, so the refresher can hold an
/// `Arc<dyn CalendarSource>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Reads busy intervals from a calendar.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync`; one instance is shared by every
///   room and called concurrently.
/// - Recurring events must be expanded; only concrete occurrences are
///   returned.
/// - Occurrences overlapping the window are returned whole, not clipped.
///
/// # Example Implementation
///
/// ```ignore
/// struct FileSource;
///
/// impl CalendarSource for FileSource {
///     fn name(&self) -> &str { "file" }
///
///     fn fetch<'a>(
///         &'a self,
///         url: &'a str,
///         window: TimeWindow,
///     ) -> BoxFuture<'a, ProviderResult<Vec<TimeInterval>>> {
///         Box::pin(async move {
///             let text = tokio::fs::read_to_string(url).await?;
///             parse_ics_intervals(&text, &window, chrono_tz::UTC)
///         })
///     }
/// }
/// ```
pub trait CalendarSource: Send + Sync {
    /// Returns the name of this source (e.g., "ics").
    fn name(&self) -> &str;

    /// Fetches the busy intervals at `url` that overlap `window`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network failures, unexpected HTTP status,
    /// or calendar data that cannot be parsed.
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<TimeInterval>>>;
}

/// A source that always returns the same error.
///
/// Stands in for a source that could not be constructed, so the rooms using
/// it report an error instead of stalling the daemon.
#[derive(Debug)]
pub struct FailingSource {
    name: String,
    error: ProviderError,
}

impl FailingSource {
    /// Creates a new failing source.
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

impl CalendarSource for FailingSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch<'a>(
        &'a self,
        _url: &'a str,
        _window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<TimeInterval>>> {
        // ProviderError is not Clone; rebuild it from its parts
        let error =
            ProviderError::new(self.error.code(), self.error.message()).with_provider(&self.name);
        Box::pin(async move { Err(error) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn failing_source_returns_error() {
        let source = FailingSource::new("broken", ProviderError::configuration("not configured"));
        assert_eq!(source.name(), "broken");

        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 2, 5, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 2, 6, 0, 0, 0).unwrap(),
        );
        let err = source
            .fetch("https://example.com/room.ics", window)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
        assert_eq!(err.message(), "not configured");
        assert_eq!(err.provider(), Some("broken"));
    }

    #[test]
    fn source_is_object_safe() {
        let source: Box<dyn CalendarSource> =
            Box::new(FailingSource::new("x", ProviderError::internal("boom")));
        assert_eq!(source.name(), "x");
    }
}
