//! iCalendar feeds fetched over HTTP.
//!
//! [`IcsCalendarSource`] issues a plain `GET` for each room's feed URL and
//! hands the body to [`parse_ics_intervals`].

use std::time::Duration;

use chrono_tz::Tz;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, trace, warn};
use url::Url;

use roomstatus_core::{TimeInterval, TimeWindow};

use crate::error::{ProviderError, ProviderResult};
use crate::ics::parse_ics_intervals;
use crate::source::{BoxFuture, CalendarSource};

/// Configuration for the HTTP iCalendar source.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Zone for floating times, all-day events and unknown `TZID`s.
    pub default_timezone: Tz,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl SourceConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a configuration for feeds interpreted in `default_timezone`.
    pub fn new(default_timezone: Tz) -> Self {
        Self {
            default_timezone,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("roomstatus/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Reads busy intervals from iCalendar feeds served over HTTP(S).
///
/// One instance serves every room; the underlying client pools connections.
pub struct IcsCalendarSource {
    client: Client,
    config: SourceConfig,
}

impl IcsCalendarSource {
    /// Creates a new source with the given configuration.
    pub fn new(config: SourceConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("HTTP client setup failed: {}", e))
                    .with_source(e)
            })?;

        Ok(Self { client, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    async fn get(&self, url: &str) -> ProviderResult<String> {
        let url = Url::parse(url)
            .map_err(|e| ProviderError::configuration(format!("bad feed URL: {}", e)))?;

        trace!(url = %url, "Fetching calendar feed");
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::timeout("request timed out").with_source(e)
            } else if e.is_connect() {
                ProviderError::network("connection failed").with_source(e)
            } else {
                ProviderError::network(format!("request failed: {}", e)).with_source(e)
            }
        })?;

        self.handle_response(response).await
    }

    /// Maps the HTTP status to an error or extracts the body.
    async fn handle_response(&self, response: Response) -> ProviderResult<String> {
        let status = response.status();
        trace!(status = %status, "Received response");

        match status {
            s if s.is_success() => response.text().await.map_err(|e| {
                if e.is_timeout() {
                    ProviderError::timeout("body read timed out").with_source(e)
                } else {
                    ProviderError::network("body read failed").with_source(e)
                }
            }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ProviderError::authentication(format!("HTTP {}", status.as_u16())))
            }
            StatusCode::NOT_FOUND => Err(ProviderError::not_found("HTTP 404")),
            s if s.is_server_error() => Err(ProviderError::server(format!("HTTP {}", s.as_u16()))),
            s => {
                warn!(status = %s, "Unexpected response status");
                Err(ProviderError::invalid_response(format!("HTTP {}", s.as_u16())))
            }
        }
    }
}

impl CalendarSource for IcsCalendarSource {
    fn name(&self) -> &str {
        "ics"
    }

    fn fetch<'a>(
        &'a self,
        url: &'a str,
        window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<TimeInterval>>> {
        Box::pin(async move {
            let body = self.get(url).await?;
            let intervals = parse_ics_intervals(&body, &window, self.config.default_timezone)?;
            debug!(url = %url, count = intervals.len(), "Fetched calendar feed");
            Ok(intervals)
        })
    }
}
