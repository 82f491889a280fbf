//! CalendarSource trait and implementations.
//!
//! This crate provides the boundary between the availability engine and the
//! calendars it reads:
//!
//! - [`CalendarSource`] - The trait every calendar backend implements
//! - [`IcsCalendarSource`] - Fetches an iCalendar feed over HTTP
//! - [`parse_ics_intervals`] - Turns an iCalendar document into busy intervals
//! - [`ProviderError`] - Error types for source operations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  iCalendar feed  │
//! └────────┬─────────┘
//!          │ GET
//!          ▼
//! ┌──────────────────┐
//! │IcsCalendarSource │
//! └────────┬─────────┘
//!          │ parse_ics_intervals()
//!          ▼
//! ┌──────────────────┐
//! │  TimeInterval    │  recurrences expanded, filtered to the window
//! └──────────────────┘
//! ```

pub mod error;
pub mod source;

#[cfg(feature = "ics")]
pub mod http;
#[cfg(feature = "ics")]
pub mod ics;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use source::{BoxFuture, CalendarSource, FailingSource};

#[cfg(feature = "ics")]
pub use http::{IcsCalendarSource, SourceConfig};
#[cfg(feature = "ics")]
pub use ics::parse_ics_intervals;
