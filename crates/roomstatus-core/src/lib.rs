//! Core types: intervals, merged schedules, room status evaluation

pub mod room;
pub mod schedule;
pub mod status;
pub mod time;
pub mod tracing;

pub use room::{RoomConfig, RoomId};
pub use schedule::MergedSchedule;
pub use status::{ERROR_DETAIL_MAX_CHARS, RoomState, StatusRecord, Verdict, evaluate};
pub use time::{TimeInterval, TimeWindow};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
