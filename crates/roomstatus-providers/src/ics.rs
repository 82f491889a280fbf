//! iCalendar parsing into busy intervals.
//!
//! Parses iCalendar (RFC 5545) data and turns every VEVENT that blocks the
//! room into concrete [`TimeInterval`]s:
//!
//! - `RRULE` masters are expanded within the window
//! - `EXDATE` and `RECURRENCE-ID` remove instances from their master
//! - Cancelled and transparent events are skipped
//! - Floating times and unknown `TZID`s fall back to the default zone

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{
    Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, Event, EventLike,
};
use rrule::RRuleSet;
use tracing::{debug, warn};

use roomstatus_core::{TimeInterval, TimeWindow};

use crate::error::{ProviderError, ProviderResult};

/// Upper bound on occurrences expanded from a single recurrence rule.
const MAX_OCCURRENCES: u16 = 500;

const ICAL_DATETIME: &str = "%Y%m%dT%H%M%S";

/// Parses ICS content into the busy intervals overlapping `window`.
///
/// Occurrences that straddle the window edges are returned whole.
///
/// # Errors
///
/// Returns an `InvalidResponse` error if the content is not an iCalendar
/// document. Individual events that cannot be interpreted are skipped.
pub fn parse_ics_intervals(
    ics: &str,
    window: &TimeWindow,
    default_tz: Tz,
) -> ProviderResult<Vec<TimeInterval>> {
    let ics = ics.trim_start_matches('\u{feff}');
    if !ics.trim_start().starts_with("BEGIN:VCALENDAR") {
        return Err(ProviderError::invalid_response("not an iCalendar feed"));
    }

    let calendar = ics
        .parse::<Calendar>()
        .map_err(|e| ProviderError::invalid_response(format!("bad iCalendar: {}", e)))?;

    let exceptions = RecurrenceExceptions::scan(ics, default_tz);

    let mut intervals = Vec::new();
    for event in calendar.iter().filter_map(|component| match component {
        CalendarComponent::Event(event) => Some(event),
        _ => None,
    }) {
        if !blocks_room(event) {
            debug!(uid = ?event.get_uid(), "Skipping cancelled or transparent event");
            continue;
        }
        intervals.extend(
            event_intervals(event, window, default_tz, &exceptions)
                .into_iter()
                .filter(|interval| interval.overlaps(window)),
        );
    }

    debug!(count = intervals.len(), "Parsed busy intervals from ICS");
    Ok(intervals)
}

/// Cancelled events and events marked transparent leave the room free.
fn blocks_room(event: &Event) -> bool {
    let cancelled = event
        .property_value("STATUS")
        .is_some_and(|status| status.trim().eq_ignore_ascii_case("CANCELLED"));
    let transparent = event
        .property_value("TRANSP")
        .is_some_and(|transp| transp.trim().eq_ignore_ascii_case("TRANSPARENT"));
    !cancelled && !transparent
}

/// Produces the occurrences of one event, before window filtering.
fn event_intervals(
    event: &Event,
    window: &TimeWindow,
    default_tz: Tz,
    exceptions: &RecurrenceExceptions,
) -> Vec<TimeInterval> {
    let Some(start) = event.get_start() else {
        debug!(uid = ?event.get_uid(), "Skipping event without DTSTART");
        return Vec::new();
    };
    let start = EventStart::from_ical(start, default_tz);
    let start_utc = start.to_utc();
    let end_utc = event_end(event, &start, default_tz);

    let Some(rule) = event.property_value("RRULE") else {
        return vec![TimeInterval::from_occurrence(start_utc, end_utc)];
    };

    let duration = end_utc
        .map(|end| end - start_utc)
        .unwrap_or_else(Duration::zero)
        .max(Duration::zero());

    match expand_recurrence(rule, &start, duration, window) {
        Ok(starts) => {
            let uid = event.get_uid().unwrap_or_default();
            starts
                .into_iter()
                .filter(|at| !exceptions.excludes(uid, *at))
                .map(|at| TimeInterval::from_occurrence(at, at.checked_add_signed(duration)))
                .collect()
        }
        Err(e) => {
            warn!(
                uid = ?event.get_uid(),
                rrule = %rule,
                error = %e,
                "Failed to expand recurrence, keeping first occurrence only"
            );
            vec![TimeInterval::from_occurrence(start_utc, end_utc)]
        }
    }
}

/// Resolves the end of an event from `DTEND`, then `DURATION`.
///
/// All-day events without either last one day. Timed events without either
/// are zero-length.
fn event_end(event: &Event, start: &EventStart, default_tz: Tz) -> Option<DateTime<Utc>> {
    if let Some(end) = event.get_end() {
        return Some(EventStart::from_ical(end, default_tz).to_utc());
    }
    // A DURATION that overflows the calendar range is ignored like a malformed one
    if let Some(end) = event
        .property_value("DURATION")
        .and_then(parse_duration)
        .and_then(|duration| start.to_utc().checked_add_signed(duration))
    {
        return Some(end);
    }
    match start {
        EventStart::AllDay(date, tz) => Some(local_midnight(date.succ_opt()?, *tz)),
        _ => None,
    }
}

/// An event start as written in the calendar, before UTC conversion.
///
/// Kept in its original zone so recurrences expand in local time and stay at
/// the same wall-clock hour across DST changes.
#[derive(Debug, Clone, Copy)]
enum EventStart {
    Utc(DateTime<Utc>),
    Local(NaiveDateTime, Tz),
    AllDay(NaiveDate, Tz),
}

impl EventStart {
    fn from_ical(value: DatePerhapsTime, default_tz: Tz) -> Self {
        match value {
            DatePerhapsTime::Date(date) => Self::AllDay(date, default_tz),
            DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Self::Utc(dt),
            DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => {
                Self::Local(naive, default_tz)
            }
            DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
                Self::Local(date_time, resolve_tzid(&tzid, default_tz))
            }
        }
    }

    fn to_utc(self) -> DateTime<Utc> {
        match self {
            Self::Utc(dt) => dt,
            Self::Local(naive, tz) => local_to_utc(naive, tz),
            Self::AllDay(date, tz) => local_midnight(date, tz),
        }
    }

    fn zone(self) -> Option<Tz> {
        match self {
            Self::Utc(_) => None,
            Self::Local(_, tz) | Self::AllDay(_, tz) => Some(tz),
        }
    }

    /// The `DTSTART` line handed to the recurrence expander.
    fn dtstart_line(self) -> String {
        match self {
            Self::Utc(dt) => format!("DTSTART:{}Z", dt.format(ICAL_DATETIME)),
            Self::Local(naive, tz) if tz == chrono_tz::UTC => {
                format!("DTSTART:{}Z", naive.format(ICAL_DATETIME))
            }
            Self::Local(naive, tz) => {
                format!("DTSTART;TZID={}:{}", tz.name(), naive.format(ICAL_DATETIME))
            }
            Self::AllDay(date, tz) => {
                let naive = date.and_time(NaiveTime::MIN);
                Self::Local(naive, tz).dtstart_line()
            }
        }
    }
}

/// Expands a recurrence rule into occurrence starts that can overlap `window`.
fn expand_recurrence(
    rule: &str,
    start: &EventStart,
    duration: Duration,
    window: &TimeWindow,
) -> Result<Vec<DateTime<Utc>>, String> {
    match expand_rule(rule, start, duration, window) {
        Ok(starts) => Ok(starts),
        // Zoned masters may carry a UTC UNTIL; retry with it in local time
        Err(first) => match start.zone().and_then(|tz| localize_until(rule, tz)) {
            Some(local_rule) => {
                expand_rule(&local_rule, start, duration, window).map_err(|_| first)
            }
            None => Err(first),
        },
    }
}

fn expand_rule(
    rule: &str,
    start: &EventStart,
    duration: Duration,
    window: &TimeWindow,
) -> Result<Vec<DateTime<Utc>>, String> {
    let text = format!("{}\nRRULE:{}", start.dtstart_line(), rule);
    let set = text.parse::<RRuleSet>().map_err(|e| format!("{}", e))?;

    // Occurrences starting up to one duration before the window still overlap it
    let after = window
        .start
        .checked_sub_signed(duration + Duration::seconds(1))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
        .with_timezone(&rrule::Tz::UTC);
    let before = window.end.with_timezone(&rrule::Tz::UTC);

    let result = set.after(after).before(before).all(MAX_OCCURRENCES);
    Ok(result
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc))
        .collect())
}

/// Rewrites a UTC `UNTIL` into local time in `tz`.
///
/// Returns `None` if the rule has no UTC `UNTIL`.
fn localize_until(rule: &str, tz: Tz) -> Option<String> {
    let mut changed = false;
    let parts: Vec<String> = rule
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("UNTIL") => {
                if let Some(utc) = value.strip_suffix('Z')
                    && let Ok(naive) = NaiveDateTime::parse_from_str(utc, ICAL_DATETIME)
                {
                    changed = true;
                    let local = Utc.from_utc_datetime(&naive).with_timezone(&tz);
                    return format!("UNTIL={}", local.naive_local().format(ICAL_DATETIME));
                }
                part.to_string()
            }
            _ => part.to_string(),
        })
        .collect();
    changed.then(|| parts.join(";"))
}

/// Instances removed from recurring masters, keyed by `(UID, start)`.
///
/// Collected straight from the content lines so repeated `EXDATE`
/// properties are all seen.
#[derive(Debug, Default)]
struct RecurrenceExceptions {
    excluded: HashSet<(String, DateTime<Utc>)>,
}

impl RecurrenceExceptions {
    fn scan(ics: &str, default_tz: Tz) -> Self {
        let mut excluded = HashSet::new();
        // 0 outside any VEVENT, 1 directly inside one, >1 inside a nested VALARM
        let mut depth = 0usize;
        let mut uid: Option<String> = None;
        let mut pending: Vec<DateTime<Utc>> = Vec::new();

        for line in unfold(ics) {
            let Some((name, tzid, value)) = split_content_line(&line) else {
                continue;
            };
            match name.as_str() {
                "BEGIN" if depth == 0 && value.eq_ignore_ascii_case("VEVENT") => {
                    depth = 1;
                    uid = None;
                    pending.clear();
                }
                "BEGIN" if depth > 0 => depth += 1,
                "END" if depth == 1 => {
                    depth = 0;
                    if let Some(uid) = uid.take() {
                        excluded.extend(pending.drain(..).map(|at| (uid.clone(), at)));
                    }
                    pending.clear();
                }
                "END" if depth > 1 => depth -= 1,
                "UID" if depth == 1 => uid = Some(value.trim().to_string()),
                "EXDATE" | "RECURRENCE-ID" if depth == 1 => pending.extend(
                    value
                        .split(',')
                        .filter_map(|v| parse_ical_instant(v, tzid.as_deref(), default_tz)),
                ),
                _ => {}
            }
        }

        Self { excluded }
    }

    fn excludes(&self, uid: &str, at: DateTime<Utc>) -> bool {
        !self.excluded.is_empty() && self.excluded.contains(&(uid.to_string(), at))
    }
}

/// Joins folded content lines (continuations start with a space or tab).
fn unfold(ics: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in ics.lines() {
        let raw = raw.trim_end_matches('\r');
        if let Some(rest) = raw.strip_prefix([' ', '\t'])
            && let Some(last) = lines.last_mut()
        {
            last.push_str(rest);
            continue;
        }
        lines.push(raw.to_string());
    }
    lines
}

/// Splits `NAME;PARAM=x;TZID=y:value` into the upper-cased name, the TZID
/// parameter if any, and the value.
fn split_content_line(line: &str) -> Option<(String, Option<String>, &str)> {
    let mut in_quotes = false;
    let (colon, _) = line.char_indices().find(|&(_, c)| {
        if c == '"' {
            in_quotes = !in_quotes;
        }
        c == ':' && !in_quotes
    })?;

    let (head, value) = (&line[..colon], &line[colon + 1..]);
    let mut params = head.split(';');
    let name = params.next()?.trim().to_ascii_uppercase();
    let tzid = params
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("TZID"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string());

    Some((name, tzid, value))
}

/// Parses an iCalendar date or datetime value into an instant.
///
/// Handles formats like:
/// - 20250205T100000Z (UTC)
/// - 20250205T100000 (local to `tzid`, or the default zone)
/// - 20250205 (midnight, local)
fn parse_ical_instant(value: &str, tzid: Option<&str>, default_tz: Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let tz = tzid.map_or(default_tz, |id| resolve_tzid(id, default_tz));

    if value.len() == 8 && value.chars().all(|c| c.is_ascii_digit()) {
        let date = NaiveDate::parse_from_str(value, "%Y%m%d").ok()?;
        return Some(local_midnight(date, tz));
    }

    if let Some(utc) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(utc, ICAL_DATETIME).ok()?;
        return Some(Utc.from_utc_datetime(&naive));
    }

    let naive = NaiveDateTime::parse_from_str(value, ICAL_DATETIME).ok()?;
    Some(local_to_utc(naive, tz))
}

fn resolve_tzid(tzid: &str, default_tz: Tz) -> Tz {
    let name = tzid.trim().trim_matches('"').trim_start_matches('/');
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            debug!(tzid = %tzid, fallback = %default_tz.name(), "Unknown TZID, using default zone");
            default_tz
        }
    }
}

/// Converts a wall-clock time to UTC.
///
/// Ambiguous times take the earlier instant; times skipped by a DST jump are
/// moved forward an hour.
fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            let shifted = naive.checked_add_signed(Duration::hours(1))?;
            tz.from_local_datetime(&shifted).earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    local_to_utc(date.and_time(NaiveTime::MIN), tz)
}

/// Parses an RFC 5545 duration such as `PT1H30M`, `P1D` or `-PT15M`.
///
/// Returns `None` for malformed values and for values out of range.
fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let (negative, rest) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };
    let rest = rest.strip_prefix('P')?;

    let mut total = Duration::zero();
    let mut number = String::new();
    let mut in_time = false;
    for c in rest.chars() {
        match c {
            '0'..='9' => number.push(c),
            'T' => in_time = true,
            unit => {
                let n: i64 = number.parse().ok()?;
                number.clear();
                let part = match (unit, in_time) {
                    ('W', false) => Duration::try_weeks(n),
                    ('D', false) => Duration::try_days(n),
                    ('H', true) => Duration::try_hours(n),
                    ('M', true) => Duration::try_minutes(n),
                    ('S', true) => Duration::try_seconds(n),
                    _ => None,
                }?;
                total = total.checked_add(&part)?;
            }
        }
    }
    if !number.is_empty() {
        return None;
    }

    Some(if negative { -total } else { total })
}
