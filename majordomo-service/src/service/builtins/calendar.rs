//! Calendar capabilities.
//!
//! Times must arrive as ISO-8601; relative phrases like "tomorrow at 4" are
//! the model's job to resolve using the date in its system prompt.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone};
use serde_json::json;

use super::BuiltinContext;
use super::backends::NewEvent;
use super::tasks::parse_day;
use crate::error::CapabilityError;
use crate::tools::{Arguments, CapabilityOutput};

const DEFAULT_RANGE_DAYS: u64 = 7;
const MAX_RANGE_DAYS: u64 = 31;
const DEFAULT_DURATION_MINUTES: f64 = 60.0;
const MAX_DURATION_MINUTES: f64 = 7.0 * 24.0 * 60.0;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp; values without an offset are local to `offset`
pub(super) fn parse_iso_datetime(
    value: &str,
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, CapabilityError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt);
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .ok_or_else(|| {
            CapabilityError::argument(format!(
                "'start_time' must be ISO 8601 like 2026-01-05T16:00:00, got '{}'",
                value
            ))
        })
}

impl BuiltinContext {
    pub(super) async fn get_calendar_today(&self) -> Result<CapabilityOutput, CapabilityError> {
        let today = self.runtime_config.dynamic().assistant.now().date_naive();
        let events = self.backends.calendar.events(today, 1).await?;
        Ok(CapabilityOutput::Json(json!(events)))
    }

    pub(super) async fn get_calendar_events(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let day = parse_day("date", args.required_str("date")?)?;
        let events = self.backends.calendar.events(day, 1).await?;
        Ok(CapabilityOutput::Json(json!(events)))
    }

    pub(super) async fn get_calendar_range(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let days = args.u64("days").unwrap_or(DEFAULT_RANGE_DAYS);
        if days == 0 {
            return Err(CapabilityError::argument("'days' must be at least 1"));
        }
        let days = days.min(MAX_RANGE_DAYS) as u32;

        let today = self.runtime_config.dynamic().assistant.now().date_naive();
        let events = self.backends.calendar.events(today, days).await?;
        Ok(CapabilityOutput::Json(json!(events)))
    }

    pub(super) async fn create_calendar_event(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let summary = args.required_str("summary")?;
        let offset = self.runtime_config.dynamic().assistant.offset();
        let start = parse_iso_datetime(args.required_str("start_time")?, offset)?;

        let minutes = match args.0.get("duration_minutes") {
            None => DEFAULT_DURATION_MINUTES,
            Some(_) => args.required_f64("duration_minutes")?,
        };
        if !(1.0..=MAX_DURATION_MINUTES).contains(&minutes) {
            return Err(CapabilityError::argument(
                "'duration_minutes' must be between 1 and 10080",
            ));
        }

        let event = NewEvent {
            summary: summary.to_string(),
            start,
            end: start + Duration::minutes(minutes as i64),
        };

        let created = self.backends.calendar.create_event(event).await?;
        Ok(CapabilityOutput::Json(json!({
            "status": "Event created",
            "event": created,
        })))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;

    use super::super::backends::{CalendarBackend, CalendarEvent};
    use super::super::tests::{context_with, json_output, run, unlinked_context};
    use super::super::{Backends, Unlinked};
    use super::*;
    use crate::tools::registry::BuiltinName;

    /// Records created events
    #[derive(Default)]
    struct RecordingCalendar {
        created: Mutex<Vec<NewEvent>>,
    }

    #[async_trait]
    impl CalendarBackend for RecordingCalendar {
        async fn events(
            &self,
            _first_day: NaiveDate,
            _days: u32,
        ) -> Result<Vec<CalendarEvent>, CapabilityError> {
            Ok(Vec::new())
        }

        async fn create_event(&self, event: NewEvent) -> Result<CalendarEvent, CapabilityError> {
            let created = CalendarEvent {
                summary: event.summary.clone(),
                start: event.start.to_rfc3339(),
                end: event.end.to_rfc3339(),
                link: None,
            };
            self.created.lock().unwrap().push(event);
            Ok(created)
        }
    }

    #[test]
    fn test_parse_iso_variants() {
        let ist = FixedOffset::east_opt(330 * 60).unwrap();

        let naive = parse_iso_datetime("2026-01-05T16:00:00", ist).unwrap();
        assert_eq!(naive.to_rfc3339(), "2026-01-05T16:00:00+05:30");

        let with_offset = parse_iso_datetime("2026-01-05T16:00:00Z", ist).unwrap();
        assert_eq!(with_offset.offset().local_minus_utc(), 0);

        assert!(parse_iso_datetime("2026-01-05T16:00", ist).is_ok());
    }

    #[tokio::test]
    async fn test_relative_time_rejected_before_backend() {
        // Validation runs even though the calendar is not connected
        let ctx = unlinked_context();

        for value in ["tomorrow at 4pm", "4pm", "next Monday"] {
            let err = run(
                &ctx,
                BuiltinName::CreateCalendarEvent,
                json!({"summary": "Team sync", "start_time": value}),
            )
            .await
            .unwrap_err();
            assert_eq!(err.kind(), "invalid_arguments", "{value}");
        }
    }

    #[tokio::test]
    async fn test_iso_input_reaches_backend() {
        let calendar = Arc::new(RecordingCalendar::default());
        let ctx = context_with(Backends {
            tasks: Arc::new(Unlinked),
            calendar: calendar.clone(),
            mail: Arc::new(Unlinked),
        });

        let output = json_output(
            run(
                &ctx,
                BuiltinName::CreateCalendarEvent,
                json!({"summary": "Team sync", "start_time": "2026-01-05T16:00:00", "duration_minutes": 30}),
            )
            .await
            .unwrap(),
        );
        assert_eq!(output["status"], "Event created");

        let created = calendar.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].end - created[0].start, Duration::minutes(30));
    }

    #[tokio::test]
    async fn test_unlinked_calendar_after_valid_input() {
        let ctx = unlinked_context();
        let err = run(
            &ctx,
            BuiltinName::CreateCalendarEvent,
            json!({"summary": "Team sync", "start_time": "2026-01-05T16:00:00"}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "not_connected");
    }

    #[tokio::test]
    async fn test_events_date_must_be_a_day() {
        let ctx = unlinked_context();
        let err = run(&ctx, BuiltinName::GetCalendarEvents, json!({"date": "today"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_arguments");
    }
}
