//! Google Calendar v3 event listing.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{ApiClient, ApiError};
use crate::models::{CalendarEvent, EventStatus, EventTime};

/// Base URL for Calendar v3 endpoints
const CALENDAR_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<GoogleEvent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEvent {
    #[serde(default)]
    id: String,
    #[serde(default)]
    status: String,
    html_link: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    organizer: Option<GoogleOrganizer>,
    start: Option<GoogleEventTime>,
    end: Option<GoogleEventTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleOrganizer {
    email: Option<String>,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleEventTime {
    date_time: Option<DateTime<Utc>>,
    date: Option<NaiveDate>,
}

impl GoogleEventTime {
    fn to_event_time(&self) -> Option<EventTime> {
        self.date_time
            .map(EventTime::DateTime)
            .or(self.date.map(EventTime::Date))
    }
}

impl GoogleEvent {
    /// Convert to the domain type. Events without a start time are unusable.
    fn to_calendar_event(self) -> Option<CalendarEvent> {
        let start = self.start.as_ref().and_then(GoogleEventTime::to_event_time)?;
        let end = self.end.as_ref().and_then(GoogleEventTime::to_event_time);

        let status = match self.status.as_str() {
            "tentative" => EventStatus::Tentative,
            "cancelled" => EventStatus::Cancelled,
            _ => EventStatus::Confirmed,
        };

        let organizer = self.organizer.and_then(|o| {
            o.display_name
                .filter(|n| !n.is_empty())
                .or(o.email)
        });

        Some(CalendarEvent {
            id: self.id,
            title: self
                .summary
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "(untitled event)".to_string()),
            start,
            end,
            location: self.location.filter(|l| !l.is_empty()),
            status,
            organizer,
            link: self.html_link,
            description: self.description.filter(|d| !d.is_empty()),
        })
    }
}

/// Read-only access to upcoming calendar events.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn upcoming_events(&self, max_results: usize) -> Result<Vec<CalendarEvent>, ApiError>;
}

#[derive(Clone)]
pub struct CalendarClient {
    api: ApiClient,
    calendar_id: String,
}

impl CalendarClient {
    pub fn new(api: ApiClient, calendar_id: impl Into<String>) -> Self {
        Self {
            api,
            calendar_id: calendar_id.into(),
        }
    }
}

fn parse_events(response: EventsResponse) -> Vec<CalendarEvent> {
    response
        .items
        .into_iter()
        .filter_map(|item| {
            let id = item.id.clone();
            let converted = item.to_calendar_event();
            if converted.is_none() {
                warn!(event_id = %id, "Skipping calendar event without a start time");
            }
            converted
        })
        .collect()
}

#[async_trait]
impl CalendarSource for CalendarClient {
    async fn upcoming_events(&self, max_results: usize) -> Result<Vec<CalendarEvent>, ApiError> {
        let url = format!(
            "{}/calendars/{}/events",
            CALENDAR_BASE_URL,
            url::form_urlencoded::byte_serialize(self.calendar_id.as_bytes()).collect::<String>()
        );
        let query = [
            ("timeMin", Utc::now().to_rfc3339()),
            ("maxResults", max_results.to_string()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];

        let response: EventsResponse = self.api.get_json(&url, &query).await?;
        let events = parse_events(response);
        debug!(count = events.len(), "Calendar events fetched");
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_events_response() {
        let json = r#"{
            "items": [
                {
                    "id": "evt1",
                    "status": "confirmed",
                    "htmlLink": "https://calendar.google.com/event?eid=1",
                    "summary": "Culture Night",
                    "location": "Student Union Ballroom",
                    "organizer": {"email": "club@example.edu", "displayName": "ISA"},
                    "start": {"dateTime": "2024-10-05T23:00:00Z"},
                    "end": {"dateTime": "2024-10-06T02:00:00Z"}
                },
                {
                    "id": "evt2",
                    "status": "tentative",
                    "summary": "Picnic",
                    "organizer": {"email": "club@example.edu"},
                    "start": {"date": "2024-10-12"},
                    "end": {"date": "2024-10-13"}
                },
                {
                    "id": "evt3",
                    "status": "cancelled"
                }
            ]
        }"#;
        let response: EventsResponse = serde_json::from_str(json).unwrap();
        let events = parse_events(response);
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].title, "Culture Night");
        assert_eq!(events[0].organizer.as_deref(), Some("ISA"));
        assert!(matches!(events[0].start, EventTime::DateTime(_)));
        assert_eq!(events[0].status, EventStatus::Confirmed);

        assert_eq!(events[1].status, EventStatus::Tentative);
        assert_eq!(events[1].organizer.as_deref(), Some("club@example.edu"));
        assert!(events[1].start.is_all_day());
        assert_eq!(events[1].formatted_time(), "All day");
    }

    #[test]
    fn test_untitled_event() {
        let event = GoogleEvent {
            id: "x".into(),
            start: Some(GoogleEventTime {
                date_time: None,
                date: NaiveDate::from_ymd_opt(2024, 1, 1),
            }),
            ..Default::default()
        };
        let converted = event.to_calendar_event().unwrap();
        assert_eq!(converted.title, "(untitled event)");
    }
}
