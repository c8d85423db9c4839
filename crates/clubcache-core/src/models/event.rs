use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Confirmed,
    Tentative,
    Cancelled,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Confirmed => write!(f, "Confirmed"),
            EventStatus::Tentative => write!(f, "Tentative"),
            EventStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Either a precise instant or an all-day date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EventTime {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

impl EventTime {
    pub fn date(&self) -> NaiveDate {
        match self {
            EventTime::DateTime(dt) => dt.with_timezone(&Local).date_naive(),
            EventTime::Date(d) => *d,
        }
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: EventTime,
    pub end: Option<EventTime>,
    pub location: Option<String>,
    pub status: EventStatus,
    pub organizer: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
}

impl CalendarEvent {
    pub fn formatted_date(&self) -> String {
        self.start.date().format("%b %d, %Y").to_string()
    }

    /// "7:00 PM - 9:00 PM", "All day" or a start time alone.
    pub fn formatted_time(&self) -> String {
        match (self.start, self.end) {
            (EventTime::Date(_), _) => "All day".to_string(),
            (EventTime::DateTime(start), Some(EventTime::DateTime(end))) => format!(
                "{} - {}",
                start.with_timezone(&Local).format("%-I:%M %p"),
                end.with_timezone(&Local).format("%-I:%M %p")
            ),
            (EventTime::DateTime(start), _) => {
                start.with_timezone(&Local).format("%-I:%M %p").to_string()
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == EventStatus::Cancelled
    }
}
