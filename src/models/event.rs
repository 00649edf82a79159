//! Event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::official::default_true;
use super::InvalidValue;

/// Village event (agenda)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub location: Option<String>,
    pub start_at: DateTime<Utc>,
    /// Single-moment events have no end
    pub end_at: Option<DateTime<Utc>>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Phase of the event relative to `now`.
    ///
    /// An event without `end_at` is ongoing for the rest of its start day.
    pub fn phase_at(&self, now: DateTime<Utc>) -> EventPhase {
        if now < self.start_at {
            return EventPhase::Upcoming;
        }
        if now <= self.effective_end() {
            EventPhase::Ongoing
        } else {
            EventPhase::Finished
        }
    }

    /// `end_at`, or the end of the start day when there is none
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.end_at.unwrap_or_else(|| {
            self.start_at
                .date_naive()
                .and_hms_opt(23, 59, 59)
                .map(|end| end.and_utc())
                .unwrap_or(self.start_at)
        })
    }
}

/// Event phase used by the public agenda filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventPhase {
    Upcoming,
    Ongoing,
    Finished,
}

impl FromStr for EventPhase {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "upcoming" => Ok(EventPhase::Upcoming),
            "ongoing" => Ok(EventPhase::Ongoing),
            "finished" | "past" => Ok(EventPhase::Finished),
            _ => Err(InvalidValue::new("event phase", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    pub start_at: DateTime<Utc>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_published: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Event {
        Event {
            id: 1,
            title: "Bersih Desa".to_string(),
            slug: "bersih-desa".to_string(),
            description: "Tradisi tahunan".to_string(),
            location: Some("Balai Desa".to_string()),
            start_at: start,
            end_at: end,
            is_published: true,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn test_phase_with_end() {
        let start = Utc.with_ymd_and_hms(2024, 8, 17, 7, 0, 0).unwrap();
        let ev = event(start, Some(start + Duration::hours(5)));

        assert_eq!(ev.phase_at(start - Duration::days(1)), EventPhase::Upcoming);
        assert_eq!(ev.phase_at(start + Duration::hours(2)), EventPhase::Ongoing);
        assert_eq!(ev.phase_at(start + Duration::hours(6)), EventPhase::Finished);
    }

    #[test]
    fn test_phase_without_end_lasts_the_day() {
        let start = Utc.with_ymd_and_hms(2024, 8, 17, 7, 0, 0).unwrap();
        let ev = event(start, None);

        assert_eq!(ev.phase_at(start + Duration::hours(10)), EventPhase::Ongoing);
        assert_eq!(ev.phase_at(start + Duration::days(1)), EventPhase::Finished);
    }

    #[test]
    fn test_phase_from_str() {
        assert_eq!("upcoming".parse::<EventPhase>().unwrap(), EventPhase::Upcoming);
        assert_eq!("PAST".parse::<EventPhase>().unwrap(), EventPhase::Finished);
        assert!("later".parse::<EventPhase>().is_err());
    }
}
