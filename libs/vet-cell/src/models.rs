// libs/vet-cell/src/models.rs
use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One weekday entry of a vet's weekly-hours template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayHours {
    #[serde(default)]
    pub available: bool,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DayHours {
    /// Working window for this day. Malformed or missing `start`/`end`
    /// fall back to 09:00-17:00, as does an inverted window.
    pub fn window(&self) -> (NaiveTime, NaiveTime) {
        let fallback_start = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let fallback_end = NaiveTime::from_hms_opt(17, 0, 0).unwrap();

        let start = self.start.as_deref().and_then(parse_hm).unwrap_or(fallback_start);
        let end = self.end.as_deref().and_then(parse_hm).unwrap_or(fallback_end);

        if start >= end {
            (fallback_start, fallback_end)
        } else {
            (start, end)
        }
    }
}

fn parse_hm(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .ok()
        .or_else(|| NaiveTime::parse_from_str(raw, "%H:%M:%S").ok())
}

/// Weekly-hours template keyed by weekday name, as stored on the vet record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyHours {
    pub monday: Option<DayHours>,
    pub tuesday: Option<DayHours>,
    pub wednesday: Option<DayHours>,
    pub thursday: Option<DayHours>,
    pub friday: Option<DayHours>,
    pub saturday: Option<DayHours>,
    pub sunday: Option<DayHours>,
}

impl WeeklyHours {
    pub fn for_weekday(&self, weekday: Weekday) -> Option<&DayHours> {
        match weekday {
            Weekday::Mon => self.monday.as_ref(),
            Weekday::Tue => self.tuesday.as_ref(),
            Weekday::Wed => self.wednesday.as_ref(),
            Weekday::Thu => self.thursday.as_ref(),
            Weekday::Fri => self.friday.as_ref(),
            Weekday::Sat => self.saturday.as_ref(),
            Weekday::Sun => self.sunday.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vet {
    pub id: Uuid,
    pub name: String,
    pub specialty: Option<String>,
    pub phone_no: Option<String>,
    #[serde(default)]
    pub consultation_fee: f64,
    #[serde(default)]
    pub travel_fee: f64,
    pub is_verified: bool,
    pub is_active: bool,
    #[serde(default)]
    pub available_hours: WeeklyHours,
}

impl Vet {
    /// Only verified, active vets take bookings.
    pub fn is_bookable(&self) -> bool {
        self.is_verified && self.is_active
    }
}

/// Projection of an appointment row used when computing free slots.
#[derive(Debug, Clone, Deserialize)]
pub struct BookedVisit {
    #[serde(with = "shared_models::time::serde_hm")]
    pub scheduled_time: NaiveTime,
    pub status: String,
}

impl BookedVisit {
    pub fn blocks_slot(&self) -> bool {
        matches!(self.status.as_str(), "pending" | "accepted" | "in-progress")
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum VetError {
    #[error("Vet not found or not available")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
