// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use shared_config::AppConfig;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub farmer_id: Uuid,
    pub vet_id: Uuid,
    pub animal_id: Uuid,
    pub appointment_type: AppointmentType,
    pub priority: Priority,
    pub scheduled_date: NaiveDate,
    #[serde(with = "shared_models::time::serde_hm")]
    pub scheduled_time: NaiveTime,
    pub duration_minutes: i32,
    pub symptoms: String,
    pub description: Option<String>,
    #[serde(default)]
    pub location: AppointmentLocation,
    #[serde(default)]
    pub images: Vec<String>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub prescription: Option<String>,
    pub vet_notes: Option<String>,
    #[serde(default)]
    pub follow_up_required: bool,
    pub follow_up_date: Option<NaiveDate>,
    pub status: AppointmentStatus,
    pub cancelled_by: Option<CancelledBy>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub fee: AppointmentFee,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn scheduled_start(&self) -> NaiveDateTime {
        self.scheduled_date.and_time(self.scheduled_time)
    }

    pub fn scheduled_end(&self) -> NaiveDateTime {
        self.scheduled_start() + Duration::minutes(self.duration_minutes as i64)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Active bookings hold their slot; terminal ones never do.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Pending | AppointmentStatus::Accepted | AppointmentStatus::InProgress
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Accepted => write!(f, "accepted"),
            AppointmentStatus::InProgress => write!(f, "in-progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    Consultation,
    Vaccination,
    Checkup,
    Surgery,
    Emergency,
    FollowUp,
}

impl Default for AppointmentType {
    fn default() -> Self {
        AppointmentType::Consultation
    }
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::Consultation => write!(f, "consultation"),
            AppointmentType::Vaccination => write!(f, "vaccination"),
            AppointmentType::Checkup => write!(f, "checkup"),
            AppointmentType::Surgery => write!(f, "surgery"),
            AppointmentType::Emergency => write!(f, "emergency"),
            AppointmentType::FollowUp => write!(f, "follow_up"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Clinic,
    Farm,
}

impl Default for LocationType {
    fn default() -> Self {
        LocationType::Clinic
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentLocation {
    #[serde(rename = "type", default)]
    pub location_type: LocationType,
    pub address: Option<String>,
}

impl AppointmentLocation {
    pub fn is_farm_visit(&self) -> bool {
        self.location_type == LocationType::Farm
    }
}

/// Fees snapshotted from the vet's rates at creation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentFee {
    pub consultation_fee: f64,
    pub travel_fee: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    Farmer,
    Vet,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointmentRequest {
    pub vet_id: Uuid,
    pub animal_id: Uuid,
    pub appointment_type: Option<AppointmentType>,
    pub priority: Option<Priority>,
    pub scheduled_date: NaiveDate,
    #[serde(with = "shared_models::time::serde_hm")]
    pub scheduled_time: NaiveTime,
    pub duration_minutes: Option<i32>,
    pub symptoms: String,
    pub description: Option<String>,
    pub location: Option<AppointmentLocation>,
    pub images: Option<Vec<String>>,
}

/// Vet-side update: status transition plus post-visit outcome fields.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub status: Option<AppointmentStatus>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub prescription: Option<String>,
    pub vet_notes: Option<String>,
    pub follow_up_required: Option<bool>,
    pub follow_up_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub current: i64,
    pub pages: i64,
    pub total: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            current: page,
            pages: (total + limit - 1) / limit.max(1),
            total,
        }
    }
}

// ==============================================================================
// SCHEDULING RULES
// ==============================================================================

#[derive(Debug, Clone)]
pub struct SchedulingRules {
    pub slot_minutes: i32,
    pub default_duration_minutes: i32,
    pub max_duration_minutes: i32,
    pub cancellation_lead_hours: i64,
}

impl Default for SchedulingRules {
    fn default() -> Self {
        Self {
            slot_minutes: 30,
            default_duration_minutes: 30,
            max_duration_minutes: 240,
            cancellation_lead_hours: shared_config::DEFAULT_CANCELLATION_LEAD_HOURS,
        }
    }
}

impl SchedulingRules {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            cancellation_lead_hours: config.cancellation_lead_hours,
            ..Self::default()
        }
    }

    pub fn cancellation_lead(&self) -> Duration {
        Duration::hours(self.cancellation_lead_hours)
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Vet not found or not available")]
    VetNotAvailable,

    #[error("Animal not found or doesn't belong to you")]
    AnimalNotOwned,

    #[error("Vet is not available at the selected time. Please choose a different time slot.")]
    SlotUnavailable,

    #[error("Cannot change appointment status from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment cannot be cancelled (too close to appointment time or already completed)")]
    CancellationNotAllowed,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized access to appointment")]
    Unauthorized,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
