// libs/appointment-cell/src/services/conflict.rs
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentError};

/// Half-open interval comparison: [a_start, a_end) intersects [b_start, b_end).
/// Back-to-back bookings (a_end == b_start) do not conflict.
pub fn intervals_overlap(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

pub struct OverlapGuard {
    supabase: Arc<SupabaseClient>,
}

impl OverlapGuard {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Reject a candidate booking that would overlap an active booking for
    /// the same vet. This is the fast path; the store's exclusion constraint
    /// on (vet_id, time range) catches the racing insert the query cannot.
    pub async fn check_slot(
        &self,
        vet_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        duration_minutes: i32,
        exclude_appointment_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        debug!("Checking slot for vet {} on {} at {}", vet_id, date, time);

        let candidate_start = date.and_time(time);
        let candidate_end = candidate_start + Duration::minutes(duration_minutes as i64);

        let existing = self
            .active_bookings_on(vet_id, date, exclude_appointment_id, auth_token)
            .await?;

        for booking in existing {
            // The query already filters by status; re-check in case a stale
            // row slips through.
            if !booking.status.is_active() {
                continue;
            }

            if intervals_overlap(
                candidate_start,
                candidate_end,
                booking.scheduled_start(),
                booking.scheduled_end(),
            ) {
                warn!(
                    "Slot conflict for vet {} on {} at {} with appointment {}",
                    vet_id, date, time, booking.id
                );
                return Err(AppointmentError::SlotUnavailable);
            }
        }

        Ok(())
    }

    async fn active_bookings_on(
        &self,
        vet_id: Uuid,
        date: NaiveDate,
        exclude_appointment_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut query_parts = vec![
            format!("vet_id=eq.{}", vet_id),
            format!("scheduled_date=eq.{}", date),
            "status=in.(pending,accepted,in-progress)".to_string(),
        ];

        if let Some(exclude_id) = exclude_appointment_id {
            query_parts.push(format!("id=neq.{}", exclude_id));
        }

        let path = format!(
            "/rest/v1/appointments?{}&order=scheduled_time.asc",
            query_parts.join("&")
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointments: Vec<Appointment> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| {
                AppointmentError::DatabaseError(format!("Failed to parse appointments: {}", e))
            })?;

        Ok(appointments)
    }
}
