use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{BookedVisit, VetError};
use crate::services::vet::VetService;

/// Fixed booking granularity.
pub const SLOT_MINUTES: i64 = 30;

pub struct AvailabilityService {
    supabase: Arc<SupabaseClient>,
    vets: VetService,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            vets: VetService::new(Arc::clone(&supabase)),
            supabase,
        }
    }

    /// Free slots for a vet on a calendar date, as "HH:MM" strings in
    /// chronological order. A weekday with no template entry (or one marked
    /// unavailable) yields an empty list rather than an error.
    pub async fn available_slots(
        &self,
        vet_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<String>, VetError> {
        debug!("Calculating available slots for vet {} on {}", vet_id, date);

        let vet = self.vets.get_bookable_vet(vet_id, auth_token).await?;

        let day = match vet.available_hours.for_weekday(date.weekday()) {
            Some(day) if day.available => day,
            _ => {
                debug!("Vet {} has no working hours on {}", vet_id, date.weekday());
                return Ok(vec![]);
            }
        };

        let (start, end) = day.window();
        let booked = self.booked_times(vet_id, date, auth_token).await?;

        let slots: Vec<String> = enumerate_slots(start, end)
            .into_iter()
            .filter(|slot| !booked.contains(slot))
            .map(|slot| slot.format("%H:%M").to_string())
            .collect();

        debug!("Found {} available slots for vet {}", slots.len(), vet_id);
        Ok(slots)
    }

    /// Start times taken by active bookings on the given date. The store
    /// query filters by status; the client-side check repeats it so a stale
    /// row can never block a slot.
    async fn booked_times(
        &self,
        vet_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<HashSet<NaiveTime>, VetError> {
        let path = format!(
            "/rest/v1/appointments?vet_id=eq.{}&scheduled_date=eq.{}&status=in.(pending,accepted,in-progress)&select=scheduled_time,status&order=scheduled_time.asc",
            vet_id, date
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| VetError::DatabaseError(e.to_string()))?;

        let visits: Vec<BookedVisit> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<BookedVisit>, _>>()
            .map_err(|e| VetError::DatabaseError(format!("Failed to parse bookings: {}", e)))?;

        Ok(visits
            .into_iter()
            .filter(BookedVisit::blocks_slot)
            .map(|visit| visit.scheduled_time)
            .collect())
    }
}

/// Candidate start times at `SLOT_MINUTES` granularity, end-exclusive.
pub fn enumerate_slots(start: NaiveTime, end: NaiveTime) -> Vec<NaiveTime> {
    let mut slots = Vec::new();
    let mut current = start;

    while current < end {
        slots.push(current);
        let next = current + Duration::minutes(SLOT_MINUTES);
        if next <= current {
            // wrapped past midnight
            break;
        }
        current = next;
    }

    slots
}
