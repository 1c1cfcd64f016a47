// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{StoreStatusError, SupabaseClient};
use shared_models::auth::User;
use vet_cell::models::VetError;
use vet_cell::services::vet::VetService;

use crate::models::{
    Appointment, AppointmentError, AppointmentFee, AppointmentStatus, CancelledBy,
    CreateAppointmentRequest, SchedulingRules, UpdateAppointmentRequest,
};
use crate::services::conflict::OverlapGuard;
use crate::services::lifecycle::AppointmentLifecycleService;

pub struct BookingService {
    supabase: Arc<SupabaseClient>,
    vets: VetService,
    overlap_guard: OverlapGuard,
    lifecycle: AppointmentLifecycleService,
    rules: SchedulingRules,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));

        Self {
            vets: VetService::new(Arc::clone(&supabase)),
            overlap_guard: OverlapGuard::new(Arc::clone(&supabase)),
            lifecycle: AppointmentLifecycleService::new(),
            rules: SchedulingRules::from_config(config),
            supabase,
        }
    }

    /// Create a booking for a farmer. Verifies the vet is bookable and the
    /// animal belongs to the farmer, runs the overlap guard, snapshots the
    /// vet's fees and persists with status `pending`.
    pub async fn create_appointment(
        &self,
        farmer_id: Uuid,
        request: CreateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!("Creating appointment for farmer {} with vet {}", farmer_id, request.vet_id);

        let symptoms = request.symptoms.trim();
        if symptoms.is_empty() {
            return Err(AppointmentError::ValidationError(
                "Symptoms are required".to_string(),
            ));
        }

        let duration_minutes = request
            .duration_minutes
            .unwrap_or(self.rules.default_duration_minutes);
        if duration_minutes <= 0 || duration_minutes > self.rules.max_duration_minutes {
            return Err(AppointmentError::ValidationError(format!(
                "Duration must be between 1 and {} minutes",
                self.rules.max_duration_minutes
            )));
        }

        let vet = self
            .vets
            .get_bookable_vet(request.vet_id, auth_token)
            .await
            .map_err(|e| match e {
                VetError::NotFound => AppointmentError::VetNotAvailable,
                VetError::DatabaseError(msg) => AppointmentError::DatabaseError(msg),
            })?;

        self.verify_animal_ownership(request.animal_id, farmer_id, auth_token)
            .await?;

        self.overlap_guard
            .check_slot(
                request.vet_id,
                request.scheduled_date,
                request.scheduled_time,
                duration_minutes,
                None,
                auth_token,
            )
            .await?;

        let location = request.location.unwrap_or_default();
        let fee = AppointmentFee {
            consultation_fee: vet.consultation_fee,
            travel_fee: if location.is_farm_visit() { vet.travel_fee } else { 0.0 },
        };

        let now = Utc::now();
        let appointment_data = json!({
            "farmer_id": farmer_id,
            "vet_id": request.vet_id,
            "animal_id": request.animal_id,
            "appointment_type": request.appointment_type.unwrap_or_default(),
            "priority": request.priority.unwrap_or_default(),
            "scheduled_date": request.scheduled_date,
            "scheduled_time": request.scheduled_time.format("%H:%M:%S").to_string(),
            "duration_minutes": duration_minutes,
            "symptoms": symptoms,
            "description": request.description.as_deref().map(str::trim),
            "location": location,
            "images": request.images.unwrap_or_default(),
            "follow_up_required": false,
            "status": AppointmentStatus::Pending,
            "fee": fee,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        // A racing insert that slipped past the guard is rejected by the
        // store's exclusion constraint and lands here as a 409.
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(appointment_data),
                Some(headers),
            )
            .await
            .map_err(|e| match e.downcast_ref::<StoreStatusError>() {
                Some(status) if status.is_conflict() => AppointmentError::SlotUnavailable,
                _ => AppointmentError::DatabaseError(e.to_string()),
            })?;

        let appointment = parse_single(result, "Failed to create appointment")?;

        info!("Appointment {} created for farmer {}", appointment.id, farmer_id);
        Ok(appointment)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    /// A farmer's own bookings, newest first.
    pub async fn list_farmer_appointments(
        &self,
        farmer_id: Uuid,
        status: Option<AppointmentStatus>,
        page: i64,
        limit: i64,
        auth_token: &str,
    ) -> Result<(Vec<Appointment>, i64), AppointmentError> {
        let mut filters = vec![format!("farmer_id=eq.{}", farmer_id)];
        if let Some(status) = status {
            filters.push(format!("status=eq.{}", status));
        }

        let appointments = self
            .fetch_page(&filters, "created_at.desc", page, limit, auth_token)
            .await?;
        let total = self.count_appointments(&filters, auth_token).await?;

        Ok((appointments, total))
    }

    /// A vet's own bookings, in schedule order, optionally narrowed to a day.
    pub async fn list_vet_appointments(
        &self,
        vet_id: Uuid,
        status: Option<AppointmentStatus>,
        date: Option<NaiveDate>,
        page: i64,
        limit: i64,
        auth_token: &str,
    ) -> Result<(Vec<Appointment>, i64), AppointmentError> {
        let mut filters = vec![format!("vet_id=eq.{}", vet_id)];
        if let Some(status) = status {
            filters.push(format!("status=eq.{}", status));
        }
        if let Some(date) = date {
            filters.push(format!("scheduled_date=eq.{}", date));
        }

        let appointments = self
            .fetch_page(
                &filters,
                "scheduled_date.asc,scheduled_time.asc",
                page,
                limit,
                auth_token,
            )
            .await?;
        let total = self.count_appointments(&filters, auth_token).await?;

        Ok((appointments, total))
    }

    /// Vet-side update: status transition (validated against the lifecycle
    /// table) and post-visit outcome fields.
    pub async fn update_appointment(
        &self,
        vet_id: Uuid,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Updating appointment: {}", appointment_id);

        let current = self.get_appointment(appointment_id, auth_token).await?;
        if current.vet_id != vet_id {
            return Err(AppointmentError::Unauthorized);
        }

        let mut update_data = Map::new();

        if let Some(new_status) = request.status {
            self.lifecycle
                .validate_status_transition(current.status, new_status)?;

            update_data.insert("status".to_string(), json!(new_status));

            if new_status == AppointmentStatus::Cancelled {
                update_data.insert("cancelled_by".to_string(), json!(CancelledBy::Vet));
                update_data.insert("cancelled_at".to_string(), json!(Utc::now().to_rfc3339()));
            }
        }

        if let Some(diagnosis) = request.diagnosis {
            update_data.insert("diagnosis".to_string(), json!(diagnosis));
        }
        if let Some(treatment) = request.treatment {
            update_data.insert("treatment".to_string(), json!(treatment));
        }
        if let Some(prescription) = request.prescription {
            update_data.insert("prescription".to_string(), json!(prescription));
        }
        if let Some(vet_notes) = request.vet_notes {
            update_data.insert("vet_notes".to_string(), json!(vet_notes));
        }
        if let Some(follow_up_required) = request.follow_up_required {
            update_data.insert("follow_up_required".to_string(), json!(follow_up_required));
        }
        if let Some(follow_up_date) = request.follow_up_date {
            update_data.insert("follow_up_date".to_string(), json!(follow_up_date));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let updated = self
            .patch_appointment(appointment_id, Value::Object(update_data), auth_token)
            .await?;

        info!("Appointment {} updated", appointment_id);
        Ok(updated)
    }

    /// Cancel as a status transition. Either party may cancel their own
    /// appointment, subject to the lead-time eligibility rule.
    pub async fn cancel_appointment(
        &self,
        user: &User,
        appointment_id: Uuid,
        reason: Option<String>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Cancelling appointment: {}", appointment_id);

        let current = self.get_appointment(appointment_id, auth_token).await?;

        let cancelled_by = self.authorize_party(user, &current)?;

        self.lifecycle.can_be_cancelled(
            &current,
            Utc::now().naive_utc(),
            self.rules.cancellation_lead(),
        )?;

        let mut update_data = Map::new();
        update_data.insert("status".to_string(), json!(AppointmentStatus::Cancelled));
        update_data.insert("cancelled_by".to_string(), json!(cancelled_by));
        update_data.insert("cancellation_reason".to_string(), json!(reason));
        update_data.insert("cancelled_at".to_string(), json!(Utc::now().to_rfc3339()));
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let cancelled = self
            .patch_appointment(appointment_id, Value::Object(update_data), auth_token)
            .await?;

        info!("Appointment {} cancelled by {:?}", appointment_id, cancelled_by);
        Ok(cancelled)
    }

    /// Hard delete from the farmer's management view. The record is gone for
    /// good; cancellation is the reversible path.
    pub async fn remove_appointment(
        &self,
        farmer_id: Uuid,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        debug!("Removing appointment: {}", appointment_id);

        let current = self.get_appointment(appointment_id, auth_token).await?;
        if current.farmer_id != farmer_id {
            return Err(AppointmentError::Unauthorized);
        }

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        self.supabase
            .delete(&path, Some(auth_token))
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        info!("Appointment {} removed by farmer {}", appointment_id, farmer_id);
        Ok(())
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    fn authorize_party(
        &self,
        user: &User,
        appointment: &Appointment,
    ) -> Result<CancelledBy, AppointmentError> {
        if user.is_farmer() && user.farmer_id == Some(appointment.farmer_id) {
            return Ok(CancelledBy::Farmer);
        }
        if user.is_vet() && user.vet_id == Some(appointment.vet_id) {
            return Ok(CancelledBy::Vet);
        }
        Err(AppointmentError::Unauthorized)
    }

    async fn verify_animal_ownership(
        &self,
        animal_id: Uuid,
        farmer_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        let path = format!(
            "/rest/v1/animals?id=eq.{}&farmer_id=eq.{}",
            animal_id, farmer_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::AnimalNotOwned);
        }

        Ok(())
    }

    async fn fetch_page(
        &self,
        filters: &[String],
        order: &str,
        page: i64,
        limit: i64,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        let offset = (page - 1) * limit;

        let path = format!(
            "/rest/v1/appointments?{}&order={}&limit={}&offset={}",
            filters.join("&"),
            order,
            limit,
            offset
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| {
                AppointmentError::DatabaseError(format!("Failed to parse appointments: {}", e))
            })
    }

    async fn count_appointments(
        &self,
        filters: &[String],
        auth_token: &str,
    ) -> Result<i64, AppointmentError> {
        let path = format!("/rest/v1/appointments?{}&select=id", filters.join("&"));
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Ok(result.len() as i64)
    }

    async fn patch_appointment(
        &self,
        appointment_id: Uuid,
        update_data: Value,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(update_data),
                Some(headers),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        parse_single(result, "Failed to update appointment")
    }
}

fn parse_single(result: Vec<Value>, context: &str) -> Result<Appointment, AppointmentError> {
    let Some(row) = result.into_iter().next() else {
        return Err(AppointmentError::DatabaseError(context.to_string()));
    };

    serde_json::from_value(row)
        .map_err(|e| AppointmentError::DatabaseError(format!("{}: {}", context, e)))
}
