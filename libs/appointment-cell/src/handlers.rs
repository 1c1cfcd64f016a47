// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use vet_cell::models::VetError;
use vet_cell::services::availability::AvailabilityService;

use crate::models::{
    AppointmentError, AppointmentStatus, CancelAppointmentRequest, CreateAppointmentRequest,
    Pagination, UpdateAppointmentRequest,
};
use crate::services::booking::BookingService;
use crate::services::stats::VetStatsService;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct FarmerAppointmentsQuery {
    pub status: Option<AppointmentStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct VetAppointmentsQuery {
    pub status: Option<AppointmentStatus>,
    pub date: Option<NaiveDate>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let farmer_id = require_farmer(&user, "Only farmers can create appointments")?;

    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .create_appointment(farmer_id, request, token)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "message": "Appointment created successfully",
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn get_farmer_appointments(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<FarmerAppointmentsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let farmer_id = require_farmer(&user, "Access denied")?;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);

    let booking_service = BookingService::new(&state);

    let (appointments, total) = booking_service
        .list_farmer_appointments(farmer_id, params.status, page, limit, token)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "pagination": Pagination::new(page, limit, total)
    })))
}

#[axum::debug_handler]
pub async fn get_vet_appointments(
    State(state): State<Arc<AppConfig>>,
    Query(params): Query<VetAppointmentsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let vet_id = require_vet(&user, "Access denied")?;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);

    let booking_service = BookingService::new(&state);

    let (appointments, total) = booking_service
        .list_vet_appointments(vet_id, params.status, params.date, page, limit, token)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "pagination": Pagination::new(page, limit, total)
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .get_appointment(appointment_id, token)
        .await
        .map_err(map_appointment_error)?;

    // Only the owning farmer or the assigned vet may view
    let is_owner = user.is_farmer() && user.farmer_id == Some(appointment.farmer_id);
    let is_assignee = user.is_vet() && user.vet_id == Some(appointment.vet_id);

    if !is_owner && !is_assignee {
        return Err(AppError::Auth("Not authorized to view this appointment".to_string()));
    }

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let vet_id = require_vet(&user, "Only vets can update appointment status")?;

    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .update_appointment(vet_id, appointment_id, request, token)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "message": "Appointment updated successfully",
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .cancel_appointment(&user, appointment_id, request.reason, token)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "message": "Appointment cancelled successfully",
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn remove_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let farmer_id = require_farmer(&user, "Only farmers can remove appointments")?;

    let booking_service = BookingService::new(&state);

    booking_service
        .remove_appointment(farmer_id, appointment_id, token)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "message": "Appointment removed successfully"
    })))
}

// ==============================================================================
// AVAILABILITY AND STATS HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_vet_availability(
    State(state): State<Arc<AppConfig>>,
    Path((vet_id, date)): Path<(Uuid, NaiveDate)>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let availability_service = AvailabilityService::new(&state);

    let slots = availability_service
        .available_slots(vet_id, date, token)
        .await
        .map_err(|e| match e {
            VetError::NotFound => AppError::NotFound("Vet not found or not available".to_string()),
            VetError::DatabaseError(msg) => AppError::Database(msg),
        })?;

    Ok(Json(json!({ "availableSlots": slots })))
}

#[axum::debug_handler]
pub async fn get_vet_stats(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let vet_id = require_vet(&user, "Access denied")?;

    let stats_service = VetStatsService::new(&state);

    let stats = stats_service
        .get_vet_stats(vet_id, token)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(stats)))
}

// ==============================================================================
// HELPERS
// ==============================================================================

fn require_farmer(user: &User, message: &str) -> Result<Uuid, AppError> {
    if !user.is_farmer() {
        return Err(AppError::Forbidden(message.to_string()));
    }
    user.farmer_id
        .ok_or_else(|| AppError::Auth("Token missing farmer profile".to_string()))
}

fn require_vet(user: &User, message: &str) -> Result<Uuid, AppError> {
    if !user.is_vet() {
        return Err(AppError::Forbidden(message.to_string()));
    }
    user.vet_id
        .ok_or_else(|| AppError::Auth("Token missing vet profile".to_string()))
}

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::VetNotAvailable => {
            AppError::NotFound("Vet not found or not available".to_string())
        }
        AppointmentError::AnimalNotOwned => {
            AppError::BadRequest("Animal not found or doesn't belong to you".to_string())
        }
        AppointmentError::SlotUnavailable => AppError::Conflict(
            "Vet is not available at the selected time. Please choose a different time slot."
                .to_string(),
        ),
        AppointmentError::InvalidStatusTransition { .. } => AppError::BadRequest(e.to_string()),
        AppointmentError::CancellationNotAllowed => AppError::BadRequest(e.to_string()),
        AppointmentError::ValidationError(msg) => AppError::BadRequest(msg),
        AppointmentError::Unauthorized => {
            AppError::Auth("Not authorized to access this appointment".to_string())
        }
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
    }
}
