// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    // All appointment operations require authentication
    let protected_routes = Router::new()
        .route("/", post(handlers::create_appointment))

        // Role-scoped listings
        .route("/farmer", get(handlers::get_farmer_appointments))
        .route("/vet", get(handlers::get_vet_appointments))
        .route("/vet/stats", get(handlers::get_vet_stats))

        // Availability lookup
        .route("/availability/{vet_id}/{date}", get(handlers::get_vet_availability))

        // Hard delete from the farmer's management view
        .route("/remove/{appointment_id}", delete(handlers::remove_appointment))

        // Single-appointment operations; DELETE is a status cancel
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}", put(handlers::update_appointment))
        .route("/{appointment_id}", delete(handlers::cancel_appointment))

        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
