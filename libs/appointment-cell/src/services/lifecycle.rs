// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    /// All valid next statuses for a given current status
    pub fn valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Accepted,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Accepted => vec![
                AppointmentStatus::InProgress,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::InProgress => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled, // emergency cancellation mid-visit
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
        }
    }

    /// Cancellation eligibility: never from a terminal state, and not within
    /// the configured lead time of the scheduled start.
    pub fn can_be_cancelled(
        &self,
        appointment: &Appointment,
        now: NaiveDateTime,
        lead: Duration,
    ) -> Result<(), AppointmentError> {
        if appointment.status.is_terminal() {
            return Err(AppointmentError::CancellationNotAllowed);
        }

        if appointment.scheduled_start() <= now + lead {
            warn!(
                "Cancellation window closed for appointment {} (starts {})",
                appointment.id,
                appointment.scheduled_start()
            );
            return Err(AppointmentError::CancellationNotAllowed);
        }

        Ok(())
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
