// libs/appointment-cell/src/services/stats.rs
use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AppointmentError, AppointmentStatus};

/// Aggregate counters for a vet, derived on read. Nothing increments these
/// anywhere; they can never drift from the appointment rows.
#[derive(Debug, Clone, Serialize)]
pub struct VetAppointmentStats {
    pub total: i64,
    pub completed_appointments: i64,
    pub cancelled_appointments: i64,
}

pub struct VetStatsService {
    supabase: Arc<SupabaseClient>,
}

impl VetStatsService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub async fn get_vet_stats(
        &self,
        vet_id: Uuid,
        auth_token: &str,
    ) -> Result<VetAppointmentStats, AppointmentError> {
        debug!("Calculating appointment stats for vet {}", vet_id);

        let total = self.count(vet_id, None, auth_token).await?;
        let completed = self
            .count(vet_id, Some(AppointmentStatus::Completed), auth_token)
            .await?;
        let cancelled = self
            .count(vet_id, Some(AppointmentStatus::Cancelled), auth_token)
            .await?;

        Ok(VetAppointmentStats {
            total,
            completed_appointments: completed,
            cancelled_appointments: cancelled,
        })
    }

    async fn count(
        &self,
        vet_id: Uuid,
        status: Option<AppointmentStatus>,
        auth_token: &str,
    ) -> Result<i64, AppointmentError> {
        let mut path = format!("/rest/v1/appointments?vet_id=eq.{}&select=id", vet_id);
        if let Some(status) = status {
            path.push_str(&format!("&status=eq.{}", status));
        }

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        Ok(result.len() as i64)
    }
}
