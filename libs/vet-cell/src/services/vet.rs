use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{Vet, VetError};

pub struct VetService {
    supabase: Arc<SupabaseClient>,
}

impl VetService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn get_vet(&self, vet_id: Uuid, auth_token: &str) -> Result<Vet, VetError> {
        debug!("Fetching vet: {}", vet_id);

        let path = format!("/rest/v1/vets?id=eq.{}", vet_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| VetError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(VetError::NotFound);
        }

        let vet: Vet = serde_json::from_value(result[0].clone())
            .map_err(|e| VetError::DatabaseError(format!("Failed to parse vet: {}", e)))?;

        Ok(vet)
    }

    /// Resolve a vet that is allowed to take bookings. Unverified or
    /// deactivated vets are indistinguishable from missing ones.
    pub async fn get_bookable_vet(&self, vet_id: Uuid, auth_token: &str) -> Result<Vet, VetError> {
        let vet = self.get_vet(vet_id, auth_token).await?;

        if !vet.is_bookable() {
            debug!("Vet {} is not bookable (verified: {}, active: {})",
                   vet_id, vet.is_verified, vet.is_active);
            return Err(VetError::NotFound);
        }

        Ok(vet)
    }
}
