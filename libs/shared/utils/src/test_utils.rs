use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub cancellation_lead_hours: i64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            cancellation_lead_hours: 2,
        }
    }
}

impl TestConfig {
    /// Point the config at a wiremock store.
    pub fn with_store_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            cancellation_lead_hours: self.cancellation_lead_hours,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub user_type: String,
    pub farmer_id: Option<Uuid>,
    pub vet_id: Option<Uuid>,
}

impl TestUser {
    pub fn farmer(email: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            user_type: "farmer".to_string(),
            farmer_id: Some(Uuid::new_v4()),
            vet_id: None,
        }
    }

    pub fn vet(email: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            user_type: "vet".to_string(),
            farmer_id: None,
            vet_id: Some(Uuid::new_v4()),
        }
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            user_type: Some(self.user_type.clone()),
            farmer_id: self.farmer_id,
            vet_id: self.vet_id,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "userType": user.user_type,
            "farmerId": user.farmer_id,
            "vetId": user.vet_id,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub struct MockStoreResponses;

impl MockStoreResponses {
    /// A bookable vet: verified, active, weekday hours 09:00-17:00.
    pub fn vet_response(vet_id: &Uuid) -> serde_json::Value {
        json!({
            "id": vet_id,
            "name": "Dr. Test Vet",
            "specialty": "Large Animal Medicine",
            "phone_no": "+9477000000",
            "consultation_fee": 1500.0,
            "travel_fee": 500.0,
            "is_verified": true,
            "is_active": true,
            "available_hours": {
                "monday": { "available": true, "start": "09:00", "end": "17:00" },
                "tuesday": { "available": true, "start": "09:00", "end": "17:00" },
                "wednesday": { "available": true, "start": "09:00", "end": "17:00" },
                "thursday": { "available": true, "start": "09:00", "end": "17:00" },
                "friday": { "available": true, "start": "09:00", "end": "17:00" },
                "saturday": { "available": false },
                "sunday": { "available": false }
            },
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn unverified_vet_response(vet_id: &Uuid) -> serde_json::Value {
        let mut vet = Self::vet_response(vet_id);
        vet["is_verified"] = json!(false);
        vet
    }

    pub fn animal_response(animal_id: &Uuid, farmer_id: &Uuid) -> serde_json::Value {
        json!({
            "id": animal_id,
            "farmer_id": farmer_id,
            "name": "Bella",
            "species": "cattle",
            "breed": "Friesian",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_response(
        farmer_id: &Uuid,
        vet_id: &Uuid,
        animal_id: &Uuid,
        scheduled_date: &str,
        scheduled_time: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "farmer_id": farmer_id,
            "vet_id": vet_id,
            "animal_id": animal_id,
            "appointment_type": "consultation",
            "priority": "normal",
            "scheduled_date": scheduled_date,
            "scheduled_time": scheduled_time,
            "duration_minutes": 30,
            "symptoms": "Loss of appetite",
            "description": null,
            "location": { "type": "clinic", "address": null },
            "images": [],
            "diagnosis": null,
            "treatment": null,
            "prescription": null,
            "vet_notes": null,
            "follow_up_required": false,
            "follow_up_date": null,
            "status": status,
            "cancelled_by": null,
            "cancellation_reason": null,
            "cancelled_at": null,
            "fee": { "consultation_fee": 1500.0, "travel_fee": 0.0 },
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(!app_config.supabase_jwt_secret.is_empty());
        assert_eq!(app_config.cancellation_lead_hours, 2);
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::vet("vet@example.com");
        assert_eq!(user.email, "vet@example.com");
        assert_eq!(user.user_type, "vet");
        assert!(user.vet_id.is_some());
        assert!(user.farmer_id.is_none());

        let user_model = user.to_user();
        assert!(user_model.is_vet());
        assert_eq!(user_model.vet_id, user.vet_id);
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::farmer("farmer@example.com");
        let secret = "test-secret";
        let token = JwtTestUtils::create_test_token(&user, secret, Some(1));

        assert!(token.contains('.'));
        assert_eq!(token.split('.').count(), 3);
    }
}
