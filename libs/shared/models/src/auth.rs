use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

/// Claims carried by AgroLink bearer tokens. Farmers carry `farmerId`,
/// vets carry `vetId`; `sub` is the account id in either case.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub iat: Option<u64>,
    pub email: Option<String>,
    #[serde(rename = "userType")]
    pub user_type: Option<String>,
    #[serde(rename = "farmerId")]
    pub farmer_id: Option<Uuid>,
    #[serde(rename = "vetId")]
    pub vet_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub user_type: Option<String>,
    pub farmer_id: Option<Uuid>,
    pub vet_id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_farmer(&self) -> bool {
        self.user_type.as_deref() == Some("farmer")
    }

    pub fn is_vet(&self) -> bool {
        self.user_type.as_deref() == Some("vet")
    }
}
