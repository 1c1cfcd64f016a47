use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_models::auth::{JwtClaims, User};

type HmacSha256 = Hmac<Sha256>;

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<User, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    // Split token into parts
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }

    let header_b64 = parts[0];
    let claims_b64 = parts[1];
    let signature_b64 = parts[2];

    let signature = match URL_SAFE_NO_PAD.decode(signature_b64) {
        Ok(sig) => sig,
        Err(e) => {
            debug!("Failed to decode signature: {}", e);
            return Err("Invalid signature encoding".to_string());
        }
    };

    let signature_string = format!("{}.{}", header_b64, claims_b64);

    let mut mac = match HmacSha256::new_from_slice(jwt_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return Err("Failed to create HMAC".to_string()),
    };

    mac.update(signature_string.as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    // Decode claims
    let claims_json = match URL_SAFE_NO_PAD.decode(claims_b64) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(json_str) => json_str,
            Err(_) => return Err("Invalid claims encoding".to_string()),
        },
        Err(_) => return Err("Invalid claims encoding".to_string()),
    };

    let claims: JwtClaims = match serde_json::from_str(&claims_json) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to parse claims: {}", e);
            return Err("Invalid claims format".to_string());
        }
    };

    // Check expiration
    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp() as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    let created_at = claims
        .iat
        .map(|timestamp| Utc.timestamp_opt(timestamp as i64, 0).single());

    let user = User {
        id: claims.sub,
        email: claims.email,
        user_type: claims.user_type,
        farmer_id: claims.farmer_id,
        vet_id: claims.vet_id,
        created_at: created_at.flatten(),
    };

    debug!("Token validated successfully for user: {}", user.id);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{JwtTestUtils, TestUser};

    const SECRET: &str = "test-secret-key-for-jwt-validation-must-be-long-enough";

    #[test]
    fn validates_farmer_token() {
        let farmer = TestUser::farmer("farmer@example.com");
        let token = JwtTestUtils::create_test_token(&farmer, SECRET, Some(24));

        let user = validate_token(&token, SECRET).expect("token should validate");
        assert_eq!(user.id, farmer.id);
        assert!(user.is_farmer());
        assert_eq!(user.farmer_id, farmer.farmer_id);
        assert!(user.vet_id.is_none());
    }

    #[test]
    fn validates_vet_token() {
        let vet = TestUser::vet("vet@example.com");
        let token = JwtTestUtils::create_test_token(&vet, SECRET, Some(24));

        let user = validate_token(&token, SECRET).expect("token should validate");
        assert!(user.is_vet());
        assert_eq!(user.vet_id, vet.vet_id);
    }

    #[test]
    fn rejects_expired_token() {
        let farmer = TestUser::farmer("farmer@example.com");
        let token = JwtTestUtils::create_expired_token(&farmer, SECRET);

        assert_eq!(validate_token(&token, SECRET).unwrap_err(), "Token expired");
    }

    #[test]
    fn rejects_bad_signature() {
        let farmer = TestUser::farmer("farmer@example.com");
        let token = JwtTestUtils::create_invalid_signature_token(&farmer);

        assert!(validate_token(&token, SECRET).is_err());
    }

    #[test]
    fn rejects_malformed_token() {
        assert!(validate_token(&JwtTestUtils::create_malformed_token(), SECRET).is_err());
    }

    #[test]
    fn rejects_empty_secret() {
        let farmer = TestUser::farmer("farmer@example.com");
        let token = JwtTestUtils::create_test_token(&farmer, SECRET, Some(24));

        assert!(validate_token(&token, "").is_err());
    }
}
