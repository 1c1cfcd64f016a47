use std::env;
use tracing::warn;

/// How many hours before the scheduled start an appointment can still be
/// cancelled. Deployment policy, not business logic, so it lives here.
pub const DEFAULT_CANCELLATION_LEAD_HOURS: i64 = 2;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub cancellation_lead_hours: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            cancellation_lead_hours: env::var("CANCELLATION_LEAD_HOURS")
                .ok()
                .and_then(|raw| match raw.parse::<i64>() {
                    Ok(hours) if hours >= 0 => Some(hours),
                    _ => {
                        warn!("CANCELLATION_LEAD_HOURS is not a non-negative integer, using default");
                        None
                    }
                })
                .unwrap_or(DEFAULT_CANCELLATION_LEAD_HOURS),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }
}
