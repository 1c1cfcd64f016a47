use anyhow::Result;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Non-2xx response from the store, kept typed so callers can react to the
/// status code. A 409 surfaces when the appointments exclusion constraint
/// rejects a racing insert for an already-taken slot.
#[derive(Debug, Error)]
#[error("store error ({status}): {body}")]
pub struct StoreStatusError {
    pub status: u16,
    pub body: String,
}

impl StoreStatusError {
    pub fn is_conflict(&self) -> bool {
        self.status == 409
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.anon_key).unwrap());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            );
        }

        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, auth_token, body, None)
            .await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut headers = self.get_headers(auth_token);
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Store error ({}): {}", status, error_text);

            return Err(StoreStatusError {
                status: status.as_u16(),
                body: error_text,
            }
            .into());
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// DELETE with no useful response body; PostgREST returns an empty
    /// payload unless a representation is requested.
    pub async fn delete(&self, path: &str, auth_token: Option<&str>) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making DELETE request to {}", url);

        let headers = self.get_headers(auth_token);
        let response = self
            .client
            .request(Method::DELETE, &url)
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Store error ({}): {}", status, error_text);

            return Err(StoreStatusError {
                status: status.as_u16(),
                body: error_text,
            }
            .into());
        }

        Ok(())
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
