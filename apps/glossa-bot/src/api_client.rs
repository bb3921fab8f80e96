use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use glossa_shared::api::{ApiResponse, LeadRequest};

/// Hard ceiling for calls to the lead backend. A slow backend must never
/// hold up the bot's reply to the user.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Thin client for the backend CRM API. Lead submission is an idempotent
/// upsert on the backend side, so a dropped or repeated call is harmless.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, base_url }
    }

    pub async fn post<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.post(&url).json(body).send().await?;

        if !resp.status().is_success() {
            return Err(anyhow::anyhow!("Request failed: {}", resp.status()));
        }

        Ok(resp.json().await?)
    }

    pub async fn send_lead(&self, lead: &LeadRequest) -> Result<()> {
        let resp: ApiResponse = self.post("/leads/bot_start", lead).await?;
        if !resp.success {
            return Err(anyhow::anyhow!(
                "Lead submission rejected: {}",
                resp.error.unwrap_or_else(|| "unknown error".to_string())
            ));
        }
        Ok(())
    }

    /// Startup liveness probe; failures only downgrade the log line.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}
