//! Cooldown service client.
//!
//! `GET  <base>?fid=<id>` returns `{ "lastOpen": <epoch ms> }`.
//! `POST <base>` with a signed claim returns `{ "ok": true }` on acceptance.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{build_http_client, json_number, CooldownOracle};
use crate::config::AppConfig;
use crate::domain::{CooldownState, Identity};
use crate::error::{ClaimerError, Result};
use crate::signing::SignedClaim;

#[derive(Debug, Deserialize)]
struct CooldownResponse {
    #[serde(rename = "lastOpen", default)]
    last_open: Option<Value>,
}

/// Response of the claim endpoint. Only `ok` is interpreted.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimResponse {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ClaimResponse {
    pub fn accepted(&self) -> bool {
        self.ok == Some(true)
    }
}

#[derive(Clone)]
pub struct CooldownClient {
    http: Client,
    base_url: String,
}

impl CooldownClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.cooldown.base_url, config.http.timeout())
    }

    async fn try_fetch_last_open(&self, identity: &Identity) -> Result<Option<i64>> {
        let resp = self
            .http
            .get(&self.base_url)
            .query(&[("fid", identity.as_str())])
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ClaimerError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let body: CooldownResponse = serde_json::from_str(&text)?;
        match body.last_open {
            None | Some(Value::Null) => Ok(None),
            Some(raw) => json_number(&raw)
                .map(|ms| Some(ms as i64))
                .ok_or_else(|| ClaimerError::MalformedResponse(format!("lastOpen: {}", raw))),
        }
    }

    /// Submit a signed claim. Exactly one POST per call.
    pub async fn submit_claim(&self, claim: &SignedClaim) -> Result<ClaimResponse> {
        let resp = self
            .http
            .post(&self.base_url)
            .header(CONTENT_TYPE, "application/json")
            .json(claim)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        debug!("Claim response status={} body={}", status, text);

        // Refusals may come back with a non-2xx status and a JSON body;
        // the body decides, the status does not.
        serde_json::from_str(&text).map_err(|e| {
            ClaimerError::MalformedResponse(format!("status={} body={} ({})", status, text, e))
        })
    }
}

#[async_trait]
impl CooldownOracle for CooldownClient {
    async fn fetch_last_open(&self, identity: &Identity) -> CooldownState {
        match self.try_fetch_last_open(identity).await {
            Ok(ms) => CooldownState::from_epoch_millis(ms),
            Err(e) => {
                warn!("Failed to fetch cooldown for fid {}: {}", identity, e);
                CooldownState::Unknown
            }
        }
    }
}
