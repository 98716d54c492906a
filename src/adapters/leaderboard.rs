//! Leaderboard client for the sorted-set store's pipeline endpoint.
//!
//! One POST carries `ZSCORE` and `ZREVRANK` for the identity; the reply is
//! an ordered array of `{ "result": ... }` / `{ "error": ... }` objects.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use super::{build_http_client, json_number, StandingSource};
use crate::config::AppConfig;
use crate::domain::{Identity, LeaderboardSnapshot};
use crate::error::{ClaimerError, Result};

#[derive(Debug, Deserialize)]
struct PipelineItem {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl PipelineItem {
    fn value(&self, command: &str) -> Option<&Value> {
        if let Some(err) = &self.error {
            warn!("Leaderboard {} failed: {}", command, err);
            return None;
        }
        self.result.as_ref().filter(|v| !v.is_null())
    }
}

#[derive(Clone)]
pub struct LeaderboardClient {
    http: Client,
    url: String,
    key: String,
    authorization: String,
}

impl LeaderboardClient {
    pub fn new(url: &str, key: &str, credential: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_http_client(timeout)?,
            url: url.to_string(),
            key: key.to_string(),
            authorization: bearer(credential),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let credential = config.leaderboard.auth.as_deref().ok_or_else(|| {
            ClaimerError::Validation("leaderboard.auth (UPSTASH_AUTH) is required".to_string())
        })?;
        Self::new(
            &config.leaderboard.url,
            &config.leaderboard.key,
            credential,
            config.http.timeout(),
        )
    }

    async fn try_fetch_standing(&self, identity: &Identity) -> Result<LeaderboardSnapshot> {
        let commands = json!([
            ["zscore", self.key, identity.as_str()],
            ["zrevrank", self.key, identity.as_str()],
        ]);

        let resp = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, &self.authorization)
            .json(&commands)
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

        let items: Vec<PipelineItem> = serde_json::from_str(&text)?;
        if items.len() != 2 {
            return Err(ClaimerError::MalformedResponse(format!(
                "expected 2 pipeline results, got {}",
                items.len()
            )));
        }

        let points = items[0].value("zscore").and_then(json_number);
        let reverse_rank = items[1]
            .value("zrevrank")
            .and_then(json_number)
            .filter(|r| *r >= 0.0)
            .map(|r| r as u64);

        debug!(
            "Leaderboard raw: points={:?} reverse_rank={:?}",
            points, reverse_rank
        );
        Ok(LeaderboardSnapshot::from_raw(reverse_rank, points))
    }
}

#[async_trait]
impl StandingSource for LeaderboardClient {
    async fn fetch_standing(&self, identity: &Identity) -> LeaderboardSnapshot {
        match self.try_fetch_standing(identity).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Failed to fetch leaderboard for fid {}: {}", identity, e);
                LeaderboardSnapshot::unknown()
            }
        }
    }
}

/// Raw tokens get a `Bearer ` scheme; values that already carry one pass through.
fn bearer(credential: &str) -> String {
    let credential = credential.trim();
    if credential.to_ascii_lowercase().starts_with("bearer ") {
        credential.to_string()
    } else {
        format!("Bearer {}", credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> LeaderboardClient {
        LeaderboardClient::new(
            &format!("{}/pipeline", server.uri()),
            "leaderboard",
            "secret",
            Duration::from_millis(1_000),
        )
        .unwrap()
    }

    async fn mount_reply(server: &MockServer, reply: Value) {
        Mock::given(method("POST"))
            .and(path("/pipeline"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(json!([
                ["zscore", "leaderboard", "4242"],
                ["zrevrank", "leaderboard", "4242"]
            ])))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn batched_query_shifts_rank() {
        let server = MockServer::start().await;
        mount_reply(&server, json!([{ "result": "1250" }, { "result": 41 }])).await;

        let snap = client(&server).fetch_standing(&Identity::new("4242")).await;
        assert_eq!(snap.rank, Some(42));
        assert_eq!(snap.points, Some(1250.0));
    }

    #[tokio::test]
    async fn top_of_board_is_rank_one() {
        let server = MockServer::start().await;
        mount_reply(&server, json!([{ "result": "99.5" }, { "result": 0 }])).await;

        let snap = client(&server).fetch_standing(&Identity::new("4242")).await;
        assert_eq!(snap.rank, Some(1));
        assert_eq!(snap.points, Some(99.5));
    }

    #[tokio::test]
    async fn absent_member_is_unknown() {
        let server = MockServer::start().await;
        mount_reply(&server, json!([{ "result": null }, { "result": null }])).await;

        let snap = client(&server).fetch_standing(&Identity::new("4242")).await;
        assert_eq!(snap, LeaderboardSnapshot::unknown());
    }

    #[tokio::test]
    async fn per_command_error_only_blanks_that_half() {
        let server = MockServer::start().await;
        mount_reply(&server, json!([{ "error": "WRONGTYPE" }, { "result": 2 }])).await;

        let snap = client(&server).fetch_standing(&Identity::new("4242")).await;
        assert_eq!(snap.rank, Some(3));
        assert_eq!(snap.points, None);
    }

    #[tokio::test]
    async fn unauthorized_degrades_to_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pipeline"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let snap = client(&server).fetch_standing(&Identity::new("4242")).await;
        assert_eq!(snap, LeaderboardSnapshot::unknown());
    }

    #[tokio::test]
    async fn connection_failure_degrades_to_unknown() {
        let client = LeaderboardClient::new(
            "http://127.0.0.1:1/pipeline",
            "leaderboard",
            "secret",
            Duration::from_millis(200),
        )
        .unwrap();
        let snap = client.fetch_standing(&Identity::new("4242")).await;
        assert_eq!(snap, LeaderboardSnapshot::unknown());
    }

    #[test]
    fn bearer_prefix_is_added_once() {
        assert_eq!(bearer("abc"), "Bearer abc");
        assert_eq!(bearer("Bearer abc"), "Bearer abc");
        assert_eq!(bearer(" bearer abc "), "bearer abc");
    }
}
