//! Shared DataForSEO plumbing: auth, endpoints, envelope parsing.
//!
//! Every response uses the same envelope:
//! `{status_code, status_message, tasks: [{id, status_code, status_message, result: [...]}]}`.

use crate::config::{dataforseo_endpoint_from_env, DataForSeoCredentials};
use seobrief_core::{Error, Result};
use serde_json::Value;
use std::time::Duration;

/// Task still queued / handed to a worker.
pub const STATUS_TASK_IN_QUEUE: u64 = 40602;
pub const STATUS_TASK_HANDED: u64 = 40601;

#[derive(Debug, Clone)]
pub struct DataForSeoClient {
    client: reqwest::Client,
    credentials: DataForSeoCredentials,
    base_url: String,
    request_timeout: Duration,
}

impl DataForSeoClient {
    pub fn new(
        client: reqwest::Client,
        credentials: DataForSeoCredentials,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client,
            credentials,
            base_url: dataforseo_endpoint_from_env(),
            request_timeout,
        }
    }

    pub fn from_env(client: reqwest::Client, request_timeout: Duration) -> Result<Self> {
        let credentials = DataForSeoCredentials::from_env().ok_or_else(|| {
            Error::NotConfigured(
                "missing SEOBRIEF_DATAFORSEO_LOGIN/PASSWORD (or DATAFORSEO_LOGIN/PASSWORD)"
                    .to_string(),
            )
        })?;
        Ok(Self::new(client, credentials, request_timeout))
    }

    /// For tests / proxies.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub(crate) async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let resp = self
            .client
            .post(self.url(path))
            .basic_auth(&self.credentials.login, Some(self.credentials.password()))
            .json(body)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;
        read_json(resp, path).await
    }

    pub(crate) async fn get_json(&self, path: &str) -> Result<Value> {
        let resp = self
            .client
            .get(self.url(path))
            .basic_auth(&self.credentials.login, Some(self.credentials.password()))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;
        read_json(resp, path).await
    }
}

async fn read_json(resp: reqwest::Response, path: &str) -> Result<Value> {
    let status = resp.status();
    if !status.is_success() {
        return Err(Error::Fetch(format!("dataforseo {path} HTTP {status}")));
    }
    resp.json::<Value>()
        .await
        .map_err(|e| Error::Parse(format!("dataforseo {path}: {e}")))
}

/// `tasks[0]`, if present.
pub(crate) fn first_task(v: &Value) -> Option<&Value> {
    v.get("tasks")?.as_array()?.first()
}

pub(crate) fn task_status(task: &Value) -> (u64, String) {
    let code = task.get("status_code").and_then(Value::as_u64).unwrap_or(0);
    let msg = task
        .get("status_message")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    (code, msg)
}

/// `tasks[0].result[0].items`, if materialized. An explicit empty list is `Some([])`.
pub(crate) fn first_result_items(v: &Value) -> Option<&Vec<Value>> {
    first_task(v)?
        .get("result")?
        .as_array()?
        .first()?
        .get("items")?
        .as_array()
}

pub(crate) fn as_u32(v: Option<&Value>) -> Option<u32> {
    v.and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

pub(crate) fn as_nonempty_str(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_helpers_tolerate_missing_levels() {
        assert!(first_task(&serde_json::json!({})).is_none());
        assert!(first_result_items(&serde_json::json!({"tasks": [{"result": null}]})).is_none());
        let v = serde_json::json!({"tasks": [{"status_code": 40602, "status_message": "Task In Queue", "result": [{"items": []}]}]});
        assert_eq!(first_result_items(&v).map(|i| i.len()), Some(0));
        let (code, msg) = task_status(first_task(&v).unwrap());
        assert_eq!(code, STATUS_TASK_IN_QUEUE);
        assert_eq!(msg, "Task In Queue");
    }

    #[test]
    fn numeric_helpers_reject_negative_and_wrong_types() {
        assert_eq!(as_u32(Some(&serde_json::json!(7))), Some(7));
        assert_eq!(as_u32(Some(&serde_json::json!(-1))), None);
        assert_eq!(as_u32(Some(&serde_json::json!("7"))), None);
        assert_eq!(as_nonempty_str(Some(&serde_json::json!("  "))), None);
    }

    #[test]
    fn base_url_override_strips_trailing_slash() {
        let c = DataForSeoClient::new(
            reqwest::Client::new(),
            DataForSeoCredentials::new("u", "p"),
            Duration::from_secs(1),
        )
        .with_base_url("http://127.0.0.1:9/");
        assert_eq!(c.base_url(), "http://127.0.0.1:9");
        assert_eq!(c.url("/v3/x"), "http://127.0.0.1:9/v3/x");
    }
}
