//! Environment-driven configuration. Empty values are treated as unset.

use crate::poll::RetryPolicy;
use seobrief_core::{
    normalize::{DEFAULT_MAX_COMPETITORS, DEFAULT_MAX_SNAPSHOT},
    Device, DEFAULT_DEPTH, DEFAULT_LANGUAGE_CODE, DEFAULT_LOCATION_NAME, MAX_DEPTH,
};
use std::time::Duration;

pub const DEFAULT_DATAFORSEO_ENDPOINT: &str = "https://api.dataforseo.com";

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_nonempty(key).and_then(|v| v.parse::<u64>().ok())
}

fn env_ms(key: &str, default: Duration) -> Duration {
    env_u64(key).map(Duration::from_millis).unwrap_or(default)
}

/// DataForSEO basic-auth pair. `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct DataForSeoCredentials {
    pub login: String,
    password: String,
}

impl std::fmt::Debug for DataForSeoCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataForSeoCredentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl DataForSeoCredentials {
    pub fn new(login: &str, password: &str) -> Self {
        Self {
            login: login.to_string(),
            password: password.to_string(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Both halves must be present; a lone login is treated as unconfigured.
    pub fn from_env() -> Option<Self> {
        let login = env_nonempty("SEOBRIEF_DATAFORSEO_LOGIN")
            .or_else(|| env_nonempty("DATAFORSEO_LOGIN"))?;
        let password = env_nonempty("SEOBRIEF_DATAFORSEO_PASSWORD")
            .or_else(|| env_nonempty("DATAFORSEO_PASSWORD"))?;
        Some(Self { login, password })
    }
}

pub fn dataforseo_endpoint_from_env() -> String {
    env_nonempty("SEOBRIEF_DATAFORSEO_ENDPOINT")
        .unwrap_or_else(|| DEFAULT_DATAFORSEO_ENDPOINT.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchConfig {
    pub language_code: String,
    pub location_name: String,
    pub device: Device,
    pub depth: u32,
    /// Total wait for the task to show up in `tasks_ready`.
    pub ready_budget: Duration,
    /// Total wait for `task_get` to return materialized items.
    pub result_budget: Duration,
    pub poll_backoff: Duration,
    /// Per HTTP request.
    pub request_timeout: Duration,
    pub max_competitors: usize,
    pub max_snapshot: usize,
    /// 1 = sequential analyses.
    pub analysis_concurrency: usize,
    /// Hard ceiling on one whole research run.
    pub pipeline_deadline: Duration,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            location_name: DEFAULT_LOCATION_NAME.to_string(),
            device: Device::Desktop,
            depth: DEFAULT_DEPTH,
            ready_budget: Duration::from_secs(60),
            result_budget: Duration::from_secs(90),
            poll_backoff: Duration::from_secs(2),
            request_timeout: Duration::from_secs(60),
            max_competitors: DEFAULT_MAX_COMPETITORS,
            max_snapshot: DEFAULT_MAX_SNAPSHOT,
            analysis_concurrency: 1,
            pipeline_deadline: Duration::from_secs(300),
        }
    }
}

impl ResearchConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            language_code: env_nonempty("SEOBRIEF_LANGUAGE").unwrap_or(d.language_code),
            location_name: env_nonempty("SEOBRIEF_LOCATION").unwrap_or(d.location_name),
            device: env_nonempty("SEOBRIEF_DEVICE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(d.device),
            depth: env_u64("SEOBRIEF_DEPTH")
                .map(|v| v.min(u64::from(MAX_DEPTH)) as u32)
                .unwrap_or(d.depth),
            ready_budget: env_ms("SEOBRIEF_READY_BUDGET_MS", d.ready_budget),
            result_budget: env_ms("SEOBRIEF_RESULT_BUDGET_MS", d.result_budget),
            poll_backoff: env_ms("SEOBRIEF_POLL_BACKOFF_MS", d.poll_backoff),
            request_timeout: env_ms("SEOBRIEF_REQUEST_TIMEOUT_MS", d.request_timeout),
            max_competitors: env_u64("SEOBRIEF_MAX_COMPETITORS")
                .map(|v| v as usize)
                .unwrap_or(d.max_competitors),
            max_snapshot: env_u64("SEOBRIEF_MAX_SNAPSHOT")
                .map(|v| v as usize)
                .unwrap_or(d.max_snapshot),
            analysis_concurrency: env_u64("SEOBRIEF_ANALYSIS_CONCURRENCY")
                .map(|v| v as usize)
                .unwrap_or(d.analysis_concurrency),
            pipeline_deadline: env_ms("SEOBRIEF_PIPELINE_DEADLINE_MS", d.pipeline_deadline),
        }
        .clamped()
    }

    /// Keep knobs in ranges where the pipeline stays bounded and useful.
    pub fn clamped(mut self) -> Self {
        self.depth = self.depth.clamp(1, MAX_DEPTH);
        self.max_competitors = self.max_competitors.clamp(1, 10);
        self.max_snapshot = self.max_snapshot.clamp(1, 20);
        self.analysis_concurrency = self.analysis_concurrency.clamp(1, 8);
        self.ready_budget = self.ready_budget.min(Duration::from_secs(600));
        self.result_budget = self.result_budget.min(Duration::from_secs(600));
        self.poll_backoff = self.poll_backoff.min(Duration::from_secs(30));
        self.request_timeout = self
            .request_timeout
            .clamp(Duration::from_millis(100), Duration::from_secs(120));
        self.pipeline_deadline = self.pipeline_deadline.max(Duration::from_millis(100));
        self
    }

    pub fn ready_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempt_timeout: self.request_timeout,
            total_budget: self.ready_budget,
            backoff: self.poll_backoff,
        }
    }

    pub fn result_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempt_timeout: self.request_timeout,
            total_budget: self.result_budget,
            backoff: self.poll_backoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env vars are process-global; serialize tests that mutate them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct EnvGuard {
        k: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(k: &'static str, v: &str) -> Self {
            let prev = std::env::var(k).ok();
            std::env::set_var(k, v);
            Self { k, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(v) = self.prev.take() {
                std::env::set_var(self.k, v);
            } else {
                std::env::remove_var(self.k);
            }
        }
    }

    #[test]
    fn blank_credentials_are_treated_as_missing() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let _g1 = EnvGuard::set("SEOBRIEF_DATAFORSEO_LOGIN", "  ");
        let _g2 = EnvGuard::set("SEOBRIEF_DATAFORSEO_PASSWORD", "secret");
        let _g3 = EnvGuard::set("DATAFORSEO_LOGIN", "");
        assert!(DataForSeoCredentials::from_env().is_none());
    }

    #[test]
    fn credentials_fall_back_to_unprefixed_names() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let _g1 = EnvGuard::set("SEOBRIEF_DATAFORSEO_LOGIN", "");
        let _g2 = EnvGuard::set("SEOBRIEF_DATAFORSEO_PASSWORD", "");
        let _g3 = EnvGuard::set("DATAFORSEO_LOGIN", "me@example.com");
        let _g4 = EnvGuard::set("DATAFORSEO_PASSWORD", "hunter2");
        let c = DataForSeoCredentials::from_env().expect("configured");
        assert_eq!(c.login, "me@example.com");
        assert_eq!(c.password(), "hunter2");
        assert!(!format!("{c:?}").contains("hunter2"));
    }

    #[test]
    fn env_overrides_are_parsed_and_clamped() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let _g1 = EnvGuard::set("SEOBRIEF_DEPTH", "500");
        let _g2 = EnvGuard::set("SEOBRIEF_READY_BUDGET_MS", "1500");
        let _g3 = EnvGuard::set("SEOBRIEF_DEVICE", "mobile");
        let _g4 = EnvGuard::set("SEOBRIEF_ANALYSIS_CONCURRENCY", "0");
        let _g5 = EnvGuard::set("SEOBRIEF_MAX_COMPETITORS", "not-a-number");
        let c = ResearchConfig::from_env();
        assert_eq!(c.depth, MAX_DEPTH);
        assert_eq!(c.ready_budget, Duration::from_millis(1500));
        assert_eq!(c.device, Device::Mobile);
        assert_eq!(c.analysis_concurrency, 1);
        assert_eq!(c.max_competitors, DEFAULT_MAX_COMPETITORS);
    }

    #[test]
    fn defaults_match_documented_values() {
        let c = ResearchConfig::default();
        assert_eq!(c.depth, 20);
        assert_eq!(c.max_competitors, 3);
        assert_eq!(c.max_snapshot, 5);
        assert!(c.ready_budget < c.result_budget);
        assert_eq!(c.result_policy().total_budget, Duration::from_secs(90));
    }
}
