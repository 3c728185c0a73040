//! Provider clients and the research pipeline.
//!
//! Everything here talks to DataForSEO over reqwest; `seobrief-core` stays IO-free.

use seobrief_core::{Error, Result};
use std::time::Duration;

pub mod analyzer;
pub mod config;
pub mod content;
pub mod dataforseo;
pub mod estimate;
pub mod pipeline;
pub mod poll;
pub mod serp;
pub mod session;

pub use analyzer::ContentAnalyzer;
pub use config::{DataForSeoCredentials, ResearchConfig};
pub use pipeline::ResearchPipeline;
pub use session::Session;

/// Shared HTTP client. `request_timeout` is the default per request; DataForSEO
/// calls also set it explicitly.
pub fn http_client(request_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("seobrief/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        // Never hang on DNS/TLS stalls.
        .connect_timeout(Duration::from_secs(10).min(request_timeout))
        .timeout(request_timeout)
        .build()
        .map_err(|e| Error::Fetch(e.to_string()))
}
