//! Per-URL content analysis. `analyze` never fails: every problem becomes a status.

use crate::estimate::estimate;
use futures_util::stream::{self, Stream, StreamExt};
use seobrief_core::{AnalysisStatus, ContentAnalysis, ContentParser};
use std::sync::Arc;
use url::Url;

/// Accepts bare hosts like `a.com/x` by retrying with an `https://` prefix.
pub fn parse_page_url(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = match Url::parse(raw) {
        Ok(u) => Some(u),
        Err(_) => Url::parse(&format!("https://{raw}")).ok(),
    }?;
    let web = matches!(parsed.scheme(), "http" | "https");
    let has_host = parsed.host_str().is_some_and(|h| !h.is_empty());
    (web && has_host).then_some(parsed)
}

#[derive(Clone, Default)]
pub struct ContentAnalyzer {
    parser: Option<Arc<dyn ContentParser>>,
}

impl std::fmt::Debug for ContentAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentAnalyzer")
            .field("parser", &self.parser.as_ref().map(|p| p.name()))
            .finish()
    }
}

impl ContentAnalyzer {
    pub fn new(parser: Option<Arc<dyn ContentParser>>) -> Self {
        Self { parser }
    }

    /// Estimates only.
    pub fn heuristic() -> Self {
        Self { parser: None }
    }

    pub fn has_parser(&self) -> bool {
        self.parser.is_some()
    }

    pub async fn analyze(&self, raw_url: &str) -> ContentAnalysis {
        let Some(url) = parse_page_url(raw_url) else {
            tracing::warn!(url = %raw_url, "unparseable competitor url");
            return ContentAnalysis::new(
                raw_url,
                AnalysisStatus::Error,
                "unparseable url: no metrics derived",
            );
        };

        let Some(parser) = self.parser.as_ref() else {
            return estimate(&url, "content parser not configured");
        };

        let page = match parser.parse_page(url.as_str()).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "content analysis failed, estimating");
                return estimate(&url, &format!("{} failed: {e}", parser.name()));
            }
        };

        match (page.word_count, page.headings) {
            (Some(words), Some(headings)) => {
                let diag = format!("measured by {}", parser.name());
                ContentAnalysis::new(url.as_str(), AnalysisStatus::Success, &diag)
                    .with_metrics(words, headings)
                    .with_title(page.title)
                    .with_meta_description(page.meta_description)
            }
            (words, headings) => {
                let missing = match (words, headings) {
                    (None, None) => "word count and headings",
                    (None, Some(_)) => "word count",
                    _ => "headings",
                };
                tracing::warn!(url = %url, missing, "incomplete page profile, estimating");
                estimate(&url, &format!("{} response missing {missing}", parser.name()))
                    .with_title(page.title)
                    .with_meta_description(page.meta_description)
            }
        }
    }

    /// Yields one analysis per url, in input order, with up to `concurrency`
    /// (at least 1) in flight.
    pub fn analyze_each<'a>(
        &'a self,
        urls: &'a [String],
        concurrency: usize,
    ) -> impl Stream<Item = ContentAnalysis> + 'a {
        stream::iter(urls.iter().map(|u| self.analyze(u))).buffered(concurrency.max(1))
    }

    pub async fn analyze_all(&self, urls: &[String], concurrency: usize) -> Vec<ContentAnalysis> {
        self.analyze_each(urls, concurrency).collect().await
    }
}
