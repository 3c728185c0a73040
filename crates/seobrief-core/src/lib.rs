use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod demo;
pub mod normalize;
pub mod strategy;
pub mod wizard;

pub use normalize::{normalize, Normalized, SnapshotEntry, TopRankInfo};
pub use strategy::{synthesize, ContentStrategy, HeaderTargets, StrategyOptions, WordCountRange};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("search failed: {0}")]
    Search(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("parse failed: {0}")]
    Parse(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
}

impl Error {
    /// Stable machine-readable code (used in JSON error envelopes).
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::InvalidUrl(_) => "invalid_url",
            Error::Search(_) => "search_failed",
            Error::Fetch(_) => "fetch_failed",
            Error::Parse(_) => "parse_failed",
            Error::NotConfigured(_) => "not_configured",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Upper bound on the SERP depth we ever request.
pub const MAX_DEPTH: u32 = 100;
pub const DEFAULT_DEPTH: u32 = 20;
pub const DEFAULT_LANGUAGE_CODE: &str = "es";
pub const DEFAULT_LOCATION_NAME: &str = "Peru";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Desktop,
    Mobile,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Desktop => "desktop",
            Device::Mobile => "mobile",
        }
    }
}

impl std::str::FromStr for Device {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(Device::Desktop),
            "mobile" => Ok(Device::Mobile),
            other => Err(Error::InvalidInput(format!(
                "unknown device {other:?} (allowed: desktop, mobile)"
            ))),
        }
    }
}

/// Trim a user-supplied keyword and reject blank input.
pub fn validate_keyword(keyword: &str) -> Result<String> {
    let k = keyword.trim();
    if k.is_empty() {
        return Err(Error::InvalidInput("keyword must not be empty".to_string()));
    }
    Ok(k.to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SerpQuery {
    pub keyword: String,
    pub language_code: String,
    pub location_name: String,
    pub device: Device,
    /// Maximum rank to request; always within `1..=MAX_DEPTH`.
    pub depth: u32,
}

impl SerpQuery {
    pub fn new(keyword: &str) -> Result<Self> {
        Ok(Self {
            keyword: validate_keyword(keyword)?,
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            location_name: DEFAULT_LOCATION_NAME.to_string(),
            device: Device::default(),
            depth: DEFAULT_DEPTH,
        })
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth.clamp(1, MAX_DEPTH);
        self
    }

    pub fn with_location(mut self, location_name: &str, language_code: &str) -> Self {
        if !location_name.trim().is_empty() {
            self.location_name = location_name.trim().to_string();
        }
        if !language_code.trim().is_empty() {
            self.language_code = language_code.trim().to_string();
        }
        self
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }
}

/// One row of a provider SERP. Heterogeneous: organic results, ads, AI overviews, ...
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResultItem {
    #[serde(rename = "type")]
    pub item_type: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub rank_group: Option<u32>,
    pub rank_absolute: Option<u32>,
}

impl SearchResultItem {
    pub fn new(item_type: &str) -> Self {
        Self {
            item_type: item_type.to_string(),
            url: None,
            title: None,
            rank_group: None,
            rank_absolute: None,
        }
    }

    pub fn organic(url: &str, rank_group: u32) -> Self {
        Self::new("organic").with_url(url).with_rank_group(rank_group)
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_rank_group(mut self, rank: u32) -> Self {
        self.rank_group = Some(rank);
        self
    }

    pub fn with_rank_absolute(mut self, rank: u32) -> Self {
        self.rank_absolute = Some(rank);
        self
    }

    pub fn is_organic(&self) -> bool {
        self.item_type.eq_ignore_ascii_case("organic")
    }

    /// Non-blank url, if any. Items without one can never become competitors.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    /// Sort key: `rank_group`, else `rank_absolute`, else last.
    pub fn rank_key(&self) -> u32 {
        self.rank_group.or(self.rank_absolute).unwrap_or(u32::MAX)
    }
}

/// Which SERP path produced the items.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SerpPath {
    /// task_post -> tasks_ready -> task_get
    Async,
    /// synchronous live endpoint (fallback)
    Live,
    /// neither path produced items
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerpFetch {
    pub items: Vec<SearchResultItem>,
    /// Last provider payload, or a diagnostic object when no path produced items.
    pub raw: serde_json::Value,
    pub path: SerpPath,
    pub notes: Vec<String>,
    pub timings_ms: BTreeMap<String, u128>,
}

#[async_trait::async_trait]
pub trait SerpProvider: Send + Sync {
    fn name(&self) -> &'static str;
    /// Only submission-time transport errors are returned as `Err`; polling timeouts
    /// and fallback failures resolve to an empty `SerpFetch`.
    async fn fetch_serp(&self, q: &SerpQuery) -> Result<SerpFetch>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Measured by the content-parsing provider.
    Success,
    /// Canned demonstration data.
    Demo,
    /// Heuristic prior derived from the URL shape. Not a measurement.
    FallbackEstimate,
    /// Nothing could be derived (e.g. unparseable URL, skipped analysis).
    Error,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Success => "success",
            AnalysisStatus::Demo => "demo",
            AnalysisStatus::FallbackEstimate => "fallback_estimate",
            AnalysisStatus::Error => "error",
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, AnalysisStatus::Success)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct HeadingCounts {
    pub h1: u32,
    pub h2: u32,
    pub h3: u32,
    /// Reported or estimated aggregate; not necessarily h1 + h2 + h3.
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentAnalysis {
    pub url: String,
    pub word_count: u32,
    pub headings: HeadingCounts,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub status: AnalysisStatus,
    /// Always non-empty.
    pub diagnostic: String,
}

impl ContentAnalysis {
    pub fn new(url: &str, status: AnalysisStatus, diagnostic: &str) -> Self {
        let diagnostic = diagnostic.trim();
        Self {
            url: url.to_string(),
            word_count: 0,
            headings: HeadingCounts::default(),
            title: None,
            meta_description: None,
            status,
            diagnostic: if diagnostic.is_empty() {
                status.as_str().to_string()
            } else {
                diagnostic.to_string()
            },
        }
    }

    pub fn with_metrics(mut self, word_count: u32, headings: HeadingCounts) -> Self {
        self.word_count = word_count;
        self.headings = headings;
        self
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_meta_description(mut self, description: Option<String>) -> Self {
        self.meta_description = description.filter(|d| !d.trim().is_empty());
        self
    }
}

/// Structured page profile as returned by a content-parsing provider.
/// Fields are optional: providers omit them for odd pages.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ParsedPage {
    pub url: String,
    pub word_count: Option<u32>,
    pub headings: Option<HeadingCounts>,
    pub title: Option<String>,
    pub meta_description: Option<String>,
}

#[async_trait::async_trait]
pub trait ContentParser: Send + Sync {
    fn name(&self) -> &'static str;
    async fn parse_page(&self, url: &str) -> Result<ParsedPage>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Competitor {
    pub position: Option<u32>,
    pub url: String,
    pub title: String,
    pub word_count: u32,
    pub heading_count: u32,
    pub analysis_status: AnalysisStatus,
}

impl Competitor {
    /// `None` for items without a url.
    pub fn from_item(item: &SearchResultItem) -> Option<Self> {
        let url = item.url()?.to_string();
        let title = item
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&url)
            .to_string();
        let position = item.rank_group.or(item.rank_absolute);
        Some(Self {
            position,
            url,
            title,
            word_count: 0,
            heading_count: 0,
            analysis_status: AnalysisStatus::Error,
        })
    }

    /// Fill in metrics from an analysis. Consumes `self`: competitors are not
    /// edited after the analysis phase.
    pub fn analyzed(self, analysis: &ContentAnalysis) -> Self {
        Self {
            word_count: analysis.word_count,
            heading_count: analysis.headings.total,
            analysis_status: analysis.status,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Live,
    Demo,
}

/// Orchestrator state machine. Every stage may jump straight to `Ready`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Fetching,
    Normalizing,
    Analyzing { done: usize, total: usize },
    Synthesizing,
    Ready,
}

/// Everything the downstream outline/generation and presentation stages consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisBundle {
    pub keyword: String,
    pub mode: RunMode,
    pub competitors: Vec<Competitor>,
    pub analyses: Vec<ContentAnalysis>,
    pub strategy: Option<ContentStrategy>,
    pub serp_snapshot: Vec<SnapshotEntry>,
    pub top_rank: Option<TopRankInfo>,
    pub raw_provider_response: serde_json::Value,
    pub stages: Vec<PipelineStage>,
    pub warnings: Vec<String>,
}

impl AnalysisBundle {
    pub fn is_ready(&self) -> bool {
        self.stages.last() == Some(&PipelineStage::Ready)
    }

    pub fn insights(&self) -> &[String] {
        self.strategy
            .as_ref()
            .map(|s| s.competitor_insights.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_is_trimmed_and_blank_is_rejected() {
        assert_eq!(validate_keyword("  seo tools ").unwrap(), "seo tools");
        let err = validate_keyword(" \t ").unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn serp_query_depth_is_bounded() {
        let q = SerpQuery::new("kw").unwrap();
        assert_eq!(q.depth, DEFAULT_DEPTH);
        assert_eq!(q.clone().with_depth(500).depth, MAX_DEPTH);
        assert_eq!(q.with_depth(0).depth, 1);
    }

    #[test]
    fn device_parses_case_insensitively() {
        assert_eq!("Mobile".parse::<Device>().unwrap(), Device::Mobile);
        assert!("tablet".parse::<Device>().is_err());
    }

    #[test]
    fn rank_key_prefers_rank_group_then_absolute() {
        let a = SearchResultItem::new("organic")
            .with_rank_group(4)
            .with_rank_absolute(9);
        let b = SearchResultItem::new("organic").with_rank_absolute(2);
        let c = SearchResultItem::new("organic");
        assert_eq!(a.rank_key(), 4);
        assert_eq!(b.rank_key(), 2);
        assert_eq!(c.rank_key(), u32::MAX);
    }

    #[test]
    fn competitor_requires_a_url_and_falls_back_to_url_title() {
        assert!(Competitor::from_item(&SearchResultItem::new("organic")).is_none());
        assert!(Competitor::from_item(&SearchResultItem::new("organic").with_url("  ")).is_none());
        let c = Competitor::from_item(&SearchResultItem::organic("https://a.com/x", 2)).unwrap();
        assert_eq!(c.title, "https://a.com/x");
        assert_eq!(c.position, Some(2));
    }

    #[test]
    fn analysis_diagnostic_is_never_empty() {
        let a = ContentAnalysis::new("x", AnalysisStatus::Error, "   ");
        assert_eq!(a.diagnostic, "error");
    }

    #[test]
    fn status_serializes_as_closed_snake_case_tags() {
        let v = serde_json::to_value(AnalysisStatus::FallbackEstimate).unwrap();
        assert_eq!(v, serde_json::json!("fallback_estimate"));
        let stage = serde_json::to_value(PipelineStage::Analyzing { done: 1, total: 3 }).unwrap();
        assert_eq!(stage["stage"], "analyzing");
        assert_eq!(stage["total"], 3);
    }
}
