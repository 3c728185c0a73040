//! Research orchestration: fetch -> normalize -> analyze -> synthesize.
//!
//! Once a keyword passes validation the only error a run can surface is a failed
//! SERP task submission. Timeouts, empty SERPs, cancellation and the pipeline
//! deadline all end in `Ready` with whatever was gathered, plus warnings.

use crate::analyzer::ContentAnalyzer;
use crate::config::{DataForSeoCredentials, ResearchConfig};
use crate::content::DataForSeoContentParser;
use crate::dataforseo::DataForSeoClient;
use crate::serp::DataForSeoSerp;
use chrono::Datelike;
use futures_util::StreamExt;
use seobrief_core::{
    demo, normalize, synthesize, validate_keyword, AnalysisBundle, AnalysisStatus, Competitor,
    ContentAnalysis, ContentParser, PipelineStage, Result, RunMode, SerpProvider, SerpQuery,
    SnapshotEntry, StrategyOptions, TopRankInfo,
};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct ResearchPipeline {
    serp: Option<Arc<dyn SerpProvider>>,
    analyzer: ContentAnalyzer,
    config: ResearchConfig,
    year: i32,
}

impl std::fmt::Debug for ResearchPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchPipeline")
            .field("serp", &self.serp.as_ref().map(|s| s.name()))
            .field("analyzer", &self.analyzer)
            .field("config", &self.config)
            .field("year", &self.year)
            .finish()
    }
}

fn current_year() -> i32 {
    chrono::Utc::now().year()
}

impl ResearchPipeline {
    /// `serp: None` means demo mode.
    pub fn new(
        serp: Option<Arc<dyn SerpProvider>>,
        analyzer: ContentAnalyzer,
        config: ResearchConfig,
    ) -> Self {
        Self {
            serp,
            analyzer,
            config,
            year: current_year(),
        }
    }

    pub fn demo(config: ResearchConfig) -> Self {
        Self::new(None, ContentAnalyzer::heuristic(), config)
    }

    /// DataForSEO-backed pipeline with the given credentials.
    pub fn dataforseo(credentials: DataForSeoCredentials, config: ResearchConfig) -> Result<Self> {
        let client = crate::http_client(config.request_timeout)?;
        let api = DataForSeoClient::new(client, credentials, config.request_timeout);
        Ok(Self::dataforseo_with_client(api, config))
    }

    pub fn dataforseo_with_client(api: DataForSeoClient, config: ResearchConfig) -> Self {
        let serp = DataForSeoSerp::new(api.clone(), config.ready_policy(), config.result_policy());
        let parser: Arc<dyn ContentParser> = Arc::new(DataForSeoContentParser::new(api));
        Self::new(
            Some(Arc::new(serp)),
            ContentAnalyzer::new(Some(parser)),
            config,
        )
    }

    /// Live when credentials are configured, demo otherwise.
    pub fn from_env(config: ResearchConfig) -> Result<Self> {
        match DataForSeoCredentials::from_env() {
            Some(creds) => Self::dataforseo(creds, config),
            None => {
                tracing::info!("no DataForSEO credentials configured, using demo mode");
                Ok(Self::demo(config))
            }
        }
    }

    /// Pin the year used in keyword variants and dated headers.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn mode(&self) -> RunMode {
        if self.serp.is_some() {
            RunMode::Live
        } else {
            RunMode::Demo
        }
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    pub async fn run(&self, keyword: &str) -> Result<AnalysisBundle> {
        self.run_with_cancel(keyword, &CancellationToken::new()).await
    }

    pub async fn run_with_cancel(
        &self,
        keyword: &str,
        cancel: &CancellationToken,
    ) -> Result<AnalysisBundle> {
        let keyword = validate_keyword(keyword)?;
        let Some(serp) = self.serp.as_ref() else {
            return Ok(self.demo_bundle(&keyword));
        };

        let mut run = Progress::default();
        tracing::info!(keyword = %keyword, provider = serp.name(), "research started");

        // Cancellation wins over a run that could still complete.
        let interrupted = tokio::select! {
            biased;
            _ = cancel.cancelled() => Some("research cancelled".to_string()),
            _ = tokio::time::sleep(self.config.pipeline_deadline) => Some(format!(
                "pipeline deadline of {}ms exceeded",
                self.config.pipeline_deadline.as_millis()
            )),
            res = self.drive(serp.as_ref(), &keyword, &mut run) => {
                res?;
                None
            }
        };
        if let Some(reason) = interrupted {
            let stage = run.stages.last().map(stage_label).unwrap_or("idle");
            tracing::warn!(keyword = %keyword, stage, "{reason}");
            run.warnings.push(format!("{reason} during {stage}; returning partial results"));
        }

        Ok(self.finish(keyword, run))
    }

    async fn drive(&self, serp: &dyn SerpProvider, keyword: &str, run: &mut Progress) -> Result<()> {
        let cfg = &self.config;
        run.stages.push(PipelineStage::Fetching);
        let query = SerpQuery::new(keyword)?
            .with_location(&cfg.location_name, &cfg.language_code)
            .with_device(cfg.device)
            .with_depth(cfg.depth);
        let fetch = serp.fetch_serp(&query).await?;
        tracing::info!(
            path = ?fetch.path,
            items = fetch.items.len(),
            timings_ms = ?fetch.timings_ms,
            "serp fetched"
        );
        run.raw = fetch.raw;
        run.warnings.extend(fetch.notes);

        run.stages.push(PipelineStage::Normalizing);
        let normalized = normalize(&fetch.items, cfg.max_competitors, cfg.max_snapshot);
        run.competitors = normalized
            .competitors
            .iter()
            .filter_map(Competitor::from_item)
            .collect();
        run.snapshot = normalized.snapshot;
        run.top_rank = normalized.top_rank;
        if run.competitors.is_empty() {
            run.warnings
                .push("no competitor urls in the SERP; nothing to analyze".to_string());
            return Ok(());
        }

        let total = run.competitors.len();
        run.stages.push(PipelineStage::Analyzing { done: 0, total });
        let urls: Vec<String> = run.competitors.iter().map(|c| c.url.clone()).collect();
        let mut analyses = std::pin::pin!(self
            .analyzer
            .analyze_each(&urls, cfg.analysis_concurrency));
        while let Some(a) = analyses.next().await {
            tracing::debug!(url = %a.url, status = a.status.as_str(), "competitor analyzed");
            run.analyses.push(a);
            run.stages.push(PipelineStage::Analyzing {
                done: run.analyses.len(),
                total,
            });
        }
        Ok(())
    }

    /// Pair competitors with analyses, fill gaps, synthesize, and seal as `Ready`.
    fn finish(&self, keyword: String, mut run: Progress) -> AnalysisBundle {
        for c in run.competitors.iter().skip(run.analyses.len()) {
            run.analyses.push(ContentAnalysis::new(
                &c.url,
                AnalysisStatus::Error,
                "skipped: analysis did not complete",
            ));
        }
        let competitors: Vec<Competitor> = run
            .competitors
            .into_iter()
            .zip(run.analyses.iter())
            .map(|(c, a)| c.analyzed(a))
            .collect();

        let mut strategy = None;
        if !run.analyses.is_empty() {
            run.stages.push(PipelineStage::Synthesizing);
            strategy = synthesize(&run.analyses, &keyword, &self.strategy_options());
            if strategy.is_none() {
                run.warnings
                    .push("no competitor produced usable metrics; no strategy recommended".to_string());
            }
        }
        run.stages.push(PipelineStage::Ready);
        tracing::info!(
            keyword = %keyword,
            competitors = competitors.len(),
            strategy = strategy.is_some(),
            warnings = run.warnings.len(),
            "research ready"
        );

        AnalysisBundle {
            keyword,
            mode: RunMode::Live,
            competitors,
            analyses: run.analyses,
            strategy,
            serp_snapshot: run.snapshot,
            top_rank: run.top_rank,
            raw_provider_response: run.raw,
            stages: run.stages,
            warnings: run.warnings,
        }
    }

    fn strategy_options(&self) -> StrategyOptions {
        StrategyOptions::new(&self.config.location_name, self.year)
    }

    fn demo_bundle(&self, keyword: &str) -> AnalysisBundle {
        let analyses = demo::demo_analyses(keyword);
        let competitors = demo::demo_competitors(&analyses);
        let strategy = synthesize(&analyses, keyword, &self.strategy_options()).map(|mut s| {
            s.competitor_insights = demo::demo_insights();
            s
        });
        let serp_snapshot = competitors
            .iter()
            .take(self.config.max_snapshot)
            .enumerate()
            .map(|(i, c)| SnapshotEntry {
                position: i + 1,
                title: c.title.clone(),
                url: c.url.clone(),
            })
            .collect();
        AnalysisBundle {
            keyword: keyword.to_string(),
            mode: RunMode::Demo,
            competitors,
            analyses,
            strategy,
            serp_snapshot,
            top_rank: None,
            raw_provider_response: Value::Object(Default::default()),
            stages: vec![
                PipelineStage::Idle,
                PipelineStage::Synthesizing,
                PipelineStage::Ready,
            ],
            warnings: vec!["demo mode: no provider credentials configured".to_string()],
        }
    }
}

struct Progress {
    stages: Vec<PipelineStage>,
    raw: Value,
    warnings: Vec<String>,
    competitors: Vec<Competitor>,
    analyses: Vec<ContentAnalysis>,
    snapshot: Vec<SnapshotEntry>,
    top_rank: Option<TopRankInfo>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            stages: vec![PipelineStage::Idle],
            raw: Value::Null,
            warnings: Vec::new(),
            competitors: Vec::new(),
            analyses: Vec::new(),
            snapshot: Vec::new(),
            top_rank: None,
        }
    }
}

fn stage_label(stage: &PipelineStage) -> &'static str {
    match stage {
        PipelineStage::Idle => "idle",
        PipelineStage::Fetching => "fetching",
        PipelineStage::Normalizing => "normalizing",
        PipelineStage::Analyzing { .. } => "analyzing",
        PipelineStage::Synthesizing => "synthesizing",
        PipelineStage::Ready => "ready",
    }
}
