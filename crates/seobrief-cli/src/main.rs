use anyhow::Result;
use clap::{Parser, Subcommand};
use seobrief_core::wizard::outline_options;
use seobrief_core::{validate_keyword, AnalysisBundle, Device, Error};
use seobrief_local::{DataForSeoCredentials, ResearchConfig, ResearchPipeline};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "seobrief")]
#[command(about = "Competitor research for SEO content briefs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Research a keyword: SERP -> competitors -> content analysis -> strategy (json).
    Research(ResearchCmd),
    /// Print the outline templates for a keyword (json).
    Outlines(OutlinesCmd),
    /// Diagnose configuration (json; no secrets).
    Doctor,
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct ResearchCmd {
    keyword: String,
    /// Use canned demonstration data even if credentials are configured.
    #[arg(long)]
    demo: bool,
    /// SERP location name (e.g. "Peru", "United States").
    #[arg(long)]
    location: Option<String>,
    /// SERP language code (e.g. "es", "en").
    #[arg(long)]
    language: Option<String>,
    /// desktop|mobile
    #[arg(long)]
    device: Option<String>,
    /// Max SERP rank to request (1..=100).
    #[arg(long)]
    depth: Option<u32>,
    #[arg(long)]
    max_competitors: Option<usize>,
    #[arg(long)]
    max_snapshot: Option<usize>,
    /// Parallel content analyses (1 = sequential).
    #[arg(long)]
    concurrency: Option<usize>,
    /// Hard ceiling on the whole run (ms); partial results are returned past it.
    #[arg(long)]
    deadline_ms: Option<u64>,
    /// Also write the JSON envelope to this path.
    #[arg(long)]
    out: Option<std::path::PathBuf>,
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct OutlinesCmd {
    keyword: String,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

fn hint_for(e: &Error) -> &'static str {
    match e {
        Error::InvalidInput(_) => "Check the keyword and flag values.",
        Error::NotConfigured(_) => {
            "Set SEOBRIEF_DATAFORSEO_LOGIN and SEOBRIEF_DATAFORSEO_PASSWORD, or use --demo."
        }
        Error::Search(_) | Error::Fetch(_) => {
            "Check DataForSEO credentials, balance and connectivity (see `seobrief doctor`)."
        }
        Error::Parse(_) | Error::InvalidUrl(_) => "",
    }
}

fn error_envelope(kind: &str, e: &Error) -> serde_json::Value {
    serde_json::json!({
        "schema_version": 1,
        "kind": kind,
        "ok": false,
        "error": {
            "code": e.code(),
            "message": e.to_string(),
            "hint": hint_for(e),
        }
    })
}

fn research_config(args: &ResearchCmd) -> seobrief_core::Result<ResearchConfig> {
    let mut cfg = ResearchConfig::from_env();
    if let Some(loc) = args.location.as_deref().filter(|s| !s.trim().is_empty()) {
        cfg.location_name = loc.trim().to_string();
    }
    if let Some(lang) = args.language.as_deref().filter(|s| !s.trim().is_empty()) {
        cfg.language_code = lang.trim().to_string();
    }
    if let Some(d) = args.device.as_deref() {
        cfg.device = d.parse::<Device>()?;
    }
    if let Some(n) = args.depth {
        cfg.depth = n;
    }
    if let Some(n) = args.max_competitors {
        cfg.max_competitors = n;
    }
    if let Some(n) = args.max_snapshot {
        cfg.max_snapshot = n;
    }
    if let Some(n) = args.concurrency {
        cfg.analysis_concurrency = n;
    }
    if let Some(ms) = args.deadline_ms {
        cfg.pipeline_deadline = Duration::from_millis(ms);
    }
    Ok(cfg.clamped())
}

fn text_summary(b: &AnalysisBundle) -> String {
    let mut out = format!("keyword: {} ({:?} mode)\n", b.keyword, b.mode);
    out.push_str("competitors:\n");
    for c in &b.competitors {
        out.push_str(&format!(
            "  {}. {} <{}> words={} headers={} [{}]\n",
            c.position.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            c.title,
            c.url,
            c.word_count,
            c.heading_count,
            c.analysis_status.as_str()
        ));
    }
    match &b.strategy {
        Some(s) => {
            let w = s.recommended_word_count;
            out.push_str(&format!(
                "target words: {} / {} / {} (min/optimal/max)\n",
                w.min, w.optimal, w.max
            ));
            out.push_str(&format!(
                "target headers: h2={} h3={}\n",
                s.recommended_headers.h2_count, s.recommended_headers.h3_count
            ));
            for i in &s.competitor_insights {
                out.push_str(&format!("- {i}\n"));
            }
        }
        None => out.push_str("no strategy: no competitor produced usable metrics\n"),
    }
    for w in &b.warnings {
        out.push_str(&format!("warning: {w}\n"));
    }
    out
}

async fn research(args: ResearchCmd) -> Result<bool> {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let run = async {
        let cfg = research_config(&args)?;
        let pipeline = if args.demo {
            ResearchPipeline::demo(cfg)
        } else {
            ResearchPipeline::from_env(cfg)?
        };
        pipeline.run_with_cancel(&args.keyword, &cancel).await
    };
    let outcome = run.await;
    let (ok, v) = match &outcome {
        Ok(bundle) => (
            true,
            serde_json::json!({
                "schema_version": 1,
                "kind": "research",
                "ok": true,
                "bundle": bundle,
            }),
        ),
        Err(e) => (false, error_envelope("research", e)),
    };

    if let Some(path) = args.out.as_ref() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&v)?)?;
    }
    match (args.output.to_ascii_lowercase().as_str(), &outcome) {
        ("text", Ok(bundle)) => print!("{}", text_summary(bundle)),
        ("text", Err(e)) => eprintln!("error: {e}"),
        _ => println!("{v}"),
    }
    Ok(ok)
}

fn outlines(args: OutlinesCmd) -> bool {
    let v = match validate_keyword(&args.keyword) {
        Ok(kw) => serde_json::json!({
            "schema_version": 1,
            "kind": "outlines",
            "ok": true,
            "keyword": kw,
            "outlines": outline_options(&kw),
        }),
        Err(e) => error_envelope("outlines", &e),
    };
    println!("{v}");
    v["ok"].as_bool().unwrap_or(false)
}

fn doctor() {
    let t0 = std::time::Instant::now();
    let cfg = ResearchConfig::from_env();
    // Booleans only; never print credential values.
    let credentials = DataForSeoCredentials::from_env().is_some();
    let endpoint_override = std::env::var("SEOBRIEF_DATAFORSEO_ENDPOINT")
        .ok()
        .is_some_and(|v| !v.trim().is_empty());
    let v = serde_json::json!({
        "schema_version": 1,
        "kind": "doctor",
        "ok": true,
        "name": "seobrief",
        "version": env!("CARGO_PKG_VERSION"),
        "mode": if credentials { "live" } else { "demo" },
        "configured": {
            "dataforseo_credentials": credentials,
            "dataforseo_endpoint_override": endpoint_override,
        },
        "defaults": {
            "location": cfg.location_name,
            "language": cfg.language_code,
            "device": cfg.device.as_str(),
            "depth": cfg.depth,
            "max_competitors": cfg.max_competitors,
            "analysis_concurrency": cfg.analysis_concurrency,
            "ready_budget_ms": cfg.ready_budget.as_millis() as u64,
            "result_budget_ms": cfg.result_budget.as_millis() as u64,
            "pipeline_deadline_ms": cfg.pipeline_deadline.as_millis() as u64,
        },
        "hint": if credentials {
            ""
        } else {
            "Set SEOBRIEF_DATAFORSEO_LOGIN and SEOBRIEF_DATAFORSEO_PASSWORD for live research."
        },
        "elapsed_ms": t0.elapsed().as_millis() as u64,
    });
    println!("{v}");
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the JSON contract; logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("seobrief=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ok = match cli.command {
        Commands::Research(args) => research(args).await?,
        Commands::Outlines(args) => outlines(args),
        Commands::Doctor => {
            doctor();
            true
        }
        Commands::Version(args) => {
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "version",
                "ok": true,
                "name": "seobrief",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => println!("seobrief {}", env!("CARGO_PKG_VERSION")),
                _ => println!("{v}"),
            }
            true
        }
    };
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
