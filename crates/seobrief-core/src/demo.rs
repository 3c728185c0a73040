//! Fixed demonstration data used when no provider credentials are configured.

use crate::{AnalysisStatus, Competitor, ContentAnalysis, HeadingCounts};

pub const DEMO_URLS: [&str; 3] = ["competitor1.com", "competitor2.com", "competitor3.com"];

const DEMO_DIAGNOSTIC: &str = "demo data: no provider credentials configured";

/// (url, title template, words, h2, h3, total headers)
fn demo_rows(keyword: &str) -> [(&'static str, String, u32, u32, u32, u32); 3] {
    [
        (
            DEMO_URLS[0],
            format!("Complete guide to {keyword}"),
            2500,
            6,
            1,
            8,
        ),
        (DEMO_URLS[1], format!("All about {keyword}"), 1800, 4, 1, 6),
        (
            DEMO_URLS[2],
            format!("{keyword}: the definitive manual"),
            3200,
            8,
            3,
            12,
        ),
    ]
}

pub fn demo_analyses(keyword: &str) -> Vec<ContentAnalysis> {
    demo_rows(keyword)
        .into_iter()
        .map(|(url, title, words, h2, h3, total)| {
            ContentAnalysis::new(url, AnalysisStatus::Demo, DEMO_DIAGNOSTIC)
                .with_metrics(
                    words,
                    HeadingCounts {
                        h1: 1,
                        h2,
                        h3,
                        total,
                    },
                )
                .with_title(Some(title))
        })
        .collect()
}

pub fn demo_competitors(analyses: &[ContentAnalysis]) -> Vec<Competitor> {
    analyses
        .iter()
        .enumerate()
        .map(|(i, a)| Competitor {
            position: Some(i as u32 + 1),
            url: a.url.clone(),
            title: a.title.clone().unwrap_or_else(|| a.url.clone()),
            word_count: 0,
            heading_count: 0,
            analysis_status: AnalysisStatus::Demo,
        }
        .analyzed(a))
        .collect()
}

pub fn demo_insights() -> Vec<String> {
    vec![
        "Average word count: 2,500".to_string(),
        "Average headers: 8-12".to_string(),
        "Main focus: complete guides".to_string(),
        "Dominant tone: professional and educational".to_string(),
    ]
}
