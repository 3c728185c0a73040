//! Aggregate competitor content metrics into writing targets.
//!
//! This is template generation over averages, not NLP. Title word counting only
//! feeds an insight string.

use crate::ContentAnalysis;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MIN_RECOMMENDED_WORDS: u32 = 800;
pub const MAX_OPTIMAL_WORDS: u32 = 4000;
const WORDS_ABOVE_AVERAGE: u32 = 300;
const WORDS_BELOW_SHORTEST: u32 = 200;
const WORDS_ABOVE_LONGEST: u32 = 500;
const MIN_SUGGESTED_HEADERS: u32 = 8;
pub const MAX_SUGGESTED_HEADERS: u32 = 15;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordCountRange {
    pub min: u32,
    pub optimal: u32,
    pub max: u32,
}

impl WordCountRange {
    /// Enforces `min <= optimal <= max` by raising the later bounds.
    pub fn new(min: u32, optimal: u32, max: u32) -> Self {
        let optimal = optimal.max(min);
        let max = max.max(optimal);
        Self { min, optimal, max }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeaderTargets {
    pub h2_count: u32,
    pub h3_count: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentStrategy {
    pub recommended_word_count: WordCountRange,
    pub recommended_headers: HeaderTargets,
    pub suggested_headers: Vec<String>,
    pub competitor_insights: Vec<String>,
    pub keyword_opportunities: Vec<String>,
    /// How many analyses fed the averages, and how many of them were estimates.
    pub analyses_used: usize,
    pub estimated_inputs: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyOptions {
    /// Locale qualifier for keyword variants (e.g. a country name). Empty skips it.
    pub locale: String,
    /// Year token for keyword variants and dated headers.
    pub year: i32,
}

impl StrategyOptions {
    pub fn new(locale: &str, year: i32) -> Self {
        Self {
            locale: locale.trim().to_string(),
            year,
        }
    }
}

struct Averages {
    n: usize,
    avg_words: u32,
    min_words: u32,
    max_words: u32,
    avg_h2: u32,
    avg_h3: u32,
}

fn mean(values: impl Iterator<Item = u32>, n: usize) -> u32 {
    if n == 0 {
        return 0;
    }
    let sum: u64 = values.map(u64::from).sum();
    (sum as f64 / n as f64).round() as u32
}

fn averages(basis: &[&ContentAnalysis]) -> Option<Averages> {
    let n = basis.len();
    let min_words = basis.iter().map(|a| a.word_count).min()?;
    let max_words = basis.iter().map(|a| a.word_count).max()?;
    Some(Averages {
        n,
        avg_words: mean(basis.iter().map(|a| a.word_count), n),
        min_words,
        max_words,
        avg_h2: mean(basis.iter().map(|a| a.headings.h2), n),
        avg_h3: mean(basis.iter().map(|a| a.headings.h3), n),
    })
}

/// `None` when no analysis carries a positive word count: nothing is fabricated
/// from zero data.
pub fn synthesize(
    analyses: &[ContentAnalysis],
    keyword: &str,
    opts: &StrategyOptions,
) -> Option<ContentStrategy> {
    let basis: Vec<&ContentAnalysis> = analyses.iter().filter(|a| a.word_count > 0).collect();
    let avg = averages(&basis)?;
    let keyword = keyword.trim();

    let recommended_word_count = WordCountRange::new(
        avg.min_words
            .saturating_sub(WORDS_BELOW_SHORTEST)
            .max(MIN_RECOMMENDED_WORDS),
        avg.avg_words
            .saturating_add(WORDS_ABOVE_AVERAGE)
            .min(MAX_OPTIMAL_WORDS),
        avg.max_words.saturating_add(WORDS_ABOVE_LONGEST),
    );

    // Provider counts are untrusted; saturate instead of overflowing.
    let h2_count = avg.avg_h2.saturating_add(1);
    let h3_count = avg.avg_h3.saturating_add(2);
    let recommended_headers = HeaderTargets {
        h2_count,
        h3_count,
        total: h2_count.saturating_add(h3_count),
    };

    let target = h2_count.clamp(MIN_SUGGESTED_HEADERS, MAX_SUGGESTED_HEADERS);
    let estimated_inputs = basis.iter().filter(|a| !a.status.is_measured()).count();

    Some(ContentStrategy {
        recommended_word_count,
        recommended_headers,
        suggested_headers: suggested_headers(keyword, opts.year, target as usize),
        competitor_insights: insights(&basis, &avg, estimated_inputs),
        keyword_opportunities: keyword_opportunities(keyword, opts),
        analyses_used: avg.n,
        estimated_inputs,
    })
}

/// Generic section titles; the closing section is always kept last.
pub fn suggested_headers(keyword: &str, year: i32, count: usize) -> Vec<String> {
    let body = [
        format!("What is {keyword}? Complete guide"),
        format!("Main benefits of {keyword}"),
        format!("How {keyword} works step by step"),
        format!("Types of {keyword}"),
        format!("How to choose the right {keyword}"),
        format!("Common mistakes with {keyword}"),
        format!("{keyword} best practices"),
        format!("Tools and resources for {keyword}"),
        format!("{keyword} examples and case studies"),
        format!("Costs and pricing of {keyword}"),
        format!("{keyword} compared with the alternatives"),
        format!("{keyword} trends for {year}"),
        format!("Expert tips on {keyword}"),
        format!("Frequently asked questions about {keyword}"),
    ];
    let closing = format!("Conclusion: next steps with {keyword}");

    let count = count.clamp(1, body.len() + 1);
    let mut out: Vec<String> = body.into_iter().take(count - 1).collect();
    out.push(closing);
    out
}

pub fn keyword_opportunities(keyword: &str, opts: &StrategyOptions) -> Vec<String> {
    let mut out = Vec::new();
    if !opts.locale.is_empty() {
        out.push(format!("{keyword} {}", opts.locale.to_lowercase()));
    }
    out.push(format!("{keyword} guide"));
    out.push(format!("{keyword} tutorial"));
    out.push(format!("{keyword} examples"));
    out.push(format!("{keyword} {}", opts.year));
    out
}

/// `2500` -> `"2,500"`.
pub fn group_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn frequent_title_terms(basis: &[&ContentAnalysis], top: usize) -> Vec<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for title in basis.iter().filter_map(|a| a.title.as_deref()) {
        for w in title
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() >= 4)
        {
            *counts.entry(w.to_lowercase()).or_default() += 1;
        }
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(top).map(|(w, _)| w).collect()
}

fn insights(basis: &[&ContentAnalysis], avg: &Averages, estimated: usize) -> Vec<String> {
    let mut out = vec![
        format!(
            "Average length: {} words across {} competitor pages",
            group_thousands(avg.avg_words),
            avg.n
        ),
        format!(
            "Length range: {} to {} words",
            group_thousands(avg.min_words),
            group_thousands(avg.max_words)
        ),
        format!(
            "Average structure: {} H2 and {} H3 sections",
            avg.avg_h2, avg.avg_h3
        ),
    ];
    if estimated > 0 {
        out.push(format!(
            "{estimated} of {} competitor metrics are heuristic estimates, not measurements",
            avg.n
        ));
    }
    let terms = frequent_title_terms(basis, 3);
    if !terms.is_empty() {
        out.push(format!("Frequent title terms: {}", terms.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnalysisStatus, HeadingCounts};
    use proptest::prelude::*;

    fn analysis(words: u32, h2: u32, h3: u32, status: AnalysisStatus) -> ContentAnalysis {
        ContentAnalysis::new("https://example.com/", status, "test").with_metrics(
            words,
            HeadingCounts {
                h1: 1,
                h2,
                h3,
                total: 1 + h2 + h3,
            },
        )
    }

    fn opts() -> StrategyOptions {
        StrategyOptions::new("Peru", 2026)
    }

    #[test]
    fn empty_input_yields_no_strategy() {
        assert!(synthesize(&[], "kw", &opts()).is_none());
    }

    #[test]
    fn zero_word_counts_are_not_a_data_basis() {
        let a = vec![analysis(0, 4, 4, AnalysisStatus::Error)];
        assert!(synthesize(&a, "kw", &opts()).is_none());
    }

    #[test]
    fn three_competitors_produce_expected_targets() {
        let a = vec![
            analysis(1500, 6, 3, AnalysisStatus::Success),
            analysis(2000, 8, 5, AnalysisStatus::Success),
            analysis(2500, 10, 7, AnalysisStatus::Success),
        ];
        let s = synthesize(&a, "seo audit", &opts()).unwrap();
        assert_eq!(
            s.recommended_word_count,
            WordCountRange {
                min: 1300,
                optimal: 2300,
                max: 3000
            }
        );
        assert_eq!(s.recommended_headers.h2_count, 9);
        assert_eq!(s.recommended_headers.h3_count, 7);
        assert_eq!(s.recommended_headers.total, 16);
        assert!(s.competitor_insights[0].contains("2,000 words"));
        assert_eq!(s.analyses_used, 3);
        assert_eq!(s.estimated_inputs, 0);
    }

    #[test]
    fn suggested_headers_are_clamped_between_8_and_15() {
        let few = vec![analysis(1000, 2, 1, AnalysisStatus::Success)];
        let s = synthesize(&few, "kw", &opts()).unwrap();
        assert_eq!(s.suggested_headers.len(), 8);
        assert!(s.suggested_headers.last().unwrap().starts_with("Conclusion"));

        let many = vec![analysis(1000, 40, 1, AnalysisStatus::Success)];
        let s = synthesize(&many, "kw", &opts()).unwrap();
        assert_eq!(s.suggested_headers.len(), 15);
        assert!(s.suggested_headers[0].contains("kw"));
    }

    #[test]
    fn keyword_opportunities_include_locale_and_year() {
        let v = keyword_opportunities("crm", &opts());
        assert_eq!(
            v,
            vec!["crm peru", "crm guide", "crm tutorial", "crm examples", "crm 2026"]
        );
        let no_locale = keyword_opportunities("crm", &StrategyOptions::new("  ", 2026));
        assert_eq!(no_locale.len(), 4);
    }

    #[test]
    fn estimates_are_flagged_in_insights() {
        let a = vec![
            analysis(1500, 6, 3, AnalysisStatus::Success),
            analysis(900, 4, 2, AnalysisStatus::FallbackEstimate),
        ];
        let s = synthesize(&a, "kw", &opts()).unwrap();
        assert_eq!(s.estimated_inputs, 1);
        assert!(s
            .competitor_insights
            .iter()
            .any(|i| i.contains("1 of 2") && i.contains("estimates")));
    }

    #[test]
    fn title_terms_are_counted_for_insight_only() {
        let mut a = analysis(1500, 6, 3, AnalysisStatus::Success);
        a.title = Some("Complete Guide to Coffee".to_string());
        let mut b = analysis(1700, 6, 3, AnalysisStatus::Success);
        b.title = Some("Coffee brewing guide".to_string());
        let s = synthesize(&[a, b], "coffee", &opts()).unwrap();
        let line = s
            .competitor_insights
            .iter()
            .find(|i| i.starts_with("Frequent title terms"))
            .unwrap();
        assert_eq!(line, "Frequent title terms: coffee, guide, brewing");
    }

    #[test]
    fn extreme_provider_counts_saturate_instead_of_overflowing() {
        let huge = ContentAnalysis::new("https://example.com/", AnalysisStatus::Success, "test")
            .with_metrics(
                u32::MAX,
                HeadingCounts {
                    h1: u32::MAX,
                    h2: u32::MAX,
                    h3: u32::MAX,
                    total: u32::MAX,
                },
            );
        let s = synthesize(&[huge], "kw", &opts()).unwrap();
        let r = s.recommended_word_count;
        assert!(r.min <= r.optimal && r.optimal <= r.max);
        assert_eq!(r.max, u32::MAX);
        assert_eq!(s.recommended_headers.h2_count, u32::MAX);
        assert_eq!(s.recommended_headers.total, u32::MAX);
        assert_eq!(s.suggested_headers.len(), MAX_SUGGESTED_HEADERS as usize);
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(2500), "2,500");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    proptest! {
        #[test]
        fn recommended_range_is_ordered(
            words in prop::collection::vec(prop_oneof![0u32..20_000, any::<u32>()], 1..8),
            h2 in 0u32..30,
        ) {
            let a: Vec<ContentAnalysis> = words
                .iter()
                .map(|w| analysis(*w, h2, 1, AnalysisStatus::Success))
                .collect();
            match synthesize(&a, "kw", &opts()) {
                Some(s) => {
                    let r = s.recommended_word_count;
                    prop_assert!(r.min <= r.optimal && r.optimal <= r.max);
                    prop_assert!(r.min >= MIN_RECOMMENDED_WORDS);
                    prop_assert!(s.suggested_headers.len() <= MAX_SUGGESTED_HEADERS as usize);
                }
                None => prop_assert!(words.iter().all(|w| *w == 0)),
            }
        }
    }
}
