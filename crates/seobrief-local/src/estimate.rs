//! URL-shape heuristics used when a page cannot be measured.
//!
//! These are priors, not measurements: callers must tag them `fallback_estimate`.

use seobrief_core::{AnalysisStatus, ContentAnalysis, HeadingCounts};
use std::ops::RangeInclusive;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageClass {
    /// Universities and other academic hosts.
    Educational,
    /// Blog posts, articles, news.
    Editorial,
    /// Course / program / degree pages.
    Program,
    /// Everything else (home pages, product and landing pages).
    Commercial,
}

impl PageClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageClass::Educational => "educational",
            PageClass::Editorial => "editorial",
            PageClass::Program => "program",
            PageClass::Commercial => "commercial",
        }
    }

    fn profile(&self) -> Profile {
        match self {
            PageClass::Educational => Profile {
                words: 2800..=3600,
                h2: 9..=12,
                h3: 12..=18,
            },
            PageClass::Editorial => Profile {
                words: 1800..=2600,
                h2: 7..=10,
                h3: 6..=12,
            },
            PageClass::Program => Profile {
                words: 1200..=1800,
                h2: 5..=8,
                h3: 4..=8,
            },
            PageClass::Commercial => Profile {
                words: 600..=1100,
                h2: 3..=6,
                h3: 2..=5,
            },
        }
    }
}

struct Profile {
    words: RangeInclusive<u32>,
    h2: RangeInclusive<u32>,
    h3: RangeInclusive<u32>,
}

const EDU_HOST_MARKERS: &[&str] = &[".edu", ".ac.", "universidad", "university", "univ"];
const EDITORIAL_PATH_MARKERS: &[&str] = &["/blog", "/article", "/articulo", "/news", "/noticia", "/post"];
const PROGRAM_PATH_MARKERS: &[&str] = &[
    "/program", "/programa", "/course", "/curso", "/carrera", "/degree", "/maestria",
];

pub fn classify(url: &Url) -> PageClass {
    let host = url.host_str().unwrap_or("").to_ascii_lowercase();
    let path = url.path().to_ascii_lowercase();
    if EDU_HOST_MARKERS.iter().any(|m| host.contains(m)) {
        return PageClass::Educational;
    }
    if PROGRAM_PATH_MARKERS.iter().any(|m| path.contains(m)) {
        return PageClass::Program;
    }
    if EDITORIAL_PATH_MARKERS.iter().any(|m| path.contains(m)) || host.starts_with("blog.") {
        return PageClass::Editorial;
    }
    PageClass::Commercial
}

/// FNV-1a; stable across runs (unlike `HashMap`'s `RandomState`).
fn stable_hash64(parts: &[&str]) -> u64 {
    let mut h: u64 = 1469598103934665603;
    for p in parts {
        for b in p.as_bytes() {
            h ^= *b as u64;
            h = h.wrapping_mul(1099511628211);
        }
        h ^= 0xff;
        h = h.wrapping_mul(1099511628211);
    }
    h
}

fn pick(range: &RangeInclusive<u32>, url: &str, salt: &str) -> u32 {
    let span = u64::from(range.end() - range.start()) + 1;
    let off = stable_hash64(&[url, salt]) % span;
    range.start() + off as u32
}

/// Deterministic estimate for `url`; `cause` records why measurement was skipped.
pub fn estimate(url: &Url, cause: &str) -> ContentAnalysis {
    let class = classify(url);
    let p = class.profile();
    let key = url.as_str();
    let words = pick(&p.words, key, "words");
    let h2 = pick(&p.h2, key, "h2");
    let h3 = pick(&p.h3, key, "h3");
    let headings = HeadingCounts {
        h1: 1,
        h2,
        h3,
        total: 1 + h2 + h3,
    };
    ContentAnalysis::new(
        key,
        AnalysisStatus::FallbackEstimate,
        &format!("heuristic estimate ({} profile): {cause}", class.as_str()),
    )
    .with_metrics(words, headings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn u(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn classifies_by_host_and_path() {
        assert_eq!(classify(&u("https://www.pucp.edu.pe/x")), PageClass::Educational);
        assert_eq!(classify(&u("https://site.com/blog/seo-tips")), PageClass::Editorial);
        assert_eq!(classify(&u("https://site.com/cursos/marketing")), PageClass::Program);
        assert_eq!(classify(&u("https://shop.com/")), PageClass::Commercial);
    }

    #[test]
    fn estimate_is_deterministic_and_tagged() {
        let a = estimate(&u("https://site.com/blog/a"), "no credentials");
        let b = estimate(&u("https://site.com/blog/a"), "no credentials");
        assert_eq!(a, b);
        assert_eq!(a.status, AnalysisStatus::FallbackEstimate);
        assert!(a.diagnostic.contains("editorial"), "{}", a.diagnostic);
        assert!(a.diagnostic.contains("no credentials"));
        assert_eq!(a.headings.total, 1 + a.headings.h2 + a.headings.h3);
    }

    proptest! {
        #[test]
        fn estimates_stay_inside_the_class_profile(path in "[a-z/]{0,30}", host in "[a-z]{1,12}") {
            let url = u(&format!("https://{host}.com/{path}"));
            let a = estimate(&url, "test");
            let p = classify(&url).profile();
            prop_assert!(p.words.contains(&a.word_count));
            prop_assert!(p.h2.contains(&a.headings.h2));
            prop_assert!(p.h3.contains(&a.headings.h3));
        }
    }
}
