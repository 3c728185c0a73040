//! Public facade crate for `seobrief`.
//!
//! This crate contains no IO or provider-specific logic.
//! It re-exports the backend-agnostic types/traits from `seobrief-core`.

pub use seobrief_core::*;

#[cfg(test)]
mod tests {
    #[test]
    fn facade_exposes_core_pipeline_stages() {
        let n = crate::normalize(&[crate::SearchResultItem::organic("a.com", 1)], 3, 5);
        assert_eq!(n.competitors.len(), 1);
        assert!(crate::synthesize(&[], "kw", &crate::StrategyOptions::new("", 2026)).is_none());
    }
}
