//! Page profile via DataForSEO `on_page/instant_pages`.

use crate::dataforseo::{as_nonempty_str, as_u32, first_result_items, first_task, task_status, DataForSeoClient};
use seobrief_core::{ContentParser, Error, HeadingCounts, ParsedPage, Result};
use serde_json::Value;

const INSTANT_PAGES: &str = "/v3/on_page/instant_pages";

#[derive(Debug, Clone)]
pub struct DataForSeoContentParser {
    api: DataForSeoClient,
}

impl DataForSeoContentParser {
    pub fn new(api: DataForSeoClient) -> Self {
        Self { api }
    }
}

fn htag_len(htags: Option<&Value>, tag: &str) -> u32 {
    htags
        .and_then(|h| h.get(tag))
        .and_then(Value::as_array)
        .map(|a| u32::try_from(a.len()).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// `None` when the page reports no `htags` at all (as opposed to zero headings).
fn headings_from_meta(meta: &Value) -> Option<HeadingCounts> {
    let htags = meta.get("htags").filter(|h| h.is_object())?;
    let h1 = htag_len(Some(htags), "h1");
    let h2 = htag_len(Some(htags), "h2");
    let h3 = htag_len(Some(htags), "h3");
    let deeper: u32 = ["h4", "h5", "h6"]
        .iter()
        .map(|t| htag_len(Some(htags), t))
        .fold(0u32, u32::saturating_add);
    Some(HeadingCounts {
        h1,
        h2,
        h3,
        total: h1.saturating_add(h2).saturating_add(h3).saturating_add(deeper),
    })
}

pub fn parse_instant_page(url: &str, v: &Value) -> Result<ParsedPage> {
    let Some(item) = first_result_items(v).and_then(|items| items.first()) else {
        let detail = first_task(v)
            .map(task_status)
            .map(|(code, msg)| format!(" (status {code}: {msg})"))
            .unwrap_or_default();
        return Err(Error::Parse(format!("instant_pages returned no page for {url}{detail}")));
    };
    let meta = item.get("meta").cloned().unwrap_or(Value::Null);
    let word_count = meta
        .get("content")
        .and_then(|c| as_u32(c.get("plain_text_word_count")));
    Ok(ParsedPage {
        url: as_nonempty_str(item.get("url")).unwrap_or_else(|| url.to_string()),
        word_count,
        headings: headings_from_meta(&meta),
        title: as_nonempty_str(meta.get("title")),
        meta_description: as_nonempty_str(meta.get("description")),
    })
}

#[async_trait::async_trait]
impl ContentParser for DataForSeoContentParser {
    fn name(&self) -> &'static str {
        "dataforseo_instant_pages"
    }

    async fn parse_page(&self, url: &str) -> Result<ParsedPage> {
        let body = serde_json::json!([{ "url": url }]);
        let v = self.api.post_json(INSTANT_PAGES, &body).await?;
        parse_instant_page(url, &v)
    }
}
