use crate::dataforseo::{
    as_nonempty_str, as_u32, first_result_items, first_task, task_status, DataForSeoClient,
    STATUS_TASK_HANDED, STATUS_TASK_IN_QUEUE,
};
use crate::poll::{poll_until, Attempt, PollOutcome, RetryPolicy};
use seobrief_core::{
    Error, Result, SearchResultItem, SerpFetch, SerpPath, SerpProvider, SerpQuery,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Instant;

const TASK_POST: &str = "/v3/serp/google/organic/task_post";
const TASKS_READY: &str = "/v3/serp/google/organic/tasks_ready";
const TASK_GET: &str = "/v3/serp/google/organic/task_get/regular";
const LIVE: &str = "/v3/serp/google/organic/live/regular";

/// Google organic SERP via DataForSEO: task_post -> tasks_ready -> task_get, then live.
#[derive(Debug, Clone)]
pub struct DataForSeoSerp {
    api: DataForSeoClient,
    ready: RetryPolicy,
    result: RetryPolicy,
}

impl DataForSeoSerp {
    pub fn new(api: DataForSeoClient, ready: RetryPolicy, result: RetryPolicy) -> Self {
        Self { api, ready, result }
    }

    fn task_body(q: &SerpQuery) -> Value {
        serde_json::json!([{
            "keyword": q.keyword,
            "language_code": q.language_code,
            "location_name": q.location_name,
            "device": q.device.as_str(),
            "depth": q.depth,
        }])
    }

    /// Fatal on failure: no silent retry of submissions.
    pub async fn submit_task(&self, q: &SerpQuery) -> Result<String> {
        let v = self
            .api
            .post_json(TASK_POST, &Self::task_body(q))
            .await
            .map_err(|e| Error::Search(format!("task submission failed: {e}")))?;
        let task = first_task(&v).ok_or_else(|| {
            Error::Search("task submission returned no tasks".to_string())
        })?;
        as_nonempty_str(task.get("id")).ok_or_else(|| {
            let (code, msg) = task_status(task);
            Error::Search(format!(
                "task submission returned no task id (status {code}: {msg})"
            ))
        })
    }

    async fn check_ready(&self, task_id: &str) -> Attempt<()> {
        let v = match self.api.get_json(TASKS_READY).await {
            Ok(v) => v,
            Err(e) => return Attempt::Pending(format!("tasks_ready: {e}")),
        };
        if ready_task_ids(&v).iter().any(|id| id == task_id) {
            Attempt::Ready(())
        } else {
            Attempt::Pending(format!("task {task_id} not listed as ready"))
        }
    }

    async fn try_task_get(&self, task_id: &str) -> Attempt<(Vec<SearchResultItem>, Value)> {
        let v = match self.api.get_json(&format!("{TASK_GET}/{task_id}")).await {
            Ok(v) => v,
            Err(e) => return Attempt::Pending(format!("task_get: {e}")),
        };
        let Some(task) = first_task(&v) else {
            return Attempt::Pending("task_get: no tasks in response".to_string());
        };
        let (code, msg) = task_status(task);
        if code == STATUS_TASK_IN_QUEUE || code == STATUS_TASK_HANDED {
            return Attempt::Pending(format!("task_get: {code} {msg}"));
        }
        // A completed task may carry `"items": null` when the SERP has no rows.
        let completed = (20000..30000).contains(&code)
            && task.get("result").is_some_and(Value::is_array);
        match first_result_items(&v) {
            Some(items) => {
                let items = parse_items(items);
                Attempt::Ready((items, v))
            }
            // Provider-side task error: nothing will ever materialize.
            None if code >= 40000 => Attempt::Ready((Vec::new(), v)),
            None if completed => Attempt::Ready((Vec::new(), v)),
            None => Attempt::Pending(format!("task_get: result not materialized ({code})")),
        }
    }

    async fn live(&self, q: &SerpQuery) -> Result<(Vec<SearchResultItem>, Value)> {
        let v = self.api.post_json(LIVE, &Self::task_body(q)).await?;
        let items = first_result_items(&v)
            .map(|items| parse_items(items))
            .unwrap_or_default();
        Ok((items, v))
    }
}

fn ready_task_ids(v: &Value) -> Vec<String> {
    let mut out = Vec::new();
    let Some(tasks) = v.get("tasks").and_then(Value::as_array) else {
        return out;
    };
    for t in tasks {
        let Some(results) = t.get("result").and_then(Value::as_array) else {
            continue;
        };
        for r in results {
            if let Some(id) = as_nonempty_str(r.get("id")) {
                out.push(id);
            }
        }
    }
    out
}

/// Lenient: a malformed row is skipped, a malformed field becomes `None`.
pub fn parse_items(items: &[Value]) -> Vec<SearchResultItem> {
    items
        .iter()
        .filter(|it| it.is_object())
        .map(|it| SearchResultItem {
            item_type: as_nonempty_str(it.get("type")).unwrap_or_else(|| "unknown".to_string()),
            url: as_nonempty_str(it.get("url")),
            title: as_nonempty_str(it.get("title")),
            rank_group: as_u32(it.get("rank_group")),
            rank_absolute: as_u32(it.get("rank_absolute")),
        })
        .collect()
}

fn unavailable_payload(q: &SerpQuery, task_id: &str, notes: &[String], last: Value) -> Value {
    serde_json::json!({
        "provider": "dataforseo",
        "keyword": q.keyword,
        "task_id": task_id,
        "items": [],
        "notes": notes,
        "last_response": last,
    })
}

#[async_trait::async_trait]
impl SerpProvider for DataForSeoSerp {
    fn name(&self) -> &'static str {
        "dataforseo"
    }

    async fn fetch_serp(&self, q: &SerpQuery) -> Result<SerpFetch> {
        let t0 = Instant::now();
        let mut timings_ms = BTreeMap::new();
        let mut notes: Vec<String> = Vec::new();
        let mut last = Value::Null;

        let task_id = self.submit_task(q).await?;
        timings_ms.insert("task_post".to_string(), t0.elapsed().as_millis());
        tracing::info!(task_id = %task_id, keyword = %q.keyword, "serp task submitted");

        let t_ready = Instant::now();
        let ready = poll_until(self.ready, |_| self.check_ready(&task_id)).await;
        timings_ms.insert("tasks_ready".to_string(), t_ready.elapsed().as_millis());

        // The ready list is only a hint; task_get is still tried after a miss.
        notes.extend(ready.timeout_note("tasks_ready"));

        let t_get = Instant::now();
        let result = poll_until(self.result, |_| self.try_task_get(&task_id)).await;
        timings_ms.insert("task_get".to_string(), t_get.elapsed().as_millis());
        let note = result.timeout_note("task_get");
        match result {
            PollOutcome::Ready {
                value: (items, raw),
                attempts,
                ..
            } => {
                if !items.is_empty() {
                    tracing::info!(count = items.len(), attempts, "serp items from async task");
                    timings_ms.insert("total".to_string(), t0.elapsed().as_millis());
                    return Ok(SerpFetch {
                        items,
                        raw,
                        path: SerpPath::Async,
                        notes,
                        timings_ms,
                    });
                }
                notes.push("task_get returned no items".to_string());
                last = raw;
            }
            PollOutcome::TimedOut { .. } => notes.extend(note),
        }

        tracing::warn!(task_id = %task_id, notes = ?notes, "async serp path yielded nothing, trying live");
        let t_live = Instant::now();
        let live = self.live(q).await;
        timings_ms.insert("live".to_string(), t_live.elapsed().as_millis());
        timings_ms.insert("total".to_string(), t0.elapsed().as_millis());

        match live {
            Ok((items, raw)) if !items.is_empty() => {
                tracing::info!(count = items.len(), "serp items from live fallback");
                Ok(SerpFetch {
                    items,
                    raw,
                    path: SerpPath::Live,
                    notes,
                    timings_ms,
                })
            }
            Ok((_, raw)) => {
                notes.push("live request returned no items".to_string());
                tracing::warn!("no serp items from either path");
                Ok(SerpFetch {
                    items: Vec::new(),
                    raw: unavailable_payload(q, &task_id, &notes, raw),
                    path: SerpPath::Unavailable,
                    notes,
                    timings_ms,
                })
            }
            Err(e) => {
                notes.push(format!("live request failed: {e}"));
                tracing::warn!(error = %e, "live serp fallback failed");
                Ok(SerpFetch {
                    items: Vec::new(),
                    raw: unavailable_payload(q, &task_id, &notes, last),
                    path: SerpPath::Unavailable,
                    notes,
                    timings_ms,
                })
            }
        }
    }
}
