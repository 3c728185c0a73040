//! Bounded polling: every wait loop has a hard ceiling.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Cap on a single attempt (clipped to whatever budget remains).
    pub attempt_timeout: Duration,
    /// Cap on the whole loop, sleeps included.
    pub total_budget: Duration,
    /// Fixed sleep between attempts.
    pub backoff: Duration,
}

/// What one attempt produced.
#[derive(Debug)]
pub enum Attempt<T> {
    Ready(T),
    /// Not there yet; the note explains why (kept for diagnostics).
    Pending(String),
}

#[derive(Debug)]
pub enum PollOutcome<T> {
    Ready {
        value: T,
        attempts: u32,
        elapsed: Duration,
    },
    TimedOut {
        attempts: u32,
        elapsed: Duration,
        last_note: Option<String>,
    },
}

impl<T> PollOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Ready { attempts, .. } | PollOutcome::TimedOut { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn into_ready(self) -> Option<T> {
        match self {
            PollOutcome::Ready { value, .. } => Some(value),
            PollOutcome::TimedOut { .. } => None,
        }
    }

    /// Human-readable reason for a timeout; `None` when ready.
    pub fn timeout_note(&self, what: &str) -> Option<String> {
        match self {
            PollOutcome::Ready { .. } => None,
            PollOutcome::TimedOut {
                attempts,
                elapsed,
                last_note,
            } => Some(format!(
                "{what} timed out after {attempts} attempt(s) in {}ms{}",
                elapsed.as_millis(),
                last_note
                    .as_deref()
                    .map(|n| format!(" (last: {n})"))
                    .unwrap_or_default()
            )),
        }
    }
}

/// Run `op` until it reports `Ready` or the budget is spent.
///
/// `op` receives the 1-based attempt number. A zero budget makes no attempt.
pub async fn poll_until<T, F, Fut>(policy: RetryPolicy, mut op: F) -> PollOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let started = Instant::now();
    let mut attempts: u32 = 0;
    let mut last_note: Option<String> = None;

    loop {
        let remaining = policy.total_budget.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return PollOutcome::TimedOut {
                attempts,
                elapsed: started.elapsed(),
                last_note,
            };
        }

        attempts += 1;
        let per_attempt = policy.attempt_timeout.min(remaining);
        match tokio::time::timeout(per_attempt, op(attempts)).await {
            Ok(Attempt::Ready(value)) => {
                return PollOutcome::Ready {
                    value,
                    attempts,
                    elapsed: started.elapsed(),
                }
            }
            Ok(Attempt::Pending(note)) => {
                tracing::debug!(attempt = attempts, note = %note, "poll attempt not ready");
                last_note = Some(note);
            }
            Err(_) => {
                tracing::debug!(attempt = attempts, "poll attempt timed out");
                last_note = Some(format!(
                    "attempt {attempts} timed out after {}ms",
                    per_attempt.as_millis()
                ));
            }
        }

        let remaining = policy.total_budget.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            continue;
        }
        tokio::time::sleep(policy.backoff.min(remaining)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(attempt_ms: u64, budget_ms: u64, backoff_ms: u64) -> RetryPolicy {
        RetryPolicy {
            attempt_timeout: Duration::from_millis(attempt_ms),
            total_budget: Duration::from_millis(budget_ms),
            backoff: Duration::from_millis(backoff_ms),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn returns_value_once_ready() {
        let out = poll_until(policy(1_000, 60_000, 2_000), |n| async move {
            if n < 3 {
                Attempt::Pending(format!("not yet ({n})"))
            } else {
                Attempt::Ready(n * 10)
            }
        })
        .await;
        assert_eq!(out.attempts(), 3);
        assert_eq!(out.into_ready(), Some(30));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_total_budget() {
        let calls = AtomicU32::new(0);
        let out: PollOutcome<()> = poll_until(policy(1_000, 9_000, 2_000), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Attempt::Pending("task in queue".to_string()) }
        })
        .await;
        let note = out.timeout_note("task_get").expect("timed out");
        assert!(note.contains("task_get timed out"), "{note}");
        assert!(note.contains("task in queue"), "{note}");
        // attempts at t=0,2,4,6,8 then the budget is spent
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_attempts_are_cut_by_attempt_timeout() {
        let out: PollOutcome<()> = poll_until(policy(1_000, 3_000, 500), |_| async {
            std::future::pending::<Attempt<()>>().await
        })
        .await;
        let PollOutcome::TimedOut { last_note, .. } = out else {
            panic!("expected timeout");
        };
        assert!(last_note.unwrap().contains("timed out after"));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_budget_makes_no_attempt() {
        let out: PollOutcome<()> =
            poll_until(policy(1_000, 0, 0), |_| async { Attempt::Ready(()) }).await;
        assert_eq!(out.attempts(), 0);
        assert!(out.into_ready().is_none());
    }
}
