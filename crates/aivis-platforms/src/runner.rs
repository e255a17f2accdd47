//! Bounded fan-out of prompt × platform queries.
//!
//! Each task runs on its own tokio task so CPU-side work (JSON decoding) can
//! use every runtime thread, while `buffer_unordered` caps how many are in
//! flight at once.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use aivis_core::{ErrorKind, QueryResult, QueryTask, TaskKey};
use futures::stream::{self, StreamExt};
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

use crate::client::ClientMap;
use crate::progress::{ProgressFn, ProgressTracker};

/// Hard upper bound on concurrent in-flight calls.
pub const MAX_WORKERS: usize = 20;

const RUN_DEADLINE_MESSAGE: &str = "run deadline elapsed";

/// Results of one run, in unspecified order.
#[derive(Debug, Default)]
pub struct RunOutput {
    pub results: Vec<QueryResult>,
    /// True when the run deadline cut off outstanding tasks.
    pub partial: bool,
}

impl RunOutput {
    #[must_use]
    pub fn successes(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    #[must_use]
    pub fn failures(&self) -> usize {
        self.results.len() - self.successes()
    }
}

pub struct QueryRunner {
    clients: Arc<ClientMap>,
    call_timeout: Duration,
    run_deadline: Option<Duration>,
}

impl QueryRunner {
    #[must_use]
    pub fn new(clients: ClientMap, call_timeout: Duration) -> Self {
        Self {
            clients: Arc::new(clients),
            call_timeout,
            run_deadline: None,
        }
    }

    /// Bound the whole run. Tasks still outstanding when it elapses are
    /// cancelled and reported as `Timeout` failures.
    #[must_use]
    pub fn with_run_deadline(mut self, deadline: Duration) -> Self {
        self.run_deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn clients(&self) -> &ClientMap {
        &self.clients
    }

    /// Execute every task exactly once with at most `max_workers` in flight.
    ///
    /// `max_workers` is clamped to `1..=MAX_WORKERS`. Exactly one result is
    /// returned per input task; a failing call never affects its siblings.
    pub async fn run(
        &self,
        tasks: Vec<QueryTask>,
        max_workers: usize,
        on_progress: ProgressFn,
    ) -> RunOutput {
        let total = tasks.len();
        if total == 0 {
            return RunOutput::default();
        }

        let workers = max_workers.clamp(1, MAX_WORKERS).min(total);
        let tracker = Arc::new(ProgressTracker::new(total, on_progress));
        let deadline = self
            .run_deadline
            .map(|d| tokio::time::Instant::now() + d);

        let mut pending: HashMap<TaskKey, QueryTask> =
            tasks.iter().map(|t| (t.key(), t.clone())).collect();
        let mut results = Vec::with_capacity(total);
        let mut abort_handles: Vec<AbortHandle> = Vec::with_capacity(total);
        let mut partial = false;

        info!(total, workers, "starting query run");

        {
            let mut in_flight = stream::iter(tasks)
                .map(|task| {
                    let clients = Arc::clone(&self.clients);
                    let tracker = Arc::clone(&tracker);
                    let call_timeout = self.call_timeout;
                    let key = task.key();

                    let handle = tokio::spawn(async move {
                        let result = execute_task(&clients, &task, call_timeout).await;
                        tracker.record(task.platform);
                        result
                    });
                    abort_handles.push(handle.abort_handle());
                    async move { (key, handle.await) }
                })
                .buffer_unordered(workers);

            loop {
                let next = match deadline {
                    Some(at) => {
                        if let Ok(next) = tokio::time::timeout_at(at, in_flight.next()).await {
                            next
                        } else {
                            partial = true;
                            break;
                        }
                    }
                    None => in_flight.next().await,
                };
                let Some((key, joined)) = next else {
                    break;
                };

                let task = pending.remove(&key);
                match (joined, task) {
                    (Ok(result), _) => results.push(result),
                    (Err(e), Some(task)) => {
                        error!(task = %key, error = %e, "query worker did not complete");
                        tracker.record(task.platform);
                        results.push(QueryResult::failure(
                            &task,
                            ErrorKind::Unknown,
                            format!("worker failed: {e}"),
                            0,
                        ));
                    }
                    (Err(e), None) => {
                        error!(task = %key, error = %e, "query worker for duplicate task did not complete");
                    }
                }
            }
        }

        for handle in &abort_handles {
            handle.abort();
        }

        if partial {
            warn!(
                outstanding = pending.len(),
                "run deadline elapsed; cancelling outstanding tasks"
            );
            let mut outstanding: Vec<QueryTask> = pending.into_values().collect();
            outstanding.sort_by_key(QueryTask::key);
            for task in outstanding {
                results.push(QueryResult::failure(
                    &task,
                    ErrorKind::Timeout,
                    RUN_DEADLINE_MESSAGE,
                    0,
                ));
            }
        }

        let output = RunOutput { results, partial };
        info!(
            total,
            succeeded = output.successes(),
            failed = output.failures(),
            partial,
            "query run finished"
        );
        output
    }
}

async fn execute_task(clients: &ClientMap, task: &QueryTask, call_timeout: Duration) -> QueryResult {
    let Some(client) = clients.get(&task.platform) else {
        warn!(task = %task.key(), "no client configured for platform");
        return QueryResult::failure(
            task,
            ErrorKind::Unknown,
            format!("no client configured for {}", task.platform),
            0,
        );
    };

    let started = Instant::now();
    let outcome = tokio::time::timeout(call_timeout, client.send(&task.prompt.text)).await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match outcome {
        Ok(Ok(text)) => {
            debug!(task = %task.key(), latency_ms, "query succeeded");
            QueryResult::success(task, text, latency_ms)
        }
        Ok(Err(e)) => {
            let kind = e.kind();
            warn!(task = %task.key(), %kind, error = %e, "query failed");
            QueryResult::failure(task, kind, e.to_string(), latency_ms)
        }
        Err(_) => {
            warn!(task = %task.key(), timeout = ?call_timeout, "query timed out");
            QueryResult::failure(
                task,
                ErrorKind::Timeout,
                format!("no response within {}s", call_timeout.as_secs_f64()),
                latency_ms,
            )
        }
    }
}
