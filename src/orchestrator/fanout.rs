//! Concurrent fan-out to source adapters with two time boundaries.
//!
//! Every adapter configured for the query's country is invoked in its own
//! spawned task, independently time-boxed by the per-source timeout. The
//! collection loop additionally enforces an overall deadline: tasks still
//! outstanding when it fires are reported as timeouts and abandoned. The
//! detached tasks may run to completion, but their results are dropped and
//! can never leak into a later query, since each call owns its own join
//! handles.
//!
//! Failure isolation is the key contract here: one broken, slow or
//! panicking source contributes zero offers and a tagged report, nothing
//! more. No retries; resilience beyond a single attempt belongs to the
//! caller re-issuing the query.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::adapter::SourceAdapter;
use crate::error::AdapterError;
use crate::http;
use crate::types::{Query, RawOffer, SourceErrorKind, SourceReport, SourceStatus};

/// Fan a query out to all adapters and collect whatever arrived in time.
///
/// Returns the union of all successfully fetched raw offers plus one
/// [`SourceReport`] per adapter. Reports are in adapter order, so output is
/// stable for observability.
pub async fn fan_out(
    query: &Query,
    adapters: &[Arc<dyn SourceAdapter>],
    per_source_timeout: Duration,
    overall_deadline: Duration,
    request_delay_ms: (u64, u64),
) -> (Vec<RawOffer>, Vec<SourceReport>) {
    let deadline = Instant::now() + overall_deadline;

    let handles: Vec<_> = adapters
        .iter()
        .map(|adapter| {
            let adapter = Arc::clone(adapter);
            let query = query.clone();
            let source = adapter.source();
            let handle = tokio::spawn(async move {
                http::request_jitter(request_delay_ms).await;
                tokio::time::timeout(per_source_timeout, adapter.fetch(&query)).await
            });
            (source, handle)
        })
        .collect();

    let mut offers: Vec<RawOffer> = Vec::new();
    let mut reports: Vec<SourceReport> = Vec::with_capacity(handles.len());

    for (source, handle) in handles {
        let status = match tokio::time::timeout_at(deadline, handle).await {
            // Outstanding at the deadline: abandon, never await further.
            Err(_) => {
                tracing::warn!(%source, "source abandoned at overall deadline");
                SourceStatus::Failed(SourceErrorKind::Timeout)
            }
            // The task panicked; isolate it like any other failure.
            Ok(Err(join_err)) => {
                tracing::warn!(%source, error = %join_err, "source task panicked");
                SourceStatus::Failed(SourceErrorKind::Panic)
            }
            // Per-source time box exceeded.
            Ok(Ok(Err(_elapsed))) => {
                tracing::warn!(%source, "source timed out");
                SourceStatus::Failed(SourceErrorKind::Timeout)
            }
            Ok(Ok(Ok(Err(err)))) => {
                tracing::warn!(%source, error = %err, "source fetch failed");
                SourceStatus::Failed(match err {
                    AdapterError::Network(_) => SourceErrorKind::Network,
                    AdapterError::Parse(_) => SourceErrorKind::Parse,
                })
            }
            Ok(Ok(Ok(Ok(fetched)))) => {
                if fetched.is_empty() {
                    tracing::debug!(%source, "source returned no offers");
                    SourceStatus::Failed(SourceErrorKind::Empty)
                } else {
                    tracing::debug!(%source, count = fetched.len(), "source returned offers");
                    let count = fetched.len();
                    offers.extend(fetched);
                    SourceStatus::Fetched(count)
                }
            }
        };
        reports.push(SourceReport { source, status });
    }

    (offers, reports)
}
