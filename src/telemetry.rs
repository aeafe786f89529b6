//! Telemetry metric name constants.
//!
//! Centralised metric names for nekokai operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `nekokai_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider` — upstream name ("anilist" | "kitsu")
//! - `tier` — cache tier: "search", "result" or "selection"
//! - `status` — outcome: "ok" or "error"
//! - `backend` — entry store backend: "memory" or "redis"

/// Total upstream requests issued by the orchestrator.
///
/// Labels: `provider`, `status` ("ok" | "error").
pub const UPSTREAM_REQUESTS_TOTAL: &str = "nekokai_upstream_requests_total";

/// Upstream request duration in seconds, including timeouts.
///
/// Labels: `provider`.
pub const UPSTREAM_DURATION_SECONDS: &str = "nekokai_upstream_duration_seconds";

/// Total cache hits.
///
/// Labels: `tier`.
pub const CACHE_HITS_TOTAL: &str = "nekokai_cache_hits_total";

/// Total cache misses. A search list whose members have gaps counts as a miss.
///
/// Labels: `tier`.
pub const CACHE_MISSES_TOTAL: &str = "nekokai_cache_misses_total";

/// Total backend errors absorbed by an entry store (treated as misses).
///
/// Labels: `backend`, `operation`.
pub const STORE_ERRORS_TOTAL: &str = "nekokai_store_errors_total";

/// Total entries removed by the in-process sweep timer.
pub const SWEPT_ENTRIES_TOTAL: &str = "nekokai_swept_entries_total";
