//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use nekokai::{
    AnilistEntry, CacheConfig, Domain, EntryStore, MediaSource, MediaTitle, MemoryStore,
    NekokaiError, Provider, Result, ResultCache, SearchOrchestrator, telemetry,
};

// ============================================================================
// Mock upstreams
// ============================================================================

struct MockSource;

#[async_trait]
impl MediaSource for MockSource {
    type Entry = AnilistEntry;

    fn provider(&self) -> Provider {
        Provider::AniList
    }

    async fn fetch_search(&self, _domain: Domain, query: &str, _limit: usize) -> Result<Vec<AnilistEntry>> {
        Ok(vec![entry(1, query)])
    }

    async fn fetch_trending(&self, _domain: Domain, _limit: usize) -> Result<Vec<AnilistEntry>> {
        Ok(vec![entry(2, "Trending")])
    }
}

struct FailingSource;

#[async_trait]
impl MediaSource for FailingSource {
    type Entry = AnilistEntry;

    fn provider(&self) -> Provider {
        Provider::AniList
    }

    async fn fetch_search(&self, _domain: Domain, _query: &str, _limit: usize) -> Result<Vec<AnilistEntry>> {
        Err(NekokaiError::Api {
            status: 500,
            message: "boom".into(),
        })
    }

    async fn fetch_trending(&self, _domain: Domain, _limit: usize) -> Result<Vec<AnilistEntry>> {
        Err(NekokaiError::Http("connection reset".into()))
    }
}

fn entry(id: u64, english: &str) -> AnilistEntry {
    AnilistEntry {
        id,
        title: MediaTitle {
            romaji: None,
            english: Some(english.to_string()),
            native: None,
        },
        description: None,
        is_adult: None,
        country_of_origin: None,
        duration: None,
        episodes: None,
        chapters: None,
        volumes: None,
        site_url: None,
        external_links: None,
    }
}

fn orchestrator<S: MediaSource<Entry = AnilistEntry>>(source: S) -> SearchOrchestrator<S> {
    let store: Arc<dyn EntryStore> = Arc::new(MemoryStore::new(Duration::from_secs(30)));
    SearchOrchestrator::new(source, ResultCache::new(store, CacheConfig::default()))
}

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum counter values matching a metric name and one label pair.
fn counter_with_label(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Check if any histogram entries exist for a given metric name.
fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn cold_then_warm_search_records_miss_then_hit() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let search = orchestrator(MockSource);
                assert_eq!(search.search(Domain::Anime, "bebop").await.len(), 1);
                assert_eq!(search.search(Domain::Anime, "bebop").await.len(), 1);
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_with_label(&snapshot, telemetry::CACHE_MISSES_TOTAL, "tier", "search"),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::CACHE_HITS_TOTAL, "tier", "search"),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::UPSTREAM_REQUESTS_TOTAL, "status", "ok"),
        1,
        "warm search must not reach upstream"
    );
    assert!(
        has_histogram(&snapshot, telemetry::UPSTREAM_DURATION_SECONDS),
        "expected a duration histogram entry"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn failed_fetch_records_error_status() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let search = orchestrator(FailingSource);
                assert!(search.search(Domain::Anime, "bebop").await.is_empty());
                assert!(search.search(Domain::Manga, "").await.is_empty());
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_with_label(&snapshot, telemetry::UPSTREAM_REQUESTS_TOTAL, "status", "error"),
        2
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::UPSTREAM_REQUESTS_TOTAL, "provider", "anilist"),
        2
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn get_single_records_result_and_selection_tiers() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let search = orchestrator(MockSource);
                let choices = search.autocomplete(Domain::Anime, "bebop").await;
                assert_eq!(choices.len(), 1);

                // Selection hit.
                assert!(search.get_single(Domain::Anime, &choices[0].value).await.is_some());
                // Result-entry hit by display name.
                assert!(search.get_single(Domain::Anime, "BEBOP").await.is_some());
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_with_label(&snapshot, telemetry::CACHE_HITS_TOTAL, "tier", "selection"),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::CACHE_HITS_TOTAL, "tier", "result"),
        1
    );
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let search = orchestrator(MockSource);
    let _entries = search.try_search(Domain::Anime, "bebop").await.unwrap();
}
