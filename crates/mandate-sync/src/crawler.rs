//! ID-space crawler: walks each pattern's identifier space, downloads new
//! documents, and decides what to persist as progress.
//!
//! Patterns are independent and scanned on a bounded pool; within a pattern
//! every probe is sequential because the miss window depends on order.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use mandate_core::Pattern;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cursor::{LocalHitPolicy, Probe, ScanCursor};
use crate::local::DocumentStore;
use crate::oracle::ExistenceOracle;
use crate::state::SyncState;
use crate::{OracleError, SyncError};

/// Tuning knobs for a synchronisation run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Consecutive misses that end a pattern's scan.
    pub max_misses: u32,
    /// Extra attempts after a transient oracle failure.
    pub max_retries: u32,
    /// Base delay between attempts; attempt `n` waits `n * retry_delay`.
    pub retry_delay: Duration,
    /// Patterns scanned concurrently.
    pub concurrency: usize,
    /// Hard wall-clock limit per pattern.
    pub pattern_timeout: Option<Duration>,
    pub local_policy: LocalHitPolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_misses: 3,
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
            concurrency: 4,
            pattern_timeout: Some(Duration::from_secs(600)),
            local_policy: LocalHitPolicy::Reset,
        }
    }
}

/// How a pattern's scan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Reached `max_misses` consecutive misses.
    Completed,
    /// The oracle kept failing at `symbol`; progress up to the last certain
    /// position is committed.
    RetriesExhausted { symbol: String },
    /// A download could not be written; progress up to the last certain
    /// position is committed.
    StorageFailed { symbol: String, reason: String },
    /// Wall-clock limit hit; progress for this run is discarded.
    TimedOut,
    /// The run was cancelled before this pattern started.
    Cancelled,
}

impl ScanOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::RetriesExhausted { .. } => "retries_exhausted",
            Self::StorageFailed { .. } => "storage_failed",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the scan's `highest_found` may be committed.
    pub fn commits(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::RetriesExhausted { .. } | Self::StorageFailed { .. }
        )
    }
}

/// Per-pattern result of a run.
#[derive(Debug, Clone)]
pub struct PatternReport {
    pub pattern: String,
    /// `highest_found` before the run.
    pub previous_highest: i64,
    /// `highest_found` computed by the scan (committed only if the outcome commits).
    pub highest_found: i64,
    pub downloaded: Vec<String>,
    pub skipped_local: usize,
    pub misses: usize,
    pub outcome: ScanOutcome,
    pub elapsed: Duration,
}

impl PatternReport {
    fn untouched(pattern: &Pattern, previous_highest: i64, outcome: ScanOutcome) -> Self {
        Self {
            pattern: pattern.name.clone(),
            previous_highest,
            highest_found: previous_highest,
            downloaded: Vec::new(),
            skipped_local: 0,
            misses: 0,
            outcome,
            elapsed: Duration::ZERO,
        }
    }
}

/// Result of a whole run, in pattern config order.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub patterns: Vec<PatternReport>,
}

impl SyncReport {
    /// All newly downloaded symbols, in pattern then discovery order.
    pub fn downloaded(&self) -> Vec<String> {
        self.patterns
            .iter()
            .flat_map(|p| p.downloaded.iter().cloned())
            .collect()
    }
}

enum Step {
    Probe(Probe),
    Abort(ScanOutcome),
}

/// Discovery synchroniser over an oracle and a local store.
pub struct Crawler<O, S> {
    oracle: O,
    store: S,
    options: SyncOptions,
}

impl<O: ExistenceOracle, S: DocumentStore> Crawler<O, S> {
    pub fn new(oracle: O, store: S, options: SyncOptions) -> Self {
        Self {
            oracle,
            store,
            options,
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Load state, synchronise every pattern, then atomically save the new state.
    pub async fn run(
        &self,
        patterns: &[Pattern],
        state_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let state = SyncState::load(state_path)?;
        let (report, new_state) = self.synchronize(patterns, &state, cancel).await;
        new_state.save(state_path)?;
        Ok(report)
    }

    /// Scan all patterns and compute the next state. Does not touch the state file.
    pub async fn synchronize(
        &self,
        patterns: &[Pattern],
        state: &SyncState,
        cancel: &CancellationToken,
    ) -> (SyncReport, SyncState) {
        let concurrency = self.options.concurrency.max(1);
        let reports: Vec<PatternReport> = futures::stream::iter(patterns)
            .map(|pattern| {
                let previous = state
                    .highest_found(&pattern.name)
                    .unwrap_or(pattern.start - 1);
                async move {
                    if cancel.is_cancelled() {
                        info!(pattern = %pattern.name, "run cancelled, skipping pattern");
                        return PatternReport::untouched(pattern, previous, ScanOutcome::Cancelled);
                    }
                    self.scan_pattern(pattern, previous).await
                }
            })
            .buffered(concurrency)
            .collect()
            .await;

        let mut new_state = state.clone();
        for report in &reports {
            if report.outcome.commits() {
                new_state.advance(&report.pattern, report.highest_found);
            }
        }
        new_state.last_sync = Some(Utc::now());

        (SyncReport { patterns: reports }, new_state)
    }

    /// Scan one pattern starting after `previous_highest`.
    pub async fn scan_pattern(&self, pattern: &Pattern, previous_highest: i64) -> PatternReport {
        let started = Instant::now();
        let deadline = self.options.pattern_timeout.map(|t| started + t);
        let policy = self.options.local_policy;

        let mut cur = ScanCursor::after(previous_highest);
        let mut report = PatternReport::untouched(pattern, previous_highest, ScanOutcome::Completed);
        info!(pattern = %pattern.name, start = cur.cursor, "scanning pattern");

        while !cur.is_exhausted(self.options.max_misses) {
            let symbol = pattern.render(cur.cursor);

            let step = match deadline {
                Some(at) => tokio::time::timeout_at(at, self.probe(&symbol))
                    .await
                    .unwrap_or(Step::Abort(ScanOutcome::TimedOut)),
                None => self.probe(&symbol).await,
            };

            match step {
                Step::Probe(probe) => {
                    match probe {
                        Probe::Local => report.skipped_local += 1,
                        Probe::Found => report.downloaded.push(symbol),
                        Probe::Missing => report.misses += 1,
                    }
                    cur = cur.step(probe, policy);
                    debug!(pattern = %pattern.name, ?probe, misses = cur.misses, "probed");
                }
                Step::Abort(outcome) => {
                    warn!(pattern = %pattern.name, outcome = outcome.as_str(), "scan aborted");
                    report.outcome = outcome;
                    break;
                }
            }
        }

        // The position under the cursor is unresolved on abort, so the last
        // certain point is still `cursor - misses - 1`.
        report.highest_found = if report.outcome.commits() {
            cur.highest_found().max(previous_highest)
        } else {
            previous_highest
        };
        report.elapsed = started.elapsed();

        info!(
            pattern = %pattern.name,
            highest_found = report.highest_found,
            downloaded = report.downloaded.len(),
            skipped_local = report.skipped_local,
            outcome = report.outcome.as_str(),
            "pattern scan finished"
        );
        report
    }

    /// Resolve one position: local, remote (downloading it), or missing.
    async fn probe(&self, symbol: &str) -> Step {
        if self.store.has_local(symbol) {
            return Step::Probe(Probe::Local);
        }

        let exists = match self.with_retries(symbol, || self.oracle.exists(symbol)).await {
            Ok(exists) => exists,
            Err(_) => {
                return Step::Abort(ScanOutcome::RetriesExhausted {
                    symbol: symbol.to_string(),
                });
            }
        };
        if !exists {
            return Step::Probe(Probe::Missing);
        }

        let bytes = match self.with_retries(symbol, || self.oracle.fetch(symbol)).await {
            Ok(bytes) => bytes,
            Err(_) => {
                return Step::Abort(ScanOutcome::RetriesExhausted {
                    symbol: symbol.to_string(),
                });
            }
        };

        match self.store.persist(symbol, &bytes) {
            Ok(path) => {
                info!(symbol, path = %path.display(), size = bytes.len(), "downloaded");
                Step::Probe(Probe::Found)
            }
            Err(e) => Step::Abort(ScanOutcome::StorageFailed {
                symbol: symbol.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Run `op` up to `1 + max_retries` times with linear backoff.
    async fn with_retries<T, F, Fut>(&self, symbol: &str, op: F) -> Result<T, OracleError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, OracleError>>,
    {
        let attempts = self.options.max_retries + 1;
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if attempt < attempts => {
                    warn!(symbol, attempt, error = %e, "transient oracle failure, retrying");
                    tokio::time::sleep(self.options.retry_delay * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(symbol, attempts, error = %e, "oracle retries exhausted");
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalStore;
    use async_trait::async_trait;
    use std::collections::{BTreeMap, HashMap, HashSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// In-memory remote with injectable transient failures.
    #[derive(Default)]
    struct FakeOracle {
        docs: HashMap<String, Vec<u8>>,
        /// symbol → number of failures still to inject on `exists`.
        failures: Mutex<HashMap<String, usize>>,
        /// Delay every `exists` call.
        latency: Option<Duration>,
        exists_calls: AtomicUsize,
    }

    impl FakeOracle {
        fn with_docs(symbols: &[&str]) -> Self {
            Self {
                docs: symbols
                    .iter()
                    .map(|s| (s.to_string(), format!("%PDF {s}").into_bytes()))
                    .collect(),
                ..Default::default()
            }
        }

        fn failing(self, symbol: &str, times: usize) -> Self {
            self.failures
                .lock()
                .unwrap()
                .insert(symbol.to_string(), times);
            self
        }
    }

    #[async_trait]
    impl ExistenceOracle for FakeOracle {
        async fn exists(&self, symbol: &str) -> Result<bool, OracleError> {
            self.exists_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            {
                let mut failures = self.failures.lock().unwrap();
                if let Some(left) = failures.get_mut(symbol)
                    && *left > 0
                {
                    *left -= 1;
                    return Err(OracleError::Server {
                        status: 503,
                        body: "unavailable".into(),
                    });
                }
            }
            Ok(self.docs.contains_key(symbol))
        }

        async fn fetch(&self, symbol: &str) -> Result<Vec<u8>, OracleError> {
            self.docs
                .get(symbol)
                .cloned()
                .ok_or_else(|| OracleError::Malformed {
                    symbol: symbol.into(),
                    reason: "empty body".into(),
                })
        }
    }

    fn plenary(session: i64) -> Pattern {
        Pattern::new(
            "ga_plenary",
            "A/{session}/L.{number}",
            BTreeMap::from([("session".to_string(), session)]),
            1,
        )
        .unwrap()
    }

    fn resolutions(session: i64) -> Pattern {
        Pattern::new(
            "ga_resolutions",
            "A/RES/{session}/{number}",
            BTreeMap::from([("session".to_string(), session)]),
            1,
        )
        .unwrap()
    }

    fn options() -> SyncOptions {
        SyncOptions {
            max_misses: 3,
            max_retries: 2,
            retry_delay: Duration::from_millis(1),
            concurrency: 2,
            pattern_timeout: None,
            local_policy: LocalHitPolicy::Reset,
        }
    }

    fn state_with(pattern: &str, highest: i64) -> SyncState {
        let mut state = SyncState::default();
        state.advance(pattern, highest);
        state
    }

    #[tokio::test]
    async fn downloads_across_short_gap() {
        let tmp = TempDir::new().unwrap();
        let oracle = FakeOracle::with_docs(&["A/80/L.6", "A/80/L.7", "A/80/L.10"]);
        let crawler = Crawler::new(oracle, LocalStore::open(tmp.path()).unwrap(), options());

        let state = state_with("ga_plenary", 5);
        let (report, new_state) = crawler
            .synchronize(&[plenary(80)], &state, &CancellationToken::new())
            .await;

        assert_eq!(report.downloaded(), vec!["A/80/L.6", "A/80/L.7", "A/80/L.10"]);
        assert_eq!(new_state.highest_found("ga_plenary"), Some(10));
        assert_eq!(report.patterns[0].outcome, ScanOutcome::Completed);
        assert!(tmp.path().join("A_80_L.10.pdf").exists());
    }

    #[tokio::test]
    async fn second_run_is_a_noop() {
        let tmp = TempDir::new().unwrap();
        let state_path = tmp.path().join("state.json");
        let oracle = FakeOracle::with_docs(&["A/80/L.1", "A/80/L.2", "A/80/L.4"]);
        let crawler = Crawler::new(
            oracle,
            LocalStore::open(tmp.path().join("pdfs")).unwrap(),
            options(),
        );
        let cancel = CancellationToken::new();

        let first = crawler.run(&[plenary(80)], &state_path, &cancel).await.unwrap();
        assert_eq!(first.downloaded().len(), 3);
        let after_first = SyncState::load(&state_path).unwrap();

        let second = crawler.run(&[plenary(80)], &state_path, &cancel).await.unwrap();
        assert!(second.downloaded().is_empty());
        let after_second = SyncState::load(&state_path).unwrap();
        assert_eq!(after_first.patterns, after_second.patterns);
        assert_eq!(after_second.highest_found("ga_plenary"), Some(4));
    }

    #[tokio::test]
    async fn local_files_are_not_refetched() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::open(tmp.path()).unwrap();
        store.persist("A/80/L.1", b"local").unwrap();
        store.persist("A/80/L.2", b"local").unwrap();

        let oracle = FakeOracle::with_docs(&["A/80/L.1", "A/80/L.2", "A/80/L.3"]);
        let crawler = Crawler::new(oracle, store, options());
        let (report, new_state) = crawler
            .synchronize(&[plenary(80)], &SyncState::default(), &CancellationToken::new())
            .await;

        assert_eq!(report.downloaded(), vec!["A/80/L.3"]);
        assert_eq!(report.patterns[0].skipped_local, 2);
        assert_eq!(new_state.highest_found("ga_plenary"), Some(3));
        // Remote probes for L.3..L.6 only; none for the local files.
        assert_eq!(crawler.oracle.exists_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn fresh_pattern_starts_at_start() {
        let tmp = TempDir::new().unwrap();
        let oracle = FakeOracle::default();
        let crawler = Crawler::new(oracle, LocalStore::open(tmp.path()).unwrap(), options());
        let mut pattern = resolutions(80);
        pattern.start = 100;

        let (report, new_state) = crawler
            .synchronize(&[pattern], &SyncState::default(), &CancellationToken::new())
            .await;
        assert_eq!(report.patterns[0].previous_highest, 99);
        assert_eq!(new_state.highest_found("ga_resolutions"), Some(99));
    }

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let tmp = TempDir::new().unwrap();
        let oracle = FakeOracle::with_docs(&["A/80/L.1"]).failing("A/80/L.1", 2);
        let crawler = Crawler::new(oracle, LocalStore::open(tmp.path()).unwrap(), options());

        let (report, new_state) = crawler
            .synchronize(&[plenary(80)], &SyncState::default(), &CancellationToken::new())
            .await;
        assert_eq!(report.downloaded(), vec!["A/80/L.1"]);
        assert_eq!(report.patterns[0].outcome, ScanOutcome::Completed);
        assert_eq!(new_state.highest_found("ga_plenary"), Some(1));
    }

    #[tokio::test]
    async fn exhausted_retries_end_scan_without_speculation() {
        let tmp = TempDir::new().unwrap();
        // L.2 exists remotely but the oracle fails on L.3 beyond the retry budget.
        let oracle = FakeOracle::with_docs(&["A/80/L.1", "A/80/L.2", "A/80/L.4"])
            .failing("A/80/L.3", 10);
        let crawler = Crawler::new(oracle, LocalStore::open(tmp.path()).unwrap(), options());

        let (report, new_state) = crawler
            .synchronize(&[plenary(80)], &SyncState::default(), &CancellationToken::new())
            .await;
        let pattern = &report.patterns[0];
        assert_eq!(
            pattern.outcome,
            ScanOutcome::RetriesExhausted {
                symbol: "A/80/L.3".into()
            }
        );
        assert_eq!(pattern.downloaded, vec!["A/80/L.1", "A/80/L.2"]);
        // Never past the last certain position, and L.3 is never counted as a miss.
        assert_eq!(pattern.misses, 0);
        assert_eq!(new_state.highest_found("ga_plenary"), Some(2));
    }

    #[tokio::test]
    async fn exhausted_retries_after_misses_back_off() {
        let tmp = TempDir::new().unwrap();
        let oracle = FakeOracle::with_docs(&["A/80/L.1"]).failing("A/80/L.3", 10);
        let crawler = Crawler::new(oracle, LocalStore::open(tmp.path()).unwrap(), options());

        let (_, new_state) = crawler
            .synchronize(&[plenary(80)], &SyncState::default(), &CancellationToken::new())
            .await;
        // L.2 missed, L.3 uncertain: last certain presence is L.1.
        assert_eq!(new_state.highest_found("ga_plenary"), Some(1));
    }

    /// Local store that refuses to write one symbol.
    struct FullDisk {
        inner: LocalStore,
        refuse: &'static str,
    }

    impl DocumentStore for FullDisk {
        fn has_local(&self, symbol: &str) -> bool {
            self.inner.has_local(symbol)
        }

        fn persist(&self, symbol: &str, bytes: &[u8]) -> Result<std::path::PathBuf, SyncError> {
            if symbol == self.refuse {
                return Err(SyncError::Io {
                    path: self.inner.path_for(symbol),
                    source: std::io::Error::other("no space left on device"),
                });
            }
            self.inner.persist(symbol, bytes)
        }
    }

    #[tokio::test]
    async fn failed_write_commits_last_certain_position() {
        let tmp = TempDir::new().unwrap();
        let oracle = FakeOracle::with_docs(&["A/80/L.1", "A/80/L.2", "A/80/L.3", "A/80/L.4"]);
        let store = FullDisk {
            inner: LocalStore::open(tmp.path()).unwrap(),
            refuse: "A/80/L.3",
        };
        let crawler = Crawler::new(oracle, store, options());

        let (report, new_state) = crawler
            .synchronize(&[plenary(80)], &SyncState::default(), &CancellationToken::new())
            .await;
        let pattern = &report.patterns[0];
        match &pattern.outcome {
            ScanOutcome::StorageFailed { symbol, reason } => {
                assert_eq!(symbol, "A/80/L.3");
                assert!(reason.contains("no space left"), "{reason}");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(pattern.outcome.commits());
        assert_eq!(pattern.downloaded, vec!["A/80/L.1", "A/80/L.2"]);
        assert_eq!(pattern.highest_found, 2);
        assert_eq!(new_state.highest_found("ga_plenary"), Some(2));
        assert!(!tmp.path().join("A_80_L.3.pdf").exists());
    }

    #[tokio::test]
    async fn timeout_discards_progress() {
        let tmp = TempDir::new().unwrap();
        let oracle = FakeOracle {
            latency: Some(Duration::from_millis(200)),
            ..FakeOracle::with_docs(&["A/80/L.6"])
        };
        let crawler = Crawler::new(
            oracle,
            LocalStore::open(tmp.path()).unwrap(),
            SyncOptions {
                pattern_timeout: Some(Duration::from_millis(50)),
                ..options()
            },
        );

        let state = state_with("ga_plenary", 5);
        let (report, new_state) = crawler
            .synchronize(&[plenary(80)], &state, &CancellationToken::new())
            .await;
        assert_eq!(report.patterns[0].outcome, ScanOutcome::TimedOut);
        assert_eq!(new_state.highest_found("ga_plenary"), Some(5));
    }

    #[tokio::test]
    async fn cancelled_run_leaves_state_untouched() {
        let tmp = TempDir::new().unwrap();
        let oracle = FakeOracle::with_docs(&["A/80/L.1"]);
        let crawler = Crawler::new(oracle, LocalStore::open(tmp.path()).unwrap(), options());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (report, new_state) = crawler
            .synchronize(&[plenary(80)], &SyncState::default(), &cancel)
            .await;
        assert_eq!(report.patterns[0].outcome, ScanOutcome::Cancelled);
        assert!(report.downloaded().is_empty());
        assert_eq!(new_state.highest_found("ga_plenary"), None);
    }

    #[tokio::test]
    async fn patterns_are_independent_and_ordered() {
        let tmp = TempDir::new().unwrap();
        let oracle = FakeOracle::with_docs(&["A/80/L.1", "A/RES/80/1", "A/RES/80/2"]);
        let crawler = Crawler::new(oracle, LocalStore::open(tmp.path()).unwrap(), options());

        let (report, new_state) = crawler
            .synchronize(
                &[plenary(80), resolutions(80)],
                &SyncState::default(),
                &CancellationToken::new(),
            )
            .await;
        let names: Vec<_> = report.patterns.iter().map(|p| p.pattern.as_str()).collect();
        assert_eq!(names, vec!["ga_plenary", "ga_resolutions"]);
        assert_eq!(new_state.highest_found("ga_plenary"), Some(1));
        assert_eq!(new_state.highest_found("ga_resolutions"), Some(2));
        let all: HashSet<_> = report.downloaded().into_iter().collect();
        assert_eq!(all.len(), 3);
        assert!(new_state.last_sync.is_some());
    }

    #[tokio::test]
    async fn highest_found_is_monotonic() {
        let tmp = TempDir::new().unwrap();
        // Remote lost everything; state must not regress.
        let crawler = Crawler::new(
            FakeOracle::default(),
            LocalStore::open(tmp.path()).unwrap(),
            options(),
        );
        let state = state_with("ga_plenary", 40);
        let (_, new_state) = crawler
            .synchronize(&[plenary(80)], &state, &CancellationToken::new())
            .await;
        assert_eq!(new_state.highest_found("ga_plenary"), Some(40));
    }
}
