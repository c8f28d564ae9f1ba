// src/pipeline/poll.rs

//! The poll loop.
//!
//! Each cycle lists the upstream pastes, fetches and matches every key not
//! seen within the retention window, one at a time with a fixed pause after
//! every fetch, and finally sweeps expired keys from the dedup cache.
//!
//! The termination flag is checked before each cycle and before each item,
//! so an in-flight item completes but nothing new is started.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;

use crate::error::{AppError, OperationalError, Result, Stage};
use crate::models::{MatchedPaste, Paste, ScraperConfig};
use crate::pipeline::dedup::DedupCache;
use crate::pipeline::shutdown::Shutdown;
use crate::services::{KeywordMatcher, PasteSource};

/// Source of wall-clock time for dedup bookkeeping.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Counters for one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub listed: usize,
    pub skipped: usize,
    pub fetched: usize,
    pub matched: usize,
    pub failed: usize,
    pub expired: usize,
}

/// Drives polling, fetching, matching and dedup.
pub struct Poller {
    source: Arc<dyn PasteSource>,
    matcher: Arc<KeywordMatcher>,
    cache: DedupCache,
    output: UnboundedSender<MatchedPaste>,
    errors: UnboundedSender<OperationalError>,
    shutdown: Shutdown,
    poll_interval: Duration,
    item_delay: Duration,
    last_cycle: Option<Instant>,
    clock: Clock,
}

impl Poller {
    pub fn new(
        config: &ScraperConfig,
        source: Arc<dyn PasteSource>,
        matcher: Arc<KeywordMatcher>,
        output: UnboundedSender<MatchedPaste>,
        errors: UnboundedSender<OperationalError>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            source,
            matcher,
            cache: DedupCache::new(config.retention()),
            output,
            errors,
            shutdown,
            poll_interval: config.poll_interval(),
            item_delay: config.item_delay(),
            last_cycle: None,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock used for dedup timestamps.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Run until shutdown is triggered. Returns the number of completed cycles.
    ///
    /// Consumes the poller so both route senders are dropped on return.
    pub async fn run(mut self) -> u64 {
        let mut cycles = 0;

        loop {
            if self.shutdown.is_terminated() {
                break;
            }

            self.wait_for_next_cycle().await;
            if self.shutdown.is_terminated() {
                break;
            }

            self.last_cycle = Some(Instant::now());
            let report = self.run_cycle().await;
            cycles += 1;

            log::debug!(
                "Cycle {cycles}: listed={} skipped={} fetched={} matched={} failed={} expired={}",
                report.listed,
                report.skipped,
                report.fetched,
                report.matched,
                report.failed,
                report.expired
            );
        }

        log::info!("Poll loop stopped after {cycles} cycles");
        cycles
    }

    /// Sleep out the rest of the poll interval, waking early on cancellation.
    async fn wait_for_next_cycle(&self) {
        let Some(last) = self.last_cycle else {
            return;
        };

        // an interval too large to represent means: idle until shutdown
        let Some(next) = last.checked_add(self.poll_interval) else {
            log::debug!("Poll interval {:?} is unbounded, idling", self.poll_interval);
            self.shutdown.token().cancelled().await;
            return;
        };

        let now = Instant::now();
        if next <= now {
            return;
        }

        log::debug!("Sleeping for {:?}", next - now);
        tokio::select! {
            _ = tokio::time::sleep_until(next) => {}
            _ = self.shutdown.token().cancelled() => {}
        }
    }

    /// One Listing, Processing and Expiring pass.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        let pastes = match self.source.list_items(self.shutdown.token()).await {
            Ok(pastes) => pastes,
            Err(e) => {
                self.report_error(Stage::ListFetch, e);
                Vec::new()
            }
        };
        report.listed = pastes.len();

        for paste in pastes {
            if self.shutdown.is_terminated() {
                break;
            }

            if self.cache.seen(&paste.key) {
                log::debug!("Skipping key {} as it was already checked", paste.key);
                report.skipped += 1;
                continue;
            }

            report.fetched += 1;
            match self.process(&paste).await {
                Ok(Some(matched)) => {
                    report.matched += 1;
                    self.forward(matched);
                }
                Ok(None) => {}
                Err(e) => {
                    report.failed += 1;
                    self.report_error(Stage::ItemFetch, e);
                }
            }
            self.cache.mark_seen(&paste.key, (self.clock)());

            // upstream rate limit; applies after failures too
            tokio::time::sleep(self.item_delay).await;
        }

        report.expired = self.cache.expire((self.clock)());
        report
    }

    /// Fetch one paste and evaluate it.
    async fn process(&self, paste: &Paste) -> Result<Option<MatchedPaste>> {
        let body = self
            .source
            .fetch_body(paste, self.shutdown.token())
            .await?;

        let (matched, hits) = self.matcher.evaluate(&body);
        if !matched {
            return Ok(None);
        }

        Ok(Some(MatchedPaste {
            paste: paste.clone(),
            body,
            hits,
        }))
    }

    fn forward(&self, matched: MatchedPaste) {
        if let Err(e) = self.output.send(matched) {
            log::warn!("Output route closed, dropping match for {}", e.0.paste.key);
        }
    }

    fn report_error(&self, stage: Stage, error: AppError) {
        let error = OperationalError::new(stage, error);
        if let Err(e) = self.errors.send(error) {
            log::error!("Error route closed: {}", e.0);
        }
    }

    pub fn cache(&self) -> &DedupCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::TimeDelta;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    use super::*;
    use crate::models::KeywordConfig;
    use crate::test_utils::FakeSource;

    struct Harness {
        poller: Poller,
        source: Arc<FakeSource>,
        output: UnboundedReceiver<MatchedPaste>,
        errors: UnboundedReceiver<OperationalError>,
        now: Arc<Mutex<DateTime<Utc>>>,
        shutdown: Shutdown,
    }

    impl Harness {
        fn advance(&self, delta: TimeDelta) {
            let mut now = self.now.lock().unwrap();
            *now += delta;
        }
    }

    fn harness(source: FakeSource, item_delay_ms: u64) -> Harness {
        let config = ScraperConfig {
            item_delay_ms,
            ..ScraperConfig::default()
        };
        harness_with(source, &config)
    }

    fn harness_with(source: FakeSource, config: &ScraperConfig) -> Harness {
        let matcher = KeywordMatcher::compile(&[KeywordConfig {
            keyword: "password".into(),
            exceptions: vec!["testpassword".into()],
        }])
        .unwrap();

        let source = Arc::new(source);
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (err_tx, err_rx) = mpsc::unbounded_channel();
        let shutdown = Shutdown::new();
        let now = Arc::new(Mutex::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let clock_now = Arc::clone(&now);

        let poller = Poller::new(
            config,
            source.clone(),
            Arc::new(matcher),
            out_tx,
            err_tx,
            shutdown.clone(),
        )
        .with_clock(Arc::new(move || *clock_now.lock().unwrap()));

        Harness {
            poller,
            source,
            output: out_rx,
            errors: err_rx,
            now,
            shutdown,
        }
    }

    #[tokio::test]
    async fn test_match_forwarded_to_output_route() {
        let source = FakeSource::new(&[
            ("a", "password: hunter2\n"),
            ("b", "user: admin\npassword: testpassword123\n"),
        ]);
        source.push_list(&["a", "b"]);
        let mut h = harness(source, 0);

        let report = h.poller.run_cycle().await;
        assert_eq!(report.listed, 2);
        assert_eq!(report.fetched, 2);
        assert_eq!(report.matched, 1);

        let matched = h.output.try_recv().unwrap();
        assert_eq!(matched.paste.key, "a");
        assert_eq!(matched.body, "password: hunter2\n");
        assert_eq!(matched.hits["password"], "password: hunter2");
        assert!(h.output.try_recv().is_err());
        assert!(h.errors.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_second_cycle_skips_seen_key() {
        let source = FakeSource::new(&[("a", "nothing here")]);
        source.push_list(&["a"]);
        source.push_list(&["a"]);
        let mut h = harness(source, 0);

        h.poller.run_cycle().await;
        h.advance(TimeDelta::minutes(1));
        let report = h.poller.run_cycle().await;

        assert_eq!(report.skipped, 1);
        assert_eq!(report.fetched, 0);
        assert_eq!(h.source.fetched(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_key_reprocessed_after_retention() {
        let source = FakeSource::new(&[("a", "nothing here")]);
        source.push_list(&["a"]);
        source.push_list(&["a"]);
        let mut h = harness(source, 0);

        h.poller.run_cycle().await;
        h.advance(TimeDelta::minutes(10) + TimeDelta::seconds(1));
        // this pass expires "a"
        let report = h.poller.run_cycle().await;
        assert_eq!(report.skipped, 1);
        assert_eq!(report.expired, 1);

        h.source.push_list(&["a"]);
        let report = h.poller.run_cycle().await;
        assert_eq!(report.fetched, 1);
        assert_eq!(h.source.fetched(), vec!["a", "a"]);
    }

    #[tokio::test]
    async fn test_list_failure_still_expires() {
        let source = FakeSource::new(&[("a", "nothing here")]);
        source.push_list(&["a"]);
        source.push_failure();
        let mut h = harness(source, 0);

        h.poller.run_cycle().await;
        assert_eq!(h.poller.cache().len(), 1);

        h.advance(TimeDelta::minutes(11));
        let report = h.poller.run_cycle().await;
        assert_eq!(report.listed, 0);
        assert_eq!(report.expired, 1);
        assert!(h.poller.cache().is_empty());

        let error = h.errors.try_recv().unwrap();
        assert_eq!(error.stage, Stage::ListFetch);
    }

    #[tokio::test]
    async fn test_fetch_failure_reported_and_marked() {
        let source = FakeSource::new(&[("b", "password: x")]);
        source.push_list(&["missing", "b"]);
        let mut h = harness(source, 0);

        let report = h.poller.run_cycle().await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.matched, 1);
        assert!(h.poller.cache().seen("missing"));

        let error = h.errors.try_recv().unwrap();
        assert_eq!(error.stage, Stage::ItemFetch);
        assert!(error.message.contains("404"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_after_each_fetch_but_not_skips() {
        let source = FakeSource::new(&[("a", "x"), ("c", "y")]);
        source.push_list(&["a", "a", "missing", "c"]);
        let mut h = harness(source, 1000);

        let start = Instant::now();
        let report = h.poller.run_cycle().await;

        assert_eq!(report.fetched, 3);
        assert_eq!(report.skipped, 1);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(4), "{elapsed:?}");
    }

    #[tokio::test]
    async fn test_terminated_poller_fetches_nothing() {
        let source = FakeSource::new(&[("a", "password: x")]);
        source.push_list(&["a"]);
        let mut h = harness(source, 0);

        h.shutdown.trigger();
        let report = h.poller.run_cycle().await;
        assert_eq!(report.listed, 1);
        assert_eq!(report.fetched, 0);
        assert!(h.source.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_run_exits_immediately_when_terminated() {
        let h = harness(FakeSource::default(), 0);
        h.shutdown.trigger();
        assert_eq!(h.poller.run().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_wait_ends_on_shutdown() {
        let source = FakeSource::new(&[]);
        source.push_list(&[]);
        let h = harness(source, 0);
        let shutdown = h.shutdown.clone();

        let run = tokio::spawn(h.poller.run());
        tokio::time::sleep(Duration::from_secs(5)).await;
        shutdown.trigger();

        assert_eq!(run.await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_poll_interval_idles_until_shutdown() {
        let source = FakeSource::new(&[]);
        source.push_list(&[]);
        let config = ScraperConfig {
            poll_interval_secs: u64::MAX,
            item_delay_ms: 0,
            ..ScraperConfig::default()
        };
        let h = harness_with(source, &config);
        let shutdown = h.shutdown.clone();

        let run = tokio::spawn(h.poller.run());
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(!run.is_finished());

        shutdown.trigger();
        assert_eq!(run.await.unwrap(), 1);
    }
}
