//! Resolution Bot Use Case - Oracle Polling and Idempotent Settlement
//!
//! Long-running loop that polls the oracle for outcome determinations
//! on every tracked market, maps outcome labels to settlement values,
//! and submits each settlement at most once — across process restarts
//! — by consulting the durable tracker before every cycle and
//! persisting immediately after every recorded resolution.
//!
//! Failure semantics per market: oracle and submission failures leave
//! the market pending and are retried next cycle; an ambiguous
//! outcome label is logged and never guessed; an `AlreadyResolved`
//! rejection from settlement means the goal state is already reached
//! and is recorded as success. One market's fault never aborts the
//! cycle.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::U256;
use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::adapters::metrics::prometheus::MetricsRegistry;
use crate::domain::outcome::Outcome;
use crate::error::{OracleError, SettlementError};
use crate::ports::oracle::{OracleClient, OracleMarket};
use crate::ports::repository::TrackerRepository;
use crate::ports::settlement::SettlementClient;

/// One market the bot is configured to poll and, once resolved,
/// never revisit.
#[derive(Debug, Clone)]
pub struct TrackedMarketSpec {
    /// Human-readable market name for logs.
    pub name: String,
    /// Identifier used against the oracle APIs.
    pub oracle_id: String,
    /// On-chain market identifier used for settlement.
    pub market_id: U256,
}

/// Outcome of checking a single market in one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Already recorded in the tracker; not polled.
    Skipped,
    /// Oracle reports the market still open.
    Pending,
    /// Outcome label unrecognized; logged, never guessed.
    Ambiguous { label: String },
    /// Settlement submitted and recorded this cycle.
    Resolved(Outcome),
    /// Another party settled first; recorded as resolved locally.
    AlreadyResolved(Outcome),
    /// Dry-run: the settlement that would have been submitted.
    WouldResolve(Outcome),
    /// Oracle or submission failure; retried next cycle.
    Failed(String),
}

/// Result of checking one market.
#[derive(Debug, Clone)]
pub struct MarketCheck {
    pub name: String,
    pub oracle_id: String,
    pub status: CheckStatus,
}

/// Aggregated report from one poll cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Individual per-market results.
    pub results: Vec<MarketCheck>,
    /// Markets newly resolved (including already-resolved-elsewhere).
    pub resolved: usize,
    /// Markets left pending for the next cycle.
    pub pending: usize,
    /// Markets that failed this cycle.
    pub failed: usize,
    /// Markets skipped via the tracker.
    pub skipped: usize,
    /// Timestamp of the cycle.
    pub timestamp: DateTime<Utc>,
}

impl CycleReport {
    fn from_results(results: Vec<MarketCheck>) -> Self {
        let mut resolved = 0;
        let mut pending = 0;
        let mut failed = 0;
        let mut skipped = 0;

        for r in &results {
            match &r.status {
                CheckStatus::Resolved(_) | CheckStatus::AlreadyResolved(_) => resolved += 1,
                CheckStatus::Pending
                | CheckStatus::Ambiguous { .. }
                | CheckStatus::WouldResolve(_) => pending += 1,
                CheckStatus::Failed(_) => failed += 1,
                CheckStatus::Skipped => skipped += 1,
            }
        }

        Self {
            results,
            resolved,
            pending,
            failed,
            skipped,
            timestamp: Utc::now(),
        }
    }
}

/// Autonomous resolution bot.
pub struct ResolutionBot<O, S, R>
where
    O: OracleClient,
    S: SettlementClient,
    R: TrackerRepository,
{
    oracle: Arc<O>,
    settlement: Arc<S>,
    tracker: Arc<R>,
    markets: Vec<TrackedMarketSpec>,
    poll_interval: Duration,
    /// Log what would be settled without submitting or recording.
    dry_run: bool,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl<O, S, R> ResolutionBot<O, S, R>
where
    O: OracleClient,
    S: SettlementClient,
    R: TrackerRepository,
{
    pub fn new(
        oracle: Arc<O>,
        settlement: Arc<S>,
        tracker: Arc<R>,
        markets: Vec<TrackedMarketSpec>,
        poll_interval: Duration,
        dry_run: bool,
    ) -> Self {
        Self {
            oracle,
            settlement,
            tracker,
            markets,
            poll_interval,
            dry_run,
            metrics: None,
        }
    }

    /// Attach a metrics registry.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run poll cycles until shutdown.
    ///
    /// The shutdown signal is observed between cycles and between
    /// markets; an in-flight settlement call completes before exit so
    /// the tracker never disagrees with submitted state.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!(
            markets = self.markets.len(),
            interval_s = self.poll_interval.as_secs(),
            dry_run = self.dry_run,
            "Resolution bot started"
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Resolution bot received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let (report, interrupted) = self.run_cycle(&mut shutdown_rx).await;
            info!(
                checked = report.results.len(),
                resolved = report.resolved,
                pending = report.pending,
                failed = report.failed,
                skipped = report.skipped,
                "Poll cycle complete"
            );
            if let Some(m) = &self.metrics {
                m.poll_cycles.inc();
            }

            if interrupted {
                info!("Resolution bot stopping mid-cycle after shutdown signal");
                break;
            }
        }

        info!("Resolution bot stopped cleanly");
        Ok(())
    }

    /// Execute one poll cycle over all tracked markets.
    ///
    /// Returns the report and whether a shutdown signal interrupted
    /// the cycle.
    pub async fn run_cycle(
        &self,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> (CycleReport, bool) {
        // Reload the durable record before touching anything: this is
        // the restart-tolerant dedup set.
        let resolved_set: HashSet<String> = match self.tracker.load_all().await {
            Ok(all) => all
                .into_iter()
                .filter(|m| m.resolved)
                .map(|m| m.market_id)
                .collect(),
            Err(e) => {
                // Without a trustworthy dedup record, settling risks
                // duplicates. Skip the whole cycle instead.
                error!(error = %e, "Tracker load failed, skipping poll cycle");
                return (CycleReport::from_results(Vec::new()), false);
            }
        };

        let mut results = Vec::new();
        let mut interrupted = false;

        for market in &self.markets {
            if resolved_set.contains(&market.oracle_id) {
                results.push(MarketCheck {
                    name: market.name.clone(),
                    oracle_id: market.oracle_id.clone(),
                    status: CheckStatus::Skipped,
                });
                continue;
            }

            // The oracle query (and any rate-limiter wait inside the
            // gateway) is cancellable; settlement below is not.
            let fetched = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    interrupted = true;
                    break;
                }
                r = self.oracle.market_status(&market.oracle_id) => r,
            };

            let status = self.settle_from_status(market, fetched).await;
            results.push(MarketCheck {
                name: market.name.clone(),
                oracle_id: market.oracle_id.clone(),
                status,
            });
        }

        (CycleReport::from_results(results), interrupted)
    }

    /// Map one oracle response onto the settlement path.
    async fn settle_from_status(
        &self,
        market: &TrackedMarketSpec,
        fetched: Result<OracleMarket, OracleError>,
    ) -> CheckStatus {
        let oracle_market = match fetched {
            Ok(m) => m,
            Err(e) => {
                warn!(
                    market = %market.name,
                    oracle_id = %market.oracle_id,
                    error = %e,
                    "Oracle query failed, retrying next cycle"
                );
                if let Some(m) = &self.metrics {
                    m.oracle_errors.inc();
                }
                return CheckStatus::Failed(e.to_string());
            }
        };

        if !oracle_market.closed {
            return CheckStatus::Pending;
        }

        let Some(label) = oracle_market.outcome else {
            warn!(
                market = %market.name,
                "Market closed without an outcome label, treating as pending"
            );
            return CheckStatus::Pending;
        };

        let Some(outcome) = Outcome::parse_label(&label) else {
            // Never guess an outcome. Stays pending, retried later.
            warn!(
                market = %market.name,
                label = %label,
                "Ambiguous outcome label, not settling"
            );
            return CheckStatus::Ambiguous { label };
        };

        if self.dry_run {
            info!(
                market = %market.name,
                market_id = %market.market_id,
                outcome = %outcome,
                "Dry-run: would submit settlement"
            );
            return CheckStatus::WouldResolve(outcome);
        }

        match self
            .settlement
            .resolve_market(market.market_id, outcome)
            .await
        {
            Ok(()) => {
                info!(
                    market = %market.name,
                    market_id = %market.market_id,
                    outcome = %outcome,
                    "Market settled"
                );
                self.record(market, outcome).await;
                CheckStatus::Resolved(outcome)
            }
            Err(SettlementError::AlreadyResolved { .. }) => {
                // Goal state already reached, e.g. another process
                // settled first. Record locally and stop revisiting.
                info!(
                    market = %market.name,
                    "Market already resolved on-chain, recording locally"
                );
                self.record(market, outcome).await;
                CheckStatus::AlreadyResolved(outcome)
            }
            Err(e) => {
                warn!(
                    market = %market.name,
                    error = %e,
                    "Settlement submission failed, retrying next cycle"
                );
                CheckStatus::Failed(e.to_string())
            }
        }
    }

    /// Persist a resolution to the tracker before the next cycle.
    ///
    /// A persistence failure here is the one window where a duplicate
    /// settlement attempt can occur; the retry resolves to
    /// `AlreadyResolved` and re-records.
    async fn record(&self, market: &TrackedMarketSpec, outcome: Outcome) {
        if let Err(e) = self
            .tracker
            .record_resolved(&market.oracle_id, outcome)
            .await
        {
            error!(
                market = %market.name,
                error = %e,
                "Failed to persist resolution record"
            );
        } else if let Some(m) = &self.metrics {
            m.markets_resolved_by_bot.inc();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use crate::ports::repository::TrackedMarket;

    fn spec(name: &str, oracle_id: &str, market_id: u64) -> TrackedMarketSpec {
        TrackedMarketSpec {
            name: name.to_string(),
            oracle_id: oracle_id.to_string(),
            market_id: U256::from(market_id),
        }
    }

    /// Oracle stub serving canned responses per market id.
    struct StubOracle {
        responses: HashMap<String, Result<OracleMarket, String>>,
        calls: AtomicUsize,
    }

    impl StubOracle {
        fn new() -> Self {
            Self {
                responses: HashMap::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn closed(mut self, id: &str, label: &str) -> Self {
            self.responses.insert(
                id.to_string(),
                Ok(OracleMarket {
                    oracle_id: id.to_string(),
                    closed: true,
                    outcome: Some(label.to_string()),
                }),
            );
            self
        }

        fn open(mut self, id: &str) -> Self {
            self.responses.insert(
                id.to_string(),
                Ok(OracleMarket {
                    oracle_id: id.to_string(),
                    closed: false,
                    outcome: None,
                }),
            );
            self
        }

        fn failing(mut self, id: &str) -> Self {
            self.responses
                .insert(id.to_string(), Err("connection refused".to_string()));
            self
        }
    }

    #[async_trait]
    impl OracleClient for StubOracle {
        async fn market_status(&self, oracle_id: &str) -> Result<OracleMarket, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.responses.get(oracle_id) {
                Some(Ok(m)) => Ok(m.clone()),
                Some(Err(reason)) => Err(OracleError::Unavailable {
                    oracle_id: oracle_id.to_string(),
                    primary: reason.clone(),
                    secondary: reason.clone(),
                }),
                None => panic!("unexpected oracle call for {oracle_id}"),
            }
        }

        async fn is_healthy(&self) -> bool {
            true
        }
    }

    /// Settlement stub recording submissions.
    struct StubSettlement {
        submitted: Mutex<Vec<(U256, Outcome)>>,
        already_resolved: bool,
        fail: bool,
    }

    impl StubSettlement {
        fn new() -> Self {
            Self {
                submitted: Mutex::new(Vec::new()),
                already_resolved: false,
                fail: false,
            }
        }

        fn rejecting_as_already_resolved() -> Self {
            Self {
                already_resolved: true,
                ..Self::new()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl SettlementClient for StubSettlement {
        async fn resolve_market(
            &self,
            market_id: U256,
            outcome: Outcome,
        ) -> Result<(), SettlementError> {
            if self.already_resolved {
                return Err(SettlementError::AlreadyResolved { market_id });
            }
            if self.fail {
                return Err(SettlementError::Submission("nonce too low".to_string()));
            }
            self.submitted.lock().await.push((market_id, outcome));
            Ok(())
        }
    }

    /// In-memory tracker stub.
    struct StubTracker {
        records: Mutex<HashMap<String, TrackedMarket>>,
        load_fails: bool,
    }

    impl StubTracker {
        fn new() -> Self {
            Self {
                records: Mutex::new(HashMap::new()),
                load_fails: false,
            }
        }

        fn failing_load() -> Self {
            Self {
                load_fails: true,
                ..Self::new()
            }
        }

        async fn with_resolved(self, market_id: &str) -> Self {
            self.records.lock().await.insert(
                market_id.to_string(),
                TrackedMarket {
                    market_id: market_id.to_string(),
                    resolved: true,
                    resolved_outcome: Some(1),
                    resolved_at: Some(Utc::now()),
                },
            );
            self
        }
    }

    #[async_trait]
    impl TrackerRepository for StubTracker {
        async fn load_all(&self) -> anyhow::Result<Vec<TrackedMarket>> {
            if self.load_fails {
                anyhow::bail!("disk read failed");
            }
            Ok(self.records.lock().await.values().cloned().collect())
        }

        async fn is_resolved(&self, market_id: &str) -> anyhow::Result<bool> {
            Ok(self
                .records
                .lock()
                .await
                .get(market_id)
                .is_some_and(|m| m.resolved))
        }

        async fn record_resolved(
            &self,
            market_id: &str,
            outcome: Outcome,
        ) -> anyhow::Result<()> {
            self.records.lock().await.insert(
                market_id.to_string(),
                TrackedMarket {
                    market_id: market_id.to_string(),
                    resolved: true,
                    resolved_outcome: Some(outcome.settlement_value()),
                    resolved_at: Some(Utc::now()),
                },
            );
            Ok(())
        }

        async fn is_healthy(&self) -> bool {
            true
        }
    }

    fn bot(
        oracle: StubOracle,
        settlement: StubSettlement,
        tracker: StubTracker,
        markets: Vec<TrackedMarketSpec>,
    ) -> ResolutionBot<StubOracle, StubSettlement, StubTracker> {
        ResolutionBot::new(
            Arc::new(oracle),
            Arc::new(settlement),
            Arc::new(tracker),
            markets,
            Duration::from_secs(60),
            false,
        )
    }

    async fn one_cycle(
        bot: &ResolutionBot<StubOracle, StubSettlement, StubTracker>,
    ) -> CycleReport {
        // Keep the sender alive so recv() stays pending in the select
        let (_tx, mut rx) = broadcast::channel(1);
        let (report, interrupted) = bot.run_cycle(&mut rx).await;
        assert!(!interrupted);
        report
    }

    #[tokio::test]
    async fn test_yes_outcome_settles_as_one() {
        let bot = bot(
            StubOracle::new().closed("m1", "YES"),
            StubSettlement::new(),
            StubTracker::new(),
            vec![spec("M1", "m1", 1)],
        );

        let report = one_cycle(&bot).await;
        assert_eq!(report.resolved, 1);

        let submitted = bot.settlement.submitted.lock().await;
        assert_eq!(submitted.as_slice(), &[(U256::from(1), Outcome::Yes)]);
        assert!(bot.tracker.is_resolved("m1").await.unwrap());
    }

    #[tokio::test]
    async fn test_no_outcome_settles_as_zero() {
        let bot = bot(
            StubOracle::new().closed("m2", "NO"),
            StubSettlement::new(),
            StubTracker::new(),
            vec![spec("M2", "m2", 2)],
        );

        one_cycle(&bot).await;
        let submitted = bot.settlement.submitted.lock().await;
        assert_eq!(submitted[0].1, Outcome::No);
        assert_eq!(submitted[0].1.settlement_value(), 0);
    }

    #[tokio::test]
    async fn test_resolved_market_is_skipped_entirely() {
        let tracker = StubTracker::new().with_resolved("m1").await;
        let bot = bot(
            StubOracle::new(), // panics on any call
            StubSettlement::new(),
            tracker,
            vec![spec("M1", "m1", 1)],
        );

        let report = one_cycle(&bot).await;
        assert_eq!(report.skipped, 1);
        assert_eq!(bot.oracle.calls.load(Ordering::SeqCst), 0);
        assert!(bot.settlement.submitted.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_already_resolved_rejection_is_recorded_as_success() {
        let bot = bot(
            StubOracle::new().closed("m1", "YES"),
            StubSettlement::rejecting_as_already_resolved(),
            StubTracker::new(),
            vec![spec("M1", "m1", 1)],
        );

        let report = one_cycle(&bot).await;
        assert_eq!(report.resolved, 1);
        assert!(matches!(
            report.results[0].status,
            CheckStatus::AlreadyResolved(Outcome::Yes)
        ));
        assert!(bot.tracker.is_resolved("m1").await.unwrap());

        // Next cycle skips it without polling again.
        let report = one_cycle(&bot).await;
        assert_eq!(report.skipped, 1);
        assert_eq!(bot.oracle.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_one_failing_market_does_not_abort_the_cycle() {
        let bot = bot(
            StubOracle::new().failing("m1").closed("m2", "YES"),
            StubSettlement::new(),
            StubTracker::new(),
            vec![spec("A", "m1", 1), spec("B", "m2", 2)],
        );

        let report = one_cycle(&bot).await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.resolved, 1);

        let submitted = bot.settlement.submitted.lock().await;
        assert_eq!(submitted.as_slice(), &[(U256::from(2), Outcome::Yes)]);
    }

    #[tokio::test]
    async fn test_ambiguous_label_is_never_guessed() {
        let bot = bot(
            StubOracle::new().closed("m1", "DISPUTED"),
            StubSettlement::new(),
            StubTracker::new(),
            vec![spec("M1", "m1", 1)],
        );

        let report = one_cycle(&bot).await;
        assert_eq!(report.pending, 1);
        assert!(matches!(
            &report.results[0].status,
            CheckStatus::Ambiguous { label } if label == "DISPUTED"
        ));
        assert!(bot.settlement.submitted.lock().await.is_empty());
        assert!(!bot.tracker.is_resolved("m1").await.unwrap());
    }

    #[tokio::test]
    async fn test_open_market_stays_pending() {
        let bot = bot(
            StubOracle::new().open("m1"),
            StubSettlement::new(),
            StubTracker::new(),
            vec![spec("M1", "m1", 1)],
        );

        let report = one_cycle(&bot).await;
        assert_eq!(report.pending, 1);
        assert!(bot.settlement.submitted.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_submission_failure_leaves_market_pending_for_retry() {
        let bot = bot(
            StubOracle::new().closed("m1", "YES"),
            StubSettlement::failing(),
            StubTracker::new(),
            vec![spec("M1", "m1", 1)],
        );

        let report = one_cycle(&bot).await;
        assert_eq!(report.failed, 1);
        assert!(!bot.tracker.is_resolved("m1").await.unwrap());
    }

    #[tokio::test]
    async fn test_dry_run_submits_nothing() {
        let bot = ResolutionBot::new(
            Arc::new(StubOracle::new().closed("m1", "YES")),
            Arc::new(StubSettlement::new()),
            Arc::new(StubTracker::new()),
            vec![spec("M1", "m1", 1)],
            Duration::from_secs(60),
            true,
        );

        let report = one_cycle(&bot).await;
        assert!(matches!(
            report.results[0].status,
            CheckStatus::WouldResolve(Outcome::Yes)
        ));
        assert!(bot.settlement.submitted.lock().await.is_empty());
        assert!(!bot.tracker.is_resolved("m1").await.unwrap());
    }

    #[tokio::test]
    async fn test_tracker_load_failure_skips_cycle() {
        let bot = bot(
            StubOracle::new().closed("m1", "YES"),
            StubSettlement::new(),
            StubTracker::failing_load(),
            vec![spec("M1", "m1", 1)],
        );

        let report = one_cycle(&bot).await;
        assert!(report.results.is_empty());
        assert_eq!(bot.oracle.calls.load(Ordering::SeqCst), 0);
        assert!(bot.settlement.submitted.lock().await.is_empty());
    }
}
