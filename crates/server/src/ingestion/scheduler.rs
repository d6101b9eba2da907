//! Per-source periodic scheduler and the shared run path.
//!
//! One tokio task per source fires [`run_source`] at that source's
//! configured interval; manual triggers go through the identical path,
//! so scheduled and manual runs are indistinguishable in the run log.
//! Overlapping runs for the same source are serialized by a per-source
//! mutex — without it, two runs could both miss an existing skill and
//! insert duplicates.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use skillpulse_core::config::ScrapeConfig;
use skillpulse_core::{RunOutcome, Source};
use skillpulse_scraper::Scraper;

use super::engine::IngestionEngine;
use super::run_log::RunLogStore;

struct SourceEntry {
    scraper: Arc<dyn Scraper>,
    interval: Duration,
    /// Serializes runs for this source; held across fetch, apply and the
    /// run-log write.
    lock: Mutex<()>,
}

/// Owns the periodic timers and the manual trigger path.
///
/// Constructed explicitly with its adapter registry and interval
/// configuration; started and stopped by its owner.
pub struct ScrapeScheduler {
    pool: PgPool,
    entries: HashMap<Source, Arc<SourceEntry>>,
    shutdown_tx: watch::Sender<bool>,
    handles: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl ScrapeScheduler {
    pub fn new(
        pool: PgPool,
        registry: HashMap<Source, Arc<dyn Scraper>>,
        config: &ScrapeConfig,
    ) -> Self {
        let entries = registry
            .into_iter()
            .map(|(source, scraper)| {
                let entry = SourceEntry {
                    scraper,
                    interval: config.interval_for(source),
                    lock: Mutex::new(()),
                };
                (source, Arc::new(entry))
            })
            .collect();

        let (shutdown_tx, _) = watch::channel(false);

        Self {
            pool,
            entries,
            shutdown_tx,
            handles: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Sources with a registered adapter.
    pub fn sources(&self) -> Vec<Source> {
        self.entries.keys().copied().collect()
    }

    /// Configured poll interval for one source.
    pub fn interval(&self, source: Source) -> Option<Duration> {
        self.entries.get(&source).map(|e| e.interval)
    }

    /// Install one periodic timer per source. Each fires `run_source` at
    /// its own cadence, first firing one interval after start.
    pub fn start(&self) {
        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());

        for (&source, entry) in &self.entries {
            let pool = self.pool.clone();
            let entry = Arc::clone(entry);
            let interval = entry.interval;
            let mut shutdown_rx = self.shutdown_tx.subscribe();

            info!(source = %source, interval_secs = interval.as_secs(), "scheduler: timer installed");

            handles.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // the first tick completes immediately; consume it so the
                // first run happens one interval after startup
                ticker.tick().await;

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            // fire-and-forget: the outcome is persisted to
                            // the run log inside run_source
                            run_source(&pool, &entry, source).await;
                        }
                        _ = shutdown_rx.changed() => {
                            info!(source = %source, "scheduler: timer stopped");
                            break;
                        }
                    }
                }
            }));
        }
    }

    /// On-demand execution over the identical path the timers use.
    pub async fn trigger_now(&self, source: Source) -> RunOutcome {
        self.run_once(source).await
    }

    /// Execute one full ingestion attempt for `source`.
    pub async fn run_once(&self, source: Source) -> RunOutcome {
        // rejected before any attempt starts — no run record is written
        let Some(entry) = self.entries.get(&source) else {
            return RunOutcome::error(source, format!("no adapter registered for '{}'", source));
        };
        run_source(&self.pool, entry, source).await
    }

    /// Cancel all future timer firings. An in-flight run is not aborted;
    /// it finishes naturally and its run record is still written.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for the per-source tasks to wind down after [`shutdown`].
    ///
    /// [`shutdown`]: ScrapeScheduler::shutdown
    pub async fn join(&self) {
        let handles: Vec<_> = {
            let mut guard = self.handles.lock().unwrap_or_else(|e| e.into_inner());
            guard.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.await;
        }
    }
}

/// One ingestion attempt: fetch → apply → run log, in strict sequence.
///
/// Every failure mode is converted into an error outcome here; exactly
/// one run record is written per call, success or failure.
async fn run_source(pool: &PgPool, entry: &SourceEntry, source: Source) -> RunOutcome {
    let _guard = entry.lock.lock().await;
    let started_at = Utc::now();
    info!(source = %source, "scrape run started");

    let outcome = match entry.scraper.fetch().await {
        Ok(items) => match IngestionEngine::apply(pool, source, &items).await {
            Ok(outcome) => outcome,
            Err(e) => RunOutcome::error(source, e.to_string()),
        },
        Err(e) => RunOutcome::error(source, e.to_string()),
    };

    let completed_at = Utc::now();
    if let Err(e) = RunLogStore::record(pool, &outcome, started_at, completed_at).await {
        error!(source = %source, error = %e, "failed to write run record");
    }

    if outcome.is_success() {
        info!(
            source = %source,
            items = outcome.items_scraped,
            duration_ms = (completed_at - started_at).num_milliseconds(),
            "scrape run completed"
        );
    } else {
        warn!(
            source = %source,
            error = outcome.message.as_deref().unwrap_or(""),
            "scrape run failed"
        );
    }

    outcome
}

// ── Tests ────────────────────────────────────────────────────────────
