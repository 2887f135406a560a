//! Resumable bounded-concurrency backfill
//!
//! A run over an [`IdRange`] works like this:
//! - the coordinator loads the range's [`WorkSet`] from the [`Checkpoint`]
//!   (or seeds the whole range) and is its only writer
//! - exactly `concurrency` workers pull ids from a bounded job channel and
//!   report each outcome back by message
//! - successes leave the WorkSet, failures stay pending for the next run
//! - the WorkSet is persisted every `checkpoint_every` completions and at
//!   the end; a stop request ends dispatching while in-flight ids finish

use crate::error::{EntityFailure, SchedulerError};
use crate::pipeline::{EntityRegenerator, EntityReport, RegenerationScope};
use crate::signal::StopSignal;
use crate::workset::{Checkpoint, IdRange, WorkSet};
use hnforge_traits::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Backfill tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillOptions {
    /// Worker count, the ceiling on in-flight entities
    pub concurrency: usize,
    /// Dispatches per id per run
    pub max_attempts: u32,
    /// Completions between checkpoint writes
    pub checkpoint_every: usize,
    /// Artifacts written per entity
    pub scope: RegenerationScope,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        Self {
            concurrency: 10,
            max_attempts: 1,
            checkpoint_every: 50,
            scope: RegenerationScope::Full,
        }
    }
}

/// Outcome of one backfill run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillReport {
    /// Requested range
    pub range: IdRange,
    /// Ids pending when the run started
    pub seeded: usize,
    /// Dispatches, retries included
    pub dispatched: usize,
    /// Entities fully uploaded in this run
    pub succeeded: usize,
    /// Ids whose last attempt failed, ascending
    pub failed: Vec<EntityId>,
    /// Ids still pending after the run
    pub pending: BTreeSet<EntityId>,
    /// Whether the run ended on a stop request
    pub stopped: bool,
    /// Wall-clock duration
    pub elapsed: Duration,
}

impl BackfillReport {
    fn empty(range: IdRange) -> Self {
        Self {
            range,
            seeded: 0,
            dispatched: 0,
            succeeded: 0,
            failed: Vec::new(),
            pending: BTreeSet::new(),
            stopped: false,
            elapsed: Duration::ZERO,
        }
    }

    /// Whether nothing is left pending
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }
}

struct Completion {
    id: EntityId,
    worker: usize,
    outcome: Result<EntityReport, EntityFailure>,
}

/// Drives backfills over a shared [`EntityRegenerator`]
pub struct BatchScheduler {
    regenerator: Arc<dyn EntityRegenerator>,
    checkpoint: Arc<dyn Checkpoint>,
    options: BackfillOptions,
    stop: StopSignal,
}

impl BatchScheduler {
    /// Create scheduler with default options
    #[must_use]
    pub fn new(regenerator: Arc<dyn EntityRegenerator>, checkpoint: Arc<dyn Checkpoint>) -> Self {
        Self {
            regenerator,
            checkpoint,
            options: BackfillOptions::default(),
            stop: StopSignal::new(),
        }
    }

    /// With options
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: BackfillOptions) -> Self {
        self.options = options;
        self
    }

    /// With an externally owned stop signal
    #[inline]
    #[must_use]
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Options in effect
    #[inline]
    #[must_use]
    pub fn options(&self) -> &BackfillOptions {
        &self.options
    }

    /// Stop signal checked before every dispatch
    #[inline]
    #[must_use]
    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Regenerate every pending id of `range`
    ///
    /// Entity failures never fail the run; they stay pending.
    ///
    /// # Errors
    /// `InvalidRequest` for zero concurrency, `Checkpoint` when the WorkSet
    /// cannot be loaded or finally persisted
    pub async fn run_backfill(&self, range: IdRange) -> Result<BackfillReport, SchedulerError> {
        let limit = self.options.concurrency;
        if limit == 0 {
            return Err(SchedulerError::InvalidRequest(
                "concurrency must be at least 1".into(),
            ));
        }
        if range.is_empty() {
            info!(%range, "empty range, nothing to do");
            return Ok(BackfillReport::empty(range));
        }

        let started = Instant::now();
        let mut work = match self.checkpoint.load(range).await? {
            Some(work) => {
                info!(%range, pending = work.len(), "resuming from checkpoint");
                work
            }
            None => WorkSet::seeded(range),
        };

        let mut report = BackfillReport::empty(range);
        report.seeded = work.len();
        let total = range.len();
        info!(%range, pending = work.len(), concurrency = limit, "backfill starting");

        let mut queue: VecDeque<EntityId> = work.iter().collect();
        let mut attempts: HashMap<EntityId, u32> = HashMap::new();
        let mut failed: BTreeSet<EntityId> = BTreeSet::new();

        let (job_tx, job_rx) = mpsc::channel::<EntityId>(limit);
        let (done_tx, mut done_rx) = mpsc::channel::<Completion>(limit);
        let job_rx = Arc::new(Mutex::new(job_rx));

        let mut workers = JoinSet::new();
        for worker in 0..limit {
            workers.spawn(worker_loop(
                worker,
                Arc::clone(&job_rx),
                done_tx.clone(),
                Arc::clone(&self.regenerator),
                self.options.scope,
            ));
        }
        drop(done_tx);

        let mut in_flight = 0usize;
        let mut since_checkpoint = 0usize;
        let mut failures = 0u64;
        loop {
            while in_flight < limit && !self.stop.is_stopped() {
                let Some(id) = queue.pop_front() else { break };
                if job_tx.send(id).await.is_err() {
                    warn!(entity = %id, "no workers left, dispatch abandoned");
                    queue.clear();
                    break;
                }
                *attempts.entry(id).or_default() += 1;
                report.dispatched += 1;
                in_flight += 1;
            }
            if in_flight == 0 {
                break;
            }

            let Some(done) = done_rx.recv().await else {
                break;
            };
            in_flight -= 1;

            match done.outcome {
                Ok(entity) => {
                    work.complete(done.id);
                    failed.remove(&done.id);
                    report.succeeded += 1;
                    info!(
                        "({}/{}) entity #{} uploaded ({} levels, worker {})",
                        work.completed(),
                        total,
                        entity.id,
                        entity.levels.len(),
                        done.worker
                    );
                }
                Err(failure) => {
                    failures += 1;
                    log_failure(&failure);
                    warn!(
                        "({}/{}) entity #{} failed ({} failed this run)",
                        work.completed(),
                        total,
                        done.id,
                        failures
                    );
                    let tries = attempts.get(&done.id).copied().unwrap_or(0);
                    if tries < self.options.max_attempts && !self.stop.is_stopped() {
                        debug!(entity = %done.id, attempt = tries, "requeued");
                        queue.push_back(done.id);
                    } else {
                        failed.insert(done.id);
                    }
                }
            }

            since_checkpoint += 1;
            if since_checkpoint >= self.options.checkpoint_every.max(1) {
                since_checkpoint = 0;
                if let Err(error) = self.checkpoint.save(&work).await {
                    warn!(%error, "checkpoint write failed, continuing");
                }
            }
        }

        drop(job_tx);
        while let Some(joined) = workers.join_next().await {
            if let Err(error) = joined {
                warn!(%error, "worker exited abnormally");
            }
        }

        self.checkpoint.save(&work).await?;

        report.failed = failed.into_iter().collect();
        report.pending = work.pending().clone();
        report.stopped = self.stop.is_stopped();
        report.elapsed = started.elapsed();
        info!(
            %range,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            pending = report.pending.len(),
            stopped = report.stopped,
            elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            "backfill finished"
        );
        Ok(report)
    }
}

async fn worker_loop(
    worker: usize,
    jobs: Arc<Mutex<mpsc::Receiver<EntityId>>>,
    done: mpsc::Sender<Completion>,
    regenerator: Arc<dyn EntityRegenerator>,
    scope: RegenerationScope,
) {
    loop {
        let next = jobs.lock().await.recv().await;
        let Some(id) = next else { break };

        let task = {
            let regenerator = Arc::clone(&regenerator);
            tokio::spawn(async move { regenerator.regenerate(id, scope).await })
        };
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(join) => Err(EntityFailure::Panicked {
                id,
                message: join.to_string(),
            }),
        };

        if done.send(Completion { id, worker, outcome }).await.is_err() {
            break;
        }
    }
}

pub(crate) fn log_failure(failure: &EntityFailure) {
    match failure {
        EntityFailure::Levels { id, failures } => {
            for f in failures {
                warn!(
                    entity = %id,
                    level = %f.level,
                    transient = f.error.is_transient(),
                    error = %f.error,
                    "entity level failed"
                );
            }
        }
        EntityFailure::Panicked { id, message } => {
            warn!(entity = %id, %message, "entity task panicked");
        }
    }
}
