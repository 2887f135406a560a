//! Event-driven regeneration
//!
//! Each accepted [`EntityEvent`] regenerates its entity right away, bounded
//! by a dedicated semaphore. The live path owns no WorkSet and never writes
//! a checkpoint; a failure is logged and dropped, the next event for the
//! same entity retries naturally.

use crate::error::EntityFailure;
use crate::pipeline::{EntityRegenerator, EntityReport, RegenerationScope};
use crate::scheduler::log_failure;
use crate::signal::StopSignal;
use crate::source::{Address, EntityEvent, EventKind};
use futures::{Stream, StreamExt};
use hnforge_traits::EntityId;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

/// Which events trigger regeneration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventFilter {
    /// Ids below this are ignored
    pub min_entity_id: u64,
    /// Transfers count only when sent here; without it transfers are ignored
    pub designated: Option<Address>,
}

impl EventFilter {
    /// Whether `event` should trigger regeneration
    #[must_use]
    pub fn accepts(&self, event: &EntityEvent) -> bool {
        if event.id.get() < self.min_entity_id {
            return false;
        }
        match event.kind {
            EventKind::Created | EventKind::AttributesChanged => true,
            EventKind::TransferredTo(to) => self.designated == Some(to),
        }
    }
}

/// Counters of one [`LiveRegenerator::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveReport {
    /// Events read from the stream
    pub received: usize,
    /// Events passing the filter
    pub accepted: usize,
    /// Regenerations that succeeded
    pub succeeded: usize,
    /// Regenerations that failed
    pub failed: usize,
}

/// Regenerates entities as change events arrive
pub struct LiveRegenerator {
    regenerator: Arc<dyn EntityRegenerator>,
    filter: EventFilter,
    scope: RegenerationScope,
    permits: Arc<Semaphore>,
    stop: StopSignal,
}

impl LiveRegenerator {
    /// Create regenerator with 4 concurrent tasks and full scope
    #[must_use]
    pub fn new(regenerator: Arc<dyn EntityRegenerator>, filter: EventFilter) -> Self {
        Self {
            regenerator,
            filter,
            scope: RegenerationScope::Full,
            permits: Arc::new(Semaphore::new(4)),
            stop: StopSignal::new(),
        }
    }

    /// With regeneration scope
    #[inline]
    #[must_use]
    pub fn with_scope(mut self, scope: RegenerationScope) -> Self {
        self.scope = scope;
        self
    }

    /// With concurrent task ceiling (at least 1)
    #[inline]
    #[must_use]
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(limit.max(1)));
        self
    }

    /// With an externally owned stop signal
    #[inline]
    #[must_use]
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Event filter
    #[inline]
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Regenerate `id` once, outside any event stream
    ///
    /// # Errors
    /// The entity failure, unchanged
    pub async fn regenerate_now(&self, id: EntityId) -> Result<EntityReport, EntityFailure> {
        let _permit = self.permits.acquire().await.ok();
        self.regenerator.regenerate(id, self.scope).await
    }

    /// Consume `events` until it ends or stop is requested
    ///
    /// Waits for in-flight regenerations before returning.
    pub async fn run<S>(&self, events: S) -> LiveReport
    where
        S: Stream<Item = EntityEvent> + Send,
    {
        let mut events = std::pin::pin!(events);
        let mut tasks = JoinSet::new();
        let mut report = LiveReport::default();

        loop {
            let next = tokio::select! {
                biased;
                () = self.stop.stopped() => None,
                event = events.next() => event,
            };
            let Some(event) = next else { break };
            report.received += 1;

            if !self.filter.accepts(&event) {
                debug!(entity = %event.id, kind = ?event.kind, "event ignored");
                continue;
            }
            report.accepted += 1;

            let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
                break;
            };
            let regenerator = Arc::clone(&self.regenerator);
            let scope = self.scope;
            info!(entity = %event.id, kind = ?event.kind, "live regeneration");
            tasks.spawn(async move {
                let _permit = permit;
                (event.id, regenerator.regenerate(event.id, scope).await)
            });

            while let Some(joined) = tasks.try_join_next() {
                tally(joined, &mut report);
            }
        }

        while let Some(joined) = tasks.join_next().await {
            tally(joined, &mut report);
        }
        info!(
            received = report.received,
            accepted = report.accepted,
            succeeded = report.succeeded,
            failed = report.failed,
            "live regeneration stopped"
        );
        report
    }
}

type Joined = Result<(EntityId, Result<EntityReport, EntityFailure>), JoinError>;

fn tally(joined: Joined, report: &mut LiveReport) {
    match joined {
        Ok((id, Ok(_))) => {
            report.succeeded += 1;
            info!(entity = %id, "live regeneration uploaded");
        }
        Ok((_, Err(failure))) => {
            report.failed += 1;
            log_failure(&failure);
        }
        Err(error) => {
            report.failed += 1;
            warn!(%error, "live task aborted");
        }
    }
}
