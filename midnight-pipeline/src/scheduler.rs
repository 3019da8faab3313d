use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{error, info};

use midnight_domain::BookingRepository;

use crate::executor::BookingExecutor;

/// Scan cadence and pickup window. The lookback tolerates scheduler jitter
/// and short downtime; a PENDING request older than the lookback is never
/// picked up again. That staleness boundary is intentional.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub tick_interval: Duration,
    pub lookback: chrono::Duration,
    pub lookahead: chrono::Duration,
    pub max_concurrent: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            lookback: chrono::Duration::minutes(5),
            lookahead: chrono::Duration::minutes(1),
            max_concurrent: 4,
        }
    }
}

/// Periodic due-booking scanner. Explicitly constructed and injectable; owns
/// its lifecycle through `start`/`stop`, and `tick` is public so tests drive
/// scans deterministically without wall-clock timing.
pub struct BookingScheduler {
    bookings: Arc<dyn BookingRepository>,
    executor: Arc<BookingExecutor>,
    config: SchedulerConfig,
    limiter: Arc<Semaphore>,
}

impl BookingScheduler {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        executor: Arc<BookingExecutor>,
        config: SchedulerConfig,
    ) -> Self {
        let limiter = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            bookings,
            executor,
            config,
            limiter,
        }
    }

    /// One scan at instant `now`: select every PENDING request with
    /// `now - lookback < scheduled_time <= now + lookahead` and hand each to
    /// the executor on its own task, bounded by the worker pool. Returns the
    /// dispatched task handles; the run loop drops them (fire and forget),
    /// tests await them. One request's failure never blocks the rest.
    pub async fn tick(&self, now: DateTime<Utc>) -> Vec<JoinHandle<()>> {
        let window_start = now - self.config.lookback;
        let window_end = now + self.config.lookahead;

        let due = match self.bookings.find_due(window_start, window_end).await {
            Ok(due) => due,
            Err(e) => {
                error!(error = %e, "due-booking scan failed");
                return Vec::new();
            }
        };

        let mut handles = Vec::with_capacity(due.len());
        for booking in due {
            let permit = match self.limiter.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let executor = self.executor.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                executor.execute(booking).await;
            }));
        }
        handles
    }

    /// Spawn the scan loop. The returned handle stops it.
    pub fn start(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let scheduler = self.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(scheduler.config.tick_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            info!(
                tick_secs = scheduler.config.tick_interval.as_secs(),
                "booking scheduler started"
            );

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let dispatched = scheduler.tick(Utc::now()).await;
                        if !dispatched.is_empty() {
                            info!(count = dispatched.len(), "dispatched due bookings");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        info!("booking scheduler stopped");
                        break;
                    }
                }
            }
        });

        SchedulerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Lifecycle handle for a running scheduler
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
