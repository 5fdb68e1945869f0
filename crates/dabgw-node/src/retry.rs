use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, warn};

use dabgw_core::Status;

use crate::confirm::Orchestrator;
use crate::store::{MessageUpdate, RetrySeed};

/// Knobs for the retry loop.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay between store scans. Zero reproduces the legacy immediate
    /// re-scan cadence.
    pub tick_interval: Duration,
    /// Upper bound for one in-flight attempt before it is marked SKIP.
    /// Zero disables the guard.
    pub attempt_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(250),
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

/// Runs the retry loop until `shutdown` is set.
///
/// Each pass harvests UNCONFIRMED messages (marking them CONFIRMING so a
/// fast loop cannot double-dispatch), resets SKIP back to UNCONFIRMED
/// for the following pass, and dispatches one detached attempt per
/// harvested message so a stalled transport cannot delay other retries.
pub async fn run_retry_loop(
    orchestrator: Arc<Orchestrator>,
    config: RetryConfig,
    shutdown: Arc<AtomicBool>,
) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        for seed in orchestrator.store().begin_retry_pass() {
            spawn_attempt(Arc::clone(&orchestrator), seed, config.attempt_timeout);
        }
        if config.tick_interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(config.tick_interval).await;
        }
    }
}

/// Dispatches one non-blocking attempt with a timeout guard.
///
/// The blocking transport I/O itself cannot be cancelled; a timed-out
/// attempt is marked SKIP so the message is retried, and the straggling
/// task may still apply a later status when it eventually returns.
pub fn spawn_attempt(
    orchestrator: Arc<Orchestrator>,
    seed: RetrySeed,
    attempt_timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let store = orchestrator.store().clone();
        let work = tokio::task::spawn_blocking(move || orchestrator.attempt(seed));
        if attempt_timeout.is_zero() {
            if let Err(err) = work.await {
                error!("attempt task for dab message {} failed: {err}", seed.id);
                store.update(seed.id, MessageUpdate::status(Status::Skip));
            }
            return;
        }
        match tokio::time::timeout(attempt_timeout, work).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!("attempt task for dab message {} failed: {err}", seed.id);
                store.update(seed.id, MessageUpdate::status(Status::Skip));
            }
            Err(_) => {
                warn!(
                    "attempt for dab message {} timed out after {:?}; marking skip",
                    seed.id, attempt_timeout
                );
                store.update(seed.id, MessageUpdate::status(Status::Skip));
            }
        }
    })
}
