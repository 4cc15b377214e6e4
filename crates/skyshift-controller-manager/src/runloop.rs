//! The generic controller loop and its error-handling wrapper, grounded on
//! `original_source/skyflow/controllers/controller.py`'s
//! `controller_error_handler` and the heartbeat variants layered on top of
//! it in `cluster_controller.py`/`job_controller.py`/`network_controller.py`.
//!
//! The source has three slightly different error handlers (plain log-and-
//! continue, log-and-bump-a-retry-counter, log-and-terminate-past-the-limit)
//! scattered across controllers. Here they collapse into one
//! `run_heartbeat_loop` parameterized by a retry limit: `u32::MAX` gives the
//! "never terminates" behavior the queue-driven controllers want, and a
//! real limit gives the network controller's "shut down past N failures"
//! behavior.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Runs `body` forever on a fixed cadence, logging and counting failures.
/// Returns once `retry_limit` consecutive-or-cumulative failures have
/// occurred; pass `u32::MAX` for a controller that should never give up.
pub async fn run_heartbeat_loop<F, Fut, E>(name: &'static str, interval: Duration, retry_limit: u32, mut body: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    let mut retry_counter: u32 = 0;
    loop {
        let start = Instant::now();
        match body().await {
            Ok(()) => retry_counter = 0,
            Err(error) => {
                tracing::error!(controller = name, %error, "controller loop iteration failed, retrying");
                retry_counter += 1;
                if retry_counter > retry_limit {
                    tracing::error!(controller = name, "retry limit exceeded, shutting down controller");
                    return;
                }
            }
        }
        let elapsed = start.elapsed();
        if elapsed < interval {
            tokio::time::sleep(interval - elapsed).await;
        }
    }
}

/// Runs `body` forever, logging and continuing on every failure. Used by
/// the event/queue-driven controllers (flow, endpoints, proxy, link,
/// skylet supervisor), whose source's `Controller.run()` has no retry
/// limit at all.
pub async fn run_event_loop<F, Fut, E>(name: &'static str, mut body: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    loop {
        if let Err(error) = body().await {
            tracing::error!(controller = name, %error, "controller loop iteration failed, continuing");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn heartbeat_loop_stops_after_retry_limit() {
        let attempts = AtomicU32::new(0);
        run_heartbeat_loop("test", Duration::from_millis(1), 2, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), &'static str>("boom") }
        })
        .await;
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn heartbeat_loop_resets_retry_counter_on_success() {
        // success, fail, success, fail, fail -> only the last two fails are
        // consecutive, so with retry_limit=1 the loop only stops there.
        let outcomes = [true, false, true, false, false];
        let attempts = AtomicU32::new(0);
        run_heartbeat_loop("test", Duration::from_millis(1), 1, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst) as usize;
            async move {
                if outcomes[n] {
                    Ok(())
                } else {
                    Err("boom")
                }
            }
        })
        .await;
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
    }
}
