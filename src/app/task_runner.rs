//! Recurring refetch loop behind `multiyt watch`.

use std::{
    thread::sleep,
    time::{Duration, Instant},
};

use anyhow::Context;

use crate::{
    app::service::{FeedService, RefreshOutcome},
    catalog::CatalogClient,
    feed::CancelToken,
};

/// Granularity of the idle wait between ticks.
const POLL_STEP: Duration = Duration::from_millis(250);

/// Wires Ctrl+C to the given token. Can only be installed once per process.
pub fn cancel_on_ctrlc(cancel: CancelToken) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        cancel.cancel();
    })
    .context("failed to set Ctrl+C handler")
}

/// Calls `refresh(false)` every `interval` until the service's cancel token
/// fires. A cycle that is already running finishes and commits first.
pub fn watch<C: CatalogClient>(service: &FeedService<C>, interval: Duration) -> anyhow::Result<()> {
    let cancel = service.cancel_token();
    log::info!("watching for new uploads every {}s", interval.as_secs());

    while !cancel.is_cancelled() {
        match service.refresh(false) {
            Ok(RefreshOutcome::Fetched(summary)) if summary.cancelled => {
                log::info!("fetch interrupted, partial batch saved");
            }
            Ok(_) => {}
            // the timestamp is untouched, so the next tick retries
            Err(err) => log::error!("refresh failed: {err}"),
        }

        wait(&cancel, interval);
    }

    log::info!("watch stopped");
    Ok(())
}

fn wait(cancel: &CancelToken, interval: Duration) {
    let started = Instant::now();
    while !cancel.is_cancelled() && started.elapsed() < interval {
        sleep(POLL_STEP.min(interval));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_returns_early_when_cancelled() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let started = Instant::now();
        wait(&cancel, Duration::from_secs(30));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn wait_honours_short_intervals() {
        let cancel = CancelToken::new();
        let started = Instant::now();
        wait(&cancel, Duration::from_millis(10));
        assert!(started.elapsed() >= Duration::from_millis(10));
    }
}
