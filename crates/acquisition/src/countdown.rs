//! Cancellable inter-fetch wait.
//!
//! The wait reports the remaining time once per tick, but cancellation is
//! raced against every tick sleep and takes effect immediately rather than
//! at the next tick boundary.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full interval elapsed.
    Elapsed,
    /// The token was cancelled first.
    Cancelled,
}

/// Wait `steps` ticks of length `tick`, calling `on_tick` with the number
/// of steps remaining (`steps`, `steps - 1`, ..., `1`) at the start of each.
pub async fn countdown<F>(
    steps: u64,
    tick: Duration,
    token: &CancellationToken,
    mut on_tick: F,
) -> WaitOutcome
where
    F: FnMut(u64),
{
    for remaining in (1..=steps).rev() {
        if token.is_cancelled() {
            return WaitOutcome::Cancelled;
        }
        on_tick(remaining);

        tokio::select! {
            biased;
            _ = token.cancelled() => return WaitOutcome::Cancelled,
            _ = tokio::time::sleep(tick) => {}
        }
    }

    if token.is_cancelled() {
        WaitOutcome::Cancelled
    } else {
        WaitOutcome::Elapsed
    }
}
