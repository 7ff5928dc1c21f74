//! Fixed-interval polling shared by assertions and explicit waits

use std::future::Future;
use std::time::Duration;

use action_locator::LocatorError;
use tokio::time::{sleep, Instant};
use tracing::trace;

/// Result of one poll.
#[derive(Debug)]
pub enum Probe<T> {
    Ready(T),
    /// Condition not met yet; carries what was observed
    Pending(String),
}

/// Result of a whole polling run.
#[derive(Debug)]
pub enum PollOutcome<T> {
    Ready(T),
    Expired {
        last_observed: Option<String>,
        polls: u32,
    },
}

/// Poll `probe` every `interval` until it is ready or `timeout` elapses.
///
/// The probe runs at least once, even with a zero timeout. An error from the
/// probe ends polling immediately.
pub async fn poll_until<T, F, Fut>(
    interval: Duration,
    timeout: Duration,
    mut probe: F,
) -> Result<PollOutcome<T>, LocatorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Probe<T>, LocatorError>>,
{
    let deadline = Instant::now() + timeout;
    let mut polls = 0;
    let mut last_observed = None;

    loop {
        polls += 1;
        match probe().await? {
            Probe::Ready(value) => return Ok(PollOutcome::Ready(value)),
            Probe::Pending(observed) => {
                trace!(polls, observed = %observed, "condition pending");
                last_observed = Some(observed);
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(PollOutcome::Expired {
                last_observed,
                polls,
            });
        }
        sleep(interval.min(deadline - now)).await;
    }
}
