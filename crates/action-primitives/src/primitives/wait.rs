//! Wait primitive - Explicit waits for various conditions

use std::time::Duration;

use action_locator::{LocatorError, ResolveOverrides};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::primitives::{record_resolution, Actions};
use crate::types::{ActionKind, ActionOptions, ActionReport, Expectation, WaitCondition};
use crate::waiting::{poll_until, PollOutcome, Probe};

impl Actions {
    /// Wait for `condition`, polling at the facade interval. Expiry raises
    /// `Timeout`; `None` uses the facade wait timeout.
    pub async fn wait_for(
        &self,
        condition: &WaitCondition,
        timeout: Option<Duration>,
    ) -> Result<ActionReport, LocatorError> {
        let timeout = timeout.unwrap_or_else(|| self.wait.timeout());
        let mut report = ActionReport::started(ActionKind::Wait, condition.to_string());
        info!(
            action_id = %report.action_id,
            condition = %condition,
            timeout_ms = timeout.as_millis() as u64,
            "Executing wait"
        );

        let outcome = match condition {
            WaitCondition::Duration(ms) => {
                sleep(Duration::from_millis(*ms)).await;
                PollOutcome::Ready(())
            }
            WaitCondition::ElementVisible(query) | WaitCondition::ElementHidden(query) => {
                let expectation = match condition {
                    WaitCondition::ElementVisible(_) => Expectation::Visible,
                    _ => Expectation::Hidden,
                };
                let options = ActionOptions {
                    resolve: ResolveOverrides::new().timeout(timeout),
                    retry: None,
                };
                match self.poll_element(query, &expectation, &options).await? {
                    PollOutcome::Ready(resolution) => {
                        if let Some(resolution) = &resolution {
                            record_resolution(&mut report, resolution);
                        }
                        PollOutcome::Ready(())
                    }
                    PollOutcome::Expired {
                        last_observed,
                        polls,
                    } => PollOutcome::Expired {
                        last_observed,
                        polls,
                    },
                }
            }
            WaitCondition::ElementCount { selector, count } => {
                poll_until(self.wait.poll_interval(), timeout, || async move {
                    let found = self.source.count(selector).await?;
                    Ok(if found == *count {
                        Probe::Ready(())
                    } else {
                        Probe::Pending(format!("{} matching", found))
                    })
                })
                .await?
            }
            WaitCondition::UrlContains(fragment) => {
                poll_until(self.wait.poll_interval(), timeout, || async move {
                    let url = self.source.current_url().await?;
                    Ok(if url.contains(fragment.as_str()) {
                        Probe::Ready(())
                    } else {
                        Probe::Pending(format!("url '{}'", url))
                    })
                })
                .await?
            }
        };

        match outcome {
            PollOutcome::Ready(()) => {
                report.performed = true;
                report.attempts = 1;
                Ok(report.finish())
            }
            PollOutcome::Expired {
                last_observed,
                polls,
            } => {
                warn!(condition = %condition, polls, "Wait timed out");
                Err(LocatorError::timeout(format!(
                    "condition not met after {}ms: {} (last observed: {})",
                    timeout.as_millis(),
                    condition,
                    last_observed.unwrap_or_else(|| "nothing".to_string())
                )))
            }
        }
    }
}
