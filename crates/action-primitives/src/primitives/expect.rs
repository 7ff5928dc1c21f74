//! Polling assertions

use std::sync::Arc;

use action_locator::{ErrorKind, LocatorError, Query, Resolution, ResolutionOptions};
use candidate_source::ElementHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::primitives::{record_resolution, Actions};
use crate::types::{ActionKind, ActionOptions, ActionReport, Expectation, TextExpectation};
use crate::waiting::{poll_until, PollOutcome, Probe};

impl Actions {
    /// Poll until `query` satisfies `expectation`, raising `AssertionFailed`
    /// with the last observation once the timeout expires.
    pub async fn expect(
        &self,
        query: &Query,
        expectation: &Expectation,
        options: &ActionOptions,
    ) -> Result<ActionReport, LocatorError> {
        let mut report = ActionReport::started(ActionKind::Expect, query.to_string());
        let timeout = options.resolve.timeout.unwrap_or_else(|| self.wait.timeout());

        match self.poll_element(query, expectation, options).await? {
            PollOutcome::Ready(resolution) => {
                report.performed = true;
                report.attempts = 1;
                if let Some(resolution) = &resolution {
                    record_resolution(&mut report, resolution);
                }
                debug!(query = %query, expectation = %expectation, "expectation met");
                Ok(report.finish())
            }
            PollOutcome::Expired {
                last_observed,
                polls,
            } => {
                let observed = last_observed.unwrap_or_else(|| "nothing".to_string());
                warn!(query = %query, expectation = %expectation, polls, "expectation failed");
                Err(LocatorError::assertion(
                    query.to_string(),
                    format!(
                        "expected {} to be {} within {}ms; last observed: {}",
                        query,
                        expectation,
                        timeout.as_millis(),
                        observed
                    ),
                ))
            }
        }
    }

    pub async fn expect_visible(
        &self,
        query: &Query,
        options: &ActionOptions,
    ) -> Result<ActionReport, LocatorError> {
        self.expect(query, &Expectation::Visible, options).await
    }

    /// Passes when the element is invisible or absent.
    pub async fn expect_hidden(
        &self,
        query: &Query,
        options: &ActionOptions,
    ) -> Result<ActionReport, LocatorError> {
        self.expect(query, &Expectation::Hidden, options).await
    }

    pub async fn expect_enabled(
        &self,
        query: &Query,
        options: &ActionOptions,
    ) -> Result<ActionReport, LocatorError> {
        self.expect(query, &Expectation::Enabled, options).await
    }

    pub async fn expect_text(
        &self,
        query: &Query,
        text: TextExpectation,
        options: &ActionOptions,
    ) -> Result<ActionReport, LocatorError> {
        self.expect(query, &Expectation::Text(text), options).await
    }

    pub async fn expect_value(
        &self,
        query: &Query,
        value: &str,
        options: &ActionOptions,
    ) -> Result<ActionReport, LocatorError> {
        self.expect(query, &Expectation::Value(value.to_string()), options)
            .await
    }

    /// Poll the element state until it matches or the wait timeout expires.
    /// No single resolve outlives the remaining wait.
    pub(super) async fn poll_element(
        &self,
        query: &Query,
        expectation: &Expectation,
        options: &ActionOptions,
    ) -> Result<PollOutcome<Option<Resolution>>, LocatorError> {
        let resolution_options = self.resolution_options(options).throw_on_not_found(false);
        let timeout = options.resolve.timeout.unwrap_or_else(|| self.wait.timeout());
        info!(
            query = %query,
            expectation = %expectation,
            timeout_ms = timeout.as_millis() as u64,
            "Waiting for element state"
        );

        let deadline = Instant::now() + timeout;
        poll_until(self.wait.poll_interval(), timeout, || {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let per_resolve = resolution_options.timeout.min(remaining);
            let options = resolution_options.clone().with_timeout(per_resolve);
            async move { self.observe(query, expectation, &options).await }
        })
        .await
    }

    async fn observe(
        &self,
        query: &Query,
        expectation: &Expectation,
        options: &ResolutionOptions,
    ) -> Result<Probe<Option<Resolution>>, LocatorError> {
        let resolution = match self.resolver.resolve(query, options).await {
            Ok(resolution) => resolution,
            Err(err) if is_absence(&err) => None,
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => return Ok(Probe::Pending(err.to_string())),
        };

        let Some(resolution) = resolution else {
            return Ok(match expectation {
                Expectation::Hidden => Probe::Ready(None),
                _ => Probe::Pending("element absent".to_string()),
            });
        };

        match check_state(&resolution.element, expectation).await {
            Ok(None) => Ok(Probe::Ready(Some(resolution))),
            Ok(Some(observed)) => Ok(Probe::Pending(observed)),
            Err(err) => Ok(Probe::Pending(err.to_string())),
        }
    }
}

fn is_absence(err: &LocatorError) -> bool {
    matches!(
        err.kind(),
        ErrorKind::ElementNotFound | ErrorKind::SelfHealingFailed
    )
}

/// `None` when the element satisfies the expectation, otherwise a short
/// description of what was seen.
async fn check_state(
    element: &Arc<dyn ElementHandle>,
    expectation: &Expectation,
) -> Result<Option<String>, LocatorError> {
    let mismatch = match expectation {
        Expectation::Visible => (!element.is_visible().await?).then(|| "not visible".to_string()),
        Expectation::Hidden => element.is_visible().await?.then(|| "visible".to_string()),
        Expectation::Enabled => (!element.is_enabled().await?).then(|| "disabled".to_string()),
        Expectation::Text(expected) => match element.text_content().await? {
            Some(text) if expected.matches(&text) => None,
            Some(text) => Some(format!("text '{}'", text)),
            None => Some("no text".to_string()),
        },
        Expectation::Value(expected) => match element.input_value().await? {
            Some(value) if &value == expected => None,
            Some(value) => Some(format!("value '{}'", value)),
            None => Some("no value".to_string()),
        },
    };
    Ok(mismatch)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use action_locator::{Resolver, SelectorCatalog};
    use async_trait::async_trait;
    use candidate_source::{
        CandidateSet, CandidateSource, ElementFixture, FixturePage, PageFixture, SourceError,
    };
    use steadyhand_core_types::Viewport;

    use super::*;
    use crate::types::WaitOptions;

    fn actions(page: &FixturePage) -> Actions {
        let resolver = Resolver::new(Arc::new(page.clone()), Arc::new(SelectorCatalog::empty()));
        Actions::new(Arc::new(resolver)).with_wait(WaitOptions {
            poll_interval_ms: 10,
            timeout_ms: 100,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn expect_text_reports_last_observation() {
        let page = FixturePage::new(PageFixture::default())
            .with_element(ElementFixture::new("total").selector("#total").with_text("Total: 2"));
        let err = actions(&page)
            .expect_text(
                &Query::selector("#total"),
                TextExpectation::Exact("Total: 3".into()),
                &ActionOptions::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AssertionFailed);
        assert_eq!(err.target(), Some("selector:#total"));
        assert!(err.message().contains("text 'Total: 2'"));
    }

    #[tokio::test(start_paused = true)]
    async fn expect_hidden_accepts_absence() {
        let page = FixturePage::new(PageFixture::default());
        let report = actions(&page)
            .expect_hidden(&Query::selector("#spinner"), &ActionOptions::new())
            .await
            .unwrap();
        assert!(report.ok);
        assert!(report.selector.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn expect_visible_waits_for_element_to_appear() {
        let page = FixturePage::new(PageFixture::default());
        let background = page.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            background.insert_element(ElementFixture::new("toast").selector(".toast"));
        });

        let report = actions(&page)
            .expect_visible(&Query::selector(".toast"), &ActionOptions::new())
            .await
            .unwrap();
        assert_eq!(report.selector.as_deref(), Some(".toast"));
    }

    #[tokio::test(start_paused = true)]
    async fn expect_value_and_enabled() {
        let page = FixturePage::new(PageFixture::default()).with_element(
            ElementFixture::new("email")
                .selector("#email")
                .with_value("a@b.c")
                .disabled(),
        );
        let actions = actions(&page);
        actions
            .expect_value(&Query::selector("#email"), "a@b.c", &ActionOptions::new())
            .await
            .unwrap();
        let err = actions
            .expect_enabled(&Query::selector("#email"), &ActionOptions::new())
            .await
            .unwrap_err();
        assert!(err.message().contains("disabled"));
    }

    struct SlowPage {
        inner: FixturePage,
        delay: Duration,
    }

    #[async_trait]
    impl CandidateSource for SlowPage {
        async fn query(&self, selector: &str) -> Result<CandidateSet, SourceError> {
            tokio::time::sleep(self.delay).await;
            self.inner.query(selector).await
        }

        async fn viewport_size(&self) -> Result<Option<Viewport>, SourceError> {
            self.inner.viewport_size().await
        }

        async fn navigate(&self, url: &str) -> Result<(), SourceError> {
            self.inner.navigate(url).await
        }

        async fn current_url(&self) -> Result<String, SourceError> {
            self.inner.current_url().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_resolve_is_cut_off_at_the_wait_timeout() {
        let page = SlowPage {
            inner: FixturePage::new(PageFixture::default())
                .with_element(ElementFixture::new("toast").selector(".toast")),
            delay: Duration::from_secs(2),
        };
        let resolver = Resolver::new(Arc::new(page), Arc::new(SelectorCatalog::empty()));
        let actions = Actions::new(Arc::new(resolver)).with_wait(WaitOptions {
            poll_interval_ms: 10,
            timeout_ms: 100,
        });
        let started = Instant::now();

        let err = actions
            .expect_visible(&Query::selector(".toast"), &ActionOptions::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AssertionFailed);
        assert!(err.message().contains("within 100ms"));
        assert_eq!(started.elapsed(), Duration::from_millis(100));
    }
}
