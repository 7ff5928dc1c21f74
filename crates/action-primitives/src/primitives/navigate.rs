//! Navigate primitive

use action_locator::{retry, ErrorKind, LocatorError, RetryOptions};
use tracing::info;

use crate::primitives::Actions;
use crate::types::{ActionKind, ActionReport};

impl Actions {
    /// Navigate the page to `url`, retrying transient failures. Exhaustion
    /// raises `NavigationFailed` carrying the last driver error; a failure
    /// the driver marks permanent is returned after its single attempt.
    pub async fn navigate(
        &self,
        url: &str,
        retry_options: Option<RetryOptions>,
    ) -> Result<ActionReport, LocatorError> {
        let mut report = ActionReport::started(ActionKind::Navigate, url);
        info!(action_id = %report.action_id, url, "Executing navigate");

        let mut attempts = 0;
        let outcome = retry(
            || {
                attempts += 1;
                async move {
                    self.source
                        .navigate(url)
                        .await
                        .map_err(|err| LocatorError::from(err).with_target(url))
                }
            },
            &retry_options.unwrap_or(self.retry),
            ErrorKind::NavigationFailed,
            &format!("navigate to {}", url),
        )
        .await;
        if let Err(err) = outcome {
            return Err(match err.attempts() {
                Some(_) => err,
                None => err.with_attempts(attempts),
            });
        }

        report.attempts = attempts;
        report.performed = true;
        let report = report.finish();
        info!(
            action_id = %report.action_id,
            latency_ms = report.latency_ms,
            attempts,
            "Navigate completed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use action_locator::{Resolver, SelectorCatalog};
    use candidate_source::{CandidateSource, FixturePage, PageFixture};

    use super::*;

    fn actions(page: &FixturePage) -> Actions {
        let resolver = Resolver::new(Arc::new(page.clone()), Arc::new(SelectorCatalog::empty()));
        Actions::new(Arc::new(resolver)).with_retry(RetryOptions::new(3, 0))
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let page = FixturePage::new(PageFixture::default());
        page.fail_next_navigations(2);
        let report = actions(&page)
            .navigate("https://shop.test/cart", None)
            .await
            .unwrap();
        assert_eq!(report.attempts, 3);
        assert_eq!(page.current_url().await.unwrap(), "https://shop.test/cart");
    }

    #[tokio::test]
    async fn exhaustion_is_navigation_failed() {
        let page = FixturePage::new(PageFixture::default());
        page.fail_next_navigations(5);
        let err = actions(&page)
            .navigate("https://shop.test/slow", Some(RetryOptions::new(2, 0)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NavigationFailed);
        assert_eq!(err.attempts(), Some(2));
        assert_eq!(err.target(), Some("https://shop.test/slow"));
        assert!(err
            .message()
            .contains("navigate to https://shop.test/slow failed after 2 attempts"));
    }

    #[tokio::test]
    async fn unreachable_url_is_attempted_once() {
        let page = FixturePage::new(PageFixture {
            url: "https://shop.test/".to_string(),
            unreachable: vec!["https://down.test/".to_string()],
            ..PageFixture::default()
        });
        let err = actions(&page)
            .navigate("https://down.test/", Some(RetryOptions::new(3, 0)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NavigationFailed);
        assert_eq!(err.attempts(), Some(1));
        assert!(!err.is_retryable());
        assert_eq!(err.target(), Some("https://down.test/"));
        assert_eq!(page.current_url().await.unwrap(), "https://shop.test/");
    }
}
