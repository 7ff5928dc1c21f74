//! Element interactions

use std::path::PathBuf;

use action_locator::{LocatorError, Query};

use crate::primitives::Actions;
use crate::types::{ActionKind, ActionOptions, ActionReport};

impl Actions {
    pub async fn click(
        &self,
        query: &Query,
        options: &ActionOptions,
    ) -> Result<ActionReport, LocatorError> {
        self.act(ActionKind::Click, query, options, |element| async move {
            element.click().await
        })
        .await
    }

    /// Replace the element's value with `value`.
    pub async fn fill(
        &self,
        query: &Query,
        value: &str,
        options: &ActionOptions,
    ) -> Result<ActionReport, LocatorError> {
        self.act(ActionKind::Fill, query, options, |element| async move {
            element.fill(value).await
        })
        .await
    }

    pub async fn hover(
        &self,
        query: &Query,
        options: &ActionOptions,
    ) -> Result<ActionReport, LocatorError> {
        self.act(ActionKind::Hover, query, options, |element| async move {
            element.hover().await
        })
        .await
    }

    pub async fn check(
        &self,
        query: &Query,
        options: &ActionOptions,
    ) -> Result<ActionReport, LocatorError> {
        self.act(ActionKind::Check, query, options, |element| async move {
            element.check().await
        })
        .await
    }

    pub async fn uncheck(
        &self,
        query: &Query,
        options: &ActionOptions,
    ) -> Result<ActionReport, LocatorError> {
        self.act(ActionKind::Uncheck, query, options, |element| async move {
            element.uncheck().await
        })
        .await
    }

    pub async fn select_option(
        &self,
        query: &Query,
        value: &str,
        options: &ActionOptions,
    ) -> Result<ActionReport, LocatorError> {
        self.act(ActionKind::SelectOption, query, options, |element| async move {
            element.select_option(value).await
        })
        .await
    }

    pub async fn set_input_files(
        &self,
        query: &Query,
        paths: &[PathBuf],
        options: &ActionOptions,
    ) -> Result<ActionReport, LocatorError> {
        self.act(ActionKind::SetInputFiles, query, options, |element| async move {
            element.set_input_files(paths).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use action_locator::{ErrorKind, Resolver, RetryOptions, SelectorCatalog, StrategyKind};
    use candidate_source::{ElementFixture, FixtureAction, FixturePage, PageFixture};

    use super::*;

    fn actions(page: &FixturePage) -> Actions {
        let resolver = Resolver::new(Arc::new(page.clone()), Arc::new(SelectorCatalog::empty()));
        Actions::new(Arc::new(resolver)).with_retry(RetryOptions::new(2, 0))
    }

    #[tokio::test]
    async fn fill_acts_on_the_strategy_pick() {
        let page = FixturePage::new(PageFixture::default())
            .with_element(ElementFixture::new("a").selector("input"))
            .with_element(ElementFixture::new("b").selector("input"));
        let report = actions(&page)
            .fill(
                &Query::selector("input"),
                "hello",
                &ActionOptions::new().strategy(StrategyKind::Last),
            )
            .await
            .unwrap();

        assert!(report.performed);
        assert_eq!(report.element_index, Some(1));
        assert_eq!(report.attempts, 1);
        assert_eq!(page.element("b").unwrap().value.as_deref(), Some("hello"));
        assert!(page.element("a").unwrap().value.is_none());
    }

    #[tokio::test]
    async fn missing_target_is_a_no_op_when_not_throwing() {
        let page = FixturePage::new(PageFixture::default());
        let report = actions(&page)
            .click(
                &Query::selector("#ghost"),
                &ActionOptions::new().throw_on_not_found(false),
            )
            .await
            .unwrap();
        assert!(report.ok);
        assert!(!report.performed);
        assert!(page.actions().is_empty());
    }

    #[tokio::test]
    async fn disabled_element_fails_after_retries() {
        let page = FixturePage::new(PageFixture::default())
            .with_element(ElementFixture::new("cb").selector("#agree").disabled());
        let err = actions(&page)
            .check(&Query::selector("#agree"), &ActionOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ElementNotFound);
        assert_eq!(err.attempts(), Some(2));
        assert_eq!(err.root_kind(), ErrorKind::Driver);
        assert!(!page.element("cb").unwrap().checked);
    }

    #[tokio::test]
    async fn upload_records_file_names() {
        let page = FixturePage::new(PageFixture::default())
            .with_element(ElementFixture::new("file").selector("input[type=file]"));
        let paths = vec![PathBuf::from("/tmp/a.txt"), PathBuf::from("/tmp/b.txt")];
        actions(&page)
            .set_input_files(&Query::selector("input[type=file]"), &paths, &ActionOptions::new())
            .await
            .unwrap();
        assert_eq!(page.uploaded_files("file"), vec!["/tmp/a.txt", "/tmp/b.txt"]);
        assert!(matches!(
            page.actions()[0].action,
            FixtureAction::SetInputFiles(_)
        ));
    }
}
