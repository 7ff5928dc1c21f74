//! Action facade
//!
//! Every element action resolves its query through the [`Resolver`], wrapped
//! in the bounded retry, then performs one primitive on the resolved handle:
//! 1. interact - click, fill, hover, check, uncheck, select_option, set_input_files
//! 2. read - is_visible, get_text, get_input_value, get_attribute
//! 3. expect - polling assertions raising `AssertionFailed`
//! 4. navigate - page navigation under retry
//! 5. wait - explicit waits raising `Timeout`

mod expect;
mod interact;
mod navigate;
mod read;
mod wait;

use std::future::Future;
use std::sync::Arc;

use action_locator::{
    retry_classified, ErrorKind, LocatorError, Query, Resolution, ResolutionOptions, Resolver,
    RetryOptions,
};
use candidate_source::{CandidateSource, ElementHandle, SourceError};
use tracing::{debug, info};

use crate::types::{ActionKind, ActionOptions, ActionReport, SelfHealInfo, WaitOptions};

/// Resolve-then-act facade over a candidate source.
pub struct Actions {
    source: Arc<dyn CandidateSource>,
    resolver: Arc<Resolver>,
    retry: RetryOptions,
    wait: WaitOptions,
}

impl Actions {
    pub fn new(resolver: Arc<Resolver>) -> Self {
        Self {
            source: resolver.source().clone(),
            resolver,
            retry: RetryOptions::default(),
            wait: WaitOptions::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryOptions) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }

    pub fn source(&self) -> &Arc<dyn CandidateSource> {
        &self.source
    }

    pub fn retry_options(&self) -> RetryOptions {
        self.retry
    }

    pub fn wait_options(&self) -> WaitOptions {
        self.wait
    }

    /// Resolve `query` once with merged options, without retries.
    pub async fn resolve(
        &self,
        query: &Query,
        options: &ActionOptions,
    ) -> Result<Option<Resolution>, LocatorError> {
        self.resolver.resolve_with(query, &options.resolve).await
    }

    fn resolution_options(&self, options: &ActionOptions) -> ResolutionOptions {
        self.resolver.effective_options(&options.resolve)
    }

    fn retry_for(&self, options: &ActionOptions) -> RetryOptions {
        options.retry.unwrap_or(self.retry)
    }

    /// Resolve then run `perform` on the element, retrying the whole
    /// sequence. A missing element with `throw_on_not_found` off yields a
    /// report with `performed == false`.
    async fn act<F, Fut>(
        &self,
        action: ActionKind,
        query: &Query,
        options: &ActionOptions,
        perform: F,
    ) -> Result<ActionReport, LocatorError>
    where
        F: Fn(Arc<dyn ElementHandle>) -> Fut,
        Fut: Future<Output = Result<(), SourceError>>,
    {
        let mut report = ActionReport::started(action, query.to_string());
        info!(
            action_id = %report.action_id,
            action = %action,
            query = %query,
            "Executing action"
        );

        let resolution_options = self.resolution_options(options);
        let message = format!("{} {}", action, query);
        let mut attempts = 0;

        let resolved = retry_classified(
            || {
                attempts += 1;
                let perform = &perform;
                let resolution_options = &resolution_options;
                async move {
                    let Some(resolution) = self.resolver.resolve(query, resolution_options).await?
                    else {
                        return Ok(None);
                    };
                    perform(resolution.element.clone())
                        .await
                        .map_err(|err| element_error(err, &resolution))?;
                    Ok(Some(resolution))
                }
            },
            &self.retry_for(options),
            exhaustion_kind,
            &message,
        )
        .await?;

        report.attempts = attempts;
        match resolved {
            Some(resolution) => {
                record_resolution(&mut report, &resolution);
                report.performed = true;
            }
            None => debug!(query = %query, "{} skipped: target not found", action),
        }
        let report = report.finish();

        info!(
            action_id = %report.action_id,
            latency_ms = report.latency_ms,
            performed = report.performed,
            "Action completed"
        );
        Ok(report)
    }

    /// Resolve then read a value, retrying the whole sequence. `None` when
    /// the element is absent and `throw_on_not_found` is off.
    async fn read_element<T, F, Fut>(
        &self,
        what: &str,
        query: &Query,
        options: &ActionOptions,
        read: F,
    ) -> Result<Option<T>, LocatorError>
    where
        F: Fn(Arc<dyn ElementHandle>) -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let resolution_options = self.resolution_options(options);
        let message = format!("read {} of {}", what, query);

        retry_classified(
            || {
                let read = &read;
                let resolution_options = &resolution_options;
                async move {
                    match self.resolver.resolve(query, resolution_options).await? {
                        Some(resolution) => read(resolution.element.clone())
                            .await
                            .map(Some)
                            .map_err(|err| element_error(err, &resolution)),
                        None => Ok(None),
                    }
                }
            },
            &self.retry_for(options),
            exhaustion_kind,
            &message,
        )
        .await
    }
}

/// Error kind reported when retries run out. An exhausted selector catalog
/// stays `SelfHealingFailed`; every other last failure is `ElementNotFound`.
fn exhaustion_kind(last: &LocatorError) -> ErrorKind {
    match last.root_kind() {
        ErrorKind::SelfHealingFailed => ErrorKind::SelfHealingFailed,
        _ => ErrorKind::ElementNotFound,
    }
}

fn element_error(err: SourceError, resolution: &Resolution) -> LocatorError {
    let error = LocatorError::from(err).with_strategy(resolution.strategy);
    match &resolution.selector {
        Some(selector) => error.with_target(selector.clone()),
        None => error.with_target(resolution.element_id().to_string()),
    }
}

fn record_resolution(report: &mut ActionReport, resolution: &Resolution) {
    report.selector = resolution.selector.clone();
    report.element_index = Some(resolution.index);
    report.self_heal = resolution.heal.as_ref().map(SelfHealInfo::from);
}
