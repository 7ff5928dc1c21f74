//! Error taxonomy for resolution, self-healing and retries

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use candidate_source::{SourceError, SourceErrorKind};
use thiserror::Error;

use crate::types::StrategyKind;

/// Failure categories surfaced to callers.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Query matched nothing, or the strategy found no acceptable candidate
    #[error("element not found")]
    ElementNotFound,

    /// Blank selector, empty alternative list, or unknown logical key
    #[error("invalid selector")]
    InvalidSelector,

    /// Every catalog alternative for a logical key came up empty
    #[error("self-healing failed")]
    SelfHealingFailed,

    #[error("navigation failed")]
    NavigationFailed,

    #[error("timeout")]
    Timeout,

    #[error("assertion failed")]
    AssertionFailed,

    /// Caller supplied options that the selected strategy cannot work with
    #[error("configuration error")]
    ConfigurationError,

    /// Candidate source failure that fits none of the other kinds
    #[error("driver error")]
    Driver,
}

type Cause = Arc<dyn StdError + Send + Sync + 'static>;

/// Typed error carrying enough context to tell an absent element, a stale
/// selector catalog and a misconfigured call apart.
#[derive(Clone, Debug)]
pub struct LocatorError {
    kind: ErrorKind,
    message: String,
    target: Option<String>,
    strategy: Option<StrategyKind>,
    attempts: Option<u32>,
    retryable: bool,
    cause: Option<Cause>,
}

impl LocatorError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            target: None,
            strategy: None,
            attempts: None,
            retryable: true,
            cause: None,
        }
    }

    pub fn element_not_found(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ElementNotFound, message).with_target(target)
    }

    pub fn invalid_selector(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidSelector, message).with_target(target)
    }

    pub fn self_healing_failed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SelfHealingFailed, message).with_target(key)
    }

    pub fn configuration(strategy: StrategyKind, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigurationError, message).with_strategy(strategy)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn assertion(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AssertionFailed, message).with_target(target)
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    /// Mark the failure as permanent so `retry` returns it at once.
    pub fn permanent(mut self) -> Self {
        self.retryable = false;
        self
    }

    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Offending selector or logical key, when one applies.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn strategy(&self) -> Option<StrategyKind> {
        self.strategy
    }

    pub fn attempts(&self) -> Option<u32> {
        self.attempts
    }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Kind of the innermost `LocatorError` in the cause chain.
    pub fn root_kind(&self) -> ErrorKind {
        let mut current = self;
        while let Some(inner) = current
            .cause()
            .and_then(|cause| cause.downcast_ref::<LocatorError>())
        {
            current = inner;
        }
        current.kind
    }

    /// Caller mistakes and failures the driver marked permanent are never
    /// retried.
    pub fn is_retryable(&self) -> bool {
        self.retryable
            && !matches!(
                self.kind,
                ErrorKind::ConfigurationError | ErrorKind::InvalidSelector
            )
    }
}

impl fmt::Display for LocatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(attempts) = self.attempts {
            write!(f, " (attempts: {})", attempts)?;
        }
        Ok(())
    }
}

impl StdError for LocatorError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

impl From<SourceError> for LocatorError {
    fn from(err: SourceError) -> Self {
        let kind = match err.kind {
            SourceErrorKind::Timeout => ErrorKind::Timeout,
            SourceErrorKind::Navigation => ErrorKind::NavigationFailed,
            _ => ErrorKind::Driver,
        };
        let error = LocatorError::new(kind, err.to_string());
        let error = if err.retriable { error } else { error.permanent() };
        error.with_cause(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_not_retryable() {
        let err = LocatorError::configuration(StrategyKind::Index, "index is required");
        assert!(!err.is_retryable());
        assert_eq!(err.strategy(), Some(StrategyKind::Index));
        assert!(LocatorError::element_not_found(".btn", "no match").is_retryable());
    }

    #[test]
    fn root_kind_walks_nested_causes() {
        let inner = LocatorError::self_healing_failed("login.submit", "catalog exhausted");
        let outer = LocatorError::new(ErrorKind::ElementNotFound, "click failed")
            .with_attempts(3)
            .with_cause(inner);
        assert_eq!(outer.kind(), ErrorKind::ElementNotFound);
        assert_eq!(outer.root_kind(), ErrorKind::SelfHealingFailed);
        assert_eq!(
            outer.to_string(),
            "element not found: click failed (attempts: 3)"
        );
        assert!(StdError::source(&outer).is_some());
    }

    #[test]
    fn source_errors_map_to_kinds() {
        let err: LocatorError = SourceError::new(SourceErrorKind::Navigation).into();
        assert_eq!(err.kind(), ErrorKind::NavigationFailed);
        let err: LocatorError = SourceError::detached("gone").into();
        assert_eq!(err.kind(), ErrorKind::Driver);
        assert!(err.cause().is_some());
    }

    #[test]
    fn permanent_source_errors_stay_permanent() {
        let err: LocatorError = SourceError::new(SourceErrorKind::Navigation)
            .with_hint("host unreachable")
            .retriable(false)
            .into();
        assert_eq!(err.kind(), ErrorKind::NavigationFailed);
        assert!(!err.is_retryable());

        let err: LocatorError = SourceError::detached("gone").into();
        assert!(err.is_retryable());
        let err: LocatorError = SourceError::new(SourceErrorKind::Unsupported).into();
        assert!(!err.is_retryable());
    }
}
