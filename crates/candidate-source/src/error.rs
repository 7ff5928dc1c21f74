//! Error types reported by a candidate source

use std::fmt;

use thiserror::Error;

/// Failure categories a driver can report back to the locator.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    #[error("element detached from the page")]
    Detached,
    #[error("driver timed out")]
    Timeout,
    #[error("navigation failed")]
    Navigation,
    #[error("operation not supported")]
    Unsupported,
    #[error("protocol failure")]
    Protocol,
}

/// Enriched error returned by every `CandidateSource` / `ElementHandle` call.
#[derive(Clone, Debug)]
pub struct SourceError {
    pub kind: SourceErrorKind,
    pub hint: Option<String>,
    pub retriable: bool,
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for SourceError {}

impl SourceError {
    pub fn new(kind: SourceErrorKind) -> Self {
        let retriable = matches!(
            kind,
            SourceErrorKind::Detached | SourceErrorKind::Timeout | SourceErrorKind::Navigation
        );
        Self {
            kind,
            hint: None,
            retriable,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn retriable(mut self, flag: bool) -> Self {
        self.retriable = flag;
        self
    }

    pub fn detached(hint: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Detached).with_hint(hint)
    }

    pub fn not_interactable(hint: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Protocol)
            .with_hint(hint)
            .retriable(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_hint() {
        let err = SourceError::detached("node #submit is gone");
        assert_eq!(
            err.to_string(),
            "element detached from the page: node #submit is gone"
        );
        assert!(err.retriable);
    }

    #[test]
    fn unsupported_is_not_retriable() {
        assert!(!SourceError::new(SourceErrorKind::Unsupported).retriable);
    }
}
