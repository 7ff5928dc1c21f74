//! Self-healing selector catalog and prober
//!
//! A logical key maps to an ordered list of alternative selectors. Probing
//! walks the list in order and stops at the first selector that matches at
//! least one element; later alternatives are never evaluated.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use candidate_source::CandidateSource;
use tracing::{debug, info, warn};

use crate::errors::LocatorError;
use crate::types::HealInfo;

/// Read-only map of logical keys to ordered selector alternatives.
#[derive(Debug, Clone, Default)]
pub struct SelectorCatalog {
    entries: HashMap<String, Vec<String>>,
}

impl SelectorCatalog {
    /// Build a catalog, rejecting empty alternative lists and blank selectors.
    pub fn new(entries: HashMap<String, Vec<String>>) -> Result<Self, LocatorError> {
        for (key, selectors) in &entries {
            if key.trim().is_empty() {
                return Err(LocatorError::invalid_selector(
                    key.clone(),
                    "logical key must not be blank",
                ));
            }
            if selectors.is_empty() {
                return Err(LocatorError::invalid_selector(
                    key.clone(),
                    format!("logical key '{}' has no selectors", key),
                ));
            }
            if let Some(position) = selectors.iter().position(|s| s.trim().is_empty()) {
                return Err(LocatorError::invalid_selector(
                    key.clone(),
                    format!("selector #{} of '{}' is blank", position, key),
                ));
            }
        }
        Ok(Self { entries })
    }

    pub fn from_entries<I, K, S>(entries: I) -> Result<Self, LocatorError>
    where
        I: IntoIterator<Item = (K, Vec<S>)>,
        K: Into<String>,
        S: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(key, selectors)| {
                (
                    key.into(),
                    selectors.into_iter().map(Into::into).collect::<Vec<_>>(),
                )
            })
            .collect();
        Self::new(map)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn primary(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(|selectors| selectors.first())
            .map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

/// Result of a successful probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub key: String,
    pub selector: String,
    /// Position of `selector` in the catalog entry (0 = primary)
    pub position: usize,
    /// Number of selectors evaluated, including the winning one
    pub probed: usize,
}

impl ProbeOutcome {
    pub fn is_healed(&self) -> bool {
        self.position > 0
    }

    pub fn heal_info(&self, primary: &str) -> Option<HealInfo> {
        self.is_healed().then(|| HealInfo {
            key: self.key.clone(),
            primary: primary.to_string(),
            healed: self.selector.clone(),
            position: self.position,
        })
    }
}

/// Self-healer trait
#[async_trait]
pub trait SelfHealer: Send + Sync {
    /// Find the first catalog alternative for `key` that matches something.
    async fn probe(&self, key: &str) -> Result<ProbeOutcome, LocatorError>;

    /// Primary selector for `key`, without touching the page.
    fn primary(&self, key: &str) -> Result<String, LocatorError>;
}

/// Catalog-backed self-healer probing a candidate source.
pub struct CatalogSelfHealer {
    source: Arc<dyn CandidateSource>,
    catalog: Arc<SelectorCatalog>,
}

impl CatalogSelfHealer {
    pub fn new(source: Arc<dyn CandidateSource>, catalog: Arc<SelectorCatalog>) -> Self {
        Self { source, catalog }
    }

    pub fn catalog(&self) -> &Arc<SelectorCatalog> {
        &self.catalog
    }
}

#[async_trait]
impl SelfHealer for CatalogSelfHealer {
    async fn probe(&self, key: &str) -> Result<ProbeOutcome, LocatorError> {
        let selectors = self.catalog.get(key).ok_or_else(|| {
            LocatorError::self_healing_failed(key, format!("no catalog entry for '{}'", key))
        })?;

        let mut last_error = None;
        for (position, selector) in selectors.iter().enumerate() {
            debug!(key, selector = %selector, position, "probing self-healing alternative");
            match self.source.count(selector).await {
                Ok(count) if count > 0 => {
                    let outcome = ProbeOutcome {
                        key: key.to_string(),
                        selector: selector.clone(),
                        position,
                        probed: position + 1,
                    };
                    if outcome.is_healed() {
                        info!(
                            key,
                            primary = %selectors[0],
                            healed = %selector,
                            position,
                            "self-healed logical key"
                        );
                    }
                    return Ok(outcome);
                }
                Ok(_) => debug!(key, selector = %selector, "alternative matched nothing"),
                Err(err) => {
                    warn!(key, selector = %selector, error = %err, "probe failed");
                    last_error = Some(err);
                }
            }
        }

        warn!(key, tried = selectors.len(), "self-healing catalog exhausted");
        let mut error = LocatorError::self_healing_failed(
            key,
            format!(
                "none of the {} selectors for '{}' matched",
                selectors.len(),
                key
            ),
        );
        if let Some(err) = last_error {
            error = error.with_cause(err);
        }
        Err(error)
    }

    fn primary(&self, key: &str) -> Result<String, LocatorError> {
        self.catalog
            .primary(key)
            .map(str::to_string)
            .ok_or_else(|| {
                LocatorError::invalid_selector(key, format!("unknown logical key '{}'", key))
            })
    }
}
