//! Core types for the resolution engine

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use candidate_source::ElementHandle;
use regex::Regex;
use serde::{Deserialize, Serialize};
use steadyhand_core_types::ElementId;

use crate::errors::LocatorError;

/// Default resolution timeout (milliseconds).
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// What the caller wants resolved.
#[derive(Clone, Debug)]
pub enum Query {
    /// Raw selector executed against the candidate source
    Selector(String),

    /// Handle obtained earlier; resolves to itself
    Handle(Arc<dyn ElementHandle>),

    /// Logical key looked up in the self-healing catalog
    Logical(String),
}

impl Query {
    pub fn selector(selector: impl Into<String>) -> Self {
        Query::Selector(selector.into())
    }

    pub fn logical(key: impl Into<String>) -> Self {
        Query::Logical(key.into())
    }

    pub fn handle(handle: Arc<dyn ElementHandle>) -> Self {
        Query::Handle(handle)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Query::Logical(_))
    }
}

impl From<&str> for Query {
    fn from(selector: &str) -> Self {
        Query::Selector(selector.to_string())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Selector(selector) => write!(f, "selector:{}", selector),
            Query::Handle(handle) => write!(f, "handle:{}", handle.id()),
            Query::Logical(key) => write!(f, "key:{}", key),
        }
    }
}

/// Policy used to pick one candidate from an ambiguous set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    First,
    Last,
    Index,
    ContainsText,
    MatchesAttribute,
    MostVisible,
    ClosestToCenter,
    ClosestToElement,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::First => "first",
            StrategyKind::Last => "last",
            StrategyKind::Index => "index",
            StrategyKind::ContainsText => "contains_text",
            StrategyKind::MatchesAttribute => "matches_attribute",
            StrategyKind::MostVisible => "most_visible",
            StrategyKind::ClosestToCenter => "closest_to_center",
            StrategyKind::ClosestToElement => "closest_to_element",
        }
    }

    pub fn all() -> [StrategyKind; 8] {
        [
            StrategyKind::First,
            StrategyKind::Last,
            StrategyKind::Index,
            StrategyKind::ContainsText,
            StrategyKind::MatchesAttribute,
            StrategyKind::MostVisible,
            StrategyKind::ClosestToCenter,
            StrategyKind::ClosestToElement,
        ]
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    /// Accepts `most_visible`, `most-visible` and `MOST_VISIBLE`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        StrategyKind::all()
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| format!("unknown strategy '{}'", s))
    }
}

/// Expected attribute value: exact string or regular expression.
#[derive(Clone, Debug)]
pub enum AttributeMatcher {
    Exact(String),
    Pattern(Regex),
}

impl AttributeMatcher {
    pub fn exact(value: impl Into<String>) -> Self {
        AttributeMatcher::Exact(value.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, LocatorError> {
        Regex::new(pattern).map(AttributeMatcher::Pattern).map_err(|err| {
            LocatorError::configuration(
                StrategyKind::MatchesAttribute,
                format!("invalid attribute pattern '{}'", pattern),
            )
            .with_cause(err)
        })
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            AttributeMatcher::Exact(expected) => expected == value,
            AttributeMatcher::Pattern(regex) => regex.is_match(value),
        }
    }
}

impl fmt::Display for AttributeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeMatcher::Exact(value) => write!(f, "'{}'", value),
            AttributeMatcher::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

/// Per-strategy parameters. Each strategy reads only the fields it needs
/// and rejects the call when one of them is missing.
#[derive(Clone, Debug, Default)]
pub struct StrategyOptions {
    pub index: Option<usize>,
    pub text: Option<String>,
    pub attribute_name: Option<String>,
    pub attribute_value: Option<AttributeMatcher>,
    pub reference_locator: Option<Box<Query>>,
}

impl StrategyOptions {
    pub fn index(index: usize) -> Self {
        Self {
            index: Some(index),
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn attribute(name: impl Into<String>, value: AttributeMatcher) -> Self {
        Self {
            attribute_name: Some(name.into()),
            attribute_value: Some(value),
            ..Self::default()
        }
    }

    pub fn reference(locator: Query) -> Self {
        Self {
            reference_locator: Some(Box::new(locator)),
            ..Self::default()
        }
    }
}

/// Fully merged options for one resolution.
#[derive(Clone, Debug)]
pub struct ResolutionOptions {
    pub strategy: StrategyKind,
    pub strategy_options: StrategyOptions,
    pub timeout: Duration,
    pub throw_on_not_found: bool,
    /// When false a logical key resolves through its primary selector only.
    pub self_healing: bool,
}

impl Default for ResolutionOptions {
    fn default() -> Self {
        ResolutionOptions::effective(&ResolveOverrides::default(), &ResolverDefaults::default())
    }
}

impl ResolutionOptions {
    /// Merge caller overrides over resolver defaults.
    pub fn effective(overrides: &ResolveOverrides, defaults: &ResolverDefaults) -> Self {
        Self {
            strategy: overrides.strategy.unwrap_or(defaults.strategy),
            strategy_options: overrides.strategy_options.clone().unwrap_or_default(),
            timeout: overrides.timeout.unwrap_or(defaults.timeout),
            throw_on_not_found: overrides
                .throw_on_not_found
                .unwrap_or(defaults.throw_on_not_found),
            self_healing: overrides.self_healing.unwrap_or(defaults.self_healing),
        }
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_strategy_options(mut self, options: StrategyOptions) -> Self {
        self.strategy_options = options;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn throw_on_not_found(mut self, flag: bool) -> Self {
        self.throw_on_not_found = flag;
        self
    }

    pub fn self_healing(mut self, flag: bool) -> Self {
        self.self_healing = flag;
        self
    }
}

/// Process-wide defaults, normally sourced from configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverDefaults {
    pub strategy: StrategyKind,
    pub timeout: Duration,
    pub throw_on_not_found: bool,
    pub self_healing: bool,
}

impl Default for ResolverDefaults {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::First,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            throw_on_not_found: true,
            self_healing: true,
        }
    }
}

/// Caller-side options; unset fields fall back to `ResolverDefaults`.
#[derive(Clone, Debug, Default)]
pub struct ResolveOverrides {
    pub strategy: Option<StrategyKind>,
    pub strategy_options: Option<StrategyOptions>,
    pub timeout: Option<Duration>,
    pub throw_on_not_found: Option<bool>,
    pub self_healing: Option<bool>,
}

impl ResolveOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn strategy_options(mut self, options: StrategyOptions) -> Self {
        self.strategy_options = Some(options);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn throw_on_not_found(mut self, flag: bool) -> Self {
        self.throw_on_not_found = Some(flag);
        self
    }

    pub fn self_healing(mut self, flag: bool) -> Self {
        self.self_healing = Some(flag);
        self
    }
}

/// Bounded retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryOptions {
    pub max_retries: u32,
    pub delay_ms: u64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay_ms: 1000,
        }
    }
}

impl RetryOptions {
    pub fn new(max_retries: u32, delay_ms: u64) -> Self {
        Self {
            max_retries,
            delay_ms,
        }
    }

    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self::new(1, 0)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Record of a self-healing substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealInfo {
    pub key: String,
    pub primary: String,
    pub healed: String,
    /// Position of `healed` in the catalog entry
    pub position: usize,
}

/// The single candidate picked by a resolution.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub element: Arc<dyn ElementHandle>,
    /// Index of the element within the candidate set
    pub index: usize,
    /// Size of the candidate set
    pub total: usize,
    /// Selector that produced the set; `None` for handle queries
    pub selector: Option<String>,
    pub strategy: StrategyKind,
    pub heal: Option<HealInfo>,
}

impl Resolution {
    pub fn element_id(&self) -> &ElementId {
        self.element.id()
    }

    pub fn was_healed(&self) -> bool {
        self.heal.is_some()
    }
}
