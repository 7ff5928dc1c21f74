//! Core data types for the action facade

use std::fmt;
use std::time::Duration;

use action_locator::{
    HealInfo, LocatorError, Query, ResolveOverrides, RetryOptions, StrategyKind, StrategyOptions,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Primitive performed by the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Navigate,
    Click,
    Fill,
    Hover,
    Check,
    Uncheck,
    SelectOption,
    SetInputFiles,
    Expect,
    Wait,
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Navigate => "navigate",
            ActionKind::Click => "click",
            ActionKind::Fill => "fill",
            ActionKind::Hover => "hover",
            ActionKind::Check => "check",
            ActionKind::Uncheck => "uncheck",
            ActionKind::SelectOption => "select_option",
            ActionKind::SetInputFiles => "set_input_files",
            ActionKind::Expect => "expect",
            ActionKind::Wait => "wait",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Polling settings for assertions and explicit waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            timeout_ms: 5000,
        }
    }
}

impl WaitOptions {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Per-call options for the facade.
///
/// `retry: None` uses the facade default; `RetryOptions::none()` disables
/// retries for this call.
#[derive(Debug, Clone, Default)]
pub struct ActionOptions {
    pub resolve: ResolveOverrides,
    pub retry: Option<RetryOptions>,
}

impl ActionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.resolve = self.resolve.strategy(strategy);
        self
    }

    pub fn strategy_options(mut self, options: StrategyOptions) -> Self {
        self.resolve = self.resolve.strategy_options(options);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.resolve = self.resolve.timeout(timeout);
        self
    }

    pub fn throw_on_not_found(mut self, flag: bool) -> Self {
        self.resolve = self.resolve.throw_on_not_found(flag);
        self
    }

    pub fn self_healing(mut self, flag: bool) -> Self {
        self.resolve = self.resolve.self_healing(flag);
        self
    }

    pub fn retry(mut self, retry: RetryOptions) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn no_retry(self) -> Self {
        self.retry(RetryOptions::none())
    }
}

/// Self-heal information (populated when a logical key healed)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfHealInfo {
    pub key: String,

    /// Primary selector that matched nothing
    pub original_selector: String,

    /// Alternative that was used instead
    pub healed_selector: String,

    /// Position of the alternative in the catalog entry
    pub position: usize,
}

impl From<&HealInfo> for SelfHealInfo {
    fn from(heal: &HealInfo) -> Self {
        Self {
            key: heal.key.clone(),
            original_selector: heal.primary.clone(),
            healed_selector: heal.healed.clone(),
            position: heal.position,
        }
    }
}

/// Action execution report
///
/// `performed == false` with `ok == true` is the documented no-op: the
/// target was absent and the call ran with `throw_on_not_found` off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionReport {
    pub action_id: String,

    pub action: ActionKind,

    pub ok: bool,

    pub performed: bool,

    /// Query as given by the caller
    pub target: String,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,

    pub latency_ms: u64,

    /// Selector that produced the acted-on element
    pub selector: Option<String>,

    /// Index of the element within its candidate set
    pub element_index: Option<usize>,

    pub self_heal: Option<SelfHealInfo>,

    pub attempts: u32,

    pub error: Option<String>,
}

impl ActionReport {
    pub fn started(action: ActionKind, target: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action,
            ok: true,
            performed: false,
            target: target.into(),
            started_at: now,
            finished_at: now,
            latency_ms: 0,
            selector: None,
            element_index: None,
            self_heal: None,
            attempts: 0,
            error: None,
        }
    }

    /// Stamp completion time and latency.
    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self.latency_ms = (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64;
        self
    }

    /// Report for a call that failed with `error`.
    pub fn failure(action: ActionKind, target: impl Into<String>, error: &LocatorError) -> Self {
        let mut report = Self::started(action, target);
        report.ok = false;
        report.attempts = error.attempts().unwrap_or(1);
        report.error = Some(error.to_string());
        report.finish()
    }

    pub fn was_healed(&self) -> bool {
        self.self_heal.is_some()
    }
}

/// Expected text of an element.
#[derive(Debug, Clone)]
pub enum TextExpectation {
    Exact(String),
    Contains(String),
    Pattern(Regex),
}

impl TextExpectation {
    pub fn pattern(pattern: &str) -> Result<Self, LocatorError> {
        Regex::new(pattern).map(TextExpectation::Pattern).map_err(|err| {
            LocatorError::new(
                action_locator::ErrorKind::ConfigurationError,
                format!("invalid text pattern '{}'", pattern),
            )
            .with_cause(err)
        })
    }

    pub fn matches(&self, actual: &str) -> bool {
        match self {
            TextExpectation::Exact(expected) => actual == expected,
            TextExpectation::Contains(needle) => actual.contains(needle.as_str()),
            TextExpectation::Pattern(regex) => regex.is_match(actual),
        }
    }
}

impl fmt::Display for TextExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextExpectation::Exact(text) => write!(f, "text == '{}'", text),
            TextExpectation::Contains(text) => write!(f, "text contains '{}'", text),
            TextExpectation::Pattern(regex) => write!(f, "text matches /{}/", regex.as_str()),
        }
    }
}

/// Element state asserted by `expect` or awaited by `wait_for`.
#[derive(Debug, Clone)]
pub enum Expectation {
    Visible,
    /// Not visible, or absent altogether
    Hidden,
    Enabled,
    Text(TextExpectation),
    Value(String),
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Visible => f.write_str("visible"),
            Expectation::Hidden => f.write_str("hidden"),
            Expectation::Enabled => f.write_str("enabled"),
            Expectation::Text(text) => write!(f, "{}", text),
            Expectation::Value(value) => write!(f, "value == '{}'", value),
        }
    }
}

/// Wait conditions for the explicit wait primitive
#[derive(Debug, Clone)]
pub enum WaitCondition {
    ElementVisible(Query),
    ElementHidden(Query),
    /// Exactly `count` elements match `selector`
    ElementCount { selector: String, count: usize },
    UrlContains(String),
    /// Fixed delay in milliseconds
    Duration(u64),
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitCondition::ElementVisible(query) => write!(f, "{} visible", query),
            WaitCondition::ElementHidden(query) => write!(f, "{} hidden", query),
            WaitCondition::ElementCount { selector, count } => {
                write!(f, "{} elements matching {}", count, selector)
            }
            WaitCondition::UrlContains(fragment) => write!(f, "url contains '{}'", fragment),
            WaitCondition::Duration(ms) => write!(f, "{}ms", ms),
        }
    }
}
