//! Scenario files and the step runner
//!
//! A scenario is a YAML list of steps executed in order against one page;
//! the run stops at the first failing step.
//!
//! ```yaml
//! name: checkout
//! steps:
//!   - action: fill
//!     key: checkout.email
//!     value: buyer@shop.test
//!   - action: click
//!     selector: button.pay
//!     strategy: most_visible
//!   - action: expect_text
//!     selector: "#status"
//!     contains: Paid
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use action_locator::{
    AttributeMatcher, LocatorError, Query, RetryOptions, StrategyKind, StrategyOptions,
};
use action_primitives::{
    ActionKind, ActionOptions, ActionReport, Actions, Expectation, TextExpectation, WaitCondition,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("step {index} ({action}): {reason}")]
    InvalidStep {
        index: usize,
        action: &'static str,
        reason: String,
    },
}

/// Step verbs accepted in scenario files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Navigate,
    Click,
    Fill,
    Hover,
    Check,
    Uncheck,
    Select,
    Upload,
    ExpectVisible,
    ExpectHidden,
    ExpectEnabled,
    ExpectText,
    ExpectValue,
    Wait,
}

impl StepAction {
    pub fn name(&self) -> &'static str {
        match self {
            StepAction::Navigate => "navigate",
            StepAction::Click => "click",
            StepAction::Fill => "fill",
            StepAction::Hover => "hover",
            StepAction::Check => "check",
            StepAction::Uncheck => "uncheck",
            StepAction::Select => "select",
            StepAction::Upload => "upload",
            StepAction::ExpectVisible => "expect_visible",
            StepAction::ExpectHidden => "expect_hidden",
            StepAction::ExpectEnabled => "expect_enabled",
            StepAction::ExpectText => "expect_text",
            StepAction::ExpectValue => "expect_value",
            StepAction::Wait => "wait",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeSpec {
    pub name: String,
    pub value: Option<String>,
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    Visible,
    Hidden,
}

/// One step as written in the scenario file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepSpec {
    pub action: StepAction,

    // target
    pub selector: Option<String>,
    pub key: Option<String>,

    // arguments
    pub url: Option<String>,
    pub value: Option<String>,
    #[serde(default)]
    pub files: Vec<PathBuf>,

    // expect_text
    pub text: Option<String>,
    pub contains: Option<String>,
    pub pattern: Option<String>,

    // resolution
    pub strategy: Option<StrategyKind>,
    pub index: Option<usize>,
    pub has_text: Option<String>,
    pub attribute: Option<AttributeSpec>,
    pub reference: Option<String>,
    pub timeout_ms: Option<u64>,
    pub throw_on_not_found: Option<bool>,
    pub self_healing: Option<bool>,
    pub retries: Option<u32>,

    // wait
    pub ms: Option<u64>,
    pub state: Option<WaitState>,
    pub count: Option<usize>,
    pub url_contains: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScenarioFile {
    #[serde(default)]
    name: Option<String>,
    steps: Vec<StepSpec>,
}

#[derive(Debug, Clone)]
pub enum Interaction {
    Click,
    Fill(String),
    Hover,
    Check,
    Uncheck,
    Select(String),
    Upload(Vec<PathBuf>),
}

impl Interaction {
    fn kind(&self) -> ActionKind {
        match self {
            Interaction::Click => ActionKind::Click,
            Interaction::Fill(_) => ActionKind::Fill,
            Interaction::Hover => ActionKind::Hover,
            Interaction::Check => ActionKind::Check,
            Interaction::Uncheck => ActionKind::Uncheck,
            Interaction::Select(_) => ActionKind::SelectOption,
            Interaction::Upload(_) => ActionKind::SetInputFiles,
        }
    }
}

#[derive(Debug, Clone)]
pub enum StepKind {
    Navigate {
        url: String,
    },
    Interact {
        target: Query,
        interaction: Interaction,
        options: ActionOptions,
    },
    Expect {
        target: Query,
        expectation: Expectation,
        options: ActionOptions,
    },
    Wait {
        condition: WaitCondition,
        timeout: Option<Duration>,
    },
}

/// A validated step.
#[derive(Debug, Clone)]
pub struct Step {
    pub kind: StepKind,
    /// Per-step attempt budget; the delay comes from configuration
    pub retries: Option<u32>,
}

impl Step {
    pub fn action_kind(&self) -> ActionKind {
        match &self.kind {
            StepKind::Navigate { .. } => ActionKind::Navigate,
            StepKind::Interact { interaction, .. } => interaction.kind(),
            StepKind::Expect { .. } => ActionKind::Expect,
            StepKind::Wait { .. } => ActionKind::Wait,
        }
    }

    pub fn describe(&self) -> String {
        match &self.kind {
            StepKind::Navigate { url } => format!("navigate {}", url),
            StepKind::Interact {
                target,
                interaction,
                ..
            } => format!("{} {}", interaction.kind(), target),
            StepKind::Expect {
                target,
                expectation,
                ..
            } => format!("expect {} {}", target, expectation),
            StepKind::Wait { condition, .. } => format!("wait {}", condition),
        }
    }

    fn target(&self) -> String {
        match &self.kind {
            StepKind::Navigate { url } => url.clone(),
            StepKind::Interact { target, .. } | StepKind::Expect { target, .. } => {
                target.to_string()
            }
            StepKind::Wait { condition, .. } => condition.to_string(),
        }
    }

    pub async fn execute(&self, actions: &Actions) -> Result<ActionReport, LocatorError> {
        let retry = self.retries.map(|max_retries| RetryOptions {
            max_retries,
            ..actions.retry_options()
        });
        let with_retry = |options: &ActionOptions| ActionOptions {
            resolve: options.resolve.clone(),
            retry: retry.or(options.retry),
        };

        match &self.kind {
            StepKind::Navigate { url } => actions.navigate(url, retry).await,
            StepKind::Interact {
                target,
                interaction,
                options,
            } => {
                let options = with_retry(options);
                match interaction {
                    Interaction::Click => actions.click(target, &options).await,
                    Interaction::Fill(value) => actions.fill(target, value, &options).await,
                    Interaction::Hover => actions.hover(target, &options).await,
                    Interaction::Check => actions.check(target, &options).await,
                    Interaction::Uncheck => actions.uncheck(target, &options).await,
                    Interaction::Select(value) => {
                        actions.select_option(target, value, &options).await
                    }
                    Interaction::Upload(files) => {
                        actions.set_input_files(target, files, &options).await
                    }
                }
            }
            StepKind::Expect {
                target,
                expectation,
                options,
            } => actions.expect(target, expectation, &with_retry(options)).await,
            StepKind::Wait { condition, timeout } => actions.wait_for(condition, *timeout).await,
        }
    }
}

/// A parsed, validated scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_yaml_str(raw: &str, default_name: &str) -> Result<Self, ScenarioError> {
        let file: ScenarioFile = serde_yaml::from_str(raw)?;
        let steps = file
            .steps
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                spec.compile().map_err(|reason| ScenarioError::InvalidStep {
                    index: index + 1,
                    action: spec.action.name(),
                    reason,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: file.name.unwrap_or_else(|| default_name.to_string()),
            steps,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let default_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scenario".to_string());
        Self::from_yaml_str(&raw, &default_name)
    }
}

impl StepSpec {
    fn compile(&self) -> Result<Step, String> {
        let kind = match self.action {
            StepAction::Navigate => StepKind::Navigate {
                url: self.require(self.url.as_ref(), "url")?.clone(),
            },
            StepAction::Click => self.interact(Interaction::Click)?,
            StepAction::Fill => {
                let value = self.require(self.value.as_ref(), "value")?;
                self.interact(Interaction::Fill(value.clone()))?
            }
            StepAction::Hover => self.interact(Interaction::Hover)?,
            StepAction::Check => self.interact(Interaction::Check)?,
            StepAction::Uncheck => self.interact(Interaction::Uncheck)?,
            StepAction::Select => {
                let value = self.require(self.value.as_ref(), "value")?;
                self.interact(Interaction::Select(value.clone()))?
            }
            StepAction::Upload => {
                if self.files.is_empty() {
                    return Err("'files' must list at least one path".to_string());
                }
                self.interact(Interaction::Upload(self.files.clone()))?
            }
            StepAction::ExpectVisible => self.expect(Expectation::Visible)?,
            StepAction::ExpectHidden => self.expect(Expectation::Hidden)?,
            StepAction::ExpectEnabled => self.expect(Expectation::Enabled)?,
            StepAction::ExpectText => self.expect(Expectation::Text(self.text_expectation()?))?,
            StepAction::ExpectValue => {
                let value = self.require(self.value.as_ref(), "value")?;
                self.expect(Expectation::Value(value.clone()))?
            }
            StepAction::Wait => StepKind::Wait {
                condition: self.wait_condition()?,
                timeout: self.timeout_ms.map(Duration::from_millis),
            },
        };
        Ok(Step {
            kind,
            retries: self.retries,
        })
    }

    fn require<'a, T>(&self, field: Option<&'a T>, name: &str) -> Result<&'a T, String> {
        field.ok_or_else(|| format!("missing '{}'", name))
    }

    fn target(&self) -> Result<Query, String> {
        match (&self.selector, &self.key) {
            (Some(selector), None) => Ok(Query::selector(selector.clone())),
            (None, Some(key)) => Ok(Query::logical(key.clone())),
            (Some(_), Some(_)) => Err("use either 'selector' or 'key', not both".to_string()),
            (None, None) => Err("missing target: set 'selector' or 'key'".to_string()),
        }
    }

    fn interact(&self, interaction: Interaction) -> Result<StepKind, String> {
        Ok(StepKind::Interact {
            target: self.target()?,
            interaction,
            options: self.action_options()?,
        })
    }

    fn expect(&self, expectation: Expectation) -> Result<StepKind, String> {
        Ok(StepKind::Expect {
            target: self.target()?,
            expectation,
            options: self.action_options()?,
        })
    }

    fn action_options(&self) -> Result<ActionOptions, String> {
        let mut options = ActionOptions::new();
        if let Some(strategy) = self.strategy {
            options = options.strategy(strategy);
        }
        let strategy_options = StrategyOptions {
            index: self.index,
            text: self.has_text.clone(),
            attribute_name: self.attribute.as_ref().map(|a| a.name.clone()),
            attribute_value: self
                .attribute
                .as_ref()
                .map(attribute_matcher)
                .transpose()?,
            reference_locator: self
                .reference
                .as_ref()
                .map(|selector| Box::new(Query::selector(selector.clone()))),
        };
        options = options.strategy_options(strategy_options);
        if let Some(ms) = self.timeout_ms {
            options = options.timeout(Duration::from_millis(ms));
        }
        if let Some(flag) = self.throw_on_not_found {
            options = options.throw_on_not_found(flag);
        }
        if let Some(flag) = self.self_healing {
            options = options.self_healing(flag);
        }
        Ok(options)
    }

    fn text_expectation(&self) -> Result<TextExpectation, String> {
        match (&self.text, &self.contains, &self.pattern) {
            (Some(text), None, None) => Ok(TextExpectation::Exact(text.clone())),
            (None, Some(text), None) => Ok(TextExpectation::Contains(text.clone())),
            (None, None, Some(pattern)) => {
                TextExpectation::pattern(pattern).map_err(|err| err.to_string())
            }
            _ => Err("set exactly one of 'text', 'contains' or 'pattern'".to_string()),
        }
    }

    fn wait_condition(&self) -> Result<WaitCondition, String> {
        if let Some(ms) = self.ms {
            return Ok(WaitCondition::Duration(ms));
        }
        if let Some(fragment) = &self.url_contains {
            return Ok(WaitCondition::UrlContains(fragment.clone()));
        }
        if let Some(count) = self.count {
            let selector = self.require(self.selector.as_ref(), "selector")?;
            return Ok(WaitCondition::ElementCount {
                selector: selector.clone(),
                count,
            });
        }
        let target = self.target()?;
        Ok(match self.state.unwrap_or(WaitState::Visible) {
            WaitState::Visible => WaitCondition::ElementVisible(target),
            WaitState::Hidden => WaitCondition::ElementHidden(target),
        })
    }
}

fn attribute_matcher(spec: &AttributeSpec) -> Result<AttributeMatcher, String> {
    match (&spec.value, &spec.pattern) {
        (Some(value), None) => Ok(AttributeMatcher::exact(value.clone())),
        (None, Some(pattern)) => AttributeMatcher::pattern(pattern).map_err(|err| err.to_string()),
        _ => Err(format!(
            "attribute '{}' needs exactly one of 'value' or 'pattern'",
            spec.name
        )),
    }
}

/// Result of one executed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub description: String,
    pub report: ActionReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub steps: Vec<StepOutcome>,
    /// 1-based index of the failing step
    pub failed_at: Option<usize>,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.failed_at.is_none()
    }
}

/// Run every step in order, stopping at the first failure.
pub async fn run_scenario(actions: &Actions, scenario: &Scenario) -> ScenarioOutcome {
    info!(scenario = %scenario.name, steps = scenario.steps.len(), "Running scenario");
    let mut outcome = ScenarioOutcome {
        name: scenario.name.clone(),
        steps: Vec::with_capacity(scenario.steps.len()),
        failed_at: None,
    };

    for (offset, step) in scenario.steps.iter().enumerate() {
        let index = offset + 1;
        let description = step.describe();
        let report = match step.execute(actions).await {
            Ok(report) => report,
            Err(err) => {
                warn!(step = index, error = %err, "Scenario step failed");
                outcome.failed_at = Some(index);
                ActionReport::failure(step.action_kind(), step.target(), &err)
            }
        };
        outcome.steps.push(StepOutcome {
            index,
            description,
            report,
        });
        if outcome.failed_at.is_some() {
            break;
        }
    }
    outcome
}
