//! In-memory page backed by a declarative fixture
//!
//! A `FixturePage` answers selector queries from a static element list: an
//! element matches a selector when the selector appears verbatim in its
//! `selectors` list. Actions mutate the fixture state and are recorded so
//! tests can assert on what was performed.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use steadyhand_core_types::{BoundingBox, ElementId, Viewport};
use thiserror::Error;
use tracing::debug;

use crate::error::{SourceError, SourceErrorKind};
use crate::source::{CandidateSet, CandidateSource, ElementHandle};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read page fixture: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse page fixture: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("element '{0}' is declared more than once")]
    DuplicateElement(String),
    #[error("element '{id}' has invalid geometry: {reason}")]
    InvalidGeometry { id: String, reason: String },
}

fn default_true() -> bool {
    true
}

/// One element of a fixture page.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElementFixture {
    pub id: String,
    #[serde(default)]
    pub selectors: Vec<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, rename = "box")]
    pub bounding_box: Option<BoundingBox>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub checked: bool,
    /// Allowed values for `select_option`; empty accepts anything.
    #[serde(default)]
    pub options: Vec<String>,
}

impl ElementFixture {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            selectors: Vec::new(),
            visible: true,
            enabled: true,
            bounding_box: None,
            text: None,
            attributes: BTreeMap::new(),
            value: None,
            checked: false,
            options: Vec::new(),
        }
    }

    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selectors.push(selector.into());
        self
    }

    pub fn with_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounding_box = Some(BoundingBox::new(x, y, width, height));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Declarative description of a page.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PageFixture {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub viewport: Option<Viewport>,
    #[serde(default)]
    pub elements: Vec<ElementFixture>,
    /// URLs whose navigation always fails.
    #[serde(default)]
    pub unreachable: Vec<String>,
}

impl PageFixture {
    pub fn from_yaml_str(raw: &str) -> Result<Self, FixtureError> {
        let fixture: PageFixture = serde_yaml::from_str(raw)?;
        fixture.validate()?;
        Ok(fixture)
    }

    /// Load a fixture file. JSON parses as YAML, so both formats are accepted.
    pub fn load_from_path(path: &Path) -> Result<Self, FixtureError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), FixtureError> {
        let mut seen = HashSet::new();
        for element in &self.elements {
            if !seen.insert(element.id.as_str()) {
                return Err(FixtureError::DuplicateElement(element.id.clone()));
            }
            if let Some(b) = element.bounding_box {
                BoundingBox::try_new(b.x, b.y, b.width, b.height).map_err(|err| {
                    FixtureError::InvalidGeometry {
                        id: element.id.clone(),
                        reason: err.to_string(),
                    }
                })?;
            }
        }
        Ok(())
    }
}

/// Primitive action recorded by the fixture.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum FixtureAction {
    Click,
    Fill(String),
    Hover,
    Check,
    Uncheck,
    SelectOption(String),
    SetInputFiles(Vec<String>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    pub element: ElementId,
    pub action: FixtureAction,
}

#[derive(Debug, Default)]
struct FixtureState {
    fixture: PageFixture,
    actions: Vec<ActionRecord>,
    queries: Vec<String>,
    uploads: HashMap<String, Vec<String>>,
    navigation_failures: u32,
}

impl FixtureState {
    fn element(&self, id: &ElementId) -> Result<&ElementFixture, SourceError> {
        self.fixture
            .elements
            .iter()
            .find(|e| e.id == id.0)
            .ok_or_else(|| SourceError::detached(format!("element '{}' no longer exists", id)))
    }

    fn element_mut(&mut self, id: &ElementId) -> Result<&mut ElementFixture, SourceError> {
        self.fixture
            .elements
            .iter_mut()
            .find(|e| e.id == id.0)
            .ok_or_else(|| SourceError::detached(format!("element '{}' no longer exists", id)))
    }
}

/// In-memory `CandidateSource`.
#[derive(Clone, Debug, Default)]
pub struct FixturePage {
    state: Arc<RwLock<FixtureState>>,
}

impl FixturePage {
    pub fn new(fixture: PageFixture) -> Self {
        Self {
            state: Arc::new(RwLock::new(FixtureState {
                fixture,
                ..FixtureState::default()
            })),
        }
    }

    pub fn with_viewport(self, width: f64, height: f64) -> Self {
        self.state.write().fixture.viewport = Some(Viewport::new(width, height));
        self
    }

    pub fn with_element(self, element: ElementFixture) -> Self {
        self.state.write().fixture.elements.push(element);
        self
    }

    pub fn insert_element(&self, element: ElementFixture) {
        self.state.write().fixture.elements.push(element);
    }

    pub fn remove_element(&self, id: &str) -> bool {
        let mut guard = self.state.write();
        let before = guard.fixture.elements.len();
        guard.fixture.elements.retain(|e| e.id != id);
        guard.fixture.elements.len() != before
    }

    /// Apply an in-place change to one element; returns false when it does not exist.
    pub fn update_element<F>(&self, id: &str, change: F) -> bool
    where
        F: FnOnce(&mut ElementFixture),
    {
        let mut guard = self.state.write();
        match guard.fixture.elements.iter_mut().find(|e| e.id == id) {
            Some(element) => {
                change(element);
                true
            }
            None => false,
        }
    }

    pub fn element(&self, id: &str) -> Option<ElementFixture> {
        self.state
            .read()
            .fixture
            .elements
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    /// Make the next `count` navigations fail with a retriable error.
    pub fn fail_next_navigations(&self, count: u32) {
        self.state.write().navigation_failures = count;
    }

    pub fn actions(&self) -> Vec<ActionRecord> {
        self.state.read().actions.clone()
    }

    /// Every selector passed to `query` or `count`, in call order.
    pub fn queried_selectors(&self) -> Vec<String> {
        self.state.read().queries.clone()
    }

    pub fn clear_logs(&self) {
        let mut guard = self.state.write();
        guard.actions.clear();
        guard.queries.clear();
    }

    pub fn uploaded_files(&self, id: &str) -> Vec<String> {
        self.state
            .read()
            .uploads
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    fn matching_ids(&self, selector: &str) -> Vec<ElementId> {
        let mut guard = self.state.write();
        guard.queries.push(selector.to_string());
        guard
            .fixture
            .elements
            .iter()
            .filter(|e| e.selectors.iter().any(|s| s == selector))
            .map(|e| ElementId(e.id.clone()))
            .collect()
    }
}

#[async_trait]
impl CandidateSource for FixturePage {
    async fn query(&self, selector: &str) -> Result<CandidateSet, SourceError> {
        let matches = self.matching_ids(selector);
        debug!(selector, matches = matches.len(), "fixture query");
        Ok(matches
            .into_iter()
            .map(|id| {
                Arc::new(FixtureElement {
                    id,
                    state: Arc::clone(&self.state),
                }) as Arc<dyn ElementHandle>
            })
            .collect())
    }

    async fn count(&self, selector: &str) -> Result<usize, SourceError> {
        Ok(self.matching_ids(selector).len())
    }

    async fn viewport_size(&self) -> Result<Option<Viewport>, SourceError> {
        Ok(self.state.read().fixture.viewport)
    }

    async fn navigate(&self, url: &str) -> Result<(), SourceError> {
        let mut guard = self.state.write();
        if guard.navigation_failures > 0 {
            guard.navigation_failures -= 1;
            return Err(SourceError::new(SourceErrorKind::Navigation)
                .with_hint(format!("transient failure loading {url}")));
        }
        if guard.fixture.unreachable.iter().any(|u| u == url) {
            return Err(SourceError::new(SourceErrorKind::Navigation)
                .with_hint(format!("{url} is unreachable"))
                .retriable(false));
        }
        guard.fixture.url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, SourceError> {
        Ok(self.state.read().fixture.url.clone())
    }
}

/// Handle to one fixture element. Reads go back to shared state, so a
/// handle observes later changes and reports `Detached` once removed.
#[derive(Debug)]
pub struct FixtureElement {
    id: ElementId,
    state: Arc<RwLock<FixtureState>>,
}

impl FixtureElement {
    fn read<T>(&self, f: impl FnOnce(&ElementFixture) -> T) -> Result<T, SourceError> {
        let guard = self.state.read();
        guard.element(&self.id).map(f)
    }

    fn perform<F>(&self, action: FixtureAction, apply: F) -> Result<(), SourceError>
    where
        F: FnOnce(&mut ElementFixture) -> Result<(), SourceError>,
    {
        let mut guard = self.state.write();
        let element = guard.element_mut(&self.id)?;
        if !element.visible {
            return Err(SourceError::not_interactable(format!(
                "element '{}' is not visible",
                self.id
            )));
        }
        apply(element)?;
        guard.actions.push(ActionRecord {
            element: self.id.clone(),
            action,
        });
        Ok(())
    }
}

fn require_enabled(element: &ElementFixture) -> Result<(), SourceError> {
    if element.enabled {
        Ok(())
    } else {
        Err(SourceError::not_interactable(format!(
            "element '{}' is disabled",
            element.id
        )))
    }
}

#[async_trait]
impl ElementHandle for FixtureElement {
    fn id(&self) -> &ElementId {
        &self.id
    }

    async fn is_visible(&self) -> Result<bool, SourceError> {
        self.read(|e| e.visible)
    }

    async fn is_enabled(&self) -> Result<bool, SourceError> {
        self.read(|e| e.enabled)
    }

    async fn bounding_box(&self) -> Result<Option<BoundingBox>, SourceError> {
        // Hidden elements have no layout box, as in a real browser.
        self.read(|e| if e.visible { e.bounding_box } else { None })
    }

    async fn text_content(&self) -> Result<Option<String>, SourceError> {
        self.read(|e| e.text.clone())
    }

    async fn get_attribute(&self, name: &str) -> Result<Option<String>, SourceError> {
        self.read(|e| e.attributes.get(name).cloned())
    }

    async fn input_value(&self) -> Result<Option<String>, SourceError> {
        self.read(|e| e.value.clone())
    }

    async fn click(&self) -> Result<(), SourceError> {
        self.perform(FixtureAction::Click, |e| require_enabled(e))
    }

    async fn fill(&self, value: &str) -> Result<(), SourceError> {
        self.perform(FixtureAction::Fill(value.to_string()), |e| {
            require_enabled(e)?;
            e.value = Some(value.to_string());
            Ok(())
        })
    }

    async fn hover(&self) -> Result<(), SourceError> {
        self.perform(FixtureAction::Hover, |_| Ok(()))
    }

    async fn check(&self) -> Result<(), SourceError> {
        self.perform(FixtureAction::Check, |e| {
            require_enabled(e)?;
            e.checked = true;
            Ok(())
        })
    }

    async fn uncheck(&self) -> Result<(), SourceError> {
        self.perform(FixtureAction::Uncheck, |e| {
            require_enabled(e)?;
            e.checked = false;
            Ok(())
        })
    }

    async fn select_option(&self, value: &str) -> Result<(), SourceError> {
        self.perform(FixtureAction::SelectOption(value.to_string()), |e| {
            require_enabled(e)?;
            if !e.options.is_empty() && !e.options.iter().any(|o| o == value) {
                return Err(SourceError::new(SourceErrorKind::Protocol)
                    .with_hint(format!("option '{value}' not found in '{}'", e.id)));
            }
            e.value = Some(value.to_string());
            Ok(())
        })
    }

    async fn set_input_files(&self, paths: &[PathBuf]) -> Result<(), SourceError> {
        let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        self.perform(FixtureAction::SetInputFiles(names.clone()), |e| require_enabled(e))?;
        self.state.write().uploads.insert(self.id.0.clone(), names);
        Ok(())
    }
}
