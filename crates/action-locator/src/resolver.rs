//! Element resolver: query, short-circuit, strategy dispatch

use std::sync::Arc;

use candidate_source::{CandidateSet, CandidateSource, ElementHandle};
use steadyhand_core_types::{BoundingBox, Viewport};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::errors::{ErrorKind, LocatorError};
use crate::healer::{CatalogSelfHealer, SelectorCatalog, SelfHealer};
use crate::strategies::{self, VisibilityFacts, MOST_VISIBLE_FALLBACK_INDEX};
use crate::types::{
    HealInfo, Query, Resolution, ResolutionOptions, ResolveOverrides, ResolverDefaults,
    StrategyKind,
};

/// Resolves a query to exactly one candidate.
pub struct Resolver {
    source: Arc<dyn CandidateSource>,
    healer: Arc<dyn SelfHealer>,
    defaults: ResolverDefaults,
}

/// Selector (if any) a query runs, plus the heal record when a
/// non-primary alternative was chosen.
struct Target {
    selector: Option<String>,
    heal: Option<HealInfo>,
}

impl Resolver {
    /// Create a resolver with the catalog-backed self-healer.
    pub fn new(source: Arc<dyn CandidateSource>, catalog: Arc<SelectorCatalog>) -> Self {
        let healer = Arc::new(CatalogSelfHealer::new(source.clone(), catalog));
        Self::with_healer(source, healer)
    }

    pub fn with_healer(source: Arc<dyn CandidateSource>, healer: Arc<dyn SelfHealer>) -> Self {
        Self {
            source,
            healer,
            defaults: ResolverDefaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: ResolverDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> &ResolverDefaults {
        &self.defaults
    }

    pub fn source(&self) -> &Arc<dyn CandidateSource> {
        &self.source
    }

    pub fn healer(&self) -> &Arc<dyn SelfHealer> {
        &self.healer
    }

    /// Options actually used for a call with the given overrides.
    pub fn effective_options(&self, overrides: &ResolveOverrides) -> ResolutionOptions {
        ResolutionOptions::effective(overrides, &self.defaults)
    }

    /// Resolve `query` to one candidate.
    ///
    /// Returns `Ok(None)` only when nothing acceptable was found and
    /// `throw_on_not_found` is off; otherwise absence is an error.
    pub async fn resolve(
        &self,
        query: &Query,
        options: &ResolutionOptions,
    ) -> Result<Option<Resolution>, LocatorError> {
        match timeout(options.timeout, self.resolve_once(query, options)).await {
            Ok(result) => result,
            Err(_) => Err(LocatorError::timeout(format!(
                "resolving {} exceeded {}ms",
                query,
                options.timeout.as_millis()
            ))
            .with_target(query_target(query))
            .with_strategy(options.strategy)),
        }
    }

    /// Resolve with merged defaults.
    pub async fn resolve_with(
        &self,
        query: &Query,
        overrides: &ResolveOverrides,
    ) -> Result<Option<Resolution>, LocatorError> {
        self.resolve(query, &self.effective_options(overrides)).await
    }

    async fn resolve_once(
        &self,
        query: &Query,
        options: &ResolutionOptions,
    ) -> Result<Option<Resolution>, LocatorError> {
        let target = self.target_for(query, options.self_healing).await?;
        let set = self.candidates(query, &target).await?;
        let described = target
            .selector
            .clone()
            .unwrap_or_else(|| query.to_string());

        debug!(
            query = %query,
            selector = %described,
            candidates = set.len(),
            strategy = %options.strategy,
            "resolving element"
        );

        let index = match set.len() {
            0 => None,
            1 => Some(0),
            _ => self.dispatch(&set, options).await?,
        };

        let Some(index) = index else {
            let message = if set.is_empty() {
                format!("no element matches {}", described)
            } else {
                format!(
                    "none of the {} candidates for {} satisfied {}",
                    set.len(),
                    described,
                    options.strategy
                )
            };
            return not_found(options, described, message);
        };

        let resolution = Resolution {
            element: set[index].clone(),
            index,
            total: set.len(),
            selector: target.selector,
            strategy: options.strategy,
            heal: target.heal,
        };
        info!(
            selector = %described,
            element = %resolution.element_id(),
            index,
            total = resolution.total,
            strategy = %options.strategy,
            healed = resolution.was_healed(),
            "resolved element"
        );
        Ok(Some(resolution))
    }

    async fn target_for(&self, query: &Query, self_healing: bool) -> Result<Target, LocatorError> {
        match query {
            Query::Selector(selector) => Ok(Target {
                selector: Some(validate_selector(selector)?),
                heal: None,
            }),
            Query::Handle(_) => Ok(Target {
                selector: None,
                heal: None,
            }),
            Query::Logical(key) if self_healing => {
                let outcome = self.healer.probe(key).await?;
                let heal = if outcome.is_healed() {
                    let primary = self.healer.primary(key)?;
                    outcome.heal_info(&primary)
                } else {
                    None
                };
                Ok(Target {
                    selector: Some(outcome.selector),
                    heal,
                })
            }
            Query::Logical(key) => Ok(Target {
                selector: Some(self.healer.primary(key)?),
                heal: None,
            }),
        }
    }

    async fn candidates(&self, query: &Query, target: &Target) -> Result<CandidateSet, LocatorError> {
        match (query, &target.selector) {
            (Query::Handle(handle), _) => Ok(vec![handle.clone()]),
            (_, Some(selector)) => self
                .source
                .query(selector)
                .await
                .map_err(|err| LocatorError::from(err).with_target(selector.clone())),
            (_, None) => Ok(Vec::new()),
        }
    }

    /// Pick one index from a set of two or more candidates.
    async fn dispatch(
        &self,
        set: &[Arc<dyn ElementHandle>],
        options: &ResolutionOptions,
    ) -> Result<Option<usize>, LocatorError> {
        let strategy = options.strategy;
        let opts = &options.strategy_options;
        let len = set.len();

        match strategy {
            StrategyKind::First => Ok(strategies::select_first(len)),
            StrategyKind::Last => Ok(strategies::select_last(len)),
            StrategyKind::Index => {
                let index = opts
                    .index
                    .ok_or_else(|| missing_option(strategy, "index"))?;
                Ok(strategies::select_index(len, index))
            }
            StrategyKind::ContainsText => {
                let text = opts
                    .text
                    .as_deref()
                    .ok_or_else(|| missing_option(strategy, "text"))?;
                let mut texts = Vec::with_capacity(len);
                for candidate in set {
                    texts.push(candidate.text_content().await?);
                }
                Ok(strategies::first_containing_text(&texts, text))
            }
            StrategyKind::MatchesAttribute => {
                let name = opts
                    .attribute_name
                    .as_deref()
                    .ok_or_else(|| missing_option(strategy, "attribute_name"))?;
                let matcher = opts
                    .attribute_value
                    .as_ref()
                    .ok_or_else(|| missing_option(strategy, "attribute_value"))?;
                let mut values = Vec::with_capacity(len);
                for candidate in set {
                    values.push(candidate.get_attribute(name).await?);
                }
                Ok(strategies::first_matching_attribute(&values, matcher))
            }
            StrategyKind::MostVisible => {
                let viewport = self.viewport(strategy).await?;
                let mut facts = Vec::with_capacity(len);
                for candidate in set {
                    facts.push(VisibilityFacts::new(
                        candidate.is_visible().await?,
                        candidate.bounding_box().await?,
                    ));
                }
                match strategies::most_visible(&facts, &viewport) {
                    Some(index) => Ok(Some(index)),
                    None => {
                        warn!(
                            candidates = len,
                            viewport = %viewport,
                            "no candidate fully visible; falling back to index {}",
                            MOST_VISIBLE_FALLBACK_INDEX
                        );
                        Ok(Some(MOST_VISIBLE_FALLBACK_INDEX))
                    }
                }
            }
            StrategyKind::ClosestToCenter => {
                let viewport = self.viewport(strategy).await?;
                let boxes = bounding_boxes(set).await?;
                Ok(strategies::closest_to_point(&boxes, viewport.center()))
            }
            StrategyKind::ClosestToElement => {
                let reference = opts
                    .reference_locator
                    .as_deref()
                    .ok_or_else(|| missing_option(strategy, "reference_locator"))?;
                let anchor = self.reference_box(reference).await?;
                let boxes = bounding_boxes(set).await?;
                Ok(strategies::closest_to_point(&boxes, anchor.center()))
            }
        }
    }

    async fn viewport(&self, strategy: StrategyKind) -> Result<Viewport, LocatorError> {
        self.source.viewport_size().await?.ok_or_else(|| {
            LocatorError::new(ErrorKind::Driver, "viewport size unavailable")
                .with_strategy(strategy)
        })
    }

    /// Bounding box of the reference element for CLOSEST_TO_ELEMENT.
    ///
    /// The reference is resolved once with FIRST semantics; a logical key
    /// uses its primary selector and is not self-healed.
    async fn reference_box(&self, reference: &Query) -> Result<BoundingBox, LocatorError> {
        let selector = match reference {
            Query::Handle(handle) => return reference_geometry(handle.as_ref(), reference).await,
            Query::Logical(key) => self.healer.primary(key)?,
            Query::Selector(selector) => validate_selector(selector)?,
        };
        let set = self.source.query(&selector).await?;
        let element = set.into_iter().next().ok_or_else(|| {
            LocatorError::element_not_found(
                selector.clone(),
                format!("reference element {} not found", selector),
            )
            .with_strategy(StrategyKind::ClosestToElement)
        })?;
        reference_geometry(element.as_ref(), reference).await
    }
}

async fn reference_geometry(
    element: &dyn ElementHandle,
    reference: &Query,
) -> Result<BoundingBox, LocatorError> {
    element.bounding_box().await?.ok_or_else(|| {
        LocatorError::element_not_found(
            reference.to_string(),
            format!("reference element {} has no bounding box", reference),
        )
        .with_strategy(StrategyKind::ClosestToElement)
    })
}

async fn bounding_boxes(
    set: &[Arc<dyn ElementHandle>],
) -> Result<Vec<Option<BoundingBox>>, LocatorError> {
    let mut boxes = Vec::with_capacity(set.len());
    for candidate in set {
        boxes.push(candidate.bounding_box().await?);
    }
    Ok(boxes)
}

fn validate_selector(selector: &str) -> Result<String, LocatorError> {
    let trimmed = selector.trim();
    if trimmed.is_empty() {
        return Err(LocatorError::invalid_selector(
            selector,
            "selector must not be blank",
        ));
    }
    Ok(trimmed.to_string())
}

fn missing_option(strategy: StrategyKind, field: &str) -> LocatorError {
    LocatorError::configuration(
        strategy,
        format!("strategy '{}' requires strategy option '{}'", strategy, field),
    )
}

/// Selector, logical key or element id a query names.
fn query_target(query: &Query) -> String {
    match query {
        Query::Selector(selector) => selector.clone(),
        Query::Logical(key) => key.clone(),
        Query::Handle(handle) => handle.id().to_string(),
    }
}

fn not_found(
    options: &ResolutionOptions,
    target: String,
    message: String,
) -> Result<Option<Resolution>, LocatorError> {
    if options.throw_on_not_found {
        Err(LocatorError::element_not_found(target, message).with_strategy(options.strategy))
    } else {
        debug!(selector = %target, "{}", message);
        Ok(None)
    }
}
