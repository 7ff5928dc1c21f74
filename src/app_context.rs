//! Application context shared by CLI commands

use std::path::Path;
use std::sync::Arc;

use action_locator::{Resolver, SelectorCatalog};
use action_primitives::Actions;
use anyhow::{Context, Result};
use candidate_source::{CandidateSource, FixturePage, PageFixture};
use tracing::info;

use crate::catalog::load_catalog;
use crate::config::AppConfig;

/// Page, resolver and facade wired from configuration.
pub struct AppContext {
    page: FixturePage,
    catalog: Arc<SelectorCatalog>,
    actions: Actions,
}

impl AppContext {
    pub fn new(config: &AppConfig, page: FixturePage, catalog: SelectorCatalog) -> Self {
        let catalog = Arc::new(catalog);
        let source: Arc<dyn CandidateSource> = Arc::new(page.clone());
        let resolver = Resolver::new(source, catalog.clone()).with_defaults(config.resolver_defaults());
        let actions = Actions::new(Arc::new(resolver))
            .with_retry(config.retry_options())
            .with_wait(config.wait_options());
        Self {
            page,
            catalog,
            actions,
        }
    }

    /// Load the page fixture and the catalog (`catalog_override` wins over
    /// the configured path).
    pub fn load(
        config: &AppConfig,
        page_path: &Path,
        catalog_override: Option<&Path>,
    ) -> Result<Self> {
        let fixture = PageFixture::load_from_path(page_path)
            .with_context(|| format!("Failed to load page {}", page_path.display()))?;
        let catalog_path = catalog_override.or(config.catalog_path.as_deref());
        let catalog = load_catalog(catalog_path).context("Failed to load selector catalog")?;
        info!(
            page = %page_path.display(),
            elements = fixture.elements.len(),
            catalog_keys = catalog.len(),
            "Application context ready"
        );
        Ok(Self::new(config, FixturePage::new(fixture), catalog))
    }

    pub fn page(&self) -> &FixturePage {
        &self.page
    }

    pub fn catalog(&self) -> &Arc<SelectorCatalog> {
        &self.catalog
    }

    pub fn actions(&self) -> &Actions {
        &self.actions
    }

    pub fn resolver(&self) -> &Arc<Resolver> {
        self.actions.resolver()
    }
}
