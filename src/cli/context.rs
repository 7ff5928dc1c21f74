use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::app_context::AppContext;
use crate::cli::output::OutputFormat;
use crate::config::AppConfig;

pub struct CliContext {
    config: AppConfig,
    config_path: PathBuf,
    output: OutputFormat,
}

impl CliContext {
    pub fn new(config: AppConfig, config_path: PathBuf, output: OutputFormat) -> Self {
        Self {
            config,
            config_path,
            output,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }

    /// Catalog path from the command line, else from configuration.
    pub fn catalog_path<'a>(&'a self, explicit: Option<&'a Path>) -> Option<&'a Path> {
        explicit.or(self.config.catalog_path.as_deref())
    }

    pub fn app_context(&self, page: &Path, catalog: Option<&Path>) -> Result<AppContext> {
        AppContext::load(&self.config, page, catalog)
    }
}
