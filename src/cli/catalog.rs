use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};

use crate::catalog::{load_catalog, read_catalog_file};
use crate::cli::context::CliContext;
use crate::cli::output::{print_json, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub action: CatalogAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum CatalogAction {
    /// Check that every key has at least one non-blank selector
    Validate {
        /// Catalog file (defaults to the configured catalog)
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,
    },

    /// Print the catalog entries
    Show {
        /// Catalog file (defaults to the configured catalog)
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,
    },
}

pub async fn cmd_catalog(args: CatalogArgs, ctx: &CliContext) -> Result<()> {
    match args.action {
        CatalogAction::Validate { catalog } => {
            let path = ctx
                .catalog_path(catalog.as_deref())
                .ok_or_else(|| anyhow!("no catalog given and none configured"))?;
            let catalog = load_catalog(Some(path))
                .with_context(|| format!("validating {}", path.display()))?;
            match ctx.output() {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "path": path.display().to_string(),
                    "valid": true,
                    "keys": catalog.len(),
                }))?,
                OutputFormat::Human => println!(
                    "Catalog {} is valid ({} key(s))",
                    path.display(),
                    catalog.len()
                ),
            }
        }
        CatalogAction::Show { catalog } => {
            let path = ctx
                .catalog_path(catalog.as_deref())
                .ok_or_else(|| anyhow!("no catalog given and none configured"))?;
            let file = read_catalog_file(path)?;
            match ctx.output() {
                OutputFormat::Json => print_json(&file)?,
                OutputFormat::Human => {
                    println!("Selector catalog ({}):", path.display());
                    for (key, selectors) in &file.elements {
                        println!("{}", key);
                        for (position, selector) in selectors.iter().enumerate() {
                            println!("  {}. {}", position, selector);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
