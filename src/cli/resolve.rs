use std::path::PathBuf;

use action_locator::{
    AttributeMatcher, HealInfo, Query, ResolveOverrides, StrategyKind, StrategyOptions,
};
use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::context::CliContext;
use crate::cli::output::{print_json, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct ResolveArgs {
    /// Page fixture (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    pub page: PathBuf,

    /// Selector to resolve
    #[arg(long, required_unless_present = "key", conflicts_with = "key")]
    pub selector: Option<String>,

    /// Logical key to resolve through the selector catalog
    #[arg(long)]
    pub key: Option<String>,

    /// Selector catalog for logical keys
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Strategy used when several elements match (e.g. most_visible)
    #[arg(long)]
    pub strategy: Option<StrategyKind>,

    /// Position for the `index` strategy
    #[arg(long)]
    pub index: Option<usize>,

    /// Text for the `contains_text` strategy
    #[arg(long)]
    pub text: Option<String>,

    /// Attribute name for the `matches_attribute` strategy
    #[arg(long)]
    pub attr_name: Option<String>,

    /// Exact attribute value
    #[arg(long, requires = "attr_name", conflicts_with = "attr_pattern")]
    pub attr_value: Option<String>,

    /// Attribute value regular expression
    #[arg(long, requires = "attr_name")]
    pub attr_pattern: Option<String>,

    /// Reference selector for the `closest_to_element` strategy
    #[arg(long)]
    pub reference: Option<String>,

    /// Resolution timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl ResolveArgs {
    fn query(&self) -> Result<Query> {
        match (&self.selector, &self.key) {
            (Some(selector), _) => Ok(Query::selector(selector.clone())),
            (None, Some(key)) => Ok(Query::logical(key.clone())),
            (None, None) => bail!("either --selector or --key is required"),
        }
    }

    fn overrides(&self) -> Result<ResolveOverrides> {
        let attribute_value = match (&self.attr_value, &self.attr_pattern) {
            (Some(value), _) => Some(AttributeMatcher::exact(value.clone())),
            (None, Some(pattern)) => Some(AttributeMatcher::pattern(pattern)?),
            (None, None) => None,
        };
        let mut overrides = ResolveOverrides::new()
            // resolve prints "not found" instead of failing
            .throw_on_not_found(false)
            .strategy_options(StrategyOptions {
                index: self.index,
                text: self.text.clone(),
                attribute_name: self.attr_name.clone(),
                attribute_value,
                reference_locator: self
                    .reference
                    .as_ref()
                    .map(|selector| Box::new(Query::selector(selector.clone()))),
            });
        if let Some(strategy) = self.strategy {
            overrides = overrides.strategy(strategy);
        }
        if let Some(ms) = self.timeout_ms {
            overrides = overrides.timeout(std::time::Duration::from_millis(ms));
        }
        Ok(overrides)
    }
}

#[derive(Debug, Serialize)]
struct ResolveView {
    query: String,
    strategy: StrategyKind,
    found: bool,
    element: Option<String>,
    index: Option<usize>,
    total: Option<usize>,
    selector: Option<String>,
    heal: Option<HealInfo>,
}

pub async fn cmd_resolve(args: ResolveArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app_context(&args.page, args.catalog.as_deref())?;
    let query = args.query()?;
    let overrides = args.overrides()?;
    let strategy = app.resolver().effective_options(&overrides).strategy;

    let resolution = app.resolver().resolve_with(&query, &overrides).await?;

    let view = match &resolution {
        Some(resolution) => ResolveView {
            query: query.to_string(),
            strategy: resolution.strategy,
            found: true,
            element: Some(resolution.element_id().to_string()),
            index: Some(resolution.index),
            total: Some(resolution.total),
            selector: resolution.selector.clone(),
            heal: resolution.heal.clone(),
        },
        None => ResolveView {
            query: query.to_string(),
            strategy,
            found: false,
            element: None,
            index: None,
            total: None,
            selector: None,
            heal: None,
        },
    };

    match ctx.output() {
        OutputFormat::Json => print_json(&view)?,
        OutputFormat::Human => match (&view.element, view.index, view.total) {
            (Some(element), Some(index), Some(total)) => {
                println!(
                    "{} -> element {} (index {} of {}, strategy {})",
                    view.query, element, index, total, view.strategy
                );
                if let Some(heal) = &view.heal {
                    println!(
                        "  healed {}: {} -> {} (position {})",
                        heal.key, heal.primary, heal.healed, heal.position
                    );
                }
            }
            _ => println!("{} -> not found (strategy {})", view.query, view.strategy),
        },
    }
    Ok(())
}
