use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::context::CliContext;
use crate::cli::output::{print_json, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct ProbeArgs {
    /// Page fixture (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    pub page: PathBuf,

    /// Selector catalog (defaults to the configured catalog)
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Logical key to probe
    pub key: String,
}

#[derive(Debug, Serialize)]
struct ProbeView {
    key: String,
    selector: String,
    position: usize,
    probed: usize,
    healed: bool,
}

pub async fn cmd_probe(args: ProbeArgs, ctx: &CliContext) -> Result<()> {
    let app = ctx.app_context(&args.page, args.catalog.as_deref())?;
    let outcome = app.resolver().healer().probe(&args.key).await?;

    let view = ProbeView {
        healed: outcome.is_healed(),
        key: outcome.key,
        selector: outcome.selector,
        position: outcome.position,
        probed: outcome.probed,
    };
    match ctx.output() {
        OutputFormat::Json => print_json(&view)?,
        OutputFormat::Human => {
            let note = if view.healed { " (healed)" } else { "" };
            println!(
                "{} -> {} at position {}{}, {} selector(s) probed",
                view.key, view.selector, view.position, note, view.probed
            );
        }
    }
    Ok(())
}
