use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::cli::context::CliContext;
use crate::cli::output::{format_latency, print_json_line, report_line, OutputFormat};
use crate::scenario::{run_scenario, Scenario};

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Page fixture (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    pub page: PathBuf,

    /// Selector catalog (defaults to the configured catalog)
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Scenario file
    pub scenario: PathBuf,
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext) -> Result<()> {
    let scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("Failed to load scenario {}", args.scenario.display()))?;
    let app = ctx.app_context(&args.page, args.catalog.as_deref())?;

    let outcome = run_scenario(app.actions(), &scenario).await;

    match ctx.output() {
        OutputFormat::Json => {
            for step in &outcome.steps {
                print_json_line(step)?;
            }
        }
        OutputFormat::Human => {
            println!("Scenario: {}", outcome.name);
            for step in &outcome.steps {
                println!("{:>3}. {}", step.index, report_line(&step.report));
            }
            let total_ms: u64 = outcome.steps.iter().map(|s| s.report.latency_ms).sum();
            let healed = outcome
                .steps
                .iter()
                .filter(|s| s.report.was_healed())
                .count();
            println!(
                "{} of {} step(s) run in {}, {} healed",
                outcome.steps.len(),
                scenario.steps.len(),
                format_latency(total_ms),
                healed
            );
        }
    }

    if let Some(index) = outcome.failed_at {
        let description = outcome
            .steps
            .last()
            .map(|step| step.description.clone())
            .unwrap_or_default();
        bail!(
            "scenario '{}' failed at step {}: {}",
            outcome.name,
            index,
            description
        );
    }
    Ok(())
}
