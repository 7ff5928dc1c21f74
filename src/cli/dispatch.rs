use super::catalog::cmd_catalog;
use super::config::cmd_config;
use super::env::CliArgs;
use super::probe::cmd_probe;
use super::resolve::cmd_resolve;
use super::run::cmd_run;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Resolve(args) => cmd_resolve(args, ctx).await,
        Commands::Probe(args) => cmd_probe(args, ctx).await,
        Commands::Run(args) => cmd_run(args, ctx).await,
        Commands::Catalog(args) => cmd_catalog(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
    }
}
