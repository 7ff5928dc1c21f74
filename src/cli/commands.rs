use clap::Subcommand;

use super::catalog::CatalogArgs;
use super::config::ConfigArgs;
use super::probe::ProbeArgs;
use super::resolve::ResolveArgs;
use super::run::RunArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Resolve a selector against a page fixture
    Resolve(ResolveArgs),

    /// Probe the self-healing catalog for a logical key
    Probe(ProbeArgs),

    /// Run a scenario file step by step
    Run(RunArgs),

    /// Inspect selector catalogs
    Catalog(CatalogArgs),

    /// Manage Steadyhand configuration
    Config(ConfigArgs),
}
