//! Steadyhand CLI library
//!
//! Configuration, selector catalog and scenario loading shared by the
//! `steadyhand` binary; exposed for integration testing.

pub mod app_context;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod scenario;

pub use app_context::AppContext;
pub use config::AppConfig;
pub use scenario::{run_scenario, Scenario, ScenarioOutcome};
