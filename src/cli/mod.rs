//! `steadyhand` command-line interface

pub mod app;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod output;
pub mod probe;
pub mod resolve;
pub mod run;
pub mod runtime;

pub use app::run;
pub use output::OutputFormat;
