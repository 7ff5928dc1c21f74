//! Candidate Source - the surface the locator consumes from a browser driver
//!
//! This crate defines what the resolution engine needs from the outside world:
//! - `CandidateSource`: ordered selector queries, existence counts, viewport, navigation
//! - `ElementHandle`: per-element introspection plus the primitive actions
//! - `FixturePage`: a declarative in-memory page used by tests and the CLI

pub mod error;
pub mod fixture;
pub mod source;

pub use error::*;
pub use fixture::*;
pub use source::*;
