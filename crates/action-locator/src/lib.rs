//! Action Locator
//!
//! Resolves selectors, element handles and logical keys to exactly one
//! element. Ambiguous matches are settled by a pluggable strategy, logical
//! keys heal through an ordered catalog of alternative selectors, and flaky
//! operations can be wrapped in a bounded retry.

pub mod errors;
pub mod healer;
pub mod resolver;
pub mod retry;
pub mod strategies;
pub mod types;

pub use errors::{ErrorKind, LocatorError};
pub use healer::{CatalogSelfHealer, ProbeOutcome, SelectorCatalog, SelfHealer};
pub use resolver::Resolver;
pub use retry::{retry, retry_classified};
pub use types::*;
