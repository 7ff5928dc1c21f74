//! Action Primitives - resolve-then-act facade
//!
//! This crate turns the locator into something a test scenario can drive:
//! - element actions: click, fill, hover, check, uncheck, select_option, set_input_files
//! - reads and polling assertions over resolved elements
//! - navigation and explicit waits
//!
//! Element actions resolve and act inside one bounded retry, so a handle
//! never outlives the attempt that produced it.

mod primitives;
pub mod types;
pub mod waiting;

pub use action_locator::{ErrorKind, LocatorError};
pub use primitives::*;
pub use types::*;
pub use waiting::*;
