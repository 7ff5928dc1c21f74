use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use steadyhand_core_types::{BoundingBox, ElementId, Viewport};

use crate::error::SourceError;

/// A live reference to one matched element.
///
/// Handles are only meaningful for the duration of the resolution that
/// produced them; callers must not cache them across resolutions.
#[async_trait]
pub trait ElementHandle: Send + Sync + Debug {
    fn id(&self) -> &ElementId;

    async fn is_visible(&self) -> Result<bool, SourceError>;

    async fn is_enabled(&self) -> Result<bool, SourceError>;

    async fn bounding_box(&self) -> Result<Option<BoundingBox>, SourceError>;

    async fn text_content(&self) -> Result<Option<String>, SourceError>;

    async fn get_attribute(&self, name: &str) -> Result<Option<String>, SourceError>;

    async fn input_value(&self) -> Result<Option<String>, SourceError>;

    async fn click(&self) -> Result<(), SourceError>;

    async fn fill(&self, value: &str) -> Result<(), SourceError>;

    async fn hover(&self) -> Result<(), SourceError>;

    async fn check(&self) -> Result<(), SourceError>;

    async fn uncheck(&self) -> Result<(), SourceError>;

    async fn select_option(&self, value: &str) -> Result<(), SourceError>;

    async fn set_input_files(&self, paths: &[PathBuf]) -> Result<(), SourceError>;
}

/// Ordered candidate set returned by one query.
pub type CandidateSet = Vec<Arc<dyn ElementHandle>>;

/// Page-level operations the locator needs from a browser driver.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Run a selector and return every match in document order.
    async fn query(&self, selector: &str) -> Result<CandidateSet, SourceError>;

    /// Cheap existence check used by self-healing probes.
    async fn count(&self, selector: &str) -> Result<usize, SourceError> {
        Ok(self.query(selector).await?.len())
    }

    async fn viewport_size(&self) -> Result<Option<Viewport>, SourceError>;

    async fn navigate(&self, url: &str) -> Result<(), SourceError>;

    async fn current_url(&self) -> Result<String, SourceError>;
}
