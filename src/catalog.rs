//! Selector catalog files
//!
//! ```yaml
//! elements:
//!   login.submit:
//!     - "#login-btn"
//!     - "button[type=submit]"
//! ```
//!
//! JSON with the same shape is accepted too.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use action_locator::{LocatorError, SelectorCatalog};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read selector catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse selector catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid selector catalog: {0}")]
    Invalid(#[from] LocatorError),
}

/// On-disk catalog layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub elements: BTreeMap<String, Vec<String>>,
}

impl CatalogFile {
    pub fn into_catalog(self) -> Result<SelectorCatalog, CatalogError> {
        Ok(SelectorCatalog::new(self.elements.into_iter().collect())?)
    }
}

pub fn parse_catalog(raw: &str, path: &Path) -> Result<CatalogFile, CatalogError> {
    serde_yaml::from_str(raw).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_catalog_file(path: &Path) -> Result<CatalogFile, CatalogError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_catalog(&raw, path)
}

/// Load and validate a catalog. `None` yields an empty catalog.
pub fn load_catalog(path: Option<&Path>) -> Result<SelectorCatalog, CatalogError> {
    let Some(path) = path else {
        return Ok(SelectorCatalog::empty());
    };
    let catalog = read_catalog_file(path)?.into_catalog()?;
    info!(
        keys = catalog.len(),
        "Loaded selector catalog from: {}",
        path.display()
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_locator::ErrorKind;

    #[test]
    fn yaml_and_json_catalogs_parse() {
        let yaml = "elements:\n  login.submit:\n    - '#login-btn'\n    - 'button[type=submit]'\n";
        let catalog = parse_catalog(yaml, Path::new("c.yaml"))
            .unwrap()
            .into_catalog()
            .unwrap();
        assert_eq!(catalog.primary("login.submit"), Some("#login-btn"));

        let json = r##"{"elements": {"cart.add": [".add", "#add-to-cart"]}}"##;
        let catalog = parse_catalog(json, Path::new("c.json"))
            .unwrap()
            .into_catalog()
            .unwrap();
        assert_eq!(catalog.get("cart.add").unwrap().len(), 2);
    }

    #[test]
    fn empty_alternative_list_is_invalid_selector() {
        let yaml = "elements:\n  broken: []\n";
        let err = parse_catalog(yaml, Path::new("c.yaml"))
            .unwrap()
            .into_catalog()
            .unwrap_err();
        match err {
            CatalogError::Invalid(inner) => assert_eq!(inner.kind(), ErrorKind::InvalidSelector),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_path_means_empty_catalog() {
        assert!(load_catalog(None).unwrap().is_empty());
    }
}
