//! The side-channel packaging config (`gdal-repack.json`)
//!
//! Static distribution metadata (who publishes this thing, where it lives)
//! rides alongside the input artifacts instead of being baked into the code;
//! version info is discovered dynamically and merged in later.

use axoasset::SourceFile;
use camino::Utf8Path;
use serde::Deserialize;

use crate::errors::*;

/// Filename we look for next to the input artifacts
pub const CONFIG_FILE_NAME: &str = "gdal-repack.json";

/// Static packaging metadata supplied by `gdal-repack.json`
#[derive(Debug, Clone, Deserialize)]
pub struct PackageConfig {
    /// distribution name ("GDAL")
    pub name: String,
    /// upstream author credited in the metadata
    pub author: String,
    /// contact address for the author
    pub author_email: String,
    /// project homepage
    pub url: String,
    /// maintainer of the repackaged distribution (defaults to `name`)
    #[serde(default)]
    pub maintainer: Option<String>,
    /// license string, used directly in msi mode (wheel mode reads the
    /// wheel's own metadata record instead)
    #[serde(default)]
    pub license: String,
    /// one-line summary, used in msi mode
    #[serde(default)]
    pub summary: String,
    /// trove classifiers to start from in msi mode
    #[serde(default)]
    pub classifiers: Vec<String>,
}

impl PackageConfig {
    /// Load the config colocated with the input artifacts in `dir`
    pub fn load(dir: &Utf8Path) -> RepackResult<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Err(RepackError::MissingConfig { path });
        }
        let config = SourceFile::load_local(&path)?.deserialize_json()?;
        Ok(config)
    }

    /// The maintainer to credit, falling back to the distribution name
    pub fn maintainer(&self) -> &str {
        self.maintainer.as_deref().unwrap_or(&self.name)
    }
}
