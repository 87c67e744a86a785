//! The distribution metadata record and the edits we make to it

use axoasset::{LocalAsset, SourceFile};
use camino::Utf8Path;
use serde::Deserialize;

use crate::config::PackageConfig;
use crate::errors::*;

/// Classifiers that stop being true once we've pinned the build to
/// cpython 2.7 on windows
const DROPPED_CLASSIFIERS: &[&str] = &[
    "Programming Language :: Python :: 2",
    "Programming Language :: Python :: 3",
    "Operating System :: OS Independent",
];

/// Classifiers that become true instead. The proprietary-license entry
/// covers the bundled MrSID/ECW plugin libraries.
const ADDED_CLASSIFIERS: &[&str] = &[
    "Programming Language :: Python :: 2.7",
    "Operating System :: Microsoft :: Windows",
    "License :: Other/Proprietary License",
];

/// A distribution's metadata record, as read from the primary wheel's
/// `metadata.json` (or synthesized from config in msi mode).
///
/// `version` here is the single source of truth for naming the output
/// wheel downstream.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataRecord {
    /// distribution name
    pub name: String,
    /// distribution version
    pub version: String,
    /// one-line summary
    #[serde(default)]
    pub summary: String,
    /// license string
    #[serde(default)]
    pub license: String,
    /// ordered trove classifiers
    #[serde(default)]
    pub classifiers: Vec<String>,
}

impl MetadataRecord {
    /// Load the record from a wheel's unpacked `.dist-info` directory
    pub fn load(dist_info_dir: &Utf8Path) -> RepackResult<Self> {
        let path = dist_info_dir.join("metadata.json");
        let record = SourceFile::load_local(&path)?.deserialize_json()?;
        Ok(record)
    }

    /// Load the long description that rides next to the record, if any
    pub fn load_description(dist_info_dir: &Utf8Path) -> Option<String> {
        let path = dist_info_dir.join("DESCRIPTION.rst");
        path.exists()
            .then(|| LocalAsset::load_string(&path).ok())
            .flatten()
    }

    /// Synthesize a record from the static config plus a discovered version
    /// (msi mode, where there's no wheel metadata to read)
    pub fn from_config(config: &PackageConfig, version: &str) -> Self {
        MetadataRecord {
            name: config.name.clone(),
            version: version.to_owned(),
            summary: config.summary.clone(),
            license: config.license.clone(),
            classifiers: config.classifiers.clone(),
        }
    }

    /// Swap the language/OS classifiers for the ones that describe what we
    /// actually built: cpython-2.7-only, windows-only, with proprietary
    /// plugin libs aboard.
    ///
    /// Classifiers the upstream record never had are tolerated (`retain`,
    /// not `remove`); the order of everything we keep is preserved.
    pub fn retarget_classifiers(&mut self) {
        self.classifiers
            .retain(|c| !DROPPED_CLASSIFIERS.contains(&c.as_str()));
        self.classifiers
            .extend(ADDED_CLASSIFIERS.iter().map(|c| (*c).to_owned()));
    }
}

/// Pull the version out of a python-bindings installer filename.
///
/// `GDAL-2.1.3.win32-py2.7.msi` => `2.1.3`: everything after the first `-`,
/// truncated at the `.win` build suffix.
pub fn version_from_installer(file_name: &str) -> RepackResult<String> {
    let parse = || -> Option<&str> {
        let (name, rest) = file_name.split_once('-')?;
        if name.is_empty() {
            return None;
        }
        let (version, _) = rest.split_once(".win")?;
        (!version.is_empty()).then_some(version)
    };
    match parse() {
        Some(version) => Ok(version.to_owned()),
        None => Err(RepackError::VersionParse {
            file_name: file_name.to_owned(),
        }),
    }
}
