//! Errors!

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// A Result returned by the top-level entry points
pub type Result<T> = std::result::Result<T, miette::Report>;

/// A Result returned by the repackaging internals
pub type RepackResult<T> = std::result::Result<T, RepackError>;

/// An Error/Diagnostic produced while repackaging
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum RepackError {
    /// Axoasset returned an error (I/O error)
    #[error(transparent)]
    #[diagnostic(transparent)]
    Asset(#[from] axoasset::AxoassetError),

    /// Axoprocess returned an error (subprocess failure)
    #[error(transparent)]
    #[diagnostic(transparent)]
    Cmd(#[from] axoprocess::AxoprocessError),

    /// A raw I/O error with no useful context attached
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A glob pattern in the artifact rule table failed to compile
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Something went wrong while reading or writing a zip archive
    #[error("failed to process archive: {path}")]
    Zip {
        /// the archive being processed
        path: Utf8PathBuf,
        /// underlying error
        #[source]
        details: zip::result::ZipError,
    },

    /// An archive entry would unpack outside the staging directory
    #[error("archive entry {entry} in {archive} escapes the extraction dir")]
    #[diagnostic(help("the input archive is malformed (or malicious); refusing to unpack it"))]
    UnsafeEntry {
        /// name of the offending entry
        entry: String,
        /// the archive it came from
        archive: Utf8PathBuf,
    },

    /// The wheel we unpacked didn't contain a .dist-info directory
    #[error("no .dist-info directory in {wheel}")]
    #[diagnostic(help("is this actually a wheel? wheels always carry <name>-<version>.dist-info/"))]
    MissingDistInfo {
        /// the wheel we were unpacking
        wheel: Utf8PathBuf,
    },

    /// The generic wheel is missing the WHEEL manifest we need to retag
    #[error("no {entry} entry in {wheel}")]
    #[diagnostic(help(
        "the wheel builder should always emit this entry; the archive may be truncated"
    ))]
    MissingManifestEntry {
        /// the dist-info path we expected
        entry: String,
        /// the wheel we searched
        wheel: Utf8PathBuf,
    },

    /// The WHEEL manifest didn't contain the text we're contracted to replace
    #[error("{entry} doesn't contain the expected {expected:?}")]
    #[diagnostic(help(
        "retagging replaces exactly two substrings; without them the output \
         would be misidentified as architecture-independent"
    ))]
    ManifestShape {
        /// the manifest entry we read
        entry: String,
        /// the substring that was missing
        expected: String,
    },

    /// We couldn't pull a version out of an installer filename
    #[error("couldn't parse a version out of {file_name}")]
    #[diagnostic(help("installer names should look like GDAL-2.1.3.win32-py2.7.msi"))]
    VersionParse {
        /// the filename we tried to parse
        file_name: String,
    },

    /// The side-channel packaging config wasn't found
    #[error("missing packaging config: {path}")]
    #[diagnostic(help(
        "gdal-repack.json supplies the static distribution metadata (name, author, url, ...); \
         it should sit in the same directory as the input artifacts"
    ))]
    MissingConfig {
        /// where we looked
        path: Utf8PathBuf,
    },
}
