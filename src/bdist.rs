//! Building the generic wheel out of the staged tree
//!
//! This plays the role setuptools' forced `bdist_wheel` invocation played in
//! the original tooling: serialize `platlib/` plus a generated dist-info into
//! a `py2-none-any` wheel under `platlib/dist/`. The tag lie is deliberate,
//! the retag step swaps it for the real platform tag afterwards.

use std::fs::File;
use std::io::Write;

use axoasset::LocalAsset;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use camino::{Utf8Path, Utf8PathBuf};
use glob::{MatchOptions, Pattern};
use sha2::{Digest, Sha256};
use tracing::info;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::config::PackageConfig;
use crate::errors::*;
use crate::metadata::MetadataRecord;
use crate::stage::PACKAGE_DIR;

/// The tag the generic wheel claims before retagging
pub const GENERIC_TAG: &str = "py2-none-any";

/// Files we keep from inside the package dir, relative to the package dir.
///
/// Native binaries, extension modules, the auxiliary server executable,
/// plugins enabled and disabled, license files and the gdal data dir; the
/// executables and python scripts the installers also carry are *not*
/// included. Globs don't cross directory separators, same as setuptools
/// package_data.
const PACKAGE_DATA: &[&str] = &[
    "*.py",
    "*.dll",
    "*.pyd",
    "gdalserver.exe",
    "gdalplugins/*",
    "gdalplugins.disabled/*",
    "license/*",
    "data/gdal/*",
];

/// `GDAL`, `2.0.0`, `py2-none-any` => `GDAL-2.0.0-py2-none-any.whl`
pub fn wheel_file_name(name: &str, version: &str, tag: &str) -> String {
    format!("{}-{}-{}.whl", name.replace('-', "_"), version, tag)
}

/// The dist-info directory name for a distribution
pub fn dist_info_dir(name: &str, version: &str) -> String {
    format!("{}-{}.dist-info", name.replace('-', "_"), version)
}

/// Everything needed to serialize the staged tree into a generic wheel
#[derive(Debug)]
pub struct WheelBuild<'a> {
    /// the staged platlib dir the payload lives in
    pub platlib: &'a Utf8Path,
    /// the (possibly edited) metadata record
    pub metadata: &'a MetadataRecord,
    /// static metadata from the side-channel config
    pub config: &'a PackageConfig,
    /// long description, when the primary wheel carried one
    pub description: Option<&'a str>,
}

impl WheelBuild<'_> {
    /// Build the wheel, returning the path it was written to
    /// (`platlib/dist/<name>-<version>-py2-none-any.whl`)
    pub fn build(&self) -> RepackResult<Utf8PathBuf> {
        let name = &self.metadata.name;
        let version = &self.metadata.version;
        let dist_dir = self.platlib.join("dist");
        LocalAsset::create_dir_all(&dist_dir)?;
        let out_path = dist_dir.join(wheel_file_name(name, version, GENERIC_TAG));
        info!("building generic wheel: {out_path}");

        let entries = self.collect_entries()?;

        let file = File::create(&out_path)?;
        let mut zip = ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // payload first, dist-info last, RECORD at the very end; every
        // written entry except RECORD itself gets a RECORD line
        let mut record = vec![];
        for entry in &entries {
            let contents = LocalAsset::load_bytes(self.platlib.join(entry))?;
            zip.start_file(entry.clone(), options)
                .map_err(|details| self.zip_err(&out_path, details))?;
            zip.write_all(&contents)?;
            record.push(record_line(entry, &contents));
        }

        let info_dir = dist_info_dir(name, version);
        for (file_name, contents) in [
            ("METADATA", self.render_metadata()),
            ("WHEEL", render_wheel_manifest()),
        ] {
            let entry = format!("{info_dir}/{file_name}");
            zip.start_file(entry.clone(), options)
                .map_err(|details| self.zip_err(&out_path, details))?;
            zip.write_all(contents.as_bytes())?;
            record.push(record_line(&entry, contents.as_bytes()));
        }

        let record_entry = format!("{info_dir}/RECORD");
        record.push(format!("{record_entry},,"));
        zip.start_file(record_entry, options)
            .map_err(|details| self.zip_err(&out_path, details))?;
        zip.write_all(record.join("\n").as_bytes())?;
        zip.write_all(b"\n")?;

        zip.finish()
            .map_err(|details| self.zip_err(&out_path, details))?;
        Ok(out_path)
    }

    /// Walk platlib and pick the entries the wheel gets, in sorted order:
    /// top-level `*.py` modules plus whatever of the package dir matches
    /// [`PACKAGE_DATA`].
    fn collect_entries(&self) -> RepackResult<Vec<String>> {
        let opts = MatchOptions {
            case_sensitive: false,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        let patterns = PACKAGE_DATA
            .iter()
            .map(|pat| Pattern::new(pat))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut entries = vec![];
        for entry in self.platlib.read_dir_utf8()? {
            let entry = entry?;
            if entry.file_type()?.is_file() && entry.file_name().ends_with(".py") {
                entries.push(entry.file_name().to_owned());
            }
        }

        let package_dir = self.platlib.join(PACKAGE_DIR);
        let mut files = vec![];
        collect_files(&package_dir, Utf8Path::new(""), &mut files)?;
        for rel in files {
            if patterns.iter().any(|pat| pat.matches_with(rel.as_str(), opts)) {
                entries.push(format!("{PACKAGE_DIR}/{rel}"));
            }
        }

        entries.sort();
        Ok(entries)
    }

    fn render_metadata(&self) -> String {
        let meta = self.metadata;
        let mut out = String::new();
        out.push_str("Metadata-Version: 2.0\n");
        out.push_str(&format!("Name: {}\n", meta.name));
        out.push_str(&format!("Version: {}\n", meta.version));
        if !meta.summary.is_empty() {
            out.push_str(&format!("Summary: {}\n", meta.summary));
        }
        out.push_str(&format!("Home-page: {}\n", self.config.url));
        out.push_str(&format!("Author: {}\n", self.config.author));
        out.push_str(&format!("Author-email: {}\n", self.config.author_email));
        out.push_str(&format!("Maintainer: {}\n", self.config.maintainer()));
        if !meta.license.is_empty() {
            out.push_str(&format!("License: {}\n", meta.license));
        }
        for classifier in &meta.classifiers {
            out.push_str(&format!("Classifier: {classifier}\n"));
        }
        if let Some(description) = self.description {
            out.push('\n');
            out.push_str(description);
            if !description.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }

    fn zip_err(&self, path: &Utf8Path, details: zip::result::ZipError) -> RepackError {
        RepackError::Zip {
            path: path.to_owned(),
            details,
        }
    }
}

/// The WHEEL manifest of the generic wheel; this is the entry the retag
/// step will rewrite.
fn render_wheel_manifest() -> String {
    format!(
        "Wheel-Version: 1.0\n\
         Generator: gdal-repack ({})\n\
         Root-Is-Purelib: true\n\
         Tag: {GENERIC_TAG}\n",
        env!("CARGO_PKG_VERSION"),
    )
}

/// One RECORD line: `path,sha256=<urlsafe-b64-nopad>,size`
fn record_line(entry: &str, contents: &[u8]) -> String {
    let digest = URL_SAFE_NO_PAD.encode(Sha256::digest(contents));
    format!("{entry},sha256={digest},{}", contents.len())
}

fn collect_files(
    dir: &Utf8Path,
    rel: &Utf8Path,
    out: &mut Vec<Utf8PathBuf>,
) -> RepackResult<()> {
    if !dir.exists() {
        return Ok(());
    }
    let mut entries: Vec<_> = dir
        .read_dir_utf8()?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    entries.sort_by(|a, b| a.file_name().cmp(b.file_name()));
    for entry in entries {
        let rel_path = rel.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            collect_files(entry.path(), &rel_path, out)?;
        } else {
            out.push(rel_path);
        }
    }
    Ok(())
}
