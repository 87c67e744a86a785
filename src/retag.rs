//! Rewriting a generic wheel's manifest so it declares what it really is
//!
//! The wheel builder can only emit `py2-none-any`, but the payload is full of
//! win32/win_amd64 binaries; without this step every consumer would treat the
//! output as architecture-independent. We stream the archive entry-for-entry
//! into the final wheel, touching nothing but the WHEEL manifest's content:
//! same entry set, same order, identical bytes everywhere else.

use std::fs::File;
use std::io::{Read, Write};

use camino::Utf8Path;
use time::OffsetDateTime;
use tracing::info;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

use crate::bdist::{dist_info_dir, GENERIC_TAG};
use crate::errors::*;

/// The purity flag as the generic wheel states it
const PURELIB_TRUE: &str = "Root-Is-Purelib: true";
/// What it has to say instead
const PURELIB_FALSE: &str = "Root-Is-Purelib: false";

/// Rewrite `src` into `dest`, swapping the WHEEL manifest's purity flag and
/// tag line for `cp27-none-<platform_tag>`.
///
/// Exactly two substitutions are made, and both must land; a manifest that
/// doesn't contain the expected text is a hard error, because silently
/// keeping it would ship a mislabeled wheel.
pub fn retag_wheel(
    src: &Utf8Path,
    dest: &Utf8Path,
    name: &str,
    version: &str,
    platform_tag: &str,
) -> RepackResult<()> {
    info!("retagging {src} as {platform_tag} => {dest}");
    let manifest_entry = format!("{}/WHEEL", dist_info_dir(name, version));

    let mut zin =
        ZipArchive::new(File::open(src)?).map_err(|details| zip_err(src, details))?;
    let manifest_idx = zin
        .index_for_name(&manifest_entry)
        .ok_or_else(|| RepackError::MissingManifestEntry {
            entry: manifest_entry.clone(),
            wheel: src.to_owned(),
        })?;

    let mut zout = ZipWriter::new(File::create(dest)?);
    for idx in 0..zin.len() {
        if idx != manifest_idx {
            let entry = zin
                .by_index_raw(idx)
                .map_err(|details| zip_err(src, details))?;
            zout.raw_copy_file(entry)
                .map_err(|details| zip_err(dest, details))?;
            continue;
        }

        let mut manifest = String::new();
        zin.by_index(idx)
            .map_err(|details| zip_err(src, details))?
            .read_to_string(&mut manifest)
            .map_err(|details| zip_err(src, details.into()))?;
        let manifest = substitute(&manifest_entry, manifest, PURELIB_TRUE, PURELIB_FALSE)?;
        let manifest = substitute(
            &manifest_entry,
            manifest,
            &format!("Tag: {GENERIC_TAG}"),
            &format!("Tag: cp27-none-{platform_tag}"),
        )?;

        let timestamp = zip::DateTime::try_from(OffsetDateTime::now_utc()).unwrap_or_default();
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(timestamp);
        zout.start_file(manifest_entry.clone(), options)
            .map_err(|details| zip_err(dest, details))?;
        zout.write_all(manifest.as_bytes())?;
    }

    zout.finish().map_err(|details| zip_err(dest, details))?;
    Ok(())
}

fn substitute(entry: &str, text: String, from: &str, to: &str) -> RepackResult<String> {
    if !text.contains(from) {
        return Err(RepackError::ManifestShape {
            entry: entry.to_owned(),
            expected: from.to_owned(),
        });
    }
    Ok(text.replace(from, to))
}

fn zip_err(path: &Utf8Path, details: zip::result::ZipError) -> RepackError {
    RepackError::Zip {
        path: path.to_owned(),
        details,
    }
}
