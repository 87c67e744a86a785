//! Getting payloads out of the input archives and merged into staging

use std::io::{Cursor, Read};

use axoasset::LocalAsset;
use axoprocess::Cmd;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;
use zip::ZipArchive;

use crate::errors::*;

/// The category dirs a wheel's `.data/` payload can be routed into.
///
/// Everything not under `.data/` goes to `platlib`.
pub const WHEEL_CATEGORIES: &[&str] = &["purelib", "platlib", "scripts", "headers", "data"];

/// Where plugin MSIs put their payload inside the extraction target
pub const PLUGIN_PAYLOAD: &str = "PFiles/GDAL";

/// Where the python-bindings MSI puts its payload inside the extraction
/// target (one level deeper than the staging layout expects; the merger is
/// pointed at this inner tree)
pub const BINDINGS_PAYLOAD: &str = "Lib/site-packages";

/// A wheel unpacked into category dirs under a staging root
#[derive(Debug)]
pub struct ExtractedWheel {
    /// name of the `<name>-<version>.dist-info` dir found in the wheel
    /// (lands under `platlib/`)
    pub dist_info: String,
}

/// Unpack a wheel into category subdirectories of `dest`.
///
/// `<stem>.data/<category>/...` entries are routed to `dest/<category>/...`;
/// every other entry lands under `dest/platlib/`, which is also where the
/// `.dist-info` directory we report ends up.
pub fn unpack_wheel(wheel: &Utf8Path, dest: &Utf8Path) -> RepackResult<ExtractedWheel> {
    info!("unpacking {} into {}", wheel, dest);
    for category in WHEEL_CATEGORIES {
        LocalAsset::create_dir_all(dest.join(category))?;
    }

    let bytes = LocalAsset::load_bytes(wheel)?;
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|details| zip_err(wheel, details))?;

    let mut dist_info = None;
    for idx in 0..archive.len() {
        let mut entry = archive.by_index(idx).map_err(|details| zip_err(wheel, details))?;
        let name = entry.name().to_owned();
        let components: Vec<&str> = name.split('/').filter(|c| !c.is_empty()).collect();
        if components.iter().any(|c| *c == "..") || name.starts_with('/') {
            return Err(RepackError::UnsafeEntry {
                entry: name,
                archive: wheel.to_owned(),
            });
        }
        let Some(first) = components.first() else {
            continue;
        };

        let rel_path = match first.strip_suffix(".data") {
            // <stem>.data/<category>/... => <category>/...
            Some(_) if components.len() >= 2 && WHEEL_CATEGORIES.contains(&components[1]) => {
                components[1..].join("/")
            }
            _ => {
                if first.ends_with(".dist-info") && dist_info.is_none() {
                    dist_info = Some((*first).to_owned());
                }
                format!("platlib/{}", components.join("/"))
            }
        };

        let out_path = dest.join(rel_path);
        if entry.is_dir() {
            LocalAsset::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            LocalAsset::create_dir_all(parent)?;
        }
        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut contents)
            .map_err(|details| zip_err(wheel, details.into()))?;
        std::fs::write(&out_path, &contents)?;
    }

    let dist_info = dist_info.ok_or_else(|| RepackError::MissingDistInfo {
        wheel: wheel.to_owned(),
    })?;
    Ok(ExtractedWheel { dist_info })
}

/// Administratively extract an MSI into `target` without installing it.
///
/// Both paths should be absolute: msiexec resolves TARGETDIR itself and has
/// no idea what our cwd is. A non-zero exit is fatal for the run.
pub fn admin_extract_msi(msi: &Utf8Path, target: &Utf8Path) -> RepackResult<()> {
    info!("extracting {} into {}", msi, target);
    let mut cmd = Cmd::new("msiexec", "administratively extract msi");
    cmd.arg("/a").arg(msi);
    cmd.arg("/qn");
    cmd.arg(format!("TARGETDIR={target}"));
    cmd.stdout_to_stderr();
    cmd.run()?;
    Ok(())
}

/// Recursively copy `src` into `dest`: files overwrite, directories merge,
/// and anything present only in `dest` survives.
pub fn merge_tree(src: &Utf8Path, dest: &Utf8Path) -> RepackResult<()> {
    LocalAsset::create_dir_all(dest)?;
    for entry in src.read_dir_utf8()? {
        let entry = entry?;
        let dest_path = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            merge_tree(entry.path(), &dest_path)?;
        } else {
            std::fs::copy(entry.path(), &dest_path)?;
        }
    }
    Ok(())
}

fn zip_err(path: &Utf8Path, details: zip::result::ZipError) -> RepackError {
    RepackError::Zip {
        path: path.to_owned(),
        details,
    }
}
