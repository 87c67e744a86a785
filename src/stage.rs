//! The staging directory and the in-place edits we make to the staged tree

use axoasset::LocalAsset;
use camino::{Utf8Path, Utf8PathBuf};
use newline_converter::dos2unix;
use tracing::{info, warn};

use crate::errors::*;

/// The top-level directory name everything must end up under
pub const PACKAGE_DIR: &str = "osgeo";

/// The bootstrap file we patch
pub const INIT_FILE: &str = "__init__.py";

/// The marker line the upstream `__init__.py` template leaves for us
pub const INIT_MARKER: &str = "#__ENVIRONMENT_SETUP__";

/// The bootstrap block spliced in over the marker: locates the package's own
/// directory at import time and points GDAL at the bundled data and plugins,
/// swallowing any failure so a broken environment never breaks import.
const INIT_BOOTSTRAP: &str = "\
try:
    import os
    _here = os.path.dirname(os.path.abspath(__file__))
    os.environ['GDAL_DATA'] = os.path.join(_here, 'data', 'gdal')
    os.environ['GDAL_DRIVER_PATH'] = os.path.join(_here, 'gdalplugins')
    os.environ['PATH'] = _here + os.pathsep + os.environ['PATH']
except Exception:
    pass";

/// An ephemeral directory tree, exclusively owned by one pipeline run.
///
/// Created at pipeline start, removed at pipeline end whether the run
/// succeeded or not; a failed removal is a stale-tempdir nuisance and gets
/// downgraded to a warning.
#[derive(Debug)]
pub struct Staging {
    root: Utf8PathBuf,
}

impl Staging {
    /// Create a uniquely-named staging dir under `parent`
    pub fn create(parent: &Utf8Path) -> RepackResult<Self> {
        let root = parent.join(format!("gdal-{}", uuid::Uuid::new_v4().simple()));
        LocalAsset::create_dir_all(&root)?;
        info!("staging in {root}");
        Ok(Staging { root })
    }

    /// The staging root
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// The category dir the output wheel is built from
    pub fn platlib(&self) -> Utf8PathBuf {
        self.root.join("platlib")
    }

    /// The library payload dir (`platlib/osgeo`)
    pub fn libdir(&self) -> Utf8PathBuf {
        self.platlib().join(PACKAGE_DIR)
    }

    /// Best-effort removal of the whole staging tree
    pub fn cleanup(self) {
        if let Err(details) = std::fs::remove_dir_all(&self.root) {
            warn!("unable to delete {}: {details}", self.root);
        }
    }
}

/// A scoped cwd change that restores the previous cwd on every exit path.
///
/// The cwd is the one piece of process-global mutable state this tool
/// touches, so it only ever moves through this guard.
pub struct Pushd {
    prev: Utf8PathBuf,
}

impl Pushd {
    /// Change into `dir`, remembering where we came from
    pub fn change(dir: &Utf8Path) -> RepackResult<Self> {
        let prev = LocalAsset::current_dir()?;
        std::env::set_current_dir(dir)?;
        Ok(Pushd { prev })
    }
}

impl Drop for Pushd {
    fn drop(&mut self) {
        if let Err(details) = std::env::set_current_dir(&self.prev) {
            warn!("unable to change back to {}: {details}", self.prev);
        }
    }
}

/// Splice the env-var bootstrap block into a staged `__init__.py`,
/// normalizing line endings while we're in there.
///
/// Returns whether the marker was found. Each run starts from a fresh
/// unpatched copy, so a missing marker usually means the upstream file
/// changed shape; we report it rather than fail.
pub fn patch_init(init_path: &Utf8Path) -> RepackResult<bool> {
    let text = LocalAsset::load_string(init_path)?;
    let text = dos2unix(&text).into_owned();
    let patched = text.contains(INIT_MARKER);
    let text = text.replace(INIT_MARKER, INIT_BOOTSTRAP);
    LocalAsset::write_new(&text, init_path)?;
    if !patched {
        warn!("no {INIT_MARKER} marker in {init_path}; bootstrap block not inserted");
    }
    Ok(patched)
}

/// Quarantine any plugins the primary payload shipped: move the existing
/// `gdalplugins` aside as `gdalplugins.disabled` and start a fresh empty one
/// for the auxiliary installers to fill.
pub fn quarantine_plugins(libdir: &Utf8Path) -> RepackResult<()> {
    let plugin_dir = libdir.join("gdalplugins");
    if plugin_dir.exists() {
        std::fs::rename(&plugin_dir, libdir.join("gdalplugins.disabled"))?;
    }
    LocalAsset::create_dir_all(&plugin_dir)?;
    Ok(())
}

/// Remove top-level scripts the msi payload drags in that have no business
/// in the wheel.
///
/// A `.py` file survives iff it's the init file or it's the import stub for
/// a compiled extension module sitting next to it (`gdal.py` stays when
/// `_gdal.pyd` is present). Returns the names that were removed.
pub fn prune_scripts(libdir: &Utf8Path) -> RepackResult<Vec<String>> {
    let mut scripts = vec![];
    for entry in libdir.read_dir_utf8()? {
        let entry = entry?;
        if entry.file_type()?.is_file() && entry.file_name().ends_with(".py") {
            scripts.push(entry.file_name().to_owned());
        }
    }
    scripts.sort();

    let mut removed = vec![];
    for name in scripts {
        let stem = name.trim_end_matches(".py");
        let is_extension_stub = libdir.join(format!("_{stem}.pyd")).exists();
        if name == INIT_FILE || is_extension_stub {
            continue;
        }
        LocalAsset::remove_file(libdir.join(&name))?;
        removed.push(name);
    }
    Ok(removed)
}
