//! Unit tests for the repackaging pipeline

use std::sync::Mutex;

use camino::Utf8PathBuf;
use temp_dir::TempDir;

/// Pipeline runs change the process cwd, which is process-global state;
/// tests that drive a pipeline hold this lock so they never interleave.
static CWD_LOCK: Mutex<()> = Mutex::new(());

mod locate;
mod metadata;

/// A fresh temp dir plus its path as utf8 (every path we make is utf8)
fn utf8_tempdir() -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
    (dir, path)
}
