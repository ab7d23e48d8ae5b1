//! Shared helpers for settings tests

use camino::Utf8PathBuf;
use std::fs;
use tempfile::TempDir;

/// Write `content` to a settings file inside a fresh temp directory.
///
/// The directory is returned so it outlives the test body.
pub fn write_settings_file(content: &str) -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("taglist.yaml"))
        .expect("temp dir path is UTF-8");
    fs::write(&path, content).expect("write settings file");
    (dir, path)
}
