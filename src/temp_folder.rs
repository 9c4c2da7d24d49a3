//! Scoped temporary folders.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::TempDir;

/// A temporary folder removed, with its contents, when dropped.
///
/// With `follow`, the current directory is changed to the folder for the
/// lifetime of the value and restored afterwards.
pub struct TempFolder {
    dir: TempDir,
    path: PathBuf,
    previous_cwd: Option<PathBuf>,
}

impl TempFolder {
    pub fn new() -> io::Result<Self> {
        Self::create(false)
    }

    /// Create the folder and make it the current directory.
    pub fn follow() -> io::Result<Self> {
        Self::create(true)
    }

    fn create(follow: bool) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("logsetup-").tempdir()?;
        // Resolve symlinks such as macOS /var -> /private/var.
        let path = dir.path().canonicalize()?;
        let previous_cwd = if follow {
            let cwd = env::current_dir()?;
            env::set_current_dir(&path)?;
            Some(cwd)
        } else {
            None
        };
        Ok(Self {
            dir,
            path,
            previous_cwd,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The canonical path as a string, suitable for `LogSpec::tmp`.
    pub fn path_string(&self) -> String {
        self.path.display().to_string()
    }

    pub fn is_following(&self) -> bool {
        self.previous_cwd.is_some()
    }
}

impl Drop for TempFolder {
    fn drop(&mut self) {
        if let Some(cwd) = self.previous_cwd.take() {
            if let Err(err) = env::set_current_dir(&cwd) {
                debug!("Can't restore current folder {}: {err}", cwd.display());
            }
        }
        debug!("Removing temp folder {}", self.dir.path().display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serial_test::serial;
    use std::fs;

    #[rstest]
    fn removed_on_drop() {
        let folder = TempFolder::new().expect("create temp folder");
        let path = folder.path().to_path_buf();
        fs::write(path.join("file.txt"), "data").expect("write into temp folder");
        assert!(path.is_dir());
        assert!(!folder.is_following());
        assert_eq!(folder.path_string(), path.display().to_string());
        drop(folder);
        assert!(!path.exists());
    }

    #[rstest]
    #[serial]
    fn follow_changes_and_restores_cwd() {
        let before = env::current_dir().expect("current dir");
        let folder = TempFolder::follow().expect("create temp folder");
        assert!(folder.is_following());
        assert_eq!(
            env::current_dir().expect("current dir").canonicalize().expect("canonical"),
            folder.path()
        );
        drop(folder);
        assert_eq!(env::current_dir().expect("current dir"), before);
    }
}
