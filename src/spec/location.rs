//! Resolution of the log file a [`LogSpec`] points at.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use log::debug;

use super::LogSpec;
use crate::template;

impl LogSpec {
    /// Value substituted for a `{marker}` in basename and location templates.
    fn marker(&self, key: &str) -> Option<String> {
        match key {
            "appname" => self.appname.clone().filter(|name| !name.is_empty()),
            "basename" => Some(self.basename.clone()),
            "tmp" => Some(self.tmp.clone()),
            "pid" => Some(process::id().to_string()),
            _ => None,
        }
    }

    /// Expand `text` against this spec's markers; `None` if any is unresolved.
    pub fn expanded(&self, text: &str) -> Option<String> {
        template::formatted(text, |key| self.marker(key), true)
    }

    /// The basename with its markers expanded, `None` if that fails or yields "".
    pub fn rendered_basename(&self) -> Option<String> {
        self.expanded(&self.basename).filter(|name| !name.is_empty())
    }

    /// Whether file logging is configured at all.
    ///
    /// An unset file format or an empty custom location turns it off. A
    /// non-empty custom location turns it on; otherwise at least one location
    /// template is needed.
    pub fn should_log_to_file(&self) -> bool {
        if self.file_format.is_none() {
            return false;
        }
        match self.custom_location.as_deref() {
            Some(custom) => !custom.is_empty(),
            None => self.locations.as_ref().is_some_and(|l| !l.is_empty()),
        }
    }

    /// First location that resolves to a file in a writable folder.
    ///
    /// A custom location is taken literally and must not be a folder.
    /// Otherwise each location template is expanded in turn; a result that
    /// names an existing folder has the rendered basename appended. Missing
    /// parent folders are created.
    pub fn usable_location(&self) -> Option<PathBuf> {
        if !self.should_log_to_file() {
            return None;
        }
        if let Some(custom) = &self.custom_location {
            let path = PathBuf::from(custom);
            if path.is_dir() {
                debug!("Can't log to {custom}: it is a folder");
                return None;
            }
            return usable_file(path);
        }
        self.locations
            .iter()
            .flatten()
            .filter_map(|location| self.candidate(location))
            .find_map(usable_file)
    }

    fn candidate(&self, location: &str) -> Option<PathBuf> {
        let path = PathBuf::from(self.expanded(location)?);
        if path.is_dir() {
            return Some(path.join(self.rendered_basename()?));
        }
        Some(path)
    }
}

fn usable_file(path: PathBuf) -> Option<PathBuf> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_writable_folder(&parent).then_some(path)
}

/// Create `folder` if needed and check that files can be created in it.
pub(crate) fn ensure_writable_folder(folder: &Path) -> bool {
    if !folder.is_dir() {
        if let Err(err) = fs::create_dir_all(folder) {
            debug!("Can't create folder {}: {err}", folder.display());
            return false;
        }
        debug!("Created folder {}", folder.display());
    }
    match tempfile::Builder::new()
        .prefix(".logsetup-probe")
        .tempfile_in(folder)
    {
        Ok(_) => true,
        Err(err) => {
            debug!("Can't write to folder {}: {err}", folder.display());
            false
        }
    }
}
