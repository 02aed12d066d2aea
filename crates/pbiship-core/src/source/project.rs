//! Project folder recognition.

use std::path::Path;

/// Marker file identifying a project folder.
pub const PROJECT_MARKER: &str = ".pbixproj.json";

/// Decides whether a folder is a compilable project.
pub trait ProjectValidator: Send + Sync {
    fn is_project_folder(&self, folder: &Path) -> bool;
}

/// Treats any folder containing a marker file as a project.
#[derive(Debug, Clone)]
pub struct MarkerFileValidator {
    marker: String,
}

impl MarkerFileValidator {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Default for MarkerFileValidator {
    fn default() -> Self {
        Self::new(PROJECT_MARKER)
    }
}

impl ProjectValidator for MarkerFileValidator {
    fn is_project_folder(&self, folder: &Path) -> bool {
        folder.join(&self.marker).is_file()
    }
}
