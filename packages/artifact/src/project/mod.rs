mod copy;
mod metadata;
mod store;

use std::path::PathBuf;
use std::time::SystemTime;

pub use copy::copy_tree;
pub use metadata::{METADATA_FILE, ProjectMetadata, read_sidecar, write_sidecar};
pub use store::{FilesystemProjectStore, ProjectStore, is_valid_name, sanitize_name};

use crate::coordinate::DEFAULT_VERSION;

/// A hosted project: a directory under the projects root plus its sidecar.
#[derive(Debug, Clone)]
pub struct Project {
    /// Directory name; doubles as the Maven artifactId.
    pub name: String,
    pub path: PathBuf,
    /// Modification time of the project directory.
    pub modified: SystemTime,
    pub metadata: ProjectMetadata,
}

impl Project {
    /// The version served for this project.
    pub fn version(&self) -> &str {
        self.metadata.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }

    /// The directory packaged into archives: the recorded source root when it
    /// still exists, otherwise the whole project directory.
    pub fn effective_source_root(&self) -> PathBuf {
        self.metadata
            .source_root
            .as_deref()
            .map(|rel| self.path.join(rel))
            .filter(|p| p.is_dir())
            .unwrap_or_else(|| self.path.clone())
    }
}
