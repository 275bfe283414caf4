use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::warn;

use crate::error::Result;

/// Name of the sidecar file stored inside every project directory.
pub const METADATA_FILE: &str = ".project.json";

/// Per-project metadata persisted in the sidecar.
///
/// Every field is optional: a project uploaded by an older version, or one
/// whose sidecar was lost, still resolves with defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectMetadata {
    /// Filename of the uploaded archive, used for version inference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<String>,
    /// Explicit or inferred version. `None` is served as `1.0.0`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// `/`-separated path of the source root relative to the project directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl ProjectMetadata {
    /// Overwrites every field that is set in `newer`, keeping the rest.
    pub fn merge(&mut self, newer: ProjectMetadata) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.original_filename, newer.original_filename);
        take(&mut self.uploaded_at, newer.uploaded_at);
        take(&mut self.uploaded_by, newer.uploaded_by);
        take(&mut self.version, newer.version);
        take(&mut self.source_root, newer.source_root);
        take(&mut self.upstream_url, newer.upstream_url);
        take(&mut self.upstream_branch, newer.upstream_branch);
        take(&mut self.last_updated, newer.last_updated);
    }
}

/// Reads the sidecar of `project_dir`.
///
/// A missing or unparsable sidecar yields empty metadata; corruption is
/// logged and never surfaced to callers.
pub async fn read_sidecar(project_dir: &Path) -> ProjectMetadata {
    let path = project_dir.join(METADATA_FILE);
    let bytes = match fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return ProjectMetadata::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read project metadata");
            return ProjectMetadata::default();
        }
    };

    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "Corrupt project metadata, using defaults");
        ProjectMetadata::default()
    })
}

/// Writes the sidecar through a temporary file so readers never observe a
/// half-written document.
pub async fn write_sidecar(project_dir: &Path, metadata: &ProjectMetadata) -> Result<()> {
    let json = serde_json::to_vec_pretty(metadata)?;
    let temp_path = project_dir.join(format!("{METADATA_FILE}.{}", uuid::Uuid::new_v4()));

    if let Err(e) = fs::write(&temp_path, &json).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&temp_path, project_dir.join(METADATA_FILE)).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    Ok(())
}
