use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, error, info, instrument};

use crate::coordinate::Coordinate;
use crate::error::{RepositoryError, Result};
use crate::packager;
use crate::project::{METADATA_FILE, ProjectStore};
use crate::synth::{self, ChecksumAlgorithm};

const METADATA_FILENAME: &str = "maven-metadata.xml";

/// Body and kind of a repository response.
#[derive(Debug)]
pub enum RepositoryResponse {
    /// `maven-metadata.xml` or a POM.
    Xml(String),
    /// Hex digest for a `.sha1` / `.md5` request.
    Checksum(String),
    /// Packed JAR/ZIP, served as an attachment named `filename`.
    Archive { filename: String, bytes: Vec<u8> },
    /// A literal file from the project tree.
    File { path: PathBuf, bytes: Vec<u8> },
}

/// Maps repository request paths to synthesized or stored content.
#[derive(Clone)]
pub struct RepositoryDispatcher {
    store: Arc<dyn ProjectStore>,
}

impl RepositoryDispatcher {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }

    /// Resolves one request path.
    ///
    /// Structured responses (metadata, checksum, archive, POM) are tried
    /// before falling back to serving a literal file by name.
    #[instrument(skip(self))]
    pub async fn dispatch(&self, path: &str) -> Result<RepositoryResponse> {
        let coord = Coordinate::parse(path)?;

        if coord.filename == METADATA_FILENAME {
            return Ok(RepositoryResponse::Xml(synth::metadata_xml(
                &coord.group_id,
                &coord.artifact_id,
                &coord.version,
            )));
        }

        if let Some(algorithm) = ChecksumAlgorithm::from_filename(&coord.filename) {
            let project = self.store.get(&coord.artifact_id).await?;
            return Ok(RepositoryResponse::Checksum(synth::checksum(
                &project.name,
                project.modified,
                algorithm,
            )));
        }

        let project = self.store.get(&coord.artifact_id).await?;

        if coord.filename.ends_with(".jar") || coord.filename.ends_with(".zip") {
            let root = project.effective_source_root();
            let sidecar = project.path.join(METADATA_FILE);
            debug!(root = %root.display(), "Packing source root");
            let bytes = tokio::task::spawn_blocking(move || packager::pack(&root, &sidecar))
                .await?
                .map_err(|e| {
                    error!(project = %project.name, error = %e, "Failed to pack project");
                    RepositoryError::Packaging(e.to_string())
                })?;
            info!(project = %project.name, size = bytes.len(), "Served archive");
            return Ok(RepositoryResponse::Archive {
                filename: coord.filename,
                bytes,
            });
        }

        if coord.filename.ends_with(".pom") {
            return Ok(RepositoryResponse::Xml(synth::pom_xml(
                &coord.group_id,
                &coord.artifact_id,
                &coord.version,
            )));
        }

        if !is_servable_filename(&coord.filename) {
            return Err(RepositoryError::NotFound(coord.filename));
        }

        for dir in [project.path.clone(), project.effective_source_root()] {
            if let Some(response) = read_file(&dir.join(&coord.filename)).await? {
                return Ok(response);
            }
        }

        Err(RepositoryError::NotFound(format!(
            "'{}' in project '{}'",
            coord.filename, project.name
        )))
    }
}

/// Direct file serving is limited to plain names inside the project.
fn is_servable_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name != METADATA_FILE
        && !name.contains(['\\', '\0'])
}

async fn read_file(path: &Path) -> Result<Option<RepositoryResponse>> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Ok(None),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let bytes = fs::read(path).await?;
    Ok(Some(RepositoryResponse::File {
        path: path.to_path_buf(),
        bytes,
    }))
}
