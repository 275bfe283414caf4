use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tracing::{info, instrument, warn};

use super::copy::copy_tree;
use super::metadata::{METADATA_FILE, ProjectMetadata, read_sidecar, write_sidecar};
use super::Project;
use crate::error::{RepositoryError, Result};
use crate::locator;
use crate::version::{VersionContext, VersionResolver};

/// Directory under the projects root where new content is prepared.
const STAGING_DIR: &str = ".staging";

/// Upper bound on `-N` suffixes tried when a project name is taken.
const MAX_NAME_SUFFIX: u32 = 10_000;

/// Name-keyed storage of hosted projects.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// All projects, sorted by name. A project with unreadable metadata is
    /// still listed with default metadata.
    async fn list(&self) -> Result<Vec<Project>>;

    async fn get(&self, name: &str) -> Result<Project>;

    /// Copies `source_dir` into a new project. The name is sanitized and
    /// suffixed with `-1`, `-2`, ... if it is already taken.
    async fn create(
        &self,
        name: &str,
        source_dir: &Path,
        metadata: ProjectMetadata,
    ) -> Result<Project>;

    /// Replaces the content of an existing project and merges `metadata`
    /// over its sidecar.
    async fn update(
        &self,
        name: &str,
        source_dir: &Path,
        metadata: ProjectMetadata,
    ) -> Result<Project>;

    async fn delete(&self, name: &str) -> Result<()>;
}

/// Replaces every character outside `[A-Za-z0-9_-]` with `-`.
pub fn sanitize_name(name: &str) -> Result<String> {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| if is_name_char(c) { c } else { '-' })
        .collect();

    if sanitized.is_empty() {
        return Err(RepositoryError::InvalidName(name.to_string()));
    }
    Ok(sanitized)
}

/// Whether `name` is a well-formed project name.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_name_char)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Projects stored as directories under a root, each with a JSON sidecar.
///
/// Layout: `{root}/{name}/` holds the project content and
/// `{root}/{name}/.project.json`; `{root}/.staging/` holds in-flight copies.
pub struct FilesystemProjectStore {
    root: PathBuf,
    versions: VersionResolver,
}

impl FilesystemProjectStore {
    pub async fn new(root: PathBuf, versions: VersionResolver) -> Result<Self> {
        fs::create_dir_all(root.join(STAGING_DIR)).await?;
        Ok(Self { root, versions })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn project_dir(&self, name: &str) -> Result<PathBuf> {
        if !is_valid_name(name) {
            return Err(RepositoryError::NotFound(format!("project '{name}'")));
        }
        Ok(self.root.join(name))
    }

    fn staging_path(&self) -> PathBuf {
        self.root
            .join(STAGING_DIR)
            .join(uuid::Uuid::new_v4().to_string())
    }

    async fn load(&self, name: &str, path: PathBuf) -> Result<Project> {
        let meta = match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => meta,
            Ok(_) => return Err(RepositoryError::NotFound(format!("project '{name}'"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RepositoryError::NotFound(format!("project '{name}'")));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Project {
            name: name.to_string(),
            metadata: read_sidecar(&path).await,
            modified: meta.modified()?,
            path,
        })
    }

    /// Copies `source_dir` into a fresh staging directory and fills in the
    /// source root and version. The sidecar is not written yet.
    async fn stage(
        &self,
        source_dir: &Path,
        metadata: &ProjectMetadata,
        override_version: Option<&str>,
    ) -> Result<(PathBuf, ProjectMetadata)> {
        let staging = self.staging_path();
        let prepared = self
            .prepare(&staging, source_dir, metadata, override_version)
            .await;
        match prepared {
            Ok(metadata) => Ok((staging, metadata)),
            Err(e) => {
                discard(&staging).await;
                Err(e)
            }
        }
    }

    async fn prepare(
        &self,
        staging: &Path,
        source_dir: &Path,
        metadata: &ProjectMetadata,
        override_version: Option<&str>,
    ) -> Result<ProjectMetadata> {
        let (src, dst) = (source_dir.to_path_buf(), staging.to_path_buf());
        let copied = tokio::task::spawn_blocking(move || copy_tree(&src, &dst)).await??;

        let dir = staging.to_path_buf();
        let source_root = tokio::task::spawn_blocking(move || locator::locate(&dir)).await?;

        let version = self
            .versions
            .resolve(VersionContext {
                override_version,
                original_filename: metadata.original_filename.as_deref(),
                upstream_url: metadata.upstream_url.as_deref(),
                source_dir: staging,
            })
            .await;

        info!(
            files = copied,
            source_root = source_root.as_deref().unwrap_or("-"),
            version = version.as_deref().unwrap_or("-"),
            "Staged project content"
        );

        let mut prepared = metadata.clone();
        prepared.source_root = source_root;
        if version.is_some() {
            prepared.version = version;
        }
        Ok(prepared)
    }

    /// Moves `staging` to the first free name among `base`, `base-1`, ...
    async fn claim_name(&self, base: &str, staging: &Path) -> Result<String> {
        for n in 0..=MAX_NAME_SUFFIX {
            let candidate = if n == 0 {
                base.to_string()
            } else {
                format!("{base}-{n}")
            };
            let target = self.root.join(&candidate);
            if fs::try_exists(&target).await? {
                continue;
            }
            // A concurrent create may take the name between the check and
            // the rename; renaming onto a non-empty directory fails.
            match fs::rename(staging, &target).await {
                Ok(()) => return Ok(candidate),
                Err(e) if is_name_taken(&e) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(RepositoryError::InvalidName(format!(
            "no free name for '{base}'"
        )))
    }
}

fn is_name_taken(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::DirectoryNotEmpty | std::io::ErrorKind::AlreadyExists
    )
}

async fn discard(staging: &Path) {
    if let Err(e) = fs::remove_dir_all(staging).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %staging.display(), error = %e, "Failed to remove staging directory");
        }
    }
}

/// Removes every entry of `dir` except the sidecar.
async fn clear_except_sidecar(dir: &Path) -> Result<()> {
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_name() == METADATA_FILE {
            continue;
        }
        if entry.file_type().await?.is_dir() {
            fs::remove_dir_all(entry.path()).await?;
        } else {
            fs::remove_file(entry.path()).await?;
        }
    }
    Ok(())
}

/// Swaps staged content into `project_dir` and rewrites its sidecar.
async fn replace_content(
    project_dir: &Path,
    staging: &Path,
    metadata: &ProjectMetadata,
) -> Result<()> {
    clear_except_sidecar(project_dir).await?;
    move_entries(staging, project_dir).await?;
    write_sidecar(project_dir, metadata).await
}

/// Moves every entry of `from` into `to`.
async fn move_entries(from: &Path, to: &Path) -> Result<()> {
    let mut entries = fs::read_dir(from).await?;
    while let Some(entry) = entries.next_entry().await? {
        fs::rename(entry.path(), to.join(entry.file_name())).await?;
    }
    Ok(())
}

#[async_trait]
impl ProjectStore for FilesystemProjectStore {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Project>> {
        let mut projects = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_valid_name(&name) {
                continue;
            }
            match entry.file_type().await {
                Ok(t) if t.is_dir() => {}
                _ => continue,
            }

            match self.load(&name, entry.path()).await {
                Ok(project) => projects.push(project),
                Err(e) => warn!(project = %name, error = %e, "Skipping unreadable project"),
            }
        }

        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    async fn get(&self, name: &str) -> Result<Project> {
        let path = self.project_dir(name)?;
        self.load(name, path).await
    }

    #[instrument(skip(self, metadata), fields(source = %source_dir.display()))]
    async fn create(
        &self,
        name: &str,
        source_dir: &Path,
        metadata: ProjectMetadata,
    ) -> Result<Project> {
        let base = sanitize_name(name)?;
        let now = Utc::now();

        let (staging, mut prepared) = self
            .stage(source_dir, &metadata, metadata.version.as_deref())
            .await?;
        prepared.uploaded_at.get_or_insert(now);
        prepared.last_updated = Some(now);

        let claimed = match write_sidecar(&staging, &prepared).await {
            Ok(()) => self.claim_name(&base, &staging).await,
            Err(e) => Err(e),
        };
        let name = match claimed {
            Ok(name) => name,
            Err(e) => {
                discard(&staging).await;
                return Err(e);
            }
        };

        info!(project = %name, "Project created");
        self.get(&name).await
    }

    #[instrument(skip(self, metadata), fields(source = %source_dir.display()))]
    async fn update(
        &self,
        name: &str,
        source_dir: &Path,
        metadata: ProjectMetadata,
    ) -> Result<Project> {
        let existing = self.get(name).await?;

        let mut merged = existing.metadata.clone();
        merged.merge(metadata.clone());

        // Content is fully staged before anything in the project is touched.
        let (staging, prepared) = self
            .stage(source_dir, &merged, metadata.version.as_deref())
            .await?;

        let mut updated = prepared;
        updated.last_updated = Some(Utc::now());
        let swapped = replace_content(&existing.path, &staging, &updated).await;

        discard(&staging).await;
        swapped?;

        info!(project = %name, "Project updated");
        self.get(name).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, name: &str) -> Result<()> {
        let path = self.project_dir(name)?;
        match fs::remove_dir_all(&path).await {
            Ok(()) => {
                info!(project = %name, "Project deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RepositoryError::NotFound(format!("project '{name}'")))
            }
            Err(e) => Err(e.into()),
        }
    }
}
