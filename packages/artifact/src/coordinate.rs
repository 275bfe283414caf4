use serde::Serialize;

use crate::error::{RepositoryError, Result};

/// Version served when a project has neither an override nor an inferred version.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// A Maven coordinate plus the requested file, derived from a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub filename: String,
}

impl Coordinate {
    /// Parses `{group segments...}/{artifactId}/{version}/{filename}`.
    ///
    /// Empty segments (leading, trailing or doubled slashes) are ignored. At
    /// least four segments are required. Character sets are not validated
    /// here; unknown artifacts simply fail to resolve to a project.
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let [group @ .., artifact_id, version, filename] = segments.as_slice() else {
            return Err(RepositoryError::BadPath(path.to_string()));
        };
        if group.is_empty() {
            return Err(RepositoryError::BadPath(path.to_string()));
        }

        Ok(Self {
            group_id: group.join("."),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            filename: filename.to_string(),
        })
    }

    /// The coordinate of a project's primary JAR.
    pub fn for_project(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            filename: format!("{artifact_id}-{version}.jar"),
        }
    }

    /// Repository-relative path, the inverse of [`Coordinate::parse`].
    pub fn maven_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group_id.replace('.', "/"),
            self.artifact_id,
            self.version,
            self.filename
        )
    }
}

/// Copy-paste dependency snippets shown next to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyDeclarations {
    pub maven: String,
    pub gradle: String,
}

impl DependencyDeclarations {
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> Self {
        let maven = format!(
            "<dependency>\n    <groupId>{group_id}</groupId>\n    <artifactId>{artifact_id}</artifactId>\n    <version>{version}</version>\n</dependency>"
        );
        let gradle = format!("implementation '{group_id}:{artifact_id}:{version}'");
        Self { maven, gradle }
    }
}
