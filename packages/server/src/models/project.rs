use artifact::{Coordinate, DependencyDeclarations, Project};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Copy-paste snippets for consuming a project.
#[derive(Serialize, ToSchema)]
pub struct DependencySnippets {
    /// Maven `<dependency>` block.
    pub maven: String,
    /// Gradle `implementation` line.
    pub gradle: String,
}

impl From<DependencyDeclarations> for DependencySnippets {
    fn from(d: DependencyDeclarations) -> Self {
        Self {
            maven: d.maven,
            gradle: d.gradle,
        }
    }
}

/// A hosted project as shown in listings.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    #[schema(example = "demo")]
    pub name: String,
    #[schema(example = "com.example")]
    pub group_id: String,
    /// Always equal to `name`.
    pub artifact_id: String,
    #[schema(example = "1.2.3")]
    pub version: String,
    /// Detected source root relative to the project directory.
    #[schema(example = "src/main")]
    pub source_root_relative_path: Option<String>,
    /// Repository path of the primary JAR.
    #[schema(example = "com/example/demo/1.2.3/demo-1.2.3.jar")]
    pub maven_path: String,
    pub dependency_declaration_blocks: DependencySnippets,
    pub original_filename: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub uploaded_by: Option<String>,
    pub upstream_url: Option<String>,
    pub upstream_branch: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl ProjectResponse {
    pub fn new(project: Project, group_id: &str) -> Self {
        let version = project.version().to_string();
        let coordinate = Coordinate::for_project(group_id, &project.name, &version);
        let dependencies = DependencyDeclarations::new(group_id, &project.name, &version).into();
        let meta = project.metadata;

        Self {
            group_id: group_id.to_string(),
            artifact_id: project.name.clone(),
            maven_path: coordinate.maven_path(),
            name: project.name,
            version,
            source_root_relative_path: meta.source_root,
            dependency_declaration_blocks: dependencies,
            original_filename: meta.original_filename,
            uploaded_at: meta.uploaded_at,
            uploaded_by: meta.uploaded_by,
            upstream_url: meta.upstream_url,
            upstream_branch: meta.upstream_branch,
            last_updated: meta.last_updated,
        }
    }
}
