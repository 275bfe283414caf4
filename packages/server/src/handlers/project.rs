use artifact::ProjectMetadata;
use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tempfile::TempDir;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminUser;
use crate::models::project::ProjectResponse;
use crate::state::AppState;
use crate::utils::archive::extract_zip;
use crate::utils::filename::{file_stem, validate_flat_filename};

/// Recorded as `uploadedBy`; the admin token carries no identity.
const ADMIN_USER: &str = "admin";

#[utoipa::path(
    get,
    path = "/",
    tag = "Projects",
    operation_id = "listProjects",
    summary = "List hosted projects",
    description = "Returns every hosted project sorted by name, with its coordinates and dependency snippets.",
    responses(
        (status = 200, description = "All projects", body = Vec<ProjectResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectResponse>>, AppError> {
    let group_id = &state.config.repository.default_group_id;
    let projects = state.store.list().await?;

    Ok(Json(
        projects
            .into_iter()
            .map(|p| ProjectResponse::new(p, group_id))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/{name}",
    tag = "Projects",
    operation_id = "getProject",
    summary = "Get a project by name",
    params(("name" = String, Path, description = "Project name (the artifactId)")),
    responses(
        (status = 200, description = "Project details", body = ProjectResponse),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_project(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ProjectResponse>, AppError> {
    let project = state.store.get(&name).await?;
    Ok(Json(ProjectResponse::new(
        project,
        &state.config.repository.default_group_id,
    )))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Projects",
    operation_id = "createProject",
    summary = "Upload a new project",
    description = "Creates a project from a ZIP of its sources. Multipart fields: `file` (required), \
        `name`, `version`, `upstreamUrl`, `upstreamBranch`. The name defaults to the uploaded \
        filename without extension and gets a `-1`, `-2`, ... suffix when taken.",
    request_body(content_type = "multipart/form-data", description = "ZIP archive of the project sources plus optional metadata fields"),
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Project management disabled (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("admin_token" = [])),
)]
#[instrument(skip(state, _admin, multipart))]
pub async fn create_project(
    _admin: AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = UploadForm::read(multipart).await?;

    let name = form
        .name
        .clone()
        .or_else(|| {
            form.original_filename
                .as_deref()
                .and_then(file_stem)
                .map(str::to_string)
        })
        .ok_or_else(|| AppError::Validation("Missing 'name' field".into()))?;

    let source = extract_upload(form.data, state.config.storage.max_upload_size).await?;
    let metadata = ProjectMetadata {
        original_filename: form.original_filename,
        uploaded_by: Some(ADMIN_USER.into()),
        version: form.version,
        upstream_url: form.upstream_url,
        upstream_branch: form.upstream_branch,
        ..Default::default()
    };

    let project = state.store.create(&name, source.path(), metadata).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse::new(
            project,
            &state.config.repository.default_group_id,
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/{name}",
    tag = "Projects",
    operation_id = "updateProject",
    summary = "Replace a project's sources",
    description = "Replaces the project content with a new ZIP. Metadata fields that are not \
        supplied keep their previous values; the version is re-inferred from the new upload \
        unless `version` is given, and kept if nothing can be inferred.",
    params(("name" = String, Path, description = "Project name")),
    request_body(content_type = "multipart/form-data", description = "ZIP archive of the project sources plus optional metadata fields"),
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Project management disabled (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("admin_token" = [])),
)]
#[instrument(skip(state, _admin, multipart))]
pub async fn update_project(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(name): Path<String>,
    multipart: Multipart,
) -> Result<Json<ProjectResponse>, AppError> {
    let form = UploadForm::read(multipart).await?;
    if form.name.as_deref().is_some_and(|n| n != name) {
        return Err(AppError::Validation("Projects cannot be renamed".into()));
    }

    let source = extract_upload(form.data, state.config.storage.max_upload_size).await?;
    let metadata = ProjectMetadata {
        original_filename: form.original_filename,
        uploaded_by: Some(ADMIN_USER.into()),
        version: form.version,
        upstream_url: form.upstream_url,
        upstream_branch: form.upstream_branch,
        ..Default::default()
    };

    let project = state.store.update(&name, source.path(), metadata).await?;

    Ok(Json(ProjectResponse::new(
        project,
        &state.config.repository.default_group_id,
    )))
}

#[utoipa::path(
    delete,
    path = "/{name}",
    tag = "Projects",
    operation_id = "deleteProject",
    summary = "Delete a project",
    params(("name" = String, Path, description = "Project name")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Project management disabled (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("admin_token" = [])),
)]
#[instrument(skip(state, _admin))]
pub async fn delete_project(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Body limit for upload routes.
pub fn upload_body_limit(max_upload_size: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_upload_size)
}

/// Multipart fields shared by create and update.
struct UploadForm {
    data: Vec<u8>,
    original_filename: Option<String>,
    name: Option<String>,
    version: Option<String>,
    upstream_url: Option<String>,
    upstream_branch: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut data: Option<Vec<u8>> = None;
        let mut original_filename = None;
        let mut name = None;
        let mut version = None;
        let mut upstream_url = None;
        let mut upstream_branch = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            let field_name = field.name().unwrap_or_default().to_string();
            if field_name == "file" {
                original_filename = field
                    .file_name()
                    .map(|f| {
                        validate_flat_filename(f)
                            .map(str::to_string)
                            .map_err(|e| AppError::Validation(e.message().into()))
                    })
                    .transpose()?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
                data = Some(bytes.to_vec());
                continue;
            }

            let slot = match field_name.as_str() {
                "name" => &mut name,
                "version" => &mut version,
                "upstreamUrl" => &mut upstream_url,
                "upstreamBranch" => &mut upstream_branch,
                _ => continue,
            };
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read '{field_name}': {e}")))?;
            let value = value.trim();
            if !value.is_empty() {
                *slot = Some(value.to_string());
            }
        }

        let data = data.ok_or_else(|| AppError::Validation("Missing 'file' field".into()))?;

        Ok(Self {
            data,
            original_filename,
            name,
            version,
            upstream_url,
            upstream_branch,
        })
    }
}

/// Extracts the uploaded ZIP into a fresh temporary directory.
async fn extract_upload(data: Vec<u8>, max_size: usize) -> Result<TempDir, AppError> {
    tokio::task::spawn_blocking(move || {
        let dir = tempfile::Builder::new()
            .prefix("upload-")
            .tempdir()
            .map_err(|e| AppError::Internal(format!("Failed to create temp dir: {e}")))?;
        let files = extract_zip(&data, dir.path(), max_size as u64)?;
        if files == 0 {
            return Err(AppError::Validation("ZIP contains no files".into()));
        }
        Ok::<_, AppError>(dir)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Extraction task failed: {e}")))?
}
