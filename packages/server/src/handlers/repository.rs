use artifact::RepositoryResponse;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;
use crate::utils::filename::contains_path_traversal;

/// Every repository response is recomputed per request.
const NO_CACHE: &str = "no-cache";

#[utoipa::path(
    get,
    path = "/repository/{path}",
    tag = "Repository",
    operation_id = "getRepositoryFile",
    summary = "Fetch a file from the Maven repository",
    description = "Resolves `{groupPath}/{artifactId}/{version}/{filename}`. \
        `maven-metadata.xml` and `.pom` files are synthesized, `.sha1`/`.md5` return checksums, \
        `.jar`/`.zip` are packed on demand from the project's source root, \
        and any other filename is served from the project directory. `HEAD` is also supported.",
    params(("path" = String, Path, description = "Repository path, e.g. `com/example/demo/1.0.0/demo-1.0.0.jar`")),
    responses(
        (status = 200, description = "Artifact, metadata or checksum"),
        (status = 404, description = "Unknown artifact or malformed path (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Packaging failed (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_repository_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    if contains_path_traversal(&path) {
        return Err(AppError::NotFound(format!("Not found: {path}")));
    }

    let response = state.dispatcher.dispatch(&path).await?;
    into_http(response)
}

fn into_http(response: RepositoryResponse) -> Result<Response, AppError> {
    let builder = Response::builder().status(StatusCode::OK);

    let builder = match &response {
        RepositoryResponse::Xml(_) => builder
            .header(header::CONTENT_TYPE, "text/xml")
            .header(header::CACHE_CONTROL, NO_CACHE),
        RepositoryResponse::Checksum(_) => builder
            .header(header::CONTENT_TYPE, "text/plain")
            .header(header::CACHE_CONTROL, NO_CACHE),
        RepositoryResponse::Archive { filename, .. } => builder
            .header(header::CONTENT_TYPE, "application/java-archive")
            .header(
                header::CONTENT_DISPOSITION,
                content_disposition_value(filename),
            )
            .header(header::CACHE_CONTROL, NO_CACHE),
        RepositoryResponse::File { path, .. } => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            builder.header(header::CONTENT_TYPE, mime.as_ref())
        }
    };

    let body = match response {
        RepositoryResponse::Xml(text) | RepositoryResponse::Checksum(text) => Body::from(text),
        RepositoryResponse::Archive { bytes, .. } | RepositoryResponse::File { bytes, .. } => {
            Body::from(bytes)
        }
    };

    builder
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// Build a safe `Content-Disposition` header value.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let name = if ascii_safe.is_empty() {
        "artifact.jar".to_string()
    } else {
        ascii_safe
    };
    format!("attachment; filename=\"{name}\"")
}
