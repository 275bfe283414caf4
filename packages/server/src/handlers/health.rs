#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "health",
    summary = "Liveness probe",
    responses(
        (status = 200, description = "Server is up", body = String, content_type = "text/plain"),
    ),
)]
pub async fn health() -> &'static str {
    "ok"
}
