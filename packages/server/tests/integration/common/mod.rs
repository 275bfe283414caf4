use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use artifact::{FilesystemProjectStore, TagSource, VersionResolver};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tempfile::TempDir;

use server::config::{
    AppConfig, AuthConfig, CorsConfig, RepositoryConfig, ServerConfig, StorageConfig,
    UpstreamConfig,
};
use server::state::AppState;

pub const ADMIN_TOKEN: &str = "test-admin-token";

pub mod routes {
    pub const HEALTH: &str = "/health";
    pub const PROJECTS: &str = "/api/v1/projects";
    pub const OPENAPI: &str = "/api-docs/openapi.json";

    pub fn project(name: &str) -> String {
        format!("/api/v1/projects/{name}")
    }

    pub fn repository(path: &str) -> String {
        format!("/repository/{path}")
    }
}

/// Upstream that reports the same tags for every repository.
pub struct StubTags(pub Vec<String>);

#[async_trait]
impl TagSource for StubTags {
    async fn list_tags(&self, _upstream_url: &str) -> artifact::Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// A running test server backed by a temporary projects directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub projects_dir: PathBuf,
    _root: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// Raw response body.
    pub bytes: Vec<u8>,
    /// Body decoded as (lossy) UTF-8.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

/// Optional multipart text fields sent alongside an upload.
#[derive(Default)]
pub struct UploadFields<'a> {
    pub name: Option<&'a str>,
    pub version: Option<&'a str>,
    pub upstream_url: Option<&'a str>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(Some(ADMIN_TOKEN), Vec::new()).await
    }

    pub async fn spawn_with(admin_token: Option<&str>, upstream_tags: Vec<&str>) -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        let projects_dir = root.path().join("projects");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            storage: StorageConfig {
                projects_dir: projects_dir.clone(),
                max_upload_size: 16 * 1024 * 1024,
            },
            repository: RepositoryConfig {
                default_group_id: "com.example".to_string(),
            },
            auth: AuthConfig {
                admin_token: admin_token.map(str::to_string),
            },
            upstream: UpstreamConfig {
                github_api_url: "http://127.0.0.1:9".to_string(),
                timeout_secs: 1,
                token: None,
            },
        };

        let tags = StubTags(upstream_tags.into_iter().map(str::to_string).collect());
        let store = FilesystemProjectStore::new(
            projects_dir.clone(),
            VersionResolver::new(Arc::new(tags)),
        )
        .await
        .expect("Failed to open project store");

        let app = server::build_router(AppState::new(app_config, Arc::new(store)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            projects_dir,
            _root: root,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn head(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .head(self.url(path))
            .send()
            .await
            .expect("Failed to send HEAD request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Multipart upload to `path` with `POST`, or `PUT` when `update` is set.
    pub async fn upload(
        &self,
        update: bool,
        path: &str,
        file_name: &str,
        file_bytes: Vec<u8>,
        fields: UploadFields<'_>,
        token: Option<&str>,
    ) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(file_bytes)
            .file_name(file_name.to_string())
            .mime_str("application/zip")
            .expect("Failed to set MIME type");
        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(name) = fields.name {
            form = form.text("name", name.to_string());
        }
        if let Some(version) = fields.version {
            form = form.text("version", version.to_string());
        }
        if let Some(url) = fields.upstream_url {
            form = form.text("upstreamUrl", url.to_string());
        }

        let request = if update {
            self.client.put(self.url(path))
        } else {
            self.client.post(self.url(path))
        };
        let request = match token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        };

        let res = request
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Upload a project as admin and return its name.
    pub async fn create_project(&self, file_name: &str, files: &[(&str, &str)]) -> String {
        let res = self
            .upload(
                false,
                routes::PROJECTS,
                file_name,
                build_zip(files),
                UploadFields::default(),
                Some(ADMIN_TOKEN),
            )
            .await;
        assert_eq!(res.status, 201, "create_project failed: {}", res.text);
        res.body["name"]
            .as_str()
            .expect("response body should contain 'name'")
            .to_string()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let bytes = res.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            headers,
            bytes,
            text,
            body,
        }
    }

    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

/// Build a ZIP archive in memory with given file entries.
pub fn build_zip(files: &[(&str, &str)]) -> Vec<u8> {
    let cursor = std::io::Cursor::new(Vec::new());
    let mut writer = zip::ZipWriter::new(cursor);
    let options =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).expect("zip start_file");
        writer.write_all(content.as_bytes()).expect("zip write_all");
    }
    writer.finish().expect("zip finish").into_inner()
}

/// Entry names of a ZIP archive, in archive order.
pub fn zip_entries(bytes: &[u8]) -> Vec<String> {
    let mut archive =
        zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("response should be a ZIP");
    (0..archive.len())
        .map(|i| archive.by_index(i).expect("zip entry").name().to_string())
        .collect()
}
