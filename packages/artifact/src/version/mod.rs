//! Version inference for projects that were uploaded without an explicit version.

mod tags;

use std::fs;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub use tags::{GithubTagSource, TagSource, parse_github_repo};

static FILENAME_PATTERNS: LazyLock<[Regex; 5]> = LazyLock::new(|| {
    [
        r"-v?(\d+\.\d+\.\d+)$",
        r"-v?(\d+\.\d+)$",
        r"v(\d+\.\d+\.\d+)",
        r"v(\d+\.\d+)",
        r"(\d+\.\d+\.\d+)",
    ]
    .map(|p| Regex::new(p).expect("valid filename version pattern"))
});

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v?\d+\.\d+(\.\d+)?$").expect("valid tag pattern"));

static PROPERTY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^version\s*=\s*(.+)$").expect("valid property pattern"));

static PROPERTY_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.\d+(\.\d+)?(-[\w.]+)?$").expect("valid property version pattern")
});

const GRADLE_PROPERTIES: &str = "gradle.properties";

/// Inputs available when inferring a project's version.
#[derive(Debug, Clone, Copy)]
pub struct VersionContext<'a> {
    /// Version supplied explicitly by the uploader.
    pub override_version: Option<&'a str>,
    pub original_filename: Option<&'a str>,
    pub upstream_url: Option<&'a str>,
    /// Root of the project content, searched for build properties.
    pub source_dir: &'a Path,
}

/// Resolves a version from, in order: the explicit override, the uploaded
/// filename, the upstream tag list and an embedded `gradle.properties`.
#[derive(Clone)]
pub struct VersionResolver {
    tags: Arc<dyn TagSource>,
}

impl VersionResolver {
    pub fn new(tags: Arc<dyn TagSource>) -> Self {
        Self { tags }
    }

    pub async fn resolve(&self, ctx: VersionContext<'_>) -> Option<String> {
        if let Some(version) = ctx.override_version.map(str::trim).filter(|v| !v.is_empty()) {
            return Some(version.to_string());
        }

        if let Some(version) = ctx.original_filename.and_then(version_from_filename) {
            debug!(%version, "Version inferred from filename");
            return Some(version);
        }

        if let Some(url) = ctx.upstream_url {
            match self.tags.list_tags(url).await {
                Ok(tags) => {
                    if let Some(version) = latest_tag(&tags) {
                        debug!(%version, upstream = url, "Version inferred from upstream tags");
                        return Some(version);
                    }
                }
                Err(e) => warn!(upstream = url, error = %e, "Failed to fetch upstream tags"),
            }
        }

        let dir = ctx.source_dir.to_path_buf();
        match tokio::task::spawn_blocking(move || version_from_gradle_properties(&dir)).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Build properties scan failed");
                None
            }
        }
    }
}

/// Matches the filename (extension stripped) against the version patterns.
pub fn version_from_filename(filename: &str) -> Option<String> {
    let stem = strip_extension(filename);
    FILENAME_PATTERNS
        .iter()
        .find_map(|re| re.captures(stem))
        .map(|caps| caps[1].to_string())
}

/// Removes a trailing extension, unless it is purely numeric (and therefore
/// part of a version like `lib-1.2.3`).
fn strip_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && !ext.is_empty() && !ext.chars().all(|c| c.is_ascii_digit()) =>
        {
            stem
        }
        _ => filename,
    }
}

/// Picks the highest semantic-looking tag, with any leading `v` removed.
pub fn latest_tag(tags: &[String]) -> Option<String> {
    tags.iter()
        .filter(|t| TAG_PATTERN.is_match(t))
        .map(|t| t.strip_prefix('v').unwrap_or(t.as_str()))
        .filter_map(|t| numeric_tuple(t).map(|key| (key, t)))
        .max_by_key(|(key, _)| *key)
        .map(|(_, t)| t.to_string())
}

/// `None` if a component does not fit in a `u64`.
fn numeric_tuple(version: &str) -> Option<(u64, u64, u64)> {
    let parts = version
        .split('.')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    Some((
        parts.first().copied().unwrap_or(0),
        parts.get(1).copied().unwrap_or(0),
        parts.get(2).copied().unwrap_or(0),
    ))
}

/// Searches the tree (hidden directories skipped) for a `gradle.properties`
/// declaring a valid `version`.
pub fn version_from_gradle_properties(root: &Path) -> Option<String> {
    let candidates = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == GRADLE_PROPERTIES)
        .map(|e| e.into_path());

    candidates
        .filter_map(|path| read_property_version(&path))
        .next()
}

fn is_hidden_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name().to_string_lossy().starts_with('.')
}

fn read_property_version(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let raw = content
        .lines()
        .find_map(|line| PROPERTY_LINE.captures(line.trim_start()))?
        .get(1)?
        .as_str()
        .trim()
        .to_string();

    if PROPERTY_VERSION.is_match(&raw) {
        Some(raw)
    } else {
        debug!(path = %path.display(), value = %raw, "Ignoring invalid version property");
        None
    }
}
