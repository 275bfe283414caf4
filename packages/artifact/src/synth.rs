//! On-demand Maven metadata, POM and checksum documents. Nothing is persisted.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use sha1::{Digest, Sha1};

/// Digest used for a `.sha1` / `.md5` companion file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAlgorithm {
    Sha1,
    Md5,
}

impl ChecksumAlgorithm {
    /// Picks the algorithm from a requested filename's suffix.
    pub fn from_filename(filename: &str) -> Option<Self> {
        if filename.ends_with(".sha1") {
            Some(Self::Sha1)
        } else if filename.ends_with(".md5") {
            Some(Self::Md5)
        } else {
            None
        }
    }
}

/// `maven-metadata.xml` listing `version` as the single, latest and release version.
pub fn metadata_xml(group_id: &str, artifact_id: &str, version: &str) -> String {
    let last_updated = Utc::now().format("%Y%m%d%H%M%S");
    let (g, a, v) = (escape(group_id), escape(artifact_id), escape(version));
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>{g}</groupId>
  <artifactId>{a}</artifactId>
  <versioning>
    <latest>{v}</latest>
    <release>{v}</release>
    <versions>
      <version>{v}</version>
    </versions>
    <lastUpdated>{last_updated}</lastUpdated>
  </versioning>
</metadata>
"#
    )
}

/// Minimal `jar` POM without dependencies.
pub fn pom_xml(group_id: &str, artifact_id: &str, version: &str) -> String {
    let (g, a, v) = (escape(group_id), escape(artifact_id), escape(version));
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
         xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 http://maven.apache.org/xsd/maven-4.0.0.xsd">
  <modelVersion>4.0.0</modelVersion>
  <groupId>{g}</groupId>
  <artifactId>{a}</artifactId>
  <version>{v}</version>
  <packaging>jar</packaging>
</project>
"#
    )
}

/// Hex digest of `"{project_name}-{modified millis}"`.
///
/// This tracks the project directory's modification time rather than the
/// served bytes: it changes exactly when the project is rewritten.
pub fn checksum(project_name: &str, modified: SystemTime, algorithm: ChecksumAlgorithm) -> String {
    let millis = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let input = format!("{project_name}-{millis}");

    match algorithm {
        ChecksumAlgorithm::Sha1 => hex::encode(Sha1::digest(input.as_bytes())),
        ChecksumAlgorithm::Md5 => format!("{:x}", md5::compute(input.as_bytes())),
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
