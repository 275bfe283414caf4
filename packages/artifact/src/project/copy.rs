use std::fs;
use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::metadata::METADATA_FILE;
use crate::error::{RepositoryError, Result};

const GITIGNORE: &str = ".gitignore";

/// Recursively copies `src` into `dst`, honoring a `.gitignore` at the root
/// of `src`. Returns the number of files copied.
///
/// The `.gitignore` itself is always copied. A sidecar at the root of `src`
/// is never copied, so it cannot overwrite the destination's own metadata.
/// Symbolic links are skipped.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<u64> {
    if !src.is_dir() {
        return Err(RepositoryError::NotFound(format!(
            "source directory '{}'",
            src.display()
        )));
    }

    let rules = load_gitignore(src);
    fs::create_dir_all(dst)?;

    let walker = WalkDir::new(src)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let Ok(relative) = entry.path().strip_prefix(src) else {
                return false;
            };
            if relative == Path::new(GITIGNORE) {
                return true;
            }
            !rules
                .matched(relative, entry.file_type().is_dir())
                .is_ignore()
        });

    let mut copied = 0;
    for entry in walker {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| RepositoryError::Io(std::io::Error::other(e)))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if relative == Path::new(METADATA_FILE) {
                continue;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        } else {
            debug!(path = %entry.path().display(), "Skipping non-regular file");
        }
    }

    Ok(copied)
}

fn load_gitignore(root: &Path) -> Gitignore {
    let path = root.join(GITIGNORE);
    if !path.is_file() {
        return Gitignore::empty();
    }

    let mut builder = GitignoreBuilder::new(root);
    if let Some(e) = builder.add(&path) {
        warn!(path = %path.display(), error = %e, "Partially invalid .gitignore");
    }
    builder.build().unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "Ignoring unusable .gitignore");
        Gitignore::empty()
    })
}
