//! Finds the conventional Java source root inside an arbitrarily wrapped tree.

use std::fs;
use std::path::{Path, PathBuf};

/// Returns the first `src/main` directory under `root`, relative to `root`
/// and `/`-separated, or `None` if the tree has no such structure.
///
/// Entries are visited depth-first in lexical order. An entry named `src`
/// with a `main` subdirectory ends the search; any other directory is
/// descended into. Earlier siblings are fully explored before later ones.
pub fn locate(root: &Path) -> Option<String> {
    let mut stack: Vec<PathBuf> = Vec::new();
    push_children(root, Path::new(""), &mut stack);

    while let Some(relative) = stack.pop() {
        let absolute = root.join(&relative);
        if relative.file_name().is_some_and(|n| n == "src") && absolute.join("main").is_dir() {
            return Some(to_slash(&relative.join("main")));
        }
        push_children(root, &relative, &mut stack);
    }

    None
}

/// Pushes the subdirectories of `root/relative` so that the lexically first
/// one is popped first.
fn push_children(root: &Path, relative: &Path, stack: &mut Vec<PathBuf>) {
    let dir = root.join(relative);
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
            return;
        }
    };

    let mut names: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .map(|entry| entry.file_name())
        .collect();
    names.sort();

    stack.extend(names.into_iter().rev().map(|name| relative.join(name)));
}

pub(crate) fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
