use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use crate::error::AppError;

/// Unpacks an uploaded ZIP into `dest`.
///
/// Entries whose names escape `dest` are skipped, as are symlinks. The total
/// decompressed size is capped at `max_total` bytes. Returns the number of
/// files written.
pub fn extract_zip(data: &[u8], dest: &Path, max_total: u64) -> Result<usize, AppError> {
    let cursor = io::Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|e| AppError::Validation(format!("Invalid ZIP archive: {e}")))?;

    let mut total_decompressed: u64 = 0;
    let mut written = 0;

    for i in 0..archive.len() {
        let file = archive
            .by_index(i)
            .map_err(|e| AppError::Validation(format!("ZIP read error: {e}")))?;

        // Reject entries with path traversal components (e.g. "../").
        let Some(relative) = file.enclosed_name() else {
            tracing::warn!(entry = %file.name(), "Skipping unsafe ZIP entry");
            continue;
        };
        let target = dest.join(&relative);

        if file.is_dir() {
            fs::create_dir_all(&target).map_err(internal)?;
            continue;
        }
        if file.is_symlink() {
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(internal)?;
        }

        let remaining = max_total - total_decompressed;
        let mut out = File::create(&target).map_err(internal)?;
        let mut limited = file.take(remaining.saturating_add(1));
        let copied = io::copy(&mut limited, &mut out).map_err(|e| {
            AppError::Validation(format!("Failed to read '{}': {e}", relative.display()))
        })?;

        total_decompressed = total_decompressed.saturating_add(copied);
        if total_decompressed > max_total {
            return Err(AppError::Validation(format!(
                "Total decompressed ZIP content exceeds {max_total} bytes"
            )));
        }
        written += 1;
    }

    Ok(written)
}

fn internal(e: io::Error) -> AppError {
    AppError::Internal(format!("Failed to extract upload: {e}"))
}
