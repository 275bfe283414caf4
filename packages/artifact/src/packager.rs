use std::fs::File;
use std::io::{self, Cursor};
use std::path::Path;

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::locator::to_slash;

/// Packs every file under `source_root` into an in-memory ZIP/JAR.
///
/// Entries are stored at their `/`-separated path relative to `source_root`
/// in lexical walk order. Directories are implicit and the project sidecar
/// at `sidecar` is never included; files of the same name elsewhere are.
pub fn pack(source_root: &Path, sidecar: &Path) -> Result<Vec<u8>> {
    if !source_root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("source root '{}' does not exist", source_root.display()),
        )
        .into());
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source_root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.path() == sidecar {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source_root)
            .map_err(io::Error::other)?;
        writer.start_file(to_slash(relative), options)?;
        io::copy(&mut File::open(entry.path())?, &mut writer)?;
    }

    Ok(writer.finish()?.into_inner())
}
