use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;

use super::{ChunkData, ProjectData};

/// Move a chunk's current audio into the archive directory as
/// `{stem}__v{N}.{ext}`.
///
/// `N` is one more than the number of versions already archived for the
/// stem, counted from the directory listing. Returns `None` when the chunk
/// has no audio on disk.
pub fn archive_chunk(project: &ProjectData, chunk: &ChunkData) -> Result<Option<PathBuf>> {
    let source = project.chunk_path(chunk);
    if !source.exists() {
        debug!("No audio to archive for chunk {}", chunk.index);
        return Ok(None);
    }

    let archive_dir = project.archive_directory();
    fs::create_dir_all(&archive_dir)?;

    let stem = file_stem(&source);
    let extension = source
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    // A gap left by a deleted version must not overwrite a later take.
    let mut version = count_versions(&archive_dir, &stem)? + 1;
    let mut destination = archive_dir.join(format!("{stem}__v{version}{extension}"));
    while destination.exists() {
        version += 1;
        destination = archive_dir.join(format!("{stem}__v{version}{extension}"));
    }

    fs::rename(&source, &destination)?;
    info!(
        "Archived {} -> {}",
        chunk.filename,
        destination.display()
    );

    Ok(Some(destination))
}

/// Archived versions of `stem`, oldest first.
pub fn list_versions(archive_dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
    if !archive_dir.exists() {
        return Ok(Vec::new());
    }

    let prefix = format!("{stem}__v");
    let mut versions: Vec<(u32, PathBuf)> = Vec::new();
    for entry in fs::read_dir(archive_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        if let Some(rest) = name.strip_prefix(&prefix) {
            let version = rest.parse().unwrap_or(u32::MAX);
            versions.push((version, path));
        }
    }

    versions.sort();
    Ok(versions.into_iter().map(|(_, path)| path).collect())
}

fn count_versions(archive_dir: &Path, stem: &str) -> Result<usize> {
    Ok(list_versions(archive_dir, stem)?.len())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
