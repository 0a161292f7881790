use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ChunkcastError, Result};

use super::{ChunkData, ProjectData, ProjectSettings};

#[derive(Serialize)]
struct ProjectDocumentRef<'a> {
    project: &'a ProjectSettings,
    chunks: &'a [ChunkData],
}

#[derive(Deserialize)]
struct ProjectDocument {
    #[serde(default)]
    project: ProjectSettings,
    #[serde(default)]
    chunks: Vec<ChunkData>,
}

/// Render the project document as pretty-printed JSON.
pub fn to_json(project: &ProjectData) -> Result<String> {
    let document = ProjectDocumentRef {
        project: &project.settings,
        chunks: project.chunks(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Parse a project document. `root` becomes the project directory.
pub fn from_json(contents: &str, root: &Path) -> Result<ProjectData> {
    let document: ProjectDocument = serde_json::from_str(contents)?;
    Ok(ProjectData::with_chunks(
        root,
        document.project,
        document.chunks,
    ))
}

/// Save to the project's own `project.json`.
pub fn save_project(project: &ProjectData) -> Result<PathBuf> {
    let target = project.project_json_path();
    save_project_to(project, &target)?;
    Ok(target)
}

/// Save to an explicit path.
///
/// The document is written to a temporary file next to `target` and renamed
/// over it, so readers never observe a half-written document.
pub fn save_project_to(project: &ProjectData, target: &Path) -> Result<()> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let contents = to_json(project)?;
    let mut temp = NamedTempFile::new_in(&parent)?;
    temp.write_all(contents.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(target).map_err(|e| e.error)?;

    debug!(
        "Saved project with {} chunks to {}",
        project.len(),
        target.display()
    );
    Ok(())
}

pub fn load_project(path: &Path) -> Result<ProjectData> {
    if !path.exists() {
        return Err(ChunkcastError::FileNotFound(path.display().to_string()));
    }

    let contents = fs::read_to_string(path)?;
    let root = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    from_json(&contents, &root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{chunk_filename, RenderParams};
    use tempfile::TempDir;

    fn sample_project(root: &Path) -> ProjectData {
        let mut settings = ProjectSettings::default();
        settings
            .default_params
            .insert("cfg_scale".to_string(), serde_json::json!(1.3));

        let mut project = ProjectData::new(root, settings);
        for index in [2, 1] {
            let mut params = RenderParams::new();
            params.insert("diffusion_steps".to_string(), serde_json::json!(20));
            project.add_chunk(ChunkData {
                index,
                filename: chunk_filename(index),
                text: format!("Sentence {index}."),
                char_start: (index as usize - 1) * 12,
                char_end: index as usize * 12 - 1,
                t_start_ms: (index as u64 - 1) * 960,
                duration_ms: 1000,
                seed: 41 + index as u64,
                params,
                speaker_id: 0,
            });
        }
        project
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let project = sample_project(temp.path());

        let path = save_project(&project).unwrap();
        assert_eq!(path, temp.path().join("project.json"));

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded, project);
    }

    #[test]
    fn test_chunks_written_in_index_order() {
        let temp = TempDir::new().unwrap();
        let project = sample_project(temp.path());
        let json = to_json(&project).unwrap();

        let first = json.find("chunk_001.wav").unwrap();
        let second = json.find("chunk_002.wav").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_empty_default_params_omitted() {
        let project = ProjectData::new("/tmp/p", ProjectSettings::default());
        let json = to_json(&project).unwrap();
        assert!(!json.contains("default_params"));
        assert!(json.contains("\"chunks\": []"));
    }

    #[test]
    fn test_load_missing_fields_uses_defaults() {
        let json = r#"{
            "project": { "sample_rate": 48000 },
            "chunks": [ { "index": 1, "filename": "chunk_001.wav" } ]
        }"#;
        let project = from_json(json, Path::new("/tmp/p")).unwrap();

        assert_eq!(project.settings.sample_rate, 48_000);
        assert_eq!(project.settings.crossfade_ms, 40);
        assert_eq!(project.settings.loudness_lufs, -16.0);
        assert_eq!(project.settings.chunks_dir, "chunks");

        let chunk = project.get_chunk(1).unwrap();
        assert_eq!(chunk.text, "");
        assert_eq!(chunk.duration_ms, 0);
        assert_eq!(chunk.speaker_id, 0);
        assert!(chunk.params.is_empty());
    }

    #[test]
    fn test_load_without_project_section() {
        let project = from_json("{}", Path::new("/tmp/p")).unwrap();
        assert_eq!(project.settings, ProjectSettings::default());
        assert!(project.is_empty());
    }

    #[test]
    fn test_load_sorts_unordered_chunks() {
        let json = r#"{ "chunks": [
            { "index": 3, "filename": "chunk_003.wav" },
            { "index": 1, "filename": "chunk_001.wav" }
        ] }"#;
        let project = from_json(json, Path::new("/tmp/p")).unwrap();
        let indices: Vec<u32> = project.chunks().iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 3]);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = load_project(&temp.path().join("project.json")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_save_overwrites_in_place() {
        let temp = TempDir::new().unwrap();
        let mut project = sample_project(temp.path());
        save_project(&project).unwrap();

        project.get_chunk_mut(1).unwrap().text = "Changed.".to_string();
        let path = save_project(&project).unwrap();

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded.get_chunk(1).unwrap().text, "Changed.");

        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "project.json")
            .collect();
        assert!(leftovers.is_empty());
    }
}
