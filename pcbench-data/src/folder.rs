//! Per-view folder ingestion.
//!
//! A view folder holds one `.ply` file per captured frame of a single camera.
//! Frames are ordered by file name so that frame `i` lines up across views.

use crate::error::DataError;
use crate::ply::{PlyMesh, load_ply};
use crate::types::PointCloud;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Metadata recorded for every loaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshMetadata {
    pub original_file_name: String,
    pub original_file_size: u64,
    pub has_coords: bool,
    pub has_normals: bool,
    pub has_colors: bool,
    pub has_texture: bool,
    pub has_connectivity: bool,
}

impl MeshMetadata {
    /// Derive the flags from the vertex fields and faces of a loaded mesh.
    pub fn from_mesh(original_file_name: String, original_file_size: u64, mesh: &PlyMesh) -> Self {
        Self {
            original_file_name,
            original_file_size,
            has_coords: mesh.has_field("x"),
            has_normals: mesh.has_field("normal_x"),
            has_colors: mesh.has_field("rgb")
                || mesh.has_field("rgba")
                || mesh.has_field("red")
                || mesh.has_field("r"),
            has_texture: mesh.has_field("texture_u") || mesh.has_field("s"),
            has_connectivity: mesh.face_count > 0,
        }
    }
}

/// All frames captured by one view, in frame order.
#[derive(Debug, Clone)]
pub struct ViewFolder {
    pub path: PathBuf,
    pub frames: Vec<PointCloud>,
    pub metadata: Vec<MeshMetadata>,
}

impl ViewFolder {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Load every regular `.ply` file in `path`, sorted by file name.
#[tracing::instrument(skip_all, fields(folder = %path.display()))]
pub fn load_folder(path: &Path) -> Result<ViewFolder, DataError> {
    if !path.is_dir() {
        return Err(DataError::NotADirectory(path.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry_path = entry?.path();
        let is_ply = entry_path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ply"));
        if entry_path.is_file() && is_ply {
            files.push(entry_path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(DataError::EmptyFolder(path.to_path_buf()));
    }

    let mut frames = Vec::with_capacity(files.len());
    let mut metadata = Vec::with_capacity(files.len());
    for file in &files {
        info!("Found ply file {}", file.display());
        let mesh = load_ply(file)?;
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_size = fs::metadata(file)?.len();

        metadata.push(MeshMetadata::from_mesh(file_name, file_size, &mesh));
        frames.push(mesh.cloud);
    }

    info!("Loaded {} frames from {}", frames.len(), path.display());
    Ok(ViewFolder {
        path: path.to_path_buf(),
        frames,
        metadata,
    })
}
