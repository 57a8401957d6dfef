use super::params::SweepPoint;
use pcbench_data::{DataError, PointCloud, write_ply};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes decoded clouds next to the report, one file per configuration and frame.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    /// Create the output directory if needed.
    pub fn create(dir: &Path) -> Result<Self, DataError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, point: &SweepPoint, frame: usize) -> PathBuf {
        self.dir.join(point.artifact_name(frame))
    }

    pub fn write(
        &self,
        point: &SweepPoint,
        frame: usize,
        cloud: &PointCloud,
    ) -> Result<PathBuf, DataError> {
        let path = self.path_for(point, frame);
        write_ply(&path, cloud)?;
        Ok(path)
    }
}
