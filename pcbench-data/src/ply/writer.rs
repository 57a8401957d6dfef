//! ASCII PLY output for decoded clouds.

use crate::error::DataError;
use crate::types::PointCloud;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Write a cloud as ASCII PLY with float positions and uchar colours.
pub fn write_ply(path: &Path, cloud: &PointCloud) -> Result<(), DataError> {
    let mut file = BufWriter::new(File::create(path)?);

    writeln!(file, "ply")?;
    writeln!(file, "format ascii 1.0")?;
    writeln!(file, "element vertex {}", cloud.len())?;
    writeln!(file, "property float x")?;
    writeln!(file, "property float y")?;
    writeln!(file, "property float z")?;
    writeln!(file, "property uchar red")?;
    writeln!(file, "property uchar green")?;
    writeln!(file, "property uchar blue")?;
    writeln!(file, "end_header")?;

    for point in &cloud.points {
        let p = point.position;
        let [r, g, b] = point.color;
        writeln!(file, "{} {} {} {r} {g} {b}", p.x, p.y, p.z)?;
    }
    file.flush()?;

    debug!("Wrote {} points to {}", cloud.len(), path.display());
    Ok(())
}
