//! PLY file loading functions

use crate::error::DataError;
use crate::types::{DEFAULT_COLOR, Point, PointCloud};
use glam::Vec3;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

// Face structure for PLY files
#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct PlyFace {
    #[serde(alias = "vertex_index")]
    vertex_indices: Vec<i32>,
}

// PLY file structure
#[derive(Deserialize, Debug)]
struct PlyFile {
    #[serde(rename = "vertex")]
    vertex: Vec<HashMap<String, JsonValue>>,
    #[serde(default, rename = "face", skip_serializing_if = "Vec::is_empty")]
    face: Vec<PlyFace>,
}

/// A loaded PLY file: the vertex cloud plus what the header declared.
#[derive(Debug, Clone)]
pub struct PlyMesh {
    pub cloud: PointCloud,
    /// Vertex property names, sorted.
    pub fields: Vec<String>,
    /// Number of faces; non-zero means the file is a mesh rather than a cloud.
    pub face_count: usize,
}

impl PlyMesh {
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }
}

fn get_f32(prop: Option<&JsonValue>) -> Option<f32> {
    prop.and_then(|v| match v {
        JsonValue::Number(n) => n.as_f64().map(|f| f as f32),
        _ => None,
    })
}

fn get_u8(prop: Option<&JsonValue>) -> Option<u8> {
    prop.and_then(|v| match v {
        JsonValue::Number(n) => n
            .as_u64()
            .map(|u| u.min(255) as u8)
            .or_else(|| n.as_f64().map(|f| f.clamp(0.0, 255.0) as u8)),
        _ => None,
    })
}

/// Unpack a PCL-style packed colour (`0x00RRGGBB`, alpha in the top byte
/// for `rgba`). PCL stores `rgb` as the bit pattern of a float.
fn get_packed_rgb(prop: Option<&JsonValue>) -> Option<[u8; 3]> {
    let bits = prop.and_then(|v| match v {
        JsonValue::Number(n) => n
            .as_u64()
            .map(|u| u as u32)
            .or_else(|| n.as_f64().map(|f| (f as f32).to_bits())),
        _ => None,
    })?;
    Some([(bits >> 16) as u8, (bits >> 8) as u8, bits as u8])
}

/// Load a PLY file (ASCII or binary) into a point cloud.
///
/// Positions come from `x`, `y`, `z`; colours from `red`/`green`/`blue` or
/// `r`/`g`/`b`, or a packed `rgb`/`rgba` property, falling back to light grey.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_ply(path: &Path) -> Result<PlyMesh, DataError> {
    let started = Instant::now();
    debug!("Loading PLY file: {}", path.display());
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let ply_data: PlyFile = serde_ply::from_reader(reader).map_err(|e| {
        warn!("Failed to parse PLY file: {}", e);
        DataError::PlyParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    let mut fields: Vec<String> = ply_data
        .vertex
        .first()
        .map(|v| v.keys().cloned().collect())
        .unwrap_or_default();
    fields.sort();

    let missing = |property: &'static str, vertex: usize| DataError::MissingProperty {
        path: path.to_path_buf(),
        property,
        vertex,
    };

    let mut cloud = PointCloud::with_capacity(ply_data.vertex.len());
    for (i, vertex) in ply_data.vertex.iter().enumerate() {
        let x = get_f32(vertex.get("x")).ok_or_else(|| missing("x", i))?;
        let y = get_f32(vertex.get("y")).ok_or_else(|| missing("y", i))?;
        let z = get_f32(vertex.get("z")).ok_or_else(|| missing("z", i))?;

        let color = if let (Some(r), Some(g), Some(b)) = (
            get_u8(vertex.get("red")),
            get_u8(vertex.get("green")),
            get_u8(vertex.get("blue")),
        ) {
            [r, g, b]
        } else if let (Some(r), Some(g), Some(b)) = (
            get_u8(vertex.get("r")),
            get_u8(vertex.get("g")),
            get_u8(vertex.get("b")),
        ) {
            [r, g, b]
        } else if let Some(color) =
            get_packed_rgb(vertex.get("rgb")).or_else(|| get_packed_rgb(vertex.get("rgba")))
        {
            color
        } else {
            DEFAULT_COLOR
        };

        cloud.push(Point::new(Vec3::new(x, y, z), color));
    }

    info!(
        "Loaded {} [done, {:.1} ms : {} points, {} faces]",
        path.display(),
        started.elapsed().as_secs_f64() * 1000.0,
        cloud.len(),
        ply_data.face.len()
    );
    info!("Available dimensions: {}", fields.join(" "));

    Ok(PlyMesh {
        cloud,
        fields,
        face_count: ply_data.face.len(),
    })
}
