//! Core data types for point clouds and their bounds.
//!
//! These are the CPU-side representations passed between ingestion, the codec
//! and the quality metric.

use glam::Vec3;

/// Colour assigned to points whose source file carries no colour.
pub const DEFAULT_COLOR: [u8; 3] = [204, 204, 204];

/// A coloured point in 3D space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Position in the cloud's coordinate frame.
    pub position: Vec3,
    /// 8-bit RGB colour.
    pub color: [u8; 3],
}

impl Point {
    /// Create a new point with position and color.
    pub fn new(position: Vec3, color: [u8; 3]) -> Self {
        Self { position, color }
    }

    /// Create a point with the default grey colour.
    pub fn uncolored(position: Vec3) -> Self {
        Self {
            position,
            color: DEFAULT_COLOR,
        }
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::uncolored(Vec3::ZERO)
    }
}

/// An ordered collection of points.
///
/// Point order is significant: fusion concatenates clouds and downstream
/// consumers rely on the resulting order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub points: Vec<Point>,
}

impl PointCloud {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Append every point of `other`, keeping its order.
    pub fn extend_from(&mut self, other: &PointCloud) {
        self.points.extend_from_slice(&other.points);
    }

    /// Axis-aligned bounds of all points, or `None` for an empty cloud.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.points.iter().map(|p| p.position))
    }
}

impl FromIterator<Point> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Bounds that contain nothing; the first `include` snaps to the point.
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    /// Compute the bounds of a set of positions.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(positions: I) -> Option<Self> {
        let mut bounds = Self::empty();
        for position in positions {
            bounds.include(position);
        }
        bounds.is_valid().then_some(bounds)
    }

    /// Grow the bounds to contain `position`.
    pub fn include(&mut self, position: Vec3) {
        self.min = self.min.min(position);
        self.max = self.max.max(position);
    }

    /// Per-axis size of the box.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// True once at least one point was included.
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// True when `position` lies inside the box, borders included.
    pub fn contains(&self, position: Vec3) -> bool {
        position.cmpge(self.min).all() && position.cmple(self.max).all()
    }
}
