//! Triangle soup loading and normalization.
//!
//! Meshes are flattened to one position per triangle corner, then moved into
//! a canonical frame: centered on the origin, scaled so the bounding box
//! diagonal is 2 units long, and lifted by a ground offset.

use std::path::Path;

use glam::Vec3;
use log::{debug, info};
use thiserror::Error;

use crate::obj::{self, ObjData, ObjError};

/// Default number of vertices transferred to the shader (10,000 triangles).
pub const DEFAULT_MAX_VERTICES: usize = 30_000;

/// Default height added to every vertex after scaling.
pub const DEFAULT_GROUND_OFFSET: f32 = 0.5;

/// Length of the bounding box diagonal after normalization.
const TARGET_DIAGONAL: f32 = 2.0;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("failed to load mesh")]
    Obj(#[from] ObjError),
    #[error("mesh contains no triangles")]
    Empty,
    #[error("mesh bounding box is degenerate (diagonal length {diagonal})")]
    Degenerate { diagonal: f32 },
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Returns `None` for an empty point set.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().fold(
            Self {
                min: first,
                max: first,
            },
            |bounds, point| Self {
                min: bounds.min.min(*point),
                max: bounds.max.max(*point),
            },
        ))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn diagonal(&self) -> f32 {
        (self.max - self.min).length()
    }
}

/// Flat list of triangle corners; every consecutive triple is one triangle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriangleMesh {
    vertices: Vec<Vec3>,
}

impl TriangleMesh {
    /// Wraps raw corners, dropping a trailing partial triangle.
    pub fn from_vertices(mut vertices: Vec<Vec3>) -> Self {
        let whole = vertices.len() / 3 * 3;
        vertices.truncate(whole);
        Self { vertices }
    }

    /// Expands indexed faces into per-triangle positions.
    pub fn from_indexed(data: &ObjData) -> Self {
        let vertices = data
            .faces
            .iter()
            .flat_map(|face| face.iter().map(|&index| data.positions[index]))
            .collect();
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }

    /// Recenters, rescales and lifts the mesh in place.
    ///
    /// Every vertex becomes `(v - center) * scale` followed by `y += ground_offset`,
    /// where `scale = 2 / diagonal`. The input bounding box center therefore
    /// lands on `(0, ground_offset, 0)`.
    pub fn normalize(&mut self, ground_offset: f32) -> Result<Aabb, MeshError> {
        let bounds = self.bounds().ok_or(MeshError::Empty)?;
        let diagonal = bounds.diagonal();
        if !diagonal.is_finite() || diagonal <= f32::EPSILON {
            return Err(MeshError::Degenerate { diagonal });
        }
        let center = bounds.center();
        let scale = TARGET_DIAGONAL / diagonal;
        let lift = Vec3::new(0.0, ground_offset, 0.0);
        for vertex in &mut self.vertices {
            *vertex = (*vertex - center) * scale + lift;
        }
        debug!(
            "normalized mesh: center={center:?} diagonal={diagonal:.4} scale={scale:.6}"
        );
        Ok(bounds)
    }

    /// Vertices that fit under `max_vertices`, rounded down to whole triangles.
    pub fn capped(&self, max_vertices: usize) -> &[Vec3] {
        let count = self.vertices.len().min(max_vertices) / 3 * 3;
        &self.vertices[..count]
    }
}

/// Settings for [`load_normalized`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    pub ground_offset: f32,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            ground_offset: DEFAULT_GROUND_OFFSET,
        }
    }
}

/// Loads an OBJ file and returns its normalized triangle soup.
pub fn load_normalized<P: AsRef<Path>>(
    path: P,
    options: NormalizeOptions,
) -> Result<TriangleMesh, MeshError> {
    let path = path.as_ref();
    info!("Loading mesh {}...", path.display());
    let data = obj::load_obj(path)?;
    let mesh = normalize_indexed(&data, options)?;
    info!("Loaded {} triangles.", mesh.triangle_count());
    Ok(mesh)
}

/// Expands and normalizes already-parsed geometry.
pub fn normalize_indexed(
    data: &ObjData,
    options: NormalizeOptions,
) -> Result<TriangleMesh, MeshError> {
    let mut mesh = TriangleMesh::from_indexed(data);
    if mesh.is_empty() {
        return Err(MeshError::Empty);
    }
    mesh.normalize(options.ground_offset)?;
    Ok(mesh)
}
