//! Named uniform interface between the frame loop and the shader program.
//!
//! A frame's worth of state is gathered into one [`SceneSnapshot`] and written
//! in a single pass by [`SceneSnapshot::write_to`]. The names below are the
//! ones declared by the ray-tracing shader; every write targets exactly one
//! element (one vertex, one sphere field).

use std::collections::BTreeMap;

use glam::{Mat4, Vec3};
use thiserror::Error;

use crate::scene::{Material, PointLight, Sphere};

pub const CAMERA_POS: &str = "cameraPos";
pub const CAMERA_FRONT: &str = "cameraFront";
pub const CAMERA_UP: &str = "cameraUp";
pub const VIEW: &str = "view";
pub const PROJECTION: &str = "projection";
pub const TIME: &str = "time";
pub const LIGHT_POS: &str = "lightPos";
pub const LIGHT_COLOR: &str = "lightColor";
pub const AMBIENT_STRENGTH: &str = "ambientStrength";
pub const NUM_TRIANGLES: &str = "numTriangles";
pub const NUM_SPHERES: &str = "numSpheres";
pub const TRI_VERTICES: &str = "triVertices";
pub const SPHERES: &str = "spheres";
pub const BUNNY_MATERIAL: &str = "bunnyMaterial";

/// `triVertices[index]`
pub fn tri_vertex_name(index: usize) -> String {
    format!("{TRI_VERTICES}[{index}]")
}

/// `spheres[index].field`, where `field` may itself be dotted.
pub fn sphere_field_name(index: usize, field: &str) -> String {
    format!("{SPHERES}[{index}].{field}")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UniformError {
    #[error("shader has no uniform named {0:?}")]
    Unknown(String),
    #[error("uniform {name:?} expects {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("uniform {name:?} index exceeds capacity {capacity}")]
    IndexOutOfRange { name: String, capacity: usize },
}

/// A value written to a uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Vec3(_) => "vec3",
            Self::Mat4(_) => "mat4",
        }
    }
}

/// Receiver of named uniform writes.
pub trait UniformSink {
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), UniformError>;

    fn set_int(&mut self, name: &str, value: i32) -> Result<(), UniformError> {
        self.set_uniform(name, UniformValue::Int(value))
    }

    fn set_float(&mut self, name: &str, value: f32) -> Result<(), UniformError> {
        self.set_uniform(name, UniformValue::Float(value))
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) -> Result<(), UniformError> {
        self.set_uniform(name, UniformValue::Vec3(value))
    }

    fn set_mat4(&mut self, name: &str, value: Mat4) -> Result<(), UniformError> {
        self.set_uniform(name, UniformValue::Mat4(value))
    }
}

/// Camera state as uploaded for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraUniforms {
    pub position: Vec3,
    pub front: Vec3,
    pub up: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
}

/// Everything written to the shader for a single frame.
#[derive(Debug, Clone, Copy)]
pub struct SceneSnapshot<'a> {
    pub camera: CameraUniforms,
    /// Seconds since startup; the shader uses it to seed its RNG.
    pub time: f32,
    pub light: &'a PointLight,
    /// Already capped; length is a multiple of 3.
    pub triangles: &'a [Vec3],
    pub mesh_material: &'a Material,
    pub spheres: &'a [Sphere],
}

impl SceneSnapshot<'_> {
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Number of writes [`SceneSnapshot::write_to`] performs.
    pub fn write_count(&self) -> usize {
        // camera(6) + light(3) + numTriangles + material(4) + numSpheres
        15 + self.triangle_count() * 3 + self.spheres.len() * 6
    }

    /// Writes the full uniform set in shader declaration order.
    ///
    /// Returns the number of individual writes issued.
    pub fn write_to<S: UniformSink + ?Sized>(&self, sink: &mut S) -> Result<usize, UniformError> {
        let camera = &self.camera;
        sink.set_vec3(CAMERA_POS, camera.position)?;
        sink.set_vec3(CAMERA_FRONT, camera.front)?;
        sink.set_vec3(CAMERA_UP, camera.up)?;
        sink.set_mat4(VIEW, camera.view)?;
        sink.set_mat4(PROJECTION, camera.projection)?;
        sink.set_float(TIME, self.time)?;

        sink.set_vec3(LIGHT_POS, self.light.position)?;
        sink.set_vec3(LIGHT_COLOR, self.light.color)?;
        sink.set_float(AMBIENT_STRENGTH, self.light.ambient_strength)?;

        let triangles = &self.triangles[..self.triangle_count() * 3];
        sink.set_int(NUM_TRIANGLES, count_to_int(self.triangle_count()))?;
        for (index, vertex) in triangles.iter().enumerate() {
            sink.set_vec3(&tri_vertex_name(index), *vertex)?;
        }

        write_material(sink, BUNNY_MATERIAL, self.mesh_material)?;

        sink.set_int(NUM_SPHERES, count_to_int(self.spheres.len()))?;
        for (index, sphere) in self.spheres.iter().enumerate() {
            sink.set_vec3(&sphere_field_name(index, "center"), sphere.center)?;
            sink.set_float(&sphere_field_name(index, "radius"), sphere.radius)?;
            write_material(sink, &sphere_field_name(index, "material"), &sphere.material)?;
        }

        Ok(self.write_count())
    }
}

fn write_material<S: UniformSink + ?Sized>(
    sink: &mut S,
    prefix: &str,
    material: &Material,
) -> Result<(), UniformError> {
    sink.set_int(&format!("{prefix}.type"), material.kind.shader_id())?;
    sink.set_vec3(&format!("{prefix}.albedo"), material.albedo)?;
    sink.set_float(&format!("{prefix}.roughness"), material.roughness)?;
    sink.set_float(
        &format!("{prefix}.refractiveIndex"),
        material.refractive_index,
    )
}

fn count_to_int(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

/// Sink that keeps the latest value written under each name.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    values: BTreeMap<String, UniformValue>,
    writes: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.values.get(name).copied()
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        match self.get(name)? {
            UniformValue::Int(value) => Some(value),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            UniformValue::Float(value) => Some(value),
            _ => None,
        }
    }

    pub fn vec3(&self, name: &str) -> Option<Vec3> {
        match self.get(name)? {
            UniformValue::Vec3(value) => Some(value),
            _ => None,
        }
    }

    pub fn mat4(&self, name: &str) -> Option<Mat4> {
        match self.get(name)? {
            UniformValue::Mat4(value) => Some(value),
            _ => None,
        }
    }

    /// Total writes received, including overwrites of the same name.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Distinct names written so far, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl UniformSink for RecordingSink {
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), UniformError> {
        self.values.insert(name.to_string(), value);
        self.writes += 1;
        Ok(())
    }
}
