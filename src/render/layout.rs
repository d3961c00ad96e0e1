//! CPU mirror of the shader's uniform block.
//!
//! Uniform names are resolved to fields of [`GlobalsUniform`] or to elements
//! of the triangle vertex array, which is bound as a separate read-only
//! storage buffer because 10,000 triangles do not fit a uniform buffer.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::scene::MAX_SPHERES;
use crate::uniforms::{self, UniformError, UniformSink, UniformValue};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuMaterial {
    pub albedo: [f32; 3],
    pub kind: i32,
    pub roughness: f32,
    pub refractive_index: f32,
    pub _pad: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuSphere {
    pub center: [f32; 3],
    pub radius: f32,
    pub material: GpuMaterial,
}

/// Matches `struct Globals` in `raytrace.wgsl` byte for byte.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GlobalsUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub time: f32,
    pub camera_front: [f32; 3],
    pub ambient_strength: f32,
    pub camera_up: [f32; 3],
    pub num_triangles: i32,
    pub light_pos: [f32; 3],
    pub num_spheres: i32,
    pub light_color: [f32; 3],
    pub _pad0: f32,
    pub bunny_material: GpuMaterial,
    pub spheres: [GpuSphere; MAX_SPHERES],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MaterialField {
    Type,
    Albedo,
    Roughness,
    RefractiveIndex,
}

impl MaterialField {
    fn parse(field: &str) -> Option<Self> {
        Some(match field {
            "type" => Self::Type,
            "albedo" => Self::Albedo,
            "roughness" => Self::Roughness,
            "refractiveIndex" => Self::RefractiveIndex,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SphereField {
    Center,
    Radius,
    Material(MaterialField),
}

impl SphereField {
    fn parse(field: &str) -> Option<Self> {
        match field {
            "center" => Some(Self::Center),
            "radius" => Some(Self::Radius),
            _ => field
                .strip_prefix("material.")
                .and_then(MaterialField::parse)
                .map(Self::Material),
        }
    }
}

/// Location of a named uniform inside the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    CameraPos,
    CameraFront,
    CameraUp,
    View,
    Projection,
    Time,
    LightPos,
    LightColor,
    AmbientStrength,
    NumTriangles,
    NumSpheres,
    TriVertex(usize),
    BunnyMaterial(MaterialField),
    Sphere(usize, SphereField),
}

impl Slot {
    fn parse(name: &str) -> Option<Self> {
        let slot = match name {
            uniforms::CAMERA_POS => Self::CameraPos,
            uniforms::CAMERA_FRONT => Self::CameraFront,
            uniforms::CAMERA_UP => Self::CameraUp,
            uniforms::VIEW => Self::View,
            uniforms::PROJECTION => Self::Projection,
            uniforms::TIME => Self::Time,
            uniforms::LIGHT_POS => Self::LightPos,
            uniforms::LIGHT_COLOR => Self::LightColor,
            uniforms::AMBIENT_STRENGTH => Self::AmbientStrength,
            uniforms::NUM_TRIANGLES => Self::NumTriangles,
            uniforms::NUM_SPHERES => Self::NumSpheres,
            _ => return Self::parse_compound(name),
        };
        Some(slot)
    }

    fn parse_compound(name: &str) -> Option<Self> {
        if let Some(field) = name
            .strip_prefix(uniforms::BUNNY_MATERIAL)
            .and_then(|rest| rest.strip_prefix('.'))
        {
            return MaterialField::parse(field).map(Self::BunnyMaterial);
        }
        let (base, index, rest) = split_indexed(name)?;
        match (base, rest) {
            (uniforms::TRI_VERTICES, "") => Some(Self::TriVertex(index)),
            (uniforms::SPHERES, rest) => {
                let field = rest.strip_prefix('.')?;
                SphereField::parse(field).map(|field| Self::Sphere(index, field))
            }
            _ => None,
        }
    }
}

/// Splits `base[index]rest` into its parts.
fn split_indexed(name: &str) -> Option<(&str, usize, &str)> {
    let open = name.find('[')?;
    let close = open + name[open..].find(']')?;
    let index = name[open + 1..close].parse().ok()?;
    Some((&name[..open], index, &name[close + 1..]))
}

fn mismatch(name: &str, expected: &'static str, value: UniformValue) -> UniformError {
    UniformError::TypeMismatch {
        name: name.to_string(),
        expected,
        actual: value.type_name(),
    }
}

fn expect_int(name: &str, value: UniformValue) -> Result<i32, UniformError> {
    match value {
        UniformValue::Int(value) => Ok(value),
        other => Err(mismatch(name, "int", other)),
    }
}

fn expect_float(name: &str, value: UniformValue) -> Result<f32, UniformError> {
    match value {
        UniformValue::Float(value) => Ok(value),
        other => Err(mismatch(name, "float", other)),
    }
}

fn expect_vec3(name: &str, value: UniformValue) -> Result<Vec3, UniformError> {
    match value {
        UniformValue::Vec3(value) => Ok(value),
        other => Err(mismatch(name, "vec3", other)),
    }
}

fn expect_mat4(name: &str, value: UniformValue) -> Result<Mat4, UniformError> {
    match value {
        UniformValue::Mat4(value) => Ok(value),
        other => Err(mismatch(name, "mat4", other)),
    }
}

fn apply_material(
    material: &mut GpuMaterial,
    field: MaterialField,
    name: &str,
    value: UniformValue,
) -> Result<(), UniformError> {
    match field {
        MaterialField::Type => material.kind = expect_int(name, value)?,
        MaterialField::Albedo => material.albedo = expect_vec3(name, value)?.to_array(),
        MaterialField::Roughness => material.roughness = expect_float(name, value)?,
        MaterialField::RefractiveIndex => material.refractive_index = expect_float(name, value)?,
    }
    Ok(())
}

/// Largest triangle vertex array that fits one storage buffer binding under
/// wgpu's default limits.
pub fn max_vertex_capacity() -> usize {
    let binding_size = wgpu::Limits::default().max_storage_buffer_binding_size as usize;
    binding_size / std::mem::size_of::<[f32; 4]>()
}

/// Staging copy of everything the shader reads, filled through [`UniformSink`].
#[derive(Debug, Clone)]
pub struct UniformBlock {
    globals: GlobalsUniform,
    triangles: Vec<[f32; 4]>,
}

impl UniformBlock {
    /// `max_vertices` fixes the triangle array capacity.
    pub fn new(max_vertices: usize) -> Self {
        Self {
            globals: GlobalsUniform::zeroed(),
            triangles: vec![[0.0; 4]; max_vertices],
        }
    }

    pub fn globals(&self) -> &GlobalsUniform {
        &self.globals
    }

    pub fn vertex_capacity(&self) -> usize {
        self.triangles.len()
    }

    /// Vertices covered by the current `numTriangles` value.
    pub fn active_vertices(&self) -> &[[f32; 4]] {
        let requested = usize::try_from(self.globals.num_triangles).unwrap_or(0) * 3;
        &self.triangles[..requested.min(self.triangles.len())]
    }

    pub fn globals_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.globals)
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.active_vertices())
    }
}

impl UniformSink for UniformBlock {
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), UniformError> {
        let slot = Slot::parse(name).ok_or_else(|| UniformError::Unknown(name.to_string()))?;
        let globals = &mut self.globals;
        match slot {
            Slot::CameraPos => globals.camera_pos = expect_vec3(name, value)?.to_array(),
            Slot::CameraFront => globals.camera_front = expect_vec3(name, value)?.to_array(),
            Slot::CameraUp => globals.camera_up = expect_vec3(name, value)?.to_array(),
            Slot::View => globals.view = expect_mat4(name, value)?.to_cols_array_2d(),
            Slot::Projection => globals.projection = expect_mat4(name, value)?.to_cols_array_2d(),
            Slot::Time => globals.time = expect_float(name, value)?,
            Slot::LightPos => globals.light_pos = expect_vec3(name, value)?.to_array(),
            Slot::LightColor => globals.light_color = expect_vec3(name, value)?.to_array(),
            Slot::AmbientStrength => globals.ambient_strength = expect_float(name, value)?,
            Slot::NumTriangles => globals.num_triangles = expect_int(name, value)?,
            Slot::NumSpheres => globals.num_spheres = expect_int(name, value)?,
            Slot::TriVertex(index) => {
                let vertex = expect_vec3(name, value)?;
                let capacity = self.triangles.len();
                let cell = self
                    .triangles
                    .get_mut(index)
                    .ok_or_else(|| UniformError::IndexOutOfRange {
                        name: name.to_string(),
                        capacity,
                    })?;
                *cell = vertex.extend(1.0).to_array();
            }
            Slot::BunnyMaterial(field) => {
                apply_material(&mut globals.bunny_material, field, name, value)?
            }
            Slot::Sphere(index, field) => {
                let sphere =
                    globals
                        .spheres
                        .get_mut(index)
                        .ok_or_else(|| UniformError::IndexOutOfRange {
                            name: name.to_string(),
                            capacity: MAX_SPHERES,
                        })?;
                match field {
                    SphereField::Center => sphere.center = expect_vec3(name, value)?.to_array(),
                    SphereField::Radius => sphere.radius = expect_float(name, value)?,
                    SphereField::Material(field) => {
                        apply_material(&mut sphere.material, field, name, value)?
                    }
                }
            }
        }
        Ok(())
    }
}
