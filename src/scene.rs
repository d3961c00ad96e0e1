use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::mesh::TriangleMesh;

/// Number of sphere slots available in the shader's uniform block.
pub const MAX_SPHERES: usize = 16;

/// Surface response understood by the ray-tracing shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    #[default]
    Diffuse,
    Metal,
    Glass,
}

impl MaterialKind {
    /// Integer tag written to the `type` uniform.
    pub fn shader_id(self) -> i32 {
        match self {
            Self::Diffuse => 0,
            Self::Metal => 1,
            Self::Glass => 2,
        }
    }
}

/// Material parameters; fields a kind does not use still carry defined values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    #[serde(rename = "type")]
    pub kind: MaterialKind,
    pub albedo: Vec3,
    pub roughness: f32,
    #[serde(default)]
    pub refractive_index: f32,
}

impl Material {
    pub const fn diffuse(albedo: Vec3, roughness: f32) -> Self {
        Self {
            kind: MaterialKind::Diffuse,
            albedo,
            roughness,
            refractive_index: 0.0,
        }
    }

    pub const fn metal(albedo: Vec3, roughness: f32) -> Self {
        Self {
            kind: MaterialKind::Metal,
            albedo,
            roughness,
            refractive_index: 0.0,
        }
    }

    pub const fn glass(albedo: Vec3, roughness: f32, refractive_index: f32) -> Self {
        Self {
            kind: MaterialKind::Glass,
            albedo,
            roughness,
            refractive_index,
        }
    }

    /// Checks the value ranges the shader relies on.
    pub fn validate(&self) -> Result<(), String> {
        if !self.albedo.is_finite() || self.albedo.min_element() < 0.0 || self.albedo.max_element() > 1.0
        {
            return Err(format!("albedo {:?} must lie in [0, 1]", self.albedo));
        }
        if !(0.0..=1.0).contains(&self.roughness) {
            return Err(format!("roughness {} must lie in [0, 1]", self.roughness));
        }
        if !self.refractive_index.is_finite() {
            return Err("refractive index must be a finite number".into());
        }
        if self.kind == MaterialKind::Glass && self.refractive_index <= 0.0 {
            return Err(format!(
                "glass refractive index {} must be positive",
                self.refractive_index
            ));
        }
        Ok(())
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::diffuse(Vec3::splat(0.75), 0.6)
    }
}

/// Analytic sphere; never transformed on the way to the shader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub material: Material,
}

impl Sphere {
    pub const fn new(center: Vec3, radius: f32, material: Material) -> Self {
        Self {
            center,
            radius,
            material,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.center.is_finite() {
            return Err(format!("center {:?} must be finite", self.center));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(format!("radius {} must be positive", self.radius));
        }
        self.material.validate()
    }
}

/// The two spheres flanking the mesh: red diffuse on the left, glass on the right.
pub fn default_spheres() -> Vec<Sphere> {
    vec![
        Sphere::new(
            Vec3::new(-1.0, 0.5, 0.0),
            0.5,
            Material::diffuse(Vec3::new(0.9, 0.2, 0.2), 0.7),
        ),
        Sphere::new(
            Vec3::new(1.0, 0.5, 0.0),
            0.5,
            Material::glass(Vec3::new(0.95, 0.95, 0.95), 0.1, 1.5),
        ),
    ]
}

/// Single point light plus an ambient term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub ambient_strength: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::splat(5.0),
            color: Vec3::ONE,
            ambient_strength: 0.3,
        }
    }
}

/// Everything the shader sees besides the camera. Built once at startup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub mesh: TriangleMesh,
    pub mesh_material: Material,
    pub spheres: Vec<Sphere>,
    pub light: PointLight,
}

impl Scene {
    pub fn new(mesh: TriangleMesh) -> Self {
        Self {
            mesh,
            mesh_material: Material::default(),
            spheres: default_spheres(),
            light: PointLight::default(),
        }
    }

    pub fn with_spheres(mut self, spheres: Vec<Sphere>) -> Self {
        self.spheres = spheres;
        self
    }

    pub fn with_mesh_material(mut self, material: Material) -> Self {
        self.mesh_material = material;
        self
    }

    pub fn with_light(mut self, light: PointLight) -> Self {
        self.light = light;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spheres_are_valid() {
        let spheres = default_spheres();
        assert_eq!(spheres.len(), 2);
        for sphere in &spheres {
            sphere.validate().unwrap();
        }
        assert_eq!(spheres[0].material.kind, MaterialKind::Diffuse);
        assert_eq!(spheres[1].material.kind, MaterialKind::Glass);
        assert_eq!(spheres[1].material.refractive_index, 1.5);
    }

    #[test]
    fn shader_ids_match_layout() {
        assert_eq!(MaterialKind::Diffuse.shader_id(), 0);
        assert_eq!(MaterialKind::Metal.shader_id(), 1);
        assert_eq!(MaterialKind::Glass.shader_id(), 2);
    }

    #[test]
    fn rejects_non_positive_radius() {
        let sphere = Sphere::new(Vec3::ZERO, 0.0, Material::default());
        assert!(sphere.validate().is_err());
        let sphere = Sphere::new(Vec3::ZERO, f32::NAN, Material::default());
        assert!(sphere.validate().is_err());
    }

    #[test]
    fn glass_needs_refractive_index() {
        let material = Material::glass(Vec3::ONE, 0.0, 0.0);
        assert!(material.validate().is_err());
        assert!(Material::metal(Vec3::ONE, 0.2).validate().is_ok());
    }

    #[test]
    fn mesh_material_defaults() {
        let scene = Scene::new(TriangleMesh::default());
        assert_eq!(scene.mesh_material, Material::diffuse(Vec3::splat(0.75), 0.6));
        assert_eq!(scene.light.position, Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(scene.light.ambient_strength, 0.3);
    }
}
