//! Viewer configuration loaded from TOML.
//!
//! Every section falls back to the built-in defaults, so an empty file (or no
//! file at all) reproduces the stock scene: the bunny between a red diffuse
//! sphere and a glass sphere, lit by one white point light.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::{
    Camera, DEFAULT_PITCH, DEFAULT_SENSITIVITY, DEFAULT_SPEED, DEFAULT_YAW, DEFAULT_ZOOM,
    DEFAULT_ZOOM_RANGE,
};
use crate::frame::{FrameSettings, DEFAULT_FAR, DEFAULT_NEAR};
use crate::input::{KeyCode, Keybindings};
use crate::mesh::{NormalizeOptions, DEFAULT_GROUND_OFFSET, DEFAULT_MAX_VERTICES};
use crate::render::layout::max_vertex_capacity;
use crate::scene::{default_spheres, Material, PointLight, Sphere, MAX_SPHERES};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Ray Tracing".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

impl WindowConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub zoom: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub speed: f32,
    pub sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.5, 5.0),
            yaw: DEFAULT_YAW,
            pitch: DEFAULT_PITCH,
            zoom: DEFAULT_ZOOM,
            zoom_min: DEFAULT_ZOOM_RANGE.0,
            zoom_max: DEFAULT_ZOOM_RANGE.1,
            speed: DEFAULT_SPEED,
            sensitivity: DEFAULT_SENSITIVITY,
        }
    }
}

impl CameraConfig {
    pub fn build(&self) -> Camera {
        let mut camera = Camera::with_orientation(self.position, self.yaw, self.pitch)
            .with_zoom(self.zoom, (self.zoom_min, self.zoom_max));
        camera.movement_speed = self.speed;
        camera.mouse_sensitivity = self.sensitivity;
        camera
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub path: PathBuf,
    /// Upper bound on vertices sent to the shader each frame.
    pub max_vertices: usize,
    pub ground_offset: f32,
    pub material: Material,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/bunny.obj"),
            max_vertices: DEFAULT_MAX_VERTICES,
            ground_offset: DEFAULT_GROUND_OFFSET,
            material: Material::default(),
        }
    }
}

impl MeshConfig {
    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            ground_offset: self.ground_offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }
}

/// Key names as accepted by [`KeyCode::from_name`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub forward: String,
    pub backward: String,
    pub left: String,
    pub right: String,
    pub up: String,
    pub down: String,
    pub quit: String,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            forward: "W".into(),
            backward: "S".into(),
            left: "A".into(),
            right: "D".into(),
            up: "Space".into(),
            down: "LeftShift".into(),
            quit: "Escape".into(),
        }
    }
}

impl ControlsConfig {
    pub fn keybindings(&self) -> Result<Keybindings, ConfigError> {
        let key = |action: &str, name: &str| {
            KeyCode::from_name(name).ok_or_else(|| {
                ConfigError::Invalid(format!("unknown key {name:?} bound to {action}"))
            })
        };
        Ok(Keybindings {
            forward: key("forward", &self.forward)?,
            backward: key("backward", &self.backward)?,
            left: key("left", &self.left)?,
            right: key("right", &self.right)?,
            up: key("up", &self.up)?,
            down: key("down", &self.down)?,
            quit: key("quit", &self.quit)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub mesh: MeshConfig,
    pub projection: ProjectionConfig,
    pub light: PointLight,
    pub spheres: Vec<Sphere>,
    pub controls: ControlsConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            mesh: MeshConfig::default(),
            projection: ProjectionConfig::default(),
            light: PointLight::default(),
            spheres: default_spheres(),
            controls: ControlsConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid(message));

        if self.window.width == 0 || self.window.height == 0 {
            return invalid(format!(
                "window size {}x{} must be non-zero",
                self.window.width, self.window.height
            ));
        }
        let camera = &self.camera;
        if !(camera.zoom_min > 0.0 && camera.zoom_min <= camera.zoom_max && camera.zoom_max < 180.0)
        {
            return invalid(format!(
                "zoom range [{}, {}] must satisfy 0 < min <= max < 180",
                camera.zoom_min, camera.zoom_max
            ));
        }
        if !(camera.speed.is_finite() && camera.sensitivity.is_finite()) {
            return invalid("camera speed and sensitivity must be finite".into());
        }
        let projection = &self.projection;
        if !(projection.near > 0.0 && projection.near < projection.far) {
            return invalid(format!(
                "clip planes near={} far={} must satisfy 0 < near < far",
                projection.near, projection.far
            ));
        }
        let vertex_limit = max_vertex_capacity();
        if self.mesh.max_vertices > vertex_limit {
            return invalid(format!(
                "mesh max_vertices {} exceeds the GPU storage limit of {vertex_limit} vertices",
                self.mesh.max_vertices
            ));
        }
        if !self.mesh.ground_offset.is_finite() {
            return invalid("mesh ground offset must be finite".into());
        }
        self.mesh
            .material
            .validate()
            .map_err(|err| ConfigError::Invalid(format!("mesh material: {err}")))?;
        if self.spheres.len() > MAX_SPHERES {
            return invalid(format!(
                "{} spheres configured, the shader holds at most {MAX_SPHERES}",
                self.spheres.len()
            ));
        }
        for (index, sphere) in self.spheres.iter().enumerate() {
            sphere
                .validate()
                .map_err(|err| ConfigError::Invalid(format!("sphere {index}: {err}")))?;
        }
        if !(self.light.position.is_finite()
            && self.light.color.is_finite()
            && self.light.ambient_strength.is_finite())
        {
            return invalid("light parameters must be finite".into());
        }
        self.controls.keybindings()?;
        Ok(())
    }

    pub fn frame_settings(&self) -> FrameSettings {
        FrameSettings {
            aspect_ratio: self.window.aspect_ratio(),
            near: self.projection.near,
            far: self.projection.far,
            max_vertices: self.mesh.max_vertices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MaterialKind;

    #[test]
    fn defaults_match_stock_scene() {
        let config = ViewerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.window.title, "Ray Tracing");
        assert_eq!(config.mesh.max_vertices, 30_000);
        assert_eq!(config.mesh.ground_offset, 0.5);
        assert_eq!(config.spheres.len(), 2);
        assert_eq!(config.frame_settings(), FrameSettings::default());

        let camera = config.camera.build();
        assert_eq!(camera.position, Vec3::new(0.0, 0.5, 5.0));
        assert_eq!(camera.zoom(), 45.0);
        assert_eq!(camera.yaw(), -90.0);
    }

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(ViewerConfig::from_toml("").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn partial_sections_override_fields() {
        let config = ViewerConfig::from_toml(
            r#"
            [mesh]
            path = "models/dragon.obj"
            max_vertices = 3000

            [camera]
            speed = 5.0

            [[spheres]]
            center = [0.0, 1.0, -2.0]
            radius = 1.0
            material = { type = "metal", albedo = [0.8, 0.8, 0.9], roughness = 0.05 }
            "#,
        )
        .unwrap();
        assert_eq!(config.mesh.path, PathBuf::from("models/dragon.obj"));
        assert_eq!(config.mesh.max_vertices, 3000);
        assert_eq!(config.mesh.ground_offset, 0.5);
        assert_eq!(config.camera.speed, 5.0);
        assert_eq!(config.camera.sensitivity, 0.1);
        assert_eq!(config.spheres.len(), 1);
        assert_eq!(config.spheres[0].material.kind, MaterialKind::Metal);
        assert_eq!(config.spheres[0].material.refractive_index, 0.0);
    }

    #[test]
    fn rejects_invalid_sphere() {
        let err = ViewerConfig::from_toml(
            r#"
            [[spheres]]
            center = [0.0, 0.0, 0.0]
            radius = -1.0
            material = { type = "diffuse", albedo = [1.0, 1.0, 1.0], roughness = 0.5 }
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("sphere 0"));
    }

    #[test]
    fn rejects_too_many_spheres() {
        let mut config = ViewerConfig::default();
        config.spheres = vec![config.spheres[0]; MAX_SPHERES + 1];
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_oversized_vertex_cap() {
        let err = ViewerConfig::from_toml("[mesh]\nmax_vertices = 100000000\n").unwrap_err();
        assert!(err.to_string().contains("max_vertices 100000000"));

        let mut config = ViewerConfig::default();
        config.mesh.max_vertices = usize::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.mesh.max_vertices = max_vertex_capacity();
        config.validate().unwrap();
    }

    #[test]
    fn rejects_unknown_key_names() {
        let err = ViewerConfig::from_toml("[controls]\nforward = \"Hyper\"\n").unwrap_err();
        assert!(err.to_string().contains("Hyper"));
    }

    #[test]
    fn rejects_bad_zoom_range() {
        let err = ViewerConfig::from_toml("[camera]\nzoom_min = 50.0\nzoom_max = 10.0\n");
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            ViewerConfig::from_toml("[mesh\npath = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn serialized_defaults_round_trip() {
        let text = ViewerConfig::default().to_toml().unwrap();
        assert_eq!(ViewerConfig::from_toml(&text).unwrap(), ViewerConfig::default());
    }
}
