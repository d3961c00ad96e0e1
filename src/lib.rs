//! Driver for a real-time ray tracer that runs entirely in a fragment shader.
//!
//! The CPU side loads and normalizes a triangle mesh, runs a first-person
//! camera, and every frame writes the camera, light, spheres and triangle
//! soup into named shader uniforms before drawing a single full-screen quad.
//! Everything except [`render::Renderer`] is window-free and testable
//! headlessly.

pub mod app;
pub mod camera;
pub mod config;
pub mod frame;
pub mod input;
pub mod mesh;
pub mod obj;
pub mod render;
pub mod scene;
pub mod uniforms;

pub use app::Viewer;
pub use camera::{Camera, CameraMovement, MouseTracker};
pub use config::{ConfigError, ViewerConfig};
pub use frame::{
    FrameError, FrameReport, FrameSettings, FrameSynchronizer, RecordingProgram, ShaderProgram,
};
pub use input::{InputState, KeyCode, Keybindings, NamedKey};
pub use mesh::{load_normalized, Aabb, MeshError, NormalizeOptions, TriangleMesh};
pub use obj::{load_obj, parse_obj, ObjData, ObjError};
pub use render::Renderer;
pub use scene::{Material, MaterialKind, PointLight, Scene, Sphere};
pub use uniforms::{RecordingSink, SceneSnapshot, UniformError, UniformSink, UniformValue};
