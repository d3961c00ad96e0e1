pub mod layout;
pub mod native;

pub use layout::{GlobalsUniform, GpuMaterial, GpuSphere, UniformBlock};
pub use native::Renderer;
