//! Per-frame synchronization of camera and scene state with the shader.

use glam::Mat4;
use log::trace;
use thiserror::Error;

use crate::camera::Camera;
use crate::mesh::DEFAULT_MAX_VERTICES;
use crate::scene::Scene;
use crate::uniforms::{
    CameraUniforms, RecordingSink, SceneSnapshot, UniformError, UniformSink, UniformValue,
};

pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 100.0;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("uniform upload failed")]
    Uniform(#[from] UniformError),
    #[error("GPU failure: {0}")]
    Gpu(String),
}

/// Shader program that accepts named uniforms and draws a full-screen quad.
pub trait ShaderProgram: UniformSink {
    /// Draws the 4-vertex triangle strip covering the viewport and presents it.
    fn draw_fullscreen_quad(&mut self) -> Result<(), FrameError>;
}

/// Fixed projection parameters and the triangle transfer cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSettings {
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
    pub max_vertices: usize,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: 1280.0 / 720.0,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            max_vertices: DEFAULT_MAX_VERTICES,
        }
    }
}

/// Timing of one frame, in seconds since startup.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTiming {
    pub time: f32,
    pub delta: f32,
}

/// Tracks the previous frame's timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameClock {
    last_time: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, now: f32) -> FrameTiming {
        let delta = now - self.last_time;
        self.last_time = now;
        FrameTiming { time: now, delta }
    }

    pub fn last_time(&self) -> f32 {
        self.last_time
    }
}

/// What a submitted frame transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub triangles: usize,
    pub spheres: usize,
    pub uniform_writes: usize,
}

/// Owns the frame clock and turns camera + scene into uniform writes and a draw.
#[derive(Debug, Clone)]
pub struct FrameSynchronizer {
    clock: FrameClock,
    settings: FrameSettings,
}

impl FrameSynchronizer {
    pub fn new(settings: FrameSettings) -> Self {
        Self {
            clock: FrameClock::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &FrameSettings {
        &self.settings
    }

    pub fn begin_frame(&mut self, now: f32) -> FrameTiming {
        self.clock.tick(now)
    }

    pub fn projection(&self, camera: &Camera) -> Mat4 {
        camera.projection_matrix(self.settings.aspect_ratio, self.settings.near, self.settings.far)
    }

    /// Collects the state uploaded for one frame.
    pub fn snapshot<'a>(
        &self,
        timing: FrameTiming,
        camera: &Camera,
        scene: &'a Scene,
    ) -> SceneSnapshot<'a> {
        SceneSnapshot {
            camera: CameraUniforms {
                position: camera.position,
                front: camera.front(),
                up: camera.up(),
                view: camera.view_matrix(),
                projection: self.projection(camera),
            },
            time: timing.time,
            light: &scene.light,
            triangles: scene.mesh.capped(self.settings.max_vertices),
            mesh_material: &scene.mesh_material,
            spheres: &scene.spheres,
        }
    }

    /// Writes the full uniform set and issues the full-screen draw.
    ///
    /// The capped mesh is re-sent every frame even though it never changes.
    pub fn submit<P: ShaderProgram + ?Sized>(
        &self,
        timing: FrameTiming,
        camera: &Camera,
        scene: &Scene,
        program: &mut P,
    ) -> Result<FrameReport, FrameError> {
        let snapshot = self.snapshot(timing, camera, scene);
        let uniform_writes = snapshot.write_to(program)?;
        program.draw_fullscreen_quad()?;
        trace!(
            "frame t={:.3} dt={:.4}: {} uniform writes",
            timing.time,
            timing.delta,
            uniform_writes
        );
        Ok(FrameReport {
            triangles: snapshot.triangle_count(),
            spheres: snapshot.spheres.len(),
            uniform_writes,
        })
    }
}

/// Program that records uniforms in memory and counts draw calls.
#[derive(Debug, Default)]
pub struct RecordingProgram {
    pub uniforms: RecordingSink,
    pub draws: usize,
}

impl UniformSink for RecordingProgram {
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), UniformError> {
        self.uniforms.set_uniform(name, value)
    }
}

impl ShaderProgram for RecordingProgram {
    fn draw_fullscreen_quad(&mut self) -> Result<(), FrameError> {
        self.draws += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::mesh::TriangleMesh;
    use crate::uniforms::{NUM_SPHERES, NUM_TRIANGLES, PROJECTION};

    fn scene_with_vertices(count: usize) -> Scene {
        let vertices = (0..count).map(|i| Vec3::splat(i as f32)).collect();
        Scene::new(TriangleMesh::from_vertices(vertices))
    }

    #[test]
    fn clock_reports_delta_since_last_tick() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(0.5), FrameTiming { time: 0.5, delta: 0.5 });
        assert_eq!(clock.tick(0.75), FrameTiming { time: 0.75, delta: 0.25 });
        assert_eq!(clock.last_time(), 0.75);
    }

    #[test]
    fn submit_writes_uniforms_then_draws_once() {
        let sync = FrameSynchronizer::new(FrameSettings::default());
        let scene = scene_with_vertices(9);
        let camera = Camera::default();
        let mut program = RecordingProgram::default();
        let report = sync
            .submit(FrameTiming { time: 1.0, delta: 0.016 }, &camera, &scene, &mut program)
            .unwrap();

        assert_eq!(program.draws, 1);
        assert_eq!(report.triangles, 3);
        assert_eq!(report.spheres, 2);
        assert_eq!(report.uniform_writes, program.uniforms.write_count());
        assert_eq!(program.uniforms.int(NUM_TRIANGLES), Some(3));
        assert_eq!(program.uniforms.int(NUM_SPHERES), Some(2));
        assert_eq!(program.uniforms.float("time"), Some(1.0));
    }

    #[test]
    fn transfer_is_capped() {
        let settings = FrameSettings {
            max_vertices: 30,
            ..FrameSettings::default()
        };
        let sync = FrameSynchronizer::new(settings);
        let scene = scene_with_vertices(300);
        let mut program = RecordingProgram::default();
        sync.submit(FrameTiming::default(), &Camera::default(), &scene, &mut program)
            .unwrap();

        assert_eq!(program.uniforms.int(NUM_TRIANGLES), Some(10));
        assert!(program.uniforms.get("triVertices[29]").is_some());
        assert!(program.uniforms.get("triVertices[30]").is_none());
    }

    #[test]
    fn cap_rounds_down_to_whole_triangles() {
        let settings = FrameSettings {
            max_vertices: 10,
            ..FrameSettings::default()
        };
        let sync = FrameSynchronizer::new(settings);
        let scene = scene_with_vertices(30);
        let snapshot = sync.snapshot(FrameTiming::default(), &Camera::default(), &scene);
        assert_eq!(snapshot.triangles.len(), 9);
        assert_eq!(snapshot.triangle_count(), 3);
    }

    #[test]
    fn projection_uses_fixed_aspect_and_clip_planes() {
        let sync = FrameSynchronizer::new(FrameSettings::default());
        let camera = Camera::default();
        let mut program = RecordingProgram::default();
        sync.submit(FrameTiming::default(), &camera, &scene_with_vertices(0), &mut program)
            .unwrap();
        let expected = Mat4::perspective_rh_gl(45.0_f32.to_radians(), 1280.0 / 720.0, 0.1, 100.0);
        assert_eq!(program.uniforms.mat4(PROJECTION), Some(expected));
    }

    #[test]
    fn spheres_are_not_transformed_by_camera() {
        let sync = FrameSynchronizer::new(FrameSettings::default());
        let mut camera = Camera::default();
        camera.process_mouse_movement(120.0, 40.0);
        camera.process_keyboard(crate::camera::CameraMovement::Forward, 3.0);
        let mut program = RecordingProgram::default();
        sync.submit(FrameTiming::default(), &camera, &scene_with_vertices(3), &mut program)
            .unwrap();
        assert_eq!(
            program.uniforms.vec3("spheres[0].center"),
            Some(Vec3::new(-1.0, 0.5, 0.0))
        );
        assert_eq!(program.uniforms.vec3("cameraPos"), Some(camera.position));
    }
}
