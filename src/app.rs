use glam::Vec2;
use log::debug;

use crate::camera::{Camera, MouseTracker};
use crate::config::{ConfigError, ViewerConfig};
use crate::frame::{FrameError, FrameReport, FrameSettings, FrameSynchronizer, ShaderProgram};
use crate::input::{InputState, KeyCode, Keybindings};
use crate::mesh::TriangleMesh;
use crate::scene::Scene;

/// Lines scrolled per pixel of a high-resolution scroll delta.
pub const PIXELS_PER_LINE: f32 = 20.0;

/// Window-independent viewer state: camera, held keys, cursor tracking and
/// the scene uploaded every frame.
#[derive(Debug, Clone)]
pub struct Viewer {
    camera: Camera,
    mouse: MouseTracker,
    input: InputState,
    bindings: Keybindings,
    scene: Scene,
    synchronizer: FrameSynchronizer,
    cursor_captured: bool,
    focused: bool,
    quit_requested: bool,
}

impl Viewer {
    pub fn new(
        camera: Camera,
        scene: Scene,
        bindings: Keybindings,
        settings: FrameSettings,
    ) -> Self {
        Self {
            camera,
            mouse: MouseTracker::new(),
            input: InputState::new(),
            bindings,
            scene,
            synchronizer: FrameSynchronizer::new(settings),
            cursor_captured: false,
            focused: true,
            quit_requested: false,
        }
    }

    /// Builds the viewer around an already normalized mesh.
    pub fn from_config(config: &ViewerConfig, mesh: TriangleMesh) -> Result<Self, ConfigError> {
        let scene = Scene::new(mesh)
            .with_mesh_material(config.mesh.material)
            .with_spheres(config.spheres.clone())
            .with_light(config.light);
        Ok(Self::new(
            config.camera.build(),
            scene,
            config.controls.keybindings()?,
            config.frame_settings(),
        ))
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn synchronizer(&self) -> &FrameSynchronizer {
        &self.synchronizer
    }

    pub fn wants_quit(&self) -> bool {
        self.quit_requested
    }

    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            if key == self.bindings.quit {
                debug!("quit requested");
                self.quit_requested = true;
            }
            self.input.set_key_down(key);
        } else {
            self.input.set_key_up(key);
        }
    }

    /// Switches mouse look between raw device motion (cursor captured) and
    /// absolute cursor positions (cursor free).
    pub fn set_cursor_captured(&mut self, captured: bool) {
        self.cursor_captured = captured;
        self.mouse.reset();
    }

    pub fn cursor_captured(&self) -> bool {
        self.cursor_captured
    }

    /// Feeds an absolute cursor position in window pixels. Ignored while the
    /// cursor is captured.
    pub fn handle_cursor(&mut self, position: Vec2) {
        if self.cursor_captured {
            return;
        }
        if let Some(delta) = self.mouse.sample(position) {
            self.camera.process_mouse_movement(delta.x, delta.y);
        }
    }

    /// Feeds raw pointer motion. Only applied while the cursor is captured
    /// and the window has focus, so it is not bounded by the window edges.
    pub fn handle_mouse_motion(&mut self, delta: Vec2) {
        if self.cursor_captured && self.focused {
            self.camera.process_mouse_movement(delta.x, delta.y);
        }
    }

    /// Positive `lines` scrolls up and zooms in.
    pub fn handle_scroll(&mut self, lines: f32) {
        self.camera.process_mouse_scroll(lines);
    }

    pub fn handle_scroll_pixels(&mut self, pixels: f32) {
        self.handle_scroll(pixels / PIXELS_PER_LINE);
    }

    /// Focus loss or the cursor leaving the window drops held keys and
    /// restarts cursor tracking.
    pub fn handle_focus(&mut self, focused: bool) {
        self.focused = focused;
        if !focused {
            self.release_input();
        }
    }

    pub fn handle_cursor_left(&mut self) {
        self.mouse.reset();
    }

    fn release_input(&mut self) {
        self.input.clear();
        self.mouse.reset();
    }

    /// Advances the clock to `now`, moves the camera for held keys and
    /// submits the frame to `program`.
    pub fn frame<P: ShaderProgram + ?Sized>(
        &mut self,
        now: f32,
        program: &mut P,
    ) -> Result<FrameReport, FrameError> {
        let timing = self.synchronizer.begin_frame(now);
        for movement in self.bindings.active_movements(&self.input) {
            self.camera.process_keyboard(movement, timing.delta);
        }
        self.synchronizer
            .submit(timing, &self.camera, &self.scene, program)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::frame::RecordingProgram;
    use crate::input::NamedKey;
    use crate::uniforms::{CAMERA_POS, NUM_TRIANGLES};

    const EPS: f32 = 1e-4;

    fn viewer() -> Viewer {
        let mesh = TriangleMesh::from_vertices(vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
        Viewer::from_config(&ViewerConfig::default(), mesh).unwrap()
    }

    #[test]
    fn held_key_moves_camera_by_speed_times_delta() {
        let mut viewer = viewer();
        let mut program = RecordingProgram::default();
        viewer.frame(0.0, &mut program).unwrap();

        viewer.handle_key(KeyCode::Character('W'), true);
        viewer.frame(0.5, &mut program).unwrap();
        let position = viewer.camera().position;
        assert!((position - Vec3::new(0.0, 0.5, 3.75)).length() < EPS);
        assert_eq!(program.uniforms.vec3(CAMERA_POS), Some(position));

        viewer.handle_key(KeyCode::Character('W'), false);
        viewer.frame(1.0, &mut program).unwrap();
        assert_eq!(viewer.camera().position, position);
        assert_eq!(program.draws, 3);
        assert_eq!(program.uniforms.int(NUM_TRIANGLES), Some(1));
    }

    #[test]
    fn first_cursor_sample_does_not_rotate() {
        let mut viewer = viewer();
        let front = viewer.camera().front();
        viewer.handle_cursor(Vec2::new(640.0, 360.0));
        assert_eq!(viewer.camera().front(), front);

        viewer.handle_cursor(Vec2::new(650.0, 360.0));
        assert!((viewer.camera().yaw() - (-89.0)).abs() < EPS);
    }

    #[test]
    fn focus_loss_releases_keys_and_cursor() {
        let mut viewer = viewer();
        let mut program = RecordingProgram::default();
        viewer.handle_cursor(Vec2::new(0.0, 0.0));
        viewer.handle_key(KeyCode::Named(NamedKey::Space), true);
        viewer.handle_focus(false);

        viewer.frame(1.0, &mut program).unwrap();
        assert_eq!(viewer.camera().position, Vec3::new(0.0, 0.5, 5.0));

        let yaw = viewer.camera().yaw();
        viewer.handle_cursor(Vec2::new(500.0, 500.0));
        assert_eq!(viewer.camera().yaw(), yaw);
    }

    #[test]
    fn captured_motion_is_not_bounded_by_the_window() {
        let mut viewer = viewer();
        viewer.set_cursor_captured(true);
        for _ in 0..40 {
            viewer.handle_mouse_motion(Vec2::new(100.0, 0.0));
        }
        assert!((viewer.camera().yaw() - 310.0).abs() < EPS);

        let yaw = viewer.camera().yaw();
        viewer.handle_cursor(Vec2::new(0.0, 0.0));
        viewer.handle_cursor(Vec2::new(1279.0, 0.0));
        assert_eq!(viewer.camera().yaw(), yaw);
    }

    #[test]
    fn raw_motion_needs_capture_and_focus() {
        let mut viewer = viewer();
        viewer.handle_mouse_motion(Vec2::new(50.0, 0.0));
        assert_eq!(viewer.camera().yaw(), -90.0);

        viewer.set_cursor_captured(true);
        viewer.handle_focus(false);
        viewer.handle_mouse_motion(Vec2::new(50.0, 0.0));
        assert_eq!(viewer.camera().yaw(), -90.0);

        viewer.handle_focus(true);
        viewer.handle_mouse_motion(Vec2::new(0.0, -50.0));
        assert!((viewer.camera().pitch() - 5.0).abs() < EPS);
    }

    #[test]
    fn escape_requests_quit() {
        let mut viewer = viewer();
        assert!(!viewer.wants_quit());
        viewer.handle_key(KeyCode::Named(NamedKey::Escape), true);
        assert!(viewer.wants_quit());
    }

    #[test]
    fn pixel_scroll_converts_to_lines() {
        let mut viewer = viewer();
        viewer.handle_scroll(10.0);
        assert_eq!(viewer.camera().zoom(), 35.0);
        viewer.handle_scroll_pixels(-2.0 * PIXELS_PER_LINE);
        assert_eq!(viewer.camera().zoom(), 37.0);
        viewer.handle_scroll(-100.0);
        assert_eq!(viewer.camera().zoom(), 45.0);
    }
}
