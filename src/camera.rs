use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Pitch is clamped to ±89° inclusive so the basis never flips.
pub const PITCH_LIMIT: f32 = 89.0;

pub const DEFAULT_YAW: f32 = -90.0;
pub const DEFAULT_PITCH: f32 = 0.0;
pub const DEFAULT_SPEED: f32 = 2.5;
pub const DEFAULT_SENSITIVITY: f32 = 0.1;
pub const DEFAULT_ZOOM: f32 = 45.0;
pub const DEFAULT_ZOOM_RANGE: (f32, f32) = (1.0, 45.0);

/// Direction of a keyboard-driven camera move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl CameraMovement {
    pub const ALL: [Self; 6] = [
        Self::Forward,
        Self::Backward,
        Self::Left,
        Self::Right,
        Self::Up,
        Self::Down,
    ];
}

/// First-person camera driven by yaw/pitch angles in degrees.
///
/// `front`, `right` and `up` are always rebuilt from the angles, so they stay
/// orthonormal no matter how many updates are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
    zoom: f32,
    zoom_range: (f32, f32),
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.5, 5.0))
    }
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        Self::with_orientation(position, DEFAULT_YAW, DEFAULT_PITCH)
    }

    pub fn with_orientation(position: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            world_up: Vec3::Y,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            zoom: DEFAULT_ZOOM,
            zoom_range: DEFAULT_ZOOM_RANGE,
            movement_speed: DEFAULT_SPEED,
            mouse_sensitivity: DEFAULT_SENSITIVITY,
        };
        camera.update_vectors();
        camera
    }

    /// Sets the allowed zoom interval and re-clamps the current zoom.
    pub fn with_zoom(mut self, zoom: f32, range: (f32, f32)) -> Self {
        let (min, max) = if range.0 <= range.1 {
            range
        } else {
            (range.1, range.0)
        };
        self.zoom_range = (min, max);
        self.zoom = zoom.clamp(min, max);
        self
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Vertical field of view in degrees.
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn zoom_range(&self) -> (f32, f32) {
        self.zoom_range
    }

    pub fn process_keyboard(&mut self, direction: CameraMovement, delta_time: f32) {
        let velocity = self.movement_speed * delta_time;
        let offset = match direction {
            CameraMovement::Forward => self.front,
            CameraMovement::Backward => -self.front,
            CameraMovement::Left => -self.right,
            CameraMovement::Right => self.right,
            CameraMovement::Up => self.world_up,
            CameraMovement::Down => -self.world_up,
        };
        self.position += offset * velocity;
    }

    /// Applies a raw cursor delta (screen coordinates, y grows downwards).
    pub fn process_mouse_movement(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.mouse_sensitivity;
        self.pitch = (self.pitch - dy * self.mouse_sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    pub fn process_mouse_scroll(&mut self, dy: f32) {
        let (min, max) = self.zoom_range;
        self.zoom = (self.zoom - dy).clamp(min, max);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// OpenGL-style perspective using the current zoom as vertical FOV.
    pub fn projection_matrix(&self, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.zoom.to_radians(), aspect.max(0.01), near, far)
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

/// Converts absolute cursor positions into motion deltas.
///
/// The first sample after construction or [`MouseTracker::reset`] only
/// records a reference point, so re-entering the window never produces a
/// jump.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MouseTracker {
    #[default]
    Uninitialized,
    Tracking {
        last: Vec2,
    },
}

impl MouseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `position` and returns the motion since the previous sample.
    pub fn sample(&mut self, position: Vec2) -> Option<Vec2> {
        let delta = match *self {
            Self::Uninitialized => None,
            Self::Tracking { last } => Some(position - last),
        };
        *self = Self::Tracking { last: position };
        delta
    }

    pub fn reset(&mut self) {
        *self = Self::Uninitialized;
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self, Self::Tracking { .. })
    }
}
