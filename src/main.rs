use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::{info, warn};
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event::{
    DeviceEvent, ElementState, Event, KeyEvent, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{KeyCode as WinitKey, PhysicalKey};
use winit::platform::run_on_demand::EventLoopExtRunOnDemand;
use winit::window::{CursorGrabMode, Window, WindowBuilder};

use raytrace_viewer::{
    load_normalized, Camera, KeyCode, NamedKey, RecordingProgram, Renderer, Viewer, ViewerConfig,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let config = match &options.config {
        Some(path) => ViewerConfig::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    let mesh_path = options
        .mesh
        .clone()
        .unwrap_or_else(|| config.mesh.path.clone());

    let mesh = load_normalized(&mesh_path, config.mesh.normalize_options())
        .with_context(|| format!("failed to load mesh {}", mesh_path.display()))?;
    println!("Loaded {} triangles.", mesh.triangle_count());
    let uploaded = mesh.capped(config.mesh.max_vertices).len() / 3;
    if uploaded < mesh.triangle_count() {
        println!(
            "Uploading the first {uploaded} triangles (limit {} vertices).",
            config.mesh.max_vertices
        );
    }

    let viewer = Viewer::from_config(&config, mesh).context("invalid controls")?;
    for sphere in &viewer.scene().spheres {
        println!(
            " - sphere center=({:.2}, {:.2}, {:.2}) radius={:.2} material={:?}",
            sphere.center.x, sphere.center.y, sphere.center.z, sphere.radius, sphere.material.kind
        );
    }

    if options.summary_only {
        run_headless(viewer)
    } else {
        run_interactive(&config, viewer)
    }
}

/// Builds one frame into an in-memory program and reports what it carried.
fn run_headless(mut viewer: Viewer) -> Result<()> {
    let mut program = RecordingProgram::default();
    let report = viewer
        .frame(0.0, &mut program)
        .context("failed to build frame uniforms")?;
    println!(
        "Frame: {} uniform writes, {} triangles, {} spheres, {} draw call(s)",
        report.uniform_writes, report.triangles, report.spheres, program.draws
    );
    print_camera(viewer.camera());
    Ok(())
}

fn run_interactive(config: &ViewerConfig, mut viewer: Viewer) -> Result<()> {
    let mut event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window.title.as_str())
            .with_inner_size(LogicalSize::new(
                f64::from(config.window.width),
                f64::from(config.window.height),
            ))
            .build(&event_loop)
            .context("failed to create window")?,
    );
    viewer.set_cursor_captured(capture_cursor(&window));

    let renderer = block_on(Renderer::new(Arc::clone(&window), config.mesh.max_vertices))?;
    let mut app = AppState {
        renderer,
        viewer,
        start: Instant::now(),
        last_error: None,
    };

    event_loop.run_on_demand(|event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);
        if let Err(err) = app.process_event(&event, elwt) {
            app.last_error = Some(err);
            elwt.exit();
        }
    })?;

    print_camera(app.viewer.camera());
    if let Some(err) = app.last_error {
        return Err(err);
    }
    Ok(())
}

/// Hides and grabs the cursor. Returns whether the grab succeeded; mouse look
/// then reads raw device motion instead of cursor positions.
fn capture_cursor(window: &Window) -> bool {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    window.set_cursor_visible(false);
    match grabbed {
        Ok(()) => true,
        Err(err) => {
            warn!("unable to capture cursor: {err}");
            false
        }
    }
}

struct AppState {
    renderer: Renderer,
    viewer: Viewer,
    start: Instant,
    last_error: Option<anyhow::Error>,
}

impl AppState {
    fn process_event(
        &mut self,
        event: &Event<()>,
        elwt: &EventLoopWindowTarget<()>,
    ) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.renderer.window_id() => {
                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(size) => self.renderer.resize(*size),
                    WindowEvent::KeyboardInput { event, .. } => self.handle_keyboard(event),
                    WindowEvent::CursorMoved { position, .. } => {
                        let pos = Vec2::new(position.x as f32, position.y as f32);
                        self.viewer.handle_cursor(pos);
                    }
                    WindowEvent::CursorLeft { .. } => self.viewer.handle_cursor_left(),
                    WindowEvent::MouseWheel { delta, .. } => match delta {
                        MouseScrollDelta::LineDelta(_, y) => self.viewer.handle_scroll(*y),
                        MouseScrollDelta::PixelDelta(position) => {
                            self.viewer.handle_scroll_pixels(position.y as f32)
                        }
                    },
                    WindowEvent::Focused(focused) => {
                        self.viewer.handle_focus(*focused);
                        if *focused {
                            let captured = capture_cursor(self.renderer.window());
                            self.viewer.set_cursor_captured(captured);
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        let now = self.start.elapsed().as_secs_f32();
                        self.viewer.frame(now, &mut self.renderer)?;
                    }
                    _ => {}
                }
            }
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => {
                let delta = Vec2::new(delta.0 as f32, delta.1 as f32);
                self.viewer.handle_mouse_motion(delta);
            }
            Event::AboutToWait => {
                self.renderer.window().request_redraw();
            }
            _ => {}
        }
        if self.viewer.wants_quit() {
            info!("Exiting");
            elwt.exit();
        }
        Ok(())
    }

    fn handle_keyboard(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let Some(key) = map_keycode(code) else {
            return;
        };
        self.viewer
            .handle_key(key, event.state == ElementState::Pressed);
    }
}

fn print_camera(camera: &Camera) {
    println!(
        "Camera pos=({:.2}, {:.2}, {:.2}) yaw={:.1} pitch={:.1} zoom={:.1}",
        camera.position.x,
        camera.position.y,
        camera.position.z,
        camera.yaw(),
        camera.pitch(),
        camera.zoom()
    );
}

fn map_keycode(code: WinitKey) -> Option<KeyCode> {
    Some(match code {
        WinitKey::Space => KeyCode::Named(NamedKey::Space),
        WinitKey::Enter => KeyCode::Named(NamedKey::Enter),
        WinitKey::Tab => KeyCode::Named(NamedKey::Tab),
        WinitKey::ArrowLeft => KeyCode::Named(NamedKey::Left),
        WinitKey::ArrowRight => KeyCode::Named(NamedKey::Right),
        WinitKey::ArrowUp => KeyCode::Named(NamedKey::Up),
        WinitKey::ArrowDown => KeyCode::Named(NamedKey::Down),
        WinitKey::Escape => KeyCode::Named(NamedKey::Escape),
        WinitKey::ShiftLeft => KeyCode::Named(NamedKey::LeftShift),
        WinitKey::ShiftRight => KeyCode::Named(NamedKey::RightShift),
        WinitKey::ControlLeft => KeyCode::Named(NamedKey::LeftCtrl),
        WinitKey::ControlRight => KeyCode::Named(NamedKey::RightCtrl),
        WinitKey::AltLeft => KeyCode::Named(NamedKey::LeftAlt),
        WinitKey::AltRight => KeyCode::Named(NamedKey::RightAlt),
        WinitKey::Digit0 => KeyCode::Digit(0),
        WinitKey::Digit1 => KeyCode::Digit(1),
        WinitKey::Digit2 => KeyCode::Digit(2),
        WinitKey::Digit3 => KeyCode::Digit(3),
        WinitKey::Digit4 => KeyCode::Digit(4),
        WinitKey::Digit5 => KeyCode::Digit(5),
        WinitKey::Digit6 => KeyCode::Digit(6),
        WinitKey::Digit7 => KeyCode::Digit(7),
        WinitKey::Digit8 => KeyCode::Digit(8),
        WinitKey::Digit9 => KeyCode::Digit(9),
        WinitKey::KeyA => KeyCode::Character('A'),
        WinitKey::KeyB => KeyCode::Character('B'),
        WinitKey::KeyC => KeyCode::Character('C'),
        WinitKey::KeyD => KeyCode::Character('D'),
        WinitKey::KeyE => KeyCode::Character('E'),
        WinitKey::KeyF => KeyCode::Character('F'),
        WinitKey::KeyG => KeyCode::Character('G'),
        WinitKey::KeyH => KeyCode::Character('H'),
        WinitKey::KeyI => KeyCode::Character('I'),
        WinitKey::KeyJ => KeyCode::Character('J'),
        WinitKey::KeyK => KeyCode::Character('K'),
        WinitKey::KeyL => KeyCode::Character('L'),
        WinitKey::KeyM => KeyCode::Character('M'),
        WinitKey::KeyN => KeyCode::Character('N'),
        WinitKey::KeyO => KeyCode::Character('O'),
        WinitKey::KeyP => KeyCode::Character('P'),
        WinitKey::KeyQ => KeyCode::Character('Q'),
        WinitKey::KeyR => KeyCode::Character('R'),
        WinitKey::KeyS => KeyCode::Character('S'),
        WinitKey::KeyT => KeyCode::Character('T'),
        WinitKey::KeyU => KeyCode::Character('U'),
        WinitKey::KeyV => KeyCode::Character('V'),
        WinitKey::KeyW => KeyCode::Character('W'),
        WinitKey::KeyX => KeyCode::Character('X'),
        WinitKey::KeyY => KeyCode::Character('Y'),
        WinitKey::KeyZ => KeyCode::Character('Z'),
        WinitKey::F1 => KeyCode::Function(1),
        WinitKey::F2 => KeyCode::Function(2),
        WinitKey::F3 => KeyCode::Function(3),
        WinitKey::F4 => KeyCode::Function(4),
        WinitKey::F5 => KeyCode::Function(5),
        WinitKey::F6 => KeyCode::Function(6),
        WinitKey::F7 => KeyCode::Function(7),
        WinitKey::F8 => KeyCode::Function(8),
        WinitKey::F9 => KeyCode::Function(9),
        WinitKey::F10 => KeyCode::Function(10),
        WinitKey::F11 => KeyCode::Function(11),
        WinitKey::F12 => KeyCode::Function(12),
        _ => return None,
    })
}

struct CliOptions {
    mesh: Option<PathBuf>,
    config: Option<PathBuf>,
    summary_only: bool,
}

impl CliOptions {
    const USAGE: &'static str =
        "Usage: raytrace-viewer [MESH.obj] [--config FILE.toml] [--summary-only]";

    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut options = Self {
            mesh: None,
            config: None,
            summary_only: false,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => options.summary_only = true,
                "--config" => {
                    let path = args
                        .next()
                        .ok_or_else(|| anyhow!("--config expects a file path. {}", Self::USAGE))?;
                    options.config = Some(PathBuf::from(path));
                }
                "-h" | "--help" => {
                    println!("{}", Self::USAGE);
                    std::process::exit(0);
                }
                other if other.starts_with('-') => {
                    return Err(anyhow!("Unknown argument: {other}. {}", Self::USAGE));
                }
                other => {
                    if options.mesh.is_some() {
                        return Err(anyhow!("Unexpected argument: {other}. {}", Self::USAGE));
                    }
                    options.mesh = Some(PathBuf::from(other));
                }
            }
        }
        Ok(options)
    }
}
