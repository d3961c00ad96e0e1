use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

const TETRAHEDRON: &str = "\
# unit tetrahedron
v 0 0 0
v 1 0 0
v 0 1 0
v 0 0 1
f 1 3 2
f 1 2 4
f 1 4 3
f 2 3 4
";

fn write_temp(contents: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("temp file");
    tmp.write_all(contents.as_bytes()).expect("write temp file");
    tmp
}

#[test]
fn summary_reports_default_scene() {
    let mesh = write_temp(TETRAHEDRON);
    let mut cmd = Command::cargo_bin("raytrace-viewer").expect("binary exists");
    cmd.arg(mesh.path()).arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("Loaded 4 triangles."))
        .stdout(contains(
            " - sphere center=(-1.00, 0.50, 0.00) radius=0.50 material=Diffuse",
        ))
        .stdout(contains(
            " - sphere center=(1.00, 0.50, 0.00) radius=0.50 material=Glass",
        ))
        .stdout(contains(
            "Frame: 39 uniform writes, 4 triangles, 2 spheres, 1 draw call(s)",
        ))
        .stdout(contains(
            "Camera pos=(0.00, 0.50, 5.00) yaw=-90.0 pitch=0.0 zoom=45.0",
        ));
}

#[test]
fn config_file_caps_upload_and_replaces_spheres() {
    let mesh = write_temp(TETRAHEDRON);
    let config = write_temp(
        r#"
[mesh]
max_vertices = 6

[camera]
position = [0.0, 1.0, 8.0]

[[spheres]]
center = [0.0, 1.0, -2.0]
radius = 1.0
material = { type = "metal", albedo = [0.8, 0.8, 0.9], roughness = 0.05 }
"#,
    );
    let mut cmd = Command::cargo_bin("raytrace-viewer").expect("binary exists");
    cmd.arg(mesh.path())
        .arg("--config")
        .arg(config.path())
        .arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("Loaded 4 triangles."))
        .stdout(contains("Uploading the first 2 triangles (limit 6 vertices)."))
        .stdout(contains(" - sphere center=(0.00, 1.00, -2.00) radius=1.00 material=Metal"))
        .stdout(contains(
            "Frame: 27 uniform writes, 2 triangles, 1 spheres, 1 draw call(s)",
        ))
        .stdout(contains("Camera pos=(0.00, 1.00, 8.00)"));
}

#[test]
fn missing_mesh_is_fatal() {
    let mut cmd = Command::cargo_bin("raytrace-viewer").expect("binary exists");
    cmd.arg("does/not/exist.obj").arg("--summary-only");
    cmd.assert()
        .failure()
        .stderr(contains("failed to load mesh does/not/exist.obj"));
}

#[test]
fn mesh_without_faces_is_fatal() {
    let mesh = write_temp("v 0 0 0\nv 1 0 0\nv 0 1 0\n");
    let mut cmd = Command::cargo_bin("raytrace-viewer").expect("binary exists");
    cmd.arg(mesh.path()).arg("--summary-only");
    cmd.assert().failure().stderr(contains("failed to load mesh"));
}

#[test]
fn invalid_config_is_rejected() {
    let mesh = write_temp(TETRAHEDRON);
    let config = write_temp("[projection]\nnear = 10.0\nfar = 1.0\n");
    let mut cmd = Command::cargo_bin("raytrace-viewer").expect("binary exists");
    cmd.arg(mesh.path())
        .arg("--config")
        .arg(config.path())
        .arg("--summary-only");
    cmd.assert()
        .failure()
        .stderr(contains("failed to load config"))
        .stderr(contains("near=10 far=1"));
}

#[test]
fn unknown_flag_prints_usage() {
    let mut cmd = Command::cargo_bin("raytrace-viewer").expect("binary exists");
    cmd.arg("--fullscreen");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --fullscreen"))
        .stderr(contains("Usage: raytrace-viewer"));
}

#[cfg(all(unix, not(target_os = "macos")))]
#[test]
fn missing_display_is_a_startup_failure() {
    let mesh = write_temp(TETRAHEDRON);
    let mut cmd = Command::cargo_bin("raytrace-viewer").expect("binary exists");
    cmd.arg(mesh.path())
        .env_remove("DISPLAY")
        .env_remove("WAYLAND_DISPLAY")
        .env_remove("WAYLAND_SOCKET");
    cmd.assert()
        .failure()
        .code(1)
        .stderr(contains("Error: failed to initialize event loop"))
        .stdout(contains("Frame:").not());
}
