mod support;

use assert_cmd::Command;
use image::{ImageBuffer, Luma};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use support::{full_sheet, PLANE_MM};
use touchhear::{ContactState, DetectionResult, TouchHearConfig};

fn touchhear() -> Command {
    Command::cargo_bin("touchhear").expect("touchhear binary")
}

/// Write the standard scene as a color PNG and a 16-bit depth PNG.
fn write_scene(dir: &Path, color: &str, depth: &str) {
    let frame = full_sheet(PLANE_MM - 20);
    frame.color.save(dir.join(color)).expect("save color");
    let d = frame.depth.expect("depth");
    ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(d.width as u32, d.height as u32, d.data)
        .expect("depth buffer")
        .save(dir.join(depth))
        .expect("save depth");
}

fn write_project(root: &Path) {
    let dir = root.join("demo");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(
        dir.join("config.json"),
        r#"{
            "name": "Demo",
            "rois": [
                {"id": "r1", "name": "Box", "type": "rectangle",
                 "x": 100, "y": 100, "width": 200, "height": 100, "audio_file": "ding.wav"},
                {"id": "r2", "name": "Dot", "type": "circle", "x": 400, "y": 300, "radius": 50}
            ]
        }"#,
    )
    .expect("write project");
}

#[test]
fn init_config_writes_loadable_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("touchhear.json");
    touchhear()
        .args(["init-config", "--out"])
        .arg(&out)
        .assert()
        .success();
    let cfg = TouchHearConfig::load_json(&out).expect("load written config");
    assert_eq!(cfg, TouchHearConfig::default());
}

#[test]
fn regions_prints_millimeter_geometry() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_project(dir.path());
    touchhear()
        .arg("regions")
        .arg("--project-root")
        .arg(dir.path())
        .args(["--project", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""shape": "rect""#))
        .stdout(predicate::str::contains(r#""shape": "ellipse""#))
        .stdout(predicate::str::contains(r#""id": "r1""#));
}

#[test]
fn unknown_project_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    touchhear()
        .arg("regions")
        .arg("--project-root")
        .arg(dir.path())
        .args(["--project", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn detect_reports_a_touch_on_a_still_frame() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_scene(dir.path(), "color.png", "depth.png");
    write_project(dir.path());

    let output = touchhear()
        .current_dir(dir.path())
        .args([
            "detect",
            "--color",
            "color.png",
            "--depth",
            "depth.png",
            "--fingertip",
            "180,80",
            "--frames",
            "10",
            "--project-root",
            ".",
            "--project",
            "demo",
            "--annotated",
            "annotated.png",
        ])
        .output()
        .expect("run detect");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let result: DetectionResult = serde_json::from_slice(&output.stdout).expect("result json");
    assert!(result.board_detected);
    assert_eq!(result.touches[0].contact_state, ContactState::Touch);
    assert_eq!(result.touched_regions[0].region_id, "r1");
    assert!(dir.path().join("annotated.png").is_file());
}

#[test]
fn malformed_fingertip_is_rejected() {
    touchhear()
        .args(["detect", "--color", "nowhere.png", "--fingertip", "180;80"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected X,Y"));
}

#[test]
fn replay_prints_one_line_per_frame() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_scene(dir.path(), "c.png", "d.png");
    fs::write(
        dir.path().join("replay.json"),
        r#"{"frames": [
            {"color": "c.png", "depth": "d.png", "fingertips": [[180, 80]]},
            {"color": "c.png", "depth": "d.png", "fingertips": []},
            {"color": "c.png"}
        ]}"#,
    )
    .expect("write manifest");

    let output = touchhear()
        .arg("replay")
        .arg("--manifest")
        .arg(dir.path().join("replay.json"))
        .output()
        .expect("run replay");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).expect("utf8");
    let results: Vec<DetectionResult> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).expect("result line"))
        .collect();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].touches.len(), 1);
    assert!(results[1].touches.is_empty());
    assert_eq!(results[2].calibration.sample_count, 2);
}
