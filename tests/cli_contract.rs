use std::fs;
use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::tempdir;

const FAST_CONFIG: &str = r#"
canvas: { width: 64, height: 36 }
playback: { scene_duration_ms: 100, fps: 20 }
stages: { enhance_ms: 0, segment_ms: 0, render_ms: 0 }
grain: { seed: 3 }
"#;

fn run_promptreel(cwd: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_promptreel"))
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("promptreel command should run")
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|error| {
        panic!(
            "stdout should be json ({error}): stdout={} stderr={}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

#[test]
fn generate_writes_frames_and_run_summary() {
    let dir = tempdir().expect("tempdir should create");
    fs::write(dir.path().join("session.yaml"), FAST_CONFIG).expect("config should write");

    let output = run_promptreel(
        dir.path(),
        &[
            "generate", "--prompt", "a neon arcade", "--style", "retro", "--config", "session.yaml", "--out", "frames",
            "--every", "3", "--json",
        ],
    );
    assert!(
        output.status.success(),
        "generate should succeed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let parsed = stdout_json(&output);
    assert_eq!(parsed["ok"], true);
    assert_eq!(parsed["style_id"], "retro");
    assert_eq!(parsed["frame_count"], 6);
    assert_eq!(parsed["scenes"].as_array().map(Vec::len), Some(3));
    assert!(parsed["enhanced_prompt"].as_str().unwrap().starts_with("a neon arcade "));

    let frames = dir.path().join("frames");
    assert!(frames.join("run.json").is_file());
    assert!(frames.join("frame_00000.png").is_file());
    assert!(frames.join("frame_00003.png").is_file());
    assert!(!frames.join("frame_00001.png").exists());
}

#[test]
fn generate_output_is_stable_across_runs() {
    let dir = tempdir().expect("tempdir should create");
    fs::write(dir.path().join("session.yaml"), FAST_CONFIG).expect("config should write");
    let args = ["generate", "-p", "dunes", "-s", "abstract", "-c", "session.yaml", "--json"];

    let first = stdout_json(&run_promptreel(dir.path(), &args));
    let second = stdout_json(&run_promptreel(dir.path(), &args));
    assert_eq!(first["sequence_digest"], second["sequence_digest"]);
}

#[test]
fn blank_prompt_reports_empty_prompt_code() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_promptreel(dir.path(), &["generate", "--prompt", "   ", "--json"]);
    assert_eq!(output.status.code(), Some(2));
    let parsed = stdout_json(&output);
    assert_eq!(parsed["ok"], false);
    assert_eq!(parsed["error"]["code"], "EMPTY_PROMPT");
}

#[test]
fn unknown_style_reports_code_and_choices() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_promptreel(dir.path(), &["scenes", "--style", "noir", "--json"]);
    assert_eq!(output.status.code(), Some(2));
    let parsed = stdout_json(&output);
    assert_eq!(parsed["error"]["code"], "UNKNOWN_STYLE");
    assert!(parsed["error"]["message"].as_str().unwrap().contains("cinematic"));
    assert_eq!(
        parsed["error"]["details"]["valid"],
        serde_json::json!(["cinematic", "animation", "realistic", "abstract", "retro"])
    );
}

#[test]
fn check_config_rejects_unknown_keys() {
    let dir = tempdir().expect("tempdir should create");
    fs::write(dir.path().join("bad.yaml"), "canvas:\n  width: 64\n  depht: 2\n").expect("config should write");
    let output = run_promptreel(dir.path(), &["check-config", "bad.yaml", "--json"]);
    assert_eq!(output.status.code(), Some(2));
    let parsed = stdout_json(&output);
    assert_eq!(parsed["error"]["code"], "INVALID_CONFIG");
    assert!(parsed["error"]["message"].as_str().unwrap().contains("line 3"));
}

#[test]
fn check_config_accepts_defaults() {
    let dir = tempdir().expect("tempdir should create");
    fs::write(dir.path().join("ok.yaml"), FAST_CONFIG).expect("config should write");
    let output = run_promptreel(dir.path(), &["check-config", "ok.yaml"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("OK: ok.yaml (64x36, 20 fps"), "{stdout}");
}

#[test]
fn frame_renders_a_single_png() {
    let dir = tempdir().expect("tempdir should create");
    fs::write(dir.path().join("session.yaml"), FAST_CONFIG).expect("config should write");
    let output = run_promptreel(
        dir.path(),
        &[
            "frame", "--style", "cinematic", "--scene", "2", "--progress", "0.5", "-o", "still.png", "-c", "session.yaml",
            "--json",
        ],
    );
    assert!(output.status.success(), "stderr={}", String::from_utf8_lossy(&output.stderr));
    let parsed = stdout_json(&output);
    assert_eq!(parsed["digest"].as_str().map(str::len), Some(64));
    assert!(dir.path().join("still.png").is_file());

    let out_of_range = run_promptreel(dir.path(), &["frame", "-s", "cinematic", "--scene", "7", "-o", "x.png", "--json"]);
    assert_eq!(stdout_json(&out_of_range)["error"]["code"], "INVALID_ARGUMENT");
}

#[test]
fn styles_lists_all_five() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_promptreel(dir.path(), &["styles", "--json"]);
    assert!(output.status.success());
    let parsed = stdout_json(&output);
    let ids = parsed
        .as_array()
        .expect("array")
        .iter()
        .map(|style| style["id"].as_str().unwrap().to_owned())
        .collect::<Vec<_>>();
    assert_eq!(ids, ["cinematic", "animation", "realistic", "abstract", "retro"]);
}
