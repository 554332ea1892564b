use std::fs;
use std::process::{Command, Output};

use prismconfig::{AnimationType, PrismFile};
use tempfile::TempDir;

fn prism(config_dir: &std::path::Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_prism"))
        .env_remove("PRISM_CONFIG")
        .env_remove("RUST_LOG")
        .env("PRISM_CONFIG_DIR", config_dir)
        .args(args)
        .output()
        .expect("failed to run prism")
}

fn shown(output: &Output) -> PrismFile {
    assert!(
        output.status.success(),
        "prism failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    PrismFile::from_toml_str(&stdout).unwrap()
}

#[test]
fn config_show_prints_file_values() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("prism.toml");
    fs::write(
        &path,
        r#"
[prism]
animation_type = "hover"
glow = 1.25
offset = { x = 12.0, y = -8.0 }

[render]
resize_debounce = "250ms"
max_fps = 30
"#,
    )
    .unwrap();

    let output = prism(
        root.path(),
        &["config", "show", "--config", path.to_str().unwrap()],
    );
    let file = shown(&output);
    assert_eq!(file.prism.animation_type, AnimationType::Hover);
    assert_eq!(file.prism.glow, 1.25);
    assert_eq!(file.prism.offset.x, 12.0);
    assert_eq!(file.prism.offset.y, -8.0);
    assert_eq!(file.prism.height, 3.5);
    assert_eq!(file.render.resize_debounce.as_millis(), 250);
    assert_eq!(file.render.max_fps, Some(30.0));
}

#[test]
fn missing_user_config_means_defaults() {
    let root = TempDir::new().unwrap();
    let output = prism(root.path(), &["config", "show"]);
    assert_eq!(shown(&output), PrismFile::default());
}

#[test]
fn user_directory_config_is_discovered() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("prism.toml"),
        "[prism]\nanimation_type = \"rotate\"\n",
    )
    .unwrap();
    let output = prism(root.path(), &["config", "show"]);
    assert_eq!(shown(&output).prism.animation_type, AnimationType::Rotate);
}

#[test]
fn flags_override_file() {
    let root = TempDir::new().unwrap();
    let output = prism(
        root.path(),
        &[
            "--animation",
            "hover",
            "--opaque",
            "--no-suspend",
            "--seed",
            "17",
            "config",
            "show",
        ],
    );
    let file = shown(&output);
    assert_eq!(file.prism.animation_type, AnimationType::Hover);
    assert!(!file.prism.transparent);
    assert!(!file.prism.suspend_when_offscreen);
    assert_eq!(file.render.seed, Some(17));
}

#[test]
fn invalid_config_is_reported() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("bad.toml");
    fs::write(&path, "[render]\nvisibility_threshold = 2.0\n").unwrap();

    let output = prism(
        root.path(),
        &["config", "show", "--config", path.to_str().unwrap()],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("visibility_threshold"), "stderr: {stderr}");
}

#[test]
fn explicit_missing_config_is_an_error() {
    let root = TempDir::new().unwrap();
    let missing = root.path().join("nope.toml");
    let output = prism(
        root.path(),
        &["config", "show", "--config", missing.to_str().unwrap()],
    );
    assert!(!output.status.success());
}

#[test]
fn config_where_reports_environment_path() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("from-env.toml");
    let output = Command::new(env!("CARGO_BIN_EXE_prism"))
        .env("PRISM_CONFIG", &path)
        .args(["config", "where"])
        .output()
        .expect("failed to run prism config where");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(path.to_str().unwrap()));
    assert!(stdout.contains("PRISM_CONFIG"));
    assert!(stdout.contains("status: missing"));
}
