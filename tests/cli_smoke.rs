use std::path::PathBuf;

use canvas_recorder::RecorderOptions;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_canvas-recorder")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "canvas-recorder.exe"
            } else {
                "canvas-recorder"
            });
            p
        })
}

#[test]
fn cli_frame_writes_opaque_png() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let out_path = dir.join("spiral.png");
    let _ = std::fs::remove_file(&out_path);
    let out_arg = out_path.to_string_lossy().to_string();

    let status = std::process::Command::new(exe())
        .args([
            "frame",
            "--width",
            "64",
            "--height",
            "48",
            "--particles",
            "50",
            "--time",
            "1.5",
            "--out",
        ])
        .arg(out_arg.as_str())
        .status()
        .unwrap();

    assert!(status.success());
    let img = image::open(&out_path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (64, 48));
    assert!(img.pixels().all(|p| p.0[3] == 255));
}

#[test]
fn cli_record_rejects_unreadable_config() {
    let status = std::process::Command::new(exe())
        .args(["record", "--config", "target/does/not/exist.json", "--seconds", "0"])
        .status()
        .unwrap();

    assert!(!status.success());
}

#[test]
fn options_file_round_trips_through_json() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("options.json");

    let opts = RecorderOptions::default()
        .with_fps(24)
        .with_filename("demo")
        .with_auto_download(false);
    std::fs::write(&path, serde_json::to_string_pretty(&opts).unwrap()).unwrap();

    let loaded = RecorderOptions::from_json_file(&path).unwrap();
    assert_eq!(loaded, opts);
}
