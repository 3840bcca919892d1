use std::path::Path;
use std::process::{Command, Output};

use image::{Rgba, RgbaImage};

fn prismal(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_prismal-glass"))
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to launch prismal-glass: {e}"))
}

fn path_str(p: &Path) -> &str {
    p.to_str().unwrap_or_else(|| panic!("non-utf8 temp path"))
}

#[test]
fn cpu_render_writes_a_png_of_the_requested_viewport() {
    let dir = tempfile::tempdir().unwrap();
    let bg_path = dir.path().join("bg.png");
    let params_path = dir.path().join("glass.json");
    let out_path = dir.path().join("out.png");

    RgbaImage::from_pixel(32, 24, Rgba([30, 90, 200, 255]))
        .save(&bg_path)
        .unwrap();
    std::fs::write(
        &params_path,
        r#"{ "width": 48, "height": 30, "cornerRadius": 8, "blurRadius": 1 }"#,
    )
    .unwrap();

    let out = prismal(&[
        "--backend",
        "cpu",
        "--background",
        path_str(&bg_path),
        "--params",
        path_str(&params_path),
        "--viewport",
        "64x40",
        "--output",
        path_str(&out_path),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("[headless] saved:"));

    let img = image::open(&out_path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (64, 40));
    // Outside the glass is transparent; the centre is opaque and mostly blue.
    assert_eq!(img.get_pixel(0, 0).0[3], 0);
    let center = img.get_pixel(32, 20).0;
    assert_eq!(center[3], 255);
    assert!(center[2] > center[0], "{center:?}");
}

#[test]
fn viewport_defaults_to_the_glass_size() {
    let dir = tempfile::tempdir().unwrap();
    let params_path = dir.path().join("glass.json");
    let out_path = dir.path().join("normals.png");
    std::fs::write(
        &params_path,
        r#"{ "width": 60.5, "height": 40, "cornerRadius": 8, "transitionWidth": 2 }"#,
    )
    .unwrap();

    let out = prismal(&[
        "--backend",
        "cpu",
        "--params",
        path_str(&params_path),
        "--show-normals",
        "-o",
        path_str(&out_path),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let img = image::open(&out_path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (61, 40));
    // A flat top encodes its normal (0, 0, 1) as (128, 128, 255).
    let center = img.get_pixel(30, 20).0;
    assert!((center[0] as i32 - 128).abs() <= 2, "{center:?}");
    assert!((center[1] as i32 - 128).abs() <= 2, "{center:?}");
    assert!(center[2] >= 250, "{center:?}");
}

#[test]
fn degenerate_glass_writes_a_transparent_frame() {
    let dir = tempfile::tempdir().unwrap();
    let params_path = dir.path().join("glass.json");
    let out_path = dir.path().join("empty.png");
    std::fs::write(&params_path, r#"{ "width": 0, "height": 10 }"#).unwrap();

    let out = prismal(&[
        "--backend",
        "cpu",
        "--params",
        path_str(&params_path),
        "--viewport",
        "8x8",
        "--output",
        path_str(&out_path),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let img = image::open(&out_path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (8, 8));
    assert!(img.pixels().all(|p| p.0[3] == 0));
}

#[test]
fn degenerate_glass_without_a_viewport_still_writes_a_png() {
    let dir = tempfile::tempdir().unwrap();
    let params_path = dir.path().join("glass.json");
    let out_path = dir.path().join("flat.png");
    std::fs::write(&params_path, r#"{ "width": 0 }"#).unwrap();

    let out = prismal(&[
        "--backend",
        "cpu",
        "--params",
        path_str(&params_path),
        "--output",
        path_str(&out_path),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let img = image::open(&out_path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (1, 260));
    assert!(img.pixels().all(|p| p.0[3] == 0));
}

#[test]
fn missing_output_and_bad_arguments_fail() {
    let out = prismal(&["--backend", "cpu"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("--output"));

    let out = prismal(&["--backend", "metal", "-o", "x.png"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown backend"));

    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("zero.png");
    let out = prismal(&["--viewport", "0x10", "-o", path_str(&out_path)]);
    assert!(!out.status.success());
    assert!(!out_path.exists());
}
