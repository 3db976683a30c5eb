//! CLI integration tests
//!
//! Runs the flatbed binary end to end against small synthetic images.
//! Inputs use a uniform light background so extraction takes the
//! keep-the-original path and no segmentation tool is needed. Scan and
//! merge runs pin a small page via --config to keep resampling cheap.

use assert_cmd::Command;
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use std::path::{Path, PathBuf};

/// 20x30 mm page at 254 dpi gives an exact 200x300 px canvas.
const SMALL_PAGE_CONFIG: &str = "[page]\nwidth_mm = 20.0\nheight_mm = 30.0\ndpi = 254\n";

fn flatbed() -> Command {
    Command::cargo_bin("flatbed").expect("binary builds")
}

fn write_photo(dir: &Path, name: &str, color: Rgb<u8>) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(40, 40, color)
        .save(&path)
        .expect("write test image");
    path
}

fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("flatbed.toml");
    std::fs::write(&path, SMALL_PAGE_CONFIG).expect("write test config");
    path
}

#[test]
fn test_no_args_shows_usage() {
    flatbed()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_extract_light_background() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_photo(dir.path(), "photo.png", Rgb([245, 245, 245]));
    let output = dir.path().join("cutout.png");

    flatbed()
        .arg("extract")
        .arg(&input)
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Extracted object"));

    let saved = image::open(&output).expect("output decodes").to_rgb8();
    assert_eq!(saved.dimensions(), (40, 40));
}

#[test]
fn test_extract_coerces_output_extension() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_photo(dir.path(), "photo.png", Rgb([245, 245, 245]));

    flatbed()
        .arg("extract")
        .arg(&input)
        .arg(dir.path().join("cutout.pdf"))
        .assert()
        .success();

    assert!(dir.path().join("cutout.png").exists());
    assert!(!dir.path().join("cutout.pdf").exists());
}

#[test]
fn test_extract_missing_input_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    flatbed()
        .arg("extract")
        .arg("/nonexistent/photo.png")
        .arg(dir.path().join("out.png"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_scan_monochrome_writes_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let input = write_photo(dir.path(), "doc.png", Rgb([220, 220, 220]));
    let output = dir.path().join("scan.pdf");

    flatbed()
        .arg("--config")
        .arg(&config)
        .arg("scan")
        .arg(&input)
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Scanned to PDF"));

    let bytes = std::fs::read(&output).expect("output written");
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn test_scan_color_flag() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let input = write_photo(dir.path(), "doc.png", Rgb([100, 150, 200]));
    let output = dir.path().join("scan.pdf");

    flatbed()
        .arg("--config")
        .arg(&config)
        .arg("scan")
        .arg("--color")
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    assert!(output.exists());
}

#[test]
fn test_merge_skips_bad_input() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let a = write_photo(dir.path(), "a.png", Rgb([250, 250, 250]));
    let b = write_photo(dir.path(), "b.png", Rgb([30, 30, 30]));
    let output = dir.path().join("merged.pdf");

    flatbed()
        .arg("--config")
        .arg(&config)
        .arg("merge")
        .arg(&output)
        .arg(&a)
        .arg("/nonexistent/missing.png")
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("Merged 2 page(s)"))
        .stderr(predicate::str::contains("missing.png"));

    assert!(std::fs::read(&output).unwrap().starts_with(b"%PDF"));
}

#[test]
fn test_merge_all_bad_inputs_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    flatbed()
        .arg("--config")
        .arg(&config)
        .arg("merge")
        .arg(dir.path().join("merged.pdf"))
        .arg("/nonexistent/a.png")
        .arg("/nonexistent/b.png")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No valid inputs"));
}

#[test]
fn test_info_reports_environment() {
    flatbed()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("flatbed"))
        .stdout(predicate::str::contains("Page canvas"))
        .stdout(predicate::str::contains("Config search paths"));
}
