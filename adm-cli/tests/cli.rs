//! Integration tests for the adm CLI.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Get path to the adm binary.
fn adm_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_adm"))
}

/// Create temp directory for test files.
fn temp_dir() -> PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("adm-test-{}-{}", std::process::id(), id));
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

/// Textured 8-bit luma frame; `t` shifts the pattern between frames.
fn luma_frame(width: usize, height: usize, t: usize) -> Vec<u8> {
    (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            ((x * 13 + y * 7 + t * 5 + (x * y) % 17) % 200 + 28) as u8
        })
        .collect()
}

/// Write 8-bit 4:2:0 planar frames with neutral chroma.
fn write_yuv420p(path: &Path, width: usize, height: usize, frames: &[Vec<u8>]) {
    let chroma = width.div_ceil(2) * height.div_ceil(2);
    let mut data = Vec::new();
    for luma in frames {
        assert_eq!(luma.len(), width * height);
        data.extend_from_slice(luma);
        data.extend(std::iter::repeat(128u8).take(2 * chroma));
    }
    fs::write(path, data).expect("Failed to write yuv");
}

/// Write 10-bit little-endian 4:2:0 planar frames with neutral chroma.
fn write_yuv420p10le(path: &Path, width: usize, height: usize, frames: &[Vec<u16>]) {
    let chroma = width.div_ceil(2) * height.div_ceil(2);
    let mut data = Vec::new();
    for luma in frames {
        for &v in luma {
            data.extend_from_slice(&v.to_le_bytes());
        }
        for _ in 0..2 * chroma {
            data.extend_from_slice(&512u16.to_le_bytes());
        }
    }
    fs::write(path, data).expect("Failed to write yuv");
}

/// Write 8-bit 4:2:0 frames as y4m with neutral chroma.
fn write_y4m_420(path: &Path, width: usize, height: usize, frames: &[Vec<u8>]) {
    let chroma = width.div_ceil(2) * height.div_ceil(2);
    let mut data = format!("YUV4MPEG2 W{width} H{height} F25:1 Ip A1:1 C420jpeg\n").into_bytes();
    for luma in frames {
        assert_eq!(luma.len(), width * height);
        data.extend_from_slice(b"FRAME\n");
        data.extend_from_slice(luma);
        data.extend(std::iter::repeat(128u8).take(2 * chroma));
    }
    fs::write(path, data).expect("Failed to write y4m");
}

/// Write 10-bit little-endian 4:2:0 frames as y4m with neutral chroma.
fn write_y4m_420p10(path: &Path, width: usize, height: usize, frames: &[Vec<u16>]) {
    let chroma = width.div_ceil(2) * height.div_ceil(2);
    let mut data =
        format!("YUV4MPEG2 W{width} H{height} F25:1 Ip A1:1 C420p10 XYSCSS=420P10\n").into_bytes();
    for luma in frames {
        assert_eq!(luma.len(), width * height);
        data.extend_from_slice(b"FRAME\n");
        for &v in luma {
            data.extend_from_slice(&v.to_le_bytes());
        }
        for _ in 0..2 * chroma {
            data.extend_from_slice(&512u16.to_le_bytes());
        }
    }
    fs::write(path, data).expect("Failed to write y4m");
}

fn quiet_score(reference: &Path, distorted: &Path) -> f64 {
    let output = run(&["--quiet", reference.to_str().unwrap(), distorted.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "adm failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse()
        .expect("Should output just a number")
}

fn contrast_halved(luma: &[u8]) -> Vec<u8> {
    luma.iter().map(|&v| v / 2 + 64).collect()
}

fn run(args: &[&str]) -> Output {
    Command::new(adm_bin())
        .args(args)
        .output()
        .expect("Failed to run adm")
}

#[test]
fn test_identical_raw_video() {
    let dir = temp_dir();
    let ref_path = dir.join("ref.yuv");
    let (w, h) = (48, 32);
    let frames: Vec<_> = (0..3).map(|t| luma_frame(w, h, t)).collect();
    write_yuv420p(&ref_path, w, h, &frames);

    let output = run(&["--size", "48x32", ref_path.to_str().unwrap(), ref_path.to_str().unwrap()]);
    assert!(output.status.success(), "Exit code should be 0");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ADM score:"), "Should output score: {stdout}");
    assert!(stdout.contains("1.0000"), "Identical inputs score 1: {stdout}");
    assert_eq!(stdout.matches("frame ").count(), 3, "One line per frame");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_quiet_mode() {
    let dir = temp_dir();
    let ref_path = dir.join("ref.yuv");
    let dist_path = dir.join("dist.yuv");
    let (w, h) = (40, 40);
    let frame = luma_frame(w, h, 0);
    write_yuv420p(&ref_path, w, h, &[frame.clone()]);
    write_yuv420p(&dist_path, w, h, &[contrast_halved(&frame)]);

    let output = run(&[
        "--quiet",
        "--size",
        "40x40",
        ref_path.to_str().unwrap(),
        dist_path.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let score: f64 = stdout.trim().parse().expect("Should output just a number");
    assert!(score > 0.0 && score < 1.0, "Contrast loss lowers the score: {score}");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_json_output() {
    let dir = temp_dir();
    let ref_path = dir.join("ref.yuv");
    let dist_path = dir.join("dist.yuv");
    let (w, h) = (32, 24);
    let frames: Vec<_> = (0..2).map(|t| luma_frame(w, h, t)).collect();
    let distorted: Vec<_> = frames.iter().map(|f| contrast_halved(f)).collect();
    write_yuv420p(&ref_path, w, h, &frames);
    write_yuv420p(&dist_path, w, h, &distorted);

    let output = run(&[
        "--json",
        "--size",
        "32x24",
        ref_path.to_str().unwrap(),
        dist_path.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Should output valid JSON");
    assert_eq!(json["width"], 32);
    assert_eq!(json["height"], 24);
    assert_eq!(json["pix_fmt"], "yuv420p");
    assert_eq!(json["summary"]["frames"], 2);

    let frames = json["frames"].as_array().expect("frames array");
    assert_eq!(frames.len(), 2);
    for frame in frames {
        let score = frame["score"].as_f64().unwrap();
        let num = frame["num"].as_f64().unwrap();
        let den = frame["den"].as_f64().unwrap();
        assert!((score - num / den).abs() < 1e-12);
        assert_eq!(frame["scales"].as_array().unwrap().len(), 8);
    }
    assert!(json.get("below_threshold").is_none());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_min_score_pass() {
    let dir = temp_dir();
    let ref_path = dir.join("ref.yuv");
    let (w, h) = (32, 32);
    write_yuv420p(&ref_path, w, h, &[luma_frame(w, h, 1)]);

    let output = run(&[
        "--min-score",
        "1.0",
        "--size",
        "32x32",
        ref_path.to_str().unwrap(),
        ref_path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "Should pass when average >= min-score");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_min_score_fail() {
    let dir = temp_dir();
    let ref_path = dir.join("ref.yuv");
    let dist_path = dir.join("dist.yuv");
    let (w, h) = (32, 32);
    let frame = luma_frame(w, h, 1);
    write_yuv420p(&ref_path, w, h, &[frame.clone()]);
    write_yuv420p(&dist_path, w, h, &[contrast_halved(&frame)]);

    let output = run(&[
        "--min-score",
        "1.0",
        "--size",
        "32x32",
        ref_path.to_str().unwrap(),
        dist_path.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1), "Should fail with exit code 1");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Threshold failed"), "{stdout}");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_shorter_stream_warns() {
    let dir = temp_dir();
    let ref_path = dir.join("ref.yuv");
    let dist_path = dir.join("dist.yuv");
    let (w, h) = (24, 24);
    let frames: Vec<_> = (0..3).map(|t| luma_frame(w, h, t)).collect();
    write_yuv420p(&ref_path, w, h, &frames);
    write_yuv420p(&dist_path, w, h, &frames[..2]);

    let output = run(&[
        "--json",
        "--size",
        "24x24",
        ref_path.to_str().unwrap(),
        dist_path.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("shorter stream"), "Should warn: {stderr}");

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["summary"]["frames"], 2);
    assert_eq!(json["summary"]["mean"], 1.0);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_frame_limit() {
    let dir = temp_dir();
    let ref_path = dir.join("ref.yuv");
    let (w, h) = (16, 16);
    let frames: Vec<_> = (0..4).map(|t| luma_frame(w, h, t)).collect();
    write_yuv420p(&ref_path, w, h, &frames);

    let output = run(&[
        "--json",
        "--frames",
        "2",
        "--size",
        "16x16",
        ref_path.to_str().unwrap(),
        ref_path.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["frames"].as_array().unwrap().len(), 2);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_ten_bit_raw_video() {
    let dir = temp_dir();
    let ref_path = dir.join("ref.yuv");
    let dist_path = dir.join("dist.yuv");
    let (w, h) = (32, 32);
    let reference: Vec<u16> = luma_frame(w, h, 2).iter().map(|&v| u16::from(v) * 4).collect();
    let distorted: Vec<u16> = reference.iter().map(|&v| v / 2 + 256).collect();
    write_yuv420p10le(&ref_path, w, h, &[reference.clone()]);
    write_yuv420p10le(&dist_path, w, h, &[distorted]);

    let output = run(&[
        "--quiet",
        "--size",
        "32x32",
        "--pix-fmt",
        "yuv420p10le",
        ref_path.to_str().unwrap(),
        ref_path.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    let score: f64 = String::from_utf8_lossy(&output.stdout).trim().parse().unwrap();
    assert_eq!(score, 1.0);

    let output = run(&[
        "--quiet",
        "--size",
        "32x32",
        "--pix-fmt",
        "yuv420p10le",
        ref_path.to_str().unwrap(),
        dist_path.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    let score: f64 = String::from_utf8_lossy(&output.stdout).trim().parse().unwrap();
    assert!(score < 1.0, "score {score}");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_y4m_eight_bit() {
    let dir = temp_dir();
    let ref_path = dir.join("ref.y4m");
    let dist_path = dir.join("dist.y4m");
    let (w, h) = (48, 32);
    let frames: Vec<_> = (0..2).map(|t| luma_frame(w, h, t)).collect();
    let distorted: Vec<_> = frames.iter().map(|f| contrast_halved(f)).collect();
    write_y4m_420(&ref_path, w, h, &frames);
    write_y4m_420(&dist_path, w, h, &distorted);

    let output = run(&[ref_path.to_str().unwrap(), ref_path.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ADM score: 1.0000"), "{stdout}");
    assert_eq!(stdout.matches("frame ").count(), 2, "One line per frame");

    let score = quiet_score(&ref_path, &dist_path);
    assert!(score > 0.0 && score < 1.0, "Contrast loss lowers the score: {score}");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_y4m_ten_bit() {
    let dir = temp_dir();
    let ref_path = dir.join("ref.y4m");
    let dist_path = dir.join("dist.y4m");
    let (w, h) = (48, 32);
    let reference: Vec<u16> = luma_frame(w, h, 4).iter().map(|&v| u16::from(v) * 4).collect();
    let distorted: Vec<u16> = reference.iter().map(|&v| v / 2 + 256).collect();
    write_y4m_420p10(&ref_path, w, h, &[reference]);
    write_y4m_420p10(&dist_path, w, h, &[distorted]);

    let output = run(&["--json", ref_path.to_str().unwrap(), dist_path.to_str().unwrap()]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["pix_fmt"], "yuv420p10le");
    assert_eq!(json["summary"]["frames"], 1);

    assert_eq!(quiet_score(&ref_path, &ref_path), 1.0);
    let score = quiet_score(&ref_path, &dist_path);
    assert!(score > 0.0 && score < 1.0, "score {score}");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_y4m_bit_depth_mismatch() {
    let dir = temp_dir();
    let ref_path = dir.join("ref.y4m");
    let dist_path = dir.join("dist.y4m");
    let (w, h) = (32, 32);
    let frame = luma_frame(w, h, 0);
    let wide: Vec<u16> = frame.iter().map(|&v| u16::from(v) * 4).collect();
    write_y4m_420(&ref_path, w, h, &[frame]);
    write_y4m_420p10(&dist_path, w, h, &[wide]);

    let output = run(&[ref_path.to_str().unwrap(), dist_path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("pixel formats don't match"), "{stderr}");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_still_images() {
    let dir = temp_dir();
    let img1 = dir.join("a.png");
    let img2 = dir.join("b.png");
    let (w, h) = (40, 30);
    let frame = luma_frame(w, h, 3);
    image::save_buffer(&img1, &frame, w as u32, h as u32, image::ColorType::L8).unwrap();
    image::save_buffer(&img2, &frame, w as u32, h as u32, image::ColorType::L8).unwrap();

    let output = run(&["--quiet", img1.to_str().unwrap(), img2.to_str().unwrap()]);
    assert!(output.status.success());
    let score: f64 = String::from_utf8_lossy(&output.stdout).trim().parse().unwrap();
    assert_eq!(score, 1.0);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_dimension_mismatch() {
    let dir = temp_dir();
    let img1 = dir.join("a.png");
    let img2 = dir.join("b.png");
    image::save_buffer(&img1, &luma_frame(32, 32, 0), 32, 32, image::ColorType::L8).unwrap();
    image::save_buffer(&img2, &luma_frame(32, 24, 0), 32, 24, image::ColorType::L8).unwrap();

    let output = run(&[img1.to_str().unwrap(), img2.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("don't match"), "{stderr}");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_raw_requires_size() {
    let dir = temp_dir();
    let ref_path = dir.join("ref.yuv");
    write_yuv420p(&ref_path, 16, 16, &[luma_frame(16, 16, 0)]);

    let output = run(&[ref_path.to_str().unwrap(), ref_path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--size"), "{stderr}");

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_missing_file() {
    let output = run(&["/nonexistent/ref.y4m", "/nonexistent/dist.y4m"]);
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "{stderr}");
}

#[test]
fn test_help() {
    let output = run(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--min-score"));
    assert!(stdout.contains("--pix-fmt"));
    assert!(stdout.contains("EXIT CODES"));
}
