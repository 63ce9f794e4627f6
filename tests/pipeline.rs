//! End-to-end tests through the public library API.
//!
//! Sources are generated in memory, encoded with the production backend and
//! fed back through `transform_bytes`, the same path the CLI takes.

use avfit::batch;
use avfit::config::{self, AppConfig, RequestOverrides};
use avfit::imaging::{
    CropMode, ImageBackend, ImageMime, OutputFormat, Quality, RustBackend, Stage,
    TransformRequest, TransformWarning, transform_bytes,
};
use avfit::naming::output_file_name;
use image::{DynamicImage, Rgb, RgbImage};
use std::fs;
use tempfile::TempDir;

/// Smooth colour field with some structure; never pure black.
fn scene(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (30 + x * 200 / width) as u8,
            (30 + y * 200 / height) as u8,
            (30 + ((x / 50 + y / 50) % 2) * 150) as u8,
        ])
    }))
}

fn encoded(img: &DynamicImage, mime: ImageMime) -> Vec<u8> {
    RustBackend::new()
        .encode(img, mime, Quality::new(90))
        .unwrap()
}

fn decode(bytes: &[u8]) -> DynamicImage {
    image::load_from_memory(bytes).unwrap()
}

#[test]
fn photo_to_1080p_auto_center_jpeg() {
    let source = encoded(&scene(4000, 3000), ImageMime::Jpeg);
    let request = TransformRequest {
        target_width: 1920,
        target_height: 1080,
        format: OutputFormat::Jpeg,
        quality: Quality::new(85),
        sharpen_amount: 0,
        crop: CropMode::AutoCenter,
        target_file_size: Some(0),
    };

    let out = transform_bytes(&RustBackend::new(), &source, &request).unwrap();

    assert_eq!(out.image.mime, ImageMime::Jpeg);
    assert_eq!(out.image.mime.as_str(), "image/jpeg");
    assert_eq!((out.image.width, out.image.height), (1920, 1080));
    let img = decode(&out.image.bytes);
    assert_eq!((img.width(), img.height()), (1920, 1080));

    assert_eq!((out.region.width, out.region.height), (4000, 2250));
    assert!(!out.passed(Stage::SizeConstrained));
    assert!(!out.passed(Stage::Composited));
    assert!(out.met_budget);
    assert!(out.warnings.is_empty());
}

#[test]
fn matching_aspect_png_fills_target_without_bars() {
    let source = encoded(&scene(4000, 3000), ImageMime::Jpeg);
    let mut request = TransformRequest::new(800, 600);
    request.format = OutputFormat::Png;

    let out = transform_bytes(&RustBackend::new(), &source, &request).unwrap();

    assert_eq!(out.image.mime, ImageMime::Png);
    assert!(!out.passed(Stage::Composited));
    let img = decode(&out.image.bytes).to_rgb8();
    assert_eq!((img.width(), img.height()), (800, 600));
    for (x, y) in [(0, 0), (799, 0), (0, 599), (799, 599), (400, 0), (0, 300)] {
        assert_ne!(img.get_pixel(x, y).0, [0, 0, 0], "edge pixel ({x}, {y})");
    }
}

#[test]
fn portrait_source_letterboxed_into_landscape() {
    let source = encoded(&scene(600, 800), ImageMime::Png);
    let mut request = TransformRequest::new(1920, 1080);
    request.format = OutputFormat::Png;

    let out = transform_bytes(&RustBackend::new(), &source, &request).unwrap();
    assert!(out.passed(Stage::Composited));
    assert!(out.region.is_full((600, 800)));

    // Content is 810 wide at x = 555; everything either side is black
    let img = decode(&out.image.bytes).to_rgb8();
    for y in [0, 540, 1079] {
        assert_eq!(img.get_pixel(0, y).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(554, y).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(1365, y).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(1919, y).0, [0, 0, 0]);
        assert_ne!(img.get_pixel(960, y).0, [0, 0, 0]);
    }
}

#[test]
fn auto_center_region_matches_target_aspect() {
    let backend = RustBackend::new();
    for (src, target) in [
        ((900, 700), (1080, 1920)),
        ((640, 480), (1920, 1080)),
        ((333, 999), (1024, 768)),
    ] {
        let source = encoded(&scene(src.0, src.1), ImageMime::Png);
        let mut request = TransformRequest::new(target.0, target.1);
        request.crop = CropMode::AutoCenter;

        let out = transform_bytes(&backend, &source, &request).unwrap();
        assert_eq!((out.image.width, out.image.height), target);
        // Rounding the cropped edge to whole pixels moves the aspect by at most half a pixel
        let want = target.0 as f64 / target.1 as f64;
        let got = out.region.aspect();
        let tolerance = want.max(1.0) / out.region.width.min(out.region.height) as f64;
        assert!(
            (got - want).abs() <= tolerance,
            "{src:?} → {target:?}: region {:?}",
            out.region
        );
    }
}

#[test]
fn same_request_same_bytes() {
    let source = encoded(&scene(1200, 900), ImageMime::Jpeg);
    let mut request = TransformRequest::new(1280, 720);
    request.crop = CropMode::AutoCenter;
    request.sharpen_amount = 35;
    request.format = OutputFormat::Jpeg;

    let a = transform_bytes(&RustBackend::new(), &source, &request).unwrap();
    let b = transform_bytes(&RustBackend::new(), &source, &request).unwrap();
    assert_eq!(a.image.bytes, b.image.bytes);
}

#[test]
fn size_budget_on_jpeg_output() {
    let noisy = DynamicImage::ImageRgb8(RgbImage::from_fn(640, 480, |x, y| {
        let v = (x.wrapping_mul(2_654_435_761) ^ y.wrapping_mul(40_503)) as u8;
        Rgb([v, v.wrapping_mul(7), v.wrapping_add(y as u8)])
    }));
    let source = encoded(&noisy, ImageMime::Png);
    let mut request = TransformRequest::new(640, 480);
    request.format = OutputFormat::Jpeg;
    request.quality = Quality::new(95);

    let unconstrained = transform_bytes(&RustBackend::new(), &source, &request).unwrap();
    let budget = unconstrained.image.len() as u64 * 2 / 3;
    request.target_file_size = Some(budget);

    let out = transform_bytes(&RustBackend::new(), &source, &request).unwrap();
    assert!(out.passed(Stage::SizeConstrained));
    assert!(out.met_budget);
    assert!(out.image.len() as u64 <= budget);

    request.target_file_size = Some(100);
    let out = transform_bytes(&RustBackend::new(), &source, &request).unwrap();
    assert!(!out.met_budget);
    assert!(
        out.warnings
            .iter()
            .any(|w| matches!(w, TransformWarning::CompressionBudgetNotMet { budget: 100, .. }))
    );
    assert!(decode(&out.image.bytes).width() > 0);
}

#[test]
fn preset_request_through_files() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("floor.plan.png");
    fs::write(&input, encoded(&scene(2048, 1536), ImageMime::Png)).unwrap();

    let app_config = AppConfig::default();
    let presets = app_config.preset_repository();
    let resolved = config::resolve_request(
        &app_config,
        &presets,
        &RequestOverrides {
            preset: Some("control-panel".into()),
            sharpen: Some(20),
            ..Default::default()
        },
    )
    .unwrap();

    let out_dir = tmp.path().join("out");
    let written = batch::transform_file(&RustBackend::new(), &input, &resolved.request, |mime| {
        out_dir.join(output_file_name("floor.plan.png", &resolved.label, mime))
    })
    .unwrap();

    assert_eq!(written.output, out_dir.join("floor_control-panel.png"));
    assert_eq!(written.mime, "image/png");
    let img = decode(&fs::read(&written.output).unwrap());
    assert_eq!((img.width(), img.height()), (1024, 768));
}

#[test]
fn batch_over_directory_collects_failures() {
    let tmp = TempDir::new().unwrap();
    let input_dir = tmp.path().join("in");
    fs::create_dir_all(input_dir.join("sub")).unwrap();
    fs::write(input_dir.join("a.jpg"), encoded(&scene(320, 240), ImageMime::Jpeg)).unwrap();
    fs::write(input_dir.join("sub/b.webp"), encoded(&scene(240, 320), ImageMime::WebP)).unwrap();
    fs::write(input_dir.join("c.png"), b"not really a png").unwrap();

    let sources = batch::collect_sources(&[input_dir]).unwrap();
    assert_eq!(sources.len(), 3);

    let mut request = TransformRequest::new(160, 90);
    request.format = OutputFormat::WebP;
    let out_dir = tmp.path().join("out");
    let report = batch::run_batch(&sources, &request, "160x90", &out_dir, None).unwrap();

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    for name in ["a_160x90.webp", "b_160x90.webp"] {
        let img = decode(&fs::read(out_dir.join(name)).unwrap());
        assert_eq!((img.width(), img.height()), (160, 90));
    }

    let json = serde_json::to_value(&report).unwrap();
    let statuses: Vec<_> = json["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["status"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(statuses, vec!["ok", "failed", "ok"]);
}
