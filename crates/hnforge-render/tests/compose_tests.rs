//! End-to-end composition against a real layer library on disk.

use hnforge_render::{
    AssetLayout, Compositor, Encoding, ImageComposer, OutputFormat, RasterBackend, RenderError,
};
use hnforge_traits::{DerivedProfile, EntityId, Level, Series};
use image::{Rgba, RgbaImage};
use std::path::Path;

const SIZE: u32 = 8;

fn write_png(path: &Path, px: [u8; 4]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbaImage::from_pixel(SIZE, SIZE, Rgba(px)).save(path).unwrap();
}

/// Writes every file a render of `profile` at `level` needs.
fn write_library(root: &Path, profile: &DerivedProfile, level: Level) {
    let layout = AssetLayout::new(root, Series::Two);
    let plan = layout.plan(profile, level).unwrap();
    write_png(&plan.background, [20, 20, 20, 255]);
    for (i, overlay) in plan.overlays.iter().enumerate() {
        // mostly transparent layers, last one paints a visible corner
        let alpha = if i + 1 == plan.overlays.len() { 255 } else { 0 };
        write_png(overlay, [200, 100, 50, alpha]);
    }
}

#[test]
fn test_compose_produces_png_of_background_size() {
    let dir = tempfile::tempdir().unwrap();
    let profile = DerivedProfile::derive(EntityId::new(42));
    let level = Level::new(3).unwrap();
    write_library(dir.path(), &profile, level);

    let compositor = Compositor::new(AssetLayout::new(dir.path(), Series::Two), RasterBackend::new(64))
        .with_encoding(Encoding {
            format: OutputFormat::Png,
            quality: 90,
        });

    let bytes = compositor.compose(&profile, level).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.width(), SIZE);
    assert_eq!(decoded.height(), SIZE);
    assert_eq!(compositor.content_type(), "image/png");
}

#[test]
fn test_compose_jpeg_default_quality() {
    let dir = tempfile::tempdir().unwrap();
    let profile = DerivedProfile::derive(EntityId::new(7));
    let level = Level::new(1).unwrap();
    write_library(dir.path(), &profile, level);

    let compositor = Compositor::new(AssetLayout::new(dir.path(), Series::Two), RasterBackend::new(64));
    let bytes = compositor.compose(&profile, level).unwrap();

    assert_eq!(&bytes[..2], &[0xff, 0xd8]);
    assert_eq!(compositor.content_type(), "image/jpeg");
}

#[test]
fn test_missing_layer_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let profile = DerivedProfile::derive(EntityId::new(42));
    let level = Level::new(2).unwrap();
    write_library(dir.path(), &profile, level);

    let layout = AssetLayout::new(dir.path(), Series::Two);
    let hero = layout.plan(&profile, level).unwrap().overlays[1].clone();
    std::fs::remove_file(&hero).unwrap();

    let compositor = Compositor::new(layout, RasterBackend::new(64));
    match compositor.compose(&profile, level) {
        Err(RenderError::AssetMissing(path)) => assert_eq!(path, hero),
        other => panic!("expected AssetMissing, got {other:?}"),
    }
}

#[test]
fn test_corrupt_layer_is_a_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let profile = DerivedProfile::derive(EntityId::new(42));
    let level = Level::new(1).unwrap();
    write_library(dir.path(), &profile, level);

    let layout = AssetLayout::new(dir.path(), Series::Two);
    let bar = layout.plan(&profile, level).unwrap().overlays.last().cloned().unwrap();
    std::fs::write(&bar, b"not an image").unwrap();

    let compositor = Compositor::new(layout, RasterBackend::new(64));
    assert!(matches!(
        compositor.compose(&profile, level),
        Err(RenderError::Decode { .. })
    ));
}

#[test]
fn test_layers_are_cached_across_renders() {
    let dir = tempfile::tempdir().unwrap();
    let profile = DerivedProfile::derive(EntityId::new(42));
    let level = Level::new(3).unwrap();
    write_library(dir.path(), &profile, level);

    let compositor = Compositor::new(AssetLayout::new(dir.path(), Series::Two), RasterBackend::new(64));
    let first = compositor.compose(&profile, level).unwrap();
    let cached = compositor.backend().cached_layers();
    let second = compositor.compose(&profile, level).unwrap();

    assert_eq!(cached, 9);
    assert_eq!(compositor.backend().cached_layers(), cached);
    assert_eq!(first, second);
}
