//! Testing utilities for the hnforge workspace
//!
//! Shared fakes with failure injection and concurrency counters, plus fixture
//! writers for real layer libraries.

#![allow(missing_docs)]

pub mod http;

use async_trait::async_trait;
use hnforge_core::{AssetStore, AttributeSource, MemoryStore, ReadError, StoreError, StoredObject};
use hnforge_metadata::DynamicAttributes;
use hnforge_render::{AssetLayout, ImageComposer, RenderError};
use hnforge_traits::{DerivedProfile, EntityId, Level, Series};
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Tracks concurrent entries and the highest value reached
#[derive(Debug, Default)]
pub struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    pub fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    pub fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Composer producing `image:{id}:{level}` bytes, failing listed entities
#[derive(Debug, Default)]
pub struct FakeComposer {
    failing: Mutex<HashSet<u64>>,
    calls: AtomicUsize,
    delay: Duration,
    in_flight: InFlight,
}

impl FakeComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities whose every level fails with `AssetMissing`
    #[must_use]
    pub fn failing(self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.failing.lock().extend(ids);
        self
    }

    /// Blocking sleep inside every compose
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Let a previously failing entity succeed
    pub fn heal(&self, id: u64) {
        self.failing.lock().remove(&id);
    }

    pub fn heal_all(&self) {
        self.failing.lock().clear();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.peak()
    }
}

impl ImageComposer for FakeComposer {
    fn compose(&self, profile: &DerivedProfile, level: Level) -> Result<Vec<u8>, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.in_flight.enter();
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.in_flight.exit();

        if self.failing.lock().contains(&profile.id.get()) {
            return Err(RenderError::AssetMissing(PathBuf::from(format!(
                "missing/{}/{level}.png",
                profile.id
            ))));
        }
        Ok(format!("image:{}:{level}", profile.id).into_bytes())
    }

    fn content_type(&self) -> &'static str {
        "image/png"
    }
}

/// [`MemoryStore`] wrapper with failure injection and write accounting
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    failing_paths: Mutex<HashSet<String>>,
    puts: AtomicUsize,
    delay: Duration,
    in_flight: InFlight,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write to `path` fails with HTTP 503
    #[must_use]
    pub fn failing_path(self, path: impl Into<String>) -> Self {
        self.failing_paths.lock().insert(path.into());
        self
    }

    /// Async sleep inside every write
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.peak()
    }

    /// Entity ids with at least one stored object
    pub fn entities(&self) -> HashSet<u64> {
        self.inner
            .paths()
            .iter()
            .filter_map(|p| p.rsplit('/').next()?.split('-').rev().nth(1)?.parse().ok())
            .collect()
    }
}

#[async_trait]
impl AssetStore for RecordingStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.in_flight.enter();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.exit();

        if self.failing_paths.lock().contains(path) {
            return Err(StoreError::Http {
                path: path.to_string(),
                status: 503,
            });
        }
        self.inner.put(path, bytes, content_type).await
    }
}

/// In-memory attribute source; unknown ids read as zero scores, level 1
#[derive(Debug, Default)]
pub struct FakeSource {
    attributes: Mutex<HashMap<u64, DynamicAttributes>>,
    levels: Mutex<HashMap<u64, u8>>,
    unavailable: Mutex<HashSet<u64>>,
    reads: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, id: u64, attributes: DynamicAttributes) {
        self.attributes.lock().insert(id, attributes);
    }

    pub fn set_level(&self, id: u64, level: u8) {
        self.levels.lock().insert(id, level);
    }

    /// Reads of `id` fail until [`FakeSource::restore`]
    pub fn make_unavailable(&self, id: u64) {
        self.unavailable.lock().insert(id);
    }

    pub fn restore(&self, id: u64) {
        self.unavailable.lock().remove(&id);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttributeSource for FakeSource {
    async fn attributes(&self, id: EntityId) -> Result<DynamicAttributes, ReadError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.lock().contains(&id.get()) {
            return Err(ReadError::Unavailable(format!("entity {id} unavailable")));
        }
        Ok(self
            .attributes
            .lock()
            .get(&id.get())
            .cloned()
            .unwrap_or_default())
    }

    async fn level(&self, id: EntityId) -> Result<u8, ReadError> {
        Ok(self.levels.lock().get(&id.get()).copied().unwrap_or(1))
    }
}

/// Edge length of fixture layers
pub const LAYER_SIZE: u32 = 8;

/// Write a solid PNG, creating parent directories
pub fn write_png(path: &Path, px: [u8; 4]) {
    std::fs::create_dir_all(path.parent().expect("layer path has a parent")).expect("mkdir");
    RgbaImage::from_pixel(LAYER_SIZE, LAYER_SIZE, Rgba(px))
        .save(path)
        .expect("write png");
}

/// Write every layer needed to render `ids` at levels `1..=max_level`
///
/// Backgrounds are opaque, overlays translucent.
pub fn write_layer_library(
    root: &Path,
    series: Series,
    ids: impl IntoIterator<Item = u64>,
    max_level: u8,
) {
    let layout = AssetLayout::new(root, series);
    let mut written = HashSet::new();
    for id in ids {
        let profile = DerivedProfile::derive(EntityId::new(id));
        for level in Level::up_to(max_level) {
            let plan = layout.plan(&profile, level).expect("plan");
            if written.insert(plan.background.clone()) {
                write_png(&plan.background, [30, 30, 30, 255]);
            }
            for overlay in &plan.overlays {
                if written.insert(overlay.clone()) {
                    write_png(overlay, [220, 120, 40, 96]);
                }
            }
        }
    }
}
