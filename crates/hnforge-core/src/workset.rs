//! Pending-id bookkeeping for backfills
//!
//! - [`IdRange`]: a half-open `[start, end)` range of entity ids
//! - [`WorkSet`]: ids of a range not yet fully uploaded
//! - [`Checkpoint`]: persistence of a WorkSet across restarts

use crate::error::CheckpointError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hnforge_traits::EntityId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

/// Half-open id range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdRange {
    /// First id
    pub start: u64,
    /// One past the last id
    pub end: u64,
}

impl IdRange {
    /// Create range
    #[inline]
    #[must_use]
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Number of ids
    #[inline]
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Whether the range holds no ids
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether `id` lies inside
    #[inline]
    #[must_use]
    pub const fn contains(&self, id: EntityId) -> bool {
        id.0 >= self.start && id.0 < self.end
    }

    /// Every id, ascending
    pub fn ids(&self) -> impl Iterator<Item = EntityId> {
        (self.start..self.end).map(EntityId::new)
    }
}

impl From<std::ops::Range<u64>> for IdRange {
    fn from(range: std::ops::Range<u64>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl Display for IdRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Ids of `range` still pending
///
/// Owned by a single coordinator; only completed ids are ever removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkSet {
    range: IdRange,
    pending: BTreeSet<EntityId>,
}

impl WorkSet {
    /// Every id of `range` pending
    #[must_use]
    pub fn seeded(range: IdRange) -> Self {
        Self {
            range,
            pending: range.ids().collect(),
        }
    }

    /// Restore from a persisted pending list, dropping ids outside `range`
    #[must_use]
    pub fn restore(range: IdRange, pending: impl IntoIterator<Item = EntityId>) -> Self {
        Self {
            range,
            pending: pending.into_iter().filter(|id| range.contains(*id)).collect(),
        }
    }

    /// Covered range
    #[inline]
    #[must_use]
    pub fn range(&self) -> IdRange {
        self.range
    }

    /// Mark `id` complete; returns whether it was pending
    pub fn complete(&mut self, id: EntityId) -> bool {
        self.pending.remove(&id)
    }

    /// Whether `id` is pending
    #[inline]
    #[must_use]
    pub fn is_pending(&self, id: EntityId) -> bool {
        self.pending.contains(&id)
    }

    /// Pending count
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Completed count
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.range.len().saturating_sub(self.pending.len() as u64)
    }

    /// Pending ids, ascending
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.pending.iter().copied()
    }

    /// Pending ids as a set
    #[inline]
    #[must_use]
    pub fn pending(&self) -> &BTreeSet<EntityId> {
        &self.pending
    }
}

/// Persists [`WorkSet`]s keyed by range
#[async_trait]
pub trait Checkpoint: Send + Sync {
    /// Stored WorkSet for `range`, if any
    async fn load(&self, range: IdRange) -> Result<Option<WorkSet>, CheckpointError>;

    /// Replace the stored WorkSet for its range
    async fn save(&self, work: &WorkSet) -> Result<(), CheckpointError>;
}

/// In-process checkpoint: resumes within one process lifetime
#[derive(Debug, Default)]
pub struct MemoryCheckpoint {
    sets: Mutex<HashMap<IdRange, BTreeSet<EntityId>>>,
}

impl MemoryCheckpoint {
    /// Create empty checkpoint
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpoint for MemoryCheckpoint {
    async fn load(&self, range: IdRange) -> Result<Option<WorkSet>, CheckpointError> {
        Ok(self
            .sets
            .lock()
            .get(&range)
            .map(|pending| WorkSet::restore(range, pending.iter().copied())))
    }

    async fn save(&self, work: &WorkSet) -> Result<(), CheckpointError> {
        self.sets.lock().insert(work.range(), work.pending().clone());
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointRecord {
    range: IdRange,
    pending: Vec<EntityId>,
    updated_at: DateTime<Utc>,
}

/// JSON-file checkpoint, one file per range
///
/// Files are written to a temp name and renamed, so a crash mid-write
/// leaves the previous checkpoint intact.
#[derive(Debug, Clone)]
pub struct FileCheckpoint {
    dir: PathBuf,
}

impl FileCheckpoint {
    /// Create checkpoint storing files under `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File holding the WorkSet of `range`
    #[must_use]
    pub fn path_for(&self, range: IdRange) -> PathBuf {
        self.dir
            .join(format!("backfill-{}-{}.json", range.start, range.end))
    }

    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> CheckpointError + '_ {
        move |source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
impl Checkpoint for FileCheckpoint {
    async fn load(&self, range: IdRange) -> Result<Option<WorkSet>, CheckpointError> {
        let path = self.path_for(range);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io(&path)(e)),
        };
        let record: CheckpointRecord =
            serde_json::from_slice(&bytes).map_err(|source| CheckpointError::Corrupt {
                path: path.clone(),
                source,
            })?;
        if record.range != range {
            return Err(CheckpointError::RangeMismatch {
                expected: range.to_string(),
                found: record.range.to_string(),
            });
        }
        tracing::debug!(path = %path.display(), pending = record.pending.len(), updated_at = %record.updated_at, "checkpoint loaded");
        Ok(Some(WorkSet::restore(range, record.pending)))
    }

    async fn save(&self, work: &WorkSet) -> Result<(), CheckpointError> {
        let path = self.path_for(work.range());
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(Self::io(&self.dir))?;

        let record = CheckpointRecord {
            range: work.range(),
            pending: work.iter().collect(),
            updated_at: Utc::now(),
        };
        let bytes = serde_json::to_vec_pretty(&record).map_err(|source| CheckpointError::Corrupt {
            path: path.clone(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await.map_err(Self::io(&tmp))?;
        tokio::fs::rename(&tmp, &path).await.map_err(Self::io(&path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_workset_covers_range() {
        let mut work = WorkSet::seeded(IdRange::new(3, 6));
        assert_eq!(work.len(), 3);
        assert!(work.complete(EntityId::new(4)));
        assert!(!work.complete(EntityId::new(4)));
        assert_eq!(work.completed(), 1);
        assert_eq!(work.iter().map(|id| id.0).collect::<Vec<_>>(), vec![3, 5]);
    }

    #[test]
    fn restore_drops_foreign_ids() {
        let work = WorkSet::restore(IdRange::new(0, 10), [2, 11, 9].map(EntityId::new));
        assert_eq!(work.iter().map(|id| id.0).collect::<Vec<_>>(), vec![2, 9]);
    }

    #[test]
    fn empty_range() {
        let range = IdRange::new(5, 5);
        assert!(range.is_empty());
        assert!(WorkSet::seeded(range).is_empty());
        assert_eq!(IdRange::new(9, 3).len(), 0);
    }

    #[tokio::test]
    async fn memory_checkpoint_is_keyed_by_range() {
        let checkpoint = MemoryCheckpoint::new();
        let mut work = WorkSet::seeded(IdRange::new(0, 4));
        work.complete(EntityId::new(1));
        checkpoint.save(&work).await.unwrap();

        assert_eq!(checkpoint.load(IdRange::new(0, 4)).await.unwrap(), Some(work));
        assert_eq!(checkpoint.load(IdRange::new(0, 5)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_checkpoint_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let range = IdRange::new(60_000, 60_010);
        let mut work = WorkSet::seeded(range);
        for id in 60_000..60_008 {
            work.complete(EntityId::new(id));
        }

        FileCheckpoint::new(dir.path()).save(&work).await.unwrap();
        let reopened = FileCheckpoint::new(dir.path());
        let loaded = reopened.load(range).await.unwrap().unwrap();

        assert_eq!(loaded, work);
        assert!(!reopened.path_for(range).with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn file_checkpoint_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = FileCheckpoint::new(dir.path());
        let range = IdRange::new(0, 2);
        std::fs::write(checkpoint.path_for(range), b"{not json").unwrap();

        let err = checkpoint.load(range).await.unwrap_err();
        assert!(matches!(err, CheckpointError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn file_checkpoint_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = FileCheckpoint::new(dir.path().join("nested"));
        assert!(checkpoint.load(IdRange::new(0, 2)).await.unwrap().is_none());
    }
}
