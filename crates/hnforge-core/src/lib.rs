//! hnforge-core - regeneration pipeline and schedulers
//!
//! Ties derivation, rendering and metadata together and runs them at scale:
//! - [`EntityPipeline`]: all levels of one entity, compose -> upload
//! - [`BatchScheduler`]: resumable bounded-concurrency backfill over an id range
//! - [`LiveRegenerator`]: event-driven single-entity regeneration
//! - [`AssetStore`] / [`AttributeSource`]: storage and chain seams, with
//!   in-memory, filesystem, HTTP and JSON-RPC implementations
//! - [`ForgeConfig`]: TOML configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use hnforge_core::{BatchScheduler, IdRange, MemoryCheckpoint};
//! use std::sync::Arc;
//!
//! let scheduler = BatchScheduler::new(Arc::new(pipeline), Arc::new(MemoryCheckpoint::new()));
//! let report = scheduler.run_backfill(IdRange::new(60_000, 65_000)).await?;
//! println!("{} pending", report.pending.len());
//! ```

pub mod config;
pub mod error;
pub mod live;
pub mod pipeline;
pub mod scheduler;
pub mod signal;
pub mod source;
pub mod store;
pub mod workset;

pub use config::{
    CollectionConfig, ForgeConfig, LiveConfig, RenderConfig, SchedulerConfig, SourceConfig,
    StoreConfig, StoreKind,
};
pub use error::{
    CheckpointError, ConfigError, EntityFailure, LevelFailure, PipelineError, ReadError,
    SchedulerError, StoreError,
};
pub use live::{EventFilter, LiveRegenerator, LiveReport};
pub use pipeline::{EntityPipeline, EntityRegenerator, EntityReport, LevelReport, RegenerationScope};
pub use scheduler::{BackfillOptions, BackfillReport, BatchScheduler};
pub use signal::StopSignal;
pub use source::{
    Address, AttributeSource, EntityEvent, EventKind, EventRule, IdLocation, NullSource,
    RpcAttributeSource,
    RpcClient, RpcEventPoller, RuleKind,
};
pub use store::{AssetPaths, AssetStore, FsStore, HttpStore, MemoryStore, StoredObject};
pub use workset::{Checkpoint, FileCheckpoint, IdRange, MemoryCheckpoint, WorkSet};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
