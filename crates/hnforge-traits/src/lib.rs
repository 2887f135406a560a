//! hnforge-traits - deterministic traits for numbered collections
//!
//! Pure, synchronous building blocks shared by the renderer, the metadata
//! assembler and the scheduler:
//! - Keccak-seeded trait derivation ([`derive()`])
//! - Typed identifiers ([`EntityId`], [`Level`], [`Series`], [`HeroClass`])
//! - Per-entity derived profile ([`DerivedProfile`])
//! - Layer ordering tables ([`layers_for`])
//!
//! # Example
//!
//! ```rust
//! use hnforge_traits::{layers_for, DerivedProfile, EntityId, Series};
//!
//! let profile = DerivedProfile::derive(EntityId::new(42));
//! let layers = layers_for(Series::Two, profile.class, 3).unwrap();
//! assert_eq!(layers.len(), 5);
//! ```

pub mod derive;
pub mod error;
pub mod layers;
pub mod profile;
pub mod slot;
pub mod types;

pub use derive::{derive, keccak256, seed, seed_hex, selector};
pub use error::TraitError;
pub use layers::{layers_for, LayerRef};
pub use profile::{DerivedProfile, CLASS_RANGE, ITEM_VARIANTS};
pub use slot::{TraitSlot, ITEM_SLOTS};
pub use types::{EntityId, HeroClass, Level, Series, MAX_LEVEL};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
