//! hnforge-render - layered image composition
//!
//! Turns a derived profile and a level into encoded image bytes:
//! - [`AssetLayout`] resolves layer tables to files ([`RenderPlan`])
//! - [`ImageBackend`] abstracts pixel operations ([`RasterBackend`] on `image`)
//! - [`Compositor`] loads, stacks, sharpens and encodes, all-or-nothing
//!
//! # Example
//!
//! ```rust,ignore
//! use hnforge_render::{AssetLayout, Compositor, ImageComposer, RasterBackend};
//! use hnforge_traits::{DerivedProfile, EntityId, Level, Series};
//!
//! let compositor = Compositor::new(AssetLayout::new("nft", Series::Two), RasterBackend::default());
//! let profile = DerivedProfile::derive(EntityId::new(42));
//! let bytes = compositor.compose(&profile, Level::new(3)?)?;
//! ```

pub mod backend;
pub mod compositor;
pub mod error;
pub mod layout;

pub use backend::{Encoding, ImageBackend, OutputFormat, RasterBackend, Sharpen};
pub use compositor::{Compositor, ImageComposer};
pub use error::RenderError;
pub use layout::{AssetLayout, RenderPlan};
