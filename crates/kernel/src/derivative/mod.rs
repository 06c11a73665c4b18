//! Resized image derivatives.
//!
//! Derivatives are generated on demand through an [`ImageBackend`], cached
//! on disk by [`ResizeCache`], and grouped per display density by
//! [`VariantSetBuilder`].

pub mod backend;
pub mod cache;
pub mod variant;

pub use backend::{BackendError, ImageBackend, ImageCrateBackend};
pub use cache::{CacheKey, ParseCacheKeyError, ResizeCache};
pub use variant::{VariantSet, VariantSetBuilder};
