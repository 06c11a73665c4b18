//! Depot Kernel Library
//!
//! Upload storage in a content-hash directory layout, plus cached, resized
//! image derivatives. The `depot` binary is a command-line front end over
//! the same services.

pub mod config;
pub mod db;
pub mod derivative;
pub mod error;
pub mod file;
pub mod models;
pub mod state;

pub use config::Config;
pub use derivative::{ResizeCache, VariantSet, VariantSetBuilder};
pub use error::{DepotError, DepotResult};
pub use file::{FileService, UploadedFile};
pub use models::File;
pub use state::AppState;
