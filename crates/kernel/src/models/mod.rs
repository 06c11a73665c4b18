//! Database models.

pub mod file;

pub use file::File;
