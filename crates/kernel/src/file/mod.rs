//! File upload and storage.
//!
//! Provides MIME validation, content-hash directory naming, the on-disk
//! layout, and the service that ties them to file records.

pub mod hash;
pub mod layout;
pub mod mime;
pub mod repository;
pub mod service;
pub mod storage;
pub mod upload;

pub use hash::{DEFAULT_HASH_PREFIX_LEN, HashNamer, MAX_HASH_PREFIX_LEN};
pub use layout::StoreLayout;
pub use mime::{DEFAULT_ALLOWED_TYPES, TypeValidator, UNKNOWN_MIME_TYPE};
pub use repository::{FileRepository, MemoryFileRepository, PgFileRepository};
pub use service::FileService;
pub use storage::LocalFileStorage;
pub use upload::{UploadSource, UploadedFile};
