//! Textlens Storage Library
//!
//! Blob storage abstraction for the pipeline. The pipeline only ever puts
//! bytes in and gets bytes (or a URL) back out; storage keys are opaque to
//! every other crate.
//!
//! # Storage key format
//!
//! Keys are owner-scoped: `uploads/{owner_id}/{uuid}_{filename}`. Keys must
//! not contain `..` or a leading `/`.

pub mod local;
pub mod traits;

pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
