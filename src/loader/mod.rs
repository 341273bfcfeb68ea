//! Loader module
//!
//! Fetch the raw input blob from object storage.
//!
//! # Overview
//!
//! The loader module provides:
//! - `ObjectLocation` - provider/bucket/key coordinates, parsed from URLs
//! - `ObjectLoader` - `object_store` backed loader (S3, R2, GCS, Azure, local)
//! - `BlobLoader` - the seam the pipeline loads through

mod location;
mod store;

pub use location::ObjectLocation;
pub use store::{load_object, BlobLoader, ObjectEntry, ObjectLoader};
