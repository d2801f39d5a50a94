//! Data types of a release: build profile, artifact naming, upload requests
//! and CDN invalidation batches.
//!
//! None of these are persisted; they describe files on disk and the requests
//! sent to the storage bucket and the CDN.

pub mod artifact;
pub mod invalidation;
pub mod profile;
pub mod upload;
