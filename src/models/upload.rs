//! A single object upload and what came back from it.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// One put-object request against the storage bucket.
///
/// The object key is always the bare file name; the body is read from `path`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectUpload {
    /// Object key inside the bucket.
    pub key: String,

    /// Local file streamed as the object body.
    pub path: PathBuf,

    /// Canned ACL (e.g. "public-read").
    pub acl: String,

    /// Content type (MIME type) served with the object.
    pub content_type: String,

    /// Content encoding served with the object, if the body is pre-compressed.
    pub content_encoding: Option<String>,

    /// User-defined metadata (sent as `x-amz-meta-*`).
    pub metadata: BTreeMap<String, String>,
}

impl ObjectUpload {
    pub fn new(dir: &Path, file_name: &str, acl: &str, content_type: &str) -> Self {
        Self {
            key: file_name.to_string(),
            path: dir.join(file_name),
            acl: acl.to_string(),
            content_type: content_type.to_string(),
            content_encoding: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_content_encoding(mut self, encoding: &str) -> Self {
        self.content_encoding = Some(encoding.to_string());
        self
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// What the store reported back for an accepted put-object request.
#[derive(Clone, Debug, Default)]
pub struct StoredObject {
    /// Quoted MD5 of the stored body (for single-part uploads).
    pub etag: Option<String>,

    pub version_id: Option<String>,
}

impl StoredObject {
    /// ETag with the surrounding quotes removed.
    pub fn etag_unquoted(&self) -> Option<&str> {
        self.etag.as_deref().map(|e| e.trim_matches('"'))
    }
}

/// Per-file result of the upload step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadOutcome {
    pub key: String,
    pub uploaded: bool,
}
