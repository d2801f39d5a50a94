//! Object uploads to the storage bucket.
//!
//! Every upload streams the local file through MD5 first: the base64 digest
//! goes out as `Content-MD5` so S3 rejects a corrupted body, and the returned
//! ETag is compared with the hex digest afterwards.
//!
//! Only errors raised by the store itself (`DeployError::Storage`) are
//! tolerated: they are logged, reported per file, and the remaining uploads
//! still run. Local I/O errors abort the upload step.

use crate::{
    errors::{DeployError, DeployResult},
    models::upload::{ObjectUpload, StoredObject, UploadOutcome},
};
use aws_config::SdkConfig;
use aws_sdk_s3::{
    Client, error::DisplayErrorContext, primitives::ByteStream, types::ObjectCannedAcl,
};
use base64::{Engine as _, engine::general_purpose};
use futures::StreamExt;
use md5::Context;
use std::{
    collections::HashMap,
    io::{self, ErrorKind},
    path::Path,
};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};

/// Digest and size of a local file about to be uploaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectChecksum {
    pub md5_hex: String,
    pub md5_base64: String,
    pub size_bytes: u64,
}

/// Anything that can accept a put-object request.
///
/// Implementations report rejections by the store as `DeployError::Storage`.
pub trait ObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        upload: &ObjectUpload,
        checksum: &ObjectChecksum,
    ) -> DeployResult<StoredObject>;
}

/// [`ObjectStore`] backed by the S3 SDK client.
#[derive(Clone, Debug)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

impl ObjectStore for S3Store {
    async fn put_object(
        &self,
        bucket: &str,
        upload: &ObjectUpload,
        checksum: &ObjectChecksum,
    ) -> DeployResult<StoredObject> {
        let body = ByteStream::from_path(&upload.path)
            .await
            .map_err(|err| DeployError::Io(io::Error::other(err)))?;

        let output = self
            .client
            .put_object()
            .bucket(bucket)
            .key(&upload.key)
            .body(body)
            .acl(ObjectCannedAcl::from(upload.acl.as_str()))
            .content_type(&upload.content_type)
            .set_content_encoding(upload.content_encoding.clone())
            .set_metadata(user_metadata(upload))
            .content_md5(&checksum.md5_base64)
            .send()
            .await
            .map_err(|err| DeployError::Storage {
                key: upload.key.clone(),
                message: DisplayErrorContext(&err).to_string(),
            })?;

        Ok(StoredObject {
            etag: output.e_tag().map(str::to_string),
            version_id: output.version_id().map(str::to_string),
        })
    }
}

/// User metadata for the request, `None` when the upload carries none.
fn user_metadata(upload: &ObjectUpload) -> Option<HashMap<String, String>> {
    if upload.metadata.is_empty() {
        None
    } else {
        Some(
            upload
                .metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// Stream `path` through MD5, counting bytes as we go.
pub async fn checksum_file(path: &Path) -> DeployResult<ObjectChecksum> {
    let file = File::open(path).await.map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            DeployError::MissingFile(path.to_path_buf())
        } else {
            DeployError::Io(err)
        }
    })?;

    let mut stream = ReaderStream::new(file);
    let mut digest = Context::new();
    let mut size_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        size_bytes += chunk.len() as u64;
        digest.consume(&chunk);
    }

    let digest = digest.compute();
    Ok(ObjectChecksum {
        md5_hex: format!("{:x}", digest),
        md5_base64: general_purpose::STANDARD.encode(digest.0),
        size_bytes,
    })
}

fn check_etag(upload: &ObjectUpload, checksum: &ObjectChecksum, stored: &StoredObject) {
    if let Some(version) = &stored.version_id {
        debug!(key = %upload.key, version = %version, "stored object version");
    }

    match stored.etag_unquoted() {
        Some(etag) if etag.eq_ignore_ascii_case(&checksum.md5_hex) => {
            debug!(key = %upload.key, etag, "etag matches local digest");
        }
        Some(etag) => warn!(
            key = %upload.key,
            etag,
            md5 = %checksum.md5_hex,
            "etag differs from local digest"
        ),
        None => debug!(key = %upload.key, "no etag returned"),
    }
}

/// Upload one file.
///
/// A rejection by the store is logged and returned as `Ok(false)`; local
/// failures (missing file, I/O) propagate.
pub async fn upload_file<S: ObjectStore>(
    store: &S,
    bucket: &str,
    upload: &ObjectUpload,
) -> DeployResult<bool> {
    info!("Uploading {}", upload.key);
    let checksum = checksum_file(&upload.path).await?;
    debug!(
        key = %upload.key,
        size = checksum.size_bytes,
        md5 = %checksum.md5_hex,
        "checksummed upload body"
    );

    match store.put_object(bucket, upload, &checksum).await {
        Ok(stored) => {
            check_etag(upload, &checksum, &stored);
            Ok(true)
        }
        Err(err @ DeployError::Storage { .. }) => {
            error!(key = %upload.key, bucket, "upload failed: {}", err);
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// Upload every file in order, one at a time, regardless of earlier
/// rejections by the store.
pub async fn upload_all<S: ObjectStore>(
    store: &S,
    bucket: &str,
    uploads: &[ObjectUpload],
) -> DeployResult<Vec<UploadOutcome>> {
    let mut outcomes = Vec::with_capacity(uploads.len());
    for upload in uploads {
        let uploaded = upload_file(store, bucket, upload).await?;
        info!(key = %upload.key, uploaded, "upload finished");
        outcomes.push(UploadOutcome {
            key: upload.key.clone(),
            uploaded,
        });
    }
    Ok(outcomes)
}
