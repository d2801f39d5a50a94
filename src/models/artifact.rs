//! Naming convention for everything the build produces and the deploy publishes.

use super::{profile::BuildProfile, upload::ObjectUpload};
use std::{collections::BTreeMap, path::Path};

pub const INDEX_HTML_FILE_NAME: &str = "index.html";
pub const QT_LOADER_JS_FILE_NAME: &str = "qtloader.js";
pub const SITEMAP_FILE_NAME: &str = "sitemap.xml";

const PUBLIC_READ_ACL: &str = "public-read";
const XML_CONTENT_TYPE: &str = "text/xml";
const JS_CONTENT_TYPE: &str = "application/javascript";
const WASM_CONTENT_TYPE: &str = "application/wasm";
const BROTLI_CONTENT_ENCODING: &str = "br";
const DECOMPRESSED_LENGTH_METADATA_KEY: &str = "decompressedcontentlength";

/// Support files copied verbatim from the source tree into the output directory.
pub const SUPPORT_FILES: [&str; 2] = [INDEX_HTML_FILE_NAME, QT_LOADER_JS_FILE_NAME];

/// File names of a single release, derived from the artifact base name and
/// the build profile.
///
/// The build tool emits `<name>.wasm` and `<name>.js`; the deploy publishes
/// them as `<name>.<suffix>.wasm` (brotli-compressed) and `<name>.<suffix>.js`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArtifacts {
    pub built_wasm: String,
    pub built_js: String,
    pub published_wasm: String,
    pub published_js: String,
}

impl ReleaseArtifacts {
    pub fn new(name: &str, profile: BuildProfile) -> Self {
        let suffix = profile.suffix();
        Self {
            built_wasm: format!("{}.wasm", name),
            built_js: format!("{}.js", name),
            published_wasm: format!("{}.{}.wasm", name, suffix),
            published_js: format!("{}.{}.js", name, suffix),
        }
    }

    /// The four put-object requests of a deploy, in upload order.
    ///
    /// `decompressed_len` is the size of the uncompressed binary and is
    /// attached to the compressed one as custom metadata.
    pub fn uploads(&self, output_dir: &Path, decompressed_len: u64) -> Vec<ObjectUpload> {
        let mut wasm_metadata = BTreeMap::new();
        wasm_metadata.insert(
            DECOMPRESSED_LENGTH_METADATA_KEY.to_string(),
            decompressed_len.to_string(),
        );

        vec![
            ObjectUpload::new(output_dir, SITEMAP_FILE_NAME, PUBLIC_READ_ACL, XML_CONTENT_TYPE),
            ObjectUpload::new(output_dir, QT_LOADER_JS_FILE_NAME, PUBLIC_READ_ACL, JS_CONTENT_TYPE),
            ObjectUpload::new(output_dir, &self.published_js, PUBLIC_READ_ACL, JS_CONTENT_TYPE),
            ObjectUpload::new(output_dir, &self.published_wasm, PUBLIC_READ_ACL, WASM_CONTENT_TYPE)
                .with_content_encoding(BROTLI_CONTENT_ENCODING)
                .with_metadata(wasm_metadata),
        ]
    }

    /// CDN paths refreshed after a deploy. Independent of upload results.
    pub fn invalidation_paths(&self) -> Vec<String> {
        [
            SITEMAP_FILE_NAME,
            self.published_wasm.as_str(),
            self.published_js.as_str(),
            QT_LOADER_JS_FILE_NAME,
        ]
        .iter()
        .map(|name| format!("/{}", name))
        .collect()
    }
}
