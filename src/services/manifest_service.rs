//! Sitemap generation.
//!
//! The sitemap has a single `<url>` entry for the site root; only the
//! `<lastmod>` timestamp changes between deploys.

use crate::{errors::DeployResult, models::artifact::SITEMAP_FILE_NAME};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};
use tracing::info;
use uuid::Uuid;

/// ISO 8601 with second precision and a literal `Z`.
pub const LASTMOD_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn format_lastmod(at: DateTime<Utc>) -> String {
    at.format(LASTMOD_FORMAT).to_string()
}

pub fn render_sitemap(site_url: &str, at: DateTime<Utc>) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
    <url>
        <loc>{}</loc>
        <lastmod>{}</lastmod>
        <priority>1.0</priority>
    </url>
</urlset>
"#,
        xml_escape(site_url),
        format_lastmod(at)
    )
}

/// Write `sitemap.xml` into `dir`.
///
/// Goes through a temp file and a rename so a reader never sees a partial file.
pub async fn write_sitemap(dir: &Path, site_url: &str, at: DateTime<Utc>) -> DeployResult<PathBuf> {
    let final_path = dir.join(SITEMAP_FILE_NAME);
    let tmp_path = dir.join(format!(".tmp-{}", Uuid::new_v4()));
    let body = render_sitemap(site_url, at);

    let result = async {
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(body.as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await?;
        fs::rename(&tmp_path, &final_path).await
    }
    .await;

    if let Err(err) = result {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(err.into());
    }

    info!(lastmod = %format_lastmod(at), "Generated {}", final_path.display());
    Ok(final_path)
}

fn xml_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
