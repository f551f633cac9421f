//! Static asset sync and cache invalidation

use std::path::PathBuf;

use chrono::Utc;
use cloud_api::models::storage::CreateInvalidationRequest;
use tracing::{debug, info};

use crate::cloud::objects::PutObjectOptions;
use crate::cloud::CloudApi;
use crate::errors::SkyliftError;
use crate::filesys::dir::Dir;
use crate::filesys::file::File;
use crate::ops::DeploymentRun;
use crate::storage::settings::AssetSpec;
use crate::utils::generate_uuid;

/// Sync the source tree's static files for every machine that wants it.
///
/// Uploads go to the machine's configured bucket; invalidation submits
/// every walked path against the machine's distribution in one batch.
pub async fn sync_env(
    cloud: &dyn CloudApi,
    run: &DeploymentRun,
    upload: bool,
    invalidate: bool,
) -> Result<(), SkyliftError> {
    let static_dir = Dir::new(run.source.join("static"));

    for machine in &run.machines {
        if upload {
            if let Some(spec) = &machine.assets {
                upload_assets(cloud, &static_dir, spec).await?;
            }
        }

        if invalidate {
            if let Some(cdn) = &machine.cdn {
                let prefix = machine.assets.as_ref().and_then(|spec| spec.prefix.as_deref());
                invalidate_distribution(cloud, &static_dir, &cdn.distribution, prefix).await?;
            }
        }
    }

    Ok(())
}

async fn upload_assets(
    cloud: &dyn CloudApi,
    static_dir: &Dir,
    spec: &AssetSpec,
) -> Result<(), SkyliftError> {
    cloud.ensure_bucket(&spec.bucket).await?;
    cloud.set_bucket_public(&spec.bucket).await?;

    let entries = static_files(static_dir).await?;
    let total = entries.len();
    let max_age = u64::from(spec.expires_days) * 86_400;
    let expires = (Utc::now() + chrono::Duration::days(i64::from(spec.expires_days)))
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string();

    for (index, (path, key)) in entries.iter().enumerate() {
        let object_key = prefixed(spec.prefix.as_deref(), key);
        let body = File::new(path).read_bytes().await?;

        let options = PutObjectOptions {
            content_type: content_type(key).to_string(),
            cache_control: format!("max-age={}", max_age),
            expires: expires.clone(),
            content_encoding: key.ends_with(".gz").then(|| "gzip".to_string()),
        };
        cloud
            .put_object(&spec.bucket, &object_key, body, &options)
            .await?;
        info!("[{}/{}] {}", index + 1, total, object_key);
    }

    Ok(())
}

async fn invalidate_distribution(
    cloud: &dyn CloudApi,
    static_dir: &Dir,
    distribution: &str,
    prefix: Option<&str>,
) -> Result<(), SkyliftError> {
    let entries = static_files(static_dir).await?;
    if entries.is_empty() {
        debug!("Nothing to invalidate");
        return Ok(());
    }

    let paths: Vec<String> = entries
        .iter()
        .map(|(_, key)| format!("/{}", prefixed(prefix, key)))
        .collect();
    let total = paths.len();

    let request = CreateInvalidationRequest {
        paths,
        caller_reference: generate_uuid(),
    };
    let invalidation = cloud.create_invalidation(distribution, &request).await?;
    info!(
        "Invalidation {} submitted for {} paths",
        invalidation.id, total
    );

    Ok(())
}

/// Walk the static dir, pairing each file with its bucket key
async fn static_files(static_dir: &Dir) -> Result<Vec<(PathBuf, String)>, SkyliftError> {
    if !static_dir.exists().await {
        return Err(SkyliftError::ConfigError(format!(
            "no static directory at {}",
            static_dir.path().display()
        )));
    }

    let mut entries = Vec::new();
    for path in static_dir.walk_files().await? {
        let key = path
            .strip_prefix(static_dir.path())
            .map_err(|_| {
                SkyliftError::Internal(format!(
                    "walked outside {}",
                    static_dir.path().display()
                ))
            })?
            .to_string_lossy()
            .into_owned();
        entries.push((path, key));
    }

    Ok(entries)
}

fn prefixed(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), key),
        None => key.to_string(),
    }
}

/// Content type by file extension; gzipped files report the type of
/// the extension underneath.
fn content_type(name: &str) -> &'static str {
    let base = name.strip_suffix(".gz").unwrap_or(name);
    match base.rsplit_once('.').map(|(_, extension)| extension) {
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("html" | "htm") => "text/html",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_table() {
        assert_eq!(content_type("app.css"), "text/css");
        assert_eq!(content_type("app.js"), "application/javascript");
        assert_eq!(content_type("index.html"), "text/html");
        assert_eq!(content_type("logo.png"), "image/png");
        assert_eq!(content_type("README"), "application/octet-stream");
    }

    #[test]
    fn test_content_type_sees_through_gzip() {
        assert_eq!(content_type("app.css.gz"), "text/css");
        assert_eq!(content_type("bundle.js.gz"), "application/javascript");
    }

    #[test]
    fn test_prefixed_keys() {
        assert_eq!(prefixed(None, "css/app.css"), "css/app.css");
        assert_eq!(prefixed(Some("site"), "css/app.css"), "site/css/app.css");
        assert_eq!(prefixed(Some("site/"), "css/app.css"), "site/css/app.css");
    }
}
