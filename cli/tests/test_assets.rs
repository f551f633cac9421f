//! Asset sync and invalidation tests

mod common;

use std::path::Path;

use common::{add_static_files, machine, source_fixture, FakeCloud};
use skylift::errors::SkyliftError;
use skylift::ops::assets::sync_env;
use skylift::ops::DeploymentRun;
use skylift::storage::settings::Machine;

fn asset_machine() -> Machine {
    serde_json::from_value(serde_json::json!({
        "base": "ami-1aad5273",
        "key_pair": "ec2.example",
        "name": "web",
        "assets": { "bucket": "site-assets", "prefix": "site" },
        "cdn": { "distribution": "dist-1" }
    }))
    .expect("machine")
}

fn run_for(source: &Path, machines: Vec<Machine>) -> DeploymentRun {
    DeploymentRun {
        env: "default".to_string(),
        source: source.to_path_buf(),
        machines,
    }
}

fn seed_static(source: &Path) {
    add_static_files(
        source,
        &[
            ("css/app.css", "body { color: #000 }"),
            ("js/bundle.js.gz", "gzipped"),
            ("index.html", "<html></html>"),
        ],
    );
}

#[tokio::test]
async fn test_upload_sets_headers_per_file() {
    let source = source_fixture();
    seed_static(source.path());

    let cloud = FakeCloud::new();
    let run = run_for(source.path(), vec![asset_machine()]);

    sync_env(&cloud, &run, true, false).await.expect("sync");

    // The bucket is readied before anything lands in it
    let calls = cloud.calls();
    assert_eq!(calls[0], "ensure_bucket site-assets");
    assert_eq!(calls[1], "set_bucket_public site-assets");

    let mut uploads = cloud.uploads.lock().unwrap().clone();
    uploads.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(uploads.len(), 3);

    let (key, options) = &uploads[0];
    assert_eq!(key, "site/css/app.css");
    assert_eq!(options.content_type, "text/css");
    assert_eq!(options.content_encoding, None);

    let (key, options) = &uploads[1];
    assert_eq!(key, "site/index.html");
    assert_eq!(options.content_type, "text/html");
    assert_eq!(options.content_encoding, None);

    let (key, options) = &uploads[2];
    assert_eq!(key, "site/js/bundle.js.gz");
    assert_eq!(options.content_type, "application/javascript");
    assert_eq!(options.content_encoding.as_deref(), Some("gzip"));

    for (_, options) in &uploads {
        assert_eq!(options.cache_control, "max-age=31536000");
        assert!(options.expires.ends_with("GMT"));
    }

    assert!(cloud.invalidations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalidation_batches_every_path() {
    let source = source_fixture();
    seed_static(source.path());

    let cloud = FakeCloud::new();
    let run = run_for(source.path(), vec![asset_machine()]);

    sync_env(&cloud, &run, false, true).await.expect("sync");

    assert!(cloud.uploads.lock().unwrap().is_empty());
    assert!(!cloud.calls().iter().any(|call| call.starts_with("ensure_bucket")));

    let invalidations = cloud.invalidations.lock().unwrap();
    assert_eq!(invalidations.len(), 1);

    let mut paths = invalidations[0].paths.clone();
    paths.sort();
    assert_eq!(
        paths,
        vec![
            "/site/css/app.css".to_string(),
            "/site/index.html".to_string(),
            "/site/js/bundle.js.gz".to_string(),
        ]
    );
    assert!(!invalidations[0].caller_reference.is_empty());
}

#[tokio::test]
async fn test_sync_flags_off_touch_nothing() {
    let source = source_fixture();

    let cloud = FakeCloud::new();
    let run = run_for(source.path(), vec![asset_machine()]);

    sync_env(&cloud, &run, false, false).await.expect("sync");
    assert!(cloud.calls().is_empty());
}

#[tokio::test]
async fn test_missing_static_dir_fails() {
    let source = source_fixture();

    let cloud = FakeCloud::new();
    let run = run_for(source.path(), vec![asset_machine()]);

    let result = sync_env(&cloud, &run, true, false).await;
    match result {
        Err(SkyliftError::ConfigError(message)) => assert!(message.contains("static")),
        other => panic!("expected ConfigError, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_machines_without_assets_are_skipped() {
    let source = source_fixture();

    let cloud = FakeCloud::new();
    let run = run_for(source.path(), vec![machine("web")]);

    sync_env(&cloud, &run, true, true).await.expect("sync");
    assert!(cloud.calls().is_empty());
}
