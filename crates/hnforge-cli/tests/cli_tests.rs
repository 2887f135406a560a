//! Command-level tests: argument parsing through to files on disk.
//!
//! Tenet: every subcommand runs against a temp layer library and a
//! filesystem store, never the network.

use hnforge_cli::{cli, commands};
use hnforge_test_utils::write_layer_library;
use hnforge_traits::Series;
use std::path::Path;

fn write_config(dir: &Path, assets: &Path, out: &Path) -> std::path::PathBuf {
    let path = dir.join("hnforge.toml");
    let text = format!(
        r#"
[collection]
series = "two"

[render]
asset_root = {assets:?}
format = "png"

[scheduler]
concurrency = 2
checkpoint_dir = {checkpoints:?}

[store]
kind = "fs"
root = {out:?}
public_base_url = "https://cdn.example.com"
"#,
        checkpoints = dir.join("checkpoints"),
    );
    std::fs::write(&path, text).unwrap();
    path
}

async fn run(args: &[&str]) -> anyhow::Result<std::process::ExitCode> {
    let matches = cli::command().try_get_matches_from(args).unwrap();
    commands::run(&matches).await
}

#[tokio::test]
async fn test_render_writes_one_file_per_level() {
    let dir = tempfile::tempdir().unwrap();
    let assets = dir.path().join("assets");
    let out = dir.path().join("rendered");
    write_layer_library(&assets, Series::Two, [42], 5);
    let config = write_config(dir.path(), &assets, &dir.path().join("store"));

    run(&[
        "hnforge",
        "render",
        "--config",
        config.to_str().unwrap(),
        "--id",
        "42",
        "--out",
        out.to_str().unwrap(),
    ])
    .await
    .unwrap();

    for level in 1..=5 {
        let bytes = std::fs::read(out.join(format!("hashland-nft-42-{level}.png"))).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}

#[tokio::test]
async fn test_render_single_level() {
    let dir = tempfile::tempdir().unwrap();
    let assets = dir.path().join("assets");
    let out = dir.path().join("rendered");
    write_layer_library(&assets, Series::Two, [7], 5);
    let config = write_config(dir.path(), &assets, &dir.path().join("store"));

    run(&[
        "hnforge",
        "render",
        "-c",
        config.to_str().unwrap(),
        "--id",
        "7",
        "--level",
        "3",
        "--out",
        out.to_str().unwrap(),
    ])
    .await
    .unwrap();

    let written: Vec<_> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(written, vec!["hashland-nft-7-3.png".to_string()]);
}

#[tokio::test]
async fn test_render_without_layers_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &dir.path().join("empty"), &dir.path().join("store"));

    let err = run(&[
        "hnforge",
        "render",
        "--config",
        config.to_str().unwrap(),
        "--id",
        "1",
        "--out",
        dir.path().join("rendered").to_str().unwrap(),
    ])
    .await
    .unwrap_err();
    assert!(format!("{err:#}").contains("rendering #1 level 1"));
}

#[tokio::test]
async fn test_backfill_uploads_and_checkpoints() {
    let dir = tempfile::tempdir().unwrap();
    let assets = dir.path().join("assets");
    let store = dir.path().join("store");
    write_layer_library(&assets, Series::Two, 40..42, 5);
    let config = write_config(dir.path(), &assets, &store);

    run(&[
        "hnforge",
        "backfill",
        "--config",
        config.to_str().unwrap(),
        "--from",
        "40",
        "--to",
        "42",
    ])
    .await
    .unwrap();

    for id in 40..42 {
        for level in 1..=5 {
            assert!(store.join(format!("images/hashland-nft-{id}-{level}.png")).is_file());
            assert!(store.join(format!("metadata/hashland-nft-{id}-{level}.json")).is_file());
        }
    }

    let record: serde_json::Value = serde_json::from_slice(
        &std::fs::read(dir.path().join("checkpoints/backfill-40-42.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(record["pending"], serde_json::json!([]));
}

fn checkpoint_pending(dir: &Path, name: &str) -> serde_json::Value {
    let record: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.join("checkpoints").join(name)).unwrap()).unwrap();
    record["pending"].clone()
}

#[tokio::test]
async fn test_backfill_restart_resumes_pending_ids() {
    let dir = tempfile::tempdir().unwrap();
    let assets = dir.path().join("assets");
    let store = dir.path().join("store");
    write_layer_library(&assets, Series::Two, 40..44, 5);
    let config = write_config(dir.path(), &assets, &store);
    let args = [
        "hnforge",
        "backfill",
        "--config",
        config.to_str().unwrap(),
        "--from",
        "40",
        "--to",
        "44",
    ];

    // a directory where #43's first image belongs makes its upload fail
    let blocked = store.join("images/hashland-nft-43-1.png");
    std::fs::create_dir_all(blocked.join("occupied")).unwrap();

    run(&args).await.unwrap();
    assert_eq!(checkpoint_pending(dir.path(), "backfill-40-44.json"), serde_json::json!([43]));

    std::fs::remove_dir_all(&blocked).unwrap();
    let finished = store.join("images/hashland-nft-40-1.png");
    std::fs::remove_file(&finished).unwrap();

    run(&args).await.unwrap();

    assert!(blocked.is_file());
    assert!(store.join("metadata/hashland-nft-43-5.json").is_file());
    // #40 completed in the first run and is not dispatched again
    assert!(!finished.exists());
    assert_eq!(checkpoint_pending(dir.path(), "backfill-40-44.json"), serde_json::json!([]));
}

#[tokio::test]
async fn test_backfill_rejects_inverted_range() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &dir.path().join("a"), &dir.path().join("s"));

    let err = run(&[
        "hnforge",
        "backfill",
        "--config",
        config.to_str().unwrap(),
        "--from",
        "9",
        "--to",
        "3",
    ])
    .await
    .unwrap_err();
    assert!(err.to_string().contains("must not be below"));
}

#[tokio::test]
async fn test_watch_requires_rpc_settings() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &dir.path().join("a"), &dir.path().join("s"));

    let err = run(&["hnforge", "watch", "--config", config.to_str().unwrap()])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("source.rpc_url"));
}
