//! Wiring from [`ForgeConfig`] to running components

use anyhow::{bail, Context, Result};
use hnforge_core::{
    AssetStore, AttributeSource, Checkpoint, EntityPipeline, FileCheckpoint, ForgeConfig,
    FsStore, HttpStore, MemoryStore, NullSource, RpcAttributeSource, RpcClient,
    RpcEventPoller, StopSignal, StoreKind,
};
use hnforge_metadata::MetadataAssembler;
use hnforge_render::{AssetLayout, Compositor, RasterBackend};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber; `RUST_LOG` overrides the `info` default
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

/// Load `path`, or defaults when absent
///
/// # Errors
/// Unreadable or invalid configuration
pub fn load_config(path: Option<&Path>) -> Result<ForgeConfig> {
    match path {
        Some(path) => ForgeConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(ForgeConfig::default()),
    }
}

/// Object store selected by `[store]`
///
/// # Errors
/// Missing token variable
pub fn build_store(config: &ForgeConfig) -> Result<Arc<dyn AssetStore>> {
    let store = &config.store;
    let base = store.serving_base_url();
    Ok(match store.kind {
        StoreKind::Memory => Arc::new(MemoryStore::with_base_url(base)),
        StoreKind::Fs => Arc::new(FsStore::new(&store.root).with_base_url(base)),
        StoreKind::Http => {
            let Some(endpoint) = store.endpoint.clone() else {
                bail!("store.endpoint is required for the http store");
            };
            let http = HttpStore::new(endpoint, base);
            match store.token().context("reading store token")? {
                Some(token) => Arc::new(http.with_token(token)),
                None => Arc::new(http),
            }
        }
    })
}

fn rpc_client(config: &ForgeConfig) -> Option<(RpcClient, hnforge_core::Address)> {
    let source = &config.source;
    Some((RpcClient::new(source.rpc_url.clone()?), source.contract?))
}

/// Attribute source selected by `[source]`; zero attributes without an endpoint
#[must_use]
pub fn build_source(config: &ForgeConfig) -> Arc<dyn AttributeSource> {
    match rpc_client(config) {
        Some((client, contract)) => Arc::new(
            RpcAttributeSource::new(client, contract).with_calls(config.source.calls.clone()),
        ),
        None => {
            tracing::warn!("no rpc_url/contract configured, live attributes read as zero");
            Arc::new(NullSource)
        }
    }
}

/// Log poller for `watch`
///
/// # Errors
/// Missing `source.rpc_url` or `source.contract`
pub fn build_poller(config: &ForgeConfig) -> Result<RpcEventPoller> {
    let Some((client, contract)) = rpc_client(config) else {
        bail!("watch needs source.rpc_url and source.contract");
    };
    let source = &config.source;
    let poller = RpcEventPoller::new(client, contract, source.events.clone())
        .with_interval(source.poll_interval())
        .with_max_span(source.max_block_span);
    Ok(match source.start_block {
        Some(block) => poller.starting_at(block),
        None => poller,
    })
}

/// Compositor over the configured layer library
#[must_use]
pub fn build_compositor(config: &ForgeConfig) -> Compositor {
    Compositor::new(
        AssetLayout::new(&config.render.asset_root, config.collection.series),
        RasterBackend::new(config.render.cache_capacity),
    )
    .with_encoding(config.render.encoding())
}

/// Full entity pipeline
///
/// # Errors
/// Store construction failures
pub fn build_pipeline(config: &ForgeConfig) -> Result<EntityPipeline> {
    Ok(EntityPipeline::new(
        Arc::new(build_compositor(config)),
        MetadataAssembler::new(config.series_profile(), config.image_base_url())
            .with_image_extension(config.collection.image_extension.clone()),
        build_source(config),
        build_store(config)?,
        config.asset_paths(),
    )
    .with_max_level(config.collection.max_level))
}

/// File checkpoint under `scheduler.checkpoint_dir`
#[must_use]
pub fn build_checkpoint(config: &ForgeConfig) -> Arc<dyn Checkpoint> {
    Arc::new(FileCheckpoint::new(&config.scheduler.checkpoint_dir))
}

/// Stop signal raised on Ctrl-C
#[must_use]
pub fn stop_on_ctrl_c() -> StopSignal {
    let stop = StopSignal::new();
    let handle = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, finishing in-flight work");
            handle.stop();
        }
    });
    stop
}

#[cfg(test)]
mod tests {
    use super::*;
    use hnforge_core::{IdRange, StoreConfig, WorkSet};
    use hnforge_traits::EntityId;

    #[test]
    fn missing_config_path_is_an_error_with_context() {
        let err = load_config(Some(Path::new("/nope/hnforge.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nope/hnforge.toml"));
        assert_eq!(load_config(None).unwrap(), ForgeConfig::default());
    }

    #[test]
    fn http_store_requires_its_token_variable() {
        let config = ForgeConfig::default().with_store(StoreConfig {
            kind: StoreKind::Http,
            endpoint: Some("https://upload.example.com".into()),
            public_base_url: Some("https://cdn.example.com".into()),
            token_env: Some("HNFORGE_CLI_TEST_TOKEN_UNSET".into()),
            ..StoreConfig::default()
        });
        assert!(build_store(&config).is_err());
    }

    #[test]
    fn poller_needs_endpoint_and_contract() {
        assert!(build_poller(&ForgeConfig::default()).is_err());

        let mut config = ForgeConfig::default();
        config.source.rpc_url = Some("http://127.0.0.1:8545".into());
        config.source.contract = Some("0x1111111111111111111111111111111111111111".parse().unwrap());
        config.source.start_block = Some(7);
        assert_eq!(build_poller(&config).unwrap().next_block(), Some(7));
    }

    #[tokio::test]
    async fn checkpoint_outlives_the_process_that_wrote_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ForgeConfig::default();
        config.scheduler.checkpoint_dir = dir.path().join("state");

        let range = IdRange::new(0, 10);
        let mut work = WorkSet::seeded(range);
        for id in 0..9 {
            work.complete(EntityId::new(id));
        }
        build_checkpoint(&config).save(&work).await.unwrap();

        let loaded = build_checkpoint(&config).load(range).await.unwrap().unwrap();
        assert_eq!(loaded.pending().iter().copied().collect::<Vec<_>>(), vec![EntityId::new(9)]);
    }
}
