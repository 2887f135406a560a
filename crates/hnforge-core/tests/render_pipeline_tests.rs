//! Full pipeline over a real layer library and a filesystem store.

use hnforge_core::{
    BackfillOptions, BatchScheduler, EntityPipeline, FsStore, IdRange, MemoryCheckpoint,
    ForgeConfig, StoreConfig, StoreKind,
};
use hnforge_metadata::{AttributeValue, DynamicAttributes, MetadataAssembler, MetadataDocument};
use hnforge_render::{AssetLayout, Compositor, RasterBackend};
use hnforge_test_utils::{write_layer_library, FakeSource, LAYER_SIZE};
use hnforge_traits::Series;
use std::sync::Arc;

#[tokio::test]
async fn test_backfill_writes_decodable_images_and_documents() {
    let assets = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_layer_library(assets.path(), Series::Two, 40..43, 5);

    let config = ForgeConfig::default()
        .with_asset_root(assets.path())
        .with_store(StoreConfig {
            kind: StoreKind::Fs,
            root: out.path().to_path_buf(),
            public_base_url: Some("https://cdn.example.com".into()),
            ..StoreConfig::default()
        });
    config.validate().unwrap();

    let source = Arc::new(FakeSource::new());
    source.set(41, DynamicAttributes::new(120_005, 7));
    let compositor = Compositor::new(
        AssetLayout::new(&config.render.asset_root, config.collection.series),
        RasterBackend::new(config.render.cache_capacity),
    )
    .with_encoding(config.render.encoding());

    let pipeline = EntityPipeline::new(
        Arc::new(compositor),
        MetadataAssembler::new(config.series_profile(), config.image_base_url()),
        source,
        Arc::new(FsStore::new(out.path()).with_base_url("https://cdn.example.com")),
        config.asset_paths(),
    );
    let report = BatchScheduler::new(Arc::new(pipeline), Arc::new(MemoryCheckpoint::new()))
        .with_options(BackfillOptions {
            concurrency: 2,
            ..BackfillOptions::default()
        })
        .run_backfill(IdRange::new(40, 43))
        .await
        .unwrap();
    assert!(report.is_complete(), "pending: {:?}", report.pending);

    for id in 40..43 {
        for level in 1..=5 {
            let image = std::fs::read(out.path().join(format!("images/hashland-nft-{id}-{level}.png"))).unwrap();
            let decoded = image::load_from_memory(&image).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (LAYER_SIZE, LAYER_SIZE));
        }
    }

    let doc: MetadataDocument = serde_json::from_slice(
        &std::fs::read(out.path().join("metadata/hashland-nft-41-2.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(doc.name, "HashLand NFT #41");
    assert!(doc
        .image
        .starts_with("https://cdn.example.com/images/hashland-nft-41-2.png?image_process="));
    assert_eq!(doc.attribute("Level"), Some(&AttributeValue::Number(2)));
    assert_eq!(doc.attribute("HC_Hashrate"), Some(&AttributeValue::from("12.0005")));
    assert_eq!(doc.attribute("BTC_Hashrate"), Some(&AttributeValue::from("0.0007")));
}
