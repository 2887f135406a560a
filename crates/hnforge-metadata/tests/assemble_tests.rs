use hnforge_metadata::{
    Attribute, AttributeValue, DynamicAttributes, MetadataAssembler, MetadataDocument, SeriesProfile,
};
use hnforge_traits::{EntityId, HeroClass, Level, Series};
use pretty_assertions::assert_eq;

fn series_two() -> MetadataAssembler {
    MetadataAssembler::new(
        SeriesProfile::for_series(Series::Two),
        "https://cdn.hashland.com/nft/images",
    )
}

#[test]
fn test_series_two_document() {
    let doc = series_two().assemble(
        EntityId::new(60_042),
        Level::new(3).unwrap(),
        HeroClass::Hex,
        &DynamicAttributes::new(12_345, 20_000),
    );

    let expected = MetadataDocument {
        name: "HashLand NFT #60042".into(),
        description: SeriesProfile::for_series(Series::Two).description,
        image: "https://cdn.hashland.com/nft/images/hashland-nft-60042-3.png?image_process=watermark,text_MS4yMzQ1,type_enpnZnhpbmd5YW4,color_ffffff,size_24,g_nw,x_395,y_79".into(),
        attributes: vec![
            Attribute::new("Ip", "Hash Warfare"),
            Attribute::new("Series", "Series 2"),
            Attribute::new("Level", 3u64),
            Attribute::new("Class", "Hex"),
            Attribute::new("Hero", "Mila"),
            Attribute::new("HC_Hashrate", "1.2345"),
            Attribute::new("BTC_Hashrate", "2.0000"),
        ],
    };
    assert_eq!(doc, expected);
}

#[test]
fn test_ultra_adds_badge_and_boolean_trait() {
    let doc = series_two().assemble(
        EntityId::new(1),
        Level::MAX,
        HeroClass::Blade,
        &DynamicAttributes::new(0, 0).with_ultra(true),
    );
    assert_eq!(doc.attribute("Ultra"), Some(&AttributeValue::Bool(true)));
    assert!(doc.image.contains("/watermark,image_"));
    assert_eq!(doc.attributes.len(), 8);
}

#[test]
fn test_identical_inputs_give_identical_bytes() {
    let assembler = series_two();
    let dynamic = DynamicAttributes::new(99_999, 1).with_ultra(true);
    let a = assembler
        .assemble(EntityId::new(5), Level::MIN, HeroClass::Holy, &dynamic)
        .to_json_bytes()
        .unwrap();
    let b = assembler
        .assemble(EntityId::new(5), Level::MIN, HeroClass::Holy, &dynamic)
        .to_json_bytes()
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_changed_live_scores_change_document() {
    let assembler = series_two();
    let before = assembler.assemble(
        EntityId::new(5),
        Level::MIN,
        HeroClass::Holy,
        &DynamicAttributes::new(10_000, 0),
    );
    let after = assembler.assemble(
        EntityId::new(5),
        Level::MIN,
        HeroClass::Holy,
        &DynamicAttributes::new(20_000, 0),
    );
    assert_ne!(before, after);
    assert_eq!(before.name, after.name);
}

#[test]
fn test_basic_series_has_no_live_traits() {
    let assembler = MetadataAssembler::new(
        SeriesProfile::for_series(Series::Basic),
        "https://cdn.hashland.com/nft/images",
    );
    let doc = assembler.assemble(
        EntityId::new(12),
        Level::new(2).unwrap(),
        HeroClass::Cavalryman,
        &DynamicAttributes::new(50_000, 50_000).with_ultra(true),
    );

    assert_eq!(doc.name, "Hashland NFT #12");
    assert_eq!(doc.image, "https://cdn.hashland.com/nft/images/hashland-nft-12-2.png");
    let keys: Vec<&str> = doc.attributes.iter().map(|a| a.trait_type.as_str()).collect();
    assert_eq!(keys, vec!["Ip", "Series", "Level", "Class", "Hero"]);
    assert_eq!(doc.attribute("Series"), Some(&AttributeValue::from("Basic")));
}

#[test]
fn test_live_name_replaces_prefix_but_keeps_id() {
    let doc = series_two().assemble(
        EntityId::new(77),
        Level::MIN,
        HeroClass::Holy,
        &DynamicAttributes::new(0, 0).with_name("Katniss the Bold"),
    );
    assert_eq!(doc.name, "Katniss the Bold #77");

    let blank = series_two().assemble(
        EntityId::new(77),
        Level::MIN,
        HeroClass::Holy,
        &DynamicAttributes::new(0, 0).with_name("  "),
    );
    assert_eq!(blank.name, "HashLand NFT #77");
}
