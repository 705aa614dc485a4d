//! Disk blob store and configuration

use crate::common::*;
use loupe::{BlobStore, CacheState, DiskBlobStore, Strategy, CONFIG_FILE_NAME};
use loupe_storage::format::SnapshotView;
use tempfile::TempDir;

#[test]
fn test_snapshot_survives_reopen_of_store() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "blob_dir = \"blobs\"\n",
    )
    .unwrap();

    let mut loupe = Loupe::open(dir.path()).unwrap();
    loupe.add(&Batch::new(&[(1, &[1, 2]), (2, &[3])]).groups()).unwrap();
    let blob = loupe.enable_cache(CategoryId::DEFAULT).unwrap();
    let expected = loupe.read(CategoryId::DEFAULT).unwrap();
    drop(loupe);

    let store = DiskBlobStore::open(dir.path().join("blobs")).unwrap();
    assert_eq!(store.list().unwrap(), vec![blob]);
    let bytes = store.read(&blob).unwrap();
    let view = SnapshotView::parse(&bytes).unwrap();
    assert_eq!(Enumeration::from_view(&view), expected);
}

#[test]
fn test_corrupted_blob_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = LoupeConfig {
        blob_dir: Some(dir.path().join("blobs")),
        ..LoupeConfig::default()
    };
    let mut loupe = Loupe::from_config(config).unwrap();
    loupe.add(&Batch::new(&[(1, &[1])]).groups()).unwrap();
    let blob = loupe.enable_cache(CategoryId::DEFAULT).unwrap();

    let path = loupe_storage::disk::blob_path(&dir.path().join("blobs"), &blob);
    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    std::fs::write(&path, bytes).unwrap();

    assert!(matches!(
        loupe.read(CategoryId::DEFAULT),
        Err(Error::Corruption(_))
    ));
    // the mode does not silently change
    assert!(matches!(
        loupe.cache_state(CategoryId::DEFAULT),
        CacheState::Enabled { .. }
    ));
}

#[test]
fn test_blob_size_limit_forces_sharding() {
    let config = LoupeConfig {
        max_blob_size: 16 + 24 + 4 * 4,
        ..LoupeConfig::default()
    };
    let mut loupe = Loupe::from_config(config).unwrap();
    loupe
        .add(&Batch::new(&[(1, &[1, 2, 3, 4, 5, 6])]).in_category(CategoryId(1)).groups())
        .unwrap();
    assert!(matches!(
        loupe.enable_cache(CategoryId(1)),
        Err(Error::BlobTooLarge { .. })
    ));

    // split across two categories, each fits
    let mut loupe = Loupe::from_config(LoupeConfig {
        max_blob_size: 16 + 24 + 4 * 4,
        ..LoupeConfig::default()
    })
    .unwrap();
    loupe
        .add(&Batch::new(&[(1, &[1, 2, 3])]).in_category(CategoryId(1)).groups())
        .unwrap();
    loupe
        .add(&Batch::new(&[(1, &[4, 5, 6])]).in_category(CategoryId(2)).groups())
        .unwrap();
    loupe.enable_cache(CategoryId(1)).unwrap();
    loupe.enable_cache(CategoryId(2)).unwrap();
}

#[test]
fn test_open_twice_keeps_edited_config() {
    let dir = TempDir::new().unwrap();
    Loupe::open(dir.path()).unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    let mut config = LoupeConfig::from_file(&path).unwrap();
    config.strategy = "bitmap".to_string();
    config.write_to_file(&path).unwrap();

    let loupe = Loupe::open(dir.path()).unwrap();
    assert_eq!(loupe.cache().strategy(), Strategy::Bitmap);
}
