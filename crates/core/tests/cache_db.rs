// crates/core/tests/cache_db.rs

use rompatch_core::db::{
    CacheDb, CachedImage, DbError, ImageCache, SaveEntry, WorkspaceLayout, SOURCE_ROM_KEY,
};
use rompatch_core::Image;
use rusqlite::Connection;
use tempfile::tempdir;

#[test]
fn image_round_trip_and_miss() {
    let db = CacheDb::open_in_memory().expect("open in-memory cache");
    assert!(db.load(SOURCE_ROM_KEY).expect("load").is_none(), "empty cache is a miss, not an error");

    let image = Image::from(vec![1, 2, 3, 4]);
    db.store(SOURCE_ROM_KEY, &CachedImage::new("pmd.nds", image.clone())).expect("store");

    let loaded = db.load(SOURCE_ROM_KEY).expect("load").expect("hit");
    assert_eq!(loaded.name, "pmd.nds");
    assert_eq!(loaded.image, image);
    assert!(!loaded.stored_at.is_empty());

    let listing = db.list_images().expect("list");
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].len, 4);
    assert_eq!(listing[0].digest, image.digest().to_string());

    assert!(db.remove(SOURCE_ROM_KEY).expect("remove"));
    assert!(!db.remove(SOURCE_ROM_KEY).expect("remove again"));
    assert!(db.load(SOURCE_ROM_KEY).expect("load").is_none());
}

#[test]
fn storing_again_replaces_the_entry() {
    let db = CacheDb::open_in_memory().expect("open");
    db.store("rom", &CachedImage::new("a.nds", Image::from(vec![1]))).unwrap();
    db.store("rom", &CachedImage::new("b.nds", Image::from(vec![2, 2]))).unwrap();

    let loaded = db.load("rom").unwrap().unwrap();
    assert_eq!(loaded.name, "b.nds");
    assert_eq!(loaded.image.as_bytes(), &[2, 2]);
    assert_eq!(db.list_images().unwrap().len(), 1);
}

#[test]
fn saves_are_stored_per_target() {
    let db = CacheDb::open_in_memory().expect("open");
    let entry = SaveEntry {
        target: "chip2".into(),
        name: "chip2.sav".into(),
        bytes: vec![0xAA; 32],
        stored_at: "2024-01-01T00:00:00+00:00".into(),
    };
    db.store_save(&entry).expect("store save");

    let loaded = db.load_save("chip2").expect("load save").expect("hit");
    assert_eq!(loaded, entry);
    assert!(db.load_save("blorg").expect("load save").is_none());

    let listed = db.list_saves().expect("list saves");
    assert_eq!(listed.len(), 1);
    assert!(listed[0].bytes.is_empty(), "listing omits payloads");

    assert_eq!(db.clear().expect("clear"), 1);
    assert!(db.list_saves().unwrap().is_empty());
}

#[test]
fn cache_persists_across_reopen() {
    let tmp = tempdir().expect("temp dir");
    let path = tmp.path().join("cache.db");
    {
        let db = CacheDb::open(&path).expect("open");
        db.store("rom", &CachedImage::new("pmd.nds", Image::from(vec![9; 10]))).unwrap();
    }
    let db = CacheDb::open(&path).expect("reopen");
    assert_eq!(db.load("rom").unwrap().unwrap().image.len(), 10);
}

#[test]
fn open_errors_on_unsupported_schema_version() {
    let tmp = tempdir().expect("temp dir");
    let layout = WorkspaceLayout::new(tmp.path());
    std::fs::create_dir_all(&layout.meta_dir).expect("create .rompatch dir");

    {
        let conn = Connection::open(&layout.cache_path).expect("open raw sqlite db");
        conn.pragma_update(None, "user_version", 99_i32).expect("set user_version pragma");
    }

    match CacheDb::open(&layout.cache_path) {
        Err(DbError::UnsupportedSchemaVersion { found, min_supported, max_supported }) => {
            assert_eq!(found, 99);
            assert_eq!(min_supported, 0);
            assert_eq!(max_supported, 2);
        }
        Err(err) => panic!("expected UnsupportedSchemaVersion error, got different DbError: {err}"),
        Ok(_) => panic!("expected UnsupportedSchemaVersion error, got Ok(_)"),
    }
}

#[test]
fn v1_database_is_migrated_to_add_saves() {
    let tmp = tempdir().expect("temp dir");
    let path = tmp.path().join("cache.db");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE images (key TEXT PRIMARY KEY, name TEXT NOT NULL, bytes BLOB NOT NULL,
             digest TEXT NOT NULL, stored_at TEXT NOT NULL);
             PRAGMA user_version = 1;",
        )
        .unwrap();
    }

    let db = CacheDb::open(&path).expect("open migrates");
    let version: i32 =
        db.connection().query_row("PRAGMA user_version;", [], |row| row.get(0)).unwrap();
    assert_eq!(version, 2);
    assert!(db.list_saves().unwrap().is_empty());
}
