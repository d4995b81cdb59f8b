//! Integration tests for rank persistence.
//!
//! Saves and loads real files under the system temp directory.

use skirmish_core::{BodyRegion, WeaponStatEntry};
use skirmish_rank::format::{HEADER_SIZE, RANK_VERSION};
use skirmish_rank::{PointTable, RankError, RankSaver, RankStore, WeaponPoints};
use std::path::PathBuf;
use std::sync::Arc;

fn temp_rank_path(tag: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("skirmish_rank_{tag}_{nanos}.dat"))
}

fn life(kills: i32, deaths: i32, points: i32) -> WeaponStatEntry {
    let mut s = WeaponStatEntry {
        kills,
        deaths,
        points,
        shots: kills * 3,
        ..WeaponStatEntry::ZERO
    };
    for _ in 0..kills {
        s.add_hit(50, Some(BodyRegion::Chest));
    }
    s
}

fn populated(capacity: usize) -> RankStore {
    let mut store = RankStore::new(capacity, Arc::new(PointTable::default()));
    let roster = [
        ("Sarge", Some("STEAM_0:0:1"), life(4, 1, 8)),
        ("Private", None, life(1, 3, 2)),
        ("Medic", None, life(2, 2, 8)),
        ("Sniper", Some("STEAM_0:1:7"), life(9, 0, 20)),
        ("Rookie", None, life(0, 5, 0)),
    ];
    for (name, unique, stats) in roster {
        let id = store.find_or_create(name, unique);
        store.update_position(id, &stats);
    }
    store
}

fn snapshot(store: &RankStore) -> Vec<(String, String, WeaponStatEntry, i32)> {
    store
        .iter()
        .map(|e| (e.name().to_owned(), e.unique().to_owned(), *e.stats(), e.score()))
        .collect()
}

#[test]
fn test_save_load_roundtrip_identical() {
    let path = temp_rank_path("roundtrip");
    let store = populated(100);
    store.save(&path).unwrap();

    let mut loaded = RankStore::new(100, Arc::new(PointTable::default()));
    assert_eq!(loaded.load(&path).unwrap(), 5);
    assert_eq!(snapshot(&store), snapshot(&loaded));
    assert_eq!(loaded.entry_at(1).unwrap().name(), "Sniper");
    // Sarge and Medic tie on 8 and keep their order
    assert_eq!(loaded.entry_at(2).unwrap().name(), "Sarge");
    assert_eq!(loaded.entry_at(3).unwrap().name(), "Medic");

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_missing_file_is_not_found() {
    let mut store = populated(10);
    let err = store.load(temp_rank_path("missing")).unwrap_err();
    assert!(matches!(err, RankError::NotFound(_)));
    assert!(store.is_empty());
}

#[test]
fn test_wrong_version_leaves_store_empty() {
    let path = temp_rank_path("version");
    populated(10).save(&path).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    bytes[4..8].copy_from_slice(&(RANK_VERSION + 7).to_le_bytes());
    std::fs::write(&path, &bytes).unwrap();

    let mut store = populated(10);
    let err = store.load(&path).unwrap_err();
    assert!(matches!(err, RankError::VersionMismatch { .. }));
    assert!(store.is_empty());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_truncated_file_leaves_store_empty() {
    let path = temp_rank_path("truncated");
    populated(10).save(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..HEADER_SIZE + 40]).unwrap();

    let mut store = RankStore::new(10, Arc::new(PointTable::default()));
    assert!(matches!(store.load(&path), Err(RankError::Truncated { .. })));
    assert!(store.is_empty());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_load_respects_capacity() {
    let path = temp_rank_path("capacity");
    populated(10).save(&path).unwrap();

    let mut small = RankStore::new(2, Arc::new(PointTable::default()));
    assert_eq!(small.load(&path).unwrap(), 2);
    assert_eq!(small.entry_at(1).unwrap().name(), "Sniper");
    assert_eq!(small.entry_at(2).unwrap().name(), "Sarge");
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_reload_with_new_weights_reorders() {
    let path = temp_rank_path("weights");
    populated(10).save(&path).unwrap();

    // Deaths now cost 3 points each.
    let table = PointTable::uniform(WeaponPoints::default()).with_bonuses(-3, 0);
    let mut store = RankStore::new(10, Arc::new(table));
    store.load(&path).unwrap();
    let order: Vec<_> = store.iter().map(|e| e.name().to_owned()).collect();
    assert_eq!(order, vec!["Sniper", "Sarge", "Medic", "Private", "Rookie"]);
    assert_eq!(store.entry_at(2).unwrap().score(), 8 - 3);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_background_saver_matches_direct_save() {
    let direct = temp_rank_path("direct");
    let background = temp_rank_path("background");
    let store = populated(10);

    store.save(&direct).unwrap();
    let saver = RankSaver::spawn().unwrap();
    saver.submit(&store, &background).unwrap();
    let stats = saver.shutdown();
    assert_eq!(stats.saves_completed, 1);

    assert_eq!(std::fs::read(&direct).unwrap(), std::fs::read(&background).unwrap());
    let _ = std::fs::remove_file(&direct);
    let _ = std::fs::remove_file(&background);
}
