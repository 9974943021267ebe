use serde_json::json;

use super::*;

fn exercise(store: &mut dyn SettingsStore) {
    assert_eq!(store.get("theme").unwrap(), None);

    store.set("theme", json!("dark")).unwrap();
    store.set("recent", json!(["a.png", "b.png"])).unwrap();
    assert_eq!(store.get("theme").unwrap(), Some(json!("dark")));

    store.set("theme", json!("light")).unwrap();
    assert_eq!(store.get("theme").unwrap(), Some(json!("light")));

    store.delete("theme").unwrap();
    store.delete("theme").unwrap();
    assert_eq!(store.get("theme").unwrap(), None);
    assert_eq!(store.get("recent").unwrap(), Some(json!(["a.png", "b.png"])));

    store.clear().unwrap();
    assert_eq!(store.get("recent").unwrap(), None);
}

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit_settings");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = std::fs::remove_file(&path);
    path
}

#[test]
fn memory_store_semantics() {
    exercise(&mut MemoryStore::new());
}

#[test]
fn json_file_store_semantics() {
    exercise(&mut JsonFileStore::open(scratch("semantics.json")).unwrap());
}

#[test]
fn json_file_store_persists_across_opens() {
    let path = scratch("persist.json");
    {
        let mut store = JsonFileStore::open(&path).unwrap();
        store.set("count", json!(3)).unwrap();
    }

    let store = JsonFileStore::open(&path).unwrap();
    assert_eq!(store.get("count").unwrap(), Some(json!(3)));
    assert_eq!(store.path(), path.as_path());
}

#[test]
fn json_file_store_rejects_non_objects() {
    let path = scratch("array.json");
    std::fs::write(&path, "[1, 2]").unwrap();
    assert!(matches!(
        JsonFileStore::open(&path),
        Err(BatchError::Serde(_))
    ));
}
