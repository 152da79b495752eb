use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "photowork_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn library(name: &str) -> (PathBuf, FsWorkStore) {
    let root = temp_dir(name);
    std::fs::create_dir_all(root.join("2019")).unwrap();
    std::fs::write(root.join("2019/a.jpg"), b"jpeg").unwrap();
    std::fs::write(root.join("2019/b.jpg"), b"jpeg").unwrap();
    let store = FsWorkStore::new(LibraryConfig::at(&root)).unwrap();
    (root, store)
}

#[tokio::test]
async fn fetch_without_sidecar_yields_untouched_state() {
    let (root, store) = library("store_fetch_default");
    let r = ResourceRef::new("2019/a.jpg").unwrap();
    assert!(store.fetch(&r).await.unwrap().is_untouched());
    std::fs::remove_dir_all(&root).ok();
}

#[tokio::test]
async fn fetch_of_missing_master_is_not_found() {
    let (root, store) = library("store_fetch_missing");
    let r = ResourceRef::new("2019/nope.jpg").unwrap();
    let err = store.fetch(&r).await.unwrap_err();
    assert!(matches!(err, WorkError::NotFound(_)));
    std::fs::remove_dir_all(&root).ok();
}

#[tokio::test]
async fn store_then_fetch_keeps_siblings_apart() {
    let (root, store) = library("store_roundtrip");
    let a = ResourceRef::new("2019/a.jpg").unwrap();
    let b = ResourceRef::new("2019/b.jpg").unwrap();

    let rotated = EditState {
        rotation_turns: Some(1),
        ..EditState::default()
    };
    let flagged = EditState {
        flagged: true,
        ..EditState::default()
    };
    store.store(&a, &rotated).await.unwrap();
    store.store(&b, &flagged).await.unwrap();

    assert_eq!(store.fetch(&a).await.unwrap(), rotated);
    assert_eq!(store.fetch(&b).await.unwrap(), flagged);

    let sidecar = std::fs::read_to_string(root.join("2019/.photowork.json")).unwrap();
    assert!(sidecar.contains("\"a.jpg\""));
    assert!(sidecar.contains("\"rotationTurns\": 1"));

    std::fs::remove_dir_all(&root).ok();
}

#[tokio::test]
async fn storing_untouched_state_removes_entry_and_empty_sidecar() {
    let (root, store) = library("store_cleanup");
    let a = ResourceRef::new("2019/a.jpg").unwrap();
    let sidecar = store.sidecar_path(&a);

    let tilted = EditState {
        tilt: Some(2.5),
        ..EditState::default()
    };
    store.store(&a, &tilted).await.unwrap();
    assert!(sidecar.exists());

    store.store(&a, &EditState::default()).await.unwrap();
    assert!(!sidecar.exists());
    assert!(store.fetch(&a).await.unwrap().is_untouched());

    std::fs::remove_dir_all(&root).ok();
}

#[tokio::test]
async fn corrupt_sidecar_is_a_serde_error() {
    let (root, store) = library("store_corrupt");
    std::fs::write(root.join("2019/.photowork.json"), "{ nope").unwrap();
    let a = ResourceRef::new("2019/a.jpg").unwrap();
    let err = store.fetch(&a).await.unwrap_err();
    assert!(matches!(err, WorkError::Serde(_)));
    std::fs::remove_dir_all(&root).ok();
}

#[tokio::test]
async fn update_fields_merges_into_index() {
    let (root, store) = library("store_fields");
    let a = ResourceRef::new("2019/a.jpg").unwrap();
    let b = ResourceRef::new("2019/b.jpg").unwrap();

    store
        .update_fields(&[a.clone(), b.clone()], &FieldUpdate::flagged(true))
        .await
        .unwrap();
    store
        .update_fields(std::slice::from_ref(&b), &FieldUpdate::trashed(true))
        .await
        .unwrap();

    assert_eq!(
        store.primary_fields(&a).await.unwrap(),
        PrimaryFields {
            flag: true,
            trashed: false
        }
    );
    assert_eq!(
        store.primary_fields(&b).await.unwrap(),
        PrimaryFields {
            flag: true,
            trashed: true
        }
    );

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn absolute_resources_ignore_root() {
    let store = FsWorkStore::new(LibraryConfig::at("/library")).unwrap();
    let abs = ResourceRef::new("/elsewhere/x.jpg").unwrap();
    assert_eq!(store.master_path(&abs), PathBuf::from("/elsewhere/x.jpg"));
    assert_eq!(
        store.sidecar_path(&abs),
        PathBuf::from("/elsewhere/.photowork.json")
    );

    let rel = ResourceRef::new("x.jpg").unwrap();
    assert_eq!(store.master_path(&rel), PathBuf::from("/library/x.jpg"));
}

#[test]
fn sidecar_sits_in_master_directory() {
    let store = FsWorkStore::new(LibraryConfig::at("/library")).unwrap();
    let nested = ResourceRef::new("2019/06/x.jpg").unwrap();
    assert_eq!(
        store.sidecar_path(&nested),
        PathBuf::from("/library/2019/06/.photowork.json")
    );

    let top = ResourceRef::new("x.jpg").unwrap();
    assert_eq!(
        store.sidecar_path(&top),
        PathBuf::from("/library/.photowork.json")
    );

    let at_fs_root = ResourceRef::new("/x.jpg").unwrap();
    assert_eq!(
        store.sidecar_path(&at_fs_root),
        PathBuf::from("/.photowork.json")
    );
}
