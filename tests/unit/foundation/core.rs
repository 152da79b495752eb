use std::collections::HashSet;

use super::*;

#[test]
fn separators_are_normalized() {
    let r = ResourceRef::new("photos\\2019\\img.jpg").unwrap();
    assert_eq!(r.as_str(), "photos/2019/img.jpg");
    assert_eq!(r.master_dir(), Some("photos/2019"));
    assert_eq!(r.file_name(), "img.jpg");
}

#[test]
fn bare_file_name_has_no_master_dir() {
    let r = ResourceRef::new("img.jpg").unwrap();
    assert_eq!(r.master_dir(), None);
    assert_eq!(r.file_name(), "img.jpg");
}

#[test]
fn rejects_empty_and_directory_paths() {
    assert!(ResourceRef::new("").is_err());
    assert!(ResourceRef::new("   ").is_err());
    assert!(ResourceRef::new("photos/").is_err());
}

#[test]
fn from_master_joins_dir_and_file() {
    let r = ResourceRef::from_master("/mnt/photos/", "a.jpg").unwrap();
    assert_eq!(r.as_str(), "/mnt/photos/a.jpg");
    assert_eq!(r, "/mnt/photos/a.jpg".parse::<ResourceRef>().unwrap());

    assert_eq!(ResourceRef::from_master("", "a.jpg").unwrap().as_str(), "a.jpg");
    assert!(ResourceRef::from_master("/mnt", "x/a.jpg").is_err());
    assert!(ResourceRef::from_master("/mnt", "").is_err());
}

#[test]
fn keys_hash_by_path() {
    let mut set = HashSet::new();
    set.insert(ResourceRef::new("a/b.jpg").unwrap());
    set.insert(ResourceRef::new("a\\b.jpg").unwrap());
    set.insert(ResourceRef::new("a/c.jpg").unwrap());
    assert_eq!(set.len(), 2);
}

#[test]
fn serde_uses_plain_string_and_validates() {
    let r = ResourceRef::new("a/b.jpg").unwrap();
    assert_eq!(serde_json::to_string(&r).unwrap(), "\"a/b.jpg\"");
    let back: ResourceRef = serde_json::from_str("\"a/b.jpg\"").unwrap();
    assert_eq!(back, r);
    assert!(serde_json::from_str::<ResourceRef>("\"\"").is_err());
}

#[test]
fn master_directly_under_fs_root() {
    let r = ResourceRef::new("/x.jpg").unwrap();
    assert_eq!(r.master_dir(), Some("/"));
    assert_eq!(r.file_name(), "x.jpg");
}
