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

#[test]
fn defaults_are_valid() {
    let cfg = PhotoworkConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.engine.change_capacity, 64);
    assert_eq!(cfg.library.sidecar_name, ".photowork.json");
    assert_eq!(
        cfg.library.thumbnail_dir(),
        PathBuf::from(".").join(".thumbnails")
    );
}

#[test]
fn zero_capacity_is_rejected() {
    let opts = EngineOpts {
        change_capacity: 0,
        ..EngineOpts::default()
    };
    assert!(opts.validate().is_err());
}

#[test]
fn file_names_must_stay_in_their_directory() {
    let mut lib = LibraryConfig::at("/lib");
    lib.sidecar_name = "../escape.json".to_string();
    assert!(lib.validate().is_err());

    let mut lib = LibraryConfig::at("/lib");
    lib.fields_name = lib.sidecar_name.clone();
    assert!(lib.validate().is_err());
}

#[test]
fn load_json_fills_missing_fields_with_defaults() {
    let dir = temp_dir("config_load");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("photowork.json");
    std::fs::write(
        &path,
        r#"{ "engine": { "initial_version": 7 }, "library": { "root": "/photos" } }"#,
    )
    .unwrap();

    let cfg = PhotoworkConfig::load_json(&path).unwrap();
    assert_eq!(cfg.engine.initial_version, Some(7));
    assert_eq!(cfg.engine.change_capacity, 64);
    assert_eq!(cfg.library.root, PathBuf::from("/photos"));
    assert_eq!(cfg.library.fields_path(), PathBuf::from("/photos/.photowork-fields.json"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn load_json_reports_parse_and_validation_errors() {
    let dir = temp_dir("config_bad");
    std::fs::create_dir_all(&dir).unwrap();

    let garbage = dir.join("garbage.json");
    std::fs::write(&garbage, "{ not json").unwrap();
    let err = PhotoworkConfig::load_json(&garbage).unwrap_err();
    assert!(err.to_string().contains("serialization error:"));

    let invalid = dir.join("invalid.json");
    std::fs::write(&invalid, r#"{ "engine": { "change_capacity": 0 } }"#).unwrap();
    let err = PhotoworkConfig::load_json(&invalid).unwrap_err();
    assert!(err.to_string().contains("validation error:"));

    assert!(PhotoworkConfig::load_json(&dir.join("missing.json")).is_err());

    std::fs::remove_dir_all(&dir).ok();
}
