use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        WorkError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(WorkError::not_found("x").to_string().contains("not found:"));
    assert!(WorkError::io("x").to_string().contains("io error:"));
    assert!(
        WorkError::batch("x")
            .to_string()
            .contains("batch update error:")
    );
    assert!(
        WorkError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert!(WorkError::runtime("x").to_string().contains("runtime error:"));
}

#[test]
fn tagged_errors_name_their_resource() {
    let r = ResourceRef::new("lib/a.jpg").unwrap();

    let fetch = WorkError::fetch(r.clone(), "disk gone");
    assert_eq!(fetch.to_string(), "fetch failed for 'lib/a.jpg': disk gone");
    assert_eq!(fetch.resource(), Some(&r));

    let persist = WorkError::persist(r.clone(), "read-only");
    assert!(persist.to_string().starts_with("persist failed for 'lib/a.jpg'"));

    let inval = WorkError::invalidation(r.clone(), "busy");
    assert!(inval.to_string().starts_with("invalidation failed"));
    assert_eq!(inval.resource(), Some(&r));

    assert!(WorkError::batch("x").resource().is_none());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = WorkError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
