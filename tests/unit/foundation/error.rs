use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        BatchError::decode("a.png", "bad magic")
            .to_string()
            .contains("decode error in 'a.png':")
    );
    assert!(
        BatchError::rasterize("b.png", "too wide")
            .to_string()
            .contains("rasterize error in 'b.png':")
    );
    assert!(
        BatchError::archive("x")
            .to_string()
            .contains("archive error:")
    );
    assert!(
        BatchError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        BatchError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert!(
        BatchError::EmptyTemplate
            .to_string()
            .contains("no template defined")
    );
}

#[test]
fn file_is_reported_for_per_image_errors_only() {
    assert_eq!(BatchError::decode("a.png", "x").file(), Some("a.png"));
    assert_eq!(BatchError::rasterize("b.jpg", "x").file(), Some("b.jpg"));
    assert_eq!(BatchError::EmptyTemplate.file(), None);
    assert_eq!(
        BatchError::Cancelled {
            completed: 1,
            total: 3
        }
        .file(),
        None
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = BatchError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_map_to_serde() {
    let e = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(BatchError::from(e), BatchError::Serde(_)));
}
