use std::collections::HashMap;

use super::*;
use crate::config::store::MemoryStore;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn defaults_match_the_reference_behaviour() {
    let o = BatchOptions::default();
    assert_eq!(o.output_format, OutputFormat::Png);
    assert_eq!(o.failure_policy, FailurePolicy::Abort);
    assert_eq!(o.name_prefix, "processed_");
    assert!(o.fonts.system_fonts);
    o.validate().unwrap();
}

#[test]
fn partial_json_fills_defaults() {
    let o: BatchOptions =
        serde_json::from_str(r#"{"failure_policy":"skip_and_continue"}"#).unwrap();
    assert_eq!(o.failure_policy, FailurePolicy::SkipAndContinue);
    assert_eq!(o.name_prefix, "processed_");
}

#[test]
fn failure_policy_parses_short_names() {
    assert_eq!("abort".parse::<FailurePolicy>().unwrap(), FailurePolicy::Abort);
    assert_eq!(" SKIP ".parse::<FailurePolicy>().unwrap(), FailurePolicy::SkipAndContinue);
    assert!("retry".parse::<FailurePolicy>().is_err());
}

#[test]
fn env_overrides_apply() {
    let mut o = BatchOptions::default();
    o.apply_overrides(env(&[
        ("BATCHMARK_FAILURE_POLICY", "skip"),
        ("BATCHMARK_OUTPUT_FORMAT", "jpeg"),
        ("BATCHMARK_JPEG_QUALITY", "60"),
    ]))
    .unwrap();

    assert_eq!(o.failure_policy, FailurePolicy::SkipAndContinue);
    assert_eq!(o.output_format, OutputFormat::Jpeg { quality: 60 });
}

#[test]
fn quality_override_without_jpeg_is_ignored() {
    let mut o = BatchOptions::default();
    o.apply_overrides(env(&[("BATCHMARK_JPEG_QUALITY", "60")]))
        .unwrap();
    assert_eq!(o.output_format, OutputFormat::Png);
}

#[test]
fn bad_overrides_are_errors() {
    let mut o = BatchOptions::default();
    assert!(o
        .apply_overrides(env(&[("BATCHMARK_OUTPUT_FORMAT", "gif")]))
        .is_err());

    let mut o = BatchOptions::default();
    assert!(o
        .apply_overrides(env(&[
            ("BATCHMARK_OUTPUT_FORMAT", "jpeg"),
            ("BATCHMARK_JPEG_QUALITY", "0"),
        ]))
        .is_err());
}

#[test]
fn font_dirs_override_appends() {
    let joined = std::env::join_paths(["fonts/a", "fonts/b"]).unwrap();
    let mut o = BatchOptions::default().with_font_dirs([PathBuf::from("base")]);
    o.apply_overrides(env(&[(
        "BATCHMARK_FONT_DIRS",
        joined.to_str().unwrap(),
    )]))
    .unwrap();

    assert_eq!(
        o.fonts.font_dirs,
        vec![
            PathBuf::from("base"),
            PathBuf::from("fonts/a"),
            PathBuf::from("fonts/b"),
        ]
    );
}

#[test]
fn options_roundtrip_through_a_store() {
    let mut store = MemoryStore::new();
    assert_eq!(BatchOptions::load(&store).unwrap(), BatchOptions::default());

    let o = BatchOptions {
        output_format: OutputFormat::Jpeg { quality: 70 },
        name_prefix: "wm_".to_owned(),
        ..BatchOptions::default()
    };
    o.save(&mut store).unwrap();
    assert_eq!(BatchOptions::load(&store).unwrap(), o);
}

#[test]
fn prefix_with_separator_is_invalid() {
    let o = BatchOptions {
        name_prefix: "a\\b".to_owned(),
        ..BatchOptions::default()
    };
    assert!(o.validate().is_err());
}
