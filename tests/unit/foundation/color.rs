use super::*;
use serde_json::json;

#[test]
fn parses_hex_forms() {
    assert_eq!(Rgba8::parse("#000000").unwrap(), Rgba8::BLACK);
    assert_eq!(Rgba8::parse("#fff").unwrap(), Rgba8::rgba(255, 255, 255, 255));
    assert_eq!(Rgba8::parse("#f008").unwrap(), Rgba8::rgba(255, 0, 0, 136));
    assert_eq!(
        Rgba8::parse("#0000FF80").unwrap(),
        Rgba8::rgba(0, 0, 255, 128)
    );
    assert!(Rgba8::parse("#12345").is_err());
    assert!(Rgba8::parse("#zzzzzz").is_err());
}

#[test]
fn parses_functional_forms() {
    assert_eq!(
        Rgba8::parse("rgb(10, 20, 30)").unwrap(),
        Rgba8::rgba(10, 20, 30, 255)
    );
    assert_eq!(
        Rgba8::parse("rgba(255,255,255,0.5)").unwrap(),
        Rgba8::rgba(255, 255, 255, 128)
    );
    assert_eq!(
        Rgba8::parse("RGB(100%, 0%, 0%)").unwrap(),
        Rgba8::rgba(255, 0, 0, 255)
    );

    let red = Rgba8::parse("hsl(0, 100%, 50%)").unwrap();
    assert_eq!(red, Rgba8::rgba(255, 0, 0, 255));
    let half = Rgba8::parse("hsla(120, 100%, 25%, 0.5)").unwrap();
    assert_eq!(half, Rgba8::rgba(0, 128, 0, 128));

    assert!(Rgba8::parse("rgb(1,2)").is_err());
    assert!(Rgba8::parse("hsl(0, 1, 0.5)").is_err());
}

#[test]
fn parses_names_and_rejects_unknown() {
    assert_eq!(Rgba8::parse("white").unwrap(), Rgba8::rgba(255, 255, 255, 255));
    assert_eq!(Rgba8::parse(" Transparent ").unwrap(), Rgba8::TRANSPARENT);
    assert!(Rgba8::parse("rebeccapurple-ish").is_err());
}

#[test]
fn serde_roundtrips_through_hex() {
    let c: Rgba8 = serde_json::from_value(json!("rgba(1,2,3,1)")).unwrap();
    assert_eq!(serde_json::to_value(c).unwrap(), json!("#010203ff"));
}

#[test]
fn optional_paint_accepts_null_and_empty() {
    #[derive(serde::Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "deserialize_opt_paint")]
        paint: Option<Rgba8>,
    }

    let h: Holder = serde_json::from_value(json!({ "paint": null })).unwrap();
    assert_eq!(h.paint, None);
    let h: Holder = serde_json::from_value(json!({ "paint": "" })).unwrap();
    assert_eq!(h.paint, None);
    let h: Holder = serde_json::from_value(json!({})).unwrap();
    assert_eq!(h.paint, None);
    let h: Holder = serde_json::from_value(json!({ "paint": "#ff0000" })).unwrap();
    assert_eq!(h.paint, Some(Rgba8::rgba(255, 0, 0, 255)));

    let gradient = json!({ "paint": { "type": "linear", "colorStops": [] } });
    assert!(serde_json::from_value::<Holder>(gradient).is_err());
}

#[test]
fn with_opacity_scales_alpha() {
    assert_eq!(Rgba8::BLACK.with_opacity(0.5).a, 128);
    assert_eq!(Rgba8::BLACK.with_opacity(2.0).a, 255);
    assert!(Rgba8::BLACK.with_opacity(0.0).is_transparent());
}
