use super::*;

fn frame(width: u32, height: u32, rgba: [u8; 4]) -> RasterFrame {
    RasterFrame {
        width,
        height,
        rgba8_premul: rgba.repeat((width * height) as usize),
    }
}

#[test]
fn png_roundtrips_dimensions_and_pixels() {
    let bytes = encode_frame(frame(5, 3, [10, 20, 30, 255]), OutputFormat::Png).unwrap();
    assert_eq!(
        image::guess_format(&bytes).unwrap(),
        image::ImageFormat::Png
    );

    let back = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(back.dimensions(), (5, 3));
    assert_eq!(back.get_pixel(4, 2).0, [10, 20, 30, 255]);
}

#[test]
fn png_output_is_straight_alpha() {
    // 50% white premultiplied is (128,128,128,128); straight alpha is white.
    let bytes = encode_frame(frame(1, 1, [128, 128, 128, 128]), OutputFormat::Png).unwrap();
    let back = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(back.get_pixel(0, 0).0, [255, 255, 255, 128]);
}

#[test]
fn jpeg_encodes_and_validates_quality() {
    let bytes = encode_frame(
        frame(8, 8, [200, 100, 50, 255]),
        OutputFormat::Jpeg { quality: 90 },
    )
    .unwrap();
    assert_eq!(
        image::guess_format(&bytes).unwrap(),
        image::ImageFormat::Jpeg
    );
    assert_eq!(image::load_from_memory(&bytes).unwrap().width(), 8);

    assert!(encode_frame(frame(1, 1, [0, 0, 0, 255]), OutputFormat::Jpeg { quality: 0 }).is_err());
}

#[test]
fn mismatched_buffer_is_an_error() {
    let bad = RasterFrame {
        width: 2,
        height: 2,
        rgba8_premul: vec![0; 4],
    };
    assert!(encode_frame(bad, OutputFormat::Png).is_err());
}

#[test]
fn format_serializes_with_kind_tag() {
    assert_eq!(
        serde_json::to_value(OutputFormat::Jpeg { quality: 70 }).unwrap(),
        serde_json::json!({ "kind": "jpeg", "quality": 70 })
    );
    let f: OutputFormat = serde_json::from_str(r#"{"kind":"png"}"#).unwrap();
    assert_eq!(f, OutputFormat::Png);
}
