use super::*;
use crate::assets::fonts::FontSources;

fn solid(width: u32, height: u32, rgba: [u8; 4]) -> DecodedImage {
    DecodedImage {
        width,
        height,
        rgba8_premul: rgba.repeat((width * height) as usize),
    }
}

fn painter_without_fonts() -> TextPainter {
    TextPainter::new(&FontSources {
        system_fonts: false,
        font_dirs: Vec::new(),
    })
}

fn px(frame: &RasterFrame, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    frame.rgba8_premul[i..i + 4].try_into().unwrap()
}

fn close(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= 2)
}

#[test]
fn scene_size_limits() {
    assert!(OffscreenScene::new(0, 10).is_err());
    assert!(OffscreenScene::new(70_000, 10).is_err());
    let scene = OffscreenScene::new(400, 300).unwrap();
    assert_eq!(scene.size(), (400, 300));
}

#[test]
fn background_must_match_scene_size() {
    let mut scene = OffscreenScene::new(4, 4).unwrap();
    assert!(scene.set_background(&solid(5, 4, [0, 0, 0, 255])).is_err());
}

#[test]
fn background_fills_scene_unscaled() {
    let mut scene = OffscreenScene::new(8, 6).unwrap();
    scene.set_background(&solid(8, 6, [0, 0, 255, 255])).unwrap();
    let frame = scene.rasterize().unwrap();

    assert_eq!((frame.width, frame.height), (8, 6));
    assert!(close(px(&frame, 0, 0), [0, 0, 255, 255]));
    assert!(close(px(&frame, 7, 5), [0, 0, 255, 255]));
}

#[test]
fn rect_is_stamped_over_background() {
    let mut painter = painter_without_fonts();
    let mut scene = OffscreenScene::new(8, 8).unwrap();
    scene.set_background(&solid(8, 8, [0, 0, 255, 255])).unwrap();
    scene
        .add_object(
            &TemplateObject::rect(2.0, 2.0, 4.0, 4.0, Rgba8::rgba(255, 0, 0, 255)),
            &mut painter,
        )
        .unwrap();
    let frame = scene.rasterize().unwrap();

    assert!(close(px(&frame, 3, 3), [255, 0, 0, 255]), "{:?}", px(&frame, 3, 3));
    assert!(close(px(&frame, 0, 0), [0, 0, 255, 255]));
    assert!(close(px(&frame, 7, 7), [0, 0, 255, 255]));
}

#[test]
fn opacity_and_visibility_are_honoured() {
    let mut painter = painter_without_fonts();
    let mut scene = OffscreenScene::new(4, 4).unwrap();
    scene.set_background(&solid(4, 4, [0, 0, 0, 255])).unwrap();

    let mut half = TemplateObject::rect(0.0, 0.0, 2.0, 4.0, Rgba8::rgba(255, 255, 255, 255));
    half.opacity = 0.5;
    scene.add_object(&half, &mut painter).unwrap();

    let mut hidden = TemplateObject::rect(2.0, 0.0, 2.0, 4.0, Rgba8::rgba(255, 255, 255, 255));
    hidden.visible = false;
    scene.add_object(&hidden, &mut painter).unwrap();

    let frame = scene.rasterize().unwrap();
    let grey = px(&frame, 0, 1);
    assert!((120..=136).contains(&grey[0]), "{grey:?}");
    assert!(close(px(&frame, 3, 1), [0, 0, 0, 255]));
}

#[test]
fn invalid_object_is_rejected() {
    let mut painter = painter_without_fonts();
    let mut scene = OffscreenScene::new(4, 4).unwrap();
    let bad = TemplateObject::rect(0.0, 0.0, f64::INFINITY, 1.0, Rgba8::BLACK);
    assert!(scene.add_object(&bad, &mut painter).is_err());
}

#[test]
fn text_without_fonts_is_skipped() {
    let mut painter = painter_without_fonts();
    let mut scene = OffscreenScene::new(16, 16).unwrap();
    scene.set_background(&solid(16, 16, [0, 0, 0, 255])).unwrap();
    scene
        .add_object(&TemplateObject::text("hi", 0.0, 0.0), &mut painter)
        .unwrap();
    let frame = scene.rasterize().unwrap();
    assert!(frame.rgba8_premul.chunks_exact(4).all(|p| close(p.try_into().unwrap(), [0, 0, 0, 255])));
}

#[test]
fn text_draws_glyphs_when_a_font_is_available() {
    let mut painter = TextPainter::new(&FontSources::default());
    if painter.fonts_mut().face_count() == 0 {
        return;
    }

    let mut scene = OffscreenScene::new(200, 80).unwrap();
    scene.set_background(&solid(200, 80, [0, 0, 0, 255])).unwrap();
    let mut obj = TemplateObject::text("WATERMARK", 4.0, 4.0);
    obj.fill = Some(Rgba8::rgba(255, 255, 255, 255));
    obj.font_family = "sans-serif".to_owned();
    obj.font_size = 32.0;
    scene.add_object(&obj, &mut painter).unwrap();
    let frame = scene.rasterize().unwrap();

    assert!(frame.rgba8_premul.chunks_exact(4).any(|p| p[0] > 128));
}

#[test]
fn single_paint_rect_folds_opacity_into_its_colour() {
    let mut painter = painter_without_fonts();
    let mut scene = OffscreenScene::new(8, 4).unwrap();
    scene.set_background(&solid(8, 4, [0, 0, 0, 255])).unwrap();

    let mut faint = TemplateObject::rect(0.0, 0.0, 4.0, 4.0, Rgba8::rgba(255, 255, 255, 128));
    faint.opacity = 0.5;
    assert_eq!(rect_paints(&faint).len(), 1);
    scene.add_object(&faint, &mut painter).unwrap();

    let mut outlined = TemplateObject::rect(4.0, 0.0, 4.0, 4.0, Rgba8::rgba(255, 255, 255, 255));
    outlined.stroke = Some(Rgba8::rgba(255, 255, 255, 255));
    outlined.stroke_width = 1.0;
    outlined.opacity = 0.5;
    assert_eq!(rect_paints(&outlined).len(), 2);
    scene.add_object(&outlined, &mut painter).unwrap();

    let frame = scene.rasterize().unwrap();
    let quarter = px(&frame, 1, 1);
    assert!((58..=70).contains(&quarter[0]), "{quarter:?}");
    let half = px(&frame, 6, 2);
    assert!((120..=136).contains(&half[0]), "{half:?}");
}
