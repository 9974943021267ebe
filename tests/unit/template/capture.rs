use super::*;
use serde_json::json;

fn scene_json() -> serde_json::Value {
    json!({
        "version": "5.3.0",
        "objects": [
            { "type": "rect", "left": 0, "top": 0, "width": 10, "height": 10, "fill": "red" },
            { "type": "i-text", "left": 50, "top": 50, "text": "first", "fontFamily": "Arial" },
            { "type": "image", "src": "data:image/png;base64,AAAA" },
            { "type": "text", "left": 1, "top": 1, "text": "static" },
            { "type": "textbox", "left": 5, "top": 400, "width": 300, "text": "second" },
            { "left": 3, "top": 3 }
        ],
        "backgroundImage": { "type": "image", "width": 800, "height": 600 }
    })
}

#[test]
fn captures_only_editable_text_in_scene_order() {
    let scene: EditorScene = serde_json::from_value(scene_json()).unwrap();
    let template = capture_template(&scene).unwrap();

    let texts: Vec<&str> = template.objects().iter().map(|o| o.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert_eq!(template.objects()[0].kind, ObjectKind::IText);
    assert_eq!(template.objects()[1].kind, ObjectKind::Textbox);
    assert_eq!(template.objects()[1].width, 300.0);
}

#[test]
fn scene_without_text_captures_empty_template() {
    let scene = EditorScene::from_json_str(
        r#"{ "objects": [ { "type": "rect", "width": 4, "height": 4 } ] }"#,
    )
    .unwrap();
    let template = capture_template(&scene).unwrap();
    assert!(template.is_empty());

    let empty = EditorScene::default();
    assert!(capture_template(&empty).unwrap().is_empty());
}

#[test]
fn malformed_text_object_names_its_index() {
    let scene: EditorScene = serde_json::from_value(json!({
        "objects": [
            { "type": "i-text", "text": "ok" },
            { "type": "i-text", "text": "bad", "fill": "not-a-colour" }
        ]
    }))
    .unwrap();

    let err = capture_template(&scene).unwrap_err();
    assert!(matches!(err, BatchError::Serde(_)));
    assert!(err.to_string().contains("scene object 1"), "{err}");
}

#[test]
fn capture_does_not_touch_the_scene() {
    let scene: EditorScene = serde_json::from_value(scene_json()).unwrap();
    let before = serde_json::to_value(&scene).unwrap();
    let _ = capture_template(&scene).unwrap();
    assert_eq!(serde_json::to_value(&scene).unwrap(), before);
}
