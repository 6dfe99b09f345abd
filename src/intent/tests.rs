use super::*;
use serde_json::json;

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn empty_and_whitespace_inputs() {
    assert_eq!(detect_intent(""), Intent::Empty);
    assert_eq!(detect_intent("   \n\t  "), Intent::Empty);
}

#[test]
fn json_object_is_store() {
    let intent = detect_intent(r#"  {"title": "Hello", "code": "print(1)"}  "#);
    match intent {
        Intent::Store(map) => {
            assert_eq!(map.get("title"), Some(&json!("Hello")));
            assert_eq!(map.get("code"), Some(&json!("print(1)")));
        }
        other => panic!("expected store intent, got {other:?}"),
    }
}

#[test]
fn free_text_is_search() {
    assert_eq!(
        detect_intent("  weather api "),
        Intent::Search("weather api".to_string())
    );
}

#[test]
fn non_object_json_falls_through_to_search() {
    for input in ["[1, 2, 3]", "42", "\"quoted\"", "true", "null"] {
        assert_eq!(
            detect_intent(input),
            Intent::Search(input.to_string()),
            "input {input} should be a search"
        );
    }
}

#[test]
fn broken_json_is_search() {
    let input = r#"{"title": "unterminated"#;
    assert_eq!(detect_intent(input), Intent::Search(input.to_string()));
}

#[test]
fn non_empty_input_is_never_empty() {
    for input in ["a", "{}", "{", "[]", " x "] {
        assert_ne!(detect_intent(input).kind(), "empty");
    }
}

#[test]
fn content_from_title_and_code() {
    let data = object(json!({"title": "Hello", "code": "print(1)"}));
    assert_eq!(extract_content(&data), "Title: Hello | Code: print(1)");
}

#[test]
fn content_keys_follow_fixed_order() {
    let data = object(json!({
        "tags": ["redis", "cache"],
        "language": "rust",
        "content": "body",
        "description": "desc",
        "title": "T"
    }));
    assert_eq!(
        extract_content(&data),
        "Title: T | Description: desc | Content: body | Language: rust | Tags: redis, cache"
    );
}

#[test]
fn scalar_tags_render_as_is() {
    let data = object(json!({"tags": "single"}));
    assert_eq!(extract_content(&data), "Tags: single");
}

#[test]
fn unrecognised_keys_fall_back_to_json() {
    let data = object(json!({"weather": "sunny"}));
    assert_eq!(extract_content(&data), r#"{"weather":"sunny"}"#);
}

#[test]
fn json_fallback_keeps_input_key_order() {
    let Intent::Store(data) = detect_intent(r#"{"zeta": 1, "alpha": {"y": 2, "b": 3}}"#) else {
        panic!("expected a store intent");
    };
    assert_eq!(extract_content(&data), r#"{"zeta":1,"alpha":{"y":2,"b":3}}"#);
}

#[test]
fn empty_object_content_is_not_empty() {
    let data = Map::new();
    assert_eq!(extract_content(&data), "{}");
}

#[test]
fn non_string_values_are_serialized() {
    let data = object(json!({"title": 7, "code": {"a": 1}}));
    assert_eq!(extract_content(&data), r#"Title: 7 | Code: {"a":1}"#);
}
