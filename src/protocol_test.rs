use super::*;
use serde_json::json;

#[test]
fn parse_accepts_text_object() {
    let msg = InboundMessage::parse(br#"{"text":"hi"}"#).unwrap();
    assert_eq!(msg.text, "hi");
}

#[test]
fn parse_accepts_empty_text() {
    let msg = InboundMessage::parse(br#"{"text":""}"#).unwrap();
    assert_eq!(msg.text, "");
}

#[test]
fn parse_ignores_unknown_fields() {
    let msg = InboundMessage::parse(br#"{"text":"hi","nick":"a"}"#).unwrap();
    assert_eq!(msg.text, "hi");
}

#[test]
fn parse_rejects_malformed_shapes() {
    let cases: [&[u8]; 6] = [
        b"not json",
        b"{}",
        br#"{"text": 5}"#,
        br#"{"text": null}"#,
        br#"["hi"]"#,
        br#""hi""#,
    ];
    for raw in cases {
        assert!(InboundMessage::parse(raw).is_err(), "expected error for {}", String::from_utf8_lossy(raw));
    }
}

#[test]
fn snapshot_serializes_as_messages_array() {
    let snap = Snapshot { messages: vec!["hi".into(), "yo".into()] };
    let value: serde_json::Value = serde_json::from_str(snap.encode().unwrap().as_str()).unwrap();
    assert_eq!(value, json!({"messages": ["hi", "yo"]}));
    assert_eq!(decode_messages(snap.encode().unwrap().as_str()), vec!["hi".to_string(), "yo".to_string()]);
}

#[test]
fn empty_snapshot_serializes_as_empty_array() {
    assert_eq!(Snapshot::default().encode().unwrap().as_str(), r#"{"messages":[]}"#);
}
