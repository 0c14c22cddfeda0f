use super::*;
use std::str::FromStr;

#[test]
fn test_typed_id_from_raw() {
    let id = AttachmentId::from_raw(12);
    assert_eq!(id.into_inner(), 12);
}

#[test]
fn test_typed_id_display() {
    let id = KtSessionId::from(5);
    assert_eq!(format!("{id}"), "5");
}

#[test]
fn test_typed_id_from_str() {
    let id = UserId::from_str("31").unwrap();
    assert_eq!(id, UserId::from_raw(31));
}

#[test]
fn test_typed_id_from_str_error() {
    assert!(UserId::from_str("invalid").is_err());
}

#[test]
fn test_typed_id_serde_transparent() {
    let json = serde_json::to_string(&AttachmentId::from_raw(9)).unwrap();
    assert_eq!(json, "9");

    let id: KtSessionId = serde_json::from_str("4").unwrap();
    assert_eq!(id, KtSessionId::from_raw(4));
}
