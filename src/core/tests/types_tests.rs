use std::borrow::Cow;

use crate::core::types::{normalize_newlines, ControlKey, EventDisposition, Framing, KeyEvent};

#[test]
fn test_normalize_newlines() {
    assert_eq!(normalize_newlines("a\r\nb"), "a\rb");
    assert_eq!(normalize_newlines("a\nb"), "a\rb");
    assert_eq!(normalize_newlines("a\rb"), "a\rb");
    assert_eq!(normalize_newlines("\r\n\n\r"), "\r\r\r");
}

#[test]
fn test_normalize_borrows_without_line_feed() {
    assert!(matches!(normalize_newlines("plain\r"), Cow::Borrowed(_)));
    assert!(matches!(normalize_newlines("line\n"), Cow::Owned(_)));
}

#[test]
fn test_framing_is_canonicalised() {
    let framing = Framing::new("\r\n>", "\n");

    assert_eq!(framing.prefix(), "\r>");
    assert_eq!(framing.suffix(), "\r");
}

#[test]
fn test_framing_strip() {
    let framing = Framing::new("qr_", "\r");

    assert_eq!(framing.strip("qr_abc\r"), Some("abc"));
    assert_eq!(framing.strip("qr_\r"), Some(""));
    assert_eq!(framing.strip("abc\r"), None);
    assert_eq!(framing.strip("qr_abc"), None);
}

#[test]
fn test_framing_strip_does_not_overlap() {
    let framing = Framing::new("##", "#");

    // "##" alone cannot be both prefix and suffix
    assert_eq!(framing.strip("##"), None);
    assert_eq!(framing.strip("###"), Some(""));
}

#[test]
fn test_empty_framing_passes_through() {
    let framing = Framing::new("", "");

    assert_eq!(framing.strip("anything"), Some("anything"));
}

#[test]
fn test_framing_display() {
    let framing = Framing::new("qr_", "\r");

    assert_eq!(format!("{}", framing), r#"prefix="qr_", suffix="\r""#);
}

#[test]
fn test_control_key_display() {
    assert_eq!(format!("{}", ControlKey::Return), "Return");
    assert_eq!(format!("{}", ControlKey::Enter), "Enter");
    assert_eq!(format!("{}", ControlKey::Tab), "Tab");
}

#[test]
fn test_key_event_char() {
    assert_eq!(KeyEvent::char('x'), KeyEvent::Text("x".to_string()));
}

#[test]
fn test_disposition() {
    assert!(EventDisposition::Consumed.is_consumed());
    assert!(!EventDisposition::NotHandled.is_consumed());
}
