use crate::config::escapes::{decode_escapes, encode_escapes, EscapeError};

#[test]
fn test_plain_text_passes_through() {
    assert_eq!(decode_escapes("qr_").unwrap(), "qr_");
    assert_eq!(decode_escapes("").unwrap(), "");
}

#[test]
fn test_backslash_escapes() {
    assert_eq!(decode_escapes(r"\r").unwrap(), "\r");
    assert_eq!(decode_escapes(r"\n").unwrap(), "\n");
    assert_eq!(decode_escapes(r"\t").unwrap(), "\t");
    assert_eq!(decode_escapes(r"a\\b").unwrap(), "a\\b");
    assert_eq!(decode_escapes(r"\<enter>").unwrap(), "<enter>");
}

#[test]
fn test_named_keys_case_insensitive() {
    assert_eq!(decode_escapes("<enter>").unwrap(), "\r");
    assert_eq!(decode_escapes("<RETURN>").unwrap(), "\r");
    assert_eq!(decode_escapes("<Tab>").unwrap(), "\t");
}

#[test]
fn test_mixed_sequence() {
    assert_eq!(decode_escapes(r"<tab>qr_\r").unwrap(), "\tqr_\r");
}

#[test]
fn test_lone_angle_bracket_is_literal() {
    assert_eq!(decode_escapes("<qr>").unwrap(), "<qr>");
    assert_eq!(decode_escapes("a<b").unwrap(), "a<b");
}

#[test]
fn test_unknown_escape_reports_position() {
    assert_eq!(
        decode_escapes(r"ab\x"),
        Err(EscapeError::UnknownEscape {
            sequence: r"\x".to_string(),
            position: 2,
        })
    );
}

#[test]
fn test_dangling_backslash() {
    assert_eq!(decode_escapes("qr_\\"), Err(EscapeError::DanglingBackslash));
}

#[test]
fn test_encode_is_reversible() {
    for raw in ["", "qr_", "\r", "\r\n", "\t>", "a\\b", "<enter>", "ünï<code>"] {
        assert_eq!(decode_escapes(&encode_escapes(raw)).unwrap(), raw, "raw {raw:?}");
    }
}

#[test]
fn test_encode_control_characters() {
    assert_eq!(encode_escapes("\r"), r"\r");
    assert_eq!(encode_escapes("qr_\t"), r"qr_\t");
}
