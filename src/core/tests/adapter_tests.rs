use super::harness::{strings, Harness};
use crate::core::{AssemblerConfig, ControlKey, EventDisposition, KeyEvent, KeyEventAdapter};

#[test]
fn test_translate_mapping() {
    assert_eq!(KeyEventAdapter::translate(&KeyEvent::Control(ControlKey::Return)), Some("\r"));
    assert_eq!(KeyEventAdapter::translate(&KeyEvent::Control(ControlKey::Enter)), Some("\r"));
    assert_eq!(KeyEventAdapter::translate(&KeyEvent::Control(ControlKey::Tab)), Some("\t"));
    assert_eq!(KeyEventAdapter::translate(&KeyEvent::char('Q')), Some("Q"));
    assert_eq!(KeyEventAdapter::translate(&KeyEvent::Text("ab".to_string())), Some("ab"));
    assert_eq!(KeyEventAdapter::translate(&KeyEvent::Text(String::new())), None);
    assert_eq!(KeyEventAdapter::translate(&KeyEvent::Other), None);
}

#[test]
fn test_missing_event_not_handled() {
    let h = Harness::listening("", "\r");
    let adapter = KeyEventAdapter::new(&h.assembler);

    assert_eq!(adapter.handle_event(None), EventDisposition::NotHandled);
}

#[test]
fn test_detached_adapter_not_handled() {
    let adapter = KeyEventAdapter::detached();

    assert!(!adapter.is_attached());
    assert_eq!(
        adapter.handle_event(Some(&KeyEvent::char('a'))),
        EventDisposition::NotHandled
    );
}

#[test]
fn test_dropped_assembler_not_handled() {
    let adapter = {
        let h = Harness::listening("", "\r");
        KeyEventAdapter::new(&h.assembler)
    };

    assert!(!adapter.is_attached());
    assert_eq!(
        adapter.handle_event(Some(&KeyEvent::char('a'))),
        EventDisposition::NotHandled
    );
}

#[test]
fn test_not_listening_propagates() {
    let h = Harness::new(AssemblerConfig::default());
    let adapter = KeyEventAdapter::new(&h.assembler);

    let disposition = adapter.handle_event(Some(&KeyEvent::char('a')));

    assert!(!disposition.is_consumed());
    assert!(h.assembler.buffer_snapshot().is_empty());
}

#[test]
fn test_untranslatable_key_propagates() {
    let h = Harness::listening("", "\r");
    let adapter = KeyEventAdapter::new(&h.assembler);

    assert_eq!(adapter.handle_event(Some(&KeyEvent::Other)), EventDisposition::NotHandled);
    assert!(h.assembler.buffer_snapshot().is_empty());
}

#[test]
fn test_text_and_enter_are_consumed() {
    let h = Harness::listening("qr_", "\r");
    let adapter = KeyEventAdapter::new(&h.assembler);

    for c in "qr_abc".chars() {
        assert!(adapter.handle_event(Some(&KeyEvent::char(c))).is_consumed());
    }
    assert!(adapter
        .handle_event(Some(&KeyEvent::Control(ControlKey::Enter)))
        .is_consumed());

    assert_eq!(h.drain(), strings(&["abc"]));
}

#[test]
fn test_tab_suffix() {
    let h = Harness::listening("", "\t");
    let adapter = KeyEventAdapter::new(&h.assembler);

    adapter.handle_event(Some(&KeyEvent::Text("https://x.com".to_string())));
    adapter.handle_event(Some(&KeyEvent::Control(ControlKey::Tab)));

    assert_eq!(h.drain(), strings(&["https://x.com"]));
}
