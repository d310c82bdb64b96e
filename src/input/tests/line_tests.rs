use std::{io::Cursor, time::Duration};

use crate::core::tests::harness::{strings, Harness};
use crate::core::{HookStatus, InputHook, KeyEventAdapter};
use crate::input::LineHook;

/// Attaches a line hook over `input` and waits until it has been read
fn run_lines(h: &Harness, input: &'static str) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let hook = LineHook::from_reader(Cursor::new(input)).on_eof(move || {
        let _ = tx.send(());
    });
    h.assembler.attach_hook(Box::new(hook));

    assert_eq!(h.assembler.start(), HookStatus::Scheduled);
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
}

#[test]
fn test_one_scan_per_line() {
    let h = Harness::new(crate::core::AssemblerConfig::new("qr_", "\r", 0.0).unwrap());

    run_lines(&h, "qr_https://a.example\nqr_https://b.example\r\n");

    assert_eq!(h.drain(), strings(&["https://a.example", "https://b.example"]));
}

#[test]
fn test_unframed_lines_dropped() {
    let h = Harness::new(crate::core::AssemblerConfig::new("qr_", "\r", 0.0).unwrap());

    run_lines(&h, "hello\nqr_https://a.example\n\nnoise\n");

    assert_eq!(h.drain(), strings(&["https://a.example"]));
}

#[test]
fn test_reader_consumed_once() {
    let mut hook = LineHook::from_reader(Cursor::new(""));

    assert!(hook.install(KeyEventAdapter::detached()).is_ok());
    assert!(hook.install(KeyEventAdapter::detached()).is_err());
    hook.remove();
}
