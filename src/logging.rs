//! Tracing subscriber setup for the binary
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the application. Logs go to stderr so stdout stays clean for scanned
//! URLs. `RUST_LOG` overrides the `-v` count.
//!
//! While a raw-mode terminal hook is installed the terminal no longer maps
//! `\n` to a carriage return, so log lines are written with `\r\n` instead.

use std::{
    io::{self, Write},
    sync::atomic::{AtomicBool, Ordering},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static RAW_TERMINAL: AtomicBool = AtomicBool::new(false);

/// Log level for a number of `-v` flags
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Switches log output to `\r\n` line endings while the terminal is raw
pub fn set_raw_terminal(raw: bool) {
    RAW_TERMINAL.store(raw, Ordering::SeqCst);
}

pub fn raw_terminal() -> bool {
    RAW_TERMINAL.load(Ordering::SeqCst)
}

/// Writer that expands bare `\n` into `\r\n` when enabled
pub struct CrlfWriter<W> {
    inner: W,
    crlf: bool,
}

impl<W: Write> CrlfWriter<W> {
    pub fn new(inner: W, crlf: bool) -> Self {
        Self { inner, crlf }
    }
}

impl<W: Write> Write for CrlfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.crlf {
            return self.inner.write(buf);
        }

        let mut start = 0;
        for (i, &byte) in buf.iter().enumerate() {
            if byte == b'\n' && (i == 0 || buf[i - 1] != b'\r') {
                self.inner.write_all(&buf[start..i])?;
                self.inner.write_all(b"\r\n")?;
                start = i + 1;
            }
        }
        self.inner.write_all(&buf[start..])?;

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Installs a stderr `fmt` layer filtered by `RUST_LOG` or `verbosity`
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(verbosity: u8) -> bool {
    let level = level_for(verbosity);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("openqr={level},warn")));

    let make_writer = || CrlfWriter::new(io::stderr(), raw_terminal());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(make_writer).with_target(false))
        .try_init()
        .is_ok()
}
