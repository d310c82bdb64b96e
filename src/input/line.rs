//! Line-oriented input hook
//!
//! Treats each line of a reader as one burst of typed text followed by
//! Return. Useful when scanner output is piped in (`scanner-dump | openqr
//! listen --stdin`) or for driving the listener from a file.

use std::{
    io::{self, BufRead, BufReader},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use super::Notify;
use crate::core::{ControlKey, HookError, InputHook, KeyEvent, KeyEventAdapter};

pub struct LineHook {
    reader: Option<Box<dyn BufRead + Send>>,
    on_eof: Option<Notify>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl LineHook {
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        Self {
            reader: Some(Box::new(reader)),
            on_eof: None,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(io::stdin()))
    }

    /// Called from the reader thread once the input is exhausted
    pub fn on_eof<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_eof = Some(Arc::new(callback));
        self
    }

    fn run_loop(
        reader: Box<dyn BufRead + Send>,
        running: Arc<AtomicBool>,
        adapter: KeyEventAdapter,
        on_eof: Option<Notify>,
    ) {
        let enter = KeyEvent::Control(ControlKey::Return);

        for line in reader.lines() {
            if !running.load(Ordering::SeqCst) {
                return;
            }

            match line {
                Ok(line) => {
                    adapter.handle_event(Some(&KeyEvent::Text(line)));
                    adapter.handle_event(Some(&enter));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Input read failed");
                    break;
                }
            }
        }

        tracing::debug!("End of line input");
        if let Some(callback) = on_eof {
            callback();
        }
    }
}

impl InputHook for LineHook {
    fn install(&mut self, adapter: KeyEventAdapter) -> Result<(), HookError> {
        let reader = self
            .reader
            .take()
            .ok_or_else(|| HookError::Unavailable("line input already consumed".to_string()))?;

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let on_eof = self.on_eof.clone();

        let handle = thread::Builder::new()
            .name("openqr-lines".to_string())
            .spawn(move || Self::run_loop(reader, running, adapter, on_eof))?;

        self.handle = Some(handle);
        Ok(())
    }

    /// Stops forwarding lines
    ///
    /// A blocking read cannot be interrupted, so the reader thread is
    /// detached and exits after its next line.
    fn remove(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if self.handle.take().is_some() {
            tracing::debug!("Line reader detached");
        }
    }

    fn name(&self) -> &str {
        "line reader"
    }
}
