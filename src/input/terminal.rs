// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Terminal keyboard hook
//!
//! Puts the terminal in raw mode so every keystroke arrives individually
//! (no line editing, no echo), then reads key events on a dedicated thread.
//!
//! The thread waits in `crossterm::event::poll` with a short timeout so that
//! `remove()` can stop it cooperatively; input is processed as soon as it
//! arrives, the timeout only bounds shutdown latency.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent as TermKeyEvent, KeyEventKind, KeyModifiers},
    terminal,
};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use super::Notify;
use crate::core::{ControlKey, HookError, InputHook, KeyEvent, KeyEventAdapter};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Converts a terminal key press into a listener key event
///
/// Returns `None` for key releases. Characters typed with Ctrl or Alt held
/// are reported as [`KeyEvent::Other`] since a scanner never sends them.
pub fn translate_key(event: &TermKeyEvent) -> Option<KeyEvent> {
    if event.kind == KeyEventKind::Release {
        return None;
    }

    let key = match event.code {
        KeyCode::Char(_) if event.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            KeyEvent::Other
        }
        KeyCode::Char(c) => KeyEvent::char(c),
        KeyCode::Enter => KeyEvent::Control(ControlKey::Return),
        KeyCode::Tab => KeyEvent::Control(ControlKey::Tab),
        _ => KeyEvent::Other,
    };

    Some(key)
}

/// Ctrl+C and Esc end a terminal listening session
pub fn is_interrupt(event: &TermKeyEvent) -> bool {
    if event.kind != KeyEventKind::Press {
        return false;
    }

    match event.code {
        KeyCode::Esc => true,
        KeyCode::Char('c') | KeyCode::Char('C') => event.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Raw-mode terminal input hook
pub struct TerminalHook {
    poll_interval: Duration,
    on_interrupt: Option<Notify>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    raw_mode: bool,
}

impl TerminalHook {
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            on_interrupt: None,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            raw_mode: false,
        }
    }

    /// How often the reader thread checks for shutdown
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Called from the reader thread on Ctrl+C or Esc
    pub fn on_interrupt<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_interrupt = Some(Arc::new(callback));
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && self.handle.is_some()
    }

    fn run_loop(
        running: Arc<AtomicBool>,
        adapter: KeyEventAdapter,
        on_interrupt: Option<Notify>,
        poll_interval: Duration,
    ) {
        while running.load(Ordering::SeqCst) {
            match event::poll(poll_interval) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => {
                        if is_interrupt(&key) {
                            tracing::debug!("Interrupt key pressed");
                            if let Some(callback) = &on_interrupt {
                                callback();
                            }
                            continue;
                        }

                        let translated = translate_key(&key);
                        if translated.is_some() {
                            let disposition = adapter.handle_event(translated.as_ref());
                            tracing::trace!(key = ?key.code, ?disposition, "Terminal key");
                        }
                    }
                    Ok(_) => {}
                    // Might be transient (e.g. signal interrupt)
                    Err(e) => tracing::debug!(error = %e, "Terminal read error"),
                },
                Ok(false) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "Terminal poll failed; stopping input thread");
                    break;
                }
            }
        }
    }

    fn leave_raw_mode(&mut self) {
        if self.raw_mode {
            if let Err(e) = terminal::disable_raw_mode() {
                tracing::warn!(error = %e, "Failed to restore terminal mode");
            }
            self.raw_mode = false;
            crate::logging::set_raw_terminal(false);
        }
    }
}

impl Default for TerminalHook {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHook for TerminalHook {
    fn install(&mut self, adapter: KeyEventAdapter) -> Result<(), HookError> {
        terminal::enable_raw_mode()?;
        self.raw_mode = true;
        crate::logging::set_raw_terminal(true);

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let on_interrupt = self.on_interrupt.clone();
        let poll_interval = self.poll_interval;

        let spawned = thread::Builder::new()
            .name("openqr-terminal".to_string())
            .spawn(move || Self::run_loop(running, adapter, on_interrupt, poll_interval));

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                self.leave_raw_mode();
                Err(e.into())
            }
        }
    }

    fn remove(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.handle.take() {
            // Exits within one poll interval
            let _ = handle.join();
        }

        self.leave_raw_mode();
    }

    fn name(&self) -> &str {
        "terminal"
    }
}

impl Drop for TerminalHook {
    fn drop(&mut self) {
        self.remove();
    }
}
