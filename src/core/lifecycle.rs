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

//! Input hook lifecycle
//!
//! An [`InputHook`] is the platform side of the listener: something that
//! captures key presses (a raw terminal, a reader thread, a global keyboard
//! hook) and offers them to a [`KeyEventAdapter`]. Hooks may only be
//! installed or removed on the home thread, so `start()`/`stop()` flip the
//! listening flag synchronously and post the hook work asynchronously.

use parking_lot::Mutex;
use std::{
    io,
    sync::atomic::{AtomicBool, Ordering},
};
use thiserror::Error;

use crate::core::adapter::KeyEventAdapter;

/// Errors an input hook can report while installing
#[derive(Debug, Error)]
pub enum HookError {
    /// The input device or event source is not available
    #[error("Input source unavailable: {0}")]
    Unavailable(String),

    /// Generic I/O error (terminal mode switch, thread spawn)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Platform event source feeding the listener
///
/// `install` and `remove` are always invoked on the home thread. `install`
/// is never called twice without a `remove` in between.
pub trait InputHook: Send {
    /// Starts delivering key events to `adapter`
    fn install(&mut self, adapter: KeyEventAdapter) -> Result<(), HookError>;

    /// Stops delivering key events and releases the event source
    fn remove(&mut self);

    /// Human-readable name used in logs
    fn name(&self) -> &str {
        "input hook"
    }
}

/// Outcome of requesting hook installation from `start()`
#[must_use]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HookStatus {
    /// No hook is attached; input must be fed directly
    NoHook,
    /// Installation was queued on the home thread
    Scheduled,
    /// The home thread is gone; listening is on but nothing will capture keys
    HostUnavailable,
}

#[derive(Default)]
struct SlotState {
    hook: Option<Box<dyn InputHook>>,
    installed: bool,
}

/// Holds the attached hook and whether it is currently installed
#[derive(Default)]
pub(crate) struct HookSlot {
    state: Mutex<SlotState>,
    // Readable while a hook is mid install/remove (which may block on its
    // reader thread)
    attached: AtomicBool,
}

impl HookSlot {
    /// Replaces the attached hook, removing the previous one if installed
    pub(crate) fn attach(&self, hook: Box<dyn InputHook>) {
        let mut state = self.state.lock();
        if state.installed {
            if let Some(previous) = state.hook.as_mut() {
                previous.remove();
            }
            state.installed = false;
        }
        state.hook = Some(hook);
        self.attached.store(true, Ordering::SeqCst);
    }

    pub(crate) fn has_hook(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    pub(crate) fn is_installed(&self) -> bool {
        self.state.lock().installed
    }

    /// Installs the hook; must run on the home thread
    pub(crate) fn install(&self, adapter: KeyEventAdapter) {
        let mut state = self.state.lock();
        if state.installed {
            tracing::debug!("Input hook already installed; skipping");
            return;
        }

        let Some(hook) = state.hook.as_mut() else {
            return;
        };

        match hook.install(adapter) {
            Ok(()) => {
                tracing::info!(hook = hook.name(), "Input hook installed");
                state.installed = true;
            }
            Err(e) => {
                tracing::warn!(
                    hook = hook.name(),
                    error = %e,
                    "Input hook could not be installed; listener is inert"
                );
            }
        }
    }

    /// Removes the hook if installed; must run on the home thread
    pub(crate) fn remove(&self) {
        let mut state = self.state.lock();
        if !state.installed {
            tracing::debug!("No input hook installed; skipping removal");
            return;
        }

        if let Some(hook) = state.hook.as_mut() {
            hook.remove();
            tracing::info!(hook = hook.name(), "Input hook removed");
        }
        state.installed = false;
    }
}
