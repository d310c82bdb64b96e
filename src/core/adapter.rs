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

//! Key event adapter
//!
//! Translates [`KeyEvent`]s into the character chunks the assembler
//! expects:
//!
//! | Event                 | Fed as          |
//! |-----------------------|-----------------|
//! | Return / Enter        | `"\r"`          |
//! | Tab                   | `"\t"`          |
//! | Key producing text    | the text        |
//! | Anything else         | nothing         |
//!
//! The adapter holds a weak reference, so a hook outliving its assembler
//! simply stops consuming events.

use std::sync::Weak;

use crate::core::{
    assembler::{Inner, ScanFrameAssembler},
    types::{ControlKey, EventDisposition, KeyEvent, CANONICAL_NEWLINE, TAB},
};

/// Feeds key events into a [`ScanFrameAssembler`]
#[derive(Clone, Default)]
pub struct KeyEventAdapter {
    target: Weak<Inner>,
}

impl KeyEventAdapter {
    pub fn new(assembler: &ScanFrameAssembler) -> Self {
        Self {
            target: assembler.downgrade(),
        }
    }

    /// An adapter with no assembler behind it; declines every event
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Characters an event should be fed as, if any
    ///
    /// # Example
    /// ```
    /// use openqr::core::{ControlKey, KeyEvent, KeyEventAdapter};
    ///
    /// assert_eq!(KeyEventAdapter::translate(&KeyEvent::Control(ControlKey::Enter)), Some("\r"));
    /// assert_eq!(KeyEventAdapter::translate(&KeyEvent::char('a')), Some("a"));
    /// assert_eq!(KeyEventAdapter::translate(&KeyEvent::Other), None);
    /// ```
    pub fn translate(event: &KeyEvent) -> Option<&str> {
        match event {
            KeyEvent::Text(text) if !text.is_empty() => Some(text.as_str()),
            KeyEvent::Text(_) | KeyEvent::Other => None,
            KeyEvent::Control(ControlKey::Return | ControlKey::Enter) => Some(CANONICAL_NEWLINE),
            KeyEvent::Control(ControlKey::Tab) => Some(TAB),
        }
    }

    /// Offers one event to the listener
    ///
    /// Returns [`EventDisposition::Consumed`] only when characters were fed;
    /// a missing event, a dropped or idle assembler, or an untranslatable key
    /// all propagate normally.
    pub fn handle_event(&self, event: Option<&KeyEvent>) -> EventDisposition {
        let Some(event) = event else {
            return EventDisposition::NotHandled;
        };

        let Some(assembler) = ScanFrameAssembler::upgrade(&self.target) else {
            return EventDisposition::NotHandled;
        };

        if !assembler.is_listening() {
            return EventDisposition::NotHandled;
        }

        match Self::translate(event) {
            Some(chunk) => {
                assembler.feed(chunk);
                EventDisposition::Consumed
            }
            None => EventDisposition::NotHandled,
        }
    }
}

impl std::fmt::Debug for KeyEventAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyEventAdapter")
            .field("attached", &self.is_attached())
            .finish()
    }
}
