//! src/core/types.rs
//!
//! Core type definitions for scanner input
//!
//! This module defines the fundamental types used throughout the listener:
//! - `KeyEvent`: A normalised key press (literal text, control key, or other)
//! - `ControlKey`: The control keys a keyboard-emulating scanner emits
//! - `EventDisposition`: Whether an input hook should swallow an event
//! - `Framing`: The prefix/suffix pair that delimits one scan
//!
//! All newline variants are canonicalised to a single carriage return
//! before they reach a buffer or are compared against framing.

use std::borrow::Cow;
use std::fmt;

/// The single control character every newline variant is folded into.
pub const CANONICAL_NEWLINE: &str = "\r";

/// What a Tab key press is fed as.
pub const TAB: &str = "\t";

/// Folds `"\r\n"` and `"\n"` into [`CANONICAL_NEWLINE`].
///
/// Borrows when the input contains no line feed, which is the common case
/// for per-keystroke chunks.
///
/// # Example
/// ```
/// use openqr::core::normalize_newlines;
///
/// assert_eq!(normalize_newlines("a\r\nb\nc\r"), "a\rb\rc\r");
/// ```
pub fn normalize_newlines(input: &str) -> Cow<'_, str> {
    if !input.contains('\n') {
        return Cow::Borrowed(input);
    }

    Cow::Owned(
        input
            .replace("\r\n", CANONICAL_NEWLINE)
            .replace('\n', CANONICAL_NEWLINE),
    )
}

/// Control keys that produce framing characters
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ControlKey {
    /// Main Return key
    Return,
    /// Keypad Enter key
    Enter,
    /// Tab key
    Tab,
}

impl fmt::Display for ControlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlKey::Return => write!(f, "Return"),
            ControlKey::Enter => write!(f, "Enter"),
            ControlKey::Tab => write!(f, "Tab"),
        }
    }
}

/// A platform key press, reduced to what the listener cares about
///
/// Input hooks translate their native events (terminal key codes, reader
/// lines, ...) into this variant so nothing downstream has to inspect
/// optional text/keycode fields.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum KeyEvent {
    /// A key that produced literal text
    Text(String),
    /// Return, Enter or Tab
    Control(ControlKey),
    /// Anything else (modifiers, arrows, function keys)
    Other,
}

impl KeyEvent {
    /// Convenience constructor for a single typed character
    pub fn char(c: char) -> Self {
        KeyEvent::Text(c.to_string())
    }
}

/// Result of offering a key event to the adapter
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventDisposition {
    /// The event was fed to the listener and must not reach the UI
    Consumed,
    /// The event was ignored and should propagate normally
    NotHandled,
}

impl EventDisposition {
    pub fn is_consumed(self) -> bool {
        matches!(self, EventDisposition::Consumed)
    }
}

/// Prefix/suffix pair delimiting a scan frame
///
/// Both halves are newline-canonicalised on construction, so a suffix
/// configured as `"\n"` or `"\r\n"` matches the `"\r"` a scanner's Enter
/// key is turned into.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Framing {
    prefix: String,
    suffix: String,
}

impl Framing {
    pub fn new(prefix: &str, suffix: &str) -> Self {
        Self {
            prefix: normalize_newlines(prefix).into_owned(),
            suffix: normalize_newlines(suffix).into_owned(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Strips prefix and suffix from a complete raw frame
    ///
    /// Returns `None` when the frame does not start with the prefix or end
    /// with the suffix. The suffix is matched after the prefix, so the two
    /// never overlap.
    pub fn strip<'a>(&self, raw: &'a str) -> Option<&'a str> {
        raw.strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prefix={:?}, suffix={:?}", self.prefix, self.suffix)
    }
}
