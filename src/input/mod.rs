//! Concrete input hooks
//!
//! - [`TerminalHook`]: raw-mode terminal keys through crossterm, for a
//!   scanner typing into the terminal running `openqr listen`
//! - [`LineHook`]: any line-oriented reader (piped stdin, a serial console
//!   dump), one scan per line
//!
//! Both run their own reader thread and hand every key to a
//! [`KeyEventAdapter`](crate::core::KeyEventAdapter); neither touches the
//! assembler directly.

pub mod line;
pub mod terminal;

use std::sync::Arc;

pub use line::LineHook;
pub use terminal::{translate_key, TerminalHook};

/// Callback fired from a reader thread (interrupt key, end of input)
pub type Notify = Arc<dyn Fn() + Send + Sync + 'static>;

#[cfg(test)]
mod tests;
