//! Config module tests
//!
//! - Settings load/save, defaults and validation
//! - Escape sequence decoding and encoding

#[cfg(test)]
mod escapes_tests;
