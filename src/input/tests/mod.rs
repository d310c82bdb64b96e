//! Input hook tests
//!
//! - Terminal key translation (no terminal required)
//! - Line reader feeding a live assembler

#[cfg(test)]
mod line_tests;
