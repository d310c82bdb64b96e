//! Generator module tests
//!
//! - Cache naming, hits and clearing
//! - Rendering layout and colours
//! - Logo overlay placement
//! - Colour parsing

#[cfg(test)]
mod color_tests;
#[cfg(test)]
mod generator_tests;
