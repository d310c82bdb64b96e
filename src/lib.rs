// Copyright 2025 bakri (tidynest@proton.me)
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

//! OpenQR
//!
//! Listens for keyboard-emulated QR/barcode scanners and generates QR codes.
//!
//! # Features
//!
//! - **Scan assembly:** Reconstructs framed scans (prefix + payload + suffix)
//!   from a stream of individual keystrokes, from any thread
//! - **Inactivity timeout:** Abandoned partial scans are discarded
//! - **Input hooks:** Raw terminal keys or line-oriented readers
//! - **URL policy:** Scheme whitelist plus domain allow/block lists
//! - **QR generation:** Cached PNGs, custom colours, logo overlay, clipboard
//! - **History:** Persisted scan log with timestamps
//!
//! # Architecture
//!
//! - **`core`:** Scan assembly, key adapter, home-thread loop, URL validation
//! - **`config`:** Settings schema, escaped framing strings, atomic writes
//! - **`input`:** Concrete input hooks (terminal, line reader)
//! - **`generator`:** QR rendering and caching
//! - **`history`:** Scan history persistence
//! - **`watcher`:** Live reload when the settings file changes
//! - **`logging`:** Subscriber setup for the binary
//!
//! # Examples
//!
//! ## Assembling scans
//!
//! ```
//! use openqr::core::{AssemblerConfig, HomeLoop, ScanFrameAssembler};
//! use std::sync::{Arc, Mutex};
//!
//! let mut home = HomeLoop::new();
//! let config = AssemblerConfig::new("qr_", "\r", 0.0)?;
//! let assembler = ScanFrameAssembler::new(config, home.handle());
//!
//! let scans = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&scans);
//! assembler.connect(move |url| sink.lock().unwrap().push(url.to_string()));
//!
//! let _ = assembler.start();
//! assembler.feed("qr_https://example.com\r");
//! home.run_pending();
//!
//! assert_eq!(*scans.lock().unwrap(), vec!["https://example.com"]);
//! # Ok::<(), openqr::core::ListenerError>(())
//! ```
//!
//! ## Generating a code
//!
//! ```no_run
//! use openqr::generator::{QrGenerator, QrStyle};
//!
//! let generator = QrGenerator::new()?;
//! let image = generator.generate("example.com", &QrStyle::new("navy", "white"))?;
//! generator.save(&image, "example.png")?;
//! # Ok::<(), openqr::generator::GeneratorError>(())
//! ```

pub mod config;
pub mod core;
pub mod generator;
pub mod history;
pub mod input;
pub mod logging;
pub mod watcher;

// Re-export commonly used types for convenience
pub use core::{AssemblerConfig, HomeLoop, KeyEvent, ScanFrameAssembler};
