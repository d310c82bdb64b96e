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

//! src/core/mod.rs
//!
//! Core scanner listener
//!
//! This module contains the streaming machinery that turns keyboard-emulated
//! scanner input into discrete payloads, including:
//! - Type definitions for key events and framing
//! - The scan frame assembler (buffering, resync, extraction, timeout)
//! - The key event adapter feeding it
//! - Input hook lifecycle and the home thread task queue
//! - Payload URL validation with a domain policy
//!
//! Nothing here touches a terminal, the filesystem or the clipboard, so the
//! whole listener is testable with injected input.

pub mod adapter;
pub mod assembler;
pub mod home;
pub mod lifecycle;
pub mod types;
pub mod validator;

pub use adapter::KeyEventAdapter;
pub use assembler::{timeout_from_secs, AssemblerConfig, ListenerError, ScanFrameAssembler, ScanHandler};
pub use home::{HomeError, HomeHandle, HomeLoop};
pub use lifecycle::{HookError, HookStatus, InputHook};
pub use types::*;
pub use validator::{validate_url, DomainPolicy, ValidationError};

#[cfg(test)]
pub(crate) mod tests;
