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

//! Scan frame assembly
//!
//! Keyboard-emulating scanners "type" their payload one key at a time,
//! usually wrapped in a configurable prefix and terminated by Enter. The
//! [`ScanFrameAssembler`] rebuilds discrete scans from that keystroke stream.
//!
//! # Algorithm
//!
//! Every `feed()` appends to a buffer and then, under the lock:
//! 1. **Resynchronises** on the prefix: garbage before the first prefix is
//!    dropped; with no prefix in sight only `len(prefix) - 1` trailing
//!    characters (a possible partial prefix) are kept
//! 2. **Extracts** every complete frame ending in the suffix, left to right
//!
//! Payloads are dispatched to handlers on the home thread after the lock is
//! released, so a handler may call back into the assembler (e.g. `stop()`).
//!
//! # Known limitation
//!
//! Resynchronisation is lossy: if the prefix can occur inside a payload,
//! noise followed by a partial frame can make the assembler lock onto the
//! wrong occurrence. The buffer stays bounded instead.

use parking_lot::{Mutex, RwLock};
use std::{
    sync::{Arc, Weak},
    time::{Duration, Instant},
};
use thiserror::Error;

use crate::core::{
    adapter::KeyEventAdapter,
    home::HomeHandle,
    lifecycle::{HookSlot, HookStatus, InputHook},
    types::{normalize_newlines, Framing, CANONICAL_NEWLINE},
};

/// Frame-completed callback, invoked on the home thread
pub type ScanHandler = Arc<dyn Fn(&str) + Send + Sync + 'static>;

/// Listener configuration errors
#[derive(Debug, Error, PartialEq)]
pub enum ListenerError {
    /// Timeout is negative, NaN or infinite
    #[error("Invalid inactivity timeout: {0} seconds (must be finite and not negative)")]
    InvalidTimeout(f64),
}

/// Converts a timeout in seconds; `0` disables the timeout
pub fn timeout_from_secs(secs: f64) -> Result<Option<Duration>, ListenerError> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(ListenerError::InvalidTimeout(secs));
    }

    if secs == 0.0 {
        Ok(None)
    } else {
        Ok(Some(Duration::from_secs_f64(secs)))
    }
}

/// Initial assembler configuration
#[derive(Clone, Debug, PartialEq)]
pub struct AssemblerConfig {
    pub framing: Framing,
    pub inactivity_timeout: Option<Duration>,
    pub stop_after_first_scan: bool,
}

impl AssemblerConfig {
    /// Builds a configuration, validating the timeout
    ///
    /// # Example
    /// ```
    /// use openqr::core::AssemblerConfig;
    ///
    /// let config = AssemblerConfig::new("qr_", "\n", 1.5)?;
    /// assert_eq!(config.framing.suffix(), "\r");
    ///
    /// assert!(AssemblerConfig::new("", "\r", -1.0).is_err());
    /// # Ok::<(), openqr::core::ListenerError>(())
    /// ```
    pub fn new(prefix: &str, suffix: &str, timeout_secs: f64) -> Result<Self, ListenerError> {
        Ok(Self {
            framing: Framing::new(prefix, suffix),
            inactivity_timeout: timeout_from_secs(timeout_secs)?,
            stop_after_first_scan: false,
        })
    }

    pub fn with_stop_after_first_scan(mut self, enabled: bool) -> Self {
        self.stop_after_first_scan = enabled;
        self
    }
}

impl Default for AssemblerConfig {
    /// No prefix, Enter as suffix, one second inactivity timeout
    fn default() -> Self {
        Self {
            framing: Framing::new("", CANONICAL_NEWLINE),
            inactivity_timeout: Some(Duration::from_secs(1)),
            stop_after_first_scan: false,
        }
    }
}

/// Everything guarded by the assembler lock
struct State {
    framing: Framing,
    buffer: String,
    is_listening: bool,
    /// A stop-after-first-scan frame was taken; input is dropped until the
    /// deferred stop lands
    auto_stop_pending: bool,
    stop_after_first_scan: bool,
    inactivity_timeout: Option<Duration>,
    deadline: Option<Instant>,
    timer_armed: bool,
    /// Last fed chunk ended in `\r`; a leading `\n` next completes a CRLF
    last_was_cr: bool,
}

impl State {
    /// Appends a chunk, folding a CRLF split across two chunks into one `\r`
    fn append(&mut self, chunk: &str) {
        let chunk = if self.last_was_cr {
            chunk.strip_prefix('\n').unwrap_or(chunk)
        } else {
            chunk
        };
        self.last_was_cr = chunk.ends_with('\r');
        self.buffer.push_str(&normalize_newlines(chunk));
    }

    /// Pushes the inactivity deadline forward
    ///
    /// Returns the delay to arm a timer with, if none is in flight.
    fn touch_timer(&mut self, now: Instant) -> Option<Duration> {
        let timeout = self.inactivity_timeout?;
        self.deadline = Some(now + timeout);

        if self.timer_armed {
            None
        } else {
            self.timer_armed = true;
            Some(timeout)
        }
    }

    /// Pulls every complete frame out of the buffer, stripped of framing
    fn extract_frames(&mut self, payloads: &mut Vec<String>) {
        let State {
            framing,
            buffer,
            stop_after_first_scan,
            auto_stop_pending,
            ..
        } = self;

        let prefix = framing.prefix();
        let suffix = framing.suffix();

        loop {
            resync(buffer, prefix);

            // No delimiter, no automatic extraction
            if suffix.is_empty() {
                break;
            }

            let search_from = if !prefix.is_empty() && buffer.starts_with(prefix) {
                prefix.len()
            } else {
                0
            };

            let Some(pos) = buffer[search_from..].find(suffix) else {
                break;
            };

            let end = search_from + pos + suffix.len();
            let raw: String = buffer.drain(..end).collect();

            match framing.strip(&raw) {
                Some(payload) => {
                    payloads.push(payload.to_string());
                    if *stop_after_first_scan {
                        *auto_stop_pending = true;
                        break;
                    }
                }
                None => tracing::debug!(frame = ?raw, "Discarding frame without prefix"),
            }
        }
    }
}

/// Drops buffered characters that cannot belong to a frame
fn resync(buffer: &mut String, prefix: &str) {
    if prefix.is_empty() {
        return;
    }

    match buffer.find(prefix) {
        Some(0) => {}
        Some(idx) => {
            buffer.drain(..idx);
        }
        None => {
            // Keep the longest tail that could still grow into the prefix
            let max_keep = prefix.chars().count().saturating_sub(1);
            let total = buffer.chars().count();
            if total > max_keep {
                let cut = buffer
                    .char_indices()
                    .nth(total - max_keep)
                    .map_or(buffer.len(), |(i, _)| i);
                buffer.drain(..cut);
            }
        }
    }
}

pub(crate) struct Inner {
    state: Mutex<State>,
    handlers: RwLock<Vec<ScanHandler>>,
    home: HomeHandle,
    hook: HookSlot,
}

/// Rebuilds framed scans from a keystroke stream
///
/// Cheap to clone; all clones share one buffer. Safe to feed from any
/// thread. Frame-completed handlers always run on the home thread, in input
/// order.
///
/// # Example
///
/// ```
/// use openqr::core::{AssemblerConfig, HomeLoop, ScanFrameAssembler};
/// use std::sync::{Arc, Mutex};
///
/// let mut home = HomeLoop::new();
/// let assembler = ScanFrameAssembler::new(AssemblerConfig::new("qr_", "\r", 0.0)?, home.handle());
///
/// let scans = Arc::new(Mutex::new(Vec::new()));
/// let sink = scans.clone();
/// assembler.connect(move |url| sink.lock().unwrap().push(url.to_string()));
///
/// let _ = assembler.start();
/// assembler.feed("noiseqr_https://example.com\n");
/// home.run_pending();
///
/// assert_eq!(*scans.lock().unwrap(), vec!["https://example.com".to_string()]);
/// # Ok::<(), openqr::core::ListenerError>(())
/// ```
#[derive(Clone)]
pub struct ScanFrameAssembler {
    inner: Arc<Inner>,
}

impl ScanFrameAssembler {
    pub fn new(config: AssemblerConfig, home: HomeHandle) -> Self {
        tracing::info!(
            framing = %config.framing,
            timeout = ?config.inactivity_timeout,
            stop_after_first_scan = config.stop_after_first_scan,
            "Scan frame assembler initialised"
        );

        let state = State {
            framing: config.framing,
            buffer: String::new(),
            is_listening: false,
            auto_stop_pending: false,
            stop_after_first_scan: config.stop_after_first_scan,
            inactivity_timeout: config.inactivity_timeout,
            deadline: None,
            timer_armed: false,
            last_was_cr: false,
        };

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                handlers: RwLock::new(Vec::new()),
                home,
                hook: HookSlot::default(),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<Inner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Registers a frame-completed handler
    pub fn connect<F>(&self, handler: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.inner.handlers.write().push(Arc::new(handler));
    }

    /// Attaches the platform input hook installed by `start()`
    pub fn attach_hook(&self, hook: Box<dyn InputHook>) {
        self.inner.hook.attach(hook);
    }

    /// True while an attached hook is installed
    pub fn hook_installed(&self) -> bool {
        self.inner.hook.is_installed()
    }

    pub fn home(&self) -> &HomeHandle {
        &self.inner.home
    }

    /// Starts accepting input
    ///
    /// The listening flag flips immediately; installing the input hook is
    /// posted to the home thread. Idempotent.
    pub fn start(&self) -> HookStatus {
        {
            let mut state = self.inner.state.lock();
            state.is_listening = true;
            state.auto_stop_pending = false;
        }
        tracing::info!("Scanner listener started");

        if !self.inner.hook.has_hook() {
            return HookStatus::NoHook;
        }

        let weak = self.downgrade();
        let posted = self.inner.home.post(move || {
            let Some(assembler) = Self::upgrade(&weak) else {
                return;
            };
            if assembler.is_listening() {
                assembler.inner.hook.install(KeyEventAdapter::new(&assembler));
            } else {
                tracing::debug!("Listener stopped before hook install ran; skipping");
            }
        });

        match posted {
            Ok(()) => HookStatus::Scheduled,
            Err(e) => {
                tracing::error!(error = %e, "Cannot install input hook; listener is inert");
                HookStatus::HostUnavailable
            }
        }
    }

    /// Stops accepting input, discards any partial scan and cancels the
    /// inactivity timer. Safe from any thread, idempotent.
    pub fn stop(&self) {
        self.stop_if(|_| true);
    }

    /// Stops when `wanted` holds for the locked state; checked and applied
    /// under one lock
    fn stop_if(&self, wanted: impl FnOnce(&State) -> bool) {
        {
            let mut state = self.inner.state.lock();
            if !wanted(&state) {
                tracing::debug!("Listener restarted before deferred stop ran; keeping it");
                return;
            }
            state.is_listening = false;
            state.auto_stop_pending = false;
            state.buffer.clear();
            state.deadline = None;
            state.last_was_cr = false;
        }
        tracing::info!("Scanner listener stopped");

        if !self.inner.hook.has_hook() {
            return;
        }

        let weak = self.downgrade();
        let posted = self.inner.home.post(move || {
            if let Some(assembler) = Self::upgrade(&weak) {
                assembler.inner.hook.remove();
            }
        });

        if let Err(e) = posted {
            tracing::warn!(error = %e, "Cannot remove input hook");
        }
    }

    /// Replaces prefix and suffix
    ///
    /// Takes effect on the next fed chunk. The buffer is left alone: a scan
    /// already in progress is judged by the new framing.
    pub fn set_framing(&self, prefix: &str, suffix: &str) {
        let framing = Framing::new(prefix, suffix);
        tracing::info!(framing = %framing, "Framing updated");
        self.inner.state.lock().framing = framing;
    }

    pub fn framing(&self) -> Framing {
        self.inner.state.lock().framing.clone()
    }

    pub fn set_stop_after_first_scan(&self, enabled: bool) {
        self.inner.state.lock().stop_after_first_scan = enabled;
    }

    pub fn stop_after_first_scan(&self) -> bool {
        self.inner.state.lock().stop_after_first_scan
    }

    /// Changes the inactivity timeout; `None` disables it
    pub fn set_inactivity_timeout(&self, timeout: Option<Duration>) {
        let mut state = self.inner.state.lock();
        state.inactivity_timeout = timeout;
        if timeout.is_none() {
            state.deadline = None;
        }
    }

    pub fn is_listening(&self) -> bool {
        self.inner.state.lock().is_listening
    }

    /// Copy of the pending, not yet framed input
    pub fn buffer_snapshot(&self) -> String {
        self.inner.state.lock().buffer.clone()
    }

    /// Appends a chunk of typed input and dispatches every completed frame
    ///
    /// Silently ignored while not listening. Returns the number of payloads
    /// dispatched.
    pub fn feed(&self, chunk: &str) -> usize {
        let mut payloads = Vec::new();

        let (arm, auto_stop) = {
            let mut state = self.inner.state.lock();
            if !state.is_listening || state.auto_stop_pending {
                tracing::trace!("Not listening; dropping chunk");
                return 0;
            }

            state.append(chunk);
            tracing::trace!(buffer = ?state.buffer, "Buffer updated");

            let arm = state.touch_timer(Instant::now());
            state.extract_frames(&mut payloads);
            (arm, state.auto_stop_pending)
        };

        if let Some(delay) = arm {
            self.arm_timer(delay);
        }

        let count = payloads.len();
        for payload in payloads {
            self.emit(payload);
        }

        if auto_stop {
            self.schedule_auto_stop();
        }

        count
    }

    /// Strips framing from one complete raw frame and dispatches it
    ///
    /// `feed()` calls this path for every extracted frame; call it directly
    /// when completion is signalled some other way (e.g. with an empty
    /// suffix). Returns the dispatched payload, or `None` on a framing
    /// mismatch.
    pub fn process_scanned_data(&self, raw: &str) -> Option<String> {
        let raw = normalize_newlines(raw);

        let (payload, auto_stop) = {
            let mut state = self.inner.state.lock();
            let Some(payload) = state.framing.strip(&raw).map(str::to_string) else {
                tracing::debug!(frame = ?raw, "Prefix or suffix mismatch");
                return None;
            };

            let auto_stop = state.stop_after_first_scan;
            if auto_stop {
                state.auto_stop_pending = true;
            }
            (payload, auto_stop)
        };

        self.emit(payload.clone());
        if auto_stop {
            self.schedule_auto_stop();
        }

        Some(payload)
    }

    /// Hands a payload to the handlers on the home thread
    fn emit(&self, payload: String) {
        tracing::info!(payload = %payload, "Dispatching scanned payload");

        let handlers = self.inner.handlers.read().clone();
        let posted = self.inner.home.post(move || {
            for handler in &handlers {
                handler(&payload);
            }
        });

        if let Err(e) = posted {
            tracing::error!(error = %e, "Scanned payload dropped");
        }
    }

    fn schedule_auto_stop(&self) {
        let weak = self.downgrade();
        let posted = self.inner.home.post(move || {
            let Some(assembler) = Self::upgrade(&weak) else {
                return;
            };
            // start() or stop() since the scan clears the flag
            assembler.stop_if(|state| state.auto_stop_pending);
        });

        // Without a home thread nothing would ever clear the pending flag
        if posted.is_err() {
            tracing::warn!("Home thread unavailable; stopping inline");
            self.stop();
        }
    }

    fn arm_timer(&self, delay: Duration) {
        let weak = self.downgrade();
        let posted = self.inner.home.post_after(delay, move || {
            if let Some(assembler) = Self::upgrade(&weak) {
                assembler.on_inactivity_timer();
            }
        });

        if posted.is_err() {
            tracing::warn!("Home thread unavailable; inactivity timeout disabled");
            self.inner.state.lock().timer_armed = false;
        }
    }

    /// Runs on the home thread when an armed timer expires
    fn on_inactivity_timer(&self) {
        let rearm = {
            let mut state = self.inner.state.lock();
            match state.deadline {
                None => {
                    state.timer_armed = false;
                    None
                }
                Some(deadline) => {
                    let now = Instant::now();
                    if now < deadline {
                        Some(deadline - now)
                    } else {
                        state.deadline = None;
                        state.timer_armed = false;
                        if !state.buffer.is_empty() {
                            tracing::debug!(
                                discarded = state.buffer.len(),
                                "Clearing scanner buffer after inactivity"
                            );
                            state.buffer.clear();
                        }
                        None
                    }
                }
            }
        };

        if let Some(remaining) = rearm {
            self.arm_timer(remaining);
        }
    }
}

impl std::fmt::Debug for ScanFrameAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ScanFrameAssembler")
            .field("framing", &state.framing)
            .field("is_listening", &state.is_listening)
            .field("buffered", &state.buffer.len())
            .finish()
    }
}
