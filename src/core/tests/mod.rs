//! Core module tests
//!
//! Contains test suites for core functionality:
//! - Frame assembly (framing, resync, timeout, auto-stop, threading)
//! - Key event adapter mapping and consumption
//! - Input hook lifecycle
//! - Home thread task queue
//! - URL validation and domain policy
//! - Type tests (Framing, newline normalisation)
//!
//! Assembler tests run a real home loop on a spawned thread; see
//! [`harness::Harness`].

#[cfg(test)]
mod adapter_tests;
#[cfg(test)]
mod types_tests;

#[cfg(test)]
pub(crate) mod harness {
    use crossbeam_channel::{unbounded, Receiver};
    use std::{thread::JoinHandle, time::Duration};

    use crate::core::{AssemblerConfig, HomeHandle, HomeLoop, ScanFrameAssembler};

    const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

    /// An assembler wired to a home thread, collecting every emission
    pub(crate) struct Harness {
        pub home: HomeHandle,
        pub assembler: ScanFrameAssembler,
        pub scans: Receiver<String>,
        join: Option<JoinHandle<()>>,
    }

    impl Harness {
        pub fn new(config: AssemblerConfig) -> Self {
            let (home, join) = HomeLoop::spawn("test-home").unwrap();
            let assembler = ScanFrameAssembler::new(config, home.clone());

            let (tx, scans) = unbounded();
            assembler.connect(move |payload| {
                let _ = tx.send(payload.to_string());
            });

            Self {
                home,
                assembler,
                scans,
                join: Some(join),
            }
        }

        /// Listening assembler with the given framing and no timeout
        pub fn listening(prefix: &str, suffix: &str) -> Self {
            let harness = Self::new(AssemblerConfig::new(prefix, suffix, 0.0).unwrap());
            let _ = harness.assembler.start();
            harness
        }

        /// Waits until everything posted so far has run on the home thread
        pub fn flush(&self) {
            flush(&self.home);
        }

        /// Flushes, then returns every payload emitted so far
        pub fn drain(&self) -> Vec<String> {
            self.flush();
            self.scans.try_iter().collect()
        }
    }

    impl Drop for Harness {
        fn drop(&mut self) {
            self.home.quit();
            if let Some(join) = self.join.take() {
                let _ = join.join();
            }
        }
    }

    /// Posts a marker task and blocks until the home thread reaches it
    pub fn flush(home: &HomeHandle) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        home.post(move || {
            let _ = tx.send(());
        })
        .unwrap();
        rx.recv_timeout(FLUSH_TIMEOUT)
            .expect("home thread did not reach flush barrier");
    }

    pub fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }
}
