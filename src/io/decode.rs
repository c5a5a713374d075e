//! Background decoding.
//!
//! Decoding is the only step that runs off the caller's thread. Each request
//! gets its own single-use channel; dropping the receiver abandons the request,
//! and a result that arrives for an abandoned request is discarded.

use std::path::PathBuf;
use std::thread;

use crossbeam::channel::{self, Receiver};
use tracing::{debug, info};

use crate::audio::file::{DecodeResult, decode_bytes, decode_file};

/// A decode in flight. Holds the only receiver for its result.
pub struct DecodeRequest {
    receiver: Receiver<DecodeResult>,
}

impl DecodeRequest {
    fn spawn<F>(label: String, job: F) -> Self
    where
        F: FnOnce() -> DecodeResult + Send + 'static,
    {
        let (sender, receiver) = channel::bounded(1);
        thread::spawn(move || {
            debug!("Decoding {}", label);
            let result = job();
            if sender.send(result).is_err() {
                info!("Decode of {} finished after it was superseded", label);
            }
        });
        Self { receiver }
    }

    /// Decode a file from disk on a worker thread.
    pub fn from_path(path: PathBuf) -> Self {
        Self::spawn(path.display().to_string(), move || decode_file(&path))
    }

    /// Decode in-memory file contents on a worker thread.
    pub fn from_bytes(file_name: String, data: Vec<u8>) -> Self {
        Self::spawn(file_name.clone(), move || decode_bytes(&file_name, data))
    }

    /// Block until the decode finishes.
    ///
    /// Returns `None` only if the worker died without reporting.
    pub fn wait(self) -> Option<DecodeResult> {
        self.receiver.recv().ok()
    }
}
