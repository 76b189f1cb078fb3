//! Thread-safe byte buffer for capturing encoder output in tests.

use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};

/// Writer appending into a shared `Vec<u8>`.
///
/// The inner buffer stays private so tests can't bypass the `Write`
/// implementation or mutate the buffer without locking.
#[derive(Clone, Default)]
pub struct SharedBuf {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuf {
    pub fn new(buffer: Arc<Mutex<Vec<u8>>>) -> Self {
        Self { buffer }
    }

    /// Snapshot of the buffer contents.
    #[allow(dead_code)]
    pub fn contents(&self) -> Vec<u8> {
        self.buffer
            .lock()
            .expect("SharedBuf mutex poisoned")
            .clone()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .expect("SharedBuf mutex poisoned")
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[allow(dead_code)]
pub fn read_output(buffer: &SharedBuf) -> String {
    String::from_utf8(buffer.contents()).expect("Buffer contains invalid UTF-8")
}
