//! Encoders turn events into bytes on a connection's output stream.
//!
//! The socket appender hands each new connection's writer to
//! [`Encoder::init`], then calls [`Encoder::encode`] once per event and
//! [`Encoder::close`] when the appender stops. Encoders own the writer
//! between `init` and `close`, flush after each event, and return
//! [`io::ErrorKind::NotConnected`] when used without a writer.

use std::io::{self, Write};

mod line;
mod serialise;

pub use line::LineEncoder;
pub use serialise::{
    DEFAULT_MAX_FRAME_SIZE, JsonEncoder, MessagePackEncoder, frame_payload, serialise_json,
    serialise_msgpack,
};

/// Boxed writer handed to an encoder.
pub type EncoderWriter = Box<dyn Write + Send>;

/// Converts events of type `E` into bytes.
pub trait Encoder<E>: Send {
    /// Bind the encoder to a fresh output stream, writing any header.
    fn init(&mut self, writer: EncoderWriter) -> io::Result<()>;

    /// Write a single event.
    fn encode(&mut self, event: &E) -> io::Result<()>;

    /// Write any footer, flush, and release the output stream.
    fn close(&mut self) -> io::Result<()>;
}

impl<E, T: Encoder<E> + ?Sized> Encoder<E> for Box<T> {
    fn init(&mut self, writer: EncoderWriter) -> io::Result<()> {
        (**self).init(writer)
    }

    fn encode(&mut self, event: &E) -> io::Result<()> {
        (**self).encode(event)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Writer slot shared by the bundled encoders.
#[derive(Default)]
pub(crate) struct EncoderOutput {
    writer: Option<EncoderWriter>,
}

impl EncoderOutput {
    pub(crate) fn replace(&mut self, writer: EncoderWriter) {
        self.writer = Some(writer);
    }

    pub(crate) fn writer(&mut self) -> io::Result<&mut EncoderWriter> {
        self.writer.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "encoder has no output stream")
        })
    }

    /// Write a complete buffer and flush it to the stream.
    pub(crate) fn write_flushed(&mut self, buf: &[u8]) -> io::Result<()> {
        let writer = self.writer()?;
        writer.write_all(buf)?;
        writer.flush()
    }

    /// Flush and drop the writer. Closing an unbound output is a no-op.
    pub(crate) fn close(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for EncoderOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderOutput")
            .field("bound", &self.writer.is_some())
            .finish()
    }
}
