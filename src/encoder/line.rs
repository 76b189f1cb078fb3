//! Newline-delimited text encoder.

use std::io;

use super::{Encoder, EncoderOutput, EncoderWriter};
use crate::{formatter::FemtoFormatter, log_event::FemtoLogEvent};

/// Writes each event as one formatted line.
#[derive(Debug)]
pub struct LineEncoder<F> {
    formatter: F,
    header: Option<String>,
    footer: Option<String>,
    output: EncoderOutput,
}

impl<F: FemtoFormatter> LineEncoder<F> {
    pub fn new(formatter: F) -> Self {
        Self {
            formatter,
            header: None,
            footer: None,
            output: EncoderOutput::default(),
        }
    }

    /// Line written whenever a new connection is bound.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Line written when the encoder is closed.
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        self.output.write_flushed(&buf)
    }
}

impl<F: FemtoFormatter> Encoder<FemtoLogEvent> for LineEncoder<F> {
    fn init(&mut self, writer: EncoderWriter) -> io::Result<()> {
        self.output.replace(writer);
        if let Some(header) = self.header.clone() {
            self.write_line(&header)?;
        }
        Ok(())
    }

    fn encode(&mut self, event: &FemtoLogEvent) -> io::Result<()> {
        let line = self.formatter.format(event);
        self.write_line(&line)
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(footer) = self.footer.clone() {
            self.write_line(&footer)?;
        }
        self.output.close()
    }
}
