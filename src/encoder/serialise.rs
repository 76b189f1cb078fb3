//! Structured encoders: newline-delimited JSON and framed MessagePack.

use std::{collections::BTreeMap, io, time::UNIX_EPOCH};

use rmp_serde::Serializer;
use serde::Serialize;

use super::{Encoder, EncoderOutput, EncoderWriter};
use crate::log_event::FemtoLogEvent;

/// Default maximum payload size (in bytes) accepted by the MessagePack encoder.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1 << 20; // 1 MiB

#[derive(Serialize)]
struct SerializableEvent<'a> {
    logger: &'a str,
    level: &'a str,
    message: &'a str,
    timestamp_ms: u128,
    thread_id: String,
    thread_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    module_path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line_number: Option<u32>,
    key_values: &'a BTreeMap<String, String>,
}

impl<'a> From<&'a FemtoLogEvent> for SerializableEvent<'a> {
    fn from(event: &'a FemtoLogEvent) -> Self {
        let timestamp_ms = event
            .metadata
            .timestamp
            .duration_since(UNIX_EPOCH)
            .map(|dur| dur.as_millis())
            .unwrap_or_default();
        let caller = event.metadata.caller.as_ref();

        Self {
            logger: &event.logger,
            level: event.level.as_str(),
            message: &event.message,
            timestamp_ms,
            thread_id: format!("{:?}", event.metadata.thread_id),
            thread_name: event.metadata.thread_name.as_deref(),
            module_path: caller.map(|c| c.module_path.as_str()),
            filename: caller.map(|c| c.filename.as_str()),
            line_number: caller.map(|c| c.line_number),
            key_values: &event.metadata.key_values,
        }
    }
}

/// Serialise an event into a MessagePack map.
pub fn serialise_msgpack(event: &FemtoLogEvent) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(128);
    SerializableEvent::from(event)
        .serialize(&mut Serializer::new(&mut buf).with_struct_map())
        .map_err(io::Error::other)?;
    Ok(buf)
}

/// Serialise an event into a single JSON line, including the trailing newline.
pub fn serialise_json(event: &FemtoLogEvent) -> io::Result<Vec<u8>> {
    let mut buf = serde_json::to_vec(&SerializableEvent::from(event)).map_err(io::Error::other)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Frame the payload with a big-endian length prefix.
pub fn frame_payload(payload: &[u8], max_size: usize) -> Option<Vec<u8>> {
    if payload.len() > max_size {
        return None;
    }
    let len = u32::try_from(payload.len()).ok()?;
    let capacity = payload.len().checked_add(4)?;
    let mut framed = Vec::with_capacity(capacity);
    framed.extend(len.to_be_bytes());
    framed.extend_from_slice(payload);
    Some(framed)
}

/// Writes one JSON object per line.
#[derive(Debug, Default)]
pub struct JsonEncoder {
    output: EncoderOutput,
}

impl JsonEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Encoder<FemtoLogEvent> for JsonEncoder {
    fn init(&mut self, writer: EncoderWriter) -> io::Result<()> {
        self.output.replace(writer);
        Ok(())
    }

    fn encode(&mut self, event: &FemtoLogEvent) -> io::Result<()> {
        let line = serialise_json(event)?;
        self.output.write_flushed(&line)
    }

    fn close(&mut self) -> io::Result<()> {
        self.output.close()
    }
}

/// Writes length-prefixed MessagePack frames.
#[derive(Debug)]
pub struct MessagePackEncoder {
    max_frame_size: usize,
    output: EncoderOutput,
}

impl Default for MessagePackEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl MessagePackEncoder {
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            max_frame_size,
            output: EncoderOutput::default(),
        }
    }
}

impl Encoder<FemtoLogEvent> for MessagePackEncoder {
    fn init(&mut self, writer: EncoderWriter) -> io::Result<()> {
        self.output.replace(writer);
        Ok(())
    }

    fn encode(&mut self, event: &FemtoLogEvent) -> io::Result<()> {
        let payload = serialise_msgpack(event)?;
        let frame = frame_payload(&payload, self.max_frame_size).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "frame too large")
        })?;
        self.output.write_flushed(&frame)
    }

    fn close(&mut self) -> io::Result<()> {
        self.output.close()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use serde::Deserialize;

    use super::*;
    use crate::{level::FemtoLevel, log_event::CallerData};
    use rstest::rstest;

    #[derive(Debug, Deserialize)]
    struct Payload {
        logger: String,
        level: String,
        message: String,
        line_number: Option<u32>,
    }

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("capture lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[rstest]
    fn frame_payload_enforces_limit() {
        let payload = vec![0u8; 32];
        assert!(
            frame_payload(&payload, 16).is_none(),
            "payload larger than limit must be rejected",
        );
    }

    #[rstest]
    fn frame_payload_prefixes_length() {
        let payload = vec![1u8, 2, 3];
        let framed = frame_payload(&payload, 16).expect("payload fits frame");
        assert_eq!(&framed[..4], &3u32.to_be_bytes());
        assert_eq!(&framed[4..], payload);
    }

    #[rstest]
    fn msgpack_carries_caller_when_present() {
        let event = FemtoLogEvent::new("logger", FemtoLevel::Info, "hello")
            .with_caller(CallerData::new("app::db", "db.rs", 42));
        let payload = serialise_msgpack(&event).expect("serialise event");
        let decoded: Payload = rmp_serde::from_slice(&payload).expect("decode payload");
        assert_eq!(decoded.logger, "logger");
        assert_eq!(decoded.level, "INFO");
        assert_eq!(decoded.message, "hello");
        assert_eq!(decoded.line_number, Some(42));
    }

    #[rstest]
    fn json_lines_are_newline_terminated() {
        let event = FemtoLogEvent::new("web", FemtoLevel::Error, "boom");
        let line = serialise_json(&event).expect("serialise event");
        assert_eq!(line.last(), Some(&b'\n'));
        let decoded: Payload = serde_json::from_slice(&line).expect("decode json");
        assert_eq!(decoded.level, "ERROR");
        assert_eq!(decoded.line_number, None);
    }

    #[rstest]
    fn msgpack_encoder_rejects_oversized_frames() {
        let capture = Capture::default();
        let mut encoder = MessagePackEncoder::new(8);
        encoder.init(Box::new(capture.clone())).expect("init");
        let err = encoder
            .encode(&FemtoLogEvent::new("web", FemtoLevel::Info, "too long"))
            .expect_err("frame exceeds limit");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(capture.0.lock().expect("capture lock").is_empty());
    }

    #[rstest]
    fn msgpack_encoder_writes_frames() {
        let capture = Capture::default();
        let mut encoder = MessagePackEncoder::default();
        encoder.init(Box::new(capture.clone())).expect("init");
        encoder
            .encode(&FemtoLogEvent::new("web", FemtoLevel::Info, "ok"))
            .expect("encode");
        let bytes = capture.0.lock().expect("capture lock").clone();
        let len = u32::from_be_bytes(bytes[..4].try_into().expect("prefix")) as usize;
        assert_eq!(bytes.len(), len + 4);
        let decoded: Payload = rmp_serde::from_slice(&bytes[4..]).expect("decode payload");
        assert_eq!(decoded.message, "ok");
    }
}
