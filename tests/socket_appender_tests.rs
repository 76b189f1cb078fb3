//! End-to-end tests driving the socket appender through the public API.

use std::{io::Write, time::Duration};

use femtoappender::{
    CallerData, CallerDataProcessor, FemtoAppender, FemtoLevel, FemtoLogAppender, FemtoLogEvent,
    JsonEncoder, LineEncoder, MessagePackEncoder, PlainFormatter, SocketAppenderBuilder,
    SocketAppenderConfig,
};
use rstest::rstest;
use serde::Deserialize;
use tempfile::NamedTempFile;

mod test_utils;
use test_utils::{Collector, tcp_collector};

const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct WireEvent {
    logger: String,
    level: String,
    message: String,
    module_path: Option<String>,
    line_number: Option<u32>,
}

fn caller_event(message: &str) -> FemtoLogEvent {
    FemtoLogEvent::new("svc.http", FemtoLevel::Warn, message)
        .with_caller(CallerData::new("svc::http", "http.rs", 42))
}

fn json_appender(collector: &Collector, include_caller_data: bool) -> FemtoLogAppender {
    SocketAppenderBuilder::new()
        .with_remote_host("127.0.0.1")
        .with_port(collector.port())
        .with_queue_size(8)
        .with_encoder(JsonEncoder::new())
        .with_post_processor(CallerDataProcessor::new(include_caller_data))
        .build()
}

#[rstest]
#[case(true)]
#[case(false)]
fn caller_data_follows_post_processor(
    #[from(tcp_collector)] collector: Collector,
    #[case] include: bool,
) {
    let appender = json_appender(&collector, include);
    appender.start().expect("start appender");
    appender.append(caller_event("slow request"));
    let lines = collector.read_lines(1, WAIT);
    appender.stop();

    let wire: WireEvent = serde_json::from_str(&lines[0]).expect("json event");
    assert_eq!(wire.logger, "svc.http");
    assert_eq!(wire.level, "WARN");
    assert_eq!(wire.message, "slow request");
    assert_eq!(wire.module_path.is_some(), include);
    assert_eq!(wire.line_number, include.then_some(42));
}

#[rstest]
fn messagepack_frames_are_length_prefixed(#[from(tcp_collector)] collector: Collector) {
    let appender = SocketAppenderBuilder::<FemtoLogEvent>::new()
        .with_remote_host("127.0.0.1")
        .with_port(collector.port())
        .with_queue_size(8)
        .with_encoder(MessagePackEncoder::default())
        .build();
    appender.start().expect("start appender");
    appender.append(FemtoLogEvent::new("core", FemtoLevel::Error, "disk full"));

    let header = collector.read_at_least(4, WAIT);
    let len = u32::from_be_bytes(header[..4].try_into().expect("length prefix")) as usize;
    let mut frame = header[4..].to_vec();
    if frame.len() < len {
        frame.extend(collector.read_at_least(len - frame.len(), WAIT));
    }
    appender.stop();

    let wire: WireEvent = rmp_serde::from_slice(&frame[..len]).expect("msgpack event");
    assert_eq!(wire.logger, "core");
    assert_eq!(wire.level, "ERROR");
    assert_eq!(wire.message, "disk full");
}

#[rstest]
fn appender_configured_from_ini_file(#[from(tcp_collector)] collector: Collector) {
    let mut file = NamedTempFile::new().expect("temp file");
    write!(
        file,
        "[appender]\nremoteHost = 127.0.0.1\nport = {}\nreconnectionDelay = 50\nqueueSize = 4\n",
        collector.port()
    )
    .expect("write ini");
    let config = SocketAppenderConfig::from_ini_file(file.path()).expect("load ini");
    assert_eq!(config.queue_size, 4);

    let appender = SocketAppenderBuilder::<FemtoLogEvent>::new()
        .with_config(config)
        .with_encoder(LineEncoder::new(PlainFormatter))
        .build();
    appender.start().expect("start appender");
    appender.append(FemtoLogEvent::new("ini", FemtoLevel::Info, "configured"));
    assert_eq!(collector.read_lines(1, WAIT), vec!["ini [INFO] configured"]);
    appender.stop();
}

#[rstest]
fn events_from_many_threads_all_arrive(#[from(tcp_collector)] collector: Collector) {
    let appender = SocketAppenderBuilder::<FemtoLogEvent>::new()
        .with_remote_host("127.0.0.1")
        .with_port(collector.port())
        .with_queue_size(256)
        .with_encoder(LineEncoder::new(PlainFormatter))
        .build();
    appender.start().expect("start appender");
    std::thread::scope(|scope| {
        for worker in 0..4 {
            let appender = &appender;
            scope.spawn(move || {
                for n in 0..25 {
                    appender.append(FemtoLogEvent::new(
                        &format!("worker{worker}"),
                        FemtoLevel::Info,
                        &n.to_string(),
                    ));
                }
            });
        }
    });
    let lines = collector.read_lines(100, WAIT);
    appender.stop();
    assert_eq!(lines.len(), 100);
    for worker in 0..4 {
        let prefix = format!("worker{worker} [INFO] ");
        let seen: Vec<u32> = lines
            .iter()
            .filter_map(|line| line.strip_prefix(&prefix))
            .map(|n| n.parse().expect("sequence number"))
            .collect();
        assert_eq!(seen, (0..25).collect::<Vec<_>>(), "per-thread order kept");
    }
}
