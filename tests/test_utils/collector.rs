//! In-process TCP collector standing in for a remote log server.

use std::{
    io::Read,
    net::{SocketAddr, TcpListener},
    sync::mpsc,
    thread,
    time::Duration,
};

use rstest::fixture;

/// Accepts connections one after another and forwards every chunk read.
pub struct Collector {
    pub addr: SocketAddr,
    chunks: mpsc::Receiver<(usize, Vec<u8>)>,
}

impl Collector {
    pub fn bind() -> Self {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral listener");
        let addr = listener.local_addr().expect("listener has address");
        let (tx, chunks) = mpsc::channel();
        thread::spawn(move || {
            for (connection, stream) in listener.incoming().enumerate() {
                let Ok(mut stream) = stream else { break };
                let mut buf = [0u8; 4096];
                loop {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if tx.send((connection, buf[..n].to_vec())).is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        });
        Self { addr, chunks }
    }

    /// Port as the appender configuration expects it.
    #[allow(dead_code)]
    pub fn port(&self) -> i64 {
        i64::from(self.addr.port())
    }

    /// Read until at least `len` bytes arrived or `timeout` passed between
    /// chunks.
    #[allow(dead_code)]
    pub fn read_at_least(&self, len: usize, timeout: Duration) -> Vec<u8> {
        let mut received = Vec::new();
        while received.len() < len {
            match self.chunks.recv_timeout(timeout) {
                Ok((_, chunk)) => received.extend_from_slice(&chunk),
                Err(_) => break,
            }
        }
        received
    }

    /// Read complete lines until `count` have arrived.
    #[allow(dead_code)]
    pub fn read_lines(&self, count: usize, timeout: Duration) -> Vec<String> {
        let mut text = String::new();
        while text.lines().count() < count || !text.ends_with('\n') {
            match self.chunks.recv_timeout(timeout) {
                Ok((_, chunk)) => text.push_str(&String::from_utf8_lossy(&chunk)),
                Err(_) => break,
            }
        }
        text.lines().map(str::to_owned).collect()
    }
}

#[fixture]
pub fn tcp_collector() -> Collector {
    Collector::bind()
}
