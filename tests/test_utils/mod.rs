pub mod collector;
pub mod shared_buffer;

pub use collector::{Collector, tcp_collector};
pub use shared_buffer::{SharedBuf, read_output};
