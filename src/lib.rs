// RTMP client library

pub mod amf;
pub mod client;
pub mod log;
pub mod rtmp;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod test_utils;
