// RTMP client sessions

mod address;
mod config;
mod connection;
mod correlation;
mod error;
mod media;
mod publisher;
mod subscriber;
mod timestamps;

pub use address::*;
pub use config::*;
pub use connection::*;
pub use correlation::*;
pub use error::*;
pub use media::*;
pub use publisher::*;
pub use subscriber::*;
pub use timestamps::*;
