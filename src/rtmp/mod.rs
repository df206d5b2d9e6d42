// RTMP protocol utilities

mod command;
mod constants;
mod handshake;
mod invoke;
mod message;
mod messages;
mod packet;

pub use command::*;
pub use constants::*;
pub use handshake::*;
pub use invoke::*;
pub use message::*;
pub use messages::*;
pub use packet::*;
