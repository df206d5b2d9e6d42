// Transport session: whole RTMP messages over a byte stream

mod chunk_read;
mod chunk_write;
mod stream;

use std::{future::Future, time::Duration};

pub use chunk_read::*;
pub use chunk_write::*;
pub use stream::*;

use crate::{client::ClientError, rtmp::RtmpMessage};

/// Cloneable handle to send messages from any task
pub trait RtmpMessageSender: Clone + Send + Sync + 'static {
    /// Sends a whole message
    fn send_message(
        &self,
        msg: RtmpMessage,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// Ordered, reliable exchange of whole RTMP messages
pub trait RtmpTransport: Send {
    type Sender: RtmpMessageSender;

    /// Runs the handshake
    fn handshake(&mut self) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Waits for the next message
    ///
    /// Protocol control messages are applied before being returned
    fn receive_message(&mut self) -> impl Future<Output = Result<RtmpMessage, ClientError>> + Send;

    /// Sends a whole message
    fn send_message(
        &mut self,
        msg: RtmpMessage,
    ) -> impl Future<Output = Result<(), ClientError>> + Send {
        let sender = self.sender();
        async move { sender.send_message(msg).await }
    }

    /// Gets a sender sharing this transport's write side
    fn sender(&self) -> Self::Sender;

    /// Sets the max time to wait for each read (None = wait forever)
    fn set_read_timeout(&mut self, read_timeout: Option<Duration>);

    /// Chunk size used by the peer
    fn read_chunk_size(&self) -> usize;

    /// Chunk size used to send
    fn write_chunk_size(&self) -> usize;

    /// Bandwidth estimate set by the peer
    fn bandwidth(&self) -> u32;
}
