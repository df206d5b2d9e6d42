// Chunk write logic

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use byteorder::{BigEndian, ByteOrder};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{
    client::ClientError,
    rtmp::{RtmpMessage, RTMP_DEFAULT_CHUNK_SIZE, RTMP_TYPE_SET_CHUNK_SIZE},
};

/// Splits RTMP messages into chunks and writes them
pub struct ChunkWriter<TW: AsyncWrite + Unpin> {
    /// Stream to write to
    stream: TW,

    /// Chunk size for outgoing messages
    chunk_size: Arc<AtomicUsize>,
}

impl<TW: AsyncWrite + Unpin> ChunkWriter<TW> {
    /// Creates ChunkWriter
    pub fn new(stream: TW) -> ChunkWriter<TW> {
        ChunkWriter {
            stream,
            chunk_size: Arc::new(AtomicUsize::new(RTMP_DEFAULT_CHUNK_SIZE)),
        }
    }

    /// Gets a handle to read the chunk size without locking the writer
    pub fn chunk_size_handle(&self) -> Arc<AtomicUsize> {
        self.chunk_size.clone()
    }

    /// Gets the current chunk size
    pub fn chunk_size(&self) -> usize {
        self.chunk_size.load(Ordering::Relaxed)
    }

    /// Writes raw bytes (handshake)
    pub async fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Writes a message
    /// A Set Chunk Size message applies to the messages after it
    pub async fn write_message(&mut self, msg: &RtmpMessage) -> Result<(), ClientError> {
        let chunks = msg.to_packet().create_chunks(self.chunk_size());

        self.write_bytes(&chunks).await?;

        if msg.message_type == RTMP_TYPE_SET_CHUNK_SIZE && msg.payload.len() >= 4 {
            let new_size = (BigEndian::read_u32(&msg.payload[0..4]) & 0x7fffffff) as usize;

            if new_size > 0 {
                self.chunk_size.store(new_size, Ordering::Relaxed);
            }
        }

        Ok(())
    }

    /// Closes the write side
    pub async fn shutdown(&mut self) -> Result<(), ClientError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

// Tests
