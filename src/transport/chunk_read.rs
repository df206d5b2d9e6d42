// Chunk read logic

use std::{collections::HashMap, time::Duration};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{
    client::ClientError,
    rtmp::{
        get_rtmp_header_size, RtmpMessage, RTMP_CHUNK_TYPE_0, RTMP_CHUNK_TYPE_1,
        RTMP_CHUNK_TYPE_2, RTMP_CHUNK_TYPE_3, RTMP_DEFAULT_CHUNK_SIZE, RTMP_EXTENDED_TIMESTAMP,
        RTMP_MAX_MESSAGE_SIZE,
    },
};

/// State of an incoming chunk stream
#[derive(Default)]
struct InboundChunkStream {
    /// Timestamp field of the last header (absolute or delta)
    timestamp: u32,

    /// True if the last header used the extended timestamp field
    extended: bool,

    /// Length of the message
    length: usize,

    /// Message type
    message_type: u32,

    /// Message stream ID
    stream_id: u32,

    /// Format of the chunk that started the current message
    message_format: u32,

    /// Payload read so far
    payload: Vec<u8>,
}

/// Reassembles RTMP messages from chunks
pub struct ChunkReader<TR: AsyncRead + Unpin> {
    /// Stream to read from
    stream: TR,

    /// Chunk size announced by the peer
    chunk_size: usize,

    /// Timeout for each read (None = wait forever)
    read_timeout: Option<Duration>,

    /// Chunk streams seen so far, by ID
    chunk_streams: HashMap<u32, InboundChunkStream>,

    /// Bytes of chunks read (wraps around)
    bytes_read: u32,
}

impl<TR: AsyncRead + Unpin> ChunkReader<TR> {
    /// Creates ChunkReader
    pub fn new(stream: TR, read_timeout: Option<Duration>) -> ChunkReader<TR> {
        ChunkReader {
            stream,
            chunk_size: RTMP_DEFAULT_CHUNK_SIZE,
            read_timeout,
            chunk_streams: HashMap::new(),
            bytes_read: 0,
        }
    }

    /// Gets the current chunk size
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Sets the chunk size for the next chunks
    pub fn set_chunk_size(&mut self, chunk_size: usize) {
        self.chunk_size = chunk_size.max(1);
    }

    /// Sets the timeout for the next reads
    pub fn set_read_timeout(&mut self, read_timeout: Option<Duration>) {
        self.read_timeout = read_timeout;
    }

    /// Gets the number of chunk bytes read (wraps around)
    pub fn bytes_read(&self) -> u32 {
        self.bytes_read
    }

    /// Discards the partial message of a chunk stream
    pub fn abort(&mut self, chunk_stream_id: u32) {
        if let Some(cs) = self.chunk_streams.get_mut(&chunk_stream_id) {
            cs.payload.clear();
        }
    }

    /// Reads bytes, bounded by the read timeout
    /// Bytes read this way do not count as chunk bytes
    pub async fn read_raw(&mut self, buf: &mut [u8]) -> Result<(), ClientError> {
        let read_timeout = match self.read_timeout {
            Some(t) => t,
            None => {
                self.stream.read_exact(buf).await?;
                return Ok(());
            }
        };

        match tokio::time::timeout(read_timeout, self.stream.read_exact(buf)).await {
            Ok(r) => {
                r?;
                Ok(())
            }
            Err(_) => Err(ClientError::Transport("Timed out".to_string())),
        }
    }

    async fn read_counted(&mut self, buf: &mut [u8]) -> Result<(), ClientError> {
        self.read_raw(buf).await?;
        self.bytes_read = self.bytes_read.wrapping_add(buf.len() as u32);
        Ok(())
    }

    /// Reads chunks until a message is complete
    pub async fn read_message(&mut self) -> Result<RtmpMessage, ClientError> {
        loop {
            if let Some(msg) = self.read_chunk().await? {
                return Ok(msg);
            }
        }
    }

    /// Reads a single chunk
    /// Returns the message if the chunk was the last one of it
    async fn read_chunk(&mut self) -> Result<Option<RtmpMessage>, ClientError> {
        // Basic header

        let mut start_byte = [0u8; 1];
        self.read_counted(&mut start_byte).await?;

        let format = (start_byte[0] >> 6) as u32;

        let chunk_stream_id = match start_byte[0] & 0x3f {
            0 => {
                let mut b = [0u8; 1];
                self.read_counted(&mut b).await?;
                64 + (b[0] as u32)
            }
            1 => {
                let mut b = [0u8; 2];
                self.read_counted(&mut b).await?;
                64 + (b[0] as u32) + ((b[1] as u32) << 8)
            }
            id => id as u32,
        };

        // Message header

        let mut header: Vec<u8> = vec![0; get_rtmp_header_size(format as u8)];

        if !header.is_empty() {
            self.read_counted(&mut header).await?;
        }

        if format != RTMP_CHUNK_TYPE_0 && !self.chunk_streams.contains_key(&chunk_stream_id) {
            return Err(ClientError::Transport(format!(
                "Chunk of type {} on chunk stream {} without a previous header",
                format, chunk_stream_id
            )));
        }

        let mut cs = self.chunk_streams.remove(&chunk_stream_id).unwrap_or_default();

        if format != RTMP_CHUNK_TYPE_3 && !cs.payload.is_empty() {
            // A new header in the middle of a message starts over
            cs.payload.clear();
        }

        if format <= RTMP_CHUNK_TYPE_2 {
            cs.timestamp = read_u24(&header[0..3]);
            cs.extended = cs.timestamp == RTMP_EXTENDED_TIMESTAMP;
        }

        if format <= RTMP_CHUNK_TYPE_1 {
            cs.length = read_u24(&header[3..6]) as usize;
            cs.message_type = header[6] as u32;
        }

        if format == RTMP_CHUNK_TYPE_0 {
            cs.stream_id = LittleEndian::read_u32(&header[7..11]);
        }

        // Extended timestamp, repeated on type 3 chunks that follow one

        if cs.extended {
            let mut ts_bytes = [0u8; 4];
            self.read_counted(&mut ts_bytes).await?;

            if format != RTMP_CHUNK_TYPE_3 {
                cs.timestamp = BigEndian::read_u32(&ts_bytes);
            }
        }

        if cs.length > RTMP_MAX_MESSAGE_SIZE {
            return Err(ClientError::Transport(format!(
                "Message too large: {} bytes",
                cs.length
            )));
        }

        if cs.payload.is_empty() {
            cs.message_format = format;
            cs.payload.reserve(cs.length);
        }

        // Payload

        let size_to_read = self.chunk_size.min(cs.length - cs.payload.len());

        if size_to_read > 0 {
            let offset = cs.payload.len();

            cs.payload.resize(offset + size_to_read, 0);

            if let Err(e) = self.read_counted(&mut cs.payload[offset..]).await {
                self.chunk_streams.insert(chunk_stream_id, cs);
                return Err(e);
            }
        }

        let result = if cs.payload.len() >= cs.length {
            Some(RtmpMessage {
                message_type: cs.message_type,
                chunk_stream_id,
                stream_id: cs.stream_id,
                timestamp: cs.timestamp,
                timestamp_is_absolute: cs.message_format == RTMP_CHUNK_TYPE_0,
                payload: std::mem::take(&mut cs.payload),
            })
        } else {
            None
        };

        self.chunk_streams.insert(chunk_stream_id, cs);

        Ok(result)
    }
}

fn read_u24(b: &[u8]) -> u32 {
    ((b[0] as u32) << 16) | ((b[1] as u32) << 8) | (b[2] as u32)
}

// Tests
