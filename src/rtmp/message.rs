// RTMP message envelope

use super::{
    RtmpPacket, RTMP_TYPE_AUDIO, RTMP_TYPE_FLEX_MESSAGE, RTMP_TYPE_INVOKE,
    RTMP_TYPE_VIDEO,
};

/// A whole RTMP message, as sent or reassembled from chunks
#[derive(Clone, Debug, PartialEq)]
pub struct RtmpMessage {
    /// Message type ID
    pub message_type: u32,

    /// Chunk stream the message travelled on
    pub chunk_stream_id: u32,

    /// Message stream ID
    pub stream_id: u32,

    /// Timestamp carried by the chunk header that started the message
    pub timestamp: u32,

    /// True if the timestamp is absolute (type 0 header), false if it is a delta
    pub timestamp_is_absolute: bool,

    /// Payload
    pub payload: Vec<u8>,
}

impl RtmpMessage {
    /// Creates a message with an absolute timestamp
    pub fn new(
        chunk_stream_id: u32,
        message_type: u32,
        stream_id: u32,
        timestamp: u32,
        payload: Vec<u8>,
    ) -> RtmpMessage {
        RtmpMessage {
            message_type,
            chunk_stream_id,
            stream_id,
            timestamp,
            timestamp_is_absolute: true,
            payload,
        }
    }

    /// Returns true for AMF0 and AMF3 command messages
    pub fn is_command(&self) -> bool {
        self.message_type == RTMP_TYPE_INVOKE || self.message_type == RTMP_TYPE_FLEX_MESSAGE
    }

    /// Returns true for audio and video messages
    pub fn is_media(&self) -> bool {
        self.message_type == RTMP_TYPE_AUDIO || self.message_type == RTMP_TYPE_VIDEO
    }

    /// Gets the AMF0 encoded part of a command message payload
    pub fn command_payload(&self) -> &[u8] {
        if self.message_type == RTMP_TYPE_FLEX_MESSAGE && !self.payload.is_empty() {
            &self.payload[1..]
        } else {
            &self.payload
        }
    }

    /// Turns the message into a packet, ready to be split into chunks
    /// Outbound messages always start with a type 0 header
    pub fn to_packet(&self) -> RtmpPacket {
        RtmpPacket::new(
            self.chunk_stream_id,
            self.message_type,
            self.stream_id,
            self.timestamp,
            self.payload.clone(),
        )
    }
}
