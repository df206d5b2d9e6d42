// RTMP constants

// Protocol version
pub const RTMP_VERSION: u8 = 3;

// Default port
pub const RTMP_DEFAULT_PORT: u16 = 1935;

// Handshake sizes
pub const RTMP_HANDSHAKE_SIZE: usize = 1536;
pub const SHA256DL: usize = 32; // SHA256 digest length

// Handshake keys
pub const GENUINE_FP: &str = "Genuine Adobe Flash Player 001";

// Version advertised in C1 (Flash Player 9.0.124.2)
pub const RTMP_CLIENT_VERSION: [u8; 4] = [0x09, 0x00, 0x7c, 0x02];

// Chunk types
pub const RTMP_CHUNK_TYPE_0: u32 = 0; // 11-bytes: timestamp(3) + length(3) + stream type(1) + stream id(4)
pub const RTMP_CHUNK_TYPE_1: u32 = 1; // 7-bytes: delta(3) + length(3) + stream type(1)
pub const RTMP_CHUNK_TYPE_2: u32 = 2; // 3-bytes: delta(3)
pub const RTMP_CHUNK_TYPE_3: u32 = 3; // 0-byte

// RTMP channel types
pub const RTMP_CHANNEL_PROTOCOL: u32 = 2;
pub const RTMP_CHANNEL_INVOKE: u32 = 3;
pub const RTMP_CHANNEL_AUDIO: u32 = 4;
pub const RTMP_CHANNEL_VIDEO: u32 = 5;

/// Gets RTMP header size from the chunk format
pub fn get_rtmp_header_size(format: u8) -> usize {
    match format {
        0 => 11,
        1 => 7,
        2 => 3,
        _ => 0,
    }
}

// Chunk sizes
pub const RTMP_DEFAULT_CHUNK_SIZE: usize = 128;
pub const RTMP_MAX_CHUNK_SIZE: usize = 65536;
pub const RTMP_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

// Initial bandwidth estimate, until the server sets it
pub const RTMP_DEFAULT_BANDWIDTH: u32 = (RTMP_MAX_CHUNK_SIZE as u32) << 3;

// Timestamps at or above this value use the extended timestamp field
pub const RTMP_EXTENDED_TIMESTAMP: u32 = 0xffffff;

// Packet types

/* Protocol Control Messages */
pub const RTMP_TYPE_SET_CHUNK_SIZE: u32 = 1;
pub const RTMP_TYPE_ABORT: u32 = 2;
pub const RTMP_TYPE_ACKNOWLEDGEMENT: u32 = 3; // bytes read report
pub const RTMP_TYPE_WINDOW_ACKNOWLEDGEMENT_SIZE: u32 = 5; // server bandwidth
pub const RTMP_TYPE_SET_PEER_BANDWIDTH: u32 = 6; // client bandwidth

/* User Control Messages Event (4) */
pub const RTMP_TYPE_EVENT: u32 = 4;

pub const RTMP_TYPE_AUDIO: u32 = 8;
pub const RTMP_TYPE_VIDEO: u32 = 9;

/* Command Message */
pub const RTMP_TYPE_FLEX_MESSAGE: u32 = 17; // AMF3
pub const RTMP_TYPE_INVOKE: u32 = 20; // AMF0

// User control events

pub const PING_REQUEST: u16 = 0x06;
pub const PING_RESPONSE: u16 = 0x07;

// Transaction IDs used by the client workflow
pub const TRANSACTION_ID_CONNECT: f64 = 1.0;
pub const TRANSACTION_ID_CREATE_STREAM: f64 = 2.0;
pub const TRANSACTION_ID_PUBLISH: f64 = 0.0;
pub const TRANSACTION_ID_PLAY: f64 = 1.0;

// Status codes

pub const NET_CONNECTION_CONNECT_SUCCESS: &str = "NetConnection.Connect.Success";
pub const NET_STREAM_PUBLISH_START: &str = "NetStream.Publish.Start";
pub const NET_STREAM_PLAY_START: &str = "NetStream.Play.Start";

// Status levels

pub const LEVEL_STATUS: &str = "status";
pub const LEVEL_ERROR: &str = "error";

// Publish type for live streams
pub const PUBLISH_TYPE_LIVE: &str = "live";
