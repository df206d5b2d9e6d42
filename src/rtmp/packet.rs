// RTMP packet model (outbound)

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::{RTMP_CHUNK_TYPE_0, RTMP_CHUNK_TYPE_1, RTMP_CHUNK_TYPE_2, RTMP_CHUNK_TYPE_3, RTMP_EXTENDED_TIMESTAMP};

/// Header of an RTMP packet
#[derive(Clone, Debug, PartialEq)]
pub struct RtmpPacketHeader {
    /// Timestamp (absolute for type 0, delta otherwise)
    pub timestamp: u32,

    /// Packet format (chunk type of the first chunk)
    pub format: u32,

    /// Channel ID (chunk stream ID)
    pub channel_id: u32,

    /// Packet type
    pub packet_type: u32,

    /// Stream ID
    pub stream_id: u32,
}

/// RTMP packet
#[derive(Clone, Debug, PartialEq)]
pub struct RtmpPacket {
    /// Packet header
    pub header: RtmpPacketHeader,

    /// Packet payload
    pub payload: Vec<u8>,
}

impl RtmpPacket {
    /// Creates a new packet, to be sent with a full (type 0) header
    pub fn new(
        channel_id: u32,
        packet_type: u32,
        stream_id: u32,
        timestamp: u32,
        payload: Vec<u8>,
    ) -> RtmpPacket {
        RtmpPacket {
            header: RtmpPacketHeader {
                timestamp,
                format: RTMP_CHUNK_TYPE_0,
                channel_id,
                packet_type,
                stream_id,
            },
            payload,
        }
    }

    /// Serializes a basic header for a RTMP packet
    /// format - Packet format
    /// channel_id - Packet channel ID
    /// Returns the serialized bytes
    pub fn serialize_basic_header(format: u32, channel_id: u32) -> Vec<u8> {
        if channel_id >= 64 + 256 {
            let id = channel_id - 64;
            vec![((format << 6) as u8) | 1, (id & 0xff) as u8, ((id >> 8) & 0xff) as u8]
        } else if channel_id >= 64 {
            vec![(format << 6) as u8, (channel_id - 64) as u8]
        } else {
            vec![((format << 6) as u8) | (channel_id as u8)]
        }
    }

    /// Serializes the message header of the first chunk
    /// Returns the serialized bytes
    fn serialize_chunk_message_header(&self) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::with_capacity(11);
        let mut b: Vec<u8> = vec![0; 4];

        if self.header.format <= RTMP_CHUNK_TYPE_2 {
            BigEndian::write_u32(&mut b, self.header.timestamp.min(RTMP_EXTENDED_TIMESTAMP));
            out.extend(&b[1..]);
        }

        if self.header.format <= RTMP_CHUNK_TYPE_1 {
            BigEndian::write_u32(&mut b, self.payload.len() as u32);
            out.extend(&b[1..]);
            out.push(self.header.packet_type as u8);
        }

        if self.header.format == RTMP_CHUNK_TYPE_0 {
            LittleEndian::write_u32(&mut b, self.header.stream_id);
            out.extend(&b);
        }

        out
    }

    /// Creates the chunks for an RTMP packet
    /// out_chunk_size - Size of the output chunks
    pub fn create_chunks(&self, out_chunk_size: usize) -> Vec<u8> {
        let out_chunk_size = out_chunk_size.max(1);

        let use_extended_timestamp = self.header.timestamp >= RTMP_EXTENDED_TIMESTAMP
            && self.header.format <= RTMP_CHUNK_TYPE_2;

        let mut extended_timestamp: Vec<u8> = Vec::new();

        if use_extended_timestamp {
            extended_timestamp = vec![0; 4];
            BigEndian::write_u32(&mut extended_timestamp, self.header.timestamp);
        }

        let chunk_basic_header_3 =
            Self::serialize_basic_header(RTMP_CHUNK_TYPE_3, self.header.channel_id);

        let chunk_count = self.payload.len().div_ceil(out_chunk_size).max(1);

        let mut chunks: Vec<u8> = Vec::with_capacity(
            self.payload.len() + 18 + (chunk_count - 1) * (chunk_basic_header_3.len() + 4),
        );

        chunks.extend(Self::serialize_basic_header(
            self.header.format,
            self.header.channel_id,
        ));
        chunks.extend(self.serialize_chunk_message_header());
        chunks.extend(&extended_timestamp);

        for (i, sub_payload) in self.payload.chunks(out_chunk_size).enumerate() {
            if i > 0 {
                chunks.extend(&chunk_basic_header_3);
                chunks.extend(&extended_timestamp);
            }

            chunks.extend(sub_payload);
        }

        chunks
    }
}

// Tests
