// RTMP message generators

use byteorder::{BigEndian, ByteOrder};

use super::{
    RtmpInvoke, RtmpMessage, PING_RESPONSE, RTMP_CHANNEL_AUDIO, RTMP_CHANNEL_INVOKE,
    RTMP_CHANNEL_PROTOCOL, RTMP_CHANNEL_VIDEO, RTMP_TYPE_ACKNOWLEDGEMENT, RTMP_TYPE_AUDIO,
    RTMP_TYPE_EVENT, RTMP_TYPE_INVOKE, RTMP_TYPE_SET_CHUNK_SIZE, RTMP_TYPE_VIDEO,
    RTMP_TYPE_WINDOW_ACKNOWLEDGEMENT_SIZE,
};

fn make_u32_control_message(packet_type: u32, value: u32) -> RtmpMessage {
    let mut b = vec![0; 4];

    BigEndian::write_u32(&mut b, value);

    RtmpMessage::new(RTMP_CHANNEL_PROTOCOL, packet_type, 0, 0, b)
}

/// Makes RTMP ACK message
pub fn rtmp_make_ack(size: u32) -> RtmpMessage {
    make_u32_control_message(RTMP_TYPE_ACKNOWLEDGEMENT, size)
}

/// Makes RTMP window ACK
pub fn rtmp_make_window_ack(size: u32) -> RtmpMessage {
    make_u32_control_message(RTMP_TYPE_WINDOW_ACKNOWLEDGEMENT_SIZE, size)
}

/// Makes RTMP control message to indicate chunk size
pub fn rtmp_make_chunk_size_set_message(size: u32) -> RtmpMessage {
    make_u32_control_message(RTMP_TYPE_SET_CHUNK_SIZE, size & 0x7fffffff)
}

/// Makes RTMP ping response, echoing the timestamp of the request
pub fn rtmp_make_ping_response(timestamp: u32) -> RtmpMessage {
    let mut b = vec![0; 6];

    BigEndian::write_u16(&mut b[0..2], PING_RESPONSE);
    BigEndian::write_u32(&mut b[2..6], timestamp);

    RtmpMessage::new(RTMP_CHANNEL_PROTOCOL, RTMP_TYPE_EVENT, 0, 0, b)
}

/// Makes RTMP invoke command message
pub fn rtmp_make_invoke_message(invoke: &RtmpInvoke, stream_id: u32) -> RtmpMessage {
    RtmpMessage::new(
        RTMP_CHANNEL_INVOKE,
        RTMP_TYPE_INVOKE,
        stream_id,
        0,
        invoke.encode(),
    )
}

/// Makes RTMP audio message
pub fn rtmp_make_audio_message(stream_id: u32, timestamp: u32, payload: Vec<u8>) -> RtmpMessage {
    RtmpMessage::new(RTMP_CHANNEL_AUDIO, RTMP_TYPE_AUDIO, stream_id, timestamp, payload)
}

/// Makes RTMP video message
pub fn rtmp_make_video_message(stream_id: u32, timestamp: u32, payload: Vec<u8>) -> RtmpMessage {
    RtmpMessage::new(RTMP_CHANNEL_VIDEO, RTMP_TYPE_VIDEO, stream_id, timestamp, payload)
}
