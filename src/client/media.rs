// Media frames exchanged with the host pipeline

use tokio::sync::mpsc::{error::TrySendError, Sender, UnboundedSender};

use crate::rtmp::{rtmp_make_audio_message, rtmp_make_video_message, RtmpMessage, RTMP_TYPE_AUDIO, RTMP_TYPE_VIDEO};

/// Kind of media frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

/// Audio or video frame with its absolute timestamp
#[derive(Clone, Debug, PartialEq)]
pub struct MediaFrame {
    pub kind: MediaKind,

    /// Chunk stream the frame was received on (0 for local frames)
    pub chunk_stream_id: u32,

    /// Absolute timestamp (milliseconds)
    pub timestamp: u32,

    /// FLV tag body
    pub payload: Vec<u8>,
}

impl MediaFrame {
    /// Creates a frame from a received media message
    pub fn from_message(msg: RtmpMessage, timestamp: u32) -> Option<MediaFrame> {
        let kind = match msg.message_type {
            RTMP_TYPE_AUDIO => MediaKind::Audio,
            RTMP_TYPE_VIDEO => MediaKind::Video,
            _ => return None,
        };

        Some(MediaFrame {
            kind,
            chunk_stream_id: msg.chunk_stream_id,
            timestamp,
            payload: msg.payload,
        })
    }

    /// Makes the message to send the frame on a stream
    pub fn into_message(self, stream_id: u32) -> RtmpMessage {
        match self.kind {
            MediaKind::Audio => rtmp_make_audio_message(stream_id, self.timestamp, self.payload),
            MediaKind::Video => rtmp_make_video_message(stream_id, self.timestamp, self.payload),
        }
    }
}

/// Receiver of pulled media
///
/// Pushing must not block, the session loop also handles commands.
pub trait MediaSink: Send {
    /// Pushes a frame
    /// Returns false if the sink is closed
    fn push_frame(&mut self, frame: MediaFrame) -> bool;
}

impl MediaSink for UnboundedSender<MediaFrame> {
    fn push_frame(&mut self, frame: MediaFrame) -> bool {
        self.send(frame).is_ok()
    }
}

/// Bounded channels drop frames while full
impl MediaSink for Sender<MediaFrame> {
    fn push_frame(&mut self, frame: MediaFrame) -> bool {
        match self.try_send(frame) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Closed(_)) => false,
        }
    }
}
