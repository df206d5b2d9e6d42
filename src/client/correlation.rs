// Classification of incoming messages

use crate::{
    log::Logger,
    log_trace,
    rtmp::{RtmpCommand, RtmpInvoke, RtmpMessage},
};

/// What an incoming message is, for the session loops
#[derive(Clone, Debug, PartialEq)]
pub enum MessageClass {
    /// Command message, decoded
    Command(RtmpInvoke),

    /// Audio or video message
    Media,

    /// Anything else (protocol control, data, shared objects)
    Other,
}

/// Classifies a message by its type
///
/// Only command messages are decoded. Media payloads are left untouched
/// so forwarding them does not pay for command decoding.
pub fn classify_message(msg: &RtmpMessage) -> MessageClass {
    if msg.is_media() {
        MessageClass::Media
    } else if msg.is_command() {
        MessageClass::Command(RtmpInvoke::decode(msg.command_payload()))
    } else {
        MessageClass::Other
    }
}

/// Logs a received command message at trace level
pub fn trace_command(logger: &Logger, log_requests: bool, msg: &RtmpMessage) {
    if !log_requests || !logger.config.trace_enabled {
        return;
    }

    match RtmpCommand::decode(msg.command_payload()) {
        Ok(cmd) => {
            log_trace!(logger, format!("COMMAND RECEIVED: {}", cmd.to_debug_string()));
        }
        Err(()) => {
            log_trace!(
                logger,
                format!("Undecodable command of {} bytes", msg.payload.len())
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtmp::{
        rtmp_make_invoke_message, rtmp_make_video_message, rtmp_make_window_ack,
        RTMP_TYPE_FLEX_MESSAGE,
    };

    #[test]
    fn test_classify_by_type() {
        let invoke = RtmpInvoke::CreateStreamResult {
            transaction_id: 2.0,
            stream_id: 1,
        };

        assert_eq!(
            classify_message(&rtmp_make_invoke_message(&invoke, 0)),
            MessageClass::Command(invoke.clone())
        );

        // AMF3 command messages carry an extra leading byte
        let mut flex = rtmp_make_invoke_message(&invoke, 0);
        flex.message_type = RTMP_TYPE_FLEX_MESSAGE;
        flex.payload.insert(0, 0);

        assert_eq!(classify_message(&flex), MessageClass::Command(invoke));

        assert_eq!(
            classify_message(&rtmp_make_video_message(1, 0, vec![0x17, 0x01])),
            MessageClass::Media
        );
        assert_eq!(classify_message(&rtmp_make_window_ack(1000)), MessageClass::Other);
    }
}
