// Subscriber session (pull)

use crate::{
    log::Logger,
    log_debug, log_info, log_warning,
    rtmp::{RtmpInvoke, LEVEL_ERROR, TRANSACTION_ID_CREATE_STREAM, TRANSACTION_ID_PLAY},
    transport::{RtmpTcpTransport, RtmpTransport},
};

use super::{
    classify_message, ClientError, MediaFrame, MediaSink, MessageClass, RtmpClientConfiguration,
    RtmpConnection, TimestampAccumulator,
};

/// State of a subscriber session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriberState {
    Idle,
    StreamRequested,
    Playing,
}

/// Pulls a remote stream from a RTMP server
pub struct SubscriberSession<T: RtmpTransport> {
    connection: RtmpConnection<T>,
    state: SubscriberState,
    timestamps: TimestampAccumulator,
}

impl SubscriberSession<RtmpTcpTransport> {
    /// Connects to the source address and creates the session
    pub async fn connect(
        config: &RtmpClientConfiguration,
        logger: &Logger,
        address: &str,
    ) -> Result<SubscriberSession<RtmpTcpTransport>, ClientError> {
        let session_logger = logger.make_child_logger(&format!("[PULL {}] ", address));

        let connection = RtmpConnection::dial(config, session_logger, address).await?;

        Ok(SubscriberSession::new(connection))
    }
}

impl<T: RtmpTransport> SubscriberSession<T> {
    /// Creates a session over an established connection
    pub fn new(connection: RtmpConnection<T>) -> SubscriberSession<T> {
        SubscriberSession {
            connection,
            state: SubscriberState::Idle,
            timestamps: TimestampAccumulator::new(),
        }
    }

    pub fn state(&self) -> SubscriberState {
        self.state
    }

    pub fn connection(&self) -> &RtmpConnection<T> {
        &self.connection
    }

    /// Timestamps computed so far, by chunk stream
    pub fn timestamps(&self) -> &TimestampAccumulator {
        &self.timestamps
    }

    /// Runs the session until the connection ends, pushing media to `sink`
    ///
    /// Returns Ok if the connection ended after play was requested,
    /// or if the sink was closed.
    pub async fn run<S: MediaSink>(&mut self, sink: &mut S) -> Result<(), ClientError> {
        self.connection
            .send_invoke(
                &RtmpInvoke::CreateStream {
                    transaction_id: TRANSACTION_ID_CREATE_STREAM,
                },
                0,
            )
            .await?;

        self.state = SubscriberState::StreamRequested;

        loop {
            let msg = match self.connection.receive_message().await {
                Ok(m) => m,
                Err(e) => return self.read_failed(e),
            };

            let invoke = match classify_message(&msg) {
                MessageClass::Media => {
                    let timestamp = self.timestamps.absolute_timestamp(&msg);

                    if let Some(frame) = MediaFrame::from_message(msg, timestamp) {
                        if !sink.push_frame(frame) {
                            let logger = &self.connection.logger;
                            log_info!(logger, "Media sink closed");

                            return Ok(());
                        }
                    }

                    continue;
                }
                MessageClass::Command(invoke) => invoke,
                MessageClass::Other => continue,
            };

            match invoke {
                RtmpInvoke::CreateStreamResult { stream_id, .. }
                    if self.state == SubscriberState::StreamRequested =>
                {
                    self.connection.set_stream_id(stream_id);

                    let address = self.connection.address();

                    let play = RtmpInvoke::Play {
                        transaction_id: TRANSACTION_ID_PLAY,
                        stream_name: address.stream_name.clone(),
                        arguments: address.query.clone(),
                    };

                    let logger = &self.connection.logger;
                    log_debug!(
                        logger,
                        format!(
                            "Stream created: {}. Requesting play of '{}'",
                            stream_id, address.stream_name
                        )
                    );

                    self.connection.send_invoke(&play, stream_id).await?;

                    self.state = SubscriberState::Playing;
                }
                RtmpInvoke::PlayResult { code, level, .. } => {
                    let logger = &self.connection.logger;

                    if level == LEVEL_ERROR {
                        log_warning!(logger, format!("Play status: {}", code));
                    } else {
                        log_info!(logger, format!("Play status: {}", code));
                    }
                }
                _ => {}
            }
        }
    }

    fn read_failed(&mut self, e: ClientError) -> Result<(), ClientError> {
        let logger = &self.connection.logger;

        if self.state == SubscriberState::Playing {
            log_info!(logger, format!("Pull ended: {}", e));
            Ok(())
        } else {
            log_warning!(logger, format!("Pull failed: {}", e));
            Err(e)
        }
    }
}

// Tests
