// Publisher session (push)

use tokio::{
    sync::mpsc::Receiver,
    task::{JoinError, JoinHandle},
};

use crate::{
    log::Logger,
    log_debug, log_info, log_warning,
    rtmp::{
        RtmpInvoke, RtmpMessage, NET_STREAM_PUBLISH_START, TRANSACTION_ID_CREATE_STREAM,
        TRANSACTION_ID_PUBLISH,
    },
    transport::{RtmpMessageSender, RtmpTcpTransport, RtmpTransport},
};

use super::{
    classify_message, ClientError, MediaFrame, MessageClass, RtmpClientConfiguration,
    RtmpConnection,
};

/// State of a publisher session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublisherState {
    Idle,
    StreamRequested,
    Publishing,
    Started,
    Rejected,
}

/// Next thing the session loop handles
enum LoopEvent {
    Received(Result<RtmpMessage, ClientError>),
    ForwardingEnded(Result<Result<(), ClientError>, JoinError>),
}

/// Pushes a local stream to a RTMP server
pub struct PublisherSession<T: RtmpTransport> {
    connection: RtmpConnection<T>,

    /// Name to publish with
    stream_name: String,

    state: PublisherState,
}

impl PublisherSession<RtmpTcpTransport> {
    /// Connects to the target address and creates the session
    /// The stream name is the last path segment of the address
    pub async fn connect(
        config: &RtmpClientConfiguration,
        logger: &Logger,
        address: &str,
    ) -> Result<PublisherSession<RtmpTcpTransport>, ClientError> {
        let session_logger = logger.make_child_logger(&format!("[PUSH {}] ", address));

        let connection = RtmpConnection::dial(config, session_logger, address).await?;
        let stream_name = connection.address().stream_name.clone();

        Ok(PublisherSession::new(connection, &stream_name))
    }
}

impl<T: RtmpTransport> PublisherSession<T> {
    /// Creates a session over an established connection
    pub fn new(connection: RtmpConnection<T>, stream_name: &str) -> PublisherSession<T> {
        PublisherSession {
            connection,
            stream_name: stream_name.to_string(),
            state: PublisherState::Idle,
        }
    }

    pub fn state(&self) -> PublisherState {
        self.state
    }

    pub fn connection(&self) -> &RtmpConnection<T> {
        &self.connection
    }

    /// Runs the session until the connection ends
    ///
    /// Once the server confirms the publish, frames from `media` are sent on
    /// the assigned stream. When `media` closes, the session ends.
    ///
    /// Returns Ok if the connection ended after the publish started.
    pub async fn run(&mut self, media: Option<Receiver<MediaFrame>>) -> Result<(), ClientError> {
        let mut forwarder: Option<JoinHandle<Result<(), ClientError>>> = None;

        let result = self.run_loop(media, &mut forwarder).await;

        if let Some(handle) = forwarder {
            handle.abort();
        }

        result
    }

    async fn run_loop(
        &mut self,
        mut media: Option<Receiver<MediaFrame>>,
        forwarder: &mut Option<JoinHandle<Result<(), ClientError>>>,
    ) -> Result<(), ClientError> {
        self.connection
            .send_invoke(
                &RtmpInvoke::CreateStream {
                    transaction_id: TRANSACTION_ID_CREATE_STREAM,
                },
                0,
            )
            .await?;

        self.state = PublisherState::StreamRequested;

        loop {
            let event = match forwarder.as_mut() {
                Some(handle) => {
                    tokio::select! {
                        r = self.connection.receive_message() => LoopEvent::Received(r),
                        joined = handle => LoopEvent::ForwardingEnded(joined),
                    }
                }
                None => LoopEvent::Received(self.connection.receive_message().await),
            };

            let msg = match event {
                LoopEvent::Received(Ok(m)) => m,
                LoopEvent::Received(Err(e)) => return self.read_failed(e),
                LoopEvent::ForwardingEnded(joined) => return self.forwarding_ended(joined),
            };

            let invoke = match classify_message(&msg) {
                MessageClass::Command(invoke) => invoke,
                _ => continue,
            };

            match (self.state, invoke) {
                (PublisherState::StreamRequested, RtmpInvoke::CreateStreamResult { stream_id, .. }) => {
                    self.connection.set_stream_id(stream_id);

                    let logger = &self.connection.logger;
                    log_debug!(logger, format!("Stream created: {}", stream_id));

                    self.connection
                        .send_invoke(
                            &RtmpInvoke::live_publish(TRANSACTION_ID_PUBLISH, &self.stream_name),
                            stream_id,
                        )
                        .await?;

                    self.state = PublisherState::Publishing;
                }
                (PublisherState::Publishing, RtmpInvoke::PublishResult { code, .. }) => {
                    let logger = &self.connection.logger;

                    if code != NET_STREAM_PUBLISH_START {
                        log_warning!(logger, format!("Publish rejected: {}", code));

                        self.state = PublisherState::Rejected;

                        return Err(ClientError::PublishRejected { code });
                    }

                    log_info!(
                        logger,
                        format!("Publishing stream '{}'", self.stream_name)
                    );

                    self.state = PublisherState::Started;

                    // The server may stay silent while receiving media
                    self.connection.transport_mut().set_read_timeout(None);

                    if let Some(rx) = media.take() {
                        *forwarder = Some(spawn_media_forwarder(
                            self.connection.transport().sender(),
                            self.connection.stream_id(),
                            rx,
                        ));
                    }
                }
                _ => {}
            }
        }
    }

    fn read_failed(&mut self, e: ClientError) -> Result<(), ClientError> {
        let logger = &self.connection.logger;

        if self.state == PublisherState::Started {
            log_info!(logger, format!("Publish ended: {}", e));
            Ok(())
        } else {
            log_warning!(logger, format!("Publish failed: {}", e));
            Err(e)
        }
    }

    fn forwarding_ended(
        &mut self,
        joined: Result<Result<(), ClientError>, JoinError>,
    ) -> Result<(), ClientError> {
        let logger = &self.connection.logger;

        match joined {
            Ok(Ok(())) => {
                log_info!(logger, "Media source ended");
                Ok(())
            }
            Ok(Err(e)) => {
                log_warning!(logger, format!("Could not send media: {}", e));
                Err(e)
            }
            Err(e) => Err(ClientError::Transport(e.to_string())),
        }
    }
}

/// Spawns a task sending frames on a stream
/// The task ends when the receiver closes or a send fails
fn spawn_media_forwarder<S: RtmpMessageSender>(
    sender: S,
    stream_id: u32,
    mut media: Receiver<MediaFrame>,
) -> JoinHandle<Result<(), ClientError>> {
    tokio::spawn(async move {
        while let Some(frame) = media.recv().await {
            sender.send_message(frame.into_message(stream_id)).await?;
        }

        Ok(())
    })
}

// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::{MediaKind, RtmpAddress},
        rtmp::{NET_CONNECTION_CONNECT_SUCCESS, RTMP_TYPE_AUDIO, RTMP_TYPE_VIDEO},
        test_utils::{connect_result, status, ScriptedPeer, ScriptedTransport},
    };

    async fn session() -> (PublisherSession<ScriptedTransport>, ScriptedPeer) {
        let (transport, peer) = ScriptedTransport::new();

        peer.push_invoke(&connect_result(NET_CONNECTION_CONNECT_SUCCESS));

        let connection = RtmpConnection::establish(
            &RtmpClientConfiguration::default(),
            Logger::new_disabled(),
            RtmpAddress::parse("rtmp://127.0.0.1/live/cam1").unwrap(),
            transport,
        )
        .await
        .unwrap();

        (PublisherSession::new(connection, "local1"), peer)
    }

    fn stream_created(stream_id: u32) -> RtmpInvoke {
        RtmpInvoke::CreateStreamResult {
            transaction_id: 2.0,
            stream_id,
        }
    }

    #[tokio::test]
    async fn test_publish_started_then_end_of_stream() {
        let (mut s, mut peer) = session().await;

        peer.push_invoke(&stream_created(5));
        peer.push_invoke(&status(NET_STREAM_PUBLISH_START, "status"));
        peer.push_invoke(&RtmpInvoke::Unrecognized {
            name: "onFCPublish".to_string(),
        });
        peer.push_invoke(&status("NetStream.Unpublish.Success", "status"));

        let sent_before = peer.sent_invokes().len();

        peer.close();

        assert_eq!(s.run(None).await, Ok(()));
        assert_eq!(s.state(), PublisherState::Started);
        assert_eq!(s.connection().stream_id(), 5);

        let invokes = peer.sent_invokes();
        assert_eq!(invokes.len(), sent_before + 2);

        assert_eq!(
            invokes[sent_before],
            (
                0,
                RtmpInvoke::CreateStream {
                    transaction_id: 2.0
                }
            )
        );
        assert_eq!(
            invokes[sent_before + 1],
            (
                5,
                RtmpInvoke::Publish {
                    transaction_id: 0.0,
                    stream_name: "local1".to_string(),
                    publish_type: "live".to_string(),
                }
            )
        );
    }

    #[tokio::test]
    async fn test_publish_rejected() {
        let (mut s, peer) = session().await;

        peer.push_invoke(&stream_created(1));
        peer.push_invoke(&status("NetStream.Publish.BadName", "error"));

        // Never read
        peer.push_invoke(&stream_created(2));

        assert_eq!(
            s.run(None).await,
            Err(ClientError::PublishRejected {
                code: "NetStream.Publish.BadName".to_string()
            })
        );
        assert_eq!(s.state(), PublisherState::Rejected);
        assert_eq!(s.connection().stream_id(), 1);
    }

    #[tokio::test]
    async fn test_read_error_before_start_fails() {
        let (mut s, mut peer) = session().await;

        peer.push_invoke(&stream_created(1));
        peer.push(crate::rtmp::rtmp_make_video_message(1, 0, vec![0x17]));

        peer.close();

        assert!(matches!(s.run(None).await, Err(ClientError::Transport(_))));
        assert_eq!(s.state(), PublisherState::Publishing);
    }

    #[tokio::test]
    async fn test_read_error_stops_processing() {
        let (mut s, peer) = session().await;

        peer.push_error("connection reset");
        peer.push_invoke(&stream_created(1));
        peer.push_invoke(&status(NET_STREAM_PUBLISH_START, "status"));

        assert_eq!(
            s.run(None).await,
            Err(ClientError::Transport("connection reset".to_string()))
        );
        assert_eq!(s.state(), PublisherState::StreamRequested);
        assert_eq!(s.connection().stream_id(), 0);

        assert!(!peer
            .sent_invokes()
            .iter()
            .any(|(_, invoke)| matches!(invoke, RtmpInvoke::Publish { .. })));
    }

    #[tokio::test]
    async fn test_forwards_media_after_start() {
        let (mut s, peer) = session().await;
        let (media_tx, media_rx) = tokio::sync::mpsc::channel::<MediaFrame>(8);

        media_tx
            .send(MediaFrame {
                kind: MediaKind::Video,
                chunk_stream_id: 0,
                timestamp: 0,
                payload: vec![0x17, 0x00],
            })
            .await
            .unwrap();
        media_tx
            .send(MediaFrame {
                kind: MediaKind::Audio,
                chunk_stream_id: 0,
                timestamp: 23,
                payload: vec![0xaf, 0x01],
            })
            .await
            .unwrap();

        drop(media_tx);

        peer.push_invoke(&stream_created(3));
        peer.push_invoke(&status(NET_STREAM_PUBLISH_START, "status"));

        // The connection stays open, the session ends with the media source
        assert_eq!(s.run(Some(media_rx)).await, Ok(()));

        let media: Vec<(u32, u32, u32)> = peer
            .sent()
            .iter()
            .filter(|m| m.is_media())
            .map(|m| (m.message_type, m.stream_id, m.timestamp))
            .collect();

        assert_eq!(media, vec![(RTMP_TYPE_VIDEO, 3, 0), (RTMP_TYPE_AUDIO, 3, 23)]);
    }
}
