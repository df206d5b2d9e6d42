// Test utilities

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use byteorder::{BigEndian, ByteOrder};
use tokio::{
    io::{DuplexStream, ReadHalf, WriteHalf},
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
};

use crate::{
    client::ClientError,
    rtmp::{
        rtmp_make_invoke_message, RtmpInvoke, RtmpMessage, RTMP_DEFAULT_BANDWIDTH,
        RTMP_DEFAULT_CHUNK_SIZE, RTMP_HANDSHAKE_SIZE, RTMP_TYPE_SET_CHUNK_SIZE, RTMP_VERSION,
    },
    transport::{ChunkReader, ChunkWriter, RtmpMessageSender, RtmpTransport},
};

/// Makes the `_result` of connect
pub fn connect_result(code: &str) -> RtmpInvoke {
    RtmpInvoke::GenericResult {
        transaction_id: 1.0,
        is_error: false,
        code: code.to_string(),
        description: String::new(),
    }
}

/// Makes an `onStatus`
pub fn status(code: &str, level: &str) -> RtmpInvoke {
    let code = code.to_string();
    let level = level.to_string();

    if code.starts_with("NetStream.Play.") {
        RtmpInvoke::PlayResult {
            code,
            level,
            description: String::new(),
        }
    } else {
        RtmpInvoke::PublishResult {
            code,
            level,
            description: String::new(),
        }
    }
}

/// Sender recording the messages
#[derive(Clone)]
pub struct ScriptedSender {
    sent: Arc<Mutex<Vec<RtmpMessage>>>,
    write_chunk_size: Arc<AtomicUsize>,
}

impl RtmpMessageSender for ScriptedSender {
    async fn send_message(&self, msg: RtmpMessage) -> Result<(), ClientError> {
        if msg.message_type == RTMP_TYPE_SET_CHUNK_SIZE && msg.payload.len() >= 4 {
            self.write_chunk_size
                .store(BigEndian::read_u32(&msg.payload) as usize, Ordering::Relaxed);
        }

        self.sent
            .lock()
            .map_err(|_| ClientError::Transport("poisoned".to_string()))?
            .push(msg);

        Ok(())
    }
}

/// Transport replaying messages pushed by a `ScriptedPeer`
///
/// Reads fail once the peer is dropped and every pushed message was read.
pub struct ScriptedTransport {
    incoming: UnboundedReceiver<Result<RtmpMessage, ClientError>>,
    sender: ScriptedSender,
    handshake_fails: bool,
}

/// Test side of a `ScriptedTransport`
pub struct ScriptedPeer {
    outgoing: Option<UnboundedSender<Result<RtmpMessage, ClientError>>>,
    sent: Arc<Mutex<Vec<RtmpMessage>>>,
}

impl ScriptedTransport {
    pub fn new() -> (ScriptedTransport, ScriptedPeer) {
        let (outgoing, incoming) = unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));

        (
            ScriptedTransport {
                incoming,
                sender: ScriptedSender {
                    sent: sent.clone(),
                    write_chunk_size: Arc::new(AtomicUsize::new(RTMP_DEFAULT_CHUNK_SIZE)),
                },
                handshake_fails: false,
            },
            ScriptedPeer {
                outgoing: Some(outgoing),
                sent,
            },
        )
    }

    /// Makes the handshake fail
    pub fn fail_handshake(&mut self) {
        self.handshake_fails = true;
    }
}

impl ScriptedPeer {
    /// Queues a message for the client
    pub fn push(&self, msg: RtmpMessage) {
        if let Some(outgoing) = &self.outgoing {
            let _ = outgoing.send(Ok(msg));
        }
    }

    /// Queues a read failure, ahead of any message queued later
    pub fn push_error(&self, error: &str) {
        if let Some(outgoing) = &self.outgoing {
            let _ = outgoing.send(Err(ClientError::Transport(error.to_string())));
        }
    }

    /// Closes the connection: reads fail after the queued messages
    pub fn close(&mut self) {
        self.outgoing = None;
    }

    /// Queues a command for the client
    pub fn push_invoke(&self, invoke: &RtmpInvoke) {
        self.push(rtmp_make_invoke_message(invoke, 0));
    }

    /// Gets the messages sent by the client so far
    pub fn sent(&self) -> Vec<RtmpMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Gets the commands sent by the client so far
    pub fn sent_invokes(&self) -> Vec<(u32, RtmpInvoke)> {
        self.sent()
            .iter()
            .filter(|m| m.is_command())
            .map(|m| (m.stream_id, RtmpInvoke::decode(&m.payload)))
            .collect()
    }
}

impl RtmpTransport for ScriptedTransport {
    type Sender = ScriptedSender;

    async fn handshake(&mut self) -> Result<(), ClientError> {
        if self.handshake_fails {
            Err(ClientError::Handshake("Invalid server version: 6".to_string()))
        } else {
            Ok(())
        }
    }

    async fn receive_message(&mut self) -> Result<RtmpMessage, ClientError> {
        match self.incoming.recv().await {
            Some(r) => r,
            None => Err(ClientError::Transport("connection closed".to_string())),
        }
    }

    fn sender(&self) -> ScriptedSender {
        self.sender.clone()
    }

    fn set_read_timeout(&mut self, _read_timeout: Option<Duration>) {}

    fn read_chunk_size(&self) -> usize {
        RTMP_DEFAULT_CHUNK_SIZE
    }

    fn write_chunk_size(&self) -> usize {
        self.sender.write_chunk_size.load(Ordering::Relaxed)
    }

    fn bandwidth(&self) -> u32 {
        RTMP_DEFAULT_BANDWIDTH
    }
}

/// Minimal RTMP server over a duplex stream
pub struct FakeServer {
    reader: ChunkReader<ReadHalf<DuplexStream>>,
    writer: ChunkWriter<WriteHalf<DuplexStream>>,
}

impl FakeServer {
    /// Runs the server side of the handshake
    pub async fn accept(stream: DuplexStream) -> FakeServer {
        let (r, w) = tokio::io::split(stream);

        let mut server = FakeServer {
            reader: ChunkReader::new(r, Some(Duration::from_secs(5))),
            writer: ChunkWriter::new(w),
        };

        let mut c0_c1 = vec![0; 1 + RTMP_HANDSHAKE_SIZE];
        server.reader.read_raw(&mut c0_c1).await.unwrap();

        let mut s0_s1_s2 = vec![RTMP_VERSION];
        s0_s1_s2.extend(vec![0x5a; RTMP_HANDSHAKE_SIZE]);
        s0_s1_s2.extend(&c0_c1[1..]);

        server.writer.write_bytes(&s0_s1_s2).await.unwrap();

        let mut c2 = vec![0; RTMP_HANDSHAKE_SIZE];
        server.reader.read_raw(&mut c2).await.unwrap();

        assert_eq!(c2, vec![0x5a; RTMP_HANDSHAKE_SIZE]);

        server
    }

    /// Waits for the next command, applying chunk size changes
    pub async fn expect_invoke(&mut self) -> (u32, RtmpInvoke) {
        loop {
            let msg = self.reader.read_message().await.unwrap();

            if msg.message_type == RTMP_TYPE_SET_CHUNK_SIZE {
                self.reader
                    .set_chunk_size(BigEndian::read_u32(&msg.payload) as usize);
            } else if msg.is_command() {
                return (msg.stream_id, RtmpInvoke::decode(&msg.payload));
            }
        }
    }

    /// Sends a message
    pub async fn send(&mut self, msg: &RtmpMessage) {
        self.writer.write_message(msg).await.unwrap();
    }

    /// Sends a raw chunk, for headers the writer never produces
    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_bytes(bytes).await.unwrap();
    }

    /// Closes the write side of the connection
    pub async fn close(&mut self) {
        let _ = self.writer.shutdown().await;
    }
}
