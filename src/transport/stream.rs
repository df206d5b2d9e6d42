// Transport over a tokio byte stream

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use byteorder::{BigEndian, ByteOrder};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::Mutex,
};

use crate::{
    client::ClientError,
    log::Logger,
    log_debug, log_trace,
    rtmp::{
        generate_c0_c1, generate_c2, rtmp_make_ack, rtmp_make_ping_response, validate_s0,
        RtmpMessage, PING_REQUEST, RTMP_DEFAULT_BANDWIDTH, RTMP_HANDSHAKE_SIZE,
        RTMP_TYPE_ABORT, RTMP_TYPE_EVENT, RTMP_TYPE_SET_CHUNK_SIZE, RTMP_TYPE_SET_PEER_BANDWIDTH,
        RTMP_TYPE_WINDOW_ACKNOWLEDGEMENT_SIZE,
    },
};

use super::{ChunkReader, ChunkWriter, RtmpMessageSender, RtmpTransport};

/// Sender sharing the write side of a `RtmpStreamTransport`
pub struct RtmpStreamSender<TW: AsyncWrite + Send + Unpin + 'static> {
    writer: Arc<Mutex<ChunkWriter<TW>>>,
}

impl<TW: AsyncWrite + Send + Unpin + 'static> Clone for RtmpStreamSender<TW> {
    fn clone(&self) -> Self {
        RtmpStreamSender {
            writer: self.writer.clone(),
        }
    }
}

impl<TW: AsyncWrite + Send + Unpin + 'static> RtmpStreamSender<TW> {
    /// Closes the write side, the peer will see the connection end
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        let mut writer_v = self.writer.lock().await;
        (*writer_v).shutdown().await
    }
}

impl<TW: AsyncWrite + Send + Unpin + 'static> RtmpMessageSender for RtmpStreamSender<TW> {
    async fn send_message(&self, msg: RtmpMessage) -> Result<(), ClientError> {
        let mut writer_v = self.writer.lock().await;
        (*writer_v).write_message(&msg).await
    }
}

/// RTMP transport over any read/write stream pair
pub struct RtmpStreamTransport<TR, TW>
where
    TR: AsyncRead + Send + Unpin,
    TW: AsyncWrite + Send + Unpin + 'static,
{
    /// Logger
    logger: Logger,

    /// Read side
    reader: ChunkReader<TR>,

    /// Write side, shared with the senders
    writer: Arc<Mutex<ChunkWriter<TW>>>,

    /// Write chunk size, readable without locking the writer
    write_chunk_size: Arc<AtomicUsize>,

    /// Bandwidth set by the peer
    bandwidth: u32,

    /// Window acknowledgement size set by the peer (0 = no acknowledgements)
    ack_window: u32,

    /// Bytes read when the last acknowledgement was sent
    last_ack: u32,
}

impl<TR, TW> RtmpStreamTransport<TR, TW>
where
    TR: AsyncRead + Send + Unpin,
    TW: AsyncWrite + Send + Unpin + 'static,
{
    /// Creates a transport from the two halves of a stream
    pub fn new(
        logger: Logger,
        read_stream: TR,
        write_stream: TW,
        read_timeout: Option<Duration>,
    ) -> RtmpStreamTransport<TR, TW> {
        let writer = ChunkWriter::new(write_stream);
        let write_chunk_size = writer.chunk_size_handle();

        RtmpStreamTransport {
            logger,
            reader: ChunkReader::new(read_stream, read_timeout),
            writer: Arc::new(Mutex::new(writer)),
            write_chunk_size,
            bandwidth: RTMP_DEFAULT_BANDWIDTH,
            ack_window: 0,
            last_ack: 0,
        }
    }

    async fn write_bytes(writer: &Mutex<ChunkWriter<TW>>, bytes: &[u8]) -> Result<(), ClientError> {
        let mut writer_v = writer.lock().await;
        (*writer_v).write_bytes(bytes).await
    }

    async fn run_handshake(&mut self) -> Result<(), ClientError> {
        let c0_c1 = generate_c0_c1(&self.logger)
            .map_err(|_| ClientError::Handshake("Could not generate C1".to_string()))?;

        Self::write_bytes(&self.writer, &c0_c1).await?;

        let mut s0 = [0u8; 1];
        self.reader.read_raw(&mut s0).await?;

        if validate_s0(s0[0]).is_err() {
            return Err(ClientError::Handshake(format!(
                "Invalid server version: {}",
                s0[0]
            )));
        }

        let mut s1: Vec<u8> = vec![0; RTMP_HANDSHAKE_SIZE];
        self.reader.read_raw(&mut s1).await?;

        let mut s2: Vec<u8> = vec![0; RTMP_HANDSHAKE_SIZE];
        self.reader.read_raw(&mut s2).await?;

        let c2 = generate_c2(&s1)
            .map_err(|_| ClientError::Handshake("Invalid S1".to_string()))?;

        Self::write_bytes(&self.writer, &c2).await
    }

    /// Applies a protocol control message
    async fn handle_control_message(&mut self, msg: &RtmpMessage) -> Result<(), ClientError> {
        match msg.message_type {
            RTMP_TYPE_SET_CHUNK_SIZE => {
                let size = read_control_u32(msg)? & 0x7fffffff;

                if size == 0 {
                    return Err(ClientError::Transport("Invalid chunk size: 0".to_string()));
                }

                self.reader.set_chunk_size(size as usize);

                let logger = &self.logger;
                log_debug!(logger, format!("Read chunk size set to {}", size));
            }
            RTMP_TYPE_ABORT => {
                let chunk_stream_id = read_control_u32(msg)?;
                self.reader.abort(chunk_stream_id);
            }
            RTMP_TYPE_WINDOW_ACKNOWLEDGEMENT_SIZE => {
                self.ack_window = read_control_u32(msg)?;

                let logger = &self.logger;
                log_debug!(
                    logger,
                    format!("Window acknowledgement size set to {}", self.ack_window)
                );
            }
            RTMP_TYPE_SET_PEER_BANDWIDTH => {
                self.bandwidth = read_control_u32(msg)?;

                let logger = &self.logger;
                log_debug!(logger, format!("Peer bandwidth set to {}", self.bandwidth));
            }
            RTMP_TYPE_EVENT => {
                if msg.payload.len() >= 6 && BigEndian::read_u16(&msg.payload[0..2]) == PING_REQUEST
                {
                    let timestamp = BigEndian::read_u32(&msg.payload[2..6]);

                    self.send_message(rtmp_make_ping_response(timestamp)).await?;

                    let logger = &self.logger;
                    log_trace!(logger, format!("Answered ping: {}", timestamp));
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Sends an acknowledgement if the window was exceeded
    async fn acknowledge(&mut self) -> Result<(), ClientError> {
        if self.ack_window == 0 {
            return Ok(());
        }

        let bytes_read = self.reader.bytes_read();

        if bytes_read.wrapping_sub(self.last_ack) >= self.ack_window {
            self.last_ack = bytes_read;

            self.send_message(rtmp_make_ack(bytes_read)).await?;

            let logger = &self.logger;
            log_trace!(logger, format!("Sent ACK: {}", bytes_read));
        }

        Ok(())
    }
}

fn read_control_u32(msg: &RtmpMessage) -> Result<u32, ClientError> {
    if msg.payload.len() < 4 {
        return Err(ClientError::Transport(format!(
            "Control message of type {} too short",
            msg.message_type
        )));
    }

    Ok(BigEndian::read_u32(&msg.payload[0..4]))
}

impl<TR, TW> RtmpTransport for RtmpStreamTransport<TR, TW>
where
    TR: AsyncRead + Send + Unpin,
    TW: AsyncWrite + Send + Unpin + 'static,
{
    type Sender = RtmpStreamSender<TW>;

    async fn handshake(&mut self) -> Result<(), ClientError> {
        self.run_handshake().await.map_err(|e| match e {
            ClientError::Transport(s) => ClientError::Handshake(s),
            other => other,
        })
    }

    async fn receive_message(&mut self) -> Result<RtmpMessage, ClientError> {
        let msg = self.reader.read_message().await?;

        self.handle_control_message(&msg).await?;

        self.acknowledge().await?;

        Ok(msg)
    }

    fn sender(&self) -> RtmpStreamSender<TW> {
        RtmpStreamSender {
            writer: self.writer.clone(),
        }
    }

    fn set_read_timeout(&mut self, read_timeout: Option<Duration>) {
        self.reader.set_read_timeout(read_timeout);
    }

    fn read_chunk_size(&self) -> usize {
        self.reader.chunk_size()
    }

    fn write_chunk_size(&self) -> usize {
        self.write_chunk_size.load(Ordering::Relaxed)
    }

    fn bandwidth(&self) -> u32 {
        self.bandwidth
    }
}

/// TCP transport
pub type RtmpTcpTransport = RtmpStreamTransport<OwnedReadHalf, OwnedWriteHalf>;

/// Connects to a RTMP server over TCP
///
/// # Arguments
///
/// * `logger` - Logger for the transport
/// * `host` - Server host
/// * `port` - Server port
/// * `connect_timeout` - Max time to establish the connection
/// * `read_timeout` - Max time to wait for each read
pub async fn dial_tcp(
    logger: Logger,
    host: &str,
    port: u16,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<RtmpTcpTransport, ClientError> {
    let connection = match tokio::time::timeout(connect_timeout, TcpStream::connect((host, port)))
        .await
    {
        Ok(r) => r?,
        Err(_) => {
            return Err(ClientError::Transport(format!(
                "Could not connect to {}:{}: Timed out",
                host, port
            )))
        }
    };

    connection.set_nodelay(true)?;

    let (read_stream, write_stream) = connection.into_split();

    Ok(RtmpStreamTransport::new(
        logger,
        read_stream,
        write_stream,
        Some(read_timeout),
    ))
}

// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtmp::{
        rtmp_make_chunk_size_set_message, rtmp_make_video_message, rtmp_make_window_ack,
        RtmpPacket, RTMP_TYPE_ACKNOWLEDGEMENT, RTMP_TYPE_VIDEO,
    };
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};

    type TestTransport = RtmpStreamTransport<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

    fn pair() -> (TestTransport, DuplexStream) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (r, w) = tokio::io::split(client);

        (
            RtmpStreamTransport::new(Logger::new_disabled(), r, w, Some(Duration::from_secs(5))),
            server,
        )
    }

    #[tokio::test]
    async fn test_handshake() {
        let (mut transport, mut server) = pair();

        let server_task = tokio::spawn(async move {
            let mut c0_c1 = vec![0; 1 + RTMP_HANDSHAKE_SIZE];
            server.read_exact(&mut c0_c1).await.unwrap();

            let s1: Vec<u8> = (0..RTMP_HANDSHAKE_SIZE).map(|i| i as u8).collect();

            server.write_all(&[3]).await.unwrap();
            server.write_all(&s1).await.unwrap();
            server.write_all(&c0_c1[1..]).await.unwrap();

            let mut c2 = vec![0; RTMP_HANDSHAKE_SIZE];
            server.read_exact(&mut c2).await.unwrap();

            (c0_c1[0], c2 == s1)
        });

        transport.handshake().await.unwrap();

        assert_eq!(server_task.await.unwrap(), (3, true));
    }

    #[tokio::test]
    async fn test_handshake_rejects_version() {
        let (mut transport, mut server) = pair();

        tokio::spawn(async move {
            let mut c0_c1 = vec![0; 1 + RTMP_HANDSHAKE_SIZE];
            server.read_exact(&mut c0_c1).await.unwrap();
            server.write_all(&[6]).await.unwrap();
            server.write_all(&vec![0; RTMP_HANDSHAKE_SIZE * 2]).await.unwrap();
            server
        });

        assert!(matches!(
            transport.handshake().await,
            Err(ClientError::Handshake(_))
        ));
    }

    #[tokio::test]
    async fn test_handshake_closed_connection() {
        let (mut transport, server) = pair();

        drop(server);

        assert!(matches!(
            transport.handshake().await,
            Err(ClientError::Handshake(_))
        ));
    }

    #[tokio::test]
    async fn test_applies_protocol_control() {
        let (mut transport, mut server) = pair();

        let mut bytes = rtmp_make_chunk_size_set_message(4096)
            .to_packet()
            .create_chunks(128);

        let mut bw = vec![0; 5];
        BigEndian::write_u32(&mut bw[0..4], 2_500_000);
        bw[4] = 2;
        bytes.extend(
            RtmpMessage::new(2, RTMP_TYPE_SET_PEER_BANDWIDTH, 0, 0, bw)
                .to_packet()
                .create_chunks(128),
        );

        bytes.extend(rtmp_make_video_message(1, 0, vec![1; 1000]).to_packet().create_chunks(4096));

        let mut ping = vec![0; 6];
        BigEndian::write_u16(&mut ping[0..2], PING_REQUEST);
        BigEndian::write_u32(&mut ping[2..6], 77);
        bytes.extend(
            RtmpMessage::new(2, RTMP_TYPE_EVENT, 0, 0, ping)
                .to_packet()
                .create_chunks(128),
        );

        server.write_all(&bytes).await.unwrap();

        transport.receive_message().await.unwrap();
        assert_eq!(transport.read_chunk_size(), 4096);

        transport.receive_message().await.unwrap();
        assert_eq!(transport.bandwidth(), 2_500_000);

        let video = transport.receive_message().await.unwrap();
        assert_eq!(video.message_type, RTMP_TYPE_VIDEO);
        assert_eq!(video.payload.len(), 1000);

        transport.receive_message().await.unwrap();

        let mut response = vec![0; 18];
        server.read_exact(&mut response).await.unwrap();

        assert_eq!(&response[12..], &[0, 7, 0, 0, 0, 77]);
    }

    #[tokio::test]
    async fn test_sends_acknowledgements() {
        let (mut transport, mut server) = pair();

        let mut bytes = rtmp_make_window_ack(100).to_packet().create_chunks(128);
        let window_msg_len = bytes.len() as u32;

        bytes.extend(
            RtmpPacket::new(6, RTMP_TYPE_VIDEO, 1, 0, vec![0; 120]).create_chunks(128),
        );

        server.write_all(&bytes).await.unwrap();

        transport.receive_message().await.unwrap();
        transport.receive_message().await.unwrap();

        let mut ack = vec![0; 16];
        server.read_exact(&mut ack).await.unwrap();

        assert_eq!(ack[7], RTMP_TYPE_ACKNOWLEDGEMENT as u8);
        assert_eq!(BigEndian::read_u32(&ack[12..16]), window_msg_len + 132);
    }

    #[tokio::test]
    async fn test_sender_updates_write_chunk_size() {
        let (transport, mut server) = pair();
        let sender = transport.sender();

        sender
            .send_message(rtmp_make_chunk_size_set_message(65535))
            .await
            .unwrap();

        assert_eq!(transport.write_chunk_size(), 65535);

        let mut b = vec![0; 16];
        server.read_exact(&mut b).await.unwrap();
        assert_eq!(&b[12..], &[0, 0, 0xff, 0xff]);

        sender.shutdown().await.unwrap();

        let mut rest = Vec::new();
        server.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_read_error_on_close() {
        let (mut transport, server) = pair();

        drop(server);

        assert!(matches!(
            transport.receive_message().await,
            Err(ClientError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_read_timeout() {
        let (mut transport, _server) = pair();

        transport.set_read_timeout(Some(Duration::from_millis(50)));

        assert!(matches!(
            transport.receive_message().await,
            Err(ClientError::Transport(_))
        ));
    }
}
