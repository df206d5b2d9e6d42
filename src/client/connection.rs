// Connection bootstrap

use crate::{
    log::Logger,
    log_debug, log_info, log_warning,
    rtmp::{
        rtmp_make_chunk_size_set_message, rtmp_make_invoke_message, RtmpInvoke, RtmpMessage,
        NET_CONNECTION_CONNECT_SUCCESS, TRANSACTION_ID_CONNECT,
    },
    transport::{dial_tcp, RtmpTcpTransport, RtmpTransport},
};

use super::{classify_message, trace_command, ClientError, MessageClass, RtmpAddress, RtmpClientConfiguration};

/// Connection to a RTMP server, after connect was accepted
pub struct RtmpConnection<T: RtmpTransport> {
    /// Session logger
    pub logger: Logger,

    /// Configuration
    config: RtmpClientConfiguration,

    /// Remote address
    address: RtmpAddress,

    /// Stream ID assigned by the server (0 until assigned)
    stream_id: u32,

    /// Transport
    transport: T,
}

impl RtmpConnection<RtmpTcpTransport> {
    /// Dials a server over TCP and runs the connection bootstrap
    ///
    /// # Arguments
    ///
    /// * `config` - Client configuration
    /// * `logger` - Session logger
    /// * `address` - Target address
    pub async fn dial(
        config: &RtmpClientConfiguration,
        logger: Logger,
        address: &str,
    ) -> Result<RtmpConnection<RtmpTcpTransport>, ClientError> {
        let address = RtmpAddress::parse(address)?;

        log_debug!(logger, format!("Dialing {}:{}", address.host, address.port));

        let transport = match dial_tcp(
            logger.make_child_logger(""),
            &address.host,
            address.port,
            config.connect_timeout,
            config.read_timeout,
        )
        .await
        {
            Ok(t) => t,
            Err(e) => {
                log_warning!(logger, format!("Could not dial: {}", e));
                return Err(e);
            }
        };

        RtmpConnection::establish(config, logger, address, transport).await
    }
}

impl<T: RtmpTransport> RtmpConnection<T> {
    /// Runs the connection bootstrap over an opened transport
    ///
    /// Handshake, chunk size announcement and connect, waiting for its result.
    pub async fn establish(
        config: &RtmpClientConfiguration,
        logger: Logger,
        address: RtmpAddress,
        mut transport: T,
    ) -> Result<RtmpConnection<T>, ClientError> {
        if let Err(e) = transport.handshake().await {
            log_warning!(logger, format!("Handshake failed: {}", e));
            return Err(e);
        }

        log_debug!(logger, "Handshake completed");

        transport
            .send_message(rtmp_make_chunk_size_set_message(config.chunk_size))
            .await?;

        let connect = RtmpInvoke::Connect {
            transaction_id: TRANSACTION_ID_CONNECT,
            app: address.app.clone(),
            flash_version: config.flash_version.clone(),
            swf_url: address.url.clone(),
            tc_url: address.url.clone(),
        };

        transport
            .send_message(rtmp_make_invoke_message(&connect, 0))
            .await?;

        let mut connection = RtmpConnection {
            logger,
            config: config.clone(),
            address,
            stream_id: 0,
            transport,
        };

        connection.wait_connect_result().await?;

        Ok(connection)
    }

    async fn wait_connect_result(&mut self) -> Result<(), ClientError> {
        loop {
            let msg = self.receive_message().await?;

            let (is_error, code) = match classify_message(&msg) {
                MessageClass::Command(RtmpInvoke::GenericResult { is_error, code, .. }) => {
                    (is_error, code)
                }
                _ => continue,
            };

            let logger = &self.logger;

            if !is_error && code == NET_CONNECTION_CONNECT_SUCCESS {
                log_info!(
                    logger,
                    format!("Connected to application '{}'", self.address.app)
                );

                return Ok(());
            }

            log_warning!(logger, format!("Connect rejected: {}", code));

            return Err(ClientError::ConnectRejected { code });
        }
    }

    /// Receives the next message
    pub async fn receive_message(&mut self) -> Result<RtmpMessage, ClientError> {
        let msg = self.transport.receive_message().await?;

        if msg.is_command() {
            trace_command(&self.logger, self.config.log_requests, &msg);
        }

        Ok(msg)
    }

    /// Sends a command on a message stream
    pub async fn send_invoke(&mut self, invoke: &RtmpInvoke, stream_id: u32) -> Result<(), ClientError> {
        if self.config.log_requests {
            let logger = &self.logger;
            log_debug!(logger, format!("Sending {:?} on stream {}", invoke, stream_id));
        }

        self.transport
            .send_message(rtmp_make_invoke_message(invoke, stream_id))
            .await
    }

    /// Gets the remote address
    pub fn address(&self) -> &RtmpAddress {
        &self.address
    }

    /// Gets the application name
    pub fn app_name(&self) -> &str {
        &self.address.app
    }

    /// Gets the configuration
    pub fn config(&self) -> &RtmpClientConfiguration {
        &self.config
    }

    /// Gets the stream ID assigned by the server
    pub fn stream_id(&self) -> u32 {
        self.stream_id
    }

    /// Sets the stream ID assigned by the server
    pub fn set_stream_id(&mut self, stream_id: u32) {
        self.stream_id = stream_id;
    }

    pub fn read_chunk_size(&self) -> usize {
        self.transport.read_chunk_size()
    }

    pub fn write_chunk_size(&self) -> usize {
        self.transport.write_chunk_size()
    }

    pub fn bandwidth(&self) -> u32 {
        self.transport.bandwidth()
    }

    /// Gets the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Gets the transport, mutable
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

// Tests
