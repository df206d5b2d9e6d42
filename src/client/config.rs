// Client configuration

use std::time::Duration;

use crate::{
    log::Logger,
    utils::{get_env_bool, get_env_string, get_env_u32},
};

/// Max chunk size the client announces
pub const RTMP_CLIENT_MAX_CHUNK_SIZE: u32 = 0xffffff;

/// Min chunk size the client announces
pub const RTMP_CLIENT_MIN_CHUNK_SIZE: u32 = 128;

/// RTMP client configuration
#[derive(Clone, Debug)]
pub struct RtmpClientConfiguration {
    /// Chunk size announced to the server and used to send
    pub chunk_size: u32,

    /// Value of flashVer in connect
    pub flash_version: String,

    /// Max time to establish the TCP connection
    pub connect_timeout: Duration,

    /// Max time to wait for each read
    pub read_timeout: Duration,

    /// True to log requests
    pub log_requests: bool,
}

impl Default for RtmpClientConfiguration {
    fn default() -> Self {
        RtmpClientConfiguration {
            chunk_size: 65535,
            flash_version: default_flash_version(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            log_requests: true,
        }
    }
}

fn default_flash_version() -> String {
    format!("rtmp-client/{}", env!("CARGO_PKG_VERSION"))
}

impl RtmpClientConfiguration {
    pub fn load_from_env(logger: &Logger) -> Result<RtmpClientConfiguration, ()> {
        let chunk_size = get_env_u32("RTMP_CHUNK_SIZE", 65535);

        if !(RTMP_CLIENT_MIN_CHUNK_SIZE..=RTMP_CLIENT_MAX_CHUNK_SIZE).contains(&chunk_size) {
            logger.log_error(&format!(
                "RTMP_CHUNK_SIZE has an invalid value: {}",
                chunk_size
            ));
            return Err(());
        }

        let flash_version = get_env_string("RTMP_FLASH_VERSION", &default_flash_version());

        let connect_timeout = get_env_u32("RTMP_CONNECT_TIMEOUT", 10);

        if connect_timeout == 0 {
            logger.log_error("RTMP_CONNECT_TIMEOUT must be greater than 0");
            return Err(());
        }

        let read_timeout = get_env_u32("RTMP_READ_TIMEOUT", 30);

        if read_timeout == 0 {
            logger.log_error("RTMP_READ_TIMEOUT must be greater than 0");
            return Err(());
        }

        let log_requests = get_env_bool("LOG_REQUESTS", true);

        Ok(RtmpClientConfiguration {
            chunk_size,
            flash_version,
            connect_timeout: Duration::from_secs(connect_timeout as u64),
            read_timeout: Duration::from_secs(read_timeout as u64),
            log_requests,
        })
    }
}
