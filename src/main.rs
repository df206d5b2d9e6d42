// Main

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use rtmp_client::{
    client::{
        ClientError, MediaFrame, MediaKind, MediaSink, PublisherSession, RtmpClientConfiguration,
        SubscriberSession,
    },
    log::Logger,
    log_error, log_info, log_warning,
    utils::{get_env_list, get_env_u32},
};
use tokio::task::JoinSet;

/// Size of the frame buffer between the pull and the push of a relay
const RELAY_BUFFER_SIZE: usize = 1024;

/// Interval to report pulled media (milliseconds)
const MEDIA_REPORT_INTERVAL_MS: i64 = 10000;

/// Sink counting pulled media, reporting periodically
struct MediaCounter {
    logger: Logger,
    audio_frames: u64,
    video_frames: u64,
    bytes: u64,
    last_timestamp: u32,
    last_report: i64,
}

impl MediaCounter {
    fn new(logger: Logger) -> MediaCounter {
        MediaCounter {
            logger,
            audio_frames: 0,
            video_frames: 0,
            bytes: 0,
            last_timestamp: 0,
            last_report: Utc::now().timestamp_millis(),
        }
    }
}

impl MediaSink for MediaCounter {
    fn push_frame(&mut self, frame: MediaFrame) -> bool {
        match frame.kind {
            MediaKind::Audio => self.audio_frames += 1,
            MediaKind::Video => self.video_frames += 1,
        }

        self.bytes = self.bytes.wrapping_add(frame.payload.len() as u64);
        self.last_timestamp = frame.timestamp;

        let now = Utc::now().timestamp_millis();
        let time_diff = now - self.last_report;

        if time_diff >= MEDIA_REPORT_INTERVAL_MS {
            let bit_rate =
                f64::round((self.bytes as f64) * 8.0 / ((time_diff as f64) / 1000.0));

            let logger = &self.logger;
            log_info!(
                logger,
                format!(
                    "Received {} audio and {} video frames. Timestamp: {} ms. Bit rate: {} bps",
                    self.audio_frames, self.video_frames, self.last_timestamp, bit_rate
                )
            );

            self.bytes = 0;
            self.last_report = now;
        }

        true
    }
}

/// Runs a pull, counting the received media
async fn run_pull(
    logger: &Logger,
    config: &RtmpClientConfiguration,
    source: &str,
) -> Result<(), ClientError> {
    let mut subscriber = SubscriberSession::connect(config, logger, source).await?;
    let mut counter = MediaCounter::new(logger.make_child_logger(&format!("[PULL {}] ", source)));

    subscriber.run(&mut counter).await
}

/// Runs a relay: pulls from source, pushes to target
async fn run_relay(
    logger: &Logger,
    config: &RtmpClientConfiguration,
    source: &str,
    target: &str,
) -> Result<(), ClientError> {
    let mut subscriber = SubscriberSession::connect(config, logger, source).await?;
    let mut publisher = PublisherSession::connect(config, logger, target).await?;

    let (mut frames_sender, frames_receiver) =
        tokio::sync::mpsc::channel::<MediaFrame>(RELAY_BUFFER_SIZE);

    let push_task = tokio::spawn(async move { publisher.run(Some(frames_receiver)).await });

    let pull_result = subscriber.run(&mut frames_sender).await;

    // Ends the push once the buffered frames are sent
    drop(frames_sender);

    let push_result = match push_task.await {
        Ok(r) => r,
        Err(e) => Err(ClientError::Transport(e.to_string())),
    };

    pull_result.and(push_result)
}

/// Runs a task again after it ends, if retry_seconds > 0
async fn run_with_retry<F, Fut>(logger: Arc<Logger>, name: String, retry_seconds: u32, task: F)
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<(), ClientError>>,
{
    loop {
        match task().await {
            Ok(()) => {
                log_info!(logger, format!("{} ended", name));
            }
            Err(e) => {
                log_warning!(logger, format!("{} ended with error: {}", name, e));
            }
        }

        if retry_seconds == 0 {
            return;
        }

        log_info!(
            logger,
            format!("Retrying {} in {} seconds", name, retry_seconds)
        );

        tokio::time::sleep(Duration::from_secs(retry_seconds as u64)).await;
    }
}

/// Main function
#[tokio::main]
async fn main() {
    // Load .env
    let _ = dotenvy::dotenv();

    // Initialize logger

    let logger = Arc::new(Logger::new_from_env());

    // Print version

    const VERSION: &str = env!("CARGO_PKG_VERSION");

    logger.log_info(&format!("RTMP Client (Rust Implementation) ({VERSION})"));

    // Load configuration

    let config = match RtmpClientConfiguration::load_from_env(&logger) {
        Ok(c) => Arc::new(c),
        Err(_) => {
            std::process::exit(1);
        }
    };

    let retry_seconds = get_env_u32("RETRY_SECONDS", 0);

    let mut tasks = JoinSet::new();

    // Pulls

    for source in get_env_list("PULL_ON_START", ',') {
        let logger = logger.clone();
        let config = config.clone();

        tasks.spawn(async move {
            let name = format!("Pull of {}", source);

            run_with_retry(logger.clone(), name, retry_seconds, || {
                run_pull(&logger, &config, &source)
            })
            .await;
        });
    }

    // Relays

    for relay in get_env_list("RELAY_ON_START", ',') {
        let (source, target) = match relay.split_once('|') {
            Some((s, t)) if !s.trim().is_empty() && !t.trim().is_empty() => {
                (s.trim().to_string(), t.trim().to_string())
            }
            _ => {
                log_error!(
                    logger,
                    format!("RELAY_ON_START has an invalid value: {}", relay)
                );
                std::process::exit(1);
            }
        };

        let logger = logger.clone();
        let config = config.clone();

        tasks.spawn(async move {
            let name = format!("Relay of {} to {}", source, target);

            run_with_retry(logger.clone(), name, retry_seconds, || {
                run_relay(&logger, &config, &source, &target)
            })
            .await;
        });
    }

    if tasks.is_empty() {
        log_warning!(
            logger,
            "Nothing to do. Set PULL_ON_START or RELAY_ON_START"
        );
        return;
    }

    let interrupted = tokio::select! {
        _ = async { while tasks.join_next().await.is_some() {} } => false,
        _ = tokio::signal::ctrl_c() => true,
    };

    if interrupted {
        log_info!(logger, "Interrupted. Closing sessions");
        tasks.abort_all();
    } else {
        log_info!(logger, "All sessions ended");
    }
}
