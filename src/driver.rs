//! Ingestion driver: spawns and coordinates the pipeline tasks.
//!
//! One producer task drives source, rate limiter, and encoder serially;
//! one task per stream channel owns that channel's connection and backoff.
//! Hand-off between producer and channels goes through bounded capacity-1
//! queues with drop-on-full, so a channel stuck in backoff can never stall
//! the producer or its sibling channels.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::channel::{SendOutcome, StreamChannel};
use crate::config::{IngestConfig, StreamProfile};
use crate::encode::encode;
use crate::limiter::RateLimiter;
use crate::source::FrameSource;
use crate::transport::Connector;
use crate::types::Payload;
use crate::Result;

/// Running ingestion pipeline.
pub struct IngestHandle {
    cancel: CancellationToken,
    producer: JoinHandle<()>,
    channels: Vec<JoinHandle<()>>,
}

impl IngestHandle {
    /// Signal shutdown and wait for every task to finish.
    ///
    /// The producer stops acquiring frames, each channel closes its
    /// connection, and the source is released. Backoff sleeps observe the
    /// cancellation, so this returns promptly even mid-backoff.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.producer.await;
        for task in self.channels {
            let _ = task.await;
        }
    }

    /// Token observed by all pipeline tasks.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Spawns and manages the ingestion tasks.
pub struct IngestDriver;

impl IngestDriver {
    /// Spawn the pipeline for the given source and transport.
    ///
    /// # Errors
    ///
    /// Returns a configuration error before spawning anything when the
    /// config is invalid. Failures to open the source itself surface from
    /// the source's constructor, before this call.
    pub fn spawn<S>(
        config: IngestConfig,
        source: S,
        connector: Arc<dyn Connector>,
    ) -> Result<IngestHandle>
    where
        S: FrameSource,
    {
        config.validate()?;

        let cancel = CancellationToken::new();
        let mut outputs = Vec::with_capacity(config.profiles.len());
        let mut channels = Vec::with_capacity(config.profiles.len());

        for profile in &config.profiles {
            // Capacity 1: a channel mid-send or mid-backoff holds at most
            // one pending payload; anything newer is dropped at hand-off.
            let (tx, rx) = mpsc::channel::<Payload>(1);
            let channel = StreamChannel::new(
                profile.stream.clone(),
                config.stream_url(&profile.stream),
                Arc::clone(&connector),
                config.reconnect,
                cancel.clone(),
            );
            channels.push(tokio::spawn(Self::channel_task(channel, rx, cancel.clone())));
            outputs.push((profile.clone(), tx));
        }

        let limiter = RateLimiter::new(config.fps_limit);
        let idle_poll = config.idle_poll;
        let cancel_producer = cancel.clone();
        let producer = tokio::spawn(async move {
            Self::producer_task(source, outputs, limiter, idle_poll, cancel_producer).await;
        });

        Ok(IngestHandle { cancel, producer, channels })
    }

    /// Producer task: acquire, throttle, encode, fan out.
    async fn producer_task<S>(
        mut source: S,
        outputs: Vec<(StreamProfile, mpsc::Sender<Payload>)>,
        mut limiter: RateLimiter,
        idle_poll: Duration,
        cancel: CancellationToken,
    ) where
        S: FrameSource,
    {
        info!("Producer task started ({} streams)", outputs.len());
        let mut frame_count = 0u64;
        let mut error_count = 0u32;
        const MAX_ERRORS: u32 = 10;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let acquired = tokio::select! {
                _ = cancel.cancelled() => break,
                result = source.acquire() => result,
            };

            match acquired {
                Ok(Some(frame)) => {
                    error_count = 0;
                    limiter.throttle().await;
                    frame_count += 1;
                    trace!("Frame {}: {}x{}", frame_count, frame.width, frame.height);

                    for (profile, tx) in &outputs {
                        match encode(&frame, profile) {
                            Ok(payload) => match tx.try_send(payload) {
                                Ok(()) => {}
                                Err(TrySendError::Full(_)) => {
                                    debug!(
                                        "Stream '{}' busy, payload dropped at hand-off",
                                        profile.stream
                                    );
                                }
                                Err(TrySendError::Closed(_)) => {
                                    debug!("Stream '{}' channel task gone", profile.stream);
                                }
                            },
                            Err(e) => {
                                debug!(
                                    "Encode failed for stream '{}', skipping payload: {}",
                                    profile.stream, e
                                );
                            }
                        }
                    }
                }
                Ok(None) => {
                    // Not an error and not a production tick; just pace the
                    // next poll.
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = sleep(idle_poll) => {}
                    }
                }
                Err(e) => {
                    error_count += 1;
                    warn!("Source error ({}/{}): {}", error_count, MAX_ERRORS, e);
                    if error_count >= MAX_ERRORS {
                        error!("Too many source errors, shutting down producer");
                        break;
                    }
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = sleep(idle_poll) => {}
                    }
                }
            }
        }

        source.release();
        info!("Producer task ended ({} frames)", frame_count);
    }

    /// Channel task: drain one stream's queue through its channel.
    async fn channel_task(
        mut channel: StreamChannel,
        mut rx: mpsc::Receiver<Payload>,
        cancel: CancellationToken,
    ) {
        debug!("Channel task started for stream '{}'", channel.stream());

        loop {
            let payload = tokio::select! {
                _ = cancel.cancelled() => break,
                next = rx.recv() => match next {
                    Some(payload) => payload,
                    None => break,
                },
            };

            match channel.send(payload).await {
                SendOutcome::Delivered => {
                    trace!("Stream '{}' payload delivered", channel.stream());
                }
                SendOutcome::Dropped(reason) => {
                    debug!("Stream '{}' payload dropped: {:?}", channel.stream(), reason);
                }
            }
        }

        channel.shutdown().await;
        debug!("Channel task ended for stream '{}'", channel.stream());
    }
}
