use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use log::{debug, info, trace, warn};
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::error::TailError;
use crate::record::LogRecord;
use crate::sse::SseParser;

pub const INITIAL_CONNECT_DELAY: Duration = Duration::from_secs(1);
// Reconnect waits are a fixed interval, not exponential backoff.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Erroring,
    ReconnectPending,
    Closed,
}

/// Explicit lifecycle of one subscription. Every transition is a method so
/// illegal moves (reconnecting a closed stream, scheduling a second retry)
/// collapse to no-ops.
pub struct ConnectionLifecycle {
    state: ConnectionState,
}

impl ConnectionLifecycle {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Idle,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Begins the first connection attempt. False unless idle; retries
    /// re-enter through `retry_elapsed`.
    pub fn start_connect(&mut self) -> bool {
        match self.state {
            ConnectionState::Idle => {
                self.state = ConnectionState::Connecting;
                true
            }
            _ => false,
        }
    }

    pub fn opened(&mut self) {
        if self.state == ConnectionState::Connecting {
            self.state = ConnectionState::Open;
        }
    }

    /// Reports a transport error or stream end. True when this error is the
    /// one that schedules the retry; a second report while a retry is
    /// already pending is a no-op.
    pub fn on_error(&mut self) -> bool {
        match self.state {
            ConnectionState::Open | ConnectionState::Connecting => {
                self.state = ConnectionState::Erroring;
                true
            }
            _ => false,
        }
    }

    pub fn retry_scheduled(&mut self) {
        if self.state == ConnectionState::Erroring {
            self.state = ConnectionState::ReconnectPending;
        }
    }

    /// The retry timer fired. False when the connection was closed while
    /// the timer was pending; the caller must not reconnect.
    pub fn retry_elapsed(&mut self) -> bool {
        match self.state {
            ConnectionState::ReconnectPending => {
                self.state = ConnectionState::Connecting;
                true
            }
            _ => false,
        }
    }

    pub fn close(&mut self) {
        self.state = ConnectionState::Closed;
    }
}

/// One log stream subscription: connects, decodes events, forwards records,
/// reconnects after a flat delay until told to stop.
pub struct StreamConnection {
    source: String,
    url: String,
    client: reqwest::Client,
    records_tx: mpsc::UnboundedSender<LogRecord>,
    lifecycle: ConnectionLifecycle,
    alive: Arc<AtomicBool>,
    initial_delay: Duration,
    retry_delay: Duration,
}

impl StreamConnection {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: String,
        base_url: &str,
        client: reqwest::Client,
        records_tx: mpsc::UnboundedSender<LogRecord>,
        alive: Arc<AtomicBool>,
        initial_delay: Duration,
        retry_delay: Duration,
    ) -> Self {
        let url = format!("{}/logs/stream/{}", base_url.trim_end_matches('/'), source);
        Self {
            source,
            url,
            client,
            records_tx,
            lifecycle: ConnectionLifecycle::new(),
            alive,
            initial_delay,
            retry_delay,
        }
    }

    pub async fn run(mut self) {
        // Settle-in delay before the first open, so rapid reconfiguration
        // does not churn subscriptions.
        sleep(self.initial_delay).await;
        if !self.alive.load(Ordering::SeqCst) {
            return;
        }
        if !self.lifecycle.start_connect() {
            return;
        }

        loop {
            info!("Connecting to log stream '{}'", self.source);
            match self.stream_once().await {
                Ok(()) => info!("Log stream '{}' ended", self.source),
                Err(e) => warn!("Log stream '{}' failed: {}", self.source, e),
            }

            if self.lifecycle.on_error() {
                self.lifecycle.retry_scheduled();
                debug!(
                    "Retrying log stream '{}' in {:?}",
                    self.source, self.retry_delay
                );
                sleep(self.retry_delay).await;
            }

            if !self.alive.load(Ordering::SeqCst) {
                self.lifecycle.close();
            }

            // A fired timer on a closed connection must not reconnect.
            if !self.lifecycle.retry_elapsed() {
                debug!(
                    "Log stream '{}' stopping in state {:?}",
                    self.source,
                    self.lifecycle.state()
                );
                return;
            }
        }
    }

    async fn stream_once(&mut self) -> Result<(), TailError> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "text/event-stream")
            .send()
            .await?
            .error_for_status()?;

        self.lifecycle.opened();
        info!("Log stream '{}' open", self.source);

        let mut stream = response.bytes_stream();
        let mut parser = SseParser::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for payload in parser.push(&chunk) {
                match LogRecord::decode(&payload, &self.source) {
                    Ok(record) => {
                        trace!("Record from '{}': {}", self.source, record.message);
                        if self.records_tx.send(record).is_err() {
                            // Ingest side is gone; nothing left to feed.
                            return Ok(());
                        }
                    }
                    Err(e) => {
                        warn!(
                            "Dropping undecodable message from '{}': {}",
                            self.source, e
                        );
                    }
                }
            }
        }

        Ok(())
    }
}
