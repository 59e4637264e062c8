use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, trace, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::buffer::LogBuffer;
use crate::connection::{StreamConnection, INITIAL_CONNECT_DELAY, RECONNECT_DELAY};
use crate::error::TailError;
use crate::record::LogRecord;

pub const DEFAULT_MAX_LOGS: usize = 100;

/// Which log feeds to follow: one, or several merged into one view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Single(String),
    Combined(Vec<String>),
}

impl SourceSpec {
    pub fn identifiers(&self) -> Vec<&str> {
        match self {
            SourceSpec::Single(name) => vec![name.as_str()],
            SourceSpec::Combined(names) => names.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_combined(&self) -> bool {
        matches!(self, SourceSpec::Combined(_))
    }
}

#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub base_url: String,
    pub max_logs: usize,
    pub initial_delay: Duration,
    pub reconnect_delay: Duration,
}

impl ManagerConfig {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            max_logs: DEFAULT_MAX_LOGS,
            initial_delay: INITIAL_CONNECT_DELAY,
            reconnect_delay: RECONNECT_DELAY,
        }
    }
}

struct ConnectionHandle {
    alive: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// Owns the set of active subscriptions and the merged record buffer.
///
/// Records from every connection funnel into one ingest task, which is the
/// only writer of the buffer and publishes the ordered sequence after each
/// insert through a watch channel.
pub struct LogStreamManager {
    settings: ManagerConfig,
    client: reqwest::Client,
    connections: HashMap<String, ConnectionHandle>,
    ingest: Option<JoinHandle<()>>,
    snapshot_tx: watch::Sender<Vec<LogRecord>>,
    // Held so publishing always has a receiver.
    snapshot_rx: watch::Receiver<Vec<LogRecord>>,
}

impl LogStreamManager {
    pub fn new(settings: ManagerConfig) -> Self {
        let (snapshot_tx, snapshot_rx) = watch::channel(Vec::new());
        Self {
            settings,
            client: reqwest::Client::new(),
            connections: HashMap::new(),
            ingest: None,
            snapshot_tx,
            snapshot_rx,
        }
    }

    /// Replaces the followed sources. Existing connections and their retry
    /// timers are torn down, the buffer starts empty, and one connection is
    /// opened per identifier. An invalid spec is refused without touching
    /// the running configuration.
    pub fn configure(&mut self, spec: &SourceSpec) -> Result<(), TailError> {
        validate(spec)?;

        self.teardown();
        let _ = self.snapshot_tx.send(Vec::new());

        let (records_tx, records_rx) = mpsc::unbounded_channel();
        self.ingest = Some(self.spawn_ingest(records_rx));

        for name in spec.identifiers() {
            if self.connections.contains_key(name) {
                warn!("Duplicate source '{}' ignored", name);
                continue;
            }
            let alive = Arc::new(AtomicBool::new(true));
            let connection = StreamConnection::new(
                name.to_string(),
                &self.settings.base_url,
                self.client.clone(),
                records_tx.clone(),
                Arc::clone(&alive),
                self.settings.initial_delay,
                self.settings.reconnect_delay,
            );
            let task = tokio::spawn(connection.run());
            self.connections
                .insert(name.to_string(), ConnectionHandle { alive, task });
        }

        info!("Following {} log stream(s)", self.connections.len());
        Ok(())
    }

    /// Closes every connection and cancels pending reconnects. Idempotent.
    pub fn shutdown(&mut self) {
        self.teardown();
        info!("Log stream manager shut down");
    }

    /// A receiver that observes every published buffer state.
    pub fn subscribe(&self) -> watch::Receiver<Vec<LogRecord>> {
        self.snapshot_tx.subscribe()
    }

    /// The most recently published buffer state.
    pub fn snapshot(&self) -> Vec<LogRecord> {
        self.snapshot_rx.borrow().clone()
    }

    pub fn active_sources(&self) -> Vec<String> {
        let mut names: Vec<String> = self.connections.keys().cloned().collect();
        names.sort();
        names
    }

    fn spawn_ingest(&self, mut records_rx: mpsc::UnboundedReceiver<LogRecord>) -> JoinHandle<()> {
        let snapshot_tx = self.snapshot_tx.clone();
        let max_logs = self.settings.max_logs;
        tokio::spawn(async move {
            let mut buffer = LogBuffer::new(max_logs);
            while let Some(record) = records_rx.recv().await {
                let view = buffer.insert(record).to_vec();
                let _ = snapshot_tx.send(view);
                trace!("Buffer holds {} record(s)", buffer.len());
            }
        })
    }

    fn teardown(&mut self) {
        for (name, handle) in self.connections.drain() {
            handle.alive.store(false, Ordering::SeqCst);
            handle.task.abort();
            debug!("Closed log stream '{}'", name);
        }
        if let Some(task) = self.ingest.take() {
            task.abort();
        }
    }
}

impl Drop for LogStreamManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn validate(spec: &SourceSpec) -> Result<(), TailError> {
    match spec {
        SourceSpec::Single(name) if name.is_empty() => {
            Err(TailError::Config("source identifier is empty".to_string()))
        }
        SourceSpec::Combined(names) if names.is_empty() => Err(TailError::Config(
            "combined mode needs at least one source".to_string(),
        )),
        SourceSpec::Combined(names) if names.iter().any(|name| name.is_empty()) => Err(
            TailError::Config("source identifiers must not be empty".to_string()),
        ),
        _ => Ok(()),
    }
}
