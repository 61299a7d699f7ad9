use log::{info, warn};
use reqwest::{Client, ClientBuilder};
use sc_common::snapshot::StreamSnapshot;
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::{
    sync::mpsc,
    task,
    time::{Duration, interval},
};

use crate::{AppConfig, presenter::Presenter, stage::SharedStage};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);
const RESULT_CHANNEL_LEN: usize = 4;

/// Reasons one poll cycle can fail. Never fatal and never forwarded to the
/// animation subsystem: the cycle is skipped and the next interval retries.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
}

/// Fetches StreamControl snapshots over HTTP.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    url: String,
}

impl FeedClient {
    pub fn new(url: String) -> Self {
        Self {
            client: ClientBuilder::new()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .expect("Couldn't create HTTP client!"),
            url,
        }
    }

    /// Requests one snapshot. The `v` query parameter defeats HTTP caches
    /// sitting between us and the StreamControl output file.
    pub async fn fetch(&self) -> Result<StreamSnapshot, FetchError> {
        let stamp = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let body = self
            .client
            .get(&self.url)
            .query(&[("v", stamp.to_string())])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Decides which completed fetches reach the presenter. Every request
/// carries a monotonically increasing sequence number; only a response newer
/// than the last applied one is considered, and of those only the ones whose
/// timestamp actually changed. A slow stale fetch can therefore never
/// overwrite newer state.
#[derive(Debug, Default)]
struct SnapshotGate {
    last_seq: Option<u64>,
    last_timestamp: Option<String>,
}

impl SnapshotGate {
    fn admit(&mut self, seq: u64, snapshot: &StreamSnapshot) -> bool {
        if self.last_seq.is_some_and(|last| seq <= last) {
            return false;
        }
        self.last_seq = Some(seq);

        if self.last_timestamp.as_deref() == Some(snapshot.timestamp.as_str()) {
            return false;
        }
        self.last_timestamp = Some(snapshot.timestamp.clone());
        true
    }
}

/// Entry point of the polling thread. Everything driven from here shares one
/// current-thread runtime, so animations interleave cooperatively and only
/// at await points.
#[tokio::main(flavor = "current_thread")]
pub async fn polling_thread(stage: SharedStage, config: AppConfig) {
    let mut presenter = Presenter::new(Arc::new(stage), config.durations);
    let feed = FeedClient::new(config.stream_control_url);
    run(&mut presenter, feed, Duration::from_millis(config.update_interval)).await;
}

async fn run(presenter: &mut Presenter, feed: FeedClient, update_interval: Duration) {
    let (tx, mut rx) = mpsc::channel::<(u64, StreamSnapshot)>(RESULT_CHANNEL_LEN);
    let mut ticker = interval(update_interval);
    let mut next_seq = 0u64;
    let mut gate = SnapshotGate::default();
    let mut initialized = false;

    info!("Polling {} every {:?}", feed.url, update_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                next_seq += 1;
                let seq = next_seq;
                let feed = feed.clone();
                let tx = tx.clone();
                task::spawn(async move {
                    match feed.fetch().await {
                        // A full channel only means newer results are
                        // already queued; this one can go.
                        Ok(snapshot) => {
                            let _ = tx.try_send((seq, snapshot));
                        }
                        Err(e) => warn!("Snapshot request {seq} failed: {e}"),
                    }
                });
            }
            Some((seq, snapshot)) = rx.recv() => {
                if !gate.admit(seq, &snapshot) {
                    continue;
                }
                if initialized {
                    presenter.update(&snapshot);
                } else {
                    info!("Received first snapshot, initializing overlay");
                    presenter.initialize(&snapshot).await;
                    initialized = true;
                }
            }
        }
    }
}
