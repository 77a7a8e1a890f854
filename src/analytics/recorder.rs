//! Background scan recorder
//!
//! Redirect handlers hand scan events to an actor over an mpsc channel and
//! return immediately. The actor writes each event through
//! [`Storage::record_scan`]; failures are logged and dropped. Messages are
//! handled in order, so a flush or shutdown acknowledgement means every
//! event queued before it has been written.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::models::{NewScan, ScanTarget};
use crate::storage::Storage;

enum RecorderMessage {
    Record(Box<NewScan>),
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

struct RecorderActor {
    receiver: mpsc::Receiver<RecorderMessage>,
    storage: Arc<dyn Storage>,
}

impl RecorderActor {
    async fn run(mut self) {
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                RecorderMessage::Record(scan) => self.write(&scan).await,
                RecorderMessage::Flush(done) => {
                    let _ = done.send(());
                }
                RecorderMessage::Shutdown(done) => {
                    self.receiver.close();
                    while let Ok(pending) = self.receiver.try_recv() {
                        match pending {
                            RecorderMessage::Record(scan) => self.write(&scan).await,
                            RecorderMessage::Flush(ack) | RecorderMessage::Shutdown(ack) => {
                                let _ = ack.send(());
                            }
                        }
                    }
                    info!("Scan recorder drained, shutting down");
                    let _ = done.send(());
                    return;
                }
            }
        }
        warn!("Scan recorder channel closed without shutdown");
    }

    async fn write(&self, scan: &NewScan) {
        if let Err(e) = self.storage.record_scan(scan).await {
            match &scan.target {
                ScanTarget::QrCode { unique_id } => {
                    warn!(unique_id = %unique_id, error = %e, "Failed to record scan");
                }
                ScanTarget::ShortCode { short_code, .. } => {
                    warn!(short_code = %short_code, error = %e, "Failed to record scan");
                }
            }
        } else {
            debug!(scan_target = ?scan.target, "Recorded scan");
        }
    }
}

pub struct ScanRecorder {
    sender: mpsc::Sender<RecorderMessage>,
}

impl ScanRecorder {
    pub fn spawn(storage: Arc<dyn Storage>, buffer_size: usize) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        let actor = RecorderActor { receiver, storage };
        tokio::spawn(actor.run());
        Self { sender }
    }

    /// Queue a scan without waiting. Drops the event when the buffer is full.
    pub fn record(&self, scan: NewScan) {
        if let Err(e) = self.sender.try_send(RecorderMessage::Record(Box::new(scan))) {
            match e {
                mpsc::error::TrySendError::Full(_) => {
                    warn!("Scan buffer full, dropping event");
                }
                mpsc::error::TrySendError::Closed(_) => {
                    warn!("Scan recorder stopped, dropping event");
                }
            }
        }
    }

    /// Wait until everything queued so far is written.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(RecorderMessage::Flush(tx)).await.is_ok() {
            let _ = rx.await;
        }
    }

    /// Write out queued events and stop the actor.
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(RecorderMessage::Shutdown(tx)).await.is_ok() {
            let _ = rx.await;
        }
    }
}
