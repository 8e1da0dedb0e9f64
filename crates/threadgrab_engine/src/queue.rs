use std::sync::Arc;

use threadgrab_core::MediaUrl;
use tokio::sync::{mpsc, Mutex};

/// Creates the shared download queue. Capacity is clamped to at least one.
///
/// The queue closes once every [`TaskSender`] clone has been dropped; workers
/// then drain what is left and see `None`.
pub fn task_queue(capacity: usize) -> (TaskSender, TaskReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        TaskSender { tx },
        TaskReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

#[derive(Debug, Clone)]
pub struct TaskSender {
    tx: mpsc::Sender<MediaUrl>,
}

impl TaskSender {
    /// Waits for room in the queue. Errors only when every receiver is gone.
    pub async fn send(&self, url: MediaUrl) -> Result<(), MediaUrl> {
        self.tx.send(url).await.map_err(|err| err.0)
    }
}

/// Receiving half shared by all workers. Each value goes to exactly one of them.
#[derive(Debug, Clone)]
pub struct TaskReceiver {
    rx: Arc<Mutex<mpsc::Receiver<MediaUrl>>>,
}

impl TaskReceiver {
    /// Next task, or `None` once the queue is closed and empty.
    pub async fn next(&self) -> Option<MediaUrl> {
        self.rx.lock().await.recv().await
    }
}
