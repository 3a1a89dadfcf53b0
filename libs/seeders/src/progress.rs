use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub seed_name: String,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started { total: usize },
    Update(ProgressUpdate),
    Complete(String),
    Error(String, String),
    Skipped(String),
    Finish,
}

/// Fire-and-forget channel for run progress. Sends never fail the run,
/// even when the receiver is gone.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ProgressTracker {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn started(&self, total: usize) {
        let _ = self.tx.send(ProgressEvent::Started { total });
    }

    pub fn update(&self, update: ProgressUpdate) {
        let _ = self.tx.send(ProgressEvent::Update(update));
    }

    pub fn complete(&self, seed_name: String) {
        let _ = self.tx.send(ProgressEvent::Complete(seed_name));
    }

    pub fn error(&self, seed_name: String, error: String) {
        let _ = self.tx.send(ProgressEvent::Error(seed_name, error));
    }

    pub fn skipped(&self, seed_name: String) {
        let _ = self.tx.send(ProgressEvent::Skipped(seed_name));
    }

    pub fn finish(&self) { let _ = self.tx.send(ProgressEvent::Finish); }
}
