use std::sync::Arc;

use scrape_core::{NoopObserver, ProgressUpdate, RunObserver};
use scrape_logging::{scrape_debug, scrape_info};
use tokio::sync::mpsc;

/// What a [`ChannelObserver`] forwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Log(String),
    Progress(ProgressUpdate),
}

/// Forwards events over an unbounded channel; a dropped receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<RunEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::UnboundedSender<RunEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RunEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl RunObserver for ChannelObserver {
    fn on_log(&self, message: &str) {
        let _ = self.tx.send(RunEvent::Log(message.to_string()));
    }

    fn on_progress(&self, update: &ProgressUpdate) {
        let _ = self.tx.send(RunEvent::Progress(update.clone()));
    }
}

/// Writes user-facing run messages to the log and to the observer.
#[derive(Clone)]
pub struct Reporter {
    observer: Arc<dyn RunObserver>,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(Arc::new(NoopObserver))
    }
}

impl Reporter {
    pub fn new(observer: Arc<dyn RunObserver>) -> Self {
        Self { observer }
    }

    pub fn log(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        scrape_info!("{}", message);
        self.observer.on_log(message);
    }

    pub fn progress(&self, update: ProgressUpdate) {
        scrape_debug!(
            "progress stage={} {}/{} {}%",
            update.stage,
            update.current,
            update.total,
            update.percent
        );
        self.observer.on_progress(&update);
    }
}
