use crate::RunStage;

pub const PERCENT_SEARCHING: u8 = 5;
pub const PERCENT_LISTED: u8 = 20;
pub const PERCENT_EXPORTING: u8 = 95;
pub const PERCENT_DONE: u8 = 100;

const HARVEST_SPAN: usize = 70;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub stage: RunStage,
    pub current: usize,
    pub total: usize,
    pub percent: u8,
    pub note: Option<String>,
}

impl ProgressUpdate {
    pub fn new(stage: RunStage, current: usize, total: usize, percent: u8) -> Self {
        Self {
            stage,
            current,
            total,
            percent,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Coarse harvesting percentage: linear from 20 to 90 over the queue.
pub fn harvest_percent(processed: usize, total: usize) -> u8 {
    let span = processed.min(total) * HARVEST_SPAN / total.max(1);
    // span <= 70, so the sum always fits.
    PERCENT_LISTED + span as u8
}

/// Receives log lines and progress updates from a run.
///
/// Calls are fire-and-forget: implementations must not block and must
/// tolerate nobody listening on the other side.
pub trait RunObserver: Send + Sync {
    fn on_log(&self, message: &str);
    fn on_progress(&self, update: &ProgressUpdate);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {
    fn on_log(&self, _message: &str) {}
    fn on_progress(&self, _update: &ProgressUpdate) {}
}

#[cfg(test)]
mod tests {
    use super::harvest_percent;

    #[test]
    fn harvest_percent_spans_twenty_to_ninety() {
        assert_eq!(harvest_percent(0, 10), 20);
        assert_eq!(harvest_percent(5, 10), 55);
        assert_eq!(harvest_percent(10, 10), 90);
        assert_eq!(harvest_percent(1, 3), 43);
    }

    #[test]
    fn harvest_percent_handles_empty_queue() {
        assert_eq!(harvest_percent(0, 0), 20);
        assert_eq!(harvest_percent(3, 0), 20);
    }
}
