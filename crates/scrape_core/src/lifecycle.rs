use std::fmt;

use thiserror::Error;

/// Stages of a single run, in the only order they may be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunStage {
    #[default]
    Idle,
    Searching,
    ListingWalk,
    Harvesting,
    Exporting,
    Done,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal run transition {from} -> {to}")]
pub struct LifecycleError {
    pub from: RunStage,
    pub to: RunStage,
}

impl RunStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStage::Done | RunStage::Error)
    }

    fn successor(self) -> Option<RunStage> {
        match self {
            RunStage::Idle => Some(RunStage::Searching),
            RunStage::Searching => Some(RunStage::ListingWalk),
            RunStage::ListingWalk => Some(RunStage::Harvesting),
            RunStage::Harvesting => Some(RunStage::Exporting),
            RunStage::Exporting => Some(RunStage::Done),
            RunStage::Done | RunStage::Error => None,
        }
    }

    /// Moves to `next` if it is the direct successor, or `Error` from any live stage.
    pub fn advance(self, next: RunStage) -> Result<RunStage, LifecycleError> {
        let allowed = match next {
            RunStage::Error => !self.is_terminal(),
            _ => self.successor() == Some(next),
        };
        if allowed {
            Ok(next)
        } else {
            Err(LifecycleError {
                from: self,
                to: next,
            })
        }
    }

    /// Human-readable label used in progress events.
    pub fn label(self) -> &'static str {
        match self {
            RunStage::Idle => "Idle",
            RunStage::Searching => "Searching",
            RunStage::ListingWalk => "Walking listing pages",
            RunStage::Harvesting => "Scraping products",
            RunStage::Exporting => "Exporting",
            RunStage::Done => "Done",
            RunStage::Error => "Error",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::RunStage;

    #[test]
    fn happy_path_walks_every_stage_in_order() {
        let mut stage = RunStage::Idle;
        for next in [
            RunStage::Searching,
            RunStage::ListingWalk,
            RunStage::Harvesting,
            RunStage::Exporting,
            RunStage::Done,
        ] {
            stage = stage.advance(next).unwrap();
        }
        assert_eq!(stage, RunStage::Done);
        assert!(stage.is_terminal());
    }

    #[test]
    fn stages_cannot_be_skipped() {
        let err = RunStage::Searching.advance(RunStage::Harvesting).unwrap_err();
        assert_eq!(err.from, RunStage::Searching);
        assert_eq!(err.to, RunStage::Harvesting);
        assert!(RunStage::Harvesting.advance(RunStage::Searching).is_err());
    }

    #[test]
    fn error_is_reachable_from_any_live_stage_only() {
        for stage in [
            RunStage::Idle,
            RunStage::Searching,
            RunStage::ListingWalk,
            RunStage::Harvesting,
            RunStage::Exporting,
        ] {
            assert_eq!(stage.advance(RunStage::Error), Ok(RunStage::Error));
        }
        assert!(RunStage::Done.advance(RunStage::Error).is_err());
        assert!(RunStage::Error.advance(RunStage::Error).is_err());
    }
}
