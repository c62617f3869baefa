use thiserror::Error;

use crate::chain::ChainId;
use crate::config::EngineConfigError;
use crate::item::ItemId;
use crate::matchmaker::MatchmakingError;
use crate::provider::ProviderError;

/// Failures surfaced by engine operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GameError {
    #[error("provider failure: {0}")]
    ProviderFailure(#[from] ProviderError),
    #[error("candidate pool cannot seed a game: {0}")]
    EmptyPool(#[from] MatchmakingError),
    #[error("invalid selection on chain {chain:?} at index {index}: {reason}")]
    InvalidSelection {
        chain: ChainId,
        index: usize,
        reason: SelectionIssue,
    },
    #[error("starting actor {id} could not be resolved")]
    StartingActorUnavailable { id: ItemId },
    #[error("engine configuration invalid: {0}")]
    Config(#[from] EngineConfigError),
}

/// Why a selection was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionIssue {
    IndexOutOfRange,
    OptionOutOfRange,
    OptionDisabled,
    StartingItem,
}

impl std::fmt::Display for SelectionIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::IndexOutOfRange => "no link at that position",
            Self::OptionOutOfRange => "option not offered",
            Self::OptionDisabled => "option disabled by settings",
            Self::StartingItem => "starting actor cannot be removed",
        };
        f.write_str(text)
    }
}
