//! Engine operation errors.

use thiserror::Error;

use crate::coin::CoinId;

/// Errors an engine operation can reject with.
///
/// Neither kind is fatal. The mutation is refused, a short advisory may be
/// surfaced to the player, and the caller picks a different action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A gate or entanglement was attempted on a coin whose wave function
    /// has already collapsed.
    #[error("coin {coin} has already collapsed to a definite state")]
    AlreadyCollapsed { coin: CoinId },

    /// Self-entanglement, or an id that matches no live coin.
    #[error("coin {coin} is not a valid target for this operation")]
    InvalidTarget { coin: CoinId },
}
