use serde::{Deserialize, Serialize};

use crate::state::state_machine::MatchPhase;

/// Match phase as announced to players.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum VisibleMatchPhase {
    /// Terms are being dealt.
    Loading,
    /// Players submit their word for the round.
    Words,
    /// Players guess which two players share a term.
    Bets,
    /// Terms and scores are revealed.
    Payout,
}

impl From<MatchPhase> for VisibleMatchPhase {
    fn from(value: MatchPhase) -> Self {
        match value {
            MatchPhase::Loading => VisibleMatchPhase::Loading,
            MatchPhase::Words => VisibleMatchPhase::Words,
            MatchPhase::Bets => VisibleMatchPhase::Bets,
            MatchPhase::Payout => VisibleMatchPhase::Payout,
        }
    }
}
