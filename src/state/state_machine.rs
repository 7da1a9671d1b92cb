use thiserror::Error;
use uuid::Uuid;

/// Phases a single JanK match walks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchPhase {
    /// Terms are being fetched and dealt to the players.
    Loading,
    /// Players submit their word for the current round.
    Words,
    /// Players bet on which two players share a term.
    Bets,
    /// Scores have been computed and persisted; waiting for everyone to be ready.
    Payout,
}

/// Events that move a match from one phase to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    /// Every player received a term (or the joker).
    TermsDealt,
    /// Every player submitted a word for the current round.
    WordsCollected,
    /// Every player bet in the first round; the second round starts.
    RoundSettled,
    /// Every player bet in the last round and the match was scored.
    MatchScored,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the match was in when the event was received.
    pub from: MatchPhase,
    /// The event that cannot be applied from this phase.
    pub event: MatchEvent,
}

/// Errors that can occur when planning a transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    #[error("a transition is already pending")]
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    #[error(transparent)]
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// No transition is currently pending.
    #[error("no transition is pending")]
    NoPending,
    /// Plan ID does not match the pending plan.
    #[error("pending plan is {expected}, got {got}")]
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// Phase changed since the plan was created.
    #[error("phase changed during transition (expected {expected:?}, got {actual:?})")]
    PhaseMismatch {
        /// Phase when the plan was created.
        expected: MatchPhase,
        /// Current phase.
        actual: MatchPhase,
    },
}

/// Errors that can occur when aborting a planned transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbortError {
    /// No transition is currently pending.
    #[error("no transition is pending")]
    NoPending,
    /// Plan ID does not match the pending plan.
    #[error("pending plan is {expected}, got {got}")]
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned transition.
pub type PlanId = Uuid;

/// A validated transition that has not been applied yet.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the match is currently in.
    pub from: MatchPhase,
    /// Phase the match will be in once applied.
    pub to: MatchPhase,
    /// Event that triggered this transition.
    pub event: MatchEvent,
}

/// Phase tracker for one match.
///
/// Transitions that need asynchronous work before they can take effect (the
/// payout must be persisted first) are split into [`plan`](Self::plan) and
/// [`apply`](Self::apply)/[`abort`](Self::abort); the others go through
/// [`advance`](Self::advance).
#[derive(Debug, Clone)]
pub struct MatchStateMachine {
    phase: MatchPhase,
    version: usize,
    pending: Option<Plan>,
}

impl Default for MatchStateMachine {
    fn default() -> Self {
        Self {
            phase: MatchPhase::Loading,
            version: 0,
            pending: None,
        }
    }
}

impl MatchStateMachine {
    /// Create a state machine in the loading phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Number of transitions applied so far.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Whether a planned transition is waiting to be applied or aborted.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Validate that `event` can be applied and reserve the transition.
    pub fn plan(&mut self, event: MatchEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let to = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to,
            event,
        };
        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition and return the new phase.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<MatchPhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        self.phase = plan.to;
        self.version += 1;

        Ok(self.phase)
    }

    /// Drop a planned transition, leaving the phase untouched.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    /// Plan and apply a transition in one step.
    pub fn advance(&mut self, event: MatchEvent) -> Result<MatchPhase, PlanError> {
        let plan = self.plan(event)?;
        // The plan was created right above, so it always matches.
        Ok(self.apply(plan.id).unwrap_or(plan.to))
    }

    fn compute_transition(&self, event: MatchEvent) -> Result<MatchPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (MatchPhase::Loading, MatchEvent::TermsDealt) => MatchPhase::Words,
            (MatchPhase::Words, MatchEvent::WordsCollected) => MatchPhase::Bets,
            (MatchPhase::Bets, MatchEvent::RoundSettled) => MatchPhase::Words,
            (MatchPhase::Bets, MatchEvent::MatchScored) => MatchPhase::Payout,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_phase_is_loading() {
        let sm = MatchStateMachine::new();
        assert_eq!(sm.phase(), MatchPhase::Loading);
        assert_eq!(sm.version(), 0);
    }

    #[test]
    fn full_match_walks_every_phase() {
        let mut sm = MatchStateMachine::new();

        assert_eq!(sm.advance(MatchEvent::TermsDealt), Ok(MatchPhase::Words));
        assert_eq!(sm.advance(MatchEvent::WordsCollected), Ok(MatchPhase::Bets));
        assert_eq!(sm.advance(MatchEvent::RoundSettled), Ok(MatchPhase::Words));
        assert_eq!(sm.advance(MatchEvent::WordsCollected), Ok(MatchPhase::Bets));
        assert_eq!(sm.advance(MatchEvent::MatchScored), Ok(MatchPhase::Payout));
        assert_eq!(sm.version(), 5);
    }

    #[test]
    fn words_cannot_be_collected_while_loading() {
        let mut sm = MatchStateMachine::new();
        let err = sm.plan(MatchEvent::WordsCollected).unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, MatchPhase::Loading);
                assert_eq!(invalid.event, MatchEvent::WordsCollected);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn payout_is_terminal() {
        let mut sm = MatchStateMachine::new();
        sm.advance(MatchEvent::TermsDealt).unwrap();
        sm.advance(MatchEvent::WordsCollected).unwrap();
        sm.advance(MatchEvent::MatchScored).unwrap();

        for event in [
            MatchEvent::TermsDealt,
            MatchEvent::WordsCollected,
            MatchEvent::RoundSettled,
            MatchEvent::MatchScored,
        ] {
            assert!(sm.plan(event).is_err(), "{event:?} accepted in payout");
        }
    }

    #[test]
    fn pending_plan_blocks_other_plans() {
        let mut sm = MatchStateMachine::new();
        sm.advance(MatchEvent::TermsDealt).unwrap();
        sm.advance(MatchEvent::WordsCollected).unwrap();

        let plan = sm.plan(MatchEvent::MatchScored).unwrap();
        assert!(sm.is_pending());
        assert_eq!(
            sm.plan(MatchEvent::RoundSettled).unwrap_err(),
            PlanError::AlreadyPending
        );

        assert_eq!(sm.apply(plan.id), Ok(MatchPhase::Payout));
        assert!(!sm.is_pending());
    }

    #[test]
    fn abort_keeps_phase_and_clears_pending() {
        let mut sm = MatchStateMachine::new();
        sm.advance(MatchEvent::TermsDealt).unwrap();
        sm.advance(MatchEvent::WordsCollected).unwrap();

        let plan = sm.plan(MatchEvent::MatchScored).unwrap();
        sm.abort(plan.id).unwrap();

        assert_eq!(sm.phase(), MatchPhase::Bets);
        assert!(!sm.is_pending());
        assert!(sm.plan(MatchEvent::MatchScored).is_ok());
    }

    #[test]
    fn apply_with_wrong_id_keeps_plan() {
        let mut sm = MatchStateMachine::new();
        let plan = sm.plan(MatchEvent::TermsDealt).unwrap();

        let err = sm.apply(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ApplyError::IdMismatch { .. }));
        assert!(sm.is_pending());
        assert_eq!(sm.apply(plan.id), Ok(MatchPhase::Words));
    }
}
