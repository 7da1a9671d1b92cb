//! One play-through of the game: dealing, two word/bet rounds and the payout.

use std::time::SystemTime;

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    dao::models::NewMatchEntity,
    state::{
        game::{Bet, PlayerId, Round, Term},
        scoring::score_match,
        state_machine::{
            AbortError, ApplyError, MatchEvent, MatchPhase, MatchStateMachine, PlanError, PlanId,
        },
    },
};

/// Number of word/bet rounds in a match.
pub const ROUNDS: usize = 2;

/// Reasons a match refuses a player action.
#[derive(Debug, Error, PartialEq)]
pub enum MatchError {
    /// The action does not fit the current phase.
    #[error("`{action}` is not accepted while the match is in {phase:?}")]
    WrongPhase {
        action: &'static str,
        phase: MatchPhase,
    },
    /// The sender is not on the roster.
    #[error("player `{0}` is not part of the roster")]
    UnknownPlayer(PlayerId),
    /// The bet names someone outside the roster.
    #[error("bet names player `{0}` outside the roster")]
    UnknownBetTarget(PlayerId),
    /// The word is empty once trimmed.
    #[error("word is blank")]
    BlankWord,
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Apply(#[from] ApplyError),
    #[error(transparent)]
    Abort(#[from] AbortError),
}

/// Result of a stored word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordOutcome {
    /// Round the word was recorded for.
    pub round: usize,
    /// Trimmed word as stored.
    pub word: String,
    /// Whether this word completed the round and moved the match to betting.
    pub bets_opened: bool,
}

/// Result of a stored bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetOutcome {
    /// Some players still have to bet in this round.
    Recorded,
    /// The first round is complete and the second round's words are open.
    RoundSettled,
    /// Every player bet in the final round; the match is ready for its payout.
    AllBetsIn,
}

/// State of the match being played on a scorepad.
#[derive(Debug)]
pub struct Match {
    id: Uuid,
    roster: Vec<PlayerId>,
    machine: MatchStateMachine,
    round: usize,
    terms: IndexMap<PlayerId, Term>,
    rounds: [Round; ROUNDS],
    ready: IndexSet<PlayerId>,
    score: Option<IndexMap<PlayerId, i32>>,
}

impl Match {
    /// New match in `Loading`, waiting for its terms.
    pub fn new(roster: Vec<PlayerId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            roster,
            machine: MatchStateMachine::new(),
            round: 0,
            terms: IndexMap::new(),
            rounds: Default::default(),
            ready: IndexSet::new(),
            score: None,
        }
    }

    /// Identifier of this play-through, distinct from the one the store assigns.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current phase.
    pub fn phase(&self) -> MatchPhase {
        self.machine.phase()
    }

    /// Zero-based index of the current round.
    pub fn round(&self) -> usize {
        self.round
    }

    /// Players taking part, in scorepad order.
    pub fn roster(&self) -> &[PlayerId] {
        &self.roster
    }

    /// Dealt terms; empty until the match leaves `Loading`.
    pub fn terms(&self) -> &IndexMap<PlayerId, Term> {
        &self.terms
    }

    /// Term dealt to `player`.
    pub fn term_of(&self, player: &PlayerId) -> Option<&Term> {
        self.terms.get(player)
    }

    /// Rounds played so far, including the current one.
    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    /// Players who asked for the next match.
    pub fn ready(&self) -> &IndexSet<PlayerId> {
        &self.ready
    }

    /// Score of the settled match, once the payout happened.
    pub fn score(&self) -> Option<&IndexMap<PlayerId, i32>> {
        self.score.as_ref()
    }

    /// Install the dealt terms and open the first round.
    pub fn deal(&mut self, terms: IndexMap<PlayerId, Term>) -> Result<(), MatchError> {
        self.expect_phase("deal", MatchPhase::Loading)?;
        self.terms = terms;
        self.machine.advance(MatchEvent::TermsDealt)?;
        Ok(())
    }

    /// Store `player`'s word for the current round.
    pub fn record_word(&mut self, player: PlayerId, word: &str) -> Result<WordOutcome, MatchError> {
        self.expect_phase("word", MatchPhase::Words)?;
        self.expect_member(player, MatchError::UnknownPlayer)?;

        let word = word.trim();
        if word.is_empty() {
            return Err(MatchError::BlankWord);
        }

        let round = self.round;
        let words = &mut self.rounds[round].words;
        words.insert(player, word.to_owned());
        let complete = self.roster.iter().all(|member| words.contains_key(member));

        if complete {
            self.machine.advance(MatchEvent::WordsCollected)?;
        }

        Ok(WordOutcome {
            round,
            word: word.to_owned(),
            bets_opened: complete,
        })
    }

    /// Store `player`'s bet for the current round.
    ///
    /// A bet naming the same player twice is kept; scoring ignores it.
    pub fn record_bet(&mut self, player: PlayerId, bet: Bet) -> Result<BetOutcome, MatchError> {
        self.expect_phase("bet", MatchPhase::Bets)?;
        self.expect_member(player, MatchError::UnknownPlayer)?;
        for target in bet {
            self.expect_member(target, MatchError::UnknownBetTarget)?;
        }

        let round = self.round;
        let bets = &mut self.rounds[round].bets;
        bets.insert(player, bet);
        if !self.roster.iter().all(|member| bets.contains_key(member)) {
            return Ok(BetOutcome::Recorded);
        }

        if round + 1 < ROUNDS {
            self.machine.advance(MatchEvent::RoundSettled)?;
            self.round += 1;
            Ok(BetOutcome::RoundSettled)
        } else {
            Ok(BetOutcome::AllBetsIn)
        }
    }

    /// Plan the move to the payout and compute the score it will publish.
    ///
    /// The match stays in betting until [`Match::finish_payout`] or [`Match::abort_payout`].
    pub fn plan_payout(&mut self) -> Result<(PlanId, IndexMap<PlayerId, i32>), MatchError> {
        let plan = self.machine.plan(MatchEvent::MatchScored)?;
        Ok((plan.id, score_match(&self.terms, &self.rounds)))
    }

    /// Record of the completed match, handed to the scorepad store.
    pub fn to_record(&self, score: IndexMap<PlayerId, i32>) -> NewMatchEntity {
        NewMatchEntity {
            terms: self
                .terms
                .iter()
                .map(|(player, term)| (*player, term.as_str().to_owned()))
                .collect(),
            rounds: self.rounds.iter().cloned().map(Into::into).collect(),
            score,
            created_at: SystemTime::now(),
        }
    }

    /// Commit a planned payout with the score the store acknowledged.
    pub fn finish_payout(
        &mut self,
        plan_id: PlanId,
        score: IndexMap<PlayerId, i32>,
    ) -> Result<(), MatchError> {
        self.machine.apply(plan_id)?;
        self.score = Some(score);
        Ok(())
    }

    /// Drop a planned payout, keeping the match in betting.
    pub fn abort_payout(&mut self, plan_id: PlanId) -> Result<(), MatchError> {
        self.machine.abort(plan_id)?;
        Ok(())
    }

    /// Mark `player` ready for the next match; returns whether the whole roster is ready.
    pub fn mark_ready(&mut self, player: PlayerId) -> Result<bool, MatchError> {
        self.expect_phase("new", MatchPhase::Payout)?;
        self.expect_member(player, MatchError::UnknownPlayer)?;
        self.ready.insert(player);
        Ok(self.roster.iter().all(|member| self.ready.contains(member)))
    }

    fn expect_phase(&self, action: &'static str, expected: MatchPhase) -> Result<(), MatchError> {
        let phase = self.machine.phase();
        if phase != expected {
            return Err(MatchError::WrongPhase { action, phase });
        }
        Ok(())
    }

    fn expect_member(
        &self,
        player: PlayerId,
        error: fn(PlayerId) -> MatchError,
    ) -> Result<(), MatchError> {
        if self.roster.contains(&player) {
            Ok(())
        } else {
            Err(error(player))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dealt_match(size: usize) -> (Match, Vec<PlayerId>) {
        let roster: Vec<PlayerId> = (0..size).map(|_| Uuid::new_v4()).collect();
        let mut game = Match::new(roster.clone());
        let terms = roster
            .iter()
            .enumerate()
            .map(|(index, player)| (*player, Term::new(format!("term-{}", index / 2))))
            .collect();
        game.deal(terms).unwrap();
        (game, roster)
    }

    #[test]
    fn new_match_waits_for_terms() {
        let game = Match::new(vec![Uuid::new_v4()]);
        assert_eq!(game.phase(), MatchPhase::Loading);
        assert_eq!(game.round(), 0);
        assert!(game.terms().is_empty());
    }

    #[test]
    fn words_are_refused_before_dealing() {
        let player = Uuid::new_v4();
        let mut game = Match::new(vec![player]);
        assert_eq!(
            game.record_word(player, "hello"),
            Err(MatchError::WrongPhase {
                action: "word",
                phase: MatchPhase::Loading
            })
        );
    }

    #[test]
    fn dealing_twice_is_refused() {
        let (mut game, _) = dealt_match(4);
        assert!(matches!(
            game.deal(IndexMap::new()),
            Err(MatchError::WrongPhase { .. })
        ));
    }

    #[test]
    fn four_players_advance_through_both_rounds() {
        let (mut game, roster) = dealt_match(4);
        assert_eq!(game.phase(), MatchPhase::Words);

        for (index, player) in roster.iter().enumerate() {
            let outcome = game.record_word(*player, " word ").unwrap();
            assert_eq!(outcome.word, "word");
            assert_eq!(outcome.bets_opened, index == roster.len() - 1);
        }
        assert_eq!(game.phase(), MatchPhase::Bets);

        let bet = [roster[0], roster[1]];
        for player in &roster[..3] {
            assert_eq!(
                game.record_bet(*player, bet).unwrap(),
                BetOutcome::Recorded
            );
        }
        assert_eq!(
            game.record_bet(roster[3], bet).unwrap(),
            BetOutcome::RoundSettled
        );
        assert_eq!(game.phase(), MatchPhase::Words);
        assert_eq!(game.round(), 1);

        for player in &roster {
            game.record_word(*player, "again").unwrap();
        }
        for player in &roster[..3] {
            game.record_bet(*player, bet).unwrap();
        }
        assert_eq!(
            game.record_bet(roster[3], bet).unwrap(),
            BetOutcome::AllBetsIn
        );
        assert_eq!(game.phase(), MatchPhase::Bets);

        let (plan_id, score) = game.plan_payout().unwrap();
        game.finish_payout(plan_id, score.clone()).unwrap();
        assert_eq!(game.phase(), MatchPhase::Payout);
        assert_eq!(game.score(), Some(&score));
    }

    #[test]
    fn resubmitted_word_overwrites() {
        let (mut game, roster) = dealt_match(4);
        game.record_word(roster[0], "first").unwrap();
        game.record_word(roster[0], "second").unwrap();
        assert_eq!(game.rounds()[0].words[&roster[0]], "second");
        assert_eq!(game.phase(), MatchPhase::Words);
    }

    #[test]
    fn malformed_words_and_bets_are_rejected() {
        let (mut game, roster) = dealt_match(4);
        assert_eq!(game.record_word(roster[0], "   "), Err(MatchError::BlankWord));

        let stranger = Uuid::new_v4();
        assert_eq!(
            game.record_word(stranger, "word"),
            Err(MatchError::UnknownPlayer(stranger))
        );

        for player in &roster {
            game.record_word(*player, "word").unwrap();
        }
        assert_eq!(
            game.record_bet(roster[0], [roster[1], stranger]),
            Err(MatchError::UnknownBetTarget(stranger))
        );
        assert!(game.rounds()[0].bets.is_empty());
    }

    #[test]
    fn aborted_payout_keeps_bets_and_can_retry() {
        let (mut game, roster) = dealt_match(4);
        for _ in 0..ROUNDS {
            for player in &roster {
                game.record_word(*player, "word").unwrap();
            }
            for player in &roster {
                game.record_bet(*player, [roster[0], roster[1]]).unwrap();
            }
            assert_eq!(game.round(), 1);
        }

        let (plan_id, _) = game.plan_payout().unwrap();
        game.abort_payout(plan_id).unwrap();
        assert_eq!(game.phase(), MatchPhase::Bets);
        assert_eq!(game.rounds()[1].bets.len(), 4);

        assert_eq!(
            game.record_bet(roster[0], [roster[0], roster[1]]).unwrap(),
            BetOutcome::AllBetsIn
        );
        let (plan_id, score) = game.plan_payout().unwrap();
        game.finish_payout(plan_id, score).unwrap();
        assert_eq!(game.phase(), MatchPhase::Payout);
    }

    #[test]
    fn ready_requires_payout_and_completes_with_roster() {
        let (mut game, roster) = dealt_match(4);
        assert!(matches!(
            game.mark_ready(roster[0]),
            Err(MatchError::WrongPhase { action: "new", .. })
        ));

        for _ in 0..ROUNDS {
            for player in &roster {
                game.record_word(*player, "word").unwrap();
            }
            for player in &roster {
                game.record_bet(*player, [roster[2], roster[3]]).unwrap();
            }
        }
        let (plan_id, score) = game.plan_payout().unwrap();
        game.finish_payout(plan_id, score).unwrap();

        assert!(!game.mark_ready(roster[0]).unwrap());
        assert!(!game.mark_ready(roster[0]).unwrap());
        assert!(!game.mark_ready(roster[1]).unwrap());
        assert!(!game.mark_ready(roster[2]).unwrap());
        assert!(game.mark_ready(roster[3]).unwrap());
    }

    #[test]
    fn record_carries_terms_rounds_and_score() {
        let (mut game, roster) = dealt_match(4);
        game.record_word(roster[0], "word").unwrap();
        let mut score = IndexMap::new();
        score.insert(roster[0], 3);

        let record = game.to_record(score.clone());

        assert_eq!(record.terms[&roster[0]], "term-0");
        assert_eq!(record.rounds.len(), ROUNDS);
        assert_eq!(record.rounds[0].words[&roster[0]], "word");
        assert_eq!(record.score, score);
    }
}
