//! Score computation for a completed match.

use indexmap::{IndexMap, IndexSet};

use crate::state::game::{Bet, PlayerId, Round, Term};

const RECIPROCATED_PARTNER_BET: i32 = 5;
const THIRD_PARTY_BET: i32 = 2;
const IDENTIFIED_PAIR_PENALTY: i32 = 1;
const JOKER_BET: i32 = 1;

/// Compute the score delta of every player holding a term.
///
/// Bets of both rounds are collapsed per player into unique unordered pairs,
/// so repeating a guess never counts twice.
///
/// - Naming a joker costs the bettor one point and earns the joker one point,
///   for each joker in the pair.
/// - Naming one's own partner earns five points, only if the partner named the
///   same pair in some round.
/// - Naming another pair correctly earns two points and costs each of the two
///   identified players one point.
///
/// Bets on the same player twice, or on players without a term, are ignored.
pub fn score_match(terms: &IndexMap<PlayerId, Term>, rounds: &[Round]) -> IndexMap<PlayerId, i32> {
    let mut score: IndexMap<PlayerId, i32> = terms.keys().map(|player| (*player, 0)).collect();

    for bettor in terms.keys().copied() {
        let guesses: IndexSet<Bet> = rounds
            .iter()
            .filter_map(|round| round.bets.get(&bettor))
            .map(normalize)
            .collect();

        for [first, second] in guesses {
            if first == second {
                continue;
            }
            let (Some(first_term), Some(second_term)) = (terms.get(&first), terms.get(&second))
            else {
                continue;
            };

            if first_term.is_joker() || second_term.is_joker() {
                for (guessed, term) in [(first, first_term), (second, second_term)] {
                    if term.is_joker() {
                        add(&mut score, bettor, -JOKER_BET);
                        add(&mut score, guessed, JOKER_BET);
                    }
                }
                continue;
            }

            if first_term != second_term {
                continue;
            }

            if bettor == first || bettor == second {
                let partner = if bettor == first { second } else { first };
                if made_bet(rounds, partner, [bettor, partner]) {
                    add(&mut score, bettor, RECIPROCATED_PARTNER_BET);
                }
            } else {
                add(&mut score, bettor, THIRD_PARTY_BET);
                add(&mut score, first, -IDENTIFIED_PAIR_PENALTY);
                add(&mut score, second, -IDENTIFIED_PAIR_PENALTY);
            }
        }
    }

    score
}

fn normalize(bet: &Bet) -> Bet {
    let [a, b] = *bet;
    if a <= b { [a, b] } else { [b, a] }
}

fn made_bet(rounds: &[Round], player: PlayerId, bet: Bet) -> bool {
    let expected = normalize(&bet);
    rounds
        .iter()
        .filter_map(|round| round.bets.get(&player))
        .any(|placed| normalize(placed) == expected)
}

fn add(score: &mut IndexMap<PlayerId, i32>, player: PlayerId, delta: i32) {
    *score.entry(player).or_default() += delta;
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    struct Table {
        players: [PlayerId; 4],
        terms: IndexMap<PlayerId, Term>,
    }

    /// A and B share "apple", C and D are jokers.
    fn table() -> Table {
        let players = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let [a, b, c, d] = players;
        let terms = IndexMap::from([
            (a, Term::new("apple")),
            (b, Term::new("apple")),
            (c, Term::joker()),
            (d, Term::joker()),
        ]);
        Table { players, terms }
    }

    fn round(bets: &[(PlayerId, Bet)]) -> Round {
        Round {
            words: IndexMap::new(),
            bets: bets.iter().copied().collect(),
        }
    }

    #[test]
    fn reciprocated_partners_third_party_and_joker_bets() {
        let Table { players, terms } = table();
        let [a, b, c, d] = players;

        let rounds = [round(&[(a, [a, b]), (b, [b, a]), (c, [a, b]), (d, [a, c])])];
        let score = score_match(&terms, &rounds);

        assert_eq!(score[&a], 4);
        assert_eq!(score[&b], 4);
        assert_eq!(score[&c], 3);
        assert_eq!(score[&d], -1);
    }

    #[test]
    fn unreciprocated_partner_bet_earns_nothing() {
        let Table { players, terms } = table();
        let [a, b, c, d] = players;

        let rounds = [round(&[(a, [a, b]), (b, [b, c]), (c, [c, d]), (d, [d, c])])];
        let score = score_match(&terms, &rounds);

        assert_eq!(score[&a], 0);
        // B named joker C; C and D, both jokers, named each other
        assert_eq!(score[&b], -1);
        assert_eq!(score[&c], 1);
        assert_eq!(score[&d], 0);
    }

    #[test]
    fn reciprocation_may_happen_in_another_round() {
        let Table { players, terms } = table();
        let [a, b, _, _] = players;

        let rounds = [round(&[(a, [a, b])]), round(&[(b, [a, b])])];
        let score = score_match(&terms, &rounds);

        assert_eq!(score[&a], 5);
        assert_eq!(score[&b], 5);
    }

    #[test]
    fn repeated_bet_across_rounds_counts_once() {
        let Table { players, terms } = table();
        let [a, b, c, _] = players;

        let rounds = [round(&[(c, [a, b])]), round(&[(c, [b, a])])];
        let score = score_match(&terms, &rounds);

        assert_eq!(score[&c], 2);
        assert_eq!(score[&a], -1);
        assert_eq!(score[&b], -1);
    }

    #[test]
    fn identical_ids_and_unknown_players_are_ignored() {
        let Table { players, terms } = table();
        let [a, b, c, d] = players;
        let stranger = Uuid::new_v4();

        let rounds = [round(&[(a, [b, b]), (b, [stranger, a]), (c, [c, c])])];
        let score = score_match(&terms, &rounds);

        assert!(score.values().all(|delta| *delta == 0));
        assert_eq!(score.len(), 4);
        assert!(score.contains_key(&d));
    }

    #[test]
    fn wrong_pair_scores_nothing() {
        let players = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let [a, b, c, d] = players;
        let terms = IndexMap::from([
            (a, Term::new("apple")),
            (b, Term::new("apple")),
            (c, Term::new("pear")),
            (d, Term::new("pear")),
        ]);

        let rounds = [round(&[(a, [b, c]), (d, [a, c])])];
        let score = score_match(&terms, &rounds);

        assert!(score.values().all(|delta| *delta == 0));
    }
}
