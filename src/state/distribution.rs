//! Dealing of secret terms: players are shuffled and paired, leftovers get the joker.

use indexmap::IndexMap;
use rand::{Rng, seq::SliceRandom};

use crate::state::game::{PlayerId, Term};

/// Number of jokers to deal for a roster of `players`.
///
/// Four players always play without joker. Other even rosters get zero or two,
/// small odd rosters exactly one, larger odd rosters one or three.
pub fn joker_count<R: Rng + ?Sized>(players: usize, rng: &mut R) -> usize {
    let jokers = match players {
        4 => 0,
        n if n % 2 == 0 => {
            if rng.random_bool(0.5) {
                2
            } else {
                0
            }
        }
        n if n <= 6 => 1,
        _ => {
            if rng.random_bool(0.5) {
                3
            } else {
                1
            }
        }
    };
    jokers.min(players)
}

/// Number of distinct terms needed once the jokers are set aside.
pub fn terms_needed(players: usize, jokers: usize) -> usize {
    players.saturating_sub(jokers) / 2
}

/// Deal `terms` to pairs of a shuffled copy of `roster`.
///
/// Each term goes to exactly two players; players left without a term (the
/// jokers, or a shortfall of terms) hold [`Term::joker`]. The result follows
/// roster order.
pub fn distribute<R: Rng + ?Sized>(
    roster: &[PlayerId],
    terms: Vec<Term>,
    rng: &mut R,
) -> IndexMap<PlayerId, Term> {
    let mut pool = roster.to_vec();
    pool.shuffle(rng);

    let mut terms = terms.into_iter();
    let mut dealt: IndexMap<PlayerId, Term> = IndexMap::with_capacity(roster.len());
    for pair in pool.chunks(2) {
        match (pair, terms.next()) {
            ([first, second], Some(term)) => {
                dealt.insert(*first, term.clone());
                dealt.insert(*second, term);
            }
            _ => {
                for player in pair {
                    dealt.insert(*player, Term::joker());
                }
            }
        }
    }

    roster
        .iter()
        .map(|player| {
            let term = dealt.swap_remove(player).unwrap_or_else(Term::joker);
            (*player, term)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashMap;
    use uuid::Uuid;

    fn roster(size: usize) -> Vec<PlayerId> {
        (0..size).map(|_| Uuid::new_v4()).collect()
    }

    fn catalogue(count: usize) -> Vec<Term> {
        (0..count).map(|i| Term::new(format!("term-{i}"))).collect()
    }

    #[test]
    fn four_players_never_get_jokers() {
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(joker_count(4, &mut rng), 0);
        }
    }

    #[test]
    fn joker_count_follows_roster_parity() {
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert!([0, 2].contains(&joker_count(6, &mut rng)));
            assert!([0, 2].contains(&joker_count(8, &mut rng)));
            assert_eq!(joker_count(3, &mut rng), 1);
            assert_eq!(joker_count(5, &mut rng), 1);
            assert!([1, 3].contains(&joker_count(7, &mut rng)));
            assert!([1, 3].contains(&joker_count(9, &mut rng)));
        }
    }

    #[test]
    fn joker_count_never_exceeds_roster() {
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert!(joker_count(0, &mut rng) == 0);
            assert_eq!(joker_count(1, &mut rng), 1);
            assert!(joker_count(2, &mut rng) <= 2);
        }
    }

    #[test]
    fn every_term_is_held_by_exactly_two_players() {
        for size in 3..=10 {
            for seed in 0..16 {
                let mut rng = StdRng::seed_from_u64(seed);
                let players = roster(size);
                let jokers = joker_count(size, &mut rng);
                let dealt = distribute(
                    &players,
                    catalogue(terms_needed(size, jokers)),
                    &mut rng,
                );

                assert_eq!(dealt.len(), size);
                assert!(dealt.keys().eq(players.iter()));

                let mut holders: HashMap<&str, usize> = HashMap::new();
                for term in dealt.values() {
                    *holders.entry(term.as_str()).or_default() += 1;
                }
                let joker_holders = holders.remove(crate::state::game::JOKER_TERM).unwrap_or(0);
                assert_eq!(joker_holders, jokers, "size {size}, seed {seed}");
                assert!(holders.values().all(|count| *count == 2));
            }
        }
    }

    #[test]
    fn shortfall_of_terms_hands_out_jokers() {
        let mut rng = StdRng::seed_from_u64(7);
        let players = roster(6);

        let dealt = distribute(&players, catalogue(1), &mut rng);

        assert_eq!(dealt.values().filter(|term| term.is_joker()).count(), 4);
        assert_eq!(dealt.values().filter(|term| !term.is_joker()).count(), 2);
    }

    #[test]
    fn same_seed_deals_the_same_way() {
        let players = roster(6);
        let first = distribute(&players, catalogue(3), &mut StdRng::seed_from_u64(42));
        let second = distribute(&players, catalogue(3), &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }
}
