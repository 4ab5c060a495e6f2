//! Round-level laws: deck conservation, legal-move soundness and
//! completeness, and exact replay of a recorded round.

use hearts_core::model::deck::Deck;
use hearts_core::{Card, PassDirection, PlayerPosition, RoundState, RulesMask};
use std::collections::HashSet;

fn collect_all_cards(round: &RoundState) -> Vec<Card> {
    let mut cards = Vec::new();
    for seat in PlayerPosition::LOOP {
        cards.extend(round.hand(seat).iter().copied());
        cards.extend(round.taken(seat).iter().copied());
    }
    cards.extend(round.current_trick().plays().iter().map(|play| play.card));
    cards
}

/// Plays a full round with the lowest legal card and records the trace.
fn play_recorded_round(seed: u64) -> (Vec<(PlayerPosition, Card)>, [i32; 4]) {
    let deck = Deck::shuffled_with_seed(seed);
    let mut round = RoundState::deal(&deck, RulesMask::standard(), PassDirection::Hold);
    let mut trace = Vec::new();
    while let Some(seat) = round.next_to_act() {
        let card = round.legal_moves(seat)[0];
        trace.push((seat, card));
        round.play_card(seat, card).expect("recorded move is legal");
    }
    (trace, round.round_scores())
}

#[test]
fn deck_is_conserved_through_a_full_round() {
    let deck = Deck::shuffled_with_seed(404);
    let mut round = RoundState::deal(&deck, RulesMask::standard(), PassDirection::Hold);

    loop {
        let cards = collect_all_cards(&round);
        let unique: HashSet<Card> = cards.iter().copied().collect();
        assert_eq!(cards.len(), 52, "card count drifted");
        assert_eq!(unique.len(), 52, "duplicate card appeared");

        let Some(seat) = round.next_to_act() else { break };
        let card = round.legal_moves(seat)[0];
        round.play_card(seat, card).unwrap();
    }
    assert!(round.is_terminal());
    assert_eq!(round.tricks_played(), 13);
}

#[test]
fn legal_moves_are_sound_and_complete() {
    let deck = Deck::shuffled_with_seed(777);
    let mut round = RoundState::deal(&deck, RulesMask::standard(), PassDirection::Hold);

    while let Some(seat) = round.next_to_act() {
        let legal = round.legal_moves(seat);
        assert!(!legal.is_empty(), "play phase must offer a move");

        // Soundness: every legal card is in the acting hand.
        for card in &legal {
            assert!(round.hand(seat).contains(*card));
        }
        // Completeness: every hand card outside the legal set is rejected.
        for card in round.hand(seat).cards().to_vec() {
            let mut probe = round.clone();
            assert_eq!(
                probe.play_card(seat, card).is_ok(),
                legal.contains(&card),
                "play_card and legal_moves disagree on {card}"
            );
        }

        round.play_card(seat, legal[0]).unwrap();
    }
}

#[test]
fn replaying_a_recorded_trace_reproduces_the_scores() {
    for seed in [1u64, 42, 1337] {
        let (trace, scores) = play_recorded_round(seed);
        assert_eq!(trace.len(), 52);

        let deck = Deck::shuffled_with_seed(seed);
        let mut replay = RoundState::deal(&deck, RulesMask::standard(), PassDirection::Hold);
        for (seat, card) in trace {
            replay.play_card(seat, card).expect("trace replays cleanly");
        }
        assert!(replay.is_terminal());
        assert_eq!(replay.round_scores(), scores);
    }
}

#[test]
fn round_scores_always_balance() {
    for seed in 0..8u64 {
        let (_, scores) = play_recorded_round(seed);
        let total: i32 = scores.iter().sum();
        assert!(
            total == 26 || total == 78,
            "seed {seed}: total {total} is neither a split round nor a moon"
        );
    }
}
