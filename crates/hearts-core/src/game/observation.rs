use crate::model::card::{full_deck, Card};
use crate::model::hand::Hand;
use crate::model::passing::PassDirection;
use crate::model::player::PlayerPosition;
use crate::model::trick::Trick;
use crate::rules::flags::RulesMask;
use crate::rules::round::RoundState;
use serde::{Deserialize, Serialize};
use std::array;
use std::collections::HashSet;
use thiserror::Error;

/// Everything one seat can see about a round in progress: own hand, the full
/// play history, the passing exchange and the rule flags. Read-only within a
/// decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservedRound {
    pub rules: RulesMask,
    pub my_seat: PlayerPosition,
    pub my_hand: Hand,
    pub completed_tricks: Vec<Trick>,
    pub current_trick: Trick,
    /// Cumulative match scores, for tie-breaking and moon awareness.
    pub scores: [i32; 4],
    pub pass_direction: PassDirection,
    /// Cards this seat passed away, if the passing phase happened.
    pub passed_cards: Option<[Card; 3]>,
    /// Cards this seat received, if the passing phase happened.
    pub received_cards: Option<[Card; 3]>,
    pub hearts_broken: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObservationError {
    #[error("card {0} appears more than once in the observation")]
    DuplicateCard(Card),
    #[error("completed trick {0} does not have four plays")]
    IncompleteTrick(usize),
    #[error("current trick already has four plays")]
    CurrentTrickComplete,
    #[error("trick {0} plays are not in rotation from its leader")]
    TrickOutOfRotation(usize),
    #[error("winner of trick {0} does not lead the following trick")]
    WinnerDoesNotLead(usize),
    #[error("more than thirteen completed tricks")]
    TooManyTricks,
    #[error("hand has {actual} cards but the history implies {expected}")]
    HandCountMismatch { expected: usize, actual: usize },
    #[error("card {0} was passed away but is still in the hand")]
    PassedCardInHand(Card),
    #[error("received card {0} is neither in the hand nor played")]
    ReceivedCardMissing(Card),
    #[error("a point card has been played but hearts_broken is false")]
    HeartsBrokenFlagMismatch,
}

impl ObservedRound {
    /// Consistency pre-check. Decisions abort on any failure here.
    pub fn validate(&self) -> Result<(), ObservationError> {
        if self.completed_tricks.len() > 13 {
            return Err(ObservationError::TooManyTricks);
        }
        for (index, trick) in self.completed_tricks.iter().enumerate() {
            if !trick.is_complete() {
                return Err(ObservationError::IncompleteTrick(index));
            }
            if !trick_in_rotation(trick) {
                return Err(ObservationError::TrickOutOfRotation(index));
            }
        }
        if self.current_trick.is_complete() {
            return Err(ObservationError::CurrentTrickComplete);
        }
        if !trick_in_rotation(&self.current_trick) {
            return Err(ObservationError::TrickOutOfRotation(self.completed_tricks.len()));
        }

        for index in 1..self.completed_tricks.len() {
            let winner = self.completed_tricks[index - 1]
                .winner()
                .expect("completed trick has a winner");
            if self.completed_tricks[index].leader() != winner {
                return Err(ObservationError::WinnerDoesNotLead(index - 1));
            }
        }
        if let Some(last) = self.completed_tricks.last() {
            let winner = last.winner().expect("completed trick has a winner");
            if self.current_trick.leader() != winner {
                return Err(ObservationError::WinnerDoesNotLead(
                    self.completed_tricks.len() - 1,
                ));
            }
        }

        let mut seen = HashSet::new();
        for card in self.played_cards() {
            if !seen.insert(card) {
                return Err(ObservationError::DuplicateCard(card));
            }
        }
        for &card in self.my_hand.iter() {
            if !seen.insert(card) {
                return Err(ObservationError::DuplicateCard(card));
            }
        }

        let expected = self.expected_hand_size(self.my_seat);
        if self.my_hand.len() != expected {
            return Err(ObservationError::HandCountMismatch {
                expected,
                actual: self.my_hand.len(),
            });
        }

        if let Some(passed) = self.passed_cards {
            for card in passed {
                if self.my_hand.contains(card) {
                    return Err(ObservationError::PassedCardInHand(card));
                }
            }
        }
        if let Some(received) = self.received_cards {
            for card in received {
                if !self.my_hand.contains(card) && !seen_played(&self.completed_tricks, &self.current_trick, card) {
                    return Err(ObservationError::ReceivedCardMissing(card));
                }
            }
        }

        if self.derived_hearts_broken() && !self.hearts_broken {
            return Err(ObservationError::HeartsBrokenFlagMismatch);
        }

        Ok(())
    }

    pub fn tricks_played(&self) -> usize {
        self.completed_tricks.len()
    }

    /// Number of cards `seat` has contributed across the whole history.
    pub fn plays_by(&self, seat: PlayerPosition) -> usize {
        self.completed_tricks
            .iter()
            .chain(std::iter::once(&self.current_trick))
            .flat_map(|trick| trick.plays())
            .filter(|play| play.position == seat)
            .count()
    }

    pub fn expected_hand_size(&self, seat: PlayerPosition) -> usize {
        13usize.saturating_sub(self.plays_by(seat))
    }

    pub fn seat_to_act(&self) -> PlayerPosition {
        self.current_trick.expected_position()
    }

    pub fn played_cards(&self) -> impl Iterator<Item = Card> + '_ {
        self.completed_tricks
            .iter()
            .chain(std::iter::once(&self.current_trick))
            .flat_map(|trick| trick.plays())
            .map(|play| play.card)
    }

    /// Cards not in this hand and not yet seen on the table.
    pub fn unseen_cards(&self) -> Vec<Card> {
        let visible: HashSet<Card> = self
            .played_cards()
            .chain(self.my_hand.iter().copied())
            .collect();
        full_deck().filter(|card| !visible.contains(card)).collect()
    }

    /// Per-seat capture piles reconstructed from the trick history.
    pub fn taken_piles(&self) -> [Hand; 4] {
        let mut piles: [Hand; 4] = array::from_fn(|_| Hand::new());
        for trick in &self.completed_tricks {
            let winner = trick.winner().expect("completed trick has a winner");
            for play in trick.plays() {
                piles[winner.index()].add(play.card);
            }
        }
        piles
    }

    pub fn tricks_won(&self) -> [u8; 4] {
        let mut won = [0u8; 4];
        for trick in &self.completed_tricks {
            let winner = trick.winner().expect("completed trick has a winner");
            won[winner.index()] += 1;
        }
        won
    }

    fn derived_hearts_broken(&self) -> bool {
        self.played_cards().any(|card| {
            card.is_heart()
                || (card.is_queen_of_spades()
                    && self.rules.contains(RulesMask::QUEEN_BREAKS_HEARTS))
        })
    }

    /// Legal moves for the observing seat, computed without knowing the
    /// hidden hands.
    pub fn legal_moves(&self) -> Vec<Card> {
        let mut hands: [Hand; 4] = array::from_fn(|_| Hand::new());
        hands[self.my_seat.index()] = self.my_hand.clone();
        let skeleton = RoundState::resume(
            self.rules,
            hands,
            self.taken_piles(),
            self.tricks_won(),
            self.current_trick.clone(),
            self.tricks_played() as u8,
            self.hearts_broken,
            self.pass_direction,
        );
        skeleton.legal_moves(self.my_seat)
    }

    /// Fuses this observation with a full hand assignment into a concrete
    /// round the search can play out. `hands[my_seat]` must be this hand.
    pub fn determinize(&self, hands: [Hand; 4]) -> RoundState {
        debug_assert_eq!(
            hands[self.my_seat.index()],
            self.my_hand,
            "determinized world must preserve the observed hand"
        );
        RoundState::resume(
            self.rules,
            hands,
            self.taken_piles(),
            self.tricks_won(),
            self.current_trick.clone(),
            self.tricks_played() as u8,
            self.hearts_broken,
            self.pass_direction,
        )
    }
}

fn trick_in_rotation(trick: &Trick) -> bool {
    let mut seat = trick.leader();
    for play in trick.plays() {
        if play.position != seat {
            return false;
        }
        seat = seat.next();
    }
    true
}

fn seen_played(completed: &[Trick], current: &Trick, card: Card) -> bool {
    completed
        .iter()
        .chain(std::iter::once(current))
        .flat_map(|trick| trick.plays())
        .any(|play| play.card == card)
}
