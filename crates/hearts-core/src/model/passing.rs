use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::player::PlayerPosition;
use serde::{Deserialize, Serialize};
use std::array;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PassDirection {
    Hold,
    Left,
    Right,
    Across,
}

impl PassDirection {
    /// Wire encoding: hold=0, left=+1, right=-1, across=+2.
    pub const fn wire_offset(self) -> i8 {
        match self {
            PassDirection::Hold => 0,
            PassDirection::Left => 1,
            PassDirection::Right => -1,
            PassDirection::Across => 2,
        }
    }

    pub const fn from_wire_offset(offset: i8) -> Option<Self> {
        match offset {
            0 => Some(PassDirection::Hold),
            1 => Some(PassDirection::Left),
            -1 => Some(PassDirection::Right),
            2 => Some(PassDirection::Across),
            _ => None,
        }
    }

    pub const fn requires_selection(self) -> bool {
        !matches!(self, PassDirection::Hold)
    }

    /// Seat that receives this seat's passed cards.
    pub const fn target(self, seat: PlayerPosition) -> PlayerPosition {
        match self {
            PassDirection::Hold => seat,
            PassDirection::Left => seat.next(),
            PassDirection::Right => seat.previous(),
            PassDirection::Across => seat.opposite(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PassingState {
    direction: PassDirection,
    submissions: [Option<[Card; 3]>; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PassError {
    #[error("round is not in the passing phase")]
    NotInPassingPhase,
    #[error("direction does not pass cards")]
    DirectionDoesNotPass,
    #[error("{0} has already submitted a pass")]
    AlreadySubmitted(PlayerPosition),
    #[error("card {0} is not in the submitting hand")]
    CardNotInHand(Card),
    #[error("pass submissions are incomplete")]
    Incomplete,
}

impl PassingState {
    pub fn new(direction: PassDirection) -> Self {
        Self {
            direction,
            submissions: array::from_fn(|_| None),
        }
    }

    pub fn direction(&self) -> PassDirection {
        self.direction
    }

    pub fn has_submitted(&self, seat: PlayerPosition) -> bool {
        self.submissions[seat.index()].is_some()
    }

    pub fn submit(
        &mut self,
        seat: PlayerPosition,
        cards: [Card; 3],
        hand: &mut Hand,
    ) -> Result<(), PassError> {
        if !self.direction.requires_selection() {
            return Err(PassError::DirectionDoesNotPass);
        }
        if self.submissions[seat.index()].is_some() {
            return Err(PassError::AlreadySubmitted(seat));
        }
        for card in cards.iter() {
            if !hand.contains(*card) {
                return Err(PassError::CardNotInHand(*card));
            }
        }
        for card in cards.iter() {
            let removed = hand.remove(*card);
            debug_assert!(removed, "submitted card {card} vanished from hand");
        }
        self.submissions[seat.index()] = Some(cards);
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.submissions.iter().all(|s| s.is_some())
    }

    pub fn apply(self, hands: &mut [Hand; 4]) -> Result<(), PassError> {
        if !self.direction.requires_selection() {
            return Err(PassError::DirectionDoesNotPass);
        }
        if !self.is_complete() {
            return Err(PassError::Incomplete);
        }
        for seat in PlayerPosition::LOOP {
            if let Some(cards) = self.submissions[seat.index()] {
                let target = self.direction.target(seat);
                for card in cards {
                    hands[target.index()].add(card);
                }
            }
        }
        Ok(())
    }
}
