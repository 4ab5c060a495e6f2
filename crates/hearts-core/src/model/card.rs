use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const TWO_OF_CLUBS: Card = Card::new(Rank::Two, Suit::Clubs);
    pub const QUEEN_OF_SPADES: Card = Card::new(Rank::Queen, Suit::Spades);
    pub const JACK_OF_DIAMONDS: Card = Card::new(Rank::Jack, Suit::Diamonds);

    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    pub const fn is_queen_of_spades(self) -> bool {
        matches!(self.rank, Rank::Queen) && matches!(self.suit, Suit::Spades)
    }

    pub const fn is_jack_of_diamonds(self) -> bool {
        matches!(self.rank, Rank::Jack) && matches!(self.suit, Suit::Diamonds)
    }

    pub const fn is_heart(self) -> bool {
        self.suit.is_heart()
    }

    /// Unique ID in `0..52`: `suit * 13 + rank_index` with rank_index 0 for
    /// Two through 12 for Ace.
    pub const fn to_id(self) -> u8 {
        let suit_id = self.suit as u8;
        let rank_index = self.rank.value() - 2;
        suit_id * 13 + rank_index
    }

    pub const fn from_id(id: u8) -> Option<Self> {
        if id >= 52 {
            return None;
        }
        let suit = match Suit::from_index((id / 13) as usize) {
            Some(s) => s,
            None => return None,
        };
        let rank = match Rank::from_value(id % 13 + 2) {
            Some(r) => r,
            None => return None,
        };
        Some(Card::new(rank, suit))
    }

    /// Sort key for deterministic tie-breaks: wire suit order, low rank first.
    pub const fn sort_key(self) -> (u8, u8) {
        (self.suit as u8, self.rank.value())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

pub fn full_deck() -> impl Iterator<Item = Card> {
    Suit::ALL.into_iter().flat_map(|suit| {
        Rank::ORDERED
            .into_iter()
            .map(move |rank| Card::new(rank, suit))
    })
}
