use core::fmt;
use core::ops::BitOr;
use serde::{Deserialize, Serialize};

/// 16-bit rule mask. Bit assignments are fixed for on-the-wire compatibility
/// with existing consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RulesMask(u16);

impl RulesMask {
    /// Queen of spades worth 13.
    pub const QUEEN_PENALTY: RulesMask = RulesMask(0x0001);
    /// Jack of diamonds worth -10.
    pub const JACK_BONUS: RulesMask = RulesMask(0x0002);
    /// Taking no trick worth -5.
    pub const NO_TRICK_BONUS: RulesMask = RulesMask(0x0004);
    /// Reserved end-of-game adjustment; representable, no behavior.
    pub const END_SCORE_BONUS: RulesMask = RulesMask(0x0008);
    /// Shooting the moon requires the jack of diamonds.
    pub const SHOOTING_NEEDS_JACK: RulesMask = RulesMask(0x0010);
    /// First trick led by the two-of-clubs holder, with the two of clubs.
    pub const LEAD_2_CLUBS: RulesMask = RulesMask(0x0020);
    /// First trick must be led with a club.
    pub const LEAD_CLUBS: RulesMask = RulesMask(0x0040);
    /// No hearts may be discarded on the first trick.
    pub const NO_HEARTS_FIRST_TRICK: RulesMask = RulesMask(0x0080);
    /// The queen of spades may not be discarded on the first trick.
    pub const NO_QUEEN_FIRST_TRICK: RulesMask = RulesMask(0x0100);
    /// The queen of spades breaks hearts.
    pub const QUEEN_BREAKS_HEARTS: RulesMask = RulesMask(0x0200);
    /// Passing phase enabled.
    pub const DO_PASS_CARDS: RulesMask = RulesMask(0x0400);
    /// Hearts may not be led until broken.
    pub const MUST_BREAK_HEARTS: RulesMask = RulesMask(0x0800);
    /// Hearts worth 0.
    pub const HEARTS_ARENT_POINTS: RulesMask = RulesMask(0x1000);
    /// Shooting the moon disabled.
    pub const NO_SHOOTING: RulesMask = RulesMask(0x2000);

    pub const fn empty() -> Self {
        RulesMask(0)
    }

    /// The rule set the production server always plays with.
    pub const fn standard() -> Self {
        RulesMask(
            Self::QUEEN_PENALTY.0
                | Self::LEAD_2_CLUBS.0
                | Self::NO_HEARTS_FIRST_TRICK.0
                | Self::NO_QUEEN_FIRST_TRICK.0
                | Self::QUEEN_BREAKS_HEARTS.0
                | Self::MUST_BREAK_HEARTS.0
                | Self::DO_PASS_CARDS.0,
        )
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn from_bits(bits: u16) -> Self {
        RulesMask(bits)
    }

    pub const fn contains(self, flags: RulesMask) -> bool {
        self.0 & flags.0 == flags.0
    }

    pub const fn with(self, flags: RulesMask) -> Self {
        RulesMask(self.0 | flags.0)
    }

    pub const fn without(self, flags: RulesMask) -> Self {
        RulesMask(self.0 & !flags.0)
    }
}

impl BitOr for RulesMask {
    type Output = RulesMask;

    fn bitor(self, rhs: RulesMask) -> RulesMask {
        RulesMask(self.0 | rhs.0)
    }
}

impl fmt::Display for RulesMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}
