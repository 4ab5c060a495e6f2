use crate::model::card::Card;
use crate::model::deck::Deck;
use crate::model::hand::Hand;
use crate::model::passing::{PassDirection, PassError, PassingState};
use crate::model::player::PlayerPosition;
use crate::model::suit::Suit;
use crate::model::trick::{Trick, TrickError};
use crate::rules::flags::RulesMask;
use std::array;
use thiserror::Error;

/// Concrete round state: the dynamic half of the rules engine. Simulations
/// clone this in the hot loop, so it carries taken piles and trick counters
/// instead of the full trick history.
#[derive(Debug, Clone)]
pub struct RoundState {
    rules: RulesMask,
    hands: [Hand; 4],
    taken: [Hand; 4],
    tricks_won: [u8; 4],
    current_trick: Trick,
    tricks_played: u8,
    hearts_broken: bool,
    phase: RoundPhase,
    pass_direction: PassDirection,
}

#[derive(Debug, Clone)]
pub enum RoundPhase {
    Passing(PassingState),
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Played,
    TrickCompleted { winner: PlayerPosition },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayError {
    #[error("round is not in the play phase")]
    NotInPlayPhase,
    #[error("card {0} is not in the player's hand")]
    CardNotInHand(Card),
    #[error("expected {expected} to play but got {actual}")]
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    #[error("first trick must be led with the two of clubs")]
    MustLeadTwoOfClubs,
    #[error("first trick must be led with a club")]
    MustLeadClubs,
    #[error("must follow the {0} lead")]
    MustFollowSuit(Suit),
    #[error("hearts have not been broken")]
    HeartsNotBroken,
    #[error("point cards may not be played on the first trick")]
    NoPointsOnFirstTrick,
    #[error(transparent)]
    Trick(#[from] TrickError),
}

impl RoundState {
    /// Deals a fresh round. The first leader is the two-of-clubs holder when
    /// the rules demand that opening, otherwise North.
    pub fn deal(deck: &Deck, rules: RulesMask, pass_direction: PassDirection) -> Self {
        let mut hands: [Hand; 4] = array::from_fn(|_| Hand::new());
        for (index, card) in deck.cards().iter().enumerate() {
            let seat = PlayerPosition::from_index(index % 4).expect("seat index in range");
            hands[seat.index()].add(*card);
        }

        let leader = if rules.contains(RulesMask::LEAD_2_CLUBS) {
            holder_of(&hands, Card::TWO_OF_CLUBS).unwrap_or(PlayerPosition::North)
        } else {
            PlayerPosition::North
        };

        let passing = rules.contains(RulesMask::DO_PASS_CARDS) && pass_direction.requires_selection();
        let phase = if passing {
            RoundPhase::Passing(PassingState::new(pass_direction))
        } else {
            RoundPhase::Playing
        };

        Self {
            rules,
            hands,
            taken: array::from_fn(|_| Hand::new()),
            tricks_won: [0; 4],
            current_trick: Trick::new(leader),
            tricks_played: 0,
            hearts_broken: false,
            phase,
            pass_direction,
        }
    }

    /// Builds a round directly from hands, already in the play phase. Used by
    /// tests and by world determinization.
    pub fn from_hands(
        hands: [Hand; 4],
        leader: PlayerPosition,
        rules: RulesMask,
        pass_direction: PassDirection,
    ) -> Self {
        Self {
            rules,
            hands,
            taken: array::from_fn(|_| Hand::new()),
            tricks_won: [0; 4],
            current_trick: Trick::new(leader),
            tricks_played: 0,
            hearts_broken: false,
            phase: RoundPhase::Playing,
            pass_direction,
        }
    }

    /// Resumes a round mid-play from externally reconstructed components.
    #[allow(clippy::too_many_arguments)]
    pub fn resume(
        rules: RulesMask,
        hands: [Hand; 4],
        taken: [Hand; 4],
        tricks_won: [u8; 4],
        current_trick: Trick,
        tricks_played: u8,
        hearts_broken: bool,
        pass_direction: PassDirection,
    ) -> Self {
        let phase = if tricks_played >= 13 {
            RoundPhase::Finished
        } else {
            RoundPhase::Playing
        };
        Self {
            rules,
            hands,
            taken,
            tricks_won,
            current_trick,
            tricks_played,
            hearts_broken,
            phase,
            pass_direction,
        }
    }

    pub fn rules(&self) -> RulesMask {
        self.rules
    }

    pub fn phase(&self) -> &RoundPhase {
        &self.phase
    }

    pub fn pass_direction(&self) -> PassDirection {
        self.pass_direction
    }

    pub fn hand(&self, seat: PlayerPosition) -> &Hand {
        &self.hands[seat.index()]
    }

    pub fn taken(&self, seat: PlayerPosition) -> &Hand {
        &self.taken[seat.index()]
    }

    pub fn tricks_won(&self, seat: PlayerPosition) -> u8 {
        self.tricks_won[seat.index()]
    }

    pub fn current_trick(&self) -> &Trick {
        &self.current_trick
    }

    pub fn tricks_played(&self) -> u8 {
        self.tricks_played
    }

    pub fn is_first_trick(&self) -> bool {
        self.tricks_played == 0
    }

    pub fn hearts_broken(&self) -> bool {
        self.hearts_broken
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, RoundPhase::Finished)
    }

    /// Seat expected to play next, if the round is in the play phase.
    pub fn next_to_act(&self) -> Option<PlayerPosition> {
        match self.phase {
            RoundPhase::Playing => Some(self.current_trick.expected_position()),
            _ => None,
        }
    }

    /// Every card the acting seat may legally play. Empty only when the round
    /// is not in the play phase (or genuinely terminal).
    pub fn legal_moves(&self, seat: PlayerPosition) -> Vec<Card> {
        if !matches!(self.phase, RoundPhase::Playing) {
            return Vec::new();
        }
        let hand = &self.hands[seat.index()];
        if hand.is_empty() {
            return Vec::new();
        }

        if let Some(lead) = self.current_trick.lead_suit() {
            let follow: Vec<Card> = hand.iter_suit(lead).collect();
            if !follow.is_empty() {
                return follow;
            }
            return self.filter_first_trick_points(hand.cards().to_vec());
        }

        self.legal_leads(hand)
    }

    fn legal_leads(&self, hand: &Hand) -> Vec<Card> {
        if self.is_first_trick() {
            if self.rules.contains(RulesMask::LEAD_2_CLUBS) && hand.contains(Card::TWO_OF_CLUBS) {
                return vec![Card::TWO_OF_CLUBS];
            }
            if self.rules.contains(RulesMask::LEAD_2_CLUBS)
                || self.rules.contains(RulesMask::LEAD_CLUBS)
            {
                let clubs: Vec<Card> = hand.iter_suit(Suit::Clubs).collect();
                if !clubs.is_empty() {
                    return clubs;
                }
            }
        }

        let mut leads: Vec<Card> = hand.cards().to_vec();
        if self.rules.contains(RulesMask::MUST_BREAK_HEARTS) && !self.hearts_broken {
            let non_hearts: Vec<Card> = leads.iter().copied().filter(|c| !c.is_heart()).collect();
            if !non_hearts.is_empty() {
                leads = non_hearts;
            }
        }
        if self.is_first_trick() {
            leads = self.filter_first_trick_points(leads);
        }
        leads
    }

    /// Drops cards banned on trick one, unless that would leave nothing.
    fn filter_first_trick_points(&self, cards: Vec<Card>) -> Vec<Card> {
        if !self.is_first_trick() {
            return cards;
        }
        let filtered: Vec<Card> = cards
            .iter()
            .copied()
            .filter(|card| !self.banned_on_first_trick(*card))
            .collect();
        if filtered.is_empty() {
            cards
        } else {
            filtered
        }
    }

    fn banned_on_first_trick(&self, card: Card) -> bool {
        (self.rules.contains(RulesMask::NO_HEARTS_FIRST_TRICK) && card.is_heart())
            || (self.rules.contains(RulesMask::NO_QUEEN_FIRST_TRICK) && card.is_queen_of_spades())
    }

    /// Places `card` into the current trick for `seat`, resolving the trick
    /// when it completes. Terminal once all thirteen tricks are played.
    pub fn play_card(&mut self, seat: PlayerPosition, card: Card) -> Result<PlayOutcome, PlayError> {
        if !matches!(self.phase, RoundPhase::Playing) {
            return Err(PlayError::NotInPlayPhase);
        }
        if !self.hands[seat.index()].contains(card) {
            return Err(PlayError::CardNotInHand(card));
        }
        let expected = self.current_trick.expected_position();
        if expected != seat {
            return Err(PlayError::OutOfTurn {
                expected,
                actual: seat,
            });
        }
        if !self.legal_moves(seat).contains(&card) {
            return Err(self.classify_illegal(seat, card));
        }

        let removed = self.hands[seat.index()].remove(card);
        debug_assert!(removed, "legal card {card} missing from hand");

        if card.is_heart()
            || (card.is_queen_of_spades() && self.rules.contains(RulesMask::QUEEN_BREAKS_HEARTS))
        {
            self.hearts_broken = true;
        }

        self.current_trick.play(seat, card)?;

        if !self.current_trick.is_complete() {
            return Ok(PlayOutcome::Played);
        }

        let winner = self.current_trick.winner().expect("winner when complete");
        let finished = std::mem::replace(&mut self.current_trick, Trick::new(winner));
        for play in finished.plays() {
            self.taken[winner.index()].add(play.card);
        }
        self.tricks_won[winner.index()] += 1;
        self.tricks_played += 1;
        if self.tricks_played == 13 {
            self.phase = RoundPhase::Finished;
        }
        Ok(PlayOutcome::TrickCompleted { winner })
    }

    /// Maps an illegal card to the rule that forbids it.
    fn classify_illegal(&self, seat: PlayerPosition, card: Card) -> PlayError {
        let hand = &self.hands[seat.index()];
        if let Some(lead) = self.current_trick.lead_suit() {
            if card.suit != lead && hand.has_suit(lead) {
                return PlayError::MustFollowSuit(lead);
            }
            return PlayError::NoPointsOnFirstTrick;
        }
        if self.is_first_trick() {
            if self.rules.contains(RulesMask::LEAD_2_CLUBS) && hand.contains(Card::TWO_OF_CLUBS) {
                return PlayError::MustLeadTwoOfClubs;
            }
            if (self.rules.contains(RulesMask::LEAD_2_CLUBS)
                || self.rules.contains(RulesMask::LEAD_CLUBS))
                && card.suit != Suit::Clubs
                && hand.has_suit(Suit::Clubs)
            {
                return PlayError::MustLeadClubs;
            }
        }
        if card.is_heart()
            && !self.hearts_broken
            && self.rules.contains(RulesMask::MUST_BREAK_HEARTS)
        {
            return PlayError::HeartsNotBroken;
        }
        PlayError::NoPointsOnFirstTrick
    }

    pub fn submit_pass(&mut self, seat: PlayerPosition, cards: [Card; 3]) -> Result<(), PassError> {
        match &mut self.phase {
            RoundPhase::Passing(state) => {
                let hand = &mut self.hands[seat.index()];
                state.submit(seat, cards, hand)
            }
            _ => Err(PassError::NotInPassingPhase),
        }
    }

    /// Rotates all submitted passes and enters the play phase. The first
    /// leader follows the two-of-clubs holder after the rotation.
    pub fn resolve_passes(&mut self) -> Result<(), PassError> {
        let state = match &self.phase {
            RoundPhase::Passing(state) => state.clone(),
            _ => return Err(PassError::NotInPassingPhase),
        };
        if !state.is_complete() {
            return Err(PassError::Incomplete);
        }

        state.apply(&mut self.hands)?;
        if self.rules.contains(RulesMask::LEAD_2_CLUBS) {
            if let Some(leader) = holder_of(&self.hands, Card::TWO_OF_CLUBS) {
                self.current_trick = Trick::new(leader);
            }
        }
        self.phase = RoundPhase::Playing;
        Ok(())
    }

    /// Per-seat scores for the round under the configured rules.
    pub fn round_scores(&self) -> [i32; 4] {
        let heart_value = if self.rules.contains(RulesMask::HEARTS_ARENT_POINTS) {
            0
        } else {
            1
        };

        let mut scores: [i32; 4] = array::from_fn(|index| {
            let pile = &self.taken[index];
            let mut points = pile.count_suit(Suit::Hearts) as i32 * heart_value;
            if self.rules.contains(RulesMask::QUEEN_PENALTY)
                && pile.contains(Card::QUEEN_OF_SPADES)
            {
                points += 13;
            }
            points
        });

        if !self.rules.contains(RulesMask::NO_SHOOTING) {
            if let Some(shooter) = self.moon_shooter() {
                scores = [26; 4];
                scores[shooter.index()] = 0;
            }
        }

        for seat in PlayerPosition::LOOP {
            let pile = &self.taken[seat.index()];
            if self.rules.contains(RulesMask::JACK_BONUS) && pile.contains(Card::JACK_OF_DIAMONDS)
            {
                scores[seat.index()] -= 10;
            }
            if self.rules.contains(RulesMask::NO_TRICK_BONUS) && self.tricks_won[seat.index()] == 0
            {
                scores[seat.index()] -= 5;
            }
        }

        scores
    }

    /// Seat that shot the moon, if any. All thirteen hearts, plus the queen
    /// under `QUEEN_PENALTY`, plus the jack under `SHOOTING_NEEDS_JACK`.
    /// `HEARTS_ARENT_POINTS` does not change this detection.
    pub fn moon_shooter(&self) -> Option<PlayerPosition> {
        PlayerPosition::LOOP.iter().copied().find(|seat| {
            let pile = &self.taken[seat.index()];
            pile.count_suit(Suit::Hearts) == 13
                && (!self.rules.contains(RulesMask::QUEEN_PENALTY)
                    || pile.contains(Card::QUEEN_OF_SPADES))
                && (!self.rules.contains(RulesMask::SHOOTING_NEEDS_JACK)
                    || pile.contains(Card::JACK_OF_DIAMONDS))
        })
    }
}

fn holder_of(hands: &[Hand; 4], card: Card) -> Option<PlayerPosition> {
    PlayerPosition::LOOP
        .iter()
        .copied()
        .find(|seat| hands[seat.index()].contains(card))
}

#[cfg(test)]
mod tests {
    use super::{PlayError, PlayOutcome, RoundPhase, RoundState};
    use crate::model::card::Card;
    use crate::model::deck::Deck;
    use crate::model::hand::Hand;
    use crate::model::passing::PassDirection;
    use crate::model::player::PlayerPosition;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;
    use crate::rules::flags::RulesMask;
    use std::array;

    fn card(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    fn play_trick(round: &mut RoundState, plays: &[(PlayerPosition, Card)]) -> PlayerPosition {
        let mut winner = None;
        for &(seat, c) in plays {
            match round.play_card(seat, c).expect("trick play is legal") {
                PlayOutcome::TrickCompleted { winner: w } => winner = Some(w),
                PlayOutcome::Played => {}
            }
        }
        winner.expect("trick completes")
    }

    #[test]
    fn dealing_distributes_thirteen_cards_per_seat() {
        let deck = Deck::standard();
        let round = RoundState::deal(&deck, RulesMask::standard(), PassDirection::Left);
        for seat in PlayerPosition::LOOP {
            assert_eq!(round.hand(seat).len(), 13);
        }
        assert!(matches!(round.phase(), RoundPhase::Passing(_)));
    }

    #[test]
    fn hold_direction_skips_passing_phase() {
        let deck = Deck::standard();
        let round = RoundState::deal(&deck, RulesMask::standard(), PassDirection::Hold);
        assert!(matches!(round.phase(), RoundPhase::Playing));
    }

    #[test]
    fn passing_flow_rotates_cards_and_enters_play() {
        let deck = Deck::shuffled_with_seed(8);
        let mut round = RoundState::deal(&deck, RulesMask::standard(), PassDirection::Left);
        for seat in PlayerPosition::LOOP {
            let picks = {
                let cards = round.hand(seat).cards();
                [cards[0], cards[1], cards[2]]
            };
            round.submit_pass(seat, picks).unwrap();
        }
        round.resolve_passes().unwrap();
        assert!(matches!(round.phase(), RoundPhase::Playing));
        for seat in PlayerPosition::LOOP {
            assert_eq!(round.hand(seat).len(), 13);
        }
        // The opening lead follows the two of clubs after the rotation.
        let leader = round.current_trick().leader();
        assert!(round.hand(leader).contains(Card::TWO_OF_CLUBS));
    }

    #[test]
    fn first_leader_holds_two_of_clubs() {
        let deck = Deck::shuffled_with_seed(99);
        let round = RoundState::deal(&deck, RulesMask::standard(), PassDirection::Hold);
        let leader = round.current_trick().leader();
        assert!(round.hand(leader).contains(Card::TWO_OF_CLUBS));
    }

    #[test]
    fn first_lead_must_be_two_of_clubs() {
        let deck = Deck::shuffled_with_seed(7);
        let mut round = RoundState::deal(&deck, RulesMask::standard(), PassDirection::Hold);
        let leader = round.current_trick().leader();

        assert_eq!(round.legal_moves(leader), vec![Card::TWO_OF_CLUBS]);
        let wrong = round
            .hand(leader)
            .iter()
            .copied()
            .find(|&c| c != Card::TWO_OF_CLUBS)
            .unwrap();
        assert_eq!(
            round.play_card(leader, wrong),
            Err(PlayError::MustLeadTwoOfClubs)
        );
        assert!(round.play_card(leader, Card::TWO_OF_CLUBS).is_ok());
    }

    #[test]
    fn without_lead_flags_any_opening_card_is_legal() {
        let hands = seeded_hands();
        let round = RoundState::from_hands(
            hands,
            PlayerPosition::North,
            RulesMask::QUEEN_PENALTY | RulesMask::MUST_BREAK_HEARTS,
            PassDirection::Hold,
        );
        // North holds no hearts, so everything in hand is a legal lead.
        assert_eq!(
            round.legal_moves(PlayerPosition::North).len(),
            round.hand(PlayerPosition::North).len()
        );
    }

    #[test]
    fn follow_suit_is_required() {
        let deck = Deck::shuffled_with_seed(3);
        let mut round = RoundState::deal(&deck, RulesMask::standard(), PassDirection::Hold);
        let leader = round.current_trick().leader();
        round.play_card(leader, Card::TWO_OF_CLUBS).unwrap();

        let follower = leader.next();
        let legal = round.legal_moves(follower);
        if round.hand(follower).has_suit(Suit::Clubs) {
            assert!(legal.iter().all(|c| c.suit == Suit::Clubs));
            let offsuit = round
                .hand(follower)
                .iter()
                .copied()
                .find(|c| c.suit != Suit::Clubs);
            if let Some(offsuit) = offsuit {
                assert_eq!(
                    round.play_card(follower, offsuit),
                    Err(PlayError::MustFollowSuit(Suit::Clubs))
                );
            }
        }
    }

    /// Four tiny hands arranged so North leads and every seat has a club.
    fn seeded_hands() -> [Hand; 4] {
        let mut hands: [Hand; 4] = array::from_fn(|_| Hand::new());
        hands[0] = Hand::with_cards(vec![
            card(Rank::Two, Suit::Clubs),
            card(Rank::Five, Suit::Diamonds),
            card(Rank::Nine, Suit::Spades),
        ]);
        hands[1] = Hand::with_cards(vec![
            card(Rank::Three, Suit::Clubs),
            card(Rank::Two, Suit::Hearts),
            card(Rank::Queen, Suit::Spades),
        ]);
        hands[2] = Hand::with_cards(vec![
            card(Rank::Four, Suit::Clubs),
            card(Rank::Three, Suit::Hearts),
            card(Rank::Two, Suit::Diamonds),
        ]);
        hands[3] = Hand::with_cards(vec![
            card(Rank::Five, Suit::Clubs),
            card(Rank::Four, Suit::Hearts),
            card(Rank::Three, Suit::Diamonds),
        ]);
        hands
    }

    #[test]
    fn hearts_cannot_lead_until_broken() {
        let hands = seeded_hands();
        let mut round = RoundState::from_hands(
            hands,
            PlayerPosition::North,
            RulesMask::QUEEN_PENALTY | RulesMask::MUST_BREAK_HEARTS,
            PassDirection::Hold,
        );
        let winner = play_trick(
            &mut round,
            &[
                (PlayerPosition::North, card(Rank::Two, Suit::Clubs)),
                (PlayerPosition::East, card(Rank::Three, Suit::Clubs)),
                (PlayerPosition::South, card(Rank::Four, Suit::Clubs)),
                (PlayerPosition::West, card(Rank::Five, Suit::Clubs)),
            ],
        );
        assert_eq!(winner, PlayerPosition::West);
        assert!(!round.hearts_broken());

        let legal = round.legal_moves(PlayerPosition::West);
        assert!(!legal.iter().any(|c| c.is_heart()));
        assert_eq!(
            round.play_card(PlayerPosition::West, card(Rank::Four, Suit::Hearts)),
            Err(PlayError::HeartsNotBroken)
        );
    }

    #[test]
    fn heart_discard_breaks_hearts() {
        let mut hands = seeded_hands();
        // East has no clubs this time: replace the club with a heart.
        hands[1] = Hand::with_cards(vec![
            card(Rank::Two, Suit::Hearts),
            card(Rank::Five, Suit::Hearts),
            card(Rank::Queen, Suit::Spades),
        ]);
        let mut round = RoundState::from_hands(
            hands,
            PlayerPosition::North,
            RulesMask::QUEEN_PENALTY | RulesMask::MUST_BREAK_HEARTS,
            PassDirection::Hold,
        );
        round
            .play_card(PlayerPosition::North, card(Rank::Two, Suit::Clubs))
            .unwrap();
        round
            .play_card(PlayerPosition::East, card(Rank::Two, Suit::Hearts))
            .unwrap();
        assert!(round.hearts_broken());
    }

    #[test]
    fn queen_breaks_hearts_only_with_flag() {
        for (rules, expect_broken) in [
            (
                RulesMask::QUEEN_PENALTY | RulesMask::QUEEN_BREAKS_HEARTS,
                true,
            ),
            (RulesMask::QUEEN_PENALTY, false),
        ] {
            let mut hands = seeded_hands();
            hands[1] = Hand::with_cards(vec![
                card(Rank::Queen, Suit::Spades),
                card(Rank::Two, Suit::Spades),
            ]);
            let mut round =
                RoundState::from_hands(hands, PlayerPosition::North, rules, PassDirection::Hold);
            round
                .play_card(PlayerPosition::North, card(Rank::Two, Suit::Clubs))
                .unwrap();
            round
                .play_card(PlayerPosition::East, card(Rank::Queen, Suit::Spades))
                .unwrap();
            assert_eq!(round.hearts_broken(), expect_broken);
        }
    }

    #[test]
    fn first_trick_discard_bans_points() {
        let mut hands = seeded_hands();
        // East cannot follow clubs and holds a heart, the queen and a diamond.
        hands[1] = Hand::with_cards(vec![
            card(Rank::Two, Suit::Hearts),
            card(Rank::Queen, Suit::Spades),
            card(Rank::Nine, Suit::Diamonds),
        ]);
        let mut round = RoundState::from_hands(
            hands,
            PlayerPosition::North,
            RulesMask::standard(),
            PassDirection::Hold,
        );
        round
            .play_card(PlayerPosition::North, card(Rank::Two, Suit::Clubs))
            .unwrap();
        let legal = round.legal_moves(PlayerPosition::East);
        assert_eq!(legal, vec![card(Rank::Nine, Suit::Diamonds)]);
        assert_eq!(
            round.play_card(PlayerPosition::East, card(Rank::Two, Suit::Hearts)),
            Err(PlayError::NoPointsOnFirstTrick)
        );
    }

    #[test]
    fn first_trick_ban_lifts_when_hand_is_all_points() {
        let mut hands = seeded_hands();
        hands[1] = Hand::with_cards(vec![
            card(Rank::Two, Suit::Hearts),
            card(Rank::Queen, Suit::Spades),
        ]);
        let mut round = RoundState::from_hands(
            hands,
            PlayerPosition::North,
            RulesMask::standard(),
            PassDirection::Hold,
        );
        round
            .play_card(PlayerPosition::North, card(Rank::Two, Suit::Clubs))
            .unwrap();
        let legal = round.legal_moves(PlayerPosition::East);
        assert_eq!(legal.len(), 2);
    }

    #[test]
    fn winner_takes_trick_and_leads_next() {
        let hands = seeded_hands();
        let mut round = RoundState::from_hands(
            hands,
            PlayerPosition::North,
            RulesMask::standard(),
            PassDirection::Hold,
        );
        let winner = play_trick(
            &mut round,
            &[
                (PlayerPosition::North, card(Rank::Two, Suit::Clubs)),
                (PlayerPosition::East, card(Rank::Three, Suit::Clubs)),
                (PlayerPosition::South, card(Rank::Four, Suit::Clubs)),
                (PlayerPosition::West, card(Rank::Five, Suit::Clubs)),
            ],
        );
        assert_eq!(winner, PlayerPosition::West);
        assert_eq!(round.current_trick().leader(), PlayerPosition::West);
        assert_eq!(round.taken(PlayerPosition::West).len(), 4);
        assert_eq!(round.tricks_won(PlayerPosition::West), 1);
        assert_eq!(round.tricks_played(), 1);
    }

    #[test]
    fn legal_moves_agree_with_play_card() {
        let deck = Deck::shuffled_with_seed(1234);
        let mut round = RoundState::deal(&deck, RulesMask::standard(), PassDirection::Hold);
        // Walk a few tricks; at every step a card must be accepted by
        // play_card iff legal_moves lists it.
        for _ in 0..16 {
            let Some(seat) = round.next_to_act() else { break };
            let legal = round.legal_moves(seat);
            assert!(!legal.is_empty());
            for c in round.hand(seat).cards().to_vec() {
                let mut probe = round.clone();
                let accepted = probe.play_card(seat, c).is_ok();
                assert_eq!(accepted, legal.contains(&c), "card {c} disagreement");
            }
            let chosen = legal[0];
            round.play_card(seat, chosen).unwrap();
        }
    }

    fn finished_round_with_piles(taken: [Hand; 4], tricks_won: [u8; 4], rules: RulesMask) -> RoundState {
        RoundState::resume(
            rules,
            array::from_fn(|_| Hand::new()),
            taken,
            tricks_won,
            crate::model::trick::Trick::new(PlayerPosition::North),
            13,
            true,
            PassDirection::Hold,
        )
    }

    fn pile_with(cards: Vec<Card>) -> Hand {
        Hand::with_cards(cards)
    }

    fn all_hearts() -> Vec<Card> {
        Rank::ORDERED
            .into_iter()
            .map(|rank| card(rank, Suit::Hearts))
            .collect()
    }

    #[test]
    fn scoring_applies_queen_penalty_and_hearts() {
        let mut taken: [Hand; 4] = array::from_fn(|_| Hand::new());
        taken[0] = pile_with(vec![
            card(Rank::Queen, Suit::Spades),
            card(Rank::Two, Suit::Hearts),
        ]);
        taken[1] = pile_with(vec![card(Rank::Ace, Suit::Hearts)]);
        let round = finished_round_with_piles(taken, [2, 1, 5, 5], RulesMask::QUEEN_PENALTY);
        assert_eq!(round.round_scores(), [14, 1, 0, 0]);
    }

    #[test]
    fn scoring_without_queen_penalty_ignores_queen() {
        let mut taken: [Hand; 4] = array::from_fn(|_| Hand::new());
        taken[0] = pile_with(vec![card(Rank::Queen, Suit::Spades)]);
        let round = finished_round_with_piles(taken, [13, 0, 0, 0], RulesMask::empty());
        assert_eq!(round.round_scores(), [0, 0, 0, 0]);
    }

    #[test]
    fn hearts_arent_points_zeroes_hearts() {
        let mut taken: [Hand; 4] = array::from_fn(|_| Hand::new());
        taken[2] = pile_with(vec![
            card(Rank::Two, Suit::Hearts),
            card(Rank::Three, Suit::Hearts),
        ]);
        let round = finished_round_with_piles(
            taken,
            [5, 4, 4, 0],
            RulesMask::QUEEN_PENALTY | RulesMask::HEARTS_ARENT_POINTS,
        );
        assert_eq!(round.round_scores()[2], 0);
    }

    #[test]
    fn jack_bonus_and_no_trick_bonus() {
        let mut taken: [Hand; 4] = array::from_fn(|_| Hand::new());
        taken[1] = pile_with(vec![card(Rank::Jack, Suit::Diamonds)]);
        let round = finished_round_with_piles(
            taken,
            [5, 8, 0, 0],
            RulesMask::QUEEN_PENALTY | RulesMask::JACK_BONUS | RulesMask::NO_TRICK_BONUS,
        );
        let scores = round.round_scores();
        assert_eq!(scores[1], -10);
        assert_eq!(scores[2], -5);
        assert_eq!(scores[3], -5);
    }

    #[test]
    fn shooting_the_moon_rewrites_penalties() {
        let mut taken: [Hand; 4] = array::from_fn(|_| Hand::new());
        let mut pile = all_hearts();
        pile.push(card(Rank::Queen, Suit::Spades));
        taken[0] = pile_with(pile);
        let round = finished_round_with_piles(taken, [13, 0, 0, 0], RulesMask::QUEEN_PENALTY);
        assert_eq!(round.round_scores(), [0, 26, 26, 26]);
    }

    #[test]
    fn moon_requires_queen_under_queen_penalty() {
        let mut taken: [Hand; 4] = array::from_fn(|_| Hand::new());
        taken[0] = pile_with(all_hearts());
        taken[1] = pile_with(vec![card(Rank::Queen, Suit::Spades)]);
        let round = finished_round_with_piles(taken, [12, 1, 0, 0], RulesMask::QUEEN_PENALTY);
        assert_eq!(round.moon_shooter(), None);
        assert_eq!(round.round_scores(), [13, 13, 0, 0]);
    }

    #[test]
    fn moon_disabled_by_no_shooting() {
        let mut taken: [Hand; 4] = array::from_fn(|_| Hand::new());
        let mut pile = all_hearts();
        pile.push(card(Rank::Queen, Suit::Spades));
        taken[0] = pile_with(pile);
        let round = finished_round_with_piles(
            taken,
            [13, 0, 0, 0],
            RulesMask::QUEEN_PENALTY | RulesMask::NO_SHOOTING,
        );
        assert_eq!(round.round_scores(), [26, 0, 0, 0]);
    }

    #[test]
    fn moon_needs_jack_when_flagged() {
        let mut taken: [Hand; 4] = array::from_fn(|_| Hand::new());
        let mut pile = all_hearts();
        pile.push(card(Rank::Queen, Suit::Spades));
        taken[0] = pile_with(pile);
        taken[1] = pile_with(vec![card(Rank::Jack, Suit::Diamonds)]);
        let rules =
            RulesMask::QUEEN_PENALTY | RulesMask::SHOOTING_NEEDS_JACK | RulesMask::JACK_BONUS;
        let round = finished_round_with_piles(taken, [13, 0, 0, 0], rules);
        assert_eq!(round.moon_shooter(), None);
        let scores = round.round_scores();
        assert_eq!(scores[0], 26);
        assert_eq!(scores[1], -10);
    }

    #[test]
    fn scoring_is_invariant_under_pile_order() {
        let cards = vec![
            card(Rank::Queen, Suit::Spades),
            card(Rank::Two, Suit::Hearts),
            card(Rank::King, Suit::Hearts),
        ];
        let mut reversed = cards.clone();
        reversed.reverse();

        let mut taken_a: [Hand; 4] = array::from_fn(|_| Hand::new());
        taken_a[3] = Hand::with_cards(cards);
        let mut taken_b: [Hand; 4] = array::from_fn(|_| Hand::new());
        taken_b[3] = Hand::with_cards(reversed);

        let a = finished_round_with_piles(taken_a, [0, 0, 0, 13], RulesMask::QUEEN_PENALTY);
        let b = finished_round_with_piles(taken_b, [0, 0, 0, 13], RulesMask::QUEEN_PENALTY);
        assert_eq!(a.round_scores(), b.round_scores());
    }
}
