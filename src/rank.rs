//! Static rank table and combat resolution.
//!
//! Every piece type maps to a signed strength value; combat between two
//! values is resolved by [`resolve_combat`], which both replicas apply
//! independently. Determinism of that function is what keeps the two boards
//! consistent, since the attacker and the defender compute the outcome from
//! different information (the defender holds the ground truth for its own
//! piece, the attacker only learns the coarse outcome).

use serde::{Deserialize, Serialize};

use crate::Side;

/// The rank value of the Spy. A sentinel outside the linear order: the Spy
/// beats everything except the Private.
pub const SPY_VALUE: i8 = -1;

/// The rank value of the Flag. The Flag has no special attack or defense
/// power; it loses to every attacker via the plain comparison, and its
/// elimination ends the game.
pub const FLAG_VALUE: i8 = 0;

/// The rank value of the Private, the only rank that eliminates a Spy.
pub const PRIVATE_VALUE: i8 = 1;

/// A piece type in the Game of the Generals.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    /// The flag; capturing it ends the game.
    Flag,
    /// The private, rank 1. The only rank that defeats a spy.
    Private,
    /// The sergeant, rank 2.
    Sergeant,
    /// The 2nd lieutenant, rank 3.
    SecondLieutenant,
    /// The 1st lieutenant, rank 4.
    FirstLieutenant,
    /// The captain, rank 5.
    Captain,
    /// The major, rank 6.
    Major,
    /// The lieutenant colonel, rank 7.
    LieutenantColonel,
    /// The colonel, rank 8.
    Colonel,
    /// The 1-star general, rank 9.
    OneStarGeneral,
    /// The 2-star general, rank 10.
    TwoStarGeneral,
    /// The 3-star general, rank 11.
    ThreeStarGeneral,
    /// The 4-star general, rank 12.
    FourStarGeneral,
    /// The 5-star general, rank 13.
    FiveStarGeneral,
    /// The spy. Sentinel value -1; beats everything except the private.
    Spy,
}

impl Rank {
    /// Returns the signed strength value used for combat comparison.
    #[must_use]
    pub const fn value(self) -> i8 {
        match self {
            Rank::Spy => SPY_VALUE,
            Rank::Flag => FLAG_VALUE,
            Rank::Private => PRIVATE_VALUE,
            Rank::Sergeant => 2,
            Rank::SecondLieutenant => 3,
            Rank::FirstLieutenant => 4,
            Rank::Captain => 5,
            Rank::Major => 6,
            Rank::LieutenantColonel => 7,
            Rank::Colonel => 8,
            Rank::OneStarGeneral => 9,
            Rank::TwoStarGeneral => 10,
            Rank::ThreeStarGeneral => 11,
            Rank::FourStarGeneral => 12,
            Rank::FiveStarGeneral => 13,
        }
    }

    /// All distinct rank types, from Flag up to the Spy sentinel.
    pub const ALL: [Rank; 15] = [
        Rank::Flag,
        Rank::Private,
        Rank::Sergeant,
        Rank::SecondLieutenant,
        Rank::FirstLieutenant,
        Rank::Captain,
        Rank::Major,
        Rank::LieutenantColonel,
        Rank::Colonel,
        Rank::OneStarGeneral,
        Rank::TwoStarGeneral,
        Rank::ThreeStarGeneral,
        Rank::FourStarGeneral,
        Rank::FiveStarGeneral,
        Rank::Spy,
    ];
}

/// The 21 pieces each side fields at game start: 6 privates, 2 spies, the
/// five generals, the field officers and one flag. Together with 6 empty
/// slots these fill the 27 home-row cells.
pub const STARTING_ROSTER: [Rank; 21] = [
    Rank::Private,
    Rank::Private,
    Rank::Private,
    Rank::Private,
    Rank::Private,
    Rank::Private,
    Rank::Spy,
    Rank::Spy,
    Rank::FiveStarGeneral,
    Rank::FourStarGeneral,
    Rank::ThreeStarGeneral,
    Rank::TwoStarGeneral,
    Rank::OneStarGeneral,
    Rank::Colonel,
    Rank::LieutenantColonel,
    Rank::Major,
    Rank::Captain,
    Rank::FirstLieutenant,
    Rank::SecondLieutenant,
    Rank::Sergeant,
    Rank::Flag,
];

/// The outcome category of a combat exchange. This is the only combat
/// information ever disclosed to the attacking side.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatOutcome {
    /// Both pieces are eliminated (equal values, including Spy vs Spy).
    Both,
    /// The attacking piece survives and occupies the defender's cell.
    Attacker,
    /// The defending piece survives in place.
    Defender,
}

/// Resolves combat between two rank values.
///
/// Applied identically on both replicas given the same two values; each
/// side computes it independently from different information, so the
/// function must be fully deterministic. Mutual elimination on equal values
/// takes precedence over the Spy special cases, which is what makes Spy vs
/// Spy eliminate both.
#[must_use]
pub fn resolve_combat(attacker: i8, defender: i8) -> CombatOutcome {
    if attacker == defender {
        CombatOutcome::Both
    } else if attacker == SPY_VALUE && defender != PRIVATE_VALUE {
        CombatOutcome::Attacker
    } else if defender == SPY_VALUE && attacker != PRIVATE_VALUE {
        CombatOutcome::Defender
    } else if attacker > defender {
        CombatOutcome::Attacker
    } else {
        CombatOutcome::Defender
    }
}

/// Computes the winner of a flag-ending combat, from the point of view of
/// the side that resolved it (the defender of the exchange).
///
/// Returns [`Winner::Draw`] when both pieces were flags, otherwise the side
/// that did not lose its flag.
///
/// [`Winner::Draw`]: crate::Winner::Draw
#[must_use]
pub fn flag_winner(attacker: i8, defender: i8, resolver: Side) -> Option<crate::Winner> {
    match (attacker == FLAG_VALUE, defender == FLAG_VALUE) {
        (true, true) => Some(crate::Winner::Draw),
        // The resolver owns the defender piece; its flag died, so the
        // attacker (the opponent of the resolver) wins.
        (false, true) => Some(crate::Winner::from(resolver.opponent())),
        // The attacker moved its own flag into combat and lost it.
        (true, false) => Some(crate::Winner::from(resolver)),
        (false, false) => None,
    }
}
