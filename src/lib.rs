//! # Generals Link
//!
//! Generals Link is the peer-to-peer session core for a two-player "Game of
//! the Generals" (Stratego-style) match played over a direct peer link. It
//! provides the connection-establishment protocol, the wire message
//! vocabulary and the replicated, partial-knowledge game state machine that
//! keeps two independently-mutated board replicas consistent using only an
//! unordered-delivery-tolerant message channel and a rendezvous store for
//! the initial address exchange.
//!
//! The crate is transport-agnostic and IO-free: the rendezvous backend is
//! abstracted behind the [`RoomStore`] trait, change notifications and
//! channel lifecycle events are fed in by the embedder, and everything the
//! library wants to happen in the outside world is drained from action and
//! message queues. Rendering, toast plumbing and the concrete transport
//! (e.g. a WebRTC data channel) are external collaborators.
//!
//! ## Known limitations
//!
//! There is deliberately no timeout or redelivery protocol: an unanswered
//! offer waits forever, and a dropped combat reply stalls that side in the
//! playing phase. Combat is resolved unilaterally by the defending client;
//! peers are trusted to report truthful outcomes.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use board::{Board, Cell, Position, BOARD_COLS, BOARD_ROWS};
pub use error::LinkError;
pub use network::messages::{Message, Winner};
pub use rank::{resolve_combat, CombatOutcome, Rank};
pub use rendezvous::{
    RendezvousAction, RendezvousClient, Role, RoomCode, RoomStore, SessionDescription,
    StoreNotification, TransportCandidate,
};
pub use session::{GamePhase, GameSession, SessionEvent};

pub mod board;
pub mod error;
pub mod rank;
pub mod rendezvous;
/// Internal random number generator module based on PCG32.
///
/// Provides the minimal PRNG used for piece placement and room-code
/// generation instead of pulling in the `rand` crate.
pub mod rng;
pub mod session;
/// Wire-level concerns: the message vocabulary and the codec.
pub mod network {
    pub mod codec;
    pub mod messages;
}

use serde::{Deserialize, Serialize};

/// One of the two players in a match.
///
/// The host always plays red and the connector always plays blue; red moves
/// first once the playing phase begins.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The red player (host).
    Red,
    /// The blue player (connector).
    Blue,
}

impl Side {
    /// Returns the other side.
    #[inline]
    #[must_use]
    pub const fn opponent(self) -> Side {
        match self {
            Side::Red => Side::Blue,
            Side::Blue => Side::Red,
        }
    }

    /// Returns the three home rows of this side, in unrotated (host)
    /// orientation: rows 0–2 for blue, rows 5–7 for red.
    ///
    /// Home rows are fixed by side, not by the board orientation a client
    /// uses for display.
    #[must_use]
    pub const fn home_rows(self) -> [usize; 3] {
        match self {
            Side::Blue => [0, 1, 2],
            Side::Red => [5, 6, 7],
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Red => write!(f, "red"),
            Side::Blue => write!(f, "blue"),
        }
    }
}
