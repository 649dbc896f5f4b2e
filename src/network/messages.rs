//! The session protocol message vocabulary.
//!
//! These are the discrete, typed records exchanged over the established
//! peer channel. They are pure data and side-effect-free to parse; all
//! effects are applied by the game state machine
//! ([`GameSession`](crate::session::GameSession)).
//!
//! On the wire each message is one newline-free UTF-8 JSON record whose
//! `type` field selects the variant; see [`codec`](crate::network::codec).

use serde::{Deserialize, Serialize};

use crate::board::{Board, Position};
use crate::rank::CombatOutcome;
use crate::Side;

/// The result of a finished game as carried by [`Message::GameOver`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    /// Red captured the flag.
    Red,
    /// Blue captured the flag.
    Blue,
    /// Both flags were eliminated in the same exchange.
    Draw,
}

impl From<Side> for Winner {
    fn from(side: Side) -> Self {
        match side {
            Side::Red => Winner::Red,
            Side::Blue => Winner::Blue,
        }
    }
}

/// A message exchanged over the peer channel.
///
/// The privacy asymmetry of the protocol is visible in the payloads:
/// [`Message::AttackPiece`] discloses the *attacker's* rank value to the
/// defender (required to compute the outcome), while
/// [`Message::AttackResult`] carries only the coarse outcome category back
/// — the defender's identity is never disclosed to the attacker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// Liveness probe; the receiver replies with [`Message::HandshakeAck`].
    Handshake,
    /// Reply to [`Message::Handshake`]. No effect beyond confirming
    /// liveness.
    #[serde(rename = "Handshake-Ack")]
    HandshakeAck,
    /// Announces the sender's display name.
    PlayerName {
        /// The display name to show for the remote player.
        name: String,
    },
    /// Announces the sender's ready flag during the preparing phase.
    IsReady {
        /// `true` once the sender has finished arranging its pieces.
        ready: bool,
    },
    /// Asks the receiver to disclose its own placed pieces (rank-redacted)
    /// so the sender can render occupied-but-unknown cells.
    RequestPieces,
    /// Reply to [`Message::RequestPieces`]: the sender's own pieces with
    /// every rank replaced by a redaction marker.
    #[serde(rename = "RequestPieces-Reply")]
    RequestPiecesReply {
        /// The redacted own-board snapshot; merged into the receiver's
        /// replica.
        board: Board,
    },
    /// A plain relocation into an empty cell. Flips the turn on the
    /// receiver.
    MovePiece {
        /// Origin of the moving piece.
        from: Position,
        /// Destination cell (empty on both replicas).
        to: Position,
    },
    /// An attack on an occupied cell. The receiver holds the ground truth
    /// for the defender and resolves the combat locally.
    AttackPiece {
        /// Origin of the attacking piece.
        from: Position,
        /// The attacked cell.
        to: Position,
        /// The attacker's rank value.
        attacker: i8,
    },
    /// Reply to [`Message::AttackPiece`]: the outcome category the original
    /// attacker applies to its own replica.
    AttackResult {
        /// Who survived the exchange.
        result: CombatOutcome,
        /// Origin of the attacking piece, echoed back.
        from: Position,
        /// The attacked cell, echoed back.
        to: Position,
    },
    /// Terminal message: a flag died and both sides converge on the ended
    /// phase.
    GameOver {
        /// The computed winner.
        winner: Winner,
    },
}
