//! The replicated game state machine.
//!
//! Each peer runs one [`GameSession`]: the single mutator of that replica's
//! board and session context. All inputs are funneled through it — local
//! user actions, inbound wire messages, the channel-open event and time —
//! and all outputs are drained from its message and event queues. No other
//! code mutates session state, which is what makes the two replicas'
//! convergence arguable at all.
//!
//! The phase machine is `Waiting → Preparing → Playing → Ended`, advanced
//! only by the events defined here. Ended auto-resets to Waiting after
//! [`RESET_DELAY`] on each peer's local clock; the reset is deliberately
//! unsynchronized and tears the session identity down completely, so a
//! rematch starts from a fresh rendezvous.
//!
//! Combat is two-phase on the attacker and single-phase on the defender:
//! the attacker discloses its rank value and freezes until the defender
//! (who holds the ground truth for the attacked cell) reports back the
//! coarse outcome. The defender's identity is never disclosed.

use std::collections::vec_deque::Drain;
use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, trace, warn};
use web_time::Instant;

use crate::board::{Board, Cell, Position};
use crate::error::LinkError;
use crate::network::codec;
use crate::network::messages::{Message, Winner};
use crate::rank::{flag_winner, resolve_combat, CombatOutcome};
use crate::rendezvous::{Role, RoomCode};
use crate::rng::{Pcg32, SeedableRng};
use crate::Side;

/// How long an ended game lingers before the local replica resets to the
/// waiting phase and tears down its session identity.
pub const RESET_DELAY: Duration = Duration::from_secs(5);

/// The lifecycle phase of a session replica.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GamePhase {
    /// No peer connected; an idle demo board is shown and freely
    /// rearrangeable.
    Waiting,
    /// Channel open; both players arrange their pieces in their home rows.
    Preparing,
    /// The match is running; turns alternate starting with red.
    Playing,
    /// A flag died. Terminal except for the local auto-reset timer.
    Ended,
}

/// A state change surfaced to the embedder, drained via
/// [`GameSession::poll_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The phase machine advanced (or reset) to `phase`.
    PhaseChanged(GamePhase),
    /// The remote player announced its display name.
    RemoteNameChanged(String),
    /// The game ended with this result. Always accompanied by a
    /// [`SessionEvent::PhaseChanged`] to [`GamePhase::Ended`].
    GameEnded(Winner),
}

/// An attack sent to the peer and not yet resolved. While set, the local
/// player can make no further move; only the matching [`Message::AttackResult`]
/// (or game end) clears it, so a duplicated reply cannot double-apply.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct PendingAttack {
    from: Position,
    to: Position,
}

/// All mutable session state outside the board itself. Passed explicitly
/// through every handler; there is no ambient or global session state.
#[derive(Debug)]
struct SessionContext {
    room_code: Option<RoomCode>,
    role: Option<Role>,
    side: Option<Side>,
    phase: GamePhase,
    turn: Option<Side>,
    local_ready: bool,
    remote_ready: bool,
    local_name: String,
    remote_name: String,
    winner: Option<Winner>,
    pending_attack: Option<PendingAttack>,
    ended_at: Option<Instant>,
}

impl SessionContext {
    fn fresh(local_name: String) -> Self {
        SessionContext {
            room_code: None,
            role: None,
            side: None,
            phase: GamePhase::Waiting,
            turn: None,
            local_ready: false,
            remote_ready: false,
            local_name,
            remote_name: String::new(),
            winner: None,
            pending_attack: None,
            ended_at: None,
        }
    }
}

/// One peer's session replica: the board, the session context and the
/// outbound queues.
///
/// Everything the session wants the outside world to do is queued:
/// messages for the peer channel in the outgoing queue
/// ([`poll_outgoing`](Self::poll_outgoing)) and state-change notifications
/// in the event queue ([`poll_events`](Self::poll_events)). The embedder
/// drives the session by calling the input methods and draining both
/// queues afterwards.
#[derive(Debug)]
pub struct GameSession {
    ctx: SessionContext,
    board: Board,
    rng: Pcg32,
    outgoing: VecDeque<Message>,
    events: VecDeque<SessionEvent>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    /// Creates a waiting session with an entropy-seeded shuffle generator
    /// and the idle demo board.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(Pcg32::from_entropy())
    }

    /// Creates a waiting session with the given shuffle generator.
    /// Placement (and thus the demo board) is deterministic per seed.
    #[must_use]
    pub fn with_rng(mut rng: Pcg32) -> Self {
        let board = Board::demo(&mut rng);
        GameSession {
            ctx: SessionContext::fresh(String::new()),
            board,
            rng,
            outgoing: VecDeque::new(),
            events: VecDeque::new(),
        }
    }

    // ======================================================================
    // Accessors
    // ======================================================================

    /// The current board replica.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.ctx.phase
    }

    /// The local side, once a channel is open.
    #[must_use]
    pub fn side(&self) -> Option<Side> {
        self.ctx.side
    }

    /// The local role, once a channel is open.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.ctx.role
    }

    /// The room code of the current session, once a channel is open.
    #[must_use]
    pub fn room_code(&self) -> Option<&RoomCode> {
        self.ctx.room_code.as_ref()
    }

    /// Whose turn it is during the playing phase.
    #[must_use]
    pub fn turn(&self) -> Option<Side> {
        self.ctx.turn
    }

    /// The result of the game, once ended.
    #[must_use]
    pub fn winner(&self) -> Option<Winner> {
        self.ctx.winner
    }

    /// The local ready flag.
    #[must_use]
    pub fn local_ready(&self) -> bool {
        self.ctx.local_ready
    }

    /// The remote ready flag as last announced.
    #[must_use]
    pub fn remote_ready(&self) -> bool {
        self.ctx.remote_ready
    }

    /// The local player's display name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.ctx.local_name
    }

    /// The remote player's display name as last announced.
    #[must_use]
    pub fn remote_name(&self) -> &str {
        &self.ctx.remote_name
    }

    /// Returns `true` while a sent attack awaits its outcome reply. No
    /// further local move is accepted until it resolves.
    #[must_use]
    pub fn awaiting_combat_reply(&self) -> bool {
        self.ctx.pending_attack.is_some()
    }

    /// Drains the messages queued for the peer channel, in send order.
    pub fn poll_outgoing(&mut self) -> Drain<'_, Message> {
        self.outgoing.drain(..)
    }

    /// Drains the queued state-change events, in occurrence order.
    pub fn poll_events(&mut self) -> Drain<'_, SessionEvent> {
        self.events.drain(..)
    }

    // ======================================================================
    // Local inputs
    // ======================================================================

    /// Sets the local display name. Announced to the peer immediately if a
    /// channel is already open.
    pub fn set_local_name(&mut self, name: impl Into<String>) {
        self.ctx.local_name = name.into();
        if self.ctx.phase != GamePhase::Waiting {
            self.outgoing.push_back(Message::PlayerName {
                name: self.ctx.local_name.clone(),
            });
        }
    }

    /// A local request to move (or swap) a piece.
    ///
    /// What this means depends on the phase: a free swap while waiting, a
    /// home-row swap while preparing, a turn move while playing. Illegal
    /// requests are silently ignored (logged at trace level) — rejection
    /// feedback is a rendering concern. Only coordinates off the board are
    /// an error.
    pub fn move_piece(&mut self, from: Position, to: Position) -> Result<(), LinkError> {
        match self.ctx.phase {
            GamePhase::Waiting => self.board.swap(from, to),
            GamePhase::Preparing => self.preparing_swap(from, to),
            GamePhase::Playing => self.playing_move(from, to),
            GamePhase::Ended => {
                // Bounds still checked so the caller gets consistent errors.
                self.board.get(from)?;
                self.board.get(to)?;
                trace!("move ignored: game has ended");
                Ok(())
            }
        }
    }

    /// Sets the local ready flag during the preparing phase and announces
    /// it. Ignored in any other phase. Entering the playing phase requires
    /// both ready flags true at once, so un-readying while the opponent
    /// deliberates keeps the gate closed.
    pub fn set_ready(&mut self, ready: bool) {
        if self.ctx.phase != GamePhase::Preparing {
            trace!(phase = ?self.ctx.phase, "set_ready ignored outside preparing");
            return;
        }
        self.ctx.local_ready = ready;
        self.outgoing.push_back(Message::IsReady { ready });
        self.maybe_start_playing();
    }

    // ======================================================================
    // Channel lifecycle
    // ======================================================================

    /// Reports that the peer channel opened. Transitions Waiting →
    /// Preparing: the local side gets a fresh randomized home-row
    /// placement, and the connector announces its display name
    /// (the host learns it passively).
    pub fn handle_channel_open(&mut self, role: Role, code: RoomCode) {
        if self.ctx.phase != GamePhase::Waiting {
            warn!(phase = ?self.ctx.phase, "channel open ignored: session already active");
            return;
        }
        let side = role.side();
        debug!(%code, %role, %side, "channel open, entering preparing phase");
        self.ctx.room_code = Some(code);
        self.ctx.role = Some(role);
        self.ctx.side = Some(side);
        self.ctx.local_ready = false;
        self.ctx.remote_ready = false;
        self.board = Board::prep(side, &mut self.rng);
        if role == Role::Connector {
            self.outgoing.push_back(Message::PlayerName {
                name: self.ctx.local_name.clone(),
            });
        }
        self.set_phase(GamePhase::Preparing);
    }

    /// Reports that the peer channel closed. Deliberately not a state
    /// transition: there is no reconnection protocol, and an ended game
    /// resets on its own timer. Logged for diagnostics only.
    pub fn handle_channel_close(&mut self) {
        debug!(phase = ?self.ctx.phase, "peer channel closed");
    }

    // ======================================================================
    // Inbound messages
    // ======================================================================

    /// Decodes and applies one wire record. Unknown record types are
    /// ignored; malformed records are dropped and logged. Never panics and
    /// never tears the session down on bad peer data.
    pub fn handle_record(&mut self, text: &str) {
        match codec::decode(text) {
            Ok(Some(message)) => self.handle_message(message),
            Ok(None) => trace!("ignoring unknown record type"),
            Err(err) => warn!(%err, "dropping malformed record"),
        }
    }

    /// Applies one decoded message from the peer.
    pub fn handle_message(&mut self, message: Message) {
        match message {
            Message::Handshake => {
                self.outgoing.push_back(Message::HandshakeAck);
            }
            Message::HandshakeAck => {
                trace!("peer acknowledged handshake");
            }
            Message::PlayerName { name } => {
                self.ctx.remote_name = name.clone();
                self.events.push_back(SessionEvent::RemoteNameChanged(name));
            }
            Message::IsReady { ready } => {
                if self.ctx.phase != GamePhase::Preparing {
                    trace!(phase = ?self.ctx.phase, "IsReady ignored outside preparing");
                    return;
                }
                self.ctx.remote_ready = ready;
                self.maybe_start_playing();
            }
            Message::RequestPieces => {
                let Some(side) = self.ctx.side else {
                    warn!("RequestPieces before a side was assigned");
                    return;
                };
                // Own pieces only, ranks redacted: the true types never
                // leave this replica.
                let snapshot = self.board.own_pieces(side).redact(side);
                self.outgoing
                    .push_back(Message::RequestPiecesReply { board: snapshot });
            }
            Message::RequestPiecesReply { board } => {
                if self.ctx.phase != GamePhase::Playing {
                    trace!(phase = ?self.ctx.phase, "piece snapshot ignored outside playing");
                    return;
                }
                self.board.merge(&board);
            }
            Message::MovePiece { from, to } => {
                if self.ctx.phase != GamePhase::Playing {
                    trace!(phase = ?self.ctx.phase, "MovePiece ignored outside playing");
                    return;
                }
                if let Err(err) = self.board.relocate(from, to) {
                    warn!(%err, "dropping MovePiece with bad coordinates");
                    return;
                }
                self.flip_turn();
            }
            Message::AttackPiece { from, to, attacker } => {
                self.handle_attack(from, to, attacker);
            }
            Message::AttackResult { result, from, to } => {
                self.handle_attack_result(result, from, to);
            }
            Message::GameOver { winner } => {
                if self.ctx.phase == GamePhase::Ended {
                    trace!("duplicate GameOver ignored");
                    return;
                }
                self.end_game(winner, false);
            }
        }
    }

    /// Advances time. Currently drives only the ended→waiting auto-reset:
    /// once [`RESET_DELAY`] has elapsed since the game ended, the replica
    /// returns to the waiting phase and the session identity (room code,
    /// role, side) is cleared. Each peer resets on its own clock.
    pub fn poll(&mut self, now: Instant) {
        if self.ctx.phase != GamePhase::Ended {
            return;
        }
        let Some(ended_at) = self.ctx.ended_at else {
            return;
        };
        if now.saturating_duration_since(ended_at) < RESET_DELAY {
            return;
        }
        debug!("auto-resetting to waiting phase");
        let local_name = std::mem::take(&mut self.ctx.local_name);
        self.ctx = SessionContext::fresh(local_name);
        self.board = Board::demo(&mut self.rng);
        self.events
            .push_back(SessionEvent::PhaseChanged(GamePhase::Waiting));
    }

    // ======================================================================
    // Internals
    // ======================================================================

    fn set_phase(&mut self, phase: GamePhase) {
        self.ctx.phase = phase;
        self.events.push_back(SessionEvent::PhaseChanged(phase));
    }

    fn flip_turn(&mut self) {
        if let Some(turn) = self.ctx.turn {
            self.ctx.turn = Some(turn.opponent());
        }
    }

    fn maybe_start_playing(&mut self) {
        if !(self.ctx.local_ready && self.ctx.remote_ready) {
            return;
        }
        debug!("both players ready, entering playing phase");
        self.ctx.local_ready = false;
        self.ctx.remote_ready = false;
        // Red moves first regardless of which replica opens the phase.
        self.ctx.turn = Some(Side::Red);
        self.outgoing.push_back(Message::RequestPieces);
        self.set_phase(GamePhase::Playing);
    }

    fn preparing_swap(&mut self, from: Position, to: Position) -> Result<(), LinkError> {
        self.board.get(from)?;
        self.board.get(to)?;
        if self.ctx.local_ready {
            trace!("swap ignored: already readied up");
            return Ok(());
        }
        let Some(side) = self.ctx.side else {
            trace!("swap ignored: no side assigned");
            return Ok(());
        };
        let rows = side.home_rows();
        if !rows.contains(&from.row) || !rows.contains(&to.row) {
            trace!(%from, %to, "swap ignored: outside own home rows");
            return Ok(());
        }
        self.board.swap(from, to)
    }

    fn playing_move(&mut self, from: Position, to: Position) -> Result<(), LinkError> {
        let from_cell = self.board.get(from)?;
        let to_cell = self.board.get(to)?;
        let Some(side) = self.ctx.side else {
            trace!("move ignored: no side assigned");
            return Ok(());
        };
        if self.ctx.pending_attack.is_some() {
            trace!("move ignored: awaiting combat reply");
            return Ok(());
        }
        if self.ctx.turn != Some(side) {
            trace!("move ignored: not this side's turn");
            return Ok(());
        }
        let Cell::Piece { owner, rank } = from_cell else {
            trace!(%from, "move ignored: no own piece at origin");
            return Ok(());
        };
        if owner != side {
            trace!(%from, "move ignored: origin piece not owned");
            return Ok(());
        }
        if !from.is_adjacent(to) {
            trace!(%from, %to, "move ignored: destination not adjacent");
            return Ok(());
        }
        match to_cell.owner() {
            Some(occupant) if occupant == side => {
                trace!(%to, "move ignored: own piece at destination");
                Ok(())
            }
            None => {
                self.board.relocate(from, to)?;
                self.flip_turn();
                self.outgoing.push_back(Message::MovePiece { from, to });
                Ok(())
            }
            Some(_) => {
                // Two-phase attack: disclose the attacker's value, freeze,
                // and apply nothing until the defender reports back.
                self.ctx.pending_attack = Some(PendingAttack { from, to });
                self.outgoing.push_back(Message::AttackPiece {
                    from,
                    to,
                    attacker: rank.value(),
                });
                Ok(())
            }
        }
    }

    fn handle_attack(&mut self, from: Position, to: Position, attacker: i8) {
        if self.ctx.phase != GamePhase::Playing {
            trace!(phase = ?self.ctx.phase, "AttackPiece ignored outside playing");
            return;
        }
        let Some(side) = self.ctx.side else {
            warn!("AttackPiece before a side was assigned");
            return;
        };
        let defender = match self.board.get(to) {
            Ok(Cell::Piece { owner, rank }) if owner == side => rank.value(),
            Ok(_) => {
                warn!(%to, "dropping AttackPiece: no own piece at attacked cell");
                return;
            }
            Err(err) => {
                warn!(%err, "dropping AttackPiece with bad coordinates");
                return;
            }
        };

        let outcome = resolve_combat(attacker, defender);
        let applied = match outcome {
            CombatOutcome::Both => self
                .board
                .remove(from)
                .and_then(|_| self.board.remove(to).map(|_| ())),
            CombatOutcome::Attacker => self.board.relocate(from, to),
            CombatOutcome::Defender => self.board.remove(from).map(|_| ()),
        };
        if let Err(err) = applied {
            warn!(%err, "dropping AttackPiece with bad coordinates");
            return;
        }

        if let Some(winner) = flag_winner(attacker, defender, side) {
            // A flag died: no outcome reply and no turn flip, straight to
            // the ended phase on both replicas.
            self.end_game(winner, true);
            return;
        }
        self.flip_turn();
        self.outgoing.push_back(Message::AttackResult {
            result: outcome,
            from,
            to,
        });
    }

    fn handle_attack_result(&mut self, result: CombatOutcome, from: Position, to: Position) {
        if self.ctx.phase != GamePhase::Playing {
            trace!(phase = ?self.ctx.phase, "AttackResult ignored outside playing");
            return;
        }
        match self.ctx.pending_attack {
            Some(pending) if pending.from == from && pending.to == to => {}
            _ => {
                warn!(%from, %to, "ignoring AttackResult with no matching pending attack");
                return;
            }
        }
        let applied = match result {
            CombatOutcome::Both => self
                .board
                .remove(from)
                .and_then(|_| self.board.remove(to).map(|_| ())),
            CombatOutcome::Attacker => self.board.relocate(from, to),
            CombatOutcome::Defender => self.board.remove(from).map(|_| ()),
        };
        if let Err(err) = applied {
            warn!(%err, "dropping AttackResult with bad coordinates");
            return;
        }
        self.ctx.pending_attack = None;
        self.flip_turn();
    }

    fn end_game(&mut self, winner: Winner, broadcast: bool) {
        debug!(?winner, "game over");
        if broadcast {
            self.outgoing.push_back(Message::GameOver { winner });
        }
        self.ctx.winner = Some(winner);
        self.ctx.turn = None;
        self.ctx.pending_attack = None;
        self.ctx.ended_at = Some(Instant::now());
        self.events.push_back(SessionEvent::GameEnded(winner));
        self.set_phase(GamePhase::Ended);
    }
}
