//! Connection establishment through a shared rendezvous store.
//!
//! Gets two processes from "nothing shared" to "one open bidirectional
//! message channel" using only a shared room record keyed by a short code,
//! an append-only candidate stream, and change notifications — the
//! offer/answer/candidate dance, with the concrete backend and transport
//! left to the embedder.
//!
//! The [`RendezvousClient`] is sans-IO: the embedder performs store calls
//! through the [`RoomStore`] trait, feeds in [`StoreNotification`]s
//! (already filtered by room code) and locally-discovered transport
//! candidates, and drains [`RendezvousAction`]s telling it what to apply to
//! its local channel endpoint. Candidates arriving before the remote
//! description is known are buffered and replayed FIFO the instant it
//! becomes known — the queue-then-drain discipline is mandatory, not an
//! optimization.
//!
//! There is no timeout on an awaited answer or candidate; an abandoned
//! room waits forever. This is a known limitation of the protocol.

use std::collections::vec_deque::Drain;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::LinkError;
use crate::rng::Pcg32;
use crate::Side;

/// The alphabet room codes are drawn from. Excludes `0`, `1`, `I` and `O`
/// to avoid visually-ambiguous characters.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// The length of a room code.
pub const ROOM_CODE_LEN: usize = 4;

/// Which end of the rendezvous a client is.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Created the room and published the offer. Plays red.
    Host,
    /// Joined an existing room and published the answer. Plays blue.
    Connector,
}

impl Role {
    /// The side this role plays once the channel opens.
    #[must_use]
    pub const fn side(self) -> Side {
        match self {
            Role::Host => Side::Red,
            Role::Connector => Side::Blue,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Host => write!(f, "host"),
            Role::Connector => write!(f, "connector"),
        }
    }
}

/// An opaque transport connection description (an offer or an answer).
/// The rendezvous layer never inspects its contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription(String);

impl SessionDescription {
    /// Wraps a transport-produced description.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        SessionDescription(raw.into())
    }

    /// The raw description payload.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An opaque transport-address candidate. The rendezvous layer only moves
/// these around; the transport applies them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportCandidate(String);

impl TransportCandidate {
    /// Wraps a transport-produced candidate.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        TransportCandidate(raw.into())
    }

    /// The raw candidate payload.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A 4-character room code drawn from [`ROOM_CODE_ALPHABET`].
///
/// Codes are short-lived and low-entropy by design; generation retries on
/// collision rather than aiming for uniqueness cryptographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomCode(String);

impl RoomCode {
    /// Generates a fresh code not currently present in the store,
    /// retrying while the store reports the code in use.
    pub fn generate<S: RoomStore>(store: &S, rng: &mut Pcg32) -> Result<RoomCode, LinkError> {
        loop {
            let mut code = String::with_capacity(ROOM_CODE_LEN);
            for _ in 0..ROOM_CODE_LEN {
                let index = rng.gen_range(0..ROOM_CODE_ALPHABET.len());
                code.push(ROOM_CODE_ALPHABET[index] as char);
            }
            let code = RoomCode(code);
            if !store.room_exists(&code)? {
                return Ok(code);
            }
            trace!(code = %code, "room code collision, regenerating");
        }
    }

    /// Parses user input into a room code: uppercases, then validates
    /// length and alphabet.
    pub fn parse(text: &str) -> Result<RoomCode, LinkError> {
        let code = text.trim().to_ascii_uppercase();
        if code.len() != ROOM_CODE_LEN
            || !code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b))
        {
            return Err(LinkError::InvalidRequest {
                info: format!("{:?} is not a valid room code", text),
            });
        }
        Ok(RoomCode(code))
    }

    /// The code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The shared key-value room store used for the initial exchange. The
/// concrete backend (database, broker, in-memory fake) is the embedder's
/// concern; backend failures are reported as [`LinkError::Store`].
pub trait RoomStore {
    /// Persists a new room record `{code, offer}`.
    fn insert_room(&mut self, code: &RoomCode, offer: &SessionDescription)
        -> Result<(), LinkError>;

    /// Sets the answer on an existing room record.
    fn update_room(
        &mut self,
        code: &RoomCode,
        answer: &SessionDescription,
    ) -> Result<(), LinkError>;

    /// Fetches the offer of the room record for `code`, or `None` if no
    /// such room exists.
    fn get_room(&self, code: &RoomCode) -> Result<Option<SessionDescription>, LinkError>;

    /// Appends a candidate record `{code, from_role, candidate}`.
    fn insert_candidate(
        &mut self,
        code: &RoomCode,
        from_role: Role,
        candidate: &TransportCandidate,
    ) -> Result<(), LinkError>;

    /// Returns `true` if a room record exists for `code`. Used by the
    /// code-generation collision loop.
    fn room_exists(&self, code: &RoomCode) -> Result<bool, LinkError>;
}

/// A change notification from the room store, pre-filtered to this
/// client's room code by the embedder's subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreNotification {
    /// The answer field of the room record was set.
    AnswerSet(SessionDescription),
    /// A candidate record was appended for this room.
    CandidateInserted {
        /// The role that published the candidate.
        from_role: Role,
        /// The candidate payload.
        candidate: TransportCandidate,
    },
}

/// An instruction for the embedder's local channel endpoint, drained via
/// [`RendezvousClient::poll_actions`]. Actions must be applied in the
/// order they are drained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendezvousAction {
    /// Apply this description as the remote description.
    ApplyRemoteDescription(SessionDescription),
    /// Apply this transport candidate.
    ApplyCandidate(TransportCandidate),
    /// The channel is open; hand off to the game state machine.
    Established {
        /// The local role.
        role: Role,
        /// The side this peer plays.
        side: Side,
    },
}

#[derive(Debug)]
enum ClientState {
    Idle,
    Linking {
        role: Role,
        code: RoomCode,
        remote_description_known: bool,
        pending_candidates: VecDeque<TransportCandidate>,
    },
    Established {
        role: Role,
        code: RoomCode,
    },
}

/// The rendezvous state machine for one peer.
///
/// Create with [`RendezvousClient::new`], then call
/// [`create_room`](Self::create_room) or [`join_room`](Self::join_room).
/// Duplicate create/join attempts while a connection already exists are
/// idempotent no-ops (logged, not errors), so a double-clicked button
/// cannot corrupt an establishment in progress.
#[derive(Debug)]
pub struct RendezvousClient {
    state: ClientState,
    actions: VecDeque<RendezvousAction>,
}

impl Default for RendezvousClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RendezvousClient {
    /// Creates an idle client with no room.
    #[must_use]
    pub fn new() -> Self {
        RendezvousClient {
            state: ClientState::Idle,
            actions: VecDeque::new(),
        }
    }

    /// Hosts a new room: generates a collision-free code and persists the
    /// local `offer` under it. The embedder must then feed store
    /// notifications for that code into
    /// [`handle_notification`](Self::handle_notification).
    ///
    /// Returns `Ok(None)` (a logged no-op) if a connection already exists.
    pub fn create_room<S: RoomStore>(
        &mut self,
        store: &mut S,
        offer: SessionDescription,
        rng: &mut Pcg32,
    ) -> Result<Option<RoomCode>, LinkError> {
        if !matches!(self.state, ClientState::Idle) {
            warn!("create_room ignored: a connection already exists");
            return Ok(None);
        }
        let code = RoomCode::generate(store, rng)?;
        store.insert_room(&code, &offer)?;
        debug!(code = %code, "room created");
        self.state = ClientState::Linking {
            role: Role::Host,
            code: code.clone(),
            remote_description_known: false,
            pending_candidates: VecDeque::new(),
        };
        Ok(Some(code))
    }

    /// Joins an existing room: fetches the host's offer and queues an
    /// [`RendezvousAction::ApplyRemoteDescription`] for it. The remote
    /// description is known from the start on this leg, so host-origin
    /// candidates are never queued. Once the transport has produced an
    /// answer, pass it to [`submit_answer`](Self::submit_answer).
    ///
    /// A missing room is a terminal [`LinkError::RoomNotFound`]; the
    /// caller must not retry. Returns `Ok(None)` (a logged no-op) if a
    /// connection already exists.
    pub fn join_room<S: RoomStore>(
        &mut self,
        store: &S,
        code: RoomCode,
    ) -> Result<Option<SessionDescription>, LinkError> {
        if !matches!(self.state, ClientState::Idle) {
            warn!("join_room ignored: a connection already exists");
            return Ok(None);
        }
        let offer = store
            .get_room(&code)?
            .ok_or_else(|| LinkError::RoomNotFound {
                code: code.as_str().to_owned(),
            })?;
        debug!(code = %code, "joined room");
        self.actions
            .push_back(RendezvousAction::ApplyRemoteDescription(offer.clone()));
        self.state = ClientState::Linking {
            role: Role::Connector,
            code,
            remote_description_known: true,
            pending_candidates: VecDeque::new(),
        };
        Ok(Some(offer))
    }

    /// Publishes the connector's answer to the room record. Only valid on
    /// the connector leg after [`join_room`](Self::join_room).
    pub fn submit_answer<S: RoomStore>(
        &mut self,
        store: &mut S,
        answer: SessionDescription,
    ) -> Result<(), LinkError> {
        match &self.state {
            ClientState::Linking {
                role: Role::Connector,
                code,
                ..
            } => store.update_room(code, &answer),
            _ => Err(LinkError::InvalidRequest {
                info: "submit_answer is only valid on a joining connector".to_owned(),
            }),
        }
    }

    /// Publishes a locally-discovered transport candidate to the store,
    /// tagged with the local role.
    pub fn publish_candidate<S: RoomStore>(
        &mut self,
        store: &mut S,
        candidate: TransportCandidate,
    ) -> Result<(), LinkError> {
        match &self.state {
            ClientState::Linking { role, code, .. } | ClientState::Established { role, code } => {
                trace!(code = %code, role = %role, "publishing local candidate");
                store.insert_candidate(code, *role, &candidate)
            }
            ClientState::Idle => Err(LinkError::InvalidRequest {
                info: "no room to publish a candidate to".to_owned(),
            }),
        }
    }

    /// Feeds one store change notification into the state machine.
    ///
    /// The answer is consumed exactly once; candidates from the local role
    /// are ignored (echo guard); remote candidates are applied immediately
    /// when the remote description is known, otherwise buffered and
    /// replayed FIFO the instant it becomes known.
    pub fn handle_notification(&mut self, notification: StoreNotification) {
        let ClientState::Linking {
            role,
            remote_description_known,
            pending_candidates,
            ..
        } = &mut self.state
        else {
            trace!("store notification ignored: not linking");
            return;
        };

        match notification {
            StoreNotification::AnswerSet(answer) => {
                if *role != Role::Host {
                    // The connector wrote the answer itself; this is its
                    // own update echoed back.
                    trace!("ignoring answer notification on connector leg");
                    return;
                }
                if *remote_description_known {
                    debug!("duplicate answer notification ignored");
                    return;
                }
                *remote_description_known = true;
                self.actions
                    .push_back(RendezvousAction::ApplyRemoteDescription(answer));
                // Replay buffered candidates in arrival order.
                for candidate in pending_candidates.drain(..) {
                    self.actions
                        .push_back(RendezvousAction::ApplyCandidate(candidate));
                }
            }
            StoreNotification::CandidateInserted {
                from_role,
                candidate,
            } => {
                if from_role == *role {
                    trace!("ignoring own candidate echo");
                    return;
                }
                if *remote_description_known {
                    self.actions
                        .push_back(RendezvousAction::ApplyCandidate(candidate));
                } else {
                    pending_candidates.push_back(candidate);
                }
            }
        }
    }

    /// Reports that the local channel endpoint fired its "open" event.
    /// Establishment is complete; an [`RendezvousAction::Established`]
    /// handoff is queued.
    pub fn handle_channel_open(&mut self) {
        let ClientState::Linking { role, code, .. } = &self.state else {
            warn!("channel open ignored: not linking");
            return;
        };
        let role = *role;
        let code = code.clone();
        debug!(code = %code, role = %role, "channel open, rendezvous complete");
        self.actions.push_back(RendezvousAction::Established {
            role,
            side: role.side(),
        });
        self.state = ClientState::Established { role, code };
    }

    /// Drains the queued actions, in order. The embedder must apply every
    /// action before feeding further inputs.
    pub fn poll_actions(&mut self) -> Drain<'_, RendezvousAction> {
        self.actions.drain(..)
    }

    /// The local role, once a room has been created or joined.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        match &self.state {
            ClientState::Idle => None,
            ClientState::Linking { role, .. } | ClientState::Established { role, .. } => {
                Some(*role)
            }
        }
    }

    /// The room code, once a room has been created or joined.
    #[must_use]
    pub fn room_code(&self) -> Option<&RoomCode> {
        match &self.state {
            ClientState::Idle => None,
            ClientState::Linking { code, .. } | ClientState::Established { code, .. } => {
                Some(code)
            }
        }
    }

    /// Returns `true` once the channel open event has been observed.
    #[must_use]
    pub fn is_established(&self) -> bool {
        matches!(self.state, ClientState::Established { .. })
    }

    /// Tears the client down to idle, discarding any pending state. Used
    /// when a finished game clears its session identity.
    pub fn reset(&mut self) {
        self.state = ClientState::Idle;
        self.actions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SeedableRng;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore {
        rooms: HashMap<String, (SessionDescription, Option<SessionDescription>)>,
        candidates: Vec<(String, Role, TransportCandidate)>,
    }

    impl RoomStore for MemoryStore {
        fn insert_room(
            &mut self,
            code: &RoomCode,
            offer: &SessionDescription,
        ) -> Result<(), LinkError> {
            self.rooms
                .insert(code.as_str().to_owned(), (offer.clone(), None));
            Ok(())
        }

        fn update_room(
            &mut self,
            code: &RoomCode,
            answer: &SessionDescription,
        ) -> Result<(), LinkError> {
            match self.rooms.get_mut(code.as_str()) {
                Some(record) => {
                    record.1 = Some(answer.clone());
                    Ok(())
                }
                None => Err(LinkError::RoomNotFound {
                    code: code.as_str().to_owned(),
                }),
            }
        }

        fn get_room(&self, code: &RoomCode) -> Result<Option<SessionDescription>, LinkError> {
            Ok(self.rooms.get(code.as_str()).map(|record| record.0.clone()))
        }

        fn insert_candidate(
            &mut self,
            code: &RoomCode,
            from_role: Role,
            candidate: &TransportCandidate,
        ) -> Result<(), LinkError> {
            self.candidates
                .push((code.as_str().to_owned(), from_role, candidate.clone()));
            Ok(())
        }

        fn room_exists(&self, code: &RoomCode) -> Result<bool, LinkError> {
            Ok(self.rooms.contains_key(code.as_str()))
        }
    }

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(11)
    }

    fn candidate(tag: &str) -> TransportCandidate {
        TransportCandidate::new(tag)
    }

    // ==========================================================================
    // Room codes
    // ==========================================================================

    #[test]
    fn generated_codes_use_the_restricted_alphabet() {
        let store = MemoryStore::default();
        let mut rng = rng();
        for _ in 0..50 {
            let code = RoomCode::generate(&store, &mut rng).unwrap();
            assert_eq!(code.as_str().len(), ROOM_CODE_LEN);
            assert!(code
                .as_str()
                .bytes()
                .all(|b| ROOM_CODE_ALPHABET.contains(&b)));
            for forbidden in ['0', '1', 'I', 'O'] {
                assert!(!code.as_str().contains(forbidden));
            }
        }
    }

    #[test]
    fn generation_retries_on_collision() {
        let mut store = MemoryStore::default();
        let mut rng = rng();
        // Occupy the first code this seed would produce.
        let first = RoomCode::generate(&store, &mut rng).unwrap();
        store
            .insert_room(&first, &SessionDescription::new("offer"))
            .unwrap();

        let mut rng = Pcg32::seed_from_u64(11);
        let regenerated = RoomCode::generate(&store, &mut rng).unwrap();
        assert_ne!(regenerated, first);
    }

    #[test]
    fn parse_uppercases_and_validates() {
        assert_eq!(RoomCode::parse(" ab3k ").unwrap().as_str(), "AB3K");
        assert!(RoomCode::parse("AB3").is_err());
        assert!(RoomCode::parse("AB3KX").is_err());
        assert!(RoomCode::parse("AB0K").is_err()); // 0 not in alphabet
        assert!(RoomCode::parse("AB1K").is_err());
        assert!(RoomCode::parse("ABIK").is_err());
        assert!(RoomCode::parse("ABOK").is_err());
    }

    // ==========================================================================
    // Host leg
    // ==========================================================================

    #[test]
    fn host_queues_candidates_until_answer_then_drains_fifo() {
        let mut store = MemoryStore::default();
        let mut rng = rng();
        let mut client = RendezvousClient::new();
        client
            .create_room(&mut store, SessionDescription::new("offer"), &mut rng)
            .unwrap()
            .unwrap();

        // Three connector candidates arrive before the answer.
        for tag in ["c1", "c2", "c3"] {
            client.handle_notification(StoreNotification::CandidateInserted {
                from_role: Role::Connector,
                candidate: candidate(tag),
            });
        }
        assert_eq!(client.poll_actions().count(), 0);

        client.handle_notification(StoreNotification::AnswerSet(SessionDescription::new(
            "answer",
        )));
        // A late candidate after the description is known.
        client.handle_notification(StoreNotification::CandidateInserted {
            from_role: Role::Connector,
            candidate: candidate("c4"),
        });

        let actions: Vec<_> = client.poll_actions().collect();
        assert_eq!(
            actions,
            vec![
                RendezvousAction::ApplyRemoteDescription(SessionDescription::new("answer")),
                RendezvousAction::ApplyCandidate(candidate("c1")),
                RendezvousAction::ApplyCandidate(candidate("c2")),
                RendezvousAction::ApplyCandidate(candidate("c3")),
                RendezvousAction::ApplyCandidate(candidate("c4")),
            ]
        );
    }

    #[test]
    fn host_consumes_answer_exactly_once() {
        let mut store = MemoryStore::default();
        let mut rng = rng();
        let mut client = RendezvousClient::new();
        client
            .create_room(&mut store, SessionDescription::new("offer"), &mut rng)
            .unwrap()
            .unwrap();

        client.handle_notification(StoreNotification::AnswerSet(SessionDescription::new("a1")));
        client.handle_notification(StoreNotification::AnswerSet(SessionDescription::new("a2")));

        let descriptions: Vec<_> = client
            .poll_actions()
            .filter(|action| matches!(action, RendezvousAction::ApplyRemoteDescription(_)))
            .collect();
        assert_eq!(
            descriptions,
            vec![RendezvousAction::ApplyRemoteDescription(
                SessionDescription::new("a1")
            )]
        );
    }

    #[test]
    fn host_ignores_its_own_candidate_echo() {
        let mut store = MemoryStore::default();
        let mut rng = rng();
        let mut client = RendezvousClient::new();
        client
            .create_room(&mut store, SessionDescription::new("offer"), &mut rng)
            .unwrap()
            .unwrap();
        client.handle_notification(StoreNotification::AnswerSet(SessionDescription::new(
            "answer",
        )));
        client.poll_actions().count();

        client.handle_notification(StoreNotification::CandidateInserted {
            from_role: Role::Host,
            candidate: candidate("own"),
        });
        assert_eq!(client.poll_actions().count(), 0);
    }

    // ==========================================================================
    // Connector leg
    // ==========================================================================

    #[test]
    fn connector_applies_offer_immediately_and_answers() {
        let mut store = MemoryStore::default();
        let mut rng = rng();
        let mut host = RendezvousClient::new();
        let code = host
            .create_room(&mut store, SessionDescription::new("offer"), &mut rng)
            .unwrap()
            .unwrap();

        let mut connector = RendezvousClient::new();
        let offer = connector.join_room(&store, code.clone()).unwrap().unwrap();
        assert_eq!(offer, SessionDescription::new("offer"));
        assert_eq!(connector.role(), Some(Role::Connector));

        let actions: Vec<_> = connector.poll_actions().collect();
        assert_eq!(
            actions,
            vec![RendezvousAction::ApplyRemoteDescription(
                SessionDescription::new("offer")
            )]
        );

        connector
            .submit_answer(&mut store, SessionDescription::new("answer"))
            .unwrap();
        assert_eq!(
            store.rooms.get(code.as_str()).unwrap().1,
            Some(SessionDescription::new("answer"))
        );

        // Host candidates apply immediately: the description was known
        // from the start on this leg.
        connector.handle_notification(StoreNotification::CandidateInserted {
            from_role: Role::Host,
            candidate: candidate("h1"),
        });
        assert_eq!(
            connector.poll_actions().collect::<Vec<_>>(),
            vec![RendezvousAction::ApplyCandidate(candidate("h1"))]
        );
    }

    #[test]
    fn joining_a_missing_room_is_terminal() {
        let store = MemoryStore::default();
        let mut client = RendezvousClient::new();
        let err = client
            .join_room(&store, RoomCode::parse("AB3K").unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            LinkError::RoomNotFound {
                code: "AB3K".to_owned()
            }
        );
        // The client stays idle and usable.
        assert_eq!(client.role(), None);
    }

    #[test]
    fn connector_ignores_its_own_candidates_and_answer_echo() {
        let mut store = MemoryStore::default();
        let mut rng = rng();
        let mut host = RendezvousClient::new();
        let code = host
            .create_room(&mut store, SessionDescription::new("offer"), &mut rng)
            .unwrap()
            .unwrap();

        let mut connector = RendezvousClient::new();
        connector.join_room(&store, code).unwrap();
        connector.poll_actions().count();

        connector.handle_notification(StoreNotification::CandidateInserted {
            from_role: Role::Connector,
            candidate: candidate("own"),
        });
        connector.handle_notification(StoreNotification::AnswerSet(SessionDescription::new(
            "own-answer",
        )));
        assert_eq!(connector.poll_actions().count(), 0);
    }

    // ==========================================================================
    // Lifecycle
    // ==========================================================================

    #[test]
    fn duplicate_create_or_join_is_an_idempotent_no_op() {
        let mut store = MemoryStore::default();
        let mut rng = rng();
        let mut client = RendezvousClient::new();
        let code = client
            .create_room(&mut store, SessionDescription::new("offer"), &mut rng)
            .unwrap()
            .unwrap();

        assert_eq!(
            client
                .create_room(&mut store, SessionDescription::new("again"), &mut rng)
                .unwrap(),
            None
        );
        assert_eq!(client.join_room(&store, code.clone()).unwrap(), None);
        assert_eq!(client.room_code(), Some(&code));
    }

    #[test]
    fn channel_open_completes_the_handshake() {
        let mut store = MemoryStore::default();
        let mut rng = rng();
        let mut client = RendezvousClient::new();
        client
            .create_room(&mut store, SessionDescription::new("offer"), &mut rng)
            .unwrap()
            .unwrap();
        client.handle_notification(StoreNotification::AnswerSet(SessionDescription::new(
            "answer",
        )));
        client.poll_actions().count();

        client.handle_channel_open();
        assert!(client.is_established());
        assert_eq!(
            client.poll_actions().collect::<Vec<_>>(),
            vec![RendezvousAction::Established {
                role: Role::Host,
                side: Side::Red,
            }]
        );
    }

    #[test]
    fn publish_candidate_tags_the_local_role() {
        let mut store = MemoryStore::default();
        let mut rng = rng();
        let mut client = RendezvousClient::new();
        client
            .create_room(&mut store, SessionDescription::new("offer"), &mut rng)
            .unwrap()
            .unwrap();
        client
            .publish_candidate(&mut store, candidate("local"))
            .unwrap();
        assert_eq!(store.candidates.len(), 1);
        assert_eq!(store.candidates[0].1, Role::Host);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut store = MemoryStore::default();
        let mut rng = rng();
        let mut client = RendezvousClient::new();
        client
            .create_room(&mut store, SessionDescription::new("offer"), &mut rng)
            .unwrap()
            .unwrap();
        client.reset();
        assert_eq!(client.role(), None);
        assert!(!client.is_established());
        // A fresh create succeeds after reset.
        assert!(client
            .create_room(&mut store, SessionDescription::new("offer2"), &mut rng)
            .unwrap()
            .is_some());
    }
}
