//! Match session actor.

use log::{debug, error, info, warn};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{collections::VecDeque, future, net::SocketAddr, sync::Arc};
use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
    sync::mpsc,
    task::{JoinError, JoinHandle},
    time::{Instant, sleep_until, timeout},
};

use super::{
    config::{InvalidConfig, SessionConfig},
    messages::{LogEntry, MatchMode, RoundLogEntry, SessionCommand, SessionEvent},
    timer::{PhaseScheduler, PhaseStep},
};
use crate::{
    bot::LocalOpponent,
    game::{
        EndReason, MatchEnding, MatchError, MatchState, MatchStatus, RoundReport, RoundTrigger,
        commentary::CommentaryProvider,
        entities::{Card, DeckError, DeckSelection, RoundOutcome, Side, Stat},
        roster::DeckGenerator,
    },
    net::{
        errors::{ProtocolError, TransportError},
        messages::PeerMessage,
        protocol::{Inbound, PeerProtocol, Role},
        transport::{self, Connection, ConnectionEvent, PeerId, PeerListener},
    },
};

/// Size of the command inbox.
const INBOX_CAPACITY: usize = 64;

#[derive(Debug, Error)]
enum SessionError {
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Error)]
#[error("session is closed")]
pub struct SessionClosed;

/// Handle for sending commands to a [`MatchSession`].
#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        self.sender.send(command).await.map_err(|_| SessionClosed)
    }
}

type DeckJob = JoinHandle<Result<Vec<Card>, DeckError>>;
type ConnectJob = JoinHandle<Result<TcpStream, TransportError>>;

/// Turn orchestrator for one local player.
///
/// Owns the player's [`MatchState`] and whatever drives the other side: a
/// [`LocalOpponent`] or a peer [`Connection`]. Everything runs on one task;
/// user commands, peer messages, finished background jobs and phase timers
/// are handled one at a time by [`MatchSession::run`].
pub struct MatchSession {
    config: SessionConfig,
    generator: Arc<dyn DeckGenerator>,
    commentary: Arc<dyn CommentaryProvider>,
    inbox: mpsc::Receiver<SessionCommand>,
    events: mpsc::UnboundedSender<SessionEvent>,

    state: MatchState,
    mode: Option<MatchMode>,
    /// Deck of the current match
    deck: DeckSelection,
    opponent: Option<LocalOpponent>,

    listener: Option<PeerListener>,
    connection: Option<Connection>,
    protocol: Option<PeerProtocol>,
    /// Peer messages that arrived mid-round, replayed once it settles
    deferred: VecDeque<PeerMessage>,

    deck_job: Option<DeckJob>,
    connect_job: Option<(PeerId, ConnectJob)>,
    scheduler: PhaseScheduler,
    notice_deadline: Option<Instant>,
    persistent_notice: bool,
    rng: StdRng,
    is_closed: bool,
}

impl MatchSession {
    /// Create a session along with its command handle and event stream.
    pub fn new(
        config: SessionConfig,
        generator: Arc<dyn DeckGenerator>,
        commentary: Arc<dyn CommentaryProvider>,
    ) -> Result<(Self, SessionHandle, mpsc::UnboundedReceiver<SessionEvent>), InvalidConfig> {
        config.validate()?;
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let (events, event_stream) = mpsc::unbounded_channel();
        let session = Self {
            deck: config.deck,
            config,
            generator,
            commentary,
            inbox,
            events,
            state: MatchState::new(),
            mode: None,
            opponent: None,
            listener: None,
            connection: None,
            protocol: None,
            deferred: VecDeque::new(),
            deck_job: None,
            connect_job: None,
            scheduler: PhaseScheduler::new(),
            notice_deadline: None,
            persistent_notice: false,
            rng: StdRng::from_os_rng(),
            is_closed: false,
        };
        Ok((session, SessionHandle { sender }, event_stream))
    }

    /// Run the session on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run the session event loop until [`SessionCommand::Quit`] or until
    /// every [`SessionHandle`] is dropped.
    pub async fn run(mut self) {
        info!("session starting");

        while !self.is_closed {
            tokio::select! {
                command = self.inbox.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => self.shutdown(),
                },

                accepted = accept_from(self.listener.as_ref()) => self.handle_accept(accepted),

                event = next_event(self.connection.as_mut()) => self.handle_connection_event(event),

                generated = join(self.deck_job.as_mut()) => {
                    self.deck_job = None;
                    self.handle_deck(generated);
                }

                dialed = join(self.connect_job.as_mut().map(|(_, job)| job)) => {
                    self.handle_dialed(dialed);
                }

                step = self.scheduler.due() => self.handle_step(step).await,

                () = expire(self.notice_deadline) => {
                    self.notice_deadline = None;
                    self.emit(SessionEvent::NoticeCleared);
                }
            }
        }

        info!("session closed");
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        debug!("command: {command:?}");
        let result = match command {
            SessionCommand::StartSolo => self.start_solo(),
            SessionCommand::Host => self.host().await,
            SessionCommand::Connect(peer) => self.connect(peer),
            SessionCommand::SelectDeck(deck) => {
                self.config.deck = deck;
                self.log(format!("next deck: {deck}"));
                Ok(())
            }
            SessionCommand::SelectStat(stat) => self.select_stat(stat),
            SessionCommand::Restart => self.restart(),
            SessionCommand::Leave => {
                self.reset_match();
                self.emit_state();
                self.emit(SessionEvent::Lobby);
                Ok(())
            }
            SessionCommand::Quit => {
                self.shutdown();
                Ok(())
            }
        };
        if let Err(error) = result {
            self.fail(error);
        }
    }

    // === Lobby ===

    fn is_busy(&self) -> bool {
        self.state.is_live()
            || self.deck_job.is_some()
            || self.connect_job.is_some()
            || self.connection.is_some()
    }

    fn start_solo(&mut self) -> Result<(), SessionError> {
        if self.is_busy() {
            self.notify("finish or leave the current match first", false);
            return Ok(());
        }
        self.reset_match();
        self.mode = Some(MatchMode::Solo);
        self.generate(self.config.solo_hand_size);
        Ok(())
    }

    async fn host(&mut self) -> Result<(), SessionError> {
        if let Some(listener) = &self.listener {
            let peer_id = listener.id().clone();
            self.emit(SessionEvent::Hosting { peer_id });
            return Ok(());
        }
        let listener = PeerListener::bind(&self.config.bind_addr).await?;
        let peer_id = listener.id().clone();
        self.listener = Some(listener);
        self.clear_notice();
        self.log(format!("hosting on {peer_id}"));
        self.emit(SessionEvent::Hosting { peer_id });
        Ok(())
    }

    fn connect(&mut self, peer: PeerId) -> Result<(), SessionError> {
        if self.listener.as_ref().is_some_and(|listener| listener.id() == &peer) {
            self.notify("can't connect to your own id", false);
            return Ok(());
        }
        if self.is_busy() {
            self.notify("finish or leave the current match first", false);
            return Ok(());
        }
        self.reset_match();
        self.emit(SessionEvent::Connecting(peer.clone()));
        let target = peer.clone();
        let connect_timeout = self.config.connect_timeout;
        let job = tokio::spawn(async move { transport::connect(&target, connect_timeout).await });
        self.connect_job = Some((peer, job));
        Ok(())
    }

    fn handle_dialed(&mut self, dialed: Result<Result<TcpStream, TransportError>, JoinError>) {
        let Some((peer, _)) = self.connect_job.take() else {
            return;
        };
        match dialed {
            Ok(Ok(stream)) => {
                if self.connection.is_some() || self.state.is_live() {
                    debug!("dropping late connection to {peer}");
                    return;
                }
                self.open_connection(stream, peer.to_string(), Role::Guest);
            }
            Ok(Err(error)) => {
                self.fail(error.into());
                self.emit(SessionEvent::Lobby);
            }
            Err(error) if error.is_cancelled() => {}
            Err(error) => {
                error!("connect task failed: {error}");
                self.notify(format!("couldn't connect to {peer}"), false);
                self.emit(SessionEvent::Lobby);
            }
        }
    }

    fn handle_accept(&mut self, accepted: Result<(TcpStream, SocketAddr), TransportError>) {
        match accepted {
            Ok((stream, addr)) => {
                if self.is_busy() {
                    info!("rejecting {addr}: busy");
                    return;
                }
                if let Err(error) = stream.set_nodelay(true) {
                    debug!("couldn't disable nagle for {addr}: {error}");
                }
                self.reset_match();
                self.open_connection(stream, addr.to_string(), Role::Host);
            }
            Err(error) => warn!("failed to accept peer: {error}"),
        }
    }

    fn open_connection<S>(&mut self, stream: S, peer: String, role: Role)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        info!("connected to {peer} as {role:?}");
        self.connection = Some(Connection::open(stream, peer.clone()));
        self.protocol = Some(PeerProtocol::new(role));
        self.mode = Some(MatchMode::Duel(role));
        self.log(format!("connected to {peer}"));
        self.emit(SessionEvent::Connected { peer, role });
        if role == Role::Host {
            self.generate(self.config.duel_hand_size);
        }
    }

    // === Dealing ===

    fn generate(&mut self, hand_size: usize) {
        let deck = self.config.deck;
        self.deck = deck;
        self.emit(SessionEvent::Loading { deck });
        let generator = Arc::clone(&self.generator);
        self.deck_job = Some(tokio::spawn(async move {
            generator.generate_deck(hand_size, deck).await
        }));
    }

    fn handle_deck(&mut self, generated: Result<Result<Vec<Card>, DeckError>, JoinError>) {
        let full = match generated {
            Ok(Ok(full)) => full,
            Ok(Err(error)) => return self.abort_start(&error.to_string()),
            Err(error) if error.is_cancelled() => return,
            Err(error) => return self.abort_start(&error.to_string()),
        };
        match self.mode {
            Some(MatchMode::Solo) => self.deal_solo(full),
            Some(MatchMode::Duel(Role::Host)) => self.deal_duel(full),
            _ => debug!("dropping deck generated for an abandoned match"),
        }
    }

    fn deal_solo(&mut self, full: Vec<Card>) {
        let hand_size = full.len() / 2;
        let opponent = self
            .state
            .deal_split(full, Side::Me)
            .and_then(LocalOpponent::new);
        match opponent {
            Ok(opponent) => {
                self.opponent = Some(opponent.with_think_time(self.config.think_time));
                self.match_started(None, hand_size);
            }
            Err(error) => {
                self.state.reset();
                self.abort_start(&error.to_string());
            }
        }
    }

    fn deal_duel(&mut self, full: Vec<Card>) {
        let Some(protocol) = self.protocol.as_mut() else {
            return;
        };
        let hand_size = full.len() / 2;
        let turn = if self.rng.random_bool(0.5) {
            Side::Me
        } else {
            Side::Opponent
        };
        match protocol.handshake(&mut self.state, full, self.deck, turn) {
            Ok(handshake) => {
                let match_id = protocol.match_id();
                if let Err(error) = self.send(handshake) {
                    return self.fail(error);
                }
                self.match_started(match_id, hand_size);
            }
            Err(ProtocolError::Match(error)) => {
                self.state.reset();
                self.abort_start(&error.to_string());
            }
            Err(error) => self.fail(error.into()),
        }
    }

    fn match_started(&mut self, match_id: Option<uuid::Uuid>, hand_size: usize) {
        let Some(mode) = self.mode else {
            return;
        };
        let deck = self.deck;
        self.log(format!(
            "match started ({mode}, {deck} deck, {hand_size} cards each, {} lead{})",
            self.state.turn(),
            if self.state.turn() == Side::Me { "" } else { "s" }
        ));
        self.emit(SessionEvent::MatchStarted {
            match_id,
            deck,
            mode,
        });
        self.emit_state();
    }

    /// Deck generation or dealing failed; the match never starts.
    fn abort_start(&mut self, reason: &str) {
        error!("couldn't start match: {reason}");
        if self.mode == Some(MatchMode::Duel(Role::Host)) {
            self.drop_connection();
        }
        self.mode = None;
        self.notify(format!("couldn't start match: {reason}"), true);
        self.emit(SessionEvent::Lobby);
    }

    // === Rounds ===

    fn select_stat(&mut self, stat: Stat) -> Result<(), SessionError> {
        match self.mode {
            Some(MatchMode::Solo) => {
                if self.scheduler.pending().is_some() || !self.state.awaits_my_move() {
                    debug!("ignoring {stat}: not your turn");
                    return Ok(());
                }
                let Some(opponent) = &self.opponent else {
                    return Ok(());
                };
                let trigger = opponent.respond(stat)?;
                self.begin_round(trigger)
            }
            Some(MatchMode::Duel(_)) => {
                let Some(protocol) = self.protocol.as_mut() else {
                    return Ok(());
                };
                if let Some(msg) = protocol.send_move(&self.state, stat) {
                    self.send(msg)?;
                    self.emit(SessionEvent::AwaitingReveal { stat });
                }
                Ok(())
            }
            None => {
                debug!("ignoring {stat}: no match");
                Ok(())
            }
        }
    }

    fn begin_round(&mut self, trigger: RoundTrigger) -> Result<(), SessionError> {
        let RoundTrigger {
            stat,
            opponent_card,
            initiator,
        } = trigger;
        self.state.reveal(opponent_card.clone())?;
        self.emit(SessionEvent::Revealed {
            stat,
            opponent_card,
            initiator,
        });
        self.emit_state();
        self.scheduler
            .schedule(self.config.reveal_dwell, PhaseStep::Resolve { stat, initiator });
        Ok(())
    }

    async fn handle_step(&mut self, step: PhaseStep) {
        let result = match step {
            PhaseStep::OpponentLead => self.opponent_lead(),
            PhaseStep::Resolve { stat, initiator } => self.resolve(stat, initiator).await,
            PhaseStep::Advance => self.advance(),
        };
        if let Err(error) = result {
            self.fail(error);
        }
    }

    fn opponent_lead(&mut self) -> Result<(), SessionError> {
        if !self.state.is_live() || self.state.turn() != Side::Opponent {
            return Ok(());
        }
        let Some(opponent) = self.opponent.as_mut() else {
            return Ok(());
        };
        let trigger = opponent.lead()?;
        self.begin_round(trigger)
    }

    async fn resolve(&mut self, stat: Stat, initiator: Side) -> Result<(), SessionError> {
        let report = self.state.compare(stat)?;
        let commentary = self.commentary_for(&report).await;
        let entry = RoundLogEntry::new(&report, initiator, commentary);
        info!("{entry}");
        self.emit(SessionEvent::Logged(LogEntry::Round(entry)));
        self.emit_state();
        self.scheduler
            .schedule(self.config.post_result_delay, PhaseStep::Advance);
        Ok(())
    }

    async fn commentary_for(&self, report: &RoundReport) -> Option<String> {
        let (winner, loser, label) = match report.outcome {
            RoundOutcome::Won(Side::Me) => (&report.self_card, &report.opponent_card, "you"),
            RoundOutcome::Won(Side::Opponent) => {
                (&report.opponent_card, &report.self_card, "opponent")
            }
            RoundOutcome::Draw => (&report.self_card, &report.opponent_card, "nobody"),
        };
        let line = self.commentary.commentary(winner, loser, report.stat, label);
        match timeout(self.config.commentary_timeout, line).await {
            Ok(Ok(line)) => Some(line),
            Ok(Err(error)) => {
                warn!("round {} has no commentary: {error}", report.round);
                None
            }
            Err(_) => {
                warn!("round {} commentary timed out", report.round);
                None
            }
        }
    }

    fn advance(&mut self) -> Result<(), SessionError> {
        let settlement = self.state.advance()?;
        if let Some(opponent) = self.opponent.as_mut() {
            opponent.absorb(&settlement, &mut self.state);
        }
        self.emit_state();

        if let Some(ending) = settlement.ending {
            self.match_over(ending);
            self.settle_bankruptcy(ending)?;
            // A rematch request or ack may have arrived during the last round.
            self.replay_deferred();
            return Ok(());
        }
        if self.mode == Some(MatchMode::Solo) && self.state.turn() == Side::Opponent {
            self.scheduler
                .schedule(self.config.think_time, PhaseStep::OpponentLead);
        }
        self.replay_deferred();
        Ok(())
    }

    fn match_over(&mut self, ending: MatchEnding) {
        self.scheduler.cancel();
        let verdict = match ending.winner {
            Some(Side::Me) => "you won",
            Some(Side::Opponent) => "you lost",
            None => "no winner",
        };
        self.log(format!("match over: {verdict} ({})", ending.reason));
        self.emit(SessionEvent::MatchOver(ending));
    }

    /// Tell the peer we ran out of cards, and expect its ack if it did.
    fn settle_bankruptcy(&mut self, ending: MatchEnding) -> Result<(), SessionError> {
        if ending.reason != EndReason::Bankruptcy {
            return Ok(());
        }
        let Some(protocol) = self.protocol.as_mut() else {
            return Ok(());
        };
        if self.state.opponent_deck_count() == 0 {
            protocol.expect_game_over_ack();
        }
        if ending.winner == Some(Side::Opponent) {
            self.send(PeerMessage::GameOverAck)?;
        }
        Ok(())
    }

    /// End the match outside of round resolution.
    fn conclude(&mut self, winner: Option<Side>, reason: EndReason) {
        if self.state.conclude(winner, reason) {
            self.scheduler.cancel();
            self.emit_state();
            if let Some(ending) = self.state.ending() {
                self.match_over(ending);
            }
        }
    }

    fn restart(&mut self) -> Result<(), SessionError> {
        if self.state.is_live() || self.deck_job.is_some() {
            self.notify("the match is still in progress", false);
            return Ok(());
        }
        match self.mode {
            Some(MatchMode::Solo) => {
                self.reset_round();
                self.generate(self.config.solo_hand_size);
            }
            Some(MatchMode::Duel(role)) => {
                if self.connection.is_none() {
                    self.notify("your opponent has left", false);
                    return Ok(());
                }
                self.reset_round();
                self.send(PeerMessage::Restart)?;
                self.log("asked for a rematch");
                self.emit_state();
                if role == Role::Host {
                    self.generate(self.config.duel_hand_size);
                }
            }
            None => self.notify("there's no match to restart", false),
        }
        Ok(())
    }

    // === Peer ===

    fn handle_connection_event(&mut self, event: Option<ConnectionEvent>) {
        match event {
            Some(ConnectionEvent::Message(msg)) => self.handle_peer_message(msg),
            Some(ConnectionEvent::Error(error)) => warn!("connection error: {error}"),
            Some(ConnectionEvent::Malformed(reason)) => {
                self.fail(ProtocolError::Malformed(reason).into());
            }
            Some(ConnectionEvent::Closed) | None => self.handle_disconnect(),
        }
    }

    fn handle_peer_message(&mut self, msg: PeerMessage) {
        if self.state.status() == MatchStatus::RoundResolving {
            debug!("deferring {} until the round settles", msg.kind());
            self.deferred.push_back(msg);
            return;
        }
        debug!("<- {msg}");
        let Some(protocol) = self.protocol.as_mut() else {
            return;
        };
        let result = match protocol.receive(&mut self.state, msg) {
            Ok(inbound) => self.apply_inbound(inbound),
            Err(error) => Err(error.into()),
        };
        if let Err(error) = result {
            self.fail(error);
        }
    }

    fn apply_inbound(&mut self, inbound: Inbound) -> Result<(), SessionError> {
        match inbound {
            Inbound::Dealt { match_id, deck } => {
                self.deck = deck;
                let hand_size = self.state.self_remaining();
                self.match_started(Some(match_id), hand_size);
            }
            Inbound::Round { trigger, reply } => {
                if let Some(reply) = reply {
                    self.send(reply)?;
                }
                self.begin_round(trigger)?;
            }
            Inbound::OpponentConceded => self.conclude(Some(Side::Me), EndReason::Concession),
            Inbound::Acknowledged => debug!("opponent confirmed the last match"),
            Inbound::RestartRequested => self.handle_restart_request(),
        }
        Ok(())
    }

    fn handle_restart_request(&mut self) {
        match self.protocol.as_ref().map(PeerProtocol::role) {
            Some(Role::Host) => {
                if self.state.is_live() || self.deck_job.is_some() {
                    debug!("rematch already under way");
                    return;
                }
                self.log("opponent asked for a rematch");
                self.reset_round();
                self.emit_state();
                self.generate(self.config.duel_hand_size);
            }
            Some(Role::Guest) => {
                if self.state.status() != MatchStatus::AwaitingDeal {
                    self.log("host started a rematch");
                    self.reset_round();
                    self.emit_state();
                }
            }
            None => {}
        }
    }

    /// Feed messages held back during the last round, stopping as soon as one
    /// of them starts the next round.
    fn replay_deferred(&mut self) {
        while self.state.status() != MatchStatus::RoundResolving {
            let Some(msg) = self.deferred.pop_front() else {
                break;
            };
            self.handle_peer_message(msg);
        }
    }

    fn handle_disconnect(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        info!("{} disconnected", connection.peer());
        self.protocol = None;
        self.deferred.clear();
        if let Some(job) = self.deck_job.take() {
            job.abort();
        }
        if self.state.is_live() {
            self.conclude(Some(Side::Me), EndReason::Disconnect);
            self.notify("your opponent disconnected", false);
        } else if self.state.status() == MatchStatus::AwaitingDeal {
            self.mode = None;
            self.notify("connection closed", false);
            self.emit(SessionEvent::Lobby);
        } else {
            self.notify("your opponent left", false);
        }
    }

    fn send(&self, msg: PeerMessage) -> Result<(), SessionError> {
        match &self.connection {
            Some(connection) => Ok(connection.send(msg)?),
            None => Err(TransportError::Closed.into()),
        }
    }

    fn fail(&mut self, error: SessionError) {
        match error {
            SessionError::Transport(error) => {
                warn!("{error}");
                self.notify(error.to_string(), error.is_persistent());
            }
            error => {
                error!("abandoning match: {error}");
                self.deferred.clear();
                self.drop_connection();
                self.notify(format!("match abandoned: {error}"), false);
                if self.state.is_live() {
                    self.conclude(None, EndReason::Desync);
                } else {
                    self.reset_round();
                    self.mode = None;
                    self.emit(SessionEvent::Lobby);
                }
            }
        }
    }

    // === Housekeeping ===

    /// Clear everything about the current match, keeping the connection.
    ///
    /// A held-back HANDSHAKE belongs to the next match and is kept.
    fn reset_round(&mut self) {
        self.scheduler.cancel();
        self.deferred
            .retain(|msg| matches!(msg, PeerMessage::Handshake(_)));
        self.state.reset();
        self.opponent = None;
        if let Some(protocol) = self.protocol.as_mut() {
            protocol.reset();
        }
    }

    /// Clear the match, its connection and any background jobs.
    fn reset_match(&mut self) {
        self.reset_round();
        self.deferred.clear();
        self.drop_connection();
        if let Some(job) = self.deck_job.take() {
            job.abort();
        }
        if let Some((_, job)) = self.connect_job.take() {
            job.abort();
        }
        self.mode = None;
    }

    fn drop_connection(&mut self) {
        // Dropping the connection flushes queued messages before closing.
        self.connection = None;
        self.protocol = None;
    }

    fn shutdown(&mut self) {
        self.reset_match();
        self.listener = None;
        self.is_closed = true;
        self.emit(SessionEvent::Closed);
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("no one is listening for session events");
        }
    }

    fn emit_state(&self) {
        self.emit(SessionEvent::StateChanged(self.state.view()));
    }

    fn log(&self, message: impl Into<String>) {
        let entry = LogEntry::system(message);
        info!("{entry}");
        self.emit(SessionEvent::Logged(entry));
    }

    fn notify(&mut self, message: impl Into<String>, persistent: bool) {
        self.persistent_notice = persistent;
        self.notice_deadline = if persistent {
            None
        } else {
            Some(Instant::now() + self.config.notice_lifetime)
        };
        self.emit(SessionEvent::Notice {
            message: message.into(),
            persistent,
        });
    }

    fn clear_notice(&mut self) {
        if self.persistent_notice || self.notice_deadline.is_some() {
            self.persistent_notice = false;
            self.notice_deadline = None;
            self.emit(SessionEvent::NoticeCleared);
        }
    }
}

async fn accept_from(
    listener: Option<&PeerListener>,
) -> Result<(TcpStream, SocketAddr), TransportError> {
    match listener {
        Some(listener) => listener.accept().await,
        None => future::pending().await,
    }
}

async fn next_event(connection: Option<&mut Connection>) -> Option<ConnectionEvent> {
    match connection {
        Some(connection) => connection.next_event().await,
        None => future::pending().await,
    }
}

async fn join<T>(job: Option<&mut JoinHandle<T>>) -> Result<T, JoinError> {
    match job {
        Some(job) => job.await,
        None => future::pending().await,
    }
}

async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => future::pending().await,
    }
}
