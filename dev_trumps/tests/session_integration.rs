/// Integration tests for match sessions talking over loopback TCP
///
/// These tests run real sessions against each other and drive them only
/// through commands, the way a UI would.
use std::{sync::Arc, time::Duration};

use dev_trumps::{
    EndReason, FixedDeckGenerator, MatchEnding, MatchSession, MatchStatus, SessionCommand,
    SessionConfig, SessionEvent, SessionHandle, Side, Stat, TemplateCommentary,
    constants::STAT_COUNT,
    entities::{Card, Score},
    net::{protocol::Role, transport::PeerId},
    session::{LogEntry, MatchMode, RoundLogEntry},
};
use tokio::{io::AsyncWriteExt, net::TcpStream, sync::mpsc::UnboundedReceiver, time::timeout};

const WAIT: Duration = Duration::from_secs(10);

type Events = UnboundedReceiver<SessionEvent>;

fn deck(scores: &[Score]) -> Vec<Card> {
    scores
        .iter()
        .enumerate()
        .map(|(i, &score)| Card::new(&format!("dev{i}"), [score; STAT_COUNT]).unwrap())
        .collect()
}

fn start(deck: Vec<Card>) -> (SessionHandle, Events) {
    start_with(SessionConfig::default().without_delays(), deck)
}

/// Real round pacing, shortened so a test stays quick.
fn paced() -> SessionConfig {
    SessionConfig {
        reveal_dwell: Duration::from_millis(30),
        post_result_delay: Duration::from_millis(100),
        ..SessionConfig::default()
    }
}

fn start_with(config: SessionConfig, deck: Vec<Card>) -> (SessionHandle, Events) {
    let (session, handle, events) = MatchSession::new(
        config,
        Arc::new(FixedDeckGenerator::new(deck)),
        Arc::new(TemplateCommentary),
    )
    .unwrap();
    session.spawn();
    (handle, events)
}

async fn wait_for<F>(events: &mut Events, mut matches: F) -> SessionEvent
where
    F: FnMut(&SessionEvent) -> bool,
{
    timeout(WAIT, async {
        loop {
            let event = events.recv().await.expect("session closed early");
            if matches(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for session event")
}

async fn host(handle: &SessionHandle, events: &mut Events) -> PeerId {
    handle.send(SessionCommand::Host).await.unwrap();
    match wait_for(events, |e| matches!(e, SessionEvent::Hosting { .. })).await {
        SessionEvent::Hosting { peer_id } => peer_id,
        _ => unreachable!(),
    }
}

/// Pick a stat whenever it's our move, until the match ends. Returns the
/// ending and every round the session logged.
async fn drive(
    handle: &SessionHandle,
    events: &mut Events,
) -> (MatchEnding, Vec<RoundLogEntry>) {
    let mut round = 0;
    let mut rounds = Vec::new();
    loop {
        let event = timeout(WAIT, events.recv())
            .await
            .expect("timed out mid-match")
            .expect("session closed mid-match");
        match event {
            SessionEvent::StateChanged(view)
                if view.status == MatchStatus::InProgress && view.turn == Side::Me =>
            {
                round += 1;
                let stat = Stat::ALL[round % STAT_COUNT];
                handle.send(SessionCommand::SelectStat(stat)).await.unwrap();
            }
            SessionEvent::Logged(LogEntry::Round(entry)) => rounds.push(entry),
            SessionEvent::MatchOver(ending) => return (ending, rounds),
            _ => {}
        }
    }
}

async fn connected_pair(full: Vec<Card>) -> ((SessionHandle, Events), (SessionHandle, Events)) {
    let config = SessionConfig::default().without_delays();
    connected_pair_with(config.clone(), config, full).await
}

async fn connected_pair_with(
    host_config: SessionConfig,
    guest_config: SessionConfig,
    full: Vec<Card>,
) -> ((SessionHandle, Events), (SessionHandle, Events)) {
    let (host_handle, mut host_events) = start_with(host_config, full);
    let (guest_handle, mut guest_events) = start_with(guest_config, Vec::new());
    let peer_id = host(&host_handle, &mut host_events).await;

    guest_handle
        .send(SessionCommand::Connect(peer_id))
        .await
        .unwrap();
    for events in [&mut host_events, &mut guest_events] {
        wait_for(events, |e| matches!(e, SessionEvent::MatchStarted { .. })).await;
    }
    ((host_handle, host_events), (guest_handle, guest_events))
}

// === Duel Tests ===

#[tokio::test]
async fn test_duel_plays_to_bankruptcy() {
    let scores: Vec<Score> = (0..12).map(|i| (i * 41 % 100) as Score).collect();
    let ((host_handle, mut host_events), (guest_handle, mut guest_events)) =
        connected_pair(deck(&scores)).await;

    let ((host_ending, _), (guest_ending, _)) = tokio::join!(
        drive(&host_handle, &mut host_events),
        drive(&guest_handle, &mut guest_events)
    );

    assert_eq!(host_ending.reason, EndReason::Bankruptcy);
    assert_eq!(guest_ending.reason, EndReason::Bankruptcy);
    assert!(host_ending.winner.is_some());
    assert_eq!(host_ending.winner.map(Side::other), guest_ending.winner);
}

#[tokio::test]
async fn test_moves_during_slow_round_are_played_in_order() {
    // The guest answers instantly, so its moves land while the host is still
    // showing the previous round.
    let scores: Vec<Score> = (0..8).map(|i| (i * 41 % 100) as Score).collect();
    let ((host_handle, mut host_events), (guest_handle, mut guest_events)) =
        connected_pair_with(paced(), SessionConfig::default().without_delays(), deck(&scores))
            .await;

    let ((host_ending, host_rounds), (guest_ending, guest_rounds)) = tokio::join!(
        drive(&host_handle, &mut host_events),
        drive(&guest_handle, &mut guest_events)
    );

    assert_eq!(host_ending.reason, EndReason::Bankruptcy);
    assert_eq!(host_ending.winner.map(Side::other), guest_ending.winner);
    assert_eq!(host_rounds.len(), guest_rounds.len());
    for (i, (host, guest)) in host_rounds.iter().zip(&guest_rounds).enumerate() {
        assert_eq!(host.round as usize, i + 1);
        assert_eq!(guest.round, host.round);
        assert_eq!(guest.stat, host.stat);
        assert_eq!(guest.initiator, host.initiator.other());
        assert_eq!(guest.self_login, host.opponent_login);
        assert_eq!(guest.opponent_login, host.self_login);
        assert_eq!(guest.outcome, host.outcome.mirrored());
    }
}

#[tokio::test]
async fn test_rematch_requested_while_host_still_resolving() {
    // The host holds the only winning card and paces its rounds.
    let ((host_handle, mut host_events), (guest_handle, mut guest_events)) =
        connected_pair_with(paced(), SessionConfig::default().without_delays(), deck(&[90, 10]))
            .await;

    let guest_side = async {
        let (ending, _) = drive(&guest_handle, &mut guest_events).await;
        guest_handle.send(SessionCommand::Restart).await.unwrap();
        ending
    };
    let ((host_ending, _), guest_ending) =
        tokio::join!(drive(&host_handle, &mut host_events), guest_side);
    assert_eq!(host_ending.winner, Some(Side::Me));
    assert_eq!(guest_ending.winner, Some(Side::Opponent));

    for events in [&mut host_events, &mut guest_events] {
        wait_for(events, |e| matches!(e, SessionEvent::MatchStarted { .. })).await;
    }
    let ((host_ending, _), (guest_ending, _)) = tokio::join!(
        drive(&host_handle, &mut host_events),
        drive(&guest_handle, &mut guest_events)
    );
    assert_eq!(host_ending.reason, EndReason::Bankruptcy);
    assert_eq!(guest_ending.reason, EndReason::Bankruptcy);
}

#[tokio::test]
async fn test_rematch_dealt_while_guest_still_resolving() {
    let ((host_handle, mut host_events), (guest_handle, mut guest_events)) =
        connected_pair_with(SessionConfig::default().without_delays(), paced(), deck(&[90, 10]))
            .await;

    let host_side = async {
        let (ending, _) = drive(&host_handle, &mut host_events).await;
        host_handle.send(SessionCommand::Restart).await.unwrap();
        ending
    };
    let (host_ending, (guest_ending, _)) =
        tokio::join!(host_side, drive(&guest_handle, &mut guest_events));
    assert_eq!(host_ending.winner, Some(Side::Me));
    assert_eq!(guest_ending.winner, Some(Side::Opponent));

    for events in [&mut host_events, &mut guest_events] {
        wait_for(events, |e| matches!(e, SessionEvent::MatchStarted { .. })).await;
    }
    // The guest's ack for the first match must not end the rematch early.
    let ((host_ending, host_rounds), (guest_ending, _)) = tokio::join!(
        drive(&host_handle, &mut host_events),
        drive(&guest_handle, &mut guest_events)
    );
    assert_eq!(host_ending.reason, EndReason::Bankruptcy);
    assert_eq!(guest_ending.reason, EndReason::Bankruptcy);
    assert_eq!(host_rounds.len(), 1);
}

#[tokio::test]
async fn test_malformed_frame_ends_match_without_winner() {
    let (host_handle, mut host_events) = start(deck(&[10, 20, 30, 40]));
    let peer_id = host(&host_handle, &mut host_events).await;
    let mut raw = TcpStream::connect(peer_id.as_str()).await.unwrap();
    wait_for(&mut host_events, |e| matches!(e, SessionEvent::MatchStarted { .. })).await;

    raw.write_all(&[3, 0, 0, 0, 0xff, 0xff, 0xff]).await.unwrap();

    let SessionEvent::MatchOver(ending) =
        wait_for(&mut host_events, |e| matches!(e, SessionEvent::MatchOver(_))).await
    else {
        unreachable!()
    };
    assert_eq!(ending.winner, None);
    assert_eq!(ending.reason, EndReason::Desync);
}

#[tokio::test]
async fn test_guest_sees_host_deal() {
    let (host_handle, mut host_events) = start(deck(&[10, 20, 30, 40]));
    let (guest_handle, mut guest_events) = start(Vec::new());
    let peer_id = host(&host_handle, &mut host_events).await;
    guest_handle
        .send(SessionCommand::Connect(peer_id))
        .await
        .unwrap();

    let connected = wait_for(&mut guest_events, |e| {
        matches!(e, SessionEvent::Connected { .. })
    })
    .await;
    assert!(matches!(
        connected,
        SessionEvent::Connected {
            role: Role::Guest,
            ..
        }
    ));
    let SessionEvent::MatchStarted { match_id, mode, .. } =
        wait_for(&mut guest_events, |e| matches!(e, SessionEvent::MatchStarted { .. })).await
    else {
        unreachable!()
    };
    assert!(match_id.is_some());
    assert_eq!(mode, MatchMode::Duel(Role::Guest));

    let SessionEvent::StateChanged(view) = wait_for(&mut guest_events, |e| {
        matches!(e, SessionEvent::StateChanged(_))
    })
    .await
    else {
        unreachable!()
    };
    assert_eq!(view.status, MatchStatus::InProgress);
    assert_eq!(view.self_card.unwrap().login, "dev2");
    assert_eq!(view.self_deck_size, 1);
    assert_eq!(view.opponent_deck_count, 1);
}

#[tokio::test]
async fn test_disconnect_awards_the_match() {
    let ((_host_handle, mut host_events), (guest_handle, _guest_events)) =
        connected_pair(deck(&[10, 20, 30, 40, 50, 60])).await;

    guest_handle.send(SessionCommand::Quit).await.unwrap();

    let SessionEvent::MatchOver(ending) =
        wait_for(&mut host_events, |e| matches!(e, SessionEvent::MatchOver(_))).await
    else {
        unreachable!()
    };
    assert_eq!(ending.winner, Some(Side::Me));
    assert_eq!(ending.reason, EndReason::Disconnect);
}

#[tokio::test]
async fn test_busy_host_rejects_second_guest() {
    let (host_handle, mut host_events) = start(deck(&[10, 20, 30, 40]));
    let (guest_handle, mut guest_events) = start(Vec::new());
    let peer_id = host(&host_handle, &mut host_events).await;
    guest_handle
        .send(SessionCommand::Connect(peer_id.clone()))
        .await
        .unwrap();
    wait_for(&mut guest_events, |e| {
        matches!(e, SessionEvent::MatchStarted { .. })
    })
    .await;

    let (late_handle, mut late_events) = start(Vec::new());
    late_handle
        .send(SessionCommand::Connect(peer_id))
        .await
        .unwrap();
    wait_for(&mut late_events, |e| matches!(e, SessionEvent::Lobby)).await;

    // The first guest's match is untouched.
    guest_handle.send(SessionCommand::Restart).await.unwrap();
    let SessionEvent::Notice { message, .. } =
        wait_for(&mut guest_events, |e| matches!(e, SessionEvent::Notice { .. })).await
    else {
        unreachable!()
    };
    assert!(message.contains("in progress"));
}

// === Lobby Tests ===

#[tokio::test]
async fn test_connect_to_own_id_is_refused() {
    let (handle, mut events) = start(Vec::new());
    let peer_id = host(&handle, &mut events).await;
    handle
        .send(SessionCommand::Connect(peer_id))
        .await
        .unwrap();
    let SessionEvent::Notice { message, persistent } =
        wait_for(&mut events, |e| matches!(e, SessionEvent::Notice { .. })).await
    else {
        unreachable!()
    };
    assert!(message.contains("own id"));
    assert!(!persistent);
}

#[tokio::test]
async fn test_unreachable_peer_returns_to_lobby() {
    // Find a port nobody listens on.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let (handle, mut events) = start(Vec::new());
    handle
        .send(SessionCommand::Connect(PeerId::from(addr)))
        .await
        .unwrap();
    let SessionEvent::Notice { persistent, .. } =
        wait_for(&mut events, |e| matches!(e, SessionEvent::Notice { .. })).await
    else {
        unreachable!()
    };
    assert!(!persistent);
    wait_for(&mut events, |e| matches!(e, SessionEvent::Lobby)).await;
}

#[tokio::test]
async fn test_bind_failure_is_a_persistent_notice() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let config = SessionConfig {
        bind_addr: taken.local_addr().unwrap().to_string(),
        ..SessionConfig::default()
    };
    let (handle, mut events) = start_with(config, Vec::new());
    handle.send(SessionCommand::Host).await.unwrap();
    let SessionEvent::Notice { persistent, .. } =
        wait_for(&mut events, |e| matches!(e, SessionEvent::Notice { .. })).await
    else {
        unreachable!()
    };
    assert!(persistent);
}

#[tokio::test]
async fn test_rematch_after_disconnect_is_refused() {
    let ((host_handle, mut host_events), (guest_handle, _guest_events)) =
        connected_pair(deck(&[10, 20])).await;
    guest_handle.send(SessionCommand::Leave).await.unwrap();
    wait_for(&mut host_events, |e| matches!(e, SessionEvent::MatchOver(_))).await;

    host_handle.send(SessionCommand::Restart).await.unwrap();
    wait_for(&mut host_events, |e| {
        matches!(e, SessionEvent::Notice { message, .. } if message.contains("has left"))
    })
    .await;
}
