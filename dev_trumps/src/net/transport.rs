//! TCP transport between two peers.
//!
//! A host binds a [`PeerListener`] whose address is its shareable [`PeerId`].
//! A guest dials that id with [`connect`]. Either way the stream is wrapped in
//! a [`Connection`], which frames [`PeerMessage`]s on background reader and
//! writer tasks and reports what happens as [`ConnectionEvent`]s.

use log::{debug, warn};
use std::{fmt, io, net::SocketAddr, str::FromStr, time::Duration};
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::mpsc,
    task::JoinHandle,
};

use super::{
    errors::TransportError,
    messages::PeerMessage,
    utils::{read_prefixed, write_prefixed},
};

/// Address a remote peer dials to reach a host (`host:port`).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PeerId(String);

impl PeerId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<SocketAddr> for PeerId {
    fn from(value: SocketAddr) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for PeerId {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                Ok(Self(trimmed.to_string()))
            }
            _ => Err(TransportError::InvalidPeerId(s.to_string())),
        }
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accepts incoming peers.
#[derive(Debug)]
pub struct PeerListener {
    id: PeerId,
    listener: TcpListener,
}

impl PeerListener {
    /// Bind `addr`. The bound address becomes this client's [`PeerId`].
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let bind_error = |source: io::Error| TransportError::Bind {
            addr: addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let id = PeerId::from(listener.local_addr().map_err(bind_error)?);
        debug!("listening for peers on {id}");
        Ok(Self { id, listener })
    }

    #[must_use]
    pub fn id(&self) -> &PeerId {
        &self.id
    }

    /// Wait for the next peer. Cancel safe.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), TransportError> {
        Ok(self.listener.accept().await?)
    }
}

/// Dial `peer`, giving up after `timeout`.
pub async fn connect(peer: &PeerId, timeout: Duration) -> Result<TcpStream, TransportError> {
    match tokio::time::timeout(timeout, TcpStream::connect(peer.as_str())).await {
        Ok(Ok(stream)) => {
            stream.set_nodelay(true)?;
            Ok(stream)
        }
        Ok(Err(source)) => Err(TransportError::PeerUnavailable {
            peer: peer.to_string(),
            source,
        }),
        Err(_) => Err(TransportError::Timeout(peer.to_string())),
    }
}

/// Something that happened on a [`Connection`].
#[derive(Debug, Eq, PartialEq)]
pub enum ConnectionEvent {
    Message(PeerMessage),
    /// The stream failed. Always followed by [`ConnectionEvent::Closed`].
    Error(String),
    /// The peer sent a frame that isn't a valid message. Always followed by
    /// [`ConnectionEvent::Closed`].
    Malformed(String),
    /// The peer went away. No further events follow.
    Closed,
}

/// A framed, ordered message channel to one peer.
#[derive(Debug)]
pub struct Connection {
    peer: String,
    outbound: mpsc::UnboundedSender<PeerMessage>,
    events: mpsc::UnboundedReceiver<ConnectionEvent>,
    reader: JoinHandle<()>,
}

impl Connection {
    /// Start framing messages over an already open stream.
    pub fn open<S>(stream: S, peer: impl Into<String>) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let peer = peer.into();
        let (mut read_half, mut write_half) = tokio::io::split(stream);
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<PeerMessage>();
        let (events_tx, events) = mpsc::unbounded_channel();

        let reader = tokio::spawn(async move {
            loop {
                match read_prefixed::<PeerMessage, _>(&mut read_half).await {
                    Ok(msg) => {
                        if events_tx.send(ConnectionEvent::Message(msg)).is_err() {
                            return;
                        }
                    }
                    Err(error) => {
                        let event = match error.kind() {
                            io::ErrorKind::UnexpectedEof => None,
                            io::ErrorKind::InvalidData => {
                                Some(ConnectionEvent::Malformed(error.to_string()))
                            }
                            _ => Some(ConnectionEvent::Error(error.to_string())),
                        };
                        if let Some(event) = event {
                            let _ = events_tx.send(event);
                        }
                        let _ = events_tx.send(ConnectionEvent::Closed);
                        return;
                    }
                }
            }
        });

        // Runs until every sender is gone so queued messages are flushed
        // before the write half shuts down.
        let writer_peer = peer.clone();
        tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                if let Err(error) = write_prefixed(&mut write_half, &msg).await {
                    warn!("failed to send {} to {writer_peer}: {error}", msg.kind());
                    return;
                }
            }
            let _ = write_half.shutdown().await;
        });

        Self {
            peer,
            outbound,
            events,
            reader,
        }
    }

    #[must_use]
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Queue `msg` for the peer.
    pub fn send(&self, msg: PeerMessage) -> Result<(), TransportError> {
        debug!("-> {}: {msg}", self.peer);
        self.outbound
            .send(msg)
            .map_err(|_| TransportError::Closed)
    }

    /// Next event from the peer, or `None` once the reader is gone. Cancel
    /// safe.
    pub async fn next_event(&mut self) -> Option<ConnectionEvent> {
        self.events.recv().await
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Card;
    use tokio::io::duplex;

    fn reveal(login: &str, deck_count: usize) -> PeerMessage {
        PeerMessage::Reveal {
            card: Card::new(login, [1, 2, 3, 4, 5, 6]).unwrap(),
            deck_count,
        }
    }

    #[test]
    fn test_peer_id_parse() {
        assert!("127.0.0.1:7000".parse::<PeerId>().is_ok());
        assert!("localhost:7000".parse::<PeerId>().is_ok());
        assert!("[::1]:7000".parse::<PeerId>().is_ok());
        assert!("localhost".parse::<PeerId>().is_err());
        assert!(":7000".parse::<PeerId>().is_err());
        assert!("host:99999".parse::<PeerId>().is_err());
    }

    #[tokio::test]
    async fn test_messages_arrive_in_order() {
        let (a, b) = duplex(64 * 1024);
        let left = Connection::open(a, "left");
        let mut right = Connection::open(b, "right");
        for i in 0..10 {
            left.send(reveal(&format!("dev{i}"), i)).unwrap();
        }
        for i in 0..10 {
            assert_eq!(
                right.next_event().await,
                Some(ConnectionEvent::Message(reveal(&format!("dev{i}"), i)))
            );
        }
    }

    #[tokio::test]
    async fn test_drop_flushes_then_closes() {
        let (a, b) = duplex(64 * 1024);
        let left = Connection::open(a, "left");
        let mut right = Connection::open(b, "right");
        left.send(PeerMessage::GameOverAck).unwrap();
        drop(left);
        assert_eq!(
            right.next_event().await,
            Some(ConnectionEvent::Message(PeerMessage::GameOverAck))
        );
        assert_eq!(right.next_event().await, Some(ConnectionEvent::Closed));
    }

    #[tokio::test]
    async fn test_garbage_reports_malformed_then_close() {
        let (mut raw, b) = duplex(1024);
        let mut conn = Connection::open(b, "raw");
        raw.write_all(&1u32.to_le_bytes()).await.unwrap();
        raw.write_all(&[250]).await.unwrap();
        assert!(matches!(
            conn.next_event().await,
            Some(ConnectionEvent::Malformed(_))
        ));
        assert_eq!(conn.next_event().await, Some(ConnectionEvent::Closed));
    }

    #[tokio::test]
    async fn test_tcp_listener_and_connect() {
        let listener = PeerListener::bind("127.0.0.1:0").await.unwrap();
        let id = listener.id().clone();
        let dial = tokio::spawn(async move { connect(&id, Duration::from_secs(5)).await });
        let (stream, addr) = listener.accept().await.unwrap();
        let host = Connection::open(stream, addr.to_string());
        let mut guest = Connection::open(dial.await.unwrap().unwrap(), listener.id().to_string());
        host.send(PeerMessage::Restart).unwrap();
        assert_eq!(
            guest.next_event().await,
            Some(ConnectionEvent::Message(PeerMessage::Restart))
        );
    }

    #[tokio::test]
    async fn test_connect_refused_is_unavailable() {
        // Bind then drop to find a port nobody listens on.
        let id = {
            let listener = PeerListener::bind("127.0.0.1:0").await.unwrap();
            listener.id().clone()
        };
        let error = connect(&id, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(error, TransportError::PeerUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_bind_failure_is_persistent() {
        let taken = PeerListener::bind("127.0.0.1:0").await.unwrap();
        let error = PeerListener::bind(taken.id().as_str()).await.unwrap_err();
        assert!(error.is_persistent());
        assert!(!TransportError::Closed.is_persistent());
    }
}
