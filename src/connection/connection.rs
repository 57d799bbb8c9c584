use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use bytes::BytesMut;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio_util::codec::{Framed, FramedParts};

use crate::error::{Error, ErrorKind, Result};
use crate::message::MessageCodec;
use crate::proto::Endianness;
use crate::sasl::{
    client_handshake, server_handshake, Auth, ClientHandshake, Guid, Mechanism, ServerHandshake,
};
use crate::Message;

/// The state of a [`Connection`].
///
/// States only ever advance, and [`ConnectionState::Closed`] is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum ConnectionState {
    /// The connection task has not started yet.
    Connecting,
    /// The SASL handshake is in progress.
    Handshaking,
    /// Messages are flowing.
    Connected,
    /// The stream has been closed or failed.
    Closed,
}

/// An event produced by a [`Connection`].
#[derive(Debug)]
#[non_exhaustive]
pub enum Event {
    /// The handshake completed, with the guid of the server if one was
    /// performed.
    Connected(Option<Guid>),
    /// A fully framed incoming message.
    Message(Message),
    /// The connection failed. This is always followed by [`Event::Closed`].
    Error(Error),
    /// The connection closed. No further events are produced.
    Closed,
}

/// The receiving half of a [`Connection`], yielding events in the order they
/// happened on the wire.
#[derive(Debug)]
pub struct Events {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl Events {
    /// Receive the next event.
    ///
    /// Returns `None` once the connection has closed and every event has
    /// been delivered.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Wait until the connection is established.
    ///
    /// Any failure to establish the connection, such as a rejected
    /// handshake, is returned here.
    pub async fn connected(&mut self) -> Result<Option<Guid>> {
        loop {
            match self.recv().await {
                Some(Event::Connected(guid)) => return Ok(guid),
                Some(Event::Error(error)) => return Err(error),
                Some(Event::Message(..)) => continue,
                Some(Event::Closed) | None => return Err(ErrorKind::ConnectionClosed.into()),
            }
        }
    }
}

pub(crate) enum Role {
    Client(Vec<Auth>),
    Server(Guid, Vec<Mechanism>),
}

pub(crate) struct Options {
    pub(crate) role: Role,
    pub(crate) handshake: bool,
    pub(crate) endianness: Endianness,
}

enum Command {
    Send(Message),
    Close,
}

pub(super) struct Shared {
    tx: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
    guid: Arc<OnceLock<Guid>>,
    pub(super) serial: AtomicU32,
}

/// A handle to a D-Bus connection over a byte stream.
///
/// The stream is owned by a background task which performs the handshake
/// and then frames messages in both directions. Handles are cheap to clone,
/// and the connection is shut down once every handle has been dropped or
/// [`Connection::close`] is called.
///
/// Connections are constructed through a
/// [`ConnectionBuilder`](super::ConnectionBuilder).
#[derive(Clone)]
pub struct Connection {
    pub(super) shared: Arc<Shared>,
}

impl Connection {
    /// Spawn the task driving `stream`.
    pub(crate) fn spawn<S>(stream: S, options: Options) -> (Connection, Events)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, commands) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(ConnectionState::Connecting);
        let guid = Arc::new(OnceLock::new());

        let task = Task {
            commands,
            events: events_tx,
            state: state_tx,
            guid: guid.clone(),
        };

        tokio::spawn(task.run(stream, options));

        let shared = Arc::new(Shared {
            tx,
            state,
            guid,
            serial: AtomicU32::new(1),
        });

        (Connection { shared }, Events { rx: events_rx })
    }

    /// The current state of the connection.
    #[inline]
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// The guid of the server, once the handshake has completed.
    #[inline]
    pub fn guid(&self) -> Option<&Guid> {
        self.shared.guid.get()
    }

    /// Allocate the next serial for an outgoing message.
    ///
    /// Serials start at 1 and skip 0 when the counter wraps around.
    pub fn next_serial(&self) -> NonZeroU32 {
        loop {
            let serial = self.shared.serial.fetch_add(1, Ordering::Relaxed);

            if let Some(serial) = NonZeroU32::new(serial) {
                return serial;
            }
        }
    }

    /// Queue a message to be sent, returning its serial.
    ///
    /// A serial is allocated unless the message already has one. Messages
    /// sent before the handshake completes are sent in order once it has.
    ///
    /// Sending on a closed connection drops the message with a warning.
    pub fn send(&self, message: Message) -> NonZeroU32 {
        let serial = match message.serial() {
            Some(serial) => serial,
            None => self.next_serial(),
        };

        let message = message.with_serial(serial);

        if self.state() == ConnectionState::Closed
            || self.shared.tx.send(Command::Send(message)).is_err()
        {
            tracing::warn!(serial = serial.get(), "connection is closed, dropping message");
        }

        serial
    }

    /// Close the connection once every message queued before this call has
    /// been sent.
    pub fn close(&self) {
        let _ = self.shared.tx.send(Command::Close);
    }

    /// Wait until the connection is closed.
    pub async fn closed(&self) {
        let mut state = self.shared.state.clone();
        let _ = state.wait_for(|state| *state == ConnectionState::Closed).await;
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .field("guid", &self.guid())
            .finish_non_exhaustive()
    }
}

struct Task {
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<Event>,
    state: watch::Sender<ConnectionState>,
    guid: Arc<OnceLock<Guid>>,
}

impl Task {
    async fn run<S>(mut self, stream: S, options: Options)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if let Err(error) = self.drive(stream, options).await {
            tracing::error!(%error, "connection failed");
            let _ = self.events.send(Event::Error(error));
        }

        self.set_state(ConnectionState::Closed);
        let _ = self.events.send(Event::Closed);
    }

    fn set_state(&self, state: ConnectionState) {
        tracing::debug!(?state, "connection state");
        self.state.send_replace(state);
    }

    async fn drive<S>(&mut self, mut stream: S, options: Options) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let read_buf = if options.handshake {
            self.set_state(ConnectionState::Handshaking);
            self.handshake(&mut stream, options.role).await?
        } else {
            BytesMut::new()
        };

        self.set_state(ConnectionState::Connected);
        let _ = self.events.send(Event::Connected(self.guid.get().cloned()));

        let mut parts = FramedParts::new(stream, MessageCodec::with_endianness(options.endianness));
        parts.read_buf = read_buf;
        let mut framed = Framed::from_parts(parts);

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(Command::Send(message)) = command else {
                        framed.close().await?;
                        return Ok(());
                    };

                    match framed.send(message).await {
                        Ok(()) => {}
                        Err(error) if matches!(error.kind(), ErrorKind::Io(..)) => {
                            return Err(error);
                        }
                        Err(error) => {
                            tracing::warn!(%error, "dropping message which could not be encoded");
                        }
                    }
                }
                message = framed.next() => {
                    let Some(message) = message else {
                        return Ok(());
                    };

                    let _ = self.events.send(Event::Message(message?));
                }
            }
        }
    }

    async fn handshake<S>(&mut self, stream: &mut S, role: Role) -> Result<BytesMut>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (guid, read_buf) = match role {
            Role::Client(auth) => client_handshake(stream, ClientHandshake::new(auth)).await?,
            Role::Server(guid, mechanisms) => {
                let handshake = ServerHandshake::new(guid.clone(), mechanisms);
                (guid, server_handshake(stream, handshake).await?)
            }
        };

        let _ = self.guid.set(guid);
        Ok(read_buf)
    }
}
