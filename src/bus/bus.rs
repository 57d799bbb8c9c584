use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, OnceLock};

use tokio::sync::{mpsc, oneshot};

use crate::connection::{Connection, ConnectionBuilder, Events};
use crate::error::{ErrorKind, Result};
use crate::object::{Interface, Registry, SignalEmitter};
use crate::message::write_message;
use crate::proto::{Endianness, Flags};
use crate::utils::lock;
use crate::{Message, MessageKind, ObjectPath, Value};

use super::{dispatch, standard};

pub(super) type Reply = Result<Vec<Value>>;

/// Calls waiting for a reply, keyed by serial.
#[derive(Default)]
pub(super) struct Pending {
    calls: HashMap<NonZeroU32, oneshot::Sender<Reply>>,
    closed: bool,
}

impl Pending {
    pub(super) fn take(&mut self, serial: NonZeroU32) -> Option<oneshot::Sender<Reply>> {
        self.calls.remove(&serial)
    }

    /// Fail every pending call and refuse new ones.
    pub(super) fn close(&mut self) {
        self.closed = true;

        for (serial, tx) in self.calls.drain() {
            tracing::debug!(serial = serial.get(), "failing pending call");
            let _ = tx.send(Err(ErrorKind::ConnectionClosed.into()));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct SignalKey {
    path: ObjectPath,
    interface: Box<str>,
    member: Box<str>,
}

impl SignalKey {
    pub(super) fn of(message: &Message) -> Option<Self> {
        Some(Self {
            path: message.path()?.clone(),
            interface: message.interface()?.into(),
            member: message.member()?.into(),
        })
    }
}

pub(super) struct Shared {
    pub(super) pending: Mutex<Pending>,
    pub(super) signals: Mutex<HashMap<SignalKey, Vec<mpsc::UnboundedSender<Message>>>>,
    pub(super) registry: Mutex<Registry>,
    name: OnceLock<Box<str>>,
}

/// A D-Bus peer on top of a [`Connection`].
///
/// The bus correlates replies with the calls that caused them, delivers
/// signals to subscribers and answers method calls to exported objects.
/// Incoming messages are processed in the order they arrive by a background
/// task, which keeps the connection open until the peer disconnects or
/// [`Bus::close`] is called.
///
/// # Examples
///
/// ```no_run
/// use dbus_peer::{Bus, Message, ObjectPath};
///
/// # #[tokio::main] async fn main() -> dbus_peer::Result<()> {
/// let bus = Bus::session_bus().await?;
///
/// let call = Message::method_call(ObjectPath::new("/org/freedesktop/DBus")?, "ListNames")
///     .with_destination("org.freedesktop.DBus")
///     .with_interface("org.freedesktop.DBus");
///
/// let body = bus.invoke(call).await?;
/// println!("{body:?}");
/// # Ok(()) }
/// ```
#[derive(Clone)]
pub struct Bus {
    pub(super) connection: Connection,
    pub(super) shared: Arc<Shared>,
}

impl Bus {
    /// Start a bus over a connection without registering with a bus daemon.
    ///
    /// See [`Bus::hello`] for registering.
    pub fn new(connection: Connection, events: Events) -> Self {
        let bus = Self {
            connection,
            shared: Arc::new(Shared {
                pending: Mutex::new(Pending::default()),
                signals: Mutex::new(HashMap::new()),
                registry: Mutex::new(Registry::default()),
                name: OnceLock::new(),
            }),
        };

        // Keep file reads off the dispatch task.
        tokio::task::spawn_blocking(standard::machine_id);
        tokio::spawn(dispatch::run(bus.clone(), events));
        bus
    }

    /// Shorthand for connecting to the session bus using the default
    /// configuration.
    #[inline]
    pub async fn session_bus() -> Result<Self> {
        ConnectionBuilder::new().session_bus().bus().await
    }

    /// Shorthand for connecting to the system bus using the default
    /// configuration.
    #[inline]
    pub async fn system_bus() -> Result<Self> {
        ConnectionBuilder::new().system_bus().bus().await
    }

    /// The underlying connection.
    #[inline]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// The unique name assigned by the bus daemon, once registered.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.shared.name.get().map(|name| &**name)
    }

    pub(crate) fn set_name(&self, name: &str) {
        let _ = self.shared.name.set(name.into());
    }

    /// Send a method call and wait for its reply.
    ///
    /// Resolves with the full body of the method return, or fails with
    /// [`ErrorKind::Remote`] if the peer replied with an error. Calls
    /// flagged with [`Flags::NO_REPLY_EXPECTED`] resolve with an empty body
    /// as soon as they are queued.
    ///
    /// Fails with [`ErrorKind::NotMethodCall`] for any other kind of message,
    /// and with the encoding error if the message cannot be written.
    ///
    /// There is no timeout. Dropping the future abandons the call.
    pub async fn invoke(&self, message: Message) -> Result<Vec<Value>> {
        if !matches!(message.kind(), MessageKind::MethodCall { .. }) {
            return Err(ErrorKind::NotMethodCall.into());
        }

        let serial = match message.serial() {
            Some(serial) => serial,
            None => self.connection.next_serial(),
        };

        let message = message.with_serial(serial);

        // The connection task drops messages it cannot encode, so catch them
        // before anything waits on a reply.
        write_message(&message, Endianness::NATIVE, &mut Vec::new())?;

        if message.flags() & Flags::NO_REPLY_EXPECTED {
            self.connection.send(message);
            return Ok(Vec::new());
        }

        let rx = {
            let mut pending = lock(&self.shared.pending);

            if pending.closed {
                return Err(ErrorKind::ConnectionClosed.into());
            }

            let (tx, rx) = oneshot::channel();
            pending.calls.insert(serial, tx);
            rx
        };

        self.connection.send(message);

        match rx.await {
            Ok(reply) => reply,
            Err(..) => Err(ErrorKind::ConnectionClosed.into()),
        }
    }

    /// Subscribe to signals with exactly the given path, interface and
    /// member.
    ///
    /// Matching happens locally. Receiving signals from a bus daemon also
    /// requires a match rule, see [`Bus::add_match`].
    pub fn subscribe(&self, path: ObjectPath, interface: &str, member: &str) -> Subscription {
        let key = SignalKey {
            path,
            interface: interface.into(),
            member: member.into(),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.shared.signals).entry(key).or_default().push(tx);
        Subscription { rx }
    }

    /// Deliver a signal to local subscribers.
    pub(super) fn deliver(&self, message: &Message) {
        let Some(key) = SignalKey::of(message) else {
            return;
        };

        let mut signals = lock(&self.shared.signals);

        let Some(subscribers) = signals.get_mut(&key) else {
            tracing::trace!(?key, "signal without subscribers");
            return;
        };

        subscribers.retain(|tx| tx.send(message.clone()).is_ok());

        if subscribers.is_empty() {
            signals.remove(&key);
        }
    }

    /// Deliver a signal locally and send it to the peer.
    pub(crate) fn emit(&self, message: Message) {
        self.deliver(&message);
        self.connection.send(message);
    }

    /// Send a signal to the peer, deriving its signature from the body.
    pub fn send_signal(
        &self,
        path: ObjectPath,
        interface: &str,
        member: &str,
        body: Vec<Value>,
    ) -> Result<()> {
        let message = Message::signal(path, interface, member).with_values(body)?;
        self.connection.send(message);
        Ok(())
    }

    /// Reply to a method call, deriving the signature from the body.
    ///
    /// Nothing is sent if the call does not expect a reply.
    pub fn send_reply(&self, call: &Message, body: Vec<Value>) -> Result<()> {
        if call.flags() & Flags::NO_REPLY_EXPECTED {
            return Ok(());
        }

        let Some(reply) = call.reply() else {
            return Err(ErrorKind::ZeroSerial.into());
        };

        self.connection.send(reply.with_values(body)?);
        Ok(())
    }

    /// Reply to a method call with an error.
    ///
    /// Nothing is sent if the call does not expect a reply.
    pub fn send_error(&self, call: &Message, name: &str, message: &str) -> Result<()> {
        if call.flags() & Flags::NO_REPLY_EXPECTED {
            return Ok(());
        }

        let Some(reply) = call.error_reply(name) else {
            return Err(ErrorKind::ZeroSerial.into());
        };

        self.connection.send(reply.with_values(vec![Value::from(message)])?);
        Ok(())
    }

    /// Export an interface at `path`, replacing any implementation of the
    /// same interface already exported there.
    ///
    /// Returns the emitter for the signals of the interface.
    pub fn export(&self, path: ObjectPath, interface: Interface) -> SignalEmitter {
        let desc = interface.shared_desc().clone();
        let emitter = SignalEmitter::new(self.clone(), path.clone(), desc);

        tracing::debug!(%path, interface = interface.desc().name(), "export");

        if lock(&self.shared.registry)
            .insert(path, Arc::new(interface))
            .is_some()
        {
            tracing::debug!("replaced earlier export");
        }

        emitter
    }

    /// Remove an exported interface, returning whether it was exported.
    pub fn unexport(&self, path: &ObjectPath, interface: &str) -> bool {
        lock(&self.shared.registry).remove(path, interface)
    }

    /// Close the underlying connection.
    pub fn close(&self) {
        self.connection.close();
    }

    /// Wait until the underlying connection is closed.
    pub async fn closed(&self) {
        self.connection.closed().await;
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("connection", &self.connection)
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Signals delivered to a subscription made with [`Bus::subscribe`].
///
/// Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<Message>,
}

impl Subscription {
    /// Receive the next matching signal.
    ///
    /// Returns `None` once the bus has shut down.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }
}
