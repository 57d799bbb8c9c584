use std::borrow::Cow;
use std::env;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{ErrorKind, Result};
use crate::proto::Endianness;
use crate::sasl::{Auth, Guid, Mechanism};
use crate::Bus;

use super::connection::{Options, Role};
use super::{Connection, Events, Transport};

const ENV_STARTER_BUS: &str = "DBUS_STARTER_ADDRESS";
const ENV_SESSION_BUS: &str = "DBUS_SESSION_BUS_ADDRESS";
const ENV_SYSTEM_BUS: &str = "DBUS_SYSTEM_BUS_ADDRESS";
const DEFAULT_SYSTEM_BUS: &str = "unix:path=/var/run/dbus/system_bus_socket";

#[derive(Debug, Clone)]
enum Target {
    Session,
    System,
    Starter,
    Address(Box<str>),
}

impl Target {
    fn address(&self) -> Result<Cow<'_, str>> {
        match self {
            Target::Session => from_env(ENV_SESSION_BUS, None),
            Target::System => from_env(ENV_SYSTEM_BUS, Some(DEFAULT_SYSTEM_BUS)),
            Target::Starter => from_env(ENV_STARTER_BUS, None),
            Target::Address(address) => Ok(Cow::Borrowed(&**address)),
        }
    }
}

fn from_env(env: &str, default: Option<&'static str>) -> Result<Cow<'static, str>> {
    match env::var(env) {
        Ok(address) => Ok(Cow::Owned(address)),
        Err(..) => match default {
            Some(default) => Ok(Cow::Borrowed(default)),
            None => Err(ErrorKind::MissingBus.into()),
        },
    }
}

/// Builder of a [`Connection`] or a [`Bus`].
///
/// # Examples
///
/// ```no_run
/// use dbus_peer::ConnectionBuilder;
///
/// # #[tokio::main] async fn main() -> dbus_peer::Result<()> {
/// let bus = ConnectionBuilder::new().system_bus().bus().await?;
/// println!("{:?}", bus.name());
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionBuilder {
    target: Target,
    server: bool,
    handshake: bool,
    auth: Option<Vec<Auth>>,
    guid: Option<Guid>,
    mechanisms: Vec<Mechanism>,
    direct: bool,
    endianness: Endianness,
}

impl ConnectionBuilder {
    /// Construct a new connection builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbus_peer::ConnectionBuilder;
    ///
    /// let c = ConnectionBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            target: Target::Session,
            server: false,
            handshake: true,
            auth: None,
            guid: None,
            mechanisms: vec![Mechanism::External, Mechanism::Anonymous],
            direct: false,
            endianness: Endianness::NATIVE,
        }
    }

    /// Connect to the session bus (default).
    ///
    /// The address is read from `DBUS_SESSION_BUS_ADDRESS`.
    pub fn session_bus(&mut self) -> &mut Self {
        self.target = Target::Session;
        self
    }

    /// Connect to the system bus.
    ///
    /// The address is read from `DBUS_SYSTEM_BUS_ADDRESS`, falling back to
    /// `unix:path=/var/run/dbus/system_bus_socket`.
    pub fn system_bus(&mut self) -> &mut Self {
        self.target = Target::System;
        self
    }

    /// Connect to the bus which started this process.
    ///
    /// The address is read from `DBUS_STARTER_ADDRESS`.
    pub fn starter_bus(&mut self) -> &mut Self {
        self.target = Target::Starter;
        self
    }

    /// Connect to an explicit, `;` separated list of addresses.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dbus_peer::ConnectionBuilder;
    ///
    /// # #[tokio::main] async fn main() -> dbus_peer::Result<()> {
    /// let (c, events) = ConnectionBuilder::new()
    ///     .address("unix:path=/tmp/peer;tcp:port=4000")
    ///     .direct(true)
    ///     .connect()
    ///     .await?;
    /// # Ok(()) }
    /// ```
    pub fn address(&mut self, address: &str) -> &mut Self {
        self.target = Target::Address(address.into());
        self
    }

    /// Act as the server side of the handshake.
    pub fn server(&mut self, server: bool) -> &mut Self {
        self.server = server;
        self
    }

    /// Perform the SASL handshake (default). Disabling it starts framing
    /// messages right away.
    pub fn handshake(&mut self, handshake: bool) -> &mut Self {
        self.handshake = handshake;
        self
    }

    /// Authentication methods a client tries, in order.
    ///
    /// Defaults to [`Auth::defaults`].
    pub fn auth(&mut self, auth: impl IntoIterator<Item = Auth>) -> &mut Self {
        self.auth = Some(auth.into_iter().collect());
        self
    }

    /// The guid a server presents. A random one is generated per connection
    /// if unset.
    pub fn guid(&mut self, guid: Guid) -> &mut Self {
        self.guid = Some(guid);
        self
    }

    /// Mechanisms a server accepts.
    pub fn mechanisms(&mut self, mechanisms: impl IntoIterator<Item = Mechanism>) -> &mut Self {
        self.mechanisms = mechanisms.into_iter().collect();
        self
    }

    /// Talk directly to a peer instead of a bus daemon, which skips the
    /// `Hello` call when constructing a [`Bus`].
    pub fn direct(&mut self, direct: bool) -> &mut Self {
        self.direct = direct;
        self
    }

    /// The byte order of outgoing messages.
    pub fn endianness(&mut self, endianness: Endianness) -> &mut Self {
        self.endianness = endianness;
        self
    }

    fn options(&self) -> Options {
        let role = if self.server {
            let guid = self.guid.clone().unwrap_or_else(Guid::random);
            Role::Server(guid, self.mechanisms.clone())
        } else {
            Role::Client(self.auth.clone().unwrap_or_else(Auth::defaults))
        };

        Options {
            role,
            handshake: self.handshake,
            endianness: self.endianness,
        }
    }

    /// Construct a connection over an already established stream.
    ///
    /// This returns immediately. Messages sent before the handshake has
    /// completed are queued.
    ///
    /// # Examples
    ///
    /// ```
    /// use dbus_peer::ConnectionBuilder;
    ///
    /// # #[tokio::main] async fn main() -> dbus_peer::Result<()> {
    /// let (a, b) = tokio::io::duplex(4096);
    ///
    /// let (server, mut server_events) = ConnectionBuilder::new().server(true).build(a);
    /// let (client, mut client_events) = ConnectionBuilder::new().build(b);
    ///
    /// let guid = client_events.connected().await?;
    /// assert_eq!(guid.as_ref(), server_events.connected().await?.as_ref());
    /// # Ok(()) }
    /// ```
    pub fn build<S>(&self, stream: S) -> (Connection, Events)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        Connection::spawn(stream, self.options())
    }

    /// Resolve the configured address and connect to it, waiting for the
    /// handshake to complete.
    pub async fn connect(&self) -> Result<(Connection, Events)> {
        let address = self.target.address()?;
        let transport = Transport::connect(&address).await?;
        let (connection, mut events) = self.build(transport);
        events.connected().await?;
        Ok((connection, events))
    }

    /// Connect and start a [`Bus`] over the connection.
    ///
    /// Unless [`direct`](Self::direct) is set, the bus registers itself with
    /// `Hello` before this returns.
    pub async fn bus(&self) -> Result<Bus> {
        let (connection, events) = self.connect().await?;
        self.start_bus(connection, events).await
    }

    /// Start a [`Bus`] over an already established stream.
    pub async fn bus_with_stream<S>(&self, stream: S) -> Result<Bus>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (connection, mut events) = self.build(stream);
        events.connected().await?;
        self.start_bus(connection, events).await
    }

    async fn start_bus(&self, connection: Connection, events: Events) -> Result<Bus> {
        let bus = Bus::new(connection, events);

        if !self.direct {
            bus.hello().await?;
        }

        Ok(bus)
    }
}

impl Default for ConnectionBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
