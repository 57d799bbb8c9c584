use tokio::net::{TcpListener, UnixListener};

use crate::connection::{Address, Connection, ConnectionBuilder, Events, Transport};
use crate::error::{Error, ErrorKind, Result};
use crate::sasl::Guid;
use crate::Bus;

enum Listener {
    Tcp(TcpListener),
    Unix(UnixListener),
}

/// A listener accepting D-Bus peers.
///
/// Every accepted stream becomes an independent server side
/// [`Connection`] which presents the same guid.
///
/// # Examples
///
/// ```no_run
/// use dbus_peer::Server;
///
/// # #[tokio::main] async fn main() -> dbus_peer::Result<()> {
/// let server = Server::bind("tcp:host=127.0.0.1,port=0").await?;
/// println!("listening on {}", server.address()?);
///
/// loop {
///     let bus = server.accept_bus().await?;
///     tokio::spawn(async move { bus.closed().await });
/// }
/// # }
/// ```
pub struct Server {
    listener: Listener,
    address: Address,
    builder: ConnectionBuilder,
}

impl Server {
    /// Bind to the first address in a `;` separated list which succeeds.
    ///
    /// TCP addresses default to `localhost` and port 0. Unix addresses take
    /// either a `path` or an `abstract` name.
    pub async fn bind(addresses: &str) -> Result<Self> {
        let mut last = None;

        for address in Address::parse_list(addresses)? {
            match bind_address(&address).await {
                Ok(listener) => {
                    tracing::debug!(%address, "listening");
                    return Ok(Self::new(listener, address));
                }
                Err(error) => {
                    tracing::debug!(%address, %error, "failed to bind");
                    last = Some(error);
                }
            }
        }

        Err(last.unwrap_or_else(|| Error::new(ErrorKind::InvalidAddress(addresses.into()))))
    }

    fn new(listener: Listener, address: Address) -> Self {
        let mut builder = ConnectionBuilder::new();
        builder.server(true).direct(true).guid(Guid::random());

        Self {
            listener,
            address,
            builder,
        }
    }

    /// Access the builder used to configure accepted connections.
    ///
    /// Accepted connections act as the server side of the handshake and do
    /// not register with a bus daemon.
    pub fn builder(&mut self) -> &mut ConnectionBuilder {
        &mut self.builder
    }

    /// The address peers can connect to, with the actual port filled in for
    /// TCP listeners.
    pub fn address(&self) -> Result<String> {
        match &self.listener {
            Listener::Tcp(listener) => {
                let local = listener.local_addr()?;
                Ok(format!("tcp:host={},port={}", local.ip(), local.port()))
            }
            Listener::Unix(..) => Ok(self.address.to_string()),
        }
    }

    async fn accept_transport(&self) -> Result<Transport> {
        let transport = match &self.listener {
            Listener::Tcp(listener) => {
                let (stream, peer) = listener.accept().await?;
                tracing::debug!(%peer, "accepted");
                stream.set_nodelay(true)?;
                Transport::Tcp(stream)
            }
            Listener::Unix(listener) => {
                let (stream, _) = listener.accept().await?;
                tracing::debug!("accepted");
                Transport::Unix(stream)
            }
        };

        Ok(transport)
    }

    /// Accept the next peer.
    ///
    /// This returns as soon as the stream is accepted. The handshake
    /// completes in the background.
    pub async fn accept(&self) -> Result<(Connection, Events)> {
        let transport = self.accept_transport().await?;
        Ok(self.builder.build(transport))
    }

    /// Accept the next peer and start a [`Bus`] over it once the handshake
    /// has completed.
    pub async fn accept_bus(&self) -> Result<Bus> {
        let transport = self.accept_transport().await?;
        self.builder.bus_with_stream(transport).await
    }
}

async fn bind_address(address: &Address) -> Result<Listener> {
    let invalid = || Error::new(ErrorKind::InvalidAddress(address.to_string().into()));

    match address.transport() {
        "tcp" => {
            let host = address.get("host").unwrap_or("localhost");

            let port = match address.get("port") {
                Some(port) => port.parse::<u16>().map_err(|_| invalid())?,
                None => 0,
            };

            Ok(Listener::Tcp(TcpListener::bind((host, port)).await?))
        }
        "unix" => {
            if let Some(path) = address.get("path") {
                return Ok(Listener::Unix(UnixListener::bind(path)?));
            }

            if let Some(name) = address.get("abstract") {
                return Ok(Listener::Unix(bind_abstract(name)?));
            }

            Err(invalid())
        }
        transport => Err(Error::new(ErrorKind::UnknownAddressFamily(transport.into()))),
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn bind_abstract(name: &str) -> Result<UnixListener> {
    #[cfg(target_os = "android")]
    use std::os::android::net::SocketAddrExt;
    #[cfg(target_os = "linux")]
    use std::os::linux::net::SocketAddrExt;

    let address = std::os::unix::net::SocketAddr::from_abstract_name(name.as_bytes())?;
    let listener = std::os::unix::net::UnixListener::bind_addr(&address)?;
    listener.set_nonblocking(true)?;
    Ok(UnixListener::from_std(listener)?)
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn bind_abstract(_: &str) -> Result<UnixListener> {
    Err(Error::new(ErrorKind::UnknownAddressFamily("unix:abstract".into())))
}
