use std::fmt;
use std::io;
use std::pin::Pin;
use std::process::Stdio;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, Join, ReadBuf};
use tokio::net::{TcpStream, UnixStream};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::error::{Error, ErrorKind, Result};

use super::Address;

/// A byte stream to a peer, resolved from an [`Address`].
#[derive(Debug)]
#[non_exhaustive]
pub enum Transport {
    /// A TCP connection.
    Tcp(TcpStream),
    /// A unix domain socket connection.
    Unix(UnixStream),
    /// The standard input and output of a spawned process.
    Exec(ChildStdio),
}

impl Transport {
    /// Connect to the first address in a `;` separated list which succeeds.
    ///
    /// If every address fails the error of the last one is returned.
    pub async fn connect(addresses: &str) -> Result<Self> {
        let mut last = None;

        for address in Address::parse_list(addresses)? {
            match Self::connect_address(&address).await {
                Ok(transport) => {
                    tracing::debug!(%address, "connected");
                    return Ok(transport);
                }
                Err(error) => {
                    tracing::debug!(%address, %error, "failed to connect");
                    last = Some(error);
                }
            }
        }

        Err(last.unwrap_or_else(|| Error::new(ErrorKind::InvalidAddress(addresses.into()))))
    }

    /// Connect to a single address.
    pub async fn connect_address(address: &Address) -> Result<Self> {
        match address.transport() {
            "tcp" => {
                let host = address.get("host").unwrap_or("localhost");

                let port = address
                    .get("port")
                    .and_then(|port| port.parse::<u16>().ok())
                    .ok_or_else(|| invalid(address))?;

                let stream = TcpStream::connect((host, port)).await?;
                stream.set_nodelay(true)?;
                Ok(Transport::Tcp(stream))
            }
            "unix" => {
                if let Some(path) = address.get("path").or_else(|| address.get("socket")) {
                    return Ok(Transport::Unix(UnixStream::connect(path).await?));
                }

                if let Some(name) = address.get("abstract") {
                    return Ok(Transport::Unix(connect_abstract(name)?));
                }

                Err(invalid(address))
            }
            "unixexec" => {
                let path = address.get("path").ok_or_else(|| invalid(address))?;
                Ok(Transport::Exec(ChildStdio::spawn(path, address)?))
            }
            transport => Err(Error::new(ErrorKind::UnknownAddressFamily(transport.into()))),
        }
    }
}

fn invalid(address: &Address) -> Error {
    Error::new(ErrorKind::InvalidAddress(address.to_string().into()))
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn connect_abstract(name: &str) -> Result<UnixStream> {
    #[cfg(target_os = "android")]
    use std::os::android::net::SocketAddrExt;
    #[cfg(target_os = "linux")]
    use std::os::linux::net::SocketAddrExt;

    let address = std::os::unix::net::SocketAddr::from_abstract_name(name.as_bytes())?;
    let stream = std::os::unix::net::UnixStream::connect_addr(&address)?;
    stream.set_nonblocking(true)?;
    Ok(UnixStream::from_std(stream)?)
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn connect_abstract(_: &str) -> Result<UnixStream> {
    Err(Error::new(ErrorKind::UnknownAddressFamily("unix:abstract".into())))
}

/// The standard input and output of a process spawned for a `unixexec`
/// address.
///
/// The process is killed when this is dropped.
pub struct ChildStdio {
    io: Join<ChildStdout, ChildStdin>,
    child: Child,
}

impl ChildStdio {
    fn spawn(path: &str, address: &Address) -> Result<Self> {
        let mut command = Command::new(path);

        if let Some(argv0) = address.get("argv0") {
            command.arg0(argv0);
        }

        for n in 1.. {
            let Some(arg) = address.get(&format!("argv{n}")) else {
                break;
            };

            command.arg(arg);
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe).into());
        };

        Ok(Self {
            io: tokio::io::join(stdout, stdin),
            child,
        })
    }
}

impl fmt::Debug for ChildStdio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildStdio")
            .field("pid", &self.child.id())
            .finish_non_exhaustive()
    }
}

impl AsyncRead for ChildStdio {
    #[inline]
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().io).poll_read(cx, buf)
    }
}

impl AsyncWrite for ChildStdio {
    #[inline]
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().io).poll_write(cx, buf)
    }

    #[inline]
    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().io).poll_flush(cx)
    }

    #[inline]
    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().io).poll_shutdown(cx)
    }
}

macro_rules! delegate {
    ($this:expr, $stream:ident => $expr:expr) => {
        match $this.get_mut() {
            Transport::Tcp($stream) => $expr,
            Transport::Unix($stream) => $expr,
            Transport::Exec($stream) => $expr,
        }
    };
}

impl AsyncRead for Transport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        delegate!(self, stream => Pin::new(stream).poll_read(cx, buf))
    }
}

impl AsyncWrite for Transport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        delegate!(self, stream => Pin::new(stream).poll_write(cx, buf))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        delegate!(self, stream => Pin::new(stream).poll_flush(cx))
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        delegate!(self, stream => Pin::new(stream).poll_shutdown(cx))
    }
}
