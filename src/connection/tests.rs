use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::{ErrorKind, Result};
use crate::sasl::{Auth, Guid, Mechanism};
use crate::{Message, ObjectPath};

use super::*;

fn call(member: &str) -> Message {
    Message::method_call(ObjectPath::root(), member)
}

async fn next_message(events: &mut Events) -> Option<Message> {
    loop {
        match events.recv().await? {
            Event::Message(message) => return Some(message),
            Event::Connected(..) => continue,
            Event::Error(..) | Event::Closed => return None,
        }
    }
}

#[test]
fn parse_addresses() -> Result<()> {
    let addresses = Address::parse_list(
        "unix:path=/run/user/1000/bus,guid=abc;;tcp:host=localhost,port=4000;unixexec:path=/bin/sh,argv1=-c,argv2=echo%20hi",
    )?;

    assert_eq!(addresses.len(), 3);
    assert_eq!(addresses[0].transport(), "unix");
    assert_eq!(addresses[0].get("path"), Some("/run/user/1000/bus"));
    assert_eq!(addresses[0].get("guid"), Some("abc"));
    assert_eq!(addresses[1].get("port"), Some("4000"));
    assert_eq!(addresses[2].get("argv2"), Some("echo hi"));
    assert_eq!(addresses[2].to_string(), "unixexec:path=/bin/sh,argv1=-c,argv2=echo%20hi");

    let params = addresses[1].params().collect::<Vec<_>>();
    assert_eq!(params, [("host", "localhost"), ("port", "4000")]);
    Ok(())
}

#[test]
fn invalid_addresses() {
    for address in ["unix", ":path=/x", "unix:path", "unix:=x", "unix:path=%zz", "unix:path=%2"] {
        let error = Address::parse(address).unwrap_err();
        assert!(
            matches!(error.kind(), ErrorKind::InvalidAddress(..)),
            "{address}: {error}"
        );
    }
}

#[tokio::test]
async fn unknown_transport() {
    let error = Transport::connect("carrier:pigeon=yes").await.unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::UnknownAddressFamily(..)));

    let error = Transport::connect("").await.unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidAddress(..)));
}

#[tokio::test]
async fn last_error_is_returned() {
    let error = Transport::connect("carrier:pigeon=yes;tcp:host=localhost")
        .await
        .unwrap_err();

    assert!(matches!(error.kind(), ErrorKind::InvalidAddress(..)));
}

#[tokio::test]
async fn tcp_transport() -> Result<()> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    let address = format!("carrier:pigeon=yes;tcp:host=127.0.0.1,port={port}");
    let (transport, accepted) = tokio::join!(Transport::connect(&address), listener.accept());

    let mut transport = transport?;
    let (mut peer, _) = accepted?;

    assert!(matches!(transport, Transport::Tcp(..)));

    transport.write_all(b"ping").await?;
    let mut buf = [0; 4];
    peer.read_exact(&mut buf).await?;
    assert_eq!(&buf, b"ping");
    Ok(())
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn unixexec_transport() -> Result<()> {
    let mut transport = Transport::connect("unixexec:path=cat").await?;

    transport.write_all(b"echo").await?;
    let mut buf = [0; 4];
    transport.read_exact(&mut buf).await?;
    assert_eq!(&buf, b"echo");
    Ok(())
}

#[tokio::test]
async fn rejected_mechanism_is_retried() -> Result<()> {
    let (a, b) = tokio::io::duplex(4096);
    let guid = Guid::new("0123456789abcdef0123456789abcdef").unwrap();

    let (server, mut server_events) = ConnectionBuilder::new()
        .server(true)
        .guid(guid.clone())
        .mechanisms([Mechanism::Anonymous])
        .build(a);

    let (client, mut client_events) = ConnectionBuilder::new()
        .auth([Auth::external_from_u32_ascii_hex(1000), Auth::anonymous("test")])
        .build(b);

    assert_eq!(client_events.connected().await?, Some(guid.clone()));
    assert_eq!(server_events.connected().await?, Some(guid.clone()));

    assert_eq!(client.state(), ConnectionState::Connected);
    assert_eq!(client.guid(), Some(&guid));
    assert_eq!(server.guid(), Some(&guid));
    Ok(())
}

#[tokio::test]
async fn handshake_failure_surfaces() -> Result<()> {
    let (a, b) = tokio::io::duplex(4096);

    let (_server, _server_events) = ConnectionBuilder::new()
        .server(true)
        .mechanisms([Mechanism::External])
        .build(a);

    let (client, mut client_events) = ConnectionBuilder::new()
        .auth([Auth::anonymous("test")])
        .build(b);

    let error = client_events.connected().await.unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::AuthenticationFailed));

    client.closed().await;
    assert_eq!(client.state(), ConnectionState::Closed);
    Ok(())
}

#[tokio::test]
async fn queued_messages_are_flushed_in_order() -> Result<()> {
    let (a, b) = tokio::io::duplex(4096);

    let (_server, mut server_events) = ConnectionBuilder::new().server(true).build(a);
    let (client, _client_events) = ConnectionBuilder::new()
        .auth([Auth::anonymous("test")])
        .build(b);

    let first = client.send(call("First"));
    let second = client.send(call("Second"));
    let third = client.send(call("Third"));

    assert!(first < second && second < third);

    for (member, serial) in [("First", first), ("Second", second), ("Third", third)] {
        let message = next_message(&mut server_events).await.expect("message");
        assert_eq!(message.member(), Some(member));
        assert_eq!(message.serial(), Some(serial));
    }

    Ok(())
}

#[tokio::test]
async fn without_handshake() -> Result<()> {
    let (a, b) = tokio::io::duplex(4096);

    let (_server, mut server_events) = ConnectionBuilder::new().handshake(false).build(a);
    let (client, mut client_events) = ConnectionBuilder::new()
        .handshake(false)
        .endianness(crate::proto::Endianness::BIG)
        .build(b);

    assert_eq!(client_events.connected().await?, None);

    client.send(call("Ping").with_values(vec![crate::Value::from(42u32)])?);

    let message = next_message(&mut server_events).await.expect("message");
    assert_eq!(message.member(), Some("Ping"));
    assert_eq!(message.body(), &[crate::Value::from(42u32)]);
    Ok(())
}

#[tokio::test]
async fn unknown_message_types_are_ignored() -> Result<()> {
    let (a, mut b) = tokio::io::duplex(4096);
    let (_server, mut server_events) = ConnectionBuilder::new().handshake(false).build(a);

    let serial = std::num::NonZeroU32::MIN;
    let endianness = crate::proto::Endianness::LITTLE;

    let mut bytes = Vec::new();
    crate::message::write_message(&call("Future").with_serial(serial), endianness, &mut bytes)?;
    bytes[1] = 5;
    crate::message::write_message(&call("Ping").with_serial(serial), endianness, &mut bytes)?;
    b.write_all(&bytes).await?;

    let message = next_message(&mut server_events).await.expect("message");
    assert_eq!(message.member(), Some("Ping"));
    Ok(())
}

#[tokio::test]
async fn send_after_close_is_dropped() -> Result<()> {
    let (a, b) = tokio::io::duplex(4096);

    let (server, mut server_events) = ConnectionBuilder::new().server(true).build(a);
    let (client, mut client_events) = ConnectionBuilder::new()
        .auth([Auth::anonymous("test")])
        .build(b);

    client_events.connected().await?;
    server.close();

    loop {
        match client_events.recv().await {
            Some(Event::Closed) | None => break,
            Some(..) => continue,
        }
    }

    assert_eq!(client.state(), ConnectionState::Closed);

    let serial = client.send(call("Late"));
    assert!(client.next_serial() > serial);

    while let Some(event) = server_events.recv().await {
        assert!(!matches!(event, Event::Message(..)));
    }

    Ok(())
}

#[tokio::test]
async fn serials_skip_zero() {
    let (a, _b) = tokio::io::duplex(64);
    let (connection, _events) = ConnectionBuilder::new().handshake(false).build(a);

    connection
        .shared
        .serial
        .store(u32::MAX, std::sync::atomic::Ordering::Relaxed);

    assert_eq!(connection.next_serial().get(), u32::MAX);
    assert_eq!(connection.next_serial().get(), 1);
}
