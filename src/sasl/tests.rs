use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::{ErrorKind, Result};

use super::*;

fn guid() -> Guid {
    Guid::new("0123456789abcdef0123456789abcdef").unwrap()
}

#[test]
fn test_external_from_uid() {
    assert_eq!(
        Auth::external_from_u32_ascii_hex(1000),
        Auth::External(b"31303030"[..].into())
    );
    assert_eq!(
        Auth::external_from_u32_ascii_hex(u32::MAX),
        Auth::External(b"34323934393637323935"[..].into())
    );
    assert_eq!(
        Auth::external_from_u32_ascii_hex(0),
        Auth::External(b"30"[..].into())
    );
}

#[test]
fn parse_requests() -> Result<()> {
    assert_eq!(
        SaslRequest::parse(b"AUTH EXTERNAL 31303030\r\n")?,
        SaslRequest::Auth {
            mechanism: Some(&b"EXTERNAL"[..]),
            initial_response: Some(&b"31303030"[..]),
        }
    );

    assert_eq!(
        SaslRequest::parse(b"AUTH\r\n")?,
        SaslRequest::Auth {
            mechanism: None,
            initial_response: None,
        }
    );

    assert_eq!(SaslRequest::parse(b"BEGIN\r\n")?, SaslRequest::Begin);
    assert_eq!(SaslRequest::parse(b"DATA 00")?, SaslRequest::Data(b"00"));

    let error = SaslRequest::parse(b"HELLO\r\n").unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidSasl(..)));
    Ok(())
}

#[test]
fn parse_responses() -> Result<()> {
    assert_eq!(
        SaslResponse::parse(b"OK 0123456789abcdef0123456789abcdef\r\n")?,
        SaslResponse::Ok(guid())
    );

    let rejected = SaslResponse::parse(b"REJECTED EXTERNAL ANONYMOUS\r\n")?;
    let mechanisms = rejected.mechanisms().collect::<Vec<_>>();
    assert_eq!(mechanisms, [&b"EXTERNAL"[..], &b"ANONYMOUS"[..]]);

    assert!(SaslResponse::parse(b"OK not-hex\r\n").is_err());
    assert!(SaslResponse::parse(b"OK\r\n").is_err());
    Ok(())
}

#[test]
fn client_retries_after_rejection() -> Result<()> {
    let mut client = ClientHandshake::new(vec![
        Auth::external_from_u32_ascii_hex(1000),
        Auth::Anonymous(Box::default()),
    ]);

    assert_eq!(client.start()?, b"\0AUTH EXTERNAL 31303030\r\n");

    assert_eq!(
        client.receive(b"REJECTED ANONYMOUS\r\n")?,
        ClientStep::Send(b"AUTH ANONYMOUS\r\n".to_vec())
    );

    assert_eq!(
        client.receive(b"OK 0123456789abcdef0123456789abcdef\r\n")?,
        ClientStep::Done(guid(), b"BEGIN\r\n".to_vec())
    );

    Ok(())
}

#[test]
fn client_tries_mechanisms_in_order() -> Result<()> {
    let mut client = ClientHandshake::new(vec![
        Auth::external_from_u32_ascii_hex(1000),
        Auth::anonymous("a"),
        Auth::external_from_u32_ascii_hex(0),
    ]);

    client.start()?;

    assert_eq!(
        client.receive(b"REJECTED EXTERNAL\r\n")?,
        ClientStep::Send(b"AUTH ANONYMOUS 61\r\n".to_vec())
    );

    assert_eq!(
        client.receive(b"REJECTED EXTERNAL\r\n")?,
        ClientStep::Send(b"AUTH EXTERNAL 30\r\n".to_vec())
    );

    Ok(())
}

#[test]
fn client_runs_out_of_mechanisms() -> Result<()> {
    let mut client = ClientHandshake::new(vec![Auth::anonymous("a")]);
    client.start()?;

    let error = client.receive(b"REJECTED EXTERNAL\r\n").unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::AuthenticationFailed));

    let error = ClientHandshake::new(Vec::new()).start().unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::AuthenticationFailed));
    Ok(())
}

#[test]
fn client_cancels_on_error() -> Result<()> {
    let mut client = ClientHandshake::new(vec![Auth::anonymous("a"), Auth::anonymous("b")]);
    client.start()?;

    assert_eq!(
        client.receive(b"ERROR\r\n")?,
        ClientStep::Send(b"CANCEL\r\n".to_vec())
    );

    assert_eq!(
        client.receive(b"REJECTED ANONYMOUS\r\n")?,
        ClientStep::Send(b"AUTH ANONYMOUS 62\r\n".to_vec())
    );

    Ok(())
}

#[test]
fn client_rejects_unexpected_lines() -> Result<()> {
    let mut client = ClientHandshake::new(vec![Auth::anonymous("a")]);
    client.start()?;

    let error = client.receive(b"BOGUS\r\n").unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidSasl(..)));

    let error = client.receive(b"AGREE_UNIX_FD\r\n").unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidSasl(..)));
    Ok(())
}

#[test]
fn server_flow() -> Result<()> {
    let mut server = ServerHandshake::new(guid(), vec![Mechanism::External]);

    assert_eq!(
        server.receive(b"AUTH\r\n")?,
        ServerStep::Send(b"REJECTED EXTERNAL\r\n".to_vec())
    );

    assert_eq!(
        server.receive(b"AUTH EXTERNAL zz\r\n")?,
        ServerStep::Send(b"REJECTED EXTERNAL\r\n".to_vec())
    );

    assert_eq!(
        server.receive(b"AUTH EXTERNAL 31303030\r\n")?,
        ServerStep::Send(b"OK 0123456789abcdef0123456789abcdef\r\n".to_vec())
    );

    assert_eq!(
        server.receive(b"NEGOTIATE_UNIX_FD\r\n")?,
        ServerStep::Send(b"ERROR unix fd passing is not supported\r\n".to_vec())
    );

    assert_eq!(server.receive(b"BEGIN\r\n")?, ServerStep::Done);
    Ok(())
}

#[test]
fn server_gives_up() {
    let mut server = ServerHandshake::new(guid(), vec![Mechanism::External]);

    let error = loop {
        if let Err(error) = server.receive(b"AUTH NOPE\r\n") {
            break error;
        }
    };

    assert!(matches!(error.kind(), ErrorKind::AuthenticationFailed));
}

#[tokio::test]
async fn handshake_over_stream() -> Result<()> {
    let (mut a, mut b) = tokio::io::duplex(1024);

    let server = tokio::spawn(async move {
        let handshake = ServerHandshake::new(guid(), vec![Mechanism::Anonymous]);
        let rest = server_handshake(&mut b, handshake).await?;
        Ok::<_, crate::Error>((rest, b))
    });

    let client = ClientHandshake::new(vec![
        Auth::external_from_u32_ascii_hex(1000),
        Auth::anonymous("test"),
    ]);

    let (server_guid, rest) = client_handshake(&mut a, client).await?;
    assert_eq!(server_guid, guid());
    assert!(rest.is_empty());

    // Binary data sent right after BEGIN is handed over untouched.
    a.write_all(b"l\x01").await?;

    let (mut rest, mut b) = server.await.expect("server task")?;

    while rest.len() < 2 {
        b.read_buf(&mut rest).await?;
    }

    assert_eq!(&rest[..], b"l\x01");
    Ok(())
}

#[tokio::test]
async fn server_requires_nul() {
    let (mut a, mut b) = tokio::io::duplex(1024);

    a.write_all(b"AUTH ANONYMOUS\r\n").await.unwrap();

    let handshake = ServerHandshake::new(guid(), vec![Mechanism::Anonymous]);
    let error = server_handshake(&mut b, handshake).await.unwrap_err();
    assert!(matches!(error.kind(), ErrorKind::InvalidSasl(..)));
}
