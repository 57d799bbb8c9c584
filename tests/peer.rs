use anyhow::{Context, Result};
use dbus_peer::object::{Access, Interface, InterfaceDesc, MethodError};
use dbus_peer::org_freedesktop_dbus::{PEER, PROPERTIES};
use dbus_peer::sasl::{Auth, Guid, Mechanism};
use dbus_peer::{ConnectionBuilder, Message, ObjectPath, Server, Value};

const INTERFACE: &str = "se.tedro.DBusExample.Pingable";

fn pingable() -> Result<Interface> {
    let desc = InterfaceDesc::new(INTERFACE)?
        .with_method("Ping", "u", "u")?
        .with_signal("Pinged", "u")?
        .with_property("Version", "s", Access::Read)?;

    Ok(Interface::new(desc)
        .method("Ping", |call| async move {
            let Value::UInt32(value) = *call.arg(0)? else {
                return Err(MethodError::invalid_args("expected u32"));
            };

            call.emitter().emit("Pinged", vec![Value::from(value)])?;
            Ok(vec![Value::from(value + 1)])
        })
        .getter("Version", || Ok(Value::from("1.0"))))
}

#[tokio::test]
async fn rejected_mechanism_falls_back() -> Result<()> {
    let (a, b) = tokio::io::duplex(4096);
    let guid = Guid::new("00112233445566778899aabbccddeeff").context("guid")?;

    let mut server = ConnectionBuilder::new();
    server
        .server(true)
        .direct(true)
        .guid(guid.clone())
        .mechanisms([Mechanism::Anonymous]);

    let mut client = ConnectionBuilder::new();
    client
        .direct(true)
        .auth([Auth::external_from_u32_ascii_hex(0), Auth::anonymous("tests")]);

    let (server, client) = tokio::try_join!(server.bus_with_stream(a), client.bus_with_stream(b))?;

    assert_eq!(client.connection().guid(), Some(&guid));
    assert_eq!(server.connection().guid(), Some(&guid));

    let ping = Message::method_call(ObjectPath::root(), "Ping").with_interface(PEER);
    assert!(client.invoke(ping).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn tcp_server_roundtrip() -> Result<()> {
    let server = Server::bind("tcp:host=127.0.0.1").await?;
    let address = server.address()?;

    let mut builder = ConnectionBuilder::new();
    builder
        .address(&address)
        .direct(true)
        .auth([Auth::anonymous("tests")]);

    let (service, client) = tokio::try_join!(server.accept_bus(), builder.bus())?;

    let path = ObjectPath::new("/se/tedro/DBusExample")?;
    service.export(path.clone(), pingable()?);

    let mut pinged = client.subscribe(path.clone(), INTERFACE, "Pinged");

    let call = Message::method_call(path.clone(), "Ping")
        .with_interface(INTERFACE)
        .with_values(vec![Value::from(41u32)])?;

    assert_eq!(client.invoke(call).await?, [Value::from(42u32)]);

    let signal = pinged.recv().await.context("signal")?;
    assert_eq!(signal.body(), [Value::from(41u32)]);

    let get = Message::method_call(path.clone(), "Get")
        .with_interface(PROPERTIES)
        .with_values(vec![Value::from(INTERFACE), Value::from("Version")])?;

    assert_eq!(client.invoke(get).await?, [Value::variant("1.0")]);

    client.close();
    service.closed().await;
    Ok(())
}

#[tokio::test]
async fn remote_errors_carry_names() -> Result<()> {
    let (a, b) = tokio::io::duplex(4096);

    let mut server = ConnectionBuilder::new();
    server.server(true).direct(true);

    let mut client = ConnectionBuilder::new();
    client.direct(true).auth([Auth::anonymous("tests")]);

    let (service, client) = tokio::try_join!(server.bus_with_stream(a), client.bus_with_stream(b))?;

    let path = ObjectPath::new("/se/tedro/DBusExample")?;
    service.export(path.clone(), pingable()?);

    let call = Message::method_call(path, "Ping")
        .with_interface(INTERFACE)
        .with_values(vec![Value::from("not a number")])?;

    let error = client.invoke(call).await.unwrap_err();
    let remote = error.remote().context("remote error")?;
    assert_eq!(remote.name(), "org.freedesktop.DBus.Error.InvalidArgs");
    assert!(!remote.message().is_empty());
    Ok(())
}
