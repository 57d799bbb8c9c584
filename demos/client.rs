use anyhow::Result;
use dbus_peer::{Bus, Message, ObjectPath, Value};

#[tokio::main]
async fn main() -> Result<()> {
    let bus = Bus::session_bus().await?;

    let m = Message::method_call(ObjectPath::new("/se/tedro/DBusExample")?, "Ping")
        .with_destination("se.tedro.DBusExample")
        .with_interface("se.tedro.DBusExample.Pingable")
        .with_values(vec![Value::from(42u32)])?;

    let body = bus.invoke(m).await?;
    dbg!(&body);
    Ok(())
}
