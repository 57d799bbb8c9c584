use anyhow::{bail, Result};
use dbus_peer::object::{Access, Interface, InterfaceDesc, MethodError};
use dbus_peer::org_freedesktop_dbus::{NameFlag, NameReply};
use dbus_peer::{Bus, ObjectPath, Value};

const NAME: &str = "se.tedro.DBusExample";
const INTERFACE: &str = "se.tedro.DBusExample.Pingable";
const PATH: &str = "/se/tedro/DBusExample";

#[tokio::main]
async fn main() -> Result<()> {
    let bus = Bus::session_bus().await?;

    match bus.request_name(NAME, NameFlag::DO_NOT_QUEUE).await? {
        NameReply::PRIMARY_OWNER => {}
        reply => {
            bail!("Could not acquire name: {reply:?}");
        }
    }

    let desc = InterfaceDesc::new(INTERFACE)?
        .with_method("Ping", "u", "u")?
        .with_signal("Pinged", "u")?
        .with_property("Name", "s", Access::Read)?;

    let interface = Interface::new(desc)
        .method("Ping", |call| async move {
            let Value::UInt32(value) = *call.arg(0)? else {
                return Err(MethodError::invalid_args("expected u32"));
            };

            call.emitter().emit("Pinged", vec![Value::from(value)])?;
            Ok(vec![Value::from(value)])
        })
        .getter("Name", || Ok(Value::from(NAME)));

    bus.export(ObjectPath::new(PATH)?, interface);
    println!("Serving {NAME} as {:?}", bus.name());

    bus.closed().await;
    Ok(())
}
