//! Types associated with the `org.freedesktop.DBus` interface.
//!
//! This includes the calls a [`Bus`] can make to a bus daemon, and the names
//! of the standard interfaces and errors.

use crate::error::{ErrorKind, Result};
use crate::signature::Type;
use crate::{Bus, Message, ObjectPath, Value};

/// Well known destination name.
pub const DESTINATION: &str = "org.freedesktop.DBus";

/// Well known interface name.
pub const INTERFACE: &str = "org.freedesktop.DBus";

/// Well known D-Bus path.
pub const PATH: &str = "/org/freedesktop/DBus";

/// The interface implemented by every peer for liveness checks.
pub const PEER: &str = "org.freedesktop.DBus.Peer";

/// The interface describing the objects at a path as XML.
pub const INTROSPECTABLE: &str = "org.freedesktop.DBus.Introspectable";

/// The interface giving access to the properties of an object.
pub const PROPERTIES: &str = "org.freedesktop.DBus.Properties";

/// A generic failure.
pub const ERROR_FAILED: &str = "org.freedesktop.DBus.Error.Failed";
/// The arguments of a call do not match what the method expects.
pub const ERROR_INVALID_ARGS: &str = "org.freedesktop.DBus.Error.InvalidArgs";
/// The method is not implemented by the interface.
pub const ERROR_UNKNOWN_METHOD: &str = "org.freedesktop.DBus.Error.UnknownMethod";
/// Nothing is exported at the object path.
pub const ERROR_UNKNOWN_OBJECT: &str = "org.freedesktop.DBus.Error.UnknownObject";
/// The interface is not exported at the object path.
pub const ERROR_UNKNOWN_INTERFACE: &str = "org.freedesktop.DBus.Error.UnknownInterface";
/// The property is not declared by the interface.
pub const ERROR_UNKNOWN_PROPERTY: &str = "org.freedesktop.DBus.Error.UnknownProperty";
/// The property can not be written.
pub const ERROR_PROPERTY_READ_ONLY: &str = "org.freedesktop.DBus.Error.PropertyReadOnly";
/// The property can not be read.
pub const ERROR_ACCESS_DENIED: &str = "org.freedesktop.DBus.Error.AccessDenied";

raw_set! {
    /// The flags to a `RequestName` call.
    #[repr(u32)]
    pub enum NameFlag {
        /// If an application A specifies this flag and succeeds in becoming the
        /// owner of the name, and another application B later calls
        /// `RequestName` with the `REPLACE_EXISTING` flag, then application A
        /// will lose ownership and receive a `org.freedesktop.DBus.NameLost`
        /// signal, and application B will become the new owner. If
        /// `ALLOW_REPLACEMENT` is not specified by application A, or
        /// `REPLACE_EXISTING` is not specified by application B, then
        /// application B will not replace application A as the owner.
        ALLOW_REPLACEMENT = 1,
        /// Try to replace the current owner if there is one. If this flag is
        /// not set the application will only become the owner of the name if
        /// there is no current owner. If this flag is set, the application will
        /// replace the current owner if the current owner specified
        /// `ALLOW_REPLACEMENT`.
        REPLACE_EXISTING = 2,
        /// Without this flag, if an application requests a name that is already
        /// owned, the application will be placed in a queue to own the name
        /// when the current owner gives it up. If this flag is given, the
        /// application will not be placed in the queue, the request for the
        /// name will simply fail. This flag also affects behavior when an
        /// application is replaced as name owner; by default the application
        /// moves back into the waiting queue, unless this flag was provided
        /// when the application became the name owner.
        DO_NOT_QUEUE = 4,
    }
}

raw_enum! {
    /// The reply to a `RequestName` call.
    #[repr(u32)]
    pub enum NameReply {
        /// The caller is now the primary owner of the name, replacing any
        /// previous owner. Either the name had no owner before, or the caller
        /// specified [`NameFlag::REPLACE_EXISTING`] and the current owner
        /// specified [`NameFlag::ALLOW_REPLACEMENT`].
        PRIMARY_OWNER = 1,
        /// The name already had an owner, [`NameFlag::DO_NOT_QUEUE`] was not
        /// specified, and either the current owner did not specify
        /// [`NameFlag::ALLOW_REPLACEMENT`] or the requesting application did
        /// not specify [`NameFlag::REPLACE_EXISTING`].
        IN_QUEUE = 2,
        /// The name already has an owner, [`NameFlag::DO_NOT_QUEUE`] was
        /// specified, and either [`NameFlag::ALLOW_REPLACEMENT`] was not
        /// specified by the current owner, or [`NameFlag::REPLACE_EXISTING`]
        /// was not specified by the requesting application.
        EXISTS = 3,
        /// The application trying to request ownership of a name is already the
        /// owner of it.
        ALREADY_OWNER = 4,
    }
}

raw_enum! {
    /// The reply to a `ReleaseName` call.
    #[repr(u32)]
    pub enum ReleaseNameReply {
        /// The caller has released its claim on the name.
        RELEASED = 1,
        /// The name does not exist.
        NON_EXISTENT = 2,
        /// The caller was not the owner of the name, nor waiting in its queue.
        NOT_OWNER = 3,
    }
}

raw_enum! {
    /// The reply to a `StartServiceByName` call.
    #[repr(u32)]
    pub enum StartReply {
        /// The service was started.
        SUCCESS = 1,
        /// The service already had an owner.
        ALREADY_RUNNING = 2,
    }
}

/// Calls to the bus daemon.
///
/// These are only meaningful on a bus which is connected to a daemon, in
/// contrast to a direct peer-to-peer connection.
impl Bus {
    /// Register with the bus daemon, recording and returning the unique name
    /// it assigns.
    ///
    /// This is called when the bus is set up unless the connection was
    /// configured to be direct.
    pub async fn hello(&self) -> Result<Box<str>> {
        let body = self.call_daemon("Hello", Vec::new()).await?;
        let name = string(&body)?;
        tracing::debug!(name, "registered with the bus");
        self.set_name(name);
        Ok(name.into())
    }

    /// Request ownership of a well-known name.
    pub async fn request_name(&self, name: &str, flags: NameFlag) -> Result<NameReply> {
        let body = vec![Value::from(name), Value::from(flags.bits())];
        let body = self.call_daemon("RequestName", body).await?;
        Ok(NameReply::new(uint(&body)?))
    }

    /// Release ownership of a well-known name.
    pub async fn release_name(&self, name: &str) -> Result<ReleaseNameReply> {
        let body = self.call_daemon("ReleaseName", vec![Value::from(name)]).await?;
        Ok(ReleaseNameReply::new(uint(&body)?))
    }

    /// Ask the bus daemon to route the messages matching `rule` to this
    /// connection.
    pub async fn add_match(&self, rule: &str) -> Result<()> {
        self.call_daemon("AddMatch", vec![Value::from(rule)]).await?;
        Ok(())
    }

    /// Remove a rule added with [`Bus::add_match`].
    pub async fn remove_match(&self, rule: &str) -> Result<()> {
        self.call_daemon("RemoveMatch", vec![Value::from(rule)]).await?;
        Ok(())
    }

    /// The unique id of the bus daemon.
    pub async fn get_id(&self) -> Result<Box<str>> {
        let body = self.call_daemon("GetId", Vec::new()).await?;
        Ok(string(&body)?.into())
    }

    /// The unique name of the connection owning `name`.
    pub async fn get_name_owner(&self, name: &str) -> Result<Box<str>> {
        let body = self
            .call_daemon("GetNameOwner", vec![Value::from(name)])
            .await?;
        Ok(string(&body)?.into())
    }

    /// Test if `name` currently has an owner.
    pub async fn name_has_owner(&self, name: &str) -> Result<bool> {
        let body = self
            .call_daemon("NameHasOwner", vec![Value::from(name)])
            .await?;

        match body.first().and_then(Value::as_bool) {
            Some(value) => Ok(value),
            None => Err(mismatch("b")),
        }
    }

    /// List the names currently owned on the bus.
    pub async fn list_names(&self) -> Result<Vec<Box<str>>> {
        let body = self.call_daemon("ListNames", Vec::new()).await?;
        strings(&body)
    }

    /// List the names which can be started by the bus daemon.
    pub async fn list_activatable_names(&self) -> Result<Vec<Box<str>>> {
        let body = self.call_daemon("ListActivatableNames", Vec::new()).await?;
        strings(&body)
    }

    /// Ask the bus daemon to start the service owning `name`.
    pub async fn start_service_by_name(&self, name: &str, flags: u32) -> Result<StartReply> {
        let body = vec![Value::from(name), Value::from(flags)];
        let body = self.call_daemon("StartServiceByName", body).await?;
        Ok(StartReply::new(uint(&body)?))
    }

    /// The unix user id of the process owning `name`.
    pub async fn get_connection_unix_user(&self, name: &str) -> Result<u32> {
        let body = self
            .call_daemon("GetConnectionUnixUser", vec![Value::from(name)])
            .await?;
        uint(&body)
    }

    /// The process id of the process owning `name`.
    pub async fn get_connection_unix_process_id(&self, name: &str) -> Result<u32> {
        let body = self
            .call_daemon("GetConnectionUnixProcessID", vec![Value::from(name)])
            .await?;
        uint(&body)
    }

    /// Add variables to the environment of services started by the bus
    /// daemon.
    pub async fn update_activation_environment<'a, I>(&self, environment: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let environment = Value::dict(
            Type::String,
            Type::String,
            environment
                .into_iter()
                .map(|(key, value)| (Value::from(key), Value::from(value))),
        )?;

        self.call_daemon("UpdateActivationEnvironment", vec![environment])
            .await?;
        Ok(())
    }

    async fn call_daemon(&self, member: &'static str, body: Vec<Value>) -> Result<Vec<Value>> {
        let message = Message::method_call(ObjectPath::new(PATH)?, member)
            .with_interface(INTERFACE)
            .with_destination(DESTINATION)
            .with_values(body)?;

        self.invoke(message).await
    }
}

fn string(body: &[Value]) -> Result<&str> {
    match body.first() {
        Some(Value::String(value)) => Ok(value.as_str()),
        _ => Err(mismatch("s")),
    }
}

fn uint(body: &[Value]) -> Result<u32> {
    body.first()
        .and_then(Value::as_u32)
        .ok_or_else(|| mismatch("u"))
}

fn strings(body: &[Value]) -> Result<Vec<Box<str>>> {
    let Some(values) = body.first().and_then(Value::as_array) else {
        return Err(mismatch("as"));
    };

    values
        .iter()
        .map(|value| match value {
            Value::String(value) => Ok(value.as_str().into()),
            _ => Err(mismatch("as")),
        })
        .collect()
}

fn mismatch(expected: &str) -> crate::Error {
    ErrorKind::ValueMismatch {
        expected: expected.into(),
    }
    .into()
}
