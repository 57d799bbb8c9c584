//! The standard interfaces every exported path implements.

use std::sync::{Arc, OnceLock};

use crate::object::{Interface, MethodError, PropertyDesc};
use crate::org_freedesktop_dbus::{
    ERROR_ACCESS_DENIED, ERROR_INVALID_ARGS, ERROR_PROPERTY_READ_ONLY, ERROR_UNKNOWN_INTERFACE,
    ERROR_UNKNOWN_METHOD, ERROR_UNKNOWN_PROPERTY, INTROSPECTABLE, PEER, PROPERTIES,
};
use crate::signature::{Signature, Type};
use crate::utils::lock;
use crate::{Message, ObjectPath, Value};

use super::dispatch::Output;
use super::Bus;

const MACHINE_ID: [&str; 2] = ["/etc/machine-id", "/var/lib/dbus/machine-id"];

/// The machine id, read once per process.
pub(super) fn machine_id() -> Option<&'static str> {
    static ID: OnceLock<Option<Box<str>>> = OnceLock::new();

    let id = ID.get_or_init(|| {
        for path in MACHINE_ID {
            match std::fs::read_to_string(path) {
                Ok(id) if !id.trim().is_empty() => return Some(id.trim().into()),
                Ok(..) => tracing::debug!(path, "empty machine id"),
                Err(error) => tracing::debug!(path, %error, "unable to read machine id"),
            }
        }

        None
    });

    id.as_deref()
}

/// Handle a call to one of the standard interfaces.
///
/// Returns `None` if the call is not addressed to one of them.
pub(super) fn handle(bus: &Bus, message: &Message) -> Option<Output> {
    let path = message.path()?;
    let member = message.member()?;

    let interface = match message.interface() {
        Some(interface) => interface,
        None => {
            if lock(&bus.shared.registry).find_method(path, member).is_some() {
                return None;
            }

            match member {
                "Ping" | "GetMachineId" => PEER,
                "Introspect" => INTROSPECTABLE,
                "Get" | "GetAll" | "Set" => PROPERTIES,
                _ => return None,
            }
        }
    };

    let output = match interface {
        PEER => peer(member, message),
        INTROSPECTABLE => introspectable(bus, path, member, message),
        PROPERTIES => properties(bus, path, member, message),
        _ => return None,
    };

    tracing::trace!(interface, member, ok = output.is_ok(), "standard interface");
    Some(output)
}

fn peer(member: &str, message: &Message) -> Output {
    match member {
        "Ping" => {
            expect_args(message, "")?;
            Ok((Signature::empty(), Vec::new()))
        }
        "GetMachineId" => {
            expect_args(message, "")?;

            match machine_id() {
                Some(id) => output(vec![Value::from(id)]),
                None => Err(MethodError::failed("Unable to load the machine id")),
            }
        }
        _ => Err(unknown_method(PEER, member)),
    }
}

fn introspectable(bus: &Bus, path: &ObjectPath, member: &str, message: &Message) -> Output {
    match member {
        "Introspect" => {
            expect_args(message, "")?;
            let xml = lock(&bus.shared.registry).introspect(path);
            output(vec![Value::String(xml)])
        }
        _ => Err(unknown_method(INTROSPECTABLE, member)),
    }
}

fn properties(bus: &Bus, path: &ObjectPath, member: &str, message: &Message) -> Output {
    match (member, message.body()) {
        ("Get", [Value::String(interface), Value::String(name)]) => {
            let interface = exported(bus, path, interface)?;
            let property = declared(&interface, name)?;

            if !property.access().is_readable() {
                return Err(MethodError::new(
                    ERROR_ACCESS_DENIED,
                    format!("Property {name} is not readable"),
                ));
            }

            let value = read(&interface, property)?;
            output(vec![Value::variant(value)])
        }
        ("GetAll", [Value::String(interface)]) => {
            let interface = exported(bus, path, interface)?;
            let mut entries = Vec::new();

            for property in interface.desc().properties() {
                if !property.access().is_readable() || interface.getter_of(property.name()).is_none()
                {
                    continue;
                }

                let value = read(&interface, property)?;
                entries.push((Value::from(property.name()), Value::variant(value)));
            }

            output(vec![Value::dict(Type::String, Type::Variant, entries)?])
        }
        ("Set", [Value::String(interface_name), Value::String(name), Value::Variant(value)]) => {
            let interface = exported(bus, path, interface_name)?;
            let property = declared(&interface, name)?;

            let setter = match interface.setter_of(name) {
                Some(setter) if property.access().is_writable() => setter,
                _ => {
                    return Err(MethodError::new(
                        ERROR_PROPERTY_READ_ONLY,
                        format!("Property {name} is read-only"),
                    ));
                }
            };

            if !value.conforms_to(property.ty()) {
                return Err(MethodError::invalid_args(format!(
                    "Property {name} has type {}",
                    property.ty()
                )));
            }

            setter((**value).clone())?;
            properties_changed(bus, path, interface_name, name, value);
            Ok((Signature::empty(), Vec::new()))
        }
        ("Get" | "GetAll" | "Set", _) => Err(MethodError::new(
            ERROR_INVALID_ARGS,
            format!(
                "Invalid arguments \"{}\" to {PROPERTIES}.{member}",
                message.signature()
            ),
        )),
        _ => Err(unknown_method(PROPERTIES, member)),
    }
}

fn properties_changed(bus: &Bus, path: &ObjectPath, interface: &str, name: &str, value: &Value) {
    let changed = Value::dict(
        Type::String,
        Type::Variant,
        [(Value::from(name), Value::Variant(Box::new(value.clone())))],
    );

    let signal = changed.and_then(|changed| {
        let invalidated = Value::array(Type::String, [])?;

        Message::signal(path.clone(), PROPERTIES, "PropertiesChanged").with_values(vec![
            Value::from(interface),
            changed,
            invalidated,
        ])
    });

    match signal {
        Ok(signal) => bus.emit(signal),
        Err(error) => tracing::warn!(%error, "failed to emit PropertiesChanged"),
    }
}

fn exported(bus: &Bus, path: &ObjectPath, name: &str) -> Result<Arc<Interface>, MethodError> {
    lock(&bus.shared.registry)
        .interface(path, name)
        .ok_or_else(|| {
            MethodError::new(
                ERROR_UNKNOWN_INTERFACE,
                format!("No such interface {name} at object path {path}"),
            )
        })
}

fn declared<'a>(interface: &'a Interface, name: &str) -> Result<&'a PropertyDesc, MethodError> {
    interface.desc().property(name).ok_or_else(|| {
        MethodError::new(
            ERROR_UNKNOWN_PROPERTY,
            format!(
                "No such property {name} in interface {}",
                interface.desc().name()
            ),
        )
    })
}

fn read(interface: &Interface, property: &PropertyDesc) -> Result<Value, MethodError> {
    let Some(getter) = interface.getter_of(property.name()) else {
        return Err(MethodError::new(
            ERROR_UNKNOWN_PROPERTY,
            format!("Property {} has no getter", property.name()),
        ));
    };

    let value = getter()?;

    if !value.conforms_to(property.ty()) {
        return Err(MethodError::failed(format!(
            "Property {} returned a value which is not of type {}",
            property.name(),
            property.ty()
        )));
    }

    Ok(value)
}

fn expect_args(message: &Message, signature: &str) -> Result<(), MethodError> {
    if message.signature() != signature {
        return Err(MethodError::invalid_args(format!(
            "Expected signature \"{signature}\" but got \"{}\"",
            message.signature()
        )));
    }

    Ok(())
}

fn output(body: Vec<Value>) -> Output {
    let signature = Signature::from_types(body.iter().map(Value::ty))
        .map_err(|error| MethodError::failed(error.to_string()))?;

    Ok((signature, body))
}

fn unknown_method(interface: &str, member: &str) -> MethodError {
    MethodError::new(
        ERROR_UNKNOWN_METHOD,
        format!("No such method {member} in interface {interface}"),
    )
}
