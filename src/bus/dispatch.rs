use std::num::NonZeroU32;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::connection::{Event, Events};
use crate::error::{Error, ErrorKind, RemoteError};
use crate::object::{Interface, MethodCall, MethodError, MethodHandler, SignalEmitter};
use crate::org_freedesktop_dbus::{
    ERROR_FAILED, ERROR_INVALID_ARGS, ERROR_UNKNOWN_INTERFACE, ERROR_UNKNOWN_METHOD,
    ERROR_UNKNOWN_OBJECT,
};
use crate::proto::Flags;
use crate::signature::Signature;
use crate::utils::lock;
use crate::{Message, MessageKind, ObjectPath, Value};

use super::{standard, Bus};

/// The body of a successful reply together with its signature.
pub(super) type Output = Result<(Signature, Vec<Value>), MethodError>;

/// Process the events of a connection until it closes.
pub(super) async fn run(bus: Bus, mut events: Events) {
    while let Some(event) = events.recv().await {
        match event {
            Event::Connected(guid) => {
                tracing::debug!(?guid, "bus connected");
            }
            Event::Message(message) => {
                bus.dispatch(message);
            }
            Event::Error(error) => {
                tracing::debug!(%error, "bus connection failed");
            }
            Event::Closed => break,
        }
    }

    lock(&bus.shared.pending).close();
    lock(&bus.shared.signals).clear();
    tracing::debug!("bus closed");
}

enum Route {
    Done(Output),
    Call {
        handler: MethodHandler,
        result: Signature,
        emitter: SignalEmitter,
    },
}

impl Bus {
    fn dispatch(&self, message: Message) {
        match *message.kind() {
            MessageKind::MethodReturn { reply_serial } => {
                self.resolve(reply_serial, Ok(message.into_body()));
            }
            MessageKind::Error {
                ref error_name,
                reply_serial,
            } => {
                let error = RemoteError::new(error_name, message.body().to_vec());
                self.resolve(reply_serial, Err(Error::new(ErrorKind::Remote(error))));
            }
            MessageKind::Signal { .. } => {
                self.deliver(&message);
            }
            MessageKind::MethodCall { .. } => {
                self.call(message);
            }
        }
    }

    fn resolve(&self, reply_serial: NonZeroU32, reply: super::bus::Reply) {
        let Some(tx) = lock(&self.shared.pending).take(reply_serial) else {
            tracing::warn!(
                reply_serial = reply_serial.get(),
                "dropping reply without a pending call"
            );
            return;
        };

        if tx.send(reply).is_err() {
            tracing::debug!(reply_serial = reply_serial.get(), "caller went away");
        }
    }

    fn call(&self, message: Message) {
        let reply_to = ReplyTo::new(&message);

        match self.route(&message) {
            Route::Done(output) => {
                self.respond(&reply_to, output);
            }
            Route::Call {
                handler,
                result,
                emitter,
            } => {
                let bus = self.clone();

                tokio::spawn(async move {
                    let call = MethodCall::new(message, emitter);
                    let output = AssertUnwindSafe(async move { handler(call).await })
                        .catch_unwind()
                        .await;

                    let output = match output {
                        Ok(output) => output.map(|body| (result, body)),
                        Err(..) => {
                            tracing::error!(serial = ?reply_to.serial, "method handler panicked");
                            Err(MethodError::failed("Method handler panicked"))
                        }
                    };

                    bus.respond(&reply_to, output);
                });
            }
        }
    }

    fn route(&self, message: &Message) -> Route {
        let (Some(path), Some(member)) = (message.path(), message.member()) else {
            return Route::Done(Err(MethodError::failed("not a method call")));
        };

        if let Some(output) = standard::handle(self, message) {
            return Route::Done(output);
        }

        let interface = match message.interface() {
            Some(name) => lock(&self.shared.registry).interface(path, name),
            None => lock(&self.shared.registry).find_method(path, member),
        };

        let Some(interface) = interface else {
            return Route::Done(Err(self.missing(path, message)));
        };

        let Some(method) = interface.desc().method(member) else {
            return Route::Done(Err(unknown_method(&interface, member)));
        };

        if message.signature() != method.args() {
            return Route::Done(Err(MethodError::new(
                ERROR_INVALID_ARGS,
                format!(
                    "Method {member} expects signature \"{}\" but got \"{}\"",
                    method.args(),
                    message.signature()
                ),
            )));
        }

        let Some(handler) = interface.handler(member) else {
            return Route::Done(Err(unknown_method(&interface, member)));
        };

        Route::Call {
            handler: handler.clone(),
            result: method.result().clone(),
            emitter: SignalEmitter::new(
                self.clone(),
                path.clone(),
                interface.shared_desc().clone(),
            ),
        }
    }

    /// The error for a call whose path or interface is not exported.
    fn missing(&self, path: &ObjectPath, message: &Message) -> MethodError {
        if !lock(&self.shared.registry).contains(path) {
            return MethodError::new(ERROR_UNKNOWN_OBJECT, format!("No such object path {path}"));
        }

        match message.interface() {
            Some(interface) => MethodError::new(
                ERROR_UNKNOWN_INTERFACE,
                format!("No such interface {interface} at object path {path}"),
            ),
            None => MethodError::new(
                ERROR_UNKNOWN_METHOD,
                format!(
                    "No such method {} at object path {path}",
                    message.member().unwrap_or_default()
                ),
            ),
        }
    }

    fn respond(&self, reply_to: &ReplyTo, output: Output) {
        if let Some(reply) = reply_to.reply(output) {
            self.connection.send(reply);
        }
    }
}

fn unknown_method(interface: &Interface, member: &str) -> MethodError {
    MethodError::new(
        ERROR_UNKNOWN_METHOD,
        format!(
            "No such method {member} in interface {}",
            interface.desc().name()
        ),
    )
}

/// What is needed to answer a method call after it has been handed to its
/// implementation.
struct ReplyTo {
    serial: Option<NonZeroU32>,
    destination: Option<Box<str>>,
    no_reply: bool,
}

impl ReplyTo {
    fn new(message: &Message) -> Self {
        Self {
            serial: message.serial(),
            destination: message.sender().map(Box::from),
            no_reply: message.flags() & Flags::NO_REPLY_EXPECTED,
        }
    }

    fn reply(&self, output: Output) -> Option<Message> {
        if self.no_reply {
            return None;
        }

        let serial = self.serial?;

        let reply = match output {
            Ok((_, body)) if body.is_empty() => Message::method_return(serial),
            Ok((signature, body)) => match Message::method_return(serial).with_body(signature, body) {
                Ok(reply) => reply,
                Err(error) => {
                    tracing::warn!(%error, "method returned values not matching its signature");
                    error_reply(serial, ERROR_FAILED, &error.to_string())
                }
            },
            Err(error) => {
                tracing::debug!(%error, "method call failed");
                error_reply(serial, error.name(), error.message())
            }
        };

        Some(match &self.destination {
            Some(destination) => reply.with_destination(destination.clone()),
            None => reply,
        })
    }
}

fn error_reply(serial: NonZeroU32, name: &str, message: &str) -> Message {
    match Message::error(name, serial).with_values(vec![Value::from(message)]) {
        Ok(reply) => reply,
        Err(..) => Message::error(name, serial),
    }
}
