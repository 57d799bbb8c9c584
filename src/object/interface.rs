use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::Value;

use super::{InterfaceDesc, MethodCall, MethodError};

/// The result of an exported method: the values to reply with.
///
/// An empty vector replies without a body.
pub type MethodResult = Result<Vec<Value>, MethodError>;

pub(crate) type MethodHandler =
    Arc<dyn Fn(MethodCall) -> BoxFuture<'static, MethodResult> + Send + Sync>;
pub(crate) type PropertyGetter = Arc<dyn Fn() -> Result<Value, MethodError> + Send + Sync>;
pub(crate) type PropertySetter = Arc<dyn Fn(Value) -> Result<(), MethodError> + Send + Sync>;

/// The implementation of an interface which can be exported on a
/// [`Bus`](crate::Bus).
///
/// Every method declared by the description should have a handler
/// registered. Calls to declared methods without one are answered with an
/// `UnknownMethod` error.
///
/// # Examples
///
/// ```
/// use dbus_peer::object::{Interface, InterfaceDesc, MethodError};
/// use dbus_peer::Value;
///
/// let desc = InterfaceDesc::new("se.tedro.Calculator")?.with_method("Add", "ii", "i")?;
///
/// let interface = Interface::new(desc).method("Add", |call| async move {
///     let (Value::Int32(a), Value::Int32(b)) = (call.arg(0)?, call.arg(1)?) else {
///         return Err(MethodError::invalid_args("expected two integers"));
///     };
///
///     let sum = a.checked_add(*b).ok_or_else(|| MethodError::failed("overflow"))?;
///     Ok(vec![Value::from(sum)])
/// });
///
/// assert_eq!(interface.desc().name(), "se.tedro.Calculator");
/// # Ok::<_, dbus_peer::Error>(())
/// ```
pub struct Interface {
    desc: Arc<InterfaceDesc>,
    methods: HashMap<Box<str>, MethodHandler>,
    getters: HashMap<Box<str>, PropertyGetter>,
    setters: HashMap<Box<str>, PropertySetter>,
}

impl Interface {
    /// Construct an implementation of the described interface without any
    /// handlers.
    pub fn new(desc: InterfaceDesc) -> Self {
        Self {
            desc: Arc::new(desc),
            methods: HashMap::new(),
            getters: HashMap::new(),
            setters: HashMap::new(),
        }
    }

    /// Register the handler of a method.
    pub fn method<F, Fut>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(MethodCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MethodResult> + Send + 'static,
    {
        let handler: MethodHandler = Arc::new(move |call| handler(call).boxed());
        self.methods.insert(name.into(), handler);
        self
    }

    /// Register the getter of a property.
    pub fn getter<F>(mut self, name: &str, getter: F) -> Self
    where
        F: Fn() -> Result<Value, MethodError> + Send + Sync + 'static,
    {
        self.getters.insert(name.into(), Arc::new(getter));
        self
    }

    /// Register the setter of a property.
    pub fn setter<F>(mut self, name: &str, setter: F) -> Self
    where
        F: Fn(Value) -> Result<(), MethodError> + Send + Sync + 'static,
    {
        self.setters.insert(name.into(), Arc::new(setter));
        self
    }

    /// The description of the interface.
    #[inline]
    pub fn desc(&self) -> &InterfaceDesc {
        &self.desc
    }

    pub(crate) fn shared_desc(&self) -> &Arc<InterfaceDesc> {
        &self.desc
    }

    pub(crate) fn handler(&self, method: &str) -> Option<&MethodHandler> {
        self.methods.get(method)
    }

    pub(crate) fn getter_of(&self, property: &str) -> Option<&PropertyGetter> {
        self.getters.get(property)
    }

    pub(crate) fn setter_of(&self, property: &str) -> Option<&PropertySetter> {
        self.setters.get(property)
    }
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("desc", &self.desc)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
