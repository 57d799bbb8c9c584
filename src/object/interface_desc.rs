use std::fmt::Write;

use crate::error::{ErrorKind, Result};
use crate::signature::{parse_single, Signature, Type};
use crate::utils::{is_interface_name, is_member_name};

/// The access mode of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// The property can only be read.
    Read,
    /// The property can only be written.
    Write,
    /// The property can be both read and written.
    ReadWrite,
}

impl Access {
    /// Test if the property can be read.
    pub fn is_readable(self) -> bool {
        matches!(self, Access::Read | Access::ReadWrite)
    }

    /// Test if the property can be written.
    pub fn is_writable(self) -> bool {
        matches!(self, Access::Write | Access::ReadWrite)
    }

    /// The name of the access mode in introspection data.
    pub fn as_str(self) -> &'static str {
        match self {
            Access::Read => "read",
            Access::Write => "write",
            Access::ReadWrite => "readwrite",
        }
    }
}

/// A method declared by an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDesc {
    name: Box<str>,
    args: Signature,
    result: Signature,
}

impl MethodDesc {
    /// The name of the method.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The signature of the arguments.
    pub fn args(&self) -> &Signature {
        &self.args
    }

    /// The signature of the values returned.
    pub fn result(&self) -> &Signature {
        &self.result
    }
}

/// A signal declared by an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalDesc {
    name: Box<str>,
    args: Signature,
}

impl SignalDesc {
    /// The name of the signal.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The signature of the signal body.
    pub fn args(&self) -> &Signature {
        &self.args
    }
}

/// A property declared by an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDesc {
    name: Box<str>,
    ty: Type,
    access: Access,
}

impl PropertyDesc {
    /// The name of the property.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type of the property.
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// How the property can be accessed.
    pub fn access(&self) -> Access {
        self.access
    }
}

/// The shape of an interface: its methods, signals and properties.
///
/// # Examples
///
/// ```
/// use dbus_peer::object::{Access, InterfaceDesc};
///
/// let desc = InterfaceDesc::new("se.tedro.Calculator")?
///     .with_method("Add", "ii", "i")?
///     .with_signal("Overflow", "s")?
///     .with_property("Precision", "u", Access::ReadWrite)?;
///
/// assert_eq!(desc.name(), "se.tedro.Calculator");
/// assert_eq!(desc.method("Add").map(|m| m.result().as_str()), Some("i"));
/// assert!(desc.method("Sub").is_none());
/// assert!(desc.signal("Overflow").is_some());
///
/// assert!(InterfaceDesc::new("calculator").is_err());
/// # Ok::<_, dbus_peer::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDesc {
    name: Box<str>,
    methods: Vec<MethodDesc>,
    signals: Vec<SignalDesc>,
    properties: Vec<PropertyDesc>,
}

impl InterfaceDesc {
    /// Construct an empty interface description.
    pub fn new(name: &str) -> Result<Self> {
        if !is_interface_name(name) {
            return Err(ErrorKind::InvalidInterfaceName(name.into()).into());
        }

        Ok(Self {
            name: name.into(),
            methods: Vec::new(),
            signals: Vec::new(),
            properties: Vec::new(),
        })
    }

    /// Declare a method, replacing any earlier declaration with the same
    /// name.
    pub fn with_method(mut self, name: &str, args: &str, result: &str) -> Result<Self> {
        let method = MethodDesc {
            name: member_name(name)?,
            args: Signature::new(args)?,
            result: Signature::new(result)?,
        };

        self.methods.retain(|m| m.name != method.name);
        self.methods.push(method);
        Ok(self)
    }

    /// Declare a signal, replacing any earlier declaration with the same
    /// name.
    pub fn with_signal(mut self, name: &str, args: &str) -> Result<Self> {
        let signal = SignalDesc {
            name: member_name(name)?,
            args: Signature::new(args)?,
        };

        self.signals.retain(|s| s.name != signal.name);
        self.signals.push(signal);
        Ok(self)
    }

    /// Declare a property of a single complete type, replacing any earlier
    /// declaration with the same name.
    pub fn with_property(mut self, name: &str, ty: &str, access: Access) -> Result<Self> {
        let property = PropertyDesc {
            name: member_name(name)?,
            ty: parse_single(ty)?,
            access,
        };

        self.properties.retain(|p| p.name != property.name);
        self.properties.push(property);
        Ok(self)
    }

    /// The name of the interface.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared methods.
    pub fn methods(&self) -> &[MethodDesc] {
        &self.methods
    }

    /// Look up a method by name.
    pub fn method(&self, name: &str) -> Option<&MethodDesc> {
        self.methods.iter().find(|m| &*m.name == name)
    }

    /// The declared signals.
    pub fn signals(&self) -> &[SignalDesc] {
        &self.signals
    }

    /// Look up a signal by name.
    pub fn signal(&self, name: &str) -> Option<&SignalDesc> {
        self.signals.iter().find(|s| &*s.name == name)
    }

    /// The declared properties.
    pub fn properties(&self) -> &[PropertyDesc] {
        &self.properties
    }

    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyDesc> {
        self.properties.iter().find(|p| &*p.name == name)
    }

    /// Write the introspection XML of this interface.
    pub(crate) fn write_xml(&self, out: &mut String) {
        let _ = writeln!(out, "  <interface name=\"{}\">", self.name);

        for method in &self.methods {
            let _ = writeln!(out, "    <method name=\"{}\">", method.name);
            write_args(out, &method.args, Some("in"));
            write_args(out, &method.result, Some("out"));
            out.push_str("    </method>\n");
        }

        for signal in &self.signals {
            let _ = writeln!(out, "    <signal name=\"{}\">", signal.name);
            write_args(out, &signal.args, None);
            out.push_str("    </signal>\n");
        }

        for property in &self.properties {
            let _ = writeln!(
                out,
                "    <property name=\"{}\" type=\"{}\" access=\"{}\"/>",
                property.name,
                property.ty,
                property.access.as_str()
            );
        }

        out.push_str("  </interface>\n");
    }
}

fn write_args(out: &mut String, signature: &Signature, direction: Option<&str>) {
    for ty in signature.types() {
        match direction {
            Some(direction) => {
                let _ = writeln!(out, "      <arg type=\"{ty}\" direction=\"{direction}\"/>");
            }
            None => {
                let _ = writeln!(out, "      <arg type=\"{ty}\"/>");
            }
        }
    }
}

fn member_name(name: &str) -> Result<Box<str>> {
    if !is_member_name(name) {
        return Err(ErrorKind::InvalidMemberName(name.into()).into());
    }

    Ok(name.into())
}
