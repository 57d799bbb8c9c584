use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::sync::Arc;

use crate::ObjectPath;

use super::Interface;

const DOCTYPE: &str = r#"<!DOCTYPE node PUBLIC "-//freedesktop//DTD D-BUS Object Introspection 1.0//EN"
 "http://www.freedesktop.org/standards/dbus/1.0/introspect.dtd">
"#;

const STANDARD_XML: &str = r#"  <interface name="org.freedesktop.DBus.Peer">
    <method name="Ping"/>
    <method name="GetMachineId">
      <arg type="s" direction="out"/>
    </method>
  </interface>
  <interface name="org.freedesktop.DBus.Introspectable">
    <method name="Introspect">
      <arg type="s" direction="out"/>
    </method>
  </interface>
  <interface name="org.freedesktop.DBus.Properties">
    <method name="Get">
      <arg type="s" direction="in"/>
      <arg type="s" direction="in"/>
      <arg type="v" direction="out"/>
    </method>
    <method name="GetAll">
      <arg type="s" direction="in"/>
      <arg type="a{sv}" direction="out"/>
    </method>
    <method name="Set">
      <arg type="s" direction="in"/>
      <arg type="s" direction="in"/>
      <arg type="v" direction="in"/>
    </method>
    <signal name="PropertiesChanged">
      <arg type="s"/>
      <arg type="a{sv}"/>
      <arg type="as"/>
    </signal>
  </interface>
"#;

/// Exported interfaces, keyed by object path and interface name.
#[derive(Default)]
pub(crate) struct Registry {
    objects: BTreeMap<ObjectPath, BTreeMap<Box<str>, Arc<Interface>>>,
}

impl Registry {
    /// Insert an interface, returning the one it replaced.
    pub(crate) fn insert(&mut self, path: ObjectPath, interface: Arc<Interface>) -> Option<Arc<Interface>> {
        let name = interface.desc().name().into();
        self.objects.entry(path).or_default().insert(name, interface)
    }

    /// Remove an interface, returning whether it was exported.
    pub(crate) fn remove(&mut self, path: &ObjectPath, name: &str) -> bool {
        let Some(interfaces) = self.objects.get_mut(path) else {
            return false;
        };

        let removed = interfaces.remove(name).is_some();

        if interfaces.is_empty() {
            self.objects.remove(path);
        }

        removed
    }

    /// Test if anything is exported at `path`.
    pub(crate) fn contains(&self, path: &ObjectPath) -> bool {
        self.objects.contains_key(path)
    }

    pub(crate) fn interface(&self, path: &ObjectPath, name: &str) -> Option<Arc<Interface>> {
        self.objects.get(path)?.get(name).cloned()
    }

    /// Find the first interface at `path` which declares `method`, used for
    /// calls without an interface header.
    pub(crate) fn find_method(&self, path: &ObjectPath, method: &str) -> Option<Arc<Interface>> {
        self.objects
            .get(path)?
            .values()
            .find(|interface| interface.desc().method(method).is_some())
            .cloned()
    }

    /// Generate the introspection document of `path`.
    pub(crate) fn introspect(&self, path: &ObjectPath) -> String {
        let mut out = String::from(DOCTYPE);
        out.push_str("<node>\n");
        out.push_str(STANDARD_XML);

        if let Some(interfaces) = self.objects.get(path) {
            for interface in interfaces.values() {
                interface.desc().write_xml(&mut out);
            }
        }

        let children = self
            .objects
            .keys()
            .filter_map(|other| path.child_name(other))
            .collect::<BTreeSet<_>>();

        for child in children {
            let _ = writeln!(out, "  <node name=\"{child}\"/>");
        }

        out.push_str("</node>\n");
        out
    }
}
