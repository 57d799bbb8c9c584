use super::ObjectPath;

#[test]
fn legal_paths() {
    assert!(ObjectPath::new("").is_err());
    assert!(ObjectPath::new("a").is_err());
    assert!(ObjectPath::new("/").is_ok());
    assert!(ObjectPath::new("/a").is_ok());
    assert!(ObjectPath::new("//").is_err());
    assert!(ObjectPath::new("/se/tedro").is_ok());
    assert!(ObjectPath::new("/se/tedro_2").is_ok());
    assert!(ObjectPath::new("/se/tedro/").is_err());
    assert!(ObjectPath::new("/se/te-dro").is_err());
}

#[test]
fn iter_components() {
    let path = ObjectPath::new("/org/freedesktop/DBus").expect("valid path");
    assert_eq!(
        path.iter().collect::<Vec<_>>(),
        ["org", "freedesktop", "DBus"]
    );
    assert_eq!(path.iter().next_back(), Some("DBus"));
    assert_eq!(ObjectPath::root().iter().next(), None);
}

#[test]
fn children() {
    let root = ObjectPath::root();
    let path = ObjectPath::new("/org/example").expect("valid path");
    let other = ObjectPath::new("/org/examples").expect("valid path");
    let nested = ObjectPath::new("/org/example/Foo/Bar").expect("valid path");

    assert_eq!(root.child_name(&path), Some("org"));
    assert_eq!(path.child_name(&nested), Some("Foo"));
    assert_eq!(path.child_name(&other), None);
    assert_eq!(path.child_name(&path), None);
}
