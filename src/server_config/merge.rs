//! User and property merging.
//!
//! Users are replaced wholesale. Properties are upserted: an existing
//! `<entry>` whose name matches the dotted key case-insensitively is removed
//! and the new entry is appended at the end of the section.

use std::path::Path;
use xmltree::{Element, XMLNode};

use crate::server_config::document::{
    DocumentError, ServerConfigDocument, ENTRY_ELEMENT, PROPERTIES_SECTION, USERS_SECTION,
    USER_ELEMENT,
};
use crate::server_config::types::{PropertyMap, PropertyValue, UserMap};

/// Convert a camelCase key into the dotted form OrientDB uses.
///
/// A dot goes between a lowercase letter or digit and a following
/// uppercase letter, and inside an uppercase run before its last letter
/// when that letter starts a new word. The result is lowercased.
///
/// `serverDatabasePath` → `server.database.path`, `networkHTTPPort` →
/// `network.http.port`, `debug` → `debug`.
pub fn camel_to_dot(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let word_start = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if word_start {
                out.push('.');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// Replace the document's user list with exactly `users`.
pub fn merge_users(doc: &mut ServerConfigDocument, users: &UserMap) {
    let section = doc.section_mut(USERS_SECTION);
    section.children.clear();

    for (name, credentials) in users {
        let mut user = Element::new(USER_ELEMENT);
        user.attributes.insert("name".to_string(), name.clone());
        user.attributes.insert("password".to_string(), credentials.password.clone());
        user.attributes.insert("resources".to_string(), credentials.resources.clone());
        section.children.push(XMLNode::Element(user));
    }
}

/// Upsert every property in `properties`, in map order.
pub fn merge_properties(doc: &mut ServerConfigDocument, properties: &PropertyMap) {
    for (camel_key, value) in properties {
        set_property(doc, camel_key, value);
    }
}

/// Upsert a single property.
pub fn set_property(doc: &mut ServerConfigDocument, camel_key: &str, value: &PropertyValue) {
    let dot_key = camel_to_dot(camel_key);
    let section = doc.section_mut(PROPERTIES_SECTION);

    section.children.retain(|node| match node {
        XMLNode::Element(e) if e.name == ENTRY_ELEMENT => !e
            .attributes
            .get("name")
            .is_some_and(|name| name.eq_ignore_ascii_case(&dot_key)),
        _ => true,
    });

    let mut entry = Element::new(ENTRY_ELEMENT);
    entry.attributes.insert("name".to_string(), dot_key);
    entry.attributes.insert("value".to_string(), value.to_string());
    section.children.push(XMLNode::Element(entry));
}

/// Read the template at `input`, merge users and properties, write to `output`.
///
/// The template is never modified.
pub async fn merge_config_file(
    input: &Path,
    output: &Path,
    users: &UserMap,
    properties: &PropertyMap,
) -> Result<(), DocumentError> {
    let mut doc = ServerConfigDocument::read(input).await?;
    merge_users(&mut doc, users);
    merge_properties(&mut doc, properties);
    doc.write(output).await?;

    tracing::debug!(
        input = %input.display(),
        output = %output.display(),
        users = users.len(),
        properties = properties.len(),
        "Server config merged"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server_config::types::UserCredentials;

    fn doc(xml: &str) -> ServerConfigDocument {
        ServerConfigDocument::parse(xml.as_bytes()).unwrap()
    }

    fn names(doc: &ServerConfigDocument) -> Vec<String> {
        doc.properties().into_iter().map(|p| p.name).collect()
    }

    #[test]
    fn test_camel_to_dot() {
        assert_eq!(camel_to_dot("serverDatabasePath"), "server.database.path");
        assert_eq!(camel_to_dot("fooBarBaz"), "foo.bar.baz");
        assert_eq!(camel_to_dot("debug"), "debug");
        assert_eq!(camel_to_dot("networkHTTPPort"), "network.http.port");
        assert_eq!(camel_to_dot("log2File"), "log2.file");
        assert_eq!(camel_to_dot("Profiler"), "profiler");
        assert_eq!(camel_to_dot(""), "");
    }

    #[test]
    fn test_set_property_is_idempotent() {
        let mut d = doc("<orient-server><properties/></orient-server>");
        let value = PropertyValue::from("./db");

        set_property(&mut d, "serverDatabasePath", &value);
        let once = d.properties();
        set_property(&mut d, "serverDatabasePath", &value);

        assert_eq!(d.properties(), once);
        assert_eq!(once.len(), 1);
    }

    #[test]
    fn test_latest_value_wins() {
        let mut d = doc("<orient-server><properties/></orient-server>");
        set_property(&mut d, "cacheSize", &PropertyValue::from(10i64));
        set_property(&mut d, "cacheSize", &PropertyValue::from(20i64));

        assert_eq!(names(&d), vec!["cache.size"]);
        assert_eq!(d.property("cache.size").as_deref(), Some("20"));
    }

    #[test]
    fn test_replacement_ignores_case() {
        let mut d = doc(
            r#"<orient-server><properties>
                <entry name="Server.Database.Path" value="/old"/>
            </properties></orient-server>"#,
        );

        set_property(&mut d, "serverDatabasePath", &PropertyValue::from("/new"));

        let props = d.properties();
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].name, "server.database.path");
        assert_eq!(props[0].value, "/new");
    }

    #[test]
    fn test_untouched_entries_keep_order() {
        let mut d = doc(
            r#"<orient-server><properties>
                <entry name="a.one" value="1"/>
                <entry name="b.two" value="2"/>
                <entry name="c.three" value="3"/>
            </properties></orient-server>"#,
        );

        let mut props = PropertyMap::new();
        props.insert("bTwo".into(), PropertyValue::from("22"));
        props.insert("dFour".into(), PropertyValue::from("4"));
        merge_properties(&mut d, &props);

        assert_eq!(names(&d), vec!["a.one", "c.three", "b.two", "d.four"]);
        assert_eq!(d.property("b.two").as_deref(), Some("22"));
    }

    #[test]
    fn test_new_entries_follow_caller_order() {
        let mut d = doc("<orient-server><users/><properties/></orient-server>");

        let mut props = PropertyMap::new();
        props.insert("zookeeperHost".into(), PropertyValue::from("zk"));
        props.insert("avgLoad".into(), PropertyValue::from(1i64));
        props.insert("middleTier".into(), PropertyValue::from(false));
        merge_properties(&mut d, &props);
        assert_eq!(names(&d), vec!["zookeeper.host", "avg.load", "middle.tier"]);

        let mut users = UserMap::new();
        users.insert("writer".into(), UserCredentials::new("w", "*"));
        users.insert("admin".into(), UserCredentials::new("a", "*"));
        merge_users(&mut d, &users);
        let order: Vec<String> = d.users().into_iter().map(|u| u.name).collect();
        assert_eq!(order, vec!["writer", "admin"]);
    }

    #[test]
    fn test_merge_users_replaces_all() {
        let mut d = doc(
            r#"<orient-server><users>
                <user name="x" password="x" resources="*"/>
                <user name="y" password="y" resources="*"/>
            </users></orient-server>"#,
        );

        let mut users = UserMap::new();
        users.insert("a".into(), UserCredentials::new("pw", "connect"));
        merge_users(&mut d, &users);

        let result = d.users();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "a");
        assert_eq!(result[0].password, "pw");
        assert_eq!(result[0].resources, "connect");
    }

    #[test]
    fn test_empty_user_map_clears_users() {
        let mut d = doc(
            r#"<orient-server><users>
                <user name="x" password="x" resources="*"/>
            </users></orient-server>"#,
        );
        merge_users(&mut d, &UserMap::new());
        assert!(d.users().is_empty());
    }

    #[test]
    fn test_missing_sections_are_created() {
        let mut d = doc("<orient-server/>");

        let mut users = UserMap::new();
        users.insert("root".into(), UserCredentials::new("termidor406", "*"));
        merge_users(&mut d, &users);
        set_property(&mut d, "debug", &PropertyValue::from(true));

        assert_eq!(d.users().len(), 1);
        assert_eq!(d.property("debug").as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_merge_config_file_leaves_template_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("config").join("orientdb-server-config.xml");
        let output = dir
            .path()
            .join("orientdb")
            .join("config")
            .join("orientdb-server-config.xml");
        let template = r#"<orient-server>
            <users><user name="old" password="o" resources="*"/></users>
            <properties/>
        </orient-server>"#;
        std::fs::create_dir_all(input.parent().unwrap()).unwrap();
        std::fs::write(&input, template).unwrap();

        let mut users = UserMap::new();
        users.insert(
            "guest".into(),
            UserCredentials::new("guest", "connect,server.listDatabases,server.dblist"),
        );
        let mut props = PropertyMap::new();
        props.insert("serverDatabasePath".into(), PropertyValue::from("./tmp-test"));

        merge_config_file(&input, &output, &users, &props).await.unwrap();

        assert_eq!(std::fs::read_to_string(&input).unwrap(), template);
        let merged = ServerConfigDocument::read(&output).await.unwrap();
        assert_eq!(merged.users()[0].name, "guest");
        assert_eq!(merged.property("server.database.path").as_deref(), Some("./tmp-test"));
    }
}
