//! Host type metadata.
//!
//! This is the input side of translation: classes, enums and their members as
//! declared in the host language, with member types kept as C# type syntax
//! strings. The C# front end produces it from source; other hosts can hand
//! it over as a JSON document.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Declarations of one source file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HostFile {
    #[serde(default)]
    pub path: PathBuf,
    /// Namespaces imported with `using`.
    #[serde(default)]
    pub usings: Vec<String>,
    #[serde(default)]
    pub types: Vec<HostType>,
    /// Types known only through metadata (no declaring source file). Their
    /// shapes may be inlined but they are never emitted or referenced.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_types: Vec<HostType>,
}

impl HostFile {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostTypeKind {
    #[default]
    Class,
    Interface,
    Enum,
}

/// A class, interface or enum declaration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HostType {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub kind: HostTypeKind,
    /// Base list entries as written (`Entity`, `IComparable<Foo>`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub members: Vec<HostMember>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<HostType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<HostAttribute>,
}

impl HostType {
    pub fn is_enum(&self) -> bool {
        self.kind == HostTypeKind::Enum
    }

    pub fn qualified_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }
}

/// A property, field or enum value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HostMember {
    pub name: String,
    /// C# type syntax. Empty for enum values.
    #[serde(rename = "type", default)]
    pub type_name: String,
    /// Enum initializer text as written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<HostAttribute>,
}

impl HostMember {
    pub fn attribute(&self, name: &str) -> Option<&HostAttribute> {
        self.attributes.iter().find(|attr| attr.is(name))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HostAttribute {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<AttributeArg>,
}

/// One attribute argument. String literals are stored unquoted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttributeArg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: String,
}

impl HostAttribute {
    /// `Json.JsonIgnore`, `JsonIgnore` and `JsonIgnoreAttribute` all match `JsonIgnore`.
    pub fn is(&self, name: &str) -> bool {
        let simple = self.name.rsplit('.').next().unwrap_or(&self.name);
        simple == name || simple.strip_suffix("Attribute") == Some(name)
    }

    pub fn positional(&self, index: usize) -> Option<&str> {
        self.args
            .iter()
            .filter(|arg| arg.name.is_none())
            .nth(index)
            .map(|arg| arg.value.as_str())
    }

    pub fn named(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|arg| arg.name.as_deref() == Some(name))
            .map(|arg| arg.value.as_str())
    }
}

pub(crate) fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}

/// A type found through a [`ProjectIndex`] lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedType {
    pub host: HostType,
    /// Qualified name of the enclosing type for nested declarations.
    pub container: Option<String>,
    /// Declaring source file; `None` for metadata-only types.
    pub file: Option<PathBuf>,
}

impl IndexedType {
    pub fn is_nested(&self) -> bool {
        self.container.is_some()
    }

    /// Types that get their own declaration: top-level classes and enums,
    /// plus nested enums.
    pub fn is_declared(&self) -> bool {
        self.file.is_some()
            && self.host.kind != HostTypeKind::Interface
            && (!self.is_nested() || self.host.is_enum())
    }
}

/// Where a written type name is being resolved from.
#[derive(Debug, Clone, Copy)]
pub struct LookupScope<'a> {
    pub namespace: &'a str,
    pub usings: &'a [String],
    /// Qualified names of the enclosing types, innermost last.
    pub containers: &'a [String],
}

/// Every type declared in a set of host files, keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct ProjectIndex {
    name: String,
    root: PathBuf,
    types: IndexMap<String, IndexedType>,
}

impl ProjectIndex {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            types: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Index a file's declarations. The first declaration of a qualified
    /// name wins, so callers should add files in a stable order.
    pub fn add_file(&mut self, file: &HostFile) {
        for ty in &file.types {
            self.insert(ty, None, "", Some(&file.path));
        }
        for ty in &file.external_types {
            self.insert(ty, None, "", None);
        }
    }

    /// Nested declarations without a namespace of their own inherit the
    /// enclosing type's.
    fn insert(&mut self, ty: &HostType, container: Option<&str>, namespace: &str, file: Option<&Path>) {
        let mut host = ty.clone();
        if host.namespace.is_empty() {
            host.namespace = namespace.to_string();
        }
        let qualified = match container {
            Some(outer) => qualify(outer, &host.name),
            None => host.qualified_name(),
        };
        for nested in &ty.nested {
            self.insert(nested, Some(&qualified), &host.namespace, file);
        }
        self.types.entry(qualified).or_insert_with(|| IndexedType {
            host,
            container: container.map(str::to_string),
            file: file.map(Path::to_path_buf),
        });
    }

    pub fn get(&self, qualified: &str) -> Option<&IndexedType> {
        self.types.get(qualified)
    }

    /// Resolve a written name the way C# name lookup roughly does:
    /// enclosing types, then the namespace chain, then `using` imports.
    pub fn lookup(&self, written: &str, scope: LookupScope<'_>) -> Option<(&str, &IndexedType)> {
        let mut candidates = Vec::new();
        for container in scope.containers.iter().rev() {
            candidates.push(qualify(container, written));
        }
        let mut namespace = scope.namespace;
        loop {
            candidates.push(qualify(namespace, written));
            match namespace.rfind('.') {
                Some(dot) => namespace = &namespace[..dot],
                None if !namespace.is_empty() => namespace = "",
                None => break,
            }
        }
        for using in scope.usings {
            candidates.push(qualify(using, written));
        }

        candidates
            .iter()
            .find_map(|candidate| self.types.get_key_value(candidate.as_str()))
            .map(|(key, ty)| (key.as_str(), ty))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexedType)> {
        self.types.iter().map(|(key, ty)| (key.as_str(), ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(namespace: &str, name: &str) -> HostType {
        HostType {
            name: name.to_string(),
            namespace: namespace.to_string(),
            ..HostType::default()
        }
    }

    fn file(path: &str, types: Vec<HostType>) -> HostFile {
        HostFile {
            path: PathBuf::from(path),
            types,
            ..HostFile::default()
        }
    }

    #[test]
    fn lookup_walks_namespace_chain_then_usings() {
        let mut index = ProjectIndex::new("App", "/p");
        index.add_file(&file("/p/a.cs", vec![class("App", "Shared")]));
        index.add_file(&file("/p/b.cs", vec![class("Lib.Models", "Address")]));

        let usings = vec!["Lib.Models".to_string()];
        let scope = LookupScope {
            namespace: "App.Models",
            usings: &usings,
            containers: &[],
        };
        let (key, found) = index.lookup("Shared", scope).unwrap();
        assert_eq!(key, "App.Shared");
        assert_eq!(found.file.as_deref(), Some(Path::new("/p/a.cs")));

        let (key, _) = index.lookup("Address", scope).unwrap();
        assert_eq!(key, "Lib.Models.Address");
        assert!(index.lookup("Missing", scope).is_none());
    }

    #[test]
    fn nested_types_are_indexed_under_their_container() {
        let mut outer = class("App", "Order");
        outer.nested.push(class("App", "Line"));
        let mut index = ProjectIndex::new("App", "/p");
        index.add_file(&file("/p/order.cs", vec![outer]));

        let line = index.get("App.Order.Line").unwrap();
        assert!(line.is_nested());
        assert!(!line.is_declared());

        let containers = vec!["App.Order".to_string()];
        let scope = LookupScope {
            namespace: "App",
            usings: &[],
            containers: &containers,
        };
        assert_eq!(index.lookup("Line", scope).unwrap().0, "App.Order.Line");
    }

    #[test]
    fn first_declaration_wins() {
        let mut index = ProjectIndex::new("App", "/p");
        index.add_file(&file("/p/a.cs", vec![class("App", "Dup")]));
        index.add_file(&file("/p/b.cs", vec![class("App", "Dup")]));
        assert_eq!(index.len(), 1);
        assert_eq!(
            index.get("App.Dup").unwrap().file.as_deref(),
            Some(Path::new("/p/a.cs"))
        );
    }

    #[test]
    fn attribute_names_match_with_or_without_suffix() {
        let attr = HostAttribute {
            name: "Newtonsoft.Json.JsonPropertyAttribute".to_string(),
            args: vec![
                AttributeArg {
                    name: None,
                    value: "id".to_string(),
                },
                AttributeArg {
                    name: Some("Required".to_string()),
                    value: "Required.Always".to_string(),
                },
            ],
        };
        assert!(attr.is("JsonProperty"));
        assert!(!attr.is("JsonIgnore"));
        assert_eq!(attr.positional(0), Some("id"));
        assert_eq!(attr.named("Required"), Some("Required.Always"));
    }

    #[test]
    fn host_file_reads_from_json() {
        let json = r#"{
            "path": "Models/Person.cs",
            "types": [
                { "name": "Person", "namespace": "App", "members": [
                    { "name": "Name", "type": "string" }
                ]},
                { "name": "Kind", "kind": "enum", "members": [
                    { "name": "A", "init": "1" }
                ]}
            ]
        }"#;
        let file = HostFile::from_json(json).unwrap();
        assert_eq!(file.types.len(), 2);
        assert_eq!(file.types[0].members[0].type_name, "string");
        assert!(file.types[1].is_enum());
        assert_eq!(file.types[1].members[0].init.as_deref(), Some("1"));
    }
}
