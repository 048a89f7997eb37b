//! Computes the `/// <reference path="..." />` directives for one output.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use crate::definition_map::DefinitionMapStore;
use crate::model::TypeModelObject;
use crate::naming::OutputNaming;

const DIRECTIVE_PREFIX: &str = "/// <reference path=\"";
const DIRECTIVE_SUFFIX: &str = "\" />";

pub struct ReferenceResolver<'a, S: DefinitionMapStore + ?Sized> {
    store: &'a S,
    naming: &'a OutputNaming,
    keep_unchanged: bool,
}

impl<'a, S: DefinitionMapStore + ?Sized> ReferenceResolver<'a, S> {
    pub fn new(store: &'a S, naming: &'a OutputNaming, keep_unchanged: bool) -> Self {
        Self {
            store,
            naming,
            keep_unchanged,
        }
    }

    /// Sorted, deduplicated reference paths for the output generated from
    /// `source`.
    ///
    /// `previous` is the current content of that output, if any. In
    /// keep-unchanged mode its directives are returned as they are and the
    /// objects' references are ignored.
    pub fn resolve(
        &self,
        objects: &[TypeModelObject],
        source: &Path,
        previous: Option<&str>,
    ) -> Vec<String> {
        if self.keep_unchanged {
            if let Some(text) = previous.filter(|text| !text.trim().is_empty()) {
                let mut existing = parse_directives(text);
                existing.sort();
                return existing;
            }
        }

        let own_output = self.naming.output_path(source);
        let base_dir = own_output.parent().unwrap_or_else(|| Path::new(""));

        let referenced: BTreeSet<&PathBuf> = objects
            .iter()
            .flat_map(|obj| obj.references.iter())
            .filter(|path| **path != own_output)
            .collect();

        let mut paths: Vec<String> = referenced
            .into_iter()
            .map(|output| self.directive_path(base_dir, output))
            .collect();
        paths.sort();
        paths.dedup();
        paths
    }

    /// Path written into the directive: relative to the referencing file,
    /// with the referenced file's custom name substituted when its map sets
    /// one.
    fn directive_path(&self, base_dir: &Path, output: &Path) -> String {
        let dir = output.parent().unwrap_or_else(|| Path::new(""));
        let file_name = match self.store.load(output) {
            Some(map) => match map.custom_name() {
                Some(custom) => self.naming.output_file_name(Path::new(custom)),
                None => file_name_of(output),
            },
            None => file_name_of(output),
        };
        match relative_dir(base_dir, dir) {
            Some(rel) if !rel.is_empty() => format!("{rel}/{file_name}"),
            _ => file_name,
        }
    }
}

/// Reference paths already present in generated text, in file order.
pub fn parse_directives(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            line.trim_end_matches('\r')
                .strip_prefix(DIRECTIVE_PREFIX)?
                .strip_suffix(DIRECTIVE_SUFFIX)
                .map(str::to_string)
        })
        .collect()
}

pub fn directive(path: &str) -> String {
    format!("{DIRECTIVE_PREFIX}{path}{DIRECTIVE_SUFFIX}")
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `from` and `to` are directories; returns `to` relative to `from` using
/// forward slashes, or `None` when no relative form exists.
fn relative_dir(from: &Path, to: &Path) -> Option<String> {
    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();
    let anchored = |c: &Component<'_>| matches!(c, Component::Prefix(_) | Component::RootDir);
    if from.first() != to.first() && from.first().is_some_and(anchored) {
        return None;
    }
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts: Vec<String> = Vec::new();
    for _ in common..from.len() {
        parts.push("..".to_string());
    }
    for component in &to[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition_map::memory::MemoryStore;
    use crate::definition_map::DefinitionMapData;

    fn object_with_refs(name: &str, refs: &[&str]) -> TypeModelObject {
        let mut obj = TypeModelObject::class("App", name);
        obj.references = refs.iter().map(PathBuf::from).collect();
        obj
    }

    fn naming() -> OutputNaming {
        OutputNaming::new(true, ".d.ts")
    }

    #[test]
    fn test_references_are_unioned_sorted_and_exclude_self() {
        let store = MemoryStore::default();
        let naming = naming();
        let resolver = ReferenceResolver::new(&store, &naming, false);
        let objects = vec![
            object_with_refs("Tree", &["/p/Zoo.cs.d.ts", "/p/Tree.cs.d.ts"]),
            object_with_refs("Leaf", &["/p/Address.cs.d.ts", "/p/Zoo.cs.d.ts"]),
        ];
        let refs = resolver.resolve(&objects, Path::new("/p/Tree.cs"), None);
        assert_eq!(refs, vec!["Address.cs.d.ts", "Zoo.cs.d.ts"]);
    }

    #[test]
    fn test_same_file_name_in_another_directory_is_kept() {
        let store = MemoryStore::default();
        let naming = naming();
        let resolver = ReferenceResolver::new(&store, &naming, false);
        let objects = vec![object_with_refs(
            "Person",
            &["/p/Legacy/Person.cs.d.ts", "/p/Models/Person.cs.d.ts"],
        )];
        let refs = resolver.resolve(&objects, Path::new("/p/Models/Person.cs"), None);
        assert_eq!(refs, vec!["../Legacy/Person.cs.d.ts"]);
    }

    #[test]
    fn test_references_are_relative_to_the_output() {
        let store = MemoryStore::default();
        let naming = naming();
        let resolver = ReferenceResolver::new(&store, &naming, false);
        let objects = vec![object_with_refs(
            "Order",
            &["/p/Shared/Money.cs.d.ts", "/p/Models/Sub/Line.cs.d.ts"],
        )];
        let refs = resolver.resolve(&objects, Path::new("/p/Models/Order.cs"), None);
        assert_eq!(refs, vec!["../Shared/Money.cs.d.ts", "Sub/Line.cs.d.ts"]);
    }

    #[test]
    fn test_custom_name_is_substituted() {
        let store = MemoryStore::with(
            "/p/Address.cs.d.ts",
            DefinitionMapData {
                custom_name: Some("address-types".to_string()),
                ..DefinitionMapData::default()
            },
        );
        let naming = naming();
        let resolver = ReferenceResolver::new(&store, &naming, false);
        let objects = vec![object_with_refs("Person", &["/p/Address.cs.d.ts"])];
        let refs = resolver.resolve(&objects, Path::new("/p/Person.cs"), None);
        assert_eq!(refs, vec!["address-types.d.ts"]);
    }

    #[test]
    fn test_keep_unchanged_reuses_existing_directives() {
        let store = MemoryStore::default();
        let naming = naming();
        let resolver = ReferenceResolver::new(&store, &naming, true);
        let objects = vec![object_with_refs("Person", &["/p/Fresh.cs.d.ts"])];
        let previous = "/// <reference path=\"b.d.ts\" />\r\n/// <reference path=\"a.d.ts\" />\n\ndeclare module App {\n}\n";
        let refs = resolver.resolve(&objects, Path::new("/p/Person.cs"), Some(previous));
        assert_eq!(refs, vec!["a.d.ts", "b.d.ts"]);

        // Nothing to keep: fall back to computed references.
        let refs = resolver.resolve(&objects, Path::new("/p/Person.cs"), Some("  \n"));
        assert_eq!(refs, vec!["Fresh.cs.d.ts"]);
    }

    #[test]
    fn test_parse_directives() {
        let text = format!("{}\n{}\nbody", directive("x.d.ts"), directive("../y.d.ts"));
        assert_eq!(parse_directives(&text), vec!["x.d.ts", "../y.d.ts"]);
    }
}
