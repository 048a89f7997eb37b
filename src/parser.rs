//! Builds the type model for one source file from host metadata.
//!
//! Member types resolve in this order: nullable wrapper, known primitives and
//! collections, types declared in the project (by name, plus a reference to
//! the declaring file), nested and metadata-only types (inline shapes), and
//! finally the untyped fallback.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Options;
use crate::csharp::{parse_type_syntax, TypeSyntax};
use crate::definition_map::{DefinitionMapData, ReferenceMetadata};
use crate::host::{HostFile, HostMember, HostType, HostTypeKind, IndexedType, LookupScope, ProjectIndex};
use crate::known_types::{self, KnownType};
use crate::model::{Member, TypeModelObject, TypeRef};
use crate::naming::{self, OutputNaming};

const IGNORE_ATTRIBUTES: &[&str] = &["JsonIgnore", "IgnoreDataMember", "NonSerialized"];

/// Everything the parser reads besides the file itself.
pub struct ParseContext<'a> {
    /// Declarations of the whole project. Under `assume_external_type` this
    /// may hold nothing but the current file.
    pub index: &'a ProjectIndex,
    pub options: &'a Options,
    pub naming: &'a OutputNaming,
}

/// Translate the classes and enums of `file` in declaration order. Cross-file
/// dependencies land in each object's `references` and in `map`'s
/// reference metadata, which is rebuilt from this run unless types are
/// assumed external (then the cached entries are all there is to go on).
pub fn parse(
    file: &HostFile,
    ctx: &ParseContext<'_>,
    map: &mut DefinitionMapData,
) -> Vec<TypeModelObject> {
    if !ctx.options.assume_external_type {
        map.reference_metadata.clear();
    }
    let mut local = ProjectIndex::new(ctx.index.name(), ctx.index.root());
    local.add_file(file);
    let mut translator = Translator {
        file,
        local,
        ctx,
        map,
        in_progress: Vec::new(),
    };
    translator.translate()
}

/// Where names are being resolved from.
struct Site {
    /// Declared namespace, used for lookup.
    namespace: String,
    /// Enclosing types, outermost first.
    containers: Vec<String>,
    /// Module of the object being emitted, used for qualification.
    module: String,
}

struct Translator<'a, 'c> {
    file: &'a HostFile,
    /// The current file alone; its declarations shadow the project's.
    local: ProjectIndex,
    ctx: &'a ParseContext<'c>,
    map: &'a mut DefinitionMapData,
    /// Qualified names of types whose shapes are being expanded.
    in_progress: Vec<String>,
}

impl Translator<'_, '_> {
    fn translate(&mut self) -> Vec<TypeModelObject> {
        let file = self.file;
        let mut objects = Vec::new();
        for ty in &file.types {
            match ty.kind {
                HostTypeKind::Interface => {}
                HostTypeKind::Enum => objects.push(self.enumeration(ty, &ty.namespace)),
                HostTypeKind::Class => {
                    objects.push(self.class(ty));
                    self.nested_enums(ty, &ty.namespace, &mut objects);
                }
            }
        }

        let mut seen = HashSet::new();
        objects.retain(|obj| {
            let fresh = seen.insert((obj.namespace.clone(), obj.name.clone()));
            if !fresh {
                debug!("skipping duplicate declaration {}.{}", obj.namespace, obj.name);
            }
            fresh
        });
        objects
    }

    fn module_name<'n>(&'n self, namespace: &'n str) -> &'n str {
        if namespace.is_empty() {
            &self.ctx.options.default_module_name
        } else {
            namespace
        }
    }

    fn enumeration(&mut self, ty: &HostType, namespace: &str) -> TypeModelObject {
        let mut obj = TypeModelObject::enumeration(self.module_name(namespace), &ty.name);
        obj.summary = ty.summary.clone();
        for member in ty.members.iter().filter(|m| !is_ignored(m)) {
            let mut value = Member::enum_value(&member.name, member.init.as_deref());
            value.summary = member.summary.clone();
            obj.properties.push(value);
        }
        obj
    }

    /// Enums declared inside classes become objects of their own, right
    /// after the outermost container.
    fn nested_enums(&mut self, ty: &HostType, namespace: &str, objects: &mut Vec<TypeModelObject>) {
        for nested in &ty.nested {
            let namespace = if nested.namespace.is_empty() {
                namespace
            } else {
                nested.namespace.as_str()
            };
            match nested.kind {
                HostTypeKind::Enum => objects.push(self.enumeration(nested, namespace)),
                HostTypeKind::Class => self.nested_enums(nested, namespace, objects),
                HostTypeKind::Interface => {}
            }
        }
    }

    fn class(&mut self, ty: &HostType) -> TypeModelObject {
        let qualified = ty.qualified_name();
        let module = self.module_name(&ty.namespace).to_string();
        let mut obj = TypeModelObject::class(module.as_str(), &ty.name);
        obj.summary = ty.summary.clone();

        let site = Site {
            namespace: ty.namespace.clone(),
            containers: vec![qualified.clone()],
            module,
        };
        self.in_progress.push(qualified);
        if let Some((namespace, name)) = self.resolve_base(&ty.bases, &site, &mut obj.references, &mut Vec::new()) {
            obj.base_namespace = namespace;
            obj.base_name = name;
        }
        obj.properties = self.members(&ty.members, &site, &mut obj.references);
        self.in_progress.pop();
        obj
    }

    fn members(
        &mut self,
        members: &[HostMember],
        site: &Site,
        refs: &mut BTreeSet<PathBuf>,
    ) -> Vec<Member> {
        let mut out = Vec::with_capacity(members.len());
        for host in members.iter().filter(|m| !is_ignored(m)) {
            let (ty, optional) = match parse_type_syntax(&host.type_name) {
                Ok(syntax) => self.member_type(&syntax, site, refs),
                Err(err) => {
                    debug!("member {} has unreadable type `{}`: {err}", host.name, host.type_name);
                    (TypeRef::untyped(), false)
                }
            };
            let explicit = explicit_name(host);
            let name = explicit.clone().unwrap_or_else(|| host.name.clone());
            let mut member = if optional {
                Member::optional(name, ty)
            } else {
                Member::new(name, ty)
            };
            if explicit.is_some() {
                member = member.with_explicit_name();
            }
            member.summary = host.summary.clone();
            out.push(member);
        }
        out
    }

    /// The member's type plus whether a nullable wrapper makes it optional.
    fn member_type(
        &mut self,
        syntax: &TypeSyntax,
        site: &Site,
        refs: &mut BTreeSet<PathBuf>,
    ) -> (TypeRef, bool) {
        match known_types::classify(syntax) {
            KnownType::Nullable(inner) => (self.resolve(inner, site, refs), true),
            _ => (self.resolve(syntax, site, refs), false),
        }
    }

    fn resolve(&mut self, syntax: &TypeSyntax, site: &Site, refs: &mut BTreeSet<PathBuf>) -> TypeRef {
        match known_types::classify(syntax) {
            KnownType::Primitive(name) => TypeRef::known(name),
            KnownType::Nullable(inner) => self.resolve(inner, site, refs),
            KnownType::Collection(element) => {
                let inner = self.resolve(element, site, refs);
                if inner.is_array {
                    // Jagged: fold the inner level into the rendered name.
                    TypeRef::known(self.type_text(&inner)).array()
                } else {
                    inner.array()
                }
            }
            KnownType::Dictionary { key, value } => {
                let key = if known_types::is_numeric_key(key) { "number" } else { "string" };
                let value = self.resolve(value, site, refs);
                TypeRef::known(format!("{{ [key: {key}]: {} }}", self.type_text(&value)))
            }
            KnownType::Unknown => self.resolve_named(syntax, site, refs),
        }
    }

    fn resolve_named(&mut self, syntax: &TypeSyntax, site: &Site, refs: &mut BTreeSet<PathBuf>) -> TypeRef {
        let TypeSyntax::Named { name, .. } = syntax else {
            return TypeRef::untyped();
        };
        match self.lookup(name, site) {
            Some((qualified, found)) => self.named(&qualified, &found, site, refs),
            None if self.ctx.options.assume_external_type => self.external(name, site, refs),
            None => {
                debug!("unresolved type `{name}` rendered as any");
                TypeRef::untyped()
            }
        }
    }

    fn named(
        &mut self,
        qualified: &str,
        found: &IndexedType,
        site: &Site,
        refs: &mut BTreeSet<PathBuf>,
    ) -> TypeRef {
        let host = &found.host;
        if host.kind == HostTypeKind::Interface {
            return TypeRef::untyped();
        }
        if found.is_declared() {
            self.add_reference(qualified, found, refs);
            return TypeRef::known(self.display_name(&host.namespace, &host.name, site));
        }
        if host.is_enum() {
            // Metadata-only enums are never declared; their values are numbers.
            return TypeRef::known("number");
        }
        if self.in_progress.iter().any(|name| name == qualified) {
            return TypeRef::known(naming::type_name(&host.name, self.ctx.options));
        }

        self.in_progress.push(qualified.to_string());
        let nested_site = Site {
            namespace: host.namespace.clone(),
            containers: self.containers_of(qualified),
            module: site.module.clone(),
        };
        let members = self.members(&host.members, &nested_site, refs);
        self.in_progress.pop();
        TypeRef::shape(members)
    }

    /// A type outside the current file under `assume_external_type`: render
    /// it by name, and reference its file only when cached metadata knows it.
    fn external(&mut self, written: &str, site: &Site, refs: &mut BTreeSet<PathBuf>) -> TypeRef {
        let (namespace, simple) = split_qualified(written);
        match self.map.find_reference(written).cloned() {
            Some(meta) => {
                let file = self.ctx.index.root().join(&meta.project_item_name);
                refs.insert(self.ctx.naming.output_path(&file));
                let (namespace, _) = split_qualified(&meta.type_name);
                TypeRef::known(self.display_name(namespace, simple, site))
            }
            None if namespace.is_empty() => TypeRef::known(naming::type_name(simple, self.ctx.options)),
            None => TypeRef::known(format!(
                "{namespace}.{}",
                naming::type_name(simple, self.ctx.options)
            )),
        }
    }

    /// Nearest translatable class among `bases`, as `(namespace, name)`.
    /// Interfaces are skipped; undeclared classes are walked through to their
    /// own bases.
    fn resolve_base(
        &mut self,
        bases: &[String],
        site: &Site,
        refs: &mut BTreeSet<PathBuf>,
        visited: &mut Vec<String>,
    ) -> Option<(String, String)> {
        for base in bases {
            let Ok(syntax) = parse_type_syntax(base) else {
                continue;
            };
            let TypeSyntax::Named { name, .. } = &syntax else {
                continue;
            };
            if known_types::primitive(name).is_some() {
                continue;
            }
            match self.lookup(name, site) {
                Some((qualified, found)) => {
                    if let Some(base) = self.translatable_base(&qualified, &found, site, refs, visited) {
                        return Some(base);
                    }
                }
                None if self.ctx.options.assume_external_type => {
                    if let Some(meta) = self.map.find_reference(name).cloned() {
                        let file = self.ctx.index.root().join(&meta.project_item_name);
                        refs.insert(self.ctx.naming.output_path(&file));
                        let (namespace, simple) = split_qualified(&meta.type_name);
                        return Some((self.module_name(namespace).to_string(), simple.to_string()));
                    }
                }
                None => debug!("base `{name}` is not translatable"),
            }
        }
        None
    }

    fn translatable_base(
        &mut self,
        qualified: &str,
        found: &IndexedType,
        site: &Site,
        refs: &mut BTreeSet<PathBuf>,
        visited: &mut Vec<String>,
    ) -> Option<(String, String)> {
        let host = &found.host;
        if host.kind != HostTypeKind::Class {
            return None;
        }
        if found.is_declared() {
            self.add_reference(qualified, found, refs);
            return Some((self.module_name(&host.namespace).to_string(), host.name.clone()));
        }
        if visited.iter().any(|name| name == qualified) {
            return None;
        }
        visited.push(qualified.to_string());
        let ancestor_site = Site {
            namespace: host.namespace.clone(),
            containers: self.containers_of(qualified),
            module: site.module.clone(),
        };
        self.resolve_base(&host.bases, &ancestor_site, refs, visited)
    }

    /// Type name as written in a member: qualified with its module only
    /// when that differs from the current object's.
    fn display_name(&self, namespace: &str, name: &str, site: &Site) -> String {
        let module = self.module_name(namespace);
        let name = naming::type_name(name, self.ctx.options);
        if module != site.module && !self.ctx.options.global_scope {
            format!("{module}.{name}")
        } else {
            name
        }
    }

    fn add_reference(&mut self, qualified: &str, found: &IndexedType, refs: &mut BTreeSet<PathBuf>) {
        let Some(file) = &found.file else {
            return;
        };
        if file == &self.file.path {
            return;
        }
        refs.insert(self.ctx.naming.output_path(file));
        self.map.record_reference(ReferenceMetadata {
            type_name: qualified.to_string(),
            project_name: self.ctx.index.name().to_string(),
            project_item_name: relative_item_name(self.ctx.index.root(), file),
        });
    }

    fn get(&self, qualified: &str) -> Option<&IndexedType> {
        self.local
            .get(qualified)
            .or_else(|| self.ctx.index.get(qualified))
    }

    fn lookup(&self, written: &str, site: &Site) -> Option<(String, IndexedType)> {
        let scope = LookupScope {
            namespace: &site.namespace,
            usings: &self.file.usings,
            containers: &site.containers,
        };
        self.local
            .lookup(written, scope)
            .or_else(|| self.ctx.index.lookup(written, scope))
            .map(|(qualified, found)| (qualified.to_string(), found.clone()))
    }

    /// `qualified` and its enclosing types, outermost first.
    fn containers_of(&self, qualified: &str) -> Vec<String> {
        let mut chain = vec![qualified.to_string()];
        let mut current = self.get(qualified).and_then(|ty| ty.container.clone());
        while let Some(container) = current {
            current = self.get(&container).and_then(|ty| ty.container.clone());
            chain.push(container);
        }
        chain.reverse();
        chain
    }

    /// Text of a resolved type for places that need a single string, such as
    /// dictionary values.
    fn type_text(&self, ty: &TypeRef) -> String {
        let mut text = if ty.is_known_type {
            ty.rendered_name.clone()
        } else if let Some(members) = &ty.shape {
            let fields: Vec<String> = members
                .iter()
                .map(|member| {
                    let name = naming::member_name(member, self.ctx.options);
                    format!("{name}: {};", self.type_text(&member.ty))
                })
                .collect();
            format!("{{ {} }}", fields.join(" "))
        } else {
            "any".to_string()
        };
        if ty.is_array {
            text.push_str("[]");
        }
        text
    }
}

fn is_ignored(member: &HostMember) -> bool {
    IGNORE_ATTRIBUTES.iter().any(|name| match member.attribute(name) {
        // `[JsonIgnore(Condition = WhenWritingNull)]` still serializes.
        Some(attr) => attr
            .named("Condition")
            .map_or(true, |condition| condition.ends_with("Always")),
        None => false,
    })
}

/// Serialized name set by `[JsonPropertyName]`, `[JsonProperty]` or
/// `[DataMember(Name = ..)]`.
fn explicit_name(member: &HostMember) -> Option<String> {
    member
        .attribute("JsonPropertyName")
        .and_then(|attr| attr.positional(0))
        .or_else(|| {
            member
                .attribute("JsonProperty")
                .and_then(|attr| attr.positional(0).or_else(|| attr.named("PropertyName")))
        })
        .or_else(|| member.attribute("DataMember").and_then(|attr| attr.named("Name")))
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
}

/// `App.Models.Person` -> (`App.Models`, `Person`).
fn split_qualified(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) => (&name[..dot], &name[dot + 1..]),
        None => ("", name),
    }
}

/// Path of `file` relative to the project root, with forward slashes.
fn relative_item_name(root: &Path, file: &Path) -> String {
    match file.strip_prefix(root) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => file.display().to_string(),
    }
}
