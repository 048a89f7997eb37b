//! Language-neutral representation of the classes and enums being translated.
//!
//! The parser builds these fresh on every run; the writer only reads them.

use std::collections::BTreeSet;
use std::path::PathBuf;

/// A parsed class or enum.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeModelObject {
    pub name: String,
    /// Groups objects into one `declare module` block.
    pub namespace: String,
    pub is_enum: bool,
    /// Empty when there is no translatable base. Never set on enums.
    pub base_name: String,
    pub base_namespace: String,
    pub summary: Option<String>,
    /// Members in declaration order. The writer emits them in exactly this order.
    pub properties: Vec<Member>,
    /// Generated output paths of the files this object depends on.
    pub references: BTreeSet<PathBuf>,
}

impl TypeModelObject {
    pub fn class(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn enumeration(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            is_enum: true,
            ..Self::class(namespace, name)
        }
    }

    pub fn with_base(mut self, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        self.base_namespace = namespace.into();
        self.base_name = name.into();
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.properties.push(member);
        self
    }

    pub fn has_base(&self) -> bool {
        !self.base_name.is_empty()
    }
}

/// A property, field or enum value.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    /// `name` plus any optional-member suffix (`?`) decided while parsing.
    pub name_with_option: String,
    pub ty: TypeRef,
    /// Explicit enum initializer text, kept verbatim until the writer cleans it.
    pub init_expression: Option<String>,
    pub summary: Option<String>,
    /// Name fixed by a serialization attribute; emitted without casing.
    pub explicit_name: bool,
}

impl Member {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        let name = name.into();
        Self {
            name_with_option: name.clone(),
            name,
            ty,
            init_expression: None,
            summary: None,
            explicit_name: false,
        }
    }

    /// Member rendered as `name?: T`.
    pub fn optional(name: impl Into<String>, ty: TypeRef) -> Self {
        let mut member = Self::new(name, ty);
        member.name_with_option.push('?');
        member
    }

    /// Enum value, with or without an explicit initializer.
    pub fn enum_value(name: impl Into<String>, init: Option<&str>) -> Self {
        let mut member = Self::new(name, TypeRef::untyped());
        member.init_expression = init.map(str::to_string);
        member
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_explicit_name(mut self) -> Self {
        self.explicit_name = true;
        self
    }

    pub fn is_optional(&self) -> bool {
        self.name_with_option.len() > self.name.len() && self.name_with_option.ends_with('?')
    }
}

/// The type of a member. Recursive through `shape`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeRef {
    /// When set, `rendered_name` is final target-language text.
    pub is_known_type: bool,
    pub rendered_name: String,
    pub is_array: bool,
    /// Inline anonymous structure for types without a stable external name.
    pub shape: Option<Vec<Member>>,
}

impl TypeRef {
    pub fn known(rendered_name: impl Into<String>) -> Self {
        Self {
            is_known_type: true,
            rendered_name: rendered_name.into(),
            ..Self::default()
        }
    }

    pub fn shape(members: Vec<Member>) -> Self {
        Self {
            shape: Some(members),
            ..Self::default()
        }
    }

    /// Neither known nor shaped; renders as `any`.
    pub fn untyped() -> Self {
        Self::default()
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    pub fn is_untyped(&self) -> bool {
        !self.is_known_type && self.shape.is_none()
    }
}
